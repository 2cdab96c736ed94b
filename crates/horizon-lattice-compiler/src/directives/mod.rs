//! Directive processing.
//!
//! Turns a parsed stylesheet into a [`DesignSystem`](crate::DesignSystem):
//! imports are spliced in, `@media` options are forwarded, then a single
//! top-down walk handles `@theme`, `@utility`, `@variant`, `@source`,
//! `@plugin`, `@config` and `@tailwind utilities`. `@apply` and `theme()`
//! substitution run last, once every utility is registered.

mod apply;
mod functions;
mod imports;
mod plugin;
mod process;

pub use plugin::{Plugin, PluginApi, object_to_ast};

pub(crate) use apply::substitute_at_apply;
pub(crate) use functions::{resolve_theme_path, substitute_functions};
pub(crate) use imports::substitute_imports;
pub(crate) use process::{Processed, process};

use crate::ast::Node;
use crate::variants::{Variants, compounds_for_selectors};

/// Register a variant from a selector list such as `&:hover, &:focus`.
///
/// Style selectors are joined into one nested rule. Each `@`-selector wraps
/// the content in its own at-rule.
pub(crate) fn register_selector_variant(variants: &mut Variants, name: &str, selectors: Vec<String>) {
    let (at_rules, style_rules): (Vec<String>, Vec<String>) =
        selectors.into_iter().partition(|selector| selector.starts_with('@'));

    let compounds = compounds_for_selectors(&style_rules.iter().chain(&at_rules).cloned().collect::<Vec<_>>());
    let style_selector = (!style_rules.is_empty()).then(|| style_rules.join(", "));

    variants.static_variant(
        name,
        move |rule, _, _| {
            let children = rule.children_mut()?;
            let content = std::mem::take(children);

            let mut wrapped = Vec::with_capacity(at_rules.len() + 1);
            if let Some(selector) = &style_selector {
                wrapped.push(Node::rule(selector.clone(), content.clone()));
            }
            for selector in &at_rules {
                wrapped.push(Node::rule_or_at_rule(selector, content.clone()));
            }
            *children = wrapped;
            Some(())
        },
        compounds,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::to_css;
    use crate::candidate::Variant;
    use crate::theme::Theme;
    use crate::variants::apply_variant;

    #[test]
    fn selector_variant_joins_style_rules_and_splits_at_rules() {
        let mut variants = Variants::new();
        register_selector_variant(
            &mut variants,
            "hocus",
            vec!["&:hover".into(), "&:focus".into(), "@media (hover: hover)".into()],
        );

        let mut node = Node::rule(".x", vec![Node::decl("color", "red")]);
        let variant = Variant::Static { root: "hocus".into() };
        apply_variant(&mut node, &variant, &variants, &Theme::new(), 0).unwrap();

        assert_eq!(
            to_css(&[node]),
            ".x {\n  &:hover, &:focus {\n    color: red;\n  }\n  @media (hover: hover) {\n    color: red;\n  }\n}\n"
        );
    }
}
