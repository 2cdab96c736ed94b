//! Variant registry.
//!
//! Variants transform the rule generated for a utility: `hover` nests the
//! body in `&:hover`, `md` wraps it in a media query, `group-*` compounds
//! another variant. Every variant has a sort order; variants registered inside
//! one [`Variants::group`] call share an order and an optional comparator.

mod apply;
mod builtin;

pub use apply::apply_variant;
pub use builtin::register_builtin_variants;

use crate::ast::{AtRuleKind, Node, WalkAction, walk, walk_ref};
use crate::candidate::{CandidateModifier, Variant, VariantValue};
use crate::theme::Theme;
use bitflags::bitflags;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

bitflags! {
    /// What kind of rules a variant produces, or may wrap.
    #[derive(Debug, Default, Eq, PartialEq, Copy, Clone, Hash)]
    pub struct Compounds: u8 {
        const AT_RULES = 1 << 0;
        const STYLE_RULES = 1 << 1;
    }
}

impl Compounds {
    /// Cannot compound at all.
    pub const NEVER: Self = Self::empty();
}

/// Rewrites the rule a variant is applied to. `None` rejects the candidate.
pub type ApplyFn = Arc<dyn Fn(&mut Node, &Variant, &Theme) -> Option<()> + Send + Sync>;

/// Tie-breaker for variants sharing a group order.
pub type CompareFn = Arc<dyn Fn(&Variant, &Variant, &Theme) -> Ordering + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariantKind {
    Static,
    Functional,
    Compound,
}

/// A registered variant.
#[derive(Clone)]
pub struct VariantDefinition {
    pub kind: VariantKind,
    pub order: usize,
    pub apply_fn: ApplyFn,
    /// For compound variants: what they may wrap.
    pub compounds_with: Compounds,
    /// What this variant produces when wrapped by a compound variant.
    pub compounds: Compounds,
}

impl fmt::Debug for VariantDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VariantDefinition")
            .field("kind", &self.kind)
            .field("order", &self.order)
            .field("compounds_with", &self.compounds_with)
            .field("compounds", &self.compounds)
            .finish_non_exhaustive()
    }
}

/// Name to definition map with ordering information.
#[derive(Clone, Default)]
pub struct Variants {
    variants: HashMap<String, VariantDefinition>,
    compare_fns: HashMap<usize, CompareFn>,
    last_order: usize,
    group_order: Option<usize>,
}

impl fmt::Debug for Variants {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Variants")
            .field("variants", &self.variants)
            .field("groups", &self.compare_fns.len())
            .finish()
    }
}

impl Variants {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a value-independent variant.
    pub fn static_variant<F>(&mut self, name: impl Into<String>, apply_fn: F, compounds: Compounds)
    where
        F: Fn(&mut Node, &Variant, &Theme) -> Option<()> + Send + Sync + 'static,
    {
        self.set(name.into(), VariantKind::Static, Arc::new(apply_fn), Compounds::NEVER, compounds);
    }

    /// Register a variant that takes a value (`aria-*`, `min-*`).
    pub fn functional<F>(&mut self, name: impl Into<String>, apply_fn: F, compounds: Compounds)
    where
        F: Fn(&mut Node, &Variant, &Theme) -> Option<()> + Send + Sync + 'static,
    {
        self.set(name.into(), VariantKind::Functional, Arc::new(apply_fn), Compounds::NEVER, compounds);
    }

    /// Register a variant that wraps another (`group-*`, `not-*`).
    pub fn compound<F>(&mut self, name: impl Into<String>, compounds_with: Compounds, apply_fn: F, compounds: Compounds)
    where
        F: Fn(&mut Node, &Variant, &Theme) -> Option<()> + Send + Sync + 'static,
    {
        self.set(name.into(), VariantKind::Compound, Arc::new(apply_fn), compounds_with, compounds);
    }

    /// Register a static variant whose body is a template: `@slot` placeholders
    /// are replaced with the content the variant is applied to.
    pub fn from_ast(&mut self, name: impl Into<String>, body: Vec<Node>) {
        let mut selectors = Vec::new();
        walk_ref(&body, |node, _| match node {
            Node::Rule { selector, .. } => selectors.push(selector.clone()),
            Node::AtRule { name, params, .. } if name != "slot" => {
                selectors.push(format!("@{} {}", name, params));
            }
            _ => {}
        });

        let compounds = compounds_for_selectors(&selectors);
        self.static_variant(
            name,
            move |rule, _, _| {
                let mut template = body.clone();
                let content = rule.children_mut().map(std::mem::take).unwrap_or_default();
                substitute_at_slot(&mut template, &content);
                if let Some(children) = rule.children_mut() {
                    *children = template;
                }
                Some(())
            },
            compounds,
        );
    }

    /// Run `register` with every variant it registers sharing one order.
    pub fn group(&mut self, register: impl FnOnce(&mut Self), compare_fn: Option<CompareFn>) {
        let order = self.next_order();
        self.group_order = Some(order);
        if let Some(compare_fn) = compare_fn {
            self.compare_fns.insert(order, compare_fn);
        }
        register(self);
        self.group_order = None;
        self.last_order = self.last_order.max(order);
    }

    fn next_order(&self) -> usize {
        self.group_order.unwrap_or(self.last_order + 1)
    }

    fn set(
        &mut self,
        name: String,
        kind: VariantKind,
        apply_fn: ApplyFn,
        compounds_with: Compounds,
        compounds: Compounds,
    ) {
        if let Some(existing) = self.variants.get_mut(&name) {
            // Overrides keep their original position in the sort order.
            existing.kind = kind;
            existing.apply_fn = apply_fn;
            existing.compounds_with = compounds_with;
            existing.compounds = compounds;
            return;
        }

        let order = self.next_order();
        self.last_order = self.last_order.max(order);
        self.variants.insert(
            name,
            VariantDefinition {
                kind,
                order,
                apply_fn,
                compounds_with,
                compounds,
            },
        );
    }

    pub fn has(&self, name: &str) -> bool {
        self.variants.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&VariantDefinition> {
        self.variants.get(name)
    }

    pub fn kind(&self, name: &str) -> Option<VariantKind> {
        self.variants.get(name).map(|def| def.kind)
    }

    /// Registered names, sorted by order then name.
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<(&str, usize)> = self
            .variants
            .iter()
            .map(|(name, def)| (name.as_str(), def.order))
            .collect();
        keys.sort_by(|a, z| a.1.cmp(&z.1).then_with(|| a.0.cmp(z.0)));
        keys.into_iter().map(|(name, _)| name).collect()
    }

    /// Whether compound variant `parent` may wrap `child`.
    pub fn compounds_with(&self, parent: &str, child: &Variant) -> bool {
        let Some(parent) = self.variants.get(parent) else {
            return false;
        };
        let child_compounds = match child {
            Variant::Arbitrary { selector, .. } => compounds_for_selectors(std::slice::from_ref(selector)),
            _ => match child.root().and_then(|root| self.variants.get(root)) {
                Some(def) => def.compounds,
                None => return false,
            },
        };

        parent.kind == VariantKind::Compound
            && child_compounds != Compounds::NEVER
            && parent.compounds_with != Compounds::NEVER
            && parent.compounds_with.intersects(child_compounds)
    }

    /// Total order over parsed variants.
    ///
    /// Arbitrary variants sort last. Otherwise variants sort by registration
    /// order; compound variants then compare their inner variant and modifier,
    /// grouped variants use the group comparator, and everything else falls
    /// back to root and value.
    pub fn compare(&self, a: &Variant, z: &Variant, theme: &Theme) -> Ordering {
        if a == z {
            return Ordering::Equal;
        }

        let (a_root, z_root) = match (a, z) {
            (Variant::Arbitrary { selector: a, .. }, Variant::Arbitrary { selector: z, .. }) => return a.cmp(z),
            (Variant::Arbitrary { .. }, _) => return Ordering::Greater,
            (_, Variant::Arbitrary { .. }) => return Ordering::Less,
            _ => (a.root().unwrap_or_default(), z.root().unwrap_or_default()),
        };

        let a_order = self.variants.get(a_root).map_or(usize::MAX, |def| def.order);
        let z_order = self.variants.get(z_root).map_or(usize::MAX, |def| def.order);
        if a_order != z_order {
            return a_order.cmp(&z_order);
        }

        if let (
            Variant::Compound {
                variant: a_inner,
                modifier: a_modifier,
                ..
            },
            Variant::Compound {
                variant: z_inner,
                modifier: z_modifier,
                ..
            },
        ) = (a, z)
        {
            return self
                .compare(a_inner, z_inner, theme)
                .then_with(|| compare_modifiers(a_modifier.as_ref(), z_modifier.as_ref()));
        }

        if let Some(compare_fn) = self.compare_fns.get(&a_order) {
            return compare_fn(a, z, theme);
        }

        if a_root != z_root {
            return a_root.cmp(z_root);
        }

        match (variant_value(a), variant_value(z)) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (Some(a), Some(z)) => a.cmp(z),
        }
    }
}

fn compare_modifiers(a: Option<&CandidateModifier>, z: Option<&CandidateModifier>) -> Ordering {
    match (a, z) {
        (Some(a), Some(z)) => a.value().cmp(z.value()),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => Ordering::Equal,
    }
}

fn variant_value(variant: &Variant) -> Option<&str> {
    match variant {
        Variant::Functional { value, .. } => value.as_ref().map(VariantValue::value),
        _ => None,
    }
}

/// What a selector list produces when used as a variant.
///
/// Conditional at-rules (`@media`, `@supports`, `@container`) compound as at
/// rules, plain selectors as style rules. Any other at-rule or a
/// pseudo-element makes the variant non-compoundable.
pub fn compounds_for_selectors(selectors: &[String]) -> Compounds {
    let mut compounds = Compounds::NEVER;
    for selector in selectors {
        if selector.starts_with('@') {
            if !["@media", "@supports", "@container"]
                .iter()
                .any(|prefix| selector.starts_with(prefix))
            {
                return Compounds::NEVER;
            }
            compounds |= Compounds::AT_RULES;
            continue;
        }
        if selector.contains("::") {
            return Compounds::NEVER;
        }
        compounds |= Compounds::STYLE_RULES;
    }
    compounds
}

/// Replace every `@slot` at-rule in `nodes` with `content`.
pub fn substitute_at_slot(nodes: &mut Vec<Node>, content: &[Node]) {
    walk(nodes, |node, _| {
        if node.at_rule_kind() == Some(AtRuleKind::Slot) {
            return WalkAction::Replace(content.to_vec());
        }
        WalkAction::Continue
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wrap(selector: &'static str) -> impl Fn(&mut Node, &Variant, &Theme) -> Option<()> + Send + Sync {
        move |rule, _, _| {
            let children = rule.children_mut()?;
            *children = vec![Node::rule(selector, std::mem::take(children))];
            Some(())
        }
    }

    fn registry() -> Variants {
        let mut variants = Variants::new();
        variants.static_variant("hover", wrap("&:hover"), Compounds::STYLE_RULES);
        variants.static_variant("focus", wrap("&:focus"), Compounds::STYLE_RULES);
        variants.static_variant("before", wrap("&::before"), Compounds::NEVER);
        variants.compound("group", Compounds::STYLE_RULES, |_, _, _| Some(()), Compounds::STYLE_RULES);
        variants.functional("aria", |_, _, _| Some(()), Compounds::STYLE_RULES);
        variants
    }

    fn stat(root: &str) -> Variant {
        Variant::Static { root: root.into() }
    }

    #[test]
    fn compare_uses_registration_order() {
        let variants = registry();
        let theme = Theme::new();

        assert_eq!(variants.compare(&stat("hover"), &stat("focus"), &theme), Ordering::Less);
        assert_eq!(variants.compare(&stat("focus"), &stat("hover"), &theme), Ordering::Greater);

        let arbitrary = Variant::Arbitrary {
            selector: "&:nth-child(3)".into(),
            relative: false,
        };
        assert_eq!(variants.compare(&arbitrary, &stat("hover"), &theme), Ordering::Greater);
    }

    #[test]
    fn overrides_keep_order() {
        let mut variants = registry();
        let before = variants.get("hover").map(|d| d.order);
        variants.static_variant("hover", wrap("&:is(:hover)"), Compounds::STYLE_RULES);

        assert_eq!(variants.get("hover").map(|d| d.order), before);
    }

    #[test]
    fn grouped_variants_share_order_and_comparator() {
        let mut variants = registry();
        let compare: CompareFn = Arc::new(|a: &Variant, z: &Variant, _: &Theme| z.root().cmp(&a.root()));
        variants.group(
            |v| {
                v.static_variant("sm", wrap("@media"), Compounds::AT_RULES);
                v.static_variant("md", wrap("@media"), Compounds::AT_RULES);
            },
            Some(compare),
        );
        variants.static_variant("dark", wrap("@media"), Compounds::AT_RULES);

        let theme = Theme::new();
        assert_eq!(variants.get("sm").map(|d| d.order), variants.get("md").map(|d| d.order));
        assert_eq!(variants.compare(&stat("sm"), &stat("md"), &theme), Ordering::Less);
        assert_eq!(variants.compare(&stat("md"), &stat("dark"), &theme), Ordering::Less);
    }

    #[test]
    fn compounds_with_checks_flags() {
        let variants = registry();

        assert!(variants.compounds_with("group", &stat("hover")));
        assert!(!variants.compounds_with("group", &stat("before")));
        assert!(!variants.compounds_with("hover", &stat("focus")));
    }

    #[test]
    fn selector_compounds() {
        let sel = |list: &[&str]| compounds_for_selectors(&list.iter().map(|s| s.to_string()).collect::<Vec<_>>());

        assert_eq!(sel(&["&:hover", "&:focus"]), Compounds::STYLE_RULES);
        assert_eq!(sel(&["@media (hover: hover)", "&:hover"]), Compounds::AT_RULES | Compounds::STYLE_RULES);
        assert_eq!(sel(&["&::before"]), Compounds::NEVER);
        assert_eq!(sel(&["@starting-style"]), Compounds::NEVER);
    }

    #[test]
    fn from_ast_substitutes_slot() {
        let mut variants = Variants::new();
        variants.from_ast(
            "hocus",
            vec![Node::rule("&:hover, &:focus", vec![Node::at_rule("slot", "", vec![])])],
        );

        let def = variants.get("hocus").cloned().unwrap();
        assert_eq!(def.compounds, Compounds::STYLE_RULES);

        let mut rule = Node::rule(".x", vec![Node::decl("color", "red")]);
        (def.apply_fn)(&mut rule, &stat("hocus"), &Theme::new()).unwrap();
        assert_eq!(
            rule,
            Node::rule(".x", vec![Node::rule("&:hover, &:focus", vec![Node::decl("color", "red")])])
        );
    }
}
