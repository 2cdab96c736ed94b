use super::Variants;
use crate::ast::{Node, WalkAction, walk};
use crate::candidate::Variant;
use crate::theme::Theme;

/// Apply one variant to the rule generated for a candidate.
///
/// `depth` is `0` for variants written directly on the candidate and grows for
/// variants nested inside compound variants. Relative arbitrary variants
/// (`[>img]`) are only valid when nested. Returns `None` when the variant
/// rejects the candidate.
pub fn apply_variant(node: &mut Node, variant: &Variant, variants: &Variants, theme: &Theme, depth: usize) -> Option<()> {
    match variant {
        Variant::Arbitrary { selector, relative } => {
            if *relative && depth == 0 {
                return None;
            }
            let children = node.children_mut()?;
            let content = std::mem::take(children);
            *children = vec![Node::rule_or_at_rule(selector, content)];
            Some(())
        }
        Variant::Compound { root, variant: inner, .. } => {
            let definition = variants.get(root)?;

            // The compound variant only rewrites what its inner variant
            // produced, so build that in isolation first.
            let mut isolated = Node::at_rule("slot", "", vec![]);
            apply_variant(&mut isolated, inner, variants, theme, depth + 1)?;
            let mut produced = isolated.children_mut().map(std::mem::take).unwrap_or_default();
            for child in &mut produced {
                (definition.apply_fn)(child, variant, theme)?;
            }

            let children = node.children_mut()?;
            let content = std::mem::take(children);
            fill_empty_leaves(&mut produced, &content);
            *children = produced;
            Some(())
        }
        Variant::Static { root } | Variant::Functional { root, .. } => {
            let definition = variants.get(root)?;
            (definition.apply_fn)(node, variant, theme)
        }
    }
}

fn fill_empty_leaves(nodes: &mut Vec<Node>, content: &[Node]) {
    walk(nodes, |node, _| match node {
        Node::Rule { nodes, .. } | Node::AtRule { nodes, .. } if nodes.is_empty() => {
            *nodes = content.to_vec();
            WalkAction::Skip
        }
        _ => WalkAction::Continue,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::CandidateModifier;
    use crate::variants::register_builtin_variants;

    fn builtins() -> (Variants, Theme) {
        let mut theme = Theme::new();
        theme
            .add("--breakpoint-md", "48rem", crate::theme::ThemeOptions::empty())
            .unwrap();
        let mut variants = Variants::new();
        register_builtin_variants(&mut variants, &theme);
        (variants, theme)
    }

    fn utility() -> Node {
        Node::rule(".x", vec![Node::decl("color", "red")])
    }

    #[test]
    fn arbitrary_variant_nests_selector() {
        let (variants, theme) = builtins();
        let mut node = utility();
        let variant = Variant::Arbitrary {
            selector: "&:nth-child(3)".into(),
            relative: false,
        };

        apply_variant(&mut node, &variant, &variants, &theme, 0).unwrap();
        assert_eq!(
            node,
            Node::rule(".x", vec![Node::rule("&:nth-child(3)", vec![Node::decl("color", "red")])])
        );
    }

    #[test]
    fn relative_arbitrary_variant_needs_nesting() {
        let (variants, theme) = builtins();
        let variant = Variant::Arbitrary {
            selector: ">img".into(),
            relative: true,
        };

        assert_eq!(apply_variant(&mut utility(), &variant, &variants, &theme, 0), None);
    }

    #[test]
    fn compound_variant_rewrites_only_inner_output() {
        let (variants, theme) = builtins();
        let mut node = utility();
        let variant = Variant::Compound {
            root: "group".into(),
            modifier: Some(CandidateModifier::Named("item".into())),
            variant: Box::new(Variant::Static { root: "focus".into() }),
        };

        apply_variant(&mut node, &variant, &variants, &theme, 0).unwrap();
        assert_eq!(
            node,
            Node::rule(
                ".x",
                vec![Node::rule(
                    "&:is(:where(.group\\/item):focus *)",
                    vec![Node::decl("color", "red")]
                )]
            )
        );
    }

    #[test]
    fn static_breakpoint_wraps_in_media() {
        let (variants, theme) = builtins();
        let mut node = utility();

        apply_variant(&mut node, &Variant::Static { root: "md".into() }, &variants, &theme, 0).unwrap();
        assert_eq!(
            node,
            Node::rule(
                ".x",
                vec![Node::at_rule("media", "(width >= 48rem)", vec![Node::decl("color", "red")])]
            )
        );
    }
}
