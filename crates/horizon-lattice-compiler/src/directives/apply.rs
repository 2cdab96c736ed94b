//! `@apply` substitution.

use crate::ast::{AtRuleKind, Node, WalkAction, walk};
use crate::compile::mark_important;
use crate::design_system::DesignSystem;
use crate::util::split_whitespace;
use crate::{Error, Result};

/// Replace every `@apply` with the declarations of the candidates it lists.
///
/// Candidates compile exactly as they would for a build. The generated class
/// rule is unwrapped so its body lands in the enclosing rule; variant rules
/// nested inside it are kept. An unknown candidate is fatal. `@utility`
/// bodies are skipped, they are handled before registration.
#[tracing::instrument(skip_all)]
pub(crate) fn substitute_at_apply(ast: &mut Vec<Node>, design_system: &mut DesignSystem) -> Result<()> {
    let mut error = None;

    walk(ast, |node, _| {
        let Node::AtRule { name, params, .. } = node else {
            return WalkAction::Continue;
        };
        match AtRuleKind::from_name(name) {
            AtRuleKind::Utility => WalkAction::Skip,
            AtRuleKind::Apply => match expand(params, design_system) {
                Ok(nodes) => WalkAction::Replace(nodes),
                Err(err) => {
                    error = Some(err);
                    WalkAction::Stop
                }
            },
            _ => WalkAction::Continue,
        }
    });

    error.map_or(Ok(()), Err)
}

fn expand(params: &str, design_system: &mut DesignSystem) -> Result<Vec<Node>> {
    let mut candidates = split_whitespace(params);
    let important = candidates.last() == Some(&"!important");
    if important {
        candidates.pop();
    }

    let mut unknown: Option<String> = None;
    let compiled = design_system.compile_candidates(&candidates, |raw| {
        unknown.get_or_insert_with(|| raw.to_string());
    });
    if let Some(candidate) = unknown {
        return Err(Error::UnknownUtility { candidate });
    }

    let mut nodes = Vec::new();
    for node in compiled {
        match node {
            Node::Rule { selector, nodes: children } if selector.starts_with('.') => nodes.extend(children),
            other => nodes.push(other),
        }
    }
    if important {
        mark_important(&mut nodes);
    }

    tracing::trace!(candidates = candidates.len(), nodes = nodes.len(), "expanded @apply");
    Ok(nodes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::to_css;
    use crate::parser::parse;
    use crate::theme::{Theme, ThemeOptions};

    fn design_system() -> DesignSystem {
        let mut theme = Theme::new();
        theme.add("--spacing", "0.25rem", ThemeOptions::empty()).unwrap();
        theme.add("--color-red", "#f00", ThemeOptions::empty()).unwrap();
        DesignSystem::new(theme)
    }

    fn apply(css: &str) -> Result<String> {
        let mut ast = parse(css)?;
        substitute_at_apply(&mut ast, &mut design_system())?;
        Ok(to_css(&ast))
    }

    #[test]
    fn splices_declarations_and_variants() {
        assert_eq!(
            apply(".a { @apply flex hover:underline; }").unwrap(),
            ".a {\n  display: flex;\n  &:hover {\n    @media (hover: hover) {\n      text-decoration-line: underline;\n    }\n  }\n}\n"
        );
    }

    #[test]
    fn arbitrary_theme_reference() {
        assert_eq!(
            apply(".a { @apply bg-[--color-red]; }").unwrap(),
            ".a {\n  background-color: var(--color-red);\n}\n"
        );
    }

    #[test]
    fn important_markers_are_equivalent() {
        let trailing = apply(".a { @apply flex !important; }").unwrap();
        let legacy = apply(".a { @apply !flex; }").unwrap();
        let suffix = apply(".a { @apply flex!; }").unwrap();

        assert_eq!(trailing, ".a {\n  display: flex !important;\n}\n");
        assert_eq!(legacy, trailing);
        assert_eq!(suffix, trailing);
    }

    #[test]
    fn unknown_candidate_is_fatal() {
        let err = apply(".a { @apply flex not-a-utility; }").unwrap_err();
        assert_eq!(err.to_string(), "Cannot apply unknown utility class: not-a-utility");
    }
}
