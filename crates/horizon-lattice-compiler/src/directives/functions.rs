//! `theme(...)` substitution in declaration values and at-rule params.

use crate::ast::{Node, WalkAction, walk};
use crate::theme::Theme;
use crate::util::segment;
use crate::utilities::with_alpha;
use crate::{Error, Result};

/// At-rules whose params may contain `theme(...)`.
const AT_RULES: &[&str] = &["media", "custom-media", "container", "supports"];

/// First segment of a dotted config path to its theme namespace.
const LEGACY_NAMESPACES: &[(&str, &str)] = &[
    ("colors", "--color"),
    ("screens", "--breakpoint"),
    ("spacing", "--spacing"),
    ("fontSize", "--text"),
    ("fontFamily", "--font"),
    ("fontWeight", "--font-weight"),
    ("lineHeight", "--leading"),
    ("letterSpacing", "--tracking"),
    ("borderRadius", "--radius"),
    ("boxShadow", "--shadow"),
    ("animation", "--animate"),
    ("opacity", "--opacity"),
];

#[tracing::instrument(skip_all)]
pub(crate) fn substitute_functions(ast: &mut Vec<Node>, theme: &Theme) -> Result<()> {
    let mut error = None;

    walk(ast, |node, _| {
        let target = match node {
            Node::Declaration { value: Some(value), .. } => value,
            Node::AtRule { name, params, .. } if AT_RULES.contains(&name.as_str()) => params,
            _ => return WalkAction::Continue,
        };
        if !target.contains("theme(") {
            return WalkAction::Continue;
        }
        match substitute(target, theme) {
            Ok(value) => {
                *target = value;
                WalkAction::Continue
            }
            Err(err) => {
                error = Some(err);
                WalkAction::Stop
            }
        }
    });

    error.map_or(Ok(()), Err)
}

/// Replace every `theme(...)` call in `value`.
fn substitute(value: &str, theme: &Theme) -> Result<String> {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(start) = find_call(rest) {
        out.push_str(&rest[..start]);
        let args_start = start + "theme(".len();
        let Some(len) = closing_paren(&rest[args_start..]) else {
            break;
        };
        let args = &rest[args_start..args_start + len];
        out.push_str(&evaluate(args, theme)?);
        rest = &rest[args_start + len + 1..];
    }

    out.push_str(rest);
    Ok(out)
}

/// Byte offset of the next `theme(` not preceded by an identifier character.
fn find_call(value: &str) -> Option<usize> {
    let mut offset = 0;
    while let Some(idx) = value[offset..].find("theme(") {
        let at = offset + idx;
        let standalone = value[..at]
            .chars()
            .next_back()
            .is_none_or(|c| !(c.is_ascii_alphanumeric() || c == '-' || c == '_'));
        if standalone {
            return Some(at);
        }
        offset = at + "theme(".len();
    }
    None
}

/// Length of the argument list up to its matching `)`.
fn closing_paren(value: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut quote = None;
    for (idx, ch) in value.char_indices() {
        match (quote, ch) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(ch),
            (None, '(') => depth += 1,
            (None, ')') if depth == 0 => return Some(idx),
            (None, ')') => depth -= 1,
            _ => {}
        }
    }
    None
}

fn evaluate(args: &str, theme: &Theme) -> Result<String> {
    let parts = segment(args, ',');
    let (path, fallback) = match parts.split_first() {
        Some((path, rest)) if !rest.is_empty() => (path.trim(), Some(rest.join(",").trim().to_string())),
        _ => (args.trim(), None),
    };

    let (path, alpha) = match segment(path, '/').as_slice() {
        [path, alpha] => (path.trim(), Some(alpha.trim())),
        _ => (path, None),
    };
    let path = unquote(path);

    if let Some(value) = resolve_theme_path(path, theme) {
        let value = substitute(&value, theme)?;
        return Ok(match alpha {
            Some(alpha) => with_alpha(&value, alpha),
            None => value,
        });
    }

    match fallback {
        Some(fallback) => substitute(&fallback, theme),
        None => Err(Error::theme_function(format!(
            "Could not resolve value for theme function: `theme({})`. Consider checking if the path is correct or provide a fallback value to silence this error.",
            args.trim()
        ))),
    }
}

fn unquote(value: &str) -> &str {
    ['"', '\'']
        .iter()
        .find_map(|q| value.strip_prefix(*q).and_then(|v| v.strip_suffix(*q)))
        .unwrap_or(value)
}

/// Raw theme value for a `--variable` or a dotted config path such as
/// `colors.red.500`.
pub(crate) fn resolve_theme_path(path: &str, theme: &Theme) -> Option<String> {
    if path.starts_with("--") {
        return theme.get(path).map(str::to_string);
    }

    let (head, tail) = match path.split_once('.') {
        Some((head, tail)) => (head, Some(tail)),
        None => (path, None),
    };
    let namespace = LEGACY_NAMESPACES
        .iter()
        .find(|(legacy, _)| *legacy == head)
        .map(|(_, namespace)| namespace.to_string())
        .unwrap_or_else(|| format!("--{}", head));

    let key = tail.map(|tail| tail.replace('.', "-"));
    theme.resolve_value(key.as_deref(), &[namespace.as_str()])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme::ThemeOptions;

    fn theme() -> Theme {
        let mut theme = Theme::new();
        for (key, value) in [
            ("--color-red-500", "#ef4444"),
            ("--breakpoint-md", "48rem"),
            ("--spacing", "0.25rem"),
        ] {
            theme.add(key, value, ThemeOptions::empty()).unwrap();
        }
        theme
    }

    #[test]
    fn resolves_variables_and_legacy_paths() {
        let theme = theme();
        assert_eq!(substitute("theme(--color-red-500)", &theme).unwrap(), "#ef4444");
        assert_eq!(
            substitute("1px solid theme(colors.red.500)", &theme).unwrap(),
            "1px solid #ef4444"
        );
        assert_eq!(substitute("(width >= theme(screens.md))", &theme).unwrap(), "(width >= 48rem)");
        assert_eq!(substitute("theme('spacing')", &theme).unwrap(), "0.25rem");
    }

    #[test]
    fn applies_alpha_and_fallbacks() {
        let theme = theme();
        assert_eq!(
            substitute("theme(--color-red-500 / 50%)", &theme).unwrap(),
            "color-mix(in oklab, #ef4444 50%, transparent)"
        );
        assert_eq!(substitute("theme(--missing, 1px, 2px)", &theme).unwrap(), "1px, 2px");
        assert_eq!(substitute("theme(--missing, theme(--spacing))", &theme).unwrap(), "0.25rem");
    }

    #[test]
    fn ignores_lookalike_functions() {
        let theme = theme();
        assert_eq!(substitute("my-theme(x)", &theme).unwrap(), "my-theme(x)");
    }

    #[test]
    fn unknown_path_without_fallback_is_an_error() {
        let err = substitute("theme(--nope)", &theme()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Could not resolve value for theme function: `theme(--nope)`. Consider checking if the path is correct or provide a fallback value to silence this error."
        );
    }

    #[test]
    fn walks_declarations_and_media_params() {
        let mut ast = vec![
            Node::at_rule(
                "media",
                "(width >= theme(--breakpoint-md))",
                vec![Node::rule(".a", vec![Node::decl("color", "theme(colors.red.500)")])],
            ),
            Node::at_rule("layer", "theme(--x)", vec![]),
        ];
        substitute_functions(&mut ast, &theme()).unwrap();

        assert_eq!(
            ast[0],
            Node::at_rule(
                "media",
                "(width >= 48rem)",
                vec![Node::rule(".a", vec![Node::decl("color", "#ef4444")])],
            )
        );
        assert_eq!(ast[1], Node::at_rule("layer", "theme(--x)", vec![]));
    }
}
