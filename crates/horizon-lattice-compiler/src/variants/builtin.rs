//! Built-in variants.

use super::{CompareFn, Compounds, Variants, compounds_for_selectors};
use crate::ast::Node;
use crate::candidate::{Variant, VariantValue, is_positive_integer};
use crate::theme::Theme;
use crate::util::{escape, segment};
use std::cmp::Ordering;
use std::sync::Arc;

/// Register the built-in variants. Breakpoint variants are created from the
/// `--breakpoint-*` keys currently in `theme`.
pub fn register_builtin_variants(variants: &mut Variants, theme: &Theme) {
    static_selectors(variants, "*", &[":where(& > *)"], Some(Compounds::NEVER));
    static_selectors(variants, "**", &[":where(& *)"], Some(Compounds::NEVER));

    variants.compound(
        "not",
        Compounds::STYLE_RULES | Compounds::AT_RULES,
        negate,
        Compounds::STYLE_RULES | Compounds::AT_RULES,
    );
    variants.compound(
        "group",
        Compounds::STYLE_RULES,
        |rule, variant, theme| relational(rule, variant, theme, "group", " *"),
        Compounds::STYLE_RULES,
    );
    variants.compound(
        "peer",
        Compounds::STYLE_RULES,
        |rule, variant, theme| relational(rule, variant, theme, "peer", " ~ *"),
        Compounds::STYLE_RULES,
    );

    // Pseudo-elements
    static_selectors(variants, "first-letter", &["&::first-letter"], None);
    static_selectors(variants, "first-line", &["&::first-line"], None);
    static_selectors(variants, "marker", &["& *::marker", "&::marker"], None);
    static_selectors(variants, "selection", &["& *::selection", "&::selection"], None);
    static_selectors(variants, "file", &["&::file-selector-button"], None);
    static_selectors(variants, "placeholder", &["&::placeholder"], None);
    static_selectors(variants, "backdrop", &["&::backdrop"], None);
    for (name, selector) in [("before", "&::before"), ("after", "&::after")] {
        variants.static_variant(
            name,
            move |rule, _, _| {
                let children = rule.children_mut()?;
                let mut content = vec![Node::decl("content", "var(--tw-content)")];
                content.append(children);
                *children = vec![Node::rule(selector, content)];
                Some(())
            },
            Compounds::NEVER,
        );
    }

    // Pseudo-classes
    let pseudo_classes: &[(&str, &'static [&'static str])] = &[
        ("first", &["&:first-child"]),
        ("last", &["&:last-child"]),
        ("only", &["&:only-child"]),
        ("odd", &["&:nth-child(odd)"]),
        ("even", &["&:nth-child(even)"]),
        ("first-of-type", &["&:first-of-type"]),
        ("last-of-type", &["&:last-of-type"]),
        ("only-of-type", &["&:only-of-type"]),
        ("visited", &["&:visited"]),
        ("target", &["&:target"]),
        ("open", &["&:is([open], :popover-open)"]),
        ("default", &["&:default"]),
        ("checked", &["&:checked"]),
        ("indeterminate", &["&:indeterminate"]),
        ("placeholder-shown", &["&:placeholder-shown"]),
        ("autofill", &["&:autofill"]),
        ("optional", &["&:optional"]),
        ("required", &["&:required"]),
        ("valid", &["&:valid"]),
        ("invalid", &["&:invalid"]),
        ("in-range", &["&:in-range"]),
        ("out-of-range", &["&:out-of-range"]),
        ("read-only", &["&:read-only"]),
        ("empty", &["&:empty"]),
        ("focus-within", &["&:focus-within"]),
    ];
    for &(name, selectors) in pseudo_classes {
        static_selectors(variants, name, selectors, None);
    }

    variants.static_variant(
        "hover",
        |rule, _, _| {
            let children = rule.children_mut()?;
            let content = std::mem::take(children);
            *children = vec![Node::rule(
                "&:hover",
                vec![Node::at_rule("media", "(hover: hover)", content)],
            )];
            Some(())
        },
        Compounds::STYLE_RULES,
    );

    let interactive: &[(&str, &'static [&'static str])] = &[
        ("focus", &["&:focus"]),
        ("focus-visible", &["&:focus-visible"]),
        ("active", &["&:active"]),
        ("enabled", &["&:enabled"]),
        ("disabled", &["&:disabled"]),
        ("inert", &["&:is([inert], [inert] *)"]),
    ];
    for &(name, selectors) in interactive {
        static_selectors(variants, name, selectors, None);
    }

    variants.compound(
        "has",
        Compounds::STYLE_RULES,
        |rule, variant, _| {
            if variant.modifier().is_some() {
                return None;
            }
            rewrite_selectors(rule, |selector| format!("&:has({})", selector.replace('&', "*")))
        },
        Compounds::STYLE_RULES,
    );

    variants.functional(
        "aria",
        |rule, variant, _| {
            let selector = match functional_value(variant)? {
                VariantValue::Arbitrary(value) => format!("&[aria-{}]", quote_attribute_value(value)),
                VariantValue::Named(value) => format!("&[aria-{}=\"true\"]", value),
            };
            wrap_rule(rule, &selector)
        },
        Compounds::STYLE_RULES,
    );

    variants.functional(
        "data",
        |rule, variant, _| {
            let selector = match functional_value(variant)? {
                VariantValue::Arbitrary(value) => format!("&[data-{}]", quote_attribute_value(value)),
                VariantValue::Named(value) => format!("&[data-{}]", value),
            };
            wrap_rule(rule, &selector)
        },
        Compounds::STYLE_RULES,
    );

    for (name, pseudo) in [
        ("nth", "nth-child"),
        ("nth-last", "nth-last-child"),
        ("nth-of-type", "nth-of-type"),
        ("nth-last-of-type", "nth-last-of-type"),
    ] {
        variants.functional(
            name,
            move |rule, variant, _| {
                let value = match functional_value(variant)? {
                    VariantValue::Arbitrary(value) => value.clone(),
                    VariantValue::Named(value) if is_positive_integer(value) => value.clone(),
                    VariantValue::Named(_) => return None,
                };
                wrap_rule(rule, &format!("&:{}({})", pseudo, value))
            },
            Compounds::STYLE_RULES,
        );
    }

    variants.functional(
        "supports",
        |rule, variant, _| {
            let mut query = functional_value(variant)?.value().to_string();
            let is_function = query
                .find('(')
                .is_some_and(|idx| idx > 0 && query[..idx].chars().all(|c| c.is_ascii_alphanumeric() || c == '-'));
            if !is_function {
                if !query.contains(':') {
                    query = format!("{}: var(--tw)", query);
                }
                if !(query.starts_with('(') && query.ends_with(')')) {
                    query = format!("({})", query);
                }
            }
            wrap_at_rule(rule, "supports", &query)
        },
        Compounds::AT_RULES,
    );

    static_selectors(variants, "motion-safe", &["@media (prefers-reduced-motion: no-preference)"], None);
    static_selectors(variants, "motion-reduce", &["@media (prefers-reduced-motion: reduce)"], None);
    static_selectors(variants, "contrast-more", &["@media (prefers-contrast: more)"], None);
    static_selectors(variants, "contrast-less", &["@media (prefers-contrast: less)"], None);

    register_breakpoints(variants, theme);

    static_selectors(variants, "portrait", &["@media (orientation: portrait)"], None);
    static_selectors(variants, "landscape", &["@media (orientation: landscape)"], None);
    static_selectors(variants, "ltr", &["&:where(:dir(ltr), [dir=\"ltr\"], [dir=\"ltr\"] *)"], None);
    static_selectors(variants, "rtl", &["&:where(:dir(rtl), [dir=\"rtl\"], [dir=\"rtl\"] *)"], None);
    static_selectors(variants, "dark", &["@media (prefers-color-scheme: dark)"], None);
    static_selectors(variants, "starting", &["@starting-style"], None);
    static_selectors(variants, "print", &["@media print"], None);
    static_selectors(variants, "forced-colors", &["@media (forced-colors: active)"], None);
}

/// `max-*` (descending) and then `sm`, `md`, ..., `min-*` (ascending), each
/// set in its own group.
fn register_breakpoints(variants: &mut Variants, theme: &Theme) {
    variants.group(
        |variants| {
            variants.functional(
                "max",
                |rule, variant, theme| {
                    let value = breakpoint_value(variant, theme)?;
                    wrap_at_rule(rule, "media", &format!("(width < {})", value))
                },
                Compounds::AT_RULES,
            );
        },
        Some(breakpoint_comparator(true)),
    );

    let names = theme.keys_in_namespace("--breakpoint");
    variants.group(
        |variants| {
            for name in names {
                variants.static_variant(
                    name,
                    |rule, variant, theme| {
                        let value = breakpoint_value(variant, theme)?;
                        wrap_at_rule(rule, "media", &format!("(width >= {})", value))
                    },
                    Compounds::AT_RULES,
                );
            }
            variants.functional(
                "min",
                |rule, variant, theme| {
                    let value = breakpoint_value(variant, theme)?;
                    wrap_at_rule(rule, "media", &format!("(width >= {})", value))
                },
                Compounds::AT_RULES,
            );
        },
        Some(breakpoint_comparator(false)),
    );
}

/// The breakpoint name a variant refers to: `md` for both `md` and `min-md`,
/// the raw value for `min-[40rem]`.
fn breakpoint_key(variant: &Variant) -> Option<&str> {
    match variant {
        Variant::Static { root } => Some(root),
        Variant::Functional { value, modifier: None, .. } => value.as_ref().map(VariantValue::value),
        _ => None,
    }
}

fn breakpoint_value(variant: &Variant, theme: &Theme) -> Option<String> {
    match variant {
        Variant::Functional {
            value: Some(VariantValue::Arbitrary(value)),
            modifier: None,
            ..
        } => Some(value.clone()),
        _ => theme.resolve_value(breakpoint_key(variant), &["--breakpoint"]),
    }
}

/// Two-stage ordering: breakpoints declared in the theme sort by their
/// declaration index, everything else (arbitrary values) sorts after them
/// lexicographically.
fn breakpoint_comparator(descending: bool) -> CompareFn {
    Arc::new(move |a, z, theme| {
        let keys = theme.keys_in_namespace("--breakpoint");
        let a_key = breakpoint_key(a).unwrap_or_default();
        let z_key = breakpoint_key(z).unwrap_or_default();
        let a_index = keys.iter().position(|key| key == a_key);
        let z_index = keys.iter().position(|key| key == z_key);

        let order = match (a_index, z_index) {
            (Some(a), Some(z)) if descending => z.cmp(&a),
            (Some(a), Some(z)) => a.cmp(&z),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => a_key.cmp(z_key),
        };
        order.then_with(|| a.root().cmp(&z.root()))
    })
}

fn static_selectors(
    variants: &mut Variants,
    name: &str,
    selectors: &'static [&'static str],
    compounds: Option<Compounds>,
) {
    let compounds = compounds.unwrap_or_else(|| {
        let owned: Vec<String> = selectors.iter().map(|s| s.to_string()).collect();
        compounds_for_selectors(&owned)
    });
    variants.static_variant(
        name,
        move |rule, _, _| {
            let children = rule.children_mut()?;
            let content = std::mem::take(children);
            *children = selectors
                .iter()
                .map(|selector| Node::rule_or_at_rule(selector, content.clone()))
                .collect();
            Some(())
        },
        compounds,
    );
}

fn functional_value(variant: &Variant) -> Option<&VariantValue> {
    match variant {
        Variant::Functional {
            value: Some(value),
            modifier: None,
            ..
        } => Some(value),
        _ => None,
    }
}

fn wrap_rule(rule: &mut Node, selector: &str) -> Option<()> {
    let children = rule.children_mut()?;
    let content = std::mem::take(children);
    *children = vec![Node::rule(selector, content)];
    Some(())
}

fn wrap_at_rule(rule: &mut Node, name: &str, params: &str) -> Option<()> {
    let children = rule.children_mut()?;
    let content = std::mem::take(children);
    *children = vec![Node::at_rule(name, params, content)];
    Some(())
}

/// `sort=ascending` becomes `sort="ascending"`; quoted values and regex flags
/// are preserved.
fn quote_attribute_value(input: &str) -> String {
    let Some((name, value)) = input.split_once('=') else {
        return input.to_string();
    };
    if value.starts_with(['"', '\'']) {
        return input.to_string();
    }
    if let Some(unflagged) = value
        .strip_suffix(" i")
        .or_else(|| value.strip_suffix(" I"))
        .or_else(|| value.strip_suffix(" s"))
        .or_else(|| value.strip_suffix(" S"))
    {
        let flag = &value[unflagged.len() + 1..];
        return format!("{}=\"{}\" {}", name, unflagged, flag);
    }
    format!("{}=\"{}\"", name, value)
}

/// Rewrite every style rule produced by the inner variant. Nested style rules
/// cannot be expressed and reject the candidate.
fn rewrite_selectors(rule: &mut Node, rewrite: impl Fn(&str) -> String) -> Option<()> {
    fn visit(node: &mut Node, inside_rule: bool, rewrite: &dyn Fn(&str) -> String, applied: &mut bool) -> Option<()> {
        match node {
            Node::Rule { selector, nodes } => {
                if inside_rule {
                    return None;
                }
                *selector = rewrite(selector);
                *applied = true;
                for child in nodes {
                    visit(child, true, rewrite, applied)?;
                }
            }
            Node::AtRule { nodes, .. } => {
                for child in nodes {
                    visit(child, inside_rule, rewrite, applied)?;
                }
            }
            _ => {}
        }
        Some(())
    }

    let mut applied = false;
    visit(rule, false, &rewrite, &mut applied)?;
    applied.then_some(())
}

/// `group-*` and `peer-*`: match on an ancestor or preceding sibling marked
/// with the `group`/`peer` class.
fn relational(rule: &mut Node, variant: &Variant, theme: &Theme, name: &str, relation: &str) -> Option<()> {
    let Variant::Compound { variant: inner, modifier, .. } = variant else {
        return None;
    };
    if matches!(**inner, Variant::Arbitrary { relative: true, .. }) {
        return None;
    }

    let prefix = theme.prefix().map(|p| format!("{}\\:", p)).unwrap_or_default();
    let target = match modifier {
        Some(modifier) => format!(":where(.{}{}\\/{})", prefix, name, escape(modifier.value())),
        None => format!(":where(.{}{})", prefix, name),
    };

    rewrite_selectors(rule, |selector| {
        let selector = selector.replace('&', &target);
        let selector = if segment(&selector, ',').len() > 1 {
            format!(":is({})", selector)
        } else {
            selector
        };
        format!("&:is({}{})", selector, relation)
    })
}

/// `not-*`: negate the selector or condition produced by the inner variant.
fn negate(rule: &mut Node, variant: &Variant, _theme: &Theme) -> Option<()> {
    let Variant::Compound { variant: inner, modifier, .. } = variant else {
        return None;
    };
    if modifier.is_some() || matches!(**inner, Variant::Arbitrary { relative: true, .. }) {
        return None;
    }

    let mut style_rules = Vec::new();
    let mut at_rules = Vec::new();
    let mut current: &Node = rule;
    loop {
        match current {
            Node::Rule { selector, .. } => style_rules.push(selector.as_str()),
            Node::AtRule { name, params, .. } => at_rules.push((name.as_str(), params.as_str())),
            _ => return None,
        }
        match current.children()?.as_slice() {
            [] => break,
            [only] => current = only,
            _ => return None,
        }
    }
    if style_rules.len() > 1 || at_rules.len() > 1 {
        return None;
    }

    let mut negated = Vec::new();
    for selector in style_rules {
        negated.push(Node::rule(negate_selector(selector)?, vec![]));
    }
    for (name, params) in at_rules {
        negated.push(negate_at_rule(name, params)?);
    }

    *rule = if negated.len() == 1 {
        negated.remove(0)
    } else {
        Node::rule("&", negated)
    };
    Some(())
}

fn negate_selector(selector: &str) -> Option<String> {
    if selector.contains("::") {
        return None;
    }
    let parts: Vec<String> = segment(selector, ',')
        .into_iter()
        .map(|part| {
            let part = part.trim();
            let part = part
                .strip_prefix("&:is(")
                .and_then(|p| p.strip_suffix(')'))
                .unwrap_or(part);
            part.replace('&', "*")
        })
        .collect();
    Some(format!("&:not({})", parts.join(", ")))
}

fn negate_at_rule(name: &str, params: &str) -> Option<Node> {
    let negated = match name {
        "media" => segment(params, ',')
            .into_iter()
            .map(|condition| {
                let condition = condition.trim();
                match condition.strip_prefix("not ") {
                    Some(rest) => rest.to_string(),
                    None => format!("not {}", condition),
                }
            })
            .collect::<Vec<_>>()
            .join(", "),
        "supports" => match params.trim().strip_prefix("not ") {
            Some(rest) => rest.to_string(),
            None => format!("not {}", params.trim()),
        },
        _ => return None,
    };
    Some(Node::at_rule(name, negated, vec![]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::CandidateModifier;
    use crate::theme::ThemeOptions;
    use crate::variants::apply_variant;

    fn setup() -> (Variants, Theme) {
        let mut theme = Theme::new();
        for (key, value) in [("--breakpoint-sm", "40rem"), ("--breakpoint-md", "48rem"), ("--breakpoint-lg", "64rem")] {
            theme.add(key, value, ThemeOptions::empty()).unwrap();
        }
        let mut variants = Variants::new();
        register_builtin_variants(&mut variants, &theme);
        (variants, theme)
    }

    fn apply(variant: Variant) -> Option<Node> {
        let (variants, theme) = setup();
        let mut node = Node::rule(".x", vec![Node::decl("color", "red")]);
        apply_variant(&mut node, &variant, &variants, &theme, 0)?;
        Some(node)
    }

    fn functional(root: &str, value: VariantValue) -> Variant {
        Variant::Functional {
            root: root.into(),
            value: Some(value),
            modifier: None,
        }
    }

    fn compound(root: &str, inner: Variant) -> Variant {
        Variant::Compound {
            root: root.into(),
            modifier: None,
            variant: Box::new(inner),
        }
    }

    fn stat(root: &str) -> Variant {
        Variant::Static { root: root.into() }
    }

    fn red() -> Vec<Node> {
        vec![Node::decl("color", "red")]
    }

    #[test]
    fn hover_is_guarded_by_media() {
        assert_eq!(
            apply(stat("hover")),
            Some(Node::rule(
                ".x",
                vec![Node::rule("&:hover", vec![Node::at_rule("media", "(hover: hover)", red())])]
            ))
        );
    }

    #[test]
    fn aria_and_data_attributes() {
        assert_eq!(
            apply(functional("aria", VariantValue::Named("checked".into()))),
            Some(Node::rule(".x", vec![Node::rule("&[aria-checked=\"true\"]", red())]))
        );
        assert_eq!(
            apply(functional("data", VariantValue::Arbitrary("state=open".into()))),
            Some(Node::rule(".x", vec![Node::rule("&[data-state=\"open\"]", red())]))
        );
    }

    #[test]
    fn nth_requires_integer_or_arbitrary() {
        assert_eq!(
            apply(functional("nth", VariantValue::Named("3".into()))),
            Some(Node::rule(".x", vec![Node::rule("&:nth-child(3)", red())]))
        );
        assert_eq!(apply(functional("nth", VariantValue::Named("odd".into()))), None);
    }

    #[test]
    fn supports_shorthand() {
        assert_eq!(
            apply(functional("supports", VariantValue::Arbitrary("display:grid".into()))),
            Some(Node::rule(".x", vec![Node::at_rule("supports", "(display:grid)", red())]))
        );
        assert_eq!(
            apply(functional("supports", VariantValue::Arbitrary("selector(:has(a))".into()))),
            Some(Node::rule(".x", vec![Node::at_rule("supports", "selector(:has(a))", red())]))
        );
    }

    #[test]
    fn not_negates_selectors_and_media() {
        assert_eq!(
            apply(compound("not", stat("focus"))),
            Some(Node::rule(".x", vec![Node::rule("&:not(*:focus)", red())]))
        );
        assert_eq!(
            apply(compound("not", stat("dark"))),
            Some(Node::rule(
                ".x",
                vec![Node::at_rule("media", "not (prefers-color-scheme: dark)", red())]
            ))
        );
        assert_eq!(apply(compound("not", stat("before"))), None);
    }

    #[test]
    fn has_and_peer() {
        assert_eq!(
            apply(compound("has", stat("checked"))),
            Some(Node::rule(".x", vec![Node::rule("&:has(*:checked)", red())]))
        );
        assert_eq!(
            apply(Variant::Compound {
                root: "peer".into(),
                modifier: Some(CandidateModifier::Named("a".into())),
                variant: Box::new(stat("focus")),
            }),
            Some(Node::rule(".x", vec![Node::rule("&:is(:where(.peer\\/a):focus ~ *)", red())]))
        );
    }

    #[test]
    fn breakpoints_sort_by_theme_order_then_lexicographically() {
        let (variants, theme) = setup();
        let min = |value: VariantValue| functional("min", value);
        let max = |value: VariantValue| functional("max", value);

        let mut list = vec![
            min(VariantValue::Arbitrary("30rem".into())),
            stat("lg"),
            min(VariantValue::Arbitrary("10rem".into())),
            stat("sm"),
            max(VariantValue::Named("sm".into())),
            max(VariantValue::Named("lg".into())),
            stat("md"),
        ];
        list.sort_by(|a, z| variants.compare(a, z, &theme));

        assert_eq!(
            list,
            vec![
                max(VariantValue::Named("lg".into())),
                max(VariantValue::Named("sm".into())),
                stat("sm"),
                stat("md"),
                stat("lg"),
                min(VariantValue::Arbitrary("10rem".into())),
                min(VariantValue::Arbitrary("30rem".into())),
            ]
        );
    }

    #[test]
    fn attribute_quoting() {
        assert_eq!(quote_attribute_value("sort=ascending"), "sort=\"ascending\"");
        assert_eq!(quote_attribute_value("sort='x'"), "sort='x'");
        assert_eq!(quote_attribute_value("name=bob i"), "name=\"bob\" i");
        assert_eq!(quote_attribute_value("busy"), "busy");
    }
}
