//! Built-in utilities.

use super::{Utilities, UtilityOptions, as_color};
use crate::ast::Node;
use crate::candidate::{
    Candidate, CandidateModifier, CandidateValue, infer_data_type, is_positive_integer, is_valid_opacity_value,
    is_valid_spacing_multiplier,
};
use crate::theme::Theme;
use crate::util::segment;

type Declarations = &'static [(&'static str, &'static str)];

/// Resolver for bare values that are not theme keys (`p-4`, `z-10`).
type BareValueFn = fn(&CandidateValue, &Theme) -> Option<String>;

#[derive(Clone, Copy, Default)]
struct Functional {
    theme_keys: &'static [&'static str],
    bare_value: Option<BareValueFn>,
    negative: bool,
    fractions: bool,
}

/// Register the built-in utilities.
pub fn register_builtin_utilities(utilities: &mut Utilities) {
    register_layout(utilities);
    register_flexbox(utilities);
    register_typography(utilities);
    register_spacing(utilities);
    register_sizing(utilities);
    register_colors(utilities);
    register_effects(utilities);
}

fn register_layout(utilities: &mut Utilities) {
    let statics: &[(&'static str, Declarations)] = &[
        ("block", &[("display", "block")]),
        ("inline-block", &[("display", "inline-block")]),
        ("inline", &[("display", "inline")]),
        ("flex", &[("display", "flex")]),
        ("inline-flex", &[("display", "inline-flex")]),
        ("grid", &[("display", "grid")]),
        ("inline-grid", &[("display", "inline-grid")]),
        ("table", &[("display", "table")]),
        ("contents", &[("display", "contents")]),
        ("hidden", &[("display", "none")]),
        ("static", &[("position", "static")]),
        ("fixed", &[("position", "fixed")]),
        ("absolute", &[("position", "absolute")]),
        ("relative", &[("position", "relative")]),
        ("sticky", &[("position", "sticky")]),
        ("visible", &[("visibility", "visible")]),
        ("invisible", &[("visibility", "hidden")]),
        ("collapse", &[("visibility", "collapse")]),
        ("box-border", &[("box-sizing", "border-box")]),
        ("box-content", &[("box-sizing", "content-box")]),
        ("overflow-auto", &[("overflow", "auto")]),
        ("overflow-hidden", &[("overflow", "hidden")]),
        ("overflow-clip", &[("overflow", "clip")]),
        ("overflow-visible", &[("overflow", "visible")]),
        ("overflow-scroll", &[("overflow", "scroll")]),
        ("overflow-x-auto", &[("overflow-x", "auto")]),
        ("overflow-x-hidden", &[("overflow-x", "hidden")]),
        ("overflow-x-scroll", &[("overflow-x", "scroll")]),
        ("overflow-y-auto", &[("overflow-y", "auto")]),
        ("overflow-y-hidden", &[("overflow-y", "hidden")]),
        ("overflow-y-scroll", &[("overflow-y", "scroll")]),
        ("pointer-events-none", &[("pointer-events", "none")]),
        ("pointer-events-auto", &[("pointer-events", "auto")]),
        ("select-none", &[("user-select", "none")]),
        ("select-text", &[("user-select", "text")]),
        ("select-all", &[("user-select", "all")]),
        ("cursor-pointer", &[("cursor", "pointer")]),
        ("cursor-default", &[("cursor", "default")]),
        ("cursor-not-allowed", &[("cursor", "not-allowed")]),
        ("grid-cols-none", &[("grid-template-columns", "none")]),
        ("grid-cols-subgrid", &[("grid-template-columns", "subgrid")]),
        ("col-span-full", &[("grid-column", "1 / -1")]),
        ("order-first", &[("order", "calc(-infinity)")]),
        ("order-last", &[("order", "calc(infinity)")]),
        ("order-none", &[("order", "0")]),
        ("z-auto", &[("z-index", "auto")]),
        ("aspect-auto", &[("aspect-ratio", "auto")]),
        ("aspect-square", &[("aspect-ratio", "1 / 1")]),
        ("aspect-video", &[("aspect-ratio", "var(--aspect-video, 16 / 9)")]),
    ];
    for &(name, declarations) in statics {
        static_utility(utilities, name, declarations);
    }

    let insets = [
        ("inset", "inset"),
        ("inset-x", "inset-inline"),
        ("inset-y", "inset-block"),
        ("top", "top"),
        ("right", "right"),
        ("bottom", "bottom"),
        ("left", "left"),
    ];
    for (name, property) in insets {
        static_utility_owned(utilities, format!("{}-auto", name), property, "auto");
        static_utility_owned(utilities, format!("{}-full", name), property, "100%");
        functional_utility(
            utilities,
            name,
            Functional {
                theme_keys: &["--inset", "--spacing"],
                bare_value: Some(spacing_value),
                negative: true,
                fractions: true,
                ..Functional::default()
            },
            move |value| vec![Node::decl(property, value)],
        );
    }

    functional_utility(
        utilities,
        "z",
        Functional {
            theme_keys: &["--z-index"],
            bare_value: Some(integer_value),
            negative: true,
            ..Functional::default()
        },
        |value| vec![Node::decl("z-index", value)],
    );
    functional_utility(
        utilities,
        "order",
        Functional {
            theme_keys: &["--order"],
            bare_value: Some(integer_value),
            negative: true,
            ..Functional::default()
        },
        |value| vec![Node::decl("order", value)],
    );
    functional_utility(
        utilities,
        "grid-cols",
        Functional {
            theme_keys: &["--grid-template-columns"],
            bare_value: Some(|value, _| {
                let CandidateValue::Named(value) = value else {
                    return None;
                };
                is_positive_integer(value).then(|| format!("repeat({}, minmax(0, 1fr))", value))
            }),
            ..Functional::default()
        },
        |value| vec![Node::decl("grid-template-columns", value)],
    );
    functional_utility(
        utilities,
        "col-span",
        Functional {
            bare_value: Some(integer_value),
            ..Functional::default()
        },
        |value| vec![Node::decl("grid-column", format!("span {} / span {}", value, value))],
    );
    functional_utility(
        utilities,
        "aspect",
        Functional {
            theme_keys: &["--aspect"],
            bare_value: Some(|value, _| {
                let CandidateValue::Fraction(fraction) = value else {
                    return None;
                };
                match segment(fraction, '/').as_slice() {
                    [l, r] if is_positive_integer(l) && is_positive_integer(r) => Some(fraction.clone()),
                    _ => None,
                }
            }),
            ..Functional::default()
        },
        |value| vec![Node::decl("aspect-ratio", value)],
    );
}

fn register_flexbox(utilities: &mut Utilities) {
    let statics: &[(&'static str, Declarations)] = &[
        ("flex-row", &[("flex-direction", "row")]),
        ("flex-row-reverse", &[("flex-direction", "row-reverse")]),
        ("flex-col", &[("flex-direction", "column")]),
        ("flex-col-reverse", &[("flex-direction", "column-reverse")]),
        ("flex-wrap", &[("flex-wrap", "wrap")]),
        ("flex-wrap-reverse", &[("flex-wrap", "wrap-reverse")]),
        ("flex-nowrap", &[("flex-wrap", "nowrap")]),
        ("flex-1", &[("flex", "1")]),
        ("flex-auto", &[("flex", "auto")]),
        ("flex-initial", &[("flex", "0 auto")]),
        ("flex-none", &[("flex", "none")]),
        ("grow", &[("flex-grow", "1")]),
        ("grow-0", &[("flex-grow", "0")]),
        ("shrink", &[("flex-shrink", "1")]),
        ("shrink-0", &[("flex-shrink", "0")]),
        ("items-start", &[("align-items", "flex-start")]),
        ("items-end", &[("align-items", "flex-end")]),
        ("items-center", &[("align-items", "center")]),
        ("items-baseline", &[("align-items", "baseline")]),
        ("items-stretch", &[("align-items", "stretch")]),
        ("justify-start", &[("justify-content", "flex-start")]),
        ("justify-end", &[("justify-content", "flex-end")]),
        ("justify-center", &[("justify-content", "center")]),
        ("justify-between", &[("justify-content", "space-between")]),
        ("justify-around", &[("justify-content", "space-around")]),
        ("justify-evenly", &[("justify-content", "space-evenly")]),
        ("self-auto", &[("align-self", "auto")]),
        ("self-start", &[("align-self", "flex-start")]),
        ("self-end", &[("align-self", "flex-end")]),
        ("self-center", &[("align-self", "center")]),
        ("self-stretch", &[("align-self", "stretch")]),
    ];
    for &(name, declarations) in statics {
        static_utility(utilities, name, declarations);
    }
}

fn register_typography(utilities: &mut Utilities) {
    let statics: &[(&'static str, Declarations)] = &[
        ("italic", &[("font-style", "italic")]),
        ("not-italic", &[("font-style", "normal")]),
        ("underline", &[("text-decoration-line", "underline")]),
        ("overline", &[("text-decoration-line", "overline")]),
        ("line-through", &[("text-decoration-line", "line-through")]),
        ("no-underline", &[("text-decoration-line", "none")]),
        ("uppercase", &[("text-transform", "uppercase")]),
        ("lowercase", &[("text-transform", "lowercase")]),
        ("capitalize", &[("text-transform", "capitalize")]),
        ("normal-case", &[("text-transform", "none")]),
        ("truncate", &[("overflow", "hidden"), ("text-overflow", "ellipsis"), ("white-space", "nowrap")]),
        ("text-left", &[("text-align", "left")]),
        ("text-center", &[("text-align", "center")]),
        ("text-right", &[("text-align", "right")]),
        ("text-justify", &[("text-align", "justify")]),
        ("whitespace-normal", &[("white-space", "normal")]),
        ("whitespace-nowrap", &[("white-space", "nowrap")]),
        ("whitespace-pre", &[("white-space", "pre")]),
        ("leading-none", &[("line-height", "1")]),
        ("content-none", &[("--tw-content", "none"), ("content", "none")]),
    ];
    for &(name, declarations) in statics {
        static_utility(utilities, name, declarations);
    }

    functional_utility(
        utilities,
        "leading",
        Functional {
            theme_keys: &["--leading"],
            bare_value: Some(spacing_value),
            ..Functional::default()
        },
        |value| vec![Node::decl("line-height", value)],
    );
    functional_utility(
        utilities,
        "tracking",
        Functional {
            theme_keys: &["--tracking"],
            negative: true,
            ..Functional::default()
        },
        |value| vec![Node::decl("letter-spacing", value)],
    );

    utilities.functional(
        "font",
        |candidate, theme| {
            if candidate.negative || candidate.modifier().is_some() {
                return None;
            }
            match candidate.value()? {
                CandidateValue::Arbitrary { value, data_type } => {
                    let kind = data_type
                        .as_deref()
                        .or_else(|| infer_data_type(value, &["number", "generic-name", "family-name"]));
                    match kind {
                        Some("number") => Some(vec![Node::decl("font-weight", value.clone())]),
                        _ => Some(vec![Node::decl("font-family", value.clone())]),
                    }
                }
                CandidateValue::Named(value) => {
                    if let Some(family) = theme.resolve(Some(value), &["--font"]) {
                        return Some(vec![Node::decl("font-family", family)]);
                    }
                    let weight = theme.resolve(Some(value), &["--font-weight"])?;
                    Some(vec![Node::decl("font-weight", weight)])
                }
                CandidateValue::Fraction(_) => None,
            }
        },
        UtilityOptions {
            types: vec!["number", "generic-name", "family-name"],
        },
    );

    utilities.functional(
        "text",
        |candidate, theme| {
            if candidate.negative {
                return None;
            }
            match candidate.value()? {
                CandidateValue::Arbitrary { value, data_type } => {
                    let kind = data_type.as_deref().or_else(|| {
                        infer_data_type(value, &["color", "length", "percentage", "absolute-size", "relative-size"])
                    });
                    match kind {
                        Some("length" | "percentage" | "absolute-size" | "relative-size") => {
                            font_size(value.clone(), None, candidate.modifier(), theme)
                        }
                        _ => {
                            let color = as_color(value, candidate.modifier(), theme)?;
                            Some(vec![Node::decl("color", color)])
                        }
                    }
                }
                CandidateValue::Named(value) => {
                    if let Some(color) = theme.resolve(Some(value), &["--text-color", "--color"]) {
                        let color = as_color(&color, candidate.modifier(), theme)?;
                        return Some(vec![Node::decl("color", color)]);
                    }
                    let (size, nested) = theme.resolve_with(Some(value), &["--text"], &["--line-height"])?;
                    let line_height = nested.into_iter().next().map(|(_, value)| value);
                    font_size(size, line_height, candidate.modifier(), theme)
                }
                CandidateValue::Fraction(_) => None,
            }
        },
        UtilityOptions {
            types: vec!["color", "length", "percentage", "absolute-size", "relative-size"],
        },
    );

    utilities.functional(
        "content",
        |candidate, _| {
            let CandidateValue::Arbitrary { value, .. } = candidate.value()? else {
                return None;
            };
            if candidate.negative || candidate.modifier().is_some() {
                return None;
            }
            Some(vec![
                Node::decl("--tw-content", value.clone()),
                Node::decl("content", "var(--tw-content)"),
            ])
        },
        UtilityOptions::default(),
    );
}

/// `text-sm`, `text-sm/6`, `text-[14px]/[20px]`.
fn font_size(
    size: String,
    line_height: Option<String>,
    modifier: Option<&CandidateModifier>,
    theme: &Theme,
) -> Option<Vec<Node>> {
    let line_height = match modifier {
        None => line_height,
        Some(CandidateModifier::Arbitrary(value)) => Some(value.clone()),
        Some(CandidateModifier::Named(value)) => match theme.resolve(Some(value), &["--leading"]) {
            Some(resolved) => Some(resolved),
            None => Some(spacing_value(&CandidateValue::Named(value.clone()), theme)?),
        },
    };

    let mut declarations = vec![Node::decl("font-size", size)];
    if let Some(line_height) = line_height {
        declarations.push(Node::decl("line-height", line_height));
    }
    Some(declarations)
}

fn register_spacing(utilities: &mut Utilities) {
    let padding: &[(&'static str, &'static [&'static str])] = &[
        ("p", &["padding"]),
        ("px", &["padding-inline"]),
        ("py", &["padding-block"]),
        ("pt", &["padding-top"]),
        ("pr", &["padding-right"]),
        ("pb", &["padding-bottom"]),
        ("pl", &["padding-left"]),
    ];
    for &(name, properties) in padding {
        spacing_utility(utilities, name, &["--padding", "--spacing"], properties, false);
    }

    let margin: &[(&'static str, &'static [&'static str])] = &[
        ("m", &["margin"]),
        ("mx", &["margin-inline"]),
        ("my", &["margin-block"]),
        ("mt", &["margin-top"]),
        ("mr", &["margin-right"]),
        ("mb", &["margin-bottom"]),
        ("ml", &["margin-left"]),
    ];
    for &(name, properties) in margin {
        for property in properties {
            static_utility_owned(utilities, format!("{}-auto", name), property, "auto");
        }
        spacing_utility(utilities, name, &["--margin", "--spacing"], properties, true);
    }

    let gap: &[(&'static str, &'static [&'static str])] =
        &[("gap", &["gap"]), ("gap-x", &["column-gap"]), ("gap-y", &["row-gap"])];
    for &(name, properties) in gap {
        spacing_utility(utilities, name, &["--gap", "--spacing"], properties, false);
    }
}

fn register_sizing(utilities: &mut Utilities) {
    let sizing: &[(&'static str, &'static [&'static str], &'static [&'static str], &'static str)] = &[
        ("w", &["width"], &["--width", "--spacing", "--container"], "100vw"),
        ("h", &["height"], &["--height", "--spacing"], "100vh"),
        ("size", &["width", "height"], &["--size", "--spacing"], ""),
        ("min-w", &["min-width"], &["--min-width", "--spacing", "--container"], ""),
        ("max-w", &["max-width"], &["--max-width", "--spacing", "--container"], ""),
        ("min-h", &["min-height"], &["--min-height", "--spacing"], "100vh"),
        ("max-h", &["max-height"], &["--max-height", "--spacing"], "100vh"),
    ];

    for &(name, properties, theme_keys, screen) in sizing {
        let mut keywords = vec![
            ("full", "100%"),
            ("min", "min-content"),
            ("max", "max-content"),
            ("fit", "fit-content"),
            ("px", "1px"),
        ];
        if !name.starts_with("max") {
            keywords.push(("auto", "auto"));
        } else {
            keywords.push(("none", "none"));
        }
        if !screen.is_empty() {
            keywords.push(("screen", screen));
        }
        for (suffix, value) in keywords {
            let declarations: Vec<Node> = properties.iter().map(|p| Node::decl(*p, value)).collect();
            utilities.static_utility(format!("{}-{}", name, suffix), move |_, _| Some(declarations.clone()));
        }

        functional_utility(
            utilities,
            name,
            Functional {
                theme_keys,
                bare_value: Some(spacing_value),
                fractions: true,
                ..Functional::default()
            },
            move |value| properties.iter().map(|p| Node::decl(*p, value)).collect(),
        );
    }
}

fn register_colors(utilities: &mut Utilities) {
    utilities.functional(
        "bg",
        |candidate, theme| {
            if candidate.negative {
                return None;
            }
            match candidate.value()? {
                CandidateValue::Arbitrary { value, data_type } => {
                    let kind = data_type.as_deref().or_else(|| {
                        infer_data_type(value, &["image", "url", "color", "percentage", "position", "bg-size", "length"])
                    });
                    let property = match kind {
                        Some("image" | "url") => "background-image",
                        Some("position" | "percentage") => "background-position",
                        Some("bg-size" | "length") => "background-size",
                        _ => {
                            let color = as_color(value, candidate.modifier(), theme)?;
                            return Some(vec![Node::decl("background-color", color)]);
                        }
                    };
                    if candidate.modifier().is_some() {
                        return None;
                    }
                    Some(vec![Node::decl(property, value.clone())])
                }
                CandidateValue::Named(value) => {
                    let color = theme.resolve(Some(value), &["--background-color", "--color"])?;
                    let color = as_color(&color, candidate.modifier(), theme)?;
                    Some(vec![Node::decl("background-color", color)])
                }
                CandidateValue::Fraction(_) => None,
            }
        },
        UtilityOptions {
            types: vec!["image", "url", "color", "percentage", "position", "bg-size", "length"],
        },
    );
    color_keywords(utilities, "bg", &["background-color"]);

    let colors: &[(&'static str, &'static [&'static str], &'static [&'static str])] = &[
        ("fill", &["--fill", "--color"], &["fill"]),
        ("decoration", &["--text-decoration-color", "--color"], &["text-decoration-color"]),
        ("accent", &["--accent-color", "--color"], &["accent-color"]),
        ("caret", &["--caret-color", "--color"], &["caret-color"]),
    ];
    for &(name, theme_keys, properties) in colors {
        color_utility(utilities, name, theme_keys, properties);
    }

    let bordered: &[(&'static str, &'static str, &'static str, &'static [&'static str])] = &[
        ("border", "border-width", "border-color", &["--border-color", "--color"]),
        ("outline", "outline-width", "outline-color", &["--outline-color", "--color"]),
        ("stroke", "stroke-width", "stroke", &["--stroke", "--color"]),
    ];
    for &(name, width_property, color_property, theme_keys) in bordered {
        static_utility_owned(utilities, name.to_string(), width_property, "1px");
        color_keywords(utilities, name, std::slice::from_ref(&color_property));

        utilities.functional(
            name,
            move |candidate, theme| {
                if candidate.negative {
                    return None;
                }
                match candidate.value()? {
                    CandidateValue::Arbitrary { value, data_type } => {
                        let kind = data_type
                            .as_deref()
                            .or_else(|| infer_data_type(value, &["color", "line-width", "length", "number"]));
                        match kind {
                            Some("line-width" | "length" | "number") => {
                                if candidate.modifier().is_some() {
                                    return None;
                                }
                                Some(vec![Node::decl(width_property, value.clone())])
                            }
                            _ => {
                                let color = as_color(value, candidate.modifier(), theme)?;
                                Some(vec![Node::decl(color_property, color)])
                            }
                        }
                    }
                    CandidateValue::Named(value) => {
                        if let Some(color) = theme.resolve(Some(value), theme_keys) {
                            let color = as_color(&color, candidate.modifier(), theme)?;
                            return Some(vec![Node::decl(color_property, color)]);
                        }
                        if candidate.modifier().is_some() || !is_positive_integer(value) && value != "0" {
                            return None;
                        }
                        let width = if name == "stroke" {
                            value.clone()
                        } else {
                            format!("{}px", value)
                        };
                        Some(vec![Node::decl(width_property, width)])
                    }
                    CandidateValue::Fraction(_) => None,
                }
            },
            UtilityOptions {
                types: vec!["color", "line-width", "length", "number"],
            },
        );
    }
}

fn register_effects(utilities: &mut Utilities) {
    static_utility(utilities, "animate-none", &[("animation", "none")]);
    static_utility(utilities, "ease-linear", &[("transition-timing-function", "linear")]);
    static_utility(utilities, "ease-initial", &[("transition-timing-function", "initial")]);
    static_utility(utilities, "rounded-none", &[("border-radius", "0")]);
    static_utility(utilities, "rounded-full", &[("border-radius", "calc(infinity * 1px)")]);

    functional_utility(
        utilities,
        "opacity",
        Functional {
            theme_keys: &["--opacity"],
            bare_value: Some(|value, _| {
                let CandidateValue::Named(value) = value else {
                    return None;
                };
                is_valid_opacity_value(value).then(|| format!("{}%", value))
            }),
            ..Functional::default()
        },
        |value| vec![Node::decl("opacity", value)],
    );
    functional_utility(
        utilities,
        "rounded",
        Functional {
            theme_keys: &["--radius"],
            ..Functional::default()
        },
        |value| vec![Node::decl("border-radius", value)],
    );
    functional_utility(
        utilities,
        "duration",
        Functional {
            theme_keys: &["--transition-duration"],
            bare_value: Some(|value, _| {
                let CandidateValue::Named(value) = value else {
                    return None;
                };
                is_positive_integer(value).then(|| format!("{}ms", value))
            }),
            ..Functional::default()
        },
        |value| vec![Node::decl("transition-duration", value)],
    );
    functional_utility(
        utilities,
        "ease",
        Functional {
            theme_keys: &["--ease"],
            ..Functional::default()
        },
        |value| vec![Node::decl("transition-timing-function", value)],
    );
    functional_utility(
        utilities,
        "animate",
        Functional {
            theme_keys: &["--animate"],
            ..Functional::default()
        },
        |value| vec![Node::decl("animation", value)],
    );
}

fn static_utility(utilities: &mut Utilities, name: &str, declarations: Declarations) {
    utilities.static_utility(name, move |_, _| {
        Some(declarations.iter().map(|(p, v)| Node::decl(*p, *v)).collect())
    });
}

fn static_utility_owned(utilities: &mut Utilities, name: String, property: &'static str, value: &'static str) {
    utilities.static_utility(name, move |_, _| Some(vec![Node::decl(property, value)]));
}

/// A value-taking utility: theme lookup first, then fractions, then the bare
/// value handler. Arbitrary values are used as-is.
fn functional_utility<F>(utilities: &mut Utilities, name: &str, options: Functional, handle: F)
where
    F: Fn(&str) -> Vec<Node> + Send + Sync + 'static,
{
    utilities.functional(
        name,
        move |candidate, theme| {
            if candidate.negative && !options.negative {
                return None;
            }
            let value = resolve_functional_value(candidate, theme, &options)?;
            let value = if candidate.negative {
                format!("calc({} * -1)", value)
            } else {
                value
            };
            Some(handle(&value))
        },
        UtilityOptions::default(),
    );
}

fn resolve_functional_value(candidate: &Candidate, theme: &Theme, options: &Functional) -> Option<String> {
    let Some(value) = candidate.value() else {
        if candidate.modifier().is_some() {
            return None;
        }
        return theme.resolve(None, options.theme_keys);
    };

    if candidate.modifier().is_some() {
        return None;
    }

    match value {
        CandidateValue::Arbitrary { value, .. } => Some(value.clone()),
        CandidateValue::Named(named) => theme
            .resolve(Some(named), options.theme_keys)
            .or_else(|| options.bare_value.and_then(|bare| bare(value, theme))),
        CandidateValue::Fraction(fraction) => {
            if let Some(resolved) = theme.resolve(Some(fraction), options.theme_keys) {
                return Some(resolved);
            }
            if options.fractions
                && let [l, r] = segment(fraction, '/').as_slice()
                && is_positive_integer(l)
                && is_positive_integer(r)
            {
                return Some(format!("calc({} * 100%)", fraction));
            }
            options.bare_value.and_then(|bare| bare(value, theme))
        }
    }
}

fn spacing_utility(
    utilities: &mut Utilities,
    name: &str,
    theme_keys: &'static [&'static str],
    properties: &'static [&'static str],
    negative: bool,
) {
    functional_utility(
        utilities,
        name,
        Functional {
            theme_keys,
            bare_value: Some(spacing_value),
            negative,
            ..Functional::default()
        },
        move |value| properties.iter().map(|p| Node::decl(*p, value)).collect(),
    );
}

/// `4` becomes `calc(var(--spacing) * 4)` when the theme defines `--spacing`.
fn spacing_value(value: &CandidateValue, theme: &Theme) -> Option<String> {
    let CandidateValue::Named(value) = value else {
        return None;
    };
    let multiplier = theme.resolve(None, &["--spacing"])?;
    is_valid_spacing_multiplier(value).then(|| format!("calc({} * {})", multiplier, value))
}

fn integer_value(value: &CandidateValue, _: &Theme) -> Option<String> {
    let CandidateValue::Named(value) = value else {
        return None;
    };
    (is_positive_integer(value) || value == "0").then(|| value.clone())
}

fn color_keywords(utilities: &mut Utilities, name: &str, properties: &[&str]) {
    for (suffix, value) in [("inherit", "inherit"), ("current", "currentcolor"), ("transparent", "transparent")] {
        let declarations: Vec<Node> = properties.iter().map(|p| Node::decl(*p, value)).collect();
        utilities.static_utility(format!("{}-{}", name, suffix), move |_, _| Some(declarations.clone()));
    }
}

/// A single-purpose color utility. Arbitrary values are trusted to be colors.
fn color_utility(
    utilities: &mut Utilities,
    name: &str,
    theme_keys: &'static [&'static str],
    properties: &'static [&'static str],
) {
    color_keywords(utilities, name, properties);
    utilities.functional(
        name,
        move |candidate, theme| {
            if candidate.negative {
                return None;
            }
            let value = match candidate.value()? {
                CandidateValue::Arbitrary { value, .. } => value.clone(),
                CandidateValue::Named(value) => theme.resolve(Some(value), theme_keys)?,
                CandidateValue::Fraction(_) => return None,
            };
            let value = as_color(&value, candidate.modifier(), theme)?;
            Some(properties.iter().map(|p| Node::decl(*p, value.clone())).collect())
        },
        UtilityOptions { types: vec!["color"] },
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::{CandidateKind, parse_candidate};
    use crate::utilities::UtilityKind;
    use crate::theme::ThemeOptions;
    use crate::variants::Variants;

    fn compile(raw: &str) -> Option<Vec<Node>> {
        let mut theme = Theme::new();
        for (key, value) in [
            ("--spacing", "0.25rem"),
            ("--color-red-500", "#ef4444"),
            ("--text-sm", "0.875rem"),
            ("--text-sm--line-height", "1.25rem"),
            ("--font-sans", "ui-sans-serif"),
            ("--font-weight-bold", "700"),
            ("--radius", "0.25rem"),
        ] {
            theme.add(key, value, ThemeOptions::empty()).unwrap();
        }

        let mut utilities = Utilities::new();
        register_builtin_utilities(&mut utilities);
        let variants = Variants::new();

        parse_candidate(raw, &utilities, &variants, None)
            .into_iter()
            .find_map(|candidate| {
                let (root, kind) = match &candidate.kind {
                    CandidateKind::Static { root } => (root, UtilityKind::Static),
                    CandidateKind::Functional { root, .. } => (root, UtilityKind::Functional),
                    CandidateKind::Arbitrary { .. } => return None,
                };
                utilities
                    .get(root)
                    .iter()
                    .filter(|u| u.kind == kind)
                    .find_map(|u| (u.compile_fn)(&candidate, &theme))
            })
    }

    #[test]
    fn spacing_uses_multiplier() {
        assert_eq!(compile("p-4"), Some(vec![Node::decl("padding", "calc(var(--spacing) * 4)")]));
        assert_eq!(
            compile("-mt-2"),
            Some(vec![Node::decl("margin-top", "calc(calc(var(--spacing) * 2) * -1)")])
        );
        assert_eq!(compile("p-1.3"), None);
        assert_eq!(compile("-p-4"), None);
    }

    #[test]
    fn fractions_and_keywords() {
        assert_eq!(compile("w-1/2"), Some(vec![Node::decl("width", "calc(1/2 * 100%)")]));
        assert_eq!(compile("w-full"), Some(vec![Node::decl("width", "100%")]));
        assert_eq!(compile("aspect-16/9"), Some(vec![Node::decl("aspect-ratio", "16/9")]));
    }

    #[test]
    fn colors_with_opacity() {
        assert_eq!(
            compile("bg-red-500/50"),
            Some(vec![Node::decl(
                "background-color",
                "color-mix(in oklab, var(--color-red-500) 50%, transparent)"
            )])
        );
        assert_eq!(compile("bg-[url(/a.png)]"), Some(vec![Node::decl("background-image", "url(/a.png)")]));
        assert_eq!(compile("bg-blue-500"), None);
        assert_eq!(compile("border-2"), Some(vec![Node::decl("border-width", "2px")]));
        assert_eq!(compile("border-red-500"), Some(vec![Node::decl("border-color", "var(--color-red-500)")]));
    }

    #[test]
    fn text_color_or_size() {
        assert_eq!(compile("text-red-500"), Some(vec![Node::decl("color", "var(--color-red-500)")]));
        assert_eq!(
            compile("text-sm"),
            Some(vec![
                Node::decl("font-size", "var(--text-sm)"),
                Node::decl("line-height", "var(--text-sm--line-height)"),
            ])
        );
        assert_eq!(
            compile("text-sm/6"),
            Some(vec![
                Node::decl("font-size", "var(--text-sm)"),
                Node::decl("line-height", "calc(var(--spacing) * 6)"),
            ])
        );
        assert_eq!(compile("text-[14px]"), Some(vec![Node::decl("font-size", "14px")]));
    }

    #[test]
    fn font_family_or_weight() {
        assert_eq!(compile("font-sans"), Some(vec![Node::decl("font-family", "var(--font-sans)")]));
        assert_eq!(compile("font-bold"), Some(vec![Node::decl("font-weight", "var(--font-weight-bold)")]));
        assert_eq!(compile("font-[600]"), Some(vec![Node::decl("font-weight", "600")]));
    }

    #[test]
    fn defaults_and_bare_values() {
        assert_eq!(compile("rounded"), Some(vec![Node::decl("border-radius", "var(--radius)")]));
        assert_eq!(compile("opacity-50"), Some(vec![Node::decl("opacity", "50%")]));
        assert_eq!(
            compile("grid-cols-3"),
            Some(vec![Node::decl("grid-template-columns", "repeat(3, minmax(0, 1fr))")])
        );
        assert_eq!(compile("-z-10"), Some(vec![Node::decl("z-index", "calc(10 * -1)")]));
        assert_eq!(compile("duration-150"), Some(vec![Node::decl("transition-duration", "150ms")]));
    }
}
