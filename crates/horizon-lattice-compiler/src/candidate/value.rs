//! Arbitrary value decoding and data-type inference.

use crate::util::segment;
use regex::Regex;
use std::sync::LazyLock;

const MATH_FUNCTIONS: &[&str] = &[
    "calc", "min", "max", "clamp", "mod", "rem", "sin", "cos", "tan", "asin", "acos", "atan", "atan2", "pow",
    "sqrt", "hypot", "log", "exp", "round",
];

const LENGTH_UNITS: &str = "cm|mm|Q|in|pc|pt|px|em|ex|ch|rem|lh|rlh|vw|vh|vmin|vmax|vb|vi|svw|svh|lvw|lvh|dvw|dvh|cqw|cqh|cqi|cqb|cqmin|cqmax";

static NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[+-]?(\d+\.?\d*|\.\d+)(e[+-]?\d+)?$").expect("number regex should compile"));

static LENGTH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"^[+-]?(\d+\.?\d*|\.\d+)(e[+-]?\d+)?({})$", LENGTH_UNITS)).expect("length regex should compile")
});

static PERCENTAGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[+-]?(\d+\.?\d*|\.\d+)(e[+-]?\d+)?%$").expect("percentage regex should compile"));

static ANGLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?(\d+\.?\d*|\.\d+)(e[+-]?\d+)?(deg|rad|grad|turn)$").expect("angle regex should compile")
});

static HEX_COLOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^#([0-9a-fA-F]{3}|[0-9a-fA-F]{4}|[0-9a-fA-F]{6}|[0-9a-fA-F]{8})$").expect("hex regex should compile")
});

const COLOR_FUNCTIONS: &[&str] = &[
    "rgb", "rgba", "hsl", "hsla", "hwb", "lab", "lch", "oklab", "oklch", "color", "color-mix", "light-dark",
];

const NAMED_COLORS: &[&str] = &[
    "transparent", "currentcolor", "aliceblue", "antiquewhite", "aqua", "aquamarine", "azure", "beige",
    "bisque", "black", "blanchedalmond", "blue", "blueviolet", "brown", "burlywood", "cadetblue",
    "chartreuse", "chocolate", "coral", "cornflowerblue", "cornsilk", "crimson", "cyan", "darkblue",
    "darkcyan", "darkgoldenrod", "darkgray", "darkgreen", "darkgrey", "darkkhaki", "darkmagenta",
    "darkolivegreen", "darkorange", "darkorchid", "darkred", "darksalmon", "darkseagreen", "darkslateblue",
    "darkslategray", "darkslategrey", "darkturquoise", "darkviolet", "deeppink", "deepskyblue", "dimgray",
    "dimgrey", "dodgerblue", "firebrick", "floralwhite", "forestgreen", "fuchsia", "gainsboro", "ghostwhite",
    "gold", "goldenrod", "gray", "green", "greenyellow", "grey", "honeydew", "hotpink", "indianred", "indigo",
    "ivory", "khaki", "lavender", "lavenderblush", "lawngreen", "lemonchiffon", "lightblue", "lightcoral",
    "lightcyan", "lightgoldenrodyellow", "lightgray", "lightgreen", "lightgrey", "lightpink", "lightsalmon",
    "lightseagreen", "lightskyblue", "lightslategray", "lightslategrey", "lightsteelblue", "lightyellow",
    "lime", "limegreen", "linen", "magenta", "maroon", "mediumaquamarine", "mediumblue", "mediumorchid",
    "mediumpurple", "mediumseagreen", "mediumslateblue", "mediumspringgreen", "mediumturquoise",
    "mediumvioletred", "midnightblue", "mintcream", "mistyrose", "moccasin", "navajowhite", "navy", "oldlace",
    "olive", "olivedrab", "orange", "orangered", "orchid", "palegoldenrod", "palegreen", "paleturquoise",
    "palevioletred", "papayawhip", "peachpuff", "peru", "pink", "plum", "powderblue", "purple",
    "rebeccapurple", "red", "rosybrown", "royalblue", "saddlebrown", "salmon", "sandybrown", "seagreen",
    "seashell", "sienna", "silver", "skyblue", "slateblue", "slategray", "slategrey", "snow", "springgreen",
    "steelblue", "tan", "teal", "thistle", "tomato", "turquoise", "violet", "wheat", "white", "whitesmoke",
    "yellow", "yellowgreen", "canvas", "canvastext", "linktext", "visitedtext", "activetext", "buttonface",
    "buttontext", "field", "fieldtext", "highlight", "highlighttext", "graytext", "mark", "marktext",
    "accentcolor", "accentcolortext",
];

const GENERIC_FONT_NAMES: &[&str] = &[
    "serif", "sans-serif", "monospace", "cursive", "fantasy", "system-ui", "ui-serif", "ui-sans-serif",
    "ui-monospace", "ui-rounded", "math", "emoji", "fangsong",
];

const ABSOLUTE_SIZES: &[&str] = &["xx-small", "x-small", "small", "medium", "large", "x-large", "xx-large", "xxx-large"];

/// Decode the contents of an arbitrary value (`[...]`).
///
/// - `_` becomes a space, `\_` a literal underscore. Underscores inside
///   `url(...)` and in the name part of `var(...)` are kept.
/// - A bare `--custom-property` becomes `var(--custom-property)`.
/// - Operators inside math functions get surrounding whitespace, so
///   `calc(1rem+2px)` becomes `calc(1rem + 2px)`.
pub fn decode_arbitrary_value(input: &str) -> String {
    if input.starts_with("--") && !input.contains(['(', ' ', ',']) {
        return format!("var({})", input);
    }

    #[derive(Clone, Copy, PartialEq)]
    enum Scope {
        Url,
        VarName,
        Other,
    }

    let mut out = String::with_capacity(input.len());
    let mut stack: Vec<Scope> = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        let preserve = matches!(stack.last(), Some(Scope::Url | Scope::VarName));
        match ch {
            '\\' if chars.peek() == Some(&'_') => {
                chars.next();
                out.push('_');
            }
            '\\' => {
                out.push('\\');
                if let Some(next) = chars.next() {
                    out.push(next);
                }
            }
            '_' if !preserve => out.push(' '),
            '(' => {
                let scope = match trailing_ident(&out).as_str() {
                    "url" => Scope::Url,
                    "var" => Scope::VarName,
                    _ => Scope::Other,
                };
                stack.push(scope);
                out.push('(');
            }
            ')' => {
                stack.pop();
                out.push(')');
            }
            ',' => {
                if let Some(top) = stack.last_mut()
                    && *top == Scope::VarName
                {
                    *top = Scope::Other;
                }
                out.push(',');
            }
            _ => out.push(ch),
        }
    }

    if out.contains('(') {
        add_whitespace_around_math_operators(&out)
    } else {
        out
    }
}

fn trailing_ident(out: &str) -> String {
    let ident: String = out
        .chars()
        .rev()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '-')
        .collect();
    ident.chars().rev().collect::<String>().to_ascii_lowercase()
}

fn add_whitespace_around_math_operators(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    let mut out = String::with_capacity(input.len() + 8);
    let mut stack: Vec<bool> = Vec::new();
    let mut idx = 0;

    while idx < chars.len() {
        let ch = chars[idx];
        let in_math = stack.last().copied().unwrap_or(false);

        match ch {
            '(' => {
                let name = trailing_ident(&out);
                let is_math = MATH_FUNCTIONS.contains(&name.as_str()) || (name.is_empty() && in_math);
                stack.push(is_math);
                out.push('(');
            }
            ')' => {
                stack.pop();
                out.push(')');
            }
            '+' | '-' | '*' | '/' if in_math && is_binary_operator(&out, chars.get(idx + 1).copied()) => {
                let trimmed = out.trim_end().len();
                out.truncate(trimmed);
                out.push(' ');
                out.push(ch);
                out.push(' ');
                while chars.get(idx + 1).is_some_and(|c| c.is_whitespace()) {
                    idx += 1;
                }
            }
            _ => out.push(ch),
        }
        idx += 1;
    }

    out
}

fn is_binary_operator(before: &str, next: Option<char>) -> bool {
    let Some(prev) = before.trim_end().chars().last() else {
        return false;
    };
    let operand_before = prev.is_ascii_alphanumeric() || prev == ')' || prev == '%' || prev == '.';
    let operand_after = next.is_some_and(|c| !matches!(c, ')' | ','));
    operand_before && operand_after
}

/// Whether `value` uses a math function such as `calc()`.
pub fn has_math_function(value: &str) -> bool {
    MATH_FUNCTIONS
        .iter()
        .any(|name| value.contains(&format!("{}(", name)))
}

pub fn is_number(value: &str) -> bool {
    NUMBER.is_match(value)
}

pub fn is_positive_integer(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit())
}

/// Spacing multipliers are non-negative multiples of `0.25`.
pub fn is_valid_spacing_multiplier(value: &str) -> bool {
    if !is_number(value) || value.starts_with(['-', '+']) {
        return false;
    }
    value
        .parse::<f64>()
        .is_ok_and(|n| n >= 0.0 && (n * 4.0).fract() == 0.0)
}

/// Bare opacity values: a number between 0 and 100.
pub fn is_valid_opacity_value(value: &str) -> bool {
    is_number(value)
        && value
            .parse::<f64>()
            .is_ok_and(|n| (0.0..=100.0).contains(&n))
}

pub fn is_color(value: &str) -> bool {
    let lower = value.to_ascii_lowercase();
    if HEX_COLOR.is_match(&lower) || NAMED_COLORS.contains(&lower.as_str()) {
        return true;
    }
    match lower.find('(') {
        Some(idx) => COLOR_FUNCTIONS.contains(&&lower[..idx]) && lower.ends_with(')'),
        None => false,
    }
}

pub fn is_length(value: &str) -> bool {
    value == "0" || LENGTH.is_match(value) || has_math_function(value)
}

pub fn is_percentage(value: &str) -> bool {
    PERCENTAGE.is_match(value) || has_math_function(value)
}

fn is_url(value: &str) -> bool {
    value.starts_with("url(")
}

fn is_image(value: &str) -> bool {
    segment(value, ',').iter().all(|part| {
        let part = part.trim();
        is_url(part)
            || ["linear-gradient(", "radial-gradient(", "conic-gradient(", "repeating-", "image-set(", "image(", "cross-fade(", "element("]
                .iter()
                .any(|prefix| part.starts_with(prefix))
    })
}

fn is_family_name(value: &str) -> bool {
    segment(value, ',').iter().all(|part| {
        let part = part.trim();
        !part.is_empty()
            && (part.starts_with(['"', '\''])
                || GENERIC_FONT_NAMES.contains(&part)
                || part.split(' ').all(|word| word.chars().next().is_some_and(|c| c.is_alphabetic())))
    }) && (value.contains(',') || value.starts_with(['"', '\'']))
}

fn is_position(value: &str) -> bool {
    value.split(' ').all(|part| {
        matches!(part, "center" | "top" | "right" | "bottom" | "left") || is_length(part) || is_percentage(part)
    })
}

fn is_bg_size(value: &str) -> bool {
    segment(value, ',').iter().all(|layer| {
        let layer = layer.trim();
        matches!(layer, "cover" | "contain")
            || layer
                .split(' ')
                .all(|part| part == "auto" || is_length(part) || is_percentage(part))
    })
}

fn is_line_width(value: &str) -> bool {
    matches!(value, "thin" | "medium" | "thick") || is_length(value)
}

/// Infer the data type of an arbitrary value, trying `types` in order.
///
/// Values built from `var(...)` have no inferable type and return `None`;
/// utilities then fall back to their default interpretation.
pub fn infer_data_type(value: &str, types: &[&'static str]) -> Option<&'static str> {
    if value.starts_with("var(") {
        return None;
    }

    types.iter().copied().find(|ty| match *ty {
        "color" => is_color(value),
        "length" => is_length(value),
        "percentage" => is_percentage(value),
        "number" => is_number(value) || has_math_function(value),
        "integer" => is_positive_integer(value.trim_start_matches('-')),
        "url" => is_url(value),
        "image" => is_image(value),
        "angle" => ANGLE.is_match(value),
        "position" => is_position(value),
        "bg-size" => is_bg_size(value),
        "line-width" => is_line_width(value),
        "family-name" => is_family_name(value),
        "generic-name" => GENERIC_FONT_NAMES.contains(&value),
        "absolute-size" => ABSOLUTE_SIZES.contains(&value),
        "relative-size" => matches!(value, "larger" | "smaller"),
        _ => false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_underscores() {
        assert_eq!(decode_arbitrary_value("1px_solid_red"), "1px solid red");
        assert_eq!(decode_arbitrary_value(r"snake\_case"), "snake_case");
        assert_eq!(decode_arbitrary_value("url(/my_image.png)"), "url(/my_image.png)");
        assert_eq!(decode_arbitrary_value("var(--my_var,_10px)"), "var(--my_var, 10px)");
    }

    #[test]
    fn bare_custom_property_becomes_var() {
        assert_eq!(decode_arbitrary_value("--color-red"), "var(--color-red)");
    }

    #[test]
    fn spaces_math_operators() {
        assert_eq!(decode_arbitrary_value("calc(1rem+2px)"), "calc(1rem + 2px)");
        assert_eq!(decode_arbitrary_value("calc(100%-var(--x))"), "calc(100% - var(--x))");
        assert_eq!(decode_arbitrary_value("calc(1px*-1)"), "calc(1px * -1)");
        assert_eq!(decode_arbitrary_value("calc(var(--a-b)*2)"), "calc(var(--a-b) * 2)");
    }

    #[test]
    fn infers_types_in_order() {
        let types = ["color", "length", "percentage", "url"];
        assert_eq!(infer_data_type("#f00", &types), Some("color"));
        assert_eq!(infer_data_type("rgb(0 0 0 / 50%)", &types), Some("color"));
        assert_eq!(infer_data_type("12px", &types), Some("length"));
        assert_eq!(infer_data_type("50%", &types), Some("percentage"));
        assert_eq!(infer_data_type("url(/a.png)", &types), Some("url"));
        assert_eq!(infer_data_type("var(--x)", &types), None);
        assert_eq!(infer_data_type("calc(1px + 2px)", &["number", "length"]), Some("number"));
    }

    #[test]
    fn spacing_multipliers() {
        assert!(is_valid_spacing_multiplier("4"));
        assert!(is_valid_spacing_multiplier("1.5"));
        assert!(is_valid_spacing_multiplier("0.25"));
        assert!(!is_valid_spacing_multiplier("1.3"));
        assert!(!is_valid_spacing_multiplier("-1"));
        assert!(!is_valid_spacing_multiplier("auto"));
    }
}
