//! CSS identifier escaping (CSSOM `CSS.escape`) and its inverse.

use std::fmt::Write;

/// Escape a string so it can be used as a CSS identifier, e.g. a class name
/// in a selector.
pub fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 4);
    let chars: Vec<char> = value.chars().collect();
    let first = chars.first().copied();

    for (idx, &ch) in chars.iter().enumerate() {
        let code = ch as u32;

        if code == 0 {
            out.push('\u{FFFD}');
            continue;
        }

        let leading_digit = ch.is_ascii_digit() && (idx == 0 || (idx == 1 && first == Some('-')));
        if (0x01..=0x1F).contains(&code) || code == 0x7F || leading_digit {
            let _ = write!(out, "\\{:x} ", code);
            continue;
        }

        if idx == 0 && chars.len() == 1 && ch == '-' {
            out.push_str("\\-");
            continue;
        }

        if code >= 0x80 || ch == '-' || ch == '_' || ch.is_ascii_alphanumeric() {
            out.push(ch);
            continue;
        }

        out.push('\\');
        out.push(ch);
    }

    out
}

/// Reverse [`escape`]: drop backslashes and decode hex escapes.
pub fn unescape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }

        let mut hex = String::new();
        while hex.len() < 6 {
            match chars.peek() {
                Some(c) if c.is_ascii_hexdigit() => {
                    hex.push(*c);
                    chars.next();
                }
                _ => break,
            }
        }

        if hex.is_empty() {
            if let Some(next) = chars.next() {
                out.push(next);
            }
            continue;
        }

        if chars.peek() == Some(&' ') {
            chars.next();
        }
        let decoded = u32::from_str_radix(&hex, 16)
            .ok()
            .and_then(char::from_u32)
            .unwrap_or('\u{FFFD}');
        out.push(decoded);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_candidate_punctuation() {
        assert_eq!(escape("hover:underline"), r"hover\:underline");
        assert_eq!(escape("w-1/2"), r"w-1\/2");
        assert_eq!(escape("bg-[--color-red]"), r"bg-\[--color-red\]");
        assert_eq!(escape("p-1.5"), r"p-1\.5");
    }

    #[test]
    fn escapes_leading_digits() {
        assert_eq!(escape("2xl"), r"\32 xl");
        assert_eq!(escape("-"), r"\-");
    }

    #[test]
    fn unescape_reverses_escape() {
        for input in ["--spacing-1.5", "2xl:flex", "w-1/2", "--x"] {
            assert_eq!(unescape(&escape(input)), input);
        }
    }
}
