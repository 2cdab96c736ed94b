//! Bracket- and quote-aware string splitting.

/// Split `input` on `separator`, ignoring separators nested inside `()`, `[]`,
/// `{}` or quoted strings. Backslash escapes the next character.
///
/// ```ignore
/// assert_eq!(segment("a:[b:c]:d", ':'), vec!["a", "[b:c]", "d"]);
/// ```
pub fn segment(input: &str, separator: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut stack: Vec<char> = Vec::new();
    let mut quote: Option<char> = None;
    let mut last = 0;
    let mut chars = input.char_indices();

    while let Some((idx, ch)) = chars.next() {
        if ch == '\\' {
            chars.next();
            continue;
        }

        if let Some(q) = quote {
            if ch == q {
                quote = None;
            }
            continue;
        }

        match ch {
            '"' | '\'' => quote = Some(ch),
            '(' => stack.push(')'),
            '[' => stack.push(']'),
            '{' => stack.push('}'),
            ')' | ']' | '}' => {
                if stack.last() == Some(&ch) {
                    stack.pop();
                }
            }
            _ if ch == separator && stack.is_empty() => {
                parts.push(&input[last..idx]);
                last = idx + ch.len_utf8();
            }
            _ => {}
        }
    }

    parts.push(&input[last..]);
    parts
}

/// Split on runs of ASCII whitespace at depth zero, dropping empty parts.
pub fn split_whitespace(input: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start: Option<usize> = None;
    let mut chars = input.char_indices();

    while let Some((idx, ch)) = chars.next() {
        if ch == '\\' {
            start.get_or_insert(idx);
            chars.next();
            continue;
        }

        if let Some(q) = quote {
            if ch == q {
                quote = None;
            }
            continue;
        }

        match ch {
            '"' | '\'' => {
                start.get_or_insert(idx);
                quote = Some(ch);
            }
            '(' | '[' | '{' => {
                start.get_or_insert(idx);
                depth += 1;
            }
            ')' | ']' | '}' => {
                depth = depth.saturating_sub(1);
            }
            _ if ch.is_ascii_whitespace() && depth == 0 => {
                if let Some(s) = start.take() {
                    parts.push(&input[s..idx]);
                }
            }
            _ => {
                start.get_or_insert(idx);
            }
        }
    }

    if let Some(s) = start {
        parts.push(&input[s..]);
    }

    parts
}
