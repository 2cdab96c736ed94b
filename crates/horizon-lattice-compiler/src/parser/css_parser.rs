//! Stylesheet parser built on the `cssparser` tokenizer.
//!
//! The tokenizer does the hard part (strings, escapes, url tokens, balanced
//! blocks). This module only decides where each rule, at-rule and declaration
//! starts and ends, and slices the raw source text for selectors, params and
//! values so they print back byte-for-byte.

use crate::ast::Node;
use crate::{Error, Result};
use cssparser::{ParseError as CssParseError, ParseErrorKind, Parser, ParserInput, SourcePosition, Token};

type BlockResult<'i, T> = std::result::Result<T, CssParseError<'i, Error>>;

/// Parse a stylesheet into a list of nodes.
///
/// Unlike a browser, the parser does not recover from structural errors: a
/// stray `}` or a declaration without a `:` fails the whole parse.
///
/// # Example
///
/// ```ignore
/// let nodes = parse(".a { color: red; }")?;
/// assert_eq!(nodes.len(), 1);
/// ```
pub fn parse(css: &str) -> Result<Vec<Node>> {
    let mut input = ParserInput::new(css);
    let mut parser = Parser::new(&mut input);

    let nodes = parse_block(&mut parser, true).map_err(into_error)?;
    tracing::trace!(nodes = nodes.len(), "parsed stylesheet");
    Ok(nodes)
}

fn into_error(error: CssParseError<'_, Error>) -> Error {
    match error.kind {
        ParseErrorKind::Custom(error) => error,
        ParseErrorKind::Basic(kind) => Error::parse(
            format!("{:?}", kind),
            error.location.line + 1,
            error.location.column,
        ),
    }
}

/// Parse a sequence of rules, at-rules, declarations and comments until the
/// end of the current block.
fn parse_block<'i>(parser: &mut Parser<'i, '_>, top_level: bool) -> BlockResult<'i, Vec<Node>> {
    let mut nodes = vec![];

    loop {
        let start = parser.position();
        let location = parser.current_source_location();
        let token = match parser.next_including_whitespace_and_comments() {
            Ok(token) => token.clone(),
            Err(_) => break,
        };

        match token {
            Token::WhiteSpace(_) | Token::Semicolon => {}
            Token::Comment(text) => nodes.push(Node::comment(text.to_string())),
            Token::CloseCurlyBracket if top_level => {
                return Err(parser.new_custom_error(Error::parse(
                    "Missing opening {",
                    location.line + 1,
                    location.column,
                )));
            }
            Token::AtKeyword(name) => {
                let name = name.to_string();
                nodes.push(parse_at_rule(parser, name)?);
            }
            token => {
                skip_nested_block(parser, &token)?;
                nodes.push(parse_rule_or_declaration(parser, start)?);
            }
        }
    }

    Ok(nodes)
}

/// Parse the rest of an at-rule after its `@name` keyword.
fn parse_at_rule<'i>(parser: &mut Parser<'i, '_>, name: String) -> BlockResult<'i, Node> {
    let prelude = parser.position();

    loop {
        let before = parser.position();
        let token = match parser.next_including_whitespace_and_comments() {
            Ok(token) => token.clone(),
            Err(_) => {
                let params = parser.slice_from(prelude).trim().to_string();
                return Ok(Node::at_rule(name, params, vec![]));
            }
        };

        match token {
            Token::Semicolon => {
                let params = parser.slice(prelude..before).trim().to_string();
                return Ok(Node::at_rule(name, params, vec![]));
            }
            Token::CurlyBracketBlock => {
                let params = parser.slice(prelude..before).trim().to_string();
                let nodes = parser.parse_nested_block(|p| parse_block(p, false))?;
                return Ok(Node::at_rule(name, params, nodes));
            }
            Token::CloseCurlyBracket => {
                let location = parser.current_source_location();
                return Err(parser.new_custom_error(Error::parse(
                    format!("Unexpected }} in `@{}` prelude", name),
                    location.line + 1,
                    location.column,
                )));
            }
            token => skip_nested_block(parser, &token)?,
        }
    }
}

/// Parse a style rule (`{`-terminated) or a declaration (`;`-terminated, or
/// the last item of a block). The first token has already been consumed.
fn parse_rule_or_declaration<'i>(parser: &mut Parser<'i, '_>, start: SourcePosition) -> BlockResult<'i, Node> {
    let location = parser.current_source_location();
    let mut colon: Option<(SourcePosition, SourcePosition)> = None;

    loop {
        let before = parser.position();
        let token = match parser.next_including_whitespace_and_comments() {
            Ok(token) => token.clone(),
            Err(_) => {
                let end = parser.position();
                return declaration(parser, start, end, colon)
                    .map_err(|error| parser.new_custom_error(error));
            }
        };

        match token {
            Token::Colon if colon.is_none() => colon = Some((before, parser.position())),
            Token::Semicolon => {
                return declaration(parser, start, before, colon)
                    .map_err(|error| parser.new_custom_error(error));
            }
            Token::CurlyBracketBlock => {
                let selector = parser.slice(start..before).trim().to_string();
                let nodes = parser.parse_nested_block(|p| parse_block(p, false))?;
                return Ok(Node::rule(selector, nodes));
            }
            Token::CloseCurlyBracket => {
                return Err(parser.new_custom_error(Error::parse(
                    format!("Unexpected }} after `{}`", parser.slice(start..before).trim()),
                    location.line + 1,
                    location.column,
                )));
            }
            token => skip_nested_block(parser, &token)?,
        }
    }
}

/// Consume the rest of a `(`, `[` or function block so the next position
/// lies after its closing bracket. The tokenizer only skips blocks lazily.
fn skip_nested_block<'i>(parser: &mut Parser<'i, '_>, token: &Token<'i>) -> BlockResult<'i, ()> {
    if matches!(token, Token::Function(_) | Token::ParenthesisBlock | Token::SquareBracketBlock) {
        parser.parse_nested_block(|nested| {
            while nested.next_including_whitespace_and_comments().is_ok() {}
            Ok::<(), CssParseError<'i, Error>>(())
        })?;
    }
    Ok(())
}

fn declaration(
    parser: &Parser<'_, '_>,
    start: SourcePosition,
    end: SourcePosition,
    colon: Option<(SourcePosition, SourcePosition)>,
) -> Result<Node> {
    let Some((colon_start, colon_end)) = colon else {
        let location = parser.current_source_location();
        return Err(Error::parse(
            format!("Invalid declaration: `{}`", parser.slice(start..end).trim()),
            location.line + 1,
            location.column,
        ));
    };

    let property = parser.slice(start..colon_start).trim();
    let raw = parser.slice(colon_end..end).trim();
    let (value, important) = split_important(raw);

    Ok(Node::Declaration {
        property: property.to_string(),
        value: Some(value.to_string()),
        important,
    })
}

/// Split a trailing `!important` off a declaration value.
fn split_important(value: &str) -> (&str, bool) {
    let lower = value.to_ascii_lowercase();
    match lower.strip_suffix("important") {
        Some(rest) if rest.trim_end().ends_with('!') => {
            let bang = rest.trim_end().len() - 1;
            (value[..bang].trim_end(), true)
        }
        _ => (value, false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::to_css;

    #[test]
    fn parse_simple_rule() {
        let nodes = parse(".a { color: red; }").unwrap();

        assert_eq!(nodes, vec![Node::rule(".a", vec![Node::decl("color", "red")])]);
    }

    #[test]
    fn parse_nested_rules_and_at_rules() {
        let css = r#"
            @import "a.css" layer(base);
            .a {
                color: red;
                &:hover { color: blue }
                @media (hover: hover) { color: green; }
                @apply flex underline;
            }
        "#;
        let nodes = parse(css).unwrap();

        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0], Node::at_rule("import", "\"a.css\" layer(base)", vec![]));
        let Node::Rule { selector, nodes: children } = &nodes[1] else {
            panic!("expected rule");
        };
        assert_eq!(selector, ".a");
        assert_eq!(children.len(), 4);
        assert_eq!(children[1], Node::rule("&:hover", vec![Node::decl("color", "blue")]));
        assert_eq!(children[3], Node::at_rule("apply", "flex underline", vec![]));
    }

    #[test]
    fn parse_important_and_custom_properties() {
        let nodes = parse(":root { --font: \"Inter\", sans-serif; color: red ! important; }").unwrap();

        let Node::Rule { nodes: children, .. } = &nodes[0] else {
            panic!("expected rule");
        };
        assert_eq!(children[0], Node::decl("--font", "\"Inter\", sans-serif"));
        assert_eq!(
            children[1],
            Node::Declaration {
                property: "color".into(),
                value: Some("red".into()),
                important: true,
            }
        );
    }

    #[test]
    fn parse_keeps_comments() {
        let nodes = parse("/* banner */\n.a { /* inner */ color: red; }").unwrap();

        assert_eq!(nodes[0], Node::comment(" banner "));
        assert!(matches!(&nodes[1], Node::Rule { nodes, .. } if nodes[0] == Node::comment(" inner ")));
    }

    #[test]
    fn parse_url_with_semicolon() {
        let nodes = parse(".a { background: url(data:image/png;base64,AA); }").unwrap();

        let Node::Rule { nodes: children, .. } = &nodes[0] else {
            panic!("expected rule");
        };
        assert_eq!(children[0], Node::decl("background", "url(data:image/png;base64,AA)"));
    }

    #[test]
    fn values_ending_in_brackets_keep_their_closing_bracket() {
        let nodes = parse(".a { color: var(--x); width: calc(1px + 2px); grid-area: a[b] }").unwrap();

        assert_eq!(
            nodes,
            vec![Node::rule(
                ".a",
                vec![
                    Node::decl("color", "var(--x)"),
                    Node::decl("width", "calc(1px + 2px)"),
                    Node::decl("grid-area", "a[b]"),
                ]
            )]
        );
    }

    #[test]
    fn selectors_ending_in_brackets_keep_their_closing_bracket() {
        let nodes = parse(".a:is(.b){color:red}[dir=rtl]{color:blue}").unwrap();

        assert_eq!(nodes[0], Node::rule(".a:is(.b)", vec![Node::decl("color", "red")]));
        assert_eq!(nodes[1], Node::rule("[dir=rtl]", vec![Node::decl("color", "blue")]));
    }

    #[test]
    fn at_rule_params_ending_in_brackets_are_complete() {
        let nodes = parse(
            "@variant hocus (&:hover, &:focus);\n@import \"./theme\" theme(reference);\n@media (hover: hover){.a{color:red}}\n.b { @apply bg-[--color-red]; }",
        )
        .unwrap();

        assert_eq!(nodes[0], Node::at_rule("variant", "hocus (&:hover, &:focus)", vec![]));
        assert_eq!(nodes[1], Node::at_rule("import", "\"./theme\" theme(reference)", vec![]));
        assert!(matches!(&nodes[2], Node::AtRule { params, .. } if params == "(hover: hover)"));
        assert_eq!(nodes[3], Node::rule(".b", vec![Node::at_rule("apply", "bg-[--color-red]", vec![])]));
    }

    #[test]
    fn keyframes_body_round_trips() {
        let css = "@keyframes spin {\n  to {\n    transform: rotate(360deg);\n  }\n}\n";
        assert_eq!(to_css(&parse(css).unwrap()), css);
    }

    #[test]
    fn stray_closing_brace_is_an_error() {
        let err = parse(".a { color: red; } }").unwrap_err();
        assert!(matches!(err, Error::Parse { line: 1, .. }));
    }

    #[test]
    fn declaration_without_colon_is_an_error() {
        let err = parse(".a { color red; }").unwrap_err();
        assert!(err.to_string().contains("Invalid declaration"));
    }

    #[test]
    fn print_parse_print_is_idempotent() {
        let css = r#"
            @import "theme.css";
            /* tokens */
            @theme { --color-red: #f00; --spacing: 0.25rem; }
            .a { color: red !important; &:hover { color: blue; } }
            @media (min-width: 40rem) { .b { display: none } }
            @layer base;
        "#;

        let first = to_css(&parse(css).unwrap());
        let second = to_css(&parse(&first).unwrap());
        assert_eq!(first, second);
    }
}
