//! AST to CSS text.

use super::node::Node;

/// Print nodes as CSS text.
///
/// `AtRoot` children are hoisted and printed at the top level after the rest
/// of the document, regardless of how deeply they were nested.
pub fn to_css(nodes: &[Node]) -> String {
    let mut out = String::new();
    let mut hoisted: Vec<&Node> = Vec::new();

    for node in nodes {
        print_node(node, 0, &mut out, &mut hoisted);
    }

    // Hoisted nodes may themselves contain at-root nodes.
    let mut cursor = 0;
    while cursor < hoisted.len() {
        let node = hoisted[cursor];
        cursor += 1;
        let mut nested = Vec::new();
        print_node(node, 0, &mut out, &mut nested);
        hoisted.extend(nested);
    }

    out
}

fn print_node<'a>(node: &'a Node, depth: usize, out: &mut String, hoisted: &mut Vec<&'a Node>) {
    let indent = "  ".repeat(depth);

    match node {
        Node::Declaration {
            property,
            value: Some(value),
            important,
        } => {
            out.push_str(&indent);
            out.push_str(property);
            out.push_str(": ");
            out.push_str(value);
            if *important {
                out.push_str(" !important");
            }
            out.push_str(";\n");
        }
        Node::Declaration { value: None, .. } => {}
        Node::Rule { selector, nodes } => {
            out.push_str(&indent);
            out.push_str(selector);
            out.push_str(" {\n");
            for child in nodes {
                print_node(child, depth + 1, out, hoisted);
            }
            out.push_str(&indent);
            out.push_str("}\n");
        }
        Node::AtRule { name, params, nodes } => {
            out.push_str(&indent);
            out.push('@');
            out.push_str(name);
            if !params.is_empty() {
                out.push(' ');
                out.push_str(params);
            }
            if nodes.is_empty() {
                out.push_str(";\n");
                return;
            }
            out.push_str(" {\n");
            for child in nodes {
                print_node(child, depth + 1, out, hoisted);
            }
            out.push_str(&indent);
            out.push_str("}\n");
        }
        Node::Comment { value } => {
            out.push_str(&indent);
            out.push_str("/*");
            out.push_str(value);
            out.push_str("*/\n");
        }
        Node::Context { nodes, .. } => {
            for child in nodes {
                print_node(child, depth, out, hoisted);
            }
        }
        Node::AtRoot { nodes } => hoisted.extend(nodes.iter()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::ContextMap;

    #[test]
    fn prints_nested_rules() {
        let nodes = vec![Node::rule(
            ".a",
            vec![
                Node::decl("color", "red"),
                Node::rule("&:hover", vec![Node::decl("color", "blue")]),
            ],
        )];

        assert_eq!(to_css(&nodes), ".a {\n  color: red;\n  &:hover {\n    color: blue;\n  }\n}\n");
    }

    #[test]
    fn prints_at_rules_with_and_without_body() {
        let nodes = vec![
            Node::at_rule("import", "\"a.css\"", vec![]),
            Node::at_rule("media", "print", vec![Node::rule(".a", vec![Node::decl("display", "none")])]),
        ];

        assert_eq!(
            to_css(&nodes),
            "@import \"a.css\";\n@media print {\n  .a {\n    display: none;\n  }\n}\n"
        );
    }

    #[test]
    fn prints_important_and_skips_valueless_declarations() {
        let nodes = vec![Node::rule(
            ".a",
            vec![
                Node::Declaration {
                    property: "color".into(),
                    value: Some("red".into()),
                    important: true,
                },
                Node::Declaration {
                    property: "--unset".into(),
                    value: None,
                    important: false,
                },
            ],
        )];

        assert_eq!(to_css(&nodes), ".a {\n  color: red !important;\n}\n");
    }

    #[test]
    fn hoists_at_root_nodes() {
        let keyframes = Node::at_rule("keyframes", "spin", vec![Node::rule("to", vec![Node::decl("rotate", "360deg")])]);
        let nodes = vec![
            Node::rule(":root", vec![Node::decl("--x", "1"), Node::at_root(vec![keyframes])]),
            Node::comment(" tail "),
        ];

        assert_eq!(
            to_css(&nodes),
            ":root {\n  --x: 1;\n}\n/* tail */\n@keyframes spin {\n  to {\n    rotate: 360deg;\n  }\n}\n"
        );
    }

    #[test]
    fn context_prints_transparently() {
        let nodes = vec![Node::context(
            ContextMap::new(),
            vec![Node::rule(".flex", vec![Node::decl("display", "flex")])],
        )];

        assert_eq!(to_css(&nodes), ".flex {\n  display: flex;\n}\n");
    }
}
