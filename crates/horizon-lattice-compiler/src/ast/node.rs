//! Stylesheet node definitions.

use std::collections::BTreeMap;

/// Side-channel values carried by [`Node::Context`] (e.g. the `base` path of
/// an imported file).
pub type ContextMap = BTreeMap<String, String>;

/// A node in the stylesheet tree.
///
/// Each node owns its children; ordering of children is significant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// `property: value [!important]`
    Declaration {
        property: String,
        value: Option<String>,
        important: bool,
    },
    /// `selector { ... }`
    Rule { selector: String, nodes: Vec<Node> },
    /// `@name params { ... }` or `@name params;`
    ///
    /// `name` is stored without the leading `@`.
    AtRule {
        name: String,
        params: String,
        nodes: Vec<Node>,
    },
    /// `/* value */`
    Comment { value: String },
    /// Transparent wrapper carrying key-value context to its descendants.
    Context { context: ContextMap, nodes: Vec<Node> },
    /// Children are hoisted to the document root when printing.
    AtRoot { nodes: Vec<Node> },
}

impl Node {
    /// Create a declaration.
    pub fn decl(property: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Declaration {
            property: property.into(),
            value: Some(value.into()),
            important: false,
        }
    }

    /// Create a style rule.
    pub fn rule(selector: impl Into<String>, nodes: Vec<Node>) -> Self {
        Self::Rule {
            selector: selector.into(),
            nodes,
        }
    }

    /// Create an at-rule. A leading `@` on `name` is stripped.
    pub fn at_rule(name: impl Into<String>, params: impl Into<String>, nodes: Vec<Node>) -> Self {
        let name = name.into();
        let name = match name.strip_prefix('@') {
            Some(stripped) => stripped.to_string(),
            None => name,
        };
        Self::AtRule {
            name,
            params: params.into(),
            nodes,
        }
    }

    /// Create a comment.
    pub fn comment(value: impl Into<String>) -> Self {
        Self::Comment {
            value: value.into(),
        }
    }

    /// Create a context wrapper.
    pub fn context(context: ContextMap, nodes: Vec<Node>) -> Self {
        Self::Context { context, nodes }
    }

    /// Create an at-root wrapper.
    pub fn at_root(nodes: Vec<Node>) -> Self {
        Self::AtRoot { nodes }
    }

    /// Build a rule or at-rule from a selector-like string: `@media (x)`
    /// becomes an at-rule, anything else a rule.
    pub fn rule_or_at_rule(selector: &str, nodes: Vec<Node>) -> Self {
        match selector.strip_prefix('@') {
            Some(rest) => {
                let (name, params) = match rest.find(|c: char| c.is_whitespace() || c == '(') {
                    Some(idx) => (&rest[..idx], rest[idx..].trim()),
                    None => (rest, ""),
                };
                Self::at_rule(name, params, nodes)
            }
            None => Self::rule(selector, nodes),
        }
    }

    /// Children of container nodes.
    pub fn children(&self) -> Option<&Vec<Node>> {
        match self {
            Self::Rule { nodes, .. }
            | Self::AtRule { nodes, .. }
            | Self::Context { nodes, .. }
            | Self::AtRoot { nodes } => Some(nodes),
            Self::Declaration { .. } | Self::Comment { .. } => None,
        }
    }

    /// Mutable children of container nodes.
    pub fn children_mut(&mut self) -> Option<&mut Vec<Node>> {
        match self {
            Self::Rule { nodes, .. }
            | Self::AtRule { nodes, .. }
            | Self::Context { nodes, .. }
            | Self::AtRoot { nodes } => Some(nodes),
            Self::Declaration { .. } | Self::Comment { .. } => None,
        }
    }

    /// Whether this is a rule or an at-rule.
    pub fn is_rule_like(&self) -> bool {
        matches!(self, Self::Rule { .. } | Self::AtRule { .. })
    }

    /// The recognized directive kind when this node is an at-rule.
    pub fn at_rule_kind(&self) -> Option<AtRuleKind> {
        match self {
            Self::AtRule { name, .. } => Some(AtRuleKind::from_name(name)),
            _ => None,
        }
    }
}

/// Recognized at-rule names.
///
/// Anything the compiler does not treat specially is [`AtRuleKind::Other`] and
/// passes through untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AtRuleKind {
    Import,
    Theme,
    Utility,
    Variant,
    Source,
    Media,
    Apply,
    Plugin,
    Config,
    Tailwind,
    Keyframes,
    Slot,
    Other,
}

impl AtRuleKind {
    /// Classify an at-rule name (with or without the leading `@`).
    pub fn from_name(name: &str) -> Self {
        match name.strip_prefix('@').unwrap_or(name) {
            "import" => Self::Import,
            "theme" => Self::Theme,
            "utility" => Self::Utility,
            "variant" => Self::Variant,
            "source" => Self::Source,
            "media" => Self::Media,
            "apply" => Self::Apply,
            "plugin" => Self::Plugin,
            "config" => Self::Config,
            "tailwind" | "tailwindcss" => Self::Tailwind,
            "keyframes" => Self::Keyframes,
            "slot" => Self::Slot,
            _ => Self::Other,
        }
    }
}

/// Child-index path from the root node list to a node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodePath(Vec<usize>);

impl NodePath {
    /// Path to a root-level node.
    pub fn root(index: usize) -> Self {
        Self(vec![index])
    }

    /// Extend the path by one child index.
    pub fn child(&self, index: usize) -> Self {
        let mut path = self.0.clone();
        path.push(index);
        Self(path)
    }

    /// Resolve the path against a node list.
    pub fn get<'a>(&self, nodes: &'a [Node]) -> Option<&'a Node> {
        let (first, rest) = self.0.split_first()?;
        let mut node = nodes.get(*first)?;
        for idx in rest {
            node = node.children()?.get(*idx)?;
        }
        Some(node)
    }

    /// Resolve the path mutably against a node list.
    pub fn get_mut<'a>(&self, nodes: &'a mut [Node]) -> Option<&'a mut Node> {
        let (first, rest) = self.0.split_first()?;
        let mut node = nodes.get_mut(*first)?;
        for idx in rest {
            node = node.children_mut()?.get_mut(*idx)?;
        }
        Some(node)
    }

    /// Find the first node matching `predicate` in pre-order.
    pub fn find(nodes: &[Node], predicate: impl Fn(&Node) -> bool) -> Option<Self> {
        fn search(nodes: &[Node], prefix: &NodePath, predicate: &dyn Fn(&Node) -> bool) -> Option<NodePath> {
            for (idx, node) in nodes.iter().enumerate() {
                let path = if prefix.0.is_empty() {
                    NodePath::root(idx)
                } else {
                    prefix.child(idx)
                };
                if predicate(node) {
                    return Some(path);
                }
                if let Some(children) = node.children()
                    && let Some(found) = search(children, &path, predicate)
                {
                    return Some(found);
                }
            }
            None
        }

        search(nodes, &NodePath::default(), &predicate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn at_rule_strips_leading_at() {
        let node = Node::at_rule("@media", "print", vec![]);
        assert_eq!(node.at_rule_kind(), Some(AtRuleKind::Media));
    }

    #[test]
    fn rule_or_at_rule_splits_name_and_params() {
        let node = Node::rule_or_at_rule("@media (hover: hover)", vec![]);
        match node {
            Node::AtRule { name, params, .. } => {
                assert_eq!(name, "media");
                assert_eq!(params, "(hover: hover)");
            }
            other => panic!("expected at-rule, got {:?}", other),
        }

        assert!(matches!(Node::rule_or_at_rule("&:hover", vec![]), Node::Rule { .. }));
    }

    #[test]
    fn node_path_finds_nested_nodes() {
        let mut nodes = vec![
            Node::comment("x"),
            Node::rule(".a", vec![Node::at_rule("tailwind", "utilities", vec![])]),
        ];

        let path = NodePath::find(&nodes, |n| n.at_rule_kind() == Some(AtRuleKind::Tailwind))
            .expect("path");
        assert_eq!(path, NodePath::root(1).child(0));

        if let Some(Node::AtRule { params, .. }) = path.get_mut(&mut nodes) {
            *params = "changed".into();
        }
        assert!(matches!(path.get(&nodes), Some(Node::AtRule { params, .. }) if params == "changed"));
    }
}
