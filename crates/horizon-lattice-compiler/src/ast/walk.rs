//! Depth-first traversal with in-place mutation.
//!
//! The visitor returns a [`WalkAction`]; the traversal engine applies it.
//! Visitors never splice sibling lists themselves.

use super::node::{ContextMap, Node};

/// What the traversal should do after visiting a node.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum WalkAction {
    /// Descend into the node's children, then continue with its siblings.
    #[default]
    Continue,
    /// Do not descend into this node's children.
    Skip,
    /// Abort the entire walk.
    Stop,
    /// Splice these nodes in place of the current one. They are not visited.
    Replace(Vec<Node>),
    /// Splice these nodes in place of the current one, then abort the walk.
    ReplaceAndStop(Vec<Node>),
}

/// Ancestor information available to a visitor.
#[derive(Debug, Clone, Copy)]
pub struct WalkContext<'a> {
    parent: Option<&'a Node>,
    scope: Option<&'a Scope<'a>>,
    depth: usize,
}

#[derive(Debug)]
struct Scope<'a> {
    values: &'a ContextMap,
    up: Option<&'a Scope<'a>>,
}

impl<'a> WalkContext<'a> {
    const ROOT: WalkContext<'static> = WalkContext {
        parent: None,
        scope: None,
        depth: 0,
    };

    /// The closest non-context ancestor, or `None` at the document root.
    ///
    /// While its children are being visited, the parent's own child list
    /// appears empty.
    pub fn parent(&self) -> Option<&'a Node> {
        self.parent
    }

    /// Whether the current node sits at the document root.
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Nesting depth, not counting context wrappers.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Look up a value from the closest enclosing [`Node::Context`].
    pub fn context(&self, key: &str) -> Option<&'a str> {
        let mut scope = self.scope;
        while let Some(current) = scope {
            if let Some(value) = current.values.get(key) {
                return Some(value.as_str());
            }
            scope = current.up;
        }
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Stop,
}

/// Walk `nodes` depth-first in pre-order.
///
/// Context nodes are transparent: they are not passed to the visitor, they do
/// not count as a parent, and their values are exposed through
/// [`WalkContext::context`].
pub fn walk<F>(nodes: &mut Vec<Node>, mut visit: F)
where
    F: FnMut(&mut Node, &WalkContext<'_>) -> WalkAction,
{
    walk_nodes(nodes, &mut visit, &WalkContext::ROOT);
}

fn walk_nodes<F>(nodes: &mut Vec<Node>, visit: &mut F, cx: &WalkContext<'_>) -> Flow
where
    F: FnMut(&mut Node, &WalkContext<'_>) -> WalkAction,
{
    let mut idx = 0;
    while idx < nodes.len() {
        if let Node::Context { context, nodes: children } = &mut nodes[idx] {
            let scope = Scope {
                values: context,
                up: cx.scope,
            };
            let inner = WalkContext {
                parent: cx.parent,
                scope: Some(&scope),
                depth: cx.depth,
            };
            if walk_nodes(children, visit, &inner) == Flow::Stop {
                return Flow::Stop;
            }
            idx += 1;
            continue;
        }

        match visit(&mut nodes[idx], cx) {
            WalkAction::Continue => {}
            WalkAction::Skip => {
                idx += 1;
                continue;
            }
            WalkAction::Stop => return Flow::Stop,
            WalkAction::Replace(replacement) => {
                let count = replacement.len();
                nodes.splice(idx..=idx, replacement);
                idx += count;
                continue;
            }
            WalkAction::ReplaceAndStop(replacement) => {
                nodes.splice(idx..=idx, replacement);
                return Flow::Stop;
            }
        }

        let Some(slot) = nodes[idx].children_mut() else {
            idx += 1;
            continue;
        };
        let mut children = std::mem::take(slot);

        let flow = {
            let inner = WalkContext {
                parent: Some(&nodes[idx]),
                scope: cx.scope,
                depth: cx.depth + 1,
            };
            walk_nodes(&mut children, visit, &inner)
        };

        if let Some(slot) = nodes[idx].children_mut() {
            *slot = children;
        }
        if flow == Flow::Stop {
            return Flow::Stop;
        }
        idx += 1;
    }

    Flow::Continue
}

/// Read-only pre-order traversal. Context wrappers are descended into but not
/// reported.
pub fn walk_ref<F>(nodes: &[Node], mut visit: F)
where
    F: FnMut(&Node, usize),
{
    fn inner<F: FnMut(&Node, usize)>(nodes: &[Node], visit: &mut F, depth: usize) {
        for node in nodes {
            if let Node::Context { nodes: children, .. } = node {
                inner(children, visit, depth);
                continue;
            }
            visit(node, depth);
            if let Some(children) = node.children() {
                inner(children, visit, depth + 1);
            }
        }
    }

    inner(nodes, &mut visit, 0);
}
