//! Stylesheet syntax tree.
//!
//! The tree is a plain owned value: each [`Node`] owns its children, and the
//! document is a `Vec<Node>`. Mutation goes through [`walk`], which lets a
//! visitor replace, remove or skip nodes while the engine handles splicing.

mod node;
mod printer;
mod walk;

pub use node::{AtRuleKind, ContextMap, Node, NodePath};
pub use printer::to_css;
pub use walk::{WalkAction, WalkContext, walk, walk_ref};
