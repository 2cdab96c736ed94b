//! Small string helpers shared across the compiler.

mod escape;
mod segment;

pub use escape::{escape, unescape};
pub use segment::{segment, split_whitespace};
