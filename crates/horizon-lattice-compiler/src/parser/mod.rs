//! CSS text to syntax tree.

mod css_parser;

pub use css_parser::parse;
