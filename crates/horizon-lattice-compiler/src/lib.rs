//! Utility-first stylesheet compiler for Horizon Lattice.
//!
//! This crate turns a stylesheet written with design-system directives into
//! plain CSS, featuring:
//!
//! - **Themes**: `@theme` blocks declare design tokens as custom properties
//! - **Utilities**: class candidates such as `md:hover:bg-red-500/50` compile
//!   into nested style rules
//! - **Custom directives**: `@utility`, `@variant`, `@apply`, `@source`,
//!   `@import`, `@plugin` and `theme()`
//! - **Incremental builds**: a [`Compiler`] accumulates candidates across
//!   batches and only re-renders when the output changes
//!
//! # Example
//!
//! ```ignore
//! use horizon_lattice_compiler::prelude::*;
//! use std::sync::Arc;
//!
//! let options = CompileOptions::new("./styles").with_stylesheet_loader(Arc::new(FsStylesheetLoader));
//! let mut compiler = compile(&std::fs::read_to_string("./styles/app.css")?, options).await?;
//!
//! for glob in compiler.globs() {
//!     println!("scan {}/{}", glob.base.display(), glob.pattern);
//! }
//! let css = compiler.build(["flex", "p-4", "hover:underline"]);
//! ```

pub mod ast;
pub mod candidate;
pub mod compile;
pub mod design_system;
pub mod directives;
pub mod loader;
pub mod options;
pub mod parser;
pub mod theme;
pub mod util;
pub mod utilities;
pub mod variants;

mod error;

pub use ast::{Node, to_css};
pub use compile::{Compiler, compile};
pub use design_system::DesignSystem;
pub use directives::{Plugin, PluginApi, object_to_ast};
pub use error::{Error, Result};
pub use loader::{FsStylesheetLoader, GlobEntry, LoadedModule, LoadedStylesheet, ModuleKind, ModuleLoader, StylesheetLoader};
pub use options::CompileOptions;
pub use parser::parse;

/// Prelude module with commonly used types.
pub mod prelude {
    pub use crate::ast::{Node, WalkAction, to_css, walk};
    pub use crate::compile::{Compiler, compile};
    pub use crate::design_system::DesignSystem;
    pub use crate::directives::{Plugin, PluginApi, object_to_ast};
    pub use crate::loader::{
        FsStylesheetLoader, GlobEntry, LoadedModule, LoadedStylesheet, ModuleKind, ModuleLoader, StylesheetLoader,
    };
    pub use crate::options::CompileOptions;
    pub use crate::theme::{Theme, ThemeOptions};
    pub use crate::{Error, Result};
}
