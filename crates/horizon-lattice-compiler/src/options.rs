//! Compile configuration.

use crate::loader::{ModuleLoader, StylesheetLoader};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Options for [`compile`](crate::compile()).
///
/// A missing loader is only an error once a directive needs it.
///
/// # Example
///
/// ```
/// use horizon_lattice_compiler::{CompileOptions, FsStylesheetLoader};
/// use std::sync::Arc;
///
/// let options = CompileOptions::new("./styles").with_stylesheet_loader(Arc::new(FsStylesheetLoader));
/// assert!(options.stylesheet_loader.is_some());
/// assert!(options.module_loader.is_none());
/// ```
#[derive(Clone, Default)]
pub struct CompileOptions {
    /// Directory the entry stylesheet lives in.
    pub base: PathBuf,
    pub stylesheet_loader: Option<Arc<dyn StylesheetLoader>>,
    pub module_loader: Option<Arc<dyn ModuleLoader>>,
}

impl CompileOptions {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self {
            base: base.into(),
            ..Self::default()
        }
    }

    pub fn with_stylesheet_loader(mut self, loader: Arc<dyn StylesheetLoader>) -> Self {
        self.stylesheet_loader = Some(loader);
        self
    }

    pub fn with_module_loader(mut self, loader: Arc<dyn ModuleLoader>) -> Self {
        self.module_loader = Some(loader);
        self
    }

    pub fn base(&self) -> &Path {
        &self.base
    }
}

impl fmt::Debug for CompileOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompileOptions")
            .field("base", &self.base)
            .field("stylesheet_loader", &self.stylesheet_loader.is_some())
            .field("module_loader", &self.module_loader.is_some())
            .finish()
    }
}
