//! Loaders for imported stylesheets and plugin/config modules.
//!
//! Both loaders are async collaborators supplied by the host. The compiler
//! awaits them in place; nothing else in the pipeline suspends.

use crate::directives::Plugin;
use crate::{Error, Result};
use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A stylesheet fetched for an `@import`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedStylesheet {
    /// Resolved identity of the file, used to detect circular imports.
    pub path: PathBuf,
    /// Directory that relative paths inside the stylesheet resolve against.
    pub base: PathBuf,
    pub content: String,
}

/// Resolves `@import` targets.
pub trait StylesheetLoader: Send + Sync {
    /// Load `id` as requested from a stylesheet located in `base`.
    ///
    /// Fails with [`Error::UnresolvedImport`] when the target does not exist.
    fn load_stylesheet<'a>(&'a self, id: &'a str, base: &'a Path) -> BoxFuture<'a, Result<LoadedStylesheet>>;
}

/// What a module is being loaded for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModuleKind {
    Plugin,
    Config,
}

impl ModuleKind {
    pub fn directive(self) -> &'static str {
        match self {
            Self::Plugin => "plugin",
            Self::Config => "config",
        }
    }
}

/// A module loaded for `@plugin` or `@config`.
#[derive(Clone)]
pub struct LoadedModule {
    pub module: Arc<dyn Plugin>,
    pub base: PathBuf,
}

impl fmt::Debug for LoadedModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadedModule")
            .field("base", &self.base)
            .finish_non_exhaustive()
    }
}

/// Resolves `@plugin` and `@config` targets.
pub trait ModuleLoader: Send + Sync {
    fn load_module<'a>(&'a self, id: &'a str, base: &'a Path, kind: ModuleKind) -> BoxFuture<'a, Result<LoadedModule>>;
}

/// Loads stylesheets from the local file system.
///
/// Ids are resolved relative to the requesting base; ids without an
/// extension get `.css` appended.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsStylesheetLoader;

impl FsStylesheetLoader {
    pub fn new() -> Self {
        Self
    }

    fn resolve(id: &str, base: &Path) -> PathBuf {
        let mut path = base.join(id);
        if path.extension().is_none() {
            path.set_extension("css");
        }
        path
    }
}

impl StylesheetLoader for FsStylesheetLoader {
    fn load_stylesheet<'a>(&'a self, id: &'a str, base: &'a Path) -> BoxFuture<'a, Result<LoadedStylesheet>> {
        async move {
            let path = Self::resolve(id, base);
            let content = match tokio::fs::read_to_string(&path).await {
                Ok(content) => content,
                Err(err) if err.kind() == ErrorKind::NotFound => {
                    return Err(Error::unresolved_import(id, base));
                }
                Err(err) => return Err(Error::io(path, err)),
            };

            let path = tokio::fs::canonicalize(&path).await.unwrap_or(path);
            let base = path.parent().map(Path::to_path_buf).unwrap_or_else(|| base.to_path_buf());
            tracing::debug!(path = %path.display(), "loaded stylesheet");

            Ok(LoadedStylesheet { path, base, content })
        }
        .boxed()
    }
}

/// Loaded modules for one compile session, keyed by `(base, id, kind)`.
///
/// A module referenced several times is loaded once. The cache is owned by a
/// single [`compile`](crate::compile()) call and dropped with it.
#[derive(Default)]
pub struct ModuleCache {
    entries: HashMap<(PathBuf, String, ModuleKind), LoadedModule>,
}

impl ModuleCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Return the cached module or load it through `loader`.
    pub async fn get_or_load(
        &mut self,
        loader: &dyn ModuleLoader,
        id: &str,
        base: &Path,
        kind: ModuleKind,
    ) -> Result<LoadedModule> {
        let key = (base.to_path_buf(), id.to_string(), kind);
        if let Some(module) = self.entries.get(&key) {
            return Ok(module.clone());
        }

        let module = loader.load_module(id, base, kind).await?;
        self.entries.insert(key, module.clone());
        Ok(module)
    }
}

impl fmt::Debug for ModuleCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleCache").field("entries", &self.entries.len()).finish()
    }
}

/// A `@source` root handed to the candidate scanner.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GlobEntry {
    pub base: PathBuf,
    pub pattern: String,
}
