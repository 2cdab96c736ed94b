//! Error types for the stylesheet compiler.

use std::path::PathBuf;

/// Result type alias for compiler operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while compiling a stylesheet.
///
/// Every variant is fatal: the pipeline stops at the first one. Candidates that
/// fail to resolve during [`Compiler::build`](crate::Compiler::build) are not
/// errors and never show up here.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// CSS parsing error.
    #[error("CSS parse error at line {line}, column {column}: {message}")]
    Parse {
        message: String,
        line: u32,
        column: u32,
    },

    /// A directive was misplaced or malformed.
    #[error("`@{directive}` {message}")]
    InvalidDirective { directive: String, message: String },

    /// `@utility` with a name outside the utility-name grammar.
    #[error(
        "`@utility {name}` defines an invalid utility name. Utilities should be alphanumeric and start with a lowercase letter."
    )]
    InvalidUtilityName { name: String },

    /// `@utility` without a body.
    #[error("`@utility {name}` is empty. Utilities should include at least one property.")]
    EmptyUtility { name: String },

    /// Theme prefix outside the lowercase-letter grammar.
    #[error("The prefix \"{prefix}\" is invalid. Prefixes must be lowercase ASCII letters (a-z) only.")]
    InvalidPrefix { prefix: String },

    /// Invalid value for a theme namespace reset.
    #[error("Invalid theme value `{value}` for namespace `{key}`")]
    InvalidThemeValue { key: String, value: String },

    /// `@apply` referenced a candidate that does not compile.
    #[error("Cannot apply unknown utility class: {candidate}")]
    UnknownUtility { candidate: String },

    /// `@utility` bodies that `@apply` each other in a loop.
    #[error("You cannot `@apply` the `{name}` utility here because it creates a circular dependency.")]
    CircularApply { name: String },

    /// The stylesheet loader could not find an `@import` target.
    #[error("Could not resolve `{id}` from `{}`", .base.display())]
    UnresolvedImport { id: String, base: PathBuf },

    /// An import chain revisited a file that is still being resolved.
    #[error("Circular import detected: `{}` is already being imported ({})", .path.display(), format_chain(.chain))]
    CircularImport { path: PathBuf, chain: Vec<PathBuf> },

    /// The module loader could not find a `@plugin`/`@config` target.
    #[error("Could not resolve module `{id}` from `{}`", .base.display())]
    UnresolvedModule { id: String, base: PathBuf },

    /// A directive needs a loader that was not configured.
    #[error("No loader provided to resolve `@{directive}`")]
    MissingLoader { directive: String },

    /// `theme(...)` could not be resolved.
    #[error("{message}")]
    ThemeFunction { message: String },

    /// A plugin failed while registering.
    #[error("Plugin error: {message}")]
    Plugin { message: String },

    /// File I/O error.
    #[error("Failed to read stylesheet '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Create a parse error.
    pub fn parse(message: impl Into<String>, line: u32, column: u32) -> Self {
        Self::Parse {
            message: message.into(),
            line,
            column,
        }
    }

    /// Create a directive error.
    pub fn invalid_directive(directive: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidDirective {
            directive: directive.into(),
            message: message.into(),
        }
    }

    /// Create an unresolved import error.
    pub fn unresolved_import(id: impl Into<String>, base: impl Into<PathBuf>) -> Self {
        Self::UnresolvedImport {
            id: id.into(),
            base: base.into(),
        }
    }

    /// Create an unresolved module error.
    pub fn unresolved_module(id: impl Into<String>, base: impl Into<PathBuf>) -> Self {
        Self::UnresolvedModule {
            id: id.into(),
            base: base.into(),
        }
    }

    /// Create a missing loader error.
    pub fn missing_loader(directive: impl Into<String>) -> Self {
        Self::MissingLoader {
            directive: directive.into(),
        }
    }

    /// Create a `theme(...)` error.
    pub fn theme_function(message: impl Into<String>) -> Self {
        Self::ThemeFunction {
            message: message.into(),
        }
    }

    /// Create a plugin error.
    pub fn plugin(message: impl Into<String>) -> Self {
        Self::Plugin {
            message: message.into(),
        }
    }

    /// Create an I/O error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

fn format_chain(chain: &[PathBuf]) -> String {
    chain
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unresolved_import_names_target_and_base() {
        let err = Error::unresolved_import("missing.css", "/project/src");
        let message = err.to_string();

        assert!(message.contains("missing.css"));
        assert!(message.contains("/project/src"));
    }

    #[test]
    fn circular_import_lists_chain() {
        let err = Error::CircularImport {
            path: PathBuf::from("/a.css"),
            chain: vec![PathBuf::from("/a.css"), PathBuf::from("/b.css")],
        };

        assert!(err.to_string().contains("/a.css -> /b.css"));
    }
}
