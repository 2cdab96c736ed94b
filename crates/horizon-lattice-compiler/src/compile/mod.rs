//! Compile entry point and incremental build driver.

mod candidates;
mod property_order;

pub(crate) use candidates::{compile_candidates, mark_important};
pub use property_order::property_index;

use crate::ast::{Node, NodePath, to_css};
use crate::design_system::DesignSystem;
use crate::directives::{Processed, process};
use crate::loader::GlobEntry;
use crate::options::CompileOptions;
use crate::parser::parse;
use crate::Result;
use std::collections::BTreeSet;
use std::sync::Arc;

/// A processed stylesheet that can be built repeatedly with growing sets of
/// candidates.
///
/// Builds are incremental: the compiler keeps every valid candidate it has
/// seen and returns the previous output untouched when a batch adds nothing
/// new. Calls must be serialized per instance.
#[derive(Debug)]
pub struct Compiler {
    ast: Vec<Node>,
    design_system: DesignSystem,
    globs: Vec<GlobEntry>,
    candidates: BTreeSet<String>,
    utilities_path: Option<NodePath>,
    cached: Arc<str>,
    previous_node_count: usize,
}

/// Parse `css`, resolve its imports and directives and return a compiler
/// ready to build.
///
/// Fails on the first structural problem: malformed directives, missing
/// loaders, unresolvable imports or modules, circular imports, unknown
/// `@apply` candidates and unresolvable `theme()` calls.
///
/// # Example
///
/// ```
/// use horizon_lattice_compiler::{CompileOptions, compile};
///
/// # tokio_test_block(async {
/// let css = "@theme { --color-red-500: #ef4444; } @tailwind utilities;";
/// let mut compiler = compile(css, CompileOptions::new(".")).await?;
/// let output = compiler.build(["bg-red-500", "not-a-class"]);
/// assert!(output.contains(".bg-red-500 {\n  background-color: var(--color-red-500);\n}"));
/// # Ok::<(), horizon_lattice_compiler::Error>(())
/// # }).unwrap();
/// # fn tokio_test_block<F: std::future::Future>(f: F) -> F::Output {
/// #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
/// # }
/// ```
#[tracing::instrument(skip_all, fields(base = %options.base.display()))]
pub async fn compile(css: &str, options: CompileOptions) -> Result<Compiler> {
    let mut ast = parse(css)?;
    let Processed {
        design_system,
        globs,
        utilities_path,
    } = process(&mut ast, &options).await?;

    let cached: Arc<str> = to_css(&ast).into();
    tracing::debug!(bytes = cached.len(), "compiled stylesheet");

    Ok(Compiler {
        ast,
        design_system,
        globs,
        candidates: BTreeSet::new(),
        utilities_path,
        cached,
        previous_node_count: 0,
    })
}

impl Compiler {
    /// Add `candidates` to the accumulated set and return the stylesheet.
    ///
    /// The returned text always covers every valid candidate seen so far, so
    /// the final output does not depend on how candidates were batched. When
    /// nothing changed the same `Arc` is returned again.
    #[tracing::instrument(skip_all)]
    pub fn build<I, S>(&mut self, candidates: I) -> Arc<str>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let before = self.candidates.len();
        for candidate in candidates {
            let candidate = candidate.as_ref();
            if self.design_system.is_invalid(candidate) || self.candidates.contains(candidate) {
                continue;
            }
            self.candidates.insert(candidate.to_string());
        }
        if self.candidates.len() == before {
            return Arc::clone(&self.cached);
        }

        let Some(path) = &self.utilities_path else {
            return Arc::clone(&self.cached);
        };

        let mut invalid = Vec::new();
        let nodes = self
            .design_system
            .compile_candidates(&self.candidates, |raw| invalid.push(raw.to_string()));
        for raw in &invalid {
            self.candidates.remove(raw);
        }

        if nodes.len() == self.previous_node_count {
            tracing::trace!(invalid = invalid.len(), "no new rules");
            return Arc::clone(&self.cached);
        }
        self.previous_node_count = nodes.len();

        if let Some(Node::Context { nodes: children, .. }) = path.get_mut(&mut self.ast) {
            *children = nodes;
        }
        self.cached = to_css(&self.ast).into();
        tracing::debug!(
            candidates = self.candidates.len(),
            rules = self.previous_node_count,
            "rebuilt stylesheet"
        );
        Arc::clone(&self.cached)
    }

    /// Source roots declared with `@source`.
    pub fn globs(&self) -> &[GlobEntry] {
        &self.globs
    }

    /// The most recently built stylesheet.
    pub fn css(&self) -> Arc<str> {
        Arc::clone(&self.cached)
    }

    pub fn design_system(&self) -> &DesignSystem {
        &self.design_system
    }

    /// Valid candidates accumulated so far, sorted.
    pub fn candidates(&self) -> impl Iterator<Item = &str> {
        self.candidates.iter().map(String::as_str)
    }
}
