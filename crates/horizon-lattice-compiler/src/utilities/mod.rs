//! Utility registry.
//!
//! Each utility name maps to an ordered list of definitions. A definition is
//! either static (`flex`, value independent) or functional (`bg-*`, receives
//! the parsed value and modifier). Resolving a candidate runs every
//! definition of the matching kind and keeps each non-`None` result.

mod builtin;

pub use builtin::register_builtin_utilities;

use crate::ast::Node;
use crate::candidate::{Candidate, CandidateModifier, is_valid_opacity_value};
use crate::theme::Theme;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Resolver for one utility definition. `None` rejects the candidate.
pub type UtilityFn = Arc<dyn Fn(&Candidate, &Theme) -> Option<Vec<Node>> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UtilityKind {
    Static,
    Functional,
}

/// Metadata for functional utilities.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UtilityOptions {
    /// Data types accepted for arbitrary values, in inference order.
    pub types: Vec<&'static str>,
}

/// A registered utility definition.
#[derive(Clone)]
pub struct Utility {
    pub kind: UtilityKind,
    pub compile_fn: UtilityFn,
    pub options: UtilityOptions,
}

impl fmt::Debug for Utility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Utility")
            .field("kind", &self.kind)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

/// Name to definitions map.
#[derive(Debug, Clone, Default)]
pub struct Utilities {
    utilities: HashMap<String, Vec<Utility>>,
}

impl Utilities {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a static utility.
    pub fn static_utility<F>(&mut self, name: impl Into<String>, compile_fn: F)
    where
        F: Fn(&Candidate, &Theme) -> Option<Vec<Node>> + Send + Sync + 'static,
    {
        self.push(name.into(), UtilityKind::Static, Arc::new(compile_fn), UtilityOptions::default());
    }

    /// Register a functional utility.
    pub fn functional<F>(&mut self, name: impl Into<String>, compile_fn: F, options: UtilityOptions)
    where
        F: Fn(&Candidate, &Theme) -> Option<Vec<Node>> + Send + Sync + 'static,
    {
        self.push(name.into(), UtilityKind::Functional, Arc::new(compile_fn), options);
    }

    fn push(&mut self, name: String, kind: UtilityKind, compile_fn: UtilityFn, options: UtilityOptions) {
        self.utilities.entry(name).or_default().push(Utility {
            kind,
            compile_fn,
            options,
        });
    }

    /// Whether a definition of `kind` exists for `name`.
    pub fn has(&self, name: &str, kind: UtilityKind) -> bool {
        self.utilities
            .get(name)
            .is_some_and(|defs| defs.iter().any(|def| def.kind == kind))
    }

    /// All definitions for `name`, in registration order.
    pub fn get(&self, name: &str) -> &[Utility] {
        self.utilities.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Registered names of `kind`, sorted.
    pub fn keys(&self, kind: UtilityKind) -> Vec<&str> {
        let mut keys: Vec<&str> = self
            .utilities
            .iter()
            .filter(|(_, defs)| defs.iter().any(|def| def.kind == kind))
            .map(|(name, _)| name.as_str())
            .collect();
        keys.sort_unstable();
        keys
    }
}

/// Mix `value` with transparency: `color-mix(in oklab, <value> <alpha>, transparent)`.
///
/// Numeric alphas are converted to percentages; `100%` returns the value
/// unchanged.
pub fn with_alpha(value: &str, alpha: &str) -> String {
    let alpha = match alpha.parse::<f64>() {
        Ok(number) => format!("{}%", number * 100.0),
        Err(_) => alpha.to_string(),
    };
    if alpha == "100%" {
        return value.to_string();
    }
    format!("color-mix(in oklab, {} {}, transparent)", value, alpha)
}

/// Apply an opacity modifier to a color value.
///
/// Named modifiers are looked up under `--opacity-*` first, then accepted as
/// bare percentages (`/50` becomes `50%`).
pub fn as_color(value: &str, modifier: Option<&CandidateModifier>, theme: &Theme) -> Option<String> {
    match modifier {
        None => Some(value.to_string()),
        Some(CandidateModifier::Arbitrary(alpha)) => Some(with_alpha(value, alpha)),
        Some(CandidateModifier::Named(name)) => {
            if let Some(alpha) = theme.resolve(Some(name), &["--opacity"]) {
                return Some(with_alpha(value, &alpha));
            }
            if !is_valid_opacity_value(name) {
                return None;
            }
            Some(with_alpha(value, &format!("{}%", name)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn has_checks_kind() {
        let mut utilities = Utilities::new();
        utilities.static_utility("flex", |_, _| Some(vec![Node::decl("display", "flex")]));
        utilities.functional("bg", |_, _| None, UtilityOptions::default());

        assert!(utilities.has("flex", UtilityKind::Static));
        assert!(!utilities.has("flex", UtilityKind::Functional));
        assert!(utilities.has("bg", UtilityKind::Functional));
        assert_eq!(utilities.keys(UtilityKind::Static), vec!["flex"]);
        assert!(utilities.get("missing").is_empty());
    }

    #[test]
    fn alpha_mixing() {
        assert_eq!(with_alpha("red", "0.5"), "color-mix(in oklab, red 50%, transparent)");
        assert_eq!(with_alpha("red", "var(--a)"), "color-mix(in oklab, red var(--a), transparent)");
        assert_eq!(with_alpha("red", "100%"), "red");
    }

    #[test]
    fn color_modifiers() {
        let theme = Theme::new();
        let named = CandidateModifier::Named("50".into());
        let bad = CandidateModifier::Named("half".into());

        assert_eq!(
            as_color("#f00", Some(&named), &theme).as_deref(),
            Some("color-mix(in oklab, #f00 50%, transparent)")
        );
        assert_eq!(as_color("#f00", Some(&bad), &theme), None);
        assert_eq!(as_color("#f00", None, &theme).as_deref(), Some("#f00"));
    }
}
