//! The resolved design system.

use crate::ast::Node;
use crate::candidate::{Candidate, Variant, parse_candidate, parse_variant};
use crate::compile::compile_candidates;
use crate::theme::Theme;
use crate::utilities::{Utilities, register_builtin_utilities};
use crate::variants::{Variants, register_builtin_variants};
use std::collections::HashSet;

/// Theme plus the utility and variant registries used to compile candidates.
///
/// Built once per [`compile`](crate::compile()) call from the fully processed
/// theme. After directive processing it only changes through the invalid
/// candidate set, which grows monotonically.
#[derive(Debug)]
pub struct DesignSystem {
    theme: Theme,
    utilities: Utilities,
    variants: Variants,
    important: bool,
    invalid_candidates: HashSet<String>,
}

impl DesignSystem {
    /// Create a design system with the built-in utilities and variants.
    ///
    /// Breakpoint variants are derived from `theme` at this point.
    pub fn new(theme: Theme) -> Self {
        let mut utilities = Utilities::new();
        register_builtin_utilities(&mut utilities);
        let mut variants = Variants::new();
        register_builtin_variants(&mut variants, &theme);

        Self {
            theme,
            utilities,
            variants,
            important: false,
            invalid_candidates: HashSet::new(),
        }
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    pub fn theme_mut(&mut self) -> &mut Theme {
        &mut self.theme
    }

    pub fn utilities(&self) -> &Utilities {
        &self.utilities
    }

    pub fn utilities_mut(&mut self) -> &mut Utilities {
        &mut self.utilities
    }

    pub fn variants(&self) -> &Variants {
        &self.variants
    }

    pub fn variants_mut(&mut self) -> &mut Variants {
        &mut self.variants
    }

    /// Whether every generated declaration is marked `!important`.
    pub fn important(&self) -> bool {
        self.important
    }

    pub fn set_important(&mut self, important: bool) {
        self.important = important;
    }

    /// Every interpretation of a raw candidate, honoring the theme prefix.
    pub fn parse_candidate(&self, raw: &str) -> Vec<Candidate> {
        parse_candidate(raw, &self.utilities, &self.variants, self.theme.prefix())
    }

    pub fn parse_variant(&self, raw: &str) -> Option<Variant> {
        parse_variant(raw, &self.variants)
    }

    /// Whether `raw` already failed to compile.
    pub fn is_invalid(&self, raw: &str) -> bool {
        self.invalid_candidates.contains(raw)
    }

    pub fn invalid_candidates(&self) -> &HashSet<String> {
        &self.invalid_candidates
    }

    pub(crate) fn mark_invalid(&mut self, raw: &str) {
        self.invalid_candidates.insert(raw.to_string());
    }

    /// Compile raw candidates into sorted style rules.
    ///
    /// Candidates that do not compile are added to the invalid set and
    /// reported through `on_invalid`; known-invalid candidates are reported
    /// without being resolved again.
    pub fn compile_candidates<I, S>(&mut self, candidates: I, on_invalid: impl FnMut(&str)) -> Vec<Node>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        compile_candidates(self, candidates, on_invalid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme::ThemeOptions;

    fn design_system() -> DesignSystem {
        let mut theme = Theme::new();
        theme.add("--spacing", "0.25rem", ThemeOptions::empty()).unwrap();
        theme.add("--breakpoint-md", "48rem", ThemeOptions::empty()).unwrap();
        DesignSystem::new(theme)
    }

    #[test]
    fn builtins_follow_the_theme() {
        let ds = design_system();
        assert!(ds.variants().has("md"));
        assert!(!ds.variants().has("lg"));
        assert_eq!(ds.parse_candidate("md:p-4").len(), 1);
    }

    #[test]
    fn invalid_candidates_are_remembered() {
        let mut ds = design_system();
        let mut reported = Vec::new();
        let nodes = ds.compile_candidates(["flex", "bogus", "p-1.3"], |raw| reported.push(raw.to_string()));

        assert_eq!(nodes.len(), 1);
        assert_eq!(reported, vec!["bogus".to_string(), "p-1.3".to_string()]);
        assert!(ds.is_invalid("bogus"));
        assert!(ds.is_invalid("p-1.3"));
        assert!(!ds.is_invalid("flex"));
    }

    #[test]
    fn prefix_applies_to_candidates() {
        let mut theme = Theme::new();
        theme.set_prefix(Some("tw".into()));
        let ds = DesignSystem::new(theme);

        assert!(ds.parse_candidate("flex").is_empty());
        assert_eq!(ds.parse_candidate("tw:flex").len(), 1);
    }
}
