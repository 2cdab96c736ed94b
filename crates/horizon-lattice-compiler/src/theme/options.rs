//! `@theme` option flags.

use crate::util::split_whitespace;
use crate::{Error, Result};
use bitflags::bitflags;
use regex::Regex;
use std::sync::LazyLock;

static PREFIX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[a-z]+$").expect("prefix regex should compile"));

bitflags! {
    /// Flags attached to every theme entry.
    #[derive(Debug, Default, Eq, PartialEq, Copy, Clone, Hash)]
    pub struct ThemeOptions: u8 {
        /// Utilities inline the raw value instead of `var(--key)`.
        const INLINE = 1 << 0;
        /// Tracked for resolution but never emitted.
        const REFERENCE = 1 << 1;
        /// Never overrides an existing non-default entry.
        const DEFAULT = 1 << 2;
    }
}

/// Parsed params of a `@theme` at-rule.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ThemeParams {
    pub options: ThemeOptions,
    pub prefix: Option<String>,
}

impl ThemeParams {
    /// Parse `reference inline default prefix(tw)`.
    ///
    /// Also accepts the `theme(...)` wrapper produced by `@import ... theme(...)`.
    pub fn parse(params: &str) -> Result<Self> {
        let mut parsed = Self::default();

        for token in split_whitespace(params) {
            match token {
                "reference" => parsed.options |= ThemeOptions::REFERENCE,
                "inline" => parsed.options |= ThemeOptions::INLINE,
                "default" => parsed.options |= ThemeOptions::DEFAULT,
                _ => {
                    if let Some(prefix) = token.strip_prefix("prefix(").and_then(|t| t.strip_suffix(')')) {
                        let prefix = prefix.trim();
                        if !PREFIX.is_match(prefix) {
                            return Err(Error::InvalidPrefix {
                                prefix: prefix.to_string(),
                            });
                        }
                        parsed.prefix = Some(prefix.to_string());
                    } else if let Some(inner) = token.strip_prefix("theme(").and_then(|t| t.strip_suffix(')')) {
                        let nested = Self::parse(&inner.replace(',', " "))?;
                        parsed.options |= nested.options;
                        parsed.prefix = nested.prefix.or(parsed.prefix);
                    } else {
                        tracing::warn!(option = token, "ignoring unknown @theme option");
                    }
                }
            }
        }

        Ok(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_flags_and_prefix() {
        let params = ThemeParams::parse("reference default prefix(tw)").unwrap();

        assert_eq!(params.options, ThemeOptions::REFERENCE | ThemeOptions::DEFAULT);
        assert_eq!(params.prefix.as_deref(), Some("tw"));
    }

    #[test]
    fn rejects_invalid_prefix() {
        let err = ThemeParams::parse("prefix(Tw2)").unwrap_err();
        assert!(matches!(err, Error::InvalidPrefix { prefix } if prefix == "Tw2"));
    }

    #[test]
    fn unwraps_forwarded_theme_options() {
        let params = ThemeParams::parse("theme(reference inline)").unwrap();
        assert_eq!(params.options, ThemeOptions::REFERENCE | ThemeOptions::INLINE);
    }
}
