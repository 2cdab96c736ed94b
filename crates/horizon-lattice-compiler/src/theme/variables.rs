//! Ordered theme variable store.

use super::ThemeOptions;
use crate::ast::Node;
use crate::util::{escape, unescape};
use crate::{Error, Result};
use indexmap::IndexMap;
use std::collections::HashSet;

/// A single theme variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThemeEntry {
    pub value: String,
    pub options: ThemeOptions,
}

/// Design tokens declared through `@theme`.
///
/// Keys are stored unescaped (`--spacing-1.5`) and keep the position of their
/// first insertion: overwriting a key changes its value but not its place in
/// the emitted `:root` rule.
#[derive(Debug, Clone, Default)]
pub struct Theme {
    values: IndexMap<String, ThemeEntry>,
    keyframes: Vec<Node>,
    prefix: Option<String>,
}

impl Theme {
    /// Create an empty theme.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or override a variable.
    ///
    /// - `--ns-*: initial` clears a namespace and `--*: initial` clears
    ///   everything; any other value for a wildcard key is an error.
    /// - `--key: initial` removes the key.
    /// - A `DEFAULT` entry never replaces an existing non-default entry.
    pub fn add(&mut self, key: &str, value: &str, options: ThemeOptions) -> Result<()> {
        let key = unescape(key);

        if let Some(namespace) = key.strip_suffix("-*") {
            if value != "initial" {
                return Err(Error::InvalidThemeValue {
                    key,
                    value: value.to_string(),
                });
            }
            if namespace == "-" {
                self.values.clear();
                self.keyframes.clear();
            } else {
                self.clear_namespace(namespace);
            }
            return Ok(());
        }

        if options.contains(ThemeOptions::DEFAULT)
            && let Some(existing) = self.values.get(&key)
            && !existing.options.contains(ThemeOptions::DEFAULT)
        {
            return Ok(());
        }

        if value == "initial" {
            self.values.shift_remove(&key);
            return Ok(());
        }

        self.values.insert(
            key,
            ThemeEntry {
                value: value.to_string(),
                options,
            },
        );
        Ok(())
    }

    fn clear_namespace(&mut self, namespace: &str) {
        let nested = format!("{}-", namespace);
        self.values
            .retain(|key, _| key != namespace && !key.starts_with(&nested));
    }

    /// Raw value for an exact key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(|entry| entry.value.as_str())
    }

    /// Options for an exact key.
    pub fn options(&self, key: &str) -> Option<ThemeOptions> {
        self.values.get(key).map(|entry| entry.options)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate all entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ThemeEntry)> {
        self.values.iter().map(|(key, entry)| (key.as_str(), entry))
    }

    /// `(suffix, value)` pairs of a namespace, in insertion order.
    ///
    /// `namespace("--breakpoint")` yields `("sm", "40rem")` for
    /// `--breakpoint-sm`. Nested keys such as `--text-sm--line-height` are
    /// not included.
    pub fn namespace<'a>(&'a self, namespace: &str) -> impl Iterator<Item = (&'a str, &'a str)> {
        let nested = format!("{}-", namespace);
        self.values.iter().filter_map(move |(key, entry)| {
            let suffix = key.strip_prefix(&nested)?;
            if suffix.is_empty() || suffix.contains("--") {
                return None;
            }
            Some((suffix, entry.value.as_str()))
        })
    }

    /// Suffixes of a namespace, in insertion order.
    pub fn keys_in_namespace(&self, namespace: &str) -> Vec<String> {
        self.namespace(namespace).map(|(suffix, _)| suffix.to_string()).collect()
    }

    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    /// Set the prefix. The value is validated by the `@theme` option parser.
    pub fn set_prefix(&mut self, prefix: Option<String>) {
        self.prefix = prefix;
    }

    /// Apply the prefix to a variable name: `--color-red` becomes
    /// `--tw-color-red`.
    pub fn prefix_key(&self, key: &str) -> String {
        match (&self.prefix, key.strip_prefix("--")) {
            (Some(prefix), Some(rest)) => format!("--{}-{}", prefix, rest),
            _ => key.to_string(),
        }
    }

    fn resolve_key(&self, value: Option<&str>, namespaces: &[&str]) -> Option<String> {
        for namespace in namespaces {
            let key = match value {
                Some(value) => format!("{}-{}", namespace, value),
                None => namespace.to_string(),
            };
            if self.values.contains_key(&key) {
                return Some(key);
            }
            if let Some(value) = value.filter(|v| v.contains('.')) {
                let key = format!("{}-{}", namespace, value.replace('.', "_"));
                if self.values.contains_key(&key) {
                    return Some(key);
                }
            }
        }
        None
    }

    fn reference(&self, key: &str) -> Option<String> {
        let entry = self.values.get(key)?;
        if entry.options.contains(ThemeOptions::INLINE) {
            Some(entry.value.clone())
        } else {
            Some(format!("var({})", escape(&self.prefix_key(key))))
        }
    }

    /// Resolve a candidate value against the first matching namespace.
    ///
    /// Returns `var(--key)` or, for inline entries, the raw value. A `None`
    /// value looks up the namespace key itself (`--radius` for `rounded`).
    pub fn resolve(&self, value: Option<&str>, namespaces: &[&str]) -> Option<String> {
        let key = self.resolve_key(value, namespaces)?;
        self.reference(&key)
    }

    /// Like [`Theme::resolve`] but always returns the raw value.
    pub fn resolve_value(&self, value: Option<&str>, namespaces: &[&str]) -> Option<String> {
        let key = self.resolve_key(value, namespaces)?;
        self.get(&key).map(str::to_string)
    }

    /// Resolve a value plus nested sub-keys: `text-sm` resolves
    /// `--text-sm` and returns `("--line-height", var(--text-sm--line-height))`
    /// for each nested key that exists.
    pub fn resolve_with(
        &self,
        value: Option<&str>,
        namespaces: &[&str],
        nested: &[&str],
    ) -> Option<(String, Vec<(String, String)>)> {
        let key = self.resolve_key(value, namespaces)?;
        let resolved = self.reference(&key)?;
        let extra = nested
            .iter()
            .filter_map(|sub| {
                let nested_key = format!("{}{}", key, sub);
                self.reference(&nested_key).map(|v| (sub.to_string(), v))
            })
            .collect();
        Some((resolved, extra))
    }

    /// Capture a `@keyframes` at-rule.
    pub fn add_keyframes(&mut self, keyframes: Node) {
        self.keyframes.push(keyframes);
    }

    pub fn keyframes(&self) -> &[Node] {
        &self.keyframes
    }

    /// Keyframes referenced by an emitted `--animate-*` value.
    pub fn referenced_keyframes(&self) -> Vec<Node> {
        let mut names: HashSet<&str> = HashSet::new();
        for (key, entry) in &self.values {
            let animation = key == "--animate" || key.starts_with("--animate-");
            if !animation || entry.options.contains(ThemeOptions::REFERENCE) {
                continue;
            }
            names.extend(
                entry
                    .value
                    .split(|c: char| c.is_whitespace() || c == ',')
                    .filter(|part| !part.is_empty()),
            );
        }

        self.keyframes
            .iter()
            .filter(|node| matches!(node, Node::AtRule { params, .. } if names.contains(params.as_str())))
            .cloned()
            .collect()
    }

    /// Declarations for every non-reference variable, prefixed and escaped.
    pub fn emitted_declarations(&self) -> Vec<Node> {
        self.values
            .iter()
            .filter(|(_, entry)| !entry.options.contains(ThemeOptions::REFERENCE))
            .map(|(key, entry)| Node::decl(escape(&self.prefix_key(key)), entry.value.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn theme(entries: &[(&str, &str, ThemeOptions)]) -> Theme {
        let mut theme = Theme::new();
        for (key, value, options) in entries {
            theme.add(key, value, *options).unwrap();
        }
        theme
    }

    #[test]
    fn last_write_wins_in_first_position() {
        let theme = theme(&[
            ("--x", "1", ThemeOptions::empty()),
            ("--y", "a", ThemeOptions::empty()),
            ("--x", "2", ThemeOptions::empty()),
        ]);

        let entries: Vec<_> = theme.iter().map(|(k, e)| (k, e.value.as_str())).collect();
        assert_eq!(entries, vec![("--x", "2"), ("--y", "a")]);
    }

    #[test]
    fn default_does_not_override_explicit_value() {
        let theme = theme(&[
            ("--x", "1", ThemeOptions::empty()),
            ("--x", "2", ThemeOptions::DEFAULT),
            ("--y", "a", ThemeOptions::DEFAULT),
            ("--y", "b", ThemeOptions::DEFAULT),
        ]);

        assert_eq!(theme.get("--x"), Some("1"));
        assert_eq!(theme.get("--y"), Some("b"));
    }

    #[test]
    fn initial_clears_keys_and_namespaces() {
        let mut theme = theme(&[
            ("--color-red", "#f00", ThemeOptions::empty()),
            ("--color-blue", "#00f", ThemeOptions::empty()),
            ("--colorful", "yes", ThemeOptions::empty()),
            ("--spacing", "4px", ThemeOptions::empty()),
        ]);

        theme.add("--color-*", "initial", ThemeOptions::empty()).unwrap();
        assert_eq!(theme.keys_in_namespace("--color"), Vec::<String>::new());
        assert!(theme.contains("--colorful"));

        theme.add("--spacing", "initial", ThemeOptions::empty()).unwrap();
        assert!(!theme.contains("--spacing"));

        theme.add("--*", "initial", ThemeOptions::empty()).unwrap();
        assert!(theme.is_empty());
    }

    #[test]
    fn wildcard_requires_initial() {
        let mut theme = Theme::new();
        let err = theme.add("--color-*", "red", ThemeOptions::empty()).unwrap_err();
        assert!(matches!(err, Error::InvalidThemeValue { .. }));
    }

    #[test]
    fn resolve_returns_reference_or_inline_value() {
        let mut theme = theme(&[
            ("--color-red-500", "#ef4444", ThemeOptions::empty()),
            ("--spacing-1\\.5", "0.375rem", ThemeOptions::INLINE),
        ]);

        assert_eq!(
            theme.resolve(Some("red-500"), &["--background-color", "--color"]).as_deref(),
            Some("var(--color-red-500)")
        );
        assert_eq!(theme.resolve(Some("1.5"), &["--spacing"]).as_deref(), Some("0.375rem"));
        assert_eq!(theme.resolve(Some("blue"), &["--color"]), None);

        theme.set_prefix(Some("tw".into()));
        assert_eq!(
            theme.resolve(Some("red-500"), &["--color"]).as_deref(),
            Some("var(--tw-color-red-500)")
        );
    }

    #[test]
    fn resolve_with_returns_nested_keys() {
        let theme = theme(&[
            ("--text-sm", "0.875rem", ThemeOptions::empty()),
            ("--text-sm--line-height", "1.25rem", ThemeOptions::empty()),
        ]);

        let (value, nested) = theme.resolve_with(Some("sm"), &["--text"], &["--line-height"]).unwrap();
        assert_eq!(value, "var(--text-sm)");
        assert_eq!(nested, vec![("--line-height".to_string(), "var(--text-sm--line-height)".to_string())]);
        assert_eq!(theme.keys_in_namespace("--text"), vec!["sm".to_string()]);
    }

    #[test]
    fn only_referenced_keyframes_are_kept() {
        let mut theme = theme(&[("--animate-spin", "spin 1s linear infinite", ThemeOptions::empty())]);
        theme.add_keyframes(Node::at_rule("keyframes", "spin", vec![]));
        theme.add_keyframes(Node::at_rule("keyframes", "unused", vec![]));

        assert_eq!(theme.referenced_keyframes(), vec![Node::at_rule("keyframes", "spin", vec![])]);
    }

    #[test]
    fn keyframes_need_an_animate_namespace_key() {
        let mut theme = theme(&[
            ("--animation-fade", "fade", ThemeOptions::empty()),
            ("--animate", "pulse 2s", ThemeOptions::empty()),
        ]);
        theme.add_keyframes(Node::at_rule("keyframes", "fade", vec![]));
        theme.add_keyframes(Node::at_rule("keyframes", "pulse", vec![]));

        assert_eq!(theme.referenced_keyframes(), vec![Node::at_rule("keyframes", "pulse", vec![])]);
    }

    #[test]
    fn emitted_declarations_skip_reference_entries() {
        let mut theme = theme(&[
            ("--x", "1", ThemeOptions::empty()),
            ("--hidden", "2", ThemeOptions::REFERENCE),
            ("--spacing-1\\.5", "3", ThemeOptions::empty()),
        ]);
        theme.set_prefix(Some("tw".into()));

        assert_eq!(
            theme.emitted_declarations(),
            vec![Node::decl("--tw-x", "1"), Node::decl("--tw-spacing-1\\.5", "3")]
        );
    }
}
