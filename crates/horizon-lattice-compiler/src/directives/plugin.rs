//! Plugin registration API.
//!
//! Modules loaded through `@plugin` and `@config` implement [`Plugin`]. Each
//! gets a [`PluginApi`] for the duration of one [`Plugin::register`] call and
//! cannot hold on to it afterwards.

use super::{register_selector_variant, resolve_theme_path};
use crate::ast::Node;
use crate::candidate::CandidateValue;
use crate::design_system::DesignSystem;
use crate::utilities::UtilityOptions;
use crate::util::unescape;
use crate::{Error, Result};
use indexmap::IndexMap;
use serde_json::Value;
use std::path::{Path, PathBuf};

/// A module that registers utilities, variants or base styles.
pub trait Plugin: Send + Sync {
    fn register(&self, api: &mut PluginApi<'_>) -> Result<()>;
}

/// Capabilities handed to a [`Plugin`] while it registers.
pub struct PluginApi<'a> {
    design_system: &'a mut DesignSystem,
    ast: &'a mut Vec<Node>,
    base: PathBuf,
}

impl<'a> PluginApi<'a> {
    pub(crate) fn new(design_system: &'a mut DesignSystem, ast: &'a mut Vec<Node>, base: PathBuf) -> Self {
        Self {
            design_system,
            ast,
            base,
        }
    }

    /// Directory the module was loaded from.
    pub fn base(&self) -> &Path {
        &self.base
    }

    pub fn design_system(&self) -> &DesignSystem {
        &*self.design_system
    }

    /// Register static utilities from a CSS-in-object map keyed by class
    /// selectors: `{ ".btn": {...}, ".btn:hover": {...} }`.
    ///
    /// Anything after the class name becomes a nested `&` rule. Entries for
    /// the same class are merged into one utility.
    pub fn add_utilities(&mut self, utilities: &Value) -> Result<()> {
        let Value::Object(map) = utilities else {
            return Err(Error::plugin("utilities must be an object keyed by class selectors"));
        };

        let mut grouped: IndexMap<String, Vec<Node>> = IndexMap::new();
        for (selector, body) in map {
            let (class, rest) = split_class_selector(selector)
                .ok_or_else(|| Error::plugin(format!("invalid utility selector `{}`", selector)))?;

            let mut nodes = object_to_ast(body);
            if !rest.is_empty() {
                nodes = vec![Node::rule(format!("&{}", rest), nodes)];
            }
            grouped.entry(class).or_default().extend(nodes);
        }

        for (class, body) in grouped {
            tracing::trace!(utility = class.as_str(), "plugin utility");
            self.design_system
                .utilities_mut()
                .static_utility(class, move |candidate, _| (!candidate.negative).then(|| body.clone()));
        }
        Ok(())
    }

    pub fn add_components(&mut self, components: &Value) -> Result<()> {
        self.add_utilities(components)
    }

    /// Append base styles to the stylesheet inside `@layer base`.
    pub fn add_base(&mut self, base: &Value) {
        self.ast.push(Node::at_rule("layer", "base", object_to_ast(base)));
    }

    /// Register a variant from selectors such as `&:hover` or `@media print`.
    pub fn add_variant(&mut self, name: &str, selectors: &[&str]) {
        let selectors = selectors.iter().map(|s| s.to_string()).collect();
        register_selector_variant(self.design_system.variants_mut(), name, selectors);
    }

    /// Register a functional utility backed by a value map.
    ///
    /// `values` maps candidate values to CSS values; the `DEFAULT` key is used
    /// for the bare root. Arbitrary values pass through unchanged. `callback`
    /// turns the resolved value into a CSS-in-object body; returning `null`
    /// rejects the candidate.
    pub fn match_utilities<F>(&mut self, name: &str, values: IndexMap<String, String>, callback: F)
    where
        F: Fn(&str) -> Value + Send + Sync + 'static,
    {
        self.design_system.utilities_mut().functional(
            name,
            move |candidate, _| {
                if candidate.negative || candidate.modifier().is_some() {
                    return None;
                }
                let value = match candidate.value() {
                    None => values.get("DEFAULT")?.clone(),
                    Some(CandidateValue::Arbitrary { value, .. }) => value.clone(),
                    Some(CandidateValue::Named(key) | CandidateValue::Fraction(key)) => values.get(key)?.clone(),
                };
                let body = callback(&value);
                if body.is_null() {
                    return None;
                }
                Some(object_to_ast(&body))
            },
            UtilityOptions::default(),
        );
    }

    /// Raw theme value for a `--variable` or dotted path.
    pub fn theme(&self, path: &str) -> Option<String> {
        resolve_theme_path(path, self.design_system.theme())
    }

    /// Apply the theme prefix to a class name.
    pub fn prefix(&self, class: &str) -> String {
        match self.design_system.theme().prefix() {
            Some(prefix) => format!("{}:{}", prefix, class),
            None => class.to_string(),
        }
    }
}

/// Split `.btn:hover` into `("btn", ":hover")`.
fn split_class_selector(selector: &str) -> Option<(String, &str)> {
    let selector = selector.trim().strip_prefix('.')?;

    let mut end = selector.len();
    let mut chars = selector.char_indices();
    while let Some((idx, ch)) = chars.next() {
        if ch == '\\' {
            chars.next();
            continue;
        }
        if matches!(ch, ':' | '.' | '[' | '#' | '>' | '+' | '~' | ',' | ' ') {
            end = idx;
            break;
        }
    }

    let class = unescape(&selector[..end]);
    if class.is_empty() {
        return None;
    }
    Some((class, &selector[end..]))
}

/// Convert a CSS-in-object value into nodes.
///
/// Keys are camel-cased properties (`backgroundColor`, `WebkitAppearance`),
/// nested selectors or `@`-rules. Arrays repeat their key, `null` and `false`
/// are skipped, and a `"@slot"` string value creates a slot rule.
///
/// ```
/// use horizon_lattice_compiler::{object_to_ast, to_css};
/// use serde_json::json;
///
/// let nodes = object_to_ast(&json!({ "backgroundColor": "red", "&:hover": { "color": "blue" } }));
/// assert_eq!(to_css(&nodes), "background-color: red;\n&:hover {\n  color: blue;\n}\n");
/// ```
pub fn object_to_ast(value: &Value) -> Vec<Node> {
    let mut nodes = Vec::new();
    match value {
        Value::Object(map) => {
            for (key, value) in map {
                push_entry(&mut nodes, key, value);
            }
        }
        Value::Array(items) => {
            for item in items {
                nodes.extend(object_to_ast(item));
            }
        }
        _ => {}
    }
    nodes
}

fn push_entry(nodes: &mut Vec<Node>, key: &str, value: &Value) {
    match value {
        Value::Null | Value::Bool(false) => {}
        Value::Array(items) => {
            for item in items {
                push_entry(nodes, key, item);
            }
        }
        Value::Object(_) => nodes.push(Node::rule_or_at_rule(key, object_to_ast(value))),
        Value::String(text) if text == "@slot" => {
            nodes.push(Node::rule_or_at_rule(key, vec![Node::at_rule("slot", "", vec![])]));
        }
        Value::String(text) => nodes.push(Node::decl(property_name(key), text.clone())),
        Value::Number(number) => nodes.push(Node::decl(property_name(key), number.to_string())),
        Value::Bool(true) => nodes.push(Node::decl(property_name(key), "true")),
    }
}

/// `backgroundColor` to `background-color`, `WebkitAppearance` to
/// `-webkit-appearance`. Custom properties are left alone.
fn property_name(key: &str) -> String {
    if key.starts_with("--") {
        return key.to_string();
    }
    let mut name = String::with_capacity(key.len() + 4);
    for ch in key.chars() {
        if ch.is_ascii_uppercase() {
            name.push('-');
            name.push(ch.to_ascii_lowercase());
        } else {
            name.push(ch);
        }
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::to_css;
    use crate::theme::{Theme, ThemeOptions};
    use serde_json::json;

    fn design_system() -> DesignSystem {
        let mut theme = Theme::new();
        theme.add("--color-red-500", "#ef4444", ThemeOptions::empty()).unwrap();
        DesignSystem::new(theme)
    }

    #[test]
    fn kebab_cases_properties_and_vendor_prefixes() {
        assert_eq!(property_name("backgroundColor"), "background-color");
        assert_eq!(property_name("WebkitAppearance"), "-webkit-appearance");
        assert_eq!(property_name("--myVar"), "--myVar");
    }

    #[test]
    fn object_to_ast_handles_nesting_arrays_and_skips() {
        let nodes = object_to_ast(&json!({
            "display": ["-webkit-box", "flex"],
            "zIndex": 10,
            "color": null,
            "outline": false,
            "@media (hover: hover)": { "&:hover": "@slot" },
        }));

        assert_eq!(
            to_css(&nodes),
            "display: -webkit-box;\ndisplay: flex;\nz-index: 10;\n@media (hover: hover) {\n  &:hover {\n    @slot;\n  }\n}\n"
        );
    }

    #[test]
    fn splits_class_selectors() {
        assert_eq!(split_class_selector(".btn:hover"), Some(("btn".to_string(), ":hover")));
        assert_eq!(split_class_selector(".w-1\\/2"), Some(("w-1/2".to_string(), "")));
        assert_eq!(split_class_selector("button"), None);
    }

    #[test]
    fn add_utilities_merges_entries_per_class() {
        let mut ds = design_system();
        let mut ast = Vec::new();
        let mut api = PluginApi::new(&mut ds, &mut ast, PathBuf::from("/"));
        api.add_utilities(&json!({
            ".btn": { "padding": "1rem" },
            ".btn:hover": { "opacity": "0.5" },
        }))
        .unwrap();

        let css = to_css(&ds.compile_candidates(["btn"], |_| {}));
        assert_eq!(css, ".btn {\n  padding: 1rem;\n  &:hover {\n    opacity: 0.5;\n  }\n}\n");
    }

    #[test]
    fn match_utilities_resolves_values() {
        let mut ds = design_system();
        let mut ast = Vec::new();
        let mut api = PluginApi::new(&mut ds, &mut ast, PathBuf::from("/"));
        let values = IndexMap::from([("DEFAULT".to_string(), "4".to_string()), ("8".to_string(), "8".to_string())]);
        api.match_utilities("tab", values, |value| json!({ "tabSize": value }));

        let css = to_css(&ds.compile_candidates(["tab", "tab-8", "tab-[12]", "tab-3"], |_| {}));
        assert!(css.contains(".tab {\n  tab-size: 4;\n}\n"));
        assert!(css.contains(".tab-8 {\n  tab-size: 8;\n}\n"));
        assert!(css.contains(".tab-\\[12\\] {\n  tab-size: 12;\n}\n"));
        assert!(!css.contains("tab-3"));
    }

    #[test]
    fn theme_base_variant_and_prefix() {
        let mut ds = design_system();
        let mut ast = Vec::new();
        {
            let mut api = PluginApi::new(&mut ds, &mut ast, PathBuf::from("/"));
            assert_eq!(api.theme("colors.red.500").as_deref(), Some("#ef4444"));
            assert_eq!(api.prefix("flex"), "flex");
            api.add_base(&json!({ "h1": { "fontWeight": "700" } }));
            api.add_variant("optional", &["&:optional"]);
        }

        assert_eq!(to_css(&ast), "@layer base {\n  h1 {\n    font-weight: 700;\n  }\n}\n");
        assert_eq!(
            to_css(&ds.compile_candidates(["optional:flex"], |_| {})),
            ".optional\\:flex {\n  &:optional {\n    display: flex;\n  }\n}\n"
        );
    }
}
