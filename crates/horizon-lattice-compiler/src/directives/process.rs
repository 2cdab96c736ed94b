use super::{register_selector_variant, substitute_at_apply, substitute_functions, substitute_imports};
use crate::ast::{AtRuleKind, ContextMap, Node, NodePath, WalkAction, WalkContext, to_css, walk, walk_ref};
use crate::design_system::DesignSystem;
use crate::directives::PluginApi;
use crate::loader::{GlobEntry, ModuleCache, ModuleKind};
use crate::options::CompileOptions;
use crate::theme::{Theme, ThemeOptions, ThemeParams};
use crate::util::{segment, split_whitespace};
use crate::{Error, Result};
use regex::Regex;
use std::path::PathBuf;
use std::sync::LazyLock;

/// Context key marking the `@tailwind utilities` emission site.
pub(crate) const UTILITIES_KEY: &str = "utilities";
/// Context key marking the theme emission anchor.
pub(crate) const THEME_KEY: &str = "theme";

static UTILITY_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z][a-zA-Z0-9/%._-]*$").expect("utility name regex should compile"));

/// Output of directive processing.
#[derive(Debug)]
pub(crate) struct Processed {
    pub design_system: DesignSystem,
    pub globs: Vec<GlobEntry>,
    pub utilities_path: Option<NodePath>,
}

enum CustomVariant {
    Selectors(Vec<String>),
    Body(Vec<Node>),
}

/// Everything the main walk collects before the design system exists.
struct Collector {
    base: PathBuf,
    theme: Theme,
    utilities: Vec<(String, Vec<Node>)>,
    variants: Vec<(String, CustomVariant)>,
    modules: Vec<(String, PathBuf, ModuleKind)>,
    globs: Vec<GlobEntry>,
    theme_anchor: bool,
    utilities_anchor: bool,
}

impl Collector {
    fn base(&self, cx: &WalkContext<'_>) -> PathBuf {
        cx.context("base").map(PathBuf::from).unwrap_or_else(|| self.base.clone())
    }

    fn visit(&mut self, node: &mut Node, cx: &WalkContext<'_>) -> Result<WalkAction> {
        let Node::AtRule { name, params, nodes } = node else {
            return Ok(WalkAction::Continue);
        };

        match AtRuleKind::from_name(name) {
            AtRuleKind::Tailwind => {
                if params.trim() != "utilities" {
                    return Ok(WalkAction::Continue);
                }
                if self.utilities_anchor {
                    return Ok(WalkAction::Replace(vec![]));
                }
                self.utilities_anchor = true;
                Ok(WalkAction::Replace(vec![placeholder(UTILITIES_KEY)]))
            }

            AtRuleKind::Utility => {
                if !cx.is_root() {
                    return Err(Error::invalid_directive("utility", "cannot be nested."));
                }
                let utility = params.trim().to_string();
                if !UTILITY_NAME.is_match(&utility) {
                    return Err(Error::InvalidUtilityName { name: utility });
                }
                if nodes.is_empty() {
                    return Err(Error::EmptyUtility { name: utility });
                }
                self.utilities.push((utility, nodes.clone()));
                Ok(WalkAction::Skip)
            }

            AtRuleKind::Variant => {
                if !cx.is_root() {
                    return Err(Error::invalid_directive("variant", "cannot be nested."));
                }
                let params = params.trim();
                let (variant, selector) = match params.find(char::is_whitespace) {
                    Some(idx) => (&params[..idx], params[idx..].trim()),
                    None => (params, ""),
                };
                let selector = selector
                    .strip_prefix('(')
                    .and_then(|s| s.strip_suffix(')'))
                    .unwrap_or(selector)
                    .trim();

                let custom = match (selector.is_empty(), nodes.is_empty()) {
                    (false, false) => {
                        return Err(Error::invalid_directive(
                            format!("variant {}", variant),
                            "cannot have both a selector and a body.",
                        ));
                    }
                    (true, true) => {
                        return Err(Error::invalid_directive(
                            format!("variant {}", variant),
                            "has no selector or body.",
                        ));
                    }
                    (false, true) => CustomVariant::Selectors(
                        segment(selector, ',')
                            .into_iter()
                            .map(|s| s.trim().to_string())
                            .filter(|s| !s.is_empty())
                            .collect(),
                    ),
                    (true, false) => CustomVariant::Body(std::mem::take(nodes)),
                };
                self.variants.push((variant.to_string(), custom));
                Ok(WalkAction::Replace(vec![]))
            }

            AtRuleKind::Source => {
                let path = quoted_argument("source", params, nodes, cx)?;
                self.globs.push(GlobEntry {
                    base: self.base(cx),
                    pattern: path,
                });
                Ok(WalkAction::Replace(vec![]))
            }

            kind @ (AtRuleKind::Plugin | AtRuleKind::Config) => {
                let module_kind = if kind == AtRuleKind::Plugin {
                    ModuleKind::Plugin
                } else {
                    ModuleKind::Config
                };
                let id = quoted_argument(module_kind.directive(), params, nodes, cx)?;
                self.modules.push((id, self.base(cx), module_kind));
                Ok(WalkAction::Replace(vec![]))
            }

            AtRuleKind::Theme => {
                let theme_params = ThemeParams::parse(params)?;
                if let Some(prefix) = theme_params.prefix {
                    self.theme.set_prefix(Some(prefix));
                }

                for child in nodes.iter() {
                    match child {
                        Node::Comment { .. } => {}
                        Node::Declaration { property, value, .. } if property.starts_with("--") => {
                            self.theme
                                .add(property, value.as_deref().unwrap_or_default(), theme_params.options)?;
                        }
                        Node::AtRule { name, .. } if AtRuleKind::from_name(name) == AtRuleKind::Keyframes => {
                            self.theme.add_keyframes(child.clone());
                        }
                        _ => {
                            return Err(Error::invalid_directive(
                                "theme",
                                format!(
                                    "blocks must only contain custom properties or `@keyframes`.\n\n{}",
                                    to_css(std::slice::from_ref(child))
                                ),
                            ));
                        }
                    }
                }

                if theme_params.options.contains(ThemeOptions::REFERENCE) || self.theme_anchor {
                    return Ok(WalkAction::Replace(vec![]));
                }
                self.theme_anchor = true;
                Ok(WalkAction::Replace(vec![placeholder(THEME_KEY)]))
            }

            AtRuleKind::Import => Ok(WalkAction::Skip),

            AtRuleKind::Media
            | AtRuleKind::Apply
            | AtRuleKind::Keyframes
            | AtRuleKind::Slot
            | AtRuleKind::Other => Ok(WalkAction::Continue),
        }
    }
}

fn placeholder(key: &str) -> Node {
    Node::context(ContextMap::from([(key.to_string(), String::new())]), vec![])
}

/// Validate a root-level, body-less directive taking one quoted path.
fn quoted_argument(directive: &str, params: &str, nodes: &[Node], cx: &WalkContext<'_>) -> Result<String> {
    if !cx.is_root() {
        return Err(Error::invalid_directive(directive, "cannot be nested."));
    }
    if !nodes.is_empty() {
        return Err(Error::invalid_directive(directive, "cannot have a body."));
    }
    let params = params.trim();
    ['"', '\'']
        .iter()
        .find_map(|q| params.strip_prefix(*q).and_then(|p| p.strip_suffix(*q)))
        .map(str::to_string)
        .ok_or_else(|| Error::invalid_directive(directive, "paths must be quoted."))
}

/// Forward `theme(...)` and `prefix(...)` from `@media` params onto the
/// `@theme` blocks inside, and pick up `important`.
///
/// Runs before the main walk so the unwrapped children still get processed.
fn forward_media_options(ast: &mut Vec<Node>, important: &mut bool) -> Result<()> {
    let mut error = None;

    walk(ast, |node, _| {
        let Node::AtRule { name, params, nodes } = node else {
            return WalkAction::Continue;
        };
        if AtRuleKind::from_name(name) != AtRuleKind::Media {
            return WalkAction::Continue;
        }

        let mut theme_params = Vec::new();
        let mut unknown = Vec::new();
        for token in split_whitespace(params) {
            if token.starts_with("theme(") || token.starts_with("prefix(") {
                theme_params.push(token.to_string());
            } else if token == "important" {
                *important = true;
            } else {
                unknown.push(token.to_string());
            }
        }
        let consumed = unknown.len() != split_whitespace(params).len();
        if !consumed {
            return WalkAction::Continue;
        }

        if !theme_params.is_empty() {
            let forwarded = theme_params.join(" ");
            walk(nodes, |child, _| match child {
                Node::Comment { .. } => WalkAction::Continue,
                Node::AtRule { name, params, .. } if AtRuleKind::from_name(name) == AtRuleKind::Theme => {
                    if params.is_empty() {
                        *params = forwarded.clone();
                    } else {
                        params.push(' ');
                        params.push_str(&forwarded);
                    }
                    WalkAction::Skip
                }
                Node::AtRule { .. } => WalkAction::Continue,
                _ => {
                    error = Some(Error::invalid_directive(
                        "import",
                        "with `theme(…)` must only import stylesheets containing `@theme` blocks.",
                    ));
                    WalkAction::Stop
                }
            });
            if error.is_some() {
                return WalkAction::Stop;
            }
        }

        if unknown.is_empty() {
            return WalkAction::Replace(std::mem::take(nodes));
        }
        *params = unknown.join(" ");
        WalkAction::Continue
    });

    error.map_or(Ok(()), Err)
}

/// Run the full directive pipeline over a parsed stylesheet.
#[tracing::instrument(skip_all)]
pub(crate) async fn process(ast: &mut Vec<Node>, options: &CompileOptions) -> Result<Processed> {
    substitute_imports(ast, &options.base, options.stylesheet_loader.as_deref()).await?;

    let mut important = false;
    forward_media_options(ast, &mut important)?;

    let mut collector = Collector {
        base: options.base.clone(),
        theme: Theme::new(),
        utilities: Vec::new(),
        variants: Vec::new(),
        modules: Vec::new(),
        globs: Vec::new(),
        theme_anchor: false,
        utilities_anchor: false,
    };
    let mut error = None;
    walk(ast, |node, cx| match collector.visit(node, cx) {
        Ok(action) => action,
        Err(err) => {
            error = Some(err);
            WalkAction::Stop
        }
    });
    if let Some(err) = error {
        return Err(err);
    }

    let Collector {
        theme,
        utilities,
        variants,
        modules,
        globs,
        ..
    } = collector;

    let mut design_system = DesignSystem::new(theme);
    design_system.set_important(important);

    for (name, variant) in variants {
        match variant {
            CustomVariant::Selectors(selectors) => {
                register_selector_variant(design_system.variants_mut(), &name, selectors);
            }
            CustomVariant::Body(body) => design_system.variants_mut().from_ast(name, body),
        }
    }

    if !modules.is_empty() {
        let mut cache = ModuleCache::new();
        for (id, base, kind) in modules {
            let Some(loader) = options.module_loader.as_deref() else {
                return Err(Error::missing_loader(kind.directive()));
            };
            let loaded = cache.get_or_load(loader, &id, &base, kind).await?;
            let mut api = PluginApi::new(&mut design_system, ast, loaded.base.clone());
            loaded.module.register(&mut api)?;
            tracing::debug!(module = id.as_str(), "registered module");
        }
    }

    register_custom_utilities(&mut design_system, utilities)?;

    substitute_at_apply(ast, &mut design_system)?;
    walk(ast, |node, _| match node.at_rule_kind() {
        Some(AtRuleKind::Utility) => WalkAction::Replace(vec![]),
        _ => WalkAction::Continue,
    });
    substitute_functions(ast, design_system.theme())?;

    if let Some(anchor) = find_placeholder(ast, THEME_KEY)
        && let Some(Node::Context { nodes, .. }) = anchor.get_mut(ast)
    {
        let theme = design_system.theme();
        let declarations = theme.emitted_declarations();
        if !declarations.is_empty() {
            nodes.push(Node::rule(":root", declarations));
        }
        let keyframes = theme.referenced_keyframes();
        if !keyframes.is_empty() {
            nodes.push(Node::at_root(keyframes));
        }
    }

    let utilities_path = find_placeholder(ast, UTILITIES_KEY);
    tracing::debug!(
        theme = design_system.theme().len(),
        globs = globs.len(),
        emits_utilities = utilities_path.is_some(),
        "processed directives"
    );

    Ok(Processed {
        design_system,
        globs,
        utilities_path,
    })
}

/// Register `@utility` definitions so that each body's `@apply` runs after
/// every custom utility it names is registered. Document order does not
/// matter; a definition that can never become ready is part of a cycle.
fn register_custom_utilities(design_system: &mut DesignSystem, utilities: Vec<(String, Vec<Node>)>) -> Result<()> {
    let mut pending: Vec<(String, Vec<Node>, Vec<String>)> = utilities
        .into_iter()
        .map(|(name, body)| {
            let applied = applied_utilities(&body);
            (name, body, applied)
        })
        .collect();

    while !pending.is_empty() {
        let waiting: Vec<String> = pending.iter().map(|(name, ..)| name.clone()).collect();
        let (ready, blocked): (Vec<_>, Vec<_>) = pending
            .into_iter()
            .partition(|(_, _, applied)| applied.iter().all(|root| !waiting.contains(root)));

        if ready.is_empty() {
            let name = blocked.first().map(|(name, ..)| name.clone()).unwrap_or_default();
            return Err(Error::CircularApply { name });
        }

        for (name, mut body, _) in ready {
            substitute_at_apply(&mut body, design_system)?;
            design_system
                .utilities_mut()
                .static_utility(name, move |candidate, _| (!candidate.negative).then(|| body.clone()));
        }
        pending = blocked;
    }
    Ok(())
}

/// Base utility names (variants and important markers stripped) listed by
/// the `@apply` rules inside a body.
fn applied_utilities(body: &[Node]) -> Vec<String> {
    let mut applied = Vec::new();
    walk_ref(body, |node, _| {
        if let Node::AtRule { name, params, .. } = node
            && AtRuleKind::from_name(name) == AtRuleKind::Apply
        {
            for candidate in split_whitespace(params) {
                let Some(base) = segment(candidate, ':').pop() else {
                    continue;
                };
                let base = base.trim_matches('!');
                if !base.is_empty() {
                    applied.push(base.to_string());
                }
            }
        }
    });
    applied
}

fn find_placeholder(ast: &[Node], key: &str) -> Option<NodePath> {
    NodePath::find(ast, |node| matches!(node, Node::Context { context, .. } if context.contains_key(key)))
}
