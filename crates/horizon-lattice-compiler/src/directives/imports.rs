//! `@import` substitution.

use crate::ast::{AtRuleKind, ContextMap, Node};
use crate::loader::StylesheetLoader;
use crate::parser::parse;
use crate::util::split_whitespace;
use crate::{Error, Result};
use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use std::path::{Path, PathBuf};

/// Parsed params of an `@import` at-rule.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
struct ImportParams {
    uri: String,
    /// `Some("")` for a bare `layer` keyword.
    layer: Option<String>,
    supports: Option<String>,
    media: Option<String>,
}

impl ImportParams {
    fn parse(params: &str) -> Option<Self> {
        let tokens = split_whitespace(params);
        let (first, rest) = tokens.split_first()?;

        let uri = unquote(first).or_else(|| {
            first
                .strip_prefix("url(")
                .and_then(|inner| inner.strip_suffix(')'))
                .map(|inner| unquote(inner.trim()).unwrap_or(inner.trim()))
        })?;

        let mut parsed = Self {
            uri: uri.to_string(),
            ..Self::default()
        };
        let mut media = Vec::new();

        for token in rest {
            if *token == "layer" && parsed.layer.is_none() {
                parsed.layer = Some(String::new());
            } else if let Some(name) = token.strip_prefix("layer(").and_then(|t| t.strip_suffix(')')) {
                parsed.layer = Some(name.trim().to_string());
            } else if let Some(condition) = token.strip_prefix("supports(").and_then(|t| t.strip_suffix(')')) {
                parsed.supports = Some(condition.trim().to_string());
            } else {
                media.push(*token);
            }
        }

        if !media.is_empty() {
            parsed.media = Some(media.join(" "));
        }
        Some(parsed)
    }

    fn is_remote(&self) -> bool {
        ["http://", "https://", "//", "data:"]
            .iter()
            .any(|scheme| self.uri.starts_with(scheme))
    }

    /// Wrap imported nodes in the conditions declared on the `@import`.
    fn wrap(&self, mut nodes: Vec<Node>) -> Vec<Node> {
        if let Some(media) = &self.media {
            nodes = vec![Node::at_rule("media", media.clone(), nodes)];
        }
        if let Some(supports) = &self.supports {
            let condition = if supports.starts_with('(') {
                supports.clone()
            } else {
                format!("({})", supports)
            };
            nodes = vec![Node::at_rule("supports", condition, nodes)];
        }
        if let Some(layer) = &self.layer {
            nodes = vec![Node::at_rule("layer", layer.clone(), nodes)];
        }
        nodes
    }
}

fn unquote(value: &str) -> Option<&str> {
    ['"', '\'']
        .iter()
        .find_map(|q| value.strip_prefix(*q).and_then(|v| v.strip_suffix(*q)))
}

/// Replace every root-level `@import` with the parsed content it points to.
///
/// Imported stylesheets are processed recursively before being spliced in.
/// Each spliced stylesheet is wrapped in a [`Node::Context`] carrying its
/// `base` so later directives resolve relative paths against the right
/// directory. Remote imports are left untouched.
#[tracing::instrument(skip_all)]
pub(crate) async fn substitute_imports(
    nodes: &mut Vec<Node>,
    base: &Path,
    loader: Option<&dyn StylesheetLoader>,
) -> Result<()> {
    substitute(nodes, base.to_path_buf(), Vec::new(), loader).await
}

fn substitute<'a>(
    nodes: &'a mut Vec<Node>,
    base: PathBuf,
    chain: Vec<PathBuf>,
    loader: Option<&'a dyn StylesheetLoader>,
) -> BoxFuture<'a, Result<()>> {
    async move {
        let mut idx = 0;
        while idx < nodes.len() {
            let params = match &nodes[idx] {
                Node::AtRule { name, params, .. } if AtRuleKind::from_name(name) == AtRuleKind::Import => {
                    params.clone()
                }
                _ => {
                    idx += 1;
                    continue;
                }
            };

            let Some(import) = ImportParams::parse(&params) else {
                return Err(Error::invalid_directive(
                    "import",
                    format!("has an invalid path: `{}`", params),
                ));
            };
            if import.is_remote() {
                tracing::warn!(uri = import.uri.as_str(), "leaving remote @import in place");
                idx += 1;
                continue;
            }

            let Some(loader) = loader else {
                return Err(Error::missing_loader("import"));
            };
            let loaded = loader.load_stylesheet(&import.uri, &base).await?;
            if chain.contains(&loaded.path) {
                return Err(Error::CircularImport {
                    path: loaded.path,
                    chain,
                });
            }

            let mut imported = parse(&loaded.content)?;
            let mut nested_chain = chain.clone();
            nested_chain.push(loaded.path.clone());
            substitute(&mut imported, loaded.base.clone(), nested_chain, Some(loader)).await?;

            tracing::debug!(uri = import.uri.as_str(), nodes = imported.len(), "spliced import");
            let context = ContextMap::from([("base".to_string(), loaded.base.display().to_string())]);
            nodes[idx] = Node::context(context, import.wrap(imported));
            idx += 1;
        }
        Ok(())
    }
    .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::to_css;
    use crate::loader::LoadedStylesheet;
    use std::collections::HashMap;

    struct MemoryLoader(HashMap<&'static str, &'static str>);

    impl StylesheetLoader for MemoryLoader {
        fn load_stylesheet<'a>(&'a self, id: &'a str, base: &'a Path) -> BoxFuture<'a, Result<LoadedStylesheet>> {
            async move {
                let content = self.0.get(id).ok_or_else(|| Error::unresolved_import(id, base))?;
                Ok(LoadedStylesheet {
                    path: PathBuf::from("/").join(id),
                    base: PathBuf::from("/"),
                    content: content.to_string(),
                })
            }
            .boxed()
        }
    }

    #[test]
    fn parses_import_params() {
        let import = ImportParams::parse("url('a.css') layer(base) supports(display: grid) screen and (print)").unwrap();
        assert_eq!(import.uri, "a.css");
        assert_eq!(import.layer.as_deref(), Some("base"));
        assert_eq!(import.supports.as_deref(), Some("display: grid"));
        assert_eq!(import.media.as_deref(), Some("screen and (print)"));

        assert!(ImportParams::parse("\"https://fonts.example/css\"").unwrap().is_remote());
        assert!(ImportParams::parse("missing-quotes.css").is_none());
    }

    #[tokio::test]
    async fn splices_nested_imports_with_conditions() {
        let loader = MemoryLoader(HashMap::from([
            ("a.css", "@import \"b.css\" layer(x); .a { color: red; }"),
            ("b.css", ".b { color: blue; }"),
        ]));
        let mut nodes = parse("@import 'a.css' print;").unwrap();
        substitute_imports(&mut nodes, Path::new("/"), Some(&loader)).await.unwrap();

        assert_eq!(
            to_css(&nodes),
            "@media print {\n  @layer x {\n    .b {\n      color: blue;\n    }\n  }\n  .a {\n    color: red;\n  }\n}\n"
        );
    }

    #[tokio::test]
    async fn remote_imports_stay_in_place() {
        let mut nodes = parse("@import url(https://example.com/a.css);").unwrap();
        substitute_imports(&mut nodes, Path::new("/"), None).await.unwrap();
        assert_eq!(to_css(&nodes), "@import url(https://example.com/a.css);\n");
    }

    #[tokio::test]
    async fn missing_loader_is_an_error() {
        let mut nodes = parse("@import \"a.css\";").unwrap();
        let err = substitute_imports(&mut nodes, Path::new("/"), None).await.unwrap_err();
        assert!(matches!(err, Error::MissingLoader { ref directive } if directive == "import"));
    }

    #[tokio::test]
    async fn circular_imports_are_rejected() {
        let loader = MemoryLoader(HashMap::from([
            ("a.css", "@import \"b.css\";"),
            ("b.css", "@import \"a.css\";"),
        ]));
        let mut nodes = parse("@import \"a.css\";").unwrap();
        let err = substitute_imports(&mut nodes, Path::new("/"), Some(&loader)).await.unwrap_err();

        assert!(matches!(err, Error::CircularImport { ref path, .. } if path == Path::new("/a.css")));
    }
}
