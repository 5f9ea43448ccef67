//! Handler + parameters → URL.
//!
//! The path is rebuilt from the keys on the way from the root to the
//! handler's terminal node. Parameters not consumed by the path are appended
//! as a query string.

use std::collections::HashSet;

use regex::Regex;
use serde_json::{Map, Value};

use crate::error::ResolveError;
use crate::route::pattern::{PatternPart, SegmentKey};
use crate::route::verb::{normalize_method, ANY_METHOD};
use crate::trie::{Edge, NodeId, Trie};

/// Parameters for reverse resolution. Values must be scalars when they fill
/// a path segment; anything may go to the query string.
pub type RouteParams = Map<String, Value>;

impl Trie {
    /// Builds the URL a handler is served at.
    ///
    /// With `method`, the terminal registered for that verb is used (falling
    /// back to `*`). Without it, the first terminal the handler was registered
    /// at is used.
    ///
    /// # Examples
    ///
    /// ```
    /// use folio_router::{CompileMode, RouteDefinition, TrieBuilder};
    /// use serde_json::json;
    ///
    /// let mut builder = TrieBuilder::new();
    /// builder.add(RouteDefinition::new("blog/post", "blog/[[s:slug]]", CompileMode::Loose).unwrap());
    /// let trie = builder.finish().unwrap();
    ///
    /// let params = json!({ "slug": "hello-world", "page": 2 });
    /// let url = trie.resolve("blog/post", params.as_object().unwrap(), None).unwrap();
    /// assert_eq!(url, "/blog/hello-world?page=2");
    /// ```
    pub fn resolve(
        &self,
        handler: &str,
        params: &RouteParams,
        method: Option<&str>,
    ) -> Result<String, ResolveError> {
        let targets = self
            .handler_targets(handler)
            .ok_or_else(|| ResolveError::UnknownHandler {
                handler: handler.to_string(),
            })?;

        let target = match method {
            Some(method) => {
                let method = normalize_method(method);
                targets
                    .iter()
                    .find(|(_, verb)| *verb == method)
                    .or_else(|| targets.iter().find(|(_, verb)| verb == ANY_METHOD))
                    .ok_or_else(|| ResolveError::MethodNotRegistered {
                        handler: handler.to_string(),
                        method,
                    })?
            }
            None => targets.first().ok_or_else(|| ResolveError::UnknownHandler {
                handler: handler.to_string(),
            })?,
        };

        let edges = self.edges_to(target.0);
        let visible = self.visible_edges(target.0, &edges);

        let mut used: HashSet<&str> = HashSet::new();
        let mut url = String::new();
        for &edge in &edges[..visible] {
            url.push('/');
            render_edge(handler, edge, params, &mut used, &mut url)?;
        }
        if url.is_empty() {
            url.push('/');
        }

        let query = build_query(params.iter().filter(|(key, _)| !used.contains(key.as_str())));
        if !query.is_empty() {
            url.push('?');
            url.push_str(&query);
        }
        Ok(url)
    }

    /// Edges that appear in the URL of `terminal`.
    ///
    /// The synthetic `index` is always hidden. A directory index page
    /// (`blogs/index.php`) also hides its own `index` segment, unless a page
    /// file (`blogs.php`) already answers at that node.
    fn visible_edges(&self, terminal: NodeId, edges: &[&Edge]) -> usize {
        let mut visible = edges.len();
        if visible == 0 || !edges[visible - 1].key.is_index() {
            return visible;
        }
        visible -= 1;

        let parent_has_entry = self
            .node(terminal)
            .parent
            .is_some_and(|(parent, _)| self.node(parent).entry.is_some());
        if visible > 0 && edges[visible - 1].key.is_index() && !parent_has_entry {
            visible -= 1;
        }
        visible
    }

    /// [`resolve`](Self::resolve) for string parameters.
    pub fn url_for_params(&self, handler: &str, params: &[(&str, &str)]) -> Result<String, ResolveError> {
        let params: RouteParams = params
            .iter()
            .map(|(key, value)| (key.to_string(), Value::String(value.to_string())))
            .collect();
        self.resolve(handler, &params, None)
    }
}

fn render_edge<'a>(
    handler: &str,
    edge: &'a Edge,
    params: &RouteParams,
    used: &mut HashSet<&'a str>,
    out: &mut String,
) -> Result<(), ResolveError> {
    match &edge.key {
        SegmentKey::Literal(value) => out.push_str(&urlencoding::encode(value)),
        SegmentKey::Dynamic(pattern) => {
            let mut index = 0;
            for part in pattern.parts() {
                match part {
                    PatternPart::Text(text) => out.push_str(&urlencoding::encode(text)),
                    PatternPart::Capture { name, regex } => {
                        let value = param_value(handler, name, params)?;
                        if value.contains('/') {
                            return Err(ResolveError::SlashInSegment {
                                name: name.clone(),
                                value,
                            });
                        }
                        validate(edge.validators.get(index), name, regex, &value)?;
                        out.push_str(&urlencoding::encode(&value));
                        used.insert(name.as_str());
                        index += 1;
                    }
                }
            }
        }
        SegmentKey::CatchAll { name, regex } => {
            let value = param_value(handler, name, params)?;
            validate(edge.validators.first(), name, regex, &value)?;
            let encoded: Vec<String> = value
                .split('/')
                .map(|piece| urlencoding::encode(piece).into_owned())
                .collect();
            out.push_str(&encoded.join("/"));
            used.insert(name.as_str());
        }
    }
    Ok(())
}

fn param_value(handler: &str, name: &str, params: &RouteParams) -> Result<String, ResolveError> {
    let value = params.get(name).ok_or_else(|| ResolveError::MissingParam {
        handler: handler.to_string(),
        name: name.to_string(),
    })?;
    scalar_to_string(value).ok_or_else(|| ResolveError::NonScalarParam {
        name: name.to_string(),
    })
}

fn validate(
    validator: Option<&Result<Regex, String>>,
    name: &str,
    regex: &str,
    value: &str,
) -> Result<(), ResolveError> {
    match validator {
        Some(Ok(compiled)) if !compiled.is_match(value) => Err(ResolveError::PatternMismatch {
            name: name.to_string(),
            value: value.to_string(),
            regex: regex.to_string(),
        }),
        Some(Err(reason)) => Err(ResolveError::InvalidRegex {
            name: name.to_string(),
            regex: regex.to_string(),
            reason: reason.clone(),
        }),
        _ => Ok(()),
    }
}

/// Strings as-is, numbers in their JSON form, booleans as `1`/`0`.
/// `null`, arrays and objects have no path form.
pub fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(true) => Some("1".to_string()),
        Value::Bool(false) => Some("0".to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Encodes parameters as a query string.
///
/// Arrays become `key[0]=..&key[1]=..`, objects `key[sub]=..`, recursively.
/// `null` values are skipped. Order follows the input.
///
/// # Examples
///
/// ```
/// use folio_router::resolve::build_query;
/// use serde_json::json;
///
/// let params = json!({ "q": "a b", "tags": ["x", "y"], "skip": null });
/// assert_eq!(
///     build_query(params.as_object().unwrap()),
///     "q=a%20b&tags%5B0%5D=x&tags%5B1%5D=y"
/// );
/// ```
pub fn build_query<'a, I>(params: I) -> String
where
    I: IntoIterator<Item = (&'a String, &'a Value)>,
{
    let mut pairs = Vec::new();
    for (key, value) in params {
        push_pairs(key, value, &mut pairs);
    }
    pairs
        .iter()
        .map(|(key, value)| format!("{}={}", urlencoding::encode(key), urlencoding::encode(value)))
        .collect::<Vec<_>>()
        .join("&")
}

fn push_pairs(key: &str, value: &Value, pairs: &mut Vec<(String, String)>) {
    match value {
        Value::Null => {}
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                push_pairs(&format!("{}[{}]", key, index), item, pairs);
            }
        }
        Value::Object(map) => {
            for (sub, item) in map {
                push_pairs(&format!("{}[{}]", key, sub), item, pairs);
            }
        }
        scalar => {
            if let Some(text) = scalar_to_string(scalar) {
                pairs.push((key.to_string(), text));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route::parser::RouteDefinition;
    use crate::route::pattern::CompileMode;
    use crate::trie::TrieBuilder;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn trie(routes: &[(&str, &str)]) -> Trie {
        let mut builder = TrieBuilder::new();
        for (handler, path) in routes {
            builder.add(RouteDefinition::new(*handler, path, CompileMode::Loose).unwrap());
        }
        builder.finish().unwrap()
    }

    fn params(value: Value) -> RouteParams {
        match value {
            Value::Object(map) => map,
            _ => panic!("params must be an object"),
        }
    }

    #[test]
    fn test_root_and_index_pages() {
        let trie = trie(&[("home", "index"), ("blogs", "blogs/index")]);
        let empty = RouteParams::new();
        assert_eq!(trie.resolve("home", &empty, None).unwrap(), "/");
        assert_eq!(trie.resolve("blogs", &empty, None).unwrap(), "/blogs");
    }

    #[test]
    fn test_directory_index_next_to_page_file() {
        let trie = trie(&[("blogs", "blogs"), ("blogs-index", "blogs/index")]);
        let empty = RouteParams::new();
        assert_eq!(trie.resolve("blogs", &empty, None).unwrap(), "/blogs");
        assert_eq!(trie.resolve("blogs-index", &empty, None).unwrap(), "/blogs/index");
    }

    #[test]
    fn test_literals_are_encoded() {
        let trie = trie(&[("about", "about us")]);
        assert_eq!(trie.url_for_params("about", &[]).unwrap(), "/about%20us");
    }

    #[test]
    fn test_scalar_rendering() {
        let trie = trie(&[("flag", "flags/[[w:on]]")]);
        let url = trie.resolve("flag", &params(json!({ "on": true })), None).unwrap();
        assert_eq!(url, "/flags/1");
    }

    #[test]
    fn test_non_scalar_param() {
        let trie = trie(&[("user", "users/[[d:id]]")]);
        let err = trie
            .resolve("user", &params(json!({ "id": [1, 2] })), None)
            .unwrap_err();
        assert_eq!(err, ResolveError::NonScalarParam { name: "id".to_string() });
    }

    #[test]
    fn test_missing_param() {
        let trie = trie(&[("user", "users/[[d:id]]")]);
        let err = trie.resolve("user", &RouteParams::new(), None).unwrap_err();
        assert_eq!(
            err,
            ResolveError::MissingParam {
                handler: "user".to_string(),
                name: "id".to_string()
            }
        );
    }

    #[test]
    fn test_catch_all_keeps_slashes() {
        let trie = trie(&[("files", "files/[[...path]]")]);
        let url = trie
            .url_for_params("files", &[("path", "docs/a b.pdf")])
            .unwrap();
        assert_eq!(url, "/files/docs/a%20b.pdf");
    }

    #[test]
    fn test_method_selection() {
        let mut builder = TrieBuilder::new();
        builder
            .add(RouteDefinition::new("form", "contact", CompileMode::Loose).unwrap().with_methods(["GET"]))
            .add(RouteDefinition::new("form", "forms/contact", CompileMode::Loose).unwrap().with_methods(["POST"]));
        let trie = builder.finish().unwrap();
        let empty = RouteParams::new();

        assert_eq!(trie.resolve("form", &empty, Some("post")).unwrap(), "/forms/contact");
        assert_eq!(trie.resolve("form", &empty, Some("GET")).unwrap(), "/contact");
        assert_eq!(
            trie.resolve("form", &empty, Some("DELETE")).unwrap_err(),
            ResolveError::MethodNotRegistered {
                handler: "form".to_string(),
                method: "DELETE".to_string()
            }
        );
    }

    #[test]
    fn test_nested_query_values() {
        let query_params = params(json!({ "filter": { "tag": "rust" }, "n": 1.5 }));
        assert_eq!(build_query(&query_params), "filter%5Btag%5D=rust&n=1.5");
    }
}
