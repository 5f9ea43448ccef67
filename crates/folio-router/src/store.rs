//! Serialized trie.
//!
//! The trie is written as nested JSON objects keyed by each edge's string
//! form. Child edges live under `_children`; a terminal node carries a
//! `methods` object mapping verbs to handlers:
//!
//! ```json
//! {
//!   "users": {
//!     "_children": {
//!       "<id:[0-9]+>": {
//!         "_children": {
//!           "index": {
//!             "_children": {},
//!             "methods": { "GET": { "class": "users/[[d:id]].get" } }
//!           }
//!         }
//!       }
//!     }
//!   }
//! }
//! ```
//!
//! Loading re-parses every key and compiles its regex. A key whose regex does
//! not compile is kept but never matches.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::StoreError;
use crate::middleware::MiddlewareSpec;
use crate::route::pattern::SegmentKey;
use crate::route::verb::normalize_method;
use crate::trie::{HandlerDescriptor, NodeId, RawNode, RouteEntry, Trie};

type StoredTree = BTreeMap<String, StoredNode>;

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoredNode {
    #[serde(rename = "_children", default)]
    children: StoredTree,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    methods: Option<BTreeMap<String, StoredMethod>>,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredMethod {
    class: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    middlewares: Vec<MiddlewareSpec>,
}

/// Serializes a trie to its JSON document.
pub fn to_json(trie: &Trie) -> Result<String, StoreError> {
    Ok(serde_json::to_string_pretty(&stored_children(trie, NodeId::ROOT))?)
}

/// Rebuilds a trie from a JSON document.
pub fn from_json(json: &str) -> Result<Trie, StoreError> {
    let tree: StoredTree = serde_json::from_str(json)?;
    Ok(Trie::from_raw(RawNode {
        children: raw_children(tree),
        entry: None,
    }))
}

fn stored_children(trie: &Trie, id: NodeId) -> StoredTree {
    trie.node(id)
        .edges
        .iter()
        .map(|edge| (edge.key.to_string(), stored_node(trie, edge.child)))
        .collect()
}

fn stored_node(trie: &Trie, id: NodeId) -> StoredNode {
    let methods = trie.node(id).entry.as_ref().map(|entry| {
        entry
            .methods
            .iter()
            .map(|(verb, descriptor)| {
                let method = StoredMethod {
                    class: descriptor.handler.clone(),
                    middlewares: descriptor.middlewares.clone(),
                };
                (verb.clone(), method)
            })
            .collect()
    });
    StoredNode {
        children: stored_children(trie, id),
        methods,
    }
}

fn raw_children(tree: StoredTree) -> Vec<(SegmentKey, RawNode)> {
    tree.into_iter()
        .map(|(key, node)| {
            let entry = node
                .methods
                .filter(|methods| !methods.is_empty())
                .map(|methods| RouteEntry {
                    methods: methods
                        .into_iter()
                        .map(|(verb, method)| {
                            let descriptor = HandlerDescriptor {
                                handler: method.class,
                                middlewares: method.middlewares,
                            };
                            (normalize_method(&verb), descriptor)
                        })
                        .collect(),
                });
            let raw = RawNode {
                children: raw_children(node.children),
                entry,
            };
            (SegmentKey::parse(&key), raw)
        })
        .collect()
}

/// A trie document on disk.
#[derive(Debug, Clone)]
pub struct TrieStore {
    path: PathBuf,
}

impl TrieStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Writes the trie next to the target and renames it into place, so
    /// readers never observe a partial document.
    pub fn save(&self, trie: &Trie) -> Result<(), StoreError> {
        let json = to_json(trie)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| self.io_error(source))?;
        }

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        fs::write(&tmp, json).map_err(|source| self.io_error(source))?;
        fs::rename(&tmp, &self.path).map_err(|source| self.io_error(source))?;

        info!(path = %self.path.display(), routes = trie.route_count(), "route store written");
        Ok(())
    }

    /// Reads the trie. A missing file is [`StoreError::Missing`], not an empty trie.
    pub fn load(&self) -> Result<Trie, StoreError> {
        let json = match fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(StoreError::Missing {
                    path: self.path.clone(),
                })
            }
            Err(source) => return Err(self.io_error(source)),
        };
        let trie = from_json(&json)?;
        debug!(path = %self.path.display(), routes = trie.route_count(), "route store loaded");
        Ok(trie)
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
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
    use serde_json::{json, Value};

    #[test]
    fn test_document_shape() {
        let mut builder = TrieBuilder::new();
        builder.add(
            RouteDefinition::from_path("pages/users/[[d:id]].get.php", "pages", "php", CompileMode::Loose)
                .unwrap(),
        );
        let trie = builder.finish().unwrap();

        let document: Value = serde_json::from_str(&to_json(&trie).unwrap()).unwrap();
        assert_eq!(
            document,
            json!({
                "users": {
                    "_children": {
                        "<id:[0-9]+>": {
                            "_children": {
                                "index": {
                                    "_children": {},
                                    "methods": { "GET": { "class": "users/[[d:id]].get" } }
                                }
                            }
                        }
                    }
                }
            })
        );
    }

    #[test]
    fn test_missing_children_and_lowercase_verbs() {
        let trie = from_json(r#"{ "about": { "methods": { "get": { "class": "about" } } } }"#).unwrap();
        assert_eq!(trie.match_route("/about", "GET").found().unwrap().handler, "about");
    }

    #[test]
    fn test_malformed_document() {
        assert!(matches!(from_json("[1, 2]"), Err(StoreError::Malformed(_))));
    }
}
