//! Incremental trie construction.
//!
//! Routes are inserted one by one into a mutable arena. Problems are collected
//! per page so a build reports every broken file at once; [`TrieBuilder::finish`]
//! only yields a [`Trie`] when nothing was recorded.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{BuildError, BuildErrors};
use crate::route::parser::RouteDefinition;
use crate::route::pattern::SegmentKey;

use super::{HandlerDescriptor, RawNode, RouteEntry, Trie};

/// What to do when two pages claim the same route and verb.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConflictPolicy {
    /// Reject the second page with [`BuildError::RouteConflict`].
    #[default]
    Error,
    /// Keep the page inserted last and log a warning.
    LastWins,
}

#[derive(Debug, Default)]
struct BuildNode {
    children: Vec<(SegmentKey, usize)>,
    entry: Option<RouteEntry>,
}

/// Mutable trie under construction.
///
/// # Examples
///
/// ```
/// use folio_router::{CompileMode, RouteDefinition, TrieBuilder};
///
/// let mut builder = TrieBuilder::new();
/// builder.add(RouteDefinition::new("about", "about", CompileMode::Loose).unwrap());
/// let trie = builder.finish().unwrap();
/// assert_eq!(trie.route_count(), 1);
/// ```
#[derive(Debug)]
pub struct TrieBuilder {
    nodes: Vec<BuildNode>,
    policy: ConflictPolicy,
    errors: Vec<BuildError>,
    inserted: usize,
}

impl Default for TrieBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TrieBuilder {
    pub fn new() -> Self {
        Self {
            nodes: vec![BuildNode::default()],
            policy: ConflictPolicy::default(),
            errors: Vec::new(),
            inserted: 0,
        }
    }

    pub fn with_conflict_policy(mut self, policy: ConflictPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn conflict_policy(&self) -> ConflictPolicy {
        self.policy
    }

    /// Registers one route.
    ///
    /// The route is validated against the current trie before anything is
    /// changed, so a rejected route leaves the builder untouched. Re-registering
    /// the same handler for the same verb is a no-op.
    pub fn insert(&mut self, route: RouteDefinition) -> Result<(), BuildError> {
        check_catch_all_position(&route)?;

        let mut current = Some(0usize);
        for key in &route.keys {
            let Some(node) = current else { break };
            if key.is_catch_all() {
                if let Some((existing, _)) = self.nodes[node]
                    .children
                    .iter()
                    .find(|(other, _)| other.is_catch_all() && other != key)
                {
                    return Err(BuildError::DuplicateCatchAll {
                        source_file: route.source.clone(),
                        key: key.to_string(),
                        existing: existing.to_string(),
                    });
                }
            }
            current = self.child(node, key);
        }

        if self.policy == ConflictPolicy::Error {
            if let Some(entry) = current.and_then(|node| self.nodes[node].entry.as_ref()) {
                for verb in &route.methods {
                    match entry.methods.get(verb) {
                        Some(existing) if existing.handler != route.handler => {
                            return Err(BuildError::RouteConflict {
                                source_file: route.source.clone(),
                                pattern: route.pattern(),
                                method: verb.clone(),
                                existing: existing.handler.clone(),
                            });
                        }
                        _ => {}
                    }
                }
            }
        }

        let pattern = route.pattern();
        let mut node = 0;
        for key in route.keys {
            node = match self.child(node, &key) {
                Some(child) => child,
                None => {
                    let child = self.nodes.len();
                    self.nodes.push(BuildNode::default());
                    self.nodes[node].children.push((key, child));
                    child
                }
            };
        }

        let entry = self.nodes[node].entry.get_or_insert_with(RouteEntry::default);
        for verb in route.methods {
            let descriptor = HandlerDescriptor {
                handler: route.handler.clone(),
                middlewares: route.middlewares.clone(),
            };
            if let Some(previous) = entry.methods.insert(verb.clone(), descriptor) {
                if previous.handler != route.handler {
                    warn!(
                        pattern = %pattern,
                        method = %verb,
                        replaced = %previous.handler,
                        handler = %route.handler,
                        "route conflict, last registration wins"
                    );
                }
            }
        }

        self.inserted += 1;
        debug!(handler = %route.handler, pattern = %pattern, "registered route");
        Ok(())
    }

    /// Like [`insert`](Self::insert) but records the error instead of returning it.
    pub fn add(&mut self, route: RouteDefinition) -> &mut Self {
        if let Err(err) = self.insert(route) {
            self.push_error(err);
        }
        self
    }

    /// Records a problem found outside the builder (e.g. a page that did not compile).
    pub fn push_error(&mut self, error: BuildError) {
        warn!(source_file = %error.source_file(), error = %error, "route rejected");
        self.errors.push(error);
    }

    pub fn errors(&self) -> &[BuildError] {
        &self.errors
    }

    /// Routes accepted so far.
    pub fn inserted(&self) -> usize {
        self.inserted
    }

    pub fn finish(mut self) -> Result<Trie, BuildErrors> {
        if !self.errors.is_empty() {
            return Err(BuildErrors(self.errors));
        }
        let root = self.detach(0);
        Ok(Trie::from_raw(root))
    }

    fn child(&self, node: usize, key: &SegmentKey) -> Option<usize> {
        self.nodes[node]
            .children
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, child)| *child)
    }

    fn detach(&mut self, node: usize) -> RawNode {
        let BuildNode { children, entry } = std::mem::take(&mut self.nodes[node]);
        RawNode {
            children: children
                .into_iter()
                .map(|(key, child)| (key, self.detach(child)))
                .collect(),
            entry,
        }
    }
}

/// Only synthetic `index` keys may follow a catch-all.
fn check_catch_all_position(route: &RouteDefinition) -> Result<(), BuildError> {
    let Some(position) = route.keys.iter().position(SegmentKey::is_catch_all) else {
        return Ok(());
    };
    if route.keys[position + 1..].iter().all(SegmentKey::is_index) {
        return Ok(());
    }
    Err(BuildError::CatchAllNotTerminal {
        source_file: route.source.clone(),
        pattern: route.pattern(),
        key: route.keys[position].to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route::pattern::CompileMode;
    use pretty_assertions::assert_eq;

    fn route(handler: &str, path: &str) -> RouteDefinition {
        RouteDefinition::new(handler, path, CompileMode::Loose).unwrap()
    }

    #[test]
    fn test_shared_prefixes_share_nodes() {
        let mut builder = TrieBuilder::new();
        builder
            .add(route("users", "users"))
            .add(route("users/[[d:id]]", "users/[[d:id]]"));
        let trie = builder.finish().unwrap();

        // root, users, users/index, users/<id>, users/<id>/index
        assert_eq!(trie.node_count(), 5);
        assert_eq!(trie.route_count(), 2);
    }

    #[test]
    fn test_conflict_is_rejected_by_default() {
        let mut builder = TrieBuilder::new();
        builder.insert(route("a", "about")).unwrap();
        let err = builder.insert(route("b", "about")).unwrap_err();
        assert_eq!(
            err,
            BuildError::RouteConflict {
                source_file: "b".to_string(),
                pattern: "/about".to_string(),
                method: "*".to_string(),
                existing: "a".to_string(),
            }
        );
    }

    #[test]
    fn test_rejected_route_leaves_trie_untouched() {
        let mut builder = TrieBuilder::new();
        builder.insert(route("a", "about")).unwrap();
        let before = builder.nodes.len();
        assert!(builder.insert(route("b", "about")).is_err());
        assert_eq!(builder.nodes.len(), before);
        assert_eq!(builder.inserted(), 1);
    }

    #[test]
    fn test_last_wins_replaces_handler() {
        let mut builder = TrieBuilder::new().with_conflict_policy(ConflictPolicy::LastWins);
        builder.add(route("a", "about")).add(route("b", "about"));
        let trie = builder.finish().unwrap();
        assert!(!trie.contains_handler("a"));
        assert!(trie.contains_handler("b"));
    }

    #[test]
    fn test_same_handler_twice_is_idempotent() {
        let mut builder = TrieBuilder::new();
        builder.insert(route("a", "about")).unwrap();
        builder.insert(route("a", "about")).unwrap();
        assert_eq!(builder.finish().unwrap().route_count(), 1);
    }

    #[test]
    fn test_different_verbs_share_a_node() {
        let mut builder = TrieBuilder::new();
        builder
            .add(route("contact.get", "contact").with_methods(["GET"]))
            .add(route("contact.post", "contact").with_methods(["POST"]));
        let trie = builder.finish().unwrap();
        assert_eq!(trie.route_count(), 2);
    }

    #[test]
    fn test_catch_all_must_be_last() {
        let mut builder = TrieBuilder::new();
        let err = builder
            .insert(route("bad", "files/[[...path]]/edit"))
            .unwrap_err();
        assert!(matches!(err, BuildError::CatchAllNotTerminal { .. }));
    }

    #[test]
    fn test_two_catch_alls_at_one_level() {
        let mut builder = TrieBuilder::new();
        builder.insert(route("a", "files/[[...path]]")).unwrap();
        let err = builder.insert(route("b", "files/[[...rest]]")).unwrap_err();
        assert_eq!(
            err,
            BuildError::DuplicateCatchAll {
                source_file: "b".to_string(),
                key: "<rest:.+>".to_string(),
                existing: "<path:.+>".to_string(),
            }
        );
    }

    #[test]
    fn test_errors_are_collected() {
        let mut builder = TrieBuilder::new();
        builder
            .add(route("a", "about"))
            .add(route("b", "about"))
            .add(route("c", "x/[[...p]]/y"));
        assert_eq!(builder.errors().len(), 2);

        let errors = builder.finish().unwrap_err();
        let files: Vec<&str> = errors.errors().iter().map(BuildError::source_file).collect();
        assert_eq!(files, vec!["b", "c"]);
    }
}
