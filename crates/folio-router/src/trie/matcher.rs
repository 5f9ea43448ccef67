//! Request path → handler.
//!
//! The walk is greedy and never backtracks. At each node:
//!
//! 1. a literal edge equal to the segment wins,
//! 2. otherwise dynamic edges are tried in edge order, then the catch-all,
//! 3. otherwise an `index` segment is skipped on a node that has edges,
//! 4. otherwise the request is not found.
//!
//! A synthetic `index` segment is appended to every request so that
//! `/users` reaches the node a `users.php` page terminates at. Dynamic edges
//! never capture that synthetic segment; catch-alls see it as an empty
//! remainder.

use std::collections::HashMap;

use tracing::trace;

use crate::middleware::MiddlewareSpec;
use crate::path::split_segments;
use crate::route::pattern::{SegmentKey, INDEX_SEGMENT};
use crate::route::verb::normalize_method;

use super::{KeyMatcher, NodeId, RouteEntry, Trie};

/// A successful match. Borrows handler data from the trie.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteMatch<'a> {
    pub handler: &'a str,
    /// Verb key that answered: the request verb or `*`.
    pub method: &'a str,
    pub params: HashMap<String, String>,
    pub middlewares: &'a [MiddlewareSpec],
}

impl RouteMatch<'_> {
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MatchOutcome<'a> {
    Found(RouteMatch<'a>),
    NotFound,
    /// The path exists but not for this verb.
    MethodNotAllowed { allowed: Vec<&'a str> },
}

impl<'a> MatchOutcome<'a> {
    pub fn found(self) -> Option<RouteMatch<'a>> {
        match self {
            MatchOutcome::Found(route) => Some(route),
            _ => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, MatchOutcome::Found(_))
    }

    /// HTTP status a front controller would answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            MatchOutcome::Found(_) => 200,
            MatchOutcome::NotFound => 404,
            MatchOutcome::MethodNotAllowed { .. } => 405,
        }
    }
}

impl Trie {
    /// Matches a request path and verb.
    ///
    /// The path is normalized first (query and fragment dropped, repeated
    /// slashes collapsed) and each segment is percent-decoded.
    ///
    /// # Examples
    ///
    /// ```
    /// use folio_router::{CompileMode, MatchOutcome, RouteDefinition, TrieBuilder};
    ///
    /// let mut builder = TrieBuilder::new();
    /// builder.add(RouteDefinition::new("users/[[d:id]]", "users/[[d:id]]", CompileMode::Loose).unwrap());
    /// let trie = builder.finish().unwrap();
    ///
    /// let route = trie.match_route("/users/42", "GET").found().unwrap();
    /// assert_eq!(route.handler, "users/[[d:id]]");
    /// assert_eq!(route.param("id"), Some("42"));
    ///
    /// assert_eq!(trie.match_route("/users/abc", "GET"), MatchOutcome::NotFound);
    /// ```
    pub fn match_route(&self, path: &str, method: &str) -> MatchOutcome<'_> {
        let method = normalize_method(method);
        let segments = split_segments(path);
        let mut params = HashMap::new();

        let Some(node) = self.walk(&segments, &mut params) else {
            return MatchOutcome::NotFound;
        };
        match self.terminal_entry(node) {
            Some(entry) => select(entry, &method, params),
            None => {
                trace!(path, "walk ended on a node without routes");
                MatchOutcome::NotFound
            }
        }
    }

    fn walk(&self, segments: &[String], params: &mut HashMap<String, String>) -> Option<NodeId> {
        let mut node = NodeId::ROOT;
        let total = segments.len() + 1;
        let mut position = 0;

        while position < total {
            let segment = segments
                .get(position)
                .map(String::as_str)
                .unwrap_or(INDEX_SEGMENT);

            if let Some(child) = self.literal_child(node, segment) {
                node = child;
                position += 1;
                continue;
            }

            if let Some((child, consumed)) = self.match_pattern_edge(node, segments, position, params) {
                node = child;
                position += consumed;
                continue;
            }

            if segment == INDEX_SEGMENT && !self.node(node).is_empty() {
                position += 1;
                continue;
            }

            trace!(segment, "no edge matched");
            return None;
        }

        Some(node)
    }

    /// First edge accepting the segment at `position`: dynamic edges in edge
    /// order, then the catch-all. Returns the child and how many segments
    /// (synthetic one included) it consumed.
    fn match_pattern_edge(
        &self,
        node: NodeId,
        segments: &[String],
        position: usize,
        params: &mut HashMap<String, String>,
    ) -> Option<(NodeId, usize)> {
        let edges = &self.node(node).edges;

        if position < segments.len() {
            for edge in edges {
                let (SegmentKey::Dynamic(pattern), KeyMatcher::Pattern(regex)) =
                    (&edge.key, &edge.matcher)
                else {
                    continue;
                };
                let Some(captures) = regex.captures(&segments[position]) else {
                    continue;
                };
                for (index, (name, _)) in pattern.captures().enumerate() {
                    if let Some(value) = captures.name(&format!("p{}", index)) {
                        params.insert(name.to_string(), value.as_str().to_string());
                    }
                }
                return Some((edge.child, 1));
            }
        }

        for edge in edges {
            let (SegmentKey::CatchAll { name, .. }, KeyMatcher::Pattern(regex)) =
                (&edge.key, &edge.matcher)
            else {
                continue;
            };
            let rest = segments[position..].join("/");
            if regex.is_match(&rest) {
                params.insert(name.clone(), rest);
                return Some((edge.child, segments.len() + 1 - position));
            }
        }

        None
    }
}

fn select<'a>(entry: &'a RouteEntry, method: &str, params: HashMap<String, String>) -> MatchOutcome<'a> {
    match entry.lookup(method) {
        Some((verb, descriptor)) => MatchOutcome::Found(RouteMatch {
            handler: &descriptor.handler,
            method: verb,
            params,
            middlewares: &descriptor.middlewares,
        }),
        None => MatchOutcome::MethodNotAllowed {
            allowed: entry.verbs(),
        },
    }
}
