//! Route trie
//!
//! Nodes live in a flat arena and refer to each other by [`NodeId`]. A node
//! owns its outgoing edges (one per [`SegmentKey`]) and, when it terminates a
//! route, a [`RouteEntry`] mapping verbs to handlers.
//!
//! A `Trie` is immutable once produced by [`TrieBuilder::finish`] or loaded by
//! the [store](crate::store). Edge regexes are compiled at that point, so the
//! trie can be shared across threads and queried without locking.

pub mod builder;
pub mod matcher;

use std::collections::{BTreeMap, HashMap};

use regex::Regex;
use tracing::warn;

use crate::middleware::MiddlewareSpec;
use crate::route::parser::render_pattern;
use crate::route::pattern::{SegmentKey, INDEX_SEGMENT};
use crate::route::verb::ANY_METHOD;

pub use builder::{ConflictPolicy, TrieBuilder};
pub use matcher::{MatchOutcome, RouteMatch};

/// Index of a node in the trie arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub const ROOT: NodeId = NodeId(0);

    pub fn index(self) -> usize {
        self.0
    }
}

/// The page serving one verb of a route.
#[derive(Debug, Clone, PartialEq)]
pub struct HandlerDescriptor {
    pub handler: String,
    pub middlewares: Vec<MiddlewareSpec>,
}

/// Verbs registered at a terminal node. `*` answers any other verb.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RouteEntry {
    pub methods: BTreeMap<String, HandlerDescriptor>,
}

impl RouteEntry {
    /// Exact verb first, then `*`. Returns the key that answered.
    pub fn lookup(&self, method: &str) -> Option<(&str, &HandlerDescriptor)> {
        self.methods
            .get_key_value(method)
            .or_else(|| self.methods.get_key_value(ANY_METHOD))
            .map(|(verb, descriptor)| (verb.as_str(), descriptor))
    }

    pub fn verbs(&self) -> Vec<&str> {
        self.methods.keys().map(String::as_str).collect()
    }
}

/// Owned subtree, the shape both the builder and the store produce before
/// the trie is frozen.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct RawNode {
    pub children: Vec<(SegmentKey, RawNode)>,
    pub entry: Option<RouteEntry>,
}

impl RawNode {
    /// Sorts edges by the key's string form (byte order) at every depth.
    pub fn sorted(self) -> RawNode {
        let mut children: Vec<(SegmentKey, RawNode)> = self
            .children
            .into_iter()
            .map(|(key, child)| (key, child.sorted()))
            .collect();
        children.sort_by_cached_key(|(key, _)| key.to_string());
        RawNode {
            children,
            entry: self.entry,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) enum KeyMatcher {
    Literal,
    Pattern(Regex),
    /// The key's regex does not compile; the edge never matches.
    Invalid,
}

#[derive(Debug, Clone)]
pub(crate) struct Edge {
    pub key: SegmentKey,
    pub child: NodeId,
    pub matcher: KeyMatcher,
    /// Anchored per-capture regexes used by reverse resolution.
    pub validators: Vec<Result<Regex, String>>,
}

impl Edge {
    fn compile(key: SegmentKey, child: NodeId) -> Self {
        let (matcher, validators) = match &key {
            SegmentKey::Literal(_) => (KeyMatcher::Literal, Vec::new()),
            SegmentKey::Dynamic(pattern) => {
                let matcher = match Regex::new(&pattern.to_regex()) {
                    Ok(re) => KeyMatcher::Pattern(re),
                    Err(err) => {
                        warn!(key = %key, error = %err, "invalid route regex, segment will never match");
                        KeyMatcher::Invalid
                    }
                };
                let validators = pattern.captures().map(|(_, regex)| anchored(regex)).collect();
                (matcher, validators)
            }
            SegmentKey::CatchAll { regex, .. } => {
                let validator = anchored(regex);
                let matcher = match &validator {
                    Ok(re) => KeyMatcher::Pattern(re.clone()),
                    Err(err) => {
                        warn!(key = %key, error = %err, "invalid route regex, segment will never match");
                        KeyMatcher::Invalid
                    }
                };
                (matcher, vec![validator])
            }
        };

        Self {
            key,
            child,
            matcher,
            validators,
        }
    }
}

fn anchored(regex: &str) -> Result<Regex, String> {
    Regex::new(&format!("^(?:{})$", regex)).map_err(|err| err.to_string())
}

#[derive(Debug, Clone, Default)]
pub(crate) struct Node {
    pub edges: Vec<Edge>,
    pub entry: Option<RouteEntry>,
    /// Parent node and the index of the edge leading here.
    pub parent: Option<(NodeId, usize)>,
}

impl Node {
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty() && self.entry.is_none()
    }
}

/// One registered verb, as listed by [`Trie::routes`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteListing {
    pub pattern: String,
    pub method: String,
    pub handler: String,
}

/// Compiled, read-only routing trie.
#[derive(Debug, Clone)]
pub struct Trie {
    nodes: Vec<Node>,
    /// handler id → terminal nodes and the verb each one is registered for
    handlers: HashMap<String, Vec<(NodeId, String)>>,
}

impl Default for Trie {
    fn default() -> Self {
        Self {
            nodes: vec![Node::default()],
            handlers: HashMap::new(),
        }
    }
}

impl Trie {
    /// Freezes an owned tree into the arena. Children are sorted first.
    pub(crate) fn from_raw(root: RawNode) -> Self {
        let mut trie = Trie::default();
        trie.attach(NodeId::ROOT, root.sorted());
        trie
    }

    fn attach(&mut self, id: NodeId, raw: RawNode) {
        if let Some(entry) = &raw.entry {
            for (verb, descriptor) in &entry.methods {
                self.handlers
                    .entry(descriptor.handler.clone())
                    .or_default()
                    .push((id, verb.clone()));
            }
        }
        self.nodes[id.0].entry = raw.entry;

        for (key, child_raw) in raw.children {
            let child = NodeId(self.nodes.len());
            let edge_index = self.nodes[id.0].edges.len();
            self.nodes.push(Node {
                parent: Some((id, edge_index)),
                ..Node::default()
            });
            self.nodes[id.0].edges.push(Edge::compile(key, child));
            self.attach(child, child_raw);
        }
    }

    pub(crate) fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub(crate) fn literal_child(&self, id: NodeId, segment: &str) -> Option<NodeId> {
        self.node(id)
            .edges
            .iter()
            .find(|edge| matches!(&edge.key, SegmentKey::Literal(value) if value == segment))
            .map(|edge| edge.child)
    }

    /// Entry that answers for a node: its own, or the one of its `index` child.
    pub(crate) fn terminal_entry(&self, id: NodeId) -> Option<&RouteEntry> {
        self.node(id).entry.as_ref().or_else(|| {
            self.literal_child(id, INDEX_SEGMENT)
                .and_then(|child| self.node(child).entry.as_ref())
        })
    }

    /// Edges from the root down to `id`.
    pub(crate) fn edges_to(&self, id: NodeId) -> Vec<&Edge> {
        let mut edges = Vec::new();
        let mut current = id;
        while let Some((parent, edge_index)) = self.node(current).parent {
            edges.push(&self.node(parent).edges[edge_index]);
            current = parent;
        }
        edges.reverse();
        edges
    }

    pub(crate) fn handler_targets(&self, handler: &str) -> Option<&[(NodeId, String)]> {
        self.handlers.get(handler).map(Vec::as_slice)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of (route, verb) registrations.
    pub fn route_count(&self) -> usize {
        self.nodes
            .iter()
            .filter_map(|node| node.entry.as_ref())
            .map(|entry| entry.methods.len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.route_count() == 0
    }

    pub fn contains_handler(&self, handler: &str) -> bool {
        self.handlers.contains_key(handler)
    }

    /// Handler ids, sorted.
    pub fn handlers(&self) -> Vec<&str> {
        let mut handlers: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        handlers.sort_unstable();
        handlers
    }

    /// Every registered verb in trie order.
    pub fn routes(&self) -> Vec<RouteListing> {
        let mut listings = Vec::new();
        for (index, node) in self.nodes.iter().enumerate() {
            let Some(entry) = &node.entry else { continue };
            let keys: Vec<SegmentKey> = self
                .edges_to(NodeId(index))
                .into_iter()
                .map(|edge| edge.key.clone())
                .collect();
            let pattern = render_pattern(&keys);
            for (verb, descriptor) in &entry.methods {
                listings.push(RouteListing {
                    pattern: pattern.clone(),
                    method: verb.clone(),
                    handler: descriptor.handler.clone(),
                });
            }
        }
        listings
    }
}
