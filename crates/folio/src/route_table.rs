// File: src/route_table.rs
// Purpose: Shared, hot-swappable routing trie for request handling

use anyhow::{Context, Result};
use folio_router::{
    execution_order, MatchOutcome, MiddlewareSpec, RouteParams, Trie, TrieStore,
};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Owned result of dispatching a request
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatch {
    Found(ResolvedRoute),
    NotFound,
    MethodNotAllowed { allowed: Vec<String> },
}

impl Dispatch {
    pub fn status_code(&self) -> u16 {
        match self {
            Dispatch::Found(_) => 200,
            Dispatch::NotFound => 404,
            Dispatch::MethodNotAllowed { .. } => 405,
        }
    }
}

/// A matched page with its middleware chain in execution order
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedRoute {
    pub handler: String,
    pub method: String,
    pub params: HashMap<String, String>,
    pub middlewares: Vec<MiddlewareSpec>,
}

/// Routing trie shared by request handlers
///
/// Readers take a snapshot (`Arc` clone) and never block each other.
/// [`reload`](Self::reload) swaps in a freshly loaded trie; requests already
/// holding a snapshot finish against the old one.
pub struct RouteTable {
    store: Option<TrieStore>,
    current: RwLock<Arc<Trie>>,
}

impl RouteTable {
    /// Loads the table from a store. A missing store is an error.
    pub fn open(store: TrieStore) -> Result<Self> {
        let trie = store
            .load()
            .with_context(|| format!("Failed to load route store: {:?}", store.path()))?;
        info!(path = %store.path().display(), routes = trie.route_count(), "route table loaded");
        Ok(Self {
            store: Some(store),
            current: RwLock::new(Arc::new(trie)),
        })
    }

    /// A table over an in-memory trie, without a backing store
    pub fn from_trie(trie: Trie) -> Self {
        Self {
            store: None,
            current: RwLock::new(Arc::new(trie)),
        }
    }

    /// Current trie
    pub fn snapshot(&self) -> Arc<Trie> {
        self.current.read().clone()
    }

    pub fn replace(&self, trie: Trie) {
        *self.current.write() = Arc::new(trie);
    }

    /// Re-reads the backing store. On failure the current trie stays in place.
    pub fn reload(&self) -> Result<usize> {
        let store = self
            .store
            .as_ref()
            .context("Route table has no backing store")?;
        let trie = store
            .load()
            .with_context(|| format!("Failed to reload route store: {:?}", store.path()))?;
        let routes = trie.route_count();
        self.replace(trie);
        info!(routes, "route table reloaded");
        Ok(routes)
    }

    pub fn dispatch(&self, path: &str, method: &str) -> Dispatch {
        let trie = self.snapshot();
        let dispatch = match trie.match_route(path, method) {
            MatchOutcome::Found(route) => Dispatch::Found(ResolvedRoute {
                handler: route.handler.to_string(),
                method: route.method.to_string(),
                params: route.params,
                middlewares: execution_order(route.middlewares)
                    .into_iter()
                    .cloned()
                    .collect(),
            }),
            MatchOutcome::NotFound => Dispatch::NotFound,
            MatchOutcome::MethodNotAllowed { allowed } => Dispatch::MethodNotAllowed {
                allowed: allowed.into_iter().map(str::to_string).collect(),
            },
        };
        debug!(path, method, status = dispatch.status_code(), "dispatched");
        dispatch
    }

    /// Reverse route for a handler
    pub fn url_for(&self, handler: &str, params: &RouteParams, method: Option<&str>) -> Result<String> {
        let url = self.snapshot().resolve(handler, params, method)?;
        Ok(url)
    }
}
