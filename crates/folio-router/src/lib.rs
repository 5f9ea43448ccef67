//! # Folio Router
//!
//! File-path based routing for Folio pages:
//! - Static pages (`pages/about.php` → `/about`)
//! - Index pages (`pages/blogs/index.php` → `/blogs`)
//! - Typed captures (`pages/users/[[d:id]].php` → `/users/42`)
//! - Composite segments (`pages/blog-[[s:slug]].php` → `/blog-hello`)
//! - Catch-all routes (`pages/files/[[...path]].php` → `/files/a/b`)
//! - Verb suffixes (`pages/contact.post.php`)
//!
//! ## Layout
//!
//! - [`route`]: file path grammar → [`RouteDefinition`]
//! - [`trie`]: [`TrieBuilder`] → immutable [`Trie`], matching
//! - [`resolve`]: handler + params → URL
//! - [`store`]: the trie as a JSON document on disk
//!
//! ## Matching
//!
//! Literal edges beat dynamic edges, which beat the catch-all. Dynamic edges
//! are tried in key order and the walk never backtracks. A path that reaches a node without routes is
//! `NotFound`; one that reaches a route without the request verb is
//! `MethodNotAllowed`.
//!
//! ## Example
//!
//! ```
//! use folio_router::{CompileMode, RouteDefinition, TrieBuilder};
//!
//! let mut builder = TrieBuilder::new();
//! builder.add(RouteDefinition::from_path("pages/about.php", "pages", "php", CompileMode::Loose).unwrap());
//! builder.add(RouteDefinition::from_path("pages/users/[[d:id]].php", "pages", "php", CompileMode::Loose).unwrap());
//! let trie = builder.finish().unwrap();
//!
//! let route = trie.match_route("/users/123", "GET").found().unwrap();
//! assert_eq!(route.params.get("id"), Some(&"123".to_string()));
//!
//! assert_eq!(trie.url_for_params("users/[[d:id]]", &[("id", "7")]).unwrap(), "/users/7");
//! ```

// ============================================================================
// Module Declarations
// ============================================================================

pub mod error;
pub mod middleware;
pub mod path;
pub mod resolve;
pub mod route;
pub mod store;
pub mod trie;

pub use error::{BuildError, BuildErrors, PatternError, ResolveError, StoreError};
pub use middleware::{execution_order, MiddlewareSpec, Position};
pub use path::{is_valid_path, normalize_path, split_segments, PathHierarchy};
pub use resolve::{build_query, RouteParams};
pub use route::{
    compile_segment, CompileMode, PatternPart, RouteDefinition, SegmentKey, SegmentPattern,
};
pub use store::TrieStore;
pub use trie::{
    ConflictPolicy, HandlerDescriptor, MatchOutcome, NodeId, RouteEntry, RouteListing, RouteMatch,
    Trie, TrieBuilder,
};
