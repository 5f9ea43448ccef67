// Folio - file-based page framework
// Page discovery, route builds and the runtime route table

pub mod build;
pub mod config;
pub mod page_loader;
pub mod route_table;

// Re-export framework types
pub use build::{BuildReport, Project};
pub use config::{Config, MiddlewareRule};
pub use page_loader::{LoadedPages, PageLoader};
pub use route_table::{Dispatch, ResolvedRoute, RouteTable};

// Re-export the router
pub use folio_router;
pub use folio_router::{MatchOutcome, RouteParams, Trie, TrieStore};
