// File: src/build.rs
// Purpose: pages directory → route trie → serialized store

use anyhow::{Context, Result};
use folio_router::{Trie, TrieBuilder, TrieStore};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::config::Config;
use crate::page_loader::PageLoader;

/// Summary of a successful build
#[derive(Debug, Clone, PartialEq)]
pub struct BuildReport {
    pub pages: usize,
    pub routes: usize,
    pub store_path: PathBuf,
    pub elapsed: Duration,
}

/// A project on disk: its root directory and configuration
#[derive(Debug, Clone)]
pub struct Project {
    root: PathBuf,
    config: Config,
}

impl Project {
    pub fn new(root: impl Into<PathBuf>, config: Config) -> Self {
        Self {
            root: root.into(),
            config,
        }
    }

    /// Opens a project, reading `folio.toml` when present
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let config = Config::load_from_root(&root)?;
        Ok(Self::new(root, config))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn pages_dir(&self) -> PathBuf {
        self.root.join(&self.config.routing.pages_dir)
    }

    pub fn store(&self) -> TrieStore {
        TrieStore::new(self.config.build.store_path(&self.root))
    }

    pub fn loader(&self) -> PageLoader {
        PageLoader::from_config(self.pages_dir(), &self.config.routing)
    }

    /// Discovers and compiles every page.
    ///
    /// Failing pages are all reported together: the error is a
    /// [`BuildErrors`](folio_router::BuildErrors) that callers may downcast.
    pub fn compile(&self) -> Result<(Trie, usize)> {
        let loaded = self.loader().load_all()?;
        let pages = loaded.page_count();

        let mut builder = TrieBuilder::new().with_conflict_policy(self.config.routing.on_conflict);
        for error in loaded.errors {
            builder.push_error(error);
        }
        for route in loaded.routes {
            builder.add(route);
        }

        let trie = builder.finish()?;
        Ok((trie, pages))
    }

    /// Compiles the pages and replaces the store. Nothing is written when a page fails.
    pub fn build(&self) -> Result<BuildReport> {
        let started = Instant::now();
        let (trie, pages) = match self.compile() {
            Ok(compiled) => compiled,
            Err(err) => {
                warn!(root = %self.root.display(), "build failed, route store left unchanged");
                return Err(err);
            }
        };

        let store = self.store();
        store
            .save(&trie)
            .with_context(|| format!("Failed to write route store: {:?}", store.path()))?;

        let report = BuildReport {
            pages,
            routes: trie.route_count(),
            store_path: store.path().to_path_buf(),
            elapsed: started.elapsed(),
        };
        info!(
            pages = report.pages,
            routes = report.routes,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "routes built"
        );
        Ok(report)
    }
}
