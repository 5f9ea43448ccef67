// File: src/page_loader.rs
// Purpose: Discovers page files under the pages directory and turns them into routes

use anyhow::{Context, Result};
use folio_router::route::verb::split_verb_suffix;
use folio_router::{BuildError, CompileMode, MiddlewareSpec, PathHierarchy, RouteDefinition};
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

use crate::config::{MiddlewareRule, RoutingConfig};

/// Routes compiled from the pages directory, plus the pages that failed.
#[derive(Debug, Default)]
pub struct LoadedPages {
    pub routes: Vec<RouteDefinition>,
    pub errors: Vec<BuildError>,
}

impl LoadedPages {
    pub fn page_count(&self) -> usize {
        self.routes.len() + self.errors.len()
    }
}

/// Walks the pages directory
#[derive(Debug, Clone)]
pub struct PageLoader {
    pages_dir: PathBuf,
    extension: String,
    mode: CompileMode,
    rules: Vec<MiddlewareRule>,
}

impl PageLoader {
    /// Loader with the default extension (`php`) and loose patterns
    pub fn new(pages_dir: impl Into<PathBuf>) -> Self {
        Self::from_config(pages_dir, &RoutingConfig::default())
    }

    pub fn from_config(pages_dir: impl Into<PathBuf>, routing: &RoutingConfig) -> Self {
        Self {
            pages_dir: pages_dir.into(),
            extension: routing.extension.trim_start_matches('.').to_string(),
            mode: routing.compile_mode(),
            rules: routing.middleware.clone(),
        }
    }

    pub fn pages_dir(&self) -> &Path {
        &self.pages_dir
    }

    /// Page files in sorted order. A missing directory has no pages.
    pub fn discover(&self) -> Result<Vec<PathBuf>> {
        if !self.pages_dir.exists() {
            return Ok(Vec::new());
        }

        let mut pages = Vec::new();
        for entry in WalkDir::new(&self.pages_dir).sort_by_file_name() {
            let entry = entry
                .with_context(|| format!("Failed to read pages directory: {:?}", self.pages_dir))?;
            if entry.file_type().is_file() && self.is_page(entry.path()) {
                pages.push(entry.into_path());
            }
        }
        Ok(pages)
    }

    /// Compiles every discovered page. Pattern errors are collected per file.
    pub fn load_all(&self) -> Result<LoadedPages> {
        let mut loaded = LoadedPages::default();
        for path in self.discover()? {
            match self.load_page(&path) {
                Ok(route) => loaded.routes.push(route),
                Err(err) => loaded.errors.push(err),
            }
        }
        Ok(loaded)
    }

    /// Compiles one page file
    pub fn load_page(&self, path: &Path) -> Result<RouteDefinition, BuildError> {
        let source = path.display().to_string();
        let relative = path.strip_prefix(&self.pages_dir).unwrap_or(path);
        let relative = relative.to_string_lossy().replace('\\', "/");

        let route = RouteDefinition::from_path(&relative, "", &self.extension, self.mode)
            .map_err(|error| BuildError::Pattern {
                source_file: source.clone(),
                error,
            })?;

        let (route_path, _) = split_verb_suffix(&route.handler);
        let middlewares = self.middlewares_for(route_path);
        debug!(page = %source, handler = %route.handler, middlewares = middlewares.len(), "page loaded");

        Ok(route.with_middlewares(middlewares).with_source(source))
    }

    /// Directory rules for a route path, outermost directory first, then rule order.
    pub fn middlewares_for(&self, route_path: &str) -> Vec<MiddlewareSpec> {
        let absolute = format!("/{}", route_path.trim_matches('/'));
        let mut scopes: Vec<&str> = PathHierarchy::new(&absolute).collect();
        scopes.reverse();

        scopes
            .into_iter()
            .flat_map(|scope| {
                let scope = scope.trim_start_matches('/');
                self.rules.iter().filter(move |rule| rule.scope() == scope)
            })
            .map(MiddlewareRule::to_spec)
            .collect()
    }

    fn is_page(&self, path: &Path) -> bool {
        path.extension().and_then(|ext| ext.to_str()) == Some(self.extension.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_router::Position;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;
    use std::fs;
    use tempfile::TempDir;

    fn touch(root: &Path, relative: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "<?php").unwrap();
    }

    fn rule(prefix: &str, class: &str) -> MiddlewareRule {
        MiddlewareRule {
            prefix: prefix.to_string(),
            class: class.to_string(),
            position: Position::Before,
            params: BTreeMap::new(),
        }
    }

    #[test]
    fn test_discover_is_sorted_and_filters_extension() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "users/[[d:id]].php");
        touch(dir.path(), "about.php");
        touch(dir.path(), "index.php");
        touch(dir.path(), "notes.txt");

        let loader = PageLoader::new(dir.path());
        let pages: Vec<String> = loader
            .discover()
            .unwrap()
            .iter()
            .map(|p| p.strip_prefix(dir.path()).unwrap().to_string_lossy().replace('\\', "/"))
            .collect();
        assert_eq!(pages, vec!["about.php", "index.php", "users/[[d:id]].php"]);
    }

    #[test]
    fn test_missing_pages_dir_is_empty() {
        let loader = PageLoader::new("/definitely/not/here");
        assert!(loader.discover().unwrap().is_empty());
    }

    #[test]
    fn test_load_page_uses_relative_handler() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "users/[[d:id]].get.php");

        let loader = PageLoader::new(dir.path());
        let route = loader.load_page(&dir.path().join("users/[[d:id]].get.php")).unwrap();
        assert_eq!(route.handler, "users/[[d:id]].get");
        assert_eq!(route.methods, vec!["GET"]);
        assert_eq!(route.pattern(), "/users/<id:[0-9]+>");
        assert!(route.source.ends_with(".get.php"));
    }

    #[test]
    fn test_middleware_rules_by_directory() {
        let routing = RoutingConfig {
            middleware: vec![rule("admin/users", "Audit"), rule("admin", "Auth"), rule("", "Session")],
            ..RoutingConfig::default()
        };
        let loader = PageLoader::from_config("pages", &routing);

        let classes = |path: &str| -> Vec<String> {
            loader.middlewares_for(path).into_iter().map(|m| m.class).collect()
        };
        assert_eq!(classes("admin/users/[[d:id]]"), vec!["Session", "Auth", "Audit"]);
        assert_eq!(classes("admin/index"), vec!["Session", "Auth"]);
        assert_eq!(classes("administrators"), vec!["Session"]);
    }

    #[test]
    fn test_strict_patterns_collect_errors() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "ok.php");
        touch(dir.path(), "bad-[[d:id.php");

        let routing = RoutingConfig {
            strict_patterns: true,
            ..RoutingConfig::default()
        };
        let loaded = PageLoader::from_config(dir.path(), &routing).load_all().unwrap();
        assert_eq!(loaded.routes.len(), 1);
        assert_eq!(loaded.errors.len(), 1);
        assert_eq!(loaded.page_count(), 2);
        assert!(loaded.errors[0].source_file().ends_with("bad-[[d:id.php"));
    }
}
