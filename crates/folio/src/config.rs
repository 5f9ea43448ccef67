// File: src/config.rs
// Purpose: Configuration parsing from folio.toml

use anyhow::{Context, Result};
use folio_router::{CompileMode, ConflictPolicy, MiddlewareSpec, Position};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Default config file name, looked up in the project root.
pub const CONFIG_FILE: &str = "folio.toml";

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub project: ProjectConfig,

    #[serde(default)]
    pub routing: RoutingConfig,

    #[serde(default)]
    pub build: BuildConfig,

    #[serde(default)]
    pub dev: DevConfig,
}

/// Project metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default = "default_name")]
    pub name: String,

    #[serde(default = "default_version")]
    pub version: String,
}

/// Routing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingConfig {
    /// Directory containing page files (default: "pages")
    #[serde(default = "default_pages_dir")]
    pub pages_dir: String,

    /// Page file extension without the dot (default: "php")
    #[serde(default = "default_extension")]
    pub extension: String,

    /// Two pages for the same route and verb: "error" or "last-wins"
    #[serde(default)]
    pub on_conflict: ConflictPolicy,

    /// Reject malformed `[[` brackets instead of keeping them as text
    #[serde(default = "default_false")]
    pub strict_patterns: bool,

    /// Directory scoped middlewares
    #[serde(default)]
    pub middleware: Vec<MiddlewareRule>,
}

/// Attaches a middleware to every page under `prefix`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MiddlewareRule {
    /// Route path prefix, e.g. `admin` or `api/v1`. Empty matches every page.
    #[serde(default)]
    pub prefix: String,

    pub class: String,

    #[serde(default)]
    pub position: Position,

    #[serde(default)]
    pub params: BTreeMap<String, Value>,
}

/// Build configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    #[serde(default = "default_store_file")]
    pub store_file: String,
}

/// Development configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DevConfig {
    #[serde(default = "default_watch_paths")]
    pub watch_paths: Vec<String>,

    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

// Default values
fn default_name() -> String {
    "folio-app".to_string()
}

fn default_version() -> String {
    "0.1.0".to_string()
}

fn default_pages_dir() -> String {
    "pages".to_string()
}

fn default_extension() -> String {
    "php".to_string()
}

fn default_output_dir() -> String {
    ".folio".to_string()
}

fn default_store_file() -> String {
    "routes.json".to_string()
}

fn default_watch_paths() -> Vec<String> {
    vec!["pages".to_string()]
}

fn default_debounce_ms() -> u64 {
    200
}

fn default_false() -> bool {
    false
}

// Default implementations
impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            version: default_version(),
        }
    }
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            pages_dir: default_pages_dir(),
            extension: default_extension(),
            on_conflict: ConflictPolicy::default(),
            strict_patterns: false,
            middleware: Vec::new(),
        }
    }
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            store_file: default_store_file(),
        }
    }
}

impl Default for DevConfig {
    fn default() -> Self {
        Self {
            watch_paths: default_watch_paths(),
            debounce_ms: default_debounce_ms(),
        }
    }
}

impl RoutingConfig {
    pub fn compile_mode(&self) -> CompileMode {
        if self.strict_patterns {
            CompileMode::Strict
        } else {
            CompileMode::Loose
        }
    }
}

impl MiddlewareRule {
    /// Prefix as a route directory: no leading or trailing `/`.
    pub fn scope(&self) -> &str {
        self.prefix.trim_matches('/')
    }

    pub fn to_spec(&self) -> MiddlewareSpec {
        MiddlewareSpec {
            class: self.class.clone(),
            params: self.params.clone(),
            position: self.position,
        }
    }
}

impl BuildConfig {
    /// Store path below `root`.
    pub fn store_path(&self, root: &Path) -> PathBuf {
        root.join(&self.output_dir).join(&self.store_file)
    }
}

impl Config {
    /// Load configuration from folio.toml
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        // Missing file: defaults
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;

        Ok(config)
    }

    /// Load configuration from `<root>/folio.toml`
    pub fn load_from_root(root: impl AsRef<Path>) -> Result<Self> {
        Self::load(root.as_ref().join(CONFIG_FILE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.routing.pages_dir, "pages");
        assert_eq!(config.routing.extension, "php");
        assert_eq!(config.routing.on_conflict, ConflictPolicy::Error);
        assert_eq!(config.routing.compile_mode(), CompileMode::Loose);
        assert_eq!(config.build.store_path(Path::new("app")), Path::new("app/.folio/routes.json"));
        assert_eq!(config.dev.debounce_ms, 200);
    }

    #[test]
    fn test_empty_config() {
        let config = toml::from_str::<Config>("").unwrap_or_default();
        assert_eq!(config.routing.pages_dir, "pages");
        assert_eq!(config.build.output_dir, ".folio");
    }

    #[test]
    fn test_routing_section() {
        let toml = r#"
            [routing]
            pages_dir = "app/pages"
            extension = "page"
            on_conflict = "last-wins"
            strict_patterns = true

            [[routing.middleware]]
            prefix = "admin"
            class = "Auth"
            params = { role = "admin" }

            [[routing.middleware]]
            class = "Timing"
            position = "after"
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.routing.pages_dir, "app/pages");
        assert_eq!(config.routing.extension, "page");
        assert_eq!(config.routing.on_conflict, ConflictPolicy::LastWins);
        assert_eq!(config.routing.compile_mode(), CompileMode::Strict);

        let rules = &config.routing.middleware;
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].to_spec(), MiddlewareSpec::before("Auth").with_param("role", "admin"));
        assert_eq!(rules[1].position, Position::After);
        assert_eq!(rules[1].prefix, "");
    }

    #[test]
    fn test_middleware_scope_is_trimmed() {
        let rule = MiddlewareRule {
            prefix: "/admin/".to_string(),
            class: "Auth".to_string(),
            position: Position::Before,
            params: BTreeMap::new(),
        };
        assert_eq!(rule.scope(), "admin");
    }
}
