//! Error types for pattern compilation, trie building, reverse resolution and
//! the serialized store.
//!
//! Matching never fails with an error: `NotFound` and `MethodNotAllowed` are
//! ordinary [`MatchOutcome`](crate::MatchOutcome) variants.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Malformed bracket syntax in a single path segment.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    #[error("unterminated `[[` in segment `{segment}`")]
    Unterminated { segment: String },

    #[error("empty parameter name in segment `{segment}`")]
    EmptyName { segment: String },

    #[error("catch-all `[[...]]` must be the whole segment, found `{segment}`")]
    EmbeddedCatchAll { segment: String },

    #[error("`<` and `>` are reserved in route segments, found `{segment}`")]
    ReservedCharacter { segment: String },
}

/// A problem with one page while building the trie.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("{source_file}: {error}")]
    Pattern {
        source_file: String,
        #[source]
        error: PatternError,
    },

    #[error(
        "{source_file}: route `{pattern}` [{method}] is already registered by `{existing}`"
    )]
    RouteConflict {
        source_file: String,
        pattern: String,
        method: String,
        existing: String,
    },

    #[error("{source_file}: catch-all `{key}` must be the last segment of `{pattern}`")]
    CatchAllNotTerminal {
        source_file: String,
        pattern: String,
        key: String,
    },

    #[error("{source_file}: catch-all `{key}` collides with `{existing}` at the same level")]
    DuplicateCatchAll {
        source_file: String,
        key: String,
        existing: String,
    },
}

impl BuildError {
    /// File the error was reported for.
    pub fn source_file(&self) -> &str {
        match self {
            BuildError::Pattern { source_file, .. }
            | BuildError::RouteConflict { source_file, .. }
            | BuildError::CatchAllNotTerminal { source_file, .. }
            | BuildError::DuplicateCatchAll { source_file, .. } => source_file,
        }
    }
}

/// Every per-file error collected during a build run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct BuildErrors(pub Vec<BuildError>);

impl BuildErrors {
    pub fn errors(&self) -> &[BuildError] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for BuildErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} page(s) failed to build:", self.0.len())?;
        for error in &self.0 {
            writeln!(f, "  - {}", error)?;
        }
        Ok(())
    }
}

impl IntoIterator for BuildErrors {
    type Item = BuildError;
    type IntoIter = std::vec::IntoIter<BuildError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Reverse URL generation failures. These are caller errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("no route is registered for handler `{handler}`")]
    UnknownHandler { handler: String },

    #[error("handler `{handler}` has no route for method {method}")]
    MethodNotRegistered { handler: String, method: String },

    #[error("missing required route param `{name}` for handler `{handler}`")]
    MissingParam { handler: String, name: String },

    #[error("route param `{name}` must be a scalar value")]
    NonScalarParam { name: String },

    #[error("route param `{name}` value `{value}` does not match `{regex}`")]
    PatternMismatch {
        name: String,
        value: String,
        regex: String,
    },

    #[error("route param `{name}` has an invalid regex `{regex}`: {reason}")]
    InvalidRegex {
        name: String,
        regex: String,
        reason: String,
    },

    #[error("route param `{name}` value `{value}` may not contain `/` inside a single segment")]
    SlashInSegment { name: String, value: String },
}

/// Failures reading or writing the serialized trie.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("route store {path:?} does not exist")]
    Missing { path: PathBuf },

    #[error("failed to access route store {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("route store is not a valid trie document")]
    Malformed(#[from] serde_json::Error),
}
