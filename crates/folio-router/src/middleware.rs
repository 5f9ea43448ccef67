//! Middleware descriptors attached to route handlers.
//!
//! The router only records middlewares and their order; executing the chain
//! is the host application's job.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Where a middleware runs relative to the page handler.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    #[default]
    Before,
    After,
}

/// A middleware class plus its constructor parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MiddlewareSpec {
    pub class: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub params: BTreeMap<String, Value>,
    #[serde(default)]
    pub position: Position,
}

impl MiddlewareSpec {
    pub fn before(class: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            params: BTreeMap::new(),
            position: Position::Before,
        }
    }

    pub fn after(class: impl Into<String>) -> Self {
        Self {
            position: Position::After,
            ..Self::before(class)
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }
}

/// Wrapping order of a middleware list, outermost first.
///
/// `Before` middlewares keep registration order (first registered is the
/// outermost wrapper). `After` middlewares follow in reverse, so the first
/// registered one sits closest to the handler and runs first once it returns.
///
/// # Examples
///
/// ```
/// use folio_router::middleware::{execution_order, MiddlewareSpec};
///
/// let chain = vec![
///     MiddlewareSpec::after("Log"),
///     MiddlewareSpec::before("Auth"),
///     MiddlewareSpec::after("Compress"),
///     MiddlewareSpec::before("Csrf"),
/// ];
/// let order: Vec<&str> = execution_order(&chain).iter().map(|m| m.class.as_str()).collect();
/// assert_eq!(order, vec!["Auth", "Csrf", "Compress", "Log"]);
/// ```
pub fn execution_order(middlewares: &[MiddlewareSpec]) -> Vec<&MiddlewareSpec> {
    let before = middlewares
        .iter()
        .filter(|m| m.position == Position::Before);
    let after = middlewares
        .iter()
        .rev()
        .filter(|m| m.position == Position::After);
    before.chain(after).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_position_defaults_to_before() {
        let spec: MiddlewareSpec = serde_json::from_value(json!({ "class": "Auth" })).unwrap();
        assert_eq!(spec.position, Position::Before);
        assert!(spec.params.is_empty());
    }

    #[test]
    fn test_serialized_shape() {
        let spec = MiddlewareSpec::after("Cache").with_param("ttl", 60);
        assert_eq!(
            serde_json::to_value(&spec).unwrap(),
            json!({ "class": "Cache", "params": { "ttl": 60 }, "position": "after" })
        );
    }

    #[test]
    fn test_nested_params() {
        let spec = MiddlewareSpec::before("RateLimit")
            .with_param("limits", json!({ "minute": 60, "burst": { "size": 5 } }));
        assert_eq!(spec.params["limits"]["burst"]["size"], json!(5));
    }

    #[test]
    fn test_execution_order_only_before() {
        let chain = vec![MiddlewareSpec::before("A"), MiddlewareSpec::before("B")];
        let order: Vec<_> = execution_order(&chain).into_iter().map(|m| &m.class).collect();
        assert_eq!(order, vec!["A", "B"]);
    }

    #[test]
    fn test_execution_order_only_after() {
        let chain = vec![MiddlewareSpec::after("A"), MiddlewareSpec::after("B")];
        let order: Vec<_> = execution_order(&chain).into_iter().map(|m| &m.class).collect();
        assert_eq!(order, vec!["B", "A"]);
    }
}
