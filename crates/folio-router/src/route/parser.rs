/// Page file path → route definition
///
/// `pages/users/[[d:id]].get.php` becomes the key list
/// `users / <id:[0-9]+> / index` registered for `GET`, served by the handler
/// `users/[[d:id]].get`.
use crate::error::PatternError;
use crate::middleware::MiddlewareSpec;

use super::pattern::{compile_segment, CompileMode, SegmentKey};
use super::verb::{normalize_method, split_verb_suffix, ANY_METHOD};

/// Everything the trie builder needs to register one page.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteDefinition {
    /// Opaque id of the compiled page.
    pub handler: String,
    /// Compiled segments, ending with the synthetic `index` key.
    pub keys: Vec<SegmentKey>,
    /// Upper-case verbs, or `["*"]`.
    pub methods: Vec<String>,
    pub middlewares: Vec<MiddlewareSpec>,
    /// Where the definition came from (used in build errors).
    pub source: String,
}

impl RouteDefinition {
    /// Creates a route from a page file path
    ///
    /// The pages root and the extension are stripped, then an optional verb
    /// suffix. The handler id is the relative path without the extension.
    ///
    /// # Examples
    ///
    /// ```
    /// use folio_router::route::parser::RouteDefinition;
    /// use folio_router::route::pattern::CompileMode;
    ///
    /// let route = RouteDefinition::from_path(
    ///     "pages/users/[[d:id]].get.php",
    ///     "pages",
    ///     "php",
    ///     CompileMode::Loose,
    /// )
    /// .unwrap();
    /// assert_eq!(route.handler, "users/[[d:id]].get");
    /// assert_eq!(route.pattern(), "/users/<id:[0-9]+>");
    /// assert_eq!(route.methods, vec!["GET"]);
    /// ```
    pub fn from_path(
        file_path: &str,
        pages_dir: &str,
        extension: &str,
        mode: CompileMode,
    ) -> Result<Self, PatternError> {
        let file_path = file_path.replace('\\', "/");
        let pages_dir = pages_dir.replace('\\', "/");
        let relative = file_path
            .strip_prefix(pages_dir.trim_end_matches('/'))
            .unwrap_or(&file_path)
            .trim_start_matches('/');

        let extension = extension.trim_start_matches('.');
        let without_ext = if extension.is_empty() {
            relative
        } else {
            relative
                .strip_suffix(extension)
                .and_then(|s| s.strip_suffix('.'))
                .unwrap_or(relative)
        };

        let (route_path, verbs) = split_verb_suffix(without_ext);
        let methods = verbs.unwrap_or_else(|| vec![ANY_METHOD.to_string()]);

        Ok(Self {
            handler: without_ext.to_string(),
            keys: compile_route_path(route_path, mode)?,
            methods,
            middlewares: Vec::new(),
            source: file_path.to_string(),
        })
    }

    /// Creates a route from an already stripped route path (`blog/[[s:slug]]`).
    pub fn new(
        handler: impl Into<String>,
        route_path: &str,
        mode: CompileMode,
    ) -> Result<Self, PatternError> {
        let handler = handler.into();
        Ok(Self {
            keys: compile_route_path(route_path, mode)?,
            methods: vec![ANY_METHOD.to_string()],
            middlewares: Vec::new(),
            source: handler.clone(),
            handler,
        })
    }

    /// Replaces the verbs, e.g. from a method declaration on the page.
    pub fn with_methods<I, S>(mut self, methods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut verbs: Vec<String> = Vec::new();
        for method in methods {
            let verb = normalize_method(method.as_ref());
            if !verbs.contains(&verb) {
                verbs.push(verb);
            }
        }
        if verbs.is_empty() {
            verbs.push(ANY_METHOD.to_string());
        }
        self.methods = verbs;
        self
    }

    pub fn with_middleware(mut self, middleware: MiddlewareSpec) -> Self {
        self.middlewares.push(middleware);
        self
    }

    pub fn with_middlewares<I>(mut self, middlewares: I) -> Self
    where
        I: IntoIterator<Item = MiddlewareSpec>,
    {
        self.middlewares.extend(middlewares);
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    /// Human readable pattern without the synthetic `index` (`/` for root).
    pub fn pattern(&self) -> String {
        render_pattern(&self.keys)
    }
}

/// Splits a route path on `/`, compiles every segment and appends `index`.
pub fn compile_route_path(route_path: &str, mode: CompileMode) -> Result<Vec<SegmentKey>, PatternError> {
    let mut keys = route_path
        .split('/')
        .filter(|segment| !segment.is_empty())
        .map(|segment| compile_segment(segment, mode))
        .collect::<Result<Vec<_>, _>>()?;
    keys.push(SegmentKey::index());
    Ok(keys)
}

/// `/`-joined string form of a key list, dropping the trailing synthetic `index`.
pub fn render_pattern(keys: &[SegmentKey]) -> String {
    let visible = match keys.split_last() {
        Some((last, rest)) if last.is_index() => rest,
        _ => keys,
    };
    if visible.is_empty() {
        return "/".to_string();
    }
    visible
        .iter()
        .map(|key| format!("/{}", key))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn page(path: &str) -> RouteDefinition {
        RouteDefinition::from_path(path, "pages", "php", CompileMode::Loose).unwrap()
    }

    #[test]
    fn test_static_page() {
        let route = page("pages/about.php");
        assert_eq!(route.handler, "about");
        assert_eq!(
            route.keys,
            vec![SegmentKey::literal("about"), SegmentKey::index()]
        );
        assert_eq!(route.methods, vec!["*"]);
        assert_eq!(route.pattern(), "/about");
    }

    #[test]
    fn test_index_pages_get_an_extra_index() {
        let route = page("pages/blogs/index.php");
        assert_eq!(
            route.keys,
            vec![
                SegmentKey::literal("blogs"),
                SegmentKey::index(),
                SegmentKey::index()
            ]
        );
        assert_eq!(route.pattern(), "/blogs/index");

        let root = page("pages/index.php");
        assert_eq!(root.keys, vec![SegmentKey::index(), SegmentKey::index()]);
    }

    #[test]
    fn test_verb_alternatives() {
        let route = page("pages/contact.get|post.php");
        assert_eq!(route.handler, "contact.get|post");
        assert_eq!(route.methods, vec!["GET", "POST"]);
        assert_eq!(route.pattern(), "/contact");
    }

    #[test]
    fn test_explicit_methods_override_suffix() {
        let route = page("pages/contact.get.php").with_methods(["put", "PUT", "patch"]);
        assert_eq!(route.methods, vec!["PUT", "PATCH"]);
    }

    #[test]
    fn test_windows_separators() {
        let route =
            RouteDefinition::from_path("pages\\users\\[[d:id]].php", "pages", "php", CompileMode::Loose)
                .unwrap();
        assert_eq!(route.handler, "users/[[d:id]]");
        assert_eq!(route.pattern(), "/users/<id:[0-9]+>");
    }

    #[test]
    fn test_pattern_error_propagates() {
        let err = RouteDefinition::from_path(
            "pages/[[d:id",
            "pages",
            "php",
            CompileMode::Strict,
        )
        .unwrap_err();
        assert!(matches!(err, PatternError::Unterminated { .. }));
    }

    #[test]
    fn test_render_root() {
        assert_eq!(render_pattern(&[SegmentKey::index()]), "/");
    }
}
