//! Integration tests for the serialized trie store

use folio_router::*;
use pretty_assertions::assert_eq;
use serde_json::json;
use tempfile::TempDir;

fn sample_trie() -> Trie {
    let mut builder = TrieBuilder::new();
    for page in [
        "pages/index.php",
        "pages/about.php",
        "pages/users/[[d:id]].get.php",
        "pages/users/[[d:id]].post.php",
        "pages/blog-[[s:slug]]-post.php",
        "pages/files/[[...path]].php",
    ] {
        builder.add(RouteDefinition::from_path(page, "pages", "php", CompileMode::Loose).unwrap());
    }
    builder.add(
        RouteDefinition::new("admin", "admin", CompileMode::Loose)
            .unwrap()
            .with_middleware(MiddlewareSpec::before("Auth").with_param("role", "admin")),
    );
    builder.finish().unwrap()
}

#[test]
fn test_save_then_load_preserves_behavior() {
    let dir = TempDir::new().unwrap();
    let store = TrieStore::new(dir.path().join(".folio/routes.json"));
    let trie = sample_trie();

    store.save(&trie).unwrap();
    assert!(store.exists());
    let loaded = store.load().unwrap();

    assert_eq!(loaded.routes(), trie.routes());
    for (path, method) in [
        ("/", "GET"),
        ("/about", "GET"),
        ("/users/7", "GET"),
        ("/users/7", "POST"),
        ("/users/7", "DELETE"),
        ("/users/x", "GET"),
        ("/blog-hi-post", "GET"),
        ("/files/a/b", "GET"),
        ("/admin", "GET"),
    ] {
        assert_eq!(loaded.match_route(path, method), trie.match_route(path, method), "{method} {path}");
    }
}

#[test]
fn test_save_leaves_no_temp_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("routes.json");
    TrieStore::new(&path).save(&sample_trie()).unwrap();

    let names: Vec<String> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["routes.json"]);
}

#[test]
fn test_save_replaces_existing_document() {
    let dir = TempDir::new().unwrap();
    let store = TrieStore::new(dir.path().join("routes.json"));
    store.save(&sample_trie()).unwrap();
    store.save(&Trie::default()).unwrap();

    assert!(store.load().unwrap().is_empty());
}

#[test]
fn test_serialized_keys_are_sorted() {
    let json = store::to_json(&sample_trie()).unwrap();
    let document: serde_json::Value = serde_json::from_str(&json).unwrap();
    let keys: Vec<&String> = document.as_object().unwrap().keys().collect();
    assert_eq!(keys, vec!["admin", "blog-<slug:[a-zA-Z0-9-]+>-post", "files", "index", "users"]);

    let admin = &document["admin"]["_children"]["index"]["methods"]["*"];
    assert_eq!(
        admin,
        &json!({
            "class": "admin",
            "middlewares": [{ "class": "Auth", "params": { "role": "admin" }, "position": "before" }]
        })
    );
}

#[test]
fn test_missing_store_is_an_error() {
    let dir = TempDir::new().unwrap();
    let store = TrieStore::new(dir.path().join("nope.json"));
    assert!(!store.exists());
    assert!(matches!(store.load(), Err(StoreError::Missing { .. })));
}

#[test]
fn test_malformed_store_is_an_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("routes.json");
    std::fs::write(&path, "{ not json").unwrap();
    assert!(matches!(TrieStore::new(&path).load(), Err(StoreError::Malformed(_))));
}

#[test]
fn test_loaded_dot_star_key_is_a_catch_all() {
    let trie = store::from_json(
        r#"{ "docs": { "_children": { "<rest:.*>": { "_children": {
            "index": { "methods": { "GET": { "class": "docs" } } } } } } } }"#,
    )
    .unwrap();

    assert_eq!(trie.match_route("/docs", "GET").found().unwrap().param("rest"), Some(""));
    assert_eq!(trie.match_route("/docs/a/b", "GET").found().unwrap().param("rest"), Some("a/b"));
}

#[test]
fn test_invalid_regex_never_matches_and_fails_resolution() {
    let trie = store::from_json(
        r#"{ "u": { "_children": {
            "<id:[z-a]+>": { "_children": { "index": { "methods": { "*": { "class": "broken" } } } } },
            "<name:[a-z]+>": { "_children": { "index": { "methods": { "*": { "class": "named" } } } } }
        } } }"#,
    )
    .unwrap();

    assert_eq!(trie.match_route("/u/abc", "GET").found().unwrap().handler, "named");
    assert_eq!(trie.match_route("/u/123", "GET"), MatchOutcome::NotFound);

    let err = trie.url_for_params("broken", &[("id", "1")]).unwrap_err();
    assert!(matches!(err, ResolveError::InvalidRegex { .. }));
}
