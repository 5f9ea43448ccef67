/// HTTP verb suffixes in page file names (`users.get.php`, `users.post|put.php`)

/// Method key that matches any verb without its own entry.
pub const ANY_METHOD: &str = "*";

/// Verbs accepted as a file-name suffix.
pub const KNOWN_METHODS: [&str; 9] = [
    "GET", "HEAD", "POST", "PUT", "PATCH", "DELETE", "OPTIONS", "CONNECT", "TRACE",
];

/// Upper-cases a verb and maps anything empty to [`ANY_METHOD`].
pub fn normalize_method(method: &str) -> String {
    let method = method.trim();
    if method.is_empty() {
        ANY_METHOD.to_string()
    } else {
        method.to_ascii_uppercase()
    }
}

fn is_known_method(candidate: &str) -> bool {
    KNOWN_METHODS
        .iter()
        .any(|known| known.eq_ignore_ascii_case(candidate))
}

/// Splits a trailing `.VERB` or `.VERB|VERB` off a file stem.
///
/// Returns the remaining stem and the verbs (upper-case, duplicates removed).
/// A suffix that is not made only of known verbs is part of the name.
///
/// # Examples
///
/// ```
/// use folio_router::route::verb::split_verb_suffix;
///
/// assert_eq!(split_verb_suffix("users.get"), ("users", Some(vec!["GET".to_string()])));
/// assert_eq!(
///     split_verb_suffix("users.post|put"),
///     ("users", Some(vec!["POST".to_string(), "PUT".to_string()]))
/// );
/// assert_eq!(split_verb_suffix("v1.2"), ("v1.2", None));
/// ```
pub fn split_verb_suffix(stem: &str) -> (&str, Option<Vec<String>>) {
    let Some((name, suffix)) = stem.rsplit_once('.') else {
        return (stem, None);
    };
    if name.is_empty() || name.ends_with('/') {
        return (stem, None);
    }

    let candidates: Vec<&str> = suffix.split('|').collect();
    if !candidates.iter().all(|c| is_known_method(c)) {
        return (stem, None);
    }

    let mut verbs: Vec<String> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let verb = candidate.to_ascii_uppercase();
        if !verbs.contains(&verb) {
            verbs.push(verb);
        }
    }
    (name, Some(verbs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_suffix() {
        assert_eq!(split_verb_suffix("users"), ("users", None));
    }

    #[test]
    fn test_case_insensitive_suffix() {
        assert_eq!(
            split_verb_suffix("login.POST"),
            ("login", Some(vec!["POST".to_string()]))
        );
    }

    #[test]
    fn test_duplicate_verbs_collapse() {
        assert_eq!(
            split_verb_suffix("form.get|GET|post"),
            ("form", Some(vec!["GET".to_string(), "POST".to_string()]))
        );
    }

    #[test]
    fn test_partial_verb_list_is_a_name() {
        assert_eq!(split_verb_suffix("a.get|fetch"), ("a.get|fetch", None));
        assert_eq!(split_verb_suffix("docs/.get"), ("docs/.get", None));
    }

    #[test]
    fn test_verb_in_directory_is_not_a_suffix() {
        assert_eq!(split_verb_suffix("users/[[d:id]].delete"), (
            "users/[[d:id]]",
            Some(vec!["DELETE".to_string()])
        ));
    }

    #[test]
    fn test_normalize_method() {
        assert_eq!(normalize_method("get"), "GET");
        assert_eq!(normalize_method(""), ANY_METHOD);
    }
}
