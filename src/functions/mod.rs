//! Function catalog for expression completions.
//!
//! Functions arrive as a JSON list feed fetched once per session by the
//! caller. Matching is a plain prefix filter over canonical signatures; the
//! engine never evaluates anything.

use serde::Deserialize;

use crate::errors::{TempletError, TempletResult};

/// One completable function from the catalog
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Function {
    pub name: String,
    /// Canonical call form, e.g. `SUM(values)`
    pub signature: String,
    pub summary: String,
    #[serde(default)]
    pub detail: Option<String>,
    #[serde(default)]
    pub examples: Vec<String>,
}

/// Parse the collaborator's JSON function feed
pub fn load_functions(json: &str) -> TempletResult<Vec<Function>> {
    serde_json::from_str(json).map_err(|e| TempletError::function_feed(json, &e))
}

/// Filter the catalog by signature prefix.
///
/// An empty query returns the full catalog unchanged; otherwise only
/// functions whose signature starts with `query` (case-sensitive) match.
pub fn match_signatures<'a>(functions: &'a [Function], query: &str) -> Vec<&'a Function> {
    if query.is_empty() {
        return functions.iter().collect();
    }
    functions
        .iter()
        .filter(|f| f.signature.starts_with(query))
        .collect()
}

/// Look up a function by name, case-insensitively.
///
/// Used for the persistent "current function" display while the caret sits
/// inside a call's argument list, where the typed name may not match the
/// catalog's casing.
pub fn find_function<'a>(functions: &'a [Function], name: &str) -> Option<&'a Function> {
    functions.iter().find(|f| f.name.eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn catalog() -> Vec<Function> {
        load_functions(
            r#"[
                {"name": "SUM", "signature": "SUM(values)", "summary": "Adds up the values"},
                {"name": "SUBSTITUTE", "signature": "SUBSTITUTE(text, old, new)",
                 "summary": "Substitutes old for new in text"},
                {"name": "MAX", "signature": "MAX(values)", "summary": "Largest of the values",
                 "detail": "Ignores non-numeric values", "examples": ["MAX(1, 2, 3) = 3"]}
            ]"#,
        )
        .unwrap()
    }

    #[test]
    fn test_empty_query_returns_full_catalog() {
        let functions = catalog();
        assert_eq!(match_signatures(&functions, "").len(), 3);
    }

    #[test]
    fn test_prefix_filter() {
        let functions = catalog();
        let matched = match_signatures(&functions, "SU");
        let names: Vec<&str> = matched.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["SUM", "SUBSTITUTE"]);
    }

    #[test]
    fn test_prefix_filter_is_case_sensitive() {
        let functions = catalog();
        assert!(match_signatures(&functions, "su").is_empty());
    }

    #[test]
    fn test_find_function_ignores_case() {
        let functions = catalog();
        assert_eq!(find_function(&functions, "sum").map(|f| f.name.as_str()), Some("SUM"));
        assert_eq!(find_function(&functions, "NOPE"), None);
    }

    #[test]
    fn test_malformed_feed_is_an_error() {
        let err = load_functions("[{\"name\": }]").unwrap_err();
        assert!(matches!(
            err,
            crate::errors::TempletError::MalformedFunctionFeed { .. }
        ));
    }

    #[test]
    fn test_optional_fields_default() {
        let functions = catalog();
        let sum = find_function(&functions, "SUM").unwrap();
        assert_eq!(sum.detail, None);
        assert!(sum.examples.is_empty());
    }
}
