//! Structured query combinators for the search backend.
//!
//! Kept deliberately thin: each builder returns the JSON fragment the
//! backend expects under its `query` key, and services compose them.

use serde_json::{Value, json};

pub fn match_all() -> Value {
    json!({ "match_all": {} })
}

/// Full-text match on a single field.
pub fn field_match(field: &str, text: &str) -> Value {
    json!({ "match": { field: text } })
}

/// Term query on `{path}.{field}` traversing the embedded object array at
/// `path` while preserving per-element boundaries.
pub fn nested_term(path: &str, field: &str, value: &str) -> Value {
    json!({
        "nested": {
            "path": path,
            "query": { "term": { (format!("{path}.{field}")): value } }
        }
    })
}

/// Boolean OR over the given clauses.
pub fn should(clauses: Vec<Value>) -> Value {
    json!({ "bool": { "should": clauses } })
}

/// Fuzzy multi-field match; fields may carry `^boost` suffixes.
pub fn multi_match(text: &str, fields: &[&str]) -> Value {
    json!({
        "multi_match": {
            "query": text,
            "fields": fields,
            "fuzziness": "AUTO",
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_term_targets_the_scoped_field() {
        let query = nested_term("genres", "id", "deadbeef");
        assert_eq!(query["nested"]["path"], "genres");
        assert_eq!(query["nested"]["query"]["term"]["genres.id"], "deadbeef");
    }

    #[test]
    fn should_wraps_clauses_in_bool() {
        let query = should(vec![match_all(), match_all()]);
        assert_eq!(query["bool"]["should"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn multi_match_carries_fuzziness_and_boosts() {
        let query = multi_match("star", &["title^3", "description"]);
        assert_eq!(query["multi_match"]["query"], "star");
        assert_eq!(query["multi_match"]["fuzziness"], "AUTO");
        assert_eq!(query["multi_match"]["fields"][0], "title^3");
    }
}
