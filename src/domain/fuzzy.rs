//! Search-token derivation.
//!
//! Every entry carries one lowercase token concatenating its searchable
//! fields; the query filter matches by plain substring search against it.
//! Pure and deterministic: the same record and vocabulary always produce the
//! same token, so repeated loads are reproducible.

use crate::domain::entries::Entry;

/// Build the fuzzy-search token for an entry.
///
/// Concatenates, lowercased and space-separated: name, description, resource
/// type, tags, every string-valued record field (key and value), the social
/// handle, and every vocabulary term that matches one of the record's field
/// keys or tags. Computed once at load time; never re-derived from
/// enrichment data.
pub fn tokenize(entry: &Entry, vocabulary: &[String]) -> String {
    let mut parts: Vec<String> = Vec::new();

    parts.push(entry.name.clone());
    if let Some(description) = entry.description.as_deref() {
        parts.push(description.to_string());
    }
    if let Some(resource_type) = entry.resource_type.as_deref() {
        parts.push(resource_type.to_string());
    }
    for tag in &entry.tags {
        parts.push(tag.clone());
    }
    for (key, value) in entry.string_fields() {
        parts.push(key.to_string());
        parts.push(value.to_string());
    }
    if let Some(handle) = entry.social_handle() {
        parts.push(handle);
    }
    for term in vocabulary {
        if matches_vocabulary_term(entry, term) {
            parts.push(term.clone());
        }
    }

    parts.join(" ").to_lowercase()
}

fn matches_vocabulary_term(entry: &Entry, term: &str) -> bool {
    let term = term.to_lowercase();
    entry
        .fields
        .keys()
        .any(|key| key.to_lowercase() == term)
        || entry.tags.iter().any(|tag| tag.to_lowercase() == term)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(json: &str) -> Entry {
        serde_json::from_str(json).expect("record should parse")
    }

    #[test]
    fn token_contains_every_searchable_literal() {
        let entry = entry(
            r#"{
                "name": "Lighthouse",
                "description": "Audits for the modern web",
                "tags": ["CLI", "Perf"],
                "cli": "https://github.com/GoogleChrome/lighthouse"
            }"#,
        );
        let token = tokenize(&entry, &[]);

        assert_eq!(token, token.to_lowercase());
        for literal in ["lighthouse", "audits for the modern web", "cli", "perf"] {
            assert!(token.contains(literal), "missing `{literal}` in `{token}`");
        }
    }

    #[test]
    fn vocabulary_terms_matching_field_keys_are_included() {
        let entry = entry(r#"{"name": "t", "chrome": "https://example.com"}"#);
        let vocabulary = vec!["chrome".to_string(), "firefox".to_string()];
        let token = tokenize(&entry, &vocabulary);

        assert!(token.contains("chrome"));
        assert!(!token.contains("firefox"));
    }

    #[test]
    fn tokenize_is_stable() {
        let record = r#"{
            "name": "WebPageTest",
            "tags": ["service"],
            "service": "https://www.webpagetest.org",
            "github": "https://github.com/WPO-Foundation/webpagetest"
        }"#;
        let vocabulary = vec!["service".to_string()];

        let first = tokenize(&entry(record), &vocabulary);
        let second = tokenize(&entry(record), &vocabulary);
        assert_eq!(first, second);
    }
}
