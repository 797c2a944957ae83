//! Flat-file store loader.
//!
//! The store is one directory per category holding one JSON record per
//! resource. Loading is read-only and happens once per process start; a
//! record that fails to parse is skipped with a warning and never takes the
//! rest of its category down with it.

use std::path::Path;

use tracing::{debug, warn};

use crate::catalog::state::LoadedStore;
use crate::domain::entries::{Category, Entry};
use crate::domain::fuzzy;

/// Outcome counters for one category directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryReport {
    pub category: Category,
    pub loaded: usize,
    pub skipped: usize,
}

/// Load every category of the store.
///
/// A missing store root is reported by the caller; a missing single category
/// directory degrades to an empty list.
pub async fn load_store(
    data_dir: &Path,
    vocabulary: &[String],
) -> (LoadedStore, Vec<CategoryReport>) {
    let mut store = LoadedStore::default();
    let mut reports = Vec::with_capacity(Category::ALL.len());

    for category in Category::ALL {
        let (entries, report) = load_category_with_report(data_dir, category, vocabulary).await;
        match category {
            Category::Articles => store.articles = entries,
            Category::Books => store.books = entries,
            Category::Slides => store.slides = entries,
            Category::Tools => store.tools = entries,
            Category::Videos => store.videos = entries,
        }
        reports.push(report);
    }

    (store, reports)
}

/// Load one category, in directory-iteration order.
pub async fn load_category(
    data_dir: &Path,
    category: Category,
    vocabulary: &[String],
) -> Vec<Entry> {
    load_category_with_report(data_dir, category, vocabulary)
        .await
        .0
}

async fn load_category_with_report(
    data_dir: &Path,
    category: Category,
    vocabulary: &[String],
) -> (Vec<Entry>, CategoryReport) {
    let dir = data_dir.join(category.as_str());
    let mut entries = Vec::new();
    let mut skipped = 0usize;

    let mut dir_entries = match tokio::fs::read_dir(&dir).await {
        Ok(dir_entries) => dir_entries,
        Err(error) => {
            warn!(
                category = %category,
                path = %dir.display(),
                error = %error,
                "Store directory could not be read; serving an empty category"
            );
            return (
                entries,
                CategoryReport {
                    category,
                    loaded: 0,
                    skipped: 0,
                },
            );
        }
    };

    loop {
        let dir_entry = match dir_entries.next_entry().await {
            Ok(Some(dir_entry)) => dir_entry,
            Ok(None) => break,
            Err(error) => {
                warn!(category = %category, error = %error, "Store iteration failed mid-directory");
                break;
            }
        };

        let file_name = dir_entry.file_name();
        let Some(name) = file_name.to_str() else {
            skipped += 1;
            warn!(category = %category, "Skipping record with non-UTF-8 file name");
            continue;
        };
        if name.starts_with('.') {
            continue;
        }
        if dir_entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false) {
            continue;
        }

        match read_record(&dir_entry.path(), vocabulary).await {
            Ok(entry) => {
                debug!(category = %category, record = name, "Loaded record");
                entries.push(entry);
            }
            Err(error) => {
                skipped += 1;
                warn!(
                    category = %category,
                    record = name,
                    error = %error,
                    "Skipping malformed record"
                );
            }
        }
    }

    let report = CategoryReport {
        category,
        loaded: entries.len(),
        skipped,
    };
    (entries, report)
}

async fn read_record(path: &Path, vocabulary: &[String]) -> Result<Entry, RecordError> {
    let raw = tokio::fs::read_to_string(path).await?;
    let mut entry: Entry = serde_json::from_str(&raw)?;
    entry.fuzzy = fuzzy::tokenize(&entry, vocabulary);
    entry.hidden = false;
    Ok(entry)
}

#[derive(Debug, thiserror::Error)]
enum RecordError {
    #[error("read failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("parse failed: {0}")]
    Parse(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::fs;

    use tempfile::TempDir;

    fn store_with_tools(records: &[(&str, &str)]) -> TempDir {
        let dir = tempfile::tempdir().expect("tempdir");
        let tools = dir.path().join("tools");
        fs::create_dir_all(&tools).expect("create tools dir");
        for (name, body) in records {
            fs::write(tools.join(name), body).expect("write record");
        }
        dir
    }

    #[tokio::test]
    async fn malformed_records_are_skipped_not_fatal() {
        let dir = store_with_tools(&[
            ("a.json", r#"{"name": "A", "tags": ["CLI"]}"#),
            ("broken.json", r#"{"name": "B", "#),
            ("c.json", r#"{"name": "C"}"#),
        ]);

        let (entries, report) =
            load_category_with_report(dir.path(), Category::Tools, &[]).await;

        assert_eq!(entries.len(), 2);
        assert_eq!(report.loaded, 2);
        assert_eq!(report.skipped, 1);
    }

    #[tokio::test]
    async fn dotfiles_are_ignored() {
        let dir = store_with_tools(&[
            (".DS_Store", "garbage"),
            ("a.json", r#"{"name": "A"}"#),
        ]);

        let (entries, report) =
            load_category_with_report(dir.path(), Category::Tools, &[]).await;

        assert_eq!(entries.len(), 1);
        assert_eq!(report.skipped, 0);
    }

    #[tokio::test]
    async fn loaded_entries_carry_fuzzy_token_and_visibility() {
        let dir = store_with_tools(&[(
            "a.json",
            r#"{"name": "Lighthouse", "tags": ["CLI", "Perf"]}"#,
        )]);

        let entries = load_category(dir.path(), Category::Tools, &[]).await;

        assert_eq!(entries.len(), 1);
        let entry = &entries[0];
        assert!(!entry.hidden);
        assert!(entry.fuzzy.contains("cli"));
        assert!(entry.fuzzy.contains("perf"));
        assert_eq!(entry.fuzzy, entry.fuzzy.to_lowercase());
    }

    #[tokio::test]
    async fn missing_category_directory_degrades_to_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let entries = load_category(dir.path(), Category::Videos, &[]).await;
        assert!(entries.is_empty());
    }
}
