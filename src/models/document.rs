//! Search documents and result sets.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::Classification;

/// An author or owner name as indexed
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Author {
    #[serde(default)]
    pub full_name: String,

    #[serde(default)]
    pub last_name: String,

    #[serde(default)]
    pub first_name: String,

    #[serde(default)]
    pub initials: String,

    #[serde(default)]
    pub author_id: Option<String>,

    #[serde(default)]
    pub orcid: Option<String>,
}

/// A search document, representing one version of a paper
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Document {
    /// Index identifier
    pub id: String,

    /// Identifier without version (e.g. `1902.01234`)
    pub paper_id: String,

    /// Identifier with version (e.g. `1902.01234v2`)
    pub paper_id_v: String,

    pub title: String,

    pub title_tex: String,

    pub r#abstract: String,

    pub abstract_tex: String,

    pub authors: Vec<Author>,

    pub owners: Vec<Author>,

    /// Announcement date of the first version (`YYYY-MM-DD`)
    pub announced_date_first: Option<String>,

    pub submitted_date: Option<String>,

    pub submitted_date_first: Option<String>,

    pub comments: String,

    pub journal_ref: String,

    pub doi: String,

    pub report_num: String,

    pub msc_class: Vec<String>,

    pub acm_class: Vec<String>,

    pub version: u32,

    /// Identifier of the latest version (e.g. `1902.01234v3`)
    pub latest: String,

    pub latest_version: u32,

    pub is_current: bool,

    pub is_withdrawn: bool,

    pub primary_classification: Classification,

    pub secondary_classification: Vec<Classification>,

    /// Relevance score assigned by the backend
    pub score: f64,

    /// Highlighted versions of field values
    pub highlight: HashMap<String, Vec<String>>,
}

impl Document {
    /// Create a document with required fields
    pub fn new(paper_id: impl Into<String>, version: u32, title: impl Into<String>) -> Self {
        let paper_id = paper_id.into();
        Self {
            id: format!("{}v{}", paper_id, version),
            paper_id_v: format!("{}v{}", paper_id, version),
            paper_id,
            title: title.into(),
            version,
            is_current: true,
            score: 1.0,
            ..Default::default()
        }
    }

    /// Latest version number, derived from `latest` when not set explicitly
    pub fn latest_version(&self) -> u32 {
        if self.latest_version > 0 || self.latest.is_empty() {
            return self.latest_version;
        }
        self.latest
            .rsplit_once('v')
            .and_then(|(_, version)| version.parse().ok())
            .unwrap_or(1)
    }

    /// Author full names, in order
    pub fn author_names(&self) -> Vec<&str> {
        self.authors.iter().map(|a| a.full_name.as_str()).collect()
    }
}

/// Pagination metadata of a [`DocumentSet`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSetMetadata {
    /// Offset of the first result
    pub start: usize,

    /// Offset just past the last result actually available
    pub end: usize,

    /// Total number of matching documents
    pub total: usize,

    /// 1-based page number
    pub current_page: usize,

    pub total_pages: usize,

    pub page_size: usize,

    /// Last page reachable within the result window
    pub max_pages: usize,
}

/// A page of search results
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentSet {
    pub metadata: DocumentSetMetadata,

    /// Results in backend order
    pub results: Vec<Document>,
}

impl DocumentSet {
    /// Number of results on this page
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Check if the page is empty
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_new() {
        let doc = Document::new("1902.01234", 2, "Muon decay");
        assert_eq!(doc.paper_id_v, "1902.01234v2");
        assert_eq!(doc.id, "1902.01234v2");
        assert!(doc.is_current);
    }

    #[test]
    fn test_latest_version_from_identifier() {
        let mut doc = Document::new("1902.01234", 1, "Muon decay");
        doc.latest = "1902.01234v3".to_string();
        assert_eq!(doc.latest_version(), 3);

        doc.latest = "hep-th/9901001".to_string();
        assert_eq!(doc.latest_version(), 1);

        doc.latest_version = 5;
        assert_eq!(doc.latest_version(), 5);
    }

    #[test]
    fn test_document_deserializes_with_missing_fields() {
        let doc: Document = serde_json::from_str(
            r#"{"paper_id": "1902.01234", "paper_id_v": "1902.01234v1", "title": "Gluons"}"#,
        )
        .unwrap();
        assert_eq!(doc.title, "Gluons");
        assert!(doc.authors.is_empty());
        assert_eq!(doc.latest_version(), 0);
    }
}
