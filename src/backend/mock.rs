//! Mock backend for testing purposes.

use async_trait::async_trait;
use std::sync::Mutex;

use crate::backend::{BackendError, RawResults, SearchBackend};
use crate::compiler::SearchPlan;
use crate::models::Document;

/// A mock backend that returns canned results and records every plan it runs.
#[derive(Debug, Default)]
pub struct MockBackend {
    results: Mutex<Option<Result<RawResults, BackendError>>>,
    documents: Mutex<Vec<Document>>,
    executed: Mutex<Vec<SearchPlan>>,
    available: Mutex<bool>,
}

impl MockBackend {
    /// Create a new mock backend.
    pub fn new() -> Self {
        Self {
            available: Mutex::new(true),
            ..Default::default()
        }
    }

    /// Set the results returned by `execute`.
    pub fn set_results(&self, results: RawResults) {
        let mut guard = self.results.lock().unwrap();
        *guard = Some(Ok(results));
    }

    /// Make `execute` fail with the given error.
    pub fn set_error(&self, error: BackendError) {
        let mut guard = self.results.lock().unwrap();
        *guard = Some(Err(error));
    }

    /// Add a document retrievable by its paper ID (with or without version).
    pub fn add_document(&self, document: Document) {
        self.documents.lock().unwrap().push(document);
    }

    pub fn set_available(&self, available: bool) {
        *self.available.lock().unwrap() = available;
    }

    /// Plans executed so far, oldest first.
    pub fn executed_plans(&self) -> Vec<SearchPlan> {
        self.executed.lock().unwrap().clone()
    }
}

#[async_trait]
impl SearchBackend for MockBackend {
    fn id(&self) -> &str {
        "mock"
    }

    async fn execute(&self, plan: &SearchPlan) -> Result<RawResults, BackendError> {
        self.executed.lock().unwrap().push(plan.clone());
        let guard = self.results.lock().unwrap();
        match &*guard {
            Some(results) => results.clone(),
            None => Ok(RawResults::default()),
        }
    }

    async fn get_document(&self, id: &str) -> Result<Document, BackendError> {
        let guard = self.documents.lock().unwrap();
        guard
            .iter()
            .find(|doc| doc.paper_id == id || doc.paper_id_v == id)
            .cloned()
            .ok_or_else(|| BackendError::DocumentNotFound(id.to_string()))
    }

    async fn is_available(&self) -> bool {
        *self.available.lock().unwrap()
    }
}

/// Helper function to create a mock document for testing.
pub fn make_document(paper_id: &str, version: u32, title: &str) -> Document {
    Document::new(paper_id, version, title)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::{Fragment, PageWindow};

    fn plan() -> SearchPlan {
        SearchPlan {
            query: Fragment::MatchAll,
            filters: Vec::new(),
            sort: Vec::new(),
            window: PageWindow { start: 0, size: 10 },
        }
    }

    #[tokio::test]
    async fn test_mock_records_plans() {
        let backend = MockBackend::new();
        backend.set_results(RawResults::new(1, vec![make_document("1902.01234", 1, "Muons")]));

        let results = backend.execute(&plan()).await.unwrap();
        assert_eq!(results.total, 1);
        assert_eq!(backend.executed_plans(), vec![plan()]);
    }

    #[tokio::test]
    async fn test_mock_error_and_lookup() {
        let backend = MockBackend::new();
        backend.set_error(BackendError::Unavailable("down".to_string()));
        assert!(matches!(
            backend.execute(&plan()).await,
            Err(BackendError::Unavailable(_))
        ));

        backend.add_document(make_document("1902.01234", 2, "Muons"));
        assert!(backend.get_document("1902.01234v2").await.is_ok());
        assert!(matches!(
            backend.get_document("1902.09999").await,
            Err(BackendError::DocumentNotFound(_))
        ));
        assert!(backend.is_available().await);
        backend.set_available(false);
        assert!(!backend.is_available().await);
    }
}
