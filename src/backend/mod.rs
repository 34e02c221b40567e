//! Search backends and the service that drives them.
//!
//! A [`SearchBackend`] executes compiled [`SearchPlan`]s against some index and
//! fetches individual documents. The [`SearchService`] compiles queries,
//! hands the plan to the backend and shapes the raw hits into a
//! [`DocumentSet`](crate::models::DocumentSet).
//!
//! # Implementing a Backend
//!
//! 1. Create a struct that implements `SearchBackend`
//! 2. Implement `id`, `execute` and `get_document`
//! 3. Override `is_available` if the backend can report its health
//!
//! Retries and timeouts are the backend's business; the service never
//! retries.

pub mod mock;
mod service;

pub use mock::MockBackend;
pub use service::{SearchError, SearchService};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::compiler::SearchPlan;
use crate::models::Document;

/// Total hit count and the hits of one page, in backend order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawResults {
    pub total: usize,
    pub hits: Vec<Document>,
}

impl RawResults {
    pub fn new(total: usize, hits: Vec<Document>) -> Self {
        Self { total, hits }
    }
}

/// A search index that can run compiled plans
#[async_trait]
pub trait SearchBackend: Send + Sync + std::fmt::Debug {
    /// Identifier used in logs
    fn id(&self) -> &str;

    /// Run a plan and return the requested page of hits
    async fn execute(&self, plan: &SearchPlan) -> Result<RawResults, BackendError>;

    /// Fetch the latest version of a document by identifier
    async fn get_document(&self, id: &str) -> Result<Document, BackendError>;

    /// Whether the backend can currently serve requests
    async fn is_available(&self) -> bool {
        true
    }
}

/// Errors raised by backend implementations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    /// The backend cannot be reached
    #[error("Search backend unavailable: {0}")]
    Unavailable(String),

    /// The backend rejected or failed to run the query
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// No document with the given identifier
    #[error("Document not found: {0}")]
    DocumentNotFound(String),
}

impl From<serde_json::Error> for BackendError {
    fn from(err: serde_json::Error) -> Self {
        BackendError::QueryFailed(format!("JSON: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_error_messages() {
        assert_eq!(
            BackendError::DocumentNotFound("1902.01234".to_string()).to_string(),
            "Document not found: 1902.01234"
        );
        assert_eq!(
            BackendError::Unavailable("connection refused".to_string()).to_string(),
            "Search backend unavailable: connection refused"
        );
    }

    #[test]
    fn test_json_error_is_query_failure() {
        let err = serde_json::from_str::<RawResults>("{").unwrap_err();
        assert!(matches!(BackendError::from(err), BackendError::QueryFailed(_)));
    }
}
