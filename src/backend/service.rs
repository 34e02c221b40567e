//! Search service: compile, execute, shape.

use std::sync::Arc;

use thiserror::Error;

use super::{BackendError, SearchBackend};
use crate::compiler::{to_document_set, QueryCompiler, QueryError, SearchPlan};
use crate::models::{Document, DocumentSet, Query};
use crate::utils::{parse_arxiv_id, ValidationError};

/// Errors returned by the [`SearchService`]
#[derive(Debug, Error)]
pub enum SearchError {
    #[error(transparent)]
    Query(#[from] QueryError),

    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(#[from] ValidationError),

    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Runs queries against a backend
#[derive(Debug, Clone)]
pub struct SearchService {
    compiler: QueryCompiler,
    backend: Arc<dyn SearchBackend>,
}

impl SearchService {
    pub fn new(compiler: QueryCompiler, backend: Arc<dyn SearchBackend>) -> Self {
        Self { compiler, backend }
    }

    pub fn compiler(&self) -> &QueryCompiler {
        &self.compiler
    }

    /// Compile a query without executing it
    pub fn plan(&self, query: &Query) -> Result<SearchPlan, SearchError> {
        Ok(self.compiler.compile(query)?)
    }

    /// Run a query and return one page of results.
    ///
    /// Compilation errors are returned before the backend is contacted.
    pub async fn search(&self, query: &Query) -> Result<DocumentSet, SearchError> {
        let plan = self.plan(query)?;

        tracing::debug!(
            "Executing plan on {}: {}",
            self.backend.id(),
            plan.to_json()
        );
        let raw = self.backend.execute(&plan).await.map_err(|e| {
            tracing::warn!("Backend {} failed to execute query: {}", self.backend.id(), e);
            e
        })?;

        tracing::info!("Query matched {} documents", raw.total);
        Ok(to_document_set(
            query,
            raw.total,
            raw.hits,
            self.compiler.settings().max_result_window,
        ))
    }

    /// Fetch a single document by arXiv identifier
    pub async fn get_document(&self, id: &str) -> Result<Document, SearchError> {
        let id = parse_arxiv_id(id)?;
        self.backend
            .get_document(&id.versioned())
            .await
            .map_err(|e| {
                tracing::warn!("Backend {} failed to fetch {}: {}", self.backend.id(), id, e);
                SearchError::from(e)
            })
    }

    /// Whether the backend can currently serve requests
    pub async fn is_available(&self) -> bool {
        self.backend.is_available().await
    }
}
