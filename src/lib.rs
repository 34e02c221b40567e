//! # Scholar Query
//!
//! Compiles scholarly-paper search queries into backend-agnostic search plans.
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`models`]: Core data structures (SimpleQuery, AdvancedQuery, Document, etc.)
//! - [`compiler`]: Term analysis, precedence grouping, fragments and search plans
//! - [`backend`]: The search backend trait and the service that drives it
//! - [`utils`]: Identifier validation
//! - [`config`]: Configuration management
//!
//! ```rust
//! use scholar_query::compiler::QueryCompiler;
//! use scholar_query::models::{Field, Query, SimpleQuery};
//!
//! let query: Query = SimpleQuery::new(Field::Title, "dark matter").page_size(10).into();
//! let plan = QueryCompiler::default().compile(&query).unwrap();
//! assert_eq!(plan.window.size, 10);
//! ```

pub mod backend;
pub mod compiler;
pub mod config;
pub mod models;
pub mod utils;

// Re-export commonly used types
pub use backend::{SearchBackend, SearchService};
pub use compiler::{QueryCompiler, QueryError, SearchPlan};
pub use models::{AdvancedQuery, DocumentSet, Query, SimpleQuery};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
