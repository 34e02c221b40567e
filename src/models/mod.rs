//! Core data models for search queries and result sets.

mod document;
mod query;

pub use document::{Author, Document, DocumentSet, DocumentSetMetadata};
pub use query::{
    AdvancedQuery, BooleanOperator, Classification, ClassificationList, DateRange, DateType,
    Field, FieldedSearchList, FieldedSearchTerm, Query, SimpleQuery, DEFAULT_PAGE_SIZE,
};
