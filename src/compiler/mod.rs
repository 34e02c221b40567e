//! Query compilation.
//!
//! A [`QueryCompiler`] turns a [`Query`] into a [`SearchPlan`]: a scored
//! query fragment, filter fragments, sort keys and a page window. Compilation
//! is pure and deterministic; the same query always yields the same plan.

mod authors;
mod fields;
mod fragment;
mod grouping;
mod plan;
mod results;
mod terms;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{
    AdvancedQuery, BooleanOperator, Classification, ClassificationList, Query, SimpleQuery,
};

pub use authors::{author_id_query, author_query, catch_classic_author_syntax, orcid_query};
pub use fields::{field_query, text_query};
pub use fragment::{
    BoolFragment, Fragment, MatchFragment, MatchKind, MultiMatchFragment, NestedFragment,
    QueryOperator, QueryStringFragment, RangeFragment, TermFragment, TermValue, TermsFragment,
    WildcardFragment,
};
pub use grouping::{group_terms, Node};
pub use plan::{PageWindow, SearchPlan, SortKey, SortOrder};
pub use results::{page_window, resolve_sort, to_document_set, MAX_RESULT_WINDOW};
pub use terms::{
    classify_wildcard, decode_date_partial, escape_special, is_literal, is_tex,
    strip_single_characters, strip_tex, tex_spans,
};

/// Errors raised while compiling a query
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Result window exceeded: requested {requested}, maximum is {max}")]
    ResultWindowExceeded { requested: usize, max: usize },
}

/// No identifier date partial was found in a term
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("no date partial found")]
pub struct NoDatePartial;

/// Compiler settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerSettings {
    /// Largest `start + page_size` a query may request
    pub max_result_window: usize,
}

impl Default for CompilerSettings {
    fn default() -> Self {
        Self {
            max_result_window: MAX_RESULT_WINDOW,
        }
    }
}

/// Compiles queries into search plans
#[derive(Debug, Clone, Default)]
pub struct QueryCompiler {
    settings: CompilerSettings,
}

impl QueryCompiler {
    pub fn new(settings: CompilerSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &CompilerSettings {
        &self.settings
    }

    /// Compile a query into a search plan.
    ///
    /// Pagination is checked before anything else, so an out-of-window
    /// request fails without building any fragments.
    pub fn compile(&self, query: &Query) -> Result<SearchPlan, QueryError> {
        let window = page_window(query, self.settings.max_result_window)?;
        let sort = resolve_sort(query.order());

        let (query_fragment, mut filters) = match query {
            Query::Simple(simple) => compile_simple(simple)?,
            Query::Advanced(advanced) => compile_advanced(advanced)?,
        };
        if !query.include_older_versions() {
            filters.insert(0, Fragment::term("is_current", TermValue::Bool(true)));
        }

        tracing::debug!(
            "Compiled query with {} filters, sort {:?}, window {}..{}",
            filters.len(),
            sort.iter().map(ToString::to_string).collect::<Vec<_>>(),
            window.start,
            window.end()
        );
        Ok(SearchPlan {
            query: query_fragment,
            filters,
            sort,
            window,
        })
    }
}

fn compile_simple(query: &SimpleQuery) -> Result<(Fragment, Vec<Fragment>), QueryError> {
    tracing::debug!("Simple query: {}={}", query.search_field, query.value);
    if query.value.trim().is_empty() {
        return Err(QueryError::InvalidQuery("search term is empty".to_string()));
    }
    let fragment = field_query(query.search_field, &query.value, QueryOperator::And)?;

    let archives = query
        .archives
        .iter()
        .map(|archive| Fragment::match_value("primary_classification.archive.id", archive.as_str()))
        .reduce(|acc, q| acc | q);
    Ok((fragment, archives.into_iter().collect()))
}

fn compile_advanced(query: &AdvancedQuery) -> Result<(Fragment, Vec<Fragment>), QueryError> {
    let grouped = group_terms(&query.terms)?;
    tracing::debug!("Grouped terms: {}", grouped);
    let fragment = node_fragment(&grouped)?;

    let mut filters = Vec::new();
    if let Some(classification) = classification_filter(
        &query.primary_classification,
        query.include_cross_list,
    ) {
        filters.push(classification);
    }
    if let Some(range) = &query.date_range {
        filters.push(Fragment::range(
            range.date_type.field(),
            range.start_date.map(|d| d.to_rfc3339()),
            range.end_date.map(|d| d.to_rfc3339()),
        ));
    }
    Ok((fragment, filters))
}

fn node_fragment(node: &Node) -> Result<Fragment, QueryError> {
    match node {
        Node::Leaf(term) => field_query(term.field, &term.term, QueryOperator::And),
        Node::Group(left, operator, right) => {
            let left = node_fragment(left)?;
            let right = node_fragment(right)?;
            Ok(match operator {
                BooleanOperator::And => left & right,
                BooleanOperator::Or => left | right,
                BooleanOperator::Not => left & !right,
            })
        }
    }
}

fn classification_match(classification: &Classification, path: &str) -> Fragment {
    [
        ("group", &classification.group),
        ("archive", &classification.archive),
        ("category", &classification.category),
    ]
    .into_iter()
    .filter_map(|(part, value)| {
        value
            .as_deref()
            .map(|value| Fragment::match_value(format!("{}.{}.id", path, part), value))
    })
    .fold(Fragment::MatchAll, |acc, q| acc & q)
}

/// OR of the requested classifications, optionally matching cross-lists too
fn classification_filter(
    classifications: &ClassificationList,
    include_cross_list: bool,
) -> Option<Fragment> {
    classifications
        .iter()
        .filter(|classification| !classification.is_empty())
        .map(|classification| {
            let primary = classification_match(classification, "primary_classification");
            if include_cross_list {
                primary
                    | Fragment::nested(
                        "secondary_classification",
                        classification_match(classification, "secondary_classification"),
                    )
            } else {
                primary
            }
        })
        .reduce(|acc, q| acc | q)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DateRange, DateType, Field, FieldedSearchTerm};
    use chrono::DateTime;

    fn advanced() -> AdvancedQuery {
        AdvancedQuery::new(vec![
            FieldedSearchTerm::first(Field::Title, "muon"),
            FieldedSearchTerm::new(BooleanOperator::Or, Field::Title, "gluon"),
            FieldedSearchTerm::new(BooleanOperator::Not, Field::Title, "foo"),
            FieldedSearchTerm::new(BooleanOperator::And, Field::Abstract, "boson"),
        ])
    }

    #[test]
    fn test_compile_is_deterministic() {
        let compiler = QueryCompiler::default();
        let query: Query = advanced()
            .classification(Classification::archive("hep-ph"))
            .into();
        let first = compiler.compile(&query).unwrap();
        let second = compiler.compile(&query).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.to_json(), second.to_json());
    }

    #[test]
    fn test_compile_advanced_shape() {
        let plan = QueryCompiler::default().compile(&advanced().into()).unwrap();
        let title = |q: &str| Fragment::matching("title", q, QueryOperator::And);
        let expected = title("muon")
            | ((title("gluon") & !title("foo"))
                & Fragment::matching("abstract", "boson", QueryOperator::And));
        assert_eq!(plan.query, expected);
        assert_eq!(
            plan.filters,
            vec![Fragment::term("is_current", TermValue::Bool(true))]
        );
        assert_eq!(plan.window, PageWindow { start: 0, size: 50 });
    }

    #[test]
    fn test_compile_simple_with_archives() {
        let query: Query = SimpleQuery::new(Field::Title, "muon")
            .archive("hep-ph")
            .archive("hep-th")
            .include_older_versions(true)
            .into();
        let plan = QueryCompiler::default().compile(&query).unwrap();
        assert_eq!(plan.filters.len(), 1);
        assert_eq!(
            plan.filters[0],
            Fragment::match_value("primary_classification.archive.id", "hep-ph")
                | Fragment::match_value("primary_classification.archive.id", "hep-th")
        );
    }

    #[test]
    fn test_compile_simple_rejects_empty_term() {
        let query: Query = SimpleQuery::new(Field::All, "  ").into();
        assert!(matches!(
            QueryCompiler::default().compile(&query),
            Err(QueryError::InvalidQuery(_))
        ));
    }

    #[test]
    fn test_classification_and_cross_list_filter() {
        let classification = Classification {
            group: Some("grp_physics".to_string()),
            archive: Some("hep-ph".to_string()),
            category: None,
        };
        let query: Query = advanced()
            .classification(classification)
            .include_cross_list(true)
            .into();
        let plan = QueryCompiler::default().compile(&query).unwrap();
        let rendered = plan.filters[1].to_json();
        let should = rendered["bool"]["should"].as_array().unwrap();
        assert_eq!(should.len(), 2);
        assert_eq!(
            should[0]["bool"]["must"][1]["match"]["primary_classification.archive.id"]["query"],
            "hep-ph"
        );
        assert_eq!(should[1]["nested"]["path"], "secondary_classification");
    }

    #[test]
    fn test_date_range_filter() {
        let start = DateTime::parse_from_rfc3339("2019-01-01T00:00:00-05:00").unwrap();
        let query: Query = advanced()
            .date_range(DateRange::new(Some(start), None).date_type(DateType::AnnouncedDateFirst))
            .into();
        let plan = QueryCompiler::default().compile(&query).unwrap();
        assert_eq!(
            plan.filters[1],
            Fragment::range(
                "announced_date_first",
                Some("2019-01-01T00:00:00-05:00".to_string()),
                None
            )
        );
    }

    #[test]
    fn test_window_checked_before_terms() {
        // Malformed terms would also fail; the window error wins.
        let query: Query = AdvancedQuery::default().page_start(10_000).into();
        assert!(matches!(
            QueryCompiler::default().compile(&query),
            Err(QueryError::ResultWindowExceeded { .. })
        ));
    }

    #[test]
    fn test_custom_result_window() {
        let compiler = QueryCompiler::new(CompilerSettings {
            max_result_window: 100,
        });
        let query: Query = SimpleQuery::new(Field::Title, "muon").page_start(100).into();
        assert!(matches!(
            compiler.compile(&query),
            Err(QueryError::ResultWindowExceeded { max: 100, .. })
        ));
    }
}
