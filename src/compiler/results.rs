//! Sort resolution, pagination bounds and result-set assembly.

use super::plan::{PageWindow, SortKey, SortOrder};
use super::QueryError;
use crate::models::{Document, DocumentSet, DocumentSetMetadata, Query};

/// Largest `start + size` a backend will page into
pub const MAX_RESULT_WINDOW: usize = 10_000;

/// Sort applied when no order is requested: most recent first, index order within a day
fn default_sort() -> Vec<SortKey> {
    vec![
        SortKey::descending("announced_date_first"),
        SortKey::ascending("_doc"),
    ]
}

/// Resolve a requested order into sort keys.
///
/// The tie-break on `paper_id_v` runs opposite to the resolved primary key, so
/// a page boundary falls in the same place in either direction.
pub fn resolve_sort(order: Option<&str>) -> Vec<SortKey> {
    let order = match order.map(str::trim) {
        None | Some("") | Some("None") => return default_sort(),
        Some(order) => order,
    };

    let primary = match order.trim_start_matches('-') {
        "relevance" => SortKey::descending("_score"),
        _ => SortKey::parse(order),
    };
    let tie = match primary.order {
        SortOrder::Descending => SortKey::ascending("paper_id_v"),
        SortOrder::Ascending => SortKey::descending("paper_id_v"),
    };
    vec![primary, tie]
}

/// Compute the page window for a query, failing rather than truncating past `max_window`.
///
/// The window starts at `page_start`, which must fall on a page boundary.
pub fn page_window(query: &Query, max_window: usize) -> Result<PageWindow, QueryError> {
    let size = query.page_size();
    if size == 0 {
        return Err(QueryError::InvalidQuery(
            "page size must be greater than zero".to_string(),
        ));
    }
    let start = query.page_start();
    let requested = start
        .checked_add(size)
        .ok_or(QueryError::ResultWindowExceeded {
            requested: usize::MAX,
            max: max_window,
        })?;
    if requested > max_window {
        return Err(QueryError::ResultWindowExceeded {
            requested,
            max: max_window,
        });
    }
    if start % size != 0 {
        return Err(QueryError::InvalidQuery(format!(
            "page start {} is not a multiple of page size {}",
            start, size
        )));
    }
    Ok(PageWindow { start, size })
}

/// Assemble a result page; metadata is derived from the query and total alone
pub fn to_document_set(
    query: &Query,
    total: usize,
    hits: Vec<Document>,
    max_window: usize,
) -> DocumentSet {
    let page_size = query.page_size().max(1);
    let current_page = query.page();
    let start = (current_page - 1).saturating_mul(page_size);

    DocumentSet {
        metadata: DocumentSetMetadata {
            start,
            end: start.saturating_add(page_size).min(total),
            total,
            current_page,
            total_pages: total.div_ceil(page_size).max(1),
            page_size,
            max_pages: max_window / page_size,
        },
        results: hits,
    }
}
