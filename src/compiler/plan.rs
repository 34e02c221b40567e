//! Compiled search plans and their request-body rendering.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;

use super::fragment::Fragment;

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Ascending => "asc",
            SortOrder::Descending => "desc",
        }
    }
}

/// One sort key; the textual form prefixes descending keys with `-`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortKey {
    pub field: String,
    pub order: SortOrder,
}

impl SortKey {
    pub fn ascending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            order: SortOrder::Ascending,
        }
    }

    pub fn descending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            order: SortOrder::Descending,
        }
    }

    /// Parse `field` or `-field`
    pub fn parse(key: &str) -> Self {
        match key.strip_prefix('-') {
            Some(field) => Self::descending(field),
            None => Self::ascending(key),
        }
    }

    pub fn to_json(&self) -> Value {
        json!({ self.field.clone(): { "order": self.order.as_str() } })
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.order {
            SortOrder::Ascending => write!(f, "{}", self.field),
            SortOrder::Descending => write!(f, "-{}", self.field),
        }
    }
}

/// Slice of the result set to fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageWindow {
    /// Offset of the first result
    pub start: usize,
    pub size: usize,
}

impl PageWindow {
    /// Offset just past the window
    pub fn end(&self) -> usize {
        self.start + self.size
    }
}

/// Everything a backend needs to run one search
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchPlan {
    /// Scored query clause
    pub query: Fragment,

    /// Unscored filter clauses
    pub filters: Vec<Fragment>,

    pub sort: Vec<SortKey>,

    pub window: PageWindow,
}

impl SearchPlan {
    /// Render the Elasticsearch-style request body
    pub fn to_json(&self) -> Value {
        let mut body = serde_json::Map::new();
        body.insert("must".to_string(), json!([self.query.to_json()]));
        if !self.filters.is_empty() {
            let filters: Vec<Value> = self.filters.iter().map(Fragment::to_json).collect();
            body.insert("filter".to_string(), Value::Array(filters));
        }
        json!({
            "query": { "bool": body },
            "sort": self.sort.iter().map(SortKey::to_json).collect::<Vec<_>>(),
            "from": self.window.start,
            "size": self.window.size,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::fragment::{QueryOperator, TermValue};

    #[test]
    fn test_sort_key_parse_and_display() {
        let key = SortKey::parse("-announced_date_first");
        assert_eq!(key, SortKey::descending("announced_date_first"));
        assert_eq!(key.to_string(), "-announced_date_first");
        assert_eq!(SortKey::parse("title").order, SortOrder::Ascending);
        assert_eq!(
            SortKey::parse("-_score").to_json(),
            json!({ "_score": { "order": "desc" } })
        );
    }

    #[test]
    fn test_plan_request_body() {
        let plan = SearchPlan {
            query: Fragment::matching("title", "muon", QueryOperator::And),
            filters: vec![Fragment::term("is_current", TermValue::Bool(true))],
            sort: vec![SortKey::descending("announced_date_first"), SortKey::ascending("_doc")],
            window: PageWindow { start: 50, size: 25 },
        };
        let body = plan.to_json();
        assert_eq!(
            body["query"]["bool"]["must"][0]["match"]["title"]["query"],
            "muon"
        );
        assert_eq!(body["query"]["bool"]["filter"][0]["term"]["is_current"], true);
        assert_eq!(body["sort"][1], json!({ "_doc": { "order": "asc" } }));
        assert_eq!(body["from"], 50);
        assert_eq!(body["size"], 25);
        assert_eq!(plan.window.end(), 75);
    }

    #[test]
    fn test_plan_without_filters_omits_filter_key() {
        let plan = SearchPlan {
            query: Fragment::MatchAll,
            filters: Vec::new(),
            sort: Vec::new(),
            window: PageWindow { start: 0, size: 10 },
        };
        assert!(plan.to_json()["query"]["bool"].get("filter").is_none());
    }
}
