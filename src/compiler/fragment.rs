//! Backend query fragments.
//!
//! A [`Fragment`] is a closed, backend-agnostic description of one query
//! clause. Fragments combine with [`Fragment::and`], [`Fragment::or`] and
//! [`Fragment::negate`] (also available as `&`, `|` and `!`), flattening
//! boolean clauses the way a query DSL does. [`Fragment::to_json`] renders
//! the Elasticsearch-style wire form.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::ops::{BitAnd, BitOr, Not};

/// How tokens within one field combine
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryOperator {
    #[default]
    And,
    Or,
}

impl QueryOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryOperator::And => "and",
            QueryOperator::Or => "or",
        }
    }
}

/// Flavour of a match clause
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    /// Analyzed token match
    Match,
    /// Tokens in order, adjacent
    Phrase,
    /// Phrase whose last token may be a prefix
    PhrasePrefix,
}

/// Full-text match against one field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchFragment {
    pub field: String,
    pub query: String,
    pub kind: MatchKind,
    /// Only meaningful for [`MatchKind::Match`]
    pub operator: Option<QueryOperator>,
}

/// Case-normalized wildcard match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WildcardFragment {
    pub field: String,
    pub value: String,
}

/// Exact value of a term-level field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TermValue {
    Bool(bool),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermFragment {
    pub field: String,
    pub value: TermValue,
}

/// Any of several exact values
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermsFragment {
    pub field: String,
    pub values: Vec<String>,
}

/// Raw query-string expression; leading wildcards are never allowed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryStringFragment {
    pub fields: Vec<String>,
    /// Already escaped
    pub query: String,
    pub default_operator: QueryOperator,
    pub cross_fields: bool,
    pub auto_generate_phrase_queries: bool,
}

/// Cross-field match over several fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiMatchFragment {
    pub fields: Vec<String>,
    pub query: String,
    pub operator: QueryOperator,
}

/// Inclusive-start, exclusive-end range
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeFragment {
    pub field: String,
    pub gte: Option<String>,
    pub lt: Option<String>,
}

/// Query evaluated within nested objects at `path`, scores summed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NestedFragment {
    pub path: String,
    pub query: Box<Fragment>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoolFragment {
    pub must: Vec<Fragment>,
    pub should: Vec<Fragment>,
    pub must_not: Vec<Fragment>,
    pub filter: Vec<Fragment>,
}

impl BoolFragment {
    fn has_should(&self) -> bool {
        !self.should.is_empty()
    }

    fn only_should(&self) -> bool {
        self.must.is_empty() && self.must_not.is_empty() && self.filter.is_empty()
    }
}

/// One backend query clause
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Fragment {
    MatchAll,
    Match(MatchFragment),
    Wildcard(WildcardFragment),
    Term(TermFragment),
    Terms(TermsFragment),
    QueryString(QueryStringFragment),
    MultiMatch(MultiMatchFragment),
    Range(RangeFragment),
    Nested(NestedFragment),
    Bool(BoolFragment),
}

impl Fragment {
    /// Analyzed match with an operator
    pub fn matching(field: impl Into<String>, query: impl Into<String>, operator: QueryOperator) -> Self {
        Fragment::Match(MatchFragment {
            field: field.into(),
            query: query.into(),
            kind: MatchKind::Match,
            operator: Some(operator),
        })
    }

    /// Analyzed match using the backend's default operator
    pub fn match_value(field: impl Into<String>, query: impl Into<String>) -> Self {
        Fragment::Match(MatchFragment {
            field: field.into(),
            query: query.into(),
            kind: MatchKind::Match,
            operator: None,
        })
    }

    pub fn phrase(field: impl Into<String>, query: impl Into<String>) -> Self {
        Fragment::Match(MatchFragment {
            field: field.into(),
            query: query.into(),
            kind: MatchKind::Phrase,
            operator: None,
        })
    }

    pub fn phrase_prefix(field: impl Into<String>, query: impl Into<String>) -> Self {
        Fragment::Match(MatchFragment {
            field: field.into(),
            query: query.into(),
            kind: MatchKind::PhrasePrefix,
            operator: None,
        })
    }

    pub fn wildcard(field: impl Into<String>, value: impl Into<String>) -> Self {
        Fragment::Wildcard(WildcardFragment {
            field: field.into(),
            value: value.into(),
        })
    }

    pub fn term(field: impl Into<String>, value: TermValue) -> Self {
        Fragment::Term(TermFragment {
            field: field.into(),
            value,
        })
    }

    pub fn terms<I, S>(field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Fragment::Terms(TermsFragment {
            field: field.into(),
            values: values.into_iter().map(Into::into).collect(),
        })
    }

    pub fn nested(path: impl Into<String>, query: Fragment) -> Self {
        Fragment::Nested(NestedFragment {
            path: path.into(),
            query: Box::new(query),
        })
    }

    pub fn range(field: impl Into<String>, gte: Option<String>, lt: Option<String>) -> Self {
        Fragment::Range(RangeFragment {
            field: field.into(),
            gte,
            lt,
        })
    }

    /// Both clauses must match
    pub fn and(self, other: Fragment) -> Fragment {
        match (self, other) {
            (Fragment::MatchAll, other) => other,
            (this, Fragment::MatchAll) => this,
            (Fragment::Bool(mut left), Fragment::Bool(right))
                if !left.has_should() && !right.has_should() =>
            {
                left.must.extend(right.must);
                left.must_not.extend(right.must_not);
                left.filter.extend(right.filter);
                Fragment::Bool(left)
            }
            (Fragment::Bool(mut left), other) if !left.has_should() => {
                left.must.push(other);
                Fragment::Bool(left)
            }
            (this, Fragment::Bool(mut right)) if !right.has_should() => {
                right.must.insert(0, this);
                Fragment::Bool(right)
            }
            (this, other) => Fragment::Bool(BoolFragment {
                must: vec![this, other],
                ..Default::default()
            }),
        }
    }

    /// Either clause may match
    pub fn or(self, other: Fragment) -> Fragment {
        match (self, other) {
            (Fragment::MatchAll, _) | (_, Fragment::MatchAll) => Fragment::MatchAll,
            (Fragment::Bool(mut left), Fragment::Bool(right))
                if left.only_should() && right.only_should() =>
            {
                left.should.extend(right.should);
                Fragment::Bool(left)
            }
            (Fragment::Bool(mut left), other) if left.only_should() => {
                left.should.push(other);
                Fragment::Bool(left)
            }
            (this, other) => Fragment::Bool(BoolFragment {
                should: vec![this, other],
                ..Default::default()
            }),
        }
    }

    /// The clause must not match
    pub fn negate(self) -> Fragment {
        Fragment::Bool(BoolFragment {
            must_not: vec![self],
            ..Default::default()
        })
    }

    /// Render the Elasticsearch-style JSON form of this clause
    pub fn to_json(&self) -> Value {
        match self {
            Fragment::MatchAll => json!({ "match_all": {} }),
            Fragment::Match(m) => match m.kind {
                MatchKind::Match => {
                    let mut body = Map::new();
                    body.insert("query".to_string(), json!(m.query));
                    if let Some(operator) = m.operator {
                        body.insert("operator".to_string(), json!(operator.as_str()));
                    }
                    json!({ "match": { m.field.clone(): body } })
                }
                MatchKind::Phrase => json!({ "match_phrase": { m.field.clone(): m.query } }),
                MatchKind::PhrasePrefix => {
                    json!({ "match_phrase_prefix": { m.field.clone(): m.query } })
                }
            },
            Fragment::Wildcard(w) => json!({ "wildcard": { w.field.clone(): { "value": w.value } } }),
            Fragment::Term(t) => json!({ "term": { t.field.clone(): t.value } }),
            Fragment::Terms(t) => json!({ "terms": { t.field.clone(): t.values } }),
            Fragment::QueryString(q) => {
                let mut body = Map::new();
                body.insert("fields".to_string(), json!(q.fields));
                body.insert("query".to_string(), json!(q.query));
                body.insert(
                    "default_operator".to_string(),
                    json!(q.default_operator.as_str().to_uppercase()),
                );
                body.insert("allow_leading_wildcard".to_string(), json!(false));
                if q.cross_fields {
                    body.insert("type".to_string(), json!("cross_fields"));
                }
                if q.auto_generate_phrase_queries {
                    body.insert("auto_generate_phrase_queries".to_string(), json!(true));
                }
                json!({ "query_string": body })
            }
            Fragment::MultiMatch(m) => json!({
                "multi_match": {
                    "type": "cross_fields",
                    "fields": m.fields,
                    "query": m.query,
                    "operator": m.operator.as_str(),
                }
            }),
            Fragment::Range(r) => {
                let mut bounds = Map::new();
                if let Some(gte) = &r.gte {
                    bounds.insert("gte".to_string(), json!(gte));
                }
                if let Some(lt) = &r.lt {
                    bounds.insert("lt".to_string(), json!(lt));
                }
                json!({ "range": { r.field.clone(): bounds } })
            }
            Fragment::Nested(n) => json!({
                "nested": {
                    "path": n.path,
                    "score_mode": "sum",
                    "query": n.query.to_json(),
                }
            }),
            Fragment::Bool(b) => {
                let mut body = Map::new();
                for (key, clauses) in [
                    ("must", &b.must),
                    ("should", &b.should),
                    ("must_not", &b.must_not),
                    ("filter", &b.filter),
                ] {
                    if !clauses.is_empty() {
                        let rendered: Vec<Value> = clauses.iter().map(Fragment::to_json).collect();
                        body.insert(key.to_string(), Value::Array(rendered));
                    }
                }
                json!({ "bool": body })
            }
        }
    }
}

impl BitAnd for Fragment {
    type Output = Fragment;

    fn bitand(self, rhs: Fragment) -> Fragment {
        self.and(rhs)
    }
}

impl BitOr for Fragment {
    type Output = Fragment;

    fn bitor(self, rhs: Fragment) -> Fragment {
        self.or(rhs)
    }
}

impl Not for Fragment {
    type Output = Fragment;

    fn not(self) -> Fragment {
        self.negate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn title(q: &str) -> Fragment {
        Fragment::match_value("title", q)
    }

    #[test]
    fn test_and_flattens_must_clauses() {
        let combined = title("a") & title("b") & title("c");
        match combined {
            Fragment::Bool(b) => {
                assert_eq!(b.must, vec![title("a"), title("b"), title("c")]);
                assert!(b.should.is_empty());
            }
            other => panic!("expected bool, got {:?}", other),
        }
    }

    #[test]
    fn test_and_not_keeps_must_not() {
        let combined = title("a") & !title("b");
        match combined {
            Fragment::Bool(b) => {
                assert_eq!(b.must, vec![title("a")]);
                assert_eq!(b.must_not, vec![title("b")]);
            }
            other => panic!("expected bool, got {:?}", other),
        }
    }

    #[test]
    fn test_or_flattens_should_clauses() {
        let combined = title("a") | title("b") | title("c");
        match combined {
            Fragment::Bool(b) => {
                assert_eq!(b.should.len(), 3);
                assert!(b.must.is_empty());
            }
            other => panic!("expected bool, got {:?}", other),
        }
    }

    #[test]
    fn test_and_does_not_merge_into_should() {
        let either = title("a") | title("b");
        let combined = either.clone() & title("c");
        match combined {
            Fragment::Bool(b) => {
                assert_eq!(b.must, vec![either, title("c")]);
                assert!(b.should.is_empty());
            }
            other => panic!("expected bool, got {:?}", other),
        }
    }

    #[test]
    fn test_match_all_is_identity_for_and() {
        assert_eq!(Fragment::MatchAll & title("a"), title("a"));
        assert_eq!(title("a") & Fragment::MatchAll, title("a"));
    }

    #[test]
    fn test_render_match_and_wildcard() {
        let rendered = Fragment::matching("title", "muon decay", QueryOperator::And).to_json();
        assert_eq!(
            rendered,
            json!({ "match": { "title": { "query": "muon decay", "operator": "and" } } })
        );

        let rendered = Fragment::wildcard("title", "mu*").to_json();
        assert_eq!(rendered, json!({ "wildcard": { "title": { "value": "mu*" } } }));
    }

    #[test]
    fn test_render_nested_bool() {
        let fragment = Fragment::nested("authors", Fragment::terms("authors.orcid", ["0000"]));
        assert_eq!(
            fragment.to_json(),
            json!({
                "nested": {
                    "path": "authors",
                    "score_mode": "sum",
                    "query": { "terms": { "authors.orcid": ["0000"] } }
                }
            })
        );

        let rendered = (title("a") & !title("b")).to_json();
        assert_eq!(rendered["bool"]["must"].as_array().unwrap().len(), 1);
        assert_eq!(rendered["bool"]["must_not"].as_array().unwrap().len(), 1);
        assert!(rendered["bool"].get("should").is_none());
    }

    #[test]
    fn test_render_range_omits_open_bounds() {
        let fragment = Fragment::range("submitted_date_all", Some("2020-01-01".to_string()), None);
        assert_eq!(
            fragment.to_json(),
            json!({ "range": { "submitted_date_all": { "gte": "2020-01-01" } } })
        );
    }
}
