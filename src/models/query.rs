//! Search query models: simple and advanced queries, fielded terms, filters.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::compiler::catch_classic_author_syntax;

/// Default number of results per page
pub const DEFAULT_PAGE_SIZE: usize = 50;

/// Boolean operator joining a fielded term to the terms before it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BooleanOperator {
    And,
    Or,
    Not,
}

impl BooleanOperator {
    /// Upper-case name, as used in query text
    pub fn as_str(&self) -> &'static str {
        match self {
            BooleanOperator::And => "AND",
            BooleanOperator::Or => "OR",
            BooleanOperator::Not => "NOT",
        }
    }
}

impl fmt::Display for BooleanOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BooleanOperator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "AND" => Ok(BooleanOperator::And),
            "OR" => Ok(BooleanOperator::Or),
            "NOT" => Ok(BooleanOperator::Not),
            other => Err(format!("unknown boolean operator: {}", other)),
        }
    }
}

/// Searchable field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Title,
    Author,
    Abstract,
    Comments,
    JournalRef,
    AcmClass,
    MscClass,
    ReportNum,
    PaperId,
    Doi,
    Orcid,
    AuthorId,
    All,
}

impl Field {
    /// Every field, in form order
    pub const ALL_FIELDS: [Field; 13] = [
        Field::All,
        Field::Title,
        Field::Author,
        Field::Abstract,
        Field::Comments,
        Field::JournalRef,
        Field::AcmClass,
        Field::MscClass,
        Field::ReportNum,
        Field::PaperId,
        Field::Doi,
        Field::Orcid,
        Field::AuthorId,
    ];

    /// Field identifier, as used in requests and in the index
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Title => "title",
            Field::Author => "author",
            Field::Abstract => "abstract",
            Field::Comments => "comments",
            Field::JournalRef => "journal_ref",
            Field::AcmClass => "acm_class",
            Field::MscClass => "msc_class",
            Field::ReportNum => "report_num",
            Field::PaperId => "paper_id",
            Field::Doi => "doi",
            Field::Orcid => "orcid",
            Field::AuthorId => "author_id",
            Field::All => "all",
        }
    }

    /// Whether the classic `surname_f` author syntax is corrected for this field
    pub fn accepts_author_names(&self) -> bool {
        matches!(self, Field::Author | Field::All)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Field {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Field::ALL_FIELDS
            .iter()
            .find(|field| field.as_str() == s)
            .copied()
            .ok_or_else(|| format!("unknown search field: {}", s))
    }
}

/// A single (operator, field, value) unit of an advanced query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldedSearchTerm {
    /// Operator joining this term to the preceding ones; `None` for the first term
    pub operator: Option<BooleanOperator>,

    /// Field to search
    pub field: Field,

    /// Raw search text
    pub term: String,
}

impl FieldedSearchTerm {
    /// Create the leading term of a list
    pub fn first(field: Field, term: impl Into<String>) -> Self {
        Self {
            operator: None,
            field,
            term: term.into(),
        }
    }

    /// Create a term joined by `operator`
    pub fn new(operator: BooleanOperator, field: Field, term: impl Into<String>) -> Self {
        Self {
            operator: Some(operator),
            field,
            term: term.into(),
        }
    }
}

impl fmt::Display for FieldedSearchTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.field, self.term)
    }
}

impl FromStr for FieldedSearchTerm {
    type Err = String;

    /// Parse `field=term`, optionally preceded by an operator (`OR title=muon`)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let leading = s
            .split_once(char::is_whitespace)
            .and_then(|(head, rest)| Some((head.parse::<BooleanOperator>().ok()?, rest)));
        let (operator, rest) = match leading {
            Some((operator, rest)) => (Some(operator), rest.trim_start()),
            None => (None, s),
        };
        let (field, term) = rest
            .split_once('=')
            .ok_or_else(|| format!("expected field=term, got: {}", rest))?;
        Ok(Self {
            operator,
            field: field.trim().parse()?,
            term: term.trim().to_string(),
        })
    }
}

/// Ordered list of fielded terms
pub type FieldedSearchList = Vec<FieldedSearchTerm>;

/// An arXiv classification: group, archive and category, each optional
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    #[serde(default)]
    pub group: Option<String>,

    #[serde(default)]
    pub archive: Option<String>,

    #[serde(default)]
    pub category: Option<String>,
}

impl Classification {
    /// Classification limited to an archive
    pub fn archive(archive: impl Into<String>) -> Self {
        Self {
            archive: Some(archive.into()),
            ..Default::default()
        }
    }

    /// Whether no part of the classification is set
    pub fn is_empty(&self) -> bool {
        self.group.is_none() && self.archive.is_none() && self.category.is_none()
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<&str> = [&self.group, &self.archive, &self.category]
            .into_iter()
            .filter_map(|p| p.as_deref())
            .collect();
        f.write_str(&parts.join(":"))
    }
}

impl FromStr for Classification {
    type Err = String;

    /// Parse `group:archive:category`; empty or missing parts are unset
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split(':').map(|part| {
            let part = part.trim();
            (!part.is_empty()).then(|| part.to_string())
        });
        let classification = Self {
            group: parts.next().flatten(),
            archive: parts.next().flatten(),
            category: parts.next().flatten(),
        };
        if parts.next().is_some() {
            return Err(format!("too many classification parts: {}", s));
        }
        Ok(classification)
    }
}

/// Classifications combined with OR
pub type ClassificationList = Vec<Classification>;

/// Which indexed date a [`DateRange`] applies to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateType {
    /// Submission date of the first version
    SubmittedDateFirst,
    /// Submission date of any version
    #[default]
    SubmittedDate,
    /// Announcement date of the first version
    AnnouncedDateFirst,
}

impl DateType {
    /// Index field holding the date
    pub fn field(&self) -> &'static str {
        match self {
            DateType::SubmittedDateFirst => "submitted_date_first",
            DateType::SubmittedDate => "submitted_date_all",
            DateType::AnnouncedDateFirst => "announced_date_first",
        }
    }
}

/// Open or closed date range; start inclusive, end exclusive
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    #[serde(default)]
    pub start_date: Option<DateTime<FixedOffset>>,

    #[serde(default)]
    pub end_date: Option<DateTime<FixedOffset>>,

    #[serde(default)]
    pub date_type: DateType,
}

impl DateRange {
    /// Create a range between two optional bounds
    pub fn new(
        start_date: Option<DateTime<FixedOffset>>,
        end_date: Option<DateTime<FixedOffset>>,
    ) -> Self {
        Self {
            start_date,
            end_date,
            date_type: DateType::default(),
        }
    }

    /// Set the date field
    pub fn date_type(mut self, date_type: DateType) -> Self {
        self.date_type = date_type;
        self
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(start) = &self.start_date {
            parts.push(format!("from {}", start.format("%Y-%m-%d")));
        }
        if let Some(end) = &self.end_date {
            parts.push(format!("to {}", end.format("%Y-%m-%d")));
        }
        f.write_str(&parts.join(" "))
    }
}

/// One field, one value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimpleQuery {
    pub search_field: Field,

    pub value: String,

    /// Sort order; `None` means announcement date, newest first
    pub order: Option<String>,

    pub page_size: usize,

    pub page_start: usize,

    /// Search superseded versions as well as the current one
    pub include_older_versions: bool,

    /// If provided, results are limited to these archives
    pub archives: Vec<String>,

    /// Whether `value` was rewritten from the classic `surname_f` author syntax
    pub classic_author_syntax: bool,
}

impl SimpleQuery {
    /// Create a simple query, correcting classic author syntax where it applies
    pub fn new(search_field: Field, value: impl Into<String>) -> Self {
        let value = value.into();
        let (value, classic_author_syntax) = if search_field.accepts_author_names() {
            catch_classic_author_syntax(&value)
        } else {
            (value, false)
        };
        Self {
            search_field,
            value,
            order: None,
            page_size: DEFAULT_PAGE_SIZE,
            page_start: 0,
            include_older_versions: false,
            archives: Vec::new(),
            classic_author_syntax,
        }
    }

    /// Set the sort order
    pub fn order(mut self, order: impl Into<String>) -> Self {
        self.order = Some(order.into());
        self
    }

    /// Set the page size
    pub fn page_size(mut self, size: usize) -> Self {
        self.page_size = size;
        self
    }

    /// Set the offset of the first result
    pub fn page_start(mut self, start: usize) -> Self {
        self.page_start = start;
        self
    }

    /// Restrict results to an archive
    pub fn archive(mut self, archive: impl Into<String>) -> Self {
        self.archives.push(archive.into());
        self
    }

    /// Include superseded versions
    pub fn include_older_versions(mut self, include: bool) -> Self {
        self.include_older_versions = include;
        self
    }
}

/// Fielded boolean query with classification and date filters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvancedQuery {
    pub terms: FieldedSearchList,

    #[serde(default)]
    pub primary_classification: ClassificationList,

    /// Also match papers cross-listed into the classifications
    #[serde(default)]
    pub include_cross_list: bool,

    #[serde(default)]
    pub date_range: Option<DateRange>,

    #[serde(default)]
    pub order: Option<String>,

    pub page_size: usize,

    #[serde(default)]
    pub page_start: usize,

    #[serde(default)]
    pub include_older_versions: bool,
}

impl Default for AdvancedQuery {
    fn default() -> Self {
        Self {
            terms: Vec::new(),
            primary_classification: Vec::new(),
            include_cross_list: false,
            date_range: None,
            order: None,
            page_size: DEFAULT_PAGE_SIZE,
            page_start: 0,
            include_older_versions: false,
        }
    }
}

impl AdvancedQuery {
    /// Create an advanced query over a term list
    pub fn new(terms: FieldedSearchList) -> Self {
        Self {
            terms,
            ..Default::default()
        }
    }

    /// Add a primary classification filter
    pub fn classification(mut self, classification: Classification) -> Self {
        self.primary_classification.push(classification);
        self
    }

    /// Set whether cross-listed papers match classification filters
    pub fn include_cross_list(mut self, include: bool) -> Self {
        self.include_cross_list = include;
        self
    }

    /// Set the date range filter
    pub fn date_range(mut self, range: DateRange) -> Self {
        self.date_range = Some(range);
        self
    }

    /// Set the sort order
    pub fn order(mut self, order: impl Into<String>) -> Self {
        self.order = Some(order.into());
        self
    }

    /// Set the page size
    pub fn page_size(mut self, size: usize) -> Self {
        self.page_size = size;
        self
    }

    /// Set the offset of the first result
    pub fn page_start(mut self, start: usize) -> Self {
        self.page_start = start;
        self
    }
}

/// A search query originating from the UI or API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Query {
    Simple(SimpleQuery),
    Advanced(AdvancedQuery),
}

impl Query {
    /// Requested sort order
    pub fn order(&self) -> Option<&str> {
        match self {
            Query::Simple(q) => q.order.as_deref(),
            Query::Advanced(q) => q.order.as_deref(),
        }
    }

    pub fn page_size(&self) -> usize {
        match self {
            Query::Simple(q) => q.page_size,
            Query::Advanced(q) => q.page_size,
        }
    }

    pub fn page_start(&self) -> usize {
        match self {
            Query::Simple(q) => q.page_start,
            Query::Advanced(q) => q.page_start,
        }
    }

    /// Offset just past the last result of the page
    pub fn page_end(&self) -> usize {
        self.page_start().saturating_add(self.page_size())
    }

    /// 1-based page number containing `page_start`
    pub fn page(&self) -> usize {
        (self.page_start() / self.page_size().max(1)).saturating_add(1)
    }

    /// Whether superseded versions are searched
    pub fn include_older_versions(&self) -> bool {
        match self {
            Query::Simple(q) => q.include_older_versions,
            Query::Advanced(q) => q.include_older_versions,
        }
    }
}

impl From<SimpleQuery> for Query {
    fn from(query: SimpleQuery) -> Self {
        Query::Simple(query)
    }
}

impl From<AdvancedQuery> for Query {
    fn from(query: AdvancedQuery) -> Self {
        Query::Advanced(query)
    }
}
