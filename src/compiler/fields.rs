//! Per-field query construction.

use super::authors::{author_id_query, author_query, orcid_query};
use super::fragment::{Fragment, QueryOperator};
use super::terms::{
    classify_wildcard, decode_date_partial, is_literal, is_tex, strip_single_characters,
    strip_tex, tex_spans,
};
use super::QueryError;
use crate::models::Field;

/// Fields searched by an all-fields query, besides authors and paper IDs
const ALL_FIELDS_TEXT: [&str; 8] = [
    "title",
    "abstract",
    "comments",
    "journal_ref",
    "acm_class",
    "msc_class",
    "report_num",
    "doi",
];

/// TeX-indexed companion of a text field
fn tex_field(field: &str) -> Option<&'static str> {
    match field {
        "title" => Some("title_tex"),
        "abstract" => Some("abstract_tex"),
        _ => None,
    }
}

/// Build the query for one field and term.
///
/// `operator` controls how tokens within the field combine; it has no effect
/// on wildcard queries.
pub fn field_query(field: Field, term: &str, operator: QueryOperator) -> Result<Fragment, QueryError> {
    tracing::debug!("{} query for {}", field, term);
    match field {
        Field::Author => {
            // Leading wildcards are rejected here too, before any query-string escaping.
            classify_wildcard(term)?;
            Ok(author_query(term, operator))
        }
        Field::AuthorId => Ok(author_id_query(term, operator)),
        Field::Orcid => Ok(orcid_query(term, operator)),
        Field::PaperId => paper_id_query(term, operator),
        Field::All => all_fields_query(term),
        Field::Title
        | Field::Abstract
        | Field::Comments
        | Field::JournalRef
        | Field::AcmClass
        | Field::MscClass
        | Field::ReportNum
        | Field::Doi => text_query(field.as_str(), term, operator),
    }
}

/// Query a text field, routing TeX, wildcard, literal and plain terms.
///
/// TeX spans are handled first; whatever text remains goes through wildcard
/// and literal detection.
pub fn text_query(field: &str, term: &str, operator: QueryOperator) -> Result<Fragment, QueryError> {
    if let Some(tex) = tex_field(field).filter(|_| is_tex(term)) {
        let tex_query = Fragment::match_value(tex, tex_spans(term).join(" "));
        let remainder = strip_tex(term);
        if remainder.is_empty() {
            return Ok(tex_query);
        }
        return Ok(tex_query & plain_query(field, &remainder, operator)?);
    }
    plain_query(field, term, operator)
}

fn plain_query(field: &str, term: &str, operator: QueryOperator) -> Result<Fragment, QueryError> {
    let (rewritten, wildcard) = classify_wildcard(term)?;
    if wildcard {
        return Ok(Fragment::wildcard(field, rewritten.to_lowercase()));
    }
    if is_literal(term) {
        let phrase = term.replace('"', " ");
        let phrase = phrase.split_whitespace().collect::<Vec<_>>().join(" ");
        return Ok(Fragment::phrase(field, phrase));
    }
    Ok(Fragment::matching(field, term, operator))
}

fn paper_id_query(term: &str, operator: QueryOperator) -> Result<Fragment, QueryError> {
    Ok(plain_query("paper_id", term, operator)? | plain_query("paper_id_v", term, operator)?)
}

/// Search every field at once.
///
/// A four-digit identifier date partial in the term also matches the
/// announcement month. Single characters are dropped from the rest, since
/// they match almost everything.
fn all_fields_query(term: &str) -> Result<Fragment, QueryError> {
    // TeX is only indexed for title and abstract.
    if is_tex(term) {
        return Ok(text_query("title", term, QueryOperator::Or)?
            | text_query("abstract", term, QueryOperator::Or)?);
    }

    let (date_query, remainder) = match decode_date_partial(term) {
        Ok((year_month, remainder)) => (
            Some(Fragment::match_value("announced_date_first", year_month)),
            remainder,
        ),
        Err(_) => (None, term.to_string()),
    };

    let stripped = strip_single_characters(&remainder);
    let remainder = if stripped.is_empty() { remainder } else { stripped };
    if remainder.is_empty() {
        return date_query.ok_or_else(|| QueryError::InvalidQuery("empty search term".to_string()));
    }

    let operator = QueryOperator::Or;
    let mut queries = Vec::with_capacity(ALL_FIELDS_TEXT.len() + 3);
    queries.extend(date_query);
    queries.push(paper_id_query(&remainder, operator)?);
    classify_wildcard(&remainder)?;
    queries.push(author_query(&remainder, operator));
    for field in ALL_FIELDS_TEXT {
        queries.push(plain_query(field, &remainder, operator)?);
    }

    Ok(queries
        .into_iter()
        .reduce(|acc, q| acc | q)
        .unwrap_or(Fragment::MatchAll))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::fragment::{BoolFragment, MatchKind};

    #[test]
    fn test_plain_title_query() {
        let q = field_query(Field::Title, "muon decay", QueryOperator::And).unwrap();
        assert_eq!(q, Fragment::matching("title", "muon decay", QueryOperator::And));
    }

    #[test]
    fn test_wildcard_title_query_is_lowercased() {
        let q = field_query(Field::Title, "Foo t*", QueryOperator::And).unwrap();
        assert_eq!(q, Fragment::wildcard("title", "foo t*"));
    }

    #[test]
    fn test_literal_title_query_is_phrase() {
        let q = field_query(Field::Title, r#""Foo t*""#, QueryOperator::And).unwrap();
        assert_eq!(q, Fragment::phrase("title", "Foo t*"));
    }

    #[test]
    fn test_mixed_literal_and_wildcard_is_wildcard() {
        let q = field_query(Field::Abstract, r#""Fo?" s* "yes*" o?"#, QueryOperator::Or).unwrap();
        assert_eq!(q, Fragment::wildcard("abstract", r#""fo\?" s* "yes\*" o?"#));
    }

    #[test]
    fn test_leading_wildcard_is_invalid() {
        for field in [Field::Title, Field::Author, Field::All, Field::PaperId] {
            assert!(matches!(
                field_query(field, "*nope", QueryOperator::And),
                Err(QueryError::InvalidQuery(_))
            ));
        }
    }

    #[test]
    fn test_tex_title_query() {
        let q = field_query(Field::Title, r"$\alpha$", QueryOperator::And).unwrap();
        assert_eq!(q, Fragment::match_value("title_tex", r"\alpha"));
    }

    #[test]
    fn test_tex_takes_precedence_over_wildcard() {
        // TeX spans are stripped first; the wildcard is evaluated on the rest.
        let q = field_query(Field::Title, r"$x^*$ bos*", QueryOperator::And).unwrap();
        assert_eq!(
            q,
            Fragment::match_value("title_tex", "x^*") & Fragment::wildcard("title", "bos*")
        );

        let q = field_query(Field::Title, r"$x^*$ boson", QueryOperator::And).unwrap();
        assert_eq!(
            q,
            Fragment::match_value("title_tex", "x^*")
                & Fragment::matching("title", "boson", QueryOperator::And)
        );
    }

    #[test]
    fn test_tex_ignored_for_fields_without_tex_index() {
        let q = field_query(Field::Comments, r"$x$", QueryOperator::And).unwrap();
        assert_eq!(q, Fragment::matching("comments", "$x$", QueryOperator::And));
    }

    #[test]
    fn test_paper_id_query() {
        let q = field_query(Field::PaperId, "1902.01234", QueryOperator::And).unwrap();
        match q {
            Fragment::Bool(BoolFragment { should, .. }) => {
                assert_eq!(should.len(), 2);
                assert_eq!(
                    should[1],
                    Fragment::matching("paper_id_v", "1902.01234", QueryOperator::And)
                );
            }
            other => panic!("expected bool, got {:?}", other),
        }
    }

    #[test]
    fn test_all_fields_with_date_partial() {
        let q = field_query(Field::All, "hawking 9505", QueryOperator::And).unwrap();
        match q {
            Fragment::Bool(BoolFragment { should, must, .. }) => {
                assert!(must.is_empty());
                assert_eq!(
                    should[0],
                    Fragment::match_value("announced_date_first", "1995-05")
                );
                assert!(should.contains(&Fragment::matching(
                    "title",
                    "hawking",
                    QueryOperator::Or
                )));
            }
            other => panic!("expected bool, got {:?}", other),
        }
    }

    #[test]
    fn test_all_fields_date_partial_only() {
        let q = field_query(Field::All, "1902", QueryOperator::And).unwrap();
        assert_eq!(q, Fragment::match_value("announced_date_first", "2019-02"));
    }

    #[test]
    fn test_all_fields_drops_single_characters() {
        let q = field_query(Field::All, "s hawking", QueryOperator::And).unwrap();
        let rendered = q.to_json();
        assert_eq!(
            rendered["bool"]["should"][0]["match"]["paper_id"]["query"],
            "hawking"
        );
        assert_eq!(
            rendered["bool"]["should"][1]["match"]["paper_id_v"]["query"],
            "hawking"
        );
    }

    #[test]
    fn test_all_fields_tex() {
        let q = field_query(Field::All, r"$\beta$", QueryOperator::And).unwrap();
        match q {
            Fragment::Bool(BoolFragment { should, .. }) => {
                assert_eq!(should.len(), 2);
                assert!(matches!(&should[1], Fragment::Match(m)
                    if m.field == "abstract_tex" && m.kind == MatchKind::Match));
            }
            other => panic!("expected bool, got {:?}", other),
        }
    }
}
