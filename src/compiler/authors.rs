//! Query builders for author names, author IDs and ORCIDs.

use regex::Regex;
use std::sync::OnceLock;

use super::fragment::{Fragment, MultiMatchFragment, QueryOperator, QueryStringFragment};
use super::terms::{escape_special, string_literal};

/// Author paths searched for names
const AUTHOR_PATHS: [&str; 2] = ["authors", "owners"];

static CLASSIC_AUTHOR: OnceLock<Regex> = OnceLock::new();

/// `surname_f` tokens from the classic author syntax
fn classic_author() -> &'static Regex {
    CLASSIC_AUTHOR.get_or_init(|| {
        Regex::new(r"([A-Za-z]+)_([A-Za-z])(\s+|$)").expect("static pattern is valid")
    })
}

/// Rewrite classic `surname_f` author syntax as `surname, f`.
///
/// Several authors are separated with `;`. Returns the rewritten term and
/// whether anything was rewritten.
pub fn catch_classic_author_syntax(term: &str) -> (String, bool) {
    if !classic_author().is_match(term) {
        return (term.to_string(), false);
    }
    let rewritten = classic_author().replace_all(term, "$1, $2;$3");
    (rewritten.trim_end().trim_end_matches(';').to_string(), true)
}

fn query_string(fields: Vec<String>, query: String, operator: QueryOperator) -> QueryStringFragment {
    QueryStringFragment {
        fields,
        query,
        default_operator: operator,
        cross_fields: false,
        auto_generate_phrase_queries: false,
    }
}

fn has_wildcard(term: &str) -> bool {
    (term.contains('*') || term.contains('?')) && !(term.starts_with('*') || term.starts_with('?'))
}

/// Match one author at `path` by name parts.
///
/// Text before the first comma is the surname; the rest is the forename or
/// its initials. Without a comma, all parts match across the name fields of
/// a single author.
pub fn part_query(term: &str, path: &str) -> Fragment {
    let term = term.trim();
    tracing::debug!("{} part query for {}", path, term);

    let query = match term.split_once(',') {
        Some((surname, forename)) => {
            let surname = surname.trim();
            let forename = forename.replace(',', " ");
            let forename = forename.trim();

            let q_surname = Fragment::QueryString(query_string(
                vec![format!("{}.last_name", path)],
                escape_special(surname, false),
                QueryOperator::And,
            ));

            if forename.is_empty() {
                q_surname
            } else {
                let q_forename = if has_wildcard(forename) {
                    let mut q = query_string(
                        vec![format!("{}.first_name", path)],
                        escape_special(forename, false),
                        QueryOperator::And,
                    );
                    q.auto_generate_phrase_queries = true;
                    Fragment::QueryString(q)
                } else {
                    Fragment::phrase_prefix(format!("{}.first_name", path), forename)
                };
                let q_forename =
                    q_forename | Fragment::phrase_prefix(format!("{}.initials", path), forename);
                q_surname & q_forename
            }
        }
        None => {
            let mut q = query_string(
                vec![
                    format!("{}.full_name", path),
                    format!("{}.last_name", path),
                    format!("{}.full_name_initialized", path),
                ],
                escape_special(term, false),
                QueryOperator::And,
            );
            q.cross_fields = true;
            Fragment::QueryString(q)
        }
    };
    Fragment::nested(path, query)
}

/// Query-string match on full names within one author at `path`
pub fn string_query(term: &str, path: &str, operator: QueryOperator) -> Fragment {
    let mut q = query_string(
        vec![format!("{}.full_name", path)],
        escape_special(term, false),
        operator,
    );
    q.cross_fields = true;
    Fragment::nested(path, Fragment::QueryString(q))
}

fn combine(parts: Vec<Fragment>, operator: QueryOperator) -> Fragment {
    parts
        .into_iter()
        .reduce(|acc, part| match operator {
            QueryOperator::And => acc & part,
            QueryOperator::Or => acc | part,
        })
        .unwrap_or(Fragment::MatchAll)
}

/// Build a query on author and owner names.
///
/// Quoted parts must each match within a single author. `;` separates
/// individual authors, and a comma separates surname from forename. Anything
/// else matches across all author name fields. With [`QueryOperator::Or`]
/// only some parts need to match, as suits an all-fields search.
pub fn author_query(term: &str, operator: QueryOperator) -> Fragment {
    tracing::debug!("Author query for {}", term);
    let term = term.to_lowercase();

    let quotes = term.matches('"').count();
    if quotes > 0 && quotes % 2 == 0 {
        tracing::debug!("Contains literal: {}", term);
        let mut parts = Vec::new();
        let mut last = 0;
        for literal in string_literal().find_iter(&term) {
            parts.push(&term[last..literal.start()]);
            parts.push(literal.as_str());
            last = literal.end();
        }
        parts.push(&term[last..]);

        let queries = parts
            .into_iter()
            .filter(|part| !part.trim().is_empty())
            .map(|part| {
                string_query(part, AUTHOR_PATHS[0], operator)
                    | string_query(part, AUTHOR_PATHS[1], operator)
            })
            .collect();
        return combine(queries, operator);
    }

    let term = term.replace('"', "");

    if term.contains(';') {
        tracing::debug!("Authors are individuated: {}", term);
        let queries = term
            .split(';')
            .filter(|part| !part.trim().is_empty())
            .map(|part| part_query(part, AUTHOR_PATHS[0]) | part_query(part, AUTHOR_PATHS[1]))
            .collect();
        return combine(queries, operator);
    }

    if term.contains(',') {
        tracing::debug!("Forename is individuated: {}", term);
        return part_query(&term, AUTHOR_PATHS[0]) | part_query(&term, AUTHOR_PATHS[1]);
    }

    tracing::debug!("General author search: {}", term);
    let escaped = escape_special(&term, true);

    // Among-author matches via the combined field, within-author via nested full names.
    let combined = Fragment::QueryString(query_string(
        vec!["authors_combined".to_string()],
        escaped.clone(),
        QueryOperator::And,
    ));
    let within = AUTHOR_PATHS.iter().map(|path| {
        Fragment::nested(
            *path,
            Fragment::QueryString(query_string(
                vec![format!("{}.full_name", path)],
                escaped.clone(),
                operator,
            )),
        )
    });
    within.fold(combined, |acc, q| acc | q)
}

fn identifier_query(kind: &str, term: &str, operator: QueryOperator) -> Fragment {
    match operator {
        QueryOperator::Or => {
            let values: Vec<&str> = term.split_whitespace().collect();
            Fragment::nested("authors", Fragment::terms(format!("authors.{}", kind), values.clone()))
                | Fragment::nested(
                    "owners",
                    Fragment::terms(format!("owners.{}", kind), values.clone()),
                )
                | Fragment::terms(format!("submitter.{}", kind), values)
        }
        QueryOperator::And => Fragment::MultiMatch(MultiMatchFragment {
            fields: ["authors", "owners", "submitter"]
                .iter()
                .map(|path| format!("{}.{}", path, kind))
                .collect(),
            query: term.to_string(),
            operator,
        }),
    }
}

/// Query on author, owner and submitter author IDs
pub fn author_id_query(term: &str, operator: QueryOperator) -> Fragment {
    identifier_query("author_id", term, operator)
}

/// Query on author, owner and submitter ORCID iDs
pub fn orcid_query(term: &str, operator: QueryOperator) -> Fragment {
    identifier_query("orcid", term, operator)
}
