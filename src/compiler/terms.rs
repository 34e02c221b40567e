//! Text-level helpers for search terms: literals, wildcards, TeX, escaping, date partials.

use regex::Regex;
use std::sync::OnceLock;

use super::{NoDatePartial, QueryError};

/// Characters with meaning in the backend's query-string grammar.
///
/// `&` and `|` are only significant when doubled, and are handled separately.
const SPECIAL_CHARACTERS: [char; 17] = [
    '+', '=', '>', '<', '!', '(', ')', '{', '}', '[', ']', '^', '~', ':', '\\', '/', '-',
];

static STRING_LITERAL: OnceLock<Regex> = OnceLock::new();
static TEXISM: OnceLock<Regex> = OnceLock::new();
static DATE_PARTIAL: OnceLock<Regex> = OnceLock::new();

fn compiled(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("static pattern is valid"))
}

/// Quoted substrings in a search term
pub(crate) fn string_literal() -> &'static Regex {
    compiled(&STRING_LITERAL, r#""[^"]*""#)
}

fn texism() -> &'static Regex {
    compiled(&TEXISM, r"\$[^$]+\$")
}

/// Two-digit year and month of an identifier, bounded by whitespace or string edges
fn date_partial() -> &'static Regex {
    compiled(
        &DATE_PARTIAL,
        r"(?:^|\s)([0-9]{2})(0[1-9]|1[0-2])(?:$|\s)",
    )
}

/// Escape wildcards inside quoted literals and report whether any remain outside them.
///
/// A term may not start with a wildcard: backends cannot evaluate a leading
/// wildcard efficiently, so it is rejected with [`QueryError::InvalidQuery`].
///
/// ```
/// use scholar_query::compiler::classify_wildcard;
///
/// let (text, wildcard) = classify_wildcard(r#""Foo t*""#).unwrap();
/// assert_eq!(text, r#""Foo t\*""#);
/// assert!(!wildcard);
/// ```
pub fn classify_wildcard(text: &str) -> Result<(String, bool), QueryError> {
    if text.starts_with('*') || text.starts_with('?') {
        return Err(QueryError::InvalidQuery(
            "Query cannot start with a wildcard".to_string(),
        ));
    }

    let mut rewritten = String::with_capacity(text.len() + 4);
    let mut last = 0;
    for literal in string_literal().find_iter(text) {
        rewritten.push_str(&text[last..literal.start()]);
        rewritten.push_str(&literal.as_str().replace('*', r"\*").replace('?', r"\?"));
        last = literal.end();
    }
    rewritten.push_str(&text[last..]);

    let wildcard = has_unescaped_wildcard(&rewritten);
    Ok((rewritten, wildcard))
}

fn has_unescaped_wildcard(text: &str) -> bool {
    let mut previous = None;
    for ch in text.chars() {
        if (ch == '*' || ch == '?') && previous != Some('\\') {
            return true;
        }
        previous = Some(ch);
    }
    false
}

/// Whether the term is meant as a quoted phrase
pub fn is_literal(text: &str) -> bool {
    text.contains('"')
}

/// Whether the term contains a `$...$` TeX span
pub fn is_tex(text: &str) -> bool {
    texism().is_match(text)
}

/// Remove TeX spans (delimiters included) from a term
pub fn strip_tex(text: &str) -> String {
    texism().replace_all(text, "").trim().to_string()
}

/// Contents of the TeX spans in a term, without delimiters
pub fn tex_spans(text: &str) -> Vec<&str> {
    texism()
        .find_iter(text)
        .map(|span| span.as_str().trim_matches('$'))
        .collect()
}

/// Backslash-escape characters that are special to the query-string grammar.
///
/// Double quotes are escaped as well when `quote_sensitive` is set.
pub fn escape_special(text: &str, quote_sensitive: bool) -> String {
    let mut escaped = String::with_capacity(text.len() * 2);
    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        if (ch == '&' || ch == '|') && chars.peek() == Some(&ch) {
            chars.next();
            escaped.push('\\');
            escaped.push(ch);
            escaped.push('\\');
            escaped.push(ch);
            continue;
        }
        if SPECIAL_CHARACTERS.contains(&ch) || (quote_sensitive && ch == '"') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// Drop tokens that are at most one character long once punctuation is removed
pub fn strip_single_characters(text: &str) -> String {
    text.split_whitespace()
        .filter(|token| token.chars().filter(|c| !c.is_ascii_punctuation()).count() > 1)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Find a four-digit identifier date partial (`YYMM`) in a term.
///
/// Returns the date in `YYYY-MM` form and the rest of the term. Two-digit
/// years of 91 and above belong to the 1900s; this holds until 2091.
pub fn decode_date_partial(text: &str) -> Result<(String, String), NoDatePartial> {
    let captures = date_partial().captures(text).ok_or(NoDatePartial)?;
    let (Some(run), Some(year), Some(month)) = (captures.get(0), captures.get(1), captures.get(2))
    else {
        return Err(NoDatePartial);
    };

    let year = year.as_str();
    let two_digit: u32 = year.parse().map_err(|_| NoDatePartial)?;
    let century = if two_digit >= 91 { 19 } else { 20 };
    let year_month = format!("{}{}-{}", century, year, month.as_str());

    let remainder = format!("{} {}", &text[..run.start()], &text[run.end()..]);
    let remainder = remainder.split_whitespace().collect::<Vec<_>>().join(" ");
    Ok((year_month, remainder))
}
