//! Identifier validation for document lookups.
//!
//! Identifiers are checked before they reach a backend so that malformed or
//! hostile input fails early with a [`ValidationError`].

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;
use thiserror::Error;

/// Validation error types
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid paper ID: {0}")]
    InvalidPaperId(String),

    #[error("Identifier contains disallowed characters: {0}")]
    DisallowedCharacters(String),
}

static NEW_STYLE: OnceLock<Regex> = OnceLock::new();
static OLD_STYLE: OnceLock<Regex> = OnceLock::new();

/// `YYMM.NNNN` (before 2015) or `YYMM.NNNNN`, with optional version
fn new_style() -> &'static Regex {
    NEW_STYLE.get_or_init(|| {
        Regex::new(r"^([0-9]{2}(?:0[1-9]|1[0-2])\.[0-9]{4,5})(?:v([0-9]+))?$")
            .expect("static pattern is valid")
    })
}

/// `archive[.XX]/YYMMNNN`, with optional version
fn old_style() -> &'static Regex {
    OLD_STYLE.get_or_init(|| {
        Regex::new(r"^([a-z][a-z-]*(?:\.[A-Za-z]{2})?/[0-9]{2}(?:0[1-9]|1[0-2])[0-9]{3})(?:v([0-9]+))?$")
            .expect("static pattern is valid")
    })
}

/// A well-formed arXiv identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArxivId {
    /// Identifier without version
    pub paper_id: String,

    /// Explicit version, if one was given
    pub version: Option<u32>,
}

impl ArxivId {
    /// Identifier as given, with version when present
    pub fn versioned(&self) -> String {
        match self.version {
            Some(version) => format!("{}v{}", self.paper_id, version),
            None => self.paper_id.clone(),
        }
    }
}

impl fmt::Display for ArxivId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.versioned())
    }
}

/// Parse an arXiv identifier.
///
/// Accepts new-style (`1902.01234`) and old-style (`hep-th/9901001`) IDs,
/// each with an optional version suffix, an optional `arXiv:` prefix, or as
/// an `/abs/` URL.
pub fn parse_arxiv_id(id: &str) -> Result<ArxivId, ValidationError> {
    let id = id.trim();
    if id.is_empty() {
        return Err(ValidationError::InvalidPaperId("empty ID".to_string()));
    }

    if id.chars().any(|ch| ch.is_control() || ch.is_whitespace())
        || id.contains("..")
        || [';', '|', '&', '$', '`', '*', '?', '<', '>'].iter().any(|ch| id.contains(*ch))
    {
        return Err(ValidationError::DisallowedCharacters(id.to_string()));
    }

    // Remove URL if present
    let id = match id.find("/abs/") {
        Some(pos) => id[pos + 5..].trim_end_matches('/'),
        None => id,
    };
    let id = id
        .strip_prefix("arXiv:")
        .or_else(|| id.strip_prefix("arxiv:"))
        .unwrap_or(id);

    let captures = new_style()
        .captures(id)
        .or_else(|| old_style().captures(id))
        .ok_or_else(|| ValidationError::InvalidPaperId(id.to_string()))?;

    let paper_id = captures
        .get(1)
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| ValidationError::InvalidPaperId(id.to_string()))?;
    let version = match captures.get(2) {
        Some(v) => Some(
            v.as_str()
                .parse()
                .map_err(|_| ValidationError::InvalidPaperId(id.to_string()))?,
        ),
        None => None,
    };
    Ok(ArxivId { paper_id, version })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_new_style() {
        let id = parse_arxiv_id("1902.01234").unwrap();
        assert_eq!(id.paper_id, "1902.01234");
        assert_eq!(id.version, None);

        let id = parse_arxiv_id("0704.0001v2").unwrap();
        assert_eq!(id.paper_id, "0704.0001");
        assert_eq!(id.version, Some(2));
        assert_eq!(id.to_string(), "0704.0001v2");
    }

    #[test]
    fn test_parse_old_style() {
        let id = parse_arxiv_id("hep-th/9901001v3").unwrap();
        assert_eq!(id.paper_id, "hep-th/9901001");
        assert_eq!(id.version, Some(3));

        assert_eq!(
            parse_arxiv_id("math.AG/0601001").unwrap().paper_id,
            "math.AG/0601001"
        );
    }

    #[test]
    fn test_parse_prefix_and_url() {
        assert_eq!(
            parse_arxiv_id("arXiv:1902.01234").unwrap().paper_id,
            "1902.01234"
        );
        let id = parse_arxiv_id("https://arxiv.org/abs/1902.01234v1").unwrap();
        assert_eq!(id.versioned(), "1902.01234v1");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(parse_arxiv_id("").is_err());
        assert!(parse_arxiv_id("   ").is_err());
        assert!(parse_arxiv_id("1913.01234").is_err()); // month 13
        assert!(parse_arxiv_id("1902.123").is_err());
        assert!(parse_arxiv_id("not-an-id").is_err());
    }

    #[test]
    fn test_parse_rejects_dangerous_characters() {
        assert!(matches!(
            parse_arxiv_id("1902.01234;rm"),
            Err(ValidationError::DisallowedCharacters(_))
        ));
        assert!(matches!(
            parse_arxiv_id("../etc/passwd"),
            Err(ValidationError::DisallowedCharacters(_))
        ));
    }
}
