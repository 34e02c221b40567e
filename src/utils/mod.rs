//! Utility modules.
//!
//! - [`parse_arxiv_id`]: Check and normalize an arXiv identifier before lookup
//! - [`ValidationError`]: Errors raised by identifier validation
//!
//! ```rust
//! use scholar_query::utils::parse_arxiv_id;
//!
//! let id = parse_arxiv_id("arXiv:1902.01234v2").unwrap();
//! assert_eq!(id.paper_id, "1902.01234");
//! assert_eq!(id.version, Some(2));
//! ```

mod validate;

pub use validate::{parse_arxiv_id, ArxivId, ValidationError};
