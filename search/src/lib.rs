//! Folio global search.
//!
//! Mirrors the searchable fields of documents into one flat table so that
//! any document can be found by its text.
//!
//! # Design
//!
//! - One entry per document in the `__global_search` redb table, keyed by
//!   (doctype, name), holding `"{label} : {value}"` parts joined by `|||`.
//! - [`GlobalSearch`] is a [`folio_core::DocumentObserver`]: entries are
//!   written in the same transaction as the document save or delete.
//! - Child table rows contribute the searchable fields of their child doctype.
//! - Field configuration is derived from doctype meta and cached per
//!   doctype; [`GlobalSearch::rebuild_for_doctype`] re-derives it and
//!   re-indexes every document of the type.
//! - Queries scan the table and score content with nucleo's substring or
//!   fuzzy matcher.

mod config;
mod content;
mod engine;
mod error;
mod query;
mod results;

pub use config::{CaseMatching, MatchKind, SearchConfig};
pub use content::{FIELD_SEPARATOR, SearchableFields, strip_html};
pub use engine::{GLOBAL_SEARCH_TABLE_NAME, GlobalSearch};
pub use error::SearchError;
pub use query::SearchQuery;
pub use results::{SearchIndexEntry, SearchResults};
