//! Search query types.

use crate::config::MatchKind;
use folio_core::types::DocType;

/// A global search request.
///
/// Built from plain text with the builder methods narrowing it down:
///
/// ```
/// use folio_search::SearchQuery;
///
/// let query = SearchQuery::new("awakens").start(20).limit(10);
/// assert_eq!(query.text, "awakens");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    pub text: String,
    /// Overrides the configured match kind.
    pub kind: Option<MatchKind>,
    /// Only entries of this doctype.
    pub doctype: Option<DocType>,
    pub start: usize,
    /// Overrides the configured result limit.
    pub limit: Option<usize>,
}

impl SearchQuery {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: None,
            doctype: None,
            start: 0,
            limit: None,
        }
    }

    pub fn fuzzy(text: impl Into<String>) -> Self {
        Self::new(text).kind(MatchKind::Fuzzy)
    }

    pub fn kind(mut self, kind: MatchKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn in_doctype(mut self, doctype: DocType) -> Self {
        self.doctype = Some(doctype);
        self
    }

    pub fn start(mut self, start: usize) -> Self {
        self.start = start;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// True for queries that cannot match anything.
    pub(crate) fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

impl From<&str> for SearchQuery {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for SearchQuery {
    fn from(text: String) -> Self {
        Self::new(text)
    }
}
