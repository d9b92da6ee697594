//! Search results types.

use folio_core::types::{DocName, DocRef, DocType};
use std::ops::Index;

/// One row of the global search table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchIndexEntry {
    pub doctype: DocType,
    pub name: DocName,
    pub content: String,
}

impl SearchIndexEntry {
    pub fn doc_ref(&self) -> DocRef {
        DocRef {
            doctype: self.doctype.clone(),
            name: self.name.clone(),
        }
    }
}

/// Matched entries, best match first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchResults {
    pub(crate) entries: Vec<SearchIndexEntry>,
}

impl SearchResults {
    pub fn iter(&self) -> impl Iterator<Item = &SearchIndexEntry> + '_ {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn first(&self) -> Option<&SearchIndexEntry> {
        self.entries.first()
    }

    pub fn into_vec(self) -> Vec<SearchIndexEntry> {
        self.entries
    }
}

impl Index<usize> for SearchResults {
    type Output = SearchIndexEntry;

    fn index(&self, index: usize) -> &Self::Output {
        &self.entries[index]
    }
}

impl IntoIterator for SearchResults {
    type Item = SearchIndexEntry;
    type IntoIter = std::vec::IntoIter<SearchIndexEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a SearchResults {
    type Item = &'a SearchIndexEntry;
    type IntoIter = std::slice::Iter<'a, SearchIndexEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
