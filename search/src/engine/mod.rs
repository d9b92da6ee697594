mod index;
mod matcher;

use crate::config::SearchConfig;
use crate::content::SearchableFields;
use crate::error::SearchError;
use crate::query::SearchQuery;
use crate::results::{SearchIndexEntry, SearchResults};
use folio_core::types::{DocName, DocRef, DocType, Document};
use folio_core::{DocumentObserver, FolioCore, MetaSource, ObserverError};
use log::{debug, info};
use matcher::ContentMatcher;
use parking_lot::RwLock;
use redb::{ReadableDatabase, WriteTransaction};
use std::cmp::Reverse;
use std::collections::HashMap;
use std::sync::Arc;

pub use index::GLOBAL_SEARCH_TABLE_NAME;

/// Maintains the `__global_search` table and answers queries against it.
///
/// Register it with [`FolioCore::subscribe`] so inserts, saves and deletes
/// keep the table current. Configuration changes only reach existing
/// entries through [`GlobalSearch::rebuild_for_doctype`].
pub struct GlobalSearch {
    db: Arc<redb::Database>,
    config: SearchConfig,
    searchable: RwLock<HashMap<DocType, Arc<SearchableFields>>>,
}

impl GlobalSearch {
    pub fn new(core: &FolioCore, config: SearchConfig) -> Self {
        Self {
            db: core.database(),
            config,
            searchable: RwLock::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Creates the index table if it doesn't exist. Idempotent.
    pub fn setup(&self) -> Result<(), SearchError> {
        let txn = self.db.begin_write()?;
        index::init(&txn)?;
        txn.commit()?;
        info!("global search table ready");
        Ok(())
    }

    /// Deletes every entry and forgets all derived field configuration.
    /// Returns how many entries were deleted.
    pub fn reset(&self) -> Result<u64, SearchError> {
        let txn = self.db.begin_write()?;
        let cleared = index::clear(&txn)?;
        txn.commit()?;

        self.searchable.write().clear();
        info!("global search reset, {cleared} entries cleared");
        Ok(cleared)
    }
}

/// Index maintenance.
impl GlobalSearch {
    /// Recomputes the entry of `document` inside `txn`.
    ///
    /// Returns `true` if an entry was written. A document without
    /// searchable content has its entry removed instead.
    pub fn index(
        &self,
        txn: &WriteTransaction,
        document: &Document,
        metas: &dyn MetaSource,
    ) -> Result<bool, SearchError> {
        let fields = self.searchable_fields(&document.doctype, metas)?;

        match fields.content(document) {
            Some(content) => {
                index::upsert(txn, &document.doctype, &document.name, &content)?;
                debug!("indexed {} {}", document.doctype, document.name);
                Ok(true)
            }
            None => {
                if index::remove(txn, &document.doctype, &document.name)? {
                    debug!("dropped empty entry {} {}", document.doctype, document.name);
                }
                Ok(false)
            }
        }
    }

    /// Deletes the entry of a document inside `txn`. Returns `true` if it existed.
    pub fn remove(&self, txn: &WriteTransaction, document: &DocRef) -> Result<bool, SearchError> {
        let removed = index::remove(txn, &document.doctype, &document.name)?;
        if removed {
            debug!("removed {} {}", document.doctype, document.name);
        }
        Ok(removed)
    }

    /// Re-derives the field configuration of `doctype` and re-indexes all
    /// of its documents, replacing prior entries. Returns how many entries
    /// were written.
    ///
    /// Rebuilding a child doctype rebuilds every doctype embedding it.
    pub fn rebuild_for_doctype(&self, core: &FolioCore, doctype: &DocType) -> Result<usize, SearchError> {
        let meta = core.meta(doctype)?;

        if meta.is_child() {
            let mut written = 0;
            for parent in self.parents_of(core, doctype)? {
                written += self.rebuild_for_doctype(core, &parent)?;
            }
            return Ok(written);
        }

        let fields = Arc::new(SearchableFields::derive(&meta, core)?);
        self.searchable
            .write()
            .insert(doctype.clone(), Arc::clone(&fields));

        let documents = core.documents(doctype)?;

        let txn = self.db.begin_write()?;
        index::init(&txn)?;
        let removed = index::remove_doctype(&txn, doctype)?;
        let mut written = 0;
        for document in &documents {
            if let Some(content) = fields.content(document) {
                index::upsert(&txn, &document.doctype, &document.name, &content)?;
                written += 1;
            }
        }
        txn.commit()?;

        info!(
            "rebuilt global search for {doctype}: {} documents, {removed} entries replaced, {written} written",
            documents.len()
        );
        Ok(written)
    }

    /// Doctypes with at least one searchable field of their own or in an
    /// embedded child doctype.
    pub fn doctypes_with_global_search(&self, core: &FolioCore) -> Result<Vec<DocType>, SearchError> {
        let mut doctypes = Vec::new();
        for doctype in core.doctypes()? {
            let meta = core.meta(&doctype)?;
            if meta.is_child() {
                continue;
            }
            if !SearchableFields::derive(&meta, core)?.is_empty() {
                doctypes.push(doctype);
            }
        }
        Ok(doctypes)
    }

    fn parents_of(&self, core: &FolioCore, child: &DocType) -> Result<Vec<DocType>, SearchError> {
        let mut parents = Vec::new();
        for doctype in core.doctypes()? {
            let meta = core.meta(&doctype)?;
            let embeds = meta
                .table_fields()
                .any(|field| field.options.as_deref() == Some(child.as_str()));
            if embeds {
                parents.push(doctype);
            }
        }
        Ok(parents)
    }

    fn searchable_fields(
        &self,
        doctype: &DocType,
        metas: &dyn MetaSource,
    ) -> Result<Arc<SearchableFields>, SearchError> {
        if let Some(fields) = self.searchable.read().get(doctype) {
            return Ok(Arc::clone(fields));
        }

        let meta = metas.meta(doctype)?;
        let fields = Arc::new(SearchableFields::derive(&meta, metas)?);
        self.searchable
            .write()
            .insert(doctype.clone(), Arc::clone(&fields));
        Ok(fields)
    }
}

/// Search operations.
impl GlobalSearch {
    /// Entries whose content matches the query, best match first and ties
    /// in (doctype, name) order. Blank queries match nothing.
    pub fn search(&self, query: impl Into<SearchQuery>) -> Result<SearchResults, SearchError> {
        let query = query.into();
        if query.is_blank() {
            return Ok(SearchResults::default());
        }

        let kind = query.kind.unwrap_or(self.config.match_kind);
        let limit = query.limit.unwrap_or(self.config.result_limit);
        let mut matcher = ContentMatcher::new(&query.text, kind, &self.config);

        let read_txn = self.db.begin_read()?;
        let mut scored = Vec::new();
        index::scan(&read_txn, query.doctype.as_ref(), |doctype, name, content| {
            if let Some(score) = matcher.score(content) {
                scored.push((score, index::parse_entry(doctype, name, content)?));
            }
            Ok(())
        })?;

        // Stable sort keeps key order among equal scores.
        scored.sort_by_key(|(score, _)| Reverse(*score));

        let entries = scored
            .into_iter()
            .skip(query.start)
            .take(limit)
            .map(|(_, entry)| entry)
            .collect();

        Ok(SearchResults { entries })
    }

    /// The stored entry of one document, if any.
    pub fn entry(&self, doctype: &DocType, name: &DocName) -> Result<Option<SearchIndexEntry>, SearchError> {
        let read_txn = self.db.begin_read()?;
        index::get(&read_txn, doctype, name)
    }
}

impl DocumentObserver for GlobalSearch {
    fn on_save(
        &self,
        txn: &WriteTransaction,
        document: &Document,
        metas: &dyn MetaSource,
    ) -> Result<(), ObserverError> {
        self.index(txn, document, metas)?;
        Ok(())
    }

    fn on_delete(&self, txn: &WriteTransaction, document: &DocRef) -> Result<(), ObserverError> {
        self.remove(txn, document)?;
        Ok(())
    }

    fn on_meta_change(&self, _doctype: &DocType) {
        // Parents cache the fields of their child doctypes, so drop everything.
        self.searchable.write().clear();
    }
}
