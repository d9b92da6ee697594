//! Lifecycle notifications from the store to dependent indexes.

use crate::core::error::FolioError;
use crate::types::{DocRef, DocType, Document, Meta};
use redb::WriteTransaction;

/// Error type observers may return; it aborts the triggering write.
pub type ObserverError = Box<dyn std::error::Error + Send + Sync>;

/// Read access to resolved doctype metadata.
pub trait MetaSource {
    fn meta(&self, doctype: &DocType) -> Result<Meta, FolioError>;
}

/// Receives document lifecycle events synchronously.
///
/// `on_save` and `on_delete` run inside the write transaction of the
/// triggering operation; anything written through `txn` commits or rolls
/// back together with the document.
pub trait DocumentObserver: Send + Sync {
    /// Called after a document was inserted or saved.
    fn on_save(
        &self,
        txn: &WriteTransaction,
        document: &Document,
        metas: &dyn MetaSource,
    ) -> Result<(), ObserverError>;

    /// Called after a document was deleted.
    fn on_delete(&self, txn: &WriteTransaction, document: &DocRef) -> Result<(), ObserverError>;

    /// Called after a doctype definition or one of its property setters changed.
    fn on_meta_change(&self, _doctype: &DocType) {}
}
