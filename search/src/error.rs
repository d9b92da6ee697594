use folio_core::FolioError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Core error: {0}")]
    Core(#[from] FolioError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Invalid index entry: {0}")]
    InvalidEntry(String),
}
