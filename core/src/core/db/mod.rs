//! Database layer for folio storage.
//!
//! This module handles all redb operations including:
//! - Document storage ((doctype, name) → VersionedDocument)
//! - Doctype definitions and property setters (JSON strings)
//! - Naming series counters
//!
//! Document writes take the caller's write transaction so that observers
//! can join the same commit.

use crate::core::db::error::DatabaseError;
use crate::types::document::versioned_document::VersionedDocument;
use crate::types::{DocName, DocType, DocTypeDef, Document, Meta, Property};
use redb::{
    ReadableDatabase, ReadableTable, TableDefinition, TableHandle, WriteTransaction,
};
use std::sync::Arc;

pub mod error {
    use thiserror::Error;

    #[derive(Debug, Error)]
    pub enum DatabaseError {
        #[error("Database error: {0}")]
        Redb(#[from] redb::DatabaseError),

        #[error("Table error: {0}")]
        TableError(#[from] redb::TableError),

        #[error("Storage error: {0}")]
        StorageError(#[from] redb::StorageError),

        #[error("Transaction error: {0}")]
        TransactionError(#[from] redb::TransactionError),

        #[error("Commit error: {0}")]
        CommitError(#[from] redb::CommitError),

        #[error("IO error: {0}")]
        Io(#[from] std::io::Error),

        #[error("JSON error: {0}")]
        Json(#[from] serde_json::Error),

        #[error("Document not found")]
        NotFound,

        #[error("Document already exists")]
        AlreadyExists,

        #[error("Unknown doctype: {0}")]
        UnknownDocType(String),

        #[error("Invalid stored name: {0}")]
        InvalidName(String),
    }
}

/// Documents table: (doctype, name) → VersionedDocument
const DOCUMENTS_TABLE: TableDefinition<(&str, &str), VersionedDocument> =
    TableDefinition::new("documents");

/// Doctype table: doctype → JSON DocTypeDef
const DOCTYPES_TABLE: TableDefinition<&str, &str> = TableDefinition::new("doctypes");

/// Property setters: (doctype, fieldname, property) → JSON Property
const PROPERTY_SETTERS_TABLE: TableDefinition<(&str, &str, &str), &str> =
    TableDefinition::new("property_setters");

/// Naming series: prefix → last used counter
const SERIES_TABLE: TableDefinition<&str, u64> = TableDefinition::new("series");

/// The main database struct wrapping redb.
pub struct Database {
    db: Arc<redb::Database>,
}

impl Database {
    /// Creates or opens a database using paths from the config.
    pub fn new(config: &crate::types::Config) -> Result<Self, DatabaseError> {
        std::fs::create_dir_all(&config.base_path)?;

        let db = redb::Database::create(config.db_path())?;

        // Initialize tables
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(DOCUMENTS_TABLE)?;
            let _ = write_txn.open_table(DOCTYPES_TABLE)?;
            let _ = write_txn.open_table(PROPERTY_SETTERS_TABLE)?;
            let _ = write_txn.open_table(SERIES_TABLE)?;
        }
        write_txn.commit()?;

        Ok(Self { db: Arc::new(db) })
    }

    /// Shared handle for layers that keep their own tables in this database.
    pub fn handle(&self) -> Arc<redb::Database> {
        Arc::clone(&self.db)
    }

    pub fn begin_write(&self) -> Result<WriteTransaction, DatabaseError> {
        Ok(self.db.begin_write()?)
    }

    /// Names of all tables, sorted.
    pub fn table_names(&self) -> Result<Vec<String>, DatabaseError> {
        let read_txn = self.db.begin_read()?;
        let mut names: Vec<String> = read_txn
            .list_tables()?
            .map(|handle| handle.name().to_string())
            .collect();
        names.sort();
        Ok(names)
    }
}

/// Doctype operations.
impl Database {
    /// Stores a doctype definition, replacing any previous one.
    pub fn put_doctype(&self, def: &DocTypeDef) -> Result<(), DatabaseError> {
        let json = serde_json::to_string(def)?;
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(DOCTYPES_TABLE)?;
            table.insert(def.name.as_str(), json.as_str())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    pub fn doctype_def(&self, doctype: &DocType) -> Result<Option<DocTypeDef>, DatabaseError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(DOCTYPES_TABLE)?;

        match table.get(doctype.as_str())? {
            None => Ok(None),
            Some(guard) => Ok(Some(serde_json::from_str(guard.value())?)),
        }
    }

    pub fn doctypes(&self) -> Result<Vec<DocType>, DatabaseError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(DOCTYPES_TABLE)?;

        let mut doctypes = Vec::new();
        for entry in table.iter()? {
            let (name, _) = entry?;
            doctypes.push(Self::parse_doctype(name.value())?);
        }
        Ok(doctypes)
    }

    /// Loads a doctype definition with its property setters applied.
    pub fn meta(&self, doctype: &DocType) -> Result<Meta, DatabaseError> {
        let read_txn = self.db.begin_read()?;

        let def: DocTypeDef = {
            let table = read_txn.open_table(DOCTYPES_TABLE)?;
            let guard = table
                .get(doctype.as_str())?
                .ok_or_else(|| DatabaseError::UnknownDocType(doctype.to_string()))?;
            serde_json::from_str(guard.value())?
        };

        let setters_table = read_txn.open_table(PROPERTY_SETTERS_TABLE)?;
        let mut setters = Vec::new();
        for entry in setters_table.range((doctype.as_str(), "", "")..)? {
            let (key, value) = entry?;
            let (owner, fieldname, _) = key.value();
            if owner != doctype.as_str() {
                break;
            }
            let property: Property = serde_json::from_str(value.value())?;
            setters.push((fieldname.to_string(), property));
        }

        Ok(Meta::resolve(def, setters))
    }
}

/// Property setter operations.
impl Database {
    /// Stores an override, replacing an earlier one for the same property.
    pub fn set_property(
        &self,
        doctype: &DocType,
        fieldname: &str,
        property: &Property,
    ) -> Result<(), DatabaseError> {
        let json = serde_json::to_string(property)?;
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(PROPERTY_SETTERS_TABLE)?;
            table.insert((doctype.as_str(), fieldname, property.name()), json.as_str())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Removes every override of a doctype. Returns how many were removed.
    pub fn clear_properties(&self, doctype: &DocType) -> Result<usize, DatabaseError> {
        let write_txn = self.db.begin_write()?;
        let removed;
        {
            let mut table = write_txn.open_table(PROPERTY_SETTERS_TABLE)?;

            let mut keys = Vec::new();
            for entry in table.range((doctype.as_str(), "", "")..)? {
                let (key, _) = entry?;
                let (owner, fieldname, property) = key.value();
                if owner != doctype.as_str() {
                    break;
                }
                keys.push((fieldname.to_string(), property.to_string()));
            }

            for (fieldname, property) in &keys {
                table.remove((doctype.as_str(), fieldname.as_str(), property.as_str()))?;
            }
            removed = keys.len();
        }
        write_txn.commit()?;
        Ok(removed)
    }
}

/// Document write operations. These join the caller's transaction.
impl Database {
    /// Returns `Err(AlreadyExists)` if the document already exists.
    pub fn insert_document(txn: &WriteTransaction, document: &Document) -> Result<(), DatabaseError> {
        let mut table = txn.open_table(DOCUMENTS_TABLE)?;
        let key = (document.doctype.as_str(), document.name.as_str());

        if table.get(key)?.is_some() {
            return Err(DatabaseError::AlreadyExists);
        }

        table.insert(key, &VersionedDocument::V1(document.to_latest()))?;
        Ok(())
    }

    /// Overwrites an existing document, returning the previous version.
    ///
    /// Returns `Err(NotFound)` if the document doesn't exist.
    pub fn update_document(
        txn: &WriteTransaction,
        document: &Document,
    ) -> Result<Document, DatabaseError> {
        let mut table = txn.open_table(DOCUMENTS_TABLE)?;
        let key = (document.doctype.as_str(), document.name.as_str());

        let previous = table
            .get(key)?
            .map(|guard| guard.value().into_latest())
            .ok_or(DatabaseError::NotFound)?;

        table.insert(key, &VersionedDocument::V1(document.to_latest()))?;

        Ok(Document::from_latest(
            document.doctype.clone(),
            document.name.clone(),
            previous,
        ))
    }

    /// Returns `Err(NotFound)` if the document doesn't exist.
    pub fn remove_document(
        txn: &WriteTransaction,
        doctype: &DocType,
        name: &DocName,
    ) -> Result<Document, DatabaseError> {
        let mut table = txn.open_table(DOCUMENTS_TABLE)?;

        let stored = table
            .remove((doctype.as_str(), name.as_str()))?
            .map(|guard| guard.value().into_latest())
            .ok_or(DatabaseError::NotFound)?;

        Ok(Document::from_latest(doctype.clone(), name.clone(), stored))
    }

    /// Advances the series counter for `prefix` and returns the next name.
    pub fn next_series_name(txn: &WriteTransaction, prefix: &str) -> Result<DocName, DatabaseError> {
        let mut table = txn.open_table(SERIES_TABLE)?;

        let current = table.get(prefix)?.map(|guard| guard.value()).unwrap_or(0);
        let next = current + 1;
        table.insert(prefix, next)?;

        let name = format!("{prefix}{next:05}");
        DocName::try_from(name.as_str()).map_err(|_| DatabaseError::InvalidName(name))
    }
}

/// Document read operations.
impl Database {
    pub fn get(&self, doctype: &DocType, name: &DocName) -> Result<Option<Document>, DatabaseError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(DOCUMENTS_TABLE)?;

        match table.get((doctype.as_str(), name.as_str()))? {
            None => Ok(None),
            Some(guard) => Ok(Some(Document::from_latest(
                doctype.clone(),
                name.clone(),
                guard.value().into_latest(),
            ))),
        }
    }

    /// Names of all documents of a doctype, in name order.
    pub fn names(&self, doctype: &DocType) -> Result<Vec<DocName>, DatabaseError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(DOCUMENTS_TABLE)?;

        let mut names = Vec::new();
        for entry in table.range((doctype.as_str(), "")..)? {
            let (key, _) = entry?;
            let (owner, name) = key.value();
            if owner != doctype.as_str() {
                break;
            }
            names.push(Self::parse_name(name)?);
        }
        Ok(names)
    }

    /// All documents of a doctype, in name order.
    pub fn documents(&self, doctype: &DocType) -> Result<Vec<Document>, DatabaseError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(DOCUMENTS_TABLE)?;

        let mut documents = Vec::new();
        for entry in table.range((doctype.as_str(), "")..)? {
            let (key, value) = entry?;
            let (owner, name) = key.value();
            if owner != doctype.as_str() {
                break;
            }
            let name = Self::parse_name(name)?;
            documents.push(Document::from_latest(
                doctype.clone(),
                name,
                value.value().into_latest(),
            ));
        }
        Ok(documents)
    }
}

/// Internal helpers.
impl Database {
    fn parse_name(raw: &str) -> Result<DocName, DatabaseError> {
        DocName::try_from(raw).map_err(|_| DatabaseError::InvalidName(raw.to_string()))
    }

    fn parse_doctype(raw: &str) -> Result<DocType, DatabaseError> {
        DocType::try_from(raw).map_err(|_| DatabaseError::InvalidName(raw.to_string()))
    }
}
