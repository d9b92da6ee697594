//! Core document store combining the database and lifecycle observers.

use crate::core::db::Database;
use crate::core::db::error::DatabaseError;
use crate::types::{
    AppConfig, AppConfigError, ChildRow, Config, DocName, DocRef, DocType, DocTypeDef, Document,
    FieldType, Meta, Metadata, Naming, NewDocument, Property, ValidationError,
};
use error::FolioError;
use log::{debug, warn};
use observer::{DocumentObserver, MetaSource};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use std::time::SystemTime;

pub(crate) mod db;
pub mod observer;

pub mod error {
    use super::*;
    use super::observer::ObserverError;
    use thiserror::Error;

    #[derive(Debug, Error)]
    pub enum FolioError {
        #[error("Database error: {0}")]
        Database(#[from] DatabaseError),

        #[error("Validation error: {0}")]
        Validation(#[from] ValidationError),

        #[error("Observer error: {0}")]
        Observer(ObserverError),

        #[error("Config error: {0}")]
        Config(#[from] AppConfigError),
    }
}

pub struct FolioCore {
    config: Config,
    db: Database,
    observers: Vec<Arc<dyn DocumentObserver>>,
}

impl FolioCore {
    pub fn open(config: Config) -> Result<Self, FolioError> {
        let db = Database::new(&config)?;
        Ok(Self {
            config,
            db,
            observers: Vec::new(),
        })
    }

    /// Returns the base data directory path.
    pub fn data_dir(&self) -> &Path {
        &self.config.base_path
    }

    /// Loads `config.toml` from the data directory, falling back to defaults
    /// for a missing file or invalid values.
    pub fn load_app_config(&self) -> Result<AppConfig, FolioError> {
        let path = self.config.app_config_path();
        let config = AppConfig::load(&path)?;
        for error in config.validate() {
            warn!("{}: {error}", path.display());
        }
        Ok(config.with_defaults_for_invalid())
    }

    /// Shared database handle for layers that keep their own tables.
    pub fn database(&self) -> Arc<redb::Database> {
        self.db.handle()
    }

    /// Names of all persisted tables, sorted.
    pub fn tables(&self) -> Result<Vec<String>, FolioError> {
        Ok(self.db.table_names()?)
    }

    /// Registers an observer for document lifecycle events.
    pub fn subscribe(&mut self, observer: Arc<dyn DocumentObserver>) {
        self.observers.push(observer);
    }
}

impl MetaSource for FolioCore {
    fn meta(&self, doctype: &DocType) -> Result<Meta, FolioError> {
        Ok(self.db.meta(doctype)?)
    }
}

/// Metadata operations.
impl FolioCore {
    /// Resolved meta of a doctype, property setters applied.
    pub fn meta(&self, doctype: &DocType) -> Result<Meta, FolioError> {
        Ok(self.db.meta(doctype)?)
    }

    /// Stores a doctype definition, replacing an earlier one of the same name.
    ///
    /// Table fields must reference an already defined child doctype.
    pub fn define_doctype(&mut self, def: DocTypeDef) -> Result<(), FolioError> {
        let mut seen = HashSet::new();
        for field in &def.fields {
            if !seen.insert(field.fieldname.as_str()) {
                return Err(ValidationError::DuplicateField {
                    doctype: def.name.to_string(),
                    field: field.fieldname.clone(),
                }
                .into());
            }

            if field.in_global_search && !field.fieldtype.supports_global_search() {
                return Err(ValidationError::NotSearchable {
                    field: field.fieldname.clone(),
                    fieldtype: field.fieldtype,
                }
                .into());
            }

            if field.fieldtype == FieldType::Table {
                self.check_table_options(&def, &field.fieldname, field.options.as_deref())?;
            }
        }

        self.db.put_doctype(&def)?;
        debug!("defined doctype {}", def.name);
        self.notify_meta_change(&def.name);
        Ok(())
    }

    pub fn doctypes(&self) -> Result<Vec<DocType>, FolioError> {
        Ok(self.db.doctypes()?)
    }

    /// Overrides one property of a field. Takes effect for documents saved
    /// afterwards; existing index entries are only refreshed by a rebuild.
    pub fn make_property_setter(
        &mut self,
        doctype: &DocType,
        fieldname: &str,
        property: Property,
    ) -> Result<(), FolioError> {
        let meta = self.meta(doctype)?;
        let field = meta
            .field(fieldname)
            .ok_or_else(|| ValidationError::UnknownField {
                doctype: doctype.to_string(),
                field: fieldname.to_string(),
            })?;

        if let Property::InGlobalSearch(true) = property
            && !field.fieldtype.supports_global_search()
        {
            return Err(ValidationError::NotSearchable {
                field: fieldname.to_string(),
                fieldtype: field.fieldtype,
            }
            .into());
        }

        self.db.set_property(doctype, fieldname, &property)?;
        debug!("property setter {doctype}.{fieldname}.{}", property.name());
        self.notify_meta_change(doctype);
        Ok(())
    }

    /// Removes every property setter of a doctype. Returns how many were removed.
    pub fn clear_property_setters(&mut self, doctype: &DocType) -> Result<usize, FolioError> {
        let removed = self.db.clear_properties(doctype)?;
        if removed > 0 {
            self.notify_meta_change(doctype);
        }
        Ok(removed)
    }
}

/// Read operations.
impl FolioCore {
    pub fn get(&self, doctype: &DocType, name: &DocName) -> Result<Option<Document>, FolioError> {
        Ok(self.db.get(doctype, name)?)
    }

    pub fn names(&self, doctype: &DocType) -> Result<Vec<DocName>, FolioError> {
        Ok(self.db.names(doctype)?)
    }

    pub fn documents(&self, doctype: &DocType) -> Result<Vec<Document>, FolioError> {
        Ok(self.db.documents(doctype)?)
    }
}

/// Write operations.
impl FolioCore {
    /// Inserts a new document and notifies observers in the same transaction.
    ///
    /// Returns `Database(AlreadyExists)` if the name is taken.
    pub fn insert(&mut self, new: NewDocument, now: SystemTime) -> Result<Document, FolioError> {
        let meta = self.meta(&new.doctype)?;
        if meta.is_child() {
            return Err(ValidationError::ChildDocType(new.doctype.to_string()).into());
        }

        let mut fields = new.fields;
        meta.apply_defaults(&mut fields);
        meta.validate_fields(&fields)?;
        let children = self.validate_children(&meta, new.children)?;

        let txn = self.db.begin_write()?;

        let name = match (new.name, meta.naming()) {
            (Some(name), _) => name,
            (None, Naming::Series { prefix }) => Database::next_series_name(&txn, prefix)?,
            (None, Naming::Prompt) => {
                return Err(ValidationError::NameRequired(new.doctype.to_string()).into());
            }
        };

        let document = Document {
            doctype: new.doctype,
            name,
            fields,
            children,
            metadata: Metadata {
                created_at: now,
                modified_at: now,
            },
        };

        Database::insert_document(&txn, &document)?;
        self.notify_save(&txn, &document)?;
        txn.commit().map_err(DatabaseError::from)?;

        debug!("inserted {} {}", document.doctype, document.name);
        Ok(document)
    }

    /// Saves changes to an existing document. `created_at` is kept from the
    /// stored version; `modified_at` becomes `now`.
    ///
    /// Returns `Database(NotFound)` if the document doesn't exist.
    pub fn save(&mut self, document: &Document, now: SystemTime) -> Result<Document, FolioError> {
        let meta = self.meta(&document.doctype)?;
        meta.validate_fields(&document.fields)?;
        let children = self.validate_children(&meta, document.children.clone())?;

        let previous = self
            .db
            .get(&document.doctype, &document.name)?
            .ok_or(DatabaseError::NotFound)?;

        let saved = Document {
            children,
            metadata: Metadata {
                created_at: previous.metadata.created_at,
                modified_at: now,
            },
            ..document.clone()
        };

        let txn = self.db.begin_write()?;
        Database::update_document(&txn, &saved)?;
        self.notify_save(&txn, &saved)?;
        txn.commit().map_err(DatabaseError::from)?;

        debug!("saved {} {}", saved.doctype, saved.name);
        Ok(saved)
    }

    /// Deletes a document and notifies observers in the same transaction.
    ///
    /// Returns `Database(NotFound)` if the document doesn't exist.
    pub fn delete(&mut self, doctype: &DocType, name: &DocName) -> Result<Document, FolioError> {
        let txn = self.db.begin_write()?;
        let removed = Database::remove_document(&txn, doctype, name)?;
        self.notify_delete(&txn, &removed.doc_ref())?;
        txn.commit().map_err(DatabaseError::from)?;

        debug!("deleted {doctype} {name}");
        Ok(removed)
    }

    /// Deletes every document of a doctype. Returns how many were deleted.
    pub fn delete_all(&mut self, doctype: &DocType) -> Result<usize, FolioError> {
        let names = self.db.names(doctype)?;

        let txn = self.db.begin_write()?;
        for name in &names {
            Database::remove_document(&txn, doctype, name)?;
            let doc_ref = DocRef {
                doctype: doctype.clone(),
                name: name.clone(),
            };
            self.notify_delete(&txn, &doc_ref)?;
        }
        txn.commit().map_err(DatabaseError::from)?;

        debug!("deleted {} {doctype} documents", names.len());
        Ok(names.len())
    }
}

/// Internal helpers.
impl FolioCore {
    fn check_table_options(
        &self,
        def: &DocTypeDef,
        fieldname: &str,
        options: Option<&str>,
    ) -> Result<(), FolioError> {
        let invalid = || ValidationError::InvalidTableOptions {
            doctype: def.name.to_string(),
            field: fieldname.to_string(),
        };

        let child = options
            .and_then(|options| DocType::try_from(options).ok())
            .ok_or_else(invalid)?;

        match self.db.doctype_def(&child)? {
            Some(child_def) if child_def.is_child => Ok(()),
            _ => Err(invalid().into()),
        }
    }

    /// Validates rows against their child meta and renumbers `idx` from 1.
    fn validate_children(
        &self,
        meta: &Meta,
        children: BTreeMap<String, Vec<ChildRow>>,
    ) -> Result<BTreeMap<String, Vec<ChildRow>>, FolioError> {
        let mut validated = BTreeMap::new();

        for (table_field, rows) in children {
            let child_meta = self.meta(&meta.child_doctype(&table_field)?)?;

            let mut numbered = Vec::with_capacity(rows.len());
            for (position, mut row) in rows.into_iter().enumerate() {
                child_meta.apply_defaults(&mut row.fields);
                child_meta.validate_row(&row)?;
                row.idx = position as u32 + 1;
                numbered.push(row);
            }

            if !numbered.is_empty() {
                validated.insert(table_field, numbered);
            }
        }

        Ok(validated)
    }

    fn notify_save(&self, txn: &redb::WriteTransaction, document: &Document) -> Result<(), FolioError> {
        for observer in &self.observers {
            observer
                .on_save(txn, document, self)
                .map_err(FolioError::Observer)?;
        }
        Ok(())
    }

    fn notify_delete(&self, txn: &redb::WriteTransaction, doc_ref: &DocRef) -> Result<(), FolioError> {
        for observer in &self.observers {
            observer
                .on_delete(txn, doc_ref)
                .map_err(FolioError::Observer)?;
        }
        Ok(())
    }

    fn notify_meta_change(&self, doctype: &DocType) {
        for observer in &self.observers {
            observer.on_meta_change(doctype);
        }
    }
}

#[cfg(test)]
mod tests;
