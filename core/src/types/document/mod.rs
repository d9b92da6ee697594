//! Public document types for consumers.
//!
//! Stored documents are kept as [`versioned_document::VersionedDocument`];
//! `Document` is what callers read and save.

use crate::types::name::{DocName, DocType};
use crate::types::value::FieldValue;
use std::collections::BTreeMap;
use std::time::SystemTime;

pub(crate) mod versioned_document;

use versioned_document::latest_document;

/// Field values keyed by fieldname.
pub type Fields = BTreeMap<String, FieldValue>;

/// Identifies a stored document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocRef {
    pub doctype: DocType,
    pub name: DocName,
}

/// A row of a child table, owned by its parent document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChildRow {
    /// 1-based position within the table, assigned on save.
    pub idx: u32,
    pub fields: Fields,
}

impl ChildRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, fieldname: &str, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(fieldname.to_string(), value.into());
        self
    }

    pub fn get(&self, fieldname: &str) -> Option<&FieldValue> {
        self.fields.get(fieldname)
    }
}

/// A document that has not been inserted yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewDocument {
    pub doctype: DocType,
    /// Required unless the doctype uses a naming series.
    pub name: Option<DocName>,
    pub fields: Fields,
    pub children: BTreeMap<String, Vec<ChildRow>>,
}

impl NewDocument {
    pub fn new(doctype: DocType) -> Self {
        Self {
            doctype,
            name: None,
            fields: Fields::new(),
            children: BTreeMap::new(),
        }
    }

    pub fn named(mut self, name: DocName) -> Self {
        self.name = Some(name);
        self
    }

    pub fn with(mut self, fieldname: &str, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(fieldname.to_string(), value.into());
        self
    }

    pub fn append(mut self, table_field: &str, row: ChildRow) -> Self {
        self.children
            .entry(table_field.to_string())
            .or_default()
            .push(row);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Metadata {
    pub created_at: SystemTime,
    pub modified_at: SystemTime,
}

/// A stored document, as read from or written to the store.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub doctype: DocType,
    pub name: DocName,
    pub fields: Fields,
    pub children: BTreeMap<String, Vec<ChildRow>>,
    pub metadata: Metadata,
}

impl Document {
    pub fn doc_ref(&self) -> DocRef {
        DocRef {
            doctype: self.doctype.clone(),
            name: self.name.clone(),
        }
    }

    pub fn get(&self, fieldname: &str) -> Option<&FieldValue> {
        self.fields.get(fieldname)
    }

    pub fn set(&mut self, fieldname: &str, value: impl Into<FieldValue>) {
        self.fields.insert(fieldname.to_string(), value.into());
    }

    /// Clears a field. Returns the previous value.
    pub fn unset(&mut self, fieldname: &str) -> Option<FieldValue> {
        self.fields.remove(fieldname)
    }

    pub fn append(&mut self, table_field: &str, row: ChildRow) {
        self.children
            .entry(table_field.to_string())
            .or_default()
            .push(row);
    }

    /// Rows of a child table; empty if the table has none.
    pub fn rows(&self, table_field: &str) -> &[ChildRow] {
        self.children
            .get(table_field)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub(crate) fn from_latest(
        doctype: DocType,
        name: DocName,
        stored: latest_document::StoredDocument,
    ) -> Self {
        let children = stored
            .children
            .into_iter()
            .map(|(table, rows)| {
                let rows = rows
                    .into_iter()
                    .map(|row| ChildRow {
                        idx: row.idx,
                        fields: row.fields,
                    })
                    .collect();
                (table, rows)
            })
            .collect();

        Self {
            doctype,
            name,
            fields: stored.fields,
            children,
            metadata: Metadata {
                created_at: stored.metadata.created_at,
                modified_at: stored.metadata.modified_at,
            },
        }
    }

    pub(crate) fn to_latest(&self) -> latest_document::StoredDocument {
        let children = self
            .children
            .iter()
            .map(|(table, rows)| {
                let rows = rows
                    .iter()
                    .map(|row| latest_document::StoredRow {
                        idx: row.idx,
                        fields: row.fields.clone(),
                    })
                    .collect();
                (table.clone(), rows)
            })
            .collect();

        latest_document::StoredDocument {
            metadata: latest_document::Metadata {
                created_at: self.metadata.created_at,
                modified_at: self.metadata.modified_at,
            },
            fields: self.fields.clone(),
            children,
        }
    }
}
