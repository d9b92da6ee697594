use crate::types::meta::FieldType;
use thiserror::Error;

/// Rejections raised while checking doctype definitions, property setters
/// and documents against their meta.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Unknown field {field} in {doctype}")]
    UnknownField { doctype: String, field: String },

    #[error("Duplicate field {field} in {doctype}")]
    DuplicateField { doctype: String, field: String },

    #[error("Mandatory field {field} missing in {doctype}")]
    MissingMandatory { doctype: String, field: String },

    #[error("{field} is not a table field of {doctype}")]
    NotATable { doctype: String, field: String },

    #[error("Table field {field} of {doctype} must reference a child doctype")]
    InvalidTableOptions { doctype: String, field: String },

    #[error("Field {field} of type {fieldtype:?} cannot be used in global search")]
    NotSearchable { field: String, fieldtype: FieldType },

    #[error("{0} is a child doctype and cannot be stored on its own")]
    ChildDocType(String),

    #[error("A name is required for new {0} documents")]
    NameRequired(String),
}
