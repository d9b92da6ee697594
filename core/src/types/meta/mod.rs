//! Doctype definitions and their resolved form.
//!
//! A [`DocTypeDef`] is the declared schema of a doctype. Property setters
//! override individual field properties at runtime; [`Meta`] is the
//! definition with every override applied, and is what validation and
//! indexing read.

use crate::types::document::{ChildRow, Fields};
use crate::types::error::ValidationError;
use crate::types::name::DocType;
use crate::types::value::FieldValue;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Data,
    SmallText,
    Text,
    LongText,
    TextEditor,
    Select,
    Link,
    Int,
    Float,
    Check,
    Datetime,
    /// One-to-many child rows; `options` names the child doctype.
    Table,
}

impl FieldType {
    /// Returns true if fields of this type may carry the global search flag.
    pub fn supports_global_search(self) -> bool {
        !matches!(self, FieldType::Check | FieldType::Datetime)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDef {
    pub fieldname: String,
    pub label: String,
    pub fieldtype: FieldType,
    #[serde(default)]
    pub options: Option<String>,
    #[serde(default)]
    pub reqd: bool,
    #[serde(default)]
    pub default: Option<FieldValue>,
    #[serde(default)]
    pub in_global_search: bool,
}

impl FieldDef {
    pub fn new(fieldname: &str, label: &str, fieldtype: FieldType) -> Self {
        Self {
            fieldname: fieldname.to_string(),
            label: label.to_string(),
            fieldtype,
            options: None,
            reqd: false,
            default: None,
            in_global_search: false,
        }
    }

    /// Shorthand for a `Table` field holding rows of `child`.
    pub fn table(fieldname: &str, label: &str, child: &DocType) -> Self {
        Self::new(fieldname, label, FieldType::Table).with_options(child.as_str())
    }

    pub fn with_options(mut self, options: &str) -> Self {
        self.options = Some(options.to_string());
        self
    }

    pub fn required(mut self) -> Self {
        self.reqd = true;
        self
    }

    pub fn with_default(mut self, value: impl Into<FieldValue>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn searchable(mut self) -> Self {
        self.in_global_search = true;
        self
    }
}

/// How new documents of a doctype get their name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Naming {
    /// The caller supplies the name.
    #[default]
    Prompt,
    /// `{prefix}{counter:05}`, counter kept per prefix.
    Series { prefix: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocTypeDef {
    pub name: DocType,
    pub fields: Vec<FieldDef>,
    #[serde(default)]
    pub is_child: bool,
    #[serde(default)]
    pub naming: Naming,
}

impl DocTypeDef {
    pub fn new(name: DocType) -> Self {
        Self {
            name,
            fields: Vec::new(),
            is_child: false,
            naming: Naming::default(),
        }
    }

    /// A doctype whose documents only exist as rows of a parent.
    pub fn child(name: DocType) -> Self {
        Self {
            is_child: true,
            ..Self::new(name)
        }
    }

    pub fn field(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }

    pub fn naming(mut self, naming: Naming) -> Self {
        self.naming = naming;
        self
    }
}

/// A runtime override of one field property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Property {
    InGlobalSearch(bool),
    Label(String),
    Reqd(bool),
}

impl Property {
    pub fn name(&self) -> &'static str {
        match self {
            Property::InGlobalSearch(_) => "in_global_search",
            Property::Label(_) => "label",
            Property::Reqd(_) => "reqd",
        }
    }

    fn apply(&self, field: &mut FieldDef) {
        match self {
            Property::InGlobalSearch(value) => field.in_global_search = *value,
            Property::Label(label) => field.label = label.clone(),
            Property::Reqd(value) => field.reqd = *value,
        }
    }
}

/// A doctype definition with its property setters applied.
#[derive(Debug, Clone, PartialEq)]
pub struct Meta {
    def: DocTypeDef,
}

impl From<DocTypeDef> for Meta {
    fn from(def: DocTypeDef) -> Self {
        Self { def }
    }
}

impl Meta {
    /// Applies `(fieldname, property)` overrides in order. Overrides for
    /// fields that no longer exist are ignored.
    pub fn resolve(mut def: DocTypeDef, setters: impl IntoIterator<Item = (String, Property)>) -> Self {
        for (fieldname, property) in setters {
            if let Some(field) = def.fields.iter_mut().find(|f| f.fieldname == fieldname) {
                property.apply(field);
            }
        }
        Self { def }
    }

    pub fn name(&self) -> &DocType {
        &self.def.name
    }

    pub fn is_child(&self) -> bool {
        self.def.is_child
    }

    pub fn naming(&self) -> &Naming {
        &self.def.naming
    }

    pub fn fields(&self) -> &[FieldDef] {
        &self.def.fields
    }

    pub fn field(&self, fieldname: &str) -> Option<&FieldDef> {
        self.def.fields.iter().find(|f| f.fieldname == fieldname)
    }

    pub fn table_fields(&self) -> impl Iterator<Item = &FieldDef> + '_ {
        self.def
            .fields
            .iter()
            .filter(|f| f.fieldtype == FieldType::Table)
    }

    /// Non-table fields whose values go into the global search content.
    pub fn global_search_fields(&self) -> impl Iterator<Item = &FieldDef> + '_ {
        self.def.fields.iter().filter(|f| {
            f.in_global_search
                && f.fieldtype != FieldType::Table
                && f.fieldtype.supports_global_search()
        })
    }

    /// Fills missing fields that declare a default.
    pub fn apply_defaults(&self, fields: &mut Fields) {
        for field in &self.def.fields {
            if let Some(default) = &field.default
                && !fields.contains_key(&field.fieldname)
            {
                fields.insert(field.fieldname.clone(), default.clone());
            }
        }
    }

    /// Checks values against this meta: every key must be a known
    /// non-table field and every mandatory field must be non-empty.
    pub fn validate_fields(&self, fields: &Fields) -> Result<(), ValidationError> {
        for fieldname in fields.keys() {
            match self.field(fieldname) {
                Some(field) if field.fieldtype != FieldType::Table => {}
                _ => {
                    return Err(ValidationError::UnknownField {
                        doctype: self.def.name.to_string(),
                        field: fieldname.clone(),
                    });
                }
            }
        }

        for field in self.def.fields.iter().filter(|f| f.reqd) {
            let present = fields.get(&field.fieldname).is_some_and(|v| !v.is_empty());
            if !present {
                return Err(ValidationError::MissingMandatory {
                    doctype: self.def.name.to_string(),
                    field: field.fieldname.clone(),
                });
            }
        }

        Ok(())
    }

    /// Checks a child row against this (child) meta.
    pub fn validate_row(&self, row: &ChildRow) -> Result<(), ValidationError> {
        self.validate_fields(&row.fields)
    }

    /// Resolves the child doctype of a table field.
    pub fn child_doctype(&self, table_field: &str) -> Result<DocType, ValidationError> {
        let field = self
            .field(table_field)
            .filter(|f| f.fieldtype == FieldType::Table)
            .ok_or_else(|| ValidationError::NotATable {
                doctype: self.def.name.to_string(),
                field: table_field.to_string(),
            })?;

        field
            .options
            .as_deref()
            .and_then(|options| DocType::try_from(options).ok())
            .ok_or_else(|| ValidationError::InvalidTableOptions {
                doctype: self.def.name.to_string(),
                field: table_field.to_string(),
            })
    }
}
