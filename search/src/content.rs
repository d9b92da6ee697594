//! Derivation of global search content from documents.
//!
//! Content is a list of `"{label} : {value}"` parts joined with
//! [`FIELD_SEPARATOR`]: first the document's own searchable fields in
//! definition order, then the searchable fields of each child row, table by
//! table and row by row.

use folio_core::types::{Document, FieldType, FieldValue, Meta};
use folio_core::{FolioError, MetaSource};
use log::warn;
use regex::Regex;
use std::sync::LazyLock;

pub const FIELD_SEPARATOR: &str = "|||";

static SCRIPT_OR_STYLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>|<style\b[^>]*>.*?</style\s*>")
        .expect("valid script pattern")
});

static HTML_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").expect("valid tag pattern"));

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace pattern"));

#[derive(Debug, Clone, PartialEq, Eq)]
struct SearchableField {
    fieldname: String,
    label: String,
    fieldtype: FieldType,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct SearchableTable {
    fieldname: String,
    fields: Vec<SearchableField>,
}

/// The searchable field configuration of one doctype, including the
/// searchable fields of every child doctype it embeds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchableFields {
    fields: Vec<SearchableField>,
    tables: Vec<SearchableTable>,
}

impl SearchableFields {
    pub fn derive(meta: &Meta, metas: &dyn MetaSource) -> Result<Self, FolioError> {
        let fields = collect_fields(meta);

        let mut tables = Vec::new();
        for table in meta.table_fields() {
            let child_doctype = match meta.child_doctype(&table.fieldname) {
                Ok(child_doctype) => child_doctype,
                Err(err) => {
                    warn!("skipping table {} of {}: {err}", table.fieldname, meta.name());
                    continue;
                }
            };

            let child_fields = collect_fields(&metas.meta(&child_doctype)?);
            if !child_fields.is_empty() {
                tables.push(SearchableTable {
                    fieldname: table.fieldname.clone(),
                    fields: child_fields,
                });
            }
        }

        Ok(Self { fields, tables })
    }

    /// True if no document of this doctype can produce content.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.tables.is_empty()
    }

    /// Fieldnames contributing to content; child fields as `table.field`.
    pub fn fieldnames(&self) -> Vec<String> {
        let own = self.fields.iter().map(|f| f.fieldname.clone());
        let children = self.tables.iter().flat_map(|table| {
            table
                .fields
                .iter()
                .map(move |f| format!("{}.{}", table.fieldname, f.fieldname))
        });
        own.chain(children).collect()
    }

    /// Builds the content of a document, or `None` if no searchable field
    /// has a value.
    pub fn content(&self, document: &Document) -> Option<String> {
        let mut parts = Vec::new();

        for field in &self.fields {
            if let Some(part) = format_part(field, document.get(&field.fieldname)) {
                parts.push(part);
            }
        }

        for table in &self.tables {
            for row in document.rows(&table.fieldname) {
                for field in &table.fields {
                    if let Some(part) = format_part(field, row.get(&field.fieldname)) {
                        parts.push(part);
                    }
                }
            }
        }

        if parts.is_empty() {
            None
        } else {
            Some(parts.join(FIELD_SEPARATOR))
        }
    }
}

fn collect_fields(meta: &Meta) -> Vec<SearchableField> {
    meta.global_search_fields()
        .map(|f| SearchableField {
            fieldname: f.fieldname.clone(),
            label: f.label.clone(),
            fieldtype: f.fieldtype,
        })
        .collect()
}

fn format_part(field: &SearchableField, value: Option<&FieldValue>) -> Option<String> {
    let value = value.filter(|v| !v.is_empty())?;

    let text = match (field.fieldtype, value) {
        (FieldType::TextEditor, FieldValue::Text(html)) => strip_html(html),
        _ => value.to_string(),
    };

    if text.trim().is_empty() {
        return None;
    }
    Some(format!("{} : {}", field.label, text))
}

/// Drops markup, including script and style bodies, and collapses whitespace.
pub fn strip_html(html: &str) -> String {
    let text = SCRIPT_OR_STYLE.replace_all(html, " ");
    let text = HTML_TAG.replace_all(&text, " ");
    let text = text
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&amp;", "&");
    WHITESPACE.replace_all(&text, " ").trim().to_string()
}
