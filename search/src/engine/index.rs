//! The `__global_search` table: (doctype, name) → content.

use crate::error::SearchError;
use crate::results::SearchIndexEntry;
use folio_core::types::{DocName, DocType};
use redb::{ReadTransaction, ReadableTable, ReadableTableMetadata, TableDefinition, WriteTransaction};

pub const GLOBAL_SEARCH_TABLE_NAME: &str = "__global_search";

pub(crate) const GLOBAL_SEARCH_TABLE: TableDefinition<(&str, &str), &str> =
    TableDefinition::new(GLOBAL_SEARCH_TABLE_NAME);

pub(crate) fn init(txn: &WriteTransaction) -> Result<(), SearchError> {
    txn.open_table(GLOBAL_SEARCH_TABLE)?;
    Ok(())
}

/// Writes or replaces the entry of one document.
pub(crate) fn upsert(
    txn: &WriteTransaction,
    doctype: &DocType,
    name: &DocName,
    content: &str,
) -> Result<(), SearchError> {
    let mut table = txn.open_table(GLOBAL_SEARCH_TABLE)?;
    table.insert((doctype.as_str(), name.as_str()), content)?;
    Ok(())
}

/// Returns `true` if the entry was present.
pub(crate) fn remove(
    txn: &WriteTransaction,
    doctype: &DocType,
    name: &DocName,
) -> Result<bool, SearchError> {
    let mut table = txn.open_table(GLOBAL_SEARCH_TABLE)?;
    Ok(table.remove((doctype.as_str(), name.as_str()))?.is_some())
}

/// Removes every entry of a doctype. Returns how many were removed.
pub(crate) fn remove_doctype(txn: &WriteTransaction, doctype: &DocType) -> Result<usize, SearchError> {
    let mut table = txn.open_table(GLOBAL_SEARCH_TABLE)?;

    let mut names = Vec::new();
    for entry in table.range((doctype.as_str(), "")..)? {
        let (key, _) = entry?;
        let (owner, name) = key.value();
        if owner != doctype.as_str() {
            break;
        }
        names.push(name.to_string());
    }

    for name in &names {
        table.remove((doctype.as_str(), name.as_str()))?;
    }
    Ok(names.len())
}

/// Drops and recreates the table. Returns how many entries it held.
pub(crate) fn clear(txn: &WriteTransaction) -> Result<u64, SearchError> {
    let count = txn.open_table(GLOBAL_SEARCH_TABLE)?.len()?;
    txn.delete_table(GLOBAL_SEARCH_TABLE)?;
    txn.open_table(GLOBAL_SEARCH_TABLE)?;
    Ok(count)
}

pub(crate) fn get(
    txn: &ReadTransaction,
    doctype: &DocType,
    name: &DocName,
) -> Result<Option<SearchIndexEntry>, SearchError> {
    let table = match txn.open_table(GLOBAL_SEARCH_TABLE) {
        Ok(table) => table,
        Err(redb::TableError::TableDoesNotExist(_)) => return Ok(None),
        Err(err) => return Err(err.into()),
    };

    Ok(table
        .get((doctype.as_str(), name.as_str()))?
        .map(|guard| SearchIndexEntry {
            doctype: doctype.clone(),
            name: name.clone(),
            content: guard.value().to_string(),
        }))
}

/// Calls `visit` for every entry, optionally restricted to one doctype, in
/// key order. A missing table visits nothing.
pub(crate) fn scan(
    txn: &ReadTransaction,
    doctype: Option<&DocType>,
    mut visit: impl FnMut(&str, &str, &str) -> Result<(), SearchError>,
) -> Result<(), SearchError> {
    let table = match txn.open_table(GLOBAL_SEARCH_TABLE) {
        Ok(table) => table,
        Err(redb::TableError::TableDoesNotExist(_)) => return Ok(()),
        Err(err) => return Err(err.into()),
    };

    let range = match doctype {
        Some(doctype) => table.range((doctype.as_str(), "")..)?,
        None => table.iter()?,
    };

    for entry in range {
        let (key, content) = entry?;
        let (owner, name) = key.value();
        if let Some(doctype) = doctype
            && owner != doctype.as_str()
        {
            break;
        }
        visit(owner, name, content.value())?;
    }
    Ok(())
}

pub(crate) fn parse_entry(doctype: &str, name: &str, content: &str) -> Result<SearchIndexEntry, SearchError> {
    let doctype = DocType::try_from(doctype)
        .map_err(|_| SearchError::InvalidEntry(format!("doctype {doctype:?}")))?;
    let name =
        DocName::try_from(name).map_err(|_| SearchError::InvalidEntry(format!("name {name:?}")))?;
    Ok(SearchIndexEntry {
        doctype,
        name,
        content: content.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_entry() {
        let entry = parse_entry("Event", "EV00001", "Subject : Hydrus").unwrap();
        assert_eq!(entry.doctype.as_str(), "Event");
        assert_eq!(entry.name.as_str(), "EV00001");
        assert_eq!(entry.content, "Subject : Hydrus");
    }

    #[test]
    fn test_parse_entry_rejects_blank_keys() {
        assert!(matches!(
            parse_entry("  ", "EV00001", "x"),
            Err(SearchError::InvalidEntry(_))
        ));
        assert!(matches!(
            parse_entry("Event", "", "x"),
            Err(SearchError::InvalidEntry(_))
        ));
    }
}
