use crate::types::value::FieldValue;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::SystemTime;

use super::DocumentVariant;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredDocument {
    pub metadata: Metadata,
    pub fields: BTreeMap<String, FieldValue>,
    pub children: BTreeMap<String, Vec<StoredRow>>,
}

impl DocumentVariant for StoredDocument {
    const VERSION: u8 = 1;
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub created_at: SystemTime,
    pub modified_at: SystemTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRow {
    pub idx: u32,
    pub fields: BTreeMap<String, FieldValue>,
}
