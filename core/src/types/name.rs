//! Validated identifiers for doctypes and documents.

use nutype::nutype;

pub const MAX_NAME_LENGTH: usize = 140;

/// Name of a document type, e.g. `Event`.
#[nutype(
    sanitize(trim),
    validate(not_empty, len_char_max = MAX_NAME_LENGTH),
    derive(
        Debug,
        Clone,
        PartialEq,
        Eq,
        PartialOrd,
        Ord,
        AsRef,
        Deref,
        TryFrom,
        Into,
        Hash,
        Borrow,
        Display,
        Serialize,
        Deserialize,
    )
)]
pub struct DocType(String);

/// Name of a single document, unique within its doctype.
#[nutype(
    sanitize(trim),
    validate(not_empty, len_char_max = MAX_NAME_LENGTH),
    derive(
        Debug,
        Clone,
        PartialEq,
        Eq,
        PartialOrd,
        Ord,
        AsRef,
        Deref,
        TryFrom,
        Into,
        Hash,
        Borrow,
        Display,
        Serialize,
        Deserialize,
    )
)]
pub struct DocName(String);
