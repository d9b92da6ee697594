pub(crate) mod config;
pub use config::{AppConfig, AppConfigError, CaseMatching, Config, MatchKind, SearchSettings};

pub(crate) mod name;
pub use name::{DocName, DocNameError, DocType, DocTypeError, MAX_NAME_LENGTH};

pub(crate) mod value;
pub use value::FieldValue;

pub(crate) mod document;
pub use document::{ChildRow, DocRef, Document, Fields, Metadata, NewDocument};

pub(crate) mod meta;
pub use meta::{DocTypeDef, FieldDef, FieldType, Meta, Naming, Property};

pub(crate) mod error;
pub use error::ValidationError;
