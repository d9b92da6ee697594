pub mod core;
pub mod types;

pub use crate::core::FolioCore;
pub use crate::core::db::error::DatabaseError;
pub use crate::core::error::FolioError;
pub use crate::core::observer::{DocumentObserver, MetaSource, ObserverError};
