mod app;
mod core;

pub use app::{AppConfig, AppConfigError, CaseMatching, MatchKind, SearchSettings};
pub use core::Config;
