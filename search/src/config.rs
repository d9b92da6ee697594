use folio_core::types::SearchSettings;

pub use folio_core::types::{CaseMatching, MatchKind};

#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub case_matching: CaseMatching,
    pub unicode_normalization: bool,
    pub match_kind: MatchKind,
    /// Results returned when a query sets no limit of its own.
    pub result_limit: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self::from(&SearchSettings::default())
    }
}

impl From<&SearchSettings> for SearchConfig {
    fn from(settings: &SearchSettings) -> Self {
        Self {
            case_matching: settings.case_matching,
            unicode_normalization: settings.unicode_normalization,
            match_kind: settings.match_kind,
            result_limit: settings.result_limit.max(1),
        }
    }
}
