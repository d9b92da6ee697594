use std::path::PathBuf;

/// Core configuration for FolioCore initialization.
#[derive(Clone)]
pub struct Config {
    pub base_path: PathBuf,
}

impl Config {
    pub fn db_path(&self) -> PathBuf {
        self.base_path.join("folio.redb")
    }

    pub fn app_config_path(&self) -> PathBuf {
        self.base_path.join("config.toml")
    }
}
