use std::fs;
use std::io;
use std::path::Path;
use std::time::Duration;

use linetools_core::SortSettings;
use serde::Deserialize;

use crate::filter::FilterOptions;

/// Session settings, read once per run and passed by value to every command.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct Config {
    pub match_case: bool,
    pub remove_duplicates: bool,
    pub natural_order: bool,
    /// Seconds before a filter is killed; unset waits forever.
    pub filter_timeout_secs: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            match_case: true,
            remove_duplicates: false,
            natural_order: false,
            filter_timeout_secs: None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] io::Error),
    #[error("bad config: {0}")]
    BadConfig(#[from] toml::de::Error),
}

impl Config {
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config = Self::from_toml(&contents)?;
        log::debug!("loaded config from {}: {config:?}", path.display());
        Ok(config)
    }

    pub fn sort_settings(&self) -> SortSettings {
        SortSettings {
            match_case: self.match_case,
            remove_duplicates: self.remove_duplicates,
            natural: self.natural_order,
        }
    }

    pub fn filter_options(&self) -> FilterOptions {
        FilterOptions {
            timeout: self.filter_timeout_secs.map(Duration::from_secs),
        }
    }
}
