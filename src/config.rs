use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Result, TodoError};
use crate::view::PageSize;

pub const DEFAULT_ENDPOINT: &str = "http://localhost:8000/graphql";

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub endpoint: String,
    pub page_size: usize,
    pub request_timeout_secs: u64,
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            page_size: PageSize::default().rows(),
            request_timeout_secs: 30,
            log_file: None,
        }
    }
}

fn config_path() -> Option<PathBuf> {
    let config_dir = dirs::config_dir()?;
    Some(config_dir.join("todoview").join("config.toml"))
}

impl Config {
    /// Load from the default location, falling back to defaults when the
    /// file is missing, unreadable or invalid. An invalid file is handed
    /// back alongside the defaults so it can be reported once logging is up.
    pub fn load() -> (Self, Option<TodoError>) {
        match config_path() {
            Some(path) => Self::load_or_default(&path),
            None => (Config::default(), None),
        }
    }

    fn load_or_default(path: &Path) -> (Self, Option<TodoError>) {
        let Ok(content) = std::fs::read_to_string(path) else {
            return (Config::default(), None);
        };

        match Self::parse(&content) {
            Ok(config) => (config, None),
            Err(TodoError::Config(msg)) => (
                Config::default(),
                Some(TodoError::Config(format!("{}: {}", path.display(), msg))),
            ),
            Err(e) => (Config::default(), Some(e)),
        }
    }

    /// Load an explicitly requested file; any failure is an error.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(content).map_err(|e| TodoError::Config(e.to_string()))?;
        config.page_size()?;
        if config.endpoint.trim().is_empty() {
            return Err(TodoError::Config("endpoint must not be empty".to_string()));
        }
        Ok(config)
    }

    pub fn page_size(&self) -> Result<PageSize> {
        PageSize::try_from(self.page_size)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
