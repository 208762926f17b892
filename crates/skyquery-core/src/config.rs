// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use crate::orchestrator::{FailurePolicy, DEFAULT_WORKERS};
use crate::writer::OutputFormat;
use directories::ProjectDirs;
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

pub const MAX_WORKERS: usize = 64;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Scraper program started once per task.
    pub program: String,
    pub args: Vec<String>,
    /// Upper bound on how long the scraper waits for a result page.
    pub load_wait_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            program: "skyquery-scraper".to_string(),
            args: Vec::new(),
            load_wait_secs: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkyqueryConfig {
    pub airports_file: PathBuf,
    pub tasks_file: PathBuf,
    pub output_dir: PathBuf,
    pub output_format: String,
    pub workers: usize,
    pub failure_policy: FailurePolicy,
    pub log_level: String,
    pub engine: EngineConfig,
}

impl Default for SkyqueryConfig {
    fn default() -> Self {
        Self {
            airports_file: PathBuf::from("airports.json"),
            tasks_file: PathBuf::from("search_tasks.json"),
            output_dir: PathBuf::from("."),
            output_format: "json".to_string(),
            workers: DEFAULT_WORKERS,
            failure_policy: FailurePolicy::default(),
            log_level: "info".to_string(),
            engine: EngineConfig::default(),
        }
    }
}

impl SkyqueryConfig {
    pub fn default_path() -> PathBuf {
        ProjectDirs::from("org", "skyquery", "skyquery")
            .map(|dirs| dirs.config_dir().join("config.json"))
            .unwrap_or_else(|| PathBuf::from("config.json"))
    }

    /// Loads from `path`, or from the per-user config dir when `None`.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => Self::load_from_path(p),
            None => Self::load_from_path(&Self::default_path()),
        }
    }

    /// A missing file yields the defaults; a file that exists must parse.
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            log::debug!("[Config] No config at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content).map_err(|e| {
            log::error!("[Config] JSON parse error for {:?}: {}", path, e);
            e
        })?;
        log::debug!("[Config] Loaded {:?}", path);
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 || self.workers > MAX_WORKERS {
            return Err(ConfigError::Invalid(format!(
                "workers must be between 1 and {}, got {}",
                MAX_WORKERS, self.workers
            )));
        }
        self.level_filter()?;
        self.format()?;
        if self.engine.program.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "engine program must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn level_filter(&self) -> Result<LevelFilter, ConfigError> {
        LevelFilter::from_str(self.log_level.trim())
            .map_err(|_| ConfigError::Invalid(format!("unknown log level '{}'", self.log_level)))
    }

    pub fn format(&self) -> Result<OutputFormat, ConfigError> {
        self.output_format
            .parse()
            .map_err(|e| ConfigError::Invalid(format!("{}", e)))
    }

    pub fn load_wait(&self) -> Duration {
        Duration::from_secs(self.engine.load_wait_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let config = SkyqueryConfig::load_from_path(&dir.path().join("config.json")).unwrap();
        assert_eq!(config, SkyqueryConfig::default());
        assert_eq!(config.workers, 4);
        assert_eq!(config.tasks_file, PathBuf::from("search_tasks.json"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{"workers": 8, "failure_policy": "abort", "engine": {"program": "scrape.sh"}}"#,
        )
        .unwrap();

        let config = SkyqueryConfig::load(Some(&path)).unwrap();
        assert_eq!(config.workers, 8);
        assert_eq!(config.failure_policy, FailurePolicy::AbortOnFirstError);
        assert_eq!(config.engine.program, "scrape.sh");
        assert_eq!(config.engine.load_wait_secs, 10);
        assert_eq!(config.load_wait(), Duration::from_secs(10));
        assert_eq!(config.airports_file, PathBuf::from("airports.json"));
    }

    #[test]
    fn test_malformed_file_is_parse_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ workers: ").unwrap();
        assert!(matches!(
            SkyqueryConfig::load_from_path(&path),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = SkyqueryConfig::default();
        config.workers = 0;
        assert!(config.validate().is_err());
        config.workers = MAX_WORKERS + 1;
        assert!(config.validate().is_err());
        config.workers = MAX_WORKERS;
        assert!(config.validate().is_ok());

        let mut config = SkyqueryConfig::default();
        config.log_level = "loud".to_string();
        assert!(config.validate().is_err());

        let mut config = SkyqueryConfig::default();
        config.output_format = "csv".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(m)) if m.contains("csv")));

        let mut config = SkyqueryConfig::default();
        config.engine.program = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_level_filter_is_case_insensitive() {
        let mut config = SkyqueryConfig::default();
        config.log_level = "DEBUG".to_string();
        assert_eq!(config.level_filter().unwrap(), LevelFilter::Debug);
    }
}
