// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use crate::engine::FlightRecord;
use crate::task::LegRoute;
use chrono::{DateTime, Local};
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;

const MAX_NAME_ATTEMPTS: usize = 64;

#[derive(Error, Debug)]
pub enum WriteError {
    #[error("Unsupported file format for saving data: '{0}'")]
    UnsupportedFormat(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("Could not find a free file name for {0}")]
    NameExhausted(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Json,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = WriteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            _ => Err(WriteError::UnsupportedFormat(s.to_string())),
        }
    }
}

/// Persists one result file per scraped leg.
///
/// Names follow `{from}_{to}{yyyy}-{mm}-{dd}-{HHMMSS}-{seq}.{ext}`. The
/// timestamp is taken when the file is written; `seq` comes from a counter
/// owned by this writer and shared by every worker using it. Files are
/// created with create-new, so neither two workers nor two writers on the
/// same directory can overwrite each other.
#[derive(Debug)]
pub struct ResultWriter {
    dir: PathBuf,
    format: OutputFormat,
    counter: AtomicU64,
}

impl ResultWriter {
    pub fn new<P: AsRef<Path>>(dir: P, format: OutputFormat) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            format,
            counter: AtomicU64::new(0),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn file_name(&self, route: &LegRoute<'_>, written_at: DateTime<Local>, seq: u64) -> String {
        format!(
            "{}_{}{}-{}-{:04}.{}",
            route.from,
            route.to,
            route.date.format("%Y-%m-%d"),
            written_at.format("%H%M%S"),
            seq,
            self.format.extension()
        )
    }

    pub fn write_leg(
        &self,
        route: &LegRoute<'_>,
        flights: &[FlightRecord],
    ) -> Result<PathBuf, WriteError> {
        let content = match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(flights)?,
        };

        fs::create_dir_all(&self.dir)?;

        for _ in 0..MAX_NAME_ATTEMPTS {
            let seq = self.counter.fetch_add(1, Ordering::Relaxed);
            let path = self.dir.join(self.file_name(route, Local::now(), seq));

            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(mut file) => {
                    file.write_all(content.as_bytes())?;
                    log::info!(
                        "[Writer] Saved {} flights — path={}",
                        flights.len(),
                        path.display()
                    );
                    return Ok(path);
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    log::debug!("[Writer] Name taken, advancing — path={}", path.display());
                    continue;
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(WriteError::NameExhausted(format!("{}_{}", route.from, route.to)))
    }
}
