// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::OnceLock;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AirportRecord {
    pub code: String,
    pub city: String,
    pub state: String,
}

#[derive(Error, Debug)]
pub enum DirectoryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: airport reference data is not valid after repair: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Read-only airport reference set. Loaded once, then shared by reference.
#[derive(Debug, Clone, Default)]
pub struct AirportDirectory {
    records: Vec<AirportRecord>,
}

impl AirportDirectory {
    pub fn new(records: Vec<AirportRecord>) -> Self {
        let records = records
            .into_iter()
            .map(|mut r| {
                r.code = r.code.trim().to_uppercase();
                r
            })
            .collect();
        Self { records }
    }

    /// Loads the reference file from disk. See [`AirportDirectory::parse`].
    pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Self, DirectoryError> {
        let path = path.as_ref();
        log::debug!("[Directory] Loading airport reference — path={}", path.display());
        let text = fs::read_to_string(path)?;
        let directory = Self::parse(&text)?;
        log::info!(
            "[Directory] Loaded {} airports — path={}",
            directory.len(),
            path.display()
        );
        Ok(directory)
    }

    /// Parses reference text. The upstream file is a run of JSON objects
    /// with no separating commas and no enclosing array; already valid
    /// arrays pass through untouched.
    pub fn parse(text: &str) -> Result<Self, DirectoryError> {
        let repaired = repair_concatenated(text);
        let records: Vec<AirportRecord> = serde_json::from_str(&repaired)?;
        Ok(Self::new(records))
    }

    pub fn records(&self) -> &[AirportRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

fn repair_concatenated(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return "[]".to_string();
    }
    if trimmed.starts_with('[') {
        return trimmed.to_string();
    }
    static RECORD_BOUNDARY: OnceLock<Regex> = OnceLock::new();
    let boundary = RECORD_BOUNDARY
        .get_or_init(|| Regex::new(r"\}\s*\{").expect("record boundary pattern is valid"));
    let joined = boundary.replace_all(trimmed, "},{");
    format!("[{}]", joined)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_concatenated_objects() {
        let data = r#"{"code": "BHM", "city": "Birmingham", "state": "Alabama"}{"code": "DHN", "city": "Dothan", "state": "Alabama"}
{"code": "sfo", "city": "San Francisco", "state": "California"}"#;
        let directory = AirportDirectory::parse(data).unwrap();

        assert_eq!(directory.len(), 3);
        assert_eq!(directory.records()[0].code, "BHM");
        assert_eq!(directory.records()[1].city, "Dothan");
        // Codes are canonicalized to uppercase on load
        assert_eq!(directory.records()[2].code, "SFO");
    }

    #[test]
    fn test_parse_accepts_proper_array() {
        let data = r#"[{"code": "MOB", "city": "Mobile", "state": "Alabama"}]"#;
        let directory = AirportDirectory::parse(data).unwrap();
        assert_eq!(directory.len(), 1);
    }

    #[test]
    fn test_parse_ignores_extra_fields() {
        let data = r#"{"code": "MGM", "city": "Montgomery", "state": "Alabama", "name": "Montgomery Rgnl"}"#;
        let directory = AirportDirectory::parse(data).unwrap();
        assert_eq!(directory.records()[0].code, "MGM");
    }

    #[test]
    fn test_parse_empty_text() {
        let directory = AirportDirectory::parse("  \n").unwrap();
        assert!(directory.is_empty());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let result = AirportDirectory::parse(r#"{"code": "BHM", "city": }{"#);
        assert!(matches!(result, Err(DirectoryError::Parse(_))));
    }

    #[test]
    fn test_parse_rejects_missing_field() {
        let result = AirportDirectory::parse(r#"{"code": "BHM", "city": "Birmingham"}"#);
        assert!(matches!(result, Err(DirectoryError::Parse(_))));
    }

    #[test]
    fn test_duplicates_are_tolerated() {
        let data = r#"{"code": "BHM", "city": "Birmingham", "state": "Alabama"}{"code": "BHM", "city": "Birmingham", "state": "Alabama"}"#;
        let directory = AirportDirectory::parse(data).unwrap();
        assert_eq!(directory.len(), 2);
    }

    #[test]
    fn test_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("airports.json");
        fs::write(
            &path,
            r#"{"code": "HSV", "city": "Huntsville", "state": "Alabama"}{"code": "MSL", "city": "Florence", "state": "Alabama"}"#,
        )
        .unwrap();

        let directory = AirportDirectory::load_file(&path).unwrap();
        assert_eq!(directory.len(), 2);
        assert_eq!(directory.records()[1].city, "Florence");
    }

    #[test]
    fn test_load_missing_file() {
        let result = AirportDirectory::load_file("/definitely/not/here/airports.json");
        assert!(matches!(result, Err(DirectoryError::Io(_))));
    }
}
