// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use crate::task::TripType;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RequestError {
    #[error("search request is not a JSON object")]
    NotAnObject,
    #[error("search request is missing required key '{0}'")]
    MissingField(&'static str),
    #[error("search request field '{0}' is not a string")]
    NotAString(&'static str),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("search task file must contain a JSON array of requests: {0}")]
    Batch(String),
}

/// A loosely specified search as the user wrote it. Airport names may be
/// codes, cities or states; dates are unvalidated strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub departure: String,
    pub destination: String,
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_date: Option<String>,
}

impl SearchRequest {
    pub fn one_way(departure: &str, destination: &str, date: &str) -> Self {
        Self {
            departure: departure.to_string(),
            destination: destination.to_string(),
            date: date.to_string(),
            return_date: None,
        }
    }

    pub fn round_trip(departure: &str, destination: &str, date: &str, return_date: &str) -> Self {
        Self {
            return_date: Some(return_date.to_string()),
            ..Self::one_way(departure, destination, date)
        }
    }

    pub fn trip_type(&self) -> TripType {
        if self.return_date.is_some() {
            TripType::RoundTrip
        } else {
            TripType::OneWay
        }
    }

    /// Converts one raw batch entry. A `null` return date counts as absent.
    pub fn from_value(value: &Value) -> Result<Self, RequestError> {
        let object = value.as_object().ok_or(RequestError::NotAnObject)?;

        let required = |key: &'static str| -> Result<String, RequestError> {
            match object.get(key) {
                None => Err(RequestError::MissingField(key)),
                Some(Value::String(s)) => Ok(s.clone()),
                Some(_) => Err(RequestError::NotAString(key)),
            }
        };

        let return_date = match object.get("return_date") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(_) => return Err(RequestError::NotAString("return_date")),
        };

        Ok(Self {
            departure: required("departure")?,
            destination: required("destination")?,
            date: required("date")?,
            return_date,
        })
    }
}

/// Reads a search task file: a JSON array whose entries are kept raw so a
/// malformed entry only affects itself.
pub fn load_batch<P: AsRef<Path>>(path: P) -> Result<Vec<Value>, RequestError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)?;
    let value: Value =
        serde_json::from_str(&content).map_err(|e| RequestError::Batch(e.to_string()))?;
    match value {
        Value::Array(entries) => {
            log::debug!(
                "[Requests] Loaded {} raw search requests — path={}",
                entries.len(),
                path.display()
            );
            Ok(entries)
        }
        other => Err(RequestError::Batch(format!(
            "found {} at top level",
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
