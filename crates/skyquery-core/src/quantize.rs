// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use crate::dates::{self, DateError};
use crate::directory::AirportDirectory;
use crate::request::{RequestError, SearchRequest};
use crate::resolver;
use crate::task::ConcreteTask;
use chrono::NaiveDate;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug)]
pub enum SkipReason {
    Malformed(RequestError),
    UnknownAirport { field: &'static str, name: String },
    InvalidDate(DateError),
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::Malformed(e) => write!(f, "{}", e),
            SkipReason::UnknownAirport { field, name } => {
                write!(f, "invalid airport name for {}: '{}'", field, name)
            }
            SkipReason::InvalidDate(e) => write!(f, "{}", e),
        }
    }
}

/// A batch entry that produced no tasks, with the entry as it was given.
#[derive(Debug)]
pub struct SkippedRequest {
    pub index: usize,
    pub input: String,
    pub reason: SkipReason,
}

#[derive(Debug, Default)]
pub struct Quantization {
    pub tasks: Vec<ConcreteTask>,
    pub skipped: Vec<SkippedRequest>,
}

#[derive(Error, Debug)]
pub enum QuantizeError {
    #[error("No tasks for execution found: the search batch is empty")]
    EmptyBatch,
    #[error("{}", no_tasks_message(.skipped))]
    NoTasks { skipped: Vec<SkippedRequest> },
}

impl QuantizeError {
    /// True when no entry even had the shape of a search request, as opposed
    /// to well-formed requests that failed to resolve or validate.
    pub fn is_malformed_input(&self) -> bool {
        match self {
            QuantizeError::EmptyBatch => true,
            QuantizeError::NoTasks { skipped } => skipped
                .iter()
                .all(|s| matches!(s.reason, SkipReason::Malformed(_))),
        }
    }
}

fn no_tasks_message(skipped: &[SkippedRequest]) -> String {
    let malformed = skipped
        .iter()
        .filter(|s| matches!(s.reason, SkipReason::Malformed(_)))
        .count();
    if malformed == skipped.len() {
        format!(
            "No tasks for execution found: none of the {} search requests is well-formed. Check input format!",
            skipped.len()
        )
    } else {
        format!(
            "No tasks for execution found: {} search requests were parsed but none resolved to a valid search ({} malformed)",
            skipped.len(),
            malformed
        )
    }
}

/// Expands loose search requests into concrete tasks. Each request is
/// handled on its own; a bad one is recorded and skipped.
pub struct Quantizer<'a> {
    directory: &'a AirportDirectory,
    today: NaiveDate,
}

impl<'a> Quantizer<'a> {
    pub fn new(directory: &'a AirportDirectory) -> Self {
        Self::with_today(directory, dates::today())
    }

    pub fn with_today(directory: &'a AirportDirectory, today: NaiveDate) -> Self {
        Self { directory, today }
    }

    /// Quantizes raw batch-file entries.
    pub fn quantize_values(&self, entries: &[Value]) -> Result<Quantization, QuantizeError> {
        self.quantize_entries(
            entries
                .iter()
                .map(|v| (v.to_string(), SearchRequest::from_value(v))),
        )
    }

    /// Quantizes already typed requests.
    pub fn quantize(&self, requests: &[SearchRequest]) -> Result<Quantization, QuantizeError> {
        self.quantize_entries(requests.iter().map(|r| {
            let input = serde_json::to_string(r).unwrap_or_else(|_| format!("{:?}", r));
            (input, Ok(r.clone()))
        }))
    }

    fn quantize_entries<I>(&self, entries: I) -> Result<Quantization, QuantizeError>
    where
        I: IntoIterator<Item = (String, Result<SearchRequest, RequestError>)>,
    {
        let mut result = Quantization::default();
        let mut seen_any = false;

        for (index, (input, parsed)) in entries.into_iter().enumerate() {
            seen_any = true;
            let outcome = parsed
                .map_err(SkipReason::Malformed)
                .and_then(|request| self.expand(&request));

            match outcome {
                Ok(tasks) => {
                    log::debug!(
                        "[Quantizer] Request #{} expanded into {} tasks",
                        index,
                        tasks.len()
                    );
                    result.tasks.extend(tasks);
                }
                Err(reason) => {
                    log::warn!(
                        "[Quantizer] Skipping request #{}: {} — input={}",
                        index,
                        reason,
                        input
                    );
                    result.skipped.push(SkippedRequest {
                        index,
                        input,
                        reason,
                    });
                }
            }
        }

        if !seen_any {
            return Err(QuantizeError::EmptyBatch);
        }
        if result.tasks.is_empty() {
            return Err(QuantizeError::NoTasks {
                skipped: result.skipped,
            });
        }

        log::info!(
            "[Quantizer] Formed {} tasks, skipped {} requests",
            result.tasks.len(),
            result.skipped.len()
        );
        Ok(result)
    }

    fn expand(&self, request: &SearchRequest) -> Result<Vec<ConcreteTask>, SkipReason> {
        let departures = self.codes_for("departure", &request.departure)?;
        let destinations = self.codes_for("destination", &request.destination)?;
        let checked = dates::check_dates_on(request, self.today).map_err(SkipReason::InvalidDate)?;

        let tasks = departures
            .iter()
            .flat_map(|from| {
                destinations.iter().map(move |to| {
                    ConcreteTask::new(from, to, checked.departure, checked.return_date)
                })
            })
            .collect();
        Ok(tasks)
    }

    fn codes_for(&self, field: &'static str, name: &str) -> Result<Vec<String>, SkipReason> {
        match resolver::resolve_name(self.directory, name) {
            Some((_, codes)) if !codes.is_empty() => Ok(codes),
            _ => Err(SkipReason::UnknownAirport {
                field,
                name: name.to_string(),
            }),
        }
    }
}
