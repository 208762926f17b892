// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

//! Contract between the orchestrator and whatever drives the airline's
//! search form. An engine hands out sessions (one browser, one process,
//! one connection); a session runs searches for one task at a time.

use crate::task::ConcreteTask;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlightDetail {
    pub number: String,
    pub airplane: String,
}

/// One flight row of a result page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlightRecord {
    pub depart: String,
    pub arrive: String,
    pub stops: String,
    /// Lowest fare, or "N/A" when the site offers none.
    pub price: String,
    #[serde(default)]
    pub details: Vec<FlightDetail>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripResults {
    pub outbound: Vec<FlightRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inbound: Option<Vec<FlightRecord>>,
}

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Bot was detected: {0}")]
    BotDetected(String),
    #[error("Search field was filled wrong: {0}")]
    InvalidSearchField(String),
    #[error("Round trip search returned no return-leg results")]
    MissingReturnLeg,
    #[error("Search session failed: {0}")]
    Session(String),
    #[error("Malformed engine response: {0}")]
    Protocol(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub trait SearchSession: Send {
    /// Runs the search for `task` and returns the scraped legs.
    fn search(&mut self, task: &ConcreteTask) -> Result<TripResults, EngineError>;

    /// Releases the underlying resource. Must be safe to call twice.
    fn close(&mut self) -> Result<(), EngineError>;
}

pub trait ScrapeEngine: Send + Sync {
    fn open_session(&self) -> Result<Box<dyn SearchSession>, EngineError>;
}

/// Holds a session for the span of one task and closes it when dropped:
/// after a result, after an error, and while unwinding. A build with
/// `panic = "abort"` never unwinds, so a panicking engine leaves its
/// session open there.
pub struct SessionGuard {
    session: Box<dyn SearchSession>,
}

impl SessionGuard {
    pub fn open(engine: &dyn ScrapeEngine) -> Result<Self, EngineError> {
        let session = engine.open_session()?;
        Ok(Self { session })
    }

    pub fn search(&mut self, task: &ConcreteTask) -> Result<TripResults, EngineError> {
        let results = self.session.search(task)?;
        if task.return_date().is_some() && results.inbound.is_none() {
            return Err(EngineError::MissingReturnLeg);
        }
        Ok(results)
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        if let Err(e) = self.session.close() {
            log::warn!("[Engine] Failed to close search session: {}", e);
        }
    }
}
