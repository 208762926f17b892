// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

//! Scrape engine backed by an external scraper program.
//!
//! For every task the program is started once. It receives the task as a
//! JSON object on stdin and answers on stdout with either
//! `{"outbound": [...], "inbound": [...]}` or
//! `{"error": {"kind": "...", "message": "..."}}`. Its stderr is passed
//! through untouched.

use crate::engine::{EngineError, ScrapeEngine, SearchSession, TripResults};
use crate::task::{ConcreteTask, TripType};
use serde::{Deserialize, Serialize};
use std::io::{ErrorKind, Read, Write};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::Duration;

/// Environment variable carrying the page-load wait cap, in seconds.
pub const LOAD_WAIT_ENV: &str = "SKYQUERY_LOAD_WAIT_SECS";

#[derive(Debug, Serialize)]
struct TaskPayload {
    departure: String,
    destination: String,
    date: String,
    return_date: Option<String>,
    trip_type: TripType,
}

impl From<&ConcreteTask> for TaskPayload {
    fn from(task: &ConcreteTask) -> Self {
        Self {
            departure: task.departure_code().to_string(),
            destination: task.destination_code().to_string(),
            date: task.date_string(),
            return_date: task.return_date_string(),
            trip_type: task.trip_type(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    kind: String,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Response {
    Failure { error: ErrorBody },
    Success(TripResults),
}

#[derive(Debug, Clone)]
pub struct CommandEngine {
    program: String,
    args: Vec<String>,
    load_wait: Duration,
}

impl CommandEngine {
    pub fn new(program: &str, args: &[String], load_wait: Duration) -> Self {
        Self {
            program: program.to_string(),
            args: args.to_vec(),
            load_wait,
        }
    }
}

impl ScrapeEngine for CommandEngine {
    fn open_session(&self) -> Result<Box<dyn SearchSession>, EngineError> {
        Ok(Box::new(CommandSession {
            engine: self.clone(),
            child: None,
        }))
    }
}

pub struct CommandSession {
    engine: CommandEngine,
    child: Option<Child>,
}

impl CommandSession {
    fn spawn(&mut self) -> Result<&mut Child, EngineError> {
        let child = Command::new(&self.engine.program)
            .args(&self.engine.args)
            .env(LOAD_WAIT_ENV, self.engine.load_wait.as_secs().to_string())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| {
                EngineError::Session(format!("failed to start '{}': {}", self.engine.program, e))
            })?;
        Ok(self.child.insert(child))
    }

    fn exchange(&mut self, payload: &[u8]) -> Result<(ExitStatus, String), EngineError> {
        let child = self.spawn()?;

        if let Some(mut stdin) = child.stdin.take() {
            match stdin.write_all(payload) {
                Ok(()) => {}
                // The scraper may not care about its input.
                Err(e) if e.kind() == ErrorKind::BrokenPipe => {}
                Err(e) => return Err(e.into()),
            }
        }

        let mut output = String::new();
        if let Some(mut stdout) = child.stdout.take() {
            stdout.read_to_string(&mut output)?;
        }
        let status = child.wait()?;
        self.child = None;
        Ok((status, output))
    }
}

impl SearchSession for CommandSession {
    fn search(&mut self, task: &ConcreteTask) -> Result<TripResults, EngineError> {
        let payload = serde_json::to_vec(&TaskPayload::from(task))
            .map_err(|e| EngineError::Protocol(e.to_string()))?;

        log::debug!("[CommandEngine] Starting '{}' for {}", self.engine.program, task);
        let (status, output) = self.exchange(&payload)?;

        match serde_json::from_str::<Response>(output.trim()) {
            Ok(Response::Failure { error }) => Err(match error.kind.as_str() {
                "bot_detected" => EngineError::BotDetected(error.message),
                "invalid_search_field" => EngineError::InvalidSearchField(error.message),
                other => EngineError::Session(format!("{}: {}", other, error.message)),
            }),
            Ok(Response::Success(results)) if status.success() => Ok(results),
            Ok(Response::Success(_)) | Err(_) if !status.success() => Err(EngineError::Session(
                format!("'{}' exited with {}", self.engine.program, status),
            )),
            Ok(Response::Success(results)) => Ok(results),
            Err(e) => Err(EngineError::Protocol(e.to_string())),
        }
    }

    fn close(&mut self) -> Result<(), EngineError> {
        if let Some(mut child) = self.child.take() {
            if child.try_wait()?.is_none() {
                log::warn!(
                    "[CommandEngine] Killing scraper still running at session close — pid={}",
                    child.id()
                );
                child.kill()?;
                child.wait()?;
            }
        }
        Ok(())
    }
}
