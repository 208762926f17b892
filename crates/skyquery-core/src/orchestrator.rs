// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use crate::engine::{EngineError, ScrapeEngine, SessionGuard, TripResults};
use crate::task::{ConcreteTask, Leg};
use crate::writer::{ResultWriter, WriteError};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

pub const DEFAULT_WORKERS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionMode {
    #[default]
    Serial,
    Parallel { workers: usize },
}

impl std::fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExecutionMode::Serial => f.write_str("serial"),
            ExecutionMode::Parallel { workers } => write!(f, "parallel ({} workers)", workers),
        }
    }
}

/// What serial mode does after a task fails. Parallel mode always keeps
/// going: sibling tasks are already in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FailurePolicy {
    #[default]
    #[serde(rename = "continue")]
    ContinueAndCollect,
    #[serde(rename = "abort")]
    AbortOnFirstError,
}

#[derive(Error, Debug)]
pub enum TaskError {
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("failed to save results: {0}")]
    Write(#[from] WriteError),
}

#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error("Parallel execution needs at least one worker")]
    NoWorkers,
    #[error("Failed to build worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

#[derive(Debug)]
pub struct TaskOutcome {
    pub task: ConcreteTask,
    pub result: Result<Vec<PathBuf>, TaskError>,
}

#[derive(Debug, Default)]
pub struct ExecutionReport {
    pub outcomes: Vec<TaskOutcome>,
    /// Set when the abort policy stopped a serial batch early.
    pub aborted: bool,
}

impl ExecutionReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    pub fn failed(&self) -> impl Iterator<Item = (&ConcreteTask, &TaskError)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (&o.task, e)))
    }

    pub fn files_written(&self) -> Vec<&PathBuf> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().ok())
            .flatten()
            .collect()
    }
}

pub struct Orchestrator<'a> {
    engine: &'a dyn ScrapeEngine,
    writer: &'a ResultWriter,
    mode: ExecutionMode,
    policy: FailurePolicy,
}

impl<'a> Orchestrator<'a> {
    pub fn new(engine: &'a dyn ScrapeEngine, writer: &'a ResultWriter) -> Self {
        Self {
            engine,
            writer,
            mode: ExecutionMode::default(),
            policy: FailurePolicy::default(),
        }
    }

    pub fn mode(mut self, mode: ExecutionMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn run(&self, tasks: &[ConcreteTask]) -> Result<ExecutionReport, OrchestratorError> {
        log::info!(
            "[Orchestrator] Executing {} tasks — mode={}",
            tasks.len(),
            self.mode
        );
        match self.mode {
            ExecutionMode::Serial => Ok(self.run_serial(tasks)),
            ExecutionMode::Parallel { workers } => self.run_parallel(tasks, workers),
        }
    }

    fn run_serial(&self, tasks: &[ConcreteTask]) -> ExecutionReport {
        let mut report = ExecutionReport::default();
        for (i, task) in tasks.iter().enumerate() {
            let outcome = self.execute(task);
            let failed = outcome.result.is_err();
            report.outcomes.push(outcome);

            if failed && self.policy == FailurePolicy::AbortOnFirstError {
                let remaining = tasks.len() - i - 1;
                log::error!(
                    "[Orchestrator] Aborting after failed task {} — remaining={}",
                    task,
                    remaining
                );
                report.aborted = remaining > 0;
                break;
            }
        }
        report
    }

    fn run_parallel(
        &self,
        tasks: &[ConcreteTask],
        workers: usize,
    ) -> Result<ExecutionReport, OrchestratorError> {
        if workers == 0 {
            return Err(OrchestratorError::NoWorkers);
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("skyquery-worker-{}", i))
            .build()?;

        let outcomes = pool.install(|| {
            tasks
                .par_iter()
                // One task per worker at a time; no work splitting inside a task.
                .with_max_len(1)
                .map(|task| self.execute(task))
                .collect()
        });

        Ok(ExecutionReport {
            outcomes,
            aborted: false,
        })
    }

    fn execute(&self, task: &ConcreteTask) -> TaskOutcome {
        log::info!("[Orchestrator] Searching {}", task);
        let result = self.search_and_save(task);
        if let Err(e) = &result {
            log::error!("[Orchestrator] Task {} failed: {}", task, e);
        }
        TaskOutcome {
            task: task.clone(),
            result,
        }
    }

    fn search_and_save(&self, task: &ConcreteTask) -> Result<Vec<PathBuf>, TaskError> {
        let results = {
            let mut session = SessionGuard::open(self.engine)?;
            session.search(task)?
        };
        self.save(task, results)
    }

    fn save(&self, task: &ConcreteTask, results: TripResults) -> Result<Vec<PathBuf>, TaskError> {
        let mut written = Vec::new();
        for route in task.legs() {
            let flights = match route.leg {
                Leg::Outbound => &results.outbound,
                Leg::Return => results.inbound.as_ref().ok_or(EngineError::MissingReturnLeg)?,
            };
            written.push(self.writer.write_leg(&route, flights)?);
        }
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{FlightRecord, SearchSession};
    use crate::writer::OutputFormat;
    use chrono::NaiveDate;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct Recorder {
        searched: Mutex<Vec<String>>,
        open: AtomicUsize,
        max_open: AtomicUsize,
        closed: AtomicUsize,
    }

    struct FakeEngine {
        recorder: Arc<Recorder>,
        fail_on: Option<&'static str>,
    }

    struct FakeSession {
        recorder: Arc<Recorder>,
        fail_on: Option<&'static str>,
        closed: bool,
    }

    impl ScrapeEngine for FakeEngine {
        fn open_session(&self) -> Result<Box<dyn SearchSession>, EngineError> {
            let now = self.recorder.open.fetch_add(1, Ordering::SeqCst) + 1;
            self.recorder.max_open.fetch_max(now, Ordering::SeqCst);
            Ok(Box::new(FakeSession {
                recorder: self.recorder.clone(),
                fail_on: self.fail_on,
                closed: false,
            }))
        }
    }

    impl SearchSession for FakeSession {
        fn search(&mut self, task: &ConcreteTask) -> Result<TripResults, EngineError> {
            std::thread::sleep(std::time::Duration::from_millis(20));
            self.recorder
                .searched
                .lock()
                .unwrap()
                .push(task.destination_code().to_string());
            if Some(task.destination_code()) == self.fail_on {
                return Err(EngineError::BotDetected("blocked".to_string()));
            }
            let flight = FlightRecord {
                depart: "d".to_string(),
                arrive: "a".to_string(),
                stops: "Nonstop".to_string(),
                price: "10.00".to_string(),
                details: Vec::new(),
            };
            Ok(TripResults {
                outbound: vec![flight.clone()],
                inbound: task.return_date().map(|_| vec![flight]),
            })
        }

        fn close(&mut self) -> Result<(), EngineError> {
            if !self.closed {
                self.closed = true;
                self.recorder.open.fetch_sub(1, Ordering::SeqCst);
                self.recorder.closed.fetch_add(1, Ordering::SeqCst);
            }
            Ok(())
        }
    }

    fn tasks(destinations: &[&str], round_trip: bool) -> Vec<ConcreteTask> {
        let date = NaiveDate::from_ymd_opt(2118, 3, 10).unwrap();
        let back = round_trip.then(|| NaiveDate::from_ymd_opt(2118, 3, 12).unwrap());
        destinations
            .iter()
            .map(|d| ConcreteTask::new("BHM", d, date, back))
            .collect()
    }

    #[test]
    fn test_serial_preserves_order_and_writes_legs() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ResultWriter::new(dir.path(), OutputFormat::Json);
        let recorder = Arc::new(Recorder::default());
        let engine = FakeEngine { recorder: recorder.clone(), fail_on: None };

        let batch = tasks(&["MOB", "SFO", "LAX"], true);
        let report = Orchestrator::new(&engine, &writer).run(&batch).unwrap();

        assert_eq!(*recorder.searched.lock().unwrap(), vec!["MOB", "SFO", "LAX"]);
        assert_eq!(report.succeeded(), 3);
        // Two legs per round trip
        assert_eq!(report.files_written().len(), 6);
        assert_eq!(recorder.closed.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_serial_continue_collects_failures() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ResultWriter::new(dir.path(), OutputFormat::Json);
        let recorder = Arc::new(Recorder::default());
        let engine = FakeEngine { recorder: recorder.clone(), fail_on: Some("SFO") };

        let batch = tasks(&["MOB", "SFO", "LAX"], false);
        let report = Orchestrator::new(&engine, &writer).run(&batch).unwrap();

        assert_eq!(report.outcomes.len(), 3);
        assert_eq!(report.succeeded(), 2);
        let failed: Vec<_> = report.failed().collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].0.destination_code(), "SFO");
        assert!(!report.aborted);
        // Failed sessions are released too
        assert_eq!(recorder.closed.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_serial_abort_stops_batch() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ResultWriter::new(dir.path(), OutputFormat::Json);
        let recorder = Arc::new(Recorder::default());
        let engine = FakeEngine { recorder: recorder.clone(), fail_on: Some("SFO") };

        let batch = tasks(&["MOB", "SFO", "LAX"], false);
        let report = Orchestrator::new(&engine, &writer)
            .policy(FailurePolicy::AbortOnFirstError)
            .run(&batch)
            .unwrap();

        assert!(report.aborted);
        assert_eq!(report.outcomes.len(), 2);
        assert_eq!(*recorder.searched.lock().unwrap(), vec!["MOB", "SFO"]);
    }

    #[test]
    fn test_parallel_runs_every_task_within_pool_width() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ResultWriter::new(dir.path(), OutputFormat::Json);
        let recorder = Arc::new(Recorder::default());
        let engine = FakeEngine { recorder: recorder.clone(), fail_on: Some("C") };

        let batch = tasks(&["A", "B", "C", "D", "E", "F", "G", "H"], false);
        let report = Orchestrator::new(&engine, &writer)
            .mode(ExecutionMode::Parallel { workers: 2 })
            .policy(FailurePolicy::AbortOnFirstError)
            .run(&batch)
            .unwrap();

        assert_eq!(report.outcomes.len(), 8);
        assert_eq!(report.succeeded(), 7);
        assert!(!report.aborted);
        assert!(recorder.max_open.load(Ordering::SeqCst) <= 2);
        assert_eq!(recorder.closed.load(Ordering::SeqCst), 8);

        let mut searched = recorder.searched.lock().unwrap().clone();
        searched.sort();
        assert_eq!(searched, vec!["A", "B", "C", "D", "E", "F", "G", "H"]);

        // Same-second writes from different workers never share a name
        let mut files = report.files_written();
        let total = files.len();
        files.sort();
        files.dedup();
        assert_eq!(files.len(), total);
    }

    #[test]
    fn test_parallel_rejects_zero_workers() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ResultWriter::new(dir.path(), OutputFormat::Json);
        let engine = FakeEngine { recorder: Arc::new(Recorder::default()), fail_on: None };
        let result = Orchestrator::new(&engine, &writer)
            .mode(ExecutionMode::Parallel { workers: 0 })
            .run(&tasks(&["MOB"], false));
        assert!(matches!(result, Err(OrchestratorError::NoWorkers)));
    }
}
