// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

//! Flight search batch runner: turns loose search requests (airport codes,
//! city or state names, dates) into concrete airport-pair searches and runs
//! them through a scrape engine, serially or on a bounded worker pool.

pub mod command_engine;
pub mod config;
pub mod dates;
pub mod directory;
pub mod engine;
pub mod orchestrator;
pub mod quantize;
pub mod request;
pub mod resolver;
pub mod task;
pub mod writer;

pub use command_engine::CommandEngine;
pub use config::{ConfigError, SkyqueryConfig};
pub use directory::{AirportDirectory, AirportRecord, DirectoryError};
pub use engine::{EngineError, ScrapeEngine, SearchSession, SessionGuard, TripResults};
pub use orchestrator::{ExecutionMode, ExecutionReport, FailurePolicy, Orchestrator};
pub use quantize::{Quantization, QuantizeError, Quantizer, SkipReason};
pub use request::{RequestError, SearchRequest};
pub use task::{ConcreteTask, Trip, TripType};
pub use writer::{OutputFormat, ResultWriter, WriteError};
