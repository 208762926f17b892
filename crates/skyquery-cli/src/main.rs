// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::LevelFilter;
use simplelog::{ColorChoice, TermLogger, TerminalMode};
use skyquery_core::quantize::Quantization;
use skyquery_core::request;
use skyquery_core::{
    AirportDirectory, CommandEngine, ExecutionMode, FailurePolicy, Orchestrator, Quantizer,
    ResultWriter, SearchRequest, SkyqueryConfig,
};
use std::ffi::OsString;
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Run tasks on a pool of workers
    #[arg(short = 'p', long, visible_alias = "sp", conflicts_with = "serial")]
    parallel: bool,

    /// Run tasks one after another (default)
    #[arg(short = 's', long, visible_alias = "ss")]
    serial: bool,

    /// Number of parallel workers
    #[arg(short, long)]
    workers: Option<usize>,

    /// Stop a serial run at the first failed task
    #[arg(long)]
    fail_fast: bool,

    /// Airport directory file
    #[arg(long, env = "SKYQUERY_AIRPORTS")]
    airports: Option<PathBuf>,

    /// Directory for result files
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Config file (defaults to the per-user config dir)
    #[arg(long, env = "SKYQUERY_CONFIG")]
    config: Option<PathBuf>,

    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    #[arg(short, long)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every search in a task file
    Run {
        /// Search task file (JSON array of requests)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
    /// Run a single search given on the command line
    Args {
        departure: String,
        destination: String,
        /// Departure date, mm/dd/yyyy
        date: String,
        /// Return date, mm/dd/yyyy; makes it a round trip
        return_date: Option<String>,
    },
}

impl Cli {
    fn execution_mode(&self, workers: usize) -> ExecutionMode {
        if self.serial || !self.parallel {
            ExecutionMode::Serial
        } else {
            ExecutionMode::Parallel { workers }
        }
    }
}

/// Maps the single-dash `-sp` / `-ss` mode switches onto their long flags;
/// clap would otherwise read them as bundled short flags.
fn normalize_args<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    args.into_iter()
        .map(|arg| match arg.to_str() {
            Some("-sp") => OsString::from("--parallel"),
            Some("-ss") => OsString::from("--serial"),
            _ => arg,
        })
        .collect()
}

fn main() -> Result<()> {
    let cli = Cli::parse_from(normalize_args(std::env::args_os()));

    let mut config = SkyqueryConfig::load(cli.config.as_deref()).context("Failed to load config")?;
    if let Some(workers) = cli.workers {
        config.workers = workers;
    }
    if let Some(dir) = &cli.output_dir {
        config.output_dir = dir.clone();
    }
    if let Some(path) = &cli.airports {
        config.airports_file = path.clone();
    }
    if cli.fail_fast {
        config.failure_policy = FailurePolicy::AbortOnFirstError;
    }
    config.validate()?;

    let level = if cli.verbose {
        LevelFilter::Debug
    } else if cli.quiet {
        LevelFilter::Warn
    } else {
        config.level_filter()?
    };
    TermLogger::init(
        level,
        simplelog::Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )?;

    let mode = cli.execution_mode(config.workers);

    let directory = AirportDirectory::load_file(&config.airports_file).with_context(|| {
        format!(
            "Failed to load airport directory {}",
            config.airports_file.display()
        )
    })?;
    let quantizer = Quantizer::new(&directory);

    let quantization = match &cli.command {
        Commands::Run { file } => {
            let path = file.clone().unwrap_or_else(|| config.tasks_file.clone());
            println!("Starting {} run from {}", mode, path.display());
            let entries = request::load_batch(&path)
                .with_context(|| format!("Failed to load search tasks {}", path.display()))?;
            quantizer.quantize_values(&entries)?
        }
        Commands::Args {
            departure,
            destination,
            date,
            return_date,
        } => {
            println!("Starting {} run from command line arguments", mode);
            let request = match return_date {
                Some(back) => SearchRequest::round_trip(departure, destination, date, back),
                None => SearchRequest::one_way(departure, destination, date),
            };
            quantizer.quantize(&[request])?
        }
    };
    print_skipped(&quantization);

    let engine = CommandEngine::new(
        &config.engine.program,
        &config.engine.args,
        config.load_wait(),
    );
    let writer = ResultWriter::new(&config.output_dir, config.format()?);
    let report = Orchestrator::new(&engine, &writer)
        .mode(mode)
        .policy(config.failure_policy)
        .run(&quantization.tasks)?;

    let failed: Vec<_> = report.failed().collect();
    println!(
        "{} of {} tasks succeeded, {} files written to {}",
        report.succeeded(),
        quantization.tasks.len(),
        report.files_written().len(),
        writer.dir().display()
    );
    for (task, error) in &failed {
        println!("  FAILED {}: {}", task, error);
    }
    if report.aborted {
        println!(
            "Stopped early: {} tasks were not run",
            quantization.tasks.len() - report.outcomes.len()
        );
    }
    println!("All jobs done!");

    if !failed.is_empty() || report.aborted {
        anyhow::bail!("{} tasks failed", failed.len());
    }
    Ok(())
}

fn print_skipped(quantization: &Quantization) {
    for skipped in &quantization.skipped {
        println!(
            "Skipped request #{}: {} ({})",
            skipped.index, skipped.reason, skipped.input
        );
    }
}
