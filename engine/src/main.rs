//! Main entry point for the engine binary
//!
//! Each subcommand runs one job against the JSON file store in `--data-dir`.
//! Sweeps are triggered externally (cron or an operator); `--at` replays a
//! specific instant.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};

use engine::{
    EngineConfig, EngineError, EngineResult, LeadershipPolicy, LockEngine, PerformanceImporter, RescoringJob,
    RosterStore,
    config::lock_window_minutes,
    services::{JsonFileStore, load_athletes, load_import_rows, load_roster, load_schedule},
};
use shared::{ParticipantId, ProcessId, logging, process_debug};

/// Season roster lock and scoring engine
#[derive(Parser)]
#[command(name = "engine")]
#[command(about = "Locks fantasy rosters at match start and scores them from performance data")]
pub struct Args {
    /// Directory holding state.json
    #[arg(long, global = true, default_value = "./data")]
    pub data_dir: PathBuf,

    /// Schedule JSON (defaults to <data-dir>/schedule.json)
    #[arg(long, global = true)]
    pub schedule: Option<PathBuf>,

    /// Athlete table JSON (defaults to <data-dir>/athletes.json)
    #[arg(long, global = true)]
    pub athletes: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    /// Override ENGINE_LOCK_WINDOW_MINUTES
    #[arg(long, global = true)]
    pub lock_window_minutes: Option<i64>,

    /// Override ENGINE_LEADERSHIP_POLICY (strict, auto-assign)
    #[arg(long, global = true)]
    pub leadership_policy: Option<LeadershipPolicy>,

    /// Override ENGINE_MAX_CONCURRENCY
    #[arg(long, global = true)]
    pub max_concurrency: Option<usize>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run one lock sweep
    Lock {
        /// Sweep instant (RFC 3339), defaults to now
        #[arg(long)]
        at: Option<DateTime<Utc>>,
    },
    /// Recompute every score entry and season total
    Rescore,
    /// Validate and upsert a batch of performance rows
    Import { file: PathBuf },
    /// Save a participant's working roster from a JSON upload
    Roster {
        #[arg(value_parser = parse_participant)]
        participant: ParticipantId,
        file: PathBuf,
    },
    /// Substitutions a participant has left for the next match
    Remaining {
        #[arg(value_parser = parse_participant)]
        participant: ParticipantId,
        #[arg(long)]
        at: Option<DateTime<Utc>>,
    },
    /// List lock windows that closed without a snapshot
    Missed {
        #[arg(long)]
        at: Option<DateTime<Utc>>,
    },
}

impl Command {
    fn process(&self) -> ProcessId {
        match self {
            Command::Lock { .. } => ProcessId::Locker,
            Command::Rescore => ProcessId::Rescorer,
            Command::Import { .. } => ProcessId::Importer,
            Command::Roster { .. } | Command::Remaining { .. } | Command::Missed { .. } => ProcessId::Cli,
        }
    }
}

fn parse_participant(s: &str) -> Result<ParticipantId, String> {
    ParticipantId::from_string(s).map_err(|e| format!("invalid participant id '{s}': {e}"))
}

fn reference_path(explicit: &Option<PathBuf>, data_dir: &Path, default_name: &str) -> PathBuf {
    explicit.clone().unwrap_or_else(|| data_dir.join(default_name))
}

fn load_config(args: &Args) -> EngineResult<EngineConfig> {
    let mut config = EngineConfig::from_env()?;
    if let Some(minutes) = args.lock_window_minutes {
        config.lock_window =
            lock_window_minutes(minutes).map_err(|e| EngineError::config(format!("--lock-window-minutes: {e}")))?;
    }
    if let Some(policy) = args.leadership_policy {
        config.leadership_policy = policy;
    }
    if let Some(limit) = args.max_concurrency {
        config.max_concurrency = limit;
    }
    config.validate()?;
    Ok(config)
}

fn print_json<T: serde::Serialize>(value: &T) -> EngineResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> EngineResult<()> {
    let args = Args::parse();

    ProcessId::init(args.command.process());
    shared::logging::init_tracing_with_level(Some(&args.log_level));
    logging::log_startup(ProcessId::current(), &format!("engine in {}", args.data_dir.display()));

    let config = load_config(&args)?;
    process_debug!(ProcessId::current(), "⚙️ {:?}", config);

    let store = Arc::new(JsonFileStore::open(&args.data_dir).await?);
    let schedule_path = reference_path(&args.schedule, &args.data_dir, "schedule.json");
    let athletes_path = reference_path(&args.athletes, &args.data_dir, "athletes.json");

    match args.command {
        Command::Lock { at } => {
            let schedule = Arc::new(load_schedule(&schedule_path).await?);
            let engine = LockEngine::new(Arc::clone(&store), Arc::clone(&store), schedule, config);
            let report = engine.sweep(at.unwrap_or_else(Utc::now)).await?;
            println!("{}", report.summary());
            print_json(&report.results)?;
        }
        Command::Rescore => {
            let catalog = Arc::new(load_athletes(&athletes_path).await?);
            let job = RescoringJob::new(Arc::clone(&store), Arc::clone(&store), Arc::clone(&store), catalog);
            let report = job.run().await?;
            print_json(&report)?;
        }
        Command::Import { file } => {
            let catalog = Arc::new(load_athletes(&athletes_path).await?);
            let schedule = Arc::new(load_schedule(&schedule_path).await?);
            let rows = load_import_rows(&file).await?;
            let importer = PerformanceImporter::new(Arc::clone(&store), catalog, schedule);
            match importer.import(&rows).await {
                Ok(summary) => println!(
                    "Imported {} record(s); re-score matches {:?}",
                    summary.records_written,
                    summary.matches.iter().map(|m| m.number()).collect::<Vec<_>>()
                ),
                Err(EngineError::Validation { errors }) => {
                    print_json(&errors)?;
                    return Err(EngineError::Validation { errors });
                }
                Err(e) => return Err(e),
            }
        }
        Command::Roster { participant, file } => {
            let catalog = load_athletes(&athletes_path).await?;
            let roster = load_roster(&file, &catalog).await?;
            let status = match roster.require_complete(&catalog) {
                Ok(()) => "complete".to_string(),
                Err(gap) => format!("incomplete: {gap}"),
            };
            store.save_working_roster(participant, roster).await?;
            println!("Saved roster for {participant} ({status})");
        }
        Command::Remaining { participant, at } => {
            let schedule = Arc::new(load_schedule(&schedule_path).await?);
            let engine = LockEngine::new(Arc::clone(&store), Arc::clone(&store), schedule, config);
            match engine.substitutions_remaining(participant, at.unwrap_or_else(Utc::now)).await? {
                Some(figure) => println!(
                    "{}: {} substitution(s) remaining for match {} ({})",
                    participant,
                    figure.remaining,
                    figure.match_id.number(),
                    figure.phase
                ),
                None => println!("{participant}: season complete"),
            }
        }
        Command::Missed { at } => {
            let schedule = Arc::new(load_schedule(&schedule_path).await?);
            let engine = LockEngine::new(Arc::clone(&store), Arc::clone(&store), schedule, config);
            let missed = engine.missed_locks(at.unwrap_or_else(Utc::now)).await?;
            print_json(&missed)?;
        }
    }

    logging::log_success(ProcessId::current(), "Done");
    Ok(())
}
