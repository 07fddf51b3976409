//! Study Buddy - Main Entry Point

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use storage::{Repository, TIME_FORMAT};
use study_session::{init_logging, AppConfig, StudySession, TraceReader};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "study-buddy", version, about = "Webcam study attention monitor")]
struct Cli {
    /// Configuration file (TOML, JSON or YAML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a recorded landmark trace (JSON lines) through a study session
    Replay {
        /// Trace file
        trace: PathBuf,
        /// Override the configured username
        #[arg(long)]
        username: Option<String>,
        /// Start a pomodoro with the session
        #[arg(long)]
        pomodoro: bool,
        /// Do not persist the session
        #[arg(long)]
        no_save: bool,
    },
    /// List past sessions, newest first
    History,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref()).context("loading configuration")?;
    init_logging(&config.logging)?;

    info!("=== Study Buddy v{} ===", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Command::Replay {
            trace,
            username,
            pomodoro,
            no_save,
        } => replay(config, trace, username, pomodoro, no_save).await,
        Command::History => history(&config).await,
    }
}

async fn replay(
    config: AppConfig,
    trace: PathBuf,
    username: Option<String>,
    pomodoro: bool,
    no_save: bool,
) -> Result<()> {
    for setting in config.ignored_by_replay() {
        warn!("Ignored by replay: {}", setting);
    }

    let file = File::open(&trace).with_context(|| format!("opening trace {}", trace.display()))?;
    let mut source = TraceReader::new(BufReader::new(file));

    let mut session = StudySession::start(
        username.unwrap_or_else(|| config.session.username.clone()),
        Local::now().naive_local(),
        config.attention.clone(),
        config.alerts.clone(),
        config.session.pomodoro(),
    )?;
    if pomodoro {
        session.start_pomodoro();
    }

    let outcome = session.run(&mut source, |report| {
        if report.alerts.audible() {
            info!("{} [{}]", report.alerts.text(), report.status_line());
        }
        if report.pomodoro_completed {
            info!("Pomodoro complete! Take a short break.");
        }
    });
    if let Err(e) = &outcome {
        warn!("Trace ended early: {}", e);
    }

    let totals = session.totals();
    let record = session.finish(Local::now().naive_local());

    println!("Session for {}", record.username);
    println!(
        "  focused {:.1}s | drowsy {:.1}s | distracted {:.1}s | focus {:.1}% | alerts {}",
        totals.focused_seconds,
        totals.drowsy_seconds,
        totals.distracted_seconds,
        totals.focus_percent(),
        totals.alert_count
    );

    if !no_save {
        let repository = Repository::with_sqlite(&config.storage.database_url).await?;
        let id = repository.insert_session(record).await?;
        metrics::counter!("study_sessions_persisted_total").increment(1);
        info!("Session saved with ID {}", id);
    }

    outcome.map(|_| ()).map_err(Into::into)
}

async fn history(config: &AppConfig) -> Result<()> {
    let repository = Repository::with_sqlite(&config.storage.database_url).await?;
    let sessions = repository.fetch_all().await?;
    if sessions.is_empty() {
        println!("No study sessions recorded yet.");
        return Ok(());
    }

    println!(
        "{:>4}  {:<19}  {:<19}  {:>8}  {:>10}  {:>6}  {:>6}",
        "ID", "Start Time", "End Time", "Focused", "Distracted", "Drowsy", "Alerts"
    );
    for s in sessions {
        println!(
            "{:>4}  {:<19}  {:<19}  {:>8}  {:>10}  {:>6}  {:>6}",
            s.id,
            s.start_time.format(TIME_FORMAT),
            s.end_time.format(TIME_FORMAT),
            s.focused_seconds,
            s.distracted_seconds,
            s.drowsy_seconds,
            s.alerts
        );
    }
    Ok(())
}
