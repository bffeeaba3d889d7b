//! CLI interface for logreplay.
//!
//! A thin driver over the replay library. Each subcommand is
//! non-interactive: a log path and arguments in, text or JSON out.
//! Diagnostics go to stderr.

mod format;

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::thread;

use clap::{Parser, Subcommand};
use tracing::warn;

use logreplay::config::Config;
use logreplay::{ReplayCommand, ReplaySession, ReplayState};

use format::{format_event_line, format_offset, format_state};

/// logreplay: step through recorded event logs.
#[derive(Debug, Parser)]
#[command(name = "logreplay", version, after_long_help = WORKFLOW_HELP)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

const WORKFLOW_HELP: &str = r"Workflow: inspecting an operation log
  1. logreplay info ops.log
  2. logreplay range ops.log --start 1200 --end 1800
  3. logreplay show ops.log 14
  4. logreplay replay ops.log seek=10 step_forward step_forward step_back
  5. logreplay play ops.log --from 10 --realtime --rate 4

Commands for replay: play, pause, step_forward, step_back,
seek=<event index>, set_rate=<multiplier>";

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Summarize a log: event count, time bounds, duration.
    Info {
        /// Path to the JSONL event log.
        log: PathBuf,
    },

    /// Print one event as JSON.
    Show {
        /// Path to the JSONL event log.
        log: PathBuf,

        /// Zero-based event index.
        index: usize,
    },

    /// Print every event whose timestamp lies in `[start, end]`, one JSON object per line.
    Range {
        /// Path to the JSONL event log.
        log: PathBuf,

        /// Inclusive lower bound.
        #[arg(long, allow_hyphen_values = true)]
        start: i64,

        /// Inclusive upper bound.
        #[arg(long, allow_hyphen_values = true)]
        end: i64,
    },

    /// Apply a script of playback commands, printing the state after each.
    ///
    /// A rejected command is reported on stderr and leaves the state as it
    /// was; the rest of the script still runs.
    Replay {
        /// Path to the JSONL event log.
        log: PathBuf,

        /// Initial playback rate.
        #[arg(long)]
        rate: Option<f64>,

        /// Print each state as a JSON object instead of text.
        #[arg(long)]
        json: bool,

        /// Commands, e.g. `step_forward` or `seek=4`.
        #[arg(required = true)]
        commands: Vec<String>,
    },

    /// Play from a position to the end of the log, printing each event.
    Play {
        /// Path to the JSONL event log.
        log: PathBuf,

        /// Event index to start from.
        #[arg(long, default_value_t = 0)]
        from: usize,

        /// Playback rate multiplier.
        #[arg(long)]
        rate: Option<f64>,

        /// Wait between events according to their timestamps.
        #[arg(long)]
        realtime: bool,
    },
}

/// Run the CLI, returning an error message on failure.
pub fn run(config: &Config) -> Result<(), String> {
    let cli = Cli::parse();

    match cli.command {
        Command::Info { log } => cmd_info(&log),
        Command::Show { log, index } => cmd_show(&log, index),
        Command::Range { log, start, end } => cmd_range(&log, start, end),
        Command::Replay {
            log,
            rate,
            json,
            commands,
        } => {
            let rate = config.resolve_rate(rate)?;
            cmd_replay(&log, rate, json, &commands)
        }
        Command::Play {
            log,
            from,
            rate,
            realtime,
        } => {
            let rate = config.resolve_rate(rate)?;
            cmd_play(&log, from, rate, realtime)
        }
    }
}

fn load_session(log: &Path) -> Result<ReplaySession, String> {
    let session = ReplaySession::load(log).map_err(|e| e.to_string())?;
    if !session.is_chronological() {
        warn!(path = %log.display(), "timestamps are out of order; time queries may be misleading");
    }
    Ok(session)
}

fn cmd_info(log: &Path) -> Result<(), String> {
    let session = load_session(log)?;

    println!("session   {}", session.id());
    println!("log       {}", session.source_path().display());
    println!("created   {}", session.created_at());
    println!("events    {}", session.len());
    println!("start     {}", session.start_time());
    println!("end       {}", session.end_time());
    println!("duration  {}", format_offset(session.duration()));
    if !session.is_chronological() {
        eprintln!("warning: events are not in chronological order");
    }

    Ok(())
}

fn cmd_show(log: &Path, index: usize) -> Result<(), String> {
    let session = load_session(log)?;
    let event = session.get_event(index).ok_or_else(|| {
        format!(
            "no event at index {index} ({} events in {})",
            session.len(),
            log.display()
        )
    })?;

    let json = serde_json::to_string_pretty(event)
        .map_err(|e| format!("failed to serialize event: {e}"))?;
    println!("{json}");
    Ok(())
}

fn cmd_range(log: &Path, start: i64, end: i64) -> Result<(), String> {
    let session = load_session(log)?;
    let events = session.events_by_time_range(start, end);

    let mut out = io::stdout().lock();
    for event in &events {
        let line =
            serde_json::to_string(event).map_err(|e| format!("failed to serialize event: {e}"))?;
        writeln!(out, "{line}").map_err(|e| format!("failed to write output: {e}"))?;
    }
    eprintln!("{} event(s) in [{start}, {end}]", events.len());

    Ok(())
}

fn cmd_replay(log: &Path, rate: f64, json: bool, script: &[String]) -> Result<(), String> {
    let session = load_session(log)?;
    let mut state = ReplayState::with_rate(&session, rate).map_err(|e| e.to_string())?;
    let mut failed = 0usize;

    for raw in script {
        let outcome = raw
            .parse::<ReplayCommand>()
            .and_then(|command| state.apply(&session, &command));
        if let Err(e) = outcome {
            eprintln!("{raw}: {e}");
            failed += 1;
            continue;
        }

        if json {
            let line = serde_json::to_string(&state)
                .map_err(|e| format!("failed to serialize state: {e}"))?;
            println!("{line}");
        } else {
            println!("{raw:<16} {}", format_state(&state, &session));
        }
    }

    if failed > 0 {
        return Err(format!("{failed} of {} command(s) rejected", script.len()));
    }
    Ok(())
}

fn cmd_play(log: &Path, from: usize, rate: f64, realtime: bool) -> Result<(), String> {
    let session = load_session(log)?;
    if session.is_empty() {
        println!("No events");
        return Ok(());
    }

    let mut state = ReplayState::with_rate(&session, rate).map_err(|e| e.to_string())?;
    state
        .apply(&session, &ReplayCommand::seek(from.to_string()))
        .map_err(|e| e.to_string())?;
    state
        .apply(&session, &ReplayCommand::play())
        .map_err(|e| e.to_string())?;

    if let Some(event) = state.current_event(&session) {
        println!("{}", format_event_line(state.current_index(), event, session.start_time()));
    }
    loop {
        if realtime && let Some(delay) = state.delay_to_next(&session) {
            thread::sleep(delay);
        }
        let Some(event) = state.tick(&session).map_err(|e| e.to_string())? else {
            break;
        };
        println!("{}", format_event_line(state.current_index(), event, session.start_time()));
    }

    Ok(())
}
