//! Headless video player simulator.
//!
//! Loads a simulator config and a scenario script, runs the script against the
//! in-memory media element, audio graph and display environment, and prints
//! each recorded [`video_player_types::PlayerSnapshot`] as JSON on stdout.
//! Logs go to stderr.

mod cli;
mod config;
mod runner;
mod script;

use std::io::Write;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::config::SimConfig;
use crate::runner::Runner;
use crate::script::Script;

fn main() -> Result<()> {
    let args = cli::Args::parse();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("info,video_player=info,player_sim=info")
        }))
        .with_writer(std::io::stderr)
        .init();

    let config = match args.config.as_deref() {
        Some(path) => SimConfig::load(path)?,
        None => SimConfig::default(),
    };
    let script = Script::load(&args.script)?;
    tracing::info!(steps = script.steps.len(), script = ?args.script, "running scenario");

    let snapshots = Runner::new(&config, Instant::now())?.run(script);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for snapshot in &snapshots {
        let line = if args.pretty {
            serde_json::to_string_pretty(snapshot)
        } else {
            serde_json::to_string(snapshot)
        }
        .context("serialize snapshot")?;
        writeln!(out, "{line}").context("write snapshot")?;
    }
    Ok(())
}
