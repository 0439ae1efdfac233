use std::path::PathBuf;

use clap::Parser;

const VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("GIT_SHA"),
    ", ",
    env!("BUILD_DATE"),
    ")"
);

/// Run a scripted scenario against the headless player and print snapshots.
#[derive(Parser, Debug)]
#[command(name = "player-sim", version = VERSION)]
pub struct Args {
    /// Simulator config (player tuning and backend behaviour), TOML
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Scenario script, TOML with one `[[step]]` per action
    #[arg(long)]
    pub script: PathBuf,

    /// Pretty-print snapshots instead of one JSON object per line
    #[arg(long)]
    pub pretty: bool,
}
