use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::rules::ShiftKind;

/// Labor assignment board: roster ingestion, headcount and badge placement.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Turn on debug logging (RUST_LOG still wins when set)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Serve the board page and JSON API
    Web(WebArgs),
    /// Build a board from CSV files and print it
    Board(BoardArgs),
}

#[derive(clap::Args, Debug, Clone)]
pub struct WebArgs {
    #[arg(short, long, env = "LABOR_BOARD_PORT", default_value_t = 8080)]
    pub port: u16,

    #[arg(long, env = "LABOR_BOARD_BIND", default_value = "0.0.0.0")]
    pub bind: String,

    /// Directory holding the saved roster snapshot
    #[arg(long, env = "LABOR_BOARD_DATA_DIR", default_value = "data")]
    pub data_dir: PathBuf,
}

#[derive(clap::Args, Debug, Clone)]
pub struct BoardArgs {
    /// Roster CSV (required)
    #[arg(long)]
    pub roster: PathBuf,

    #[arg(long)]
    pub swap: Option<PathBuf>,

    /// VET/VTO CSV
    #[arg(long)]
    pub vet: Option<PathBuf>,

    #[arg(long)]
    pub labor_share: Option<PathBuf>,

    /// Planning date, dd/mm/yyyy or yyyy-mm-dd
    #[arg(long)]
    pub date: String,

    #[arg(long, default_value = "day", value_parser = parse_shift)]
    pub shift: ShiftKind,

    /// Site code (YHM2, YDD2); all sites when omitted
    #[arg(long, default_value = "")]
    pub site: String,

    /// Pre-assign random badges, e.g. `--assign pick=5` (repeatable)
    #[arg(long, value_parser = parse_assignment)]
    pub assign: Vec<(String, usize)>,

    /// Planned volume for the volume-per-head figure
    #[arg(long, default_value_t = 0.0)]
    pub planned_volume: f64,

    /// Write the board text to this file as well
    #[arg(long)]
    pub out: Option<String>,

    /// Save the resulting board as the last roster snapshot
    #[arg(long)]
    pub save: bool,

    #[arg(long, env = "LABOR_BOARD_DATA_DIR", default_value = "data")]
    pub data_dir: PathBuf,
}

fn parse_shift(value: &str) -> Result<ShiftKind, String> {
    value.parse()
}

/// Parses `key=count`
pub fn parse_assignment(value: &str) -> Result<(String, usize), String> {
    let (key, count) = value
        .split_once('=')
        .ok_or_else(|| format!("expected key=count, got '{}'", value))?;
    let count: usize = count
        .trim()
        .parse()
        .map_err(|_| format!("invalid count in '{}'", value))?;
    Ok((key.trim().to_string(), count))
}
