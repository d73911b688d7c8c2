use std::io;
use std::io::IsTerminal;

use clap::{Parser, ValueEnum};
use randexp::DecisionLog;
use randexp::config::DEFAULT_REPEAT_CAP;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorWhen {
    Always,
    Never,
    Auto,
}

/// Generate strings that match a regular expression.
#[derive(Debug, Clone, Parser)]
#[command(name = "randexp", version)]
pub struct Config {
    /// Pattern to generate from
    pub pattern: String,

    /// Pattern flags: i (case-insensitive), m (multiline)
    #[arg(short, long, default_value = "")]
    pub flags: String,

    /// Number of strings to generate
    #[arg(short = 'n', long, default_value_t = 1)]
    pub count: usize,

    /// Steer generation toward this string
    #[arg(short, long, conflicts_with = "replay")]
    pub target: Option<String>,

    /// Replay a decision log, e.g. "1,0,3"
    #[arg(short, long)]
    pub replay: Option<DecisionLog>,

    /// Seed for reproducible output
    #[arg(short, long)]
    pub seed: Option<u64>,

    /// Cap added to the minimum of unbounded repetitions
    #[arg(long, default_value_t = DEFAULT_REPEAT_CAP)]
    pub max: usize,

    /// Print the decision log after each string
    #[arg(long)]
    pub show_log: bool,

    #[arg(long, value_enum, default_value_t = ColorWhen::Never)]
    pub color: ColorWhen,
}

pub fn parse_args() -> Config {
    Config::parse()
}

pub fn resolve_use_color(color: &ColorWhen) -> bool {
    match color {
        ColorWhen::Always => true,
        ColorWhen::Never => false,
        ColorWhen::Auto => io::stdout().is_terminal(),
    }
}
