use clap::{Parser, ValueEnum};
use libtracehound_core::config::RefreshMode;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "tracehound",
    about = "Searches bug databases for tracebacks similar to a target traceback",
    version
)]
pub struct Cli {
    /// Profile config file (JSON)
    pub config: PathBuf,

    /// File containing the target traceback (defaults to stdin)
    #[arg(short = 'f', long = "file")]
    pub trace_file: Option<PathBuf>,

    /// How to refresh the bug cache
    #[arg(short, long, value_enum, default_value = "partial")]
    pub refresh: RefreshArg,

    /// Maximum number of matches to display
    #[arg(short, long, default_value_t = 5)]
    pub num_results: usize,

    /// Override the cache data directory (defaults to ~/.tracehound)
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Print a lot of extra information (repeat for more)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum RefreshArg {
    /// Pull changes since the last run
    Partial,
    /// Do a full refresh from the bug repos (expensive)
    Full,
    /// Just use the cache
    None,
}

impl From<RefreshArg> for RefreshMode {
    fn from(arg: RefreshArg) -> Self {
        match arg {
            RefreshArg::Partial => RefreshMode::Partial,
            RefreshArg::Full => RefreshMode::Full,
            RefreshArg::None => RefreshMode::None,
        }
    }
}
