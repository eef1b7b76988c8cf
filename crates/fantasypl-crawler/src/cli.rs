// Command-line arguments.

use std::path::PathBuf;

use clap::Parser;

use crate::config::DEFAULT_CONFIG_FILE;

#[derive(Parser, Debug)]
#[command(name = "fantasypl-crawler", version, about = "Fantasy Premier League league crawler")]
pub struct Cli {
    /// Path to the TOML config file.
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE, env = "FANTASYPL_CONFIG")]
    pub config: PathBuf,
}
