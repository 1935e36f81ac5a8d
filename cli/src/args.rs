use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "pipeling", about = "Load and watch pipeling configuration", version)]
pub struct CliArgs {
    /// Configuration directory. Repeat for more; earlier directories win.
    #[arg(
        long = "config-path",
        env = "PIPELING_CONFIG_PATH",
        value_delimiter = ':',
        global = true
    )]
    pub config_paths: Vec<PathBuf>,

    /// Emit logs as JSON.
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Load the configuration once and print what was found.
    Load {
        /// Print the summary as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Load the configuration and reload it whenever files change.
    Watch {
        /// Quiet period in milliseconds before a burst of changes triggers a reload.
        #[arg(long, default_value_t = 500)]
        debounce_ms: u64,
    },
}

impl CliArgs {
    /// Directories to load, defaulting to the working directory.
    pub fn dirs(&self) -> Vec<PathBuf> {
        if self.config_paths.is_empty() {
            vec![PathBuf::from(".")]
        } else {
            self.config_paths.clone()
        }
    }
}
