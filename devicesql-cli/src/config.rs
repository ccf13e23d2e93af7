//! CLI configuration

use std::path::PathBuf;

use devicesql_core::ReadOptions;

#[derive(Debug, Clone)]
pub struct Config {
    /// Database file or volume root as given on the command line
    pub target: PathBuf,
    /// Where backups go before a database is overwritten; beside the file if unset
    pub backup_dir: Option<PathBuf>,
    /// Page walker limits
    pub read_options: ReadOptions,
    pub verbose: bool,
}

impl Config {
    pub fn new(target: PathBuf) -> Self {
        Self {
            target,
            backup_dir: None,
            read_options: ReadOptions::default(),
            verbose: false,
        }
    }
}
