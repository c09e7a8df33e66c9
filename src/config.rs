//! Command-line configuration and logging setup. The roster file and the log
//! file both default to a folder beneath the user's home directory so the
//! application works from any working directory.

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use directories::BaseDirs;
use tracing_subscriber::EnvFilter;

/// Folder name used beneath the user's home directory for application data.
const DATA_DIR_NAME: &str = ".student-roster";
/// Roster file stored inside the application data directory.
const ROSTER_FILE_NAME: &str = "students.txt";
/// Log file stored inside the application data directory.
const LOG_FILE_NAME: &str = "student-roster.log";

/// Terminal student roster with a waiting-queue enrollment workflow.
#[derive(Parser, Debug)]
#[command(name = "student-roster")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Roster file to open (created empty if missing)
    #[arg(long)]
    pub file: Option<PathBuf>,

    /// Where to write logs; the terminal is owned by the UI
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

/// Settings resolved from [`Args`] and the user's home directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub roster_path: PathBuf,
    pub log_path: PathBuf,
    pub log_level: String,
}

impl Config {
    /// Fill in any path the user did not pass with its default location.
    pub fn from_args(args: Args) -> Result<Self> {
        let (roster_path, log_path) = match (args.file, args.log_file) {
            (Some(roster), Some(log)) => (roster, log),
            (roster, log) => {
                let data_dir = data_dir()?;
                (
                    roster.unwrap_or_else(|| data_dir.join(ROSTER_FILE_NAME)),
                    log.unwrap_or_else(|| data_dir.join(LOG_FILE_NAME)),
                )
            }
        };

        Ok(Self {
            roster_path,
            log_path,
            log_level: args.log_level,
        })
    }
}

/// Install a `tracing` subscriber that appends plain-text events to
/// `config.log_path`. `RUST_LOG` overrides `config.log_level`.
pub fn init_logging(config: &Config) -> Result<()> {
    let file = open_log_file(&config.log_path)?;
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .context("invalid log filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .try_init()
        .map_err(|err| anyhow!("failed to install logger: {err}"))
}

fn open_log_file(path: &Path) -> Result<fs::File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).context("failed to create log directory")?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open log file {}", path.display()))
}

/// Resolve the application data directory inside the user's home.
fn data_dir() -> Result<PathBuf> {
    let base_dirs = BaseDirs::new().ok_or_else(|| anyhow!("could not locate home directory"))?;
    Ok(base_dirs.home_dir().join(DATA_DIR_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_paths_are_kept() {
        let args = Args::parse_from([
            "student-roster",
            "--file",
            "/tmp/roster.txt",
            "--log-file",
            "/tmp/roster.log",
            "--log-level",
            "debug",
        ]);
        let config = Config::from_args(args).unwrap();
        assert_eq!(config.roster_path, PathBuf::from("/tmp/roster.txt"));
        assert_eq!(config.log_path, PathBuf::from("/tmp/roster.log"));
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn log_level_defaults_to_info() {
        let args = Args::parse_from(["student-roster", "--file", "a.txt", "--log-file", "a.log"]);
        assert_eq!(args.log_level, "info");
    }
}
