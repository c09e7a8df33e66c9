//! Binary entry point: resolve paths, start logging, open the roster file and
//! drive the Ratatui event loop until the user exits.
use anyhow::Context;
use clap::Parser;
use tracing::info;

use student_roster::config::{init_logging, Args, Config};
use student_roster::{run_app, App, Session};

fn main() -> anyhow::Result<()> {
    let config = Config::from_args(Args::parse())?;
    init_logging(&config)?;
    info!(roster = %config.roster_path.display(), "starting");

    let session = Session::open_or_create(&config.roster_path)
        .with_context(|| format!("failed to open roster {}", config.roster_path.display()))?;

    let mut app = App::new(session);
    run_app(&mut app)?;

    info!("exiting");
    Ok(())
}
