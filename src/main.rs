use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use release_notes_generator::cli::{orchestration, Args};
use release_notes_generator::config;
use release_notes_generator::tracker::JiraClient;
use release_notes_generator::ui;

fn main() {
    let args = Args::parse();
    init_tracing(args.verbose);

    if let Err(e) = run(&args) {
        ui::display_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

/// Log to stderr, filtered by `RUST_LOG` when set
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(args: &Args) -> Result<()> {
    let mut config =
        config::load_config(args.config.as_deref()).context("Error loading config")?;
    config.apply(&args.overrides());

    let tracker = JiraClient::new(
        &config.tracker.url,
        &config.tracker.username,
        &config.tracker.password,
    )
    .context("Error creating issue tracker client")?;

    ui::display_status("Generating release notes...");
    let result = orchestration::run(&args.workflow_args(), &config, &tracker)?;
    ui::display_summary(&result);
    Ok(())
}
