use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use dailyqueue_tui::cli::Cli;
use dailyqueue_tui::config::Config;
use dailyqueue_tui::store::db;
use dailyqueue_tui::tui::{runtime, App};

/// Logs go to a file because stdout belongs to the TUI.
fn init_logging() -> Result<()> {
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open("dailyqueue-tui.log")
        .context("could not open log file")?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging()?;
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_deref())?;
    let pool = db::connect(&config.database_url).await?;
    info!("connected to {}", config.database_url);

    let app = App::new(pool, config, cli.queue.into());
    runtime::run(app).await
}
