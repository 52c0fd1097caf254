mod app;
mod cli;
mod engine;
mod logging;

use std::time::{Instant, SystemTime, UNIX_EPOCH};

use clap::Parser;
use color_eyre::eyre::WrapErr;
use tickcounter_config::Config;
use tickcounter_core::SystemClock;
use tracing::{debug, info};

use crate::app::App;
use crate::cli::Cli;
use crate::engine::{Engine, EngineSettings};

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    let config_path = match &cli.config {
        Some(path) => Some(path.clone()),
        None => Config::default_path().ok(),
    };
    let config = match &config_path {
        Some(path) => Config::load(path)
            .wrap_err_with(|| format!("failed to load config from {}", path.display()))?,
        None => Config::default(),
    };
    let config = cli.merge_into(config);

    let log_file = logging::init(&config.log)?;
    info!(version = env!("CARGO_PKG_VERSION"), "tickcounter starting");
    debug!(?log_file, ?config_path, "paths");

    let seed = cli.seed.unwrap_or_else(clock_seed);
    let engine = Engine::new(
        SystemClock,
        EngineSettings::from_config(&config, seed),
        Instant::now(),
    );
    let app = App::new(engine, config, config_path);

    let terminal = ratatui::init();
    let result = app.run(terminal);
    ratatui::restore();
    result
}

fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}
