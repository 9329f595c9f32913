use anyhow::Context;
use clap::Parser;

use enginish::cli::{AppConfig, Cli};
use enginish::logging::{init_logging, LoggingConfig};
use enginish::{app, headless};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::try_from(cli).context("invalid command line")?;

    init_logging(LoggingConfig::with_filter(config.log_filter.clone()));
    log::debug!("starting with {config:?}");

    if config.headless {
        let report = headless::run(&config).context("headless run failed")?;
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    app::run(config)
}
