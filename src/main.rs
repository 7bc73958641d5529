mod archive;
mod bundle;
mod config;
mod fetch;
mod logger;
mod packaging;
mod pipeline;
mod platform;
mod stage;

use anyhow::{bail, Context, Result};
use config::Config;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let config = Config::load().await.context("Cannot load config file")?;
    logger::init(&config.log_level)?;
    config.validate().context("Invalid config")?;

    log::info!("Starting {} v{}", config.binary, config.version);

    // Dropping the in-flight jobs on interrupt removes their temporary archives.
    let bundle = tokio::select! {
        bundle = bundle::run(&config) => bundle.context("Cannot build the packages")?,
        _ = tokio::signal::ctrl_c() => bail!("Interrupted"),
    };

    log::info!("Done! {}", bundle.report.summary());

    match bundle.packaging {
        Some(status) if !status.success() => {
            let code = status.code().unwrap_or(1);
            Ok(ExitCode::from(u8::try_from(code).unwrap_or(1)))
        }
        _ => Ok(ExitCode::SUCCESS),
    }
}
