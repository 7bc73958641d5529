use crate::{
    config::Config,
    packaging::{PackagingError, PackagingTrigger},
    pipeline::{Pipeline, PipelineError, RunReport},
};
use std::process::ExitStatus;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BundleError {
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
    #[error("No platform binary could be staged ({summary})")]
    NothingStaged { summary: String },
    #[error(transparent)]
    Packaging(#[from] PackagingError),
}

#[derive(Debug)]
pub struct Bundle {
    pub report: RunReport,
    /// `None` when packaging is disabled in the config.
    pub packaging: Option<ExitStatus>,
}

/// Stages every platform binary, then hands the staging directory to the packaging command.
pub async fn run(config: &Config) -> Result<Bundle, BundleError> {
    log::info!("Downloading {} binaries", config.binary);
    let report = Pipeline::new(config.clone())?.run().await?;

    if config.fail_if_all_platforms_failed && report.all_failed() {
        return Err(BundleError::NothingStaged {
            summary: report.summary(),
        });
    }

    if !config.packaging.enabled {
        log::info!("Packaging disabled, binaries left in {}", config.dest_dir.display());
        return Ok(Bundle {
            report,
            packaging: None,
        });
    }

    log::info!("Building packages");
    let status = PackagingTrigger::from_config(config).run().await?;

    Ok(Bundle {
        report,
        packaging: Some(status),
    })
}
