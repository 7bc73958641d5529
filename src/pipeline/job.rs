use crate::{
    archive::{self, ArchiveKind, BinaryMatcher, ExtractError},
    fetch::{FetchError, Fetcher},
    platform::PlatformTarget,
    stage::{self, StageError, StagedBinary},
};
use std::{
    fmt::{self, Display},
    path::PathBuf,
};
use thiserror::Error;
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStage {
    Pending,
    Fetching,
    Extracting,
    Staging,
}

impl Display for JobStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JobStage::Pending => "pending",
            JobStage::Fetching => "fetching",
            JobStage::Extracting => "extracting",
            JobStage::Staging => "staging",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum JobError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Extract(#[from] ExtractError),
    #[error(transparent)]
    Stage(#[from] StageError),
    #[error("job aborted: {reason}")]
    Aborted { reason: String },
}

impl JobError {
    pub fn aborted(reason: impl Display) -> Self {
        JobError::Aborted {
            reason: reason.to_string(),
        }
    }

    /// The message together with every underlying cause, as `{:#}` renders an
    /// [`anyhow::Error`].
    pub fn reason(&self) -> String {
        anyhow::Chain::new(self)
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(": ")
    }
}

/// fetch → extract → stage for a single platform.
pub struct Job {
    pub target: PlatformTarget,
    pub url: String,
    pub binary: String,
    pub dest_dir: PathBuf,
    pub fetcher: Fetcher,
    pub stage: watch::Sender<JobStage>,
}

impl Job {
    pub async fn run(self) -> Result<StagedBinary, JobError> {
        self.enter(JobStage::Fetching);
        log::info!("Downloading {}", self.url);
        let downloaded = self.fetcher.fetch(&self.url, &self.target.archive).await?;

        self.enter(JobStage::Extracting);
        let matcher = BinaryMatcher::for_target(&self.binary, &self.target);
        let extracted = tokio::task::spawn_blocking(move || {
            let extracted = ArchiveKind::from_file_name(downloaded.file_name())
                .and_then(|kind| archive::extract(downloaded.path(), kind, &matcher));

            if let Err(error) = downloaded.close() {
                log::warn!("cannot remove temporary archive: {}", error);
            }
            extracted
        })
        .await
        .map_err(JobError::aborted)??;
        log::debug!(
            "{}: selected entry {} from {}",
            self.target,
            extracted.entry_name,
            self.target.archive
        );

        self.enter(JobStage::Staging);
        let target = self.target.clone();
        let binary = self.binary.clone();
        let dest_dir = self.dest_dir.clone();
        let staged = tokio::task::spawn_blocking(move || {
            stage::stage(&extracted.content, &target, &binary, &dest_dir)
        })
        .await
        .map_err(JobError::aborted)??;
        log::info!("  Extracted to {}", staged.path.display());

        Ok(staged)
    }

    fn enter(&self, stage: JobStage) {
        log::debug!("{}: {}", self.target, stage);
        self.stage.send_replace(stage);
    }
}
