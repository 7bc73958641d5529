pub mod job;
pub mod outcome;

pub use job::{JobError, JobStage};
pub use outcome::{JobOutcome, RunReport};

use crate::{
    config::Config,
    fetch::{FetchError, Fetcher},
};
use crate::stage::StagedBinary;
use job::Job;
use std::{path::PathBuf, sync::Arc};
use thiserror::Error;
use tokio::{
    sync::{watch, Semaphore},
    task::JoinHandle,
};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Cannot create staging directory {}", .path.display())]
    DestDir {
        path: PathBuf,
        #[source]
        cause: std::io::Error,
    },
    #[error(transparent)]
    Fetcher(#[from] FetchError),
}

/// A spawned job that is aborted when dropped. Dropping the run future thus
/// drops every in-flight job, and with it the job's temporary archive.
struct JobHandle(JoinHandle<Result<StagedBinary, JobError>>);

impl Drop for JobHandle {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Runs one independent job per platform target and collects their outcomes.
pub struct Pipeline {
    config: Config,
    fetcher: Fetcher,
}

impl Pipeline {
    pub fn new(config: Config) -> Result<Self, PipelineError> {
        let fetcher = Fetcher::new(&config.fetch)?;

        Ok(Pipeline { config, fetcher })
    }

    /// Waits for every job to reach a terminal state. Returns exactly one
    /// outcome per manifest entry, in manifest order.
    pub async fn run(&self) -> Result<RunReport, PipelineError> {
        let dest_dir = self.config.dest_dir.clone();
        tokio::fs::create_dir_all(&dest_dir)
            .await
            .map_err(|cause| PipelineError::DestDir {
                path: dest_dir.clone(),
                cause,
            })?;

        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent_jobs));
        let mut handles = Vec::new();

        for target in self.config.manifest() {
            let (stage, stage_receiver) = watch::channel(JobStage::Pending);
            let job = Job {
                url: self.config.archive_url(&target),
                target: target.clone(),
                binary: self.config.binary.clone(),
                dest_dir: dest_dir.clone(),
                fetcher: self.fetcher.clone(),
                stage,
            };

            let semaphore = semaphore.clone();
            let handle = tokio::spawn(async move {
                let _permit = semaphore.acquire_owned().await.map_err(JobError::aborted)?;
                job.run().await
            });

            handles.push((target, stage_receiver, JobHandle(handle)));
        }

        let mut report = RunReport::default();
        for (target, stage, mut handle) in handles {
            let result = (&mut handle.0)
                .await
                .unwrap_or_else(|error| Err(JobError::aborted(error)));

            let outcome = match result {
                Ok(staged) => JobOutcome::Success(staged),
                Err(error) => {
                    let stage = *stage.borrow();
                    log::warn!(
                        "Could not stage binary for {} while {}: {}",
                        target,
                        stage,
                        error.reason()
                    );
                    JobOutcome::Failure {
                        target,
                        stage,
                        error,
                    }
                }
            };
            report.outcomes.push(outcome);
        }

        Ok(report)
    }
}
