use super::job::{JobError, JobStage};
use crate::{platform::PlatformTarget, stage::StagedBinary};

/// Terminal result of one platform job.
#[derive(Debug)]
pub enum JobOutcome {
    Success(StagedBinary),
    Failure {
        target: PlatformTarget,
        stage: JobStage,
        error: JobError,
    },
}

impl JobOutcome {
    pub fn target(&self) -> &PlatformTarget {
        match self {
            JobOutcome::Success(staged) => &staged.target,
            JobOutcome::Failure { target, .. } => target,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, JobOutcome::Success(_))
    }

    pub fn staged(&self) -> Option<&StagedBinary> {
        match self {
            JobOutcome::Success(staged) => Some(staged),
            JobOutcome::Failure { .. } => None,
        }
    }
}

#[derive(Debug, Default)]
pub struct RunReport {
    pub outcomes: Vec<JobOutcome>,
}

impl RunReport {
    pub fn succeeded(&self) -> impl Iterator<Item = &StagedBinary> {
        self.outcomes.iter().filter_map(JobOutcome::staged)
    }

    pub fn failed(&self) -> impl Iterator<Item = &JobOutcome> {
        self.outcomes.iter().filter(|outcome| !outcome.is_success())
    }

    pub fn all_failed(&self) -> bool {
        self.succeeded().next().is_none()
    }

    pub fn summary(&self) -> String {
        let failed: Vec<String> = self
            .failed()
            .map(|outcome| outcome.target().to_string())
            .collect();

        let staged = self.outcomes.len() - failed.len();
        if failed.is_empty() {
            format!("{} of {} platforms staged", staged, self.outcomes.len())
        } else {
            format!(
                "{} of {} platforms staged, failed: {}",
                staged,
                self.outcomes.len(),
                failed.join(", ")
            )
        }
    }
}
