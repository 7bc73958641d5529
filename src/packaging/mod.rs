use crate::config::Config;
use std::{
    path::PathBuf,
    process::{ExitStatus, Stdio},
};
use thiserror::Error;
use tokio::process::Command;

#[derive(Debug, Error)]
pub enum PackagingError {
    #[error("Cannot find packaging command `{command}`")]
    NotFound {
        command: String,
        #[source]
        cause: which::Error,
    },
    #[error("Packaging working directory {} does not exist", .path.display())]
    MissingWorkingDir { path: PathBuf },
    #[error("Cannot run packaging command `{command}`")]
    Spawn {
        command: String,
        #[source]
        cause: std::io::Error,
    },
}

/// Runs the external build that turns staged binaries into distributable packages.
#[derive(Debug, Clone)]
pub struct PackagingTrigger {
    command: String,
    args: Vec<String>,
    working_dir: PathBuf,
}

impl PackagingTrigger {
    pub fn new(command: impl Into<String>, args: Vec<String>, working_dir: PathBuf) -> Self {
        Self {
            command: command.into(),
            args,
            working_dir,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            &config.packaging.command,
            config.packaging.args.clone(),
            config.packaging_dir(),
        )
    }

    /// Runs the command once and waits for it. A non-zero exit is reported, not raised.
    pub async fn run(&self) -> Result<ExitStatus, PackagingError> {
        let program = which::which(&self.command).map_err(|cause| PackagingError::NotFound {
            command: self.command.to_owned(),
            cause,
        })?;

        if !self.working_dir.is_dir() {
            return Err(PackagingError::MissingWorkingDir {
                path: self.working_dir.to_owned(),
            });
        }

        log::info!(
            "Running {} {} in {}",
            self.command,
            self.args.join(" "),
            self.working_dir.display()
        );

        let status = Command::new(program)
            .args(&self.args)
            .current_dir(&self.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|cause| PackagingError::Spawn {
                command: self.command.to_owned(),
                cause,
            })?
            .wait()
            .await
            .map_err(|cause| PackagingError::Spawn {
                command: self.command.to_owned(),
                cause,
            })?;

        if status.success() {
            log::info!("Packaging finished");
        } else {
            log::error!("Packaging failed with {}", status);
        }

        Ok(status)
    }
}
