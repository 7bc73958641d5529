use crate::platform::PlatformTarget;
use std::{
    io::{self, Write},
    path::{Path, PathBuf},
};
use thiserror::Error;

#[cfg(unix)]
const EXECUTABLE_MODE: u32 = 0o755;

#[derive(Debug, Error)]
#[error("Cannot stage binary at {}", .path.display())]
pub struct StageError {
    pub path: PathBuf,
    #[source]
    pub cause: io::Error,
}

/// A binary written to the staging directory for one platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedBinary {
    pub target: PlatformTarget,
    pub path: PathBuf,
}

/// Writes `content` as `{binary}-{os}-{arch}[.exe]` inside `dest_dir`.
///
/// The bytes go to a temporary file in the same directory which is renamed into
/// place once complete, so readers never see a partially written binary.
pub fn stage(
    content: &[u8],
    target: &PlatformTarget,
    binary: &str,
    dest_dir: &Path,
) -> Result<StagedBinary, StageError> {
    let path = dest_dir.join(target.binary_file_name(binary));
    let error = |cause: io::Error| StageError {
        path: path.clone(),
        cause,
    };

    let mut file = tempfile::Builder::new()
        .prefix(".staging-")
        .tempfile_in(dest_dir)
        .map_err(error)?;

    file.write_all(content).map_err(error)?;
    file.as_file().sync_all().map_err(error)?;
    set_executable(file.path()).map_err(error)?;

    file.persist(&path).map_err(|persist| error(persist.error))?;

    log::debug!("staged {} ({} bytes)", path.display(), content.len());
    Ok(StagedBinary {
        target: target.to_owned(),
        path,
    })
}

#[cfg(unix)]
fn set_executable(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    std::fs::set_permissions(path, std::fs::Permissions::from_mode(EXECUTABLE_MODE))
}

#[cfg(not(unix))]
fn set_executable(path: &Path) -> io::Result<()> {
    let mut permissions = std::fs::metadata(path)?.permissions();
    permissions.set_readonly(false);
    std::fs::set_permissions(path, permissions)
}
