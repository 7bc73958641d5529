use std::{io, path::Path};
use tempfile::NamedTempFile;

const TEMP_FILE_PREFIX: &str = "lispium-wheels-";

/// A downloaded archive on local disk, owned by a single job.
///
/// The file is removed when the value is dropped, whichever way the job ends.
#[derive(Debug)]
pub struct TempArchive {
    file: NamedTempFile,
    file_name: String,
}

impl TempArchive {
    pub fn create(file_name: &str) -> io::Result<Self> {
        let file = tempfile::Builder::new()
            .prefix(TEMP_FILE_PREFIX)
            .suffix(&format!("-{}", file_name))
            .tempfile()?;

        Ok(TempArchive {
            file,
            file_name: file_name.to_owned(),
        })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Name of the archive as published, used to pick the extraction format.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn writer(&self) -> io::Result<tokio::fs::File> {
        Ok(tokio::fs::File::from_std(self.file.reopen()?))
    }

    pub fn close(self) -> io::Result<()> {
        self.file.close()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt;

    #[tokio::test]
    async fn should_remove_file_on_drop() -> Result<(), Box<dyn std::error::Error>> {
        let archive = TempArchive::create("lispium-linux-x86_64.tar.gz")?;
        let path = archive.path().to_path_buf();

        let mut writer = archive.writer()?;
        writer.write_all(b"bytes").await?;
        writer.flush().await?;
        drop(writer);

        assert!(path.exists());
        assert!(path
            .to_string_lossy()
            .ends_with("lispium-linux-x86_64.tar.gz"));
        assert_eq!(std::fs::read(&path)?, b"bytes");

        drop(archive);

        assert!(!path.exists());
        Ok(())
    }

    #[test]
    fn should_remove_file_on_close() -> Result<(), Box<dyn std::error::Error>> {
        let archive = TempArchive::create("lispium-windows-x86_64.zip")?;
        let path = archive.path().to_path_buf();

        assert_eq!(archive.file_name(), "lispium-windows-x86_64.zip");
        archive.close()?;

        assert!(!path.exists());
        Ok(())
    }
}
