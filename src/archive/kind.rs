use super::ExtractError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    TarGzip,
    Zip,
}

impl ArchiveKind {
    pub fn extension(&self) -> &str {
        match self {
            ArchiveKind::TarGzip => "tar.gz",
            ArchiveKind::Zip => "zip",
        }
    }

    /// Infers the kind from an archive file name's suffix. Unknown suffixes are rejected.
    pub fn from_file_name(file_name: &str) -> Result<ArchiveKind, ExtractError> {
        let lowercase = file_name.to_ascii_lowercase();

        if lowercase.ends_with(".zip") {
            Ok(ArchiveKind::Zip)
        } else if lowercase.ends_with(".tar.gz") || lowercase.ends_with(".tgz") {
            Ok(ArchiveKind::TarGzip)
        } else {
            Err(ExtractError::UnsupportedFormat {
                file_name: file_name.to_owned(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_detect_zip() {
        let kind = ArchiveKind::from_file_name("lispium-windows-x86_64.zip");

        assert!(matches!(kind, Ok(ArchiveKind::Zip)));
    }

    #[test]
    fn should_detect_tar_gz() {
        assert!(matches!(
            ArchiveKind::from_file_name("lispium-linux-x86_64.tar.gz"),
            Ok(ArchiveKind::TarGzip)
        ));
        assert!(matches!(
            ArchiveKind::from_file_name("LISPIUM.TGZ"),
            Ok(ArchiveKind::TarGzip)
        ));
    }

    #[test]
    fn should_reject_unknown_suffix() {
        let kind = ArchiveKind::from_file_name("lispium-linux-x86_64.tar.xz");

        assert!(matches!(
            kind,
            Err(ExtractError::UnsupportedFormat { ref file_name }) if file_name == "lispium-linux-x86_64.tar.xz"
        ));
    }

    #[test]
    fn should_expose_extension() {
        assert_eq!(ArchiveKind::TarGzip.extension(), "tar.gz");
        assert_eq!(ArchiveKind::Zip.extension(), "zip");
    }
}
