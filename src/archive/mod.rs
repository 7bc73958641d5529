pub mod kind;
pub mod matcher;

pub use kind::ArchiveKind;
pub use matcher::BinaryMatcher;

use flate2::read::GzDecoder;
use matcher::Rank;
use std::{
    fs::File,
    io::{Read, Seek},
    path::Path,
};
use tar::Archive;
use thiserror::Error;
use zip::ZipArchive;

type Cause = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("no entry named `{binary}` found in archive")]
    NotFound { binary: String },
    #[error("archive is malformed")]
    Corrupt {
        #[source]
        cause: Cause,
    },
    #[error("unsupported archive format: {file_name}")]
    UnsupportedFormat { file_name: String },
    #[error("cannot open archive")]
    Io {
        #[source]
        cause: std::io::Error,
    },
}

impl ExtractError {
    fn corrupt(cause: impl Into<Cause>) -> Self {
        ExtractError::Corrupt {
            cause: cause.into(),
        }
    }
}

/// The selected entry's name and its raw bytes.
#[derive(Debug, Clone)]
pub struct ExtractedBinary {
    pub entry_name: String,
    pub content: Vec<u8>,
}

struct Candidate {
    rank: Rank,
    binary: ExtractedBinary,
}

impl Candidate {
    /// Equal ranks fall back to the lexicographically smaller entry path.
    fn is_better_than(&self, rank: Rank, entry_name: &str) -> bool {
        (self.rank, self.binary.entry_name.as_str()) <= (rank, entry_name)
    }
}

/// Reads every entry of the archive at `path` and returns the best match.
///
/// The archive handle lives only for the duration of this call.
pub fn extract(
    path: &Path,
    kind: ArchiveKind,
    matcher: &BinaryMatcher,
) -> Result<ExtractedBinary, ExtractError> {
    log::debug!("extracting {} as {}", path.display(), kind.extension());
    let file = File::open(path).map_err(|cause| ExtractError::Io { cause })?;

    let selected = match kind {
        ArchiveKind::TarGzip => tar_gz(file, matcher)?,
        ArchiveKind::Zip => zip(file, matcher)?,
    };

    selected
        .map(|candidate| candidate.binary)
        .ok_or_else(|| ExtractError::NotFound {
            binary: matcher.name().to_owned(),
        })
}

fn tar_gz(reader: impl Read, matcher: &BinaryMatcher) -> Result<Option<Candidate>, ExtractError> {
    let mut archive = Archive::new(GzDecoder::new(reader));
    let mut selected: Option<Candidate> = None;

    for entry in archive.entries().map_err(ExtractError::corrupt)? {
        let mut entry = entry.map_err(ExtractError::corrupt)?;
        if !entry.header().entry_type().is_file() {
            continue;
        }

        let entry_name = entry
            .path()
            .map_err(ExtractError::corrupt)?
            .to_string_lossy()
            .into_owned();

        let Some(rank) = matcher.rank(&entry_name) else {
            continue;
        };
        if selected.as_ref().is_some_and(|c| c.is_better_than(rank, &entry_name)) {
            log::debug!("skipping {}, a better match was already found", entry_name);
            continue;
        }

        let mut content = Vec::new();
        entry
            .read_to_end(&mut content)
            .map_err(ExtractError::corrupt)?;

        log::debug!("candidate entry {} ({} bytes)", entry_name, content.len());
        selected = Some(Candidate {
            rank,
            binary: ExtractedBinary {
                entry_name,
                content,
            },
        });
    }

    Ok(selected)
}

fn zip(
    reader: impl Read + Seek,
    matcher: &BinaryMatcher,
) -> Result<Option<Candidate>, ExtractError> {
    let mut archive = ZipArchive::new(reader).map_err(ExtractError::corrupt)?;
    let mut selected: Option<Candidate> = None;

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index).map_err(ExtractError::corrupt)?;
        if entry.is_dir() {
            continue;
        }

        let entry_name = entry.name().to_owned();
        let Some(rank) = matcher.rank(&entry_name) else {
            continue;
        };
        if selected.as_ref().is_some_and(|c| c.is_better_than(rank, &entry_name)) {
            log::debug!("skipping {}, a better match was already found", entry_name);
            continue;
        }

        let mut content = Vec::new();
        entry
            .read_to_end(&mut content)
            .map_err(ExtractError::corrupt)?;

        log::debug!("candidate entry {} ({} bytes)", entry_name, content.len());
        selected = Some(Candidate {
            rank,
            binary: ExtractedBinary {
                entry_name,
                content,
            },
        });
    }

    Ok(selected)
}
