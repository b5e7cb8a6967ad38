//! RAR-family containers, read through the bundled unrar library.
//!
//! unrar works on blocking file handles, so everything here is synchronous
//! and is driven from `spawn_blocking` by the listing pipeline and the
//! resolver.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use unrar::error::{Code, UnrarError};
use unrar::{Archive, FileHeader};

use crate::entry::{RawEntry, dos_datetime};
use crate::error::{ArchiveError, Result};
use crate::listing::canonical_path;

type HeaderResult = std::result::Result<FileHeader, UnrarError>;

/// Entries of a RAR container in header order.
///
/// Native directory records are passed through with
/// `is_directory_marker = true`. The unrar handle is closed when this value
/// is dropped, whether or not iteration finished.
pub struct RarEntries {
    path: PathBuf,
    headers: Box<dyn Iterator<Item = HeaderResult>>,
    first: Option<HeaderResult>,
}

impl RarEntries {
    pub fn open(path: &Path) -> Result<Self> {
        let archive = Archive::new(path)
            .open_for_listing()
            .map_err(|e| map_unrar_error(e, path))?;

        let mut headers: Box<dyn Iterator<Item = HeaderResult>> = Box::new(archive);
        match headers.next() {
            Some(first) => Ok(Self {
                path: path.to_path_buf(),
                headers,
                first: Some(first),
            }),
            None => Err(ArchiveError::EmptyArchive),
        }
    }
}

impl Iterator for RarEntries {
    type Item = Result<RawEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let header = match self.first.take() {
                Some(header) => header,
                None => self.headers.next()?,
            };

            match header {
                Ok(header) => match raw_entry(&header) {
                    Ok(Some(entry)) => return Some(Ok(entry)),
                    Ok(None) => continue,
                    Err(e) => return Some(Err(e)),
                },
                Err(e) => return Some(Err(map_unrar_error(e, &self.path))),
            }
        }
    }
}

/// `Ok(None)` for a record whose name has no usable segment.
fn raw_entry(header: &FileHeader) -> Result<Option<RawEntry>> {
    if header.is_encrypted() {
        return Err(ArchiveError::password_required());
    }

    let path = canonical_path(&header.filename.to_string_lossy());
    if path.is_empty() {
        warn!("Skipping entry with unusable name {:?}", header.filename);
        return Ok(None);
    }

    let date = (header.file_time >> 16) as u16;
    let time = (header.file_time & 0xFFFF) as u16;

    // The RAR header exposes no packed size; report the unpacked one.
    Ok(Some(RawEntry {
        path,
        size: header.unpacked_size,
        compressed_size: header.unpacked_size,
        modified_at: dos_datetime(date, time),
        is_directory_marker: header.is_directory(),
    }))
}

/// Extract every member of the RAR container into `output_dir`.
///
/// Returns the number of files written.
pub fn extract_to(path: &Path, output_dir: &Path, password: Option<&str>) -> Result<usize> {
    let archive = match password {
        Some(password) => Archive::with_password(path, password),
        None => Archive::new(path),
    };
    let mut cursor = archive
        .open_for_processing()
        .map_err(|e| map_unrar_error(e, path))?;

    let mut written = 0;
    while let Some(header) = cursor.read_header().map_err(|e| map_unrar_error(e, path))? {
        let is_file = header.entry().is_file();
        debug!("extracting: {}", header.entry().filename.display());
        cursor = header
            .extract_with_base(output_dir)
            .map_err(|e| map_unrar_error(e, path))?;
        if is_file {
            written += 1;
        }
    }

    Ok(written)
}

fn map_unrar_error(e: UnrarError, path: &Path) -> ArchiveError {
    match e.code {
        Code::MissingPassword => ArchiveError::password_required(),
        Code::BadPassword => {
            ArchiveError::UnsupportedFeature("wrong password for encrypted archive".to_string())
        }
        Code::EOpen | Code::ERead | Code::ECreate | Code::EWrite | Code::EClose => {
            ArchiveError::io(std::io::Error::other(e.to_string()), path)
        }
        _ => ArchiveError::CorruptArchive(e.to_string()),
    }
}
