//! Entry Reader: turns a container on disk into a lazy stream of [`RawEntry`].
//!
//! Everything above this module works on `RawEntry` alone; the ZIP/RAR split
//! ends here.

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use tokio::fs;
use tracing::warn;

use crate::error::{ArchiveError, Result};
use crate::io::LocalFileReader;
use crate::listing::canonical_path;
use crate::zip::{CentralDirectory, ZipParser};

/// One physical record read from a container.
///
/// `path` uses `/` separators and never starts or ends with `/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEntry {
    pub path: String,
    pub size: u64,
    pub compressed_size: u64,
    pub modified_at: Option<DateTime<Utc>>,
    /// True only for directory records stored natively by the format.
    pub is_directory_marker: bool,
}

/// Convert an MS-DOS date/time pair to UTC. Returns `None` for stamps that
/// do not name a real calendar time (e.g. the all-zero stamp).
pub(crate) fn dos_datetime(date: u16, time: u16) -> Option<DateTime<Utc>> {
    let day = (date & 0x1F) as u32;
    let month = ((date >> 5) & 0x0F) as u32;
    let year = ((date >> 9) & 0x7F) as i32 + 1980;
    let second = ((time & 0x1F) * 2) as u32;
    let minute = ((time >> 5) & 0x3F) as u32;
    let hour = ((time >> 11) & 0x1F) as u32;

    let naive = NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, minute, second)?;
    Some(Utc.from_utc_datetime(&naive))
}

/// Verify that `path` names an existing regular file.
pub async fn check_container(path: &Path) -> Result<()> {
    match fs::metadata(path).await {
        Ok(meta) if meta.is_file() => Ok(()),
        Ok(_) => Err(ArchiveError::NotAFile(path.to_path_buf())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(ArchiveError::NotFound(path.to_path_buf()))
        }
        Err(e) => Err(ArchiveError::io(e, path)),
    }
}

/// A lazy, finite, non-restartable sequence of entries from one container.
pub enum EntryStream {
    Zip(ZipEntries),
    #[cfg(feature = "local-rar")]
    Rar(crate::rar::RarEntries),
}

impl Iterator for EntryStream {
    type Item = Result<RawEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            EntryStream::Zip(entries) => entries.next(),
            #[cfg(feature = "local-rar")]
            EntryStream::Rar(entries) => entries.next(),
        }
    }
}

/// Entries of a ZIP container, decoded from its Central Directory.
///
/// Directory markers (names ending in `/`) are not yielded; the tree is
/// rebuilt from file paths.
pub struct ZipEntries {
    directory: CentralDirectory,
}

impl ZipEntries {
    /// Open `path` and load its Central Directory.
    ///
    /// The file handle is closed before this returns; iteration works on the
    /// directory bytes already in memory.
    pub async fn open(path: &Path) -> Result<Self> {
        let reader = LocalFileReader::new(path).map_err(|e| ArchiveError::io(e, path))?;
        let parser = ZipParser::new(Arc::new(reader));
        let directory = parser
            .central_directory()
            .await
            .map_err(|e| ArchiveError::CorruptArchive(format!("{e:#}")))?;

        if directory.total_entries() == 0 {
            return Err(ArchiveError::EmptyArchive);
        }

        Ok(Self { directory })
    }
}

impl Iterator for ZipEntries {
    type Item = Result<RawEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = match self.directory.next()? {
                Ok(entry) => entry,
                Err(e) => return Some(Err(ArchiveError::CorruptArchive(format!("{e:#}")))),
            };

            if entry.is_encrypted() {
                return Some(Err(ArchiveError::password_required()));
            }
            if entry.is_directory {
                continue;
            }

            let path = canonical_path(&entry.file_name);
            if path.is_empty() {
                warn!("Skipping entry with unusable name {:?}", entry.file_name);
                continue;
            }

            return Some(Ok(RawEntry {
                path,
                size: entry.uncompressed_size,
                compressed_size: entry.compressed_size,
                modified_at: entry.modified_at(),
                is_directory_marker: false,
            }));
        }
    }
}
