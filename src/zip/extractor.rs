use std::io::Read;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::error::ArchiveError;
use crate::io::ReadAt;
use anyhow::{Result, bail};
use flate2::Crc;
use flate2::read::DeflateDecoder;
use tracing::{debug, warn};

use super::parser::ZipParser;
use super::structures::{CompressionMethod, ZipFileEntry};

/// ZIP file extractor
pub struct ZipExtractor<R: ReadAt> {
    parser: ZipParser<R>,
}

impl<R: ReadAt> ZipExtractor<R> {
    pub fn new(reader: Arc<R>) -> Self {
        Self {
            parser: ZipParser::new(reader),
        }
    }

    /// List all files in the archive
    pub async fn list_files(&self) -> Result<Vec<ZipFileEntry>> {
        self.parser.list_files().await
    }

    /// Extract file data to memory, verifying the stored CRC-32
    pub async fn extract_to_memory(&self, entry: &ZipFileEntry) -> Result<Vec<u8>> {
        if entry.is_encrypted() {
            bail!("{} is encrypted", entry.file_name);
        }

        let data_offset = self.parser.get_data_offset(entry).await?;

        // Sizes come from the Central Directory; never allocate past the file.
        if data_offset
            .checked_add(entry.compressed_size)
            .is_none_or(|end| end > self.parser.reader().size())
        {
            bail!("Data for {} extends past end of file", entry.file_name);
        }

        let mut raw = vec![0u8; entry.compressed_size as usize];
        let read = self.parser.reader().read_at(data_offset, &mut raw).await?;
        if read < raw.len() {
            bail!("Truncated data for {}", entry.file_name);
        }

        let data = match entry.compression_method {
            CompressionMethod::Stored => raw,
            CompressionMethod::Deflate => {
                // One byte past the declared size is enough to detect a lie
                let limit = entry.uncompressed_size.saturating_add(1);
                let mut out = Vec::new();
                DeflateDecoder::new(raw.as_slice())
                    .take(limit)
                    .read_to_end(&mut out)?;
                out
            }
            CompressionMethod::Unknown(method) => {
                bail!(
                    "Unsupported compression method: {} (only STORED and DEFLATE are supported)",
                    method
                );
            }
        };

        if data.len() as u64 != entry.uncompressed_size {
            bail!(
                "Size mismatch for {}: expected {} bytes, got {}",
                entry.file_name,
                entry.uncompressed_size,
                data.len()
            );
        }

        let mut crc = Crc::new();
        crc.update(&data);
        if crc.sum() != entry.crc32 {
            bail!("CRC mismatch for {}", entry.file_name);
        }

        Ok(data)
    }

    /// Extract file to disk
    pub async fn extract_to_file(&self, entry: &ZipFileEntry, output_path: &Path) -> Result<()> {
        if let Some(parent) = output_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let data = self.extract_to_memory(entry).await?;

        let mut file = fs::File::create(output_path).await?;
        file.write_all(&data).await?;
        // tokio completes writes in the background until flushed
        file.flush().await?;

        Ok(())
    }

    /// Extract every member below `output_dir`.
    ///
    /// Members whose names would escape `output_dir` are skipped. Returns
    /// the number of files written.
    pub async fn extract_all(&self, output_dir: &Path) -> Result<usize> {
        let entries = self.list_files().await?;
        if entries.iter().any(ZipFileEntry::is_encrypted) {
            return Err(ArchiveError::password_required().into());
        }

        let mut written = 0;
        for entry in &entries {
            let Some(relative) = safe_relative_path(&entry.file_name) else {
                warn!("Skipping unsafe archive path: {}", entry.file_name);
                continue;
            };
            let target = output_dir.join(relative);

            if entry.is_directory {
                fs::create_dir_all(&target).await?;
                continue;
            }

            debug!("extracting: {}", entry.file_name);
            self.extract_to_file(entry, &target).await?;
            written += 1;
        }

        Ok(written)
    }
}

/// Map an archive member name to a relative path that stays inside the
/// extraction root, or `None` when it cannot.
pub fn safe_relative_path(name: &str) -> Option<PathBuf> {
    let normalized = name.replace('\\', "/");
    if normalized.starts_with('/') {
        return None;
    }

    let mut path = PathBuf::new();
    for component in Path::new(&normalized).components() {
        match component {
            Component::Normal(part) => path.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }

    if path.as_os_str().is_empty() {
        None
    } else {
        Some(path)
    }
}
