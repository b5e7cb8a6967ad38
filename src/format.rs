//! Container format recognition.
//!
//! Magic bytes decide first; the file extension is only consulted when the
//! signature is not one we know.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::io::AsyncReadExt;
use tracing::debug;

use crate::error::{ArchiveError, Result};

/// The container families the engine understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContainerFormat {
    Zip,
    RarFamily,
}

const MAGIC_LEN: u64 = 8;

impl ContainerFormat {
    /// Detect the format of the container at `path`.
    pub async fn detect(path: &Path) -> Result<Self> {
        let magic = Self::read_magic_bytes(path).await?;

        if let Some(format) = Self::detect_by_magic(&magic) {
            debug!("Detected format by magic bytes: {:?}", format);
            return Ok(format);
        }

        match Self::detect_by_extension(path) {
            Some(format) => {
                debug!("Detected format by extension: {:?}", format);
                Ok(format)
            }
            None => Err(ArchiveError::UnsupportedFeature(format!(
                "unknown archive format: {}",
                path.display()
            ))),
        }
    }

    pub fn is_rar_family(self) -> bool {
        self == ContainerFormat::RarFamily
    }

    /// Read up to the first 8 bytes; shorter files yield a shorter slice.
    async fn read_magic_bytes(path: &Path) -> Result<Vec<u8>> {
        let file = fs::File::open(path)
            .await
            .map_err(|e| ArchiveError::io(e, path))?;
        let mut magic = Vec::with_capacity(MAGIC_LEN as usize);
        file.take(MAGIC_LEN)
            .read_to_end(&mut magic)
            .await
            .map_err(|e| ArchiveError::io(e, path))?;
        Ok(magic)
    }

    fn detect_by_magic(magic: &[u8]) -> Option<Self> {
        match magic {
            // ZIP magic: PK\x03\x04, PK\x05\x06 (empty archive) or PK\x07\x08 (spanned)
            [0x50, 0x4B, 0x03, 0x04, ..]
            | [0x50, 0x4B, 0x05, 0x06, ..]
            | [0x50, 0x4B, 0x07, 0x08, ..] => Some(ContainerFormat::Zip),

            // RAR 1.5-4.x: Rar!\x1a\x07\x00, RAR 5: Rar!\x1a\x07\x01\x00
            [0x52, 0x61, 0x72, 0x21, 0x1A, 0x07, 0x00, ..]
            | [0x52, 0x61, 0x72, 0x21, 0x1A, 0x07, 0x01, 0x00, ..] => {
                Some(ContainerFormat::RarFamily)
            }

            _ => None,
        }
    }

    fn detect_by_extension(path: &Path) -> Option<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("")
            .to_lowercase();

        match extension.as_str() {
            "zip" | "cbz" | "jar" => Some(ContainerFormat::Zip),
            "rar" | "cbr" => Some(ContainerFormat::RarFamily),
            _ => None,
        }
    }
}
