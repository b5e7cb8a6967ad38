use std::cmp::Ordering;

use tracing::warn;

use super::normalize::normalize;
use super::tree::{TreeAssembler, breadcrumbs};
use super::{ListingEntry, ListingResult};
use crate::entry::RawEntry;
use crate::error::{ArchiveError, Result};
use crate::format::ContainerFormat;

/// Consume an entry stream and assemble the listing for `subpath`.
///
/// Unreadable entries are logged and skipped. Errors that concern the whole
/// container (password protection) abort, as does a stream that fails
/// before producing a single entry.
pub fn build_listing<I>(entries: I, subpath: &str, format: ContainerFormat) -> Result<ListingResult>
where
    I: Iterator<Item = Result<RawEntry>>,
{
    let mut tree = TreeAssembler::new(subpath);
    let mut read = 0usize;

    for item in entries {
        match item {
            Ok(entry) => {
                read += 1;
                if let Some(path) = normalize(&entry.path, subpath) {
                    tree.add(path, &entry);
                }
            }
            Err(e) if e.aborts_listing() => return Err(e),
            Err(e @ ArchiveError::CorruptArchive(_)) if read == 0 => return Err(e),
            Err(e) => warn!("Skipping unreadable entry: {}", e),
        }
    }

    Ok(ListingResult::from_entries(
        tree.finish(),
        subpath,
        format.is_rar_family(),
    ))
}

/// Directories first, then case-insensitive name, then full path.
pub fn listing_order(a: &ListingEntry, b: &ListingEntry) -> Ordering {
    b.is_dir
        .cmp(&a.is_dir)
        .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
        .then_with(|| a.path.cmp(&b.path))
}

/// The subpath with its last segment removed; empty at the root.
pub fn parent_subpath(subpath: &str) -> String {
    subpath
        .rsplit_once('/')
        .map(|(parent, _)| parent.to_string())
        .unwrap_or_default()
}

/// File count and byte total over non-directory entries. Sizes are
/// untrusted (ZIP64 fields, helper payloads), so the total saturates.
fn file_totals(entries: &[ListingEntry]) -> (u64, u64) {
    entries
        .iter()
        .filter(|e| !e.is_dir)
        .fold((0u64, 0u64), |(count, size), e| {
            (count + 1, size.saturating_add(e.size))
        })
}

impl ListingResult {
    /// Successful result over `entries`, sorted and counted.
    pub fn from_entries(mut entries: Vec<ListingEntry>, subpath: &str, is_rar_family: bool) -> Self {
        entries.sort_by(listing_order);
        let (file_count, total_size) = file_totals(&entries);

        Self {
            success: true,
            category: None,
            error: None,
            entries,
            file_count,
            total_size,
            breadcrumbs: breadcrumbs(subpath),
            current_subpath: subpath.to_string(),
            parent_subpath: parent_subpath(subpath),
            is_root: subpath.is_empty(),
            is_rar_family,
        }
    }

    /// Failed result carrying the error category and a readable message.
    pub fn failure(err: &ArchiveError, subpath: &str, is_rar_family: bool) -> Self {
        Self {
            success: false,
            category: err.category(),
            error: Some(err.to_string()),
            ..Self::from_entries(Vec::new(), subpath, is_rar_family)
        }
    }

    /// Re-establish the listing order and totals, e.g. on a payload received
    /// from the remote helper.
    pub fn normalized(self) -> Self {
        let mut result = self;
        result.entries.sort_by(listing_order);
        let (file_count, total_size) = file_totals(&result.entries);
        result.file_count = file_count;
        result.total_size = total_size;
        result
    }
}
