use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::debug;

use super::normalize::NormalizedPath;
use super::{Breadcrumb, ListingEntry};
use crate::entry::RawEntry;

/// Builds the flat listing for one subpath, synthesizing the directories
/// implied by file paths.
///
/// Entries are de-duplicated by full path. Synthesized directories have
/// size 0 and are not credited with their descendants' sizes.
pub struct TreeAssembler {
    subpath: String,
    entries: Vec<ListingEntry>,
    index: HashMap<String, usize>,
    native_dirs: Vec<(NormalizedPath, Option<DateTime<Utc>>)>,
}

impl TreeAssembler {
    pub fn new(subpath: &str) -> Self {
        Self {
            subpath: subpath.to_string(),
            entries: Vec::new(),
            index: HashMap::new(),
            native_dirs: Vec::new(),
        }
    }

    /// Add one in-scope entry.
    pub fn add(&mut self, path: NormalizedPath, entry: &RawEntry) {
        // The subpath names this entry itself: it has no children to show.
        if path.display.is_empty() {
            return;
        }

        if entry.is_directory_marker {
            self.native_dirs.push((path, entry.modified_at));
            return;
        }

        let mut segments: Vec<&str> = path.display.split('/').collect();
        let Some(name) = segments.pop() else {
            return;
        };

        let mut running = String::new();
        for segment in segments {
            if !running.is_empty() {
                running.push('/');
            }
            running.push_str(segment);

            let full = self.full_path(&running);
            if !self.index.contains_key(&full) {
                self.push(ListingEntry::directory(segment, full, None));
            }
        }

        self.push(ListingEntry {
            name: name.to_string(),
            path: path.full.clone(),
            size: entry.size,
            compressed_size: entry.compressed_size,
            modified_at: entry.modified_at,
            is_dir: false,
        });
    }

    /// Fold in native directory records and return the entries in
    /// insertion order.
    ///
    /// A native record only supplies the timestamp of a directory that file
    /// paths already imply, except for immediate children of the subpath,
    /// which are shown even when empty.
    pub fn finish(mut self) -> Vec<ListingEntry> {
        for (path, modified_at) in std::mem::take(&mut self.native_dirs) {
            match self.index.get(&path.full).copied() {
                Some(i) => {
                    let existing = &mut self.entries[i];
                    if existing.is_dir && modified_at.is_some() {
                        existing.modified_at = modified_at;
                    }
                }
                None if !path.display.contains('/') => {
                    let name = path.display.clone();
                    self.push(ListingEntry::directory(&name, path.full, modified_at));
                }
                None => debug!("Dropping directory record with no files beneath: {}", path.full),
            }
        }
        self.entries
    }

    fn full_path(&self, display: &str) -> String {
        if self.subpath.is_empty() {
            display.to_string()
        } else {
            format!("{}/{}", self.subpath, display)
        }
    }

    fn push(&mut self, entry: ListingEntry) {
        self.index
            .entry(entry.path.clone())
            .or_insert(self.entries.len());
        self.entries.push(entry);
    }
}

/// One crumb per segment of `subpath`, root first.
pub fn breadcrumbs(subpath: &str) -> Vec<Breadcrumb> {
    let parts: Vec<&str> = subpath.split('/').filter(|p| !p.is_empty()).collect();
    let mut running = String::new();

    parts
        .iter()
        .enumerate()
        .map(|(i, part)| {
            if !running.is_empty() {
                running.push('/');
            }
            running.push_str(part);
            Breadcrumb {
                name: part.to_string(),
                path: running.clone(),
                is_last: i == parts.len() - 1,
            }
        })
        .collect()
}
