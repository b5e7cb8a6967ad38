//! Hierarchical, subpath-scoped listings of container contents.
//!
//! The local pipeline runs in four steps:
//!
//! 1. the Entry Reader ([`crate::entry`]) yields [`RawEntry`](crate::entry::RawEntry) values,
//! 2. [`normalize`] canonicalizes each path and filters it to the subpath,
//! 3. [`TreeAssembler`] synthesizes the directories implied by file paths,
//! 4. [`build_listing`] sorts, counts and wraps everything in a [`ListingResult`].
//!
//! A result carries the whole subtree below the subpath;
//! [`ListingResult::children`] picks out the level a browser displays.

mod builder;
mod normalize;
mod tree;

pub use builder::{build_listing, listing_order, parent_subpath};
pub use normalize::{NormalizedPath, canonical_path, normalize};
pub use tree::{TreeAssembler, breadcrumbs};

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::entry::{EntryStream, ZipEntries, check_container};
use crate::error::{ArchiveError, ErrorCategory, Result};
use crate::format::ContainerFormat;

/// A node of the displayed tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingEntry {
    /// Last path segment
    pub name: String,
    /// Full path relative to the container root
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub compressed_size: u64,
    #[serde(rename = "date", default, with = "epoch_seconds")]
    pub modified_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_dir: bool,
}

impl ListingEntry {
    pub fn directory(name: &str, path: String, modified_at: Option<DateTime<Utc>>) -> Self {
        Self {
            name: name.to_string(),
            path,
            size: 0,
            compressed_size: 0,
            modified_at,
            is_dir: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Breadcrumb {
    pub name: String,
    pub path: String,
    #[serde(default)]
    pub is_last: bool,
}

/// The listing of one container at one subpath.
///
/// Serializes field-for-field like the remote helper's payload, so local and
/// remote listings are interchangeable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<ErrorCategory>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(rename = "contents", default)]
    pub entries: Vec<ListingEntry>,
    #[serde(default)]
    pub file_count: u64,
    #[serde(default)]
    pub total_size: u64,
    #[serde(default)]
    pub breadcrumbs: Vec<Breadcrumb>,
    #[serde(rename = "current_path", default)]
    pub current_subpath: String,
    #[serde(rename = "parent_path", default)]
    pub parent_subpath: String,
    #[serde(default)]
    pub is_root: bool,
    #[serde(rename = "is_rar", default)]
    pub is_rar_family: bool,
}

impl ListingResult {
    /// Entries that sit directly under the current subpath.
    pub fn children(&self) -> impl Iterator<Item = &ListingEntry> {
        let prefix = if self.current_subpath.is_empty() {
            String::new()
        } else {
            format!("{}/", self.current_subpath)
        };

        self.entries.iter().filter(move |entry| {
            entry
                .path
                .strip_prefix(prefix.as_str())
                .is_some_and(|rest| !rest.is_empty() && !rest.contains('/'))
        })
    }
}

/// List `container` at `subpath` with the local readers only.
///
/// Reportable failures come back as `Ok` with `success == false`; `Err` is
/// reserved for I/O failures after the container passed the existence check.
pub async fn list_local(container: &Path, subpath: &str) -> Result<ListingResult> {
    let subpath = canonical_path(subpath);

    if let Err(e) = check_container(container).await {
        return settle(Err(e), &subpath, None);
    }
    let format = match ContainerFormat::detect(container).await {
        Ok(format) => format,
        Err(e) => return settle(Err(e), &subpath, None),
    };

    let outcome = match format {
        ContainerFormat::Zip => list_zip(container, &subpath).await,
        ContainerFormat::RarFamily => list_rar(container, &subpath).await,
    };
    settle(outcome, &subpath, Some(format))
}

/// Turn a pipeline outcome into the caller-facing result.
pub(crate) fn settle(
    outcome: Result<ListingResult>,
    subpath: &str,
    format: Option<ContainerFormat>,
) -> Result<ListingResult> {
    let is_rar_family = format.is_some_and(ContainerFormat::is_rar_family);

    match outcome {
        Ok(result) => Ok(result),
        Err(ArchiveError::EmptyArchive) => {
            Ok(ListingResult::from_entries(Vec::new(), subpath, is_rar_family))
        }
        Err(e) if e.category().is_some() => {
            warn!("Listing failed: {}", e);
            Ok(ListingResult::failure(&e, subpath, is_rar_family))
        }
        Err(e) => Err(e),
    }
}

async fn list_zip(container: &Path, subpath: &str) -> Result<ListingResult> {
    let entries = EntryStream::Zip(ZipEntries::open(container).await?);
    build_listing(entries, subpath, ContainerFormat::Zip)
}

#[cfg(feature = "local-rar")]
async fn list_rar(container: &Path, subpath: &str) -> Result<ListingResult> {
    let path = container.to_path_buf();
    let subpath = subpath.to_string();

    tokio::task::spawn_blocking(move || {
        let entries = EntryStream::Rar(crate::rar::RarEntries::open(&path)?);
        build_listing(entries, &subpath, ContainerFormat::RarFamily)
    })
    .await
    .map_err(|e| ArchiveError::io(std::io::Error::other(e), container))?
}

#[cfg(not(feature = "local-rar"))]
async fn list_rar(_container: &Path, _subpath: &str) -> Result<ListingResult> {
    Err(ArchiveError::UnsupportedFeature(
        "RAR listing needs the local decoder or a remote helper".to_string(),
    ))
}

/// Unix seconds on the wire. Integer and float input are both accepted.
mod epoch_seconds {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(ts) => serializer.serialize_some(&ts.timestamp()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        let secs = Option::<f64>::deserialize(deserializer)?;
        Ok(secs.and_then(|s| DateTime::from_timestamp(s.trunc() as i64, 0)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(path: &str) -> ListingEntry {
        ListingEntry {
            name: path.rsplit('/').next().unwrap().to_string(),
            path: path.to_string(),
            size: 1,
            compressed_size: 1,
            modified_at: None,
            is_dir: false,
        }
    }

    #[test]
    fn test_children_filters_to_one_level() {
        let result = ListingResult::from_entries(
            vec![
                ListingEntry::directory("b", "a/b".into(), None),
                file("a/b/c.txt"),
                file("a/top.txt"),
            ],
            "a",
            false,
        );
        let names: Vec<_> = result.children().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["b", "top.txt"]);
    }

    #[test]
    fn test_wire_keys() {
        let mut entry = file("docs/readme.txt");
        entry.modified_at = DateTime::from_timestamp(1_700_000_000, 0);
        let result = ListingResult::from_entries(vec![entry], "docs", true);

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["contents"][0]["date"], 1_700_000_000);
        assert_eq!(json["current_path"], "docs");
        assert_eq!(json["parent_path"], "");
        assert_eq!(json["is_rar"], true);
        assert_eq!(json["breadcrumbs"][0]["is_last"], true);
        assert!(json.get("category").is_none());

        let back: ListingResult = serde_json::from_value(json).unwrap();
        assert_eq!(back, result);
    }

    #[test]
    fn test_accepts_sparse_helper_payload() {
        let payload = r#"{
            "success": true,
            "contents": [{"name": "a.txt", "size": 3, "date": 1700000000.75, "is_dir": false}],
            "is_rar": true
        }"#;
        let result: ListingResult = serde_json::from_str(payload).unwrap();
        assert_eq!(result.entries[0].size, 3);
        assert_eq!(
            result.entries[0].modified_at,
            DateTime::from_timestamp(1_700_000_000, 0)
        );
        assert!(result.is_rar_family);
        assert_eq!(result.file_count, 0);
        assert_eq!(result.normalized().file_count, 1);
    }
}
