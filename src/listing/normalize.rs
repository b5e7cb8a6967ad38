/// Canonical form of an archive-internal path: `/` separators, no leading,
/// trailing or doubled slashes, no `.` segments.
pub fn canonical_path(raw: &str) -> String {
    raw.replace('\\', "/")
        .split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .collect::<Vec<_>>()
        .join("/")
}

/// An entry path that falls inside the requested subpath.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedPath {
    /// Path relative to the container root
    pub full: String,
    /// Path relative to the requested subpath; empty when the entry is the
    /// subpath itself
    pub display: String,
}

/// Normalize `raw_path` and scope it to `subpath` (already canonical).
///
/// Returns `None` for entries outside the subpath.
pub fn normalize(raw_path: &str, subpath: &str) -> Option<NormalizedPath> {
    let full = canonical_path(raw_path);

    if subpath.is_empty() {
        return Some(NormalizedPath {
            display: full.clone(),
            full,
        });
    }

    let display = if full == subpath {
        String::new()
    } else {
        full.strip_prefix(subpath)?.strip_prefix('/')?.to_string()
    };

    Some(NormalizedPath { full, display })
}
