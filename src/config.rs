use std::path::{Path, PathBuf};
use std::time::Duration;

/// Settings for the [`BackendResolver`](crate::BackendResolver).
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Base URL of the remote RAR helper; `None` disables it.
    pub remote_url: Option<String>,
    /// Bound on every list/extract round trip.
    pub request_timeout: Duration,
    /// Bound on the health probe.
    pub probe_timeout: Duration,
    /// How long a successful probe is trusted. Within this window requests
    /// reuse the healthy state instead of checking `/health` each time; a
    /// failed remote listing clears it early. `Duration::ZERO` checks on
    /// every request.
    pub health_ttl: Duration,
    /// How long a failed probe is trusted. Zero re-probes on every request.
    pub unavailable_retry: Duration,
    /// Local directory the helper sees mounted at `remote_mount`.
    pub shared_root: Option<PathBuf>,
    pub remote_mount: String,
    /// Parent of the default extraction directories.
    pub extract_root: PathBuf,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            remote_url: None,
            request_timeout: Duration::from_secs(5),
            probe_timeout: Duration::from_secs(2),
            health_ttl: Duration::from_secs(30),
            unavailable_retry: Duration::ZERO,
            shared_root: None,
            remote_mount: "/shared".to_string(),
            extract_root: std::env::temp_dir().join("arcview"),
        }
    }
}

impl ResolverConfig {
    pub fn with_remote(mut self, url: impl Into<String>) -> Self {
        self.remote_url = Some(url.into());
        self
    }

    pub fn remote_enabled(&self) -> bool {
        self.remote_url.is_some()
    }

    /// Default extraction directory for `container`: `<extract_root>/<stem>`.
    pub fn default_output_dir(&self, container: &Path) -> PathBuf {
        let stem = container
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "archive".to_string());
        self.extract_root.join(stem)
    }

    /// Container path as the remote helper sees it.
    pub fn remote_path(&self, container: &Path) -> String {
        let relative = self
            .shared_root
            .as_deref()
            .and_then(|root| container.strip_prefix(root).ok());

        match relative {
            Some(relative) => {
                let relative = relative.to_string_lossy().replace('\\', "/");
                format!("{}/{}", self.remote_mount.trim_end_matches('/'), relative)
            }
            None => container.to_string_lossy().replace('\\', "/"),
        }
    }
}
