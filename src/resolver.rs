//! Backend selection for listing and extraction.
//!
//! ZIP containers always go through the local pipeline. RAR-family
//! containers go to the remote helper when it is configured and answers its
//! health probe, and fall back to the local decoder on any remote failure.

use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Instant;

use tokio::fs;
use tracing::{debug, info, warn};

use crate::config::ResolverConfig;
use crate::entry::check_container;
use crate::error::{ArchiveError, Result};
use crate::format::ContainerFormat;
use crate::io::LocalFileReader;
use crate::listing::{ListingResult, canonical_path, list_local};
use crate::remote::RemoteHelper;
use crate::zip::ZipExtractor;

/// What the resolver currently believes about the remote helper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendHealth {
    Unchecked,
    Healthy,
    Unavailable,
}

/// Last probe outcome. Concurrent callers may race to overwrite it; the
/// last writer wins and the others simply probe again or fall back.
#[derive(Debug, Clone, Copy)]
struct HealthMemo {
    state: BackendHealth,
    checked_at: Option<Instant>,
}

/// Result of [`BackendResolver::extract_archive`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractOutcome {
    /// Directory holding the extracted members
    Extracted(PathBuf),
    /// Human-readable reason
    Failed(String),
}

impl ExtractOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ExtractOutcome::Extracted(_))
    }

    pub fn into_result(self) -> std::result::Result<PathBuf, String> {
        match self {
            ExtractOutcome::Extracted(path) => Ok(path),
            ExtractOutcome::Failed(reason) => Err(reason),
        }
    }
}

/// Whether RAR containers can be decoded in-process.
pub fn rar_decoder_available() -> bool {
    cfg!(feature = "local-rar")
}

/// Entry point for the file-browsing layer.
pub struct BackendResolver {
    config: ResolverConfig,
    remote: Option<RemoteHelper>,
    memo: RwLock<HealthMemo>,
}

impl BackendResolver {
    pub fn new(config: ResolverConfig) -> Self {
        let remote = match RemoteHelper::new(&config) {
            Ok(remote) => Some(remote),
            Err(e) => {
                if config.remote_enabled() {
                    warn!("Remote helper disabled: {}", e);
                }
                None
            }
        };

        let state = if remote.is_some() {
            BackendHealth::Unchecked
        } else {
            BackendHealth::Unavailable
        };

        Self {
            config,
            remote,
            memo: RwLock::new(HealthMemo {
                state,
                checked_at: None,
            }),
        }
    }

    pub fn health(&self) -> BackendHealth {
        self.memo.read().unwrap_or_else(PoisonError::into_inner).state
    }

    /// List `container` at `subpath`.
    ///
    /// Remote failures never reach the caller; they only trigger the local
    /// path for this request.
    pub async fn list_contents(&self, container: &Path, subpath: &str) -> Result<ListingResult> {
        let subpath = canonical_path(subpath);

        let is_rar = ContainerFormat::detect(container)
            .await
            .is_ok_and(ContainerFormat::is_rar_family);

        if is_rar {
            if let Some(remote) = self.ready_remote().await {
                match remote.list(container, &subpath).await {
                    Ok(result) => {
                        debug!("Listed {} through the remote helper", container.display());
                        return Ok(ListingResult {
                            is_rar_family: true,
                            ..result.normalized()
                        });
                    }
                    Err(e) => {
                        warn!("Remote listing failed, using local decoder: {}", e);
                        self.record(BackendHealth::Unchecked, None);
                    }
                }
            }
        }

        list_local(container, &subpath).await
    }

    /// Extract `container` into `output_dir` (default
    /// `<extract_root>/<stem>`).
    ///
    /// Failures are reported in the outcome, never raised.
    pub async fn extract_archive(
        &self,
        container: &Path,
        output_dir: Option<&Path>,
        password: Option<&str>,
    ) -> ExtractOutcome {
        match self.try_extract(container, output_dir, password).await {
            Ok(path) => {
                info!("Extracted {} to {}", container.display(), path.display());
                ExtractOutcome::Extracted(path)
            }
            Err(e) => {
                warn!("Extraction of {} failed: {}", container.display(), e);
                ExtractOutcome::Failed(e.to_string())
            }
        }
    }

    async fn try_extract(
        &self,
        container: &Path,
        output_dir: Option<&Path>,
        password: Option<&str>,
    ) -> Result<PathBuf> {
        check_container(container).await?;
        let format = ContainerFormat::detect(container).await?;

        let target = output_dir
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.config.default_output_dir(container));
        let mut guard = OutputDirGuard::create(&target).await?;

        match format {
            ContainerFormat::Zip => {
                extract_zip(container, &target).await?;
            }
            ContainerFormat::RarFamily if rar_decoder_available() => {
                extract_rar_local(container, &target, password).await?;
            }
            ContainerFormat::RarFamily => {
                let remote = self.ready_remote().await.ok_or_else(|| {
                    ArchiveError::RemoteUnavailable(
                        "no local RAR decoder and the remote helper is unavailable".to_string(),
                    )
                })?;
                // The helper writes on its own filesystem; the local
                // directory is dropped with the guard.
                return remote.extract(container, &target).await;
            }
        }

        guard.keep();
        Ok(target)
    }

    /// The remote helper if it is configured and currently healthy,
    /// probing it when the memo is stale.
    async fn ready_remote(&self) -> Option<&RemoteHelper> {
        let remote = self.remote.as_ref()?;

        let memo = *self.memo.read().unwrap_or_else(PoisonError::into_inner);
        let fresh = |ttl| memo.checked_at.is_some_and(|at: Instant| at.elapsed() < ttl);
        match memo.state {
            BackendHealth::Healthy if fresh(self.config.health_ttl) => return Some(remote),
            BackendHealth::Unavailable if fresh(self.config.unavailable_retry) => return None,
            _ => {}
        }

        match remote.health().await {
            Ok(()) => {
                self.record(BackendHealth::Healthy, Some(Instant::now()));
                Some(remote)
            }
            Err(e) => {
                warn!("Remote helper health probe failed: {}", e);
                self.record(BackendHealth::Unavailable, Some(Instant::now()));
                None
            }
        }
    }

    fn record(&self, state: BackendHealth, checked_at: Option<Instant>) {
        *self.memo.write().unwrap_or_else(PoisonError::into_inner) = HealthMemo { state, checked_at };
    }
}

/// Removes an output directory this call created unless extraction
/// succeeded.
struct OutputDirGuard {
    path: PathBuf,
    created: bool,
    keep: bool,
}

impl OutputDirGuard {
    async fn create(path: &Path) -> Result<Self> {
        let existed = fs::try_exists(path).await.unwrap_or(false);
        fs::create_dir_all(path)
            .await
            .map_err(|e| ArchiveError::io(e, path))?;
        Ok(Self {
            path: path.to_path_buf(),
            created: !existed,
            keep: false,
        })
    }

    fn keep(&mut self) {
        self.keep = true;
    }
}

impl Drop for OutputDirGuard {
    fn drop(&mut self) {
        if self.created && !self.keep {
            if let Err(e) = std::fs::remove_dir_all(&self.path) {
                debug!("Could not remove {}: {}", self.path.display(), e);
            }
        }
    }
}

async fn extract_zip(container: &Path, target: &Path) -> Result<usize> {
    let reader = LocalFileReader::new(container).map_err(|e| ArchiveError::io(e, container))?;
    ZipExtractor::new(Arc::new(reader))
        .extract_all(target)
        .await
        .map_err(|e| match e.downcast::<ArchiveError>() {
            Ok(archive_error) => archive_error,
            Err(e) => match e.downcast::<std::io::Error>() {
                Ok(io) => ArchiveError::io(io, target),
                Err(e) => ArchiveError::CorruptArchive(format!("{e:#}")),
            },
        })
}

#[cfg(feature = "local-rar")]
async fn extract_rar_local(container: &Path, target: &Path, password: Option<&str>) -> Result<usize> {
    let (path, out, password) = (
        container.to_path_buf(),
        target.to_path_buf(),
        password.map(str::to_string),
    );
    tokio::task::spawn_blocking(move || crate::rar::extract_to(&path, &out, password.as_deref()))
        .await
        .map_err(|e| ArchiveError::io(std::io::Error::other(e), container))?
}

#[cfg(not(feature = "local-rar"))]
async fn extract_rar_local(_container: &Path, _target: &Path, _password: Option<&str>) -> Result<usize> {
    Err(ArchiveError::UnsupportedFeature(
        "built without the local RAR decoder".to_string(),
    ))
}
