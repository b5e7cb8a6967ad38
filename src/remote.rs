//! HTTP client for the remote RAR helper.
//!
//! The helper exposes `GET /health`, `POST /list` and `POST /extract`.
//! Every failure (timeout, refused connection, non-2xx status, a
//! `success: false` body) surfaces as [`ArchiveError::RemoteUnavailable`]
//! so the resolver can fall back uniformly.

use std::path::{Path, PathBuf};

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ResolverConfig;
use crate::error::{ArchiveError, Result};
use crate::listing::ListingResult;

/// Client for one remote helper endpoint
pub struct RemoteHelper {
    client: Client,
    base_url: String,
    config: ResolverConfig,
}

#[derive(Serialize)]
struct ListRequest<'a> {
    file_path: &'a str,
    subpath: &'a str,
}

#[derive(Serialize)]
struct ExtractRequest<'a> {
    file_path: &'a str,
    output_dir: &'a str,
}

#[derive(Deserialize)]
struct ExtractResponse {
    #[serde(default)]
    success: bool,
    output_dir: Option<String>,
    error: Option<String>,
}

fn unavailable(e: impl std::fmt::Display) -> ArchiveError {
    ArchiveError::RemoteUnavailable(e.to_string())
}

impl RemoteHelper {
    /// Create a client for `config.remote_url`.
    pub fn new(config: &ResolverConfig) -> Result<Self> {
        let Some(url) = config.remote_url.as_deref() else {
            return Err(unavailable("remote helper is disabled"));
        };

        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(unavailable)?;

        Ok(Self {
            client,
            base_url: url.trim_end_matches('/').to_string(),
            config: config.clone(),
        })
    }

    /// Probe the helper, bounded by the probe timeout
    pub async fn health(&self) -> Result<()> {
        let resp = self
            .client
            .get(format!("{}/health", self.base_url))
            .timeout(self.config.probe_timeout)
            .send()
            .await
            .map_err(unavailable)?;

        if !resp.status().is_success() {
            return Err(unavailable(format!(
                "health check failed with status: {}",
                resp.status()
            )));
        }
        Ok(())
    }

    /// Ask the helper for the listing of `container` at `subpath`
    pub async fn list(&self, container: &Path, subpath: &str) -> Result<ListingResult> {
        let file_path = self.config.remote_path(container);
        debug!("Remote listing of {} at '{}'", file_path, subpath);

        let resp = self
            .client
            .post(format!("{}/list", self.base_url))
            .json(&ListRequest {
                file_path: &file_path,
                subpath,
            })
            .send()
            .await
            .map_err(unavailable)?;

        if !resp.status().is_success() {
            return Err(unavailable(format!(
                "list request failed with status: {}",
                resp.status()
            )));
        }

        let result: ListingResult = resp.json().await.map_err(unavailable)?;
        if !result.success {
            return Err(unavailable(
                result
                    .error
                    .unwrap_or_else(|| "helper reported failure".to_string()),
            ));
        }
        Ok(result)
    }

    /// Ask the helper to extract `container`; returns the helper's output path
    pub async fn extract(&self, container: &Path, output_hint: &Path) -> Result<PathBuf> {
        let file_path = self.config.remote_path(container);
        let output_dir = output_hint.to_string_lossy();

        let resp = self
            .client
            .post(format!("{}/extract", self.base_url))
            .json(&ExtractRequest {
                file_path: &file_path,
                output_dir: &output_dir,
            })
            .send()
            .await
            .map_err(unavailable)?;

        if !resp.status().is_success() {
            return Err(unavailable(format!(
                "extract request failed with status: {}",
                resp.status()
            )));
        }

        let body: ExtractResponse = resp.json().await.map_err(unavailable)?;
        if !body.success {
            return Err(unavailable(
                body.error
                    .unwrap_or_else(|| "helper could not extract the archive".to_string()),
            ));
        }

        Ok(body
            .output_dir
            .map(PathBuf::from)
            .unwrap_or_else(|| output_hint.to_path_buf()))
    }
}
