//! # Retrying HTTP Fetcher Module
//!
//! Questo modulo gestisce il download di media remoti su disco.
//!
//! ## Responsabilità:
//! - Download streaming con `reqwest` (chunk per chunk, mai body in memoria)
//! - Retry con exponential backoff (1s, 2s, 4s, ...) fino a `max_attempts`
//! - Skip dei file già presenti senza alcuna chiamata di rete
//! - Limite dimensione file via Content-Length dichiarato (policy, non retry)
//! - Scrittura su file temporaneo e rename atomico a download completato,
//!   così un tentativo fallito non lascia file parziali a destinazione
//! - Probe di esistenza leggero (`head_exists`) per l'audio resolver
//!
//! ## Timeout:
//! - Fetch: 30s di connect/read timeout per tentativo, non cumulativo
//! - Probe: 10s per richiesta HEAD
//!
//! ## Contabilità:
//! - `skipped` incrementato per ogni file già presente
//! - `errors` incrementato una sola volta per chiamata, dopo aver esaurito
//!   i tentativi (mai una volta per tentativo)
//! - La cancellazione interrompe il retry loop senza contare un errore

use futures::StreamExt;
use reqwest::{Client, StatusCode};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::error::DownloadError;
use crate::progress::DownloadStats;

/// Connect/read timeout applied to each fetch attempt.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(30);
/// Total timeout for one existence probe.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// A resolved (source URL, destination path) pair for one asset.
#[derive(Debug, Clone)]
pub struct DownloadTarget {
    pub url: String,
    pub dest: PathBuf,
}

impl DownloadTarget {
    pub fn new(url: impl Into<String>, dest: impl Into<PathBuf>) -> Self {
        Self {
            url: url.into(),
            dest: dest.into(),
        }
    }
}

/// Result of one fetch call.
#[derive(Debug)]
pub enum FetchOutcome {
    /// The file was fully written to the destination path.
    Success { bytes_written: u64 },
    /// The destination already exists and overwrite is off; no network call
    /// was made.
    SkippedExisting,
    /// The server declared a Content-Length above the configured ceiling.
    /// Policy rejection: not retried and not counted as a network error.
    SizeExceeded { declared: u64, ceiling: u64 },
    /// All attempts failed (or the run was cancelled mid-retry).
    Failed(DownloadError),
}

enum Attempt {
    Written(u64),
    TooLarge(u64),
}

/// Retrying, size-bounded streaming downloader.
#[derive(Clone)]
pub struct Fetcher {
    client: Client,
    stats: Arc<DownloadStats>,
    cancel: CancellationToken,
    overwrite: bool,
    max_attempts: u32,
    size_ceiling: u64,
}

impl Fetcher {
    pub fn new(
        config: &Config,
        stats: Arc<DownloadStats>,
        cancel: CancellationToken,
    ) -> Result<Self, DownloadError> {
        let client = Client::builder()
            .connect_timeout(FETCH_TIMEOUT)
            .read_timeout(FETCH_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            stats,
            cancel,
            overwrite: config.overwrite,
            max_attempts: config.max_attempts,
            size_ceiling: config.size_ceiling_bytes(),
        })
    }

    /// Download a target to disk with retry.
    ///
    /// Writes at most one file per call; on failure no file is left at the
    /// destination path.
    pub async fn fetch(&self, target: &DownloadTarget) -> FetchOutcome {
        if target.dest.exists() && !self.overwrite {
            info!("Skipping existing file: {}", target.dest.display());
            self.stats.add_skipped();
            return FetchOutcome::SkippedExisting;
        }

        let mut last_error: Option<DownloadError> = None;

        for attempt in 0..self.max_attempts {
            if self.cancel.is_cancelled() {
                return FetchOutcome::Failed(DownloadError::Cancelled);
            }

            debug!(
                "Downloading {} to {} (attempt {})",
                target.url,
                target.dest.display(),
                attempt + 1
            );

            match self.attempt(target).await {
                Ok(Attempt::Written(bytes_written)) => {
                    info!(
                        "Successfully downloaded: {}",
                        target.dest.file_name().unwrap_or_default().to_string_lossy()
                    );
                    return FetchOutcome::Success { bytes_written };
                }
                Ok(Attempt::TooLarge(declared)) => {
                    warn!(
                        "File exceeds size limit ({:.2}MB > {:.2}MB): {}",
                        declared as f64 / (1024.0 * 1024.0),
                        self.size_ceiling as f64 / (1024.0 * 1024.0),
                        target.url
                    );
                    return FetchOutcome::SizeExceeded {
                        declared,
                        ceiling: self.size_ceiling,
                    };
                }
                Err(e) => {
                    warn!("Download attempt {} failed: {}", attempt + 1, e);
                    last_error = Some(e);

                    if attempt + 1 < self.max_attempts {
                        let backoff = Duration::from_secs(1 << attempt);
                        tokio::select! {
                            _ = tokio::time::sleep(backoff) => {}
                            _ = self.cancel.cancelled() => {
                                return FetchOutcome::Failed(DownloadError::Cancelled);
                            }
                        }
                    }
                }
            }
        }

        error!(
            "Failed to download {} after {} attempts",
            target.url, self.max_attempts
        );
        self.stats.add_error();
        FetchOutcome::Failed(last_error.unwrap_or(DownloadError::Cancelled))
    }

    /// One streaming download attempt: GET, ceiling check, stream to a
    /// temporary file, rename into place.
    async fn attempt(&self, target: &DownloadTarget) -> Result<Attempt, DownloadError> {
        let response = self.client.get(&target.url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::Status(status.as_u16()));
        }

        if self.size_ceiling > 0 {
            if let Some(declared) = response.content_length() {
                if declared > self.size_ceiling {
                    return Ok(Attempt::TooLarge(declared));
                }
            }
        }

        let parent = target.dest.parent().ok_or_else(|| {
            DownloadError::Validation(format!(
                "Destination has no parent directory: {}",
                target.dest.display()
            ))
        })?;

        let temp = NamedTempFile::new_in(parent)?;
        let mut file = tokio::fs::File::create(temp.path()).await?;
        let mut stream = response.bytes_stream();
        let mut bytes_written = 0u64;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            bytes_written += chunk.len() as u64;
        }

        file.flush().await?;
        drop(file);

        temp.persist(&target.dest)
            .map_err(|e| DownloadError::Io(e.error))?;

        Ok(Attempt::Written(bytes_written))
    }

    /// Lightweight existence probe.
    ///
    /// Reports `true` only on a definitive 200; network errors and non-OK
    /// statuses both read as "does not exist" and are never retried.
    pub async fn head_exists(&self, url: &str) -> bool {
        match self
            .client
            .head(url)
            .timeout(PROBE_TIMEOUT)
            .send()
            .await
        {
            Ok(response) => response.status() == StatusCode::OK,
            Err(e) => {
                debug!("Existence probe failed for {}: {}", url, e);
                false
            }
        }
    }
}
