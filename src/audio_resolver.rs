//! # Audio Track Resolver Module
//!
//! Questo modulo individua la traccia audio sibling di un video hosted.
//!
//! ## Responsabilità:
//! - Deriva la base URL dal fallback URL del video (troncando al marker
//!   `DASH_`, altrimenti all'ultimo separatore di path)
//! - Costruisce la lista ordinata di candidati audio e li prova
//!   top-to-bottom: probe HEAD leggero, poi fetch completo; il primo fetch
//!   riuscito vince
//! - "Nessun audio trovato" è un esito degradato, non un errore
//!
//! ## Candidati (in ordine):
//! 1. `DASH_audio.mp4`
//! 2. `audio`
//! 3. `DASH_audio.m4a`
//! 4. `audio.mp4`

use std::path::Path;
use tracing::{debug, info, warn};

use crate::fetcher::{DownloadTarget, FetchOutcome, Fetcher};

/// Quality-segment marker in hosted video URLs
/// (e.g. `https://v.redd.it/VIDEO_ID/DASH_720.mp4`).
const QUALITY_MARKER: &str = "DASH_";

/// Candidate filename suffixes appended to the derived base URL, tried in
/// declared order.
pub const AUDIO_CANDIDATES: [&str; 4] = ["DASH_audio.mp4", "audio", "DASH_audio.m4a", "audio.mp4"];

/// One (pattern, derived URL) pair tried by the resolver.
#[derive(Debug, Clone)]
pub struct AudioCandidate {
    pub pattern: &'static str,
    pub url: String,
}

/// The candidate that probed and fetched successfully.
#[derive(Debug, Clone)]
pub struct ResolvedAudio {
    pub pattern: &'static str,
    pub url: String,
}

/// Derive the base URL shared by a video and its sibling audio stream.
pub fn derive_base_url(video_url: &str) -> String {
    if let Some(idx) = video_url.find(QUALITY_MARKER) {
        video_url[..idx].to_string()
    } else {
        match video_url.rfind('/') {
            Some(idx) => video_url[..=idx].to_string(),
            None => format!("{video_url}/"),
        }
    }
}

/// Build the ordered candidate list for a video URL.
pub fn audio_candidates(video_url: &str) -> Vec<AudioCandidate> {
    let base_url = derive_base_url(video_url);
    AUDIO_CANDIDATES
        .iter()
        .map(|pattern| AudioCandidate {
            pattern,
            url: format!("{base_url}{pattern}"),
        })
        .collect()
}

/// Probes candidate sibling-audio URLs and downloads the first that exists.
#[derive(Clone)]
pub struct AudioResolver {
    fetcher: Fetcher,
}

impl AudioResolver {
    pub fn new(fetcher: Fetcher) -> Self {
        Self { fetcher }
    }

    /// Try every candidate in order; on the first positive probe, fetch the
    /// audio to `dest`. Returns `None` when every candidate is exhausted.
    pub async fn resolve(&self, video_url: &str, dest: &Path) -> Option<ResolvedAudio> {
        debug!("Attempting to derive audio URL from {}", video_url);

        for candidate in audio_candidates(video_url) {
            debug!("Trying audio URL: {}", candidate.url);

            if !self.fetcher.head_exists(&candidate.url).await {
                debug!("Audio pattern {} not found", candidate.pattern);
                continue;
            }

            let target = DownloadTarget::new(candidate.url.as_str(), dest);
            match self.fetcher.fetch(&target).await {
                FetchOutcome::Success { .. } | FetchOutcome::SkippedExisting => {
                    info!("Found audio with pattern: {}", candidate.pattern);
                    return Some(ResolvedAudio {
                        pattern: candidate.pattern,
                        url: candidate.url,
                    });
                }
                outcome => {
                    debug!(
                        "Audio fetch for pattern {} did not complete: {:?}",
                        candidate.pattern, outcome
                    );
                }
            }
        }

        warn!("No suitable audio found for video: {}", video_url);
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::progress::DownloadStats;
    use std::sync::Arc;
    use tempfile::TempDir;
    use tokio_util::sync::CancellationToken;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_base_url_truncates_at_quality_marker() {
        let base = derive_base_url("https://v.redd.it/abc123/DASH_720.mp4");
        assert_eq!(base, "https://v.redd.it/abc123/");
    }

    #[test]
    fn test_base_url_falls_back_to_last_separator() {
        let base = derive_base_url("https://v.redd.it/abc123/video.mp4");
        assert_eq!(base, "https://v.redd.it/abc123/");
    }

    #[test]
    fn test_first_candidate_is_dash_audio() {
        let candidates = audio_candidates("https://v.redd.it/abc123/DASH_720.mp4");
        assert_eq!(candidates.len(), 4);
        assert_eq!(candidates[0].url, "https://v.redd.it/abc123/DASH_audio.mp4");
        assert_eq!(candidates[1].url, "https://v.redd.it/abc123/audio");
        assert_eq!(candidates[2].url, "https://v.redd.it/abc123/DASH_audio.m4a");
        assert_eq!(candidates[3].url, "https://v.redd.it/abc123/audio.mp4");
    }

    fn resolver() -> (AudioResolver, Arc<DownloadStats>) {
        let stats = Arc::new(DownloadStats::new());
        let fetcher =
            Fetcher::new(&Config::default(), stats.clone(), CancellationToken::new()).unwrap();
        (AudioResolver::new(fetcher), stats)
    }

    #[tokio::test]
    async fn test_resolve_picks_first_probe_that_fetches() {
        let server = MockServer::start().await;

        // Only the fourth pattern exists; earlier probes fall through to the
        // mock server's default 404.
        Mock::given(method("HEAD"))
            .and(path("/clip/audio.mp4"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/clip/audio.mp4"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"audio bytes".to_vec()))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("clip_audio.mp4");
        let (resolver, _stats) = resolver();

        let video_url = format!("{}/clip/DASH_480.mp4", server.uri());
        let resolved = resolver.resolve(&video_url, &dest).await;

        let resolved = resolved.expect("fourth candidate should resolve");
        assert_eq!(resolved.pattern, "audio.mp4");
        assert_eq!(std::fs::read(&dest).unwrap(), b"audio bytes");
    }

    #[tokio::test]
    async fn test_resolve_reports_none_when_all_probes_fail() {
        let server = MockServer::start().await;

        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("clip_audio.mp4");
        let (resolver, stats) = resolver();

        let video_url = format!("{}/clip/DASH_480.mp4", server.uri());
        let resolved = resolver.resolve(&video_url, &dest).await;

        assert!(resolved.is_none());
        assert!(!dest.exists());
        // Degraded outcome, not a hard failure.
        assert_eq!(stats.errors(), 0);
    }
}
