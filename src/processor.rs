//! # Post Processor Module
//!
//! Questo modulo orchestra il processing di un singolo post.
//!
//! ## Flusso per post:
//! 1. **Filter**: score sotto il minimo → skip (unico caso che non conta
//!    nel totale processato)
//! 2. **Dispatch** sulla variante media classificata (immagine / video /
//!    gallery / non supportato)
//! 3. **Immagine**: fetch nella directory `images` del subreddit
//! 4. **Video**: fetch nella directory `videos`; se audio abilitato,
//!    toolchain disponibile e hint audio positivo, risolve la traccia
//!    sibling, esegue il merge e applica la cleanup policy
//! 5. **Gallery**: placeholder, solo logging
//!
//! ## Contenimento errori:
//! Ogni fault resta locale al post (error counter + log); non interrompe
//! mai i post fratelli. Il totale processato è incrementato esattamente una
//! volta a fine processing, qualunque sia l'esito oltre il filtro score.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::audio_resolver::AudioResolver;
use crate::config::Config;
use crate::error::DownloadError;
use crate::fetcher::{DownloadTarget, FetchOutcome, Fetcher};
use crate::merger::{MergeOutcome, Merger};
use crate::post::{MediaKind, Post, VideoSource};
use crate::progress::DownloadStats;
use crate::sanitize::sanitize_filename;

/// Per-subreddit output directories, created lazily and idempotently.
#[derive(Debug, Clone)]
pub struct MediaDirs {
    pub videos: PathBuf,
    pub images: PathBuf,
}

impl MediaDirs {
    pub async fn create(base: &Path, subreddit: &str) -> Result<Self, DownloadError> {
        let root = base.join(subreddit);
        let videos = root.join("videos");
        let images = root.join("images");

        tokio::fs::create_dir_all(&videos).await?;
        tokio::fs::create_dir_all(&images).await?;

        debug!("Created directories for subreddit {}", subreddit);
        Ok(Self { videos, images })
    }
}

/// Per-post orchestration: filter, fetch, audio resolution, merge, cleanup.
#[derive(Clone)]
pub struct PostProcessor {
    config: Config,
    fetcher: Fetcher,
    resolver: AudioResolver,
    merger: Arc<Merger>,
    stats: Arc<DownloadStats>,
}

impl PostProcessor {
    pub fn new(
        config: Config,
        fetcher: Fetcher,
        merger: Arc<Merger>,
        stats: Arc<DownloadStats>,
    ) -> Self {
        let resolver = AudioResolver::new(fetcher.clone());
        Self {
            config,
            fetcher,
            resolver,
            merger,
            stats,
        }
    }

    /// Process one post to completion. Faults are contained here and only
    /// surface through the shared counters.
    pub async fn process(&self, post: &Post, dirs: &MediaDirs) {
        if post.score < self.config.min_score {
            debug!(
                "Skipping post with low score: {} < {}",
                post.score, self.config.min_score
            );
            return;
        }

        debug!("Processing post: {} ({})", post.title, post.url);

        if let Err(e) = self.process_media(post, dirs).await {
            error!("Error processing post {}: {}", post.id, e);
            self.stats.add_error();
        }

        self.stats.add_post();
    }

    async fn process_media(&self, post: &Post, dirs: &MediaDirs) -> Result<(), DownloadError> {
        match &post.kind {
            MediaKind::Image { extension } => self.process_image(post, extension, dirs).await,
            MediaKind::Video(source) => self.process_video(post, source.as_ref(), dirs).await,
            MediaKind::Gallery => {
                if self.config.download_galleries {
                    // Expansion into per-item fetches is not implemented yet.
                    info!("Gallery post detected: {}", post.id);
                }
                Ok(())
            }
            MediaKind::Other => {
                debug!("Unsupported media type for post {}", post.id);
                Ok(())
            }
        }
    }

    fn build_filename(&self, post: &Post) -> String {
        let sanitized = sanitize_filename(
            &post.title,
            self.config.replace_spaces,
            self.config.max_filename_length,
        );

        if self.config.include_score {
            format!("{}_{}", post.score, sanitized)
        } else {
            sanitized
        }
    }

    async fn process_image(
        &self,
        post: &Post,
        extension: &str,
        dirs: &MediaDirs,
    ) -> Result<(), DownloadError> {
        if !self.config.download_images {
            debug!("Image downloads disabled, skipping post {}", post.id);
            return Ok(());
        }

        let filename = format!("{}.{}", self.build_filename(post), extension);
        let target = DownloadTarget::new(post.url.clone(), dirs.images.join(filename));

        // Non-success outcomes are already accounted by the fetcher.
        if let FetchOutcome::Success { .. } = self.fetcher.fetch(&target).await {
            self.stats.add_image();
        }

        Ok(())
    }

    async fn process_video(
        &self,
        post: &Post,
        source: Option<&VideoSource>,
        dirs: &MediaDirs,
    ) -> Result<(), DownloadError> {
        if !self.config.download_videos {
            debug!("Video downloads disabled, skipping post {}", post.id);
            return Ok(());
        }

        let source = source.ok_or_else(|| {
            DownloadError::MalformedPost(format!("post {} has no video descriptor", post.id))
        })?;

        debug!("Processing video with URL: {}", source.fallback_url);
        debug!("Video metadata indicates has_audio = {}", source.has_audio);

        let filename = self.build_filename(post);
        let video_path = dirs.videos.join(format!("{filename}.mp4"));
        let target = DownloadTarget::new(source.fallback_url.clone(), video_path.clone());

        let on_disk = match self.fetcher.fetch(&target).await {
            FetchOutcome::Success { .. } => {
                self.stats.add_video();
                true
            }
            // An already-present video still gets its audio reconciled.
            FetchOutcome::SkippedExisting => true,
            _ => false,
        };

        if on_disk
            && self.config.download_audio
            && self.merger.is_available()
            && source.has_audio
        {
            self.merge_audio(&source.fallback_url, &filename, &video_path, dirs)
                .await?;
        }

        Ok(())
    }

    async fn merge_audio(
        &self,
        video_url: &str,
        filename: &str,
        video_path: &Path,
        dirs: &MediaDirs,
    ) -> Result<(), DownloadError> {
        let audio_path = dirs.videos.join(format!("{filename}_audio.mp4"));

        let Some(_resolved) = self.resolver.resolve(video_url, &audio_path).await else {
            // No audio found: degraded outcome, already logged by the resolver.
            return Ok(());
        };

        let merged_path = dirs.videos.join(format!("{filename}_with_audio.mp4"));

        match self.merger.merge(video_path, &audio_path, &merged_path).await {
            MergeOutcome::Success => {
                self.stats.add_merge();

                if self.config.cleanup_after_merge {
                    tokio::fs::remove_file(&audio_path).await?;
                    if !self.config.keep_video_only {
                        tokio::fs::remove_file(video_path).await?;
                    }
                }
            }
            MergeOutcome::ToolUnavailable => {
                debug!("Cannot merge audio: toolchain not available");
            }
            MergeOutcome::ToolFailed(diagnostic) => {
                error!("Failed to merge audio and video: {}", diagnostic);
            }
        }

        Ok(())
    }
}
