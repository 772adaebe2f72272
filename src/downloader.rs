//! # Main Downloader Orchestrator Module
//!
//! Questo è il modulo principale che orchestra l'intera sessione di download.
//!
//! ## Responsabilità:
//! - Coordinamento di tutti gli altri moduli
//! - Iterazione dei subreddit configurati e gestione directory di output
//! - Dispatch dei post: sequenziale (default, con progress bar) oppure
//!   worker pool a dimensione fissa con semafori
//! - Probe della toolchain di merge una sola volta a inizio sessione
//! - Ownership delle statistiche condivise e summary di fine run
//!
//! ## Flusso di esecuzione:
//! 1. **Inizializzazione**: valida config, crea fetcher/processor condivisi
//! 2. **Toolchain check**: probe ffmpeg solo se l'audio è abilitato
//! 3. **Per subreddit**: fetch del listing → crea directory → processa post
//! 4. **Reporting**: summary con contatori e tempo trascorso
//!
//! ## Gestione concorrenza:
//! - Semafori per limitare i worker concorrenti (default: 4)
//! - Ogni task riceve un clone del processor; lo stato condiviso è solo
//!   l'oggetto statistiche (incrementi atomici)
//! - Join di tutti i task prima di dichiarare completo il subreddit
//! - Nessun ordinamento garantito tra post in pool mode
//!
//! ## Cancellazione:
//! Il token viene osservato prima di ogni nuovo dispatch e dentro il retry
//! loop del fetcher; i download in volo terminano o vengono abortiti dal
//! transport.
//!
//! ## Error handling:
//! - Errori per singoli post non bloccano l'operazione (contenuti nel
//!   processor, visibili solo come contatori)
//! - Un subreddit che fallisce in blocco (listing irraggiungibile) conta un
//!   errore e non ferma i successivi

use anyhow::Result;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::feed::PostFeed;
use crate::fetcher::Fetcher;
use crate::merger::Merger;
use crate::post::Post;
use crate::processor::{MediaDirs, PostProcessor};
use crate::progress::{DownloadStats, ProgressManager};

/// Session orchestrator: iterates subreddits, owns the shared statistics.
pub struct MediaDownloader {
    config: Config,
    feed: Box<dyn PostFeed>,
    processor: PostProcessor,
    stats: Arc<DownloadStats>,
    cancel: CancellationToken,
}

impl MediaDownloader {
    /// Create a downloader, probing the merge toolchain when audio download
    /// is enabled.
    pub async fn new(
        config: Config,
        feed: Box<dyn PostFeed>,
        cancel: CancellationToken,
    ) -> Result<Self> {
        let merger = if config.download_audio {
            Merger::detect().await
        } else {
            Merger::unavailable()
        };

        Self::with_merger(config, feed, merger, cancel)
    }

    /// Create a downloader with an explicit merger (tests inject a stub
    /// toolchain here).
    pub fn with_merger(
        config: Config,
        feed: Box<dyn PostFeed>,
        merger: Merger,
        cancel: CancellationToken,
    ) -> Result<Self> {
        config.validate()?;

        let stats = Arc::new(DownloadStats::new());
        let fetcher = Fetcher::new(&config, stats.clone(), cancel.clone())?;
        let processor = PostProcessor::new(
            config.clone(),
            fetcher,
            Arc::new(merger),
            stats.clone(),
        );

        Ok(Self {
            config,
            feed,
            processor,
            stats,
            cancel,
        })
    }

    /// Cumulative session statistics.
    pub fn stats(&self) -> &DownloadStats {
        &self.stats
    }

    /// Run the download session for all configured subreddits.
    pub async fn run(&self, subreddits: &[String]) -> Result<()> {
        let start = Instant::now();

        info!(
            "Starting Reddit media downloader with {} subreddits",
            subreddits.len()
        );
        self.log_configuration();

        for name in subreddits {
            if self.cancel.is_cancelled() {
                warn!("Run cancelled, not dispatching further subreddits");
                break;
            }

            if let Err(e) = self.download_subreddit(name).await {
                error!("Error processing subreddit {}: {}", name, e);
                self.stats.add_error();
            }
        }

        self.print_summary(start.elapsed());
        Ok(())
    }

    fn log_configuration(&self) {
        info!("📁 Output directory: {}", self.config.output_dir.display());
        info!(
            "🔽 Sort: {} (limit {} per subreddit)",
            self.config.sort.as_str(),
            self.config.limit
        );

        if self.config.download_audio {
            info!("🎵 Audio mode: download and merge sibling audio tracks");
        }

        if self.config.multithreaded {
            info!("⚙️ Worker pool: {} workers", self.config.max_workers);
        }
    }

    async fn download_subreddit(&self, name: &str) -> Result<()> {
        info!("Processing subreddit: r/{}", name);
        info!(
            "Fetching {} {} posts from r/{}",
            self.config.limit,
            self.config.sort.as_str(),
            name
        );

        let posts = self
            .feed
            .fetch_posts(name, self.config.sort, self.config.time_filter, self.config.limit)
            .await?;

        let dirs = MediaDirs::create(&self.config.output_dir, name).await?;

        if self.config.multithreaded {
            self.process_pool(posts, &dirs).await
        } else {
            self.process_sequential(posts, &dirs).await
        }
    }

    async fn process_pool(&self, posts: Vec<Post>, dirs: &MediaDirs) -> Result<()> {
        let semaphore = Arc::new(Semaphore::new(self.config.max_workers));
        let mut tasks = Vec::new();

        for post in posts {
            if self.cancel.is_cancelled() {
                break;
            }

            let permit = semaphore.clone().acquire_owned().await?;
            let processor = self.processor.clone();
            let dirs = dirs.clone();

            let task = tokio::spawn(async move {
                let _permit = permit; // Keep permit alive
                processor.process(&post, &dirs).await;
            });

            tasks.push(task);
        }

        // The subreddit reports done only after every dispatched task joined.
        for task in tasks {
            task.await?;
        }

        Ok(())
    }

    async fn process_sequential(&self, posts: Vec<Post>, dirs: &MediaDirs) -> Result<()> {
        let progress = ProgressManager::new(posts.len() as u64);

        for post in posts {
            if self.cancel.is_cancelled() {
                break;
            }

            let title = post.title.clone();
            self.processor.process(&post, dirs).await;
            progress.update(&title);
        }

        progress.finish(&self.stats.format_summary());
        Ok(())
    }

    fn print_summary(&self, elapsed: Duration) {
        info!("=== Download Complete ===");
        info!("Total posts processed: {}", self.stats.posts_processed());
        info!("Images downloaded: {}", self.stats.images_downloaded());
        info!("Videos downloaded: {}", self.stats.videos_downloaded());
        info!("Videos with audio merged: {}", self.stats.audio_merged());
        info!("Files skipped: {}", self.stats.skipped());
        info!("Errors: {}", self.stats.errors());
        info!("Time elapsed: {:.2} seconds", elapsed.as_secs_f64());
    }
}
