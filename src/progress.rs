//! # Progress Tracking and Statistics Module
//!
//! Questo modulo gestisce il progress tracking e le statistiche di download.
//!
//! ## Responsabilità:
//! - Progress bar visual con `indicatif` per feedback real-time (solo modalità
//!   sequenziale; in pool mode l'interleaving dei log non è garantito)
//! - Tracking statistiche cumulative condivise tra tutti i worker
//!
//! ## Statistiche tracciate:
//! - **posts_processed**: Totale post elaborati
//! - **images_downloaded**: Immagini scaricate con successo
//! - **videos_downloaded**: Video scaricati con successo
//! - **audio_merged**: Merge audio/video completati
//! - **skipped**: File saltati perché già presenti
//! - **errors**: Errori durante il processing
//!
//! Gli incrementi sono atomici e commutativi: i totali finali sono
//! indipendenti dall'ordine di esecuzione e dal numero di worker. L'oggetto
//! vive per l'intera sessione ed è letto una sola volta per il summary.

use indicatif::{ProgressBar, ProgressStyle};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Manages progress reporting for sequential processing
#[derive(Clone)]
pub struct ProgressManager {
    bar: ProgressBar,
}

impl ProgressManager {
    /// Create a new progress manager
    pub fn new(total_posts: u64) -> Self {
        let bar = ProgressBar::new(total_posts);

        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
                .unwrap()
                .progress_chars("=>-"),
        );

        bar.enable_steady_tick(Duration::from_millis(100));

        Self { bar }
    }

    /// Update progress with a message
    pub fn update(&self, message: &str) {
        self.bar.inc(1);
        self.bar.set_message(message.to_string());
    }

    /// Finish with a final message
    pub fn finish(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }
}

/// Shared counters for one download session.
///
/// Mutated concurrently by every worker through atomic increments; the sum of
/// per-post contributions equals the final totals regardless of interleaving.
#[derive(Debug, Default)]
pub struct DownloadStats {
    posts_processed: AtomicU64,
    images_downloaded: AtomicU64,
    videos_downloaded: AtomicU64,
    audio_merged: AtomicU64,
    skipped: AtomicU64,
    errors: AtomicU64,
}

impl DownloadStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_post(&self) {
        self.posts_processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_image(&self) {
        self.images_downloaded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_video(&self) {
        self.videos_downloaded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_merge(&self) {
        self.audio_merged.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_skipped(&self) {
        self.skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn posts_processed(&self) -> u64 {
        self.posts_processed.load(Ordering::Relaxed)
    }

    pub fn images_downloaded(&self) -> u64 {
        self.images_downloaded.load(Ordering::Relaxed)
    }

    pub fn videos_downloaded(&self) -> u64 {
        self.videos_downloaded.load(Ordering::Relaxed)
    }

    pub fn audio_merged(&self) -> u64 {
        self.audio_merged.load(Ordering::Relaxed)
    }

    pub fn skipped(&self) -> u64 {
        self.skipped.load(Ordering::Relaxed)
    }

    pub fn errors(&self) -> u64 {
        self.errors.load(Ordering::Relaxed)
    }

    pub fn format_summary(&self) -> String {
        format!(
            "Processed: {} posts | Images: {} | Videos: {} | Merged: {} | Skipped: {} | Errors: {}",
            self.posts_processed(),
            self.images_downloaded(),
            self.videos_downloaded(),
            self.audio_merged(),
            self.skipped(),
            self.errors(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_stats_start_at_zero() {
        let stats = DownloadStats::new();
        assert_eq!(stats.posts_processed(), 0);
        assert_eq!(stats.images_downloaded(), 0);
        assert_eq!(stats.videos_downloaded(), 0);
        assert_eq!(stats.audio_merged(), 0);
        assert_eq!(stats.skipped(), 0);
        assert_eq!(stats.errors(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_increments_are_exact() {
        let stats = Arc::new(DownloadStats::new());
        let mut tasks = Vec::new();

        // 40 posts: 25 successful images, 15 errors, all processed.
        for i in 0..40u64 {
            let stats = stats.clone();
            tasks.push(tokio::spawn(async move {
                if i < 25 {
                    stats.add_image();
                } else {
                    stats.add_error();
                }
                stats.add_post();
            }));
        }

        for task in tasks {
            task.await.unwrap();
        }

        assert_eq!(stats.posts_processed(), 40);
        assert_eq!(stats.images_downloaded(), 25);
        assert_eq!(stats.errors(), 15);
    }

    #[test]
    fn test_format_summary() {
        let stats = DownloadStats::new();
        stats.add_post();
        stats.add_image();
        let summary = stats.format_summary();
        assert!(summary.contains("Processed: 1"));
        assert!(summary.contains("Images: 1"));
    }
}
