//! # Configuration Management Module
//!
//! Questo modulo gestisce tutta la configurazione dell'applicazione.
//!
//! ## Responsabilità:
//! - Definisce la struct `Config` con tutti i parametri di download
//! - Fornisce validazione robusta dei parametri di input
//! - Supporta caricamento/salvataggio configurazione da/verso file JSON
//! - Carica le credenziali Reddit da environment (`.env` via dotenvy)
//! - Legge la lista di subreddit da file
//!
//! ## Parametri di configurazione:
//! - `output_dir`: Directory base per i file scaricati (default: ".")
//! - `sort` / `time_filter` / `limit`: Parametri del listing (default: hot/all/25)
//! - `min_score`: Score minimo per scaricare un post (default: 0)
//! - `download_images` / `download_videos` / `download_galleries`: Tipi abilitati
//! - `download_audio`: Scarica e unisce la traccia audio (richiede ffmpeg)
//! - `keep_video_only` / `cleanup_after_merge`: Policy di cleanup post-merge
//! - `multithreaded` / `max_workers`: Worker pool (default: sequenziale / 4)
//! - `max_file_size_mb`: Limite dimensione file, 0 = nessun limite
//! - `max_attempts`: Tentativi di download per file (default: 3)
//! - `overwrite`: Sovrascrive file esistenti (default: false)
//! - `include_score` / `replace_spaces` / `max_filename_length`: Naming file
//!
//! ## Errori fatali:
//! Credenziali mancanti o lista subreddit illeggibile interrompono il run
//! prima di qualsiasi processing.
//!
//! ## Esempio:
//! ```rust,ignore
//! let config = Config {
//!     min_score: 100,
//!     multithreaded: true,
//!     ..Default::default()
//! };
//! config.validate()?;
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::feed::{SortOrder, TimeFilter};

/// Configuration for a download session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base directory to save downloaded files
    pub output_dir: PathBuf,
    /// Sort method for posts
    pub sort: SortOrder,
    /// Time filter for the `top` sort method
    pub time_filter: TimeFilter,
    /// Maximum number of posts to process per subreddit
    pub limit: u32,
    /// Minimum score (upvotes) required to download a post
    pub min_score: i64,
    /// Download plain image posts
    pub download_images: bool,
    /// Download hosted video posts
    pub download_videos: bool,
    /// Log gallery posts (expansion into multiple fetches not implemented)
    pub download_galleries: bool,
    /// Download and merge the sibling audio track (requires ffmpeg)
    pub download_audio: bool,
    /// Keep the video-only file after a successful merge
    pub keep_video_only: bool,
    /// Remove intermediate files after a successful merge
    pub cleanup_after_merge: bool,
    /// Process posts on a worker pool instead of sequentially
    pub multithreaded: bool,
    /// Number of parallel workers
    pub max_workers: usize,
    /// Maximum file size to download in MB (0 = no limit)
    pub max_file_size_mb: u64,
    /// Download attempts per file before giving up
    pub max_attempts: u32,
    /// Overwrite existing files instead of skipping them
    pub overwrite: bool,
    /// Prefix filenames with the post score
    pub include_score: bool,
    /// Replace spaces with underscores in filenames
    pub replace_spaces: bool,
    /// Maximum filename length (characters)
    pub max_filename_length: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            sort: SortOrder::Hot,
            time_filter: TimeFilter::All,
            limit: 25,
            min_score: 0,
            download_images: true,
            download_videos: true,
            download_galleries: false,
            download_audio: false,
            keep_video_only: false,
            cleanup_after_merge: true,
            multithreaded: false,
            max_workers: 4,
            max_file_size_mb: 0,
            max_attempts: 3,
            overwrite: false,
            include_score: true,
            replace_spaces: true,
            max_filename_length: 100,
        }
    }
}

impl Config {
    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        if self.limit == 0 {
            return Err(anyhow::anyhow!("Post limit must be greater than 0"));
        }

        if self.max_workers == 0 {
            return Err(anyhow::anyhow!("Number of workers must be greater than 0"));
        }

        if self.max_attempts == 0 {
            return Err(anyhow::anyhow!("Download attempts must be greater than 0"));
        }

        if self.max_filename_length == 0 {
            return Err(anyhow::anyhow!("Maximum filename length must be greater than 0"));
        }

        Ok(())
    }

    /// Load configuration from file
    pub async fn from_file(path: &PathBuf) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(path).await?;
        let config: Config = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub async fn save_to_file(&self, path: &PathBuf) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }

    /// Byte-size ceiling derived from `max_file_size_mb`, 0 = unlimited.
    pub fn size_ceiling_bytes(&self) -> u64 {
        self.max_file_size_mb * 1024 * 1024
    }
}

/// Reddit API credentials
#[derive(Debug, Clone)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
    pub user_agent: String,
}

impl Credentials {
    /// Resolve credentials from CLI overrides, falling back to environment
    /// variables (`REDDIT_CLIENT_ID`, `REDDIT_CLIENT_SECRET`,
    /// `REDDIT_USER_AGENT`). Missing credentials abort the run.
    pub fn resolve(client_id: Option<String>, client_secret: Option<String>) -> Result<Self> {
        let client_id = client_id
            .or_else(|| std::env::var("REDDIT_CLIENT_ID").ok())
            .filter(|v| !v.is_empty());
        let client_secret = client_secret
            .or_else(|| std::env::var("REDDIT_CLIENT_SECRET").ok())
            .filter(|v| !v.is_empty());
        let user_agent = std::env::var("REDDIT_USER_AGENT")
            .unwrap_or_else(|_| "MediaDownloader/1.0 (by /u/anonymous)".to_string());

        match (client_id, client_secret) {
            (Some(client_id), Some(client_secret)) => Ok(Self {
                client_id,
                client_secret,
                user_agent,
            }),
            _ => Err(anyhow::anyhow!(
                "Reddit API credentials required. Set REDDIT_CLIENT_ID and \
                 REDDIT_CLIENT_SECRET environment variables or pass --client-id \
                 and --client-secret"
            )),
        }
    }
}

/// Read subreddit names from a file, one per line, skipping blank lines and
/// `#` comments.
pub fn read_subreddits_file(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read subreddit file: {}", path.display()))?;

    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.limit = 0;
        assert!(config.validate().is_err());

        config.limit = 25;
        config.max_workers = 0;
        assert!(config.validate().is_err());

        config.max_workers = 4;
        config.max_attempts = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.sort, SortOrder::Hot);
        assert_eq!(config.time_filter, TimeFilter::All);
        assert_eq!(config.limit, 25);
        assert_eq!(config.min_score, 0);
        assert!(config.download_images);
        assert!(config.download_videos);
        assert!(!config.download_audio);
        assert!(config.cleanup_after_merge);
        assert!(!config.multithreaded);
        assert_eq!(config.max_workers, 4);
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.max_filename_length, 100);
    }

    #[test]
    fn test_size_ceiling_bytes() {
        let mut config = Config::default();
        assert_eq!(config.size_ceiling_bytes(), 0);

        config.max_file_size_mb = 5;
        assert_eq!(config.size_ceiling_bytes(), 5 * 1024 * 1024);
    }

    #[tokio::test]
    async fn test_config_save_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");

        let original_config = Config {
            sort: SortOrder::Top,
            time_filter: TimeFilter::Week,
            limit: 50,
            min_score: 10,
            multithreaded: true,
            max_workers: 8,
            ..Default::default()
        };

        original_config.save_to_file(&config_path).await.unwrap();

        let loaded_config = Config::from_file(&config_path).await.unwrap();

        assert_eq!(loaded_config.sort, SortOrder::Top);
        assert_eq!(loaded_config.time_filter, TimeFilter::Week);
        assert_eq!(loaded_config.limit, 50);
        assert_eq!(loaded_config.min_score, 10);
        assert!(loaded_config.multithreaded);
        assert_eq!(loaded_config.max_workers, 8);
    }

    #[test]
    fn test_read_subreddits_file() {
        let temp_dir = TempDir::new().unwrap();
        let list_path = temp_dir.path().join("subreddits.txt");
        std::fs::write(&list_path, "pics\n\n# comment\n  earthporn  \n").unwrap();

        let names = read_subreddits_file(&list_path).unwrap();
        assert_eq!(names, vec!["pics".to_string(), "earthporn".to_string()]);
    }

    #[test]
    fn test_read_subreddits_file_missing() {
        assert!(read_subreddits_file(Path::new("/nonexistent/subreddits.txt")).is_err());
    }
}
