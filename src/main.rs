//! # Reddit Media Downloader - Main Entry Point
//!
//! Questo è il punto di ingresso principale dell'applicazione.
//!
//! ## Responsabilità:
//! - Parsing degli argomenti della command line con `clap`
//! - Inizializzazione del sistema di logging con `tracing`
//! - Caricamento credenziali da `.env` / environment
//! - Risoluzione della lista di subreddit (CLI, file, o `subreddits.txt`)
//! - Wiring del segnale di interruzione (ctrl-c → cancellation token)
//! - Creazione della configurazione e avvio del downloader
//!
//! ## Esempio di utilizzo:
//! ```bash
//! reddit-downloader -s pics earthporn --sort top --time-filter week \
//!     --limit 50 --download-audio --multithreaded --verbose
//! ```

use anyhow::Result;
use clap::{ArgAction, Parser};
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing::warn;

use reddit_media_downloader::{
    read_subreddits_file, Config, Credentials, MediaDownloader, RedditFeed, SortOrder, TimeFilter,
};

#[derive(Parser)]
#[command(name = "reddit-downloader")]
#[command(about = "Download images and videos from Reddit subreddits")]
struct Args {
    /// List of subreddit names to download from
    #[arg(short, long, num_args = 1..)]
    subreddits: Vec<String>,

    /// Path to file containing subreddit names
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Base directory to save downloaded files
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Overwrite existing files
    #[arg(long)]
    overwrite: bool,

    /// Sort method for posts
    #[arg(long, value_enum, default_value_t = SortOrder::Hot)]
    sort: SortOrder,

    /// Time filter for 'top' sort method
    #[arg(long, value_enum, default_value_t = TimeFilter::All)]
    time_filter: TimeFilter,

    /// Maximum number of posts to process per subreddit
    #[arg(long, default_value = "25")]
    limit: u32,

    /// Minimum score (upvotes) required to download a post
    #[arg(long, default_value = "0")]
    min_score: i64,

    /// Skip downloading images
    #[arg(long = "no-images", action = ArgAction::SetFalse)]
    download_images: bool,

    /// Skip downloading videos
    #[arg(long = "no-videos", action = ArgAction::SetFalse)]
    download_videos: bool,

    /// Download gallery posts (multiple images)
    #[arg(long)]
    download_galleries: bool,

    /// Download and merge audio for videos (requires ffmpeg)
    #[arg(long)]
    download_audio: bool,

    /// Keep video-only file after merging with audio
    #[arg(long)]
    keep_video_only: bool,

    /// Don't remove temporary audio files after merging
    #[arg(long = "no-cleanup", action = ArgAction::SetFalse)]
    cleanup_after_merge: bool,

    /// Process posts on a worker pool instead of sequentially
    #[arg(long)]
    multithreaded: bool,

    /// Maximum number of workers when multithreaded
    #[arg(long, default_value = "4")]
    max_workers: usize,

    /// Maximum file size to download in MB (0 for no limit)
    #[arg(long, default_value = "0")]
    max_file_size_mb: u64,

    /// Reddit API client ID (overrides REDDIT_CLIENT_ID)
    #[arg(long)]
    client_id: Option<String>,

    /// Reddit API client secret (overrides REDDIT_CLIENT_SECRET)
    #[arg(long)]
    client_secret: Option<String>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

/// Subreddits come from `-f FILE`, then `-s NAMES`, then `subreddits.txt`.
fn resolve_subreddits(args: &Args) -> Result<Vec<String>> {
    let default_list = Path::new("subreddits.txt");

    let subreddits = if let Some(ref file) = args.file {
        read_subreddits_file(file)?
    } else if !args.subreddits.is_empty() {
        args.subreddits.clone()
    } else if default_list.exists() {
        read_subreddits_file(default_list)?
    } else {
        return Err(anyhow::anyhow!(
            "No subreddits specified. Use --subreddits or --file options."
        ));
    };

    if subreddits.is_empty() {
        return Err(anyhow::anyhow!("Subreddit list is empty"));
    }

    Ok(subreddits)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(if args.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    // Load .env file if available
    dotenvy::dotenv().ok();

    let subreddits = resolve_subreddits(&args)?;
    let credentials = Credentials::resolve(args.client_id.clone(), args.client_secret.clone())?;

    let config = Config {
        output_dir: args.output_dir,
        sort: args.sort,
        time_filter: args.time_filter,
        limit: args.limit,
        min_score: args.min_score,
        download_images: args.download_images,
        download_videos: args.download_videos,
        download_galleries: args.download_galleries,
        download_audio: args.download_audio,
        keep_video_only: args.keep_video_only,
        cleanup_after_merge: args.cleanup_after_merge,
        multithreaded: args.multithreaded,
        max_workers: args.max_workers,
        max_file_size_mb: args.max_file_size_mb,
        overwrite: args.overwrite,
        ..Default::default()
    };

    // Stop dispatching new work promptly on ctrl-c; in-flight retries
    // observe the token between attempts.
    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Download interrupted by user");
            signal_token.cancel();
        }
    });

    let feed = RedditFeed::authenticate(&credentials).await?;
    let downloader = MediaDownloader::new(config, Box::new(feed), cancel).await?;
    downloader.run(&subreddits).await?;

    Ok(())
}
