//! # Reddit Media Downloader Library
//!
//! Questo è il modulo principale della libreria che espone tutte le API pubbliche.
//!
//! ## Responsabilità:
//! - Definisce la struttura modulare dell'applicazione
//! - Espone i tipi e le funzioni principali tramite re-exports
//! - Fornisce un'interfaccia pulita per il main.rs e per altri consumatori
//!
//! ## Architettura dei moduli:
//! - `config`: Gestione configurazione, credenziali e lista subreddit
//! - `error`: Tipi di errore custom per diverse operazioni
//! - `sanitize`: Sanitizzazione titoli in nomi file sicuri
//! - `post`: Modello dati dei post con variante media taggata
//! - `feed`: Boundary verso la sorgente dei post (trait + enum sort)
//! - `reddit`: Client autenticato dell'API Reddit
//! - `fetcher`: Downloader HTTP streaming con retry e size limit
//! - `audio_resolver`: Scoperta della traccia audio sibling di un video
//! - `merger`: Invocazione ffmpeg per il mux audio/video
//! - `processor`: Orchestrazione per singolo post
//! - `downloader`: Orchestratore di sessione e worker pool
//! - `progress`: Progress tracking e statistiche condivise
//!
//! ## Utilizzo:
//! ```rust,no_run
//! use reddit_media_downloader::{Config, MediaDownloader, RedditFeed};
//! ```

pub mod audio_resolver;
pub mod config;
pub mod downloader;
pub mod error;
pub mod feed;
pub mod fetcher;
pub mod merger;
pub mod post;
pub mod processor;
pub mod progress;
pub mod reddit;
pub mod sanitize;

pub use config::{read_subreddits_file, Config, Credentials};
pub use downloader::MediaDownloader;
pub use error::DownloadError;
pub use feed::{PostFeed, SortOrder, TimeFilter};
pub use reddit::RedditFeed;
