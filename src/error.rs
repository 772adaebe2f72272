//! # Error Types Module
//!
//! Questo modulo definisce tutti i tipi di errore custom dell'applicazione.
//!
//! ## Responsabilità:
//! - Definisce `DownloadError` enum per categorizzare tutti gli errori possibili
//! - Fornisce messaggi di errore descrittivi e strutturati
//! - Integra con `thiserror` per automatic error conversion
//!
//! ## Categorie di errori:
//! - `Io`: Errori di I/O (file non trovati, permessi, etc.)
//! - `Http`: Errori di trasporto HTTP (connessione, timeout, body)
//! - `Status`: Risposta HTTP con status non-success
//! - `Auth`: Autenticazione Reddit fallita
//! - `Feed`: Errori del listing API (subreddit non trovato, etc.)
//! - `MalformedPost`: Post con metadata video mancanti
//! - `Validation`: Errori di validazione input
//! - `Cancelled`: Operazione interrotta dall'utente
//!
//! ## Esempio:
//! ```rust,ignore
//! if !status.is_success() {
//!     return Err(DownloadError::Status(status.as_u16()));
//! }
//! ```

/// Custom error types for the download pipeline
#[derive(thiserror::Error, Debug)]
pub enum DownloadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP status {0}")]
    Status(u16),

    #[error("Reddit authentication error: {0}")]
    Auth(String),

    #[error("Feed error: {0}")]
    Feed(String),

    #[error("Malformed post data: {0}")]
    MalformedPost(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Operation cancelled")]
    Cancelled,
}
