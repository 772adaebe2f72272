//! # Post Data Model Module
//!
//! Questo modulo definisce il modello dati dei post e la classificazione.
//!
//! ## Responsabilità:
//! - Definisce `Post` con la variante media determinata una sola volta
//! - Classificazione: suffisso URL → immagine, hint → video/gallery
//! - Un descrittore video assente resta un caso esplicito (`Video(None)`)
//!   gestito dal processor come errore locale, non come eccezione
//!
//! ## Ordine di classificazione:
//! 1. Estensione immagine nell'URL (jpg/jpeg/png/gif)
//! 2. Hint video del feed
//! 3. Hint gallery del feed
//! 4. Altrimenti `Other` (non supportato)

/// Image extensions recognized from the post URL.
pub const IMAGE_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "gif"];

/// One feed item with media metadata, classified at construction time.
#[derive(Debug, Clone)]
pub struct Post {
    pub id: String,
    pub title: String,
    pub url: String,
    pub score: i64,
    pub kind: MediaKind,
}

/// Media variant of a post, determined once from explicit feed fields.
#[derive(Debug, Clone)]
pub enum MediaKind {
    Image { extension: String },
    /// A hosted video. `None` means the feed flagged the post as video but
    /// supplied no usable descriptor.
    Video(Option<VideoSource>),
    Gallery,
    Other,
}

/// Playback descriptor for a hosted video.
#[derive(Debug, Clone)]
pub struct VideoSource {
    /// Direct, stable media URL supplied by the feed.
    pub fallback_url: String,
    /// Whether the feed reports a sibling audio stream.
    pub has_audio: bool,
}

impl Post {
    /// Classify a raw feed record into a tagged post.
    pub fn classify(
        id: String,
        title: String,
        url: String,
        score: i64,
        is_video: bool,
        is_gallery: bool,
        video: Option<VideoSource>,
    ) -> Self {
        let kind = if let Some(extension) = image_extension(&url) {
            MediaKind::Image { extension }
        } else if is_video {
            MediaKind::Video(video)
        } else if is_gallery {
            MediaKind::Gallery
        } else {
            MediaKind::Other
        };

        Self {
            id,
            title,
            url,
            score,
            kind,
        }
    }
}

fn image_extension(url: &str) -> Option<String> {
    IMAGE_EXTENSIONS
        .iter()
        .find(|ext| url.ends_with(&format!(".{ext}")))
        .map(|ext| (*ext).to_string())
}
