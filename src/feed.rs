//! # Feed Collaborator Boundary
//!
//! Questo modulo definisce l'interfaccia verso la sorgente dei post.
//!
//! ## Responsabilità:
//! - Trait `PostFeed` per il client del feed (autenticazione, paginazione e
//!   rate-limit restano responsabilità dell'implementazione)
//! - Enum chiusi per sort e time filter del listing
//!
//! La sequenza di post restituita è finita e non riavviabile; il core la
//! consuma una sola volta per subreddit.

use async_trait::async_trait;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::DownloadError;
use crate::post::Post;

/// Sort method for listing posts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Hot,
    New,
    Top,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hot => "hot",
            Self::New => "new",
            Self::Top => "top",
        }
    }
}

impl std::fmt::Display for SortOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Time window for the `top` sort method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeFilter {
    Hour,
    Day,
    Week,
    Month,
    Year,
    All,
}

impl TimeFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hour => "hour",
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
            Self::Year => "year",
            Self::All => "all",
        }
    }
}

impl std::fmt::Display for TimeFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Source of posts for one named subreddit.
#[async_trait]
pub trait PostFeed: Send + Sync {
    /// Fetch up to `limit` posts from `subreddit` ordered by `sort`.
    async fn fetch_posts(
        &self,
        subreddit: &str,
        sort: SortOrder,
        time_filter: TimeFilter,
        limit: u32,
    ) -> Result<Vec<Post>, DownloadError>;
}
