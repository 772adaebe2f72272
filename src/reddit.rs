//! # Reddit Feed Client Module
//!
//! Questo modulo implementa `PostFeed` contro l'API JSON di Reddit.
//!
//! ## Responsabilità:
//! - Autenticazione OAuth2 client-credentials (token richiesto una volta a
//!   inizio sessione; un fallimento qui è fatale per il run)
//! - Fetch del listing di un subreddit (`hot`/`new`/`top` con time filter)
//! - Deserializzazione serde dei record grezzi e classificazione immediata
//!   nel `Post` taggato
//!
//! Paginazione, rate-limit backoff e refresh del token restano fuori scope:
//! il core chiede al massimo `limit` post per subreddit in una richiesta.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::Credentials;
use crate::error::DownloadError;
use crate::feed::{PostFeed, SortOrder, TimeFilter};
use crate::post::{Post, VideoSource};

const DEFAULT_AUTH_URL: &str = "https://www.reddit.com/api/v1/access_token";
const DEFAULT_API_URL: &str = "https://oauth.reddit.com";

const AUTH_TIMEOUT: Duration = Duration::from_secs(30);

/// Authenticated Reddit listing client.
pub struct RedditFeed {
    client: Client,
    access_token: String,
    api_url: String,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

impl RedditFeed {
    /// Authenticate against the public Reddit OAuth endpoint.
    pub async fn authenticate(credentials: &Credentials) -> Result<Self, DownloadError> {
        Self::authenticate_at(credentials, DEFAULT_AUTH_URL, DEFAULT_API_URL).await
    }

    /// Authenticate against explicit endpoints (test servers use this).
    pub async fn authenticate_at(
        credentials: &Credentials,
        auth_url: &str,
        api_url: &str,
    ) -> Result<Self, DownloadError> {
        debug!("Authenticating with Reddit API");

        let client = Client::builder()
            .user_agent(&credentials.user_agent)
            .build()?;

        let response = client
            .post(auth_url)
            .basic_auth(&credentials.client_id, Some(&credentials.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .timeout(AUTH_TIMEOUT)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(DownloadError::Auth(format!(
                "Token request failed with status {}",
                response.status()
            )));
        }

        let token: TokenResponse = response.json().await?;

        info!("Successfully authenticated with Reddit API");
        Ok(Self {
            client,
            access_token: token.access_token,
            api_url: api_url.to_string(),
        })
    }
}

#[async_trait]
impl PostFeed for RedditFeed {
    async fn fetch_posts(
        &self,
        subreddit: &str,
        sort: SortOrder,
        time_filter: TimeFilter,
        limit: u32,
    ) -> Result<Vec<Post>, DownloadError> {
        let url = format!("{}/r/{}/{}", self.api_url, subreddit, sort.as_str());

        let mut request = self
            .client
            .get(&url)
            .bearer_auth(&self.access_token)
            .query(&[("limit", limit.to_string()), ("raw_json", "1".to_string())]);

        if sort == SortOrder::Top {
            request = request.query(&[("t", time_filter.as_str())]);
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            return Err(DownloadError::Feed(format!(
                "Listing request for r/{} failed with status {}",
                subreddit,
                response.status()
            )));
        }

        let listing: Listing = response.json().await?;

        Ok(listing
            .data
            .children
            .into_iter()
            .map(|child| child.data.into_post())
            .collect())
    }
}

#[derive(Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Deserialize)]
struct ListingData {
    children: Vec<ListingChild>,
}

#[derive(Deserialize)]
struct ListingChild {
    data: RawPost,
}

/// Raw post record as returned by the listing API.
#[derive(Deserialize)]
struct RawPost {
    id: String,
    title: String,
    #[serde(default)]
    ups: i64,
    #[serde(default)]
    url: String,
    #[serde(default)]
    is_video: bool,
    #[serde(default)]
    is_gallery: bool,
    #[serde(default)]
    media: Option<RawMedia>,
}

#[derive(Deserialize)]
struct RawMedia {
    reddit_video: Option<RawRedditVideo>,
}

#[derive(Deserialize)]
struct RawRedditVideo {
    fallback_url: Option<String>,
    has_audio: Option<bool>,
}

impl RawPost {
    fn into_post(self) -> Post {
        let video = self
            .media
            .and_then(|media| media.reddit_video)
            .and_then(|video| {
                video.fallback_url.map(|fallback_url| VideoSource {
                    fallback_url,
                    // Absent hint means assume the audio stream exists.
                    has_audio: video.has_audio.unwrap_or(true),
                })
            });

        Post::classify(
            self.id,
            self.title,
            self.url,
            self.ups,
            self.is_video,
            self.is_gallery,
            video,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::post::MediaKind;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn credentials() -> Credentials {
        Credentials {
            client_id: "id".to_string(),
            client_secret: "secret".to_string(),
            user_agent: "test-agent/1.0".to_string(),
        }
    }

    fn listing_body() -> serde_json::Value {
        serde_json::json!({
            "kind": "Listing",
            "data": {
                "children": [
                    {
                        "kind": "t3",
                        "data": {
                            "id": "img1",
                            "title": "A picture",
                            "ups": 42,
                            "url": "https://i.redd.it/img1.jpg",
                            "is_video": false
                        }
                    },
                    {
                        "kind": "t3",
                        "data": {
                            "id": "vid1",
                            "title": "A video",
                            "ups": 7,
                            "url": "https://v.redd.it/vid1",
                            "is_video": true,
                            "media": {
                                "reddit_video": {
                                    "fallback_url": "https://v.redd.it/vid1/DASH_720.mp4",
                                    "has_audio": true
                                }
                            }
                        }
                    },
                    {
                        "kind": "t3",
                        "data": {
                            "id": "vid2",
                            "title": "Broken video",
                            "ups": 3,
                            "url": "https://v.redd.it/vid2",
                            "is_video": true
                        }
                    }
                ]
            }
        })
    }

    async fn authenticated_feed(server: &MockServer) -> RedditFeed {
        Mock::given(method("POST"))
            .and(path("/api/v1/access_token"))
            .and(body_string_contains("client_credentials"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "token-abc",
                "token_type": "bearer",
                "expires_in": 3600,
                "scope": "*"
            })))
            .mount(server)
            .await;

        RedditFeed::authenticate_at(
            &credentials(),
            &format!("{}/api/v1/access_token", server.uri()),
            &server.uri(),
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_authentication_failure_is_fatal() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/access_token"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let result = RedditFeed::authenticate_at(
            &credentials(),
            &format!("{}/api/v1/access_token", server.uri()),
            &server.uri(),
        )
        .await;

        assert!(matches!(result, Err(DownloadError::Auth(_))));
    }

    #[tokio::test]
    async fn test_fetch_posts_classifies_records() {
        let server = MockServer::start().await;
        let feed = authenticated_feed(&server).await;

        Mock::given(method("GET"))
            .and(path("/r/pics/hot"))
            .respond_with(ResponseTemplate::new(200).set_body_json(listing_body()))
            .mount(&server)
            .await;

        let posts = feed
            .fetch_posts("pics", SortOrder::Hot, TimeFilter::All, 25)
            .await
            .unwrap();

        assert_eq!(posts.len(), 3);

        assert_eq!(posts[0].id, "img1");
        assert_eq!(posts[0].score, 42);
        assert!(matches!(posts[0].kind, MediaKind::Image { ref extension } if extension == "jpg"));

        match &posts[1].kind {
            MediaKind::Video(Some(source)) => {
                assert_eq!(source.fallback_url, "https://v.redd.it/vid1/DASH_720.mp4");
                assert!(source.has_audio);
            }
            other => panic!("expected video with descriptor, got {other:?}"),
        }

        // Video hint without a usable descriptor stays an explicit case.
        assert!(matches!(posts[2].kind, MediaKind::Video(None)));
    }

    #[tokio::test]
    async fn test_fetch_posts_surfaces_listing_failure() {
        let server = MockServer::start().await;
        let feed = authenticated_feed(&server).await;

        Mock::given(method("GET"))
            .and(path("/r/missing/hot"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let result = feed
            .fetch_posts("missing", SortOrder::Hot, TimeFilter::All, 25)
            .await;

        assert!(matches!(result, Err(DownloadError::Feed(_))));
    }
}
