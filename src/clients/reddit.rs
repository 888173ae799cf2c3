//! Reddit content source
//!
//! Searches one subreddit for the newest posts carrying the configured
//! flair. With client credentials configured it authenticates
//! application-only (`client_credentials`) against the OAuth API host;
//! without them it falls back to the public `.json` endpoints.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::clients::{ContentSource, http_client};
use crate::config::RedditConfig;
use crate::error::{AppError, Result};
use crate::models::Post;
use crate::models::post::timestamp_to_utc;

/// Refresh tokens this long before Reddit says they expire
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// Upper bound on how long a token is trusted, whatever `expires_in` says
const MAX_TOKEN_LIFETIME: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

fn default_expires_in() -> u64 {
    3600
}

#[derive(Debug, Clone)]
struct AccessToken {
    value: String,
    expires_at: Instant,
}

impl AccessToken {
    fn is_fresh(&self) -> bool {
        Instant::now() + TOKEN_EXPIRY_MARGIN < self.expires_at
    }
}

#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    #[serde(default)]
    children: Vec<Thing>,
}

#[derive(Debug, Deserialize)]
struct Thing {
    data: RawPost,
}

#[derive(Debug, Deserialize)]
struct RawPost {
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    selftext: String,
    #[serde(default)]
    permalink: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    author: String,
    #[serde(default)]
    link_flair_text: Option<String>,
    #[serde(default)]
    created_utc: Option<f64>,
}

impl From<RawPost> for Post {
    fn from(raw: RawPost) -> Self {
        Post {
            id: raw.id,
            title: raw.title,
            body: raw.selftext,
            permalink: raw.permalink,
            url: raw.url,
            author: raw.author,
            flair: raw.link_flair_text,
            created_utc: raw.created_utc.and_then(timestamp_to_utc),
        }
    }
}

pub struct RedditClient {
    http: reqwest::Client,
    config: RedditConfig,
    token: Mutex<Option<AccessToken>>,
}

impl RedditClient {
    pub fn new(config: RedditConfig) -> Result<Self> {
        let http = http_client(&config.user_agent, config.timeout_secs)?;
        if config.has_credentials() {
            info!("Reddit client using OAuth for r/{}", config.subreddit);
        } else {
            info!(
                "Reddit client using public endpoints for r/{} (no credentials configured)",
                config.subreddit
            );
        }
        Ok(Self {
            http,
            config,
            token: Mutex::new(None),
        })
    }

    async fn access_token(&self) -> Result<String> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref().filter(|t| t.is_fresh()) {
            return Ok(token.value.clone());
        }

        let url = format!("{}/api/v1/access_token", self.config.auth_base);
        let response = self
            .http
            .post(&url)
            .basic_auth(&self.config.client_id, Some(&self.config.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::Upstream(format!(
                "reddit token request returned {}",
                response.status()
            )));
        }

        let body: TokenResponse = response.json().await?;
        debug!("Obtained reddit access token, expires in {}s", body.expires_in);
        let token = AccessToken {
            value: body.access_token,
            expires_at: Instant::now() + Duration::from_secs(body.expires_in).min(MAX_TOKEN_LIFETIME),
        };
        let value = token.value.clone();
        *cached = Some(token);
        Ok(value)
    }

    async fn search(&self, token: Option<&str>) -> Result<reqwest::Response> {
        let limit = self.config.limit.to_string();
        let query = self.config.query();
        let params = [
            ("q", query.as_str()),
            ("sort", "new"),
            ("restrict_sr", "1"),
            ("syntax", "lucene"),
            ("limit", limit.as_str()),
            ("raw_json", "1"),
        ];

        let request = match token {
            Some(token) => self
                .http
                .get(format!(
                    "{}/r/{}/search",
                    self.config.oauth_api_base, self.config.subreddit
                ))
                .bearer_auth(token),
            None => self.http.get(format!(
                "{}/r/{}/search.json",
                self.config.public_api_base, self.config.subreddit
            )),
        };

        Ok(request.query(&params).send().await?)
    }

    async fn parse(response: reqwest::Response) -> Result<Vec<Post>> {
        if !response.status().is_success() {
            return Err(AppError::Upstream(format!(
                "reddit search returned {}",
                response.status()
            )));
        }
        let listing: Listing = response.json().await?;
        Ok(listing
            .data
            .children
            .into_iter()
            .map(|thing| Post::from(thing.data))
            .collect())
    }
}

#[async_trait]
impl ContentSource for RedditClient {
    async fn fetch_recent(&self) -> Result<Vec<Post>> {
        if !self.config.has_credentials() {
            return Self::parse(self.search(None).await?).await;
        }

        let token = self.access_token().await?;
        let response = self.search(Some(&token)).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Self::parse(response).await;
        }

        // token revoked or expired early: fetch a new one and retry once
        warn!("Reddit rejected the access token, re-authenticating");
        self.token.lock().await.take();
        let token = self.access_token().await?;
        Self::parse(self.search(Some(&token)).await?).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn listing() -> serde_json::Value {
        json!({
            "kind": "Listing",
            "data": {
                "children": [
                    {
                        "kind": "t3",
                        "data": {
                            "id": "1abc",
                            "title": "[WTS] Pilot Vanishing Point",
                            "selftext": "Black matte, F nib",
                            "permalink": "/r/Pen_Swap/comments/1abc/wts_pilot_vanishing_point/",
                            "url": "https://www.reddit.com/r/Pen_Swap/comments/1abc/",
                            "author": "inkfan",
                            "link_flair_text": "WTS-OPEN",
                            "created_utc": 1700000000.0
                        }
                    },
                    {
                        "kind": "t3",
                        "data": { "id": "1abd", "title": "[WTS] Inks" }
                    }
                ]
            }
        })
    }

    fn config(server: &MockServer, with_credentials: bool) -> RedditConfig {
        let mut config = RedditConfig {
            auth_base: server.uri(),
            oauth_api_base: server.uri(),
            public_api_base: server.uri(),
            ..RedditConfig::default()
        };
        if with_credentials {
            config.client_id = "id".to_string();
            config.client_secret = "secret".to_string();
        }
        config
    }

    #[tokio::test]
    async fn test_public_search() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/r/Pen_Swap/search.json"))
            .and(query_param("q", "flair_name:\"WTS-OPEN\""))
            .and(query_param("sort", "new"))
            .and(query_param("restrict_sr", "1"))
            .and(query_param("limit", "10"))
            .respond_with(ResponseTemplate::new(200).set_body_json(listing()))
            .expect(1)
            .mount(&server)
            .await;

        let client = RedditClient::new(config(&server, false)).unwrap();
        let posts = client.fetch_recent().await.unwrap();

        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].id, "1abc");
        assert_eq!(posts[0].body, "Black matte, F nib");
        assert_eq!(posts[0].flair.as_deref(), Some("WTS-OPEN"));
        assert!(posts[0].created_utc.is_some());
        assert_eq!(posts[1].body, "");
    }

    #[tokio::test]
    async fn test_oauth_token_is_cached() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/access_token"))
            .and(body_string_contains("grant_type=client_credentials"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"access_token": "tok", "token_type": "bearer", "expires_in": 3600})),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/r/Pen_Swap/search"))
            .and(header("authorization", "Bearer tok"))
            .respond_with(ResponseTemplate::new(200).set_body_json(listing()))
            .expect(2)
            .mount(&server)
            .await;

        let client = RedditClient::new(config(&server, true)).unwrap();
        assert_eq!(client.fetch_recent().await.unwrap().len(), 2);
        assert_eq!(client.fetch_recent().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_oversized_token_lifetime_is_capped() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/access_token"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"access_token": "tok", "expires_in": u64::MAX})),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/r/Pen_Swap/search"))
            .and(header("authorization", "Bearer tok"))
            .respond_with(ResponseTemplate::new(200).set_body_json(listing()))
            .expect(2)
            .mount(&server)
            .await;

        let client = RedditClient::new(config(&server, true)).unwrap();
        assert_eq!(client.fetch_recent().await.unwrap().len(), 2);
        assert_eq!(client.fetch_recent().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_upstream_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/r/Pen_Swap/search.json"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = RedditClient::new(config(&server, false)).unwrap();
        let err = client.fetch_recent().await.unwrap_err();
        assert!(matches!(err, AppError::Upstream(_)));
    }

    #[tokio::test]
    async fn test_rejected_token_is_refreshed_once() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/access_token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "tok"})))
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/r/Pen_Swap/search"))
            .respond_with(ResponseTemplate::new(401))
            .expect(2)
            .mount(&server)
            .await;

        let client = RedditClient::new(config(&server, true)).unwrap();
        let err = client.fetch_recent().await.unwrap_err();
        assert!(matches!(err, AppError::Upstream(_)));
    }
}
