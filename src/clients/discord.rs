//! Discord notifier
//!
//! Posts one message per new match to a channel through the REST API with
//! a bot token. A rate-limited request (429) is retried once after the
//! delay Discord asks for, capped so a cycle never stalls for long.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use crate::clients::{Notifier, http_client};
use crate::config::DiscordConfig;
use crate::error::{AppError, Result};
use crate::models::Post;

/// Discord rejects message content longer than this (in characters)
pub const MESSAGE_LIMIT: usize = 2000;

const MAX_RETRY_AFTER: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
struct RateLimited {
    #[serde(default)]
    retry_after: f64,
}

/// `**title**`, the matched terms and the post link, capped at `MESSAGE_LIMIT`
pub fn format_message(post: &Post, matched_terms: &[String]) -> String {
    let link = post.link();
    let tail = format!("\nFound: {}\n{}", matched_terms.join(", "), link);

    let message = format!("**{}**{}", post.title, tail);
    if message.chars().count() <= MESSAGE_LIMIT {
        return message;
    }

    // shorten the title first so the link survives
    let budget = MESSAGE_LIMIT.saturating_sub(tail.chars().count() + "****...".len());
    if budget > 0 {
        let title: String = post.title.chars().take(budget).collect();
        return format!("**{title}...**{tail}");
    }
    message.chars().take(MESSAGE_LIMIT).collect()
}

pub struct DiscordNotifier {
    http: reqwest::Client,
    config: DiscordConfig,
}

impl DiscordNotifier {
    pub fn new(config: DiscordConfig) -> Result<Self> {
        let http = http_client(
            concat!("penwatch/", env!("CARGO_PKG_VERSION")),
            config.timeout_secs,
        )?;
        Ok(Self { http, config })
    }

    pub fn is_configured(config: &DiscordConfig) -> bool {
        !config.bot_token.is_empty() && !config.channel_id.is_empty()
    }

    async fn send(&self, content: &str) -> Result<reqwest::Response> {
        let url = format!(
            "{}/channels/{}/messages",
            self.config.api_base, self.config.channel_id
        );
        Ok(self
            .http
            .post(url)
            .header("Authorization", format!("Bot {}", self.config.bot_token))
            .json(&json!({ "content": content }))
            .send()
            .await?)
    }
}

#[async_trait]
impl Notifier for DiscordNotifier {
    async fn notify(&self, post: &Post, matched_terms: &[String]) -> Result<()> {
        let content = format_message(post, matched_terms);

        let mut response = self.send(&content).await?;
        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .json::<RateLimited>()
                .await
                .map(|r| {
                    let secs = r.retry_after.min(MAX_RETRY_AFTER.as_secs_f64()).max(0.0);
                    Duration::from_secs_f64(secs)
                })
                .unwrap_or(Duration::from_secs(1));
            warn!("Discord rate limited, retrying in {:?}", retry_after);
            tokio::time::sleep(retry_after).await;
            response = self.send(&content).await?;
        }

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Upstream(format!(
                "discord returned {status}: {body}"
            )));
        }

        debug!("Sent post {} to Discord", post.id);
        Ok(())
    }
}
