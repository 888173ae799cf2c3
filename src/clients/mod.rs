//! External platform clients
//!
//! The poller only sees the two traits below; the Reddit and Discord
//! implementations live in their own modules.

pub mod discord;
pub mod reddit;

use async_trait::async_trait;
use tracing::info;

use crate::error::Result;
use crate::models::Post;

pub use discord::DiscordNotifier;
pub use reddit::RedditClient;

/// Source of candidate posts
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Most recent posts, newest first
    async fn fetch_recent(&self) -> Result<Vec<Post>>;
}

/// Sink for new matches
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, post: &Post, matched_terms: &[String]) -> Result<()>;
}

/// Notifier that only logs, used when no chat credentials are configured
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, post: &Post, matched_terms: &[String]) -> Result<()> {
        info!(
            "[dry run] {} | found: {} | {}",
            post.title,
            matched_terms.join(", "),
            post.link()
        );
        Ok(())
    }
}

/// Build a reqwest client with a request timeout and user agent
pub(crate) fn http_client(user_agent: &str, timeout_secs: u64) -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .user_agent(user_agent)
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()?)
}
