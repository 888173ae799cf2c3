//! Content-platform post model

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// A candidate post fetched from the content platform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    /// Opaque platform id (e.g. `1abc2d`)
    pub id: String,

    pub title: String,

    /// Self text; empty for link posts
    #[serde(default)]
    pub body: String,

    /// Path relative to the platform host, e.g. `/r/Pen_Swap/comments/...`
    #[serde(default)]
    pub permalink: String,

    #[serde(default)]
    pub url: String,

    #[serde(default)]
    pub author: String,

    #[serde(default)]
    pub flair: Option<String>,

    #[serde(default)]
    pub created_utc: Option<DateTime<Utc>>,
}

impl Post {
    /// Minimal post, mostly useful for tests and force searches
    pub fn new(id: &str, title: &str, body: &str) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            body: body.to_string(),
            permalink: format!("/comments/{id}"),
            url: String::new(),
            author: String::new(),
            flair: None,
            created_utc: None,
        }
    }

    /// Absolute link to the post
    pub fn link(&self) -> String {
        if self.permalink.starts_with("http") {
            self.permalink.clone()
        } else {
            format!("https://www.reddit.com{}", self.permalink)
        }
    }

    /// Lowercased title and body joined, the text search terms are matched against
    pub fn searchable_text(&self) -> String {
        format!("{}\n{}", self.title, self.body).to_lowercase()
    }
}

/// Convert a unix timestamp in seconds (as Reddit reports it) to UTC
pub fn timestamp_to_utc(seconds: f64) -> Option<DateTime<Utc>> {
    Utc.timestamp_opt(seconds as i64, 0).single()
}
