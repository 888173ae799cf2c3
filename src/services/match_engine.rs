//! Match Engine
//!
//! Decides which fetched posts are new matches. A post matches when any
//! search term occurs (case-insensitively) in its title or body.
//! `filter_new` additionally consults and updates the seen-post store;
//! `force_search` never touches it.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::Result;
use crate::models::Post;
use crate::storage::SeenLog;

/// Search terms found in `post`, sorted
pub fn matched_terms(post: &Post, terms: &BTreeSet<String>) -> Vec<String> {
    let text = post.searchable_text();
    terms
        .iter()
        .filter(|term| !term.is_empty() && text.contains(term.as_str()))
        .cloned()
        .collect()
}

pub fn is_match(post: &Post, terms: &BTreeSet<String>) -> bool {
    let text = post.searchable_text();
    terms
        .iter()
        .any(|term| !term.is_empty() && text.contains(term.as_str()))
}

#[derive(Debug, Clone)]
pub struct MatchEngine {
    seen: Arc<dyn SeenLog>,
}

impl MatchEngine {
    pub fn new(seen: Arc<dyn SeenLog>) -> Self {
        Self { seen }
    }

    /// Matching posts not seen before, each marked seen before it is returned.
    ///
    /// A post whose lookup or mark fails is dropped and left unmarked so the
    /// next cycle retries it; the rest of the batch is still processed.
    /// Duplicate ids within one batch are returned once.
    pub fn filter_new(&self, posts: Vec<Post>, terms: &BTreeSet<String>) -> Result<Vec<Post>> {
        let mut fresh = Vec::new();

        for post in posts {
            if !is_match(&post, terms) {
                continue;
            }
            match self.seen.has_seen(&post.id) {
                Ok(false) => {}
                Ok(true) => {
                    debug!("Post {} already seen", post.id);
                    continue;
                }
                Err(e) => {
                    warn!("Could not check whether post {} was seen, will retry: {}", post.id, e);
                    continue;
                }
            }
            match self.seen.mark_seen(&post.id) {
                Ok(true) => {
                    debug!("New match: {} ({})", post.id, post.title);
                    fresh.push(post);
                }
                // marked by an earlier duplicate in this batch or a concurrent cycle
                Ok(false) => {}
                Err(e) => warn!("Could not mark post {} as seen, will retry: {}", post.id, e),
            }
        }

        Ok(fresh)
    }

    /// Matching posts regardless of the seen-post store
    pub fn force_search(&self, posts: Vec<Post>, terms: &BTreeSet<String>) -> Vec<Post> {
        posts.into_iter().filter(|post| is_match(post, terms)).collect()
    }
}
