//! Print every post id in the seen-post store with its link and first-seen time.
//!
//! Reads the same configuration as the service, so `PENWATCH_CONFIG` and
//! `PENWATCH_STORAGE__SEEN_POSTS_DB` apply.

use anyhow::{Context, Result};
use penwatch::config::ConfigLoader;
use penwatch::storage::SeenPostStore;

fn main() -> Result<()> {
    let _ = dotenv::dotenv();
    let config = ConfigLoader::load().context("failed to load configuration")?;

    let path = &config.storage.seen_posts_db;
    if !path.exists() {
        println!("No seen-post store at {}", path.display());
        return Ok(());
    }

    let store = SeenPostStore::open(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    let posts = store.list()?;

    println!("Seen posts in {}:", path.display());
    for post in &posts {
        println!(
            "{}  https://www.reddit.com/comments/{}  (seen {})",
            post.post_id,
            post.post_id,
            post.seen_at.format("%Y-%m-%d %H:%M:%S UTC")
        );
    }
    println!("{} total", posts.len());

    Ok(())
}
