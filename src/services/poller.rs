//! Poller
//!
//! One monitoring cycle is fetch -> filter_new -> notify. Cycles never
//! overlap: the periodic loop and manual triggers share one async guard.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{Mutex, watch};
use tracing::{debug, error, info, warn};

use crate::clients::{ContentSource, Notifier};
use crate::error::{AppError, Result};
use crate::models::Post;
use crate::observability::{ComponentHealth, ObservabilityState};
use crate::services::catalog::PenCatalog;
use crate::services::match_engine::{MatchEngine, matched_terms};

/// Outcome of one monitoring cycle
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CycleReport {
    /// Posts returned by the content source
    pub fetched: usize,
    /// New matches recorded in the seen-post store
    pub matched: usize,
    pub notified: usize,
    /// Matches the notifier failed to deliver
    pub failed: usize,
}

/// A post found by a force search, with the terms it contains
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForcedMatch {
    pub post: Post,
    pub matched_terms: Vec<String>,
}

pub struct Poller {
    catalog: Arc<PenCatalog>,
    engine: MatchEngine,
    source: Arc<dyn ContentSource>,
    notifier: Arc<dyn Notifier>,
    observability: Arc<ObservabilityState>,
    cycle_guard: Mutex<()>,
}

impl Poller {
    pub fn new(
        catalog: Arc<PenCatalog>,
        engine: MatchEngine,
        source: Arc<dyn ContentSource>,
        notifier: Arc<dyn Notifier>,
        observability: Arc<ObservabilityState>,
    ) -> Self {
        Self {
            catalog,
            engine,
            source,
            notifier,
            observability,
            cycle_guard: Mutex::new(()),
        }
    }

    /// Run one cycle now, waiting for any cycle already in progress
    pub async fn run_cycle(&self) -> Result<CycleReport> {
        let _cycle = self.cycle_guard.lock().await;
        let metrics = &self.observability.metrics;

        let terms = self.catalog.search_terms();
        if terms.is_empty() {
            debug!("Nothing monitored, skipping fetch");
            metrics.record_cycle(0, true);
            return Ok(CycleReport::default());
        }

        let posts = match self.source.fetch_recent().await {
            Ok(posts) => posts,
            Err(e) => return Err(self.cycle_failed(0, e)),
        };
        let fetched = posts.len();

        let fresh = match self.engine.filter_new(posts, &terms) {
            Ok(fresh) => fresh,
            Err(e) => return Err(self.cycle_failed(fetched, e)),
        };

        let mut report = CycleReport {
            fetched,
            matched: fresh.len(),
            ..CycleReport::default()
        };

        for post in &fresh {
            let found = matched_terms(post, &terms);
            match self.notifier.notify(post, &found).await {
                Ok(()) => {
                    info!("Notified post {}: {} [{}]", post.id, post.title, found.join(", "));
                    metrics.record_notification(true);
                    report.notified += 1;
                }
                Err(e) => {
                    // already marked seen, so this match will not be retried
                    warn!("Failed to notify post {}: {}", post.id, e);
                    metrics.record_notification(false);
                    report.failed += 1;
                }
            }
        }

        metrics.record_cycle(fetched, true);
        self.observability.report(ComponentHealth::healthy(
            "poller",
            format!(
                "fetched {}, notified {}, failed {}",
                report.fetched, report.notified, report.failed
            ),
        ));
        info!(
            "Cycle done: fetched {}, new matches {}, notified {}, failed {}",
            report.fetched, report.matched, report.notified, report.failed
        );
        Ok(report)
    }

    fn cycle_failed(&self, fetched: usize, e: AppError) -> AppError {
        self.observability.metrics.record_cycle(fetched, false);
        self.observability
            .report(ComponentHealth::unhealthy("poller", e.to_string()));
        e
    }

    /// Fetch and match without consulting or updating the seen-post store.
    ///
    /// Nothing is notified.
    pub async fn force_search(&self) -> Result<Vec<ForcedMatch>> {
        let terms = self.catalog.search_terms();
        if terms.is_empty() {
            return Ok(Vec::new());
        }

        let posts = self.source.fetch_recent().await?;
        let found = self
            .engine
            .force_search(posts, &terms)
            .into_iter()
            .map(|post| ForcedMatch {
                matched_terms: matched_terms(&post, &terms),
                post,
            })
            .collect::<Vec<_>>();

        info!("Force search found {} matching posts", found.len());
        Ok(found)
    }

    /// Run cycles every `interval` until `shutdown` turns true
    pub async fn run(self: Arc<Self>, interval: Duration, mut shutdown: watch::Receiver<bool>) {
        info!("Polling every {:?}", interval);
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = self.run_cycle().await {
                        error!("Monitoring cycle failed: {}", e);
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("Poller stopping");
                        break;
                    }
                }
            }
        }
    }
}
