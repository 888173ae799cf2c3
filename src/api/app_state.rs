use crate::observability::ObservabilityState;
use crate::services::{PenCatalog, Poller};
use crate::storage::SeenPostStore;
use std::sync::Arc;

/// Application state shared by every handler
#[derive(Clone)]
pub struct AppState {
    /// Pen dictionary and monitoring list
    pub catalog: Arc<PenCatalog>,
    /// Seen-post store, for inspection and operator resets
    pub seen: Arc<SeenPostStore>,
    /// Monitoring cycle runner, for manual cycles and force searches
    pub poller: Arc<Poller>,
    pub observability: Arc<ObservabilityState>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("catalog", &self.catalog)
            .field("seen", &self.seen)
            .field("poller", &"Arc<Poller>")
            .field("observability", &"Arc<ObservabilityState>")
            .finish()
    }
}

impl AppState {
    pub fn new(
        catalog: Arc<PenCatalog>,
        seen: Arc<SeenPostStore>,
        poller: Arc<Poller>,
        observability: Arc<ObservabilityState>,
    ) -> Self {
        Self {
            catalog,
            seen,
            poller,
            observability,
        }
    }
}
