use std::sync::Arc;

use lyra_core::dataset::Dataset;
use tokio::sync::{AcquireError, Semaphore, SemaphorePermit};

/// Cap on concurrent outbound calls made by proxying handlers.
pub const OUTBOUND_CAP: usize = 100;

#[derive(Clone)]
pub struct AppState {
    pub dataset: Arc<Dataset>,
    pub goto_url: Arc<str>,
    outbound: Arc<Semaphore>,
}

impl AppState {
    /// Builds the shared state, including the outbound limiter, before the
    /// router starts answering requests.
    pub fn new(dataset: Arc<Dataset>, goto_url: String) -> Self {
        Self {
            dataset,
            goto_url: goto_url.into(),
            outbound: Arc::new(Semaphore::new(OUTBOUND_CAP)),
        }
    }

    /// Permit gating any handler that calls out to a third-party service.
    /// Lookup handlers never need one; sibling proxying deployments do.
    pub async fn outbound_permit(&self) -> Result<SemaphorePermit<'_>, AcquireError> {
        self.outbound.acquire().await
    }

    pub fn outbound_available(&self) -> usize {
        self.outbound.available_permits()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn outbound_limiter_starts_at_the_cap() {
        let state = AppState::new(Arc::new(Dataset::default()), "https://example.org".into());
        assert_eq!(state.outbound_available(), OUTBOUND_CAP);

        let permit = state.outbound_permit().await.unwrap();
        assert_eq!(state.outbound_available(), OUTBOUND_CAP - 1);
        drop(permit);
        assert_eq!(state.outbound_available(), OUTBOUND_CAP);
    }
}
