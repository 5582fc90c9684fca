//! The serving side: a thin axum router over an immutable [`Dataset`].
//!
//! Every request is a pure, read-only lookup; the dataset is loaded before
//! the router exists and never changes afterwards, so handlers share it
//! without locking.

use std::sync::Arc;

use axum::{Router, routing::get};
use lyra_core::dataset::Dataset;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

mod api;

pub mod state;

use state::AppState;

/// Browse UI the service points legacy navigation at.
const DEFAULT_GOTO_URL: &str = "https://datasets.datalad.org/?dir=/shub";

/// The builder for the lyra server.
#[derive(Clone, Debug, Default)]
pub struct LyraServer {
    config: LyraServerConfig,
}

#[derive(Clone, Debug)]
pub struct LyraServerConfig {
    /// Base browse URL: the target of the root/alias redirects and the
    /// prefix of collection redirects.
    pub goto_url: String,
}

impl Default for LyraServerConfig {
    fn default() -> Self {
        Self {
            goto_url: DEFAULT_GOTO_URL.to_string(),
        }
    }
}

impl LyraServer {
    pub fn new(config: LyraServerConfig) -> Self {
        Self { config }
    }

    pub fn build(self, dataset: Arc<Dataset>) -> Router {
        let state = AppState::new(dataset, self.config.goto_url);

        Router::new()
            .route("/", get(api::goto_browse))
            .route("/about", get(api::goto_browse))
            .route("/labels", get(api::goto_browse))
            .route("/collections/my", get(api::goto_browse))
            .route("/collections/{id}", get(api::get_collection))
            .route("/container/{org}/{repo_tag}", get(api::get_container))
            .route("/health", get(|| async { "OK" }))
            .layer(CorsLayer::permissive())
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }
}

pub mod prelude {
    pub use crate::state::*;
    pub use crate::{LyraServer, LyraServerConfig};
}
