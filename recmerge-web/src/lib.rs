//! recmerge-web library interface
//!
//! The merge wizard: upload a master and an incoming file, review ranked
//! candidate matches, resolve field conflicts, download the merged file.
//! Exposed as a library so integration tests can drive the router directly.

pub mod api;
pub mod config;
pub mod error;
pub mod field_key;
pub mod intake;
pub mod merge;
pub mod operation;
pub mod session;
pub mod store;

pub use crate::error::{WizardError, WizardResult};

use axum::extract::DefaultBodyLimit;
use axum::Router;
use chrono::{DateTime, Utc};
use recmerge_common::{Matcher, ProfileMatcher};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::config::WizardConfig;
use crate::store::OperationStore;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<WizardConfig>,
    pub store: Arc<OperationStore>,
    pub matcher: Arc<dyn Matcher>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(config: WizardConfig) -> Self {
        Self::with_matcher(config, Arc::new(ProfileMatcher::new()))
    }

    pub fn with_matcher(config: WizardConfig, matcher: Arc<dyn Matcher>) -> Self {
        let store = Arc::new(OperationStore::new(config.store_dir.clone()));
        Self {
            config: Arc::new(config),
            store,
            matcher,
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        .merge(api::ui_routes())
        .merge(api::workflow_routes())
        .merge(api::health_routes())
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
