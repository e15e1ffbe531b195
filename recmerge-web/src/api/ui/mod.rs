//! UI routes - HTML pages for the merge wizard
//!
//! - **Static Assets** (`static_assets`): stylesheet
//! - **Root Page** (`root`): upload form
//! - **Review** (`review`): candidate review page, rendered by `POST /run`

use axum::{routing::get, Router};

use crate::AppState;

mod layout;
mod root;
mod static_assets;
pub mod review;

use root::root_page;
use static_assets::serve_recmerge_css;

/// Build UI routes
pub fn ui_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(root_page))
        .route("/static/recmerge.css", get(serve_recmerge_css))
}
