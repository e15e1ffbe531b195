//! Static asset handlers
//!
//! Embeds and serves CSS at compile time

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

const RECMERGE_CSS: &str = include_str!("../../../static/recmerge.css");

/// GET /static/recmerge.css
pub async fn serve_recmerge_css() -> Response {
    (
        StatusCode::OK,
        [
            ("content-type", "text/css"),
            ("cache-control", "no-cache, no-store, must-revalidate"),
        ],
        RECMERGE_CSS,
    )
        .into_response()
}
