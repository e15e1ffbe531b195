//! HTTP handlers for recmerge-web

pub mod health;
pub mod ui;
pub mod workflow;

pub use health::health_routes;
pub use ui::ui_routes;
pub use workflow::workflow_routes;
