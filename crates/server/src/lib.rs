//! HTTP service for the support ticket tracker.

pub mod api;
pub mod metrics;
pub mod state;

pub use api::create_router;
pub use state::AppState;
