use axum::{
    http::{header, HeaderValue},
    middleware,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

use super::middleware::metrics_middleware;
use super::{comments, handlers, tickets};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config().cors.origins);

    // API routes
    let api_routes = Router::new()
        .route("/health", get(handlers::health))
        // Tickets
        .route(
            "/tickets",
            get(tickets::list_tickets).post(tickets::create_ticket),
        )
        .route("/tickets/stats", get(tickets::ticket_stats))
        .route("/tickets/search", get(tickets::search_tickets))
        .route(
            "/tickets/{id}",
            get(tickets::get_ticket)
                .put(tickets::update_ticket)
                .delete(tickets::delete_ticket),
        )
        // Comments
        .route("/comments", post(comments::create_comment))
        .route("/comments/ticket/{ticket_id}", get(comments::list_comments))
        .route("/comments/{id}", delete(comments::delete_comment));

    Router::new()
        .nest("/api", api_routes)
        .route("/metrics", get(handlers::metrics))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// CORS for the configured browser origins. Unparseable origins are skipped.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers([header::LOCATION])
}
