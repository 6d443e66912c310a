//! Metrics middleware for API routes.

use axum::{
    body::Body,
    extract::MatchedPath,
    http::Request,
    middleware::Next,
    response::Response,
};
use std::time::Instant;

use crate::metrics::{
    HTTP_REQUESTS_IN_FLIGHT, HTTP_REQUESTS_TOTAL, HTTP_REQUEST_DURATION, UNMATCHED_PATH,
};

/// Metrics middleware that tracks HTTP request duration and counts.
///
/// This middleware records:
/// - Request duration (histogram)
/// - Request count (counter)
/// - Requests in flight (gauge)
///
/// The path label is the route template (`/api/tickets/{id}`), never the raw
/// URI, so the label set stays bounded by the route table.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map(|matched| matched.as_str().to_string())
        .unwrap_or_else(|| UNMATCHED_PATH.to_string());

    HTTP_REQUESTS_IN_FLIGHT.inc();
    let response = next.run(request).await;
    HTTP_REQUESTS_IN_FLIGHT.dec();

    let duration = start.elapsed().as_secs_f64();
    let status = response.status().as_u16().to_string();

    HTTP_REQUEST_DURATION
        .with_label_values(&[&method, &path, &status])
        .observe(duration);
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[&method, &path, &status])
        .inc();

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, middleware, routing::get, Router};
    use tower::ServiceExt;

    async fn teapot() -> StatusCode {
        StatusCode::IM_A_TEAPOT
    }

    fn app() -> Router {
        Router::new()
            .route("/kettle/{id}", get(teapot))
            .layer(middleware::from_fn(metrics_middleware))
    }

    async fn send(app: Router, uri: &str) -> StatusCode {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        app.oneshot(request).await.unwrap().status()
    }

    fn count(path: &str, status: &str) -> u64 {
        HTTP_REQUESTS_TOTAL
            .with_label_values(&["GET", path, status])
            .get()
    }

    #[tokio::test]
    async fn test_requests_are_counted_by_route_template() {
        let before = count("/kettle/{id}", "418");

        assert_eq!(send(app(), "/kettle/not-a-uuid-7").await, StatusCode::IM_A_TEAPOT);
        assert_eq!(
            send(app(), "/kettle/550e8400-e29b-41d4-a716-446655440000").await,
            StatusCode::IM_A_TEAPOT
        );

        assert_eq!(count("/kettle/{id}", "418"), before + 2);
        assert_eq!(count("/kettle/not-a-uuid-7", "418"), 0);
    }

    #[tokio::test]
    async fn test_unrouted_paths_share_one_series() {
        let before = count(UNMATCHED_PATH, "404");

        assert_eq!(send(app(), "/wp-admin-3.php").await, StatusCode::NOT_FOUND);
        assert_eq!(send(app(), "/teapots/abc").await, StatusCode::NOT_FOUND);

        assert_eq!(count(UNMATCHED_PATH, "404"), before + 2);
        assert_eq!(count("/wp-admin-3.php", "404"), 0);
        assert_eq!(count("/teapots/abc", "404"), 0);
    }
}
