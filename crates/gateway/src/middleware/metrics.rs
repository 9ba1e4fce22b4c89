//! Per-request metrics keyed by route template

use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use papersmith_common::metrics::RequestMetrics;

/// Record count and latency for every request
pub async fn track_requests(request: Request, next: Next) -> Response {
    // Templates keep label cardinality bounded (`/api/users/{id}/papers`)
    let endpoint = request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_owned())
        .unwrap_or_else(|| "unmatched".to_owned());
    let metrics = RequestMetrics::start(request.method().as_str(), &endpoint);

    let response = next.run(request).await;
    metrics.finish(response.status().as_u16());

    response
}

#[cfg(test)]
mod tests {
    use crate::test_support::{router_with, send};
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_unmatched_route_passes_through() {
        let (router, _) = router_with("").await;
        let (status, _) = send(&router, "GET", "/api/nope", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
