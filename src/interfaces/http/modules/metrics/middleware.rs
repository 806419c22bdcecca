//! Per-request counters and latency histogram

use std::time::Instant;

use axum::{body::Body, extract::MatchedPath, http::Request, middleware::Next, response::Response};

/// Records `http_requests_total{method,path,status}` and
/// `http_request_duration_seconds{method,path}`.
///
/// `path` is the route template (`/api/users/{id}/`), never the raw URI, so
/// ids do not become label values. Unrouted requests share one label.
pub async fn http_metrics_middleware(request: Request<Body>, next: Next) -> Response {
    let method = request.method().to_string();
    let path = route_label(request.extensions().get::<MatchedPath>());

    let start = Instant::now();
    let response = next.run(request).await;
    let elapsed = start.elapsed().as_secs_f64();

    let status = response.status().as_u16().to_string();

    metrics::counter!(
        "http_requests_total",
        "method" => method.clone(),
        "path" => path.clone(),
        "status" => status
    )
    .increment(1);
    metrics::histogram!("http_request_duration_seconds", "method" => method, "path" => path)
        .record(elapsed);

    response
}

fn route_label(matched: Option<&MatchedPath>) -> String {
    matched
        .map(|mp| mp.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string())
}
