//! Response caching middleware for the global listing.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{Method, Request},
    middleware::Next,
    response::Response,
};
use tracing::{debug, instrument, warn};

use super::store::{PageCache, buffer_response, should_store_response};

/// Serve a stored page while it is fresh, otherwise render and store it.
///
/// Only GET requests are considered. The key is built from the request path
/// and query string alone, so every visitor inside the TTL window receives
/// the same bytes.
#[instrument(skip_all, fields(path = %request.uri().path()))]
pub async fn page_cache_layer(
    State(cache): State<Arc<PageCache>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if request.method() != Method::GET {
        return next.run(request).await;
    }

    let key = cache.key_for(request.uri().path(), request.uri().query());

    if let Some(cached) = cache.get(&key) {
        return cached.into_response();
    }

    let response = next.run(request).await;
    if !should_store_response(&response) {
        debug!(
            target: "jotter::cache",
            status = response.status().as_u16(),
            "response not cacheable"
        );
        return response;
    }

    match buffer_response(response).await {
        Ok((response, cached)) => {
            cache.put(key, cached);
            response
        }
        Err((response, error)) => {
            warn!(target: "jotter::cache", error = %error, "failed to buffer response for caching");
            response
        }
    }
}
