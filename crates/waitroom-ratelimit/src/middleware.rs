use crate::config::{Endpoint, RateLimitConfig};
use crate::key::RateLimitKey;
use crate::sliding_window::SlidingWindowLimiter;
use axum::body::Body;
use axum::http::{HeaderValue, Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use std::sync::Arc;
use std::time::Duration;

pub struct RateLimitState {
	pub limiter: SlidingWindowLimiter,
	pub config: RateLimitConfig,
}

impl RateLimitState {
	#[must_use]
	pub fn new(config: RateLimitConfig) -> Self {
		Self {
			limiter: SlidingWindowLimiter::per_minute(),
			config,
		}
	}

	/// Installs a per-key limit override, e.g. for a tenant on a negotiated
	/// plan. Takes effect on the key's next `Allow`/`Info` call.
	pub fn set_limit(&self, key: &RateLimitKey, limit: u32, window: Duration) {
		self.limiter.set_limit(&key.as_string(), limit, window);
	}

	/// Reverts a key to the endpoint's configured default limit.
	pub fn clear_limit(&self, key: &RateLimitKey) {
		self.limiter.clear_limit(&key.as_string());
	}
}

/// Axum middleware applying the sliding-window limiter for one `endpoint`.
/// A lookup failure in the key extension (no tenant/ip attached upstream)
/// fails open, matching the component's stated fail-open behavior on
/// backend failure: an unidentifiable caller is let through rather than
/// blocked by a limiter bug.
pub async fn rate_limit_middleware(state: Arc<RateLimitState>, endpoint: Endpoint, key: Option<RateLimitKey>, request: Request<Body>, next: Next) -> Response {
	let Some(key) = key else {
		return next.run(request).await;
	};

	let limit = state.config.limit_for(endpoint);
	let info = state.limiter.allow(&key.as_string(), limit);

	if !info.allowed {
		let mut response = StatusCode::TOO_MANY_REQUESTS.into_response();
		let headers = response.headers_mut();
		insert_header(headers, "retry-after", info.reset_after.as_secs().to_string());
		insert_header(headers, "x-ratelimit-limit", limit.to_string());
		insert_header(headers, "x-ratelimit-remaining", "0".to_string());
		insert_header(headers, "x-ratelimit-reset", info.reset_after.as_secs().to_string());
		return response;
	}

	let mut response = next.run(request).await;
	let headers = response.headers_mut();
	insert_header(headers, "x-ratelimit-limit", limit.to_string());
	insert_header(headers, "x-ratelimit-remaining", info.remaining.to_string());
	insert_header(headers, "x-ratelimit-reset", info.reset_after.as_secs().to_string());
	response
}

fn insert_header(headers: &mut axum::http::HeaderMap, name: &'static str, value: String) {
	if let Ok(value) = HeaderValue::from_str(&value) {
		headers.insert(name, value);
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::config::RateLimitConfig;
	use axum::routing::get;
	use axum::Router;
	use tower::ServiceExt;

	fn router_with_limit_of_one() -> Router {
		let config = RateLimitConfig {
			default_per_min: 1,
			..RateLimitConfig::default()
		};
		let state = Arc::new(RateLimitState::new(config));

		Router::new().route("/ping", get(|| async { "pong" })).layer(axum::middleware::from_fn(move |request: Request<Body>, next: Next| {
			let state = state.clone();
			async move { rate_limit_middleware(state, Endpoint::Default, Some(RateLimitKey::Ip("203.0.113.5".to_string())), request, next).await }
		}))
	}

	#[tokio::test]
	async fn first_request_is_allowed_and_carries_ratelimit_headers() {
		let app = router_with_limit_of_one();
		let response = app.oneshot(Request::builder().uri("/ping").body(Body::empty()).unwrap()).await.unwrap();
		assert_eq!(response.status(), StatusCode::OK);
		assert_eq!(response.headers().get("x-ratelimit-remaining").unwrap(), "0");
	}

	#[tokio::test]
	async fn exhausted_limit_responds_429_with_retry_after() {
		let app = router_with_limit_of_one();
		let first = app.clone().oneshot(Request::builder().uri("/ping").body(Body::empty()).unwrap()).await.unwrap();
		assert_eq!(first.status(), StatusCode::OK);

		let second = app.oneshot(Request::builder().uri("/ping").body(Body::empty()).unwrap()).await.unwrap();
		assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
		assert!(second.headers().get("retry-after").is_some(), "a 429 must carry a retry-after header");
		assert_eq!(second.headers().get("x-ratelimit-remaining").unwrap(), "0");
	}
}
