//! Axum router assembly and the TCP accept loop.

use crate::config::Config;
use crate::http::handlers::{queues, sessions, websocket};
use crate::http::state::AppState;
use axum::extract::{ConnectInfo, MatchedPath, State};
use axum::http::Request;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post};
use axum::Router;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use waitroom_ratelimit::{rate_limit_middleware, Endpoint, RateLimitKey};

fn endpoint_for(path: &str) -> Endpoint {
	if path.ends_with("/sessions") {
		Endpoint::Enqueue
	} else if path.ends_with("/release") {
		Endpoint::Release
	} else if path.ends_with("/availability") {
		Endpoint::Analytics
	} else if path.starts_with("/api/v1/queues") && !path.contains("/sessions") {
		Endpoint::TenantAdmin
	} else {
		Endpoint::Default
	}
}

async fn rate_limit_entry(State(app): State<AppState>, ConnectInfo(addr): ConnectInfo<SocketAddr>, matched: Option<MatchedPath>, request: Request<axum::body::Body>, next: Next) -> Response {
	let endpoint = matched.as_ref().map_or(Endpoint::Default, |m| endpoint_for(m.as_str()));

	let key = match request.headers().get(app.config.tenant_key_header.as_str()) {
		Some(value) => value.to_str().ok().map(|key| RateLimitKey::Tenant(key.to_string())),
		None => Some(RateLimitKey::Ip(addr.ip().to_string())),
	};

	rate_limit_middleware(app.rate_limit.clone(), endpoint, key, request, next).await
}

fn api_router(app: AppState) -> Router<AppState> {
	Router::new()
		.route("/queues", get(queues::list).post(queues::create))
		.route("/queues/:queue_id", get(queues::get).patch(queues::update).delete(queues::delete))
		.route("/queues/:queue_id/activate", post(queues::activate))
		.route("/queues/:queue_id/deactivate", post(queues::deactivate))
		.route("/queues/:queue_id/schedule", post(queues::set_schedule))
		.route("/queues/:queue_id/availability", get(queues::availability))
		.route("/queues/:queue_id/sessions", post(sessions::enqueue))
		.route("/queues/:queue_id/sessions/release", post(sessions::release))
		.route("/queues/:queue_id/sessions/:user_identifier", get(sessions::get_user).delete(sessions::drop_user))
		.route("/queues/:queue_id/sessions/:user_identifier/complete", post(sessions::complete_user))
		.layer(middleware::from_fn_with_state(app, rate_limit_entry))
}

fn router(app: AppState) -> Router {
	Router::new()
		.nest("/api/v1", api_router(app.clone()))
		.route("/queuehub", get(websocket::upgrade))
		.route("/healthz", get(|| async { "ok" }))
		.layer(TraceLayer::new_for_http())
		.layer(CorsLayer::permissive())
		.with_state(app)
}

pub async fn serve(config: &Config, app: AppState) -> anyhow::Result<()> {
	let listener = TcpListener::bind(config.bind_addr()).await?;
	tracing::info!(addr = %listener.local_addr()?, "listening");
	axum::serve(listener, router(app).into_make_service_with_connect_info::<SocketAddr>()).await?;
	Ok(())
}
