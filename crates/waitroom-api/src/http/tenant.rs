//! Tenant resolution: `X-Tenant-Key` header first, falling back to a
//! host-based domain lookup. Never trust a client-supplied tenant id in the
//! request body or path — every handler that needs a tenant goes through
//! this extractor instead.

use crate::http::error::Error;
use crate::http::state::AppState;
use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use waitroom_core::model::Tenant;

pub struct TenantContext(pub Tenant);

#[async_trait]
impl FromRequestParts<AppState> for TenantContext {
	type Rejection = Error;

	async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
		let tenant = resolve(parts, state)?;
		if !tenant.active {
			return Err(Error::Forbidden("tenant is deactivated".to_string()));
		}
		Ok(Self(tenant))
	}
}

fn resolve(parts: &Parts, state: &AppState) -> Result<Tenant, Error> {
	if let Some(value) = parts.headers.get(state.config.tenant_key_header.as_str()) {
		let key = value.to_str().map_err(|_| Error::Unauthorized("invalid tenant key header".to_string()))?;
		return state.tenants.get_by_key(key).ok_or_else(|| Error::Unauthorized("unknown tenant key".to_string()));
	}

	if let Some(host) = parts.headers.get(axum::http::header::HOST) {
		let host = host.to_str().map_err(|_| Error::Unauthorized("invalid host header".to_string()))?;
		let host = host.split(':').next().unwrap_or(host);
		return state.tenants.get_by_domain(host).ok_or_else(|| Error::Unauthorized("unresolvable tenant domain".to_string()));
	}

	Err(Error::Unauthorized("missing tenant context".to_string()))
}
