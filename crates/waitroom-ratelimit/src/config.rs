use clap::Parser;
use serde::{Deserialize, Serialize};

/// The request classes the limiter distinguishes. Each carries its own
/// per-minute default; an endpoint with no explicit override falls back to
/// [`Endpoint::Default`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
	Enqueue,
	Release,
	Analytics,
	TenantAdmin,
	Default,
}

#[derive(Parser, Clone, Debug, Serialize, Deserialize)]
#[command(author, version, about, long_about = None)]
pub struct RateLimitConfig {
	#[arg(long, env = "RATE_LIMIT_ENQUEUE_PER_MIN", default_value = "100")]
	pub enqueue_per_min: u32,

	#[arg(long, env = "RATE_LIMIT_RELEASE_PER_MIN", default_value = "50")]
	pub release_per_min: u32,

	#[arg(long, env = "RATE_LIMIT_ANALYTICS_PER_MIN", default_value = "20")]
	pub analytics_per_min: u32,

	#[arg(long, env = "RATE_LIMIT_TENANT_ADMIN_PER_MIN", default_value = "10")]
	pub tenant_admin_per_min: u32,

	#[arg(long, env = "RATE_LIMIT_DEFAULT_PER_MIN", default_value = "200")]
	pub default_per_min: u32,
}

impl RateLimitConfig {
	#[must_use]
	pub fn new() -> Self {
		Self::parse()
	}

	#[must_use]
	pub const fn limit_for(&self, endpoint: Endpoint) -> u32 {
		match endpoint {
			Endpoint::Enqueue => self.enqueue_per_min,
			Endpoint::Release => self.release_per_min,
			Endpoint::Analytics => self.analytics_per_min,
			Endpoint::TenantAdmin => self.tenant_admin_per_min,
			Endpoint::Default => self.default_per_min,
		}
	}
}

impl Default for RateLimitConfig {
	fn default() -> Self {
		Self {
			enqueue_per_min: 100,
			release_per_min: 50,
			analytics_per_min: 20,
			tenant_admin_per_min: 10,
			default_per_min: 200,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn documented_defaults() {
		let config = RateLimitConfig::default();
		assert_eq!(config.limit_for(Endpoint::Enqueue), 100);
		assert_eq!(config.limit_for(Endpoint::Release), 50);
		assert_eq!(config.limit_for(Endpoint::Analytics), 20);
		assert_eq!(config.limit_for(Endpoint::TenantAdmin), 10);
		assert_eq!(config.limit_for(Endpoint::Default), 200);
	}
}
