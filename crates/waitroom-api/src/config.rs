use clap::Parser;
use serde::{Deserialize, Serialize};
use waitroom_core::config::Config as EngineConfig;
use waitroom_ratelimit::RateLimitConfig;
use webhooks::Config as WebhookConfig;

#[derive(Parser, Clone, Debug, Serialize, Deserialize)]
#[command(author, version, about, long_about = None)]
pub struct Config {
	/// Use JSON formatting for tracing
	#[arg(long, env = "LOG_JSON", default_value = "false")]
	pub log_json: bool,

	#[arg(long, env = "RUST_LOG", default_value = "info")]
	pub rust_log: Option<String>,

	#[arg(long, env = "HOST", default_value = "127.0.0.1")]
	pub host: String,

	#[arg(long, env = "PORT", default_value = "8000")]
	pub port: u16,

	/// Header carrying a tenant's API key, tried before falling back to
	/// host-based domain lookup.
	#[arg(long, env = "TENANT_KEY_HEADER", default_value = "X-Tenant-Key")]
	pub tenant_key_header: String,

	/// TTL for the KV position cache (`position:{queue}:{user_identifier}`).
	#[arg(long, env = "POSITION_CACHE_TTL_SECS", default_value = "30")]
	pub position_cache_ttl_secs: u64,

	#[command(flatten)]
	pub engine: EngineConfig,

	#[command(flatten)]
	pub rate_limit: RateLimitConfig,

	#[command(flatten)]
	pub webhooks: WebhookConfig,
}

impl Config {
	#[must_use]
	pub fn new() -> Self {
		Self::parse()
	}

	#[must_use]
	pub fn bind_addr(&self) -> String {
		format!("{}:{}", self.host, self.port)
	}
}

impl Default for Config {
	fn default() -> Self {
		Self {
			log_json: false,
			rust_log: Some("info".to_string()),
			host: "127.0.0.1".to_string(),
			port: 8000,
			tenant_key_header: "X-Tenant-Key".to_string(),
			position_cache_ttl_secs: 30,
			engine: EngineConfig::default(),
			rate_limit: RateLimitConfig::default(),
			webhooks: WebhookConfig::default(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn bind_addr_combines_host_and_port() {
		let config = Config::default();
		assert_eq!(config.bind_addr(), "127.0.0.1:8000");
	}
}
