/// The two key derivations the limiter recognizes: a tenant acting through
/// its API key, or a bare remote IP for unauthenticated traffic.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RateLimitKey {
	Tenant(String),
	Ip(String),
}

impl RateLimitKey {
	#[must_use]
	pub fn as_string(&self) -> String {
		match self {
			Self::Tenant(id) => format!("tenant:{id}"),
			Self::Ip(ip) => format!("ip:{ip}"),
		}
	}
}
