use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! uuid_id {
	($name:ident) => {
		#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
		#[serde(transparent)]
		pub struct $name(pub Uuid);

		impl $name {
			#[must_use]
			pub fn new() -> Self {
				Self(Uuid::new_v4())
			}

			#[must_use]
			pub const fn from_uuid(id: Uuid) -> Self {
				Self(id)
			}
		}

		impl Default for $name {
			fn default() -> Self {
				Self::new()
			}
		}

		impl fmt::Display for $name {
			fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
				write!(f, "{}", self.0)
			}
		}

		impl std::str::FromStr for $name {
			type Err = uuid::Error;

			fn from_str(s: &str) -> Result<Self, Self::Err> {
				Ok(Self(Uuid::parse_str(s)?))
			}
		}
	};
}

uuid_id!(TenantId);
uuid_id!(QueueId);
uuid_id!(SessionId);

#[cfg(test)]
mod tests {
	use super::*;
	use std::str::FromStr;

	#[test]
	fn roundtrips_through_string() {
		let id = TenantId::new();
		let parsed = TenantId::from_str(&id.to_string()).unwrap();
		assert_eq!(id, parsed);
	}

	#[test]
	fn distinct_id_types_do_not_coerce() {
		let tenant = TenantId::new();
		let queue = QueueId::from_uuid(tenant.0);
		assert_eq!(tenant.0, queue.0);
	}
}
