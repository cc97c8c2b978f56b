pub mod config;
pub mod error;
pub mod key;
pub mod middleware;
pub mod sliding_window;

pub use config::{Endpoint, RateLimitConfig};
pub use error::RateLimitError;
pub use key::RateLimitKey;
pub use middleware::{rate_limit_middleware, RateLimitState};
pub use sliding_window::{RateLimitInfo, SlidingWindowLimiter};
