use thiserror::Error;

#[derive(Error, Debug)]
pub enum RateLimitError {
	#[error("rate limit exceeded, retry after {retry_after_secs}s")]
	Limited { retry_after_secs: u64 },
}
