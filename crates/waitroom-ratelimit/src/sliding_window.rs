use dashmap::DashMap;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// `Allow`/`Info`/`Reset` result: how many requests remain in the current
/// window and when the oldest counted request will fall out of it.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitInfo {
	pub limit: u32,
	pub remaining: u32,
	pub reset_after: Duration,
	pub allowed: bool,
}

struct Window {
	hits: VecDeque<Instant>,
}

impl Window {
	fn prune(&mut self, now: Instant, window: Duration) {
		while let Some(&front) = self.hits.front() {
			if now.duration_since(front) >= window {
				self.hits.pop_front();
			} else {
				break;
			}
		}
	}
}

/// Per-key sliding-window log. One entry per derived rate-limit key; a key
/// that has never been seen is treated as having a fresh, empty window.
pub struct SlidingWindowLimiter {
	window: Duration,
	windows: DashMap<String, Mutex<Window>>,
	/// Per-key `(limit, window)` overrides installed via `SetLimit`, consulted
	/// by `allow`/`info` ahead of the caller-supplied default.
	overrides: DashMap<String, (u32, Duration)>,
}

impl SlidingWindowLimiter {
	#[must_use]
	pub fn new(window: Duration) -> Self {
		Self {
			window,
			windows: DashMap::new(),
			overrides: DashMap::new(),
		}
	}

	#[must_use]
	pub fn per_minute() -> Self {
		Self::new(Duration::from_secs(60))
	}

	fn effective(&self, key: &str, limit: u32) -> (u32, Duration) {
		self.overrides.get(key).map_or((limit, self.window), |o| *o)
	}

	/// `Allow`: records a hit and reports whether it fits under `limit`.
	/// Requests that do not fit are still rejected, not recorded, so a
	/// client backing off does not get pushed further out by its own
	/// refused attempts.
	pub fn allow(&self, key: &str, limit: u32) -> RateLimitInfo {
		let (limit, window) = self.effective(key, limit);
		let now = Instant::now();
		let entry = self.windows.entry(key.to_string()).or_insert_with(|| Mutex::new(Window { hits: VecDeque::new() }));
		let mut guard = entry.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
		guard.prune(now, window);

		let count = guard.hits.len() as u32;
		let reset_after = guard.hits.front().map_or(Duration::ZERO, |&front| window.saturating_sub(now.duration_since(front)));

		if count < limit {
			guard.hits.push_back(now);
			RateLimitInfo {
				limit,
				remaining: limit - count - 1,
				reset_after: if guard.hits.len() == 1 { window } else { reset_after },
				allowed: true,
			}
		} else {
			RateLimitInfo {
				limit,
				remaining: 0,
				reset_after,
				allowed: false,
			}
		}
	}

	/// `Info`: current remaining count without recording a hit.
	#[must_use]
	pub fn info(&self, key: &str, limit: u32) -> RateLimitInfo {
		let (limit, window) = self.effective(key, limit);
		let now = Instant::now();
		let Some(entry) = self.windows.get(key) else {
			return RateLimitInfo {
				limit,
				remaining: limit,
				reset_after: Duration::ZERO,
				allowed: true,
			};
		};
		let mut guard = entry.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
		guard.prune(now, window);
		let count = guard.hits.len() as u32;
		let reset_after = guard.hits.front().map_or(Duration::ZERO, |&front| window.saturating_sub(now.duration_since(front)));
		RateLimitInfo {
			limit,
			remaining: limit.saturating_sub(count),
			reset_after,
			allowed: count < limit,
		}
	}

	/// `Reset`: clears a key's window, e.g. on operator override. Does not
	/// touch a `SetLimit` override, which has its own independent lifetime.
	pub fn reset(&self, key: &str) {
		self.windows.remove(key);
	}

	/// `SetLimit`: installs a per-key `(limit, window)` override that
	/// replaces the caller-supplied default for every subsequent
	/// `Allow`/`Info` call against `key`, until a later `set_limit` replaces
	/// it. Existing hit history for the key is preserved; only the ceiling
	/// it is checked against changes.
	pub fn set_limit(&self, key: &str, limit: u32, window: Duration) {
		self.overrides.insert(key.to_string(), (limit, window));
	}

	/// Removes a previously installed `SetLimit` override, reverting the key
	/// to the caller-supplied default limit and the limiter's default window.
	pub fn clear_limit(&self, key: &str) {
		self.overrides.remove(key);
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::thread::sleep;

	#[test]
	fn allows_up_to_the_limit_then_rejects() {
		let limiter = SlidingWindowLimiter::new(Duration::from_millis(200));
		for _ in 0..3 {
			let info = limiter.allow("k", 3);
			assert!(info.remaining < 3);
		}
		let info = limiter.allow("k", 3);
		assert_eq!(info.remaining, 0);
	}

	#[test]
	fn window_slides_and_frees_capacity() {
		let limiter = SlidingWindowLimiter::new(Duration::from_millis(50));
		assert_eq!(limiter.allow("k", 1).remaining, 0);
		assert_eq!(limiter.allow("k", 1).remaining, 0);
		sleep(Duration::from_millis(70));
		assert_eq!(limiter.allow("k", 1).remaining, 0, "should allow exactly one more after the window clears");
	}

	#[test]
	fn distinct_keys_do_not_share_a_budget() {
		let limiter = SlidingWindowLimiter::new(Duration::from_secs(1));
		limiter.allow("a", 1);
		let info_b = limiter.allow("b", 1);
		assert_eq!(info_b.remaining, 0);
	}

	#[test]
	fn reset_clears_the_window() {
		let limiter = SlidingWindowLimiter::new(Duration::from_secs(60));
		limiter.allow("k", 1);
		assert_eq!(limiter.info("k", 1).remaining, 0);
		limiter.reset("k");
		assert_eq!(limiter.info("k", 1).remaining, 1);
	}

	#[test]
	fn set_limit_overrides_the_caller_supplied_default() {
		let limiter = SlidingWindowLimiter::new(Duration::from_secs(60));
		limiter.set_limit("premium-tenant", 5, Duration::from_secs(60));

		for _ in 0..5 {
			assert!(limiter.allow("premium-tenant", 1).allowed, "override limit of 5 should win over the default of 1");
		}
		assert!(!limiter.allow("premium-tenant", 1).allowed);
	}

	#[test]
	fn clear_limit_reverts_to_the_caller_supplied_default() {
		let limiter = SlidingWindowLimiter::new(Duration::from_secs(60));
		limiter.set_limit("k", 10, Duration::from_secs(60));
		limiter.clear_limit("k");
		assert_eq!(limiter.info("k", 1).remaining, 1);
	}
}
