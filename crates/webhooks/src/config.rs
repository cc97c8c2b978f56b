use clap::Parser;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Parser, Clone, Debug, Serialize, Deserialize)]
#[command(author, version, about, long_about = None)]
pub struct Config {
	#[arg(long, env = "WEBHOOK_MAX_ATTEMPTS", default_value = "3", help = "Number of delivery attempts before a webhook event is abandoned")]
	pub max_attempts: u32,

	#[arg(
        long,
        env = "WEBHOOK_BASE_DELAY_MS",
        default_value = "1000",
        value_parser = parse_duration_ms,
        help = "Base delay before the first retry, doubled on each subsequent attempt"
    )]
	pub base_delay: Duration,

	#[arg(long, env = "WEBHOOK_BACKOFF_FACTOR", default_value = "2.0", help = "Multiplier applied to the delay after each failed attempt")]
	pub backoff_factor: f64,

	#[arg(long, env = "WEBHOOK_JITTER_RATIO", default_value = "0.2", help = "Fraction of the computed delay randomized in either direction")]
	pub jitter_ratio: f64,

	#[arg(
        long,
        env = "WEBHOOK_DELIVERY_TIMEOUT_SECS",
        default_value = "30",
        value_parser = parse_duration_secs,
        help = "Per-attempt HTTP delivery timeout"
    )]
	pub delivery_timeout: Duration,
}

impl Config {
	#[must_use]
	pub fn new() -> Self {
		Self::parse()
	}
}

impl Default for Config {
	fn default() -> Self {
		Self {
			max_attempts: 3,
			base_delay: Duration::from_secs(1),
			backoff_factor: 2.0,
			jitter_ratio: 0.2,
			delivery_timeout: Duration::from_secs(30),
		}
	}
}

#[cfg(test)]
impl Config {
	pub fn test() -> Self {
		Self {
			max_attempts: 2,
			base_delay: Duration::from_millis(5),
			backoff_factor: 2.0,
			jitter_ratio: 0.0,
			delivery_timeout: Duration::from_secs(5),
		}
	}
}

fn parse_duration_ms(s: &str) -> Result<Duration, std::num::ParseIntError> {
	s.parse::<u64>().map(Duration::from_millis)
}

fn parse_duration_secs(s: &str) -> Result<Duration, std::num::ParseIntError> {
	s.parse::<u64>().map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn defaults_match_documented_values() {
		let config = Config::default();
		assert_eq!(config.max_attempts, 3);
		assert_eq!(config.base_delay, Duration::from_secs(1));
		assert!((config.backoff_factor - 2.0).abs() < f64::EPSILON);
		assert!((config.jitter_ratio - 0.2).abs() < f64::EPSILON);
		assert_eq!(config.delivery_timeout, Duration::from_secs(30));
	}

	#[test]
	fn parses_from_cli_args() {
		let args = vec!["program", "--max-attempts", "5", "--base-delay-ms", "500", "--backoff-factor", "1.5", "--jitter-ratio", "0.1", "--delivery-timeout-secs", "10"];
		let config = Config::try_parse_from(args).unwrap();
		assert_eq!(config.max_attempts, 5);
		assert_eq!(config.base_delay, Duration::from_millis(500));
		assert!((config.backoff_factor - 1.5).abs() < f64::EPSILON);
		assert!((config.jitter_ratio - 0.1).abs() < f64::EPSILON);
		assert_eq!(config.delivery_timeout, Duration::from_secs(10));
	}
}
