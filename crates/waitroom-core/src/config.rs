use clap::Parser;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Parser, Clone, Debug, Serialize, Deserialize)]
#[command(author, version, about, long_about = None)]
pub struct Config {
	#[arg(
        long,
        env = "CONTROLLER_TICK_INTERVAL_MS",
        default_value = "1000",
        value_parser = parse_duration_ms,
        help = "Release controller tick cadence in milliseconds"
    )]
	pub tick_interval: Duration,

	#[arg(long, env = "DEFAULT_MAX_CONCURRENT_USERS", default_value = "500", help = "Default cap applied to queues with no explicit override")]
	pub default_max_concurrent_users: u32,

	#[arg(long, env = "DEFAULT_RELEASE_RATE_PER_MINUTE", default_value = "10", help = "Default steady-state exit-token emission ceiling, in sessions per minute")]
	pub default_release_rate_per_minute: u32,
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
			tick_interval: Duration::from_millis(1000),
			default_max_concurrent_users: 500,
			default_release_rate_per_minute: 10,
		}
	}
}

#[cfg(test)]
impl Config {
	pub fn test() -> Self {
		Self {
			tick_interval: Duration::from_millis(10),
			default_max_concurrent_users: 5,
			default_release_rate_per_minute: 2,
		}
	}
}

fn parse_duration_ms(s: &str) -> Result<Duration, std::num::ParseIntError> {
	s.parse::<u64>().map(Duration::from_millis)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn defaults_match_documented_values() {
		let config = Config::default();
		assert_eq!(config.tick_interval, Duration::from_millis(1000));
		assert_eq!(config.default_max_concurrent_users, 500);
		assert_eq!(config.default_release_rate_per_minute, 10);
	}

	#[test]
	fn parses_from_cli_args() {
		let args = vec!["program", "--tick-interval", "250", "--default-max-concurrent-users", "100", "--default-release-rate-per-minute", "5"];
		let config = Config::try_parse_from(args).unwrap();
		assert_eq!(config.tick_interval, Duration::from_millis(250));
		assert_eq!(config.default_max_concurrent_users, 100);
		assert_eq!(config.default_release_rate_per_minute, 5);
	}
}
