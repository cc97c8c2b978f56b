//! Clock & schedule evaluator. Half-open `[start, end)` recurring weekly
//! windows evaluated against a named IANA timezone. A schedule with no
//! timezone match is treated as unavailable, which evaluates as closed.

use crate::model::Schedule;
use chrono::{DateTime, Datelike, Timelike, Utc};
use chrono_tz::Tz;
use std::str::FromStr;

const DAY_KEYS: [&str; 7] = ["sun", "mon", "tue", "wed", "thu", "fri", "sat"];

fn day_key(weekday: chrono::Weekday) -> &'static str {
	DAY_KEYS[weekday.num_days_from_sunday() as usize]
}

fn minutes_of_day(hour: u32, minute: u32) -> u32 {
	hour * 60 + minute
}

/// `true` when `now` falls inside one of `schedule`'s windows for its own
/// weekday, evaluated in `schedule.timezone`. A schedule with no windows at
/// all is considered always active (no restriction configured); a missing
/// timezone is unavailable and therefore closed.
#[must_use]
pub fn is_active(schedule: &Schedule, now: DateTime<Utc>) -> bool {
	let Ok(tz) = Tz::from_str(&schedule.timezone) else {
		return false;
	};
	if schedule.windows.is_empty() {
		return true;
	}
	let local = now.with_timezone(&tz);
	let key = day_key(local.weekday());
	let Some(windows) = schedule.windows.get(key) else {
		return false;
	};
	let current = minutes_of_day(local.hour(), local.minute());
	windows.iter().any(|w| {
		let start = minutes_of_day(w.start.0, w.start.1);
		let end = minutes_of_day(w.end.0, w.end.1);
		current >= start && current < end
	})
}

/// Next instant (at minute resolution) at or after `now` when `is_active`
/// would return `true`. Scans up to 8 days forward; `None` if the schedule
/// is unavailable (bad timezone) or has no windows that ever activate.
#[must_use]
pub fn next_activation(schedule: &Schedule, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
	let Ok(tz) = Tz::from_str(&schedule.timezone) else {
		return None;
	};
	if schedule.windows.is_empty() {
		return Some(now);
	}
	let mut cursor = now.with_timezone(&tz);
	for _ in 0..(8 * 24 * 60) {
		let key = day_key(cursor.weekday());
		let current = minutes_of_day(cursor.hour(), cursor.minute());
		if let Some(windows) = schedule.windows.get(key) {
			if windows.iter().any(|w| {
				let start = minutes_of_day(w.start.0, w.start.1);
				let end = minutes_of_day(w.end.0, w.end.1);
				current >= start && current < end
			}) {
				return Some(cursor.with_timezone(&Utc));
			}
		}
		cursor += chrono::Duration::minutes(1);
	}
	None
}

/// Previous instant at or before `now` when `is_active` would have returned
/// `true`. Mirrors [`next_activation`] scanning backward.
#[must_use]
pub fn prev_activation(schedule: &Schedule, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
	let Ok(tz) = Tz::from_str(&schedule.timezone) else {
		return None;
	};
	if schedule.windows.is_empty() {
		return Some(now);
	}
	let mut cursor = now.with_timezone(&tz);
	for _ in 0..(8 * 24 * 60) {
		let key = day_key(cursor.weekday());
		let current = minutes_of_day(cursor.hour(), cursor.minute());
		if let Some(windows) = schedule.windows.get(key) {
			if windows.iter().any(|w| {
				let start = minutes_of_day(w.start.0, w.start.1);
				let end = minutes_of_day(w.end.0, w.end.1);
				current >= start && current < end
			}) {
				return Some(cursor.with_timezone(&Utc));
			}
		}
		cursor -= chrono::Duration::minutes(1);
	}
	None
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::model::DayWindow;
	use chrono::TimeZone;
	use std::collections::HashMap;

	fn weekday_9_to_5() -> Schedule {
		let mut windows = HashMap::new();
		for day in ["mon", "tue", "wed", "thu", "fri"] {
			windows.insert(day.to_string(), vec![DayWindow { start: (9, 0), end: (17, 0) }]);
		}
		Schedule {
			timezone: "America/New_York".to_string(),
			windows,
		}
	}

	#[test]
	fn active_inside_window() {
		let schedule = weekday_9_to_5();
		// Wednesday 2026-07-22 is a weekday; 14:00 UTC is 10:00 EDT.
		let now = Utc.with_ymd_and_hms(2026, 7, 22, 14, 0, 0).unwrap();
		assert!(is_active(&schedule, now));
	}

	#[test]
	fn closed_outside_window() {
		let schedule = weekday_9_to_5();
		let now = Utc.with_ymd_and_hms(2026, 7, 22, 2, 0, 0).unwrap();
		assert!(!is_active(&schedule, now));
	}

	#[test]
	fn closed_on_unconfigured_day() {
		let schedule = weekday_9_to_5();
		// 2026-07-25 is a Saturday.
		let now = Utc.with_ymd_and_hms(2026, 7, 25, 14, 0, 0).unwrap();
		assert!(!is_active(&schedule, now));
	}

	#[test]
	fn unknown_timezone_is_unavailable_and_closed() {
		let mut schedule = weekday_9_to_5();
		schedule.timezone = "Not/A_Zone".to_string();
		let now = Utc.with_ymd_and_hms(2026, 7, 22, 14, 0, 0).unwrap();
		assert!(!is_active(&schedule, now));
		assert!(next_activation(&schedule, now).is_none());
	}

	#[test]
	fn no_windows_means_always_active() {
		let schedule = Schedule {
			timezone: "UTC".to_string(),
			windows: HashMap::new(),
		};
		let now = Utc.with_ymd_and_hms(2026, 7, 25, 2, 0, 0).unwrap();
		assert!(is_active(&schedule, now));
	}

	#[test]
	fn next_activation_finds_the_following_monday() {
		let schedule = weekday_9_to_5();
		// Saturday 2026-07-25 at noon UTC: next window starts Monday 2026-07-27.
		let now = Utc.with_ymd_and_hms(2026, 7, 25, 12, 0, 0).unwrap();
		let next = next_activation(&schedule, now).unwrap();
		assert!(is_active(&schedule, next));
		assert!(next > now);
	}
}
