// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use chrono::Duration;
use std::fmt;

/// Parses durations written like `30m`, `1h30m`, `2w 3d`. Units: `s`, `m`, `h`, `d`, `w`.
pub fn parse_duration(input: &str) -> Result<Duration, DurationParseError> {
	let mut total = Duration::zero();
	let mut number = String::new();
	let mut saw_component = false;

	for character in input.chars() {
		if character.is_ascii_digit() {
			number.push(character);
			continue;
		}
		if character.is_whitespace() {
			continue;
		}
		if number.is_empty() {
			return Err(DurationParseError::Invalid);
		}
		let amount: i64 = number.parse().map_err(|_| DurationParseError::TooLong)?;
		number.clear();
		let component = match character.to_ascii_lowercase() {
			's' => Duration::try_seconds(amount),
			'm' => Duration::try_minutes(amount),
			'h' => Duration::try_hours(amount),
			'd' => Duration::try_days(amount),
			'w' => Duration::try_weeks(amount),
			_ => return Err(DurationParseError::Invalid),
		};
		let component = component.ok_or(DurationParseError::TooLong)?;
		total = total.checked_add(&component).ok_or(DurationParseError::TooLong)?;
		saw_component = true;
	}

	if !number.is_empty() || !saw_component {
		return Err(DurationParseError::Invalid);
	}
	if total <= Duration::zero() {
		return Err(DurationParseError::Empty);
	}
	Ok(total)
}

#[derive(Debug, Eq, PartialEq)]
pub enum DurationParseError {
	Invalid,
	Empty,
	TooLong,
}

impl fmt::Display for DurationParseError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Invalid => write!(
				f,
				"That isn't a valid duration. Use a number followed by a unit (s, m, h, d, w), like `1d12h`."
			),
			Self::Empty => write!(f, "The duration must be longer than zero."),
			Self::TooLong => write!(f, "That duration is too long."),
		}
	}
}

impl std::error::Error for DurationParseError {}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn combined_units() {
		assert_eq!(
			parse_duration("1d12h30m").unwrap(),
			Duration::days(1) + Duration::hours(12) + Duration::minutes(30)
		);
	}

	#[test]
	fn whitespace_and_case_are_ignored() {
		assert_eq!(parse_duration("2W 3D").unwrap(), Duration::weeks(2) + Duration::days(3));
	}

	#[test]
	fn bare_numbers_are_rejected() {
		assert_eq!(parse_duration("15"), Err(DurationParseError::Invalid));
		assert_eq!(parse_duration("h"), Err(DurationParseError::Invalid));
		assert_eq!(parse_duration(""), Err(DurationParseError::Invalid));
	}

	#[test]
	fn unknown_units_are_rejected() {
		assert_eq!(parse_duration("3y"), Err(DurationParseError::Invalid));
	}

	#[test]
	fn zero_is_rejected() {
		assert_eq!(parse_duration("0m"), Err(DurationParseError::Empty));
	}

	#[test]
	fn overflow_is_reported() {
		assert_eq!(parse_duration("99999999999999999w"), Err(DurationParseError::TooLong));
	}
}
