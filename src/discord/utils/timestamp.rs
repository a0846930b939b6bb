// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use chrono::{DateTime, TimeZone, Utc};
use twilight_mention::fmt::Mention;
use twilight_mention::timestamp::{Timestamp as MentionTimestamp, TimestampStyle};
use twilight_model::util::datetime::{Timestamp, TimestampParseError};
use twilight_util::snowflake::Snowflake;

/// Gets the timestamp from the ID snowflake. If any failures occur in the conversion, returns `None`.
pub fn datetime_from_id(id: impl Snowflake) -> Option<DateTime<Utc>> {
	let timestamp = id.timestamp();
	Utc.timestamp_millis_opt(timestamp).single()
}

/// Gets the [DateTime] object for a timestamp from Discord. If any failures occur in the conversion, returns `None`.
pub fn datetime_from_timestamp(timestamp: &Timestamp) -> Option<DateTime<Utc>> {
	let micros = timestamp.as_micros();
	Utc.timestamp_micros(micros).single()
}

/// Gets a Discord [Timestamp] for embeds from a [DateTime].
pub fn timestamp_from_datetime(datetime: &DateTime<Utc>) -> Result<Timestamp, TimestampParseError> {
	Timestamp::from_micros(datetime.timestamp_micros())
}

/// Formats a time as a Discord timestamp mention, which each client displays in its own time zone.
pub fn discord_time(datetime: &DateTime<Utc>, style: TimestampStyle) -> String {
	let unix = datetime.timestamp().max(0) as u64;
	MentionTimestamp::new(unix, Some(style)).mention().to_string()
}

/// Describes when an infraction ends: a relative Discord timestamp, or "never" for permanent infractions.
pub fn describe_expiry(until: Option<&DateTime<Utc>>) -> String {
	match until {
		Some(until) => discord_time(until, TimestampStyle::RelativeTime),
		None => String::from("never"),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use twilight_model::id::Id;
	use twilight_model::id::marker::MessageMarker;

	#[test]
	fn id_timestamp_uses_discord_epoch() {
		// Snowflake 0 << 22 is the Discord epoch, 2015-01-01T00:00:00Z.
		let id: Id<MessageMarker> = Id::new(1 << 22);
		let datetime = datetime_from_id(id).unwrap();
		assert_eq!(datetime.timestamp_millis(), 1_420_070_400_001);
	}

	#[test]
	fn relative_mention_format() {
		let datetime = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
		assert_eq!(
			discord_time(&datetime, TimestampStyle::RelativeTime),
			"<t:1700000000:R>"
		);
	}

	#[test]
	fn permanent_expiry_reads_never() {
		assert_eq!(describe_expiry(None), "never");
	}
}
