// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use chrono::{DateTime, Utc};

/// What happens to an active infraction's expiry when the same infraction is applied again.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ExpiryMerge {
	/// The infraction now ends at the contained time (`None` is permanent).
	Extended(Option<DateTime<Utc>>),
	/// The infraction already lasts at least as long as requested.
	Unchanged,
}

/// Merges a requested expiry into an existing one. Permanent beats timed and later beats earlier.
pub fn merge_expiry(existing: Option<DateTime<Utc>>, requested: Option<DateTime<Utc>>) -> ExpiryMerge {
	match (existing, requested) {
		(None, _) => ExpiryMerge::Unchanged,
		(Some(_), None) => ExpiryMerge::Extended(None),
		(Some(existing), Some(requested)) if requested > existing => ExpiryMerge::Extended(Some(requested)),
		(Some(_), Some(_)) => ExpiryMerge::Unchanged,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::{Duration, TimeZone};

	fn at(hours: i64) -> DateTime<Utc> {
		Utc.timestamp_opt(1_700_000_000, 0).unwrap() + Duration::hours(hours)
	}

	#[test]
	fn later_expiry_extends() {
		assert_eq!(merge_expiry(Some(at(1)), Some(at(5))), ExpiryMerge::Extended(Some(at(5))));
	}

	#[test]
	fn earlier_or_equal_expiry_is_ignored() {
		assert_eq!(merge_expiry(Some(at(5)), Some(at(1))), ExpiryMerge::Unchanged);
		assert_eq!(merge_expiry(Some(at(5)), Some(at(5))), ExpiryMerge::Unchanged);
	}

	#[test]
	fn permanent_wins() {
		assert_eq!(merge_expiry(Some(at(5)), None), ExpiryMerge::Extended(None));
		assert_eq!(merge_expiry(None, Some(at(500))), ExpiryMerge::Unchanged);
		assert_eq!(merge_expiry(None, None), ExpiryMerge::Unchanged);
	}
}
