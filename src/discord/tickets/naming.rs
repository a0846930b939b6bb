// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/// Builds a ticket channel name from the configured prefix and the guild-specific ticket ID, padded to 4 digits.
pub fn channel_name(prefix: &str, guild_specific_id: i64) -> String {
	format!("{}-{:04}", prefix, guild_specific_id)
}

/// How a ticket is referred to in embeds and messages.
pub fn display_name(guild_specific_id: i64) -> String {
	format!("Ticket #{:04}", guild_specific_id)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn ids_are_zero_padded() {
		assert_eq!(channel_name("ticket", 7), "ticket-0007");
		assert_eq!(channel_name("closed", 42), "closed-0042");
	}

	#[test]
	fn long_ids_are_not_truncated() {
		assert_eq!(channel_name("ticket", 123456), "ticket-123456");
	}

	#[test]
	fn display_names() {
		assert_eq!(display_name(3), "Ticket #0003");
	}
}
