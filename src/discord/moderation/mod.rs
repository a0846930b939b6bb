// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Bans and mutes. Each is persisted as an [crate::model::Infraction]; at most one of each kind is active per member,
//! and applying one again only ever makes it last longer.

use miette::Diagnostic;
use std::fmt;

mod actions;
mod expiry;
mod infractions;
mod log;

pub use actions::{ban, lift_expired, mute, reapply_mute, unban, unmute};
pub use infractions::{RecordOutcome, expired_infractions, find_active, lift_active};
pub use log::{LogEntry, report};

#[derive(Debug)]
pub enum ModerationError {
	NoMuteRole,
	NotFound,
	NotAuthorized,
	InvalidTarget(&'static str),
	Internal(miette::Report),
}

impl fmt::Display for ModerationError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::NoMuteRole => write!(
				f,
				"No mute role is set up on this server. Use `/admin-util module moderation` to set one."
			),
			Self::NotFound => write!(f, "That user doesn't have an active infraction of that kind."),
			Self::NotAuthorized => write!(f, "You don't have permission to moderate members."),
			Self::InvalidTarget(reason) => write!(f, "{}", reason),
			Self::Internal(report) => write!(f, "{}", report),
		}
	}
}

impl std::error::Error for ModerationError {}

impl Diagnostic for ModerationError {}

impl From<miette::Report> for ModerationError {
	fn from(report: miette::Report) -> Self {
		Self::Internal(report)
	}
}

impl ModerationError {
	/// Splits user-facing errors from internal ones. Internal errors are returned as the outer error.
	pub fn into_user_message(self) -> miette::Result<String> {
		match self {
			Self::Internal(report) => Err(report),
			error => Ok(error.to_string()),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn missing_mute_role_points_to_setup() {
		let message = ModerationError::NoMuteRole.into_user_message().unwrap();
		assert!(message.contains("/admin-util module moderation"));
	}

	#[test]
	fn internal_errors_stay_errors() {
		let error = ModerationError::from(miette::miette!("connection refused"));
		assert!(error.into_user_message().is_err());
	}
}
