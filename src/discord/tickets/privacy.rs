// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::discord::utils::permissions::member_guild_permissions;
use twilight_http::client::Client;
use twilight_model::guild::Permissions;
use twilight_model::id::Id;
use twilight_model::id::marker::{GuildMarker, UserMarker};

/// A member added to a ticket and whether they administrate the guild.
#[derive(Clone, Copy, Debug)]
pub struct AddedMember {
	pub user: Id<UserMarker>,
	pub is_admin: bool,
}

/// A ticket is private when everyone added to it is either its owner or an administrator. Tickets nobody was added
/// to are not private.
pub fn is_private(owner: Id<UserMarker>, added_members: &[AddedMember]) -> bool {
	if added_members.is_empty() {
		return false;
	}
	added_members
		.iter()
		.all(|member| member.user == owner || member.is_admin)
}

/// Looks up each added user's permissions and classifies the ticket. Users who have left the guild count as
/// non-administrators.
pub async fn classify(
	http_client: &Client,
	guild_id: Id<GuildMarker>,
	owner: Id<UserMarker>,
	added_users: &[Id<UserMarker>],
) -> miette::Result<bool> {
	let mut added_members = Vec::with_capacity(added_users.len());
	for user in added_users.iter().copied() {
		let is_admin = if user == owner {
			false
		} else {
			member_guild_permissions(http_client, guild_id, user)
				.await?
				.contains(Permissions::ADMINISTRATOR)
		};
		added_members.push(AddedMember { user, is_admin });
	}
	Ok(is_private(owner, &added_members))
}

#[cfg(test)]
mod tests {
	use super::*;

	fn member(id: u64, is_admin: bool) -> AddedMember {
		AddedMember {
			user: Id::new(id),
			is_admin,
		}
	}

	#[test]
	fn only_admins_added_is_private() {
		assert!(is_private(Id::new(1), &[member(2, true), member(3, true)]));
	}

	#[test]
	fn owner_counts_toward_privacy() {
		assert!(is_private(Id::new(1), &[member(1, false), member(2, true)]));
	}

	#[test]
	fn any_regular_member_makes_it_public() {
		assert!(!is_private(Id::new(1), &[member(2, true), member(3, false)]));
	}

	#[test]
	fn nobody_added_is_not_private() {
		assert!(!is_private(Id::new(1), &[]));
	}
}
