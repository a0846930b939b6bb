// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::discord::utils::permissions::ticket_channel_permissions;
use twilight_model::channel::permission_overwrite::{
	PermissionOverwrite as ChannelOverwrite, PermissionOverwriteType as ChannelOverwriteType,
};
use twilight_model::guild::Permissions;
use twilight_model::http::permission_overwrite::{PermissionOverwrite, PermissionOverwriteType};
use twilight_model::id::Id;
use twilight_model::id::marker::{GenericMarker, GuildMarker, RoleMarker, UserMarker};

/// The parties that always have access to a ticket channel and therefore never count as "added".
pub struct TicketParties<'a> {
	pub guild_id: Id<GuildMarker>,
	pub owner: Id<UserMarker>,
	pub bot_user: Id<UserMarker>,
	pub moderator_roles: &'a [Id<RoleMarker>],
}

pub fn member_overwrite(user: Id<UserMarker>) -> PermissionOverwrite {
	PermissionOverwrite {
		allow: Some(ticket_channel_permissions()),
		deny: None,
		id: user.cast(),
		kind: PermissionOverwriteType::Member,
	}
}

pub fn role_overwrite(role: Id<RoleMarker>) -> PermissionOverwrite {
	PermissionOverwrite {
		allow: Some(ticket_channel_permissions()),
		deny: None,
		id: role.cast(),
		kind: PermissionOverwriteType::Role,
	}
}

/// The overwrites a new ticket channel is created with: hidden from @everyone, visible to moderators, the owner,
/// and the bot itself.
pub fn new_ticket_overwrites(parties: &TicketParties<'_>) -> Vec<ChannelOverwrite> {
	let everyone_role: Id<RoleMarker> = parties.guild_id.cast();
	let access = ticket_channel_permissions();
	let granted = |id: Id<GenericMarker>, kind: ChannelOverwriteType, allow: Permissions| ChannelOverwrite {
		allow,
		deny: Permissions::empty(),
		id,
		kind,
	};

	let mut overwrites = vec![ChannelOverwrite {
		allow: Permissions::empty(),
		deny: Permissions::VIEW_CHANNEL,
		id: everyone_role.cast(),
		kind: ChannelOverwriteType::Role,
	}];
	overwrites.push(granted(
		parties.bot_user.cast(),
		ChannelOverwriteType::Member,
		access | Permissions::MANAGE_CHANNELS | Permissions::MANAGE_ROLES,
	));
	overwrites.extend(
		parties
			.moderator_roles
			.iter()
			.map(|role| granted(role.cast(), ChannelOverwriteType::Role, access)),
	);
	overwrites.push(granted(parties.owner.cast(), ChannelOverwriteType::Member, access));
	overwrites
}

/// Reconstructs the members and roles added to a ticket from the channel's current overwrites. Only overwrites that
/// grant viewing the channel count; the owner, the bot, @everyone, and moderator roles are never "added".
pub fn added_snowflakes(
	overwrites: &[ChannelOverwrite],
	parties: &TicketParties<'_>,
) -> (Vec<Id<UserMarker>>, Vec<Id<RoleMarker>>) {
	let everyone_role: Id<RoleMarker> = parties.guild_id.cast();
	let mut users = Vec::new();
	let mut roles = Vec::new();

	for overwrite in overwrites {
		if !overwrite.allow.contains(Permissions::VIEW_CHANNEL) {
			continue;
		}
		match overwrite.kind {
			ChannelOverwriteType::Member => {
				let user: Id<UserMarker> = overwrite.id.cast();
				if user != parties.owner && user != parties.bot_user && !users.contains(&user) {
					users.push(user);
				}
			}
			ChannelOverwriteType::Role => {
				let role: Id<RoleMarker> = overwrite.id.cast();
				if role != everyone_role && !parties.moderator_roles.contains(&role) && !roles.contains(&role) {
					roles.push(role);
				}
			}
			_ => (),
		}
	}

	(users, roles)
}

#[cfg(test)]
mod tests {
	use super::*;

	const GUILD: u64 = 100;
	const OWNER: u64 = 200;
	const BOT: u64 = 300;
	const MODERATOR_ROLE: u64 = 400;

	fn parties(moderator_roles: &[Id<RoleMarker>]) -> TicketParties<'_> {
		TicketParties {
			guild_id: Id::new(GUILD),
			owner: Id::new(OWNER),
			bot_user: Id::new(BOT),
			moderator_roles,
		}
	}

	fn channel_overwrite(id: u64, kind: ChannelOverwriteType, allow: Permissions) -> ChannelOverwrite {
		ChannelOverwrite {
			allow,
			deny: Permissions::empty(),
			id: Id::new(id),
			kind,
		}
	}

	#[test]
	fn new_channels_hide_from_everyone_and_admit_owner_and_moderators() {
		let moderator_roles = [Id::new(MODERATOR_ROLE)];
		let overwrites = new_ticket_overwrites(&parties(&moderator_roles));

		let everyone = overwrites.iter().find(|overwrite| overwrite.id == Id::new(GUILD)).unwrap();
		assert_eq!(everyone.deny, Permissions::VIEW_CHANNEL);
		assert_eq!(everyone.kind, ChannelOverwriteType::Role);

		for admitted in [OWNER, BOT, MODERATOR_ROLE] {
			let overwrite = overwrites.iter().find(|overwrite| overwrite.id == Id::new(admitted)).unwrap();
			assert!(overwrite.allow.contains(Permissions::VIEW_CHANNEL));
			assert!(overwrite.deny.is_empty());
		}
	}

	#[test]
	fn recomputation_skips_fixed_parties() {
		let moderator_roles = [Id::new(MODERATOR_ROLE)];
		let view = ticket_channel_permissions();
		let overwrites = vec![
			channel_overwrite(GUILD, ChannelOverwriteType::Role, Permissions::empty()),
			channel_overwrite(OWNER, ChannelOverwriteType::Member, view),
			channel_overwrite(BOT, ChannelOverwriteType::Member, view),
			channel_overwrite(MODERATOR_ROLE, ChannelOverwriteType::Role, view),
			channel_overwrite(501, ChannelOverwriteType::Member, view),
			channel_overwrite(502, ChannelOverwriteType::Role, view),
		];
		let (users, roles) = added_snowflakes(&overwrites, &parties(&moderator_roles));
		assert_eq!(users, vec![Id::new(501)]);
		assert_eq!(roles, vec![Id::new(502)]);
	}

	#[test]
	fn overwrites_without_view_access_are_not_added() {
		let overwrites = vec![channel_overwrite(
			501,
			ChannelOverwriteType::Member,
			Permissions::SEND_MESSAGES,
		)];
		let (users, roles) = added_snowflakes(&overwrites, &parties(&[]));
		assert!(users.is_empty());
		assert!(roles.is_empty());
	}

	#[test]
	fn new_channels_add_nobody_extra() {
		let moderator_roles = [Id::new(MODERATOR_ROLE)];
		let parties = parties(&moderator_roles);
		let (users, roles) = added_snowflakes(&new_ticket_overwrites(&parties), &parties);
		assert!(users.is_empty());
		assert!(roles.is_empty());
	}
}
