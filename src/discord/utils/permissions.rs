// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use super::guilds::load_guild;
use crate::discord::context::BotContext;
use miette::IntoDiagnostic;
use std::collections::HashMap;
use std::future::IntoFuture;
use twilight_http::client::Client;
use twilight_http::error::ErrorType;
use twilight_http::response::StatusCode;
use twilight_model::application::interaction::Interaction;
use twilight_model::guild::{PartialMember, Permissions};
use twilight_model::id::Id;
use twilight_model::id::marker::{ChannelMarker, GuildMarker, RoleMarker, UserMarker};
use twilight_util::permission_calculator::PermissionCalculator;

/// Permissions given to everyone with access to a ticket channel.
pub fn ticket_channel_permissions() -> Permissions {
	Permissions::VIEW_CHANNEL
		| Permissions::READ_MESSAGE_HISTORY
		| Permissions::SEND_MESSAGES
		| Permissions::ATTACH_FILES
		| Permissions::EMBED_LINKS
}

/// Permissions the bot needs in a ticket category to manage ticket channels in it.
pub fn ticket_category_permissions() -> Permissions {
	Permissions::VIEW_CHANNEL
		| Permissions::MANAGE_CHANNELS
		| Permissions::MANAGE_ROLES
		| Permissions::READ_MESSAGE_HISTORY
		| Permissions::SEND_MESSAGES
		| Permissions::EMBED_LINKS
		| Permissions::ATTACH_FILES
}

/// Generates the message to send when a ticket category doesn't give the bot the permissions it needs.
pub fn ticket_category_missing_permissions_message(channel_mention: impl std::fmt::Display) -> String {
	format!(
		"The category {} does not give me the necessary permissions (View Channel, Manage Channels, Manage Permissions, Read Message History, Send Messages, Embed Links, Attach Files) to create and manage tickets.",
		channel_mention
	)
}

/// Whether an interacting member may manage tickets and use moderation functions: administrators, members who can
/// manage channels, and holders of a configured moderator role.
pub fn member_is_staff(member: &PartialMember, moderator_roles: &[Id<RoleMarker>]) -> bool {
	let permissions = member.permissions.unwrap_or_else(Permissions::empty);
	is_staff(permissions, &member.roles, moderator_roles)
}

/// Whether the member who created the interaction counts as staff in the guild.
pub fn interaction_member_is_staff(
	ctx: &BotContext,
	interaction: &Interaction,
	guild_id: Id<GuildMarker>,
) -> miette::Result<bool> {
	let Some(member) = interaction.member.as_ref() else {
		return Ok(false);
	};
	let mut db_connection = ctx.db_connection_pool.get().into_diagnostic()?;
	let moderator_roles = load_guild(&mut db_connection, guild_id)
		.into_diagnostic()?
		.map(|guild| guild.get_moderator_roles())
		.unwrap_or_default();
	Ok(member_is_staff(member, &moderator_roles))
}

fn is_staff(permissions: Permissions, member_roles: &[Id<RoleMarker>], moderator_roles: &[Id<RoleMarker>]) -> bool {
	permissions.intersects(Permissions::ADMINISTRATOR | Permissions::MANAGE_CHANNELS)
		|| member_roles.iter().any(|role| moderator_roles.contains(role))
}

/// Gets the guild-level permissions of a member. Members who aren't in the guild have no permissions.
pub async fn member_guild_permissions(
	http_client: &Client,
	guild_id: Id<GuildMarker>,
	user_id: Id<UserMarker>,
) -> miette::Result<Permissions> {
	let member_future = http_client.guild_member(guild_id, user_id).into_future();
	let guild_future = http_client.guild(guild_id).into_future();
	let roles_future = http_client.roles(guild_id).into_future();
	let (member, guild, guild_roles) = tokio::join!(member_future, guild_future, roles_future);

	let member = match member {
		Ok(response) => response.model().await.into_diagnostic()?,
		Err(error) => {
			if let ErrorType::Response { status, .. } = error.kind() {
				if *status == StatusCode::NOT_FOUND {
					return Ok(Permissions::empty());
				}
			}
			return Err(error).into_diagnostic();
		}
	};
	let guild = guild.into_diagnostic()?.model().await.into_diagnostic()?;
	let guild_roles = guild_roles.into_diagnostic()?.models().await.into_diagnostic()?;

	let guild_everyone_role_id: Id<RoleMarker> = guild_id.cast();
	let role_permissions: HashMap<Id<RoleMarker>, Permissions> =
		guild_roles.iter().map(|role| (role.id, role.permissions)).collect();
	let everyone_role_permissions = role_permissions
		.get(&guild_everyone_role_id)
		.copied()
		.unwrap_or_else(Permissions::empty);
	let member_roles: Vec<(Id<RoleMarker>, Permissions)> = member
		.roles
		.iter()
		.map(|role_id| {
			(
				*role_id,
				role_permissions
					.get(role_id)
					.copied()
					.unwrap_or_else(Permissions::empty),
			)
		})
		.collect();

	let calculator = PermissionCalculator::new(guild_id, user_id, everyone_role_permissions, &member_roles)
		.owner_id(guild.owner_id);
	Ok(calculator.root())
}

/// Gets the list of permissions the bot has in the passed-in channel. The channel ID must reference a channel on the passed-in guild.
pub async fn channel_permissions(
	guild_id: Id<GuildMarker>,
	channel_id: Id<ChannelMarker>,
	http_client: &Client,
) -> miette::Result<Permissions> {
	let self_user = http_client
		.current_user()
		.await
		.into_diagnostic()?
		.model()
		.await
		.into_diagnostic()?;

	let self_member_future = http_client.guild_member(guild_id, self_user.id).into_future();
	let channel_data_future = http_client.channel(channel_id).into_future();
	let guild_roles_future = http_client.roles(guild_id).into_future();
	let (self_member, channel_data, guild_roles) =
		tokio::join!(self_member_future, channel_data_future, guild_roles_future);

	let self_member = self_member.into_diagnostic()?.model().await.into_diagnostic()?;
	let guild_roles = guild_roles.into_diagnostic()?.models().await.into_diagnostic()?;

	let channel_data = match channel_data {
		Ok(response) => response.model().await.into_diagnostic()?,
		Err(error) => {
			if let ErrorType::Response { status, .. } = error.kind() {
				if *status == StatusCode::FORBIDDEN {
					return Ok(Permissions::empty());
				}
			}
			return Err(error).into_diagnostic();
		}
	};

	let guild_everyone_role_id: Id<RoleMarker> = guild_id.cast();
	let role_permissions: HashMap<Id<RoleMarker>, Permissions> =
		guild_roles.iter().map(|role| (role.id, role.permissions)).collect();
	let everyone_role_permissions = role_permissions
		.get(&guild_everyone_role_id)
		.copied()
		.unwrap_or_else(Permissions::empty);
	let member_roles: Vec<(Id<RoleMarker>, Permissions)> = self_member
		.roles
		.iter()
		.map(|role_id| {
			(
				*role_id,
				role_permissions
					.get(role_id)
					.copied()
					.unwrap_or_else(Permissions::empty),
			)
		})
		.collect();
	let channel_permission_overwrites = channel_data.permission_overwrites.unwrap_or_default();

	let calculator = PermissionCalculator::new(guild_id, self_user.id, everyone_role_permissions, &member_roles);
	Ok(calculator.in_channel(channel_data.kind, &channel_permission_overwrites))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn moderator_role_makes_staff() {
		let moderator_role = Id::new(10);
		assert!(is_staff(Permissions::empty(), &[Id::new(3), moderator_role], &[moderator_role]));
	}

	#[test]
	fn channel_managers_and_admins_are_staff() {
		assert!(is_staff(Permissions::MANAGE_CHANNELS, &[], &[]));
		assert!(is_staff(Permissions::ADMINISTRATOR, &[], &[]));
	}

	#[test]
	fn regular_members_are_not_staff() {
		assert!(!is_staff(Permissions::SEND_MESSAGES, &[Id::new(3)], &[Id::new(10)]));
	}
}
