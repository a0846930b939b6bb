// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use super::ban::describe_outcome;
use super::{expiry_from_option, invocation};
use crate::discord::context::BotContext;
use crate::discord::moderation::{self, ModerationError};
use crate::discord::utils::options;
use crate::discord::utils::permissions::interaction_member_is_staff;
use crate::discord::utils::responses::{defer, ephemeral_reply, update_deferred};
use miette::bail;
use twilight_mention::fmt::Mention;
use twilight_model::application::command::{Command, CommandType};
use twilight_model::application::interaction::InteractionContextType;
use twilight_model::application::interaction::application_command::CommandData;
use twilight_model::gateway::payload::incoming::InteractionCreate;
use twilight_model::guild::Permissions;
use twilight_util::builder::command::{CommandBuilder, StringBuilder, UserBuilder};

pub fn mute_command_definition() -> Command {
	CommandBuilder::new("mute", "Mute a member with the server's mute role", CommandType::ChatInput)
		.contexts([InteractionContextType::Guild])
		.default_member_permissions(Permissions::MODERATE_MEMBERS)
		.option(UserBuilder::new("user", "The member to mute").required(true))
		.option(StringBuilder::new(
			"duration",
			"How long the mute lasts, like 30m or 2h; permanent if not given",
		))
		.option(StringBuilder::new("reason", "Why the member is being muted").max_length(512))
		.build()
}

pub fn unmute_command_definition() -> Command {
	CommandBuilder::new("unmute", "Lift a member's mute", CommandType::ChatInput)
		.contexts([InteractionContextType::Guild])
		.default_member_permissions(Permissions::MODERATE_MEMBERS)
		.option(UserBuilder::new("user", "The member to unmute").required(true))
		.option(StringBuilder::new("reason", "Why the mute is being lifted").max_length(512))
		.build()
}

pub async fn handle_mute(
	ctx: &BotContext,
	interaction: &InteractionCreate,
	command_data: &CommandData,
) -> miette::Result<()> {
	let (guild_id, moderator) = invocation(interaction, "Mute")?;
	if !interaction_member_is_staff(ctx, interaction, guild_id)? {
		return ephemeral_reply(ctx, interaction, &ModerationError::NotAuthorized.to_string()).await;
	}
	let Some(target) = options::user(&command_data.options, "user") else {
		bail!("Mute command received without a user");
	};
	let until = match expiry_from_option(&command_data.options) {
		Ok(until) => until,
		Err(message) => return ephemeral_reply(ctx, interaction, &message).await,
	};
	let reason = options::string(&command_data.options, "reason").unwrap_or_default();

	defer(ctx, interaction, true).await?;
	let message = match moderation::mute(ctx, guild_id, target, moderator, until, reason).await {
		Ok(outcome) => describe_outcome(&outcome, "muted", "mute"),
		Err(error) => error.into_user_message()?,
	};
	update_deferred(ctx, interaction, &message).await
}

pub async fn handle_unmute(
	ctx: &BotContext,
	interaction: &InteractionCreate,
	command_data: &CommandData,
) -> miette::Result<()> {
	let (guild_id, moderator) = invocation(interaction, "Unmute")?;
	if !interaction_member_is_staff(ctx, interaction, guild_id)? {
		return ephemeral_reply(ctx, interaction, &ModerationError::NotAuthorized.to_string()).await;
	}
	let Some(target) = options::user(&command_data.options, "user") else {
		bail!("Unmute command received without a user");
	};
	let reason = options::string(&command_data.options, "reason").unwrap_or_default();

	defer(ctx, interaction, true).await?;
	let message = match moderation::unmute(ctx, guild_id, target, moderator, reason).await {
		Ok(_) => format!("{} has been unmuted.", target.mention()),
		Err(ModerationError::NotFound) => format!("{} isn't muted.", target.mention()),
		Err(error) => error.into_user_message()?,
	};
	update_deferred(ctx, interaction, &message).await
}
