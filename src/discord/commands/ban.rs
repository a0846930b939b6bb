// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use super::{expiry_from_option, invocation};
use crate::discord::context::BotContext;
use crate::discord::moderation::{self, ModerationError, RecordOutcome};
use crate::discord::utils::options;
use crate::discord::utils::permissions::interaction_member_is_staff;
use crate::discord::utils::responses::{defer, ephemeral_reply, update_deferred};
use crate::discord::utils::timestamp::describe_expiry;
use miette::bail;
use twilight_mention::fmt::Mention;
use twilight_model::application::command::{Command, CommandType};
use twilight_model::application::interaction::InteractionContextType;
use twilight_model::application::interaction::application_command::CommandData;
use twilight_model::gateway::payload::incoming::InteractionCreate;
use twilight_model::guild::Permissions;
use twilight_util::builder::command::{CommandBuilder, StringBuilder, UserBuilder};

pub fn ban_command_definition() -> Command {
	CommandBuilder::new("ban", "Ban a user from this server", CommandType::ChatInput)
		.contexts([InteractionContextType::Guild])
		.default_member_permissions(Permissions::BAN_MEMBERS)
		.option(UserBuilder::new("user", "The user to ban").required(true))
		.option(StringBuilder::new(
			"duration",
			"How long the ban lasts, like 1d12h; permanent if not given",
		))
		.option(StringBuilder::new("reason", "Why the user is being banned").max_length(512))
		.build()
}

pub fn unban_command_definition() -> Command {
	CommandBuilder::new("unban", "Lift a user's ban", CommandType::ChatInput)
		.contexts([InteractionContextType::Guild])
		.default_member_permissions(Permissions::BAN_MEMBERS)
		.option(UserBuilder::new("user", "The user to unban").required(true))
		.option(StringBuilder::new("reason", "Why the ban is being lifted").max_length(512))
		.build()
}

/// Describes the result of a ban or mute for the moderator who issued it.
pub fn describe_outcome(outcome: &RecordOutcome, verb: &str, noun: &str) -> String {
	let infraction = outcome.infraction();
	let target = infraction.get_target_user().mention();
	let expiry = describe_expiry(infraction.until.as_ref());
	match outcome {
		RecordOutcome::Created(_) => format!("{} has been {}. The {} expires: {}.", target, verb, noun, expiry),
		RecordOutcome::Extended(_) => format!("{}'s {} was extended. It now expires: {}.", target, noun, expiry),
		RecordOutcome::Unchanged(_) => format!(
			"{} already has a {} lasting at least that long (expires: {}); it was left unchanged.",
			target, noun, expiry
		),
	}
}

pub async fn handle_ban(ctx: &BotContext, interaction: &InteractionCreate, command_data: &CommandData) -> miette::Result<()> {
	let (guild_id, moderator) = invocation(interaction, "Ban")?;
	if !interaction_member_is_staff(ctx, interaction, guild_id)? {
		return ephemeral_reply(ctx, interaction, &ModerationError::NotAuthorized.to_string()).await;
	}
	let Some(target) = options::user(&command_data.options, "user") else {
		bail!("Ban command received without a user");
	};
	let until = match expiry_from_option(&command_data.options) {
		Ok(until) => until,
		Err(message) => return ephemeral_reply(ctx, interaction, &message).await,
	};
	let reason = options::string(&command_data.options, "reason").unwrap_or_default();

	defer(ctx, interaction, true).await?;
	let message = match moderation::ban(ctx, guild_id, target, moderator, until, reason).await {
		Ok(outcome) => describe_outcome(&outcome, "banned", "ban"),
		Err(error) => error.into_user_message()?,
	};
	update_deferred(ctx, interaction, &message).await
}

pub async fn handle_unban(
	ctx: &BotContext,
	interaction: &InteractionCreate,
	command_data: &CommandData,
) -> miette::Result<()> {
	let (guild_id, moderator) = invocation(interaction, "Unban")?;
	if !interaction_member_is_staff(ctx, interaction, guild_id)? {
		return ephemeral_reply(ctx, interaction, &ModerationError::NotAuthorized.to_string()).await;
	}
	let Some(target) = options::user(&command_data.options, "user") else {
		bail!("Unban command received without a user");
	};
	let reason = options::string(&command_data.options, "reason").unwrap_or_default();

	defer(ctx, interaction, true).await?;
	let message = match moderation::unban(ctx, guild_id, target, moderator, reason).await {
		Ok(_) => format!("{} has been unbanned.", target.mention()),
		Err(ModerationError::NotFound) => format!("{} has no active ban.", target.mention()),
		Err(error) => error.into_user_message()?,
	};
	update_deferred(ctx, interaction, &message).await
}
