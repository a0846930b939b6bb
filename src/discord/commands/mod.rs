// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::discord::context::BotContext;
use crate::discord::utils::duration::parse_duration;
use crate::discord::utils::options;
use chrono::{DateTime, Utc};
use miette::bail;
use twilight_model::application::command::Command;
use twilight_model::application::interaction::application_command::{CommandData, CommandDataOption};
use twilight_model::gateway::payload::incoming::InteractionCreate;
use twilight_model::id::Id;
use twilight_model::id::marker::{GuildMarker, UserMarker};

mod admin_util;
mod ban;
mod mute;
mod prune;
mod reminder;
mod role_menu;
mod tag;
pub mod ticket;

pub fn command_definitions() -> Vec<Command> {
	vec![
		admin_util::command_definition(),
		ban::ban_command_definition(),
		ban::unban_command_definition(),
		mute::mute_command_definition(),
		mute::unmute_command_definition(),
		prune::command_definition(),
		reminder::command_definition(),
		role_menu::command_definition(),
		tag::command_definition(),
		ticket::command_definition(),
	]
}

pub async fn route_command(
	ctx: &BotContext,
	interaction: &InteractionCreate,
	command_data: &CommandData,
) -> miette::Result<()> {
	match command_data.name.as_str() {
		"admin-util" => admin_util::handle_command(ctx, interaction, command_data).await,
		"ban" => ban::handle_ban(ctx, interaction, command_data).await,
		"unban" => ban::handle_unban(ctx, interaction, command_data).await,
		"mute" => mute::handle_mute(ctx, interaction, command_data).await,
		"unmute" => mute::handle_unmute(ctx, interaction, command_data).await,
		"prune" => prune::handle_command(ctx, interaction, command_data).await,
		"reminder" => reminder::handle_command(ctx, interaction, command_data).await,
		"role-menu" => role_menu::handle_command(ctx, interaction, command_data).await,
		"tag" => tag::handle_command(ctx, interaction, command_data).await,
		"ticket" => ticket::handle_command(ctx, interaction, command_data).await,
		_ => bail!("Unknown command encountered: {}\n{:?}", command_data.name, command_data),
	}
}

/// Gets the guild and invoking user of a guild-only command.
pub(super) fn invocation(
	interaction: &InteractionCreate,
	command_name: &str,
) -> miette::Result<(Id<GuildMarker>, Id<UserMarker>)> {
	let Some(guild_id) = interaction.guild_id else {
		bail!("{} command was used outside of a guild", command_name);
	};
	let Some(user_id) = interaction.author_id() else {
		bail!("{} command was used without an invoking user", command_name);
	};
	Ok((guild_id, user_id))
}

/// Reads the optional `duration` option as an expiry time. No duration means the action is permanent.
///
/// The error is a message for the invoking user.
fn expiry_from_option(options: &[CommandDataOption]) -> Result<Option<DateTime<Utc>>, String> {
	expiry_after(options, Utc::now())
}

fn expiry_after(options: &[CommandDataOption], now: DateTime<Utc>) -> Result<Option<DateTime<Utc>>, String> {
	let Some(duration) = options::string(options, "duration") else {
		return Ok(None);
	};
	let duration = parse_duration(duration).map_err(|error| error.to_string())?;
	match now.checked_add_signed(duration) {
		Some(until) => Ok(Some(until)),
		None => Err(String::from("That duration is too long.")),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::TimeZone;
	use twilight_model::application::interaction::application_command::CommandOptionValue;

	fn duration_option(value: &str) -> Vec<CommandDataOption> {
		vec![CommandDataOption {
			name: String::from("duration"),
			value: CommandOptionValue::String(value.to_string()),
		}]
	}

	#[test]
	fn missing_duration_is_permanent() {
		assert_eq!(expiry_after(&[], Utc::now()), Ok(None));
	}

	#[test]
	fn duration_is_added_to_now() {
		let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
		let until = expiry_after(&duration_option("1h30m"), now).unwrap();
		assert_eq!(until, Some(Utc.timestamp_opt(1_700_005_400, 0).unwrap()));
	}

	#[test]
	fn bad_durations_are_reported() {
		assert!(expiry_after(&duration_option("forever"), Utc::now()).is_err());
	}
}
