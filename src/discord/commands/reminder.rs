// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use super::invocation;
use crate::discord::context::BotContext;
use crate::discord::utils::duration::parse_duration;
use crate::discord::utils::options;
use crate::discord::utils::responses::ephemeral_reply;
use crate::discord::utils::timestamp::discord_time;
use crate::model::{Reminder, database_id_from_discord_id};
use crate::schema::reminders;
use chrono::Utc;
use diesel::prelude::*;
use miette::{IntoDiagnostic, bail};
use twilight_mention::timestamp::TimestampStyle;
use twilight_model::application::command::{Command, CommandType};
use twilight_model::application::interaction::InteractionContextType;
use twilight_model::application::interaction::application_command::CommandData;
use twilight_model::gateway::payload::incoming::InteractionCreate;
use twilight_util::builder::command::{CommandBuilder, StringBuilder, SubCommandBuilder};

const MAX_REMINDER_TEXT_LENGTH: u16 = 1500;

pub fn command_definition() -> Command {
	let set = SubCommandBuilder::new("set", "Set a reminder")
		.option(StringBuilder::new("in", "When to remind you, like 30m or 1d12h").required(true))
		.option(
			StringBuilder::new("text", "What to remind you of")
				.max_length(MAX_REMINDER_TEXT_LENGTH)
				.required(true),
		);
	let list = SubCommandBuilder::new("list", "List your pending reminders on this server");
	let cancel = SubCommandBuilder::new("cancel", "Cancel a pending reminder")
		.option(StringBuilder::new("id", "The ID of the reminder, from /reminder list").required(true));

	CommandBuilder::new("reminder", "Get reminded of things later", CommandType::ChatInput)
		.contexts([InteractionContextType::Guild])
		.option(set)
		.option(list)
		.option(cancel)
		.build()
}

/// Formats a pending reminder for listing.
fn describe_reminder(reminder: &Reminder) -> String {
	format!(
		"`{}` {}: {}",
		reminder.id,
		discord_time(&reminder.remind_at, TimestampStyle::RelativeTime),
		reminder.text
	)
}

pub async fn handle_command(
	ctx: &BotContext,
	interaction: &InteractionCreate,
	command_data: &CommandData,
) -> miette::Result<()> {
	let (guild_id, user_id) = invocation(interaction, "Reminder")?;
	let Some((subcommand, subcommand_options)) = options::subcommand(&command_data.options) else {
		bail!("Reminder command invoked with no subcommand");
	};
	let db_guild_id = database_id_from_discord_id(guild_id.get());
	let db_user_id = database_id_from_discord_id(user_id.get());

	let message = match subcommand {
		"set" => {
			let Some(channel_id) = interaction.channel.as_ref().map(|channel| channel.id) else {
				bail!("Reminder set subcommand was used without a channel");
			};
			let (Some(delay), Some(text)) = (
				options::string(subcommand_options, "in"),
				options::string(subcommand_options, "text"),
			) else {
				bail!("Reminder set subcommand received without its options");
			};
			let delay = match parse_duration(delay) {
				Ok(delay) => delay,
				Err(error) => return ephemeral_reply(ctx, interaction, &error.to_string()).await,
			};
			let now = Utc::now();
			let Some(remind_at) = now.checked_add_signed(delay) else {
				return ephemeral_reply(ctx, interaction, "That's too far in the future.").await;
			};

			let reminder = Reminder {
				id: cuid2::create_id(),
				guild: db_guild_id,
				channel: database_id_from_discord_id(channel_id.get()),
				target_user: db_user_id,
				text: text.to_string(),
				remind_at,
				created_at: now,
				delivered: false,
			};
			let mut db_connection = ctx.db_connection_pool.get().into_diagnostic()?;
			diesel::insert_into(reminders::table)
				.values(&reminder)
				.execute(&mut db_connection)
				.into_diagnostic()?;
			format!(
				"I'll remind you {} (reminder `{}`).",
				discord_time(&remind_at, TimestampStyle::RelativeTime),
				reminder.id
			)
		}
		"list" => {
			let mut db_connection = ctx.db_connection_pool.get().into_diagnostic()?;
			let pending: Vec<Reminder> = reminders::table
				.filter(reminders::guild.eq(db_guild_id))
				.filter(reminders::target_user.eq(db_user_id))
				.filter(reminders::delivered.eq(false))
				.order(reminders::remind_at.asc())
				.limit(20)
				.load(&mut db_connection)
				.into_diagnostic()?;
			if pending.is_empty() {
				String::from("You have no pending reminders on this server.")
			} else {
				let lines: Vec<String> = pending.iter().map(describe_reminder).collect();
				lines.join("\n")
			}
		}
		"cancel" => {
			let Some(reminder_id) = options::string(subcommand_options, "id").map(str::trim) else {
				bail!("Reminder cancel subcommand received without an ID");
			};
			let mut db_connection = ctx.db_connection_pool.get().into_diagnostic()?;
			let deleted = diesel::delete(
				reminders::table
					.find(reminder_id)
					.filter(reminders::guild.eq(db_guild_id))
					.filter(reminders::target_user.eq(db_user_id))
					.filter(reminders::delivered.eq(false)),
			)
			.execute(&mut db_connection)
			.into_diagnostic()?;
			if deleted == 0 {
				format!("You have no pending reminder `{}`.", reminder_id)
			} else {
				format!("Cancelled reminder `{}`.", reminder_id)
			}
		}
		_ => bail!("Unknown reminder subcommand: {}", subcommand),
	};
	ephemeral_reply(ctx, interaction, &message).await
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::TimeZone;

	#[test]
	fn listing_shows_id_time_and_text() {
		let remind_at = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
		let reminder = Reminder {
			id: String::from("abc123"),
			guild: 1,
			channel: 2,
			target_user: 3,
			text: String::from("water the plants"),
			remind_at,
			created_at: remind_at,
			delivered: false,
		};
		assert_eq!(describe_reminder(&reminder), "`abc123` <t:1700000000:R>: water the plants");
	}
}
