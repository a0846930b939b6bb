// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::discord::context::BotContext;
use crate::discord::utils::guilds::load_guild;
use crate::discord::utils::timestamp::timestamp_from_datetime;
use chrono::Utc;
use miette::IntoDiagnostic;
use twilight_mention::fmt::Mention;
use twilight_model::channel::message::AllowedMentions;
use twilight_model::channel::message::embed::Embed;
use twilight_model::id::Id;
use twilight_model::id::marker::{GuildMarker, UserMarker};
use twilight_util::builder::embed::{EmbedBuilder, EmbedFieldBuilder};
use twilight_validate::embed::EmbedValidationError;

const LOG_EMBED_COLOR: u32 = 0xc0392b;

/// One moderation action as reported to a guild's moderation log.
pub struct LogEntry<'a> {
	pub action: &'a str,
	pub target: Id<UserMarker>,
	/// Empty when the bot acted on its own, like when an infraction expires.
	pub moderator: Option<Id<UserMarker>>,
	pub reason: Option<&'a str>,
	pub expiry: Option<String>,
}

impl LogEntry<'_> {
	fn embed(&self) -> Result<Embed, EmbedValidationError> {
		let moderator = match self.moderator {
			Some(moderator) => moderator.mention().to_string(),
			None => String::from("Automatic"),
		};
		let mut embed = EmbedBuilder::new()
			.title(self.action)
			.color(LOG_EMBED_COLOR)
			.field(EmbedFieldBuilder::new("User", format!("{} ({})", self.target.mention(), self.target)).inline())
			.field(EmbedFieldBuilder::new("Moderator", moderator).inline());
		if let Some(expiry) = &self.expiry {
			embed = embed.field(EmbedFieldBuilder::new("Expires", expiry).inline());
		}
		if let Some(reason) = self.reason.filter(|reason| !reason.is_empty()) {
			embed = embed.field(EmbedFieldBuilder::new("Reason", reason));
		}
		if let Ok(timestamp) = timestamp_from_datetime(&Utc::now()) {
			embed = embed.timestamp(timestamp);
		}
		Ok(embed.validate()?.build())
	}
}

/// Posts the entry to the guild's moderation log channel, if it has one.
pub async fn log_action(ctx: &BotContext, guild_id: Id<GuildMarker>, entry: &LogEntry<'_>) -> miette::Result<()> {
	let guild = {
		let mut db_connection = ctx.db_connection_pool.get().into_diagnostic()?;
		load_guild(&mut db_connection, guild_id).into_diagnostic()?
	};
	let Some(log_channel) = guild.and_then(|guild| guild.get_moderation_log_channel()) else {
		return Ok(());
	};

	let embed = entry.embed().into_diagnostic()?;
	ctx.http_client
		.create_message(log_channel)
		.embeds(&[embed])
		.allowed_mentions(Some(&AllowedMentions::default()))
		.await
		.into_diagnostic()?;
	Ok(())
}

/// Logs the action, only warning when the log can't be written so the action itself still goes through.
pub async fn report(ctx: &BotContext, guild_id: Id<GuildMarker>, entry: &LogEntry<'_>) {
	if let Err(error) = log_action(ctx, guild_id, entry).await {
		tracing::warn!(source = ?error, guild = %guild_id, action = entry.action, "Failed to write moderation log");
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn automatic_actions_have_no_moderator_mention() {
		let entry = LogEntry {
			action: "Mute expired",
			target: Id::new(42),
			moderator: None,
			reason: None,
			expiry: None,
		};
		let embed = entry.embed().unwrap();
		assert_eq!(embed.title.as_deref(), Some("Mute expired"));
		let moderator = embed.fields.iter().find(|field| field.name == "Moderator").unwrap();
		assert_eq!(moderator.value, "Automatic");
		assert!(embed.fields.iter().all(|field| field.name != "Reason"));
	}

	#[test]
	fn reason_and_expiry_are_listed() {
		let entry = LogEntry {
			action: "Banned",
			target: Id::new(42),
			moderator: Some(Id::new(7)),
			reason: Some("spam"),
			expiry: Some(String::from("never")),
		};
		let embed = entry.embed().unwrap();
		let names: Vec<&str> = embed.fields.iter().map(|field| field.name.as_str()).collect();
		assert_eq!(names, vec!["User", "Moderator", "Expires", "Reason"]);
		assert_eq!(embed.fields[1].value, "<@7>");
	}
}
