// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use super::invocation;
use crate::discord::context::BotContext;
use crate::discord::utils::options;
use crate::discord::utils::permissions::interaction_member_is_staff;
use crate::discord::utils::responses::{MISSING_PERMISSIONS, defer, ephemeral_reply, update_deferred};
use crate::discord::utils::timestamp::datetime_from_timestamp;
use chrono::{DateTime, Duration, Utc};
use miette::{IntoDiagnostic, bail};
use twilight_model::application::command::{Command, CommandType};
use twilight_model::application::interaction::InteractionContextType;
use twilight_model::application::interaction::application_command::CommandData;
use twilight_model::gateway::payload::incoming::InteractionCreate;
use twilight_model::guild::Permissions;
use twilight_model::id::Id;
use twilight_model::id::marker::{MessageMarker, UserMarker};
use twilight_util::builder::command::{CommandBuilder, IntegerBuilder, UserBuilder};

const MAX_PRUNE_COUNT: i64 = 100;
/// Discord refuses to bulk delete messages older than two weeks. A little slack keeps messages that age past the
/// limit during the request from failing the whole batch.
const BULK_DELETE_MAX_AGE: Duration = Duration::minutes(14 * 24 * 60 - 5);

pub fn command_definition() -> Command {
	CommandBuilder::new("prune", "Delete recent messages in this channel", CommandType::ChatInput)
		.contexts([InteractionContextType::Guild])
		.default_member_permissions(Permissions::MANAGE_MESSAGES)
		.option(
			IntegerBuilder::new("count", "How many messages to delete")
				.min_value(1)
				.max_value(MAX_PRUNE_COUNT)
				.required(true),
		)
		.option(UserBuilder::new("user", "Only delete messages from this user"))
		.build()
}

#[derive(Clone, Copy, Debug)]
struct PruneCandidate {
	id: Id<MessageMarker>,
	author: Id<UserMarker>,
	sent_at: DateTime<Utc>,
}

/// Picks up to `count` messages from newest-first history, optionally only from one user, that are still young
/// enough to be deleted.
fn select_prunable(
	candidates: &[PruneCandidate],
	count: usize,
	user: Option<Id<UserMarker>>,
	now: DateTime<Utc>,
) -> Vec<Id<MessageMarker>> {
	candidates
		.iter()
		.filter(|candidate| now - candidate.sent_at < BULK_DELETE_MAX_AGE)
		.filter(|candidate| user.is_none_or(|user| candidate.author == user))
		.take(count)
		.map(|candidate| candidate.id)
		.collect()
}

pub async fn handle_command(
	ctx: &BotContext,
	interaction: &InteractionCreate,
	command_data: &CommandData,
) -> miette::Result<()> {
	let (guild_id, moderator) = invocation(interaction, "Prune")?;
	if !interaction_member_is_staff(ctx, interaction, guild_id)? {
		return ephemeral_reply(ctx, interaction, MISSING_PERMISSIONS).await;
	}
	let Some(channel_id) = interaction.channel.as_ref().map(|channel| channel.id) else {
		bail!("Prune command was used without a channel");
	};
	let Some(count) = options::integer(&command_data.options, "count") else {
		bail!("Prune command received without a count");
	};
	if !(1..=MAX_PRUNE_COUNT).contains(&count) {
		return ephemeral_reply(ctx, interaction, "The count must be between 1 and 100.").await;
	}
	let user = options::user(&command_data.options, "user");

	defer(ctx, interaction, true).await?;
	let messages = ctx
		.http_client
		.channel_messages(channel_id)
		.limit(100)
		.await
		.into_diagnostic()?
		.models()
		.await
		.into_diagnostic()?;
	let candidates: Vec<PruneCandidate> = messages
		.iter()
		.filter_map(|message| {
			Some(PruneCandidate {
				id: message.id,
				author: message.author.id,
				sent_at: datetime_from_timestamp(&message.timestamp)?,
			})
		})
		.collect();
	let to_delete = select_prunable(&candidates, count as usize, user, Utc::now());

	match to_delete.as_slice() {
		[] => {}
		[message_id] => {
			ctx.http_client
				.delete_message(channel_id, *message_id)
				.await
				.into_diagnostic()?;
		}
		message_ids => {
			ctx.http_client
				.delete_messages(channel_id, message_ids)
				.await
				.into_diagnostic()?;
		}
	}
	tracing::info!(guild = %guild_id, channel = %channel_id, %moderator, deleted = to_delete.len(), "Pruned messages");

	let message = match to_delete.len() {
		0 => String::from("There were no messages young enough to delete."),
		1 => String::from("Deleted 1 message."),
		deleted => format!("Deleted {} messages.", deleted),
	};
	update_deferred(ctx, interaction, &message).await
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::TimeZone;

	fn now() -> DateTime<Utc> {
		Utc.timestamp_opt(1_750_000_000, 0).unwrap()
	}

	fn candidate(id: u64, author: u64, age: Duration) -> PruneCandidate {
		PruneCandidate {
			id: Id::new(id),
			author: Id::new(author),
			sent_at: now() - age,
		}
	}

	#[test]
	fn takes_newest_messages_up_to_count() {
		let candidates = [
			candidate(5, 1, Duration::minutes(1)),
			candidate(4, 2, Duration::minutes(2)),
			candidate(3, 1, Duration::minutes(3)),
		];
		let selected = select_prunable(&candidates, 2, None, now());
		assert_eq!(selected, vec![Id::new(5), Id::new(4)]);
	}

	#[test]
	fn filters_by_user() {
		let candidates = [
			candidate(5, 1, Duration::minutes(1)),
			candidate(4, 2, Duration::minutes(2)),
			candidate(3, 1, Duration::minutes(3)),
		];
		let selected = select_prunable(&candidates, 10, Some(Id::new(1)), now());
		assert_eq!(selected, vec![Id::new(5), Id::new(3)]);
	}

	#[test]
	fn skips_messages_older_than_two_weeks() {
		let candidates = [
			candidate(5, 1, Duration::days(1)),
			candidate(4, 1, Duration::days(14)),
			candidate(3, 1, Duration::days(20)),
		];
		let selected = select_prunable(&candidates, 10, None, now());
		assert_eq!(selected, vec![Id::new(5)]);
	}
}
