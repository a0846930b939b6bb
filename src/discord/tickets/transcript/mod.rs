// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use super::load_config;
use super::naming::{channel_name, display_name};
use crate::discord::context::BotContext;
use crate::discord::utils::timestamp::{datetime_from_timestamp, discord_time, timestamp_from_datetime};
use crate::discord::utils::users::{UserData, get_member_data};
use crate::model::Ticket;
use chrono::Utc;
use miette::{IntoDiagnostic, bail};
use std::future::IntoFuture;
use tokio::time::{Duration, sleep};
use twilight_http::client::Client;
use twilight_mention::fmt::Mention;
use twilight_mention::timestamp::TimestampStyle;
use twilight_model::channel::Message;
use twilight_model::http::attachment::Attachment;
use twilight_model::id::Id;
use twilight_model::id::marker::{ChannelMarker, MessageMarker};
use twilight_util::builder::embed::{EmbedBuilder, EmbedFieldBuilder};

mod history;
mod render;

use history::absorb_batch;
use render::{MentionNames, TranscriptAttachment, TranscriptHeader, TranscriptMessage, render_transcript};

const HISTORY_BATCH_SIZE: u16 = 100;
const HISTORY_BATCH_DELAY: Duration = Duration::from_millis(250);
/// Upper bound on how far back a transcript reaches (100 batches of 100 messages).
const MAX_HISTORY_BATCHES: usize = 100;

/// Exports the ticket's transcript in the background, logging any failure.
pub fn spawn_transcript_export(ctx: BotContext, ticket: Ticket) {
	tokio::spawn(async move {
		if let Err(error) = export_transcript(&ctx, &ticket).await {
			tracing::error!(source = ?error, ticket = ticket.id, "Failed to export ticket transcript");
		}
	});
}

/// Renders the ticket channel's history since the welcome message and posts it to the guild's ticket log channel.
pub async fn export_transcript(ctx: &BotContext, ticket: &Ticket) -> miette::Result<()> {
	let config = {
		let mut db_connection = ctx.db_connection_pool.get().into_diagnostic()?;
		load_config(&mut db_connection, ticket.get_guild()).into_diagnostic()?
	};
	let Some(config) = config else {
		bail!("Ticket {} has no ticketing config to export a transcript with", ticket.id);
	};
	let (Some(channel_id), None) = (ticket.get_channel(), ticket.channel_deleted_at) else {
		bail!("Ticket {} has no channel to export a transcript from", ticket.id);
	};

	let mut messages = fetch_history(&ctx.http_client, channel_id, ticket.get_welcome_message()).await?;
	messages.reverse();

	let guild_id = ticket.get_guild();
	let guild_future = ctx.http_client.guild(guild_id).into_future();
	let roles_future = ctx.http_client.roles(guild_id).into_future();
	let channels_future = ctx.http_client.guild_channels(guild_id).into_future();
	let (guild, roles, channels) = tokio::join!(guild_future, roles_future, channels_future);
	let guild = guild.into_diagnostic()?.model().await.into_diagnostic()?;
	let roles = roles.into_diagnostic()?.models().await.into_diagnostic()?;
	let channels = channels.into_diagnostic()?.models().await.into_diagnostic()?;

	let owner = match get_member_data(&ctx.http_client, guild_id, ticket.get_owner()).await {
		Ok(owner) => owner,
		Err(error) => {
			tracing::warn!(source = ?error, ticket = ticket.id, "Couldn't look up ticket owner for transcript");
			UserData {
				display_name: ticket.get_owner().to_string(),
				avatar_url: None,
			}
		}
	};

	let mut names = MentionNames::default();
	for role in roles {
		names.roles.insert(role.id.get(), role.name);
	}
	for channel in channels {
		if let Some(name) = channel.name {
			names.channels.insert(channel.id.get(), name);
		}
	}
	for message in messages.iter() {
		let author = UserData::from_user(&message.author);
		names.users.insert(message.author.id.get(), author.display_name);
		for mentioned in message.mentions.iter() {
			names
				.users
				.entry(mentioned.id.get())
				.or_insert_with(|| mentioned.name.clone());
		}
	}

	let transcript_messages: Vec<TranscriptMessage> = messages.iter().map(transcript_message).collect();
	let header = TranscriptHeader {
		guild_name: guild.name,
		channel_name: channel_name(&config.opened_name_prefix, ticket.guild_specific_id),
		ticket_name: display_name(ticket.guild_specific_id),
		owner_name: owner.display_name.clone(),
		generated_at: Utc::now(),
	};
	let html = render_transcript(&header, &transcript_messages, &names);

	let file_name = format!(
		"transcript-{}.html",
		channel_name(&config.opened_name_prefix, ticket.guild_specific_id)
	);
	let attachments = [Attachment::from_bytes(file_name, html.into_bytes(), 0)];

	let mut fields = vec![
		EmbedFieldBuilder::new("Owner", format!("{}", ticket.get_owner().mention()))
			.inline()
			.build(),
		EmbedFieldBuilder::new("Messages", transcript_messages.len().to_string())
			.inline()
			.build(),
		EmbedFieldBuilder::new("Opened", discord_time(&ticket.opened_at, TimestampStyle::ShortDateTime))
			.inline()
			.build(),
	];
	if let Some(closed_at) = ticket.closed_at.as_ref() {
		fields.push(
			EmbedFieldBuilder::new("Closed", discord_time(closed_at, TimestampStyle::ShortDateTime))
				.inline()
				.build(),
		);
	}
	let mut embed = EmbedBuilder::new()
		.title(format!("Transcript for {}", display_name(ticket.guild_specific_id)))
		.color(config.embed_color())
		.timestamp(timestamp_from_datetime(&Utc::now()).into_diagnostic()?);
	for field in fields {
		embed = embed.field(field);
	}
	let embed = embed.validate().into_diagnostic()?.build();

	ctx.http_client
		.create_message(config.get_log_channel())
		.embeds(&[embed])
		.attachments(&attachments)
		.await
		.into_diagnostic()?;
	tracing::info!(guild = %guild_id, ticket = ticket.guild_specific_id, "Exported ticket transcript");

	Ok(())
}

/// Walks the channel's history backward from the newest message until the ticket's opening message. The result is
/// newest-first.
async fn fetch_history(
	http_client: &Client,
	channel_id: Id<ChannelMarker>,
	opening_message: Option<Id<MessageMarker>>,
) -> miette::Result<Vec<Message>> {
	let mut collected: Vec<Message> = Vec::new();
	for batch_number in 0..MAX_HISTORY_BATCHES {
		if batch_number > 0 {
			sleep(HISTORY_BATCH_DELAY).await;
		}
		let request = http_client.channel_messages(channel_id).limit(HISTORY_BATCH_SIZE);
		let response = match collected.last() {
			Some(oldest) => request.before(oldest.id).await,
			None => request.await,
		};
		let batch = response.into_diagnostic()?.models().await.into_diagnostic()?;
		let more = absorb_batch(
			&mut collected,
			batch,
			|message| message.id.get(),
			opening_message.map(|id| id.get()),
			usize::from(HISTORY_BATCH_SIZE),
		);
		if !more {
			return Ok(collected);
		}
	}
	tracing::warn!(channel = %channel_id, "Transcript history walk hit its batch limit");
	Ok(collected)
}

fn transcript_message(message: &Message) -> TranscriptMessage {
	let author = UserData::from_user(&message.author);
	let sent_at = datetime_from_timestamp(&message.timestamp).unwrap_or_else(Utc::now);
	let embeds = message
		.embeds
		.iter()
		.map(|embed| {
			let mut text = String::new();
			if let Some(title) = &embed.title {
				text.push_str(&format!("**{}**\n", title));
			}
			if let Some(description) = &embed.description {
				text.push_str(description);
			}
			text
		})
		.filter(|text| !text.is_empty())
		.collect();
	let attachments = message
		.attachments
		.iter()
		.map(|attachment| TranscriptAttachment {
			filename: attachment.filename.clone(),
			url: attachment.url.clone(),
		})
		.collect();
	TranscriptMessage {
		id: message.id.get(),
		author_name: author.display_name,
		avatar_url: author.avatar_url,
		bot: message.author.bot,
		sent_at,
		content: message.content.clone(),
		embeds,
		attachments,
	}
}
