// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use super::messages::{close_embed, reopen_embed};
use super::naming::channel_name;
use super::overwrites::member_overwrite;
use super::transcript::spawn_transcript_export;
use super::{TicketError, load_config};
use crate::discord::context::BotContext;
use crate::discord::utils::http::{ignore_not_found, undo_on_error};
use crate::discord::utils::shared_components::{close_ticket_button, closed_ticket_buttons};
use crate::discord::utils::timestamp::timestamp_from_datetime;
use crate::model::{Ticket, database_id_from_discord_id};
use crate::schema::tickets;
use chrono::Utc;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DbError};
use miette::IntoDiagnostic;
use twilight_http::request::AuditLogReason;
use twilight_model::channel::message::AllowedMentions;
use twilight_model::id::Id;
use twilight_model::id::marker::{ChannelMarker, UserMarker};

/// Closes an open ticket: moves its channel to the closed category, takes the owner's access away, and exports a
/// transcript unless the ticket is private.
pub async fn close_ticket(ctx: &BotContext, ticket: &Ticket, closed_by: Id<UserMarker>) -> Result<Ticket, TicketError> {
	if ticket.disabled {
		return Err(TicketError::AlreadyClosed);
	}
	let Some(channel_id) = ticket.get_channel() else {
		return Err(TicketError::NotFound);
	};

	let mut db_connection = ctx.db_connection_pool.get().into_diagnostic()?;
	let Some(config) = load_config(&mut db_connection, ticket.get_guild()).into_diagnostic()? else {
		return Err(TicketError::NotConfigured);
	};

	let closed_at = Utc::now();
	let closed: Option<Ticket> = diesel::update(tickets::table.find(ticket.id).filter(tickets::disabled.eq(false)))
		.set((
			tickets::disabled.eq(true),
			tickets::closed_at.eq(Some(closed_at)),
			tickets::closed_by.eq(Some(database_id_from_discord_id(closed_by.get()))),
		))
		.returning(Ticket::as_returning())
		.get_result(&mut db_connection)
		.optional()
		.into_diagnostic()?;
	let Some(closed) = closed else {
		return Err(TicketError::AlreadyClosed);
	};
	tracing::info!(guild = %ticket.get_guild(), ticket = ticket.guild_specific_id, "Closing ticket");

	let name = channel_name(&config.closed_name_prefix, ticket.guild_specific_id);
	let moved = async {
		ctx.http_client
			.update_channel(channel_id)
			.name(&name)
			.parent_id(Some(config.get_closed_category()))
			.reason("Ticket closed")
			.await
			.into_diagnostic()?;
		ctx.http_client
			.delete_channel_permission(channel_id)
			.member(ticket.get_owner())
			.reason("Ticket closed")
			.await
			.into_diagnostic()?;
		Ok::<(), miette::Report>(())
	}
	.await;
	undo_on_error(moved, || restore_state(&mut db_connection, ticket))?;

	let timestamp = timestamp_from_datetime(&closed_at).into_diagnostic()?;
	let embed = close_embed(&config, ticket, closed_by, timestamp).into_diagnostic()?;
	let components = [closed_ticket_buttons(ticket.id)];
	let close_message = ctx
		.http_client
		.create_message(channel_id)
		.embeds(&[embed])
		.components(&components)
		.allowed_mentions(Some(&AllowedMentions::default()))
		.await
		.into_diagnostic()?
		.model()
		.await
		.into_diagnostic()?;

	let closed: Ticket = diesel::update(tickets::table.find(closed.id))
		.set(tickets::close_message.eq(Some(database_id_from_discord_id(close_message.id.get()))))
		.returning(Ticket::as_returning())
		.get_result(&mut db_connection)
		.into_diagnostic()?;

	if !closed.private {
		spawn_transcript_export(ctx.clone(), closed.clone());
	}

	Ok(closed)
}

/// Reopens a closed ticket whose channel still exists, giving the owner their access back.
pub async fn reopen_ticket(
	ctx: &BotContext,
	ticket: &Ticket,
	reopened_by: Id<UserMarker>,
) -> Result<Ticket, TicketError> {
	if !ticket.disabled {
		return Err(TicketError::NotClosed);
	}
	let (Some(channel_id), None) = (ticket.get_channel(), ticket.channel_deleted_at) else {
		return Err(TicketError::NotFound);
	};

	let mut db_connection = ctx.db_connection_pool.get().into_diagnostic()?;
	let Some(config) = load_config(&mut db_connection, ticket.get_guild()).into_diagnostic()? else {
		return Err(TicketError::NotConfigured);
	};

	let reopened_at = Utc::now();
	let reopen_result = diesel::update(tickets::table.find(ticket.id).filter(tickets::disabled.eq(true)))
		.set((
			tickets::disabled.eq(false),
			tickets::reopened_at.eq(Some(reopened_at)),
			tickets::reopened_by.eq(Some(database_id_from_discord_id(reopened_by.get()))),
		))
		.returning(Ticket::as_returning())
		.get_result(&mut db_connection)
		.optional();
	let reopened = match reopen_result {
		Ok(Some(ticket)) => ticket,
		Ok(None) => return Err(TicketError::NotClosed),
		// The owner has opened another ticket since this one was closed.
		Err(DbError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => return Err(TicketError::AlreadyOpen),
		Err(error) => return Err(error).into_diagnostic().map_err(TicketError::from),
	};
	tracing::info!(guild = %ticket.get_guild(), ticket = ticket.guild_specific_id, "Reopening ticket");

	let name = channel_name(&config.opened_name_prefix, ticket.guild_specific_id);
	let owner_overwrite = member_overwrite(ticket.get_owner());
	let moved = async {
		ctx.http_client
			.update_channel(channel_id)
			.name(&name)
			.parent_id(Some(config.get_opened_category()))
			.reason("Ticket reopened")
			.await
			.into_diagnostic()?;
		ctx.http_client
			.update_channel_permission(channel_id, &owner_overwrite)
			.reason("Ticket reopened")
			.await
			.into_diagnostic()?;
		Ok::<(), miette::Report>(())
	}
	.await;
	undo_on_error(moved, || restore_state(&mut db_connection, ticket))?;

	let timestamp = timestamp_from_datetime(&reopened_at).into_diagnostic()?;
	let embed = reopen_embed(&config, ticket, reopened_by, timestamp).into_diagnostic()?;
	let components = [close_ticket_button(ticket.id)];
	let reopen_message = ctx
		.http_client
		.create_message(channel_id)
		.embeds(&[embed])
		.components(&components)
		.allowed_mentions(Some(&AllowedMentions::default()))
		.await
		.into_diagnostic()?
		.model()
		.await
		.into_diagnostic()?;

	let reopened: Ticket = diesel::update(tickets::table.find(reopened.id))
		.set(tickets::reopen_message.eq(Some(database_id_from_discord_id(reopen_message.id.get()))))
		.returning(Ticket::as_returning())
		.get_result(&mut db_connection)
		.into_diagnostic()?;

	Ok(reopened)
}

/// Deletes a closed ticket's channel. The ticket record itself is kept.
///
/// A channel that's already gone counts as deleted.
pub async fn delete_ticket(ctx: &BotContext, ticket: &Ticket) -> Result<Ticket, TicketError> {
	if !ticket.disabled {
		return Err(TicketError::NotClosed);
	}
	let (Some(channel_id), None) = (ticket.get_channel(), ticket.channel_deleted_at) else {
		return Err(TicketError::NotFound);
	};

	tracing::info!(guild = %ticket.get_guild(), ticket = ticket.guild_specific_id, "Deleting ticket channel");
	delete_ticket_channel(ctx, channel_id).await?;

	let mut db_connection = ctx.db_connection_pool.get().into_diagnostic()?;
	let deleted = mark_channel_deleted(&mut db_connection, ticket.id).into_diagnostic()?;
	Ok(deleted)
}

async fn delete_ticket_channel(ctx: &BotContext, channel_id: Id<ChannelMarker>) -> miette::Result<()> {
	let result = ctx.http_client.delete_channel(channel_id).reason("Ticket deleted").await;
	ignore_not_found(result)
}

/// Puts a ticket's open or closed state back the way it was before a change Discord didn't go through with.
fn restore_state(db_connection: &mut PgConnection, ticket: &Ticket) -> miette::Result<()> {
	diesel::update(tickets::table.find(ticket.id))
		.set((
			tickets::disabled.eq(ticket.disabled),
			tickets::closed_at.eq(ticket.closed_at),
			tickets::closed_by.eq(ticket.closed_by),
			tickets::reopened_at.eq(ticket.reopened_at),
			tickets::reopened_by.eq(ticket.reopened_by),
		))
		.execute(db_connection)
		.into_diagnostic()?;
	Ok(())
}

/// Records that a ticket's channel is gone, closing the ticket if it was still open.
pub fn mark_channel_deleted(db_connection: &mut PgConnection, ticket_id: i64) -> QueryResult<Ticket> {
	let now = Utc::now();
	db_connection.transaction(|db_connection| {
		diesel::update(tickets::table.find(ticket_id).filter(tickets::disabled.eq(false)))
			.set((tickets::disabled.eq(true), tickets::closed_at.eq(Some(now))))
			.execute(db_connection)?;
		diesel::update(tickets::table.find(ticket_id))
			.set(tickets::channel_deleted_at.eq(Some(now)))
			.returning(Ticket::as_returning())
			.get_result(db_connection)
	})
}

#[cfg(test)]
mod tests {
	use super::*;

	fn ticket(disabled: bool) -> Ticket {
		Ticket {
			id: 1,
			guild_specific_id: 7,
			guild: 100,
			owner: 200,
			channel: Some(3),
			disabled,
			private: false,
			added_users: Vec::new(),
			added_roles: Vec::new(),
			opened_at: Utc::now(),
			closed_at: disabled.then(Utc::now),
			closed_by: disabled.then_some(200),
			reopened_at: None,
			reopened_by: None,
			welcome_message: None,
			close_message: None,
			reopen_message: None,
			channel_deleted_at: None,
		}
	}

	async fn channel_deletion_response(status: usize, body: &str) -> miette::Result<()> {
		let mut server = mockito::Server::new_async().await;
		let mock = server
			.mock("DELETE", "/api/v10/channels/3")
			.with_status(status)
			.with_header("content-type", "application/json")
			.with_body(body)
			.create_async()
			.await;
		let ctx = BotContext::for_tests(Some(server.host_with_port()));
		let result = delete_ticket_channel(&ctx, Id::new(3)).await;
		mock.assert_async().await;
		result
	}

	#[tokio::test]
	async fn closed_tickets_cannot_be_closed_again() {
		let ctx = BotContext::for_tests(None);
		let result = close_ticket(&ctx, &ticket(true), Id::new(200)).await;
		assert!(matches!(result, Err(TicketError::AlreadyClosed)));
	}

	#[tokio::test]
	async fn open_tickets_cannot_be_reopened() {
		let ctx = BotContext::for_tests(None);
		let result = reopen_ticket(&ctx, &ticket(false), Id::new(200)).await;
		assert!(matches!(result, Err(TicketError::NotClosed)));
	}

	#[tokio::test]
	async fn tickets_with_deleted_channels_cannot_be_reopened() {
		let ctx = BotContext::for_tests(None);
		let mut ticket = ticket(true);
		ticket.channel_deleted_at = Some(Utc::now());
		let result = reopen_ticket(&ctx, &ticket, Id::new(200)).await;
		assert!(matches!(result, Err(TicketError::NotFound)));
	}

	#[tokio::test]
	async fn open_tickets_cannot_be_deleted() {
		let ctx = BotContext::for_tests(None);
		let result = delete_ticket(&ctx, &ticket(false)).await;
		assert!(matches!(result, Err(TicketError::NotClosed)));
	}

	#[tokio::test]
	async fn channels_already_gone_count_as_deleted() {
		let result = channel_deletion_response(404, r#"{"code": 10003, "message": "Unknown Channel"}"#).await;
		assert!(result.is_ok());
	}

	#[tokio::test]
	async fn refused_channel_deletion_is_an_error() {
		let result = channel_deletion_response(403, r#"{"code": 50013, "message": "Missing Permissions"}"#).await;
		assert!(result.is_err());
	}
}
