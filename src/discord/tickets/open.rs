// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use super::messages::welcome_embed;
use super::naming::channel_name;
use super::overwrites::{TicketParties, new_ticket_overwrites};
use super::{TicketError, find_open_ticket_for_owner, load_guild_and_config};
use crate::discord::context::BotContext;
use crate::discord::utils::shared_components::close_ticket_button;
use crate::discord::utils::timestamp::timestamp_from_datetime;
use crate::model::{NewTicket, Ticket, database_id_from_discord_id};
use crate::schema::{ticketing_configs, tickets};
use chrono::Utc;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DbError};
use miette::IntoDiagnostic;
use twilight_http::request::AuditLogReason;
use twilight_mention::fmt::Mention;
use twilight_model::channel::ChannelType;
use twilight_model::channel::message::AllowedMentions;
use twilight_model::id::Id;
use twilight_model::id::marker::{GuildMarker, UserMarker};

/// Opens a ticket for a user: records it with the next guild-specific ID, creates its channel in the opened category,
/// and posts the welcome message.
pub async fn open_ticket(
	ctx: &BotContext,
	guild_id: Id<GuildMarker>,
	owner: Id<UserMarker>,
) -> Result<Ticket, TicketError> {
	let mut db_connection = ctx.db_connection_pool.get().into_diagnostic()?;
	let (guild, config) = load_guild_and_config(&mut db_connection, guild_id)?;

	if find_open_ticket_for_owner(&mut db_connection, guild_id, owner)
		.into_diagnostic()?
		.is_some()
	{
		return Err(TicketError::AlreadyOpen);
	}

	let guild_specific_id: i64 = diesel::update(ticketing_configs::table.find(config.guild))
		.set(ticketing_configs::last_ticket_id.eq(ticketing_configs::last_ticket_id + 1))
		.returning(ticketing_configs::last_ticket_id)
		.get_result(&mut db_connection)
		.into_diagnostic()?;

	let opened_at = Utc::now();
	let new_ticket = NewTicket {
		guild_specific_id,
		guild: config.guild,
		owner: database_id_from_discord_id(owner.get()),
		opened_at,
	};
	let insert_result = diesel::insert_into(tickets::table)
		.values(new_ticket)
		.returning(Ticket::as_returning())
		.get_result(&mut db_connection);
	let ticket = match insert_result {
		Ok(ticket) => ticket,
		// Two opens can pass the lookup at the same time; the partial unique index catches the second one.
		Err(DbError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => return Err(TicketError::AlreadyOpen),
		Err(error) => return Err(error).into_diagnostic().map_err(TicketError::from),
	};
	tracing::info!(guild = %guild_id, owner = %owner, ticket = guild_specific_id, "Opening ticket");

	let moderator_roles = guild.get_moderator_roles();
	let parties = TicketParties {
		guild_id,
		owner,
		bot_user: ctx.bot_user_id,
		moderator_roles: &moderator_roles,
	};
	let overwrites = new_ticket_overwrites(&parties);
	let name = channel_name(&config.opened_name_prefix, guild_specific_id);
	let topic = format!("Support ticket for {}", owner.mention());

	let channel_result = ctx
		.http_client
		.create_guild_channel(guild_id, &name)
		.kind(ChannelType::GuildText)
		.parent_id(config.get_opened_category())
		.permission_overwrites(&overwrites)
		.topic(&topic)
		.reason("Ticket opened")
		.await;
	let channel = match channel_result {
		Ok(response) => response.model().await.into_diagnostic()?,
		Err(error) => {
			// Without a channel the ticket can never be used, so it must not block the user from opening another.
			diesel::update(tickets::table.find(ticket.id))
				.set((tickets::disabled.eq(true), tickets::closed_at.eq(Some(Utc::now()))))
				.execute(&mut db_connection)
				.into_diagnostic()?;
			return Err(error).into_diagnostic().map_err(TicketError::from);
		}
	};

	diesel::update(tickets::table.find(ticket.id))
		.set(tickets::channel.eq(Some(database_id_from_discord_id(channel.id.get()))))
		.execute(&mut db_connection)
		.into_diagnostic()?;

	let timestamp = timestamp_from_datetime(&opened_at).into_diagnostic()?;
	let embed = welcome_embed(&config, &ticket, timestamp).into_diagnostic()?;
	let components = [close_ticket_button(ticket.id)];
	let content = format!("{}", owner.mention());
	let mut allowed_mentions = AllowedMentions::default();
	allowed_mentions.users.push(owner);
	let welcome_message = ctx
		.http_client
		.create_message(channel.id)
		.content(&content)
		.embeds(&[embed])
		.components(&components)
		.allowed_mentions(Some(&allowed_mentions))
		.await
		.into_diagnostic()?
		.model()
		.await
		.into_diagnostic()?;

	let ticket: Ticket = diesel::update(tickets::table.find(ticket.id))
		.set(tickets::welcome_message.eq(Some(database_id_from_discord_id(welcome_message.id.get()))))
		.returning(Ticket::as_returning())
		.get_result(&mut db_connection)
		.into_diagnostic()?;

	Ok(ticket)
}
