// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The ticket lifecycle: a persisted [Ticket] tied to a Discord channel that moves between the guild's opened and
//! closed categories.
//!
//! Operations return [TicketError] for conditions the invoking user should be told about. Database and Discord
//! failures are carried in [TicketError::Internal] and end up in the gateway event error log.

use crate::model::{Guild, Ticket, TicketingConfig, database_id_from_discord_id};
use crate::schema::{guilds, ticketing_configs, tickets};
use diesel::prelude::*;
use miette::{Diagnostic, IntoDiagnostic};
use std::fmt;
use twilight_model::id::Id;
use twilight_model::id::marker::{ChannelMarker, GuildMarker, UserMarker};

mod lifecycle;
mod messages;
mod naming;
mod open;
mod overwrites;
mod privacy;
mod snowflakes;
pub mod transcript;

pub use lifecycle::{close_ticket, delete_ticket, mark_channel_deleted, reopen_ticket};
pub use messages::center_message;
pub use open::open_ticket;
pub use snowflakes::{add_snowflake, remove_snowflake};

#[derive(Debug)]
pub enum TicketError {
	NotConfigured,
	AlreadyOpen,
	AlreadyClosed,
	NotClosed,
	NotFound,
	Disabled,
	NotAuthorized,
	InvalidTarget(&'static str),
	Internal(miette::Report),
}

impl fmt::Display for TicketError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::NotConfigured => write!(f, "Ticketing isn't set up on this server."),
			Self::AlreadyOpen => write!(f, "The user already has an opened ticket on this server."),
			Self::AlreadyClosed => write!(f, "This ticket is already closed."),
			Self::NotClosed => write!(f, "This ticket is not closed."),
			Self::NotFound => write!(f, "The ticket or its channel couldn't be found."),
			Self::Disabled => write!(f, "This ticket is closed; reopen it first."),
			Self::NotAuthorized => write!(f, "You don't have permission to do that with this ticket."),
			Self::InvalidTarget(reason) => write!(f, "{}", reason),
			Self::Internal(report) => write!(f, "{}", report),
		}
	}
}

impl std::error::Error for TicketError {}

impl Diagnostic for TicketError {}

impl From<miette::Report> for TicketError {
	fn from(report: miette::Report) -> Self {
		Self::Internal(report)
	}
}

impl TicketError {
	/// Splits user-facing errors from internal ones. Internal errors are returned as the outer error.
	pub fn into_user_message(self) -> miette::Result<String> {
		match self {
			Self::Internal(report) => Err(report),
			error => Ok(error.to_string()),
		}
	}
}

pub fn find_ticket_by_channel(
	db_connection: &mut PgConnection,
	channel_id: Id<ChannelMarker>,
) -> QueryResult<Option<Ticket>> {
	tickets::table
		.filter(tickets::channel.eq(database_id_from_discord_id(channel_id.get())))
		.select(Ticket::as_select())
		.first(db_connection)
		.optional()
}

pub fn find_ticket(db_connection: &mut PgConnection, ticket_id: i64) -> QueryResult<Option<Ticket>> {
	tickets::table
		.find(ticket_id)
		.select(Ticket::as_select())
		.first(db_connection)
		.optional()
}

pub fn find_open_ticket_for_owner(
	db_connection: &mut PgConnection,
	guild_id: Id<GuildMarker>,
	owner: Id<UserMarker>,
) -> QueryResult<Option<Ticket>> {
	tickets::table
		.filter(tickets::guild.eq(database_id_from_discord_id(guild_id.get())))
		.filter(tickets::owner.eq(database_id_from_discord_id(owner.get())))
		.filter(tickets::disabled.eq(false))
		.select(Ticket::as_select())
		.first(db_connection)
		.optional()
}

pub fn load_config(db_connection: &mut PgConnection, guild_id: Id<GuildMarker>) -> QueryResult<Option<TicketingConfig>> {
	ticketing_configs::table
		.find(database_id_from_discord_id(guild_id.get()))
		.first(db_connection)
		.optional()
}

/// Gets the guild settings along with its ticketing config.
fn load_guild_and_config(
	db_connection: &mut PgConnection,
	guild_id: Id<GuildMarker>,
) -> Result<(Guild, TicketingConfig), TicketError> {
	let db_guild_id = database_id_from_discord_id(guild_id.get());
	let guild: Option<Guild> = guilds::table
		.find(db_guild_id)
		.first(db_connection)
		.optional()
		.into_diagnostic()?;
	let config = load_config(db_connection, guild_id).into_diagnostic()?;
	match (guild, config) {
		(Some(guild), Some(config)) => Ok((guild, config)),
		_ => Err(TicketError::NotConfigured),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn user_facing_errors_become_messages() {
		let message = TicketError::AlreadyOpen.into_user_message().unwrap();
		assert!(message.contains("already has an opened ticket"));
		assert!(TicketError::AlreadyClosed.to_string().contains("already closed"));
		assert!(TicketError::NotClosed.to_string().contains("not closed"));
	}

	#[test]
	fn internal_errors_stay_errors() {
		let error = TicketError::Internal(miette::miette!("database went away"));
		assert!(error.into_user_message().is_err());
	}
}
