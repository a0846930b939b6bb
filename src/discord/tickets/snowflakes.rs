// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use super::overwrites::{TicketParties, added_snowflakes, member_overwrite, role_overwrite};
use super::privacy::classify;
use super::{TicketError, load_guild_and_config};
use crate::discord::context::BotContext;
use crate::discord::utils::options::Snowflake;
use crate::model::{Ticket, database_id_from_discord_id};
use crate::schema::tickets;
use diesel::prelude::*;
use miette::IntoDiagnostic;
use tokio::time::{Duration, sleep};
use twilight_http::request::AuditLogReason;
use twilight_model::id::Id;
use twilight_model::id::marker::{ChannelMarker, RoleMarker};

/// Discord takes a moment to reflect overwrite changes when the channel is read back.
const OVERWRITE_SETTLE_DELAY: Duration = Duration::from_millis(500);

/// Gives a member or role access to a ticket's channel.
pub async fn add_snowflake(ctx: &BotContext, ticket: &Ticket, target: Snowflake) -> Result<Ticket, TicketError> {
	let channel_id = validate_target(ctx, ticket, target)?;
	let overwrite = match target {
		Snowflake::User(user) => member_overwrite(user),
		Snowflake::Role(role) => role_overwrite(role),
	};
	ctx.http_client
		.update_channel_permission(channel_id, &overwrite)
		.reason("Added to ticket")
		.await
		.into_diagnostic()?;
	refresh_snowflakes(ctx, ticket, channel_id).await
}

/// Takes a member's or role's access to a ticket's channel away.
pub async fn remove_snowflake(ctx: &BotContext, ticket: &Ticket, target: Snowflake) -> Result<Ticket, TicketError> {
	let channel_id = validate_target(ctx, ticket, target)?;
	let request = ctx.http_client.delete_channel_permission(channel_id);
	match target {
		Snowflake::User(user) => request.member(user).reason("Removed from ticket").await,
		Snowflake::Role(role) => request.role(role).reason("Removed from ticket").await,
	}
	.into_diagnostic()?;
	refresh_snowflakes(ctx, ticket, channel_id).await
}

fn validate_target(ctx: &BotContext, ticket: &Ticket, target: Snowflake) -> Result<Id<ChannelMarker>, TicketError> {
	if ticket.disabled {
		return Err(TicketError::Disabled);
	}
	let Some(channel_id) = ticket.get_channel() else {
		return Err(TicketError::NotFound);
	};
	match target {
		Snowflake::User(user) if user == ticket.get_owner() => Err(TicketError::InvalidTarget(
			"The ticket's owner always has access to the ticket.",
		)),
		Snowflake::User(user) if user == ctx.bot_user_id => {
			Err(TicketError::InvalidTarget("I always have access to the ticket."))
		}
		Snowflake::Role(role) if role == ticket.get_guild().cast::<RoleMarker>() => Err(TicketError::InvalidTarget(
			"Tickets can't be opened up to everyone.",
		)),
		_ => Ok(channel_id),
	}
}

/// Re-reads the channel's overwrites to rebuild the ticket's added users and roles, then reclassifies its privacy.
async fn refresh_snowflakes(
	ctx: &BotContext,
	ticket: &Ticket,
	channel_id: Id<ChannelMarker>,
) -> Result<Ticket, TicketError> {
	sleep(OVERWRITE_SETTLE_DELAY).await;
	let channel = ctx
		.http_client
		.channel(channel_id)
		.await
		.into_diagnostic()?
		.model()
		.await
		.into_diagnostic()?;
	let overwrites = channel.permission_overwrites.unwrap_or_default();

	let mut db_connection = ctx.db_connection_pool.get().into_diagnostic()?;
	let (guild, _) = load_guild_and_config(&mut db_connection, ticket.get_guild())?;
	let moderator_roles = guild.get_moderator_roles();
	let parties = TicketParties {
		guild_id: ticket.get_guild(),
		owner: ticket.get_owner(),
		bot_user: ctx.bot_user_id,
		moderator_roles: &moderator_roles,
	};
	let (added_users, added_roles) = added_snowflakes(&overwrites, &parties);
	let private = classify(&ctx.http_client, ticket.get_guild(), ticket.get_owner(), &added_users).await?;

	let added_users: Vec<i64> = added_users
		.iter()
		.map(|user| database_id_from_discord_id(user.get()))
		.collect();
	let added_roles: Vec<i64> = added_roles
		.iter()
		.map(|role| database_id_from_discord_id(role.get()))
		.collect();
	let ticket: Ticket = diesel::update(tickets::table.find(ticket.id))
		.set((
			tickets::added_users.eq(added_users),
			tickets::added_roles.eq(added_roles),
			tickets::private.eq(private),
		))
		.returning(Ticket::as_returning())
		.get_result(&mut db_connection)
		.into_diagnostic()?;
	tracing::debug!(ticket = ticket.id, private, "Recomputed ticket access");
	Ok(ticket)
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::Utc;

	const GUILD: u64 = 100;
	const OWNER: u64 = 200;

	fn open_ticket() -> Ticket {
		Ticket {
			id: 1,
			guild_specific_id: 7,
			guild: GUILD as i64,
			owner: OWNER as i64,
			channel: Some(3),
			disabled: false,
			private: false,
			added_users: Vec::new(),
			added_roles: Vec::new(),
			opened_at: Utc::now(),
			closed_at: None,
			closed_by: None,
			reopened_at: None,
			reopened_by: None,
			welcome_message: None,
			close_message: None,
			reopen_message: None,
			channel_deleted_at: None,
		}
	}

	#[test]
	fn fixed_parties_cannot_be_targeted() {
		let ctx = BotContext::for_tests(None);
		let ticket = open_ticket();
		for target in [
			Snowflake::User(Id::new(OWNER)),
			Snowflake::User(ctx.bot_user_id),
			Snowflake::Role(Id::new(GUILD)),
		] {
			let result = validate_target(&ctx, &ticket, target);
			assert!(matches!(result, Err(TicketError::InvalidTarget(_))));
		}
	}

	#[test]
	fn other_members_and_roles_can_be_targeted() {
		let ctx = BotContext::for_tests(None);
		let ticket = open_ticket();
		for target in [Snowflake::User(Id::new(501)), Snowflake::Role(Id::new(502))] {
			assert_eq!(validate_target(&ctx, &ticket, target).unwrap(), Id::new(3));
		}
	}

	#[test]
	fn closed_tickets_cannot_change_access() {
		let ctx = BotContext::for_tests(None);
		let mut ticket = open_ticket();
		ticket.disabled = true;
		let result = validate_target(&ctx, &ticket, Snowflake::User(Id::new(501)));
		assert!(matches!(result, Err(TicketError::Disabled)));
	}
}
