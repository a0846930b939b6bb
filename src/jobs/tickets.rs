// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::discord::BotContext;
use crate::discord::tickets::{TicketError, close_ticket, delete_ticket, mark_channel_deleted};
use crate::discord::utils::http::is_not_found;
use crate::discord::utils::timestamp::datetime_from_id;
use crate::model::{Ticket, TicketingConfig};
use crate::schema::{ticketing_configs, tickets};
use chrono::{DateTime, Duration, Utc};
use diesel::prelude::*;
use miette::IntoDiagnostic;
use std::time::Duration as StdDuration;
use tokio::time::sleep;

/// Pause between channel deletions so a big sweep doesn't run into rate limits.
const SWEEP_DELAY: StdDuration = StdDuration::from_secs(1);

/// The most recent sign of life in a ticket: its last message, or when it was opened or reopened.
fn last_activity(ticket: &Ticket, last_message_at: Option<DateTime<Utc>>) -> DateTime<Utc> {
	[Some(ticket.opened_at), ticket.reopened_at, last_message_at]
		.into_iter()
		.flatten()
		.max()
		.unwrap_or(ticket.opened_at)
}

fn is_past(since: DateTime<Utc>, after: Duration, now: DateTime<Utc>) -> bool {
	since.checked_add_signed(after).is_some_and(|deadline| deadline <= now)
}

fn configs_with<F>(ctx: &BotContext, filter: F) -> miette::Result<Vec<TicketingConfig>>
where
	F: Fn(&TicketingConfig) -> bool,
{
	let mut db_connection = ctx.db_connection_pool.get().into_diagnostic()?;
	let configs: Vec<TicketingConfig> = ticketing_configs::table.load(&mut db_connection).into_diagnostic()?;
	Ok(configs.into_iter().filter(filter).collect())
}

fn internal_error(error: TicketError) -> miette::Report {
	match error {
		TicketError::Internal(report) => report,
		error => miette::miette!("{}", error),
	}
}

pub async fn auto_close_tickets(ctx: &BotContext) {
	let configs = match configs_with(ctx, |config| config.auto_close_after_seconds.is_some()) {
		Ok(configs) => configs,
		Err(error) => {
			tracing::error!(source = ?error, "Failed to load ticketing configs for auto-close");
			return;
		}
	};
	for config in configs.iter() {
		if let Err(error) = auto_close_guild(ctx, config).await {
			tracing::error!(source = ?error, guild = %config.get_guild(), "Failed to auto-close tickets");
		}
	}
}

async fn auto_close_guild(ctx: &BotContext, config: &TicketingConfig) -> miette::Result<()> {
	let Some(after) = config.auto_close_after() else {
		return Ok(());
	};
	let open_tickets: Vec<Ticket> = {
		let mut db_connection = ctx.db_connection_pool.get().into_diagnostic()?;
		tickets::table
			.filter(tickets::guild.eq(config.guild))
			.filter(tickets::disabled.eq(false))
			.filter(tickets::channel.is_not_null())
			.filter(tickets::channel_deleted_at.is_null())
			.select(Ticket::as_select())
			.load(&mut db_connection)
			.into_diagnostic()?
	};

	let now = Utc::now();
	for ticket in open_tickets.iter() {
		let Some(channel_id) = ticket.get_channel() else {
			continue;
		};
		// Cheap check first: nothing can be inactive for longer than it's been open.
		if !is_past(last_activity(ticket, None), after, now) {
			continue;
		}
		let channel = match ctx.http_client.channel(channel_id).await {
			Ok(response) => response.model().await.into_diagnostic()?,
			Err(error) if is_not_found(&error) => {
				let mut db_connection = ctx.db_connection_pool.get().into_diagnostic()?;
				mark_channel_deleted(&mut db_connection, ticket.id).into_diagnostic()?;
				continue;
			}
			Err(error) => return Err(error).into_diagnostic(),
		};
		let last_message_at = channel.last_message_id.and_then(datetime_from_id);
		if !is_past(last_activity(ticket, last_message_at), after, now) {
			continue;
		}

		tracing::info!(guild = %config.get_guild(), ticket = ticket.guild_specific_id, "Auto-closing inactive ticket");
		close_ticket(ctx, ticket, ctx.bot_user_id).await.map_err(internal_error)?;
		sleep(SWEEP_DELAY).await;
	}
	Ok(())
}

pub async fn auto_clean_tickets(ctx: &BotContext) {
	let configs = match configs_with(ctx, |config| config.auto_clean_after_seconds.is_some()) {
		Ok(configs) => configs,
		Err(error) => {
			tracing::error!(source = ?error, "Failed to load ticketing configs for auto-clean");
			return;
		}
	};
	for config in configs.iter() {
		if let Err(error) = auto_clean_guild(ctx, config).await {
			tracing::error!(source = ?error, guild = %config.get_guild(), "Failed to auto-clean tickets");
		}
	}
}

async fn auto_clean_guild(ctx: &BotContext, config: &TicketingConfig) -> miette::Result<()> {
	let Some(after) = config.auto_clean_after() else {
		return Ok(());
	};
	let Some(cutoff) = Utc::now().checked_sub_signed(after) else {
		return Ok(());
	};
	let stale_tickets: Vec<Ticket> = {
		let mut db_connection = ctx.db_connection_pool.get().into_diagnostic()?;
		tickets::table
			.filter(tickets::guild.eq(config.guild))
			.filter(tickets::disabled.eq(true))
			.filter(tickets::channel.is_not_null())
			.filter(tickets::channel_deleted_at.is_null())
			.filter(tickets::closed_at.le(cutoff))
			.select(Ticket::as_select())
			.load(&mut db_connection)
			.into_diagnostic()?
	};

	for ticket in stale_tickets.iter() {
		tracing::info!(guild = %config.get_guild(), ticket = ticket.guild_specific_id, "Auto-cleaning closed ticket");
		// One stuck channel mustn't hold up the rest of the guild's sweep.
		if let Err(error) = delete_ticket(ctx, ticket).await {
			tracing::error!(source = ?internal_error(error), ticket = ticket.id, "Failed to auto-clean ticket");
		}
		sleep(SWEEP_DELAY).await;
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::TimeZone;

	fn ticket(opened_at: DateTime<Utc>, reopened_at: Option<DateTime<Utc>>) -> Ticket {
		Ticket {
			id: 1,
			guild_specific_id: 1,
			guild: 1,
			owner: 2,
			channel: Some(3),
			disabled: false,
			private: false,
			added_users: Vec::new(),
			added_roles: Vec::new(),
			opened_at,
			closed_at: None,
			closed_by: None,
			reopened_at,
			reopened_by: None,
			welcome_message: None,
			close_message: None,
			reopen_message: None,
			channel_deleted_at: None,
		}
	}

	fn at(seconds: i64) -> DateTime<Utc> {
		Utc.timestamp_opt(1_700_000_000 + seconds, 0).unwrap()
	}

	#[test]
	fn latest_of_open_reopen_and_message_counts() {
		assert_eq!(last_activity(&ticket(at(0), None), None), at(0));
		assert_eq!(last_activity(&ticket(at(0), Some(at(50))), Some(at(20))), at(50));
		assert_eq!(last_activity(&ticket(at(0), Some(at(50))), Some(at(90))), at(90));
	}

	#[test]
	fn deadline_is_inclusive() {
		let after = Duration::seconds(60);
		assert!(is_past(at(0), after, at(60)));
		assert!(!is_past(at(0), after, at(59)));
	}
}
