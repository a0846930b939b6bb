// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::discord::context::BotContext;
use crate::discord::tickets::{find_ticket_by_channel, mark_channel_deleted};
use miette::IntoDiagnostic;
use twilight_model::gateway::payload::incoming::ChannelDelete;

/// A ticket channel deleted by hand closes its ticket and records that the channel is gone.
pub fn handle_channel_delete(ctx: &BotContext, channel: &ChannelDelete) -> miette::Result<()> {
	let mut db_connection = ctx.db_connection_pool.get().into_diagnostic()?;
	let Some(ticket) = find_ticket_by_channel(&mut db_connection, channel.id).into_diagnostic()? else {
		return Ok(());
	};
	if ticket.channel_deleted_at.is_some() {
		return Ok(());
	}
	mark_channel_deleted(&mut db_connection, ticket.id).into_diagnostic()?;
	tracing::info!(guild = %ticket.get_guild(), ticket = ticket.guild_specific_id, "Ticket channel was deleted");
	Ok(())
}
