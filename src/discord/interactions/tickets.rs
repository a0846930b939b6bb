// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::discord::commands::ticket::{TicketAction, handle_open, run_ticket_action};
use crate::discord::context::BotContext;
use crate::discord::tickets::{TicketError, find_ticket};
use crate::discord::utils::responses::ephemeral_reply;
use miette::{IntoDiagnostic, bail};
use twilight_model::gateway::payload::incoming::InteractionCreate;

/// The "Open ticket" button opens a ticket for whoever pressed it.
pub async fn handle_open_button(ctx: &BotContext, interaction: &InteractionCreate) -> miette::Result<()> {
	let Some(guild_id) = interaction.guild_id else {
		bail!("Open ticket button was pressed outside of a guild");
	};
	let Some(user_id) = interaction.author_id() else {
		bail!("Open ticket button was pressed without an invoking user");
	};
	handle_open(ctx, interaction, guild_id, user_id).await
}

pub async fn handle_ticket_button(
	ctx: &BotContext,
	interaction: &InteractionCreate,
	action: TicketAction,
	ticket_id: i64,
) -> miette::Result<()> {
	let ticket = {
		let mut db_connection = ctx.db_connection_pool.get().into_diagnostic()?;
		find_ticket(&mut db_connection, ticket_id).into_diagnostic()?
	};
	let Some(ticket) = ticket.filter(|ticket| Some(ticket.get_guild()) == interaction.guild_id) else {
		return ephemeral_reply(ctx, interaction, &TicketError::NotFound.to_string()).await;
	};
	run_ticket_action(ctx, interaction, ticket, action).await
}
