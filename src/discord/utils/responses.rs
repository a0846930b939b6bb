// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::discord::context::BotContext;
use miette::IntoDiagnostic;
use twilight_model::channel::message::{AllowedMentions, MessageFlags};
use twilight_model::gateway::payload::incoming::InteractionCreate;
use twilight_model::http::interaction::{InteractionResponse, InteractionResponseType};
use twilight_util::builder::InteractionResponseDataBuilder;

pub const TICKETING_NOT_SET_UP: &str =
	"Ticketing isn't set up on this server. Use `/admin-util module ticketing` to set it up.";
pub const NOT_A_TICKET_CHANNEL: &str = "This command is only useful in a ticket channel.";
pub const MISSING_PERMISSIONS: &str = "You don't have permission to do that.";

/// Responds to the interaction with a message only the invoking user can see.
pub async fn ephemeral_reply(ctx: &BotContext, interaction: &InteractionCreate, content: &str) -> miette::Result<()> {
	let response = InteractionResponseDataBuilder::new()
		.content(content)
		.flags(MessageFlags::EPHEMERAL)
		.allowed_mentions(AllowedMentions::default())
		.build();
	let response = InteractionResponse {
		kind: InteractionResponseType::ChannelMessageWithSource,
		data: Some(response),
	};
	ctx.interaction_client()
		.create_response(interaction.id, &interaction.token, &response)
		.await
		.into_diagnostic()?;
	Ok(())
}

/// Responds to the interaction with a message in the channel. Mentions in the content don't ping.
pub async fn reply(ctx: &BotContext, interaction: &InteractionCreate, content: &str) -> miette::Result<()> {
	let response = InteractionResponseDataBuilder::new()
		.content(content)
		.allowed_mentions(AllowedMentions::default())
		.build();
	let response = InteractionResponse {
		kind: InteractionResponseType::ChannelMessageWithSource,
		data: Some(response),
	};
	ctx.interaction_client()
		.create_response(interaction.id, &interaction.token, &response)
		.await
		.into_diagnostic()?;
	Ok(())
}

/// Acknowledges the interaction so that slower work (channel creation, history walks) can finish before the real
/// response is given through [update_deferred].
pub async fn defer(ctx: &BotContext, interaction: &InteractionCreate, ephemeral: bool) -> miette::Result<()> {
	let data = if ephemeral {
		Some(InteractionResponseDataBuilder::new().flags(MessageFlags::EPHEMERAL).build())
	} else {
		None
	};
	let response = InteractionResponse {
		kind: InteractionResponseType::DeferredChannelMessageWithSource,
		data,
	};
	ctx.interaction_client()
		.create_response(interaction.id, &interaction.token, &response)
		.await
		.into_diagnostic()?;
	Ok(())
}

pub async fn update_deferred(ctx: &BotContext, interaction: &InteractionCreate, content: &str) -> miette::Result<()> {
	ctx.interaction_client()
		.update_response(&interaction.token)
		.content(Some(content))
		.allowed_mentions(Some(&AllowedMentions::default()))
		.await
		.into_diagnostic()?;
	Ok(())
}
