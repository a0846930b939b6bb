// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use super::commands::{command_definitions, route_command};
use super::context::BotContext;
use super::events::route_events;
use super::interactions::route_interaction;
use crate::config::ConfigData;
use crate::database::DbPool;
use miette::IntoDiagnostic;
use std::sync::Arc;
use twilight_gateway::{EventTypeFlags, Intents, Shard, ShardId, StreamExt};
use twilight_http::client::Client;
use twilight_model::application::interaction::InteractionData;
use twilight_model::gateway::event::Event;

pub fn set_up_client(config: &ConfigData) -> Arc<Client> {
	Arc::new(Client::new(config.discord.bot_token.clone()))
}

/// Looks up who the bot is and registers its commands. The returned context is shared by every handler and job.
pub async fn set_up_context(http_client: Arc<Client>, db_connection_pool: DbPool) -> miette::Result<BotContext> {
	let application_id = {
		let application_response = http_client.current_user_application().await.into_diagnostic()?;
		application_response.model().await.into_diagnostic()?.id
	};
	let bot_user_id = {
		let user_response = http_client.current_user().await.into_diagnostic()?;
		user_response.model().await.into_diagnostic()?.id
	};

	{
		let interaction_client = http_client.interaction(application_id);
		let commands = command_definitions();
		interaction_client
			.set_global_commands(&commands)
			.await
			.into_diagnostic()?;
	}

	Ok(BotContext {
		http_client,
		application_id,
		bot_user_id,
		db_connection_pool,
	})
}

pub async fn run_bot(ctx: BotContext, config: Arc<ConfigData>) -> miette::Result<()> {
	let intents = Intents::GUILDS | Intents::GUILD_MEMBERS | Intents::GUILD_MODERATION | Intents::GUILD_MESSAGES;

	let mut shard = Shard::new(ShardId::ONE, config.discord.bot_token.clone(), intents);

	while let Some(event) = shard.next_event(EventTypeFlags::all()).await {
		let event = match event {
			Ok(event) => event,
			Err(error) => {
				tracing::warn!(source = ?error, "error receiving event");
				continue;
			}
		};

		tokio::spawn(handle_event(event, ctx.clone()));
	}

	Ok(())
}

async fn handle_event(event: Event, ctx: BotContext) {
	let event_result = handle_event_route(event, &ctx).await;
	if let Err(error) = event_result {
		tracing::error!(source = ?error, "An error occurred handling a gateway event");
	}
}

async fn handle_event_route(event: Event, ctx: &BotContext) -> miette::Result<()> {
	tracing::debug!("Incoming gateway message: {:?}", event);
	match &event {
		Event::InteractionCreate(interaction) => match &interaction.data {
			Some(InteractionData::ApplicationCommand(command_data)) => {
				route_command(ctx, interaction, command_data).await?;
			}
			Some(InteractionData::MessageComponent(interaction_data)) => {
				route_interaction(ctx, interaction, interaction_data).await?;
			}
			_ => (),
		},
		Event::Ready(_) => {
			tracing::info!("Discord gateway is ready");
		}
		_ => route_events(ctx, &event).await?,
	}
	Ok(())
}
