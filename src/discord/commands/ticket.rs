// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use super::invocation;
use crate::discord::context::BotContext;
use crate::discord::tickets::transcript::export_transcript;
use crate::discord::tickets::{
	TicketError, add_snowflake, center_message, close_ticket, delete_ticket, find_ticket_by_channel, load_config,
	open_ticket, remove_snowflake, reopen_ticket,
};
use crate::discord::utils::options::{self, Snowflake};
use crate::discord::utils::permissions::interaction_member_is_staff;
use crate::discord::utils::responses::{
	MISSING_PERMISSIONS, NOT_A_TICKET_CHANNEL, TICKETING_NOT_SET_UP, defer, ephemeral_reply, update_deferred,
};
use crate::discord::utils::shared_components::open_ticket_button;
use crate::model::Ticket;
use miette::{IntoDiagnostic, bail};
use twilight_mention::fmt::Mention;
use twilight_model::application::command::{Command, CommandType};
use twilight_model::application::interaction::InteractionContextType;
use twilight_model::application::interaction::application_command::CommandData;
use twilight_model::gateway::payload::incoming::InteractionCreate;
use twilight_model::id::Id;
use twilight_model::id::marker::{GuildMarker, UserMarker};
use twilight_util::builder::command::{CommandBuilder, MentionableBuilder, SubCommandBuilder, UserBuilder};

pub fn command_definition() -> Command {
	let open = SubCommandBuilder::new("open", "Open a support ticket")
		.option(UserBuilder::new("user", "Staff only: open the ticket on behalf of this user"));
	let close = SubCommandBuilder::new("close", "Close the ticket in this channel");
	let reopen = SubCommandBuilder::new("reopen", "Reopen the closed ticket in this channel");
	let add = SubCommandBuilder::new("add", "Give a member or role access to this ticket")
		.option(MentionableBuilder::new("target", "The member or role to add").required(true));
	let remove = SubCommandBuilder::new("remove", "Take a member's or role's access to this ticket away")
		.option(MentionableBuilder::new("target", "The member or role to remove").required(true));
	let delete = SubCommandBuilder::new("delete", "Delete the channel of the closed ticket in this channel");
	let transcript = SubCommandBuilder::new("transcript", "Post a transcript of this ticket to the ticket log");
	let center = SubCommandBuilder::new("center", "Post the message with the \"Open ticket\" button in this channel");

	CommandBuilder::new("ticket", "Manage support tickets", CommandType::ChatInput)
		.contexts([InteractionContextType::Guild])
		.option(open)
		.option(close)
		.option(reopen)
		.option(add)
		.option(remove)
		.option(delete)
		.option(transcript)
		.option(center)
		.build()
}

/// Ticket actions available both as subcommands and as buttons on ticket messages.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TicketAction {
	Close,
	Reopen,
	Delete,
	Transcript,
}

pub async fn handle_command(
	ctx: &BotContext,
	interaction: &InteractionCreate,
	command_data: &CommandData,
) -> miette::Result<()> {
	let (guild_id, user_id) = invocation(interaction, "Ticket")?;
	let Some((subcommand, subcommand_options)) = options::subcommand(&command_data.options) else {
		bail!("Ticket command invoked with no subcommand");
	};

	match subcommand {
		"open" => {
			let owner = options::user(subcommand_options, "user").unwrap_or(user_id);
			if owner != user_id && !interaction_member_is_staff(ctx, interaction, guild_id)? {
				return ephemeral_reply(ctx, interaction, MISSING_PERMISSIONS).await;
			}
			handle_open(ctx, interaction, guild_id, owner).await
		}
		"center" => handle_center(ctx, interaction, guild_id).await,
		"close" | "reopen" | "delete" | "transcript" => {
			let action = match subcommand {
				"close" => TicketAction::Close,
				"reopen" => TicketAction::Reopen,
				"delete" => TicketAction::Delete,
				_ => TicketAction::Transcript,
			};
			let Some(ticket) = ticket_in_channel(ctx, interaction, guild_id)? else {
				return ephemeral_reply(ctx, interaction, NOT_A_TICKET_CHANNEL).await;
			};
			run_ticket_action(ctx, interaction, ticket, action).await
		}
		"add" | "remove" => {
			let Some(target) = options::mentionable(command_data, subcommand_options, "target") else {
				bail!("Ticket {} subcommand received without a resolvable target", subcommand);
			};
			let Some(ticket) = ticket_in_channel(ctx, interaction, guild_id)? else {
				return ephemeral_reply(ctx, interaction, NOT_A_TICKET_CHANNEL).await;
			};
			handle_snowflake(ctx, interaction, ticket, target, subcommand == "add").await
		}
		_ => bail!("Unknown ticket subcommand: {}", subcommand),
	}
}

fn ticket_in_channel(
	ctx: &BotContext,
	interaction: &InteractionCreate,
	guild_id: Id<GuildMarker>,
) -> miette::Result<Option<Ticket>> {
	let Some(channel_id) = interaction.channel.as_ref().map(|channel| channel.id) else {
		return Ok(None);
	};
	let mut db_connection = ctx.db_connection_pool.get().into_diagnostic()?;
	let ticket = find_ticket_by_channel(&mut db_connection, channel_id).into_diagnostic()?;
	Ok(ticket.filter(|ticket| ticket.get_guild() == guild_id))
}

/// Opens a ticket for `owner` and tells the invoking user where it is.
pub async fn handle_open(
	ctx: &BotContext,
	interaction: &InteractionCreate,
	guild_id: Id<GuildMarker>,
	owner: Id<UserMarker>,
) -> miette::Result<()> {
	defer(ctx, interaction, true).await?;
	let message = match open_ticket(ctx, guild_id, owner).await {
		Ok(ticket) => match ticket.get_channel() {
			Some(channel) => format!("The ticket is open: {}", channel.mention()),
			None => String::from("The ticket is open."),
		},
		Err(TicketError::NotConfigured) => String::from(TICKETING_NOT_SET_UP),
		Err(error) => error.into_user_message()?,
	};
	update_deferred(ctx, interaction, &message).await
}

async fn handle_center(ctx: &BotContext, interaction: &InteractionCreate, guild_id: Id<GuildMarker>) -> miette::Result<()> {
	if !interaction_member_is_staff(ctx, interaction, guild_id)? {
		return ephemeral_reply(ctx, interaction, MISSING_PERMISSIONS).await;
	}
	let Some(channel_id) = interaction.channel.as_ref().map(|channel| channel.id) else {
		bail!("Ticket center subcommand was used without a channel");
	};
	let config = {
		let mut db_connection = ctx.db_connection_pool.get().into_diagnostic()?;
		load_config(&mut db_connection, guild_id).into_diagnostic()?
	};
	let Some(config) = config else {
		return ephemeral_reply(ctx, interaction, TICKETING_NOT_SET_UP).await;
	};

	let embed = center_message(&config).into_diagnostic()?;
	let components = [open_ticket_button()];
	ctx.http_client
		.create_message(channel_id)
		.embeds(&[embed])
		.components(&components)
		.await
		.into_diagnostic()?;
	ephemeral_reply(ctx, interaction, "Posted the ticket center message.").await
}

async fn handle_snowflake(
	ctx: &BotContext,
	interaction: &InteractionCreate,
	ticket: Ticket,
	target: Snowflake,
	add: bool,
) -> miette::Result<()> {
	if !interaction_member_is_staff(ctx, interaction, ticket.get_guild())? {
		return ephemeral_reply(ctx, interaction, MISSING_PERMISSIONS).await;
	}
	let mention = match target {
		Snowflake::User(user) => user.mention().to_string(),
		Snowflake::Role(role) => role.mention().to_string(),
	};

	defer(ctx, interaction, true).await?;
	let result = if add {
		add_snowflake(ctx, &ticket, target).await
	} else {
		remove_snowflake(ctx, &ticket, target).await
	};
	let message = match result {
		Ok(ticket) => {
			let privacy = if ticket.private { " The ticket is private." } else { "" };
			if add {
				format!("Added {} to the ticket.{}", mention, privacy)
			} else {
				format!("Removed {} from the ticket.{}", mention, privacy)
			}
		}
		Err(error) => error.into_user_message()?,
	};
	update_deferred(ctx, interaction, &message).await
}

/// Runs a ticket action for the invoking member. Owners may close their own tickets; everything else is for staff.
pub async fn run_ticket_action(
	ctx: &BotContext,
	interaction: &InteractionCreate,
	ticket: Ticket,
	action: TicketAction,
) -> miette::Result<()> {
	let Some(user_id) = interaction.author_id() else {
		bail!("Ticket action received without an invoking user");
	};
	let is_owner = user_id == ticket.get_owner();
	let allowed = (action == TicketAction::Close && is_owner)
		|| interaction_member_is_staff(ctx, interaction, ticket.get_guild())?;
	if !allowed {
		return ephemeral_reply(ctx, interaction, &TicketError::NotAuthorized.to_string()).await;
	}

	let message = match action {
		TicketAction::Delete => return delete_closed_ticket(ctx, interaction, &ticket).await,
		TicketAction::Close => {
			defer(ctx, interaction, true).await?;
			match close_ticket(ctx, &ticket, user_id).await {
				Ok(_) => String::from("The ticket has been closed."),
				Err(error) => error.into_user_message()?,
			}
		}
		TicketAction::Reopen => {
			defer(ctx, interaction, true).await?;
			match reopen_ticket(ctx, &ticket, user_id).await {
				Ok(_) => String::from("The ticket has been reopened."),
				Err(error) => error.into_user_message()?,
			}
		}
		TicketAction::Transcript => {
			if ticket.channel_deleted_at.is_some() {
				return ephemeral_reply(ctx, interaction, &TicketError::NotFound.to_string()).await;
			}
			defer(ctx, interaction, true).await?;
			export_transcript(ctx, &ticket).await?;
			String::from("The transcript has been posted to the ticket log.")
		}
	};
	update_deferred(ctx, interaction, &message).await
}

/// The reply has to go out before the channel it would be shown in disappears.
async fn delete_closed_ticket(ctx: &BotContext, interaction: &InteractionCreate, ticket: &Ticket) -> miette::Result<()> {
	if !ticket.disabled {
		return ephemeral_reply(ctx, interaction, &TicketError::NotClosed.to_string()).await;
	}
	ephemeral_reply(ctx, interaction, "Deleting the ticket channel.").await?;
	if let Err(error) = delete_ticket(ctx, ticket).await {
		let reason = error.into_user_message()?;
		tracing::warn!(ticket = ticket.id, %reason, "Ticket channel couldn't be deleted");
	}
	Ok(())
}
