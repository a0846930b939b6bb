// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use super::naming::display_name;
use crate::model::{Ticket, TicketingConfig};
use twilight_mention::fmt::Mention;
use twilight_model::channel::message::embed::Embed;
use twilight_model::id::Id;
use twilight_model::id::marker::UserMarker;
use twilight_model::util::datetime::Timestamp;
use twilight_util::builder::embed::{EmbedBuilder, EmbedFooterBuilder};
use twilight_validate::embed::EmbedValidationError;

pub fn welcome_embed(
	config: &TicketingConfig,
	ticket: &Ticket,
	timestamp: Timestamp,
) -> Result<Embed, EmbedValidationError> {
	let footer = EmbedFooterBuilder::new(format!("Opened by user {}", ticket.get_owner())).build();
	let embed = EmbedBuilder::new()
		.title(display_name(ticket.guild_specific_id))
		.description(&config.welcome_message)
		.color(config.embed_color())
		.footer(footer)
		.timestamp(timestamp)
		.validate()?
		.build();
	Ok(embed)
}

pub fn close_embed(
	config: &TicketingConfig,
	ticket: &Ticket,
	closed_by: Id<UserMarker>,
	timestamp: Timestamp,
) -> Result<Embed, EmbedValidationError> {
	let embed = EmbedBuilder::new()
		.title(format!("{} closed", display_name(ticket.guild_specific_id)))
		.description(format!("This ticket was closed by {}.", closed_by.mention()))
		.color(config.embed_color())
		.timestamp(timestamp)
		.validate()?
		.build();
	Ok(embed)
}

pub fn reopen_embed(
	config: &TicketingConfig,
	ticket: &Ticket,
	reopened_by: Id<UserMarker>,
	timestamp: Timestamp,
) -> Result<Embed, EmbedValidationError> {
	let embed = EmbedBuilder::new()
		.title(format!("{} reopened", display_name(ticket.guild_specific_id)))
		.description(format!("This ticket was reopened by {}.", reopened_by.mention()))
		.color(config.embed_color())
		.timestamp(timestamp)
		.validate()?
		.build();
	Ok(embed)
}

/// The embed posted with the "Open ticket" button.
pub fn center_message(config: &TicketingConfig) -> Result<Embed, EmbedValidationError> {
	let embed = EmbedBuilder::new()
		.title("Support tickets")
		.description(&config.center_message)
		.color(config.embed_color())
		.validate()?
		.build();
	Ok(embed)
}
