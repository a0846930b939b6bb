// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::discord::commands::ticket::TicketAction;
use crate::discord::context::BotContext;
use miette::bail;
use twilight_model::application::interaction::message_component::MessageComponentInteractionData;
use twilight_model::gateway::payload::incoming::InteractionCreate;

mod role_menu;
mod tickets;

/// What a component's custom ID asks for.
#[derive(Debug, Eq, PartialEq)]
enum ComponentTarget<'a> {
	OpenTicket,
	Ticket(TicketAction, i64),
	RoleMenu(&'a str),
}

fn parse_custom_id(custom_id: &str) -> Option<ComponentTarget<'_>> {
	let mut custom_id_path = custom_id.split('/');
	let target = match (custom_id_path.next()?, custom_id_path.next()?) {
		("ticket", "open") => ComponentTarget::OpenTicket,
		("ticket", action) => {
			let action = match action {
				"close" => TicketAction::Close,
				"reopen" => TicketAction::Reopen,
				"delete" => TicketAction::Delete,
				"transcript" => TicketAction::Transcript,
				_ => return None,
			};
			let ticket_id = custom_id_path.next()?.parse().ok()?;
			ComponentTarget::Ticket(action, ticket_id)
		}
		("role_menu", menu_id) if !menu_id.is_empty() => ComponentTarget::RoleMenu(menu_id),
		_ => return None,
	};
	if custom_id_path.next().is_some() {
		return None;
	}
	Some(target)
}

pub async fn route_interaction(
	ctx: &BotContext,
	interaction: &InteractionCreate,
	interaction_data: &MessageComponentInteractionData,
) -> miette::Result<()> {
	match parse_custom_id(&interaction_data.custom_id) {
		Some(ComponentTarget::OpenTicket) => tickets::handle_open_button(ctx, interaction).await,
		Some(ComponentTarget::Ticket(action, ticket_id)) => {
			tickets::handle_ticket_button(ctx, interaction, action, ticket_id).await
		}
		Some(ComponentTarget::RoleMenu(menu_id)) => {
			role_menu::handle_selection(ctx, interaction, menu_id, &interaction_data.values).await
		}
		None => bail!("Unknown component interaction: {}", interaction_data.custom_id),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn ticket_buttons_parse() {
		assert_eq!(parse_custom_id("ticket/open"), Some(ComponentTarget::OpenTicket));
		assert_eq!(
			parse_custom_id("ticket/close/12"),
			Some(ComponentTarget::Ticket(TicketAction::Close, 12))
		);
		assert_eq!(
			parse_custom_id("ticket/transcript/7"),
			Some(ComponentTarget::Ticket(TicketAction::Transcript, 7))
		);
	}

	#[test]
	fn role_menus_parse() {
		assert_eq!(
			parse_custom_id("role_menu/ckabc123"),
			Some(ComponentTarget::RoleMenu("ckabc123"))
		);
	}

	#[test]
	fn malformed_ids_are_rejected() {
		assert_eq!(parse_custom_id("ticket/close"), None);
		assert_eq!(parse_custom_id("ticket/close/abc"), None);
		assert_eq!(parse_custom_id("ticket/open/3"), None);
		assert_eq!(parse_custom_id("ticket/explode/3"), None);
		assert_eq!(parse_custom_id("role_menu/"), None);
		assert_eq!(parse_custom_id("setup"), None);
	}
}
