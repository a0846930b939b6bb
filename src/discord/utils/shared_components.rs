// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use twilight_model::channel::message::component::{ActionRow, Button, ButtonStyle, Component};

fn button(custom_id: String, label: &str, style: ButtonStyle) -> Component {
	Component::Button(Button {
		custom_id: Some(custom_id),
		disabled: false,
		emoji: None,
		label: Some(String::from(label)),
		style,
		url: None,
		sku_id: None,
	})
}

/// The button on the ticket center message.
pub fn open_ticket_button() -> Component {
	Component::ActionRow(ActionRow {
		components: vec![button(String::from("ticket/open"), "Open ticket", ButtonStyle::Primary)],
	})
}

/// The button on a ticket's welcome and reopen messages.
pub fn close_ticket_button(ticket_id: i64) -> Component {
	Component::ActionRow(ActionRow {
		components: vec![button(format!("ticket/close/{}", ticket_id), "Close", ButtonStyle::Danger)],
	})
}

/// The buttons on a ticket's close message.
pub fn closed_ticket_buttons(ticket_id: i64) -> Component {
	Component::ActionRow(ActionRow {
		components: vec![
			button(format!("ticket/reopen/{}", ticket_id), "Reopen", ButtonStyle::Success),
			button(format!("ticket/transcript/{}", ticket_id), "Transcript", ButtonStyle::Secondary),
			button(format!("ticket/delete/{}", ticket_id), "Delete", ButtonStyle::Danger),
		],
	})
}

#[cfg(test)]
mod tests {
	use super::*;

	fn custom_ids(component: &Component) -> Vec<String> {
		let Component::ActionRow(row) = component else {
			panic!("expected an action row");
		};
		row.components
			.iter()
			.filter_map(|component| match component {
				Component::Button(button) => button.custom_id.clone(),
				_ => None,
			})
			.collect()
	}

	#[test]
	fn closed_ticket_buttons_carry_ticket_id() {
		assert_eq!(
			custom_ids(&closed_ticket_buttons(12)),
			vec!["ticket/reopen/12", "ticket/transcript/12", "ticket/delete/12"]
		);
	}

	#[test]
	fn close_button_carries_ticket_id() {
		assert_eq!(custom_ids(&close_ticket_button(3)), vec!["ticket/close/3"]);
	}
}
