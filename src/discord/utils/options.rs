// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use twilight_model::application::interaction::application_command::{
	CommandData, CommandDataOption, CommandOptionValue,
};
use twilight_model::id::Id;
use twilight_model::id::marker::{ChannelMarker, GenericMarker, RoleMarker, UserMarker};

/// A role or member picked through a mentionable option.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Snowflake {
	User(Id<UserMarker>),
	Role(Id<RoleMarker>),
}

/// Gets the first (sub)command option and its nested options, if the first option is a subcommand.
pub fn subcommand(options: &[CommandDataOption]) -> Option<(&str, &[CommandDataOption])> {
	let option = options.first()?;
	match &option.value {
		CommandOptionValue::SubCommand(options) | CommandOptionValue::SubCommandGroup(options) => {
			Some((option.name.as_str(), options.as_slice()))
		}
		_ => None,
	}
}

fn value<'a>(options: &'a [CommandDataOption], name: &str) -> Option<&'a CommandOptionValue> {
	options.iter().find(|option| option.name == name).map(|option| &option.value)
}

pub fn user(options: &[CommandDataOption], name: &str) -> Option<Id<UserMarker>> {
	match value(options, name)? {
		CommandOptionValue::User(user) => Some(*user),
		_ => None,
	}
}

pub fn role(options: &[CommandDataOption], name: &str) -> Option<Id<RoleMarker>> {
	match value(options, name)? {
		CommandOptionValue::Role(role) => Some(*role),
		_ => None,
	}
}

pub fn channel(options: &[CommandDataOption], name: &str) -> Option<Id<ChannelMarker>> {
	match value(options, name)? {
		CommandOptionValue::Channel(channel) => Some(*channel),
		_ => None,
	}
}

pub fn string<'a>(options: &'a [CommandDataOption], name: &str) -> Option<&'a str> {
	match value(options, name)? {
		CommandOptionValue::String(value) => Some(value.as_str()),
		_ => None,
	}
}

pub fn integer(options: &[CommandDataOption], name: &str) -> Option<i64> {
	match value(options, name)? {
		CommandOptionValue::Integer(value) => Some(*value),
		_ => None,
	}
}

/// Resolves a mentionable option into a user or a role using the resolved data sent with the command.
pub fn mentionable(command_data: &CommandData, options: &[CommandDataOption], name: &str) -> Option<Snowflake> {
	let CommandOptionValue::Mentionable(id) = value(options, name)? else {
		return None;
	};
	resolve_mentionable(command_data, *id)
}

fn resolve_mentionable(command_data: &CommandData, id: Id<GenericMarker>) -> Option<Snowflake> {
	let resolved = command_data.resolved.as_ref()?;
	let role_id: Id<RoleMarker> = id.cast();
	if resolved.roles.contains_key(&role_id) {
		return Some(Snowflake::Role(role_id));
	}
	let user_id: Id<UserMarker> = id.cast();
	if resolved.users.contains_key(&user_id) {
		return Some(Snowflake::User(user_id));
	}
	None
}

#[cfg(test)]
mod tests {
	use super::*;

	fn option(name: &str, value: CommandOptionValue) -> CommandDataOption {
		CommandDataOption {
			name: name.to_string(),
			value,
		}
	}

	#[test]
	fn finds_values_by_name_and_type() {
		let options = vec![
			option("user", CommandOptionValue::User(Id::new(5))),
			option("count", CommandOptionValue::Integer(20)),
			option("reason", CommandOptionValue::String(String::from("spam"))),
		];
		assert_eq!(user(&options, "user"), Some(Id::new(5)));
		assert_eq!(integer(&options, "count"), Some(20));
		assert_eq!(string(&options, "reason"), Some("spam"));
		assert_eq!(string(&options, "count"), None);
		assert_eq!(role(&options, "missing"), None);
	}

	#[test]
	fn unwraps_subcommands() {
		let options = vec![option(
			"close",
			CommandOptionValue::SubCommand(vec![option("reason", CommandOptionValue::String(String::from("done")))]),
		)];
		let (name, nested) = subcommand(&options).unwrap();
		assert_eq!(name, "close");
		assert_eq!(string(nested, "reason"), Some("done"));
	}

	#[test]
	fn non_subcommand_options_are_not_subcommands() {
		let options = vec![option("count", CommandOptionValue::Integer(3))];
		assert!(subcommand(&options).is_none());
	}
}
