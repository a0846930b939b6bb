// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use super::invocation;
use crate::discord::context::BotContext;
use crate::discord::utils::guilds::ensure_guild;
use crate::discord::utils::http::ignore_not_found;
use crate::discord::utils::options;
use crate::discord::utils::permissions::interaction_member_is_staff;
use crate::discord::utils::responses::{MISSING_PERMISSIONS, defer, ephemeral_reply, update_deferred};
use crate::model::{RoleMenu, RoleMenuOption, database_id_from_discord_id};
use crate::schema::{role_menu_options, role_menus};
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DbError};
use miette::{IntoDiagnostic, bail};
use twilight_model::application::command::{Command, CommandType};
use twilight_model::application::interaction::InteractionContextType;
use twilight_model::application::interaction::application_command::{CommandData, CommandDataOption};
use twilight_model::channel::message::component::{ActionRow, Component, SelectMenu, SelectMenuOption, SelectMenuType};
use twilight_model::gateway::payload::incoming::InteractionCreate;
use twilight_model::guild::Permissions;
use twilight_model::id::Id;
use twilight_model::id::marker::{GuildMarker, RoleMarker};
use twilight_util::builder::command::{CommandBuilder, RoleBuilder, StringBuilder, SubCommandBuilder};
use twilight_util::builder::embed::EmbedBuilder;

const ROLE_OPTION_NAMES: [&str; 5] = ["role1", "role2", "role3", "role4", "role5"];
const ROLE_MENU_EMBED_COLOR: u32 = 0x5865f2;

pub fn command_definition() -> Command {
	let mut create = SubCommandBuilder::new("create", "Post a menu members can pick roles from")
		.option(
			StringBuilder::new("name", "A name to refer to the menu by")
				.max_length(64)
				.required(true),
		)
		.option(
			StringBuilder::new("text", "The text shown above the menu")
				.max_length(2000)
				.required(true),
		);
	for (index, name) in ROLE_OPTION_NAMES.iter().enumerate() {
		create = create.option(RoleBuilder::new(*name, "A role members can pick").required(index == 0));
	}
	let delete = SubCommandBuilder::new("delete", "Delete a role menu and its message").option(
		StringBuilder::new("name", "The name of the menu")
			.max_length(64)
			.required(true),
	);

	CommandBuilder::new("role-menu", "Manage self-assignable role menus", CommandType::ChatInput)
		.contexts([InteractionContextType::Guild])
		.default_member_permissions(Permissions::MANAGE_ROLES)
		.option(create)
		.option(delete)
		.build()
}

/// Builds the select component for a role menu. Every option's value is its role ID.
pub fn role_menu_component(menu_id: &str, options: &[RoleMenuOption]) -> Component {
	let select_options: Vec<SelectMenuOption> = options
		.iter()
		.map(|option| SelectMenuOption {
			default: false,
			description: None,
			emoji: None,
			label: option.label.clone(),
			value: option.get_role().to_string(),
		})
		.collect();
	let max_values = u8::try_from(select_options.len()).unwrap_or(u8::MAX);
	let menu = SelectMenu {
		channel_types: None,
		custom_id: format!("role_menu/{}", menu_id),
		default_values: None,
		disabled: false,
		kind: SelectMenuType::Text,
		max_values: Some(max_values),
		min_values: Some(0),
		options: Some(select_options),
		placeholder: Some(String::from("Pick your roles")),
	};
	Component::ActionRow(ActionRow {
		components: vec![Component::SelectMenu(menu)],
	})
}

/// Collects the roles given to the create subcommand, in option order and without repeats.
fn requested_roles(options: &[CommandDataOption]) -> Vec<Id<RoleMarker>> {
	let mut roles: Vec<Id<RoleMarker>> = Vec::new();
	for name in ROLE_OPTION_NAMES {
		if let Some(role) = options::role(options, name) {
			if !roles.contains(&role) {
				roles.push(role);
			}
		}
	}
	roles
}

pub async fn handle_command(
	ctx: &BotContext,
	interaction: &InteractionCreate,
	command_data: &CommandData,
) -> miette::Result<()> {
	let (guild_id, _) = invocation(interaction, "Role menu")?;
	if !interaction_member_is_staff(ctx, interaction, guild_id)? {
		return ephemeral_reply(ctx, interaction, MISSING_PERMISSIONS).await;
	}
	let Some((subcommand, subcommand_options)) = options::subcommand(&command_data.options) else {
		bail!("Role menu command invoked with no subcommand");
	};
	let Some(name) = options::string(subcommand_options, "name").map(str::trim) else {
		bail!("Role menu {} subcommand received without a name", subcommand);
	};
	if name.is_empty() {
		return ephemeral_reply(ctx, interaction, "Role menu names can't be empty.").await;
	}

	match subcommand {
		"create" => handle_create(ctx, interaction, command_data, subcommand_options, guild_id, name).await,
		"delete" => handle_delete(ctx, interaction, guild_id, name).await,
		_ => bail!("Unknown role menu subcommand: {}", subcommand),
	}
}

async fn handle_create(
	ctx: &BotContext,
	interaction: &InteractionCreate,
	command_data: &CommandData,
	subcommand_options: &[CommandDataOption],
	guild_id: Id<GuildMarker>,
	name: &str,
) -> miette::Result<()> {
	let Some(channel_id) = interaction.channel.as_ref().map(|channel| channel.id) else {
		bail!("Role menu create subcommand was used without a channel");
	};
	let Some(text) = options::string(subcommand_options, "text") else {
		bail!("Role menu create subcommand received without text");
	};
	let roles = requested_roles(subcommand_options);
	if roles.is_empty() {
		bail!("Role menu create subcommand received without roles");
	}
	let everyone_role: Id<RoleMarker> = guild_id.cast();
	if roles.contains(&everyone_role) {
		return ephemeral_reply(ctx, interaction, "The @everyone role can't be in a role menu.").await;
	}

	let menu = RoleMenu {
		id: cuid2::create_id(),
		guild: database_id_from_discord_id(guild_id.get()),
		name: name.to_string(),
		channel: database_id_from_discord_id(channel_id.get()),
		message: None,
		text: text.to_string(),
	};
	let menu_options: Vec<RoleMenuOption> = roles
		.iter()
		.enumerate()
		.map(|(position, role)| {
			let label = command_data
				.resolved
				.as_ref()
				.and_then(|resolved| resolved.roles.get(role))
				.map(|role| role.name.clone())
				.unwrap_or_else(|| role.to_string());
			RoleMenuOption {
				id: cuid2::create_id(),
				role_menu: menu.id.clone(),
				role: database_id_from_discord_id(role.get()),
				label,
				position: position as i32,
			}
		})
		.collect();

	{
		let mut db_connection = ctx.db_connection_pool.get().into_diagnostic()?;
		ensure_guild(&mut db_connection, guild_id).into_diagnostic()?;
		let insert_result = db_connection.transaction(|db_connection| {
			diesel::insert_into(role_menus::table)
				.values(menu.clone())
				.execute(db_connection)?;
			diesel::insert_into(role_menu_options::table)
				.values(menu_options.clone())
				.execute(db_connection)
		});
		match insert_result {
			Ok(_) => (),
			Err(DbError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => {
				let message = format!("A role menu named `{}` already exists.", name);
				return ephemeral_reply(ctx, interaction, &message).await;
			}
			Err(error) => bail!(error),
		}
	}

	defer(ctx, interaction, true).await?;
	let embed = EmbedBuilder::new()
		.description(text)
		.color(ROLE_MENU_EMBED_COLOR)
		.validate()
		.into_diagnostic()?
		.build();
	let components = [role_menu_component(&menu.id, &menu_options)];
	let message = ctx
		.http_client
		.create_message(channel_id)
		.embeds(&[embed])
		.components(&components)
		.await
		.into_diagnostic()?
		.model()
		.await
		.into_diagnostic()?;

	{
		let mut db_connection = ctx.db_connection_pool.get().into_diagnostic()?;
		diesel::update(role_menus::table.find(&menu.id))
			.set(role_menus::message.eq(Some(database_id_from_discord_id(message.id.get()))))
			.execute(&mut db_connection)
			.into_diagnostic()?;
	}
	tracing::info!(guild = %guild_id, menu = menu.id, "Created role menu");
	update_deferred(ctx, interaction, &format!("Created the role menu `{}`.", name)).await
}

async fn handle_delete(
	ctx: &BotContext,
	interaction: &InteractionCreate,
	guild_id: Id<GuildMarker>,
	name: &str,
) -> miette::Result<()> {
	let menu: Option<RoleMenu> = {
		let mut db_connection = ctx.db_connection_pool.get().into_diagnostic()?;
		role_menus::table
			.filter(role_menus::guild.eq(database_id_from_discord_id(guild_id.get())))
			.filter(role_menus::name.eq(name))
			.first(&mut db_connection)
			.optional()
			.into_diagnostic()?
	};
	let Some(menu) = menu else {
		return ephemeral_reply(ctx, interaction, &format!("There's no role menu named `{}`.", name)).await;
	};

	if let Some(message_id) = menu.get_message() {
		ignore_not_found(ctx.http_client.delete_message(menu.get_channel(), message_id).await)?;
	}
	{
		let mut db_connection = ctx.db_connection_pool.get().into_diagnostic()?;
		diesel::delete(role_menus::table.find(&menu.id))
			.execute(&mut db_connection)
			.into_diagnostic()?;
	}
	tracing::info!(guild = %guild_id, menu = menu.id, "Deleted role menu");
	ephemeral_reply(ctx, interaction, &format!("Deleted the role menu `{}`.", name)).await
}

#[cfg(test)]
mod tests {
	use super::*;
	use twilight_model::application::interaction::application_command::CommandOptionValue;

	#[test]
	fn requested_roles_keep_order_and_drop_repeats() {
		let options = vec![
			CommandDataOption {
				name: String::from("role1"),
				value: CommandOptionValue::Role(Id::new(30)),
			},
			CommandDataOption {
				name: String::from("role2"),
				value: CommandOptionValue::Role(Id::new(10)),
			},
			CommandDataOption {
				name: String::from("role3"),
				value: CommandOptionValue::Role(Id::new(30)),
			},
		];
		assert_eq!(requested_roles(&options), vec![Id::new(30), Id::new(10)]);
	}

	#[test]
	fn menu_allows_picking_any_number_of_roles() {
		let options = vec![
			RoleMenuOption {
				id: String::from("a"),
				role_menu: String::from("menu"),
				role: 30,
				label: String::from("Artists"),
				position: 0,
			},
			RoleMenuOption {
				id: String::from("b"),
				role_menu: String::from("menu"),
				role: 10,
				label: String::from("Writers"),
				position: 1,
			},
		];
		let Component::ActionRow(row) = role_menu_component("menu", &options) else {
			panic!("expected an action row");
		};
		let Component::SelectMenu(menu) = &row.components[0] else {
			panic!("expected a select menu");
		};
		assert_eq!(menu.custom_id, "role_menu/menu");
		assert_eq!(menu.min_values, Some(0));
		assert_eq!(menu.max_values, Some(2));
		let values: Vec<&str> = menu
			.options
			.as_ref()
			.unwrap()
			.iter()
			.map(|option| option.value.as_str())
			.collect();
		assert_eq!(values, vec!["30", "10"]);
	}
}
