// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use super::invocation;
use crate::discord::context::BotContext;
use crate::discord::tickets::load_config;
use crate::discord::utils::duration::{DurationParseError, parse_duration};
use crate::discord::utils::guilds::ensure_guild;
use crate::discord::utils::options;
use crate::discord::utils::permissions::{
	channel_permissions, ticket_category_missing_permissions_message, ticket_category_permissions,
};
use crate::discord::utils::responses::{MISSING_PERMISSIONS, defer, ephemeral_reply, update_deferred};
use crate::model::{Guild, TicketingConfig, database_id_from_discord_id};
use crate::schema::{guilds, ticketing_configs};
use diesel::prelude::*;
use diesel::upsert::excluded;
use miette::{IntoDiagnostic, bail};
use twilight_mention::fmt::Mention;
use twilight_model::application::command::{Command, CommandType};
use twilight_model::application::interaction::InteractionContextType;
use twilight_model::application::interaction::application_command::{CommandData, CommandDataOption};
use twilight_model::channel::ChannelType;
use twilight_model::gateway::payload::incoming::InteractionCreate;
use twilight_model::guild::Permissions;
use twilight_model::id::Id;
use twilight_model::id::marker::{ChannelMarker, GuildMarker, RoleMarker};
use twilight_util::builder::command::{
	ChannelBuilder, CommandBuilder, RoleBuilder, StringBuilder, SubCommandBuilder, SubCommandGroupBuilder,
};

const DEFAULT_OPENED_PREFIX: &str = "ticket";
const DEFAULT_CLOSED_PREFIX: &str = "closed";
const DEFAULT_WELCOME_MESSAGE: &str = "Thanks for opening a ticket! Staff will be with you shortly.";
const DEFAULT_CENTER_MESSAGE: &str = "Need help from staff? Press the button below to open a private ticket.";
const MAX_PREFIX_LENGTH: u16 = 32;

pub fn command_definition() -> Command {
	let ticketing = SubCommandBuilder::new("ticketing", "Set up or change ticketing")
		.option(
			ChannelBuilder::new("opened_category", "The category open tickets are created in")
				.channel_types([ChannelType::GuildCategory])
				.required(true),
		)
		.option(
			ChannelBuilder::new("closed_category", "The category closed tickets are moved to")
				.channel_types([ChannelType::GuildCategory])
				.required(true),
		)
		.option(
			ChannelBuilder::new("log_channel", "The channel ticket transcripts are posted to")
				.channel_types([ChannelType::GuildText])
				.required(true),
		)
		.option(StringBuilder::new("opened_prefix", "Name prefix for open ticket channels").max_length(MAX_PREFIX_LENGTH))
		.option(StringBuilder::new("closed_prefix", "Name prefix for closed ticket channels").max_length(MAX_PREFIX_LENGTH))
		.option(StringBuilder::new(
			"auto_close",
			"Close open tickets inactive for this long, like 3d; \"off\" to disable",
		))
		.option(StringBuilder::new(
			"auto_clean",
			"Delete closed ticket channels after this long, like 1w; \"off\" to disable",
		))
		.option(StringBuilder::new("welcome_message", "The message posted in new tickets").max_length(4000))
		.option(StringBuilder::new("center_message", "The message shown with the \"Open ticket\" button").max_length(4000))
		.option(StringBuilder::new("embed_color", "Color of ticket embeds as a hex code, like #2c2f33").max_length(7));
	let moderation = SubCommandBuilder::new("moderation", "Change moderation settings")
		.option(RoleBuilder::new("add_moderator_role", "Give a role access to tickets and moderation commands"))
		.option(RoleBuilder::new("remove_moderator_role", "Take a role's moderator access away"))
		.option(RoleBuilder::new("mute_role", "The role given to muted members"))
		.option(
			ChannelBuilder::new("log_channel", "The channel moderation actions are reported to")
				.channel_types([ChannelType::GuildText]),
		);
	let disable_ticketing = SubCommandBuilder::new("disable-ticketing", "Stop accepting tickets on this server");

	let module = SubCommandGroupBuilder::new("module", "Configure a module of the bot")
		.subcommands([ticketing, moderation, disable_ticketing]);

	CommandBuilder::new("admin-util", "Configure the bot for this server", CommandType::ChatInput)
		.contexts([InteractionContextType::Guild])
		.default_member_permissions(Permissions::MANAGE_GUILD)
		.option(module)
		.build()
}

/// Ticketing settings given with the ticketing subcommand. Empty settings keep their current (or default) values.
#[derive(Debug, Default)]
struct TicketingSettings {
	opened_category: Option<Id<ChannelMarker>>,
	closed_category: Option<Id<ChannelMarker>>,
	log_channel: Option<Id<ChannelMarker>>,
	opened_prefix: Option<String>,
	closed_prefix: Option<String>,
	auto_close_after_seconds: Option<Option<i64>>,
	auto_clean_after_seconds: Option<Option<i64>>,
	welcome_message: Option<String>,
	center_message: Option<String>,
	embed_color: Option<i32>,
}

/// Parses an optional interval setting. "off" turns the setting off.
fn parse_interval_setting(value: &str) -> Result<Option<i64>, DurationParseError> {
	let value = value.trim();
	if value.eq_ignore_ascii_case("off") || value.eq_ignore_ascii_case("none") {
		return Ok(None);
	}
	Ok(Some(parse_duration(value)?.num_seconds()))
}

fn parse_color(value: &str) -> Option<i32> {
	let hex = value.trim().trim_start_matches('#');
	if hex.len() != 6 {
		return None;
	}
	i32::from_str_radix(hex, 16).ok()
}

/// Channel names only allow lowercase letters, digits, dashes, and underscores.
fn normalize_prefix(value: &str) -> Option<String> {
	let prefix: String = value
		.trim()
		.to_lowercase()
		.chars()
		.map(|character| if character.is_whitespace() { '-' } else { character })
		.filter(|character| character.is_alphanumeric() || *character == '-' || *character == '_')
		.collect();
	if prefix.is_empty() { None } else { Some(prefix) }
}

fn ticketing_settings(options: &[CommandDataOption]) -> Result<TicketingSettings, String> {
	let interval = |name: &str| -> Result<Option<Option<i64>>, String> {
		match options::string(options, name) {
			Some(value) => parse_interval_setting(value)
				.map(Some)
				.map_err(|error| format!("{}: {}", name, error)),
			None => Ok(None),
		}
	};
	let prefix = |name: &str| -> Result<Option<String>, String> {
		match options::string(options, name) {
			Some(value) => normalize_prefix(value)
				.map(Some)
				.ok_or_else(|| format!("{}: the prefix needs at least one letter or digit.", name)),
			None => Ok(None),
		}
	};
	let embed_color = match options::string(options, "embed_color") {
		Some(value) => {
			Some(parse_color(value).ok_or_else(|| String::from("embed_color: use a hex code like #2c2f33."))?)
		}
		None => None,
	};

	Ok(TicketingSettings {
		opened_category: options::channel(options, "opened_category"),
		closed_category: options::channel(options, "closed_category"),
		log_channel: options::channel(options, "log_channel"),
		opened_prefix: prefix("opened_prefix")?,
		closed_prefix: prefix("closed_prefix")?,
		auto_close_after_seconds: interval("auto_close")?,
		auto_clean_after_seconds: interval("auto_clean")?,
		welcome_message: options::string(options, "welcome_message").map(String::from),
		center_message: options::string(options, "center_message").map(String::from),
		embed_color,
	})
}

/// Applies settings over the existing config. Returns `None` when a new config is missing a required channel.
fn merged_config(
	guild_id: Id<GuildMarker>,
	existing: Option<TicketingConfig>,
	settings: TicketingSettings,
) -> Option<TicketingConfig> {
	let to_db = |channel: Id<ChannelMarker>| database_id_from_discord_id(channel.get());
	match existing {
		Some(mut config) => {
			if let Some(category) = settings.opened_category {
				config.opened_category = to_db(category);
			}
			if let Some(category) = settings.closed_category {
				config.closed_category = to_db(category);
			}
			if let Some(channel) = settings.log_channel {
				config.log_channel = to_db(channel);
			}
			if let Some(prefix) = settings.opened_prefix {
				config.opened_name_prefix = prefix;
			}
			if let Some(prefix) = settings.closed_prefix {
				config.closed_name_prefix = prefix;
			}
			if let Some(seconds) = settings.auto_close_after_seconds {
				config.auto_close_after_seconds = seconds;
			}
			if let Some(seconds) = settings.auto_clean_after_seconds {
				config.auto_clean_after_seconds = seconds;
			}
			if let Some(message) = settings.welcome_message {
				config.welcome_message = message;
			}
			if let Some(message) = settings.center_message {
				config.center_message = message;
			}
			if let Some(color) = settings.embed_color {
				config.embed_color = color;
			}
			Some(config)
		}
		None => Some(TicketingConfig {
			guild: database_id_from_discord_id(guild_id.get()),
			opened_category: to_db(settings.opened_category?),
			closed_category: to_db(settings.closed_category?),
			log_channel: to_db(settings.log_channel?),
			opened_name_prefix: settings
				.opened_prefix
				.unwrap_or_else(|| String::from(DEFAULT_OPENED_PREFIX)),
			closed_name_prefix: settings
				.closed_prefix
				.unwrap_or_else(|| String::from(DEFAULT_CLOSED_PREFIX)),
			last_ticket_id: 0,
			auto_close_after_seconds: settings.auto_close_after_seconds.flatten(),
			auto_clean_after_seconds: settings.auto_clean_after_seconds.flatten(),
			welcome_message: settings
				.welcome_message
				.unwrap_or_else(|| String::from(DEFAULT_WELCOME_MESSAGE)),
			center_message: settings
				.center_message
				.unwrap_or_else(|| String::from(DEFAULT_CENTER_MESSAGE)),
			embed_color: settings.embed_color.unwrap_or(TicketingConfig::DEFAULT_EMBED_COLOR),
		}),
	}
}

pub async fn handle_command(
	ctx: &BotContext,
	interaction: &InteractionCreate,
	command_data: &CommandData,
) -> miette::Result<()> {
	let (guild_id, _) = invocation(interaction, "Admin util")?;
	let member_permissions = interaction
		.member
		.as_ref()
		.and_then(|member| member.permissions)
		.unwrap_or_else(Permissions::empty);
	if !member_permissions.intersects(Permissions::ADMINISTRATOR | Permissions::MANAGE_GUILD) {
		return ephemeral_reply(ctx, interaction, MISSING_PERMISSIONS).await;
	}

	let Some(("module", module_options)) = options::subcommand(&command_data.options) else {
		bail!("Admin util command invoked without the module group");
	};
	let Some((subcommand, subcommand_options)) = options::subcommand(module_options) else {
		bail!("Admin util module group invoked with no subcommand");
	};

	match subcommand {
		"ticketing" => handle_ticketing(ctx, interaction, guild_id, subcommand_options).await,
		"moderation" => handle_moderation(ctx, interaction, guild_id, subcommand_options).await,
		"disable-ticketing" => handle_disable_ticketing(ctx, interaction, guild_id).await,
		_ => bail!("Unknown admin util module subcommand: {}", subcommand),
	}
}

async fn handle_ticketing(
	ctx: &BotContext,
	interaction: &InteractionCreate,
	guild_id: Id<GuildMarker>,
	subcommand_options: &[CommandDataOption],
) -> miette::Result<()> {
	let settings = match ticketing_settings(subcommand_options) {
		Ok(settings) => settings,
		Err(message) => return ephemeral_reply(ctx, interaction, &message).await,
	};

	defer(ctx, interaction, true).await?;
	for category in [settings.opened_category, settings.closed_category].into_iter().flatten() {
		let permissions = channel_permissions(guild_id, category, &ctx.http_client).await?;
		if !permissions.contains(ticket_category_permissions()) {
			let message = ticket_category_missing_permissions_message(category.mention());
			return update_deferred(ctx, interaction, &message).await;
		}
	}

	let mut db_connection = ctx.db_connection_pool.get().into_diagnostic()?;
	ensure_guild(&mut db_connection, guild_id).into_diagnostic()?;
	let existing = load_config(&mut db_connection, guild_id).into_diagnostic()?;
	let is_new = existing.is_none();
	let Some(config) = merged_config(guild_id, existing, settings) else {
		let message = "The opened category, closed category, and log channel are needed to set up ticketing.";
		return update_deferred(ctx, interaction, message).await;
	};

	// The ticket counter only ever moves forward, so it's never part of the update.
	diesel::insert_into(ticketing_configs::table)
		.values(&config)
		.on_conflict(ticketing_configs::guild)
		.do_update()
		.set((
			ticketing_configs::opened_category.eq(excluded(ticketing_configs::opened_category)),
			ticketing_configs::closed_category.eq(excluded(ticketing_configs::closed_category)),
			ticketing_configs::log_channel.eq(excluded(ticketing_configs::log_channel)),
			ticketing_configs::opened_name_prefix.eq(excluded(ticketing_configs::opened_name_prefix)),
			ticketing_configs::closed_name_prefix.eq(excluded(ticketing_configs::closed_name_prefix)),
			ticketing_configs::auto_close_after_seconds.eq(excluded(ticketing_configs::auto_close_after_seconds)),
			ticketing_configs::auto_clean_after_seconds.eq(excluded(ticketing_configs::auto_clean_after_seconds)),
			ticketing_configs::welcome_message.eq(excluded(ticketing_configs::welcome_message)),
			ticketing_configs::center_message.eq(excluded(ticketing_configs::center_message)),
			ticketing_configs::embed_color.eq(excluded(ticketing_configs::embed_color)),
		))
		.execute(&mut db_connection)
		.into_diagnostic()?;
	tracing::info!(guild = %guild_id, is_new, "Updated ticketing settings");

	let message = if is_new {
		"Ticketing is set up. Use `/ticket center` to post the \"Open ticket\" button."
	} else {
		"Ticketing settings updated."
	};
	update_deferred(ctx, interaction, message).await
}

/// Adds or removes a role in the moderator role list, keeping it free of repeats.
fn update_moderator_roles(
	roles: &mut Vec<i64>,
	add: Option<Id<RoleMarker>>,
	remove: Option<Id<RoleMarker>>,
) {
	if let Some(role) = add {
		let role = database_id_from_discord_id(role.get());
		if !roles.contains(&role) {
			roles.push(role);
		}
	}
	if let Some(role) = remove {
		let role = database_id_from_discord_id(role.get());
		roles.retain(|existing| *existing != role);
	}
}

fn describe_moderation_settings(guild: &Guild) -> String {
	let moderator_roles: Vec<String> = guild
		.get_moderator_roles()
		.iter()
		.map(|role| role.mention().to_string())
		.collect();
	let moderator_roles = if moderator_roles.is_empty() {
		String::from("none")
	} else {
		moderator_roles.join(", ")
	};
	let mute_role = guild
		.get_mute_role()
		.map(|role| role.mention().to_string())
		.unwrap_or_else(|| String::from("none"));
	let log_channel = guild
		.get_moderation_log_channel()
		.map(|channel| channel.mention().to_string())
		.unwrap_or_else(|| String::from("none"));
	format!(
		"Moderator roles: {}\nMute role: {}\nModeration log: {}",
		moderator_roles, mute_role, log_channel
	)
}

async fn handle_moderation(
	ctx: &BotContext,
	interaction: &InteractionCreate,
	guild_id: Id<GuildMarker>,
	subcommand_options: &[CommandDataOption],
) -> miette::Result<()> {
	let everyone_role: Id<RoleMarker> = guild_id.cast();
	let add_role = options::role(subcommand_options, "add_moderator_role");
	let mute_role = options::role(subcommand_options, "mute_role");
	if add_role == Some(everyone_role) || mute_role == Some(everyone_role) {
		return ephemeral_reply(ctx, interaction, "The @everyone role can't be used for that.").await;
	}

	let guild = {
		let mut db_connection = ctx.db_connection_pool.get().into_diagnostic()?;
		let mut guild = ensure_guild(&mut db_connection, guild_id).into_diagnostic()?;
		update_moderator_roles(
			&mut guild.moderator_roles,
			add_role,
			options::role(subcommand_options, "remove_moderator_role"),
		);
		if let Some(role) = mute_role {
			guild.mute_role = Some(database_id_from_discord_id(role.get()));
		}
		if let Some(channel) = options::channel(subcommand_options, "log_channel") {
			guild.moderation_log_channel = Some(database_id_from_discord_id(channel.get()));
		}
		diesel::update(guilds::table.find(guild.guild_id))
			.set((
				guilds::moderator_roles.eq(&guild.moderator_roles),
				guilds::mute_role.eq(guild.mute_role),
				guilds::moderation_log_channel.eq(guild.moderation_log_channel),
			))
			.execute(&mut db_connection)
			.into_diagnostic()?;
		guild
	};
	tracing::info!(guild = %guild_id, "Updated moderation settings");
	ephemeral_reply(ctx, interaction, &describe_moderation_settings(&guild)).await
}

async fn handle_disable_ticketing(
	ctx: &BotContext,
	interaction: &InteractionCreate,
	guild_id: Id<GuildMarker>,
) -> miette::Result<()> {
	let deleted = {
		let mut db_connection = ctx.db_connection_pool.get().into_diagnostic()?;
		diesel::delete(ticketing_configs::table.find(database_id_from_discord_id(guild_id.get())))
			.execute(&mut db_connection)
			.into_diagnostic()?
	};
	let message = if deleted == 0 {
		"Ticketing wasn't set up on this server."
	} else {
		tracing::info!(guild = %guild_id, "Disabled ticketing");
		"Ticketing is disabled. Existing ticket channels are left as they are."
	};
	ephemeral_reply(ctx, interaction, message).await
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn interval_settings_can_be_turned_off() {
		assert_eq!(parse_interval_setting("off"), Ok(None));
		assert_eq!(parse_interval_setting(" None "), Ok(None));
		assert_eq!(parse_interval_setting("2d"), Ok(Some(172_800)));
		assert!(parse_interval_setting("soon").is_err());
	}

	#[test]
	fn colors_are_hex_codes() {
		assert_eq!(parse_color("#2c2f33"), Some(0x2c2f33));
		assert_eq!(parse_color("ff0000"), Some(0xff0000));
		assert_eq!(parse_color("#fff"), None);
		assert_eq!(parse_color("#zzzzzz"), None);
	}

	#[test]
	fn prefixes_become_channel_name_safe() {
		assert_eq!(normalize_prefix(" Help Desk "), Some(String::from("help-desk")));
		assert_eq!(normalize_prefix("!!!"), None);
	}

	#[test]
	fn new_config_needs_its_channels() {
		let settings = TicketingSettings {
			opened_category: Some(Id::new(1)),
			..Default::default()
		};
		assert!(merged_config(Id::new(9), None, settings).is_none());
	}

	#[test]
	fn new_config_gets_defaults() {
		let settings = TicketingSettings {
			opened_category: Some(Id::new(1)),
			closed_category: Some(Id::new(2)),
			log_channel: Some(Id::new(3)),
			..Default::default()
		};
		let config = merged_config(Id::new(9), None, settings).unwrap();
		assert_eq!(config.opened_name_prefix, DEFAULT_OPENED_PREFIX);
		assert_eq!(config.closed_name_prefix, DEFAULT_CLOSED_PREFIX);
		assert_eq!(config.last_ticket_id, 0);
		assert_eq!(config.auto_close_after_seconds, None);
		assert_eq!(config.embed_color, TicketingConfig::DEFAULT_EMBED_COLOR);
	}

	#[test]
	fn existing_config_keeps_unset_values_and_counter() {
		let existing = TicketingConfig {
			guild: 9,
			opened_category: 1,
			closed_category: 2,
			log_channel: 3,
			opened_name_prefix: String::from("help"),
			closed_name_prefix: String::from("done"),
			last_ticket_id: 41,
			auto_close_after_seconds: Some(3600),
			auto_clean_after_seconds: None,
			welcome_message: String::from("hi"),
			center_message: String::from("open one"),
			embed_color: 0,
		};
		let settings = TicketingSettings {
			log_channel: Some(Id::new(30)),
			auto_close_after_seconds: Some(None),
			..Default::default()
		};
		let config = merged_config(Id::new(9), Some(existing), settings).unwrap();
		assert_eq!(config.log_channel, 30);
		assert_eq!(config.opened_name_prefix, "help");
		assert_eq!(config.auto_close_after_seconds, None);
		assert_eq!(config.last_ticket_id, 41);
	}

	#[test]
	fn moderator_roles_stay_unique() {
		let mut roles = vec![5];
		update_moderator_roles(&mut roles, Some(Id::new(5)), None);
		update_moderator_roles(&mut roles, Some(Id::new(6)), None);
		update_moderator_roles(&mut roles, None, Some(Id::new(5)));
		assert_eq!(roles, vec![6]);
	}
}
