// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use super::invocation;
use crate::discord::context::BotContext;
use crate::discord::utils::guilds::ensure_guild;
use crate::discord::utils::options;
use crate::discord::utils::permissions::interaction_member_is_staff;
use crate::discord::utils::responses::{MISSING_PERMISSIONS, ephemeral_reply, reply};
use crate::model::{Tag, database_id_from_discord_id};
use crate::schema::tags;
use chrono::Utc;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DbError};
use miette::{IntoDiagnostic, bail};
use std::fmt;
use twilight_model::application::command::{Command, CommandType};
use twilight_model::application::interaction::InteractionContextType;
use twilight_model::application::interaction::application_command::{CommandData, CommandDataOption};
use twilight_model::gateway::payload::incoming::InteractionCreate;
use twilight_model::id::Id;
use twilight_model::id::marker::{GuildMarker, UserMarker};
use twilight_util::builder::command::{CommandBuilder, StringBuilder, SubCommandBuilder};

const MAX_TAG_NAME_LENGTH: usize = 32;
const MAX_TAG_CONTENT_LENGTH: u16 = 2000;

pub fn command_definition() -> Command {
	let name_option = || {
		StringBuilder::new("name", "The name of the tag")
			.max_length(MAX_TAG_NAME_LENGTH as u16)
			.required(true)
	};
	let content_option = || {
		StringBuilder::new("content", "What the tag says")
			.max_length(MAX_TAG_CONTENT_LENGTH)
			.required(true)
	};

	let show = SubCommandBuilder::new("show", "Post a tag").option(name_option());
	let create = SubCommandBuilder::new("create", "Create a tag")
		.option(name_option())
		.option(content_option());
	let edit = SubCommandBuilder::new("edit", "Change what a tag says")
		.option(name_option())
		.option(content_option());
	let delete = SubCommandBuilder::new("delete", "Delete a tag").option(name_option());
	let list = SubCommandBuilder::new("list", "List this server's tags");

	CommandBuilder::new("tag", "Post and manage saved responses", CommandType::ChatInput)
		.contexts([InteractionContextType::Guild])
		.option(show)
		.option(create)
		.option(edit)
		.option(delete)
		.option(list)
		.build()
}

#[derive(Debug, Eq, PartialEq)]
pub enum TagNameError {
	Empty,
	TooLong,
}

impl fmt::Display for TagNameError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Empty => write!(f, "Tag names can't be empty."),
			Self::TooLong => write!(f, "Tag names can be at most {} characters long.", MAX_TAG_NAME_LENGTH),
		}
	}
}

/// Tag names are matched case-insensitively and without surrounding whitespace.
pub fn normalize_tag_name(name: &str) -> Result<String, TagNameError> {
	let name = name.trim().to_lowercase();
	if name.is_empty() {
		return Err(TagNameError::Empty);
	}
	if name.chars().count() > MAX_TAG_NAME_LENGTH {
		return Err(TagNameError::TooLong);
	}
	Ok(name)
}

pub async fn handle_command(
	ctx: &BotContext,
	interaction: &InteractionCreate,
	command_data: &CommandData,
) -> miette::Result<()> {
	let (guild_id, user_id) = invocation(interaction, "Tag")?;
	let Some((subcommand, subcommand_options)) = options::subcommand(&command_data.options) else {
		bail!("Tag command invoked with no subcommand");
	};

	if subcommand == "list" {
		return handle_list(ctx, interaction, guild_id).await;
	}

	let Some(name) = options::string(subcommand_options, "name") else {
		bail!("Tag {} subcommand received without a name", subcommand);
	};
	let name = match normalize_tag_name(name) {
		Ok(name) => name,
		Err(error) => return ephemeral_reply(ctx, interaction, &error.to_string()).await,
	};

	if subcommand == "show" {
		return handle_show(ctx, interaction, guild_id, &name).await;
	}
	if !interaction_member_is_staff(ctx, interaction, guild_id)? {
		return ephemeral_reply(ctx, interaction, MISSING_PERMISSIONS).await;
	}

	let message = match subcommand {
		"create" => create_tag(ctx, guild_id, user_id, &name, subcommand_options)?,
		"edit" => edit_tag(ctx, guild_id, &name, subcommand_options)?,
		"delete" => delete_tag(ctx, guild_id, &name)?,
		_ => bail!("Unknown tag subcommand: {}", subcommand),
	};
	ephemeral_reply(ctx, interaction, &message).await
}

fn find_tag(db_connection: &mut PgConnection, guild_id: Id<GuildMarker>, name: &str) -> QueryResult<Option<Tag>> {
	tags::table
		.filter(tags::guild.eq(database_id_from_discord_id(guild_id.get())))
		.filter(tags::name.eq(name))
		.first(db_connection)
		.optional()
}

async fn handle_show(
	ctx: &BotContext,
	interaction: &InteractionCreate,
	guild_id: Id<GuildMarker>,
	name: &str,
) -> miette::Result<()> {
	let tag = {
		let mut db_connection = ctx.db_connection_pool.get().into_diagnostic()?;
		find_tag(&mut db_connection, guild_id, name).into_diagnostic()?
	};
	match tag {
		Some(tag) => reply(ctx, interaction, &tag.content).await,
		None => ephemeral_reply(ctx, interaction, &format!("There's no tag named `{}`.", name)).await,
	}
}

async fn handle_list(ctx: &BotContext, interaction: &InteractionCreate, guild_id: Id<GuildMarker>) -> miette::Result<()> {
	let names: Vec<String> = {
		let mut db_connection = ctx.db_connection_pool.get().into_diagnostic()?;
		tags::table
			.filter(tags::guild.eq(database_id_from_discord_id(guild_id.get())))
			.select(tags::name)
			.order(tags::name.asc())
			.load(&mut db_connection)
			.into_diagnostic()?
	};
	if names.is_empty() {
		return ephemeral_reply(ctx, interaction, "This server has no tags.").await;
	}

	let mut message = String::from("Tags:");
	for name in names {
		let entry = format!(" `{}`", name);
		if message.len() + entry.len() > usize::from(MAX_TAG_CONTENT_LENGTH) - 4 {
			message.push_str(" …");
			break;
		}
		message.push_str(&entry);
	}
	ephemeral_reply(ctx, interaction, &message).await
}

fn create_tag(
	ctx: &BotContext,
	guild_id: Id<GuildMarker>,
	author: Id<UserMarker>,
	name: &str,
	options: &[CommandDataOption],
) -> miette::Result<String> {
	let Some(content) = options::string(options, "content") else {
		bail!("Tag create subcommand received without content");
	};
	let mut db_connection = ctx.db_connection_pool.get().into_diagnostic()?;
	ensure_guild(&mut db_connection, guild_id).into_diagnostic()?;

	let now = Utc::now();
	let tag = Tag {
		id: cuid2::create_id(),
		guild: database_id_from_discord_id(guild_id.get()),
		name: name.to_string(),
		content: content.to_string(),
		author: database_id_from_discord_id(author.get()),
		created_at: now,
		updated_at: now,
	};
	let insert_result = diesel::insert_into(tags::table)
		.values(tag)
		.execute(&mut db_connection);
	match insert_result {
		Ok(_) => Ok(format!("Created the tag `{}`.", name)),
		Err(DbError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => {
			Ok(format!("A tag named `{}` already exists.", name))
		}
		Err(error) => bail!(error),
	}
}

fn edit_tag(
	ctx: &BotContext,
	guild_id: Id<GuildMarker>,
	name: &str,
	options: &[CommandDataOption],
) -> miette::Result<String> {
	let Some(content) = options::string(options, "content") else {
		bail!("Tag edit subcommand received without content");
	};
	let mut db_connection = ctx.db_connection_pool.get().into_diagnostic()?;
	let updated = diesel::update(
		tags::table
			.filter(tags::guild.eq(database_id_from_discord_id(guild_id.get())))
			.filter(tags::name.eq(name)),
	)
	.set((tags::content.eq(content), tags::updated_at.eq(Utc::now())))
	.execute(&mut db_connection)
	.into_diagnostic()?;
	if updated == 0 {
		Ok(format!("There's no tag named `{}`.", name))
	} else {
		Ok(format!("Updated the tag `{}`.", name))
	}
}

fn delete_tag(ctx: &BotContext, guild_id: Id<GuildMarker>, name: &str) -> miette::Result<String> {
	let mut db_connection = ctx.db_connection_pool.get().into_diagnostic()?;
	let deleted = diesel::delete(
		tags::table
			.filter(tags::guild.eq(database_id_from_discord_id(guild_id.get())))
			.filter(tags::name.eq(name)),
	)
	.execute(&mut db_connection)
	.into_diagnostic()?;
	if deleted == 0 {
		Ok(format!("There's no tag named `{}`.", name))
	} else {
		Ok(format!("Deleted the tag `{}`.", name))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn names_are_trimmed_and_lowercased() {
		assert_eq!(normalize_tag_name("  Rules "), Ok(String::from("rules")));
	}

	#[test]
	fn blank_names_are_rejected() {
		assert_eq!(normalize_tag_name("   "), Err(TagNameError::Empty));
	}

	#[test]
	fn name_length_counts_characters() {
		assert!(normalize_tag_name(&"é".repeat(32)).is_ok());
		assert_eq!(normalize_tag_name(&"a".repeat(33)), Err(TagNameError::TooLong));
	}
}
