// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::schema::{guilds, infractions, reminders, role_menu_options, role_menus, tags, ticketing_configs, tickets};
use chrono::{DateTime, Duration, Utc};
use diesel::prelude::*;
use diesel_derive_enum::DbEnum;
use std::fmt;
use twilight_model::id::Id;
use twilight_model::id::marker::{ChannelMarker, GuildMarker, MessageMarker, RoleMarker, UserMarker};

/// A guild that's using the bot and its moderation settings.
#[derive(Clone, Debug, Insertable, Queryable)]
pub struct Guild {
	/// The ID of the guild in question.
	pub guild_id: i64,
	/// The roles that are given access to every ticket and may use moderation commands.
	///
	/// To get a Discord-facing version of this more easily, use [Self::get_moderator_roles].
	pub moderator_roles: Vec<i64>,
	/// The role given to muted members, if muting is set up.
	pub mute_role: Option<i64>,
	/// The channel to which moderation actions are reported, if one is set.
	pub moderation_log_channel: Option<i64>,
}

impl Guild {
	/// Creates the settings for a guild with nothing configured.
	pub fn new(guild_id: Id<GuildMarker>) -> Self {
		Self {
			guild_id: database_id_from_discord_id(guild_id.get()),
			moderator_roles: Vec::new(),
			mute_role: None,
			moderation_log_channel: None,
		}
	}

	/// Gets the roles that moderate the guild.
	///
	/// For the raw database representation, use [Self::moderator_roles].
	pub fn get_moderator_roles(&self) -> Vec<Id<RoleMarker>> {
		self.moderator_roles
			.iter()
			.map(|role| Id::new(discord_id_from_database_id(*role)))
			.collect()
	}

	pub fn get_mute_role(&self) -> Option<Id<RoleMarker>> {
		self.mute_role.map(|role| Id::new(discord_id_from_database_id(role)))
	}

	pub fn get_moderation_log_channel(&self) -> Option<Id<ChannelMarker>> {
		self.moderation_log_channel
			.map(|channel| Id::new(discord_id_from_database_id(channel)))
	}
}

/// Per-guild ticketing settings. A guild without a row here doesn't accept tickets.
#[derive(Clone, Debug, Insertable, Queryable)]
pub struct TicketingConfig {
	pub guild: i64,
	/// The category in which open ticket channels are placed.
	///
	/// To get a Discord-facing version of this more easily, use [Self::get_opened_category].
	pub opened_category: i64,
	/// The category to which closed ticket channels are moved.
	///
	/// To get a Discord-facing version of this more easily, use [Self::get_closed_category].
	pub closed_category: i64,
	/// The channel to which transcripts are posted.
	///
	/// To get a Discord-facing version of this more easily, use [Self::get_log_channel].
	pub log_channel: i64,
	pub opened_name_prefix: String,
	pub closed_name_prefix: String,
	/// The last guild-specific ticket ID handed out. Only ever increases.
	pub last_ticket_id: i64,
	/// Open tickets without activity for this long are closed automatically.
	pub auto_close_after_seconds: Option<i64>,
	/// Closed tickets have their channels deleted after this long.
	pub auto_clean_after_seconds: Option<i64>,
	/// Text of the embed sent to a newly opened ticket.
	pub welcome_message: String,
	/// Text of the embed with the "Open ticket" button.
	pub center_message: String,
	pub embed_color: i32,
}

impl TicketingConfig {
	pub const DEFAULT_EMBED_COLOR: i32 = 0x2c2f33;

	pub fn get_guild(&self) -> Id<GuildMarker> {
		Id::new(discord_id_from_database_id(self.guild))
	}

	pub fn get_opened_category(&self) -> Id<ChannelMarker> {
		Id::new(discord_id_from_database_id(self.opened_category))
	}

	pub fn get_closed_category(&self) -> Id<ChannelMarker> {
		Id::new(discord_id_from_database_id(self.closed_category))
	}

	pub fn get_log_channel(&self) -> Id<ChannelMarker> {
		Id::new(discord_id_from_database_id(self.log_channel))
	}

	pub fn auto_close_after(&self) -> Option<Duration> {
		self.auto_close_after_seconds.map(Duration::seconds)
	}

	pub fn auto_clean_after(&self) -> Option<Duration> {
		self.auto_clean_after_seconds.map(Duration::seconds)
	}

	pub fn embed_color(&self) -> u32 {
		self.embed_color as u32
	}
}

/// The database representation of a ticket and the channel it lives in.
#[derive(Clone, Debug, Queryable, Selectable)]
pub struct Ticket {
	pub id: i64,
	/// The sequential ID shown to users, unique within the guild.
	pub guild_specific_id: i64,
	/// The ID of the guild the ticket is with.
	///
	/// To get a Discord-facing version of this more easily, use [Self::get_guild].
	pub guild: i64,
	/// The ID of the user who opened the ticket.
	///
	/// To get a Discord-facing version of this more easily, use [Self::get_owner].
	pub owner: i64,
	/// The ticket's channel. Empty until the channel has been created.
	///
	/// To get a Discord-facing version of this more easily, use [Self::get_channel].
	pub channel: Option<i64>,
	/// Closed tickets are disabled.
	pub disabled: bool,
	pub private: bool,
	/// Members given access to the channel in addition to the owner.
	pub added_users: Vec<i64>,
	/// Roles given access to the channel in addition to moderator roles.
	pub added_roles: Vec<i64>,
	pub opened_at: DateTime<Utc>,
	pub closed_at: Option<DateTime<Utc>>,
	pub closed_by: Option<i64>,
	pub reopened_at: Option<DateTime<Utc>>,
	pub reopened_by: Option<i64>,
	pub welcome_message: Option<i64>,
	pub close_message: Option<i64>,
	pub reopen_message: Option<i64>,
	pub channel_deleted_at: Option<DateTime<Utc>>,
}

impl Ticket {
	pub fn get_guild(&self) -> Id<GuildMarker> {
		Id::new(discord_id_from_database_id(self.guild))
	}

	pub fn get_owner(&self) -> Id<UserMarker> {
		Id::new(discord_id_from_database_id(self.owner))
	}

	pub fn get_channel(&self) -> Option<Id<ChannelMarker>> {
		self.channel.map(|channel| Id::new(discord_id_from_database_id(channel)))
	}

	pub fn get_welcome_message(&self) -> Option<Id<MessageMarker>> {
		self.welcome_message
			.map(|message| Id::new(discord_id_from_database_id(message)))
	}
}

#[derive(Insertable)]
#[diesel(table_name = tickets)]
pub struct NewTicket {
	pub guild_specific_id: i64,
	pub guild: i64,
	pub owner: i64,
	pub opened_at: DateTime<Utc>,
}

#[derive(Clone, Copy, DbEnum, Debug, Eq, PartialEq)]
#[ExistingTypePath = "crate::schema::sql_types::InfractionKind"]
pub enum InfractionKind {
	Ban,
	Mute,
}

impl fmt::Display for InfractionKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Ban => write!(f, "ban"),
			Self::Mute => write!(f, "mute"),
		}
	}
}

/// A ban or mute applied to a member of a guild.
#[derive(Clone, Debug, Insertable, Queryable)]
pub struct Infraction {
	pub id: String,
	pub kind: InfractionKind,
	pub guild: i64,
	pub target_user: i64,
	pub moderator: i64,
	pub applied_at: DateTime<Utc>,
	/// When the infraction ends. Permanent infractions have no end.
	pub until: Option<DateTime<Utc>>,
	pub reason: String,
	/// Lifted infractions are disabled.
	pub disabled: bool,
	pub lifted_by: Option<i64>,
	pub lifted_at: Option<DateTime<Utc>>,
}

impl Infraction {
	pub fn get_guild(&self) -> Id<GuildMarker> {
		Id::new(discord_id_from_database_id(self.guild))
	}

	pub fn get_target_user(&self) -> Id<UserMarker> {
		Id::new(discord_id_from_database_id(self.target_user))
	}

	pub fn get_moderator(&self) -> Id<UserMarker> {
		Id::new(discord_id_from_database_id(self.moderator))
	}
}

#[derive(Clone, Debug, Insertable, Queryable)]
pub struct Tag {
	pub id: String,
	pub guild: i64,
	pub name: String,
	pub content: String,
	pub author: i64,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Insertable, Queryable)]
pub struct RoleMenu {
	pub id: String,
	pub guild: i64,
	pub name: String,
	pub channel: i64,
	pub message: Option<i64>,
	pub text: String,
}

impl RoleMenu {
	pub fn get_channel(&self) -> Id<ChannelMarker> {
		Id::new(discord_id_from_database_id(self.channel))
	}

	pub fn get_message(&self) -> Option<Id<MessageMarker>> {
		self.message.map(|message| Id::new(discord_id_from_database_id(message)))
	}
}

#[derive(Clone, Debug, Insertable, Queryable)]
pub struct RoleMenuOption {
	pub id: String,
	pub role_menu: String,
	pub role: i64,
	pub label: String,
	pub position: i32,
}

impl RoleMenuOption {
	pub fn get_role(&self) -> Id<RoleMarker> {
		Id::new(discord_id_from_database_id(self.role))
	}
}

#[derive(Clone, Debug, Insertable, Queryable)]
pub struct Reminder {
	pub id: String,
	pub guild: i64,
	pub channel: i64,
	pub target_user: i64,
	pub text: String,
	pub remind_at: DateTime<Utc>,
	pub created_at: DateTime<Utc>,
	pub delivered: bool,
}

impl Reminder {
	pub fn get_channel(&self) -> Id<ChannelMarker> {
		Id::new(discord_id_from_database_id(self.channel))
	}

	pub fn get_target_user(&self) -> Id<UserMarker> {
		Id::new(discord_id_from_database_id(self.target_user))
	}
}

/// Converts an ID used with Discord (unsigned) to an ID for Postgres use (signed)
pub fn database_id_from_discord_id(discord_id: u64) -> i64 {
	discord_id as i64
}

/// Converts an ID retrieved from the database (signed) to an ID for use with Discord (unsigned)
pub fn discord_id_from_database_id(database_id: i64) -> u64 {
	database_id as u64
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn ids_survive_database_round_trip_above_signed_range() {
		let discord_id = u64::MAX - 5;
		let database_id = database_id_from_discord_id(discord_id);
		assert!(database_id < 0);
		assert_eq!(discord_id_from_database_id(database_id), discord_id);
	}
}
