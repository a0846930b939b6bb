// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::model::{Guild, database_id_from_discord_id};
use crate::schema::guilds;
use diesel::prelude::*;
use twilight_model::id::Id;
use twilight_model::id::marker::GuildMarker;

pub fn load_guild(db_connection: &mut PgConnection, guild_id: Id<GuildMarker>) -> QueryResult<Option<Guild>> {
	guilds::table
		.find(database_id_from_discord_id(guild_id.get()))
		.first(db_connection)
		.optional()
}

/// Gets the guild's settings, creating empty settings the first time the guild is seen.
pub fn ensure_guild(db_connection: &mut PgConnection, guild_id: Id<GuildMarker>) -> QueryResult<Guild> {
	diesel::insert_into(guilds::table)
		.values(Guild::new(guild_id))
		.on_conflict_do_nothing()
		.execute(db_connection)?;
	guilds::table
		.find(database_id_from_discord_id(guild_id.get()))
		.first(db_connection)
}
