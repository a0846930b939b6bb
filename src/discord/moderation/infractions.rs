// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use super::expiry::{ExpiryMerge, merge_expiry};
use crate::model::{Infraction, InfractionKind, database_id_from_discord_id};
use crate::schema::infractions;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use twilight_model::id::Id;
use twilight_model::id::marker::{GuildMarker, UserMarker};

/// The result of recording a ban or mute.
#[derive(Debug)]
pub enum RecordOutcome {
	/// No infraction of this kind was active; a new one was created.
	Created(Infraction),
	/// An active infraction had its expiry pushed back.
	Extended(Infraction),
	/// An active infraction already lasts at least as long as requested.
	Unchanged(Infraction),
}

impl RecordOutcome {
	pub fn infraction(&self) -> &Infraction {
		match self {
			Self::Created(infraction) | Self::Extended(infraction) | Self::Unchanged(infraction) => infraction,
		}
	}
}

pub struct InfractionRequest<'a> {
	pub kind: InfractionKind,
	pub guild: Id<GuildMarker>,
	pub target: Id<UserMarker>,
	pub moderator: Id<UserMarker>,
	pub until: Option<DateTime<Utc>>,
	pub reason: &'a str,
}

pub fn find_active(
	db_connection: &mut PgConnection,
	guild: Id<GuildMarker>,
	target: Id<UserMarker>,
	kind: InfractionKind,
) -> QueryResult<Option<Infraction>> {
	infractions::table
		.filter(infractions::guild.eq(database_id_from_discord_id(guild.get())))
		.filter(infractions::target_user.eq(database_id_from_discord_id(target.get())))
		.filter(infractions::kind.eq(kind))
		.filter(infractions::disabled.eq(false))
		.first(db_connection)
		.optional()
}

/// Records a ban or mute, merging its expiry into the active one of the same kind if there is one.
pub fn record_infraction(
	db_connection: &mut PgConnection,
	request: &InfractionRequest<'_>,
) -> QueryResult<RecordOutcome> {
	db_connection.transaction(|db_connection| {
		let active = find_active(db_connection, request.guild, request.target, request.kind)?;
		let Some(active) = active else {
			let infraction = Infraction {
				id: cuid2::create_id(),
				kind: request.kind,
				guild: database_id_from_discord_id(request.guild.get()),
				target_user: database_id_from_discord_id(request.target.get()),
				moderator: database_id_from_discord_id(request.moderator.get()),
				applied_at: Utc::now(),
				until: request.until,
				reason: request.reason.to_string(),
				disabled: false,
				lifted_by: None,
				lifted_at: None,
			};
			let infraction: Infraction = diesel::insert_into(infractions::table)
				.values(infraction)
				.get_result(db_connection)?;
			return Ok(RecordOutcome::Created(infraction));
		};

		match merge_expiry(active.until, request.until) {
			ExpiryMerge::Unchanged => Ok(RecordOutcome::Unchanged(active)),
			ExpiryMerge::Extended(until) => {
				let infraction: Infraction = diesel::update(infractions::table.find(&active.id))
					.set(infractions::until.eq(until))
					.get_result(db_connection)?;
				Ok(RecordOutcome::Extended(infraction))
			}
		}
	})
}

/// Disables the active infraction of the given kind. `lifted_by` is empty when the infraction expired or was lifted
/// outside the bot.
pub fn lift_active(
	db_connection: &mut PgConnection,
	guild: Id<GuildMarker>,
	target: Id<UserMarker>,
	kind: InfractionKind,
	lifted_by: Option<Id<UserMarker>>,
) -> QueryResult<Option<Infraction>> {
	diesel::update(
		infractions::table
			.filter(infractions::guild.eq(database_id_from_discord_id(guild.get())))
			.filter(infractions::target_user.eq(database_id_from_discord_id(target.get())))
			.filter(infractions::kind.eq(kind))
			.filter(infractions::disabled.eq(false)),
	)
	.set((
		infractions::disabled.eq(true),
		infractions::lifted_by.eq(lifted_by.map(|user| database_id_from_discord_id(user.get()))),
		infractions::lifted_at.eq(Some(Utc::now())),
	))
	.get_result(db_connection)
	.optional()
}

/// Disables a specific infraction, if it's still active.
pub fn lift_by_id(db_connection: &mut PgConnection, infraction_id: &str) -> QueryResult<Option<Infraction>> {
	diesel::update(
		infractions::table
			.find(infraction_id)
			.filter(infractions::disabled.eq(false)),
	)
	.set((
		infractions::disabled.eq(true),
		infractions::lifted_at.eq(Some(Utc::now())),
	))
	.get_result(db_connection)
	.optional()
}

/// Makes a lifted infraction active again.
pub fn restore_lifted(db_connection: &mut PgConnection, infraction_id: &str) -> QueryResult<usize> {
	diesel::update(infractions::table.find(infraction_id))
		.set((
			infractions::disabled.eq(false),
			infractions::lifted_by.eq(None::<i64>),
			infractions::lifted_at.eq(None::<DateTime<Utc>>),
		))
		.execute(db_connection)
}

/// Gets active infractions whose end time has passed.
pub fn expired_infractions(db_connection: &mut PgConnection, now: DateTime<Utc>) -> QueryResult<Vec<Infraction>> {
	infractions::table
		.filter(infractions::disabled.eq(false))
		.filter(infractions::until.le(now))
		.order(infractions::until.asc())
		.load(db_connection)
}
