// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use super::ModerationError;
use super::infractions::{
	InfractionRequest, RecordOutcome, find_active, lift_active, lift_by_id, record_infraction, restore_lifted,
};
use super::log::{LogEntry, report};
use crate::discord::context::BotContext;
use crate::discord::utils::guilds::{ensure_guild, load_guild};
use crate::discord::utils::http::{ignore_not_found, undo_on_error, with_reason};
use crate::discord::utils::timestamp::describe_expiry;
use crate::model::{Infraction, InfractionKind};
use chrono::{DateTime, Utc};
use miette::IntoDiagnostic;
use twilight_http::request::AuditLogReason;
use twilight_model::id::Id;
use twilight_model::id::marker::{GuildMarker, UserMarker};

fn validate_target(
	ctx: &BotContext,
	target: Id<UserMarker>,
	moderator: Id<UserMarker>,
) -> Result<(), ModerationError> {
	if target == moderator {
		return Err(ModerationError::InvalidTarget("You can't moderate yourself."));
	}
	if target == ctx.bot_user_id {
		return Err(ModerationError::InvalidTarget("I can't moderate myself."));
	}
	Ok(())
}

fn record(ctx: &BotContext, request: &InfractionRequest<'_>) -> miette::Result<RecordOutcome> {
	let mut db_connection = ctx.db_connection_pool.get().into_diagnostic()?;
	ensure_guild(&mut db_connection, request.guild).into_diagnostic()?;
	record_infraction(&mut db_connection, request).into_diagnostic()
}

/// Takes back a just-created infraction after Discord refused to apply it.
fn roll_back(ctx: &BotContext, infraction: &Infraction) -> miette::Result<()> {
	let mut db_connection = ctx.db_connection_pool.get().into_diagnostic()?;
	lift_by_id(&mut db_connection, &infraction.id).into_diagnostic()?;
	Ok(())
}

/// Reactivates an infraction whose lifting Discord refused.
fn restore(ctx: &BotContext, infraction: &Infraction) -> miette::Result<()> {
	let mut db_connection = ctx.db_connection_pool.get().into_diagnostic()?;
	restore_lifted(&mut db_connection, &infraction.id).into_diagnostic()?;
	Ok(())
}

async fn report_outcome(ctx: &BotContext, outcome: &RecordOutcome, created: &str, extended: &str, reason: &str) {
	let action = match outcome {
		RecordOutcome::Created(_) => created,
		RecordOutcome::Extended(_) => extended,
		RecordOutcome::Unchanged(_) => return,
	};
	let infraction = outcome.infraction();
	let entry = LogEntry {
		action,
		target: infraction.get_target_user(),
		moderator: Some(infraction.get_moderator()),
		reason: Some(reason),
		expiry: Some(describe_expiry(infraction.until.as_ref())),
	};
	report(ctx, infraction.get_guild(), &entry).await;
}

/// Bans a member, or extends their active ban.
pub async fn ban(
	ctx: &BotContext,
	guild_id: Id<GuildMarker>,
	target: Id<UserMarker>,
	moderator: Id<UserMarker>,
	until: Option<DateTime<Utc>>,
	reason: &str,
) -> Result<RecordOutcome, ModerationError> {
	validate_target(ctx, target, moderator)?;
	let request = InfractionRequest {
		kind: InfractionKind::Ban,
		guild: guild_id,
		target,
		moderator,
		until,
		reason,
	};
	let outcome = record(ctx, &request)?;

	if let RecordOutcome::Created(infraction) = &outcome {
		let result = with_reason(ctx.http_client.create_ban(guild_id, target), reason)
			.await
			.into_diagnostic();
		undo_on_error(result, || roll_back(ctx, infraction))?;
		tracing::info!(guild = %guild_id, user = %target, "Banned user");
	}

	report_outcome(ctx, &outcome, "Banned", "Ban extended", reason).await;
	Ok(outcome)
}

/// Lifts a member's active ban.
pub async fn unban(
	ctx: &BotContext,
	guild_id: Id<GuildMarker>,
	target: Id<UserMarker>,
	moderator: Id<UserMarker>,
	reason: &str,
) -> Result<Infraction, ModerationError> {
	let lifted = {
		let mut db_connection = ctx.db_connection_pool.get().into_diagnostic()?;
		lift_active(&mut db_connection, guild_id, target, InfractionKind::Ban, Some(moderator)).into_diagnostic()?
	};
	let Some(lifted) = lifted else {
		return Err(ModerationError::NotFound);
	};
	// The record goes first so the ban removal event doesn't count this as lifted outside the bot.
	let result = with_reason(ctx.http_client.delete_ban(guild_id, target), reason).await;
	undo_on_error(ignore_not_found(result), || restore(ctx, &lifted))?;
	tracing::info!(guild = %guild_id, user = %target, "Unbanned user");

	let entry = LogEntry {
		action: "Unbanned",
		target,
		moderator: Some(moderator),
		reason: Some(reason),
		expiry: None,
	};
	report(ctx, guild_id, &entry).await;
	Ok(lifted)
}

/// Mutes a member with the guild's mute role, or extends their active mute.
///
/// Members who aren't in the guild still get the mute recorded; it's applied when they join.
pub async fn mute(
	ctx: &BotContext,
	guild_id: Id<GuildMarker>,
	target: Id<UserMarker>,
	moderator: Id<UserMarker>,
	until: Option<DateTime<Utc>>,
	reason: &str,
) -> Result<RecordOutcome, ModerationError> {
	validate_target(ctx, target, moderator)?;
	let mute_role = {
		let mut db_connection = ctx.db_connection_pool.get().into_diagnostic()?;
		load_guild(&mut db_connection, guild_id)
			.into_diagnostic()?
			.and_then(|guild| guild.get_mute_role())
	};
	let Some(mute_role) = mute_role else {
		return Err(ModerationError::NoMuteRole);
	};

	let request = InfractionRequest {
		kind: InfractionKind::Mute,
		guild: guild_id,
		target,
		moderator,
		until,
		reason,
	};
	let outcome = record(ctx, &request)?;

	if let RecordOutcome::Created(infraction) = &outcome {
		let result = with_reason(
			ctx.http_client.add_guild_member_role(guild_id, target, mute_role),
			reason,
		)
		.await;
		undo_on_error(ignore_not_found(result), || roll_back(ctx, infraction))?;
		tracing::info!(guild = %guild_id, user = %target, "Muted user");
	}

	report_outcome(ctx, &outcome, "Muted", "Mute extended", reason).await;
	Ok(outcome)
}

/// Lifts a member's active mute.
pub async fn unmute(
	ctx: &BotContext,
	guild_id: Id<GuildMarker>,
	target: Id<UserMarker>,
	moderator: Id<UserMarker>,
	reason: &str,
) -> Result<Infraction, ModerationError> {
	let (lifted, mute_role) = {
		let mut db_connection = ctx.db_connection_pool.get().into_diagnostic()?;
		let lifted =
			lift_active(&mut db_connection, guild_id, target, InfractionKind::Mute, Some(moderator)).into_diagnostic()?;
		let guild = load_guild(&mut db_connection, guild_id).into_diagnostic()?;
		(lifted, guild.and_then(|guild| guild.get_mute_role()))
	};
	let Some(lifted) = lifted else {
		return Err(ModerationError::NotFound);
	};
	if let Some(mute_role) = mute_role {
		let result = with_reason(
			ctx.http_client.remove_guild_member_role(guild_id, target, mute_role),
			reason,
		)
		.await;
		undo_on_error(ignore_not_found(result), || restore(ctx, &lifted))?;
	}
	tracing::info!(guild = %guild_id, user = %target, "Unmuted user");

	let entry = LogEntry {
		action: "Unmuted",
		target,
		moderator: Some(moderator),
		reason: Some(reason),
		expiry: None,
	};
	report(ctx, guild_id, &entry).await;
	Ok(lifted)
}

/// Gives a (re)joining member the mute role again if they have an active mute. Returns whether the role was applied.
pub async fn reapply_mute(ctx: &BotContext, guild_id: Id<GuildMarker>, user: Id<UserMarker>) -> miette::Result<bool> {
	let (active, mute_role) = {
		let mut db_connection = ctx.db_connection_pool.get().into_diagnostic()?;
		let active = find_active(&mut db_connection, guild_id, user, InfractionKind::Mute).into_diagnostic()?;
		let guild = load_guild(&mut db_connection, guild_id).into_diagnostic()?;
		(active, guild.and_then(|guild| guild.get_mute_role()))
	};
	let (Some(_), Some(mute_role)) = (active, mute_role) else {
		return Ok(false);
	};
	ctx.http_client
		.add_guild_member_role(guild_id, user, mute_role)
		.reason("Re-applying active mute")
		.await
		.into_diagnostic()?;
	tracing::info!(guild = %guild_id, %user, "Re-applied mute to rejoining member");
	Ok(true)
}

/// Lifts an infraction whose time is up. Discord is updated first so a failure leaves the record active to be retried.
pub async fn lift_expired(ctx: &BotContext, infraction: &Infraction) -> miette::Result<()> {
	let guild_id = infraction.get_guild();
	let target = infraction.get_target_user();
	let action = match infraction.kind {
		InfractionKind::Ban => {
			let result = ctx
				.http_client
				.delete_ban(guild_id, target)
				.reason("Ban expired")
				.await;
			ignore_not_found(result)?;
			"Ban expired"
		}
		InfractionKind::Mute => {
			let mute_role = {
				let mut db_connection = ctx.db_connection_pool.get().into_diagnostic()?;
				load_guild(&mut db_connection, guild_id)
					.into_diagnostic()?
					.and_then(|guild| guild.get_mute_role())
			};
			if let Some(mute_role) = mute_role {
				let result = ctx
					.http_client
					.remove_guild_member_role(guild_id, target, mute_role)
					.reason("Mute expired")
					.await;
				ignore_not_found(result)?;
			}
			"Mute expired"
		}
	};

	let lifted = {
		let mut db_connection = ctx.db_connection_pool.get().into_diagnostic()?;
		lift_by_id(&mut db_connection, &infraction.id).into_diagnostic()?
	};
	if lifted.is_some() {
		tracing::info!(guild = %guild_id, user = %target, kind = %infraction.kind, "Lifted expired infraction");
		let entry = LogEntry {
			action,
			target,
			moderator: None,
			reason: None,
			expiry: None,
		};
		report(ctx, guild_id, &entry).await;
	}
	Ok(())
}
