// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::discord::context::BotContext;
use crate::discord::moderation::{self, LogEntry, find_active, lift_active};
use crate::model::InfractionKind;
use chrono::Utc;
use miette::IntoDiagnostic;
use twilight_model::gateway::payload::incoming::BanRemove;

/// Bans lifted outside the bot disable the matching ban record.
pub async fn handle_ban_remove(ctx: &BotContext, ban: &BanRemove) -> miette::Result<()> {
	let lifted = {
		let mut db_connection = ctx.db_connection_pool.get().into_diagnostic()?;
		let active =
			find_active(&mut db_connection, ban.guild_id, ban.user.id, InfractionKind::Ban).into_diagnostic()?;
		// Expired bans are lifted and reported by the expiry job, and /unban disables the record before unbanning.
		match active {
			Some(active) if active.until.is_none_or(|until| until > Utc::now()) => {
				lift_active(&mut db_connection, ban.guild_id, ban.user.id, InfractionKind::Ban, None)
					.into_diagnostic()?
			}
			_ => None,
		}
	};
	if lifted.is_none() {
		return Ok(());
	}

	tracing::info!(guild = %ban.guild_id, user = %ban.user.id, "Ban was lifted outside the bot");
	let entry = LogEntry {
		action: "Unbanned",
		target: ban.user.id,
		moderator: None,
		reason: Some("Lifted outside the bot"),
		expiry: None,
	};
	moderation::report(ctx, ban.guild_id, &entry).await;
	Ok(())
}
