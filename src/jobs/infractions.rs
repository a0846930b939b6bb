// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::discord::BotContext;
use crate::discord::moderation::{expired_infractions, lift_expired};
use chrono::Utc;
use miette::IntoDiagnostic;

pub async fn expire_infractions(ctx: &BotContext) {
	let expired = match ctx.db_connection_pool.get().into_diagnostic().and_then(|mut db_connection| {
		expired_infractions(&mut db_connection, Utc::now()).into_diagnostic()
	}) {
		Ok(expired) => expired,
		Err(error) => {
			tracing::error!(source = ?error, "Failed to load expired infractions");
			return;
		}
	};

	for infraction in expired.iter() {
		if let Err(error) = lift_expired(ctx, infraction).await {
			tracing::error!(
				source = ?error,
				guild = %infraction.get_guild(),
				infraction = infraction.id,
				"Failed to lift expired infraction"
			);
		}
	}
}
