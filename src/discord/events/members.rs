// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::discord::context::BotContext;
use crate::discord::moderation::reapply_mute;
use twilight_model::gateway::payload::incoming::MemberAdd;

/// Leaving and rejoining doesn't get rid of a mute.
pub async fn handle_member_add(ctx: &BotContext, member: &MemberAdd) -> miette::Result<()> {
	reapply_mute(ctx, member.guild_id, member.user.id).await?;
	Ok(())
}
