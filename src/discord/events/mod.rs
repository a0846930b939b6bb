// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::discord::context::BotContext;
use twilight_model::gateway::event::Event;

mod bans;
mod channels;
mod members;

/// Handles the gateway events that keep persisted state in line with changes made outside the bot.
pub async fn route_events(ctx: &BotContext, event: &Event) -> miette::Result<()> {
	match event {
		Event::MemberAdd(member) => members::handle_member_add(ctx, member).await,
		Event::BanRemove(ban) => bans::handle_ban_remove(ctx, ban).await,
		Event::ChannelDelete(channel) => channels::handle_channel_delete(ctx, channel),
		_ => Ok(()),
	}
}
