// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Recurring work that isn't triggered by anyone: lifting expired infractions, delivering reminders, and sweeping
//! inactive or long-closed tickets.
//!
//! Every job works through guilds (or items) one at a time and logs failures without stopping, so one broken guild
//! doesn't hold up the rest.

use crate::discord::BotContext;
use std::time::Duration;
use tokio::time::{MissedTickBehavior, interval};

mod infractions;
mod reminders;
mod tickets;

const JOB_INTERVAL: Duration = Duration::from_secs(60);

pub async fn run_jobs(ctx: BotContext) {
	tracing::info!("Background jobs started");
	let mut ticker = interval(JOB_INTERVAL);
	ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

	loop {
		ticker.tick().await;
		infractions::expire_infractions(&ctx).await;
		reminders::deliver_reminders(&ctx).await;
		tickets::auto_close_tickets(&ctx).await;
		tickets::auto_clean_tickets(&ctx).await;
	}
}
