// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::discord::BotContext;
use crate::discord::utils::http::is_not_found;
use crate::model::Reminder;
use crate::schema::reminders;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use miette::IntoDiagnostic;
use twilight_mention::fmt::Mention;
use twilight_model::channel::message::AllowedMentions;

fn due_reminders(db_connection: &mut PgConnection, now: DateTime<Utc>) -> QueryResult<Vec<Reminder>> {
	reminders::table
		.filter(reminders::delivered.eq(false))
		.filter(reminders::remind_at.le(now))
		.order(reminders::remind_at.asc())
		.load(db_connection)
}

fn reminder_text(reminder: &Reminder) -> String {
	format!("{}, you asked me to remind you: {}", reminder.get_target_user().mention(), reminder.text)
}

pub async fn deliver_reminders(ctx: &BotContext) {
	let due = match ctx
		.db_connection_pool
		.get()
		.into_diagnostic()
		.and_then(|mut db_connection| due_reminders(&mut db_connection, Utc::now()).into_diagnostic())
	{
		Ok(due) => due,
		Err(error) => {
			tracing::error!(source = ?error, "Failed to load due reminders");
			return;
		}
	};

	for reminder in due.iter() {
		if let Err(error) = deliver(ctx, reminder).await {
			tracing::error!(source = ?error, guild = reminder.guild, reminder = reminder.id, "Failed to deliver reminder");
		}
	}
}

async fn deliver(ctx: &BotContext, reminder: &Reminder) -> miette::Result<()> {
	let allowed_mentions = AllowedMentions {
		users: vec![reminder.get_target_user()],
		..Default::default()
	};
	let content = reminder_text(reminder);
	let result = ctx
		.http_client
		.create_message(reminder.get_channel())
		.content(&content)
		.allowed_mentions(Some(&allowed_mentions))
		.await;
	match result {
		Ok(_) => (),
		// The channel is gone, so there's nowhere left to deliver it.
		Err(error) if is_not_found(&error) => {
			tracing::warn!(reminder = reminder.id, "Reminder channel no longer exists; dropping reminder");
		}
		Err(error) => return Err(error).into_diagnostic(),
	}

	let mut db_connection = ctx.db_connection_pool.get().into_diagnostic()?;
	diesel::update(reminders::table.find(&reminder.id))
		.set(reminders::delivered.eq(true))
		.execute(&mut db_connection)
		.into_diagnostic()?;
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn reminder_mentions_its_user() {
		let now = Utc::now();
		let reminder = Reminder {
			id: String::from("r1"),
			guild: 1,
			channel: 2,
			target_user: 3,
			text: String::from("stretch"),
			remind_at: now,
			created_at: now,
			delivered: false,
		};
		assert_eq!(reminder_text(&reminder), "<@3>, you asked me to remind you: stretch");
	}
}
