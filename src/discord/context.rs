// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::database::DbPool;
use std::sync::Arc;
use twilight_http::client::{Client, InteractionClient};
use twilight_model::id::Id;
use twilight_model::id::marker::{ApplicationMarker, UserMarker};

/// Everything a command, interaction, event, or background job needs to talk to Discord and the database.
#[derive(Clone)]
pub struct BotContext {
	pub http_client: Arc<Client>,
	pub application_id: Id<ApplicationMarker>,
	/// The bot's own user. Ticket channels always grant this user access.
	pub bot_user_id: Id<UserMarker>,
	pub db_connection_pool: DbPool,
}

impl BotContext {
	pub fn interaction_client(&self) -> InteractionClient<'_> {
		self.http_client.interaction(self.application_id)
	}
}

#[cfg(test)]
impl BotContext {
	/// A context for tests. The database is never connected to, and Discord requests go to `api_host` over plain HTTP
	/// when one is given.
	pub fn for_tests(api_host: Option<String>) -> Self {
		use diesel::PgConnection;
		use diesel::r2d2::{ConnectionManager, Pool};

		let manager = ConnectionManager::<PgConnection>::new("postgres://localhost/lisbeth_bot_tests");
		let db_connection_pool = Pool::builder().min_idle(Some(0)).build_unchecked(manager);
		let mut http_client = Client::builder().token(String::from("Bot test-token")).ratelimiter(None);
		if let Some(api_host) = api_host {
			http_client = http_client.proxy(api_host, true);
		}
		Self {
			http_client: Arc::new(http_client.build()),
			application_id: Id::new(1),
			bot_user_id: Id::new(300),
			db_connection_pool,
		}
	}
}
