// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use lisbeth_bot::config::parse_config;
use lisbeth_bot::database::{connect_db, run_embedded_migrations};
use lisbeth_bot::discord::{run_bot, set_up_client, set_up_context};
use lisbeth_bot::jobs::run_jobs;
use lisbeth_bot::web::run_server_task;
use std::sync::Arc;

const DEFAULT_CONFIG_PATH: &str = "config.kdl";

#[tokio::main]
async fn main() -> miette::Result<()> {
	let config_path = std::env::args().nth(1).unwrap_or_else(|| String::from(DEFAULT_CONFIG_PATH));
	let config = Arc::new(parse_config(&config_path).await?);

	tracing_subscriber::fmt().with_max_level(config.log_level).init();

	let db_connection_pool = connect_db(&config)?;
	run_embedded_migrations(&db_connection_pool)?;
	tracing::info!("Database is ready");

	let http_client = set_up_client(&config);
	let ctx = set_up_context(http_client, db_connection_pool.clone()).await?;

	tokio::spawn(run_server_task(Arc::clone(&config), db_connection_pool));
	tokio::spawn(run_jobs(ctx.clone()));

	run_bot(ctx, config).await
}
