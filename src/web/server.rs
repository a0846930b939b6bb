// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use super::state::AppState;
use crate::config::ConfigData;
use crate::database::{DbPool, ping};
use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use miette::IntoDiagnostic;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

pub async fn run_server_task(config: Arc<ConfigData>, db_connection_pool: DbPool) {
	let task_result = run_server(config, db_connection_pool).await;
	if let Err(error) = task_result {
		tracing::error!(source = ?error, "Web server failed to run");
	}
}

fn router(app_state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.layer(TraceLayer::new_for_http())
		.with_state(app_state)
}

async fn run_server(config: Arc<ConfigData>, db_connection_pool: DbPool) -> miette::Result<()> {
	let site_addr = &config.web.bind_addr;
	let app = router(AppState { db_connection_pool });

	tracing::info!("Listening on http://{}", site_addr);
	let listener = TcpListener::bind(site_addr).await.into_diagnostic()?;
	axum::serve(listener, app.into_make_service()).await.into_diagnostic()?;

	Ok(())
}

/// Reports whether the bot can still reach its database.
async fn health(State(db_connection_pool): State<DbPool>) -> (StatusCode, &'static str) {
	// Checking out a connection blocks, so keep it off the async workers.
	let healthy = tokio::task::spawn_blocking(move || ping(&db_connection_pool))
		.await
		.unwrap_or(false);
	if healthy {
		(StatusCode::OK, "ok")
	} else {
		(StatusCode::SERVICE_UNAVAILABLE, "database unavailable")
	}
}
