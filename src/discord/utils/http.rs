// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use miette::IntoDiagnostic;
use twilight_http::error::{Error, ErrorType};
use twilight_http::request::AuditLogReason;
use twilight_http::response::StatusCode;

/// Whether Discord reported that the requested resource doesn't exist.
pub fn is_not_found(error: &Error) -> bool {
	matches!(error.kind(), ErrorType::Response { status, .. } if *status == StatusCode::NOT_FOUND)
}

/// Treats "not found" responses as success, for requests whose goal is already met when the resource is gone.
pub fn ignore_not_found<T>(result: Result<T, Error>) -> miette::Result<()> {
	match result {
		Ok(_) => Ok(()),
		Err(error) if is_not_found(&error) => Ok(()),
		Err(error) => Err(error).into_diagnostic(),
	}
}

/// Attaches an audit log reason to a request unless the reason is empty.
pub fn with_reason<'a, R: AuditLogReason<'a>>(request: R, reason: &'a str) -> R {
	if reason.is_empty() { request } else { request.reason(reason) }
}

/// Passes a Discord request's result through, running `undo` first when the request failed so stored state goes back
/// to matching Discord. A failed undo is logged; the request's error is the one returned.
pub fn undo_on_error<T, U>(result: miette::Result<T>, undo: U) -> miette::Result<T>
where
	U: FnOnce() -> miette::Result<()>,
{
	if result.is_err() {
		if let Err(undo_error) = undo() {
			tracing::error!(source = ?undo_error, "Failed to undo a database change after a Discord request failed");
		}
	}
	result
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::cell::Cell;

	#[test]
	fn successful_requests_are_not_undone() {
		let undone = Cell::new(false);
		let result = undo_on_error(Ok(5), || {
			undone.set(true);
			Ok(())
		});
		assert_eq!(result.unwrap(), 5);
		assert!(!undone.get());
	}

	#[test]
	fn failed_requests_are_undone() {
		let undone = Cell::new(false);
		let result: miette::Result<()> = undo_on_error(Err(miette::miette!("Missing Permissions")), || {
			undone.set(true);
			Ok(())
		});
		assert_eq!(result.unwrap_err().to_string(), "Missing Permissions");
		assert!(undone.get());
	}

	#[test]
	fn failed_undo_keeps_request_error() {
		let result: miette::Result<()> = undo_on_error(Err(miette::miette!("Missing Permissions")), || {
			Err(miette::miette!("database went away"))
		});
		assert_eq!(result.unwrap_err().to_string(), "Missing Permissions");
	}
}
