// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use kdl::{KdlDocument, KdlValue};
use miette::{Diagnostic, IntoDiagnostic};
use std::fmt;
use std::str::FromStr;
use tokio::fs::read_to_string;
use tracing::Level;

/// Reads and parses the configuration file at the given path.
pub async fn parse_config(config_path: &str) -> miette::Result<ConfigData> {
	let config_file_contents = read_to_string(config_path).await.into_diagnostic()?;
	let config = parse_config_str(&config_file_contents)?;
	Ok(config)
}

/// Parses configuration from the contents of a KDL document.
pub fn parse_config_str(contents: &str) -> miette::Result<ConfigData> {
	let document: KdlDocument = contents.parse()?;

	let discord = section(&document, "discord")?;
	let discord = DiscordConfig {
		bot_token: required_string(discord, "discord", "bot_token")?,
	};

	let database = section(&document, "database")?;
	let port = match database.get_arg("port") {
		Some(value) => {
			let Some(port) = value.as_integer().and_then(|port| u16::try_from(port).ok()) else {
				return Err(ConfigError::WrongType {
					node: String::from("database.port"),
					expected: "a port number",
				}
				.into());
			};
			Some(port)
		}
		None => None,
	};
	let database = DatabaseConfig {
		host: required_string(database, "database", "host")?,
		port,
		username: required_string(database, "database", "username")?,
		password: required_string(database, "database", "password")?,
		database: required_string(database, "database", "database")?,
	};

	let web = section(&document, "web")?;
	let web = WebConfig {
		bind_addr: required_string(web, "web", "bind_addr")?,
	};

	let log_level = match document.get_arg("log_level") {
		Some(value) => {
			let level = value.as_string().and_then(|level| Level::from_str(level).ok());
			let Some(level) = level else {
				return Err(ConfigError::WrongType {
					node: String::from("log_level"),
					expected: "one of trace, debug, info, warn, error",
				}
				.into());
			};
			level
		}
		None => Level::INFO,
	};

	Ok(ConfigData {
		discord,
		database,
		web,
		log_level,
	})
}

fn section<'a>(document: &'a KdlDocument, name: &str) -> Result<&'a KdlDocument, ConfigError> {
	document
		.get(name)
		.and_then(|node| node.children())
		.ok_or_else(|| ConfigError::MissingNode(name.to_string()))
}

fn required_string(section: &KdlDocument, section_name: &str, name: &str) -> Result<String, ConfigError> {
	let Some(value) = section.get_arg(name) else {
		return Err(ConfigError::MissingNode(format!("{}.{}", section_name, name)));
	};
	match value {
		KdlValue::String(value) => Ok(value.clone()),
		_ => Err(ConfigError::WrongType {
			node: format!("{}.{}", section_name, name),
			expected: "a string",
		}),
	}
}

#[derive(Debug)]
pub struct ConfigData {
	pub discord: DiscordConfig,
	pub database: DatabaseConfig,
	pub web: WebConfig,
	pub log_level: Level,
}

#[derive(Debug)]
pub struct DiscordConfig {
	pub bot_token: String,
}

#[derive(Debug)]
pub struct DatabaseConfig {
	pub host: String,
	pub port: Option<u16>,
	pub username: String,
	pub password: String,
	pub database: String,
}

#[derive(Debug)]
pub struct WebConfig {
	pub bind_addr: String,
}

#[derive(Debug, Diagnostic)]
pub enum ConfigError {
	MissingNode(String),
	WrongType { node: String, expected: &'static str },
}

impl fmt::Display for ConfigError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::MissingNode(node) => write!(f, "missing required configuration value `{}`", node),
			Self::WrongType { node, expected } => write!(f, "configuration value `{}` must be {}", node, expected),
		}
	}
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
	use super::*;

	const FULL_CONFIG: &str = r#"
discord {
	bot_token "token"
}
database {
	host "localhost"
	port 5433
	username "lisbeth"
	password "hunter2"
	database "lisbeth"
}
web {
	bind_addr "127.0.0.1:8080"
}
log_level "debug"
"#;

	#[test]
	fn parses_full_config() {
		let config = parse_config_str(FULL_CONFIG).unwrap();
		assert_eq!(config.discord.bot_token, "token");
		assert_eq!(config.database.port, Some(5433));
		assert_eq!(config.database.username, "lisbeth");
		assert_eq!(config.web.bind_addr, "127.0.0.1:8080");
		assert_eq!(config.log_level, Level::DEBUG);
	}

	#[test]
	fn optional_values_default() {
		let config = FULL_CONFIG.replace("\tport 5433\n", "").replace("log_level \"debug\"\n", "");
		let config = parse_config_str(&config).unwrap();
		assert_eq!(config.database.port, None);
		assert_eq!(config.log_level, Level::INFO);
	}

	#[test]
	fn missing_token_is_reported_by_name() {
		let config = FULL_CONFIG.replace("\tbot_token \"token\"\n", "");
		let error = parse_config_str(&config).unwrap_err();
		assert!(error.to_string().contains("discord.bot_token"));
	}
}
