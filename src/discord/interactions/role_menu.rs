// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::discord::context::BotContext;
use crate::discord::utils::responses::{defer, ephemeral_reply, update_deferred};
use crate::discord::utils::http::with_reason;
use crate::model::{RoleMenu, RoleMenuOption, database_id_from_discord_id};
use crate::schema::{role_menu_options, role_menus};
use diesel::prelude::*;
use miette::{IntoDiagnostic, bail};
use twilight_mention::fmt::Mention;
use twilight_model::gateway::payload::incoming::InteractionCreate;
use twilight_model::id::Id;
use twilight_model::id::marker::RoleMarker;

/// Works out which of a menu's roles to give and take so the member ends up with exactly the selected ones.
///
/// Selected values that aren't roles of the menu are ignored. Roles outside the menu are never touched.
fn role_changes(
	menu_roles: &[Id<RoleMarker>],
	selected: &[String],
	member_roles: &[Id<RoleMarker>],
) -> (Vec<Id<RoleMarker>>, Vec<Id<RoleMarker>>) {
	let mut add = Vec::new();
	let mut remove = Vec::new();
	for role in menu_roles {
		let is_selected = selected.iter().any(|value| value.parse::<u64>().ok() == Some(role.get()));
		let has_role = member_roles.contains(role);
		if is_selected && !has_role {
			add.push(*role);
		} else if !is_selected && has_role {
			remove.push(*role);
		}
	}
	(add, remove)
}

pub async fn handle_selection(
	ctx: &BotContext,
	interaction: &InteractionCreate,
	menu_id: &str,
	selected: &[String],
) -> miette::Result<()> {
	let Some(guild_id) = interaction.guild_id else {
		bail!("Role menu was used outside of a guild");
	};
	let Some(member) = interaction.member.as_ref() else {
		bail!("Role menu was used without member data");
	};
	let Some(user_id) = interaction.author_id() else {
		bail!("Role menu was used without an invoking user");
	};

	let menu: Option<(RoleMenu, Vec<RoleMenuOption>)> = {
		let mut db_connection = ctx.db_connection_pool.get().into_diagnostic()?;
		let menu: Option<RoleMenu> = role_menus::table
			.find(menu_id)
			.first(&mut db_connection)
			.optional()
			.into_diagnostic()?;
		match menu {
			Some(menu) => {
				let options: Vec<RoleMenuOption> = role_menu_options::table
					.filter(role_menu_options::role_menu.eq(&menu.id))
					.order(role_menu_options::position.asc())
					.load(&mut db_connection)
					.into_diagnostic()?;
				Some((menu, options))
			}
			None => None,
		}
	};
	let Some((_, options)) = menu.filter(|(menu, _)| menu.guild == database_id_from_discord_id(guild_id.get())) else {
		return ephemeral_reply(ctx, interaction, "This role menu no longer exists.").await;
	};

	let menu_roles: Vec<Id<RoleMarker>> = options.iter().map(|option| option.get_role()).collect();
	let (add, remove) = role_changes(&menu_roles, selected, &member.roles);
	if add.is_empty() && remove.is_empty() {
		return ephemeral_reply(ctx, interaction, "Your roles are already up to date.").await;
	}

	defer(ctx, interaction, true).await?;
	for role in add.iter() {
		with_reason(ctx.http_client.add_guild_member_role(guild_id, user_id, *role), "Role menu")
			.await
			.into_diagnostic()?;
	}
	for role in remove.iter() {
		with_reason(ctx.http_client.remove_guild_member_role(guild_id, user_id, *role), "Role menu")
			.await
			.into_diagnostic()?;
	}
	tracing::debug!(guild = %guild_id, user = %user_id, menu = menu_id, added = add.len(), removed = remove.len(), "Applied role menu selection");

	let mut lines = Vec::new();
	if !add.is_empty() {
		let roles: Vec<String> = add.iter().map(|role| role.mention().to_string()).collect();
		lines.push(format!("Added: {}", roles.join(", ")));
	}
	if !remove.is_empty() {
		let roles: Vec<String> = remove.iter().map(|role| role.mention().to_string()).collect();
		lines.push(format!("Removed: {}", roles.join(", ")));
	}
	update_deferred(ctx, interaction, &lines.join("\n")).await
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn selection_becomes_the_members_menu_roles() {
		let menu_roles = [Id::new(1), Id::new(2), Id::new(3)];
		let selected = vec![String::from("1"), String::from("3")];
		let member_roles = [Id::new(2), Id::new(3), Id::new(99)];
		let (add, remove) = role_changes(&menu_roles, &selected, &member_roles);
		assert_eq!(add, vec![Id::new(1)]);
		assert_eq!(remove, vec![Id::new(2)]);
	}

	#[test]
	fn values_outside_the_menu_are_ignored() {
		let menu_roles = [Id::new(1)];
		let selected = vec![String::from("42"), String::from("nonsense")];
		let (add, remove) = role_changes(&menu_roles, &selected, &[]);
		assert!(add.is_empty());
		assert!(remove.is_empty());
	}
}
