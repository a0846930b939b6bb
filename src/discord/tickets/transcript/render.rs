// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use chrono::{DateTime, Utc};
use regex::{Captures, Regex};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt::Write;
use std::sync::LazyLock;

static CODE_BLOCK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)```(?:[A-Za-z0-9_+-]*\n)?(.*?)```").unwrap());
static INLINE_CODE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"`([^`\n]+)`").unwrap());
static USER_MENTION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"&lt;@!?(\d+)&gt;").unwrap());
static ROLE_MENTION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"&lt;@&amp;(\d+)&gt;").unwrap());
static CHANNEL_MENTION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"&lt;#(\d+)&gt;").unwrap());
static CUSTOM_EMOJI: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"&lt;(a?):(\w+):(\d+)&gt;").unwrap());
static BOLD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*\*(.+?)\*\*").unwrap());
static UNDERLINE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"__(.+?)__").unwrap());
static ITALIC: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*([^*\n]+)\*").unwrap());
static STRIKETHROUGH: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"~~(.+?)~~").unwrap());

const STYLE: &str = "body{background:#313338;color:#dbdee1;font-family:'gg sans','Noto Sans',Helvetica,Arial,sans-serif;margin:0;padding:24px}\
header{border-bottom:1px solid #3f4147;margin-bottom:16px;padding-bottom:12px}\
h1{font-size:20px;margin:0 0 4px}\
.meta{color:#949ba4;font-size:13px}\
#search{background:#1e1f22;border:0;border-radius:4px;color:#dbdee1;margin-top:8px;padding:6px 8px;width:280px}\
.message{display:flex;gap:12px;padding:6px 0}\
.avatar{border-radius:50%;height:40px;width:40px}\
.author{color:#f2f3f5;font-weight:600}\
.bot{background:#5865f2;border-radius:3px;color:#fff;font-size:10px;margin-left:4px;padding:1px 4px}\
.time{color:#949ba4;font-size:12px;margin-left:6px}\
.content{line-height:1.375;white-space:normal;word-wrap:break-word}\
.mention{background:rgba(88,101,242,.3);border-radius:3px;color:#c9cdfb;padding:0 2px}\
.emoji{height:22px;vertical-align:bottom;width:22px}\
code{background:#2b2d31;border-radius:3px;padding:0 3px}\
pre{background:#2b2d31;border:1px solid #1e1f22;border-radius:4px;padding:8px;white-space:pre-wrap}\
.embed{border-left:4px solid #1e1f22;background:#2b2d31;border-radius:4px;margin-top:4px;padding:6px 10px}\
.attachment a{color:#00a8fc}";

const SCRIPT: &str = "const search=document.getElementById('search');\
search.addEventListener('input',()=>{const term=search.value.toLowerCase();\
for(const entry of TRANSCRIPT_INDEX){const element=document.getElementById('m'+entry.id);\
element.style.display=entry.text.includes(term)?'':'none';}});";

/// Everything about the ticket the transcript is rendered for, besides its messages.
pub struct TranscriptHeader {
	pub guild_name: String,
	pub channel_name: String,
	pub ticket_name: String,
	pub owner_name: String,
	pub generated_at: DateTime<Utc>,
}

/// Display names for the snowflakes that may be mentioned in messages.
#[derive(Default)]
pub struct MentionNames {
	pub users: HashMap<u64, String>,
	pub roles: HashMap<u64, String>,
	pub channels: HashMap<u64, String>,
}

pub struct TranscriptMessage {
	pub id: u64,
	pub author_name: String,
	pub avatar_url: Option<String>,
	pub bot: bool,
	pub sent_at: DateTime<Utc>,
	pub content: String,
	pub embeds: Vec<String>,
	pub attachments: Vec<TranscriptAttachment>,
}

pub struct TranscriptAttachment {
	pub filename: String,
	pub url: String,
}

/// Entry in the search index embedded in the page for the in-page filter.
#[derive(Serialize)]
struct SearchEntry {
	id: String,
	text: String,
}

pub fn escape_html(text: &str) -> String {
	let mut escaped = String::with_capacity(text.len());
	for character in text.chars() {
		match character {
			'&' => escaped.push_str("&amp;"),
			'<' => escaped.push_str("&lt;"),
			'>' => escaped.push_str("&gt;"),
			'"' => escaped.push_str("&quot;"),
			'\'' => escaped.push_str("&#39;"),
			_ => escaped.push(character),
		}
	}
	escaped
}

/// Converts message content to HTML: escapes it, then substitutes mentions, custom emoji, and markdown. Code is left
/// as written.
pub fn render_content(content: &str, names: &MentionNames) -> String {
	let escaped = escape_html(content);
	let mut html = String::with_capacity(escaped.len());
	let mut last_end = 0;
	for captures in CODE_BLOCK.captures_iter(&escaped) {
		let (Some(whole), Some(code)) = (captures.get(0), captures.get(1)) else {
			continue;
		};
		html.push_str(&render_inline(&escaped[last_end..whole.start()], names));
		let _ = write!(html, "<pre><code>{}</code></pre>", code.as_str());
		last_end = whole.end();
	}
	html.push_str(&render_inline(&escaped[last_end..], names));
	html
}

fn render_inline(text: &str, names: &MentionNames) -> String {
	let mut html = String::with_capacity(text.len());
	let mut last_end = 0;
	for captures in INLINE_CODE.captures_iter(text) {
		let (Some(whole), Some(code)) = (captures.get(0), captures.get(1)) else {
			continue;
		};
		html.push_str(&render_formatting(&text[last_end..whole.start()], names));
		let _ = write!(html, "<code>{}</code>", code.as_str());
		last_end = whole.end();
	}
	html.push_str(&render_formatting(&text[last_end..], names));
	html
}

fn render_formatting(text: &str, names: &MentionNames) -> String {
	let text = ROLE_MENTION.replace_all(text, |captures: &Captures| {
		let name = lookup(&names.roles, &captures[1]).unwrap_or("deleted-role");
		format!("<span class=\"mention\">@{}</span>", escape_html(name))
	});
	let text = USER_MENTION.replace_all(&text, |captures: &Captures| {
		let name = lookup(&names.users, &captures[1]).unwrap_or("unknown-user");
		format!("<span class=\"mention\">@{}</span>", escape_html(name))
	});
	let text = CHANNEL_MENTION.replace_all(&text, |captures: &Captures| {
		let name = lookup(&names.channels, &captures[1]).unwrap_or("deleted-channel");
		format!("<span class=\"mention\">#{}</span>", escape_html(name))
	});
	let text = CUSTOM_EMOJI.replace_all(&text, |captures: &Captures| {
		let extension = if &captures[1] == "a" { "gif" } else { "png" };
		format!(
			"<img class=\"emoji\" src=\"https://cdn.discordapp.com/emojis/{}.{}\" alt=\":{}:\" title=\":{}:\">",
			&captures[3], extension, &captures[2], &captures[2]
		)
	});
	let text = BOLD.replace_all(&text, "<strong>$1</strong>");
	let text = UNDERLINE.replace_all(&text, "<u>$1</u>");
	let text = ITALIC.replace_all(&text, "<em>$1</em>");
	let text = STRIKETHROUGH.replace_all(&text, "<s>$1</s>");
	text.replace('\n', "<br>")
}

fn lookup<'a>(names: &'a HashMap<u64, String>, id: &str) -> Option<&'a str> {
	let id: u64 = id.parse().ok()?;
	names.get(&id).map(|name| name.as_str())
}

/// Renders the complete transcript page. Messages must be in chronological order.
pub fn render_transcript(header: &TranscriptHeader, messages: &[TranscriptMessage], names: &MentionNames) -> String {
	let mut html = String::new();
	let title = format!("{} - {}", header.ticket_name, header.guild_name);
	let _ = write!(
		html,
		"<!DOCTYPE html><html lang=\"en\"><head><meta charset=\"utf-8\"><title>{}</title><style>{}</style></head><body>",
		escape_html(&title),
		STYLE
	);
	let _ = write!(
		html,
		"<header><h1>{}</h1><div class=\"meta\">#{} in {} &middot; opened by {} &middot; {} messages &middot; generated {}</div><input id=\"search\" type=\"search\" placeholder=\"Filter messages\"></header><main>",
		escape_html(&header.ticket_name),
		escape_html(&header.channel_name),
		escape_html(&header.guild_name),
		escape_html(&header.owner_name),
		messages.len(),
		header.generated_at.format("%Y-%m-%d %H:%M UTC")
	);

	for message in messages {
		let _ = write!(html, "<div class=\"message\" id=\"m{}\">", message.id);
		match &message.avatar_url {
			Some(url) => {
				let _ = write!(html, "<img class=\"avatar\" src=\"{}\" alt=\"\">", escape_html(url));
			}
			None => html.push_str("<div class=\"avatar\"></div>"),
		}
		let _ = write!(
			html,
			"<div><div><span class=\"author\">{}</span>{}<span class=\"time\">{}</span></div><div class=\"content\">{}</div>",
			escape_html(&message.author_name),
			if message.bot { "<span class=\"bot\">BOT</span>" } else { "" },
			message.sent_at.format("%Y-%m-%d %H:%M:%S"),
			render_content(&message.content, names)
		);
		for embed in message.embeds.iter() {
			let _ = write!(html, "<div class=\"embed\">{}</div>", render_content(embed, names));
		}
		for attachment in message.attachments.iter() {
			let _ = write!(
				html,
				"<div class=\"attachment\"><a href=\"{}\">{}</a></div>",
				escape_html(&attachment.url),
				escape_html(&attachment.filename)
			);
		}
		html.push_str("</div></div>");
	}

	let index: Vec<SearchEntry> = messages
		.iter()
		.map(|message| SearchEntry {
			id: message.id.to_string(),
			text: format!("{} {}", message.author_name, message.content).to_lowercase(),
		})
		.collect();
	let index = serde_json::to_string(&index).unwrap_or_else(|_| String::from("[]"));
	// A literal "</script>" in message text would end the script element early.
	let index = index.replace("</", "<\\/");
	let _ = write!(
		html,
		"</main><script>const TRANSCRIPT_INDEX={};{}</script></body></html>",
		index, SCRIPT
	);
	html
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::TimeZone;

	fn names() -> MentionNames {
		let mut names = MentionNames::default();
		names.users.insert(1, String::from("Lisbeth"));
		names.roles.insert(2, String::from("Moderators"));
		names.channels.insert(3, String::from("general"));
		names
	}

	#[test]
	fn escapes_markup() {
		assert_eq!(
			render_content("<script>alert(\"x\")</script>", &MentionNames::default()),
			"&lt;script&gt;alert(&quot;x&quot;)&lt;/script&gt;"
		);
	}

	#[test]
	fn substitutes_mentions() {
		assert_eq!(
			render_content("<@1> <@!1> <@&2> <#3>", &names()),
			"<span class=\"mention\">@Lisbeth</span> <span class=\"mention\">@Lisbeth</span> <span class=\"mention\">@Moderators</span> <span class=\"mention\">#general</span>"
		);
	}

	#[test]
	fn unknown_mentions_get_placeholders() {
		assert_eq!(
			render_content("<@99>", &MentionNames::default()),
			"<span class=\"mention\">@unknown-user</span>"
		);
	}

	#[test]
	fn substitutes_custom_emoji() {
		let html = render_content("<a:wave:123>", &MentionNames::default());
		assert!(html.contains("https://cdn.discordapp.com/emojis/123.gif"));
		assert!(html.contains("alt=\":wave:\""));
	}

	#[test]
	fn renders_markdown() {
		assert_eq!(
			render_content("**bold** *it* __under__ ~~gone~~", &MentionNames::default()),
			"<strong>bold</strong> <em>it</em> <u>under</u> <s>gone</s>"
		);
	}

	#[test]
	fn code_is_left_alone() {
		assert_eq!(
			render_content("`**x**` and ```rust\n<@1> **y**```", &names()),
			"<code>**x**</code> and <pre><code>&lt;@1&gt; **y**</code></pre>"
		);
	}

	#[test]
	fn newlines_become_breaks() {
		assert_eq!(render_content("a\nb", &MentionNames::default()), "a<br>b");
	}

	#[test]
	fn page_contains_messages_in_order_and_safe_index() {
		let header = TranscriptHeader {
			guild_name: String::from("Guild"),
			channel_name: String::from("ticket-0001"),
			ticket_name: String::from("Ticket #0001"),
			owner_name: String::from("Owner"),
			generated_at: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
		};
		let message = |id: u64, content: &str| TranscriptMessage {
			id,
			author_name: String::from("Owner"),
			avatar_url: None,
			bot: false,
			sent_at: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
			content: content.to_string(),
			embeds: Vec::new(),
			attachments: Vec::new(),
		};
		let html = render_transcript(&header, &[message(1, "first"), message(2, "</script>")], &names());
		let first = html.find("id=\"m1\"").unwrap();
		let second = html.find("id=\"m2\"").unwrap();
		assert!(first < second);
		assert_eq!(html.matches("</script>").count(), 1);
		assert!(html.contains("2 messages"));
	}
}
