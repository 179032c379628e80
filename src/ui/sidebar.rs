use chrono::{DateTime, TimeZone};
use std::fmt;

use chatsync::api::Presence;
use chatsync::time_format::{LabelStyle, format_relative};
use chatsync::{ConversationListController, FilterKind};

/// Filter pills, then one numbered entry per visible conversation.
pub fn render_lines<Tz>(list: &ConversationListController, style: LabelStyle, now: &DateTime<Tz>) -> Vec<String>
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let view = list.derived_view();
    let mut lines = Vec::new();

    let pills: Vec<String> = FilterKind::ALL
        .iter()
        .map(|kind| {
            let label = kind.pill_label(view.unread_total);
            if *kind == list.filter() { format!("[{}]", label) } else { format!(" {} ", label) }
        })
        .collect();
    lines.push(pills.join(" "));
    if !list.search_text().is_empty() {
        lines.push(format!("search: {}", list.search_text()));
    }

    if list.is_loading() && list.conversations().is_empty() {
        lines.push("Loading your conversations...".to_string());
        return lines;
    }
    if view.items.is_empty() {
        lines.push("No conversations.".to_string());
        return lines;
    }

    for (idx, conv) in view.items.iter().enumerate() {
        let dot = if conv.presence == Presence::Online { " •" } else { "" };
        let when = format_relative(conv.last_message_at, now, style);
        lines.push(format!("{:>2}. {}{}  {}", idx + 1, conv.display_name, dot, when).trim_end().to_string());
        let badge = conv.unread_badge().map(|n| format!(" ({})", n)).unwrap_or_default();
        lines.push(format!("    {}{}", conv.preview_text(), badge));
    }
    lines
}

pub fn render<Tz>(list: &ConversationListController, style: LabelStyle, now: &DateTime<Tz>)
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    println!();
    for line in render_lines(list, style, now) {
        println!("{}", line);
    }
}
