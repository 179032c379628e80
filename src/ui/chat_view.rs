use chrono::TimeZone;
use std::fmt;

use chatsync::time_format::format_clock;
use chatsync::{Message, MessageThreadController, ScrollAnchor, ThreadPhase};

fn bubble<Tz>(msg: &Message, zone: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let time = format_clock(msg.created_at, zone);
    match msg.status_glyph() {
        Some(glyph) => {
            let read = if glyph.highlighted { " (read)" } else { "" };
            format!("{:>40}  {} {}{}", msg.text, time, glyph.as_str(), read)
        }
        None => format!("{}: {}  {}", msg.sender_name, msg.text, time),
    }
}

/// Lines to print for the open thread. The message list itself is only
/// emitted when the anchor says the view should jump to the end.
pub fn render_lines<Tz>(thread: &MessageThreadController, anchor: &mut ScrollAnchor, zone: &Tz) -> Vec<String>
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let mut lines = Vec::new();
    match thread.phase() {
        ThreadPhase::Loading => {
            lines.push(format!("== {} ==", thread.counterpart_name()));
            lines.push("Loading conversation...".to_string());
            return lines;
        }
        ThreadPhase::LoadFailed => {
            lines.push("Could not load messages. Type /retry to try again.".to_string());
            return lines;
        }
        ThreadPhase::Idle => return lines,
        ThreadPhase::Ready | ThreadPhase::Sending => {}
    }

    if anchor.should_scroll_to_end(thread) {
        lines.push(format!("== {} ==", thread.counterpart_name()));
        lines.extend(thread.messages().iter().map(|m| bubble(m, zone)));
    }
    if let Some(typing) = thread.typing_label() {
        lines.push(typing);
    }
    lines
}

pub fn render<Tz>(thread: &MessageThreadController, anchor: &mut ScrollAnchor, zone: &Tz)
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    for line in render_lines(thread, anchor, zone) {
        println!("{}", line);
    }
}
