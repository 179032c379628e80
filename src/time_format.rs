//! Relative timestamp labels for conversation rows and message bubbles.

use std::fmt;

use chrono::{DateTime, TimeZone, Utc};

const MINUTE_MS: i64 = 60_000;
const HOUR_MS: i64 = 60 * MINUTE_MS;
const DAY_MS: i64 = 24 * HOUR_MS;

/// Which flavour of label to produce.
///
/// The short form ("5m") is used in compact rows. The long form ("5m ago")
/// also prefers a clock time over a date when the timestamp falls on the
/// viewer's current day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LabelStyle {
    pub suffix: bool,
}

impl LabelStyle {
    pub const SHORT: LabelStyle = LabelStyle { suffix: false };
    pub const LONG: LabelStyle = LabelStyle { suffix: true };

    fn tail(self) -> &'static str {
        if self.suffix { " ago" } else { "" }
    }
}

/// Map `timestamp` to a label relative to `now`.
///
/// Buckets use floored integer division of the millisecond age, so an age
/// of exactly 60 000 ms is already "1m". Times past the week bucket are
/// rendered in `now`'s timezone.
pub fn format_relative<Tz>(timestamp: Option<DateTime<Utc>>, now: &DateTime<Tz>, style: LabelStyle) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let Some(timestamp) = timestamp else {
        return String::new();
    };
    let age_ms = now.timestamp_millis() - timestamp.timestamp_millis();
    let minutes = age_ms.div_euclid(MINUTE_MS);
    let hours = age_ms.div_euclid(HOUR_MS);
    let days = age_ms.div_euclid(DAY_MS);
    let tail = style.tail();

    if minutes < 1 {
        return "now".to_string();
    }
    if minutes < 60 {
        return format!("{minutes}m{tail}");
    }
    if hours < 24 {
        return format!("{hours}h{tail}");
    }
    if days < 7 {
        return format!("{days}d{tail}");
    }

    let local = timestamp.with_timezone(&now.timezone());
    if style.suffix && local.date_naive() == now.date_naive() {
        return local.format("%H:%M").to_string();
    }
    local.format("%-m/%-d/%Y").to_string()
}

/// Clock time shown under a message bubble.
pub fn format_clock<Tz>(timestamp: DateTime<Utc>, zone: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    timestamp.with_timezone(zone).format("%H:%M").to_string()
}
