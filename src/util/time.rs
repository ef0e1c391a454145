use std::fmt;

use chrono::{NaiveTime, Timelike};
use serde::{Serialize, Serializer};

const MINUTES_PER_DAY: u32 = 24 * 60;
const SECONDS_PER_DAY: i64 = 24 * 60 * 60;

/// A wall-clock time with minute precision, as written in the log (`HH:mm`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Clock(u16);

impl Clock {
    /// Build from hours and minutes. Returns None when out of range.
    pub fn new(hour: u32, minute: u32) -> Option<Clock> {
        if hour < 24 && minute < 60 {
            Some(Clock((hour * 60 + minute) as u16))
        } else {
            None
        }
    }

    /// Strict `HH:mm` parse: two digits, colon, two digits, 24-hour.
    pub fn parse(s: &str) -> Option<Clock> {
        let b = s.as_bytes();
        if b.len() != 5 || b[2] != b':' {
            return None;
        }
        if ![b[0], b[1], b[3], b[4]].iter().all(u8::is_ascii_digit) {
            return None;
        }
        let hour = u32::from(b[0] - b'0') * 10 + u32::from(b[1] - b'0');
        let minute = u32::from(b[3] - b'0') * 10 + u32::from(b[4] - b'0');
        Clock::new(hour, minute)
    }

    /// Lenient parse used for schedule tokens: `9:05` or `09:05`.
    pub fn parse_loose(s: &str) -> Option<Clock> {
        if s.len() == 4 {
            Clock::parse(&format!("0{}", s))
        } else {
            Clock::parse(s)
        }
    }

    /// Truncate a chrono time to minute precision.
    pub fn from_time(t: NaiveTime) -> Clock {
        Clock((t.hour() * 60 + t.minute()) as u16)
    }

    pub fn now() -> Clock {
        Clock::from_time(chrono::Local::now().time())
    }

    pub fn minutes_since_midnight(self) -> u32 {
        u32::from(self.0)
    }

    pub fn hour(self) -> u32 {
        self.minutes_since_midnight() / 60
    }

    pub fn minute(self) -> u32 {
        self.minutes_since_midnight() % 60
    }

    /// Add minutes, wrapping at midnight.
    pub fn add_minutes(self, minutes: u32) -> Clock {
        Clock(((self.minutes_since_midnight() + minutes % MINUTES_PER_DAY) % MINUTES_PER_DAY) as u16)
    }

    pub fn to_time(self) -> NaiveTime {
        NaiveTime::from_hms_opt(self.hour(), self.minute(), 0).unwrap_or(NaiveTime::MIN)
    }
}

impl fmt::Display for Clock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

impl Serialize for Clock {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Minutes from `start` to `end`. An end earlier than the start is taken to
/// be on the next day.
pub fn diff_minutes(start: Clock, end: Clock) -> u32 {
    let s = start.minutes_since_midnight();
    let e = end.minutes_since_midnight();
    if e >= s { e - s } else { e + MINUTES_PER_DAY - s }
}

/// Seconds elapsed from `start` to `now`, same rollover rule as `diff_minutes`.
pub fn elapsed_seconds(start: Clock, now: NaiveTime) -> i64 {
    let s = i64::from(start.minutes_since_midnight()) * 60;
    let n = i64::from(now.num_seconds_from_midnight());
    if n >= s { n - s } else { n + SECONDS_PER_DAY - s }
}

/// Parse both ends of a range and diff them; None if either side is malformed.
pub fn diff_hhmm(start: &str, end: &str) -> Option<u32> {
    Some(diff_minutes(Clock::parse(start)?, Clock::parse(end)?))
}

/// Wall-clock finish time for `remaining` minutes of work starting at `now`.
pub fn eta(now: Clock, remaining: u32) -> Clock {
    now.add_minutes(remaining)
}

/// `+45m` duration annotation for closed entries.
pub fn format_duration_annotation(minutes: u32) -> String {
    format!("+{}m", minutes)
}

/// `MM:SS` for a live countdown; negative values render as `-MM:SS`.
pub fn format_countdown(seconds: i64) -> String {
    let sign = if seconds < 0 { "-" } else { "" };
    let abs = seconds.unsigned_abs();
    format!("{}{:02}:{:02}", sign, abs / 60, abs % 60)
}

/// `45m` below an hour, `1h05m` above.
pub fn format_total(minutes: u32) -> String {
    if minutes < 60 {
        format!("{}m", minutes)
    } else {
        format!("{}h{:02}m", minutes / 60, minutes % 60)
    }
}
