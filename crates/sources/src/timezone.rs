//! Source time zone
//!
//! Timestamps in the log are local wall-clock times of the server that wrote
//! them. The time zone they are interpreted in is configurable: the host's
//! local zone, UTC, or a fixed offset such as `+03:00`.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset, Local, LocalResult, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Time zone used to interpret log timestamps
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SourceTimeZone {
    #[default]
    Local,
    Utc,
    Fixed(FixedOffset),
}

impl SourceTimeZone {
    /// Convert a wall-clock time in this zone to UTC
    ///
    /// Ambiguous times (clocks set back) resolve to the earlier instant.
    /// Times inside a gap (clocks set forward) are shifted by the gap.
    pub fn to_utc(&self, naive: NaiveDateTime) -> Option<DateTime<Utc>> {
        match self {
            Self::Utc => Some(naive.and_utc()),
            Self::Fixed(offset) => resolve(offset, naive),
            Self::Local => resolve(&Local, naive),
        }
    }
}

fn resolve<Tz: TimeZone>(tz: &Tz, naive: NaiveDateTime) -> Option<DateTime<Utc>> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => Some(dt.with_timezone(&Utc)),
        LocalResult::None => tz
            .from_local_datetime(&(naive + chrono::Duration::hours(1)))
            .earliest()
            .map(|dt| dt.with_timezone(&Utc)),
    }
}

impl FromStr for SourceTimeZone {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.to_ascii_lowercase().as_str() {
            "local" => return Ok(Self::Local),
            "utc" | "z" => return Ok(Self::Utc),
            _ => {}
        }

        let (sign, rest) = match s.as_bytes().first() {
            Some(b'+') => (1, &s[1..]),
            Some(b'-') => (-1, &s[1..]),
            _ => return Err(format!("invalid time zone '{s}', expected local, utc or +HH:MM")),
        };

        let (hours, minutes) = rest.split_once(':').unwrap_or((rest, "0"));
        let hours: i32 = hours
            .parse()
            .map_err(|_| format!("invalid hours in time zone offset '{s}'"))?;
        let minutes: i32 = minutes
            .parse()
            .map_err(|_| format!("invalid minutes in time zone offset '{s}'"))?;
        if hours > 23 || minutes > 59 {
            return Err(format!("time zone offset out of range: '{s}'"));
        }

        FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
            .map(Self::Fixed)
            .ok_or_else(|| format!("time zone offset out of range: '{s}'"))
    }
}

impl TryFrom<String> for SourceTimeZone {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SourceTimeZone> for String {
    fn from(value: SourceTimeZone) -> Self {
        value.to_string()
    }
}

impl fmt::Display for SourceTimeZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => f.write_str("local"),
            Self::Utc => f.write_str("utc"),
            Self::Fixed(offset) => write!(f, "{offset}"),
        }
    }
}
