use chrono::{DateTime, NaiveDateTime, Utc};
use std::fmt;

/// Wire format shared by VRChat and the website
pub const WIRE_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// An event boundary as received from VRChat.
///
/// Anything that does not parse is carried along verbatim so one odd event
/// never breaks a fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Timestamp {
    At(DateTime<Utc>),
    Raw(String),
}

impl Timestamp {
    /// Parse an ISO-8601 string, accepting `Z` or numeric offsets
    pub fn parse(value: &str) -> Self {
        let trimmed = value.trim();

        if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
            return Timestamp::At(dt.with_timezone(&Utc));
        }

        // Offset-less values are taken as UTC
        for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"] {
            if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
                return Timestamp::At(naive.and_utc());
            }
        }

        Timestamp::Raw(value.to_string())
    }

    /// Whether an event ending at this time is still current at `now`.
    ///
    /// Unparseable end times cannot be proven past, so they count as current.
    pub fn is_not_before(&self, now: DateTime<Utc>) -> bool {
        match self {
            Timestamp::At(dt) => *dt >= now,
            Timestamp::Raw(_) => true,
        }
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Timestamp::At(dt) => write!(f, "{}", dt.format(WIRE_FORMAT)),
            Timestamp::Raw(raw) => f.write_str(raw),
        }
    }
}

/// Normalize a timestamp string to `YYYY-MM-DDTHH:MM:SSZ`, or return it unchanged
pub fn normalize_timestamp(value: &str) -> String {
    Timestamp::parse(value).to_string()
}
