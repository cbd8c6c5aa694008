//! Civil timestamps for memory entries.
//!
//! Time is kept as a typed field and only rendered as a `[YYYY-MM-DD HH:MM:SS] `
//! text prefix where text is handed to the chat model.

use chrono::{NaiveDateTime, SubsecRound, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::OnceLock;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

static PREFIX_PATTERN: OnceLock<regex::Regex> = OnceLock::new();

#[expect(
    clippy::expect_used,
    reason = "Static regex pattern validated at compile time"
)]
fn prefix_pattern() -> &'static regex::Regex {
    PREFIX_PATTERN.get_or_init(|| {
        regex::Regex::new(r"^\[(\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2})\] ?")
            .expect("Static regex pattern is guaranteed to be valid")
    })
}

/// Wall-clock time in the configured timezone, second precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(NaiveDateTime);

impl Timestamp {
    #[must_use]
    pub fn from_naive(dt: NaiveDateTime) -> Self {
        Self(dt.trunc_subsecs(0))
    }

    pub fn parse(s: &str) -> Result<Self, chrono::ParseError> {
        NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT).map(Self)
    }

    #[must_use]
    pub const fn as_naive(&self) -> NaiveDateTime {
        self.0
    }

    /// Prefix `text` with this timestamp in brackets.
    #[must_use]
    pub fn stamp(&self, text: &str) -> String {
        format!("[{self}] {text}")
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(TIMESTAMP_FORMAT))
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Remove one leading `[timestamp] ` artifact, if present.
#[must_use]
pub fn strip_timestamp(text: &str) -> &str {
    prefix_pattern()
        .find(text)
        .map_or(text, |m| &text[m.end()..])
}

/// Source of "now" for the assembler.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Clock reading real time in a fixed IANA timezone.
#[derive(Debug, Clone, Copy)]
pub struct CivilClock {
    tz: Tz,
}

impl CivilClock {
    #[must_use]
    pub const fn new(tz: Tz) -> Self {
        Self { tz }
    }

    /// Build from an IANA name such as `Asia/Taipei`.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        name.parse::<Tz>().ok().map(Self::new)
    }

    #[must_use]
    pub const fn timezone(&self) -> Tz {
        self.tz
    }
}

impl Clock for CivilClock {
    fn now(&self) -> Timestamp {
        Timestamp::from_naive(Utc::now().with_timezone(&self.tz).naive_local())
    }
}

/// Clock frozen at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub Timestamp);

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        self.0
    }
}
