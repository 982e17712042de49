//! Lenient deserializers for records served by the account API.
//!
//! The API is backed by SQLite, so booleans may arrive as `0`/`1` and
//! timestamps as `YYYY-MM-DD HH:MM:SS` without the ISO `T` separator.

use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Deserializer};

const SQLITE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Deserialize)]
#[serde(untagged)]
enum BoolLike {
    Bool(bool),
    Int(i64),
    Str(String),
}

impl BoolLike {
    fn into_bool(self) -> bool {
        match self {
            BoolLike::Bool(b) => b,
            BoolLike::Int(i) => i != 0,
            BoolLike::Str(s) => matches!(s.as_str(), "1" | "true" | "TRUE"),
        }
    }
}

/// Accepts `true`/`false`, `0`/`1`, or their string forms. `null` maps to false.
pub fn flexible_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<BoolLike>::deserialize(deserializer)?;
    Ok(value.map(BoolLike::into_bool).unwrap_or(false))
}

/// Like [`flexible_bool`] but keeps `null` and absent values as `None`.
pub fn flexible_bool_opt<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<BoolLike>::deserialize(deserializer)?;
    Ok(value.map(BoolLike::into_bool))
}

/// Parses an ISO-8601 or SQLite-style timestamp.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    NaiveDateTime::parse_from_str(raw, SQLITE_TIMESTAMP_FORMAT)
        .ok()
        .or_else(|| raw.parse::<NaiveDateTime>().ok())
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.naive_utc()))
}

/// Optional timestamp; unparseable values are treated as absent.
pub fn flexible_datetime_opt<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.as_deref().and_then(parse_timestamp))
}

/// Required timestamp; missing or unparseable values fall back to the epoch.
pub fn flexible_datetime<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(flexible_datetime_opt(deserializer)?.unwrap_or_default())
}
