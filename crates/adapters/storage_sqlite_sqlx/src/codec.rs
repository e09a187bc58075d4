//! Column encoding shared by the repositories.
//!
//! Identifiers are stored as text, timestamps as ISO-8601 text with
//! millisecond precision so that they sort lexicographically.

use std::str::FromStr;

use taskhook_domain::time::{Timestamp, to_iso8601};

pub(crate) fn decode_err<E>(err: E) -> sqlx::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    sqlx::Error::Decode(Box::new(err))
}

pub(crate) fn parse<T>(raw: &str) -> Result<T, sqlx::Error>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.parse().map_err(decode_err)
}

pub(crate) fn timestamp(ts: Timestamp) -> String {
    to_iso8601(ts)
}

pub(crate) fn parse_timestamp(raw: &str) -> Result<Timestamp, sqlx::Error> {
    chrono::DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.to_utc())
        .map_err(decode_err)
}

pub(crate) fn parse_optional_timestamp(
    raw: Option<String>,
) -> Result<Option<Timestamp>, sqlx::Error> {
    raw.as_deref().map(parse_timestamp).transpose()
}

/// Convert a stored counter, rejecting negative values.
pub(crate) fn counter<T: TryFrom<i64>>(raw: i64) -> Result<T, sqlx::Error>
where
    T::Error: std::error::Error + Send + Sync + 'static,
{
    T::try_from(raw).map_err(decode_err)
}
