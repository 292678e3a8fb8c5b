//! Row decoding helpers

use chrono::{DateTime, Utc};

/// Read a `created_at`/`updated_at` column
///
/// The users table keeps timestamps as RFC3339 text. An unparsable value
/// reads as the current time so the account row still loads.
pub fn parse_datetime_or_now(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}
