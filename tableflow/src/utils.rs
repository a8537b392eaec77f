//! Small shared helpers: identifiers and timestamps.

use chrono::{SecondsFormat, Utc};
use uuid::Uuid;

/// Generates a new UUID v4, used for edge ids.
#[must_use]
pub fn generate_uuid() -> Uuid {
    Uuid::new_v4()
}

/// Current UTC time as an ISO-8601 string with millisecond precision.
#[must_use]
pub fn iso_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
