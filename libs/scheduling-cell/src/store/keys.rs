//! Derived sortable keys for the appointment collection.
//!
//! The collection is addressed with equality + range filters only, so every
//! time-ordered access path sorts on a `START#YYYYMMDD#HHMM` string. External
//! tooling inspects these values directly; the formats here are load-bearing
//! and must not drift.

use chrono::{DateTime, NaiveDate, Utc};

use crate::models::{AppointmentStatus, SchedulingError};

/// `START#YYYYMMDD` (UTC) — the day partition of a start key.
pub fn day_bucket(t: &DateTime<Utc>) -> String {
    format!("START#{}", t.format("%Y%m%d"))
}

/// `START#YYYYMMDD#HHMM` (UTC, 24h, zero-padded).
pub fn start_key(t: &DateTime<Utc>) -> String {
    format!("{}#{}", day_bucket(t), t.format("%H%M"))
}

/// `{tenant}#USER#{user}` — per-patient range path.
pub fn user_key(tenant_id: &str, user_id: &str) -> String {
    format!("{}#USER#{}", tenant_id, user_id)
}

/// `{tenant}#DOCTOR#{doctor}` — per-doctor day/range path.
pub fn doctor_key(tenant_id: &str, doctor_id: &str) -> String {
    format!("{}#DOCTOR#{}", tenant_id, doctor_id)
}

/// `{tenant}#STATUS#{status}` — status-scoped scan path.
pub fn status_key(tenant_id: &str, status: AppointmentStatus) -> String {
    format!("{}#STATUS#{}", tenant_id, status)
}

/// Inclusive start-key bounds for one UTC day (`YYYY-MM-DD`). An appointment
/// whose interval crosses UTC midnight only appears under the bucket of its
/// start minute, so a single-day query will not see it from the other side.
pub fn day_bounds(day: &str) -> Result<(String, String), SchedulingError> {
    let date = NaiveDate::parse_from_str(day, "%Y-%m-%d").map_err(|_| {
        SchedulingError::Validation(format!("invalid day '{}', expected YYYY-MM-DD", day))
    })?;
    let bucket = format!("START#{}", date.format("%Y%m%d"));
    Ok((format!("{}#0000", bucket), format!("{}#2359", bucket)))
}
