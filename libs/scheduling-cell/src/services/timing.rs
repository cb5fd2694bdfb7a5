use chrono::{DateTime, Duration, Utc};

use crate::models::SchedulingError;

pub const DEFAULT_DURATION_MINUTES: i32 = 30;

/// Canonical interval for one booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalizedTiming {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub duration_minutes: i32,
}

pub fn parse_instant(value: &str) -> Result<DateTime<Utc>, SchedulingError> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|_| SchedulingError::Validation(format!("invalid timestamp '{}'", value)))
}

/// Turns fuzzy start/end/duration input into a canonical `[start, end)`
/// interval.
///
/// - no end: `end = start + duration`, defaulting to 30 minutes;
/// - end without duration: duration is `(end - start)` rounded to whole
///   minutes, never below 1;
/// - both supplied: `end` is the source of truth for the booked interval and
///   the given duration is kept as a display value only — it does not
///   recompute `end`. The asymmetry is intentional and relied upon by
///   callers.
pub fn normalize_timing(
    start_iso: &str,
    end_iso: Option<&str>,
    duration_minutes: Option<i32>,
) -> Result<NormalizedTiming, SchedulingError> {
    let start = parse_instant(start_iso)?;

    if let Some(d) = duration_minutes {
        if d <= 0 {
            return Err(SchedulingError::Validation(
                "durationMinutes must be positive".to_string(),
            ));
        }
    }

    match end_iso {
        None => {
            let duration = duration_minutes.unwrap_or(DEFAULT_DURATION_MINUTES);
            Ok(NormalizedTiming {
                start,
                end: start + Duration::minutes(duration as i64),
                duration_minutes: duration,
            })
        }
        Some(end_iso) => {
            let end = parse_instant(end_iso)?;
            if end <= start {
                return Err(SchedulingError::Validation(
                    "endIso must be after startIso".to_string(),
                ));
            }
            let duration = match duration_minutes {
                Some(display) => display,
                None => {
                    let seconds = (end - start).num_seconds();
                    (((seconds + 30) / 60).max(1)) as i32
                }
            };
            Ok(NormalizedTiming {
                start,
                end,
                duration_minutes: duration,
            })
        }
    }
}
