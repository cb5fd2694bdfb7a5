use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::models::{Appointment, SchedulingError};
use crate::store::AppointmentStore;

/// Overlap detection against a doctor's existing bookings.
///
/// The candidate set is the UTC day of the requested start, so an interval
/// that crosses midnight is not checked against the adjacent day. This
/// mirrors the day-bucketed storage layout and is a known limitation, not an
/// oversight.
pub struct ConflictDetectionService {
    store: Arc<AppointmentStore>,
}

impl ConflictDetectionService {
    pub fn new(store: Arc<AppointmentStore>) -> Self {
        Self { store }
    }

    /// Rejects with a conflict when any non-cancelled appointment of the
    /// doctor overlaps `[start, end)`, ignoring `exclude_id` so a booking
    /// being moved never conflicts with itself.
    pub async fn ensure_availability(
        &self,
        tenant_id: &str,
        doctor_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        exclude_id: Option<&str>,
    ) -> Result<(), SchedulingError> {
        debug!(
            "Checking conflicts for doctor {} from {} to {}",
            doctor_id, start, end
        );

        let day = start.format("%Y-%m-%d").to_string();
        let candidates = self
            .store
            .list_for_doctor_on_day(tenant_id, doctor_id, &day)
            .await?;

        if let Some(existing) = find_conflict(&candidates, start, end, exclude_id) {
            warn!(
                "Conflict detected for doctor {}: appointment {} occupies {} to {}",
                doctor_id, existing.appointment_id, existing.start_iso, existing.end_iso
            );
            return Err(SchedulingError::Conflict(format!(
                "doctor {} is already booked from {} to {}",
                doctor_id,
                existing.start_iso.to_rfc3339(),
                existing.end_iso.to_rfc3339()
            )));
        }

        Ok(())
    }
}

/// First non-cancelled candidate whose interval overlaps `[start, end)`:
/// `max(existing.start, start) < min(existing.end, end)`.
pub fn find_conflict<'a>(
    candidates: &'a [Appointment],
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    exclude_id: Option<&str>,
) -> Option<&'a Appointment> {
    candidates.iter().find(|apt| {
        !apt.is_cancelled()
            && exclude_id != Some(apt.appointment_id.as_str())
            && apt.start_iso.max(start) < apt.end_iso.min(end)
    })
}
