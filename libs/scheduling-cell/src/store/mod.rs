// libs/scheduling-cell/src/store/mod.rs
//
// One logical collection, four access paths: primary key
// (tenant_id, appointment_id) plus the derived start/user/doctor/status key
// columns. Every operation is a single PostgREST call using equality and
// start_key range filters only; each write is individually atomic, there are
// no multi-row transactions.

pub mod keys;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Method;
use serde_json::json;
use tracing::debug;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{
    Appointment, AppointmentStatus, CalendarSyncStatus, NewAppointment, SchedulingError,
    UpdateScheduleInput,
};

const TABLE_PATH: &str = "/rest/v1/appointments";

pub struct AppointmentStore {
    supabase: Arc<SupabaseClient>,
}

fn return_representation() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert("Prefer", HeaderValue::from_static("return=representation"));
    headers
}

impl AppointmentStore {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: Arc::new(SupabaseClient::new(config)),
        }
    }

    /// Builds the full row (derived keys, timestamps) and inserts it. The
    /// unique `(tenant_id, appointment_id)` constraint turns an id collision
    /// into a store error instead of a silent overwrite.
    pub async fn create(&self, input: NewAppointment) -> Result<Appointment, SchedulingError> {
        debug!(
            "Creating appointment {} for tenant {}",
            input.appointment_id, input.tenant_id
        );

        let now = Utc::now();
        let record = Appointment {
            start_key: keys::start_key(&input.start_iso),
            user_key: keys::user_key(&input.tenant_id, &input.user_id),
            doctor_key: keys::doctor_key(&input.tenant_id, &input.doctor_id),
            status_key: keys::status_key(&input.tenant_id, input.status),
            appointment_id: input.appointment_id,
            tenant_id: input.tenant_id,
            user_id: input.user_id,
            patient_name: input.patient_name,
            patient_phone: input.patient_phone,
            patient_email: input.patient_email,
            doctor_id: input.doctor_id,
            doctor_name: input.doctor_name,
            start_iso: input.start_iso,
            end_iso: input.end_iso,
            duration_minutes: input.duration_minutes,
            status: input.status,
            source: input.source,
            notes: input.notes,
            calendar_event_id: None,
            calendar_sync_status: Some(CalendarSyncStatus::Pending),
            created_at: now,
            updated_at: now,
        };

        let body = serde_json::to_value(&record)
            .map_err(|e| SchedulingError::Store(format!("Failed to serialize record: {}", e)))?;

        let rows: Vec<Appointment> = self
            .supabase
            .request_with_headers(Method::POST, TABLE_PATH, Some(body), Some(return_representation()))
            .await
            .map_err(|e| SchedulingError::Store(e.to_string()))?;

        rows.into_iter()
            .next()
            .ok_or_else(|| SchedulingError::Store("Create returned no rows".to_string()))
    }

    pub async fn get_by_id(
        &self,
        tenant_id: &str,
        appointment_id: &str,
    ) -> Result<Option<Appointment>, SchedulingError> {
        let path = format!(
            "{}?tenant_id=eq.{}&appointment_id=eq.{}",
            TABLE_PATH,
            urlencoding::encode(tenant_id),
            urlencoding::encode(appointment_id),
        );

        let rows: Vec<Appointment> = self
            .supabase
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| SchedulingError::Store(e.to_string()))?;

        Ok(rows.into_iter().next())
    }

    /// Lookup for callers that only know "my appointment at this time":
    /// equality on the user key path plus the start minute and exact instant.
    pub async fn get_by_natural_key(
        &self,
        tenant_id: &str,
        user_id: &str,
        start_iso: &DateTime<Utc>,
    ) -> Result<Option<Appointment>, SchedulingError> {
        let path = format!(
            "{}?user_key=eq.{}&start_key=eq.{}&start_iso=eq.{}",
            TABLE_PATH,
            urlencoding::encode(&keys::user_key(tenant_id, user_id)),
            urlencoding::encode(&keys::start_key(start_iso)),
            urlencoding::encode(&start_iso.to_rfc3339()),
        );

        let rows: Vec<Appointment> = self
            .supabase
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| SchedulingError::Store(e.to_string()))?;

        Ok(rows.into_iter().next())
    }

    /// Bounded scan of one doctor's UTC day, ordered by start key. Serves both
    /// availability rendering and the conflict-candidate set. Intervals that
    /// cross UTC midnight are only visible under their start day.
    pub async fn list_for_doctor_on_day(
        &self,
        tenant_id: &str,
        doctor_id: &str,
        day: &str,
    ) -> Result<Vec<Appointment>, SchedulingError> {
        let (from_key, to_key) = keys::day_bounds(day)?;
        self.list_between("doctor_key", &keys::doctor_key(tenant_id, doctor_id), &from_key, &to_key)
            .await
    }

    pub async fn list_for_doctor_in_range(
        &self,
        tenant_id: &str,
        doctor_id: &str,
        from: &DateTime<Utc>,
        to: &DateTime<Utc>,
    ) -> Result<Vec<Appointment>, SchedulingError> {
        let (from_key, to_key) = range_bounds(from, to)?;
        self.list_between("doctor_key", &keys::doctor_key(tenant_id, doctor_id), &from_key, &to_key)
            .await
    }

    pub async fn list_for_user_in_range(
        &self,
        tenant_id: &str,
        user_id: &str,
        from: &DateTime<Utc>,
        to: &DateTime<Utc>,
    ) -> Result<Vec<Appointment>, SchedulingError> {
        let (from_key, to_key) = range_bounds(from, to)?;
        self.list_between("user_key", &keys::user_key(tenant_id, user_id), &from_key, &to_key)
            .await
    }

    /// Status-scoped day scan; the external calendar-sync worker polls
    /// `pending` rows through this path.
    pub async fn list_by_status(
        &self,
        tenant_id: &str,
        status: AppointmentStatus,
        day: &str,
    ) -> Result<Vec<Appointment>, SchedulingError> {
        let (from_key, to_key) = keys::day_bounds(day)?;
        self.list_between("status_key", &keys::status_key(tenant_id, status), &from_key, &to_key)
            .await
    }

    /// Rewrites the interval, doctor and notes together with the derived keys
    /// they feed, and flags the record for re-sync. Guarded: zero matched
    /// rows means the target does not exist.
    pub async fn update_schedule(
        &self,
        input: UpdateScheduleInput,
    ) -> Result<Appointment, SchedulingError> {
        debug!(
            "Updating schedule of appointment {} for tenant {}",
            input.appointment_id, input.tenant_id
        );

        let body = json!({
            "start_iso": input.start_iso,
            "end_iso": input.end_iso,
            "duration_minutes": input.duration_minutes,
            "doctor_id": input.doctor_id,
            "doctor_name": input.doctor_name,
            "notes": input.notes,
            "start_key": keys::start_key(&input.start_iso),
            "doctor_key": keys::doctor_key(&input.tenant_id, &input.doctor_id),
            "calendar_sync_status": CalendarSyncStatus::Pending,
            "updated_at": Utc::now(),
        });

        let path = format!(
            "{}?tenant_id=eq.{}&appointment_id=eq.{}",
            TABLE_PATH,
            urlencoding::encode(&input.tenant_id),
            urlencoding::encode(&input.appointment_id),
        );

        let rows: Vec<Appointment> = self
            .supabase
            .request_with_headers(Method::PATCH, &path, Some(body), Some(return_representation()))
            .await
            .map_err(|e| SchedulingError::Store(e.to_string()))?;

        rows.into_iter().next().ok_or_else(|| {
            SchedulingError::NotFound(format!("appointment {} not found", input.appointment_id))
        })
    }

    /// Guarded status change; rewrites `status_key` in the same write.
    pub async fn update_status(
        &self,
        tenant_id: &str,
        appointment_id: &str,
        status: AppointmentStatus,
    ) -> Result<Appointment, SchedulingError> {
        debug!(
            "Updating status of appointment {} for tenant {} to {}",
            appointment_id, tenant_id, status
        );

        let body = json!({
            "status": status,
            "status_key": keys::status_key(tenant_id, status),
            "updated_at": Utc::now(),
        });

        let path = format!(
            "{}?tenant_id=eq.{}&appointment_id=eq.{}",
            TABLE_PATH,
            urlencoding::encode(tenant_id),
            urlencoding::encode(appointment_id),
        );

        let rows: Vec<Appointment> = self
            .supabase
            .request_with_headers(Method::PATCH, &path, Some(body), Some(return_representation()))
            .await
            .map_err(|e| SchedulingError::Store(e.to_string()))?;

        rows.into_iter().next().ok_or_else(|| {
            SchedulingError::NotFound(format!("appointment {} not found", appointment_id))
        })
    }

    /// Shared equality + start_key range scan. Tenant isolation rides on the
    /// key value itself: every composite key is prefixed with the tenant.
    async fn list_between(
        &self,
        key_column: &str,
        key_value: &str,
        from_key: &str,
        to_key: &str,
    ) -> Result<Vec<Appointment>, SchedulingError> {
        let path = format!(
            "{}?{}=eq.{}&start_key=gte.{}&start_key=lte.{}&order=start_key.asc",
            TABLE_PATH,
            key_column,
            urlencoding::encode(key_value),
            urlencoding::encode(from_key),
            urlencoding::encode(to_key),
        );

        let rows: Vec<Appointment> = self
            .supabase
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| SchedulingError::Store(e.to_string()))?;

        Ok(rows)
    }
}

/// Start-key bounds for an explicit window; rejects inverted ranges before
/// any store call.
fn range_bounds(
    from: &DateTime<Utc>,
    to: &DateTime<Utc>,
) -> Result<(String, String), SchedulingError> {
    let from_key = keys::start_key(from);
    let to_key = keys::start_key(to);
    if from_key > to_key {
        return Err(SchedulingError::Validation(format!(
            "invalid range: {} is after {}",
            from_key, to_key
        )));
    }
    Ok((from_key, to_key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn range_bounds_orders_keys() {
        let from = Utc.with_ymd_and_hms(2025, 11, 10, 9, 0, 0).unwrap();
        let to = Utc.with_ymd_and_hms(2025, 11, 12, 17, 30, 0).unwrap();
        let (from_key, to_key) = range_bounds(&from, &to).unwrap();
        assert_eq!(from_key, "START#20251110#0900");
        assert_eq!(to_key, "START#20251112#1730");
    }

    #[test]
    fn range_bounds_rejects_inverted_window() {
        let from = Utc.with_ymd_and_hms(2025, 11, 12, 9, 0, 0).unwrap();
        let to = Utc.with_ymd_and_hms(2025, 11, 10, 9, 0, 0).unwrap();
        assert!(matches!(
            range_bounds(&from, &to),
            Err(SchedulingError::Validation(_))
        ));
    }
}
