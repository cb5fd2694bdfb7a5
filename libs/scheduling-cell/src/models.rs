// libs/scheduling-cell/src/models.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

/// One row of the `appointments` collection. The four `*_key` columns are
/// derived from the source fields and rewritten in the same write whenever
/// start, doctor or status change; they are never settable on their own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub appointment_id: String,
    pub tenant_id: String,
    pub user_id: String,
    pub patient_name: String,
    pub patient_phone: Option<String>,
    pub patient_email: Option<String>,
    pub doctor_id: String,
    pub doctor_name: Option<String>,
    pub start_iso: DateTime<Utc>,
    pub end_iso: DateTime<Utc>,
    pub duration_minutes: Option<i32>,
    pub status: AppointmentStatus,
    pub source: Option<String>,
    pub notes: Option<String>,
    pub calendar_event_id: Option<String>,
    pub calendar_sync_status: Option<CalendarSyncStatus>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub start_key: String,
    pub user_key: String,
    pub doctor_key: String,
    pub status_key: String,
}

impl Appointment {
    pub fn is_cancelled(&self) -> bool {
        self.status == AppointmentStatus::Cancelled
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Scheduled,
    Cancelled,
    // Reserved on the wire; no code path assigns it. Rescheduling mutates the
    // interval in place and leaves status untouched.
    Rescheduled,
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Scheduled => write!(f, "scheduled"),
            AppointmentStatus::Cancelled => write!(f, "cancelled"),
            AppointmentStatus::Rescheduled => write!(f, "rescheduled"),
        }
    }
}

/// Mirror state for the external calendar worker. This engine only ever
/// writes `Pending`; the worker owns the other transitions.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CalendarSyncStatus {
    Pending,
    Synced,
    Failed,
}

impl fmt::Display for CalendarSyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CalendarSyncStatus::Pending => write!(f, "pending"),
            CalendarSyncStatus::Synced => write!(f, "synced"),
            CalendarSyncStatus::Failed => write!(f, "failed"),
        }
    }
}

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAppointmentRequest {
    pub tenant_id: String,
    pub user_id: String,
    pub patient_name: String,
    pub patient_phone: Option<String>,
    pub patient_email: Option<String>,
    pub doctor_id: String,
    pub doctor_name: Option<String>,
    pub start_iso: String,
    pub end_iso: Option<String>,
    pub duration_minutes: Option<i32>,
    pub source: Option<String>,
    pub notes: Option<String>,
}

/// Reschedule addresses the target either by id or by the natural
/// `(userId, doctorId, startIso)` triple; the `new*` fields describe the
/// replacement interval and (optionally) a different doctor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RescheduleAppointmentRequest {
    pub tenant_id: String,
    pub appointment_id: Option<String>,
    pub user_id: Option<String>,
    pub doctor_id: Option<String>,
    pub start_iso: Option<String>,
    pub new_start_iso: Option<String>,
    pub new_end_iso: Option<String>,
    pub new_duration_minutes: Option<i32>,
    pub new_doctor_id: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelAppointmentRequest {
    pub tenant_id: String,
    pub appointment_id: Option<String>,
    pub user_id: Option<String>,
    pub doctor_id: Option<String>,
    pub start_iso: Option<String>,
}

/// How a caller addresses an existing appointment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppointmentRef {
    ById(String),
    ByNaturalKey {
        user_id: String,
        doctor_id: String,
        start_iso: String,
    },
}

impl AppointmentRef {
    /// Builds the lookup variant from optional wire fields. An explicit id
    /// wins; otherwise all three natural-key parts must be present.
    pub fn from_parts(
        appointment_id: Option<String>,
        user_id: Option<String>,
        doctor_id: Option<String>,
        start_iso: Option<String>,
    ) -> Result<Self, SchedulingError> {
        if let Some(id) = appointment_id.filter(|id| !id.trim().is_empty()) {
            return Ok(AppointmentRef::ById(id));
        }

        match (user_id, doctor_id, start_iso) {
            (Some(user_id), Some(doctor_id), Some(start_iso))
                if !user_id.trim().is_empty()
                    && !doctor_id.trim().is_empty()
                    && !start_iso.trim().is_empty() =>
            {
                Ok(AppointmentRef::ByNaturalKey {
                    user_id,
                    doctor_id,
                    start_iso,
                })
            }
            _ => Err(SchedulingError::Validation(
                "appointmentId or the full userId/doctorId/startIso triple is required".to_string(),
            )),
        }
    }
}

/// Busy interval returned by the availability endpoint. Occupancy only; free
/// slots are computed by the caller from clinic hours.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusySlot {
    pub start_iso: DateTime<Utc>,
    pub end_iso: DateTime<Utc>,
    pub appointment_id: String,
}

impl From<Appointment> for BusySlot {
    fn from(appointment: Appointment) -> Self {
        Self {
            start_iso: appointment.start_iso,
            end_iso: appointment.end_iso,
            appointment_id: appointment.appointment_id,
        }
    }
}

/// Public projection of an appointment: everything except the store-internal
/// key columns, camelCase on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentView {
    pub appointment_id: String,
    pub tenant_id: String,
    pub user_id: String,
    pub patient_name: String,
    pub patient_phone: Option<String>,
    pub patient_email: Option<String>,
    pub doctor_id: String,
    pub doctor_name: Option<String>,
    pub start_iso: DateTime<Utc>,
    pub end_iso: DateTime<Utc>,
    pub duration_minutes: Option<i32>,
    pub status: AppointmentStatus,
    pub source: Option<String>,
    pub notes: Option<String>,
    pub calendar_event_id: Option<String>,
    pub calendar_sync_status: Option<CalendarSyncStatus>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Appointment> for AppointmentView {
    fn from(a: Appointment) -> Self {
        Self {
            appointment_id: a.appointment_id,
            tenant_id: a.tenant_id,
            user_id: a.user_id,
            patient_name: a.patient_name,
            patient_phone: a.patient_phone,
            patient_email: a.patient_email,
            doctor_id: a.doctor_id,
            doctor_name: a.doctor_name,
            start_iso: a.start_iso,
            end_iso: a.end_iso,
            duration_minutes: a.duration_minutes,
            status: a.status,
            source: a.source,
            notes: a.notes,
            calendar_event_id: a.calendar_event_id,
            calendar_sync_status: a.calendar_sync_status,
            created_at: a.created_at,
            updated_at: a.updated_at,
        }
    }
}

// ==============================================================================
// STORE INPUT MODELS
// ==============================================================================

/// Source fields for a new record. The store derives the key columns and
/// timestamps when it builds the full row.
#[derive(Debug, Clone)]
pub struct NewAppointment {
    pub appointment_id: String,
    pub tenant_id: String,
    pub user_id: String,
    pub patient_name: String,
    pub patient_phone: Option<String>,
    pub patient_email: Option<String>,
    pub doctor_id: String,
    pub doctor_name: Option<String>,
    pub start_iso: DateTime<Utc>,
    pub end_iso: DateTime<Utc>,
    pub duration_minutes: Option<i32>,
    pub status: AppointmentStatus,
    pub source: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct UpdateScheduleInput {
    pub tenant_id: String,
    pub appointment_id: String,
    pub start_iso: DateTime<Utc>,
    pub end_iso: DateTime<Utc>,
    pub duration_minutes: i32,
    pub doctor_id: String,
    pub doctor_name: Option<String>,
    pub notes: Option<String>,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, thiserror::Error)]
pub enum SchedulingError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Scheduling conflict: {0}")]
    Conflict(String),

    #[error("Store error: {0}")]
    Store(String),
}
