// libs/scheduling-cell/src/services/scheduling.rs
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use shared_config::AppConfig;

use crate::models::{
    Appointment, AppointmentRef, AppointmentStatus, BusySlot, CancelAppointmentRequest,
    CreateAppointmentRequest, NewAppointment, RescheduleAppointmentRequest, SchedulingError,
    UpdateScheduleInput,
};
use crate::services::conflict::ConflictDetectionService;
use crate::services::ids::generate_appointment_id;
use crate::services::timing::{normalize_timing, parse_instant};
use crate::store::AppointmentStore;

/// Booking rules on top of the appointment store.
///
/// Conflict checking is check-then-act: the availability read and the write
/// are two separate store calls with no lock scoping the doctor's schedule,
/// so two concurrent bookings for the same doctor and overlapping time can
/// both pass the check before either writes. Each store call is individually
/// atomic. The window is deliberate; callers that need stronger guarantees
/// must serialize their own submissions.
pub struct SchedulingService {
    store: Arc<AppointmentStore>,
    conflict_service: ConflictDetectionService,
}

impl SchedulingService {
    pub fn new(config: &AppConfig) -> Self {
        let store = Arc::new(AppointmentStore::new(config));
        let conflict_service = ConflictDetectionService::new(Arc::clone(&store));
        Self {
            store,
            conflict_service,
        }
    }

    /// Books a new appointment. Not idempotent: identical requests produce
    /// distinct records with freshly generated ids.
    pub async fn create_appointment(
        &self,
        request: CreateAppointmentRequest,
    ) -> Result<Appointment, SchedulingError> {
        info!(
            "Booking appointment for user {} with doctor {} in tenant {}",
            request.user_id, request.doctor_id, request.tenant_id
        );

        require_field(&request.tenant_id, "tenantId")?;
        require_field(&request.user_id, "userId")?;
        require_field(&request.patient_name, "patientName")?;
        require_field(&request.doctor_id, "doctorId")?;

        let timing = normalize_timing(
            &request.start_iso,
            request.end_iso.as_deref(),
            request.duration_minutes,
        )?;

        self.conflict_service
            .ensure_availability(
                &request.tenant_id,
                &request.doctor_id,
                timing.start,
                timing.end,
                None,
            )
            .await?;

        let appointment = self
            .store
            .create(NewAppointment {
                appointment_id: generate_appointment_id(),
                tenant_id: request.tenant_id,
                user_id: request.user_id,
                patient_name: request.patient_name,
                patient_phone: request.patient_phone,
                patient_email: request.patient_email,
                doctor_id: request.doctor_id,
                doctor_name: request.doctor_name,
                start_iso: timing.start,
                end_iso: timing.end,
                duration_minutes: Some(timing.duration_minutes),
                status: AppointmentStatus::Scheduled,
                source: request.source,
                notes: request.notes,
            })
            .await?;

        info!(
            "Appointment {} booked for doctor {} at {}",
            appointment.appointment_id,
            appointment.doctor_id,
            appointment.start_iso.to_rfc3339()
        );
        Ok(appointment)
    }

    /// Moves an existing booking to a new interval and/or doctor. The target
    /// keeps its id and its status: the `rescheduled` status value is never
    /// assigned.
    pub async fn reschedule_appointment(
        &self,
        request: RescheduleAppointmentRequest,
    ) -> Result<Appointment, SchedulingError> {
        require_field(&request.tenant_id, "tenantId")?;

        let target = AppointmentRef::from_parts(
            request.appointment_id.clone(),
            request.user_id.clone(),
            request.doctor_id.clone(),
            request.start_iso.clone(),
        )?;
        let existing = self.resolve_target(&request.tenant_id, &target).await?;

        debug!(
            "Rescheduling appointment {} in tenant {}",
            existing.appointment_id, request.tenant_id
        );

        let new_doctor_id = request
            .new_doctor_id
            .clone()
            .unwrap_or_else(|| existing.doctor_id.clone());
        // The cached doctor name only survives when the doctor does.
        let new_doctor_name = if new_doctor_id == existing.doctor_id {
            existing.doctor_name.clone()
        } else {
            None
        };

        let start_input = request
            .new_start_iso
            .clone()
            .unwrap_or_else(|| existing.start_iso.to_rfc3339());
        let fallback_duration = request.new_duration_minutes.or(existing.duration_minutes);
        let timing = normalize_timing(
            &start_input,
            request.new_end_iso.as_deref(),
            fallback_duration,
        )?;

        self.conflict_service
            .ensure_availability(
                &request.tenant_id,
                &new_doctor_id,
                timing.start,
                timing.end,
                Some(&existing.appointment_id),
            )
            .await?;

        let updated = self
            .store
            .update_schedule(UpdateScheduleInput {
                tenant_id: request.tenant_id,
                appointment_id: existing.appointment_id.clone(),
                start_iso: timing.start,
                end_iso: timing.end,
                duration_minutes: timing.duration_minutes,
                doctor_id: new_doctor_id,
                doctor_name: new_doctor_name,
                notes: request.notes.or(existing.notes),
            })
            .await?;

        info!(
            "Appointment {} rescheduled to {}",
            updated.appointment_id,
            updated.start_iso.to_rfc3339()
        );
        Ok(updated)
    }

    /// Cancels a booking. Idempotent: cancelling an already-cancelled
    /// appointment returns the record unchanged, so retries are always safe.
    pub async fn cancel_appointment(
        &self,
        request: CancelAppointmentRequest,
    ) -> Result<Appointment, SchedulingError> {
        require_field(&request.tenant_id, "tenantId")?;

        let target = AppointmentRef::from_parts(
            request.appointment_id.clone(),
            request.user_id.clone(),
            request.doctor_id.clone(),
            request.start_iso.clone(),
        )?;
        let existing = self.resolve_target(&request.tenant_id, &target).await?;

        if existing.is_cancelled() {
            info!(
                "Appointment {} already cancelled, returning unchanged",
                existing.appointment_id
            );
            return Ok(existing);
        }

        let cancelled = self
            .store
            .update_status(
                &request.tenant_id,
                &existing.appointment_id,
                AppointmentStatus::Cancelled,
            )
            .await?;

        info!("Appointment {} cancelled", cancelled.appointment_id);
        Ok(cancelled)
    }

    /// Busy intervals of one doctor's UTC day. Free-slot math belongs to the
    /// caller.
    pub async fn get_availability(
        &self,
        tenant_id: &str,
        doctor_id: &str,
        day: &str,
    ) -> Result<Vec<BusySlot>, SchedulingError> {
        let appointments = self
            .store
            .list_for_doctor_on_day(tenant_id, doctor_id, day)
            .await?;

        Ok(appointments
            .into_iter()
            .filter(|apt| !apt.is_cancelled())
            .map(BusySlot::from)
            .collect())
    }

    /// Window listing per doctor, the form the conversational agent queries
    /// with `from`/`to`.
    pub async fn list_doctor_appointments(
        &self,
        tenant_id: &str,
        doctor_id: &str,
        from_iso: &str,
        to_iso: &str,
    ) -> Result<Vec<Appointment>, SchedulingError> {
        let (from, to) = parse_window(from_iso, to_iso)?;
        self.store
            .list_for_doctor_in_range(tenant_id, doctor_id, &from, &to)
            .await
    }

    /// Window listing per patient ("what do I have booked?").
    pub async fn list_user_appointments(
        &self,
        tenant_id: &str,
        user_id: &str,
        from_iso: &str,
        to_iso: &str,
    ) -> Result<Vec<Appointment>, SchedulingError> {
        let (from, to) = parse_window(from_iso, to_iso)?;
        self.store
            .list_for_user_in_range(tenant_id, user_id, &from, &to)
            .await
    }

    async fn resolve_target(
        &self,
        tenant_id: &str,
        target: &AppointmentRef,
    ) -> Result<Appointment, SchedulingError> {
        match target {
            AppointmentRef::ById(appointment_id) => self
                .store
                .get_by_id(tenant_id, appointment_id)
                .await?
                .ok_or_else(|| {
                    SchedulingError::NotFound(format!("appointment {} not found", appointment_id))
                }),
            AppointmentRef::ByNaturalKey {
                user_id,
                doctor_id,
                start_iso,
            } => {
                let start = parse_instant(start_iso)?;
                let found = self
                    .store
                    .get_by_natural_key(tenant_id, user_id, &start)
                    .await?;
                // A hit with a different doctor means the triple did not
                // identify a record.
                match found {
                    Some(apt) if apt.doctor_id == *doctor_id => Ok(apt),
                    _ => Err(SchedulingError::NotFound(format!(
                        "no appointment for user {} with doctor {} at {}",
                        user_id, doctor_id, start_iso
                    ))),
                }
            }
        }
    }
}

fn parse_window(
    from_iso: &str,
    to_iso: &str,
) -> Result<(DateTime<Utc>, DateTime<Utc>), SchedulingError> {
    Ok((parse_instant(from_iso)?, parse_instant(to_iso)?))
}

fn require_field(value: &str, name: &str) -> Result<(), SchedulingError> {
    if value.trim().is_empty() {
        return Err(SchedulingError::Validation(format!("{} is required", name)));
    }
    Ok(())
}
