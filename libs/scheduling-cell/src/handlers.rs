// libs/scheduling-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_models::error::AppError;

use crate::models::{
    AppointmentView, CancelAppointmentRequest, CreateAppointmentRequest,
    RescheduleAppointmentRequest, SchedulingError,
};
use crate::services::scheduling::SchedulingService;

// ==============================================================================
// QUERY PARAMETER STRUCTS
// ==============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityQueryParams {
    pub tenant_id: String,
    pub doctor_id: Option<String>,
    pub user_id: Option<String>,
    pub date: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
}

fn to_app_error(err: SchedulingError) -> AppError {
    match err {
        SchedulingError::Validation(msg) => AppError::ValidationError(msg),
        SchedulingError::NotFound(msg) => AppError::NotFound(msg),
        // Conflicts are an actionable "pick another time" signal for the
        // caller, surfaced as a 400.
        SchedulingError::Conflict(msg) => AppError::BadRequest(msg),
        SchedulingError::Store(msg) => AppError::Database(msg),
    }
}

// ==============================================================================
// APPOINTMENT HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn create_appointment(
    State(state): State<Arc<AppConfig>>,
    Json(request): Json<CreateAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let service = SchedulingService::new(&state);

    let appointment = service
        .create_appointment(request)
        .await
        .map_err(to_app_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": AppointmentView::from(appointment),
        "message": "Appointment booked successfully"
    })))
}

#[axum::debug_handler]
pub async fn reschedule_appointment(
    State(state): State<Arc<AppConfig>>,
    Json(request): Json<RescheduleAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    reschedule_inner(&state, request).await
}

/// `PATCH /{appointment_id}` — the path segment wins over any id in the body.
#[axum::debug_handler]
pub async fn reschedule_appointment_by_id(
    State(state): State<Arc<AppConfig>>,
    Path(appointment_id): Path<String>,
    Json(mut request): Json<RescheduleAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    request.appointment_id = Some(appointment_id);
    reschedule_inner(&state, request).await
}

async fn reschedule_inner(
    state: &AppConfig,
    request: RescheduleAppointmentRequest,
) -> Result<Json<Value>, AppError> {
    let service = SchedulingService::new(state);

    let appointment = service
        .reschedule_appointment(request)
        .await
        .map_err(to_app_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": AppointmentView::from(appointment),
        "message": "Appointment rescheduled successfully"
    })))
}

#[axum::debug_handler]
pub async fn cancel_appointment(
    State(state): State<Arc<AppConfig>>,
    Json(request): Json<CancelAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    cancel_inner(&state, request).await
}

#[axum::debug_handler]
pub async fn cancel_appointment_by_id(
    State(state): State<Arc<AppConfig>>,
    Path(appointment_id): Path<String>,
    Json(mut request): Json<CancelAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    request.appointment_id = Some(appointment_id);
    cancel_inner(&state, request).await
}

async fn cancel_inner(
    state: &AppConfig,
    request: CancelAppointmentRequest,
) -> Result<Json<Value>, AppError> {
    let service = SchedulingService::new(state);

    let appointment = service
        .cancel_appointment(request)
        .await
        .map_err(to_app_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": AppointmentView::from(appointment),
        "message": "Appointment cancelled"
    })))
}

/// `GET /availability` answers three query forms: `doctorId`+`date` for one
/// day of busy intervals, and `doctorId`/`userId` with `from`+`to` for
/// window listings.
#[axum::debug_handler]
pub async fn get_availability(
    State(state): State<Arc<AppConfig>>,
    Query(params): Query<AvailabilityQueryParams>,
) -> Result<Json<Value>, AppError> {
    let service = SchedulingService::new(&state);

    match (&params.doctor_id, &params.user_id, &params.date) {
        (Some(doctor_id), _, Some(date)) => {
            let busy = service
                .get_availability(&params.tenant_id, doctor_id, date)
                .await
                .map_err(to_app_error)?;
            Ok(Json(json!({
                "tenantId": params.tenant_id,
                "doctorId": doctor_id,
                "date": date,
                "busy": busy
            })))
        }
        (Some(doctor_id), _, None) => {
            let (from, to) = require_window(&params)?;
            let appointments = service
                .list_doctor_appointments(&params.tenant_id, doctor_id, from, to)
                .await
                .map_err(to_app_error)?;
            Ok(Json(json!({
                "tenantId": params.tenant_id,
                "doctorId": doctor_id,
                "appointments": appointments
                    .into_iter()
                    .map(AppointmentView::from)
                    .collect::<Vec<_>>()
            })))
        }
        (None, Some(user_id), None) => {
            let (from, to) = require_window(&params)?;
            let appointments = service
                .list_user_appointments(&params.tenant_id, user_id, from, to)
                .await
                .map_err(to_app_error)?;
            Ok(Json(json!({
                "tenantId": params.tenant_id,
                "userId": user_id,
                "appointments": appointments
                    .into_iter()
                    .map(AppointmentView::from)
                    .collect::<Vec<_>>()
            })))
        }
        _ => Err(AppError::BadRequest(
            "availability requires doctorId with date, or doctorId/userId with from and to"
                .to_string(),
        )),
    }
}

fn require_window(params: &AvailabilityQueryParams) -> Result<(&str, &str), AppError> {
    match (&params.from, &params.to) {
        (Some(from), Some(to)) => Ok((from.as_str(), to.as_str())),
        _ => Err(AppError::BadRequest(
            "from and to are required for range queries".to_string(),
        )),
    }
}
