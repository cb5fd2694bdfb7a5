pub mod handlers;
pub mod models;
pub mod router;
pub mod services;
pub mod store;

pub use models::{
    Appointment, AppointmentRef, AppointmentStatus, AppointmentView, BusySlot,
    CalendarSyncStatus, CancelAppointmentRequest, CreateAppointmentRequest,
    RescheduleAppointmentRequest, SchedulingError,
};
