// libs/appointment-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use axum_extra::TypedHeader;
use chrono::NaiveDate;
use headers::{authorization::Bearer, Authorization};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::Mutex;

use shared_config::AppConfig;
use shared_models::error::AppError;

use crate::models::{AppointmentDraft, AppointmentError, PickerView, SchedulingConfig, SlotTime};
use crate::services::{AppointmentBookingService, AppointmentService, HttpAppointmentService, SlotPicker};

/// Everything the appointment routes need, built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub scheduling: SchedulingConfig,
    pub appointments: Arc<dyn AppointmentService>,
}

impl AppState {
    pub fn from_config(config: AppConfig) -> Result<Self, AppointmentError> {
        let scheduling = SchedulingConfig::from_app_config(&config)?;
        let appointments: Arc<dyn AppointmentService> = Arc::new(HttpAppointmentService::new(&config));
        Ok(Self {
            config: Arc::new(config),
            scheduling,
            appointments,
        })
    }

    pub fn with_service(
        config: AppConfig,
        scheduling: SchedulingConfig,
        appointments: Arc<dyn AppointmentService>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            scheduling,
            appointments,
        }
    }

    fn booking_service(&self) -> AppointmentBookingService<dyn AppointmentService> {
        AppointmentBookingService::new(self.appointments.clone(), self.scheduling)
    }
}

// ==============================================================================
// QUERY PARAMETER STRUCTS
// ==============================================================================

#[derive(Debug, Deserialize)]
pub struct SlotQuery {
    pub provider_id: String,
    pub date: NaiveDate,
    pub exclude_appointment_id: Option<String>,
    pub selected: Option<String>,
}

// ==============================================================================
// HANDLERS
// ==============================================================================

/// Slot picker view for a provider and date. A failed occupancy lookup still
/// returns 200 with every slot available and `error` populated.
pub async fn get_slots(
    State(state): State<AppState>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Query(query): Query<SlotQuery>,
) -> Result<Json<PickerView>, AppError> {
    let mut picker = SlotPicker::new(&state.scheduling).map_err(to_app_error)?;
    if let Some(exclude_id) = query.exclude_appointment_id {
        picker = picker.for_reschedule(exclude_id);
    }
    let picker = Mutex::new(picker);

    let view = SlotPicker::refresh(
        &picker,
        state.appointments.as_ref(),
        Some(query.provider_id),
        Some(query.date),
        auth.token(),
    )
    .await;

    match query.selected {
        Some(raw) => {
            let time: SlotTime = raw.parse().map_err(to_app_error)?;
            let mut picker = picker.lock().await;
            picker.select(time).map_err(to_app_error)?;
            Ok(Json(picker.view()))
        }
        None => Ok(Json(view)),
    }
}

pub async fn book_appointment(
    State(state): State<AppState>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(draft): Json<AppointmentDraft>,
) -> Result<Json<Value>, AppError> {
    let appointment = state
        .booking_service()
        .book(draft, auth.token())
        .await
        .map_err(to_app_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "message": "Appointment booked successfully"
    })))
}

pub async fn reschedule_appointment(
    State(state): State<AppState>,
    Path(appointment_id): Path<String>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(draft): Json<AppointmentDraft>,
) -> Result<Json<Value>, AppError> {
    let appointment = state
        .booking_service()
        .reschedule(&appointment_id, draft, auth.token())
        .await
        .map_err(to_app_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "message": "Appointment rescheduled successfully"
    })))
}

fn to_app_error(e: AppointmentError) -> AppError {
    match e {
        AppointmentError::TimeConflict(field_error) => AppError::FieldConflict {
            field: field_error.field,
            message: field_error.message,
        },
        AppointmentError::SlotOccupied(time) => AppError::FieldConflict {
            field: crate::models::START_TIME_FIELD.to_string(),
            message: format!("Time slot {} is already booked", time),
        },
        AppointmentError::InvalidTime(_)
        | AppointmentError::InvalidSlot(_)
        | AppointmentError::ValidationError(_) => AppError::ValidationError(e.to_string()),
        AppointmentError::InvalidSlotDuration(_) | AppointmentError::PickerNotReady => {
            AppError::Internal(e.to_string())
        }
        AppointmentError::ServiceError(msg) => AppError::ExternalService(msg),
    }
}
