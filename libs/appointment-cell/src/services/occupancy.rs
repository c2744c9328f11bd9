use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use reqwest::Method;
use tracing::debug;

use shared_api_client::ApiClient;
use shared_config::AppConfig;

use crate::models::{
    Appointment, AppointmentError, ConflictCheckResult, CreateAppointmentRequest,
    RescheduleAppointmentRequest, SlotTime, DATE_FORMAT,
};

/// The external appointment API, as far as scheduling needs it.
#[async_trait]
pub trait AppointmentService: Send + Sync {
    /// Start times (`HH:mm`) already booked for a provider on a date.
    async fn get_occupied_times(
        &self,
        provider_id: &str,
        date: NaiveDate,
        exclude_appointment_id: Option<&str>,
        auth_token: &str,
    ) -> Result<Vec<String>, AppointmentError>;

    /// Whether `[start_time, start_time + duration)` overlaps an existing booking.
    async fn check_time_conflict(
        &self,
        provider_id: &str,
        date: NaiveDate,
        start_time: SlotTime,
        duration_minutes: u32,
        auth_token: &str,
    ) -> Result<bool, AppointmentError>;

    async fn create_appointment(
        &self,
        request: CreateAppointmentRequest,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError>;

    async fn reschedule_appointment(
        &self,
        appointment_id: &str,
        appointment_date: DateTime<Utc>,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError>;
}

pub struct HttpAppointmentService {
    api: Arc<ApiClient>,
}

impl HttpAppointmentService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            api: Arc::new(ApiClient::new(config)),
        }
    }
}

fn service_error(e: anyhow::Error) -> AppointmentError {
    AppointmentError::ServiceError(e.to_string())
}

#[async_trait]
impl AppointmentService for HttpAppointmentService {
    async fn get_occupied_times(
        &self,
        provider_id: &str,
        date: NaiveDate,
        exclude_appointment_id: Option<&str>,
        auth_token: &str,
    ) -> Result<Vec<String>, AppointmentError> {
        debug!("Fetching occupied times for provider {} on {}", provider_id, date);

        let mut path = format!(
            "/appointments/occupied-times?providerId={}&date={}",
            urlencoding::encode(provider_id),
            date.format(DATE_FORMAT)
        );
        if let Some(exclude_id) = exclude_appointment_id {
            path.push_str(&format!("&excludeAppointmentId={}", urlencoding::encode(exclude_id)));
        }

        self.api
            .request_data::<Vec<String>>(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(service_error)
    }

    async fn check_time_conflict(
        &self,
        provider_id: &str,
        date: NaiveDate,
        start_time: SlotTime,
        duration_minutes: u32,
        auth_token: &str,
    ) -> Result<bool, AppointmentError> {
        debug!(
            "Checking conflict for provider {} on {} at {} ({} min)",
            provider_id, date, start_time, duration_minutes
        );

        let path = format!(
            "/appointments/check-conflict?providerId={}&date={}&startTime={}&duration={}",
            urlencoding::encode(provider_id),
            date.format(DATE_FORMAT),
            urlencoding::encode(&start_time.to_string()),
            duration_minutes
        );

        let result: ConflictCheckResult = self
            .api
            .request_data(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(service_error)?;

        Ok(result.has_conflict)
    }

    async fn create_appointment(
        &self,
        request: CreateAppointmentRequest,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        debug!(
            "Creating appointment for patient {} with provider {}",
            request.patient_id, request.provider_id
        );

        let body = serde_json::to_value(&request)
            .map_err(|e| AppointmentError::ValidationError(e.to_string()))?;

        self.api
            .request_data(Method::POST, "/appointments", Some(auth_token), Some(body))
            .await
            .map_err(service_error)
    }

    async fn reschedule_appointment(
        &self,
        appointment_id: &str,
        appointment_date: DateTime<Utc>,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        debug!("Rescheduling appointment {} to {}", appointment_id, appointment_date);

        let path = format!("/appointments/{}/reschedule", urlencoding::encode(appointment_id));
        let body = serde_json::to_value(RescheduleAppointmentRequest { appointment_date })
            .map_err(|e| AppointmentError::ValidationError(e.to_string()))?;

        self.api
            .request_data(Method::PATCH, &path, Some(auth_token), Some(body))
            .await
            .map_err(service_error)
    }
}
