use serde_json::json;
use uuid::Uuid;

use shared_config::AppConfig;

pub const TEST_TOKEN: &str = "test-bearer-token";

pub struct TestConfig {
    pub appointment_api_url: String,
    pub appointment_api_key: Option<String>,
    pub slot_duration_minutes: u32,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            appointment_api_url: "http://localhost:54321".to_string(),
            appointment_api_key: Some("test-api-key".to_string()),
            slot_duration_minutes: 30,
        }
    }
}

impl TestConfig {
    /// Config pointing at a mock server, e.g. `wiremock::MockServer::uri()`.
    pub fn with_api_url(url: impl Into<String>) -> Self {
        Self {
            appointment_api_url: url.into(),
            ..Self::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            appointment_api_url: self.appointment_api_url.clone(),
            appointment_api_key: self.appointment_api_key.clone(),
            slot_duration_minutes: self.slot_duration_minutes,
            ..AppConfig::default()
        }
    }
}

/// Response bodies in the shapes the appointment API returns.
pub struct MockAppointmentResponses;

impl MockAppointmentResponses {
    pub fn occupied_times_response(times: &[&str]) -> serde_json::Value {
        json!({
            "success": true,
            "data": times
        })
    }

    pub fn conflict_response(has_conflict: bool) -> serde_json::Value {
        json!({
            "success": true,
            "data": { "hasConflict": has_conflict }
        })
    }

    pub fn appointment_response(
        appointment_id: Option<&str>,
        patient_id: &str,
        provider_id: &str,
        appointment_date: &str,
    ) -> serde_json::Value {
        let id = appointment_id
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        json!({
            "id": id,
            "patientId": patient_id,
            "providerId": provider_id,
            "appointmentDate": appointment_date,
            "duration": 30,
            "type": "consultation",
            "status": "scheduled",
            "notes": null,
            "createdAt": "2026-01-01T00:00:00Z",
            "updatedAt": "2026-01-01T00:00:00Z"
        })
    }

    pub fn error_response(message: &str) -> serde_json::Value {
        json!({
            "success": false,
            "error": message
        })
    }
}
