use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use crate::models::{
    Appointment, AppointmentError, AppointmentStatus, CreateAppointmentRequest, SlotTime,
};
use crate::services::occupancy::AppointmentService;

/// In-memory appointment service for unit tests.
#[derive(Default)]
pub struct FakeAppointmentService {
    occupied: HashMap<NaiveDate, Vec<String>>,
    bookings: HashMap<String, String>,
    delays: HashMap<NaiveDate, Duration>,
    failures_remaining: AtomicUsize,
    backend_conflict: bool,
    occupied_calls: AtomicUsize,
    conflict_calls: AtomicUsize,
    pub created: Mutex<Vec<CreateAppointmentRequest>>,
    pub rescheduled: Mutex<Vec<(String, DateTime<Utc>)>>,
}

impl FakeAppointmentService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_occupied(mut self, date: NaiveDate, times: &[&str]) -> Self {
        self.occupied
            .entry(date)
            .or_default()
            .extend(times.iter().map(|s| s.to_string()));
        self
    }

    /// Registers an existing appointment so it can be excluded by id.
    pub fn with_booking(mut self, appointment_id: &str, time: &str) -> Self {
        self.bookings.insert(appointment_id.to_string(), time.to_string());
        self
    }

    pub fn with_delay(mut self, date: NaiveDate, delay: Duration) -> Self {
        self.delays.insert(date, delay);
        self
    }

    /// The next `count` occupancy fetches fail.
    pub fn failing_fetches(self, count: usize) -> Self {
        self.failures_remaining.store(count, Ordering::SeqCst);
        self
    }

    pub fn with_backend_conflict(mut self) -> Self {
        self.backend_conflict = true;
        self
    }

    pub fn occupied_calls(&self) -> usize {
        self.occupied_calls.load(Ordering::SeqCst)
    }

    pub fn conflict_calls(&self) -> usize {
        self.conflict_calls.load(Ordering::SeqCst)
    }

    fn appointment(id: &str, provider_id: &str, patient_id: &str, at: DateTime<Utc>, duration: u32) -> Appointment {
        Appointment {
            id: id.to_string(),
            patient_id: patient_id.to_string(),
            provider_id: provider_id.to_string(),
            appointment_date: at,
            duration,
            appointment_type: crate::models::AppointmentType::Consultation,
            status: AppointmentStatus::Scheduled,
            notes: None,
        }
    }
}

#[async_trait]
impl AppointmentService for FakeAppointmentService {
    async fn get_occupied_times(
        &self,
        _provider_id: &str,
        date: NaiveDate,
        exclude_appointment_id: Option<&str>,
        _auth_token: &str,
    ) -> Result<Vec<String>, AppointmentError> {
        self.occupied_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delays.get(&date) {
            tokio::time::sleep(*delay).await;
        }

        let failed = self
            .failures_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failed {
            return Err(AppointmentError::ServiceError("connection refused".to_string()));
        }

        let excluded = exclude_appointment_id.and_then(|id| self.bookings.get(id));
        Ok(self
            .occupied
            .get(&date)
            .map(|times| {
                times
                    .iter()
                    .filter(|t| Some(*t) != excluded)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn check_time_conflict(
        &self,
        _provider_id: &str,
        _date: NaiveDate,
        _start_time: SlotTime,
        _duration_minutes: u32,
        _auth_token: &str,
    ) -> Result<bool, AppointmentError> {
        self.conflict_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.backend_conflict)
    }

    async fn create_appointment(
        &self,
        request: CreateAppointmentRequest,
        _auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        let appointment = Self::appointment(
            "appt-new",
            &request.provider_id,
            &request.patient_id,
            request.appointment_date,
            request.duration,
        );
        self.created.lock().unwrap().push(request);
        Ok(appointment)
    }

    async fn reschedule_appointment(
        &self,
        appointment_id: &str,
        appointment_date: DateTime<Utc>,
        _auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        self.rescheduled
            .lock()
            .unwrap()
            .push((appointment_id.to_string(), appointment_date));
        Ok(Self::appointment(appointment_id, "doc-1", "pat-1", appointment_date, 30))
    }
}
