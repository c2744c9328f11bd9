use std::sync::Arc;

use tracing::{debug, info};

use crate::models::{
    slot_instant, Appointment, AppointmentDraft, AppointmentError, CreateAppointmentRequest,
    SchedulingConfig, SlotTime,
};
use crate::services::conflict::{ConflictGuard, ProposedBooking};
use crate::services::occupancy::AppointmentService;

/// Creates and reschedules appointments, always through the conflict guard.
pub struct AppointmentBookingService<S: ?Sized> {
    service: Arc<S>,
    guard: ConflictGuard<S>,
}

impl<S> AppointmentBookingService<S>
where
    S: AppointmentService + ?Sized,
{
    pub fn new(service: Arc<S>, config: SchedulingConfig) -> Self {
        Self {
            guard: ConflictGuard::new(service.clone(), config),
            service,
        }
    }

    pub async fn book(
        &self,
        draft: AppointmentDraft,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        let start_time = self.validate_draft(&draft)?;

        self.guard
            .verify(
                &ProposedBooking {
                    provider_id: &draft.provider_id,
                    date: draft.date,
                    start_time,
                    duration_minutes: draft.duration_minutes,
                    exclude_appointment_id: None,
                },
                auth_token,
            )
            .await?;

        let request = CreateAppointmentRequest {
            patient_id: draft.patient_id,
            provider_id: draft.provider_id,
            appointment_date: slot_instant(draft.date, start_time),
            duration: draft.duration_minutes,
            appointment_type: draft.appointment_type,
            notes: draft.notes,
        };

        let appointment = self.service.create_appointment(request, auth_token).await?;
        info!(
            "Booked appointment {} with provider {} at {}",
            appointment.id, appointment.provider_id, appointment.appointment_date
        );
        Ok(appointment)
    }

    pub async fn reschedule(
        &self,
        appointment_id: &str,
        draft: AppointmentDraft,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        let start_time = self.validate_draft(&draft)?;

        self.guard
            .verify(
                &ProposedBooking {
                    provider_id: &draft.provider_id,
                    date: draft.date,
                    start_time,
                    duration_minutes: draft.duration_minutes,
                    exclude_appointment_id: Some(appointment_id),
                },
                auth_token,
            )
            .await?;

        let new_date = slot_instant(draft.date, start_time);
        debug!("Rescheduling appointment {} to {}", appointment_id, new_date.to_rfc3339());

        let appointment = self
            .service
            .reschedule_appointment(appointment_id, new_date, auth_token)
            .await?;
        info!("Rescheduled appointment {} to {}", appointment.id, appointment.appointment_date);
        Ok(appointment)
    }

    fn validate_draft(&self, draft: &AppointmentDraft) -> Result<SlotTime, AppointmentError> {
        if draft.provider_id.trim().is_empty() {
            return Err(AppointmentError::ValidationError("A provider must be selected".to_string()));
        }
        if draft.patient_id.trim().is_empty() {
            return Err(AppointmentError::ValidationError("A patient must be selected".to_string()));
        }
        if draft.duration_minutes == 0 {
            return Err(AppointmentError::ValidationError(
                "Appointment duration must be greater than zero".to_string(),
            ));
        }
        draft.start_time.parse::<SlotTime>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AppointmentType, PickerState, SlotStatus};
    use crate::services::picker::SlotPicker;
    use crate::services::testing::FakeAppointmentService;
    use assert_matches::assert_matches;
    use chrono::NaiveDate;
    use tokio::sync::Mutex;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 20).unwrap()
    }

    fn draft(start: &str) -> AppointmentDraft {
        AppointmentDraft {
            provider_id: "doc-1".to_string(),
            patient_id: "pat-1".to_string(),
            date: date(),
            start_time: start.to_string(),
            duration_minutes: 30,
            appointment_type: AppointmentType::Consultation,
            notes: Some("first visit".to_string()),
        }
    }

    #[tokio::test]
    async fn books_free_slot_at_utc_instant() {
        let service = Arc::new(FakeAppointmentService::new().with_occupied(date(), &["09:00"]));
        let booking = AppointmentBookingService::new(service.clone(), SchedulingConfig::default());

        let appointment = booking.book(draft("10:00"), "tok").await.unwrap();
        assert_eq!(appointment.appointment_date.to_rfc3339(), "2026-10-20T10:00:00+00:00");

        let created = service.created.lock().unwrap();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].notes.as_deref(), Some("first visit"));
    }

    #[tokio::test]
    async fn conflicting_booking_never_reaches_the_service() {
        let service = Arc::new(FakeAppointmentService::new().with_occupied(date(), &["09:00"]));
        let booking = AppointmentBookingService::new(service.clone(), SchedulingConfig::default());

        assert_matches!(
            booking.book(draft("09:00"), "tok").await,
            Err(AppointmentError::TimeConflict(_))
        );
        assert!(service.created.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn malformed_start_time_is_rejected() {
        let booking = AppointmentBookingService::new(
            Arc::new(FakeAppointmentService::new()),
            SchedulingConfig::default(),
        );
        assert_matches!(
            booking.book(draft("9am"), "tok").await,
            Err(AppointmentError::InvalidTime(_))
        );
    }

    #[tokio::test]
    async fn missing_provider_is_rejected() {
        let booking = AppointmentBookingService::new(
            Arc::new(FakeAppointmentService::new()),
            SchedulingConfig::default(),
        );
        let mut d = draft("10:00");
        d.provider_id = " ".to_string();
        assert_matches!(booking.book(d, "tok").await, Err(AppointmentError::ValidationError(_)));
    }

    #[tokio::test]
    async fn oversized_duration_never_reaches_the_service() {
        let service = Arc::new(FakeAppointmentService::new().with_occupied(date(), &["11:00"]));
        let booking = AppointmentBookingService::new(service.clone(), SchedulingConfig::default());

        let mut d = draft("10:00");
        d.duration_minutes = u32::MAX;
        assert_matches!(booking.book(d, "tok").await, Err(AppointmentError::ValidationError(_)));
        assert!(service.created.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn reschedule_excludes_the_moved_appointment() {
        let service = Arc::new(
            FakeAppointmentService::new()
                .with_occupied(date(), &["10:00", "11:00"])
                .with_booking("appt-1", "10:00"),
        );
        let booking = AppointmentBookingService::new(service.clone(), SchedulingConfig::default());

        let moved = booking.reschedule("appt-1", draft("10:15"), "tok").await.unwrap();
        assert_eq!(moved.id, "appt-1");
        assert_eq!(service.rescheduled.lock().unwrap().len(), 1);

        assert_matches!(
            booking.reschedule("appt-1", draft("10:45"), "tok").await,
            Err(AppointmentError::TimeConflict(_))
        );
    }

    #[tokio::test]
    async fn guard_catches_occupied_slot_after_fail_open_picker() {
        // First fetch (picker) fails, second fetch (guard) succeeds.
        let service = Arc::new(
            FakeAppointmentService::new()
                .with_occupied(date(), &["09:00", "09:30"])
                .failing_fetches(1),
        );
        let picker = Mutex::new(SlotPicker::new(&SchedulingConfig::default()).unwrap());

        let view = SlotPicker::refresh(&picker, service.as_ref(), Some("doc-1".into()), Some(date()), "tok").await;
        assert_eq!(view.state, PickerState::ErrorFallbackOpen);
        assert!(view.error.is_some());
        assert!(view.slots.iter().all(|s| s.status == SlotStatus::Available));

        let nine = "09:00".parse().unwrap();
        picker.lock().await.select(nine).unwrap();

        let booking = AppointmentBookingService::new(service.clone(), SchedulingConfig::default());
        let result = booking.book(draft(&nine.to_string()), "tok").await;
        assert_matches!(result, Err(AppointmentError::TimeConflict(_)));
        assert!(service.created.lock().unwrap().is_empty());
    }
}
