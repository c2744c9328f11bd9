use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::models::{
    AppointmentError, FieldError, OccupiedSet, SchedulingConfig, SlotTime, MINUTES_PER_DAY,
};
use crate::services::occupancy::AppointmentService;

/// Half-open interval `[start, end)` in minutes since midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub start: u32,
    pub end: u32,
}

impl TimeRange {
    /// The end saturates, so an oversized duration covers the rest of the day.
    pub fn new(start: SlotTime, duration_minutes: u32) -> Self {
        let start = start.minutes();
        Self {
            start,
            end: start.saturating_add(duration_minutes),
        }
    }

    pub fn overlaps(&self, other: &TimeRange) -> bool {
        // [a, b) and [c, d) intersect iff a < d and c < b
        self.start < other.end && other.start < self.end
    }
}

/// First existing booking that intersects `proposed`, if any.
pub fn find_overlap<I>(proposed: &TimeRange, bookings: I) -> Option<TimeRange>
where
    I: IntoIterator<Item = TimeRange>,
{
    bookings.into_iter().find(|booking| proposed.overlaps(booking))
}

/// A booking about to be submitted.
#[derive(Debug, Clone)]
pub struct ProposedBooking<'a> {
    pub provider_id: &'a str,
    pub date: NaiveDate,
    pub start_time: SlotTime,
    pub duration_minutes: u32,
    /// Set when rescheduling, so the appointment does not collide with itself.
    pub exclude_appointment_id: Option<&'a str>,
}

/// Re-validates a chosen slot against fresh occupancy right before submit.
pub struct ConflictGuard<S: ?Sized> {
    service: Arc<S>,
    config: SchedulingConfig,
}

impl<S> ConflictGuard<S>
where
    S: AppointmentService + ?Sized,
{
    pub fn new(service: Arc<S>, config: SchedulingConfig) -> Self {
        Self { service, config }
    }

    /// Fails with [`AppointmentError::TimeConflict`] when the proposal overlaps
    /// a booking. Unlike the picker, a failed occupancy fetch here is an error:
    /// the submission is blocked rather than let through unchecked.
    ///
    /// Occupied times carry no duration, so each existing booking is taken to
    /// last one slot. The service's own conflict check knows real durations but
    /// cannot exclude an appointment, so it is skipped for reschedules. A
    /// reschedule into the tail of a booking longer than one slot is therefore
    /// not caught here.
    pub async fn verify(
        &self,
        proposal: &ProposedBooking<'_>,
        auth_token: &str,
    ) -> Result<(), AppointmentError> {
        if proposal.duration_minutes == 0 {
            return Err(AppointmentError::ValidationError(
                "Appointment duration must be greater than zero".to_string(),
            ));
        }
        let ends_same_day = proposal
            .start_time
            .minutes()
            .checked_add(proposal.duration_minutes)
            .is_some_and(|end| end <= MINUTES_PER_DAY);
        if !ends_same_day {
            return Err(AppointmentError::ValidationError(format!(
                "A {} minute appointment at {} runs past midnight",
                proposal.duration_minutes, proposal.start_time
            )));
        }

        debug!(
            "Verifying {} ({} min) for provider {} on {}",
            proposal.start_time, proposal.duration_minutes, proposal.provider_id, proposal.date
        );

        let fresh = self
            .service
            .get_occupied_times(
                proposal.provider_id,
                proposal.date,
                proposal.exclude_appointment_id,
                auth_token,
            )
            .await?;
        let occupied = OccupiedSet::from_strings(fresh);

        let requested = TimeRange::new(proposal.start_time, proposal.duration_minutes);
        let existing = occupied
            .iter()
            .map(|start| TimeRange::new(*start, self.config.slot_duration_minutes));

        if let Some(hit) = find_overlap(&requested, existing) {
            let booked_at = SlotTime::from_minutes(hit.start)
                .map(|t| t.to_string())
                .unwrap_or_default();
            warn!(
                "Conflict for provider {} on {}: {} overlaps booking at {}",
                proposal.provider_id, proposal.date, proposal.start_time, booked_at
            );
            return Err(AppointmentError::TimeConflict(FieldError::start_time(format!(
                "{} overlaps an existing appointment at {}. Please choose another time.",
                proposal.start_time, booked_at
            ))));
        }

        // Exact durations of other bookings are only known to the service.
        // It cannot exclude an appointment, so this only runs for new bookings.
        if proposal.exclude_appointment_id.is_none()
            && self
                .service
                .check_time_conflict(
                    proposal.provider_id,
                    proposal.date,
                    proposal.start_time,
                    proposal.duration_minutes,
                    auth_token,
                )
                .await?
        {
            warn!(
                "Service reported conflict for provider {} on {} at {}",
                proposal.provider_id, proposal.date, proposal.start_time
            );
            return Err(AppointmentError::TimeConflict(FieldError::start_time(
                "This time slot conflicts with an existing appointment. Please choose another time.",
            )));
        }

        Ok(())
    }
}
