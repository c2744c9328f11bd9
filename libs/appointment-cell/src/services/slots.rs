use crate::models::{AppointmentError, SlotTime, WorkingHours};

/// Candidate start times inside `hours`, ascending, `duration_minutes` apart.
///
/// The end of the window is exclusive and a trailing slot that would run past
/// it is dropped. An empty or inverted window produces no slots.
pub fn generate_slots(
    hours: &WorkingHours,
    duration_minutes: u32,
) -> Result<Vec<SlotTime>, AppointmentError> {
    if duration_minutes == 0 {
        return Err(AppointmentError::InvalidSlotDuration(duration_minutes));
    }

    let start = hours.start.minutes();
    let end = hours.end.minutes();

    let mut slots = Vec::new();
    let mut current = start;
    while let Some(next) = current.checked_add(duration_minutes).filter(|next| *next <= end) {
        if let Some(slot) = SlotTime::from_minutes(current) {
            slots.push(slot);
        }
        current = next;
    }

    Ok(slots)
}
