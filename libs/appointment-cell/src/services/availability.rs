use crate::models::{OccupiedSet, SlotStatus, SlotTime, SlotView};

pub fn classify(slot: &SlotTime, occupied: &OccupiedSet) -> SlotStatus {
    if occupied.contains(slot) {
        SlotStatus::Occupied
    } else {
        SlotStatus::Available
    }
}

/// Renders generated slots against the loaded occupancy and current selection.
pub fn render_slots(
    slots: &[SlotTime],
    occupied: &OccupiedSet,
    selected: Option<SlotTime>,
) -> Vec<SlotView> {
    slots
        .iter()
        .map(|slot| SlotView {
            time: *slot,
            status: classify(slot, occupied),
            selected: selected == Some(*slot),
        })
        .collect()
}
