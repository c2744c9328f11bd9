use chrono::NaiveDate;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::models::{
    AppointmentError, OccupiedSet, PickerState, PickerView, SchedulingConfig, SlotTime,
};
use crate::services::availability::render_slots;
use crate::services::occupancy::AppointmentService;
use crate::services::slots::generate_slots;

/// Identifies one occupancy fetch. Only the ticket from the most recent input
/// change is allowed to update the picker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    generation: u64,
    pub provider_id: String,
    pub date: NaiveDate,
    pub exclude_appointment_id: Option<String>,
}

/// Time-slot picker for one provider and date.
///
/// Slots are generated once from the scheduling config. Occupancy is loaded
/// asynchronously whenever the provider or date changes; a failed load leaves
/// every slot selectable and records the error, relying on the conflict guard
/// at submit time.
#[derive(Debug, Clone)]
pub struct SlotPicker {
    slots: Vec<SlotTime>,
    provider_id: Option<String>,
    date: Option<NaiveDate>,
    exclude_appointment_id: Option<String>,
    occupied: OccupiedSet,
    selected: Option<SlotTime>,
    state: PickerState,
    error: Option<String>,
    generation: u64,
}

impl SlotPicker {
    pub fn new(config: &SchedulingConfig) -> Result<Self, AppointmentError> {
        Ok(Self {
            slots: generate_slots(&config.working_hours, config.slot_duration_minutes)?,
            provider_id: None,
            date: None,
            exclude_appointment_id: None,
            occupied: OccupiedSet::new(),
            selected: None,
            state: PickerState::Idle,
            error: None,
            generation: 0,
        })
    }

    /// Picker used while rescheduling `appointment_id`, whose own booking must
    /// not count as occupied.
    pub fn for_reschedule(mut self, appointment_id: impl Into<String>) -> Self {
        self.exclude_appointment_id = Some(appointment_id.into());
        self
    }

    /// Applies new provider/date inputs. Returns the fetch to run when both are
    /// present and at least one of them changed.
    pub fn set_inputs(
        &mut self,
        provider_id: Option<String>,
        date: Option<NaiveDate>,
    ) -> Option<FetchTicket> {
        let provider_changed = provider_id != self.provider_id;
        let date_changed = date != self.date;

        if !provider_changed && !date_changed {
            return None;
        }

        if date_changed {
            self.selected = None;
        }

        self.provider_id = provider_id;
        self.date = date;
        self.occupied = OccupiedSet::new();
        self.error = None;
        self.generation += 1;

        match (&self.provider_id, self.date) {
            (Some(provider_id), Some(date)) => {
                self.state = PickerState::Loading;
                Some(FetchTicket {
                    generation: self.generation,
                    provider_id: provider_id.clone(),
                    date,
                    exclude_appointment_id: self.exclude_appointment_id.clone(),
                })
            }
            _ => {
                self.state = PickerState::Idle;
                None
            }
        }
    }

    /// Records the outcome of a fetch. Returns `false` when the ticket is stale
    /// and the result was discarded.
    pub fn complete_fetch(
        &mut self,
        ticket: &FetchTicket,
        result: Result<Vec<String>, AppointmentError>,
    ) -> bool {
        if ticket.generation != self.generation {
            debug!(
                "Discarding stale occupancy for provider {} on {} (generation {} < {})",
                ticket.provider_id, ticket.date, ticket.generation, self.generation
            );
            return false;
        }

        match result {
            Ok(times) => {
                self.occupied = OccupiedSet::from_strings(times);
                self.error = None;
                self.state = PickerState::Ready;
                if let Some(selected) = self.selected {
                    if self.occupied.contains(&selected) {
                        debug!("Selected slot {} is now occupied, clearing selection", selected);
                        self.selected = None;
                    }
                }
            }
            Err(e) => {
                warn!(
                    "Failed to load occupied times for provider {} on {}: {}",
                    ticket.provider_id, ticket.date, e
                );
                self.occupied = OccupiedSet::new();
                self.error = Some(e.to_string());
                self.state = PickerState::ErrorFallbackOpen;
            }
        }

        true
    }

    pub fn select(&mut self, time: SlotTime) -> Result<(), AppointmentError> {
        match self.state {
            PickerState::Idle | PickerState::Loading => return Err(AppointmentError::PickerNotReady),
            PickerState::Ready | PickerState::ErrorFallbackOpen => {}
        }
        if !self.slots.contains(&time) {
            return Err(AppointmentError::InvalidSlot(time));
        }
        if self.occupied.contains(&time) {
            return Err(AppointmentError::SlotOccupied(time));
        }
        self.selected = Some(time);
        Ok(())
    }

    pub fn selected(&self) -> Option<SlotTime> {
        self.selected
    }

    pub fn state(&self) -> PickerState {
        self.state
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn slots(&self) -> &[SlotTime] {
        &self.slots
    }

    pub fn view(&self) -> PickerView {
        let slots = match self.state {
            PickerState::Idle | PickerState::Loading => Vec::new(),
            PickerState::Ready | PickerState::ErrorFallbackOpen => {
                render_slots(&self.slots, &self.occupied, self.selected)
            }
        };

        PickerView {
            state: self.state,
            provider_id: self.provider_id.clone(),
            date: self.date,
            slots,
            error: self.error.clone(),
        }
    }

    /// Sets the inputs and, when they changed, loads occupancy from `service`.
    ///
    /// The lock is released while the request is in flight, so concurrent
    /// refreshes of the same picker are allowed; the newest inputs win.
    pub async fn refresh<S>(
        picker: &Mutex<SlotPicker>,
        service: &S,
        provider_id: Option<String>,
        date: Option<NaiveDate>,
        auth_token: &str,
    ) -> PickerView
    where
        S: AppointmentService + ?Sized,
    {
        let ticket = picker.lock().await.set_inputs(provider_id, date);

        if let Some(ticket) = ticket {
            let result = service
                .get_occupied_times(
                    &ticket.provider_id,
                    ticket.date,
                    ticket.exclude_appointment_id.as_deref(),
                    auth_token,
                )
                .await;
            picker.lock().await.complete_fetch(&ticket, result);
        }

        picker.lock().await.view()
    }
}
