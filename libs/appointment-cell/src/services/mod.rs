pub mod availability;
pub mod booking;
pub mod conflict;
pub mod occupancy;
pub mod picker;
pub mod slots;

#[cfg(test)]
pub(crate) mod testing;

pub use booking::AppointmentBookingService;
pub use conflict::{ConflictGuard, ProposedBooking, TimeRange};
pub use occupancy::{AppointmentService, HttpAppointmentService};
pub use picker::SlotPicker;
