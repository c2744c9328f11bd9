// libs/appointment-cell/src/router.rs
use axum::{
    routing::{get, patch, post},
    Router,
};

use crate::handlers::{self, AppState};

pub fn appointment_routes(state: AppState) -> Router {
    // Bearer tokens are forwarded to the appointment service, which enforces access.
    Router::new()
        .route("/", post(handlers::book_appointment))
        .route("/slots", get(handlers::get_slots))
        .route("/{appointment_id}/reschedule", patch(handlers::reschedule_appointment))
        .with_state(state)
}
