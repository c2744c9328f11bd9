use axum::{
    extract::Path,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};

use appointment_cell::{handlers::AppState, router::appointment_routes};
use shared_models::error::AppError;
use shared_models::roles::{can_manage_appointments, navigation_for, UserRole};

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { "Clinic scheduling API is running!" }))
        .route("/navigation/{role}", get(get_navigation))
        .nest("/appointments", appointment_routes(state))
}

async fn get_navigation(Path(role): Path<String>) -> Result<Json<Value>, AppError> {
    let role: UserRole = role.parse().map_err(AppError::NotFound)?;

    Ok(Json(json!({
        "role": role,
        "items": navigation_for(role),
        "can_manage_appointments": can_manage_appointments(role)
    })))
}
