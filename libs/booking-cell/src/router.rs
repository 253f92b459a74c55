// libs/booking-cell/src/router.rs
use std::sync::Arc;

use axum::{
    routing::{get, patch, post},
    Router,
};

use shared_config::AppConfig;

use crate::handlers;

pub fn booking_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", post(handlers::book_appointment))
        .route("/reconcile-payments", post(handlers::reconcile_payments))
        .route("/patients/{patient_id}", get(handlers::get_patient_appointments))
        .route("/doctors/{doctor_id}", get(handlers::get_doctor_appointments))
        .route("/{appointment_id}", get(handlers::get_appointment))
        .route("/{appointment_id}/status", patch(handlers::update_appointment_status))
        .route("/{appointment_id}/request-payment", post(handlers::request_payment))
        .route("/{appointment_id}/confirm-payment", post(handlers::confirm_payment))
        .route("/{appointment_id}/cancel", post(handlers::cancel_appointment))
        .with_state(state)
}
