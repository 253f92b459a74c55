// libs/booking-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::error::AppError;

use crate::models::{
    AppointmentView, BookAppointmentRequest, BookingError, UpdateStatusRequest,
};
use crate::services::booking::BookingService;
use crate::services::reconciliation::PaymentReconciliationService;

fn map_booking_error(error: BookingError) -> AppError {
    match error {
        BookingError::SlotTaken => AppError::Conflict(
            "This slot was just taken. Please choose another available time.".to_string(),
        ),
        BookingError::BlockNotFound => AppError::NotFound("Block not found".to_string()),
        BookingError::AppointmentNotFound => {
            AppError::NotFound("Appointment not found".to_string())
        }
        BookingError::InvalidTransition { from, to } => {
            AppError::BadRequest(format!("Cannot change appointment from {} to {}", from, to))
        }
        BookingError::Gateway(msg) => AppError::Gateway(msg),
        BookingError::GatewayTimeout => {
            AppError::Gateway("Payment gateway timed out".to_string())
        }
        BookingError::GatewayNotConfigured => {
            AppError::Gateway("Payment gateway not configured".to_string())
        }
        BookingError::ValidationError(msg) => AppError::ValidationError(msg),
        BookingError::DatabaseError(msg) => AppError::Database(msg),
    }
}

/// Book a block for a patient. A lost claim race comes back as 409 with a
/// pick-another-slot message.
#[axum::debug_handler]
pub async fn book_appointment(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let service = BookingService::new(&state);

    let response = service
        .book_appointment(request, auth.token())
        .await
        .map_err(map_booking_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": response.appointment,
        "payment": response.payment
    })))
}

#[axum::debug_handler]
pub async fn get_appointment(
    State(state): State<Arc<AppConfig>>,
    Path(appointment_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let service = BookingService::new(&state);

    let appointment = service
        .get_appointment(appointment_id, auth.token())
        .await
        .map_err(map_booking_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": AppointmentView::from(appointment)
    })))
}

/// Staff-driven confirm/complete/cancel.
#[axum::debug_handler]
pub async fn update_appointment_status(
    State(state): State<Arc<AppConfig>>,
    Path(appointment_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<Value>, AppError> {
    let service = BookingService::new(&state);

    let appointment = service
        .update_status(appointment_id, request.status, auth.token())
        .await
        .map_err(map_booking_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": AppointmentView::from(appointment)
    })))
}

/// Re-request a payment transaction for a reserved appointment.
#[axum::debug_handler]
pub async fn request_payment(
    State(state): State<Arc<AppConfig>>,
    Path(appointment_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let service = BookingService::new(&state);

    let response = service
        .request_payment(appointment_id, auth.token())
        .await
        .map_err(map_booking_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": response.appointment,
        "payment": response.payment
    })))
}

/// Poll the gateway and confirm the appointment if its transaction was
/// approved.
#[axum::debug_handler]
pub async fn confirm_payment(
    State(state): State<Arc<AppConfig>>,
    Path(appointment_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let service = BookingService::new(&state);

    let confirmation = service
        .confirm_payment(appointment_id, auth.token())
        .await
        .map_err(map_booking_error)?;

    Ok(Json(json!({
        "success": true,
        "approved": confirmation.approved,
        "amount": confirmation.amount,
        "appointment": AppointmentView::from(confirmation.appointment)
    })))
}

/// Cancel an appointment and release its block. Idempotent.
#[axum::debug_handler]
pub async fn cancel_appointment(
    State(state): State<Arc<AppConfig>>,
    Path(appointment_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let service = BookingService::new(&state);

    let appointment = service
        .cancel_appointment(appointment_id, auth.token())
        .await
        .map_err(map_booking_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": AppointmentView::from(appointment)
    })))
}

#[axum::debug_handler]
pub async fn get_patient_appointments(
    State(state): State<Arc<AppConfig>>,
    Path(patient_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let service = BookingService::new(&state);

    let appointments = service
        .get_patient_appointments(patient_id, auth.token())
        .await
        .map_err(map_booking_error)?;

    let views: Vec<AppointmentView> = appointments.into_iter().map(Into::into).collect();

    Ok(Json(json!({
        "success": true,
        "appointments": views
    })))
}

#[axum::debug_handler]
pub async fn get_doctor_appointments(
    State(state): State<Arc<AppConfig>>,
    Path(doctor_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let service = BookingService::new(&state);

    let appointments = service
        .get_doctor_appointments(doctor_id, auth.token())
        .await
        .map_err(map_booking_error)?;

    let views: Vec<AppointmentView> = appointments.into_iter().map(Into::into).collect();

    Ok(Json(json!({
        "success": true,
        "appointments": views
    })))
}

/// One reconciliation pass over stuck awaiting-payment appointments.
#[axum::debug_handler]
pub async fn reconcile_payments(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let service = PaymentReconciliationService::new(&state);

    let report = service
        .reconcile(auth.token())
        .await
        .map_err(map_booking_error)?;

    Ok(Json(json!({
        "success": true,
        "report": report
    })))
}
