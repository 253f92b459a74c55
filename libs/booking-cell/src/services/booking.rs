// libs/booking-cell/src/services/booking.rs
use std::sync::Arc;

use chrono::Utc;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{
    Appointment, AppointmentStatus, BookAppointmentRequest, BookAppointmentResponse,
    BookingError, PaymentConfirmation,
};
use crate::services::lifecycle::AppointmentLifecycleService;
use crate::services::payments::{HttpPaymentGateway, PaymentGateway};

/// Drives the booking lifecycle: slot claim, appointment creation, payment
/// kickoff, and the status transitions through completion or cancellation.
pub struct BookingService {
    supabase: Arc<SupabaseClient>,
    gateway: Arc<dyn PaymentGateway>,
    lifecycle: AppointmentLifecycleService,
}

impl BookingService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: Arc::new(SupabaseClient::new(config)),
            gateway: Arc::new(HttpPaymentGateway::new(config)),
            lifecycle: AppointmentLifecycleService::new(),
        }
    }

    /// Construction seam for tests that stub the gateway.
    pub fn with_gateway(config: &AppConfig, gateway: Arc<dyn PaymentGateway>) -> Self {
        Self {
            supabase: Arc::new(SupabaseClient::new(config)),
            gateway,
            lifecycle: AppointmentLifecycleService::new(),
        }
    }

    /// Book a block for a patient.
    ///
    /// The claim is one conditional update: it only matches while the block
    /// is still available and unclaimed, so under concurrent requests
    /// exactly one caller gets a row back and every other caller sees an
    /// empty result and a SlotTaken error. Losers are never retried here;
    /// they must re-query the slot list.
    pub async fn book_appointment(
        &self,
        request: BookAppointmentRequest,
        auth_token: &str,
    ) -> Result<BookAppointmentResponse, BookingError> {
        info!(
            "Booking block {} for patient {} with doctor {}",
            request.block_id, request.patient_id, request.doctor_id
        );

        let appointment_id = Uuid::new_v4();

        let claim_path = format!(
            "/rest/v1/availability_blocks?id=eq.{}&is_available=eq.true&appointment_id=is.null",
            request.block_id
        );
        let claimed: Vec<Value> = self
            .supabase
            .request_returning(
                Method::PATCH,
                &claim_path,
                Some(auth_token),
                Some(json!({
                    "is_available": false,
                    "appointment_id": appointment_id
                })),
            )
            .await
            .map_err(|e| BookingError::DatabaseError(e.to_string()))?;

        let Some(block) = claimed.first() else {
            // Either the block does not exist or another request won the
            // race; distinguish so the caller gets an actionable message.
            return if self.block_exists(request.block_id, auth_token).await? {
                info!("Block {} already claimed or unavailable", request.block_id);
                Err(BookingError::SlotTaken)
            } else {
                Err(BookingError::BlockNotFound)
            };
        };

        let scheduled_start = block["start_time"]
            .as_str()
            .and_then(|raw| raw.parse::<chrono::DateTime<Utc>>().ok())
            .ok_or_else(|| {
                BookingError::DatabaseError("Claimed block has no start time".to_string())
            })?;
        let scheduled_end = block["end_time"]
            .as_str()
            .and_then(|raw| raw.parse::<chrono::DateTime<Utc>>().ok())
            .ok_or_else(|| {
                BookingError::DatabaseError("Claimed block has no end time".to_string())
            })?;
        let duration_minutes = (scheduled_end - scheduled_start).num_minutes() as i32;

        let now = Utc::now();
        let insert = json!({
            "id": appointment_id,
            "patient_id": request.patient_id,
            "doctor_id": request.doctor_id,
            "block_id": request.block_id,
            "status": AppointmentStatus::Reserved,
            "scheduled_start_time": scheduled_start.to_rfc3339(),
            "duration_minutes": duration_minutes,
            "notes": request.notes,
            "created_at": now.to_rfc3339(),
            "updated_at": now.to_rfc3339()
        });

        let inserted: Result<Vec<Value>, _> = self
            .supabase
            .request_returning(
                Method::POST,
                "/rest/v1/appointments",
                Some(auth_token),
                Some(insert),
            )
            .await;

        let mut appointment = match inserted {
            Ok(rows) => parse_first_appointment(rows)?,
            Err(e) => {
                // The claim succeeded but the appointment row did not land;
                // hand the block back before failing.
                warn!(
                    "Appointment insert failed after claiming block {}, releasing: {}",
                    request.block_id, e
                );
                self.release_block(request.block_id, appointment_id, auth_token)
                    .await?;
                return Err(BookingError::DatabaseError(e.to_string()));
            }
        };

        // Payment kickoff. A gateway failure here is surfaced to the caller
        // but the reservation stands; reconciliation or a later
        // request-payment retry picks it up.
        let session = self.gateway.create_transaction(appointment_id).await?;
        appointment = self
            .set_status(&appointment, AppointmentStatus::AwaitingPayment, auth_token)
            .await?;

        info!(
            "Appointment {} reserved on block {} and awaiting payment",
            appointment.id, request.block_id
        );

        Ok(BookAppointmentResponse {
            appointment: appointment.into(),
            payment: Some(session),
        })
    }

    /// Re-request a payment transaction for a reserved appointment whose
    /// original gateway call failed.
    pub async fn request_payment(
        &self,
        appointment_id: Uuid,
        auth_token: &str,
    ) -> Result<BookAppointmentResponse, BookingError> {
        let appointment = self.get_appointment(appointment_id, auth_token).await?;

        self.lifecycle
            .validate_status_transition(appointment.status, AppointmentStatus::AwaitingPayment)?;

        let session = self.gateway.create_transaction(appointment_id).await?;
        let appointment = self
            .set_status(&appointment, AppointmentStatus::AwaitingPayment, auth_token)
            .await?;

        Ok(BookAppointmentResponse {
            appointment: appointment.into(),
            payment: Some(session),
        })
    }

    /// Poll the gateway and confirm the appointment when the transaction is
    /// approved. A non-approved transaction leaves the appointment (and its
    /// block) untouched.
    pub async fn confirm_payment(
        &self,
        appointment_id: Uuid,
        auth_token: &str,
    ) -> Result<PaymentConfirmation, BookingError> {
        let appointment = self.get_appointment(appointment_id, auth_token).await?;

        let status = self.gateway.get_status(appointment_id).await?;

        if !status.approved {
            debug!(
                "Payment for appointment {} not approved yet",
                appointment_id
            );
            return Ok(PaymentConfirmation {
                appointment,
                approved: false,
                amount: status.amount,
            });
        }

        if appointment.status == AppointmentStatus::Confirmed {
            return Ok(PaymentConfirmation {
                appointment,
                approved: true,
                amount: status.amount,
            });
        }

        self.lifecycle
            .validate_status_transition(appointment.status, AppointmentStatus::Confirmed)?;

        let appointment = self
            .set_status(&appointment, AppointmentStatus::Confirmed, auth_token)
            .await?;

        info!("Appointment {} confirmed", appointment_id);

        Ok(PaymentConfirmation {
            appointment,
            approved: true,
            amount: status.amount,
        })
    }

    /// Staff-driven status change (confirm, complete, cancel).
    pub async fn update_status(
        &self,
        appointment_id: Uuid,
        new_status: AppointmentStatus,
        auth_token: &str,
    ) -> Result<Appointment, BookingError> {
        if new_status == AppointmentStatus::Cancelled {
            return self.cancel_appointment(appointment_id, auth_token).await;
        }

        let appointment = self.get_appointment(appointment_id, auth_token).await?;

        self.lifecycle
            .validate_status_transition(appointment.status, new_status)?;

        // Completion keeps the block claimed permanently as the historical
        // record; only cancellation releases it.
        self.set_status(&appointment, new_status, auth_token).await
    }

    /// Cancel an appointment and return its block to the bookable pool.
    /// Idempotent: cancelling an already-cancelled appointment is a no-op.
    pub async fn cancel_appointment(
        &self,
        appointment_id: Uuid,
        auth_token: &str,
    ) -> Result<Appointment, BookingError> {
        let appointment = self.get_appointment(appointment_id, auth_token).await?;

        if appointment.status == AppointmentStatus::Cancelled {
            debug!("Appointment {} already cancelled", appointment_id);
            return Ok(appointment);
        }

        self.lifecycle
            .validate_status_transition(appointment.status, AppointmentStatus::Cancelled)?;

        // Cancel first, release second: if the release fails the block stays
        // claimed by a cancelled appointment, which reconciliation can fix;
        // the opposite order could briefly double-book the block.
        let cancelled = self
            .set_status(&appointment, AppointmentStatus::Cancelled, auth_token)
            .await?;

        self.release_block(appointment.block_id, appointment_id, auth_token)
            .await?;

        info!(
            "Appointment {} cancelled, block {} released",
            appointment_id, appointment.block_id
        );

        Ok(cancelled)
    }

    pub async fn get_appointment(
        &self,
        appointment_id: Uuid,
        auth_token: &str,
    ) -> Result<Appointment, BookingError> {
        let path = format!("/rest/v1/appointments?id=eq.{}", appointment_id);
        let rows: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| BookingError::DatabaseError(e.to_string()))?;

        if rows.is_empty() {
            return Err(BookingError::AppointmentNotFound);
        }

        parse_first_appointment(rows)
    }

    pub async fn get_patient_appointments(
        &self,
        patient_id: Uuid,
        auth_token: &str,
    ) -> Result<Vec<Appointment>, BookingError> {
        let path = format!(
            "/rest/v1/appointments?patient_id=eq.{}&order=scheduled_start_time.desc",
            patient_id
        );
        self.list_appointments(&path, auth_token).await
    }

    pub async fn get_doctor_appointments(
        &self,
        doctor_id: Uuid,
        auth_token: &str,
    ) -> Result<Vec<Appointment>, BookingError> {
        let path = format!(
            "/rest/v1/appointments?doctor_id=eq.{}&order=scheduled_start_time.desc",
            doctor_id
        );
        self.list_appointments(&path, auth_token).await
    }

    // Private helper methods

    async fn list_appointments(
        &self,
        path: &str,
        auth_token: &str,
    ) -> Result<Vec<Appointment>, BookingError> {
        let rows: Vec<Value> = self
            .supabase
            .request(Method::GET, path, Some(auth_token), None)
            .await
            .map_err(|e| BookingError::DatabaseError(e.to_string()))?;

        rows.into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<Appointment>, _>>()
            .map_err(|e| BookingError::DatabaseError(format!("Failed to parse appointments: {}", e)))
    }

    async fn set_status(
        &self,
        appointment: &Appointment,
        new_status: AppointmentStatus,
        auth_token: &str,
    ) -> Result<Appointment, BookingError> {
        let path = format!("/rest/v1/appointments?id=eq.{}", appointment.id);
        let updated: Vec<Value> = self
            .supabase
            .request_returning(
                Method::PATCH,
                &path,
                Some(auth_token),
                Some(json!({
                    "status": new_status,
                    "updated_at": Utc::now().to_rfc3339()
                })),
            )
            .await
            .map_err(|e| BookingError::DatabaseError(e.to_string()))?;

        if updated.is_empty() {
            return Err(BookingError::AppointmentNotFound);
        }

        parse_first_appointment(updated)
    }

    /// Conditional release keyed on the claiming appointment, so releasing a
    /// block that was already handed back (or re-claimed by someone else) is
    /// a no-op.
    async fn release_block(
        &self,
        block_id: Uuid,
        appointment_id: Uuid,
        auth_token: &str,
    ) -> Result<(), BookingError> {
        let path = format!(
            "/rest/v1/availability_blocks?id=eq.{}&appointment_id=eq.{}",
            block_id, appointment_id
        );
        let released: Vec<Value> = self
            .supabase
            .request_returning(
                Method::PATCH,
                &path,
                Some(auth_token),
                Some(json!({
                    "is_available": true,
                    "appointment_id": null
                })),
            )
            .await
            .map_err(|e| BookingError::DatabaseError(e.to_string()))?;

        if released.is_empty() {
            debug!("Block {} was already released", block_id);
        }

        Ok(())
    }

    async fn block_exists(
        &self,
        block_id: Uuid,
        auth_token: &str,
    ) -> Result<bool, BookingError> {
        let path = format!("/rest/v1/availability_blocks?id=eq.{}", block_id);
        let rows: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| BookingError::DatabaseError(e.to_string()))?;

        Ok(!rows.is_empty())
    }
}

fn parse_first_appointment(rows: Vec<Value>) -> Result<Appointment, BookingError> {
    rows.into_iter()
        .next()
        .ok_or_else(|| BookingError::DatabaseError("Empty response".to_string()))
        .and_then(|row| {
            serde_json::from_value(row).map_err(|e| {
                BookingError::DatabaseError(format!("Failed to parse appointment: {}", e))
            })
        })
}
