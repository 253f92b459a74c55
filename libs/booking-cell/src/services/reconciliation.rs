// libs/booking-cell/src/services/reconciliation.rs
use std::sync::Arc;

use chrono::{Duration, Utc};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{info, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{Appointment, AppointmentStatus, BookingError, ReconciliationReport};
use crate::services::payments::{HttpPaymentGateway, PaymentGateway};

/// Resolves appointments stuck in awaiting_payment.
///
/// Externally triggered (there is no in-process scheduler): one pass scans
/// appointments past the configured age threshold and polls the gateway for
/// each. Approved transactions are confirmed; everything else is reported
/// for staff review and never cancelled automatically.
pub struct PaymentReconciliationService {
    supabase: Arc<SupabaseClient>,
    gateway: Arc<dyn PaymentGateway>,
    threshold_minutes: i64,
}

impl PaymentReconciliationService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: Arc::new(SupabaseClient::new(config)),
            gateway: Arc::new(HttpPaymentGateway::new(config)),
            threshold_minutes: config.payment_reconcile_threshold_minutes,
        }
    }

    pub fn with_gateway(config: &AppConfig, gateway: Arc<dyn PaymentGateway>) -> Self {
        Self {
            supabase: Arc::new(SupabaseClient::new(config)),
            gateway,
            threshold_minutes: config.payment_reconcile_threshold_minutes,
        }
    }

    pub async fn reconcile(&self, auth_token: &str) -> Result<ReconciliationReport, BookingError> {
        let cutoff = Utc::now() - Duration::minutes(self.threshold_minutes);
        let path = format!(
            "/rest/v1/appointments?status=eq.awaiting_payment&updated_at=lt.{}&order=updated_at.asc",
            urlencoding::encode(&cutoff.to_rfc3339())
        );

        let rows: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| BookingError::DatabaseError(e.to_string()))?;

        let stuck: Vec<Appointment> = rows
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<Appointment>, _>>()
            .map_err(|e| {
                BookingError::DatabaseError(format!("Failed to parse appointments: {}", e))
            })?;

        info!(
            "Reconciling {} appointments stuck in awaiting_payment",
            stuck.len()
        );

        let mut confirmed = Vec::new();
        let mut needs_review = Vec::new();

        for appointment in &stuck {
            match self.gateway.get_status(appointment.id).await {
                Ok(status) if status.approved => {
                    if let Err(e) = self.confirm(appointment.id, auth_token).await {
                        warn!("Failed to confirm appointment {}: {}", appointment.id, e);
                        needs_review.push(appointment.id);
                    } else {
                        confirmed.push(appointment.id);
                    }
                }
                Ok(_) => {
                    // Pending or rejected on the gateway side: a human call.
                    needs_review.push(appointment.id);
                }
                Err(e) => {
                    warn!(
                        "Gateway status lookup failed for appointment {}: {}",
                        appointment.id, e
                    );
                    needs_review.push(appointment.id);
                }
            }
        }

        info!(
            "Reconciliation pass done: {} confirmed, {} flagged for review",
            confirmed.len(),
            needs_review.len()
        );

        Ok(ReconciliationReport {
            checked: stuck.len(),
            confirmed,
            needs_review,
        })
    }

    async fn confirm(&self, appointment_id: Uuid, auth_token: &str) -> Result<(), BookingError> {
        let path = format!(
            "/rest/v1/appointments?id=eq.{}&status=eq.awaiting_payment",
            appointment_id
        );
        let updated: Vec<Value> = self
            .supabase
            .request_returning(
                Method::PATCH,
                &path,
                Some(auth_token),
                Some(json!({
                    "status": AppointmentStatus::Confirmed,
                    "updated_at": Utc::now().to_rfc3339()
                })),
            )
            .await
            .map_err(|e| BookingError::DatabaseError(e.to_string()))?;

        if updated.is_empty() {
            return Err(BookingError::AppointmentNotFound);
        }

        Ok(())
    }
}
