// libs/booking-cell/src/services/payments.rs
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tracing::{debug, error, info};
use uuid::Uuid;

use shared_config::AppConfig;

use crate::models::{BookingError, PaymentSession, PaymentStatus};

/// Contract with the external payment gateway. Only the request/response
/// shape matters here; the gateway's own processing is out of scope.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Ask the gateway to open a transaction for an appointment. The patient
    /// completes payment at the returned redirect URL.
    async fn create_transaction(
        &self,
        appointment_id: Uuid,
    ) -> Result<PaymentSession, BookingError>;

    /// Current gateway-side status of an appointment's transaction.
    async fn get_status(&self, appointment_id: Uuid) -> Result<PaymentStatus, BookingError>;
}

pub struct HttpPaymentGateway {
    client: Client,
    base_url: String,
    api_key: String,
    timeout: Duration,
}

impl HttpPaymentGateway {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.payment_gateway_url.clone(),
            api_key: config.payment_gateway_api_key.clone(),
            timeout: Duration::from_secs(config.payment_timeout_seconds),
        }
    }

    fn ensure_configured(&self) -> Result<(), BookingError> {
        if self.base_url.is_empty() || self.api_key.is_empty() {
            return Err(BookingError::GatewayNotConfigured);
        }
        Ok(())
    }

    fn map_request_error(error: reqwest::Error) -> BookingError {
        if error.is_timeout() {
            BookingError::GatewayTimeout
        } else {
            BookingError::Gateway(error.to_string())
        }
    }
}

#[async_trait]
impl PaymentGateway for HttpPaymentGateway {
    async fn create_transaction(
        &self,
        appointment_id: Uuid,
    ) -> Result<PaymentSession, BookingError> {
        self.ensure_configured()?;

        let url = format!("{}/transactions", self.base_url);
        debug!("Creating payment transaction for appointment {}", appointment_id);

        let response = self
            .client
            .post(&url)
            .timeout(self.timeout)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&json!({ "appointment_id": appointment_id }))
            .send()
            .await
            .map_err(Self::map_request_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Payment transaction creation failed: {} - {}", status, body);
            return Err(BookingError::Gateway(format!("HTTP {}: {}", status, body)));
        }

        let session: PaymentSession = response
            .json()
            .await
            .map_err(|e| BookingError::Gateway(format!("Failed to parse session: {}", e)))?;

        info!(
            "Payment transaction created for appointment {}",
            appointment_id
        );
        Ok(session)
    }

    async fn get_status(&self, appointment_id: Uuid) -> Result<PaymentStatus, BookingError> {
        self.ensure_configured()?;

        let url = format!("{}/transactions/{}/status", self.base_url, appointment_id);
        debug!("Fetching payment status for appointment {}", appointment_id);

        let response = self
            .client
            .get(&url)
            .timeout(self.timeout)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await
            .map_err(Self::map_request_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Payment status lookup failed: {} - {}", status, body);
            return Err(BookingError::Gateway(format!("HTTP {}: {}", status, body)));
        }

        response
            .json()
            .await
            .map_err(|e| BookingError::Gateway(format!("Failed to parse status: {}", e)))
    }
}
