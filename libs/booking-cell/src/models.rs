// libs/booking-cell/src/models.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub block_id: Uuid,
    pub status: AppointmentStatus,
    pub scheduled_start_time: DateTime<Utc>,
    pub duration_minutes: i32,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Appointment {
    pub fn scheduled_end_time(&self) -> DateTime<Utc> {
        self.scheduled_start_time + chrono::Duration::minutes(self.duration_minutes as i64)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Requested,
    Reserved,
    AwaitingPayment,
    Confirmed,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, AppointmentStatus::Completed | AppointmentStatus::Cancelled)
    }

    /// Patient-facing label. The pre-confirmation states all surface as
    /// "programada".
    pub fn public_label(&self) -> &'static str {
        match self {
            AppointmentStatus::Requested
            | AppointmentStatus::Reserved
            | AppointmentStatus::AwaitingPayment => "programada",
            AppointmentStatus::Confirmed => "confirmada",
            AppointmentStatus::Completed => "completada",
            AppointmentStatus::Cancelled => "cancelada",
        }
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Requested => write!(f, "requested"),
            AppointmentStatus::Reserved => write!(f, "reserved"),
            AppointmentStatus::AwaitingPayment => write!(f, "awaiting_payment"),
            AppointmentStatus::Confirmed => write!(f, "confirmed"),
            AppointmentStatus::Completed => write!(f, "completed"),
            AppointmentStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookAppointmentRequest {
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub block_id: Uuid,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: AppointmentStatus,
}

/// Appointment plus the patient-facing status label.
#[derive(Debug, Clone, Serialize)]
pub struct AppointmentView {
    #[serde(flatten)]
    pub appointment: Appointment,
    pub status_label: &'static str,
}

impl From<Appointment> for AppointmentView {
    fn from(appointment: Appointment) -> Self {
        let status_label = appointment.status.public_label();
        Self {
            appointment,
            status_label,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BookAppointmentResponse {
    pub appointment: AppointmentView,
    /// Present when the gateway accepted the transaction request.
    pub payment: Option<PaymentSession>,
}

#[derive(Debug, Clone)]
pub struct PaymentConfirmation {
    pub appointment: Appointment,
    pub approved: bool,
    pub amount: f64,
}

// ==============================================================================
// PAYMENT GATEWAY CONTRACT
// ==============================================================================

/// Returned by the gateway when a transaction is created; the patient is
/// redirected to `redirect_url` to pay.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentSession {
    pub redirect_url: String,
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentStatus {
    pub approved: bool,
    pub amount: f64,
}

// ==============================================================================
// RECONCILIATION MODELS
// ==============================================================================

/// Outcome of one reconciliation pass over stuck awaiting-payment
/// appointments. Nothing is cancelled automatically; unresolved entries are
/// listed for staff review.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconciliationReport {
    pub checked: usize,
    pub confirmed: Vec<Uuid>,
    pub needs_review: Vec<Uuid>,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, thiserror::Error)]
pub enum BookingError {
    #[error("Slot no longer available")]
    SlotTaken,

    #[error("Block not found")]
    BlockNotFound,

    #[error("Appointment not found")]
    AppointmentNotFound,

    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },

    #[error("Payment gateway error: {0}")]
    Gateway(String),

    #[error("Payment gateway timed out")]
    GatewayTimeout,

    #[error("Payment gateway not configured")]
    GatewayNotConfigured,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}
