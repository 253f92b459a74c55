// libs/booking-cell/src/services/lifecycle.rs
use tracing::{debug, warn};

use crate::models::{AppointmentStatus, BookingError};

/// Enforces the payment-gated appointment state machine.
///
/// requested -> reserved -> awaiting_payment -> confirmed -> completed,
/// with cancelled reachable from every non-terminal state.
pub struct AppointmentLifecycleService;

impl AppointmentLifecycleService {
    pub fn new() -> Self {
        Self
    }

    pub fn validate_status_transition(
        &self,
        current_status: AppointmentStatus,
        new_status: AppointmentStatus,
    ) -> Result<(), BookingError> {
        debug!(
            "Validating status transition from {} to {}",
            current_status, new_status
        );

        if !self.get_valid_transitions(current_status).contains(&new_status) {
            warn!(
                "Invalid status transition attempted: {} -> {}",
                current_status, new_status
            );
            return Err(BookingError::InvalidTransition {
                from: current_status,
                to: new_status,
            });
        }

        Ok(())
    }

    pub fn get_valid_transitions(&self, current_status: AppointmentStatus) -> Vec<AppointmentStatus> {
        match current_status {
            AppointmentStatus::Requested => vec![
                AppointmentStatus::Reserved,
                AppointmentStatus::Cancelled,
            ],
            AppointmentStatus::Reserved => vec![
                AppointmentStatus::AwaitingPayment,
                AppointmentStatus::Cancelled,
            ],
            AppointmentStatus::AwaitingPayment => vec![
                AppointmentStatus::Confirmed,
                AppointmentStatus::Cancelled,
            ],
            AppointmentStatus::Confirmed => vec![
                AppointmentStatus::Completed,
                AppointmentStatus::Cancelled,
            ],
            // Terminal states - no transitions allowed
            AppointmentStatus::Completed => vec![],
            AppointmentStatus::Cancelled => vec![],
        }
    }
}

impl Default for AppointmentLifecycleService {
    fn default() -> Self {
        Self::new()
    }
}
