use assert_matches::assert_matches;

use booking_cell::models::AppointmentStatus::{self, *};
use booking_cell::models::BookingError;
use booking_cell::services::lifecycle::AppointmentLifecycleService;

#[test]
fn happy_path_transitions_are_allowed() {
    let lifecycle = AppointmentLifecycleService::new();

    assert!(lifecycle.validate_status_transition(Requested, Reserved).is_ok());
    assert!(lifecycle.validate_status_transition(Reserved, AwaitingPayment).is_ok());
    assert!(lifecycle.validate_status_transition(AwaitingPayment, Confirmed).is_ok());
    assert!(lifecycle.validate_status_transition(Confirmed, Completed).is_ok());
}

#[test]
fn cancellation_is_reachable_from_every_non_terminal_state() {
    let lifecycle = AppointmentLifecycleService::new();

    for status in [Requested, Reserved, AwaitingPayment, Confirmed] {
        assert!(
            lifecycle.validate_status_transition(status, Cancelled).is_ok(),
            "{} should be cancellable",
            status
        );
    }
}

#[test]
fn terminal_states_allow_no_transitions() {
    let lifecycle = AppointmentLifecycleService::new();

    assert!(lifecycle.get_valid_transitions(Completed).is_empty());
    assert!(lifecycle.get_valid_transitions(Cancelled).is_empty());

    assert_matches!(
        lifecycle.validate_status_transition(Completed, Cancelled),
        Err(BookingError::InvalidTransition { .. })
    );
    assert_matches!(
        lifecycle.validate_status_transition(Cancelled, Confirmed),
        Err(BookingError::InvalidTransition { .. })
    );
}

#[test]
fn payment_gate_cannot_be_skipped() {
    let lifecycle = AppointmentLifecycleService::new();

    // reserved must pass through awaiting_payment before confirmation.
    assert_matches!(
        lifecycle.validate_status_transition(Reserved, Confirmed),
        Err(BookingError::InvalidTransition { .. })
    );
    assert_matches!(
        lifecycle.validate_status_transition(Reserved, Completed),
        Err(BookingError::InvalidTransition { .. })
    );
    assert_matches!(
        lifecycle.validate_status_transition(AwaitingPayment, Completed),
        Err(BookingError::InvalidTransition { .. })
    );
}

#[test]
fn public_labels_fold_pre_confirmation_states() {
    assert_eq!(Requested.public_label(), "programada");
    assert_eq!(Reserved.public_label(), "programada");
    assert_eq!(AwaitingPayment.public_label(), "programada");
    assert_eq!(Confirmed.public_label(), "confirmada");
    assert_eq!(Completed.public_label(), "completada");
    assert_eq!(Cancelled.public_label(), "cancelada");
}
