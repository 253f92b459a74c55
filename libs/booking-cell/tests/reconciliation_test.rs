use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use booking_cell::models::{BookingError, PaymentSession, PaymentStatus};
use booking_cell::services::payments::PaymentGateway;
use booking_cell::services::reconciliation::PaymentReconciliationService;
use shared_utils::test_utils::{MockPostgrestRows, TestConfig};

mockall::mock! {
    Gateway {}

    #[async_trait]
    impl PaymentGateway for Gateway {
        async fn create_transaction(
            &self,
            appointment_id: Uuid,
        ) -> Result<PaymentSession, BookingError>;

        async fn get_status(&self, appointment_id: Uuid) -> Result<PaymentStatus, BookingError>;
    }
}

#[tokio::test]
async fn test_reconcile_confirms_approved_and_flags_the_rest() {
    let mock_server = MockServer::start().await;

    let approved_id = Uuid::new_v4();
    let pending_id = Uuid::new_v4();
    let unreachable_id = Uuid::new_v4();
    let start = Utc::now() + Duration::days(1);

    let stuck: Vec<serde_json::Value> = [approved_id, pending_id, unreachable_id]
        .iter()
        .map(|id| {
            MockPostgrestRows::appointment_row(
                *id,
                Uuid::new_v4(),
                Uuid::new_v4(),
                Uuid::new_v4(),
                "awaiting_payment",
                start,
            )
        })
        .collect();

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("status", "eq.awaiting_payment"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(stuck)))
        .mount(&mock_server)
        .await;

    // Exactly one confirmation lands, and only for an appointment still in
    // awaiting_payment.
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("status", "eq.awaiting_payment"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockPostgrestRows::appointment_row(
                approved_id,
                Uuid::new_v4(),
                Uuid::new_v4(),
                Uuid::new_v4(),
                "confirmed",
                start,
            )
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut gateway = MockGateway::new();
    gateway.expect_get_status().returning(move |id| {
        if id == approved_id {
            Ok(PaymentStatus {
                approved: true,
                amount: 25000.0,
            })
        } else if id == pending_id {
            Ok(PaymentStatus {
                approved: false,
                amount: 25000.0,
            })
        } else {
            Err(BookingError::GatewayTimeout)
        }
    });

    let config = TestConfig::with_supabase_url(&mock_server.uri()).to_app_config();
    let service = PaymentReconciliationService::with_gateway(&config, Arc::new(gateway));

    let report = service.reconcile("test-token").await.unwrap();

    assert_eq!(report.checked, 3);
    assert_eq!(report.confirmed, vec![approved_id]);
    assert_eq!(report.needs_review, vec![pending_id, unreachable_id]);
}

#[tokio::test]
async fn test_reconcile_with_nothing_stuck_is_empty() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let config = TestConfig::with_supabase_url(&mock_server.uri()).to_app_config();
    let service = PaymentReconciliationService::with_gateway(&config, Arc::new(MockGateway::new()));

    let report = service.reconcile("test-token").await.unwrap();

    assert_eq!(report.checked, 0);
    assert!(report.confirmed.is_empty());
    assert!(report.needs_review.is_empty());
}
