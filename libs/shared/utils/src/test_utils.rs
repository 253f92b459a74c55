use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;

pub struct TestConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub payment_gateway_url: String,
    pub payment_gateway_api_key: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            supabase_url: "http://localhost:54321".to_string(),
            supabase_anon_key: "test-anon-key".to_string(),
            payment_gateway_url: "http://localhost:54400".to_string(),
            payment_gateway_api_key: "test-gateway-key".to_string(),
        }
    }
}

impl TestConfig {
    /// Config pointed at a mock PostgREST server.
    pub fn with_supabase_url(url: &str) -> Self {
        Self {
            supabase_url: url.to_string(),
            ..Self::default()
        }
    }

    /// Config pointed at mock PostgREST and payment gateway servers.
    pub fn with_urls(supabase_url: &str, gateway_url: &str) -> Self {
        Self {
            supabase_url: supabase_url.to_string(),
            payment_gateway_url: gateway_url.to_string(),
            ..Self::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            supabase_url: self.supabase_url.clone(),
            supabase_anon_key: self.supabase_anon_key.clone(),
            payment_gateway_url: self.payment_gateway_url.clone(),
            payment_gateway_api_key: self.payment_gateway_api_key.clone(),
            payment_timeout_seconds: 2,
            payment_reconcile_threshold_minutes: 30,
            clinic_utc_offset_minutes: -240,
            same_day_lead_minutes: 60,
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

/// Canned PostgREST row payloads matching the tables the cells read.
pub struct MockPostgrestRows;

impl MockPostgrestRows {
    pub fn block_row(
        block_id: Uuid,
        doctor_id: Uuid,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        is_available: bool,
        appointment_id: Option<Uuid>,
    ) -> Value {
        json!({
            "id": block_id,
            "doctor_id": doctor_id,
            "start_time": start_time.to_rfc3339(),
            "end_time": end_time.to_rfc3339(),
            "is_available": is_available,
            "disabled_reason": null,
            "appointment_id": appointment_id,
            "created_at": Utc::now().to_rfc3339()
        })
    }

    pub fn appointment_row(
        appointment_id: Uuid,
        patient_id: Uuid,
        doctor_id: Uuid,
        block_id: Uuid,
        status: &str,
        scheduled_start_time: DateTime<Utc>,
    ) -> Value {
        json!({
            "id": appointment_id,
            "patient_id": patient_id,
            "doctor_id": doctor_id,
            "block_id": block_id,
            "status": status,
            "scheduled_start_time": scheduled_start_time.to_rfc3339(),
            "duration_minutes": 30,
            "notes": null,
            "created_at": Utc::now().to_rfc3339(),
            "updated_at": Utc::now().to_rfc3339()
        })
    }

    pub fn payment_session_response(appointment_id: Uuid) -> Value {
        json!({
            "redirect_url": format!("https://pay.example.com/session/{}", appointment_id),
            "token": format!("tok-{}", appointment_id.simple())
        })
    }

    pub fn payment_status_response(approved: bool, amount: f64) -> Value {
        json!({
            "approved": approved,
            "amount": amount
        })
    }
}
