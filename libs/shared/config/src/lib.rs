use std::env;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub payment_gateway_url: String,
    pub payment_gateway_api_key: String,
    pub payment_timeout_seconds: u64,
    pub payment_reconcile_threshold_minutes: i64,
    /// Fixed civil timezone for "today" and lead-time checks, as an offset
    /// from UTC in minutes. One value for the whole clinic, not per doctor.
    pub clinic_utc_offset_minutes: i32,
    pub same_day_lead_minutes: i64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            supabase_url: env::var("SUPABASE_URL")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_URL not set, using empty value");
                    String::new()
                }),
            supabase_anon_key: env::var("SUPABASE_ANON_PUBLIC_KEY")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_ANON_PUBLIC_KEY not set, using empty value");
                    String::new()
                }),
            payment_gateway_url: env::var("PAYMENT_GATEWAY_URL")
                .unwrap_or_else(|_| {
                    warn!("PAYMENT_GATEWAY_URL not set, using empty value");
                    String::new()
                }),
            payment_gateway_api_key: env::var("PAYMENT_GATEWAY_API_KEY")
                .unwrap_or_else(|_| {
                    warn!("PAYMENT_GATEWAY_API_KEY not set, using empty value");
                    String::new()
                }),
            payment_timeout_seconds: parse_env_or("PAYMENT_TIMEOUT_SECONDS", 10),
            payment_reconcile_threshold_minutes: parse_env_or(
                "PAYMENT_RECONCILE_THRESHOLD_MINUTES",
                30,
            ),
            clinic_utc_offset_minutes: parse_env_or("CLINIC_UTC_OFFSET_MINUTES", -240),
            same_day_lead_minutes: parse_env_or("SAME_DAY_LEAD_MINUTES", 60),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.supabase_url.is_empty() && !self.supabase_anon_key.is_empty()
    }

    pub fn is_payments_configured(&self) -> bool {
        !self.payment_gateway_url.is_empty() && !self.payment_gateway_api_key.is_empty()
    }
}

fn parse_env_or<T>(name: &str, default: T) -> T
where
    T: std::str::FromStr + std::fmt::Display + Copy,
{
    match env::var(name) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("{} is not a valid number, using default {}", name, default);
            default
        }),
        Err(_) => default,
    }
}
