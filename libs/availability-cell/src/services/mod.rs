pub mod blocks;
pub mod generator;
pub mod slots;

use chrono::{DateTime, Duration, FixedOffset, NaiveDateTime, Utc};
use tracing::warn;

use shared_config::AppConfig;

/// The clinic's fixed civil timezone, taken from configuration.
pub(crate) fn clinic_offset(config: &AppConfig) -> FixedOffset {
    FixedOffset::east_opt(config.clinic_utc_offset_minutes * 60).unwrap_or_else(|| {
        warn!(
            "CLINIC_UTC_OFFSET_MINUTES={} is out of range, falling back to UTC",
            config.clinic_utc_offset_minutes
        );
        FixedOffset::east_opt(0).unwrap()
    })
}

/// Interpret a clinic-local wall time as a UTC instant.
pub(crate) fn civil_to_utc(local: NaiveDateTime, clinic_tz: FixedOffset) -> DateTime<Utc> {
    (local - Duration::seconds(clinic_tz.local_minus_utc() as i64)).and_utc()
}
