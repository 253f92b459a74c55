// libs/availability-cell/src/services/slots.rs
use std::sync::Arc;

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Utc};
use reqwest::Method;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{AvailabilityBlock, AvailableSlot, ScheduleError};
use crate::services::{civil_to_utc, clinic_offset};

/// Derives patient-facing bookable slots from the block store.
pub struct SlotQueryService {
    supabase: Arc<SupabaseClient>,
    clinic_tz: FixedOffset,
    lead_minutes: i64,
}

impl SlotQueryService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: Arc::new(SupabaseClient::new(config)),
            clinic_tz: clinic_offset(config),
            lead_minutes: config.same_day_lead_minutes,
        }
    }

    /// Ascending bookable slots for a doctor on a civil date.
    ///
    /// Only blocks that are available and unclaimed qualify. When the date
    /// is today in the clinic timezone, slots starting within the lead
    /// window are excluded; future dates get no time-of-day filtering.
    pub async fn get_available_slots(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
        auth_token: &str,
    ) -> Result<Vec<AvailableSlot>, ScheduleError> {
        debug!("Calculating available slots for doctor {} on {}", doctor_id, date);

        let day_start = civil_to_utc(date.and_hms_opt(0, 0, 0).unwrap(), self.clinic_tz);
        let day_end = day_start + Duration::days(1);

        let path = format!(
            "/rest/v1/availability_blocks?doctor_id=eq.{}&is_available=eq.true&appointment_id=is.null&start_time=gte.{}&start_time=lt.{}&order=start_time.asc",
            doctor_id,
            urlencoding::encode(&day_start.to_rfc3339()),
            urlencoding::encode(&day_end.to_rfc3339())
        );

        let rows: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| ScheduleError::DatabaseError(e.to_string()))?;

        let blocks: Vec<AvailabilityBlock> = rows
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<AvailabilityBlock>, _>>()
            .map_err(|e| ScheduleError::DatabaseError(format!("Failed to parse blocks: {}", e)))?;

        let cutoff = Self::same_day_cutoff(date, Utc::now(), self.clinic_tz, self.lead_minutes);

        let slots = blocks
            .into_iter()
            .filter(|block| cutoff.map_or(true, |earliest| block.start_time >= earliest))
            .map(|block| AvailableSlot {
                block_id: block.id,
                start_time: block.start_time,
                end_time: block.end_time,
                duration_minutes: block.duration_minutes(),
            })
            .collect::<Vec<_>>();

        debug!("Found {} available slots", slots.len());
        Ok(slots)
    }

    /// Earliest bookable instant for `date`, or `None` when the date is not
    /// today in the clinic timezone. Pure so the rule is testable with a
    /// pinned clock.
    pub fn same_day_cutoff(
        date: NaiveDate,
        now: DateTime<Utc>,
        clinic_tz: FixedOffset,
        lead_minutes: i64,
    ) -> Option<DateTime<Utc>> {
        let today = now.with_timezone(&clinic_tz).date_naive();
        if date == today {
            Some(now + Duration::minutes(lead_minutes))
        } else {
            None
        }
    }
}
