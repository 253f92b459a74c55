// libs/availability-cell/src/services/blocks.rs
use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Utc};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{
    AvailabilityBlock, BlockQueryParams, BlockSelection, BulkDeleteRequest, BulkDeleteResponse,
    DateRange, DayBlockSummary, GenerateBlocksRequest, GenerateBlocksResponse, ScheduleError,
};
use crate::services::generator::BlockPlanner;
use crate::services::{civil_to_utc, clinic_offset};

/// Persistence layer for availability blocks: bulk generation, filtered
/// range queries, enable/disable toggles, and guarded bulk deletion.
pub struct BlockScheduleService {
    supabase: Arc<SupabaseClient>,
    clinic_tz: FixedOffset,
}

impl BlockScheduleService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: Arc::new(SupabaseClient::new(config)),
            clinic_tz: clinic_offset(config),
        }
    }

    /// Generate blocks from a recurring weekly pattern.
    ///
    /// The whole request is rejected on the first overlap with an existing
    /// block; on success every candidate is persisted in one bulk insert so
    /// no partial range is ever committed.
    pub async fn generate_blocks(
        &self,
        request: GenerateBlocksRequest,
        auth_token: &str,
    ) -> Result<GenerateBlocksResponse, ScheduleError> {
        debug!(
            "Generating blocks for doctor {} from {} to {}",
            request.doctor_id, request.start_date, request.end_date
        );

        let today = Utc::now().with_timezone(&self.clinic_tz).date_naive();
        let planned = BlockPlanner::plan(&request, today, self.clinic_tz)?;

        if planned.is_empty() {
            return Ok(GenerateBlocksResponse {
                blocks_generated: 0,
                range_used: DateRange {
                    start_date: request.start_date,
                    end_date: request.end_date,
                },
            });
        }

        let existing = self
            .blocks_in_range(
                request.doctor_id,
                request.start_date,
                request.end_date,
                auth_token,
            )
            .await?;

        if let Some(collision) = BlockPlanner::find_first_conflict(&planned, &existing) {
            warn!(
                "Generation conflict for doctor {}: candidate {} - {} overlaps an existing block",
                request.doctor_id, collision.start_time, collision.end_time
            );
            return Err(ScheduleError::BlockConflict {
                start: collision.start_time,
                end: collision.end_time,
            });
        }

        let now = Utc::now();
        let rows: Vec<Value> = planned
            .iter()
            .map(|block| {
                json!({
                    "doctor_id": request.doctor_id,
                    "start_time": block.start_time.to_rfc3339(),
                    "end_time": block.end_time.to_rfc3339(),
                    "is_available": true,
                    "disabled_reason": null,
                    "appointment_id": null,
                    "created_at": now.to_rfc3339()
                })
            })
            .collect();

        let inserted: Vec<Value> = self
            .supabase
            .request_returning(
                Method::POST,
                "/rest/v1/availability_blocks",
                Some(auth_token),
                Some(Value::Array(rows)),
            )
            .await
            .map_err(|e| ScheduleError::DatabaseError(e.to_string()))?;

        info!(
            "Generated {} blocks for doctor {}",
            inserted.len(),
            request.doctor_id
        );

        Ok(GenerateBlocksResponse {
            blocks_generated: inserted.len(),
            range_used: DateRange {
                start_date: request.start_date,
                end_date: request.end_date,
            },
        })
    }

    /// Blocks for a doctor grouped per civil date, with per-date counts.
    pub async fn query_blocks(
        &self,
        params: BlockQueryParams,
        auth_token: &str,
    ) -> Result<Vec<DayBlockSummary>, ScheduleError> {
        debug!("Querying blocks for doctor {}", params.doctor_id);

        let mut path = format!(
            "/rest/v1/availability_blocks?doctor_id=eq.{}",
            params.doctor_id
        );

        // An exact date wins over an open-ended from/to pair.
        let (from, to) = if let Some(date) = params.date {
            (Some(date), Some(date))
        } else {
            (params.date_from, params.date_to)
        };

        if let (Some(from), Some(to)) = (from, to) {
            if to < from {
                return Err(ScheduleError::InvalidDateRange(
                    "date_to is before date_from".to_string(),
                ));
            }
        }

        if let Some(from) = from {
            let start = civil_to_utc(from.and_hms_opt(0, 0, 0).unwrap(), self.clinic_tz);
            path.push_str(&format!("&start_time=gte.{}", encode_instant(start)));
        }
        if let Some(to) = to {
            let end = civil_to_utc(
                (to + Duration::days(1)).and_hms_opt(0, 0, 0).unwrap(),
                self.clinic_tz,
            );
            path.push_str(&format!("&start_time=lt.{}", encode_instant(end)));
        }

        path.push_str("&order=start_time.asc");

        let rows: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| ScheduleError::DatabaseError(e.to_string()))?;

        let blocks = parse_blocks(rows)?;

        let mut grouped: BTreeMap<NaiveDate, Vec<AvailabilityBlock>> = BTreeMap::new();
        for block in blocks {
            let date = block.start_time.with_timezone(&self.clinic_tz).date_naive();
            grouped.entry(date).or_default().push(block);
        }

        let summaries = grouped
            .into_iter()
            .map(|(date, blocks)| {
                let available = blocks
                    .iter()
                    .filter(|b| b.is_available && !b.is_claimed())
                    .count();
                let reserved = blocks.iter().filter(|b| b.is_claimed()).count();
                let disabled = blocks.iter().filter(|b| b.is_manually_disabled()).count();

                DayBlockSummary {
                    date,
                    total: blocks.len(),
                    available,
                    reserved,
                    disabled,
                    blocks,
                }
            })
            .collect();

        Ok(summaries)
    }

    /// Re-open a block for booking. Enabling a free block never creates a
    /// conflict; a claimed block keeps its reservation.
    pub async fn enable_block(
        &self,
        block_id: Uuid,
        auth_token: &str,
    ) -> Result<AvailabilityBlock, ScheduleError> {
        debug!("Enabling block {}", block_id);

        let path = format!(
            "/rest/v1/availability_blocks?id=eq.{}&appointment_id=is.null",
            block_id
        );
        let updated: Vec<Value> = self
            .supabase
            .request_returning(
                Method::PATCH,
                &path,
                Some(auth_token),
                Some(json!({
                    "is_available": true,
                    "disabled_reason": null
                })),
            )
            .await
            .map_err(|e| ScheduleError::DatabaseError(e.to_string()))?;

        if let Some(block) = first_block(updated) {
            return Ok(block);
        }

        // Nothing matched: unknown id, or the block holds an appointment.
        self.get_block(block_id, auth_token).await?;
        Err(ScheduleError::BlockProtected)
    }

    /// Close a block with a reason. Refused while the block holds an active
    /// appointment.
    pub async fn disable_block(
        &self,
        block_id: Uuid,
        reason: &str,
        auth_token: &str,
    ) -> Result<AvailabilityBlock, ScheduleError> {
        debug!("Disabling block {} ({})", block_id, reason);

        let current = self.get_block(block_id, auth_token).await?;
        if current.is_claimed() {
            return Err(ScheduleError::BlockProtected);
        }

        // The filter re-checks the claim server-side so a booking that lands
        // between the read and this write still wins.
        let path = format!(
            "/rest/v1/availability_blocks?id=eq.{}&appointment_id=is.null",
            block_id
        );
        let updated: Vec<Value> = self
            .supabase
            .request_returning(
                Method::PATCH,
                &path,
                Some(auth_token),
                Some(json!({
                    "is_available": false,
                    "disabled_reason": reason
                })),
            )
            .await
            .map_err(|e| ScheduleError::DatabaseError(e.to_string()))?;

        first_block(updated).ok_or(ScheduleError::BlockProtected)
    }

    /// Delete the selected blocks, skipping (and counting) any that hold an
    /// active appointment.
    pub async fn bulk_delete(
        &self,
        request: BulkDeleteRequest,
        auth_token: &str,
    ) -> Result<BulkDeleteResponse, ScheduleError> {
        let filters = self.selection_filters(&request)?;

        debug!(
            "Bulk deleting blocks for doctor {} ({:?})",
            request.doctor_id, request.selection
        );

        // Blocks matching the selection but claimed by an appointment are
        // reported as skipped rather than deleted.
        let skipped_path = format!("{}&appointment_id=not.is.null", filters);
        let skipped: Vec<Value> = self
            .supabase
            .request(Method::GET, &skipped_path, Some(auth_token), None)
            .await
            .map_err(|e| ScheduleError::DatabaseError(e.to_string()))?;

        let delete_path = format!("{}&appointment_id=is.null", filters);
        let deleted: Vec<Value> = self
            .supabase
            .request_returning(Method::DELETE, &delete_path, Some(auth_token), None)
            .await
            .map_err(|e| ScheduleError::DatabaseError(e.to_string()))?;

        info!(
            "Bulk delete for doctor {}: {} deleted, {} skipped",
            request.doctor_id,
            deleted.len(),
            skipped.len()
        );

        Ok(BulkDeleteResponse {
            deleted_count: deleted.len(),
            skipped_count: skipped.len(),
        })
    }

    pub async fn get_block(
        &self,
        block_id: Uuid,
        auth_token: &str,
    ) -> Result<AvailabilityBlock, ScheduleError> {
        let path = format!("/rest/v1/availability_blocks?id=eq.{}", block_id);
        let rows: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| ScheduleError::DatabaseError(e.to_string()))?;

        first_block(rows).ok_or(ScheduleError::BlockNotFound)
    }

    // Private helper methods

    async fn blocks_in_range(
        &self,
        doctor_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
        auth_token: &str,
    ) -> Result<Vec<AvailabilityBlock>, ScheduleError> {
        let (start, end) = self.range_bounds(from, to);
        let path = format!(
            "/rest/v1/availability_blocks?doctor_id=eq.{}&start_time=gte.{}&start_time=lt.{}&order=start_time.asc",
            doctor_id,
            encode_instant(start),
            encode_instant(end)
        );

        let rows: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| ScheduleError::DatabaseError(e.to_string()))?;

        parse_blocks(rows)
    }

    fn selection_filters(&self, request: &BulkDeleteRequest) -> Result<String, ScheduleError> {
        let base = format!(
            "/rest/v1/availability_blocks?doctor_id=eq.{}",
            request.doctor_id
        );

        match &request.selection {
            BlockSelection::Ids { ids } => {
                if ids.is_empty() {
                    return Err(ScheduleError::EmptySelection);
                }
                let list = ids
                    .iter()
                    .map(|id| id.to_string())
                    .collect::<Vec<_>>()
                    .join(",");
                Ok(format!("{}&id=in.({})", base, list))
            }
            BlockSelection::SingleDate { date } => {
                let (start, end) = self.range_bounds(*date, *date);
                Ok(format!(
                    "{}&start_time=gte.{}&start_time=lt.{}",
                    base,
                    encode_instant(start),
                    encode_instant(end)
                ))
            }
            BlockSelection::DateRange { from, to } => {
                if to < from {
                    return Err(ScheduleError::InvalidDateRange(
                        "to is before from".to_string(),
                    ));
                }
                let (start, end) = self.range_bounds(*from, *to);
                Ok(format!(
                    "{}&start_time=gte.{}&start_time=lt.{}",
                    base,
                    encode_instant(start),
                    encode_instant(end)
                ))
            }
            BlockSelection::AvailableInRange { from, to } => {
                if to < from {
                    return Err(ScheduleError::InvalidDateRange(
                        "to is before from".to_string(),
                    ));
                }
                let (start, end) = self.range_bounds(*from, *to);
                Ok(format!(
                    "{}&start_time=gte.{}&start_time=lt.{}&is_available=eq.true",
                    base,
                    encode_instant(start),
                    encode_instant(end)
                ))
            }
        }
    }

    /// UTC instants covering the inclusive civil date range in clinic time.
    fn range_bounds(&self, from: NaiveDate, to: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
        let start = civil_to_utc(from.and_hms_opt(0, 0, 0).unwrap(), self.clinic_tz);
        let end = civil_to_utc(
            (to + Duration::days(1)).and_hms_opt(0, 0, 0).unwrap(),
            self.clinic_tz,
        );
        (start, end)
    }
}

fn parse_blocks(rows: Vec<Value>) -> Result<Vec<AvailabilityBlock>, ScheduleError> {
    rows.into_iter()
        .map(serde_json::from_value)
        .collect::<Result<Vec<AvailabilityBlock>, _>>()
        .map_err(|e| ScheduleError::DatabaseError(format!("Failed to parse blocks: {}", e)))
}

fn first_block(rows: Vec<Value>) -> Option<AvailabilityBlock> {
    rows.into_iter()
        .next()
        .and_then(|row| serde_json::from_value(row).ok())
}

fn encode_instant(instant: DateTime<Utc>) -> String {
    urlencoding::encode(&instant.to_rfc3339()).into_owned()
}
