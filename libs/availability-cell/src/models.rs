// libs/availability-cell/src/models.rs
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ==============================================================================
// CORE AVAILABILITY MODELS
// ==============================================================================

/// A discrete interval of a doctor's bookable time. Blocks never overlap for
/// the same doctor, and a block holds at most one active appointment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityBlock {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub is_available: bool,
    pub disabled_reason: Option<String>,
    pub appointment_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl AvailabilityBlock {
    /// A block carrying an appointment id is claimed by a non-cancelled
    /// appointment; cancellation clears the reference.
    pub fn is_claimed(&self) -> bool {
        self.appointment_id.is_some()
    }

    pub fn is_manually_disabled(&self) -> bool {
        !self.is_available && self.appointment_id.is_none()
    }

    pub fn duration_minutes(&self) -> i64 {
        (self.end_time - self.start_time).num_minutes()
    }
}

/// A planned block that has not been persisted yet.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedBlock {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateBlocksRequest {
    pub doctor_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Days of week to generate for: 0 = Sunday through 6 = Saturday.
    pub weekdays: Vec<u8>,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub duration_minutes: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateBlocksResponse {
    pub blocks_generated: usize,
    pub range_used: DateRange,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DateRange {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BlockQueryParams {
    pub doctor_id: Uuid,
    pub date: Option<NaiveDate>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

/// One civil date worth of blocks, with per-date counts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayBlockSummary {
    pub date: NaiveDate,
    pub total: usize,
    pub available: usize,
    pub reserved: usize,
    pub disabled: usize,
    pub blocks: Vec<AvailabilityBlock>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DisableBlockRequest {
    pub reason: String,
}

/// Which blocks a bulk delete targets. Exactly one mode per request; the
/// tagged representation makes a request without a criterion unrepresentable.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum BlockSelection {
    Ids { ids: Vec<Uuid> },
    SingleDate { date: NaiveDate },
    DateRange { from: NaiveDate, to: NaiveDate },
    AvailableInRange { from: NaiveDate, to: NaiveDate },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkDeleteRequest {
    pub doctor_id: Uuid,
    pub selection: BlockSelection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkDeleteResponse {
    pub deleted_count: usize,
    /// Blocks matching the selection but holding an active appointment are
    /// skipped, not errored.
    pub skipped_count: usize,
}

// ==============================================================================
// SLOT MODELS
// ==============================================================================

/// A block exposed to patients as a bookable candidate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailableSlot {
    pub block_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SlotQueryParams {
    pub doctor_id: Uuid,
    pub date: NaiveDate,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, thiserror::Error)]
pub enum ScheduleError {
    #[error("Invalid date range: {0}")]
    InvalidDateRange(String),

    #[error("Invalid time window: {0}")]
    InvalidTimeWindow(String),

    #[error("Unsupported block duration: {0} minutes")]
    UnsupportedDuration(i32),

    #[error("At least one weekday must be selected")]
    EmptyWeekdays,

    #[error("Weekday out of range: {0}")]
    InvalidWeekday(u8),

    #[error("Generation overlaps an existing block from {start} to {end}")]
    BlockConflict {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    #[error("Block not found")]
    BlockNotFound,

    #[error("Block holds an active appointment")]
    BlockProtected,

    #[error("Bulk delete selection is empty")]
    EmptySelection,

    #[error("Database error: {0}")]
    DatabaseError(String),
}
