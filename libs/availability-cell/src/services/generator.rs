// libs/availability-cell/src/services/generator.rs
use chrono::{Datelike, Duration, FixedOffset, NaiveDate};
use tracing::debug;

use super::civil_to_utc;
use crate::models::{AvailabilityBlock, GenerateBlocksRequest, PlannedBlock, ScheduleError};

/// Block durations the clinic supports, in minutes.
pub const ALLOWED_DURATIONS: [i32; 5] = [15, 20, 30, 45, 60];

/// Longest date range a single generation request may cover, in days.
pub const MAX_RANGE_DAYS: i64 = 90;

/// Expands a recurring weekly pattern into discrete block intervals.
///
/// Planning is pure: it validates the request, slices each selected day's
/// time window into consecutive intervals, and checks the candidates against
/// existing blocks. Persistence happens elsewhere.
pub struct BlockPlanner;

impl BlockPlanner {
    /// Validate the request and expand it into chronological candidates.
    ///
    /// `today` is the current civil date in the clinic timezone; the window
    /// times are interpreted in that same timezone and converted to UTC.
    pub fn plan(
        request: &GenerateBlocksRequest,
        today: NaiveDate,
        clinic_tz: FixedOffset,
    ) -> Result<Vec<PlannedBlock>, ScheduleError> {
        Self::validate(request, today)?;

        let step = Duration::minutes(request.duration_minutes as i64);
        let mut planned = Vec::new();

        let mut date = request.start_date;
        while date <= request.end_date {
            if Self::weekday_selected(date, &request.weekdays) {
                let day_end = date.and_time(request.end_time);
                let mut cursor = date.and_time(request.start_time);

                // Consecutive, non-overlapping intervals; a trailing partial
                // interval is not emitted.
                while cursor + step <= day_end {
                    planned.push(PlannedBlock {
                        start_time: civil_to_utc(cursor, clinic_tz),
                        end_time: civil_to_utc(cursor + step, clinic_tz),
                    });
                    cursor += step;
                }
            }
            date += Duration::days(1);
        }

        debug!(
            "Planned {} blocks between {} and {}",
            planned.len(),
            request.start_date,
            request.end_date
        );

        Ok(planned)
    }

    /// Returns the first candidate that overlaps an existing block, if any.
    /// Candidates are chronological, so this names the earliest collision.
    pub fn find_first_conflict(
        planned: &[PlannedBlock],
        existing: &[AvailabilityBlock],
    ) -> Option<PlannedBlock> {
        planned
            .iter()
            .find(|candidate| {
                existing.iter().any(|block| {
                    candidate.start_time < block.end_time && candidate.end_time > block.start_time
                })
            })
            .cloned()
    }

    fn validate(request: &GenerateBlocksRequest, today: NaiveDate) -> Result<(), ScheduleError> {
        if request.end_date < request.start_date {
            return Err(ScheduleError::InvalidDateRange(
                "end date is before start date".to_string(),
            ));
        }

        if request.start_date < today {
            return Err(ScheduleError::InvalidDateRange(
                "start date is in the past".to_string(),
            ));
        }

        if (request.end_date - request.start_date).num_days() > MAX_RANGE_DAYS {
            return Err(ScheduleError::InvalidDateRange(format!(
                "range exceeds {} days",
                MAX_RANGE_DAYS
            )));
        }

        if request.weekdays.is_empty() {
            return Err(ScheduleError::EmptyWeekdays);
        }

        if let Some(&bad) = request.weekdays.iter().find(|&&day| day > 6) {
            return Err(ScheduleError::InvalidWeekday(bad));
        }

        if request.end_time <= request.start_time {
            return Err(ScheduleError::InvalidTimeWindow(
                "end time must be after start time".to_string(),
            ));
        }

        if !ALLOWED_DURATIONS.contains(&request.duration_minutes) {
            return Err(ScheduleError::UnsupportedDuration(request.duration_minutes));
        }

        Ok(())
    }

    fn weekday_selected(date: NaiveDate, weekdays: &[u8]) -> bool {
        let day = date.weekday().num_days_from_sunday() as u8;
        weekdays.contains(&day)
    }
}
