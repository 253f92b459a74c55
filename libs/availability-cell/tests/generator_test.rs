use assert_matches::assert_matches;
use chrono::{FixedOffset, NaiveDate, NaiveTime, Utc};
use uuid::Uuid;

use availability_cell::models::{
    AvailabilityBlock, GenerateBlocksRequest, PlannedBlock, ScheduleError,
};
use availability_cell::services::generator::{BlockPlanner, ALLOWED_DURATIONS};

fn clinic_tz() -> FixedOffset {
    FixedOffset::west_opt(4 * 3600).unwrap()
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn time(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

fn weekday_request() -> GenerateBlocksRequest {
    GenerateBlocksRequest {
        doctor_id: Uuid::new_v4(),
        start_date: date(2025, 3, 3),
        end_date: date(2025, 3, 7),
        weekdays: vec![1, 2, 3, 4, 5],
        start_time: time(9, 0),
        end_time: time(12, 0),
        duration_minutes: 30,
    }
}

fn existing_block(doctor_id: Uuid, planned: &PlannedBlock) -> AvailabilityBlock {
    AvailabilityBlock {
        id: Uuid::new_v4(),
        doctor_id,
        start_time: planned.start_time,
        end_time: planned.end_time,
        is_available: true,
        disabled_reason: None,
        appointment_id: None,
        created_at: Utc::now(),
    }
}

#[test]
fn weekday_pattern_expands_to_expected_blocks() {
    // Mon-Fri, 09:00-12:00, 30-minute blocks over one work week.
    let request = weekday_request();
    let planned = BlockPlanner::plan(&request, date(2025, 3, 1), clinic_tz()).unwrap();

    assert_eq!(planned.len(), 30); // 5 days x 6 blocks

    for block in &planned {
        assert_eq!((block.end_time - block.start_time).num_minutes(), 30);
    }

    // Chronological and non-overlapping.
    for pair in planned.windows(2) {
        assert!(pair[0].end_time <= pair[1].start_time);
    }
}

#[test]
fn unselected_weekdays_are_skipped() {
    let mut request = weekday_request();
    request.weekdays = vec![1]; // Monday only
    let planned = BlockPlanner::plan(&request, date(2025, 3, 1), clinic_tz()).unwrap();

    assert_eq!(planned.len(), 6);
    let monday_start = planned[0].start_time.with_timezone(&clinic_tz());
    assert_eq!(monday_start.date_naive(), date(2025, 3, 3));
}

#[test]
fn trailing_partial_interval_is_not_emitted() {
    let mut request = weekday_request();
    request.weekdays = vec![1];
    request.end_time = time(9, 50);
    let planned = BlockPlanner::plan(&request, date(2025, 3, 1), clinic_tz()).unwrap();

    // 09:00-09:50 fits a single 30-minute block.
    assert_eq!(planned.len(), 1);
}

#[test]
fn window_times_are_interpreted_in_clinic_time() {
    let mut request = weekday_request();
    request.weekdays = vec![1];
    let planned = BlockPlanner::plan(&request, date(2025, 3, 1), clinic_tz()).unwrap();

    // 09:00 at UTC-4 is 13:00 UTC.
    assert_eq!(
        planned[0].start_time,
        date(2025, 3, 3).and_hms_opt(13, 0, 0).unwrap().and_utc()
    );
}

#[test]
fn rejects_inverted_date_range() {
    let mut request = weekday_request();
    request.end_date = date(2025, 3, 1);
    let result = BlockPlanner::plan(&request, date(2025, 3, 1), clinic_tz());
    assert_matches!(result, Err(ScheduleError::InvalidDateRange(_)));
}

#[test]
fn rejects_start_date_in_the_past() {
    let request = weekday_request();
    let result = BlockPlanner::plan(&request, date(2025, 3, 4), clinic_tz());
    assert_matches!(result, Err(ScheduleError::InvalidDateRange(_)));
}

#[test]
fn rejects_range_longer_than_ninety_days() {
    let mut request = weekday_request();
    request.end_date = date(2025, 6, 15);
    let result = BlockPlanner::plan(&request, date(2025, 3, 1), clinic_tz());
    assert_matches!(result, Err(ScheduleError::InvalidDateRange(_)));
}

#[test]
fn rejects_inverted_time_window() {
    let mut request = weekday_request();
    request.start_time = time(12, 0);
    request.end_time = time(9, 0);
    let result = BlockPlanner::plan(&request, date(2025, 3, 1), clinic_tz());
    assert_matches!(result, Err(ScheduleError::InvalidTimeWindow(_)));
}

#[test]
fn rejects_unsupported_duration() {
    let mut request = weekday_request();
    request.duration_minutes = 25;
    assert!(!ALLOWED_DURATIONS.contains(&25));

    let result = BlockPlanner::plan(&request, date(2025, 3, 1), clinic_tz());
    assert_matches!(result, Err(ScheduleError::UnsupportedDuration(25)));
}

#[test]
fn rejects_empty_weekday_set() {
    let mut request = weekday_request();
    request.weekdays = vec![];
    let result = BlockPlanner::plan(&request, date(2025, 3, 1), clinic_tz());
    assert_matches!(result, Err(ScheduleError::EmptyWeekdays));
}

#[test]
fn rejects_weekday_out_of_range() {
    let mut request = weekday_request();
    request.weekdays = vec![1, 7];
    let result = BlockPlanner::plan(&request, date(2025, 3, 1), clinic_tz());
    assert_matches!(result, Err(ScheduleError::InvalidWeekday(7)));
}

#[test]
fn first_conflict_names_the_earliest_collision() {
    let request = weekday_request();
    let planned = BlockPlanner::plan(&request, date(2025, 3, 1), clinic_tz()).unwrap();

    // Existing blocks colliding with the 4th and 2nd candidates.
    let existing = vec![
        existing_block(request.doctor_id, &planned[3]),
        existing_block(request.doctor_id, &planned[1]),
    ];

    let collision = BlockPlanner::find_first_conflict(&planned, &existing).unwrap();
    assert_eq!(collision, planned[1]);
}

#[test]
fn no_conflict_when_existing_blocks_do_not_overlap() {
    let request = weekday_request();
    let planned = BlockPlanner::plan(&request, date(2025, 3, 1), clinic_tz()).unwrap();

    // A block ending exactly where the first candidate starts does not
    // overlap a half-open interval.
    let adjacent = AvailabilityBlock {
        id: Uuid::new_v4(),
        doctor_id: request.doctor_id,
        start_time: planned[0].start_time - chrono::Duration::minutes(30),
        end_time: planned[0].start_time,
        is_available: true,
        disabled_reason: None,
        appointment_id: None,
        created_at: Utc::now(),
    };

    assert!(BlockPlanner::find_first_conflict(&planned, &[adjacent]).is_none());
}
