use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Utc};

use availability_cell::services::slots::SlotQueryService;

fn clinic_tz() -> FixedOffset {
    FixedOffset::west_opt(4 * 3600).unwrap()
}

fn instant(raw: &str) -> DateTime<Utc> {
    raw.parse().unwrap()
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn future_date_has_no_cutoff() {
    let now = instant("2025-03-10T14:00:00Z");
    let cutoff = SlotQueryService::same_day_cutoff(date(2025, 3, 11), now, clinic_tz(), 60);
    assert!(cutoff.is_none());
}

#[test]
fn today_cutoff_is_now_plus_lead_time() {
    // 14:00 UTC is 10:00 clinic time on the same civil date.
    let now = instant("2025-03-10T14:00:00Z");
    let cutoff = SlotQueryService::same_day_cutoff(date(2025, 3, 10), now, clinic_tz(), 60);
    assert_eq!(cutoff, Some(now + Duration::minutes(60)));
}

#[test]
fn today_is_resolved_in_clinic_time_not_utc() {
    // 02:00 UTC on March 10 is still March 9 at UTC-4.
    let now = instant("2025-03-10T02:00:00Z");

    let cutoff = SlotQueryService::same_day_cutoff(date(2025, 3, 9), now, clinic_tz(), 60);
    assert_eq!(cutoff, Some(now + Duration::minutes(60)));

    // March 10 is tomorrow for the clinic, so no filtering applies.
    let cutoff = SlotQueryService::same_day_cutoff(date(2025, 3, 10), now, clinic_tz(), 60);
    assert!(cutoff.is_none());
}

#[test]
fn past_dates_are_not_filtered_as_today() {
    let now = instant("2025-03-10T14:00:00Z");
    let cutoff = SlotQueryService::same_day_cutoff(date(2025, 3, 9), now, clinic_tz(), 60);
    assert!(cutoff.is_none());
}
