//! Interview slot search over an HR calendar: next open business-hour slot
//! (9am-5pm Mon-Fri, 1-hour granularity) within a bounded day horizon.

use chrono::{DateTime, Datelike, Duration, Utc};

use super::collaborators::Interview;

const FIRST_SLOT_HOUR: u32 = 9;
const LAST_SLOT_HOUR: u32 = 17;

/// Find the next open 1-hour slot for the given calendar, scanning up to
/// `horizon_days` ahead of `from`. Returns `None` when every slot in the
/// horizon conflicts; callers surface that as a scheduling failure rather
/// than silently doing nothing.
pub fn find_open_slot(
    booked: &[Interview],
    from: DateTime<Utc>,
    duration_minutes: u32,
    horizon_days: u64,
) -> Option<DateTime<Utc>> {
    for day_offset in 0..horizon_days as i64 {
        let day = (from + Duration::days(day_offset)).date_naive();

        // Weekends are outside business hours.
        if day.weekday().number_from_monday() > 5 {
            continue;
        }

        for hour in FIRST_SLOT_HOUR..LAST_SLOT_HOUR {
            let Some(naive) = day.and_hms_opt(hour, 0, 0) else {
                continue;
            };
            let slot = naive.and_utc();

            // Skip hours already behind us on the first day.
            if slot < from {
                continue;
            }

            if !conflicts(booked, slot, duration_minutes) {
                return Some(slot);
            }
        }
    }

    None
}

/// A slot conflicts when any interview still occupying the calendar starts
/// within `[slot - duration, slot + duration)`.
pub fn conflicts(booked: &[Interview], slot: DateTime<Utc>, duration_minutes: u32) -> bool {
    let duration = Duration::minutes(i64::from(duration_minutes));
    let window_start = slot - duration;
    let window_end = slot + duration;

    booked.iter().any(|interview| {
        interview.status.blocks_slot()
            && interview.scheduled_at >= window_start
            && interview.scheduled_at < window_end
    })
}
