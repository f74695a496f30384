use chrono::{DateTime, Local, LocalResult, NaiveDate, NaiveDateTime, TimeZone, Utc};

pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

pub fn to_utc(ms: i64) -> DateTime<Utc> {
    // from_timestamp_millis returns Option<DateTime<Utc>>
    DateTime::<Utc>::from_timestamp_millis(ms)
        .unwrap_or_else(|| DateTime::<Utc>::from_timestamp_millis(0).expect("epoch is valid"))
}

fn resolve_local(naive: NaiveDateTime) -> DateTime<Local> {
    match Local.from_local_datetime(&naive) {
        LocalResult::Single(dt) => dt,
        LocalResult::Ambiguous(first, _second) => first,
        // Wall-clock time skipped by a DST gap; reading it as UTC keeps the
        // boundary on the right day.
        LocalResult::None => Local.from_utc_datetime(&naive),
    }
}

/// Millisecond timestamp of 00:00:00.000 local time on the given day.
pub fn local_day_start_ms(day: NaiveDate) -> i64 {
    let midnight = day.and_hms_opt(0, 0, 0).expect("midnight is a valid time");
    resolve_local(midnight).timestamp_millis()
}

/// Millisecond timestamp of 23:59:59.999 local time on the given day.
pub fn local_day_end_ms(day: NaiveDate) -> i64 {
    let last = day
        .and_hms_milli_opt(23, 59, 59, 999)
        .expect("end of day is a valid time");
    resolve_local(last).timestamp_millis()
}

/// Start of the current local day, for "submitted today" style counts.
pub fn start_of_today_ms() -> i64 {
    local_day_start_ms(Local::now().date_naive())
}
