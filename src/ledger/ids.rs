use chrono::{DateTime, FixedOffset, NaiveDate};
use uuid::Uuid;

pub const ATTENDANCE_PREFIX: &str = "ATT";
pub const LEAVE_PREFIX: &str = "LV";

/// `<PREFIX>-<YYYYMMDDHHMMSS>-<4 hex chars>`, timestamp in the civil timezone.
///
/// Ids sort by creation second. Uniqueness rests on the random suffix
/// (65536 values per second), which is ample for a handful of writes per
/// minute but is not a guarantee.
pub fn new_id(prefix: &str, now: DateTime<FixedOffset>) -> String {
    let suffix: String = Uuid::new_v4()
        .to_string()
        .chars()
        .take(4)
        .collect::<String>()
        .to_uppercase();
    format!(
        "{}-{}-{}",
        prefix.to_uppercase(),
        now.format("%Y%m%d%H%M%S"),
        suffix
    )
}

/// Per-day record id derived from a leave request id.
pub fn leave_day_id(leave_id: &str, date: NaiveDate) -> String {
    format!("{}-{}", leave_id, date.format("%Y%m%d"))
}
