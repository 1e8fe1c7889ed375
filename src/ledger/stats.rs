use chrono::{DateTime, Datelike, FixedOffset};
use serde::Serialize;
use utoipa::ToSchema;

use super::engine::AttendanceLedger;
use crate::model::attendance::{AttendanceRecord, Status};

/// Per-employee tallies for one calendar month. Derived, never stored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
#[schema(
    example = json!({
        "employee_code": "EMP-001",
        "year": 2026,
        "month": 1,
        "present": 14,
        "half_day": 2,
        "mini_half_day": 1,
        "leave": 2,
        "total_working_hours": 141.25
    })
)]
pub struct MonthlyStats {
    pub employee_code: String,
    pub year: i32,
    pub month: u32,
    pub present: u32,
    pub half_day: u32,
    pub mini_half_day: u32,
    pub leave: u32,
    pub total_working_hours: f64,
}

impl MonthlyStats {
    pub fn empty(employee_code: &str, year: i32, month: u32) -> Self {
        Self {
            employee_code: employee_code.to_string(),
            year,
            month,
            ..Self::default()
        }
    }

    pub fn days_recorded(&self) -> u32 {
        self.present + self.half_day + self.mini_half_day + self.leave
    }
}

pub fn tally(records: &[AttendanceRecord], employee_code: &str, year: i32, month: u32) -> MonthlyStats {
    let mut stats = MonthlyStats::empty(employee_code, year, month);

    for record in records.iter().filter(|r| {
        r.employee_code == employee_code && r.date.year() == year && r.date.month() == month
    }) {
        match record.status {
            Status::Present => stats.present += 1,
            Status::HalfDay => stats.half_day += 1,
            Status::MiniHalfDay => stats.mini_half_day += 1,
            Status::Leave => stats.leave += 1,
        }
        if record.check_out.is_some() {
            stats.total_working_hours += record.working_hours.unwrap_or(0.0);
        }
    }

    stats.total_working_hours = (stats.total_working_hours * 100.0).round() / 100.0;
    stats
}

impl AttendanceLedger {
    /// Tallies `now`'s calendar month for one employee.
    ///
    /// A dashboard read: store failures degrade to zeroed stats.
    pub async fn compute_monthly_stats(
        &self,
        employee_code: &str,
        now: DateTime<FixedOffset>,
    ) -> MonthlyStats {
        let employee_code = employee_code.trim();
        let (year, month) = (now.year(), now.month());
        match self.snapshot().await {
            Ok(records) => tally(&records, employee_code, year, month),
            Err(e) => {
                tracing::warn!(error = %e, employee_code, "Monthly stats unavailable, returning zeroes");
                MonthlyStats::empty(employee_code, year, month)
            }
        }
    }
}
