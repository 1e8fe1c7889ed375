use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

use crate::error::LedgerError;

/// Attendance status of one employee on one civil date.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    ToSchema,
)]
pub enum Status {
    #[strum(serialize = "Present")]
    #[serde(rename = "Present")]
    Present,
    #[strum(serialize = "Half Day")]
    #[serde(rename = "Half Day")]
    HalfDay,
    #[strum(serialize = "Mini Half Day")]
    #[serde(rename = "Mini Half Day")]
    MiniHalfDay,
    #[strum(serialize = "Leave")]
    #[serde(rename = "Leave")]
    Leave,
}

/// A time cell as it sits in the ledger.
///
/// Cells written by hand into the backing sheet are not guaranteed to parse,
/// so a malformed value is carried verbatim instead of failing the whole read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StoredTime {
    Valid(NaiveTime),
    Malformed(String),
}

pub const TIME_FORMAT: &str = "%H:%M:%S";

/// Parses `HH:MM:SS` (or `HH:MM`) into a civil time.
pub fn parse_civil_time(raw: &str) -> Result<NaiveTime, LedgerError> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, TIME_FORMAT)
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .map_err(|_| LedgerError::InvalidTimeFormat(raw.to_string()))
}

impl StoredTime {
    pub fn parse(raw: &str) -> Self {
        match parse_civil_time(raw) {
            Ok(t) => StoredTime::Valid(t),
            Err(_) => StoredTime::Malformed(raw.to_string()),
        }
    }

    pub fn time(&self) -> Result<NaiveTime, LedgerError> {
        match self {
            StoredTime::Valid(t) => Ok(*t),
            StoredTime::Malformed(raw) => Err(LedgerError::InvalidTimeFormat(raw.clone())),
        }
    }

    pub fn to_cell(&self) -> String {
        match self {
            StoredTime::Valid(t) => t.format(TIME_FORMAT).to_string(),
            StoredTime::Malformed(raw) => raw.clone(),
        }
    }
}

impl From<NaiveTime> for StoredTime {
    fn from(t: NaiveTime) -> Self {
        StoredTime::Valid(t)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(
    example = json!({
        "id": "ATT-20260112091500-4F2A",
        "employee_code": "EMP-001",
        "employee_name": "John Doe",
        "designation": "Engineer",
        "date": "2026-01-12",
        "status": "Present",
        "location": "Head office",
        "leave_reason": null,
        "check_in": "09:15:00",
        "check_out": "17:45:00",
        "working_hours": 8.5
    })
)]
pub struct AttendanceRecord {
    #[schema(example = "ATT-20260112091500-4F2A")]
    pub id: String,

    #[schema(example = "EMP-001")]
    pub employee_code: String,

    #[schema(example = "John Doe")]
    pub employee_name: String,

    #[schema(example = "Engineer")]
    pub designation: String,

    #[schema(example = "2026-01-12", value_type = String, format = "date")]
    pub date: NaiveDate,

    pub status: Status,

    #[schema(nullable = true)]
    pub location: Option<String>,

    #[schema(example = "Sick Leave: fever", nullable = true)]
    pub leave_reason: Option<String>,

    #[schema(example = "09:15:00", value_type = Option<String>)]
    pub check_in: Option<StoredTime>,

    #[schema(example = "17:45:00", value_type = Option<String>)]
    pub check_out: Option<StoredTime>,

    #[schema(example = 8.5, nullable = true)]
    pub working_hours: Option<f64>,
}

/// Where a single (employee, date) slot sits in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DayState {
    NotCheckedIn,
    CheckedIn,
    CheckedOut,
    OnLeave,
}

impl AttendanceRecord {
    pub fn is_for(&self, employee_code: &str, date: NaiveDate) -> bool {
        self.employee_code == employee_code && self.date == date
    }

    pub fn is_leave(&self) -> bool {
        self.status == Status::Leave
    }

    pub fn state(&self) -> DayState {
        if self.is_leave() {
            DayState::OnLeave
        } else if self.check_out.is_some() {
            DayState::CheckedOut
        } else {
            DayState::CheckedIn
        }
    }

    /// Check-in as a civil date-time on the record's date.
    pub fn check_in_at(&self) -> Result<NaiveDateTime, LedgerError> {
        let time = self
            .check_in
            .as_ref()
            .ok_or_else(|| LedgerError::InvalidTimeFormat(String::new()))?
            .time()?;
        Ok(self.date.and_time(time))
    }
}

impl DayState {
    pub fn of(record: Option<&AttendanceRecord>) -> Self {
        record.map_or(DayState::NotCheckedIn, AttendanceRecord::state)
    }
}
