use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use chrono::NaiveDate;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("attendance already marked for {employee_code} on {date}")]
    AlreadyMarked {
        employee_code: String,
        date: NaiveDate,
    },

    #[error("no check-in found for {employee_code} on {date}")]
    NoCheckInFound {
        employee_code: String,
        date: NaiveDate,
    },

    #[error("{employee_code} already checked out on {date}")]
    AlreadyCheckedOut {
        employee_code: String,
        date: NaiveDate,
    },

    #[error("check-out at {check_out} is before check-in at {check_in}")]
    CheckOutBeforeCheckIn {
        check_in: chrono::NaiveDateTime,
        check_out: chrono::NaiveDateTime,
    },

    #[error("leave conflicts with existing records on {}", join_dates(.dates))]
    LeaveConflict {
        employee_code: String,
        dates: Vec<NaiveDate>,
    },

    #[error("start date {start} is after end date {end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    #[error("no working days between {start} and {end}")]
    NoWorkingDays { start: NaiveDate, end: NaiveDate },

    #[error("a reason is required for leave")]
    MissingLeaveReason,

    #[error("leave spans {days} days, at most {max} allowed")]
    LeaveSpanTooLong { days: i64, max: u32 },

    #[error("{field} is longer than {max} characters")]
    TextTooLong { field: &'static str, max: usize },

    #[error("invalid time format: {0:?}")]
    InvalidTimeFormat(String),

    #[error("unknown employee {0}")]
    UnknownEmployee(String),

    #[error("ledger table rejected: {0}")]
    Schema(String),

    #[error("ledger store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("invalid or expired session token")]
    InvalidOrExpiredToken,
}

fn join_dates(dates: &[NaiveDate]) -> String {
    dates
        .iter()
        .map(NaiveDate::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl LedgerError {
    /// Stable machine-readable kind for API clients.
    pub fn kind(&self) -> &'static str {
        match self {
            LedgerError::AlreadyMarked { .. } => "already_marked",
            LedgerError::NoCheckInFound { .. } => "no_check_in_found",
            LedgerError::AlreadyCheckedOut { .. } => "already_checked_out",
            LedgerError::CheckOutBeforeCheckIn { .. } => "check_out_before_check_in",
            LedgerError::LeaveConflict { .. } => "leave_conflict",
            LedgerError::InvalidDateRange { .. } => "invalid_date_range",
            LedgerError::NoWorkingDays { .. } => "no_working_days",
            LedgerError::MissingLeaveReason => "missing_leave_reason",
            LedgerError::LeaveSpanTooLong { .. } => "leave_span_too_long",
            LedgerError::TextTooLong { .. } => "text_too_long",
            LedgerError::InvalidTimeFormat(_) => "invalid_time_format",
            LedgerError::UnknownEmployee(_) => "unknown_employee",
            LedgerError::Schema(_) => "schema",
            LedgerError::StoreUnavailable(_) => "store_unavailable",
            LedgerError::InvalidOrExpiredToken => "invalid_or_expired_token",
        }
    }
}

impl From<sqlx::Error> for LedgerError {
    fn from(e: sqlx::Error) -> Self {
        LedgerError::StoreUnavailable(e.to_string())
    }
}

impl ResponseError for LedgerError {
    fn status_code(&self) -> StatusCode {
        match self {
            LedgerError::AlreadyMarked { .. }
            | LedgerError::AlreadyCheckedOut { .. }
            | LedgerError::LeaveConflict { .. } => StatusCode::CONFLICT,
            LedgerError::NoCheckInFound { .. }
            | LedgerError::CheckOutBeforeCheckIn { .. }
            | LedgerError::InvalidDateRange { .. }
            | LedgerError::NoWorkingDays { .. }
            | LedgerError::MissingLeaveReason
            | LedgerError::LeaveSpanTooLong { .. }
            | LedgerError::TextTooLong { .. }
            | LedgerError::InvalidTimeFormat(_) => StatusCode::BAD_REQUEST,
            LedgerError::UnknownEmployee(_) => StatusCode::NOT_FOUND,
            LedgerError::InvalidOrExpiredToken => StatusCode::UNAUTHORIZED,
            LedgerError::Schema(_) => StatusCode::INTERNAL_SERVER_ERROR,
            LedgerError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({
            "message": self.to_string(),
            "error": self.kind(),
        }))
    }
}
