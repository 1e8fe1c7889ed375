use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;

use super::{LedgerStore, Row, TableBackend};
use crate::error::LedgerError;
use crate::model::attendance::{AttendanceRecord, Status, StoredTime};

pub const COL_ID: &str = "Attendance ID";
pub const COL_NAME: &str = "Employee Name";
pub const COL_CODE: &str = "Employee Code";
pub const COL_DESIGNATION: &str = "Designation";
pub const COL_DATE: &str = "Date";
pub const COL_STATUS: &str = "Status";
pub const COL_LOCATION: &str = "Location Link";
pub const COL_LEAVE_REASON: &str = "Leave Reason";
pub const COL_CHECK_IN: &str = "Check-in Time";
pub const COL_CHECK_OUT: &str = "Check-out Time";
pub const COL_WORKING_HOURS: &str = "Working Hours";

pub const LEDGER_COLUMNS: [&str; 11] = [
    COL_ID,
    COL_NAME,
    COL_CODE,
    COL_DESIGNATION,
    COL_DATE,
    COL_STATUS,
    COL_LOCATION,
    COL_LEAVE_REASON,
    COL_CHECK_IN,
    COL_CHECK_OUT,
    COL_WORKING_HOURS,
];

pub const DATE_FORMAT: &str = "%d-%m-%Y";

/// A row whose every cell is blank; sheets accumulate these after manual edits.
pub fn is_blank(row: &Row) -> bool {
    row.values().all(|v| v.trim().is_empty())
}

/// Rejects rows whose column set differs from `expected`.
pub fn check_columns(row: &Row, expected: &[&str]) -> Result<(), LedgerError> {
    if let Some(unknown) = row.keys().find(|k| !expected.contains(&k.as_str())) {
        return Err(LedgerError::Schema(format!("unknown column {unknown:?}")));
    }
    if let Some(missing) = expected.iter().find(|c| !row.contains_key(**c)) {
        return Err(LedgerError::Schema(format!("missing column {missing:?}")));
    }
    Ok(())
}

fn optional(row: &Row, col: &str) -> Option<String> {
    row.get(col)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn required(row: &Row, col: &str) -> Result<String, LedgerError> {
    optional(row, col).ok_or_else(|| LedgerError::Schema(format!("empty {col:?} cell")))
}

pub fn decode_record(row: &Row) -> Result<AttendanceRecord, LedgerError> {
    check_columns(row, &LEDGER_COLUMNS)?;

    let raw_date = required(row, COL_DATE)?;
    let date = NaiveDate::parse_from_str(&raw_date, DATE_FORMAT)
        .map_err(|_| LedgerError::Schema(format!("bad date {raw_date:?}")))?;

    let raw_status = required(row, COL_STATUS)?;
    let status = Status::from_str(&raw_status)
        .map_err(|_| LedgerError::Schema(format!("unknown status {raw_status:?}")))?;

    let working_hours = match optional(row, COL_WORKING_HOURS) {
        Some(raw) => Some(
            raw.parse::<f64>()
                .map_err(|_| LedgerError::Schema(format!("bad working hours {raw:?}")))?,
        ),
        None => None,
    };

    Ok(AttendanceRecord {
        id: required(row, COL_ID)?,
        employee_code: required(row, COL_CODE)?,
        employee_name: optional(row, COL_NAME).unwrap_or_default(),
        designation: optional(row, COL_DESIGNATION).unwrap_or_default(),
        date,
        status,
        location: optional(row, COL_LOCATION),
        leave_reason: optional(row, COL_LEAVE_REASON),
        check_in: optional(row, COL_CHECK_IN).map(|v| StoredTime::parse(&v)),
        check_out: optional(row, COL_CHECK_OUT).map(|v| StoredTime::parse(&v)),
        working_hours,
    })
}

pub fn encode_record(record: &AttendanceRecord) -> Row {
    let cells = [
        record.id.clone(),
        record.employee_name.clone(),
        record.employee_code.clone(),
        record.designation.clone(),
        record.date.format(DATE_FORMAT).to_string(),
        record.status.to_string(),
        record.location.clone().unwrap_or_default(),
        record.leave_reason.clone().unwrap_or_default(),
        record.check_in.as_ref().map(StoredTime::to_cell).unwrap_or_default(),
        record.check_out.as_ref().map(StoredTime::to_cell).unwrap_or_default(),
        record
            .working_hours
            .map(|h| format!("{h:.2}"))
            .unwrap_or_default(),
    ];

    LEDGER_COLUMNS
        .iter()
        .map(|c| c.to_string())
        .zip(cells)
        .collect()
}

/// [`LedgerStore`] over one sheet of a [`TableBackend`].
pub struct SheetLedger {
    backend: Arc<dyn TableBackend>,
    table: String,
}

impl SheetLedger {
    pub fn new(backend: Arc<dyn TableBackend>, table: impl Into<String>) -> Self {
        Self {
            backend,
            table: table.into(),
        }
    }
}

#[async_trait]
impl LedgerStore for SheetLedger {
    async fn read_all(&self) -> Result<Vec<AttendanceRecord>, LedgerError> {
        let rows = self.backend.read_table(&self.table).await?;
        rows.iter()
            .filter(|r| !is_blank(r))
            .map(decode_record)
            .collect()
    }

    async fn replace_all(&self, records: Vec<AttendanceRecord>) -> Result<(), LedgerError> {
        let rows = records.iter().map(encode_record).collect();
        self.backend.replace_table(&self.table, rows).await
    }
}
