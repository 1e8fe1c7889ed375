use std::sync::Arc;

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, NaiveDateTime, Timelike};
use serde::Serialize;
use tracing::{debug, info, warn};
use utoipa::ToSchema;

use super::ids::{ATTENDANCE_PREFIX, LEAVE_PREFIX, leave_day_id, new_id};
use super::merge::dedupe_latest;
use super::rules::{StatusRules, WeekendPolicy};
use crate::directory::EmployeeDirectory;
use crate::error::LedgerError;
use crate::model::attendance::{AttendanceRecord, DayState, Status};
use crate::model::employee::Employee;
use crate::model::leave::LeaveType;
use crate::store::LedgerStore;

/// Longest leave range accepted, in calendar days.
pub const DEFAULT_MAX_LEAVE_DAYS: u32 = 60;

/// Free-text cells (location note, leave reason) must fit the sheet column.
pub const MAX_NOTE_CHARS: usize = 200;

/// Leave submission for a contiguous, inclusive date range.
#[derive(Debug, Clone)]
pub struct LeaveRequest {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub leave_type: LeaveType,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct CheckOutSummary {
    #[schema(example = "ATT-20260112090000-4F2A")]
    pub id: String,
    pub status: Status,
    #[schema(example = 7.5)]
    pub working_hours: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct LeaveReceipt {
    #[schema(example = "LV-20260105100000-AB12")]
    pub leave_id: String,
    #[schema(value_type = Vec<String>, example = json!(["2026-01-09", "2026-01-12"]))]
    pub dates: Vec<NaiveDate>,
}

/// Filter for [`AttendanceLedger::list_records`].
#[derive(Debug, Clone, Default)]
pub struct RecordFilter {
    pub employee_code: Option<String>,
    /// `(year, month)`
    pub month: Option<(i32, u32)>,
    pub page: u64,
    pub per_page: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub page: u64,
    pub per_page: u64,
    pub total: u64,
}

/// The attendance ledger.
///
/// Every mutation is one read-modify-write cycle over the whole table:
/// read a snapshot, check preconditions against it, change only the rows the
/// operation owns, fold duplicate ids, write everything back. Nothing here
/// assumes it is the only writer; a lost race shows up as the caller's write
/// being overwritten, and the caller retries.
pub struct AttendanceLedger {
    store: Arc<dyn LedgerStore>,
    directory: Arc<dyn EmployeeDirectory>,
    rules: StatusRules,
    weekend: WeekendPolicy,
    max_leave_days: u32,
}

/// Drops sub-second precision; the ledger stores whole seconds.
fn whole_seconds(now: DateTime<FixedOffset>) -> NaiveDateTime {
    let local = now.naive_local();
    local.with_nanosecond(0).unwrap_or(local)
}

fn round2(hours: f64) -> f64 {
    (hours * 100.0).round() / 100.0
}

fn check_note(field: &'static str, text: &str) -> Result<(), LedgerError> {
    if text.chars().count() > MAX_NOTE_CHARS {
        return Err(LedgerError::TextTooLong {
            field,
            max: MAX_NOTE_CHARS,
        });
    }
    Ok(())
}

impl AttendanceLedger {
    pub fn new(
        store: Arc<dyn LedgerStore>,
        directory: Arc<dyn EmployeeDirectory>,
        rules: StatusRules,
        weekend: WeekendPolicy,
    ) -> Self {
        Self {
            store,
            directory,
            rules,
            weekend,
            max_leave_days: DEFAULT_MAX_LEAVE_DAYS,
        }
    }

    pub fn with_max_leave_days(mut self, days: u32) -> Self {
        self.max_leave_days = days.max(1);
        self
    }

    pub fn directory(&self) -> &dyn EmployeeDirectory {
        self.directory.as_ref()
    }

    async fn employee(&self, employee_code: &str) -> Result<Employee, LedgerError> {
        self.directory
            .lookup_by_code(employee_code)
            .await?
            .ok_or_else(|| LedgerError::UnknownEmployee(employee_code.to_string()))
    }

    async fn read_modify_write<T, F>(&self, op: &'static str, mutate: F) -> Result<T, LedgerError>
    where
        F: FnOnce(&mut Vec<AttendanceRecord>) -> Result<T, LedgerError>,
    {
        let mut table = self.store.read_all().await?;
        let before = table.len();

        let out = mutate(&mut table)?;

        let merged = dedupe_latest(table);
        debug!(op, before, after = merged.len(), "Writing ledger");

        self.store.replace_all(merged).await.map_err(|e| {
            tracing::error!(error = %e, op, "Ledger write failed");
            e
        })?;

        Ok(out)
    }

    /// Marks `employee_code` present for `date`, deriving the status from the
    /// check-in time. Returns the new record id.
    pub async fn submit_check_in(
        &self,
        employee_code: &str,
        date: NaiveDate,
        now: DateTime<FixedOffset>,
        location: Option<String>,
    ) -> Result<String, LedgerError> {
        let employee_code = employee_code.trim();
        let location = location
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty());
        if let Some(note) = &location {
            check_note("location", note)?;
        }

        let employee = self.employee(employee_code).await?;
        let check_in = whole_seconds(now).time();
        let status = self.rules.derive(check_in, None);

        let record = AttendanceRecord {
            id: new_id(ATTENDANCE_PREFIX, now),
            employee_code: employee.employee_code,
            employee_name: employee.employee_name,
            designation: employee.designation,
            date,
            status,
            location,
            leave_reason: None,
            check_in: Some(check_in.into()),
            check_out: None,
            working_hours: None,
        };
        let id = record.id.clone();

        self.read_modify_write("check_in", |table| {
            if table.iter().any(|r| r.is_for(employee_code, date)) {
                return Err(LedgerError::AlreadyMarked {
                    employee_code: employee_code.to_string(),
                    date,
                });
            }
            table.push(record);
            Ok(())
        })
        .await?;

        info!(employee_code, %date, %status, id = %id, "Checked in");
        Ok(id)
    }

    /// Closes the open check-in for `(employee_code, date)`.
    ///
    /// Working hours and the final status come from the stored check-in and
    /// `now`. An unreadable stored check-in does not block the checkout: hours
    /// are reported as 0 and the status falls back to present.
    pub async fn submit_check_out(
        &self,
        employee_code: &str,
        date: NaiveDate,
        now: DateTime<FixedOffset>,
    ) -> Result<CheckOutSummary, LedgerError> {
        let employee_code = employee_code.trim();
        let rules = self.rules;
        let check_out_at = whole_seconds(now);

        let summary = self
            .read_modify_write("check_out", |table| {
                let record = table
                    .iter_mut()
                    .rev()
                    .find(|r| r.is_for(employee_code, date) && !r.is_leave())
                    .ok_or_else(|| LedgerError::NoCheckInFound {
                        employee_code: employee_code.to_string(),
                        date,
                    })?;

                if record.check_out.is_some() {
                    return Err(LedgerError::AlreadyCheckedOut {
                        employee_code: employee_code.to_string(),
                        date,
                    });
                }

                let (working_hours, status) = match record.check_in_at() {
                    Ok(check_in_at) => {
                        if check_out_at < check_in_at {
                            return Err(LedgerError::CheckOutBeforeCheckIn {
                                check_in: check_in_at,
                                check_out: check_out_at,
                            });
                        }
                        let secs = (check_out_at - check_in_at).num_seconds();
                        let status = rules.derive(check_in_at.time(), Some(check_out_at.time()));
                        (round2(secs as f64 / 3600.0), status)
                    }
                    Err(e) => {
                        warn!(error = %e, id = %record.id, "Stored check-in unreadable, recording 0 hours");
                        (0.0, Status::Present)
                    }
                };

                record.check_out = Some(check_out_at.time().into());
                record.working_hours = Some(working_hours);
                record.status = status;

                Ok(CheckOutSummary {
                    id: record.id.clone(),
                    status,
                    working_hours,
                })
            })
            .await?;

        info!(
            employee_code,
            %date,
            status = %summary.status,
            working_hours = summary.working_hours,
            "Checked out"
        );
        Ok(summary)
    }

    /// Records leave for every working day in the range, or nothing at all.
    pub async fn submit_leave(
        &self,
        employee_code: &str,
        request: &LeaveRequest,
        now: DateTime<FixedOffset>,
    ) -> Result<LeaveReceipt, LedgerError> {
        let employee_code = employee_code.trim();
        if request.start > request.end {
            return Err(LedgerError::InvalidDateRange {
                start: request.start,
                end: request.end,
            });
        }
        let span = (request.end - request.start).num_days() + 1;
        if span > i64::from(self.max_leave_days) {
            return Err(LedgerError::LeaveSpanTooLong {
                days: span,
                max: self.max_leave_days,
            });
        }
        let reason = request.reason.trim();
        if reason.is_empty() {
            return Err(LedgerError::MissingLeaveReason);
        }
        check_note("reason", reason)?;

        let days = self.weekend.working_days(request.start, request.end);
        if days.is_empty() {
            return Err(LedgerError::NoWorkingDays {
                start: request.start,
                end: request.end,
            });
        }

        let employee = self.employee(employee_code).await?;
        let leave_id = new_id(LEAVE_PREFIX, now);
        let reason = request.leave_type.reason_cell(reason);

        let rows: Vec<AttendanceRecord> = days
            .iter()
            .map(|day| AttendanceRecord {
                id: leave_day_id(&leave_id, *day),
                employee_code: employee.employee_code.clone(),
                employee_name: employee.employee_name.clone(),
                designation: employee.designation.clone(),
                date: *day,
                status: Status::Leave,
                location: None,
                leave_reason: Some(reason.clone()),
                check_in: None,
                check_out: None,
                working_hours: None,
            })
            .collect();

        self.read_modify_write("leave", |table| {
            let conflicts: Vec<NaiveDate> = days
                .iter()
                .copied()
                .filter(|day| table.iter().any(|r| r.is_for(employee_code, *day)))
                .collect();

            if !conflicts.is_empty() {
                return Err(LedgerError::LeaveConflict {
                    employee_code: employee_code.to_string(),
                    dates: conflicts,
                });
            }

            table.extend(rows);
            Ok(())
        })
        .await?;

        info!(
            employee_code,
            leave_id = %leave_id,
            days = days.len(),
            leave_type = %request.leave_type,
            "Leave recorded"
        );

        Ok(LeaveReceipt {
            leave_id,
            dates: days,
        })
    }

    /// The record for `(employee_code, date)`, if any.
    pub async fn record_for_day(
        &self,
        employee_code: &str,
        date: NaiveDate,
    ) -> Result<Option<AttendanceRecord>, LedgerError> {
        let employee_code = employee_code.trim();
        let table = self.store.read_all().await?;
        Ok(table.into_iter().rev().find(|r| r.is_for(employee_code, date)))
    }

    /// Lifecycle position of `(employee_code, date)`; decides whether a
    /// checkout can be offered.
    pub async fn checkout_state(
        &self,
        employee_code: &str,
        date: NaiveDate,
    ) -> Result<DayState, LedgerError> {
        let record = self.record_for_day(employee_code, date).await?;
        Ok(DayState::of(record.as_ref()))
    }

    /// Records newest first, paginated (1-based pages).
    pub async fn list_records(
        &self,
        filter: &RecordFilter,
    ) -> Result<Page<AttendanceRecord>, LedgerError> {
        let mut rows: Vec<AttendanceRecord> = self
            .store
            .read_all()
            .await?
            .into_iter()
            .filter(|r| {
                filter
                    .employee_code
                    .as_deref()
                    .is_none_or(|code| r.employee_code == code.trim())
            })
            .filter(|r| {
                filter
                    .month
                    .is_none_or(|(y, m)| r.date.year() == y && r.date.month() == m)
            })
            .collect();

        rows.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| b.id.cmp(&a.id)));

        let per_page = filter.per_page.clamp(1, 100);
        let page = filter.page.max(1);
        let total = rows.len() as u64;

        let offset = page.saturating_sub(1).saturating_mul(per_page);
        let data = rows
            .into_iter()
            .skip(usize::try_from(offset).unwrap_or(usize::MAX))
            .take(per_page as usize)
            .collect();

        Ok(Page {
            data,
            page,
            per_page,
            total,
        })
    }

    pub(super) async fn snapshot(&self) -> Result<Vec<AttendanceRecord>, LedgerError> {
        self.store.read_all().await
    }
}
