use crate::api::attendance::{
    CheckInPayload, CheckOutStateResponse, RecordListResponse, RecordQuery, StatsQuery, TodayResponse,
};
use crate::api::employee::EmployeeLookup;
use crate::api::leave_request::CreateLeave;
use crate::api::qr::{ScanPayload, SessionResponse};
use crate::ledger::engine::{CheckOutSummary, LeaveReceipt};
use crate::ledger::stats::MonthlyStats;
use crate::model::attendance::{AttendanceRecord, DayState, Status};
use crate::model::employee::Employee;
use crate::model::leave::LeaveType;
use utoipa::Modify;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Attendance Ledger API",
        version = "1.0.0",
        description = r#"
## Attendance & Leave Ledger

Daily attendance for an organization, kept as one ledger table with a row per
employee per day.

### 🔹 Key Features
- **Attendance**
  - Check-in and check-out, with the day's status derived from the times
  - Today's state, paginated history and monthly statistics
- **Leave**
  - One leave row per working day in the requested range, weekends skipped
  - All-or-nothing: a range touching an already recorded day is refused
- **QR kiosk**
  - HR issues short-lived session tokens, employees check in by scanning them

### 🔐 Security
Every endpoint requires a **JWT Bearer** access token. Employees act on their
own records; **Admin** and **HR** may read anyone's.

### 🕘 Time
All dates and times are civil time in the configured UTC offset (IST by default).
"#,
    ),
    paths(
        crate::api::attendance::check_in,
        crate::api::attendance::check_out,
        crate::api::attendance::checkout_state,
        crate::api::attendance::today,
        crate::api::attendance::list_records,
        crate::api::attendance::monthly_stats,

        crate::api::leave_request::create_leave,

        crate::api::qr::issue_session,
        crate::api::qr::scan,

        crate::api::employee::lookup_employee
    ),
    components(
        schemas(
            AttendanceRecord,
            Status,
            DayState,
            CheckInPayload,
            CheckOutSummary,
            CheckOutStateResponse,
            TodayResponse,
            RecordQuery,
            RecordListResponse,
            StatsQuery,
            MonthlyStats,
            CreateLeave,
            LeaveType,
            LeaveReceipt,
            SessionResponse,
            ScanPayload,
            EmployeeLookup,
            Employee
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Attendance", description = "Check-in, check-out and attendance history"),
        (name = "Leave", description = "Leave recording"),
        (name = "QR", description = "Kiosk session tokens"),
        (name = "Employee", description = "Employee directory lookup"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documents_every_route() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/attendance",
            "/api/attendance/check-in",
            "/api/attendance/check-out",
            "/api/attendance/today",
            "/api/attendance/stats",
            "/api/leave",
            "/api/qr/session",
            "/api/qr/scan",
            "/api/employee/lookup",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
        assert!(
            doc.components
                .as_ref()
                .is_some_and(|c| c.security_schemes.contains_key("bearer_auth"))
        );
    }
}
