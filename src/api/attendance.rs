use crate::auth::auth::AuthUser;
use crate::clock::Clock;
use crate::ledger::AttendanceLedger;
use crate::ledger::engine::{CheckOutSummary, RecordFilter};
use crate::ledger::stats::MonthlyStats;
use crate::model::attendance::{AttendanceRecord, DayState};
use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::instrument;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
pub struct CheckInPayload {
    #[schema(example = "Manual Entry: Head office, 3rd floor", nullable = true)]
    /// Free-text location note stored with the record
    pub location: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct TodayResponse {
    #[schema(example = "2026-01-12", format = "date", value_type = String)]
    pub date: NaiveDate,
    pub state: DayState,
    /// true when a check-out can be submitted now
    pub can_check_out: bool,
    pub record: Option<AttendanceRecord>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct RecordQuery {
    #[schema(example = "EMP-001")]
    /// Filter by employee code (HR/Admin may query anyone)
    pub employee_code: Option<String>,
    #[schema(example = 2026)]
    pub year: Option<i32>,
    #[schema(example = 1)]
    /// Month 1-12, requires year
    pub month: Option<u32>,
    #[schema(example = 1)]
    /// Pagination page number (start with 1)
    pub page: Option<u64>,
    #[schema(example = 10)]
    pub per_page: Option<u64>,
}

#[derive(Serialize, ToSchema)]
pub struct RecordListResponse {
    pub data: Vec<AttendanceRecord>,
    #[schema(example = 1)]
    pub page: u64,
    #[schema(example = 10)]
    pub per_page: u64,
    #[schema(example = 1)]
    pub total: u64,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct StatsQuery {
    #[schema(example = "EMP-001")]
    /// Defaults to the caller
    pub employee_code: Option<String>,
}

/// Check-in endpoint
#[utoipa::path(
    post,
    path = "/api/attendance/check-in",
    request_body(content = CheckInPayload, description = "Optional body", content_type = "application/json"),
    responses(
        (status = 200, description = "Checked in successfully", body = Object, example = json!({
            "message": "Checked in successfully",
            "id": "ATT-20260112091500-4F2A"
        })),
        (status = 409, description = "Attendance already marked today", body = Object, example = json!({
            "message": "attendance already marked for EMP-001 on 2026-01-12",
            "error": "already_marked"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 503, description = "Ledger store unavailable")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
#[instrument(name = "attendance_check_in", skip_all, fields(user = %auth.username))]
pub async fn check_in(
    auth: AuthUser,
    ledger: web::Data<AttendanceLedger>,
    clock: web::Data<dyn Clock>,
    payload: Option<web::Json<CheckInPayload>>,
) -> actix_web::Result<impl Responder> {
    let employee_code = auth.employee_code()?;
    let now = clock.now();
    let location = payload.and_then(|p| p.into_inner().location);

    let id = ledger
        .submit_check_in(employee_code, now.date_naive(), now, location)
        .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Checked in successfully",
        "id": id
    })))
}

/// Check-out endpoint
#[utoipa::path(
    post,
    path = "/api/attendance/check-out",
    responses(
        (status = 200, description = "Checked out successfully", body = CheckOutSummary),
        (status = 400, description = "No check-in found for today", body = Object, example = json!({
            "message": "no check-in found for EMP-001 on 2026-01-12",
            "error": "no_check_in_found"
        })),
        (status = 409, description = "Already checked out today"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 503, description = "Ledger store unavailable")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
#[instrument(name = "attendance_check_out", skip_all, fields(user = %auth.username))]
pub async fn check_out(
    auth: AuthUser,
    ledger: web::Data<AttendanceLedger>,
    clock: web::Data<dyn Clock>,
) -> actix_web::Result<impl Responder> {
    let employee_code = auth.employee_code()?;
    let now = clock.now();

    let summary = ledger
        .submit_check_out(employee_code, now.date_naive(), now)
        .await?;

    Ok(HttpResponse::Ok().json(summary))
}

#[derive(Serialize, ToSchema)]
pub struct CheckOutStateResponse {
    pub state: DayState,
    pub can_check_out: bool,
}

/// Whether the caller can check out today
#[utoipa::path(
    get,
    path = "/api/attendance/check-out",
    responses(
        (status = 200, description = "Today's lifecycle position", body = CheckOutStateResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn checkout_state(
    auth: AuthUser,
    ledger: web::Data<AttendanceLedger>,
    clock: web::Data<dyn Clock>,
) -> actix_web::Result<impl Responder> {
    let employee_code = auth.employee_code()?;
    let state = ledger
        .checkout_state(employee_code, clock.now().date_naive())
        .await?;

    Ok(HttpResponse::Ok().json(CheckOutStateResponse {
        state,
        can_check_out: state == DayState::CheckedIn,
    }))
}

/// Today's record for the caller
#[utoipa::path(
    get,
    path = "/api/attendance/today",
    responses(
        (status = 200, description = "Today's attendance state", body = TodayResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn today(
    auth: AuthUser,
    ledger: web::Data<AttendanceLedger>,
    clock: web::Data<dyn Clock>,
) -> actix_web::Result<impl Responder> {
    let employee_code = auth.employee_code()?;
    let date = clock.now().date_naive();

    let record = ledger.record_for_day(employee_code, date).await?;
    let state = DayState::of(record.as_ref());

    Ok(HttpResponse::Ok().json(TodayResponse {
        date,
        state,
        can_check_out: state == DayState::CheckedIn,
        record,
    }))
}

/// for getting attendance records endpoint
#[utoipa::path(
    get,
    path = "/api/attendance",
    params(RecordQuery),
    responses(
        (status = 200, description = "Paginated attendance records", body = RecordListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn list_records(
    auth: AuthUser,
    ledger: web::Data<AttendanceLedger>,
    query: web::Query<RecordQuery>,
) -> actix_web::Result<impl Responder> {
    let employee_code = match auth.require_hr_or_admin() {
        Ok(()) => query.employee_code.clone(),
        Err(_) => Some(auth.viewable_code(query.employee_code.as_deref())?),
    };

    let month = match (query.year, query.month) {
        (Some(y), Some(m)) if (1..=12).contains(&m) => Some((y, m)),
        (None, None) => None,
        _ => {
            return Ok(HttpResponse::BadRequest().json(serde_json::json!({
                "message": "year and month (1-12) must be given together"
            })));
        }
    };

    let page = ledger
        .list_records(&RecordFilter {
            employee_code,
            month,
            page: query.page.unwrap_or(1),
            per_page: query.per_page.unwrap_or(10),
        })
        .await?;

    Ok(HttpResponse::Ok().json(RecordListResponse {
        data: page.data,
        page: page.page,
        per_page: page.per_page,
        total: page.total,
    }))
}

/// Current month statistics
#[utoipa::path(
    get,
    path = "/api/attendance/stats",
    params(StatsQuery),
    responses(
        (status = 200, description = "Monthly statistics", body = MonthlyStats),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn monthly_stats(
    auth: AuthUser,
    ledger: web::Data<AttendanceLedger>,
    clock: web::Data<dyn Clock>,
    query: web::Query<StatsQuery>,
) -> actix_web::Result<impl Responder> {
    let employee_code = auth.viewable_code(query.employee_code.as_deref())?;

    let stats = ledger
        .compute_monthly_stats(&employee_code, clock.now())
        .await;
    tracing::debug!(employee_code = %employee_code, days = stats.days_recorded(), "Monthly stats computed");

    Ok(HttpResponse::Ok().json(stats))
}
