use crate::auth::auth::AuthUser;
use crate::clock::Clock;
use crate::ledger::AttendanceLedger;
use crate::ledger::engine::{LeaveReceipt, LeaveRequest};
use crate::model::leave::LeaveType;
use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;
use tracing::instrument;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct CreateLeave {
    #[schema(example = "2026-01-09", format = "date", value_type = String)]
    pub start_date: chrono::NaiveDate,
    #[schema(example = "2026-01-12", format = "date", value_type = String)]
    pub end_date: chrono::NaiveDate,
    #[schema(example = "sick")]
    pub leave_type: LeaveType, // enum ensures Swagger dropdown
    #[schema(example = "fever")]
    pub reason: String,
}

/* =========================
Create leave request
========================= */
/// Swagger doc for create_leave endpoint
#[utoipa::path(
    post,
    path = "/api/leave",
    request_body(
        content = CreateLeave,
        description = "Leave request payload",
        content_type = "application/json"
    ),
    responses(
        (status = 200, description = "Leave recorded for every working day in range", body = LeaveReceipt),
        (status = 400, description = "Bad request", body = Object, example = json!({
            "message": "start date 2026-01-12 is after end date 2026-01-09",
            "error": "invalid_date_range"
        })),
        (status = 409, description = "Leave overlaps existing records", body = Object, example = json!({
            "message": "leave conflicts with existing records on 2026-01-09",
            "error": "leave_conflict"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
#[instrument(name = "leave_create", skip_all, fields(user = %auth.username))]
pub async fn create_leave(
    auth: AuthUser,
    ledger: web::Data<AttendanceLedger>,
    clock: web::Data<dyn Clock>,
    payload: web::Json<CreateLeave>,
) -> actix_web::Result<impl Responder> {
    let employee_code = auth.employee_code()?;
    let payload = payload.into_inner();

    let request = LeaveRequest {
        start: payload.start_date,
        end: payload.end_date,
        leave_type: payload.leave_type,
        reason: payload.reason,
    };

    let receipt = ledger
        .submit_leave(employee_code, &request, clock.now())
        .await?;

    Ok(HttpResponse::Ok().json(receipt))
}
