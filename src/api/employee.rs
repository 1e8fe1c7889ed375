use crate::auth::auth::AuthUser;
use crate::ledger::AttendanceLedger;
use crate::model::employee::Employee;
use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;
use serde_json::json;
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct EmployeeLookup {
    #[schema(example = "John Doe")]
    /// Look up by display name
    pub name: Option<String>,
    #[schema(example = "EMP-001")]
    /// Look up by employee code
    pub code: Option<String>,
}

/// Directory lookup, by name or by code
#[utoipa::path(
    get,
    path = "/api/employee/lookup",
    params(EmployeeLookup),
    responses(
        (status = 200, description = "Employee found", body = Employee),
        (status = 400, description = "Neither name nor code given"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Employee not found", body = Object, example = json!({
            "message": "Employee not found"
        }))
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Employee"
)]
pub async fn lookup_employee(
    auth: AuthUser,
    ledger: web::Data<AttendanceLedger>,
    query: web::Query<EmployeeLookup>,
) -> actix_web::Result<impl Responder> {
    let directory = ledger.directory();

    let found = match (query.code.as_deref(), query.name.as_deref()) {
        (Some(code), _) => directory.lookup_by_code(code).await?,
        (None, Some(name)) => directory.lookup_by_name(name).await?,
        (None, None) => {
            return Ok(HttpResponse::BadRequest().json(json!({
                "message": "name or code is required"
            })));
        }
    };

    match found {
        Some(employee) => {
            auth.viewable_code(Some(&employee.employee_code))?;
            Ok(HttpResponse::Ok().json(employee))
        }
        None => Ok(HttpResponse::NotFound().json(json!({
            "message": "Employee not found"
        }))),
    }
}
