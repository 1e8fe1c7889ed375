use crate::auth::auth::AuthUser;
use crate::clock::Clock;
use crate::ledger::AttendanceLedger;
use crate::session::SessionRegistry;
use actix_web::{HttpResponse, Responder, web};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use tracing::{instrument, warn};
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct SessionResponse {
    /// Value to encode in the kiosk QR code
    #[schema(example = "QR-1768189500-67e55044-10b1-426f-9247-bb680e5fe0c8")]
    pub token: String,
    #[schema(value_type = String, format = "date-time")]
    pub expires_at: DateTime<FixedOffset>,
}

#[derive(Deserialize, ToSchema)]
pub struct ScanPayload {
    /// Raw value decoded from the QR code
    #[schema(example = "QR-1768189500-67e55044-10b1-426f-9247-bb680e5fe0c8")]
    pub scanned: String,
    #[schema(example = "Scanned via QR Code", nullable = true)]
    pub location: Option<String>,
}

/// Issue a kiosk session token (HR/Admin)
#[utoipa::path(
    post,
    path = "/api/qr/session",
    responses(
        (status = 200, description = "Token issued", body = SessionResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "QR"
)]
pub async fn issue_session(
    auth: AuthUser,
    registry: web::Data<SessionRegistry>,
    clock: web::Data<dyn Clock>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let token = registry.issue(clock.now()).await;
    let expires_at = registry.issuer().expires_at(&token);
    tracing::info!(issued_by = %auth.username, %expires_at, "QR session issued");

    Ok(HttpResponse::Ok().json(SessionResponse {
        token: token.to_string(),
        expires_at,
    }))
}

/// Check in by scanning the kiosk QR code
#[utoipa::path(
    post,
    path = "/api/qr/scan",
    request_body = ScanPayload,
    responses(
        (status = 200, description = "Checked in successfully", body = Object, example = json!({
            "message": "Checked in successfully",
            "id": "ATT-20260112091500-4F2A"
        })),
        (status = 401, description = "Invalid or expired token", body = Object, example = json!({
            "message": "invalid or expired session token",
            "error": "invalid_or_expired_token"
        })),
        (status = 409, description = "Attendance already marked today"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "QR"
)]
#[instrument(name = "qr_scan", skip_all, fields(user = %auth.username))]
pub async fn scan(
    auth: AuthUser,
    registry: web::Data<SessionRegistry>,
    ledger: web::Data<AttendanceLedger>,
    clock: web::Data<dyn Clock>,
    payload: web::Json<ScanPayload>,
) -> actix_web::Result<impl Responder> {
    let employee_code = auth.employee_code()?;
    let now = clock.now();
    let payload = payload.into_inner();

    registry.resolve(&payload.scanned, now).await.map_err(|e| {
        warn!(employee_code, "Rejected QR scan");
        e
    })?;

    let id = ledger
        .submit_check_in(employee_code, now.date_naive(), now, payload.location)
        .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Checked in successfully",
        "id": id
    })))
}
