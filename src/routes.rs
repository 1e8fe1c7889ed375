use crate::{
    api::{attendance, employee, leave_request, qr},
    auth::middleware::auth_middleware,
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use std::sync::Arc;

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    // Helper to build per-route limiter
    fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
        let requests_per_min = requests_per_min.max(1);
        let per_ms = (60_000 / requests_per_min as u64).max(1);
        let cfg = GovernorConfigBuilder::default()
            .per_millisecond(per_ms)
            .burst_size(requests_per_min)
            .key_extractor(PeerIpKeyExtractor)
            .finish()
            .unwrap_or_default();
        Governor::new(&cfg)
    }

    let protected_limiter = Arc::new(build_limiter(config.rate_protected_per_min));
    let scan_limiter = Arc::new(build_limiter(config.rate_scan_per_min));

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware)) // authentication
            .wrap(protected_limiter) // rate limiting
            .service(
                web::scope("/attendance")
                    // /attendance
                    .service(web::resource("").route(web::get().to(attendance::list_records)))
                    .service(
                        web::resource("/check-in").route(web::post().to(attendance::check_in)),
                    )
                    .service(
                        web::resource("/check-out")
                            .route(web::get().to(attendance::checkout_state))
                            .route(web::post().to(attendance::check_out)),
                    )
                    .service(web::resource("/today").route(web::get().to(attendance::today)))
                    .service(
                        web::resource("/stats").route(web::get().to(attendance::monthly_stats)),
                    ),
            )
            .service(
                web::scope("/leave")
                    // /leave
                    .service(
                        web::resource("").route(web::post().to(leave_request::create_leave)),
                    ),
            )
            .service(
                web::scope("/qr")
                    .service(web::resource("/session").route(web::post().to(qr::issue_session)))
                    // kiosk scans get their own limiter
                    .service(
                        web::resource("/scan")
                            .wrap(scan_limiter)
                            .route(web::post().to(qr::scan)),
                    ),
            )
            .service(
                web::scope("/employee").service(
                    web::resource("/lookup").route(web::get().to(employee::lookup_employee)),
                ),
            ),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::generate_access_token;
    use crate::clock::{Clock, FixedClock, ist_at};
    use crate::ledger::AttendanceLedger;
    use crate::ledger::engine::tests::{ledger, unreachable_ledger};
    use crate::ledger::rules::{StatusRules, WeekendPolicy};
    use crate::session::{SessionRegistry, TokenIssuer};
    use actix_web::{App, http::StatusCode, test};
    use chrono::{DateTime, FixedOffset};
    use serde_json::{Value, json};

    const SECRET: &str = "test-secret";

    fn config() -> Config {
        Config {
            server_addr: "127.0.0.1:0".into(),
            database_url: None,
            seed_file: None,
            jwt_secret: SECRET.into(),
            api_prefix: "/api".into(),
            ledger_table: "Attendance".into(),
            directory_table: "Person".into(),
            utc_offset: crate::clock::ist(),
            status_rules: StatusRules::default(),
            weekend: WeekendPolicy::default(),
            max_leave_days: 60,
            qr_token_ttl_secs: 300,
            snapshot_ttl_secs: 5,
            rate_protected_per_min: 1000,
            rate_scan_per_min: 60,
        }
    }

    fn employee_token() -> String {
        generate_access_token(1, "john", 3, Some("EMP-001"), SECRET)
    }

    fn hr_token() -> String {
        generate_access_token(2, "hr", 2, None, SECRET)
    }

    fn bearer(token: &str) -> (&'static str, String) {
        ("Authorization", format!("Bearer {token}"))
    }

    fn post(uri: &str, token: &str) -> test::TestRequest {
        test::TestRequest::post()
            .uri(uri)
            .peer_addr("127.0.0.1:40000".parse().unwrap())
            .insert_header(bearer(token))
    }

    fn get(uri: &str, token: &str) -> test::TestRequest {
        test::TestRequest::get()
            .uri(uri)
            .peer_addr("127.0.0.1:40000".parse().unwrap())
            .insert_header(bearer(token))
    }

    macro_rules! app {
        ($ledger:expr, $now:expr) => {{
            let clock: Arc<dyn Clock> = Arc::new(FixedClock($now));
            test::init_service(
                App::new()
                    .app_data(web::Data::new(config()))
                    .app_data(web::Data::new($ledger))
                    .app_data(web::Data::new(SessionRegistry::new(TokenIssuer::new(
                        chrono::Duration::seconds(300),
                    ))))
                    .app_data(web::Data::from(clock))
                    .configure(|cfg| configure(cfg, config())),
            )
            .await
        }};
    }

    fn monday_at(hh: u32, mm: u32) -> DateTime<FixedOffset> {
        ist_at(2026, 1, 12, hh, mm, 0)
    }

    fn fresh_ledger() -> AttendanceLedger {
        ledger().0
    }

    #[actix_web::test]
    async fn missing_bearer_is_rejected() {
        let app = app!(fresh_ledger(), monday_at(9, 15));

        let req = test::TestRequest::post()
            .uri("/api/attendance/check-in")
            .peer_addr("127.0.0.1:40000".parse().unwrap())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn check_in_twice_conflicts() {
        let app = app!(fresh_ledger(), monday_at(9, 15));

        let resp = test::call_service(&app, post("/api/attendance/check-in", &employee_token()).to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert!(body["id"].as_str().unwrap().starts_with("ATT-20260112091500-"));

        let resp = test::call_service(&app, post("/api/attendance/check-in", &employee_token()).to_request()).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "already_marked");
    }

    #[actix_web::test]
    async fn check_in_accepts_location_body() {
        let app = app!(fresh_ledger(), monday_at(9, 15));

        let req = post("/api/attendance/check-in", &employee_token())
            .set_json(json!({ "location": "Manual Entry: Gate 2" }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

        let resp = test::call_service(&app, get("/api/attendance/today", &employee_token()).to_request()).await;
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["state"], "checked_in");
        assert_eq!(body["can_check_out"], true);
        assert_eq!(body["record"]["location"], "Manual Entry: Gate 2");
    }

    #[actix_web::test]
    async fn check_out_without_check_in_is_bad_request() {
        let app = app!(fresh_ledger(), monday_at(17, 30));

        let resp = test::call_service(&app, post("/api/attendance/check-out", &employee_token()).to_request()).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "no_check_in_found");
    }

    #[actix_web::test]
    async fn check_in_then_out_reports_hours() {
        let (ledger, _) = ledger();
        ledger
            .submit_check_in("EMP-001", monday_at(9, 0).date_naive(), monday_at(9, 0), None)
            .await
            .unwrap();
        let app = app!(ledger, monday_at(17, 30));

        let resp = test::call_service(&app, get("/api/attendance/check-out", &employee_token()).to_request()).await;
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["can_check_out"], true);

        let resp = test::call_service(&app, post("/api/attendance/check-out", &employee_token()).to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["status"], "Present");
        assert_eq!(body["working_hours"], 8.5);

        let resp = test::call_service(&app, get("/api/attendance/check-out", &employee_token()).to_request()).await;
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["state"], "checked_out");
        assert_eq!(body["can_check_out"], false);
    }

    #[actix_web::test]
    async fn today_before_check_in() {
        let app = app!(fresh_ledger(), monday_at(8, 0));

        let resp = test::call_service(&app, get("/api/attendance/today", &employee_token()).to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["date"], "2026-01-12");
        assert_eq!(body["state"], "not_checked_in");
        assert!(body["record"].is_null());
    }

    #[actix_web::test]
    async fn hr_without_profile_cannot_check_in() {
        let app = app!(fresh_ledger(), monday_at(9, 0));

        let resp = test::call_service(&app, post("/api/attendance/check-in", &hr_token()).to_request()).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn leave_over_weekend_skips_it() {
        let app = app!(fresh_ledger(), monday_at(9, 0));

        let req = post("/api/leave", &employee_token())
            .set_json(json!({
                "start_date": "2026-01-16",
                "end_date": "2026-01-19",
                "leave_type": "sick",
                "reason": "fever"
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["dates"], json!(["2026-01-16", "2026-01-19"]));
    }

    #[actix_web::test]
    async fn leave_over_existing_record_conflicts() {
        let (ledger, _) = ledger();
        ledger
            .submit_check_in("EMP-001", monday_at(9, 0).date_naive(), monday_at(9, 0), None)
            .await
            .unwrap();
        let app = app!(ledger, monday_at(10, 0));

        let req = post("/api/leave", &employee_token())
            .set_json(json!({
                "start_date": "2026-01-12",
                "end_date": "2026-01-13",
                "leave_type": "personal",
                "reason": "errand"
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "leave_conflict");
    }

    #[actix_web::test]
    async fn long_reason_and_long_range_are_bad_requests() {
        let app = app!(fresh_ledger(), monday_at(9, 0));

        let req = post("/api/leave", &employee_token())
            .set_json(json!({
                "start_date": "2026-01-13",
                "end_date": "2026-01-13",
                "leave_type": "other",
                "reason": "z".repeat(500)
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "text_too_long");

        let req = post("/api/leave", &employee_token())
            .set_json(json!({
                "start_date": "0001-01-01",
                "end_date": "9999-12-31",
                "leave_type": "vacation",
                "reason": "forever"
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "leave_span_too_long");
    }

    #[actix_web::test]
    async fn huge_page_is_served_empty() {
        let app = app!(fresh_ledger(), monday_at(9, 0));

        let resp = test::call_service(
            &app,
            get("/api/attendance?page=18446744073709551615&per_page=100", &employee_token()).to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["data"], json!([]));
    }

    #[actix_web::test]
    async fn employees_cannot_list_others() {
        let app = app!(fresh_ledger(), monday_at(9, 0));

        let resp = test::call_service(
            &app,
            get("/api/attendance?employee_code=EMP-002", &employee_token()).to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let resp = test::call_service(
            &app,
            get("/api/attendance?employee_code=EMP-002", &hr_token()).to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn month_without_year_is_bad_request() {
        let app = app!(fresh_ledger(), monday_at(9, 0));

        let resp = test::call_service(&app, get("/api/attendance?month=1", &employee_token()).to_request()).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn stats_are_zero_when_store_is_down() {
        let app = app!(unreachable_ledger(), monday_at(9, 0));

        let resp = test::call_service(&app, get("/api/attendance/stats", &employee_token()).to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["present"], 0);
        assert_eq!(body["total_working_hours"], 0.0);
    }

    #[actix_web::test]
    async fn check_in_surfaces_store_outage() {
        let app = app!(unreachable_ledger(), monday_at(9, 0));

        let resp = test::call_service(&app, post("/api/attendance/check-in", &employee_token()).to_request()).await;
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[actix_web::test]
    async fn qr_session_then_scan_checks_in() {
        let app = app!(fresh_ledger(), monday_at(9, 5));

        let resp = test::call_service(&app, post("/api/qr/session", &employee_token()).to_request()).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let resp = test::call_service(&app, post("/api/qr/session", &hr_token()).to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        let token = body["token"].as_str().unwrap().to_string();
        assert!(token.starts_with("QR-"));

        let req = post("/api/qr/scan", &employee_token())
            .set_json(json!({ "scanned": token, "location": "Scanned via QR Code" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = test::call_service(&app, get("/api/attendance/today", &employee_token()).to_request()).await;
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["record"]["location"], "Scanned via QR Code");
    }

    #[actix_web::test]
    async fn scanning_garbage_is_unauthorized() {
        let app = app!(fresh_ledger(), monday_at(9, 5));

        let req = post("/api/qr/scan", &employee_token())
            .set_json(json!({ "scanned": "QR-12-not-issued" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "invalid_or_expired_token");
    }

    #[actix_web::test]
    async fn employee_lookup_by_name_and_code() {
        let app = app!(fresh_ledger(), monday_at(9, 0));

        let resp = test::call_service(&app, get("/api/employee/lookup?name=Asha%20Rao", &hr_token()).to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["employee_code"], "EMP-002");

        let resp = test::call_service(&app, get("/api/employee/lookup?code=EMP-002", &employee_token()).to_request()).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let resp = test::call_service(&app, get("/api/employee/lookup?code=EMP-001", &employee_token()).to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = test::call_service(&app, get("/api/employee/lookup?code=EMP-404", &hr_token()).to_request()).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = test::call_service(&app, get("/api/employee/lookup", &hr_token()).to_request()).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
