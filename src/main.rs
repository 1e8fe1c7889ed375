use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer, Responder, get};
use std::sync::Arc;
use std::time::Duration;

mod api;
mod auth;
mod clock;
mod config;
mod db;
mod directory;
mod docs;
mod error;
mod ledger;
mod model;
mod models;
mod routes;
mod session;
mod store;

use anyhow::Context;
use clock::{Clock, SystemClock};
use config::Config;
use db::init_db;
use directory::{DIRECTORY_COLUMNS, DirectorySeed, TableDirectory};
use ledger::AttendanceLedger;
use session::{SessionRegistry, TokenIssuer};
use store::cached::CachedLedger;
use store::memory::MemorySheet;
use store::mysql::MySqlSheet;
use store::table::{LEDGER_COLUMNS, SheetLedger};
use store::{LedgerStore, TableBackend};

use crate::docs::ApiDoc;
use tracing::{error, info, warn};
use tracing_appender::rolling;
use utoipa::OpenApi; // ← needed for ApiDoc::openapi()
use utoipa_swagger_ui::SwaggerUi;

#[get("/")]
async fn index() -> impl Responder {
    "Attendance ledger is running"
}

/// Opens the configured sheet backend: MySQL when `DATABASE_URL` is set,
/// otherwise process memory.
async fn open_backend(config: &Config) -> anyhow::Result<Arc<dyn TableBackend>> {
    let Some(url) = &config.database_url else {
        warn!("DATABASE_URL not set, ledger kept in memory only");
        return Ok(Arc::new(MemorySheet::new()));
    };

    let pool = init_db(url).await.context("Failed to connect to database")?;
    let sheet = MySqlSheet::new(pool);
    sheet
        .ensure_table(&config.ledger_table, &LEDGER_COLUMNS)
        .await
        .context("Failed to prepare ledger table")?;
    sheet
        .ensure_table(&config.directory_table, &DIRECTORY_COLUMNS)
        .await
        .context("Failed to prepare directory table")?;
    info!("Connected to MySQL");
    Ok(Arc::new(sheet))
}

/// Loads `SEED_FILE` into the directory sheet if that sheet is still empty.
async fn seed_directory(config: &Config, backend: &dyn TableBackend) -> anyhow::Result<()> {
    let Some(path) = &config.seed_file else {
        return Ok(());
    };

    if !backend.read_table(&config.directory_table).await?.is_empty() {
        info!(path = %path, "Directory already populated, seed skipped");
        return Ok(());
    }

    let raw = std::fs::read_to_string(path).with_context(|| format!("reading {path}"))?;
    let seed = DirectorySeed::from_json(&raw).with_context(|| format!("parsing {path}"))?;
    backend
        .replace_table(&config.directory_table, seed.rows())
        .await?;
    info!(path = %path, employees = seed.employees.len(), "Directory seeded");
    Ok(())
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Rolling daily log
    let file_appender = rolling::daily("logs", "attendance.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_target(false) // removes module path
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    let config = Config::from_env().map_err(|e| {
        error!(error = %format!("{e:#}"), "Invalid configuration");
        std::io::Error::new(std::io::ErrorKind::InvalidInput, format!("{e:#}"))
    })?;

    info!("Server starting...");

    let startup = async {
        let backend = open_backend(&config).await?;
        seed_directory(&config, backend.as_ref()).await?;
        anyhow::Ok(backend)
    };
    let backend = startup.await.map_err(|e| {
        error!(error = %format!("{e:#}"), "Startup failed");
        std::io::Error::other(format!("{e:#}"))
    })?;

    let store: Arc<dyn LedgerStore> = Arc::new(CachedLedger::new(
        Arc::new(SheetLedger::new(backend.clone(), config.ledger_table.clone())),
        Duration::from_secs(config.snapshot_ttl_secs),
    ));
    let directory = Arc::new(TableDirectory::new(backend, config.directory_table.clone()));

    let ledger = Data::new(AttendanceLedger::new(
        store,
        directory,
        config.status_rules,
        config.weekend.clone(),
    )
    .with_max_leave_days(config.max_leave_days));
    let registry = Data::new(SessionRegistry::new(TokenIssuer::new(
        chrono::Duration::seconds(config.qr_token_ttl_secs),
    )));
    let clock: Arc<dyn Clock> = Arc::new(SystemClock::new(config.utc_offset));
    let clock = Data::from(clock);

    // Clone values for the closure (avoid move issues)
    let server_addr = config.server_addr.clone();
    let config_data = config.clone();

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // ← important: wildcard {_:.*} to match JS/CSS files
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(ledger.clone())
            .app_data(registry.clone())
            .app_data(clock.clone())
            .app_data(Data::new(config.clone()))
            .service(index)
            // Configure protected routes with rate limiting
            .configure(|cfg| routes::configure(cfg, config_data.clone()))
    })
    .bind(server_addr)?
    .run()
    .await
}
