//! # MiningHub Binary
//!
//! The entry point that assembles the application based on compile-time features.

use actix_web::{web, App, HttpServer};
use anyhow::Context;
use mh_api::handlers::AppState;
use mh_api::middleware::{cors_policy, security_headers, standard_middleware};
use mh_api::{configure_pages, configure_routes};
use mh_config::Settings;
use mh_core::events::AdminGate;

#[cfg(feature = "db-sqlite")]
use mh_db_sqlite::SqliteRepo;

#[cfg(not(feature = "db-sqlite"))]
compile_error!("mininghub needs a storage backend; enable the `db-sqlite` feature");

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // .env is read before the logger so RUST_LOG can live there.
    let env_warning = mh_config::load_env_file();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    if let Some(warning) = env_warning {
        log::warn!("{warning}");
    }

    let settings = Settings::load().context("failed to load settings")?;

    // 1. Initialize Database Implementation
    #[cfg(feature = "db-sqlite")]
    let repo = SqliteRepo::new(&settings.database.url).await?;

    // 2. Wrap in AppState (Using dynamic dispatch for maximum flexibility)
    let state = web::Data::new(AppState {
        community: Box::new(repo.clone()),
        events: Box::new(repo.clone()),
        projects: Box::new(repo),
        admin: AdminGate::new(settings.admin.event_code.clone()),
    });

    let (host, port) = settings.bind_address();
    log::info!("MiningHub starting on http://{host}:{port}");

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(security_headers())
            .wrap(cors_policy())
            .wrap(standard_middleware())
            .configure(configure_routes)
            .configure(configure_pages)
    })
    .bind((host.as_str(), port))
    .with_context(|| format!("failed to bind {host}:{port}"))?
    .run()
    .await?;

    Ok(())
}
