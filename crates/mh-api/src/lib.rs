//! # mh-api
//!
//! The web routing and orchestration layer for MiningHub.

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod pages;

use actix_web::web;
use mh_core::error::AppError;

use crate::error::ApiError;

/// Malformed or mistyped JSON bodies become a 400 with the usual error shape.
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .error_handler(|err, _req| ApiError(AppError::validation(format!("Invalid payload: {err}"))).into())
}

/// Configures the JSON API.
///
/// # Developer Note
/// We use a scoped configuration so the pages can own the bare paths
/// (`/community`, `/events`, ...) while the API lives under `/api`.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .app_data(json_config())
            .service(
                web::resource("/community")
                    .route(web::get().to(handlers::list_threads))
                    .route(web::post().to(handlers::create_thread)),
            )
            .service(web::resource("/community/{id}").route(web::get().to(handlers::get_thread)))
            .service(web::resource("/community/{id}/like").route(web::post().to(handlers::like_thread)))
            .service(web::resource("/community/{id}/reply").route(web::post().to(handlers::reply_to_thread)))
            .service(
                web::resource("/events")
                    .route(web::get().to(handlers::list_events))
                    .route(web::post().to(handlers::create_event)),
            )
            .service(web::resource("/events/{id}").route(web::get().to(handlers::get_event)))
            .service(
                web::resource("/projects")
                    .route(web::get().to(handlers::list_projects))
                    .route(web::post().to(handlers::create_project)),
            )
            .service(
                web::resource("/projects/{id}")
                    .route(web::get().to(handlers::get_project))
                    .route(web::patch().to(handlers::update_project))
                    .route(web::delete().to(handlers::delete_project)),
            ),
    );
}

/// Configures the server-rendered pages.
pub fn configure_pages(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(pages::home))
        .route("/community", web::get().to(pages::community_index))
        .route("/community/{id}", web::get().to(pages::community_thread))
        .route("/events", web::get().to(pages::events_index))
        .route("/events/{id}", web::get().to(pages::event_detail))
        .route("/projects", web::get().to(pages::projects_index))
        .route("/projects/{id}", web::get().to(pages::project_detail));
}
