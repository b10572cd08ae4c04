//! # mh-api Handlers
//!
//! JSON endpoints. Each one extracts, calls a core operation and shapes the
//! response; the operations own validation and persistence.

use actix_web::{web, HttpResponse};
use mh_core::community::{self, NewReply, NewThread};
use mh_core::error::AppError;
use mh_core::events::{self, AdminGate, NewEvent};
use mh_core::projects::{self, NewProject, ProjectPatch};
use mh_core::traits::{CommunityRepo, EventRepo, ProjectRepo};
use mh_core::parse_id;
use serde_json::json;

use crate::error::ApiError;

/// State shared across all actix-web workers.
pub struct AppState {
    pub community: Box<dyn CommunityRepo>,
    pub events: Box<dyn EventRepo>,
    pub projects: Box<dyn ProjectRepo>,
    pub admin: AdminGate,
}

type ApiResult = Result<HttpResponse, ApiError>;

// ── Community ────────────────────────────────────────────────────────────────

pub async fn list_threads(data: web::Data<AppState>) -> ApiResult {
    let items = community::list_threads(data.community.as_ref(), None).await?;
    Ok(HttpResponse::Ok().json(items))
}

pub async fn create_thread(data: web::Data<AppState>, body: web::Json<NewThread>) -> ApiResult {
    let item = community::create_thread(data.community.as_ref(), body.into_inner()).await?;
    Ok(HttpResponse::Created().json(item))
}

pub async fn get_thread(data: web::Data<AppState>, path: web::Path<String>) -> ApiResult {
    let id = parse_id("thread", &path)?;
    let detail = community::thread_detail(data.community.as_ref(), id).await?;
    Ok(HttpResponse::Ok().json(detail))
}

pub async fn like_thread(data: web::Data<AppState>, path: web::Path<String>) -> ApiResult {
    let id = parse_id("thread", &path)?;
    let likes = community::like_thread(data.community.as_ref(), id).await?;
    Ok(HttpResponse::Ok().json(json!({ "likes": likes })))
}

pub async fn reply_to_thread(
    data: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<NewReply>,
) -> ApiResult {
    let id = parse_id("thread", &path)?;
    let reply = community::add_reply(data.community.as_ref(), id, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(reply))
}

// ── Events ───────────────────────────────────────────────────────────────────

pub async fn list_events(data: web::Data<AppState>) -> ApiResult {
    let schedule = events::list_events(data.events.as_ref(), chrono::Utc::now()).await?;
    Ok(HttpResponse::Ok().json(schedule))
}

/// The admin code is checked before the payload is validated.
pub async fn create_event(data: web::Data<AppState>, body: web::Json<NewEvent>) -> ApiResult {
    let req = body.into_inner();
    let admin = data.admin.authorize(req.admin_code.as_deref())?;
    let event = events::create_event(data.events.as_ref(), &admin, req).await?;
    Ok(HttpResponse::Created().json(json!({ "event": event })))
}

pub async fn get_event(data: web::Data<AppState>, path: web::Path<String>) -> ApiResult {
    let id = parse_id("event", &path)?;
    let event = events::get_event(data.events.as_ref(), id).await?;
    Ok(HttpResponse::Ok().json(event))
}

// ── Projects ─────────────────────────────────────────────────────────────────

pub async fn list_projects(data: web::Data<AppState>) -> ApiResult {
    let items = projects::list_projects(data.projects.as_ref()).await?;
    Ok(HttpResponse::Ok().json(items))
}

pub async fn create_project(data: web::Data<AppState>, body: web::Json<NewProject>) -> ApiResult {
    let project = projects::create_project(data.projects.as_ref(), body.into_inner()).await?;
    Ok(HttpResponse::Created().json(project))
}

pub async fn get_project(data: web::Data<AppState>, path: web::Path<String>) -> ApiResult {
    let id = parse_id("project", &path)?;
    let project = projects::get_project(data.projects.as_ref(), id).await?;
    Ok(HttpResponse::Ok().json(project))
}

pub async fn update_project(
    data: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<ProjectPatch>,
) -> ApiResult {
    let id = parse_id("project", &path)?;
    let project = projects::update_project(data.projects.as_ref(), id, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(project))
}

/// Answers `{ ok }` in every non-fault case, including a missing project.
pub async fn delete_project(data: web::Data<AppState>, path: web::Path<String>) -> ApiResult {
    let deleted = match parse_id("project", &path) {
        Ok(id) => projects::delete_project(data.projects.as_ref(), id).await,
        Err(e) => Err(e),
    };

    match deleted {
        Ok(()) => Ok(HttpResponse::Ok().json(json!({ "ok": true }))),
        Err(e @ AppError::NotFound(..)) => Ok(HttpResponse::NotFound().json(json!({ "ok": false, "error": e.to_string() }))),
        Err(e) => Err(e.into()),
    }
}
