//! Server-rendered pages. Thin views over the same core operations the JSON
//! handlers use.

use actix_web::{web, HttpResponse};
use askama::Template;
use mh_core::{community, events, parse_id, projects};
use mh_ui::{
    CommunityTemplate, EventTemplate, EventsTemplate, HomeTemplate, ProjectTemplate, ProjectsTemplate,
    ThreadTemplate,
};
use serde::Deserialize;

use crate::error::PageError;
use crate::handlers::AppState;

/// Items of each kind shown on the home page.
const HOME_SECTION_LEN: usize = 3;

type PageResult = Result<HttpResponse, PageError>;

fn html(body: String) -> HttpResponse {
    HttpResponse::Ok().content_type("text/html; charset=utf-8").body(body)
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    page: Option<String>,
}

impl PageQuery {
    /// Anything that is not a positive number means the first page.
    fn number(&self) -> i64 {
        self.page
            .as_deref()
            .and_then(|p| p.parse().ok())
            .filter(|p| *p >= 1)
            .unwrap_or(1)
    }
}

pub async fn home(data: web::Data<AppState>) -> PageResult {
    let limit = Some(HOME_SECTION_LEN as i64);
    let latest_projects = projects::latest_projects(data.projects.as_ref(), HOME_SECTION_LEN as i64).await?;
    let threads = community::list_threads(data.community.as_ref(), limit).await?;
    let schedule = events::list_events(data.events.as_ref(), chrono::Utc::now()).await?;
    let upcoming = &schedule.upcoming[..schedule.upcoming.len().min(HOME_SECTION_LEN)];

    let page = HomeTemplate {
        projects: &latest_projects,
        threads: &threads,
        events: upcoming,
    };
    Ok(html(page.render()?))
}

pub async fn community_index(data: web::Data<AppState>) -> PageResult {
    let items = community::list_threads(data.community.as_ref(), None).await?;
    Ok(html(CommunityTemplate { items: &items }.render()?))
}

pub async fn community_thread(data: web::Data<AppState>, path: web::Path<String>) -> PageResult {
    let id = parse_id("thread", &path)?;
    let detail = community::thread_detail(data.community.as_ref(), id).await?;
    Ok(html(ThreadTemplate { detail: &detail }.render()?))
}

pub async fn events_index(data: web::Data<AppState>) -> PageResult {
    let schedule = events::list_events(data.events.as_ref(), chrono::Utc::now()).await?;
    Ok(html(EventsTemplate { schedule: &schedule }.render()?))
}

pub async fn event_detail(data: web::Data<AppState>, path: web::Path<String>) -> PageResult {
    let id = parse_id("event", &path)?;
    let event = events::get_event(data.events.as_ref(), id).await?;
    Ok(html(EventTemplate { event: &event }.render()?))
}

pub async fn projects_index(data: web::Data<AppState>, query: web::Query<PageQuery>) -> PageResult {
    let page = projects::list_projects_page(data.projects.as_ref(), query.number()).await?;
    Ok(html(ProjectsTemplate { page: &page }.render()?))
}

pub async fn project_detail(data: web::Data<AppState>, path: web::Path<String>) -> PageResult {
    let id = parse_id("project", &path)?;
    let project = projects::get_project(data.projects.as_ref(), id).await?;
    Ok(html(ProjectTemplate { project: &project }.render()?))
}
