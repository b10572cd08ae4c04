//! # Projects
//!
//! Request schemas, validation and operations for the projects section.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use crate::error::{AppError, Result};
use crate::models::Project;
use crate::traits::ProjectRepo;

/// Projects shown per page on the listing page.
pub const PAGE_SIZE: i64 = 9;

pub const DEMO_OWNER_EMAIL: &str = "demo@mininghub.local";
pub const DEMO_OWNER_NAME: &str = "Demo User";

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewProject {
    #[serde(default)]
    #[validate(length(min = 3, message = "Title must be at least 3 characters"))]
    pub title: String,
    pub summary: Option<String>,
    pub tags: Option<Vec<String>>,
    #[validate(email(message = "Invalid owner email"))]
    pub owner_email: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ProjectPatch {
    #[validate(length(min = 3, message = "Title must be at least 3 characters"))]
    pub title: Option<String>,
    pub summary: Option<String>,
    pub tags: Option<Vec<String>>,
}

/// Everything the store needs to insert a project and upsert its owner.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectDraft {
    pub id: Uuid,
    pub title: String,
    pub summary: Option<String>,
    pub tags: Vec<String>,
    pub owner_email: String,
    pub owner_name: String,
    pub created_at: DateTime<Utc>,
}

/// Column updates; `None` leaves a column untouched.
/// `summary: Some(None)` clears the summary.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectChanges {
    pub title: Option<String>,
    pub summary: Option<Option<String>>,
    pub tags: Option<Vec<String>>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectPage {
    pub items: Vec<Project>,
    pub page: i64,
    pub total_pages: i64,
    pub total: i64,
}

impl ProjectPage {
    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }
}

pub async fn create_project(repo: &dyn ProjectRepo, mut req: NewProject) -> Result<Project> {
    req.title = req.title.trim().to_string();
    req.validate().map_err(validation_error)?;

    let draft = ProjectDraft {
        id: Uuid::now_v7(),
        title: req.title,
        summary: trimmed_summary(req.summary),
        tags: req.tags.unwrap_or_default(),
        owner_email: req.owner_email.unwrap_or_else(|| DEMO_OWNER_EMAIL.to_string()),
        owner_name: DEMO_OWNER_NAME.to_string(),
        created_at: Utc::now(),
    };
    let project = repo.create_project(draft).await?;

    log::info!("created project {} for {}", project.id, project.owner.email);
    Ok(project)
}

pub async fn list_projects(repo: &dyn ProjectRepo) -> Result<Vec<Project>> {
    Ok(repo.list_projects(None, 0).await?)
}

pub async fn latest_projects(repo: &dyn ProjectRepo, limit: i64) -> Result<Vec<Project>> {
    Ok(repo.list_projects(Some(limit), 0).await?)
}

/// One page of projects, newest first. Out-of-range pages come back empty.
pub async fn list_projects_page(repo: &dyn ProjectRepo, page: i64) -> Result<ProjectPage> {
    let page = page.max(1);
    let total = repo.count_projects().await?;
    let offset = (page - 1).saturating_mul(PAGE_SIZE);
    let items = repo.list_projects(Some(PAGE_SIZE), offset).await?;

    Ok(ProjectPage {
        items,
        page,
        total_pages: ((total + PAGE_SIZE - 1) / PAGE_SIZE).max(1),
        total,
    })
}

pub async fn get_project(repo: &dyn ProjectRepo, id: Uuid) -> Result<Project> {
    repo.get_project(id)
        .await?
        .ok_or_else(|| AppError::not_found("project", id))
}

pub async fn update_project(repo: &dyn ProjectRepo, id: Uuid, mut patch: ProjectPatch) -> Result<Project> {
    patch.title = patch.title.map(|t| t.trim().to_string());
    patch.validate().map_err(validation_error)?;

    let changes = ProjectChanges {
        title: patch.title,
        summary: patch.summary.map(|s| trimmed_summary(Some(s))),
        tags: patch.tags,
        updated_at: Utc::now(),
    };
    repo.update_project(id, changes)
        .await?
        .ok_or_else(|| AppError::not_found("project", id))
}

pub async fn delete_project(repo: &dyn ProjectRepo, id: Uuid) -> Result<()> {
    if !repo.delete_project(id).await? {
        return Err(AppError::not_found("project", id));
    }
    log::info!("deleted project {id}");
    Ok(())
}

fn trimmed_summary(summary: Option<String>) -> Option<String> {
    summary
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Reports the first failing field, by field name, as the error message.
fn validation_error(errors: ValidationErrors) -> AppError {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));

    let message = fields
        .into_iter()
        .flat_map(|(field, errs)| errs.iter().map(move |e| (field.clone(), e)))
        .map(|(field, e)| match &e.message {
            Some(msg) => msg.to_string(),
            None => format!("Invalid {field}"),
        })
        .next()
        .unwrap_or_else(|| "Invalid payload".to_string());

    AppError::ValidationError(message)
}
