//! # Events
//!
//! Event creation is gated by a shared admin code. The check happens once, in
//! [`AdminGate::authorize`], and its result is an [`EventAdmin`] capability that
//! [`create_event`] requires, so no code path can create an event unchecked.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::Event;
use crate::traits::EventRepo;

/// Holds the configured admin code. Without one, nobody may create events.
#[derive(Debug, Clone)]
pub struct AdminGate {
    code: Option<SecretString>,
}

/// Proof that the caller presented the admin code.
#[derive(Debug)]
pub struct EventAdmin {
    _private: (),
}

impl AdminGate {
    pub fn new(code: Option<SecretString>) -> Self {
        let code = code.filter(|c| !c.expose_secret().is_empty());
        if code.is_none() {
            log::warn!("no event admin code configured; event creation is disabled");
        }
        Self { code }
    }

    pub fn authorize(&self, presented: Option<&str>) -> Result<EventAdmin> {
        match (&self.code, presented) {
            (Some(expected), Some(given)) if expected.expose_secret() == given => Ok(EventAdmin { _private: () }),
            _ => Err(AppError::Unauthorized("Not authorized".into())),
        }
    }
}

/// Request body for a new event.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEvent {
    pub admin_code: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub date: Option<String>,
    pub end_date: Option<String>,
    pub location: Option<String>,
    pub country: Option<String>,
    pub url: Option<String>,
}

/// Events split around "now", both halves earliest first.
#[derive(Debug, Clone, Serialize)]
pub struct EventSchedule {
    pub upcoming: Vec<Event>,
    pub past: Vec<Event>,
}

pub async fn create_event(repo: &dyn EventRepo, _admin: &EventAdmin, req: NewEvent) -> Result<Event> {
    let title = non_blank(req.title);
    let date = non_blank(req.date);
    let (title, date) = match (title, date) {
        (Some(title), Some(date)) => (title, parse_event_date(&date)?),
        _ => return Err(AppError::validation("Title and date are required.")),
    };
    let end_date = non_blank(req.end_date).map(|d| parse_event_date(&d)).transpose()?;

    let event = Event {
        id: Uuid::now_v7(),
        title,
        description: non_blank(req.description),
        date,
        end_date,
        location: non_blank(req.location),
        country: non_blank(req.country),
        url: non_blank(req.url),
        created_at: Utc::now(),
    };
    repo.create_event(event.clone()).await?;

    log::info!("created event {} on {}", event.id, event.date);
    Ok(event)
}

pub async fn list_events(repo: &dyn EventRepo, now: DateTime<Utc>) -> Result<EventSchedule> {
    let (upcoming, past) = repo.list_events().await?.into_iter().partition(|e| e.date >= now);
    Ok(EventSchedule { upcoming, past })
}

pub async fn get_event(repo: &dyn EventRepo, id: Uuid) -> Result<Event> {
    repo.get_event(id)
        .await?
        .ok_or_else(|| AppError::not_found("event", id))
}

/// Local date-time shapes sent by `datetime-local` inputs, read as UTC.
const LOCAL_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"];

/// Accepts RFC 3339 timestamps, offset-less `YYYY-MM-DDTHH:MM[:SS]` and bare
/// `YYYY-MM-DD` dates (midnight). Values without an offset are UTC.
pub fn parse_event_date(raw: &str) -> Result<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    if let Some(local) = LOCAL_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
    {
        return Ok(local.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .ok_or_else(|| AppError::validation(format!("Invalid date: {raw}")))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
