//! # mh-ui
//!
//! Askama templates for the server-rendered pages.

use askama::Template;
use mh_core::community::{CommunityItem, ThreadDetail};
use mh_core::events::EventSchedule;
use mh_core::models::{Event, Project};
use mh_core::projects::ProjectPage;

#[derive(Template)]
#[template(path = "home.html")]
pub struct HomeTemplate<'a> {
    pub projects: &'a [Project],
    pub threads: &'a [CommunityItem],
    pub events: &'a [Event],
}

#[derive(Template)]
#[template(path = "community.html")]
pub struct CommunityTemplate<'a> {
    pub items: &'a [CommunityItem],
}

#[derive(Template)]
#[template(path = "thread.html")]
pub struct ThreadTemplate<'a> {
    pub detail: &'a ThreadDetail,
}

#[derive(Template)]
#[template(path = "events.html")]
pub struct EventsTemplate<'a> {
    pub schedule: &'a EventSchedule,
}

#[derive(Template)]
#[template(path = "event.html")]
pub struct EventTemplate<'a> {
    pub event: &'a Event,
}

#[derive(Template)]
#[template(path = "projects.html")]
pub struct ProjectsTemplate<'a> {
    pub page: &'a ProjectPage,
}

#[derive(Template)]
#[template(path = "project.html")]
pub struct ProjectTemplate<'a> {
    pub project: &'a Project,
}

#[derive(Template)]
#[template(path = "not_found.html")]
pub struct NotFoundTemplate<'a> {
    /// "thread", "event", ...
    pub what: &'a str,
}

mod filters {
    use std::fmt::Display;

    /// Escapes user text and keeps its line breaks.
    pub fn paragraphs<T: Display>(raw: T) -> askama::Result<String> {
        let raw = raw.to_string();
        let escaped = html_escape::encode_safe(&raw);
        Ok(escaped.lines().collect::<Vec<_>>().join("<br />"))
    }
}
