//! # Domain Models
//!
//! These structs represent the persisted entities of MiningHub.
//! We use UUID v7 for time-ordered, globally unique identification.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A community discussion post.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Thread {
    pub id: Uuid,
    pub title: String,
    pub body: String,
    /// Flat `key:value` encoding of category and attributes (see `community`)
    pub tags: Vec<String>,
    pub likes: i64,
    /// Kept in step with the reply rows by the store's transaction
    pub replies: i64,
    pub created_at: DateTime<Utc>,
}

/// A response to a [`Thread`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reply {
    pub id: Uuid,
    pub thread_id: Uuid,
    pub author: String,
    pub role: Option<String>,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

/// A conference, workshop or meetup.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub country: Option<String>,
    pub url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Project owner. Only ever created through the project upsert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
}

/// A case study or pilot shared on the projects page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: Uuid,
    pub title: String,
    pub summary: Option<String>,
    pub tags: Vec<String>,
    pub owner_id: Uuid,
    pub owner: User,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
