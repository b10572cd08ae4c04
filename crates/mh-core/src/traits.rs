//! # Core Traits (Ports)
//!
//! Any storage plugin must implement these traits to be used by the binary.
//! "No such row" is reported through `Option`/`bool`; `Err` is reserved for
//! infrastructure failures.

use crate::models::{Event, Project, Reply, Thread};
use crate::projects::{ProjectChanges, ProjectDraft};
use async_trait::async_trait;
use uuid::Uuid;

/// Persistence contract for community threads and their replies.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CommunityRepo: Send + Sync {
    async fn create_thread(&self, thread: Thread) -> anyhow::Result<()>;

    /// Newest first. `None` returns every thread.
    async fn list_threads(&self, limit: Option<i64>) -> anyhow::Result<Vec<Thread>>;

    /// The thread with its replies, oldest reply first.
    async fn get_thread(&self, id: Uuid) -> anyhow::Result<Option<(Thread, Vec<Reply>)>>;

    /// Adds one like and returns the new count, in a single statement.
    async fn increment_likes(&self, id: Uuid) -> anyhow::Result<Option<i64>>;

    /// Bumps the owning thread's counter, then inserts the reply, in one transaction.
    /// Returns `false` (and writes nothing) when the thread does not exist.
    async fn create_reply(&self, reply: Reply) -> anyhow::Result<bool>;
}

/// Persistence contract for events.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EventRepo: Send + Sync {
    async fn create_event(&self, event: Event) -> anyhow::Result<()>;

    /// Ordered by event date, earliest first.
    async fn list_events(&self) -> anyhow::Result<Vec<Event>>;

    async fn get_event(&self, id: Uuid) -> anyhow::Result<Option<Event>>;
}

/// Persistence contract for projects and their owners.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProjectRepo: Send + Sync {
    /// Upserts the owner by email, then inserts the project.
    async fn create_project(&self, draft: ProjectDraft) -> anyhow::Result<Project>;

    /// Newest first.
    async fn list_projects(&self, limit: Option<i64>, offset: i64) -> anyhow::Result<Vec<Project>>;

    async fn count_projects(&self) -> anyhow::Result<i64>;

    async fn get_project(&self, id: Uuid) -> anyhow::Result<Option<Project>>;

    async fn update_project(&self, id: Uuid, changes: ProjectChanges) -> anyhow::Result<Option<Project>>;

    async fn delete_project(&self, id: Uuid) -> anyhow::Result<bool>;
}
