//! # mh-db-sqlite Implementation
//!
//! This module implements the data mapping between the SQLite relational model
//! and the `mh-core` domain models.

use std::str::FromStr;

use anyhow::Context;
use async_trait::async_trait;
use mh_core::models::{Event, Project, Reply, Thread, User};
use mh_core::projects::{ProjectChanges, ProjectDraft};
use mh_core::traits::{CommunityRepo, EventRepo, ProjectRepo};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use uuid::Uuid;

/// Tables are created on connect if missing. There is no migration step.
const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS threads (
        id         BLOB PRIMARY KEY,
        title      TEXT NOT NULL,
        body       TEXT NOT NULL,
        tags       TEXT NOT NULL DEFAULT '[]',
        likes      INTEGER NOT NULL DEFAULT 0,
        replies    INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS replies (
        id         BLOB PRIMARY KEY,
        thread_id  BLOB NOT NULL REFERENCES threads(id),
        author     TEXT NOT NULL,
        role       TEXT,
        body       TEXT NOT NULL,
        created_at TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS replies_by_thread ON replies (thread_id, created_at)",
    "CREATE TABLE IF NOT EXISTS events (
        id          BLOB PRIMARY KEY,
        title       TEXT NOT NULL,
        description TEXT,
        date        TEXT NOT NULL,
        end_date    TEXT,
        location    TEXT,
        country     TEXT,
        url         TEXT,
        created_at  TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS users (
        id    BLOB PRIMARY KEY,
        email TEXT NOT NULL UNIQUE,
        name  TEXT
    )",
    "CREATE TABLE IF NOT EXISTS projects (
        id         BLOB PRIMARY KEY,
        title      TEXT NOT NULL,
        summary    TEXT,
        tags       TEXT NOT NULL DEFAULT '[]',
        owner_id   BLOB NOT NULL REFERENCES users(id),
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )",
];

const PROJECT_SELECT: &str = "SELECT p.id, p.title, p.summary, p.tags, p.owner_id, p.created_at, p.updated_at,
        u.email AS owner_email, u.name AS owner_name
    FROM projects p JOIN users u ON u.id = p.owner_id";

/// One pool serves every repository port.
#[derive(Clone)]
pub struct SqliteRepo {
    pool: SqlitePool,
}

impl SqliteRepo {
    /// Connects to `url` and creates missing tables.
    ///
    /// # Developer Note
    /// Every connection to `sqlite::memory:` opens its own empty database, so
    /// in-memory URLs get a single connection that is never recycled.
    pub async fn new(url: &str) -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .with_context(|| format!("invalid database url {url}"))?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool_options = if url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };
        let pool = pool_options.connect_with(options).await?;

        for statement in SCHEMA {
            sqlx::query(statement).execute(&pool).await?;
        }
        log::info!("connected to {url}");

        Ok(Self { pool })
    }
}

fn tags_to_json(tags: &[String]) -> anyhow::Result<String> {
    Ok(serde_json::to_string(tags)?)
}

fn tags_from_row(row: &SqliteRow) -> anyhow::Result<Vec<String>> {
    let raw: String = row.try_get("tags")?;
    serde_json::from_str(&raw).with_context(|| format!("corrupt tags column: {raw}"))
}

fn thread_from_row(row: &SqliteRow) -> anyhow::Result<Thread> {
    Ok(Thread {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        body: row.try_get("body")?,
        tags: tags_from_row(row)?,
        likes: row.try_get("likes")?,
        replies: row.try_get("replies")?,
        created_at: row.try_get("created_at")?,
    })
}

fn reply_from_row(row: &SqliteRow) -> anyhow::Result<Reply> {
    Ok(Reply {
        id: row.try_get("id")?,
        thread_id: row.try_get("thread_id")?,
        author: row.try_get("author")?,
        role: row.try_get("role")?,
        body: row.try_get("body")?,
        created_at: row.try_get("created_at")?,
    })
}

fn event_from_row(row: &SqliteRow) -> anyhow::Result<Event> {
    Ok(Event {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        date: row.try_get("date")?,
        end_date: row.try_get("end_date")?,
        location: row.try_get("location")?,
        country: row.try_get("country")?,
        url: row.try_get("url")?,
        created_at: row.try_get("created_at")?,
    })
}

fn project_from_row(row: &SqliteRow) -> anyhow::Result<Project> {
    let owner_id: Uuid = row.try_get("owner_id")?;
    Ok(Project {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        summary: row.try_get("summary")?,
        tags: tags_from_row(row)?,
        owner_id,
        owner: User {
            id: owner_id,
            email: row.try_get("owner_email")?,
            name: row.try_get("owner_name")?,
        },
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[async_trait]
impl CommunityRepo for SqliteRepo {
    async fn create_thread(&self, thread: Thread) -> anyhow::Result<()> {
        sqlx::query("INSERT INTO threads (id, title, body, tags, likes, replies, created_at) VALUES (?, ?, ?, ?, ?, ?, ?)")
            .bind(thread.id)
            .bind(&thread.title)
            .bind(&thread.body)
            .bind(tags_to_json(&thread.tags)?)
            .bind(thread.likes)
            .bind(thread.replies)
            .bind(thread.created_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list_threads(&self, limit: Option<i64>) -> anyhow::Result<Vec<Thread>> {
        // LIMIT -1 means no limit in SQLite
        sqlx::query("SELECT * FROM threads ORDER BY created_at DESC, id DESC LIMIT ?")
            .bind(limit.unwrap_or(-1))
            .fetch_all(&self.pool)
            .await?
            .iter()
            .map(thread_from_row)
            .collect()
    }

    /// Retrieves a thread and all its replies in a single logical operation.
    async fn get_thread(&self, id: Uuid) -> anyhow::Result<Option<(Thread, Vec<Reply>)>> {
        let thread = match sqlx::query("SELECT * FROM threads WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
        {
            Some(row) => thread_from_row(&row)?,
            None => return Ok(None),
        };

        let replies = sqlx::query("SELECT * FROM replies WHERE thread_id = ? ORDER BY created_at ASC, id ASC")
            .bind(id)
            .fetch_all(&self.pool)
            .await?
            .iter()
            .map(reply_from_row)
            .collect::<anyhow::Result<Vec<_>>>()?;

        Ok(Some((thread, replies)))
    }

    async fn increment_likes(&self, id: Uuid) -> anyhow::Result<Option<i64>> {
        let likes = sqlx::query_scalar("UPDATE threads SET likes = likes + 1 WHERE id = ? RETURNING likes")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(likes)
    }

    /// # Developer Note
    /// The counter bump and the insert share a transaction so `threads.replies`
    /// always equals the number of reply rows.
    async fn create_reply(&self, reply: Reply) -> anyhow::Result<bool> {
        let mut tx = self.pool.begin().await?;

        let bumped = sqlx::query("UPDATE threads SET replies = replies + 1 WHERE id = ?")
            .bind(reply.thread_id)
            .execute(&mut *tx)
            .await?;
        if bumped.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        sqlx::query("INSERT INTO replies (id, thread_id, author, role, body, created_at) VALUES (?, ?, ?, ?, ?, ?)")
            .bind(reply.id)
            .bind(reply.thread_id)
            .bind(&reply.author)
            .bind(&reply.role)
            .bind(&reply.body)
            .bind(reply.created_at)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(true)
    }
}

#[async_trait]
impl EventRepo for SqliteRepo {
    async fn create_event(&self, event: Event) -> anyhow::Result<()> {
        sqlx::query("INSERT INTO events (id, title, description, date, end_date, location, country, url, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)")
            .bind(event.id)
            .bind(&event.title)
            .bind(&event.description)
            .bind(event.date)
            .bind(event.end_date)
            .bind(&event.location)
            .bind(&event.country)
            .bind(&event.url)
            .bind(event.created_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list_events(&self) -> anyhow::Result<Vec<Event>> {
        sqlx::query("SELECT * FROM events ORDER BY date ASC, id ASC")
            .fetch_all(&self.pool)
            .await?
            .iter()
            .map(event_from_row)
            .collect()
    }

    async fn get_event(&self, id: Uuid) -> anyhow::Result<Option<Event>> {
        sqlx::query("SELECT * FROM events WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .as_ref()
            .map(event_from_row)
            .transpose()
    }
}

#[async_trait]
impl ProjectRepo for SqliteRepo {
    /// Owner upsert and project insert share a transaction, so a failed
    /// insert leaves no orphan owner behind.
    async fn create_project(&self, draft: ProjectDraft) -> anyhow::Result<Project> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("INSERT INTO users (id, email, name) VALUES (?, ?, ?) ON CONFLICT(email) DO NOTHING")
            .bind(Uuid::now_v7())
            .bind(&draft.owner_email)
            .bind(&draft.owner_name)
            .execute(&mut *tx)
            .await?;
        let owner_id: Uuid = sqlx::query_scalar("SELECT id FROM users WHERE email = ?")
            .bind(&draft.owner_email)
            .fetch_one(&mut *tx)
            .await?;

        sqlx::query("INSERT INTO projects (id, title, summary, tags, owner_id, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?)")
            .bind(draft.id)
            .bind(&draft.title)
            .bind(&draft.summary)
            .bind(tags_to_json(&draft.tags)?)
            .bind(owner_id)
            .bind(draft.created_at)
            .bind(draft.created_at)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        self.get_project(draft.id)
            .await?
            .with_context(|| format!("project {} missing after insert", draft.id))
    }

    async fn list_projects(&self, limit: Option<i64>, offset: i64) -> anyhow::Result<Vec<Project>> {
        let sql = format!("{PROJECT_SELECT} ORDER BY p.created_at DESC, p.id DESC LIMIT ? OFFSET ?");
        sqlx::query(&sql)
            .bind(limit.unwrap_or(-1))
            .bind(offset)
            .fetch_all(&self.pool)
            .await?
            .iter()
            .map(project_from_row)
            .collect()
    }

    async fn count_projects(&self) -> anyhow::Result<i64> {
        Ok(sqlx::query_scalar("SELECT COUNT(*) FROM projects")
            .fetch_one(&self.pool)
            .await?)
    }

    async fn get_project(&self, id: Uuid) -> anyhow::Result<Option<Project>> {
        let sql = format!("{PROJECT_SELECT} WHERE p.id = ?");
        sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .as_ref()
            .map(project_from_row)
            .transpose()
    }

    async fn update_project(&self, id: Uuid, changes: ProjectChanges) -> anyhow::Result<Option<Project>> {
        let tags = changes.tags.as_deref().map(tags_to_json).transpose()?;
        let updated = sqlx::query(
            "UPDATE projects SET
                title = COALESCE(?, title),
                summary = CASE WHEN ? THEN ? ELSE summary END,
                tags = COALESCE(?, tags),
                updated_at = ?
             WHERE id = ?",
        )
        .bind(&changes.title)
        .bind(changes.summary.is_some())
        .bind(changes.summary.clone().flatten())
        .bind(tags)
        .bind(changes.updated_at)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if updated.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_project(id).await
    }

    async fn delete_project(&self, id: Uuid) -> anyhow::Result<bool> {
        let deleted = sqlx::query("DELETE FROM projects WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(deleted.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    async fn repo() -> SqliteRepo {
        SqliteRepo::new("sqlite::memory:").await.expect("in-memory database")
    }

    fn thread(title: &str, tags: &[&str]) -> Thread {
        Thread {
            id: Uuid::now_v7(),
            title: title.into(),
            body: "body".into(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            likes: 0,
            replies: 0,
            created_at: Utc::now(),
        }
    }

    fn reply(thread_id: Uuid, body: &str) -> Reply {
        Reply {
            id: Uuid::now_v7(),
            thread_id,
            author: "You".into(),
            role: Some("Community member".into()),
            body: body.into(),
            created_at: Utc::now(),
        }
    }

    fn draft(title: &str, email: &str) -> ProjectDraft {
        ProjectDraft {
            id: Uuid::now_v7(),
            title: title.into(),
            summary: Some("summary".into()),
            tags: vec!["dewatering".into()],
            owner_email: email.into(),
            owner_name: "Demo User".into(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_threads_round_trip_newest_first() {
        let repo = repo().await;
        let mut older = thread("older", &["tag:News"]);
        older.created_at = Utc::now() - Duration::minutes(5);
        let newer = thread("newer", &["tag:Case Study", "country:Germany"]);

        repo.create_thread(older).await.unwrap();
        repo.create_thread(newer.clone()).await.unwrap();

        let listed = repo.list_threads(None).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, newer.id);
        assert_eq!(listed[0].tags, newer.tags);

        assert_eq!(repo.list_threads(Some(1)).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_likes_increment_by_one() {
        let repo = repo().await;
        let t = thread("liked", &[]);
        repo.create_thread(t.clone()).await.unwrap();

        assert_eq!(repo.increment_likes(t.id).await.unwrap(), Some(1));
        assert_eq!(repo.increment_likes(t.id).await.unwrap(), Some(2));
        assert_eq!(repo.increment_likes(Uuid::now_v7()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_concurrent_likes_all_apply() {
        let repo = repo().await;
        let t = thread("popular", &[]);
        let id = t.id;
        repo.create_thread(t).await.unwrap();

        let handles: Vec<_> = (0..10)
            .map(|_| {
                let repo = repo.clone();
                tokio::spawn(async move { repo.increment_likes(id).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let (stored, _) = repo.get_thread(id).await.unwrap().unwrap();
        assert_eq!(stored.likes, 10);
    }

    #[tokio::test]
    async fn test_reply_bumps_counter_with_row() {
        let repo = repo().await;
        let t = thread("asked", &[]);
        repo.create_thread(t.clone()).await.unwrap();

        assert!(repo.create_reply(reply(t.id, "first")).await.unwrap());
        assert!(repo.create_reply(reply(t.id, "second")).await.unwrap());

        let (stored, replies) = repo.get_thread(t.id).await.unwrap().unwrap();
        assert_eq!(stored.replies, 2);
        assert_eq!(replies.len(), 2);
        assert_eq!(replies[0].body, "first");
    }

    #[tokio::test]
    async fn test_reply_to_missing_thread_writes_nothing() {
        let repo = repo().await;
        assert!(!repo.create_reply(reply(Uuid::now_v7(), "orphan")).await.unwrap());

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM replies")
            .fetch_one(&repo.pool)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_events_ordered_by_date() {
        let repo = repo().await;
        let now = Utc::now();
        for (title, offset) in [("later", 30), ("sooner", 2)] {
            repo.create_event(Event {
                id: Uuid::now_v7(),
                title: title.into(),
                description: None,
                date: now + Duration::days(offset),
                end_date: None,
                location: Some("Freiberg".into()),
                country: None,
                url: None,
                created_at: now,
            })
            .await
            .unwrap();
        }

        let events = repo.list_events().await.unwrap();
        assert_eq!(events[0].title, "sooner");
        assert_eq!(repo.get_event(events[1].id).await.unwrap().unwrap().title, "later");
    }

    #[tokio::test]
    async fn test_projects_share_upserted_owner() {
        let repo = repo().await;
        let a = repo.create_project(draft("Pit lake", "eng@example.com")).await.unwrap();
        let b = repo.create_project(draft("Heap leach", "eng@example.com")).await.unwrap();

        assert_eq!(a.owner_id, b.owner_id);
        assert_eq!(repo.count_projects().await.unwrap(), 2);

        let page = repo.list_projects(Some(1), 1).await.unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].id, a.id);
    }

    #[tokio::test]
    async fn test_project_update_and_delete() {
        let repo = repo().await;
        let p = repo.create_project(draft("Pit lake", "eng@example.com")).await.unwrap();

        let changes = ProjectChanges {
            title: Some("Pit lake closure".into()),
            summary: Some(None),
            tags: None,
            updated_at: Utc::now(),
        };
        let updated = repo.update_project(p.id, changes).await.unwrap().unwrap();
        assert_eq!(updated.title, "Pit lake closure");
        assert_eq!(updated.summary, None);
        assert_eq!(updated.tags, vec!["dewatering".to_string()]);

        assert!(repo.delete_project(p.id).await.unwrap());
        assert!(!repo.delete_project(p.id).await.unwrap());
        assert!(repo.update_project(p.id, ProjectChanges::default()).await.unwrap().is_none());
    }
}
