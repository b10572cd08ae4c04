//! # Community
//!
//! The thread projection layer. Threads persist their category and structured
//! attributes as a flat list of `key:value` strings; this module turns that list
//! into a [`CommunityItem`] for display and encodes a creation request back into
//! it. It also hosts the community operations the HTTP layer calls.

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{Reply, Thread};
use crate::traits::CommunityRepo;

/// Bodies longer than this many characters are cut for the excerpt.
pub const EXCERPT_LEN: usize = 220;

pub const THREAD_AUTHOR: &str = "Demo User";
pub const REPLY_AUTHOR: &str = "You";
pub const MEMBER_ROLE: &str = "Community member";

/// The four thread categories. Anything else in a `tag:` entry is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Category {
    #[default]
    #[serde(rename = "Q&A")]
    QAndA,
    #[serde(rename = "Case Study")]
    CaseStudy,
    News,
    Job,
}

impl Category {
    pub const ALL: [Category; 4] = [Category::QAndA, Category::CaseStudy, Category::News, Category::Job];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::QAndA => "Q&A",
            Category::CaseStudy => "Case Study",
            Category::News => "News",
            Category::Job => "Job",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == value)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TagKey {
    Tag,
    Mine,
    MineType,
    Country,
    Commodity,
}

impl TagKey {
    fn as_str(self) -> &'static str {
        match self {
            TagKey::Tag => "tag",
            TagKey::Mine => "mine",
            TagKey::MineType => "mineType",
            TagKey::Country => "country",
            TagKey::Commodity => "commodity",
        }
    }

    fn parse(key: &str) -> Option<Self> {
        match key {
            "tag" => Some(TagKey::Tag),
            "mine" => Some(TagKey::Mine),
            "mineType" => Some(TagKey::MineType),
            "country" => Some(TagKey::Country),
            "commodity" => Some(TagKey::Commodity),
            _ => None,
        }
    }
}

/// Category and optional attributes recovered from a thread's tag list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThreadAttributes {
    pub category: Category,
    pub mine: Option<String>,
    pub mine_type: Option<String>,
    pub country: Option<String>,
    pub commodity: Option<String>,
}

impl ThreadAttributes {
    /// Decodes a tag list. Never fails: malformed entries, blank values,
    /// unknown keys and unknown categories are skipped.
    pub fn from_tags<S: AsRef<str>>(tags: &[S]) -> Self {
        let mut attrs = ThreadAttributes::default();

        for raw in tags {
            let raw = raw.as_ref();
            let (key, value) = match raw.split_once(':') {
                Some((key, value)) => (key, value.trim()),
                None => (raw, ""),
            };
            if value.is_empty() {
                continue;
            }

            match TagKey::parse(key) {
                Some(TagKey::Tag) => {
                    if let Some(category) = Category::parse(value) {
                        attrs.category = category;
                    }
                }
                Some(TagKey::Mine) => attrs.mine = Some(value.to_string()),
                Some(TagKey::MineType) => attrs.mine_type = Some(value.to_string()),
                Some(TagKey::Country) => attrs.country = Some(value.to_string()),
                Some(TagKey::Commodity) => attrs.commodity = Some(value.to_string()),
                None => log::debug!("dropping unrecognized thread tag {raw:?}"),
            }
        }

        attrs
    }
}

/// Display-ready view of a thread.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommunityItem {
    pub id: Uuid,
    pub title: String,
    pub excerpt: String,
    pub tag: Category,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mine: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mine_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commodity: Option<String>,
    pub author: &'static str,
    pub role: &'static str,
    pub created_at: String,
    pub replies: i64,
    pub likes: i64,
}

impl CommunityItem {
    pub fn from_thread(thread: &Thread) -> Self {
        let attrs = ThreadAttributes::from_tags(thread.tags.as_slice());
        Self {
            id: thread.id,
            title: thread.title.clone(),
            excerpt: excerpt(&thread.body),
            tag: attrs.category,
            mine: attrs.mine,
            mine_type: attrs.mine_type,
            country: attrs.country,
            commodity: attrs.commodity,
            author: THREAD_AUTHOR,
            role: MEMBER_ROLE,
            created_at: iso_timestamp(&thread.created_at),
            replies: thread.replies.max(0),
            likes: thread.likes.max(0),
        }
    }
}

/// Display-ready view of a reply.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyView {
    pub id: Uuid,
    pub author: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    pub body: String,
    pub created_at: String,
}

impl From<&Reply> for ReplyView {
    fn from(reply: &Reply) -> Self {
        Self {
            id: reply.id,
            author: reply.author.clone(),
            role: reply.role.clone(),
            body: reply.body.clone(),
            created_at: iso_timestamp(&reply.created_at),
        }
    }
}

/// A thread page: the item, its full body and every reply.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadDetail {
    pub thread: CommunityItem,
    pub body: String,
    pub replies: Vec<ReplyView>,
}

/// Request body for a new thread.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewThread {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: String,
    pub tag: Option<Category>,
    pub mine: Option<String>,
    pub mine_type: Option<String>,
    pub country: Option<String>,
    pub commodity: Option<String>,
}

impl NewThread {
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() || self.body.trim().is_empty() {
            return Err(AppError::validation("Title and body are required"));
        }
        Ok(())
    }

    /// Encodes category and attributes as `key:value` entries, category first.
    /// Absent or blank fields produce no entry.
    pub fn encode_tags(&self) -> Vec<String> {
        let mut tags = Vec::new();
        if let Some(category) = self.tag {
            tags.push(format!("{}:{}", TagKey::Tag.as_str(), category));
        }

        let attrs = [
            (TagKey::Mine, &self.mine),
            (TagKey::MineType, &self.mine_type),
            (TagKey::Country, &self.country),
            (TagKey::Commodity, &self.commodity),
        ];
        for (key, value) in attrs {
            if let Some(value) = value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
                tags.push(format!("{}:{}", key.as_str(), value));
            }
        }
        tags
    }
}

/// Request body for a reply.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewReply {
    #[serde(default)]
    pub body: String,
}

/// Cuts `body` to [`EXCERPT_LEN`] characters and appends an ellipsis.
/// Shorter bodies are returned unchanged.
pub fn excerpt(body: &str) -> String {
    match body.char_indices().nth(EXCERPT_LEN) {
        Some((cut, _)) => format!("{}…", body[..cut].trim_end()),
        None => body.to_string(),
    }
}

/// ISO-8601 in UTC with millisecond precision, e.g. `2026-10-18T09:30:00.000Z`.
pub fn iso_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub async fn list_threads(repo: &dyn CommunityRepo, limit: Option<i64>) -> Result<Vec<CommunityItem>> {
    let threads = repo.list_threads(limit).await?;
    Ok(threads.iter().map(CommunityItem::from_thread).collect())
}

pub async fn create_thread(repo: &dyn CommunityRepo, req: NewThread) -> Result<CommunityItem> {
    req.validate()?;

    let thread = Thread {
        id: Uuid::now_v7(),
        title: req.title.trim().to_string(),
        body: req.body.clone(),
        tags: req.encode_tags(),
        likes: 0,
        replies: 0,
        created_at: Utc::now(),
    };
    repo.create_thread(thread.clone()).await?;

    log::info!("created thread {} with tags {:?}", thread.id, thread.tags);
    Ok(CommunityItem::from_thread(&thread))
}

pub async fn thread_detail(repo: &dyn CommunityRepo, id: Uuid) -> Result<ThreadDetail> {
    let (thread, replies) = repo
        .get_thread(id)
        .await?
        .ok_or_else(|| AppError::not_found("thread", id))?;

    Ok(ThreadDetail {
        thread: CommunityItem::from_thread(&thread),
        body: thread.body,
        replies: replies.iter().map(ReplyView::from).collect(),
    })
}

pub async fn like_thread(repo: &dyn CommunityRepo, id: Uuid) -> Result<i64> {
    repo.increment_likes(id)
        .await?
        .ok_or_else(|| AppError::not_found("thread", id))
}

pub async fn add_reply(repo: &dyn CommunityRepo, thread_id: Uuid, req: NewReply) -> Result<ReplyView> {
    let body = req.body.trim();
    if body.is_empty() {
        return Err(AppError::validation("Reply body is required"));
    }

    let reply = Reply {
        id: Uuid::now_v7(),
        thread_id,
        author: REPLY_AUTHOR.to_string(),
        role: Some(MEMBER_ROLE.to_string()),
        body: body.to_string(),
        created_at: Utc::now(),
    };
    if !repo.create_reply(reply.clone()).await? {
        return Err(AppError::not_found("thread", thread_id));
    }

    log::info!("reply {} added to thread {}", reply.id, thread_id);
    Ok(ReplyView::from(&reply))
}
