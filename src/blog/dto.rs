use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    pagination::Pagination,
    store::{BlogPost, PostStatus},
};

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    #[serde(default)]
    pub topic: String,
}

/// Post as returned right after generation.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedBlog {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub topic: String,
    pub word_count: i32,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<BlogPost> for GeneratedBlog {
    fn from(p: BlogPost) -> Self {
        Self {
            id: p.id,
            title: p.title,
            content: p.content,
            topic: p.topic,
            word_count: p.word_count,
            created_at: p.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub message: &'static str,
    pub blog: GeneratedBlog,
}

/// List entry, without the body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogSummary {
    pub id: Uuid,
    pub title: String,
    pub topic: String,
    pub word_count: i32,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub generation_time: i64,
    pub status: PostStatus,
}

impl From<BlogPost> for BlogSummary {
    fn from(p: BlogPost) -> Self {
        Self {
            id: p.id,
            title: p.title,
            topic: p.topic,
            word_count: p.word_count,
            created_at: p.created_at,
            generation_time: p.generation_time_ms,
            status: p.status,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MyBlogsResponse {
    pub blogs: Vec<BlogSummary>,
    pub pagination: Pagination,
}

/// The full stored document.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogDocument {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub content: String,
    pub topic: String,
    pub word_count: i32,
    pub status: PostStatus,
    pub generation_time: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<BlogPost> for BlogDocument {
    fn from(p: BlogPost) -> Self {
        Self {
            id: p.id,
            user_id: p.user_id,
            title: p.title,
            content: p.content,
            topic: p.topic,
            word_count: p.word_count,
            status: p.status,
            generation_time: p.generation_time_ms,
            created_at: p.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BlogResponse {
    pub blog: BlogDocument,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}
