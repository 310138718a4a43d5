use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// User record.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String, // argon2 PHC string
    pub name: String,
    pub is_admin: bool,
    pub generation_count: i32,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    Generating,
    Completed,
    Failed,
}

impl PostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostStatus::Generating => "generating",
            PostStatus::Completed => "completed",
            PostStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for PostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PostStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "generating" => Ok(PostStatus::Generating),
            "completed" => Ok(PostStatus::Completed),
            "failed" => Ok(PostStatus::Failed),
            other => anyhow::bail!("unknown post status {other:?}"),
        }
    }
}

/// Generated blog post. `word_count` is derived from `content` by the store.
#[derive(Debug, Clone, Serialize)]
pub struct BlogPost {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub content: String,
    pub topic: String,
    pub word_count: i32,
    pub status: PostStatus,
    pub generation_time_ms: i64,
    pub created_at: OffsetDateTime,
}

/// Insert payload; the store derives `word_count` from `content`.
#[derive(Debug, Clone)]
pub struct NewBlogPost {
    pub user_id: Uuid,
    pub title: String,
    pub content: String,
    pub topic: String,
    pub status: PostStatus,
    pub generation_time_ms: i64,
}

impl NewBlogPost {
    pub fn word_count(&self) -> i32 {
        word_count(&self.content)
    }
}

/// Number of whitespace-delimited, non-empty tokens.
pub fn word_count(content: &str) -> i32 {
    i32::try_from(content.split_whitespace().count()).unwrap_or(i32::MAX)
}

/// Row shape of `blog_posts`; status is stored as text.
#[derive(Debug, FromRow)]
pub struct BlogPostRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub content: String,
    pub topic: String,
    pub word_count: i32,
    pub status: String,
    pub generation_time_ms: i64,
    pub created_at: OffsetDateTime,
}

impl TryFrom<BlogPostRow> for BlogPost {
    type Error = anyhow::Error;

    fn try_from(r: BlogPostRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: r.id,
            user_id: r.user_id,
            title: r.title,
            content: r.content,
            topic: r.topic,
            word_count: r.word_count,
            status: r.status.parse()?,
            generation_time_ms: r.generation_time_ms,
            created_at: r.created_at,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PostAuthor {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

/// A post joined with its author, for the admin activity feed.
#[derive(Debug, Clone)]
pub struct RecentPost {
    pub post: BlogPost,
    pub author: Option<PostAuthor>,
}

#[derive(Debug, Clone, Default, PartialEq, FromRow)]
pub struct UsageStats {
    pub total_users: i64,
    pub total_blogs: i64,
    pub total_words: i64,
    pub today_users: i64,
    pub today_blogs: i64,
    pub avg_generation_ms: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn word_count_ignores_runs_of_whitespace() {
        assert_eq!(word_count(""), 0);
        assert_eq!(word_count("   \n\t "), 0);
        assert_eq!(word_count("# Title\n\nOne  two\tthree\n"), 5);
    }

    #[test]
    fn status_round_trips_through_text() {
        for s in [PostStatus::Generating, PostStatus::Completed, PostStatus::Failed] {
            assert_eq!(s.as_str().parse::<PostStatus>().unwrap(), s);
        }
        assert!("done".parse::<PostStatus>().is_err());
    }

    #[test]
    fn row_with_unknown_status_is_rejected() {
        let row = BlogPostRow {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            title: "t".into(),
            content: "c".into(),
            topic: "t".into(),
            word_count: 1,
            status: "bogus".into(),
            generation_time_ms: 1,
            created_at: OffsetDateTime::now_utc(),
        };
        assert!(BlogPost::try_from(row).is_err());
    }
}
