use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    auth::dto::PublicUser,
    pagination::{lenient_number, Pagination},
    store::{PostAuthor, PostStatus, RecentPost, UsageStats},
};

pub const DEFAULT_RECENT_LIMIT: i64 = 20;
pub const MAX_RECENT_LIMIT: i64 = 100;

#[derive(Debug, Default, Deserialize)]
pub struct RecentQuery {
    #[serde(default, deserialize_with = "lenient_number")]
    pub limit: Option<i64>,
}

impl RecentQuery {
    pub fn resolve(&self) -> i64 {
        self.limit
            .filter(|n| *n != 0)
            .unwrap_or(DEFAULT_RECENT_LIMIT)
            .clamp(1, MAX_RECENT_LIMIT)
    }
}

#[derive(Debug, Serialize, PartialEq)]
pub struct TotalStats {
    pub users: i64,
    pub blogs: i64,
    pub words: i64,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct TodayStats {
    pub users: i64,
    pub blogs: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub total: TotalStats,
    pub today: TodayStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_generation_time: Option<i64>,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

impl StatsResponse {
    pub fn new(s: UsageStats, timestamp: OffsetDateTime) -> Self {
        Self {
            total: TotalStats {
                users: s.total_users,
                blogs: s.total_blogs,
                words: s.total_words,
            },
            today: TodayStats {
                users: s.today_users,
                blogs: s.today_blogs,
            },
            avg_generation_time: s.avg_generation_ms.map(|ms| ms.round() as i64),
            timestamp,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentGeneration {
    pub id: Uuid,
    pub title: String,
    pub topic: String,
    pub word_count: i32,
    pub generation_time: i64,
    pub status: PostStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub user: Option<PostAuthor>,
}

impl From<RecentPost> for RecentGeneration {
    fn from(r: RecentPost) -> Self {
        let p = r.post;
        Self {
            id: p.id,
            title: p.title,
            topic: p.topic,
            word_count: p.word_count,
            generation_time: p.generation_time_ms,
            status: p.status,
            created_at: p.created_at,
            user: r.author,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentGenerationsResponse {
    pub recent_generations: Vec<RecentGeneration>,
}

#[derive(Debug, Serialize)]
pub struct UsersResponse {
    pub users: Vec<PublicUser>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize)]
pub struct MakeAdminResponse {
    pub message: &'static str,
    pub user: PublicUser,
}
