//! Persistence seam. Handlers and the generation orchestrator only see [`Store`].

mod memory;
pub mod models;
mod postgres;

use async_trait::async_trait;
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

pub use memory::MemoryStore;
pub use models::{
    word_count, BlogPost, NewBlogPost, NewUser, PostAuthor, PostStatus, RecentPost, UsageStats,
    User,
};
pub use postgres::PgStore;

use crate::pagination::PageRequest;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0} already exists")]
    Duplicate(&'static str),

    #[error("{0} not found")]
    Missing(&'static str),

    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait Store: Send + Sync {
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>>;
    /// Fails with [`StoreError::Duplicate`] when the email is taken.
    async fn create_user(&self, new: NewUser) -> StoreResult<User>;
    async fn set_admin(&self, id: Uuid, is_admin: bool) -> StoreResult<Option<User>>;
    /// Newest first, with the total user count.
    async fn list_users(&self, page: PageRequest) -> StoreResult<(Vec<User>, i64)>;

    /// Inserts the post and bumps the owner's generation counter as one unit.
    async fn record_generation(&self, new: NewBlogPost) -> StoreResult<BlogPost>;
    /// Owner's posts, newest first, with the owner's total post count.
    async fn list_posts_by_owner(
        &self,
        owner: Uuid,
        page: PageRequest,
    ) -> StoreResult<(Vec<BlogPost>, i64)>;
    async fn find_post(&self, owner: Uuid, id: Uuid) -> StoreResult<Option<BlogPost>>;
    /// Returns false when no post with that id belongs to `owner`.
    async fn delete_post(&self, owner: Uuid, id: Uuid) -> StoreResult<bool>;
    async fn recent_posts(&self, limit: i64) -> StoreResult<Vec<RecentPost>>;
    async fn usage_stats(&self, since: OffsetDateTime) -> StoreResult<UsageStats>;
}
