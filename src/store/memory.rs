use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    models::{NewBlogPost, NewUser, PostAuthor, RecentPost, UsageStats, User},
    BlogPost, Store, StoreError, StoreResult,
};
use crate::pagination::PageRequest;

/// Process-local store used when no database is configured, and in tests.
/// Vectors are kept in insertion order, so iterating in reverse is newest first.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    users: Vec<User>,
    posts: Vec<BlogPost>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn page_of<T>(newest_first: impl Iterator<Item = T>, page: PageRequest) -> Vec<T> {
    newest_first
        .skip(usize::try_from(page.skip()).unwrap_or(usize::MAX))
        .take(usize::try_from(page.limit).unwrap_or(0))
        .collect()
}

#[async_trait]
impl Store for MemoryStore {
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner.users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner.users.iter().find(|u| u.id == id).cloned())
    }

    async fn create_user(&self, new: NewUser) -> StoreResult<User> {
        let mut inner = self.inner.write().await;
        if inner.users.iter().any(|u| u.email == new.email) {
            return Err(StoreError::Duplicate("User"));
        }
        let user = User {
            id: Uuid::new_v4(),
            email: new.email,
            password_hash: new.password_hash,
            name: new.name,
            is_admin: false,
            generation_count: 0,
            created_at: OffsetDateTime::now_utc(),
        };
        inner.users.push(user.clone());
        Ok(user)
    }

    async fn set_admin(&self, id: Uuid, is_admin: bool) -> StoreResult<Option<User>> {
        let mut inner = self.inner.write().await;
        Ok(inner.users.iter_mut().find(|u| u.id == id).map(|u| {
            u.is_admin = is_admin;
            u.clone()
        }))
    }

    async fn list_users(&self, page: PageRequest) -> StoreResult<(Vec<User>, i64)> {
        let inner = self.inner.read().await;
        let users = page_of(inner.users.iter().rev().cloned(), page);
        Ok((users, inner.users.len() as i64))
    }

    async fn record_generation(&self, new: NewBlogPost) -> StoreResult<BlogPost> {
        let mut inner = self.inner.write().await;
        let owner = inner
            .users
            .iter_mut()
            .find(|u| u.id == new.user_id)
            .ok_or(StoreError::Missing("User"))?;
        owner.generation_count += 1;

        let post = BlogPost {
            id: Uuid::new_v4(),
            user_id: new.user_id,
            word_count: new.word_count(),
            title: new.title,
            content: new.content,
            topic: new.topic,
            status: new.status,
            generation_time_ms: new.generation_time_ms,
            created_at: OffsetDateTime::now_utc(),
        };
        inner.posts.push(post.clone());
        Ok(post)
    }

    async fn list_posts_by_owner(
        &self,
        owner: Uuid,
        page: PageRequest,
    ) -> StoreResult<(Vec<BlogPost>, i64)> {
        let inner = self.inner.read().await;
        let total = inner.posts.iter().filter(|p| p.user_id == owner).count() as i64;
        let owned = inner.posts.iter().rev().filter(|p| p.user_id == owner).cloned();
        Ok((page_of(owned, page), total))
    }

    async fn find_post(&self, owner: Uuid, id: Uuid) -> StoreResult<Option<BlogPost>> {
        let inner = self.inner.read().await;
        Ok(inner
            .posts
            .iter()
            .find(|p| p.id == id && p.user_id == owner)
            .cloned())
    }

    async fn delete_post(&self, owner: Uuid, id: Uuid) -> StoreResult<bool> {
        let mut inner = self.inner.write().await;
        let before = inner.posts.len();
        inner.posts.retain(|p| !(p.id == id && p.user_id == owner));
        Ok(inner.posts.len() != before)
    }

    async fn recent_posts(&self, limit: i64) -> StoreResult<Vec<RecentPost>> {
        let inner = self.inner.read().await;
        let take = usize::try_from(limit).unwrap_or(0);
        Ok(inner
            .posts
            .iter()
            .rev()
            .take(take)
            .map(|p| RecentPost {
                post: p.clone(),
                author: inner.users.iter().find(|u| u.id == p.user_id).map(|u| PostAuthor {
                    id: u.id,
                    name: u.name.clone(),
                    email: u.email.clone(),
                }),
            })
            .collect())
    }

    async fn usage_stats(&self, since: OffsetDateTime) -> StoreResult<UsageStats> {
        let inner = self.inner.read().await;
        let total_blogs = inner.posts.len() as i64;
        let avg_generation_ms = (total_blogs > 0).then(|| {
            inner.posts.iter().map(|p| p.generation_time_ms as f64).sum::<f64>()
                / total_blogs as f64
        });
        Ok(UsageStats {
            total_users: inner.users.len() as i64,
            total_blogs,
            total_words: inner.posts.iter().map(|p| i64::from(p.word_count)).sum(),
            today_users: inner.users.iter().filter(|u| u.created_at >= since).count() as i64,
            today_blogs: inner.posts.iter().filter(|p| p.created_at >= since).count() as i64,
            avg_generation_ms,
        })
    }
}
