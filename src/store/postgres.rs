use anyhow::Context;
use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, FromRow, PgPool};
use time::OffsetDateTime;
use tracing::{debug, info};
use uuid::Uuid;

use super::{
    models::{BlogPostRow, NewBlogPost, NewUser, PostAuthor, RecentPost, UsageStats, User},
    BlogPost, Store, StoreError, StoreResult,
};
use crate::pagination::PageRequest;

const USER_COLUMNS: &str = "id, email, password_hash, name, is_admin, generation_count, created_at";
const POST_COLUMNS: &str =
    "id, user_id, title, content, topic, word_count, status, generation_time_ms, created_at";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

#[derive(Debug, FromRow)]
struct RecentPostRow {
    #[sqlx(flatten)]
    post: BlogPostRow,
    author_id: Option<Uuid>,
    author_name: Option<String>,
    author_email: Option<String>,
}

impl PgStore {
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .context("connect to database")?;
        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("run migrations")?;
        info!("database migrations applied");
        Ok(())
    }

    /// Earliest registered user, used by the `make-admin` tool.
    pub async fn earliest_user(&self) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at ASC LIMIT 1"
        ))
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_unique_violation())
}

#[async_trait]
impl Store for PgStore {
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn create_user(&self, new: NewUser) -> StoreResult<User> {
        let res = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (id, email, password_hash, name)
            VALUES ($1, $2, $3, $4)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&new.email)
        .bind(&new.password_hash)
        .bind(&new.name)
        .fetch_one(&self.pool)
        .await;

        match res {
            Ok(user) => Ok(user),
            Err(e) if is_unique_violation(&e) => Err(StoreError::Duplicate("User")),
            Err(e) => Err(e.into()),
        }
    }

    async fn set_admin(&self, id: Uuid, is_admin: bool) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET is_admin = $2 WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(is_admin)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn list_users(&self, page: PageRequest) -> StoreResult<(Vec<User>, i64)> {
        let users = sqlx::query_as::<_, User>(&format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users
            ORDER BY created_at DESC
            LIMIT $1 OFFSET $2
            "#
        ))
        .bind(page.limit)
        .bind(page.skip())
        .fetch_all(&self.pool)
        .await?;

        let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok((users, total))
    }

    async fn record_generation(&self, new: NewBlogPost) -> StoreResult<BlogPost> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, BlogPostRow>(&format!(
            r#"
            INSERT INTO blog_posts
                (id, user_id, title, content, topic, word_count, status, generation_time_ms)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {POST_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(new.user_id)
        .bind(&new.title)
        .bind(&new.content)
        .bind(&new.topic)
        .bind(new.word_count())
        .bind(new.status.as_str())
        .bind(new.generation_time_ms)
        .fetch_one(&mut *tx)
        .await?;

        let bumped = sqlx::query(
            "UPDATE users SET generation_count = generation_count + 1 WHERE id = $1",
        )
        .bind(new.user_id)
        .execute(&mut *tx)
        .await?;
        if bumped.rows_affected() != 1 {
            return Err(StoreError::Missing("User"));
        }

        tx.commit().await?;
        debug!(post_id = %row.id, user_id = %new.user_id, "generation recorded");
        Ok(BlogPost::try_from(row)?)
    }

    async fn list_posts_by_owner(
        &self,
        owner: Uuid,
        page: PageRequest,
    ) -> StoreResult<(Vec<BlogPost>, i64)> {
        let rows = sqlx::query_as::<_, BlogPostRow>(&format!(
            r#"
            SELECT {POST_COLUMNS}
            FROM blog_posts
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(owner)
        .bind(page.limit)
        .bind(page.skip())
        .fetch_all(&self.pool)
        .await?;

        let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM blog_posts WHERE user_id = $1")
            .bind(owner)
            .fetch_one(&self.pool)
            .await?;

        let posts = rows
            .into_iter()
            .map(BlogPost::try_from)
            .collect::<anyhow::Result<Vec<_>>>()?;
        Ok((posts, total))
    }

    async fn find_post(&self, owner: Uuid, id: Uuid) -> StoreResult<Option<BlogPost>> {
        let row = sqlx::query_as::<_, BlogPostRow>(&format!(
            "SELECT {POST_COLUMNS} FROM blog_posts WHERE id = $1 AND user_id = $2"
        ))
        .bind(id)
        .bind(owner)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(BlogPost::try_from).transpose()?)
    }

    async fn delete_post(&self, owner: Uuid, id: Uuid) -> StoreResult<bool> {
        let res = sqlx::query("DELETE FROM blog_posts WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(owner)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn recent_posts(&self, limit: i64) -> StoreResult<Vec<RecentPost>> {
        let rows = sqlx::query_as::<_, RecentPostRow>(
            r#"
            SELECT p.id, p.user_id, p.title, p.content, p.topic, p.word_count, p.status,
                   p.generation_time_ms, p.created_at,
                   u.id AS author_id, u.name AS author_name, u.email AS author_email
            FROM blog_posts p
            LEFT JOIN users u ON u.id = p.user_id
            ORDER BY p.created_at DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|r| {
                let author = match (r.author_id, r.author_name, r.author_email) {
                    (Some(id), Some(name), Some(email)) => Some(PostAuthor { id, name, email }),
                    _ => None,
                };
                Ok::<_, StoreError>(RecentPost {
                    post: BlogPost::try_from(r.post)?,
                    author,
                })
            })
            .collect()
    }

    async fn usage_stats(&self, since: OffsetDateTime) -> StoreResult<UsageStats> {
        let stats = sqlx::query_as::<_, UsageStats>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM users) AS total_users,
                (SELECT COUNT(*) FROM blog_posts) AS total_blogs,
                (SELECT COALESCE(SUM(word_count), 0)::BIGINT FROM blog_posts) AS total_words,
                (SELECT COUNT(*) FROM users WHERE created_at >= $1) AS today_users,
                (SELECT COUNT(*) FROM blog_posts WHERE created_at >= $1) AS today_blogs,
                (SELECT AVG(generation_time_ms)::FLOAT8 FROM blog_posts) AS avg_generation_ms
            "#,
        )
        .bind(since)
        .fetch_one(&self.pool)
        .await?;
        Ok(stats)
    }
}
