use axum::{
    extract::{Path, Query, State},
    routing::{get, patch},
    Json, Router,
};
use time::{OffsetDateTime, Time};
use tracing::{info, instrument};
use uuid::Uuid;

use super::dto::{
    MakeAdminResponse, RecentGeneration, RecentGenerationsResponse, RecentQuery, StatsResponse,
    UsersResponse,
};
use crate::{
    auth::{dto::PublicUser, AdminUser},
    error::AppError,
    pagination::{PageQuery, Pagination},
    state::AppState,
};

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/stats", get(stats))
        .route("/admin/recent-generations", get(recent_generations))
        .route("/admin/users", get(list_users))
        .route("/admin/make-admin/:user_id", patch(make_admin))
}

/// Midnight of the current day in the process's local offset, UTC when the
/// offset cannot be determined.
fn local_start_of_day() -> OffsetDateTime {
    OffsetDateTime::now_local()
        .unwrap_or_else(|_| OffsetDateTime::now_utc())
        .replace_time(Time::MIDNIGHT)
}

#[instrument(skip(state, admin), fields(admin_id = %admin.0.id))]
pub async fn stats(
    State(state): State<AppState>,
    admin: AdminUser,
) -> Result<Json<StatsResponse>, AppError> {
    let stats = state.store.usage_stats(local_start_of_day()).await?;
    Ok(Json(StatsResponse::new(stats, OffsetDateTime::now_utc())))
}

#[instrument(skip(state, admin), fields(admin_id = %admin.0.id))]
pub async fn recent_generations(
    State(state): State<AppState>,
    admin: AdminUser,
    Query(q): Query<RecentQuery>,
) -> Result<Json<RecentGenerationsResponse>, AppError> {
    let recent = state.store.recent_posts(q.resolve()).await?;
    Ok(Json(RecentGenerationsResponse {
        recent_generations: recent.into_iter().map(RecentGeneration::from).collect(),
    }))
}

#[instrument(skip(state, admin), fields(admin_id = %admin.0.id))]
pub async fn list_users(
    State(state): State<AppState>,
    admin: AdminUser,
    Query(q): Query<PageQuery>,
) -> Result<Json<UsersResponse>, AppError> {
    let page = q.resolve();
    let (users, total) = state.store.list_users(page).await?;
    Ok(Json(UsersResponse {
        users: users.into_iter().map(PublicUser::from).collect(),
        pagination: Pagination::new(page, total),
    }))
}

#[instrument(skip(state, admin), fields(admin_id = %admin.0.id))]
pub async fn make_admin(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(user_id): Path<String>,
) -> Result<Json<MakeAdminResponse>, AppError> {
    let not_found = || AppError::NotFound("User not found".into());
    let user_id = Uuid::parse_str(&user_id).map_err(|_| not_found())?;
    let user = state
        .store
        .set_admin(user_id, true)
        .await?
        .ok_or_else(not_found)?;

    info!(user_id = %user.id, email = %user.email, "user promoted to admin");
    Ok(Json(MakeAdminResponse {
        message: "User promoted to admin successfully",
        user: user.into(),
    }))
}
