use std::convert::Infallible;

use axum::{
    extract::{Path, Query, State},
    http::header,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse,
    },
    routing::{get, post},
    Json, Router,
};
use futures::StreamExt;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{error, info, instrument};
use uuid::Uuid;

use super::{
    dto::{
        BlogResponse, BlogSummary, GenerateRequest, GenerateResponse, MessageResponse,
        MyBlogsResponse,
    },
    generation::{GenerationEvent, GENERATION_FAILED},
};
use crate::{
    auth::AuthUser,
    error::{ApiJson, AppError},
    pagination::{PageQuery, Pagination},
    state::AppState,
};

// --- public routers ---

pub fn generate_routes() -> Router<AppState> {
    Router::new()
        .route("/blog/generate", post(generate))
        .route("/blog/generate/stream", post(generate_stream))
}

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/blog/my-blogs", get(my_blogs))
        .route("/blog/:id", get(get_blog).delete(delete_blog))
}

fn not_found() -> AppError {
    AppError::NotFound("Blog post not found".into())
}

/// Malformed ids cannot name a post the caller owns.
fn parse_post_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| not_found())
}

fn to_sse_event(ev: GenerationEvent) -> Event {
    Event::default().json_data(&ev).unwrap_or_else(|e| {
        error!(error = %e, "failed to encode generation event");
        Event::default().data(format!(
            r#"{{"type":"error","message":"{GENERATION_FAILED}"}}"#
        ))
    })
}

// --- handlers ---

#[instrument(skip(state, payload))]
pub async fn generate(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiJson(payload): ApiJson<GenerateRequest>,
) -> Result<Json<GenerateResponse>, AppError> {
    let post = state.generator.generate(&payload.topic, user_id).await?;
    Ok(Json(GenerateResponse {
        message: "Blog post generated successfully",
        blog: post.into(),
    }))
}

/// POST /blog/generate/stream: `data:` frames of [`GenerationEvent`] JSON.
#[instrument(skip(state, payload))]
pub async fn generate_stream(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiJson(payload): ApiJson<GenerateRequest>,
) -> Result<impl IntoResponse, AppError> {
    let rx = state.generator.generate_streaming(&payload.topic, user_id)?;
    info!(%user_id, provider = state.generator.provider_name(), "generation stream opened");

    let events = ReceiverStream::new(rx).map(|ev| Ok::<_, Infallible>(to_sse_event(ev)));
    Ok((
        [
            (header::CACHE_CONTROL, "no-cache"),
            (header::CONNECTION, "keep-alive"),
        ],
        Sse::new(events).keep_alive(KeepAlive::default()),
    ))
}

#[instrument(skip(state))]
pub async fn my_blogs(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(q): Query<PageQuery>,
) -> Result<Json<MyBlogsResponse>, AppError> {
    let page = q.resolve();
    let (posts, total) = state.store.list_posts_by_owner(user_id, page).await?;
    Ok(Json(MyBlogsResponse {
        blogs: posts.into_iter().map(BlogSummary::from).collect(),
        pagination: Pagination::new(page, total),
    }))
}

#[instrument(skip(state))]
pub async fn get_blog(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<BlogResponse>, AppError> {
    let id = parse_post_id(&id)?;
    let post = state
        .store
        .find_post(user_id, id)
        .await?
        .ok_or_else(not_found)?;
    Ok(Json(BlogResponse { blog: post.into() }))
}

#[instrument(skip(state))]
pub async fn delete_blog(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let id = parse_post_id(&id)?;
    if !state.store.delete_post(user_id, id).await? {
        return Err(not_found());
    }
    info!(%user_id, post_id = %id, "blog post deleted");
    Ok(Json(MessageResponse {
        message: "Blog post deleted successfully",
    }))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::{json, Value};

    use super::*;
    use crate::{
        app::build_app,
        config::RuntimeEnv,
        test_support::{
            request, seed_user, send, send_raw, state_in_env, state_with, ScriptedProvider,
        },
    };

    fn topic(t: &str) -> Option<Value> {
        Some(json!({ "topic": t }))
    }

    fn sse_frames(body: &[u8]) -> Vec<Value> {
        String::from_utf8_lossy(body)
            .split("\n\n")
            .filter_map(|frame| frame.lines().find_map(|l| l.strip_prefix("data: ")))
            .map(|data| serde_json::from_str(data).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn generate_returns_the_new_post() {
        let state = AppState::fake();
        let (user, token) = seed_user(&state, "ada@example.com", false).await;

        let (status, body) = send(
            &state,
            request(Method::POST, "/api/blog/generate", Some(&token), topic("Kubernetes")),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Blog post generated successfully");
        assert!(body["blog"]["title"].as_str().unwrap().contains("Kubernetes"));
        assert!(body["blog"]["wordCount"].as_i64().unwrap() > 800);
        assert_eq!(body["blog"]["topic"], "Kubernetes");

        let user = state.store.find_user(user.id).await.unwrap().unwrap();
        assert_eq!(user.generation_count, 1);
    }

    #[tokio::test]
    async fn generate_rejects_blank_topic_and_missing_token() {
        let state = AppState::fake();
        let (_, token) = seed_user(&state, "ada@example.com", false).await;

        let (status, body) = send(
            &state,
            request(Method::POST, "/api/blog/generate", Some(&token), topic("   ")),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Topic is required");

        let (status, _) =
            send(&state, request(Method::POST, "/api/blog/generate", None, topic("x"))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn provider_failure_is_a_500_with_generic_message() {
        let state = state_with(ScriptedProvider::failing_after(vec![], 0));
        let (_, token) = seed_user(&state, "ada@example.com", false).await;

        let (status, body) = send(
            &state,
            request(Method::POST, "/api/blog/generate", Some(&token), topic("Rust")),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "Failed to generate blog post");
        // development config surfaces the cause
        assert!(body["error"].as_str().unwrap().contains("503"));
    }

    #[tokio::test]
    async fn production_hides_provider_failure_details() {
        let state = state_in_env(
            RuntimeEnv::Production,
            ScriptedProvider::failing_after(vec![], 0),
        );
        let (_, token) = seed_user(&state, "ada@example.com", false).await;

        let (status, body) = send(
            &state,
            request(Method::POST, "/api/blog/generate", Some(&token), topic("Rust")),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "Failed to generate blog post");
        assert_eq!(body["error"], "Something went wrong");
        let raw = body.to_string();
        assert!(!raw.contains("503"));
        assert!(!raw.contains("upstream"));
    }

    #[tokio::test]
    async fn stream_emits_content_then_saved() {
        let state = state_with(ScriptedProvider::ok(vec!["# Hello\n", "streamed world"]));
        let (_, token) = seed_user(&state, "ada@example.com", false).await;

        let res = tower::ServiceExt::oneshot(
            build_app(state.clone()),
            request(Method::POST, "/api/blog/generate/stream", Some(&token), topic("Hello")),
        )
        .await
        .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.headers()[header::CONTENT_TYPE], "text/event-stream");
        assert_eq!(res.headers()[header::CACHE_CONTROL], "no-cache");
        assert_eq!(res.headers()[header::CONNECTION], "keep-alive");

        let body = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let frames = sse_frames(&body);
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[0], json!({ "type": "content", "content": "# Hello\n" }));
        assert_eq!(frames[1]["content"], "streamed world");
        assert_eq!(frames[2]["type"], "saved");
        assert_eq!(frames[2]["title"], "Hello");

        let post_id = frames[2]["postId"].as_str().unwrap();
        let (status, body) = send(
            &state,
            request(Method::GET, &format!("/api/blog/{post_id}"), Some(&token), None),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["blog"]["content"], "# Hello\nstreamed world");
    }

    #[tokio::test]
    async fn stream_failure_ends_with_error_frame() {
        let state = state_with(ScriptedProvider::failing_after(vec!["# A\n", "b"], 1));
        let (user, token) = seed_user(&state, "ada@example.com", false).await;

        let (status, body) = send_raw(
            build_app(state.clone()),
            request(Method::POST, "/api/blog/generate/stream", Some(&token), topic("A")),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let frames = sse_frames(&body);
        assert_eq!(frames.len(), 2);
        assert_eq!(
            frames[1],
            json!({ "type": "error", "message": "Failed to generate blog post" })
        );

        let (_, body) = send(
            &state,
            request(Method::GET, "/api/blog/my-blogs", Some(&token), None),
        )
        .await;
        assert_eq!(body["pagination"]["total"], 0);
        let user = state.store.find_user(user.id).await.unwrap().unwrap();
        assert_eq!(user.generation_count, 0);
    }

    #[tokio::test]
    async fn stream_validates_before_opening() {
        let state = AppState::fake();
        let (_, token) = seed_user(&state, "ada@example.com", false).await;
        let (status, body) = send(
            &state,
            request(Method::POST, "/api/blog/generate/stream", Some(&token), topic("")),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Topic is required");
    }

    #[tokio::test]
    async fn my_blogs_paginates_newest_first() {
        let state = state_with(ScriptedProvider::ok(vec!["# Post\nbody text"]));
        let (user, token) = seed_user(&state, "ada@example.com", false).await;
        for t in ["one", "two", "three"] {
            state.generator.generate(t, user.id).await.unwrap();
        }

        let (status, body) = send(
            &state,
            request(Method::GET, "/api/blog/my-blogs?page=1&limit=2", Some(&token), None),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["pagination"], json!({ "current": 1, "pages": 2, "total": 3 }));
        let blogs = body["blogs"].as_array().unwrap();
        assert_eq!(blogs.len(), 2);
        assert_eq!(blogs[0]["topic"], "three");
        assert_eq!(blogs[0]["status"], "completed");
        assert_eq!(blogs[0]["wordCount"], 4);
        assert!(blogs[0].get("content").is_none());

        let (_, body) = send(
            &state,
            request(Method::GET, "/api/blog/my-blogs?page=2&limit=2", Some(&token), None),
        )
        .await;
        assert_eq!(body["blogs"].as_array().unwrap().len(), 1);
        assert_eq!(body["blogs"][0]["topic"], "one");
    }

    #[tokio::test]
    async fn my_blogs_falls_back_to_defaults_on_junk_paging() {
        let state = state_with(ScriptedProvider::ok(vec!["# Post\nbody text"]));
        let (user, token) = seed_user(&state, "ada@example.com", false).await;
        for i in 0..11 {
            state.generator.generate(&format!("topic {i}"), user.id).await.unwrap();
        }

        let (status, body) = send(
            &state,
            request(Method::GET, "/api/blog/my-blogs?page=abc&limit=0", Some(&token), None),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["pagination"], json!({ "current": 1, "pages": 2, "total": 11 }));
        assert_eq!(body["blogs"].as_array().unwrap().len(), 10);
    }

    #[tokio::test]
    async fn posts_are_owner_scoped() {
        let state = state_with(ScriptedProvider::ok(vec!["# Mine\nbody"]));
        let (owner, owner_token) = seed_user(&state, "owner@example.com", false).await;
        let (_, other_token) = seed_user(&state, "other@example.com", false).await;
        let post = state.generator.generate("mine", owner.id).await.unwrap();
        let uri = format!("/api/blog/{}", post.id);

        let (status, _) =
            send(&state, request(Method::GET, &uri, Some(&other_token), None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) =
            send(&state, request(Method::DELETE, &uri, Some(&other_token), None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) =
            send(&state, request(Method::DELETE, &uri, Some(&owner_token), None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Blog post deleted successfully");

        let (status, _) =
            send(&state, request(Method::GET, &uri, Some(&owner_token), None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn invalid_post_id_is_not_found() {
        let state = AppState::fake();
        let (_, token) = seed_user(&state, "ada@example.com", false).await;
        let (status, body) = send(
            &state,
            request(Method::GET, "/api/blog/not-a-uuid", Some(&token), None),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Blog post not found");
    }
}
