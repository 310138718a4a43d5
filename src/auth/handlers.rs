use axum::{
    extract::{FromRef, State},
    routing::{get, post},
    Json, Router,
};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{AuthResponse, LoginRequest, MeResponse, PublicUser, RefreshRequest, RegisterRequest},
        extractors::AuthUser,
        jwt::{JwtKeys, TokenKind},
        password::{hash_password, verify_password},
    },
    error::{ApiJson, AppError},
    state::AppState,
    store::{NewUser, StoreError, User},
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
        .route("/auth/me", get(get_me))
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn issue_tokens(keys: &JwtKeys, user: User) -> Result<AuthResponse, AppError> {
    Ok(AuthResponse {
        token: keys.sign_access(user.id)?,
        refresh_token: keys.sign_refresh(user.id)?,
        user: user.into(),
    })
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(mut payload): ApiJson<RegisterRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    payload.email = payload.email.trim().to_lowercase();
    let name = payload.name.trim();

    if name.is_empty() {
        return Err(AppError::Validation("Name is required".into()));
    }
    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(AppError::Validation("Please provide a valid email".into()));
    }
    if payload.password.len() < 8 {
        warn!("password too short");
        return Err(AppError::Validation(
            "Password must be at least 8 characters".into(),
        ));
    }

    if state.store.find_user_by_email(&payload.email).await?.is_some() {
        warn!(email = %payload.email, "email already registered");
        return Err(AppError::Conflict("User already exists with this email".into()));
    }

    let user = state
        .store
        .create_user(NewUser {
            email: payload.email,
            password_hash: hash_password(&payload.password)?,
            name: name.to_string(),
        })
        .await
        .map_err(|e| match e {
            StoreError::Duplicate(_) => {
                AppError::Conflict("User already exists with this email".into())
            }
            other => other.into(),
        })?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    let keys = JwtKeys::from_ref(&state);
    Ok(Json(issue_tokens(&keys, user)?))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(mut payload): ApiJson<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    payload.email = payload.email.trim().to_lowercase();

    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(AppError::Validation("Please provide a valid email".into()));
    }

    let Some(user) = state.store.find_user_by_email(&payload.email).await? else {
        warn!(email = %payload.email, "login unknown email");
        return Err(AppError::Unauthorized("Invalid credentials".into()));
    };

    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(email = %payload.email, user_id = %user.id, "login invalid password");
        return Err(AppError::Unauthorized("Invalid credentials".into()));
    }

    info!(user_id = %user.id, email = %user.email, "user logged in");
    let keys = JwtKeys::from_ref(&state);
    Ok(Json(issue_tokens(&keys, user)?))
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RefreshRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let keys = JwtKeys::from_ref(&state);
    let claims = keys
        .decode_as(&payload.refresh_token, TokenKind::Refresh)
        .map_err(|e| {
            warn!(error = %e, "refresh rejected");
            AppError::Unauthorized("Token is not valid".into())
        })?;

    let user = state
        .store
        .find_user(claims.sub)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User not found".into()))?;

    Ok(Json(issue_tokens(&keys, user)?))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<MeResponse>, AppError> {
    let user = state.store.find_user(user_id).await?.ok_or_else(|| {
        warn!(user_id = %user_id, "token for unknown user");
        AppError::Unauthorized("User not found".into())
    })?;

    Ok(Json(MeResponse {
        user: PublicUser::from(user),
    }))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use super::*;
    use crate::test_support::{request, seed_user, send, PASSWORD};

    fn register_body(email: &str) -> serde_json::Value {
        json!({ "name": "Ada", "email": email, "password": "password123" })
    }

    #[test]
    fn email_validation() {
        assert!(is_valid_email("a@b.io"));
        assert!(!is_valid_email("no-at-sign"));
        assert!(!is_valid_email("two@@b.io"));
        assert!(!is_valid_email("space @b.io"));
    }

    #[tokio::test]
    async fn register_returns_token_pair_and_user() {
        let state = AppState::fake();
        let (status, body) = send(
            &state,
            request(
                Method::POST,
                "/api/auth/register",
                None,
                Some(register_body("  Ada@Example.COM ")),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert!(body["token"].as_str().unwrap().len() > 20);
        assert!(body["refreshToken"].is_string());
        assert_eq!(body["user"]["email"], "ada@example.com");
        assert_eq!(body["user"]["name"], "Ada");
        assert_eq!(body["user"]["isAdmin"], false);
        assert!(body["user"].get("passwordHash").is_none());
    }

    #[tokio::test]
    async fn duplicate_email_is_conflict() {
        let state = AppState::fake();
        seed_user(&state, "ada@example.com", false).await;
        let (status, body) = send(
            &state,
            request(Method::POST, "/api/auth/register", None, Some(register_body("ada@example.com"))),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["message"], "User already exists with this email");
    }

    #[tokio::test]
    async fn register_validates_input() {
        let state = AppState::fake();
        for body in [
            json!({ "name": "Ada", "email": "ada@example.com", "password": "short" }),
            json!({ "name": "  ", "email": "ada@example.com", "password": "password123" }),
            json!({ "name": "Ada", "email": "not-an-email", "password": "password123" }),
        ] {
            let (status, _) =
                send(&state, request(Method::POST, "/api/auth/register", None, Some(body))).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
        }
    }

    #[tokio::test]
    async fn malformed_json_is_bad_request() {
        let state = AppState::fake();
        let req = axum::http::Request::builder()
            .method(Method::POST)
            .uri("/api/auth/login")
            .header("content-type", "application/json")
            .body(axum::body::Body::from("{\"email\": "))
            .unwrap();
        let (status, body) = send(&state, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Invalid JSON format in request body");
    }

    #[tokio::test]
    async fn login_checks_password() {
        let state = AppState::fake();
        seed_user(&state, "ada@example.com", false).await;

        let (status, body) = send(
            &state,
            request(
                Method::POST,
                "/api/auth/login",
                None,
                Some(json!({ "email": "ada@example.com", "password": PASSWORD })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["token"].is_string());

        let (status, body) = send(
            &state,
            request(
                Method::POST,
                "/api/auth/login",
                None,
                Some(json!({ "email": "ada@example.com", "password": "wrong-password" })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Invalid credentials");
    }

    #[tokio::test]
    async fn me_requires_a_valid_access_token() {
        let state = AppState::fake();
        let (user, token) = seed_user(&state, "ada@example.com", false).await;

        let (status, _) = send(&state, request(Method::GET, "/api/auth/me", None, None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) =
            send(&state, request(Method::GET, "/api/auth/me", Some("garbage"), None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let refresh = JwtKeys::from_ref(&state).sign_refresh(user.id).unwrap();
        let (status, _) =
            send(&state, request(Method::GET, "/api/auth/me", Some(&refresh), None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, body) =
            send(&state, request(Method::GET, "/api/auth/me", Some(&token), None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"]["id"], user.id.to_string());
    }

    #[tokio::test]
    async fn refresh_issues_a_new_pair() {
        let state = AppState::fake();
        let (user, access) = seed_user(&state, "ada@example.com", false).await;
        let refresh = JwtKeys::from_ref(&state).sign_refresh(user.id).unwrap();

        let (status, body) = send(
            &state,
            request(
                Method::POST,
                "/api/auth/refresh",
                None,
                Some(json!({ "refreshToken": refresh })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"]["email"], "ada@example.com");

        let (status, _) = send(
            &state,
            request(
                Method::POST,
                "/api/auth/refresh",
                None,
                Some(json!({ "refreshToken": access })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
