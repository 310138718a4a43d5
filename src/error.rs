use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::{provider::ProviderError, state::AppState, store::StoreError};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("generation failed: {0}")]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Underlying cause of a 5xx, attached to the response for [`expose_error_details`].
#[derive(Debug, Clone)]
pub struct ErrorDetail {
    pub message: String,
    pub detail: String,
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Store(StoreError::Duplicate(_)) => StatusCode::CONFLICT,
            AppError::Provider(_) | AppError::Store(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn user_message(&self) -> String {
        match self {
            AppError::Validation(m)
            | AppError::Unauthorized(m)
            | AppError::Forbidden(m)
            | AppError::NotFound(m)
            | AppError::Conflict(m) => m.clone(),
            AppError::Store(StoreError::Duplicate(what)) => format!("{what} already exists"),
            AppError::Provider(_) => "Failed to generate blog post".into(),
            AppError::Store(_) | AppError::Internal(_) => "Internal server error".into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = self.user_message();

        if status.is_server_error() {
            error!(error = %format!("{:#}", self), %status, "request failed");
            let mut res = (
                status,
                Json(ErrorBody {
                    message: message.clone(),
                    error: Some("Something went wrong".into()),
                }),
            )
                .into_response();
            res.extensions_mut().insert(ErrorDetail {
                message,
                detail: format!("{:#}", self),
            });
            return res;
        }

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::CONFLICT => {
                warn!(%status, error = %self, "request rejected")
            }
            _ => debug!(%status, error = %self, "client error"),
        }
        (status, Json(ErrorBody { message, error: None })).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        debug!(reason = %rejection.body_text(), "json rejection");
        AppError::Validation("Invalid JSON format in request body".into())
    }
}

/// `Json` extractor whose rejections become 400 `AppError::Validation`.
#[derive(Debug, FromRequest)]
#[from_request(via(Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// Replaces the generic 5xx `error` field with the underlying cause in development.
pub async fn expose_error_details(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    let mut res = next.run(req).await;
    let Some(ErrorDetail { message, detail }) = res.extensions_mut().remove::<ErrorDetail>()
    else {
        return res;
    };
    if !state.config.env.is_development() {
        return res;
    }
    let status = res.status();
    (
        status,
        Json(ErrorBody {
            message,
            error: Some(detail),
        }),
    )
        .into_response()
}
