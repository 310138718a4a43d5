use crate::state::AppState;
use axum::Router;

pub mod dto;
pub(crate) mod extractors;
pub mod handlers;
mod jwt;
mod password;

pub use extractors::{AdminUser, AuthUser};
pub use jwt::{Claims, JwtKeys, TokenKind};
pub use password::{hash_password, verify_password};

pub fn router() -> Router<AppState> {
    handlers::auth_routes()
}
