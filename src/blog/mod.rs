mod dto;
pub mod generation;
pub mod handlers;

use crate::state::AppState;
use axum::Router;

pub use generation::{derive_title, GenerationEvent, Orchestrator};

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::generate_routes())
        .merge(handlers::read_routes())
}
