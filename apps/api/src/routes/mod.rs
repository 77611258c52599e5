pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::context::handlers as context_handlers;
use crate::generation::handlers as generation_handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Context API
        .route(
            "/api/v1/projects/:id/context",
            get(context_handlers::handle_get_context),
        )
        // Generation API
        .route(
            "/api/v1/projects/:id/instructions",
            post(generation_handlers::handle_preview_instructions),
        )
        .route(
            "/api/v1/projects/:id/chapters/generate",
            post(generation_handlers::handle_generate_chapter),
        )
        .route(
            "/api/v1/projects/:id/chapters/:chapter_id/continue",
            post(generation_handlers::handle_continue_chapter),
        )
        .route(
            "/api/v1/projects/:id/generations",
            get(generation_handlers::handle_list_generations),
        )
        .with_state(state)
}
