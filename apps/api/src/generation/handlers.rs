//! Axum route handlers for the Generation API.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::generation::anti_bias::ContextData;
use crate::generation::generator::{ContinueParams, GenerationResult, NewChapterParams};
use crate::models::generation::GenerationRecord;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct InstructionPreviewRequest {
    pub target_blindspots: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct InstructionPreviewResponse {
    pub instructions: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct GenerateChapterRequest {
    pub chapter_number: Option<i32>,
    pub title: Option<String>,
    pub outline: String,
    pub previous_chapters: Option<Vec<i64>>,
    pub target_blindspots: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct ContinueChapterRequest {
    pub current_content: String,
    pub continuation_hint: Option<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/projects/:id/instructions
///
/// Previews the anti-bias instructions a generation would inject.
pub async fn handle_preview_instructions(
    State(state): State<AppState>,
    Path(project_id): Path<i64>,
    Json(request): Json<InstructionPreviewRequest>,
) -> Result<Json<InstructionPreviewResponse>, AppError> {
    let targets: Vec<&str> = request
        .target_blindspots
        .iter()
        .map(String::as_str)
        .collect();

    let instructions = state
        .generation
        .anti_bias()
        .generate_instructions(project_id, &targets, ContextData::default())
        .await?;

    Ok(Json(InstructionPreviewResponse { instructions }))
}

/// POST /api/v1/projects/:id/chapters/generate
pub async fn handle_generate_chapter(
    State(state): State<AppState>,
    Path(project_id): Path<i64>,
    Json(request): Json<GenerateChapterRequest>,
) -> Result<Json<GenerationResult>, AppError> {
    if request.outline.trim().is_empty() {
        return Err(AppError::Validation("outline cannot be empty".to_string()));
    }

    let result = state
        .generation
        .generate_new_chapter(NewChapterParams {
            project_id,
            chapter_number: request.chapter_number,
            title: request.title,
            outline: request.outline,
            previous_chapters: request.previous_chapters,
            target_blindspots: request.target_blindspots,
        })
        .await?;

    Ok(Json(result))
}

/// POST /api/v1/projects/:id/chapters/:chapter_id/continue
pub async fn handle_continue_chapter(
    State(state): State<AppState>,
    Path((project_id, chapter_id)): Path<(i64, i64)>,
    Json(request): Json<ContinueChapterRequest>,
) -> Result<Json<GenerationResult>, AppError> {
    if request.current_content.trim().is_empty() {
        return Err(AppError::Validation(
            "current_content cannot be empty".to_string(),
        ));
    }

    let result = state
        .generation
        .continue_writing(ContinueParams {
            project_id,
            chapter_id,
            current_content: request.current_content,
            continuation_hint: request.continuation_hint,
        })
        .await?;

    Ok(Json(result))
}

/// GET /api/v1/projects/:id/generations
///
/// Generation history, newest first.
pub async fn handle_list_generations(
    State(state): State<AppState>,
    Path(project_id): Path<i64>,
) -> Result<Json<Vec<GenerationRecord>>, AppError> {
    let records = state.history.list_by_project(project_id).await?;
    Ok(Json(records))
}
