use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

use crate::context::{CharacterSelection, ContextParams, GenerationContext};
use crate::errors::AppError;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ContextQuery {
    /// `all` (default), `none`, or comma-separated character ids.
    pub characters: Option<String>,
    pub include_foreshadowing: Option<bool>,
    pub include_conflicts: Option<bool>,
    /// Comma-separated chapter ids for the recap section.
    pub chapters: Option<String>,
}

impl ContextQuery {
    fn into_params(self, project_id: i64) -> Result<ContextParams, AppError> {
        let characters = match self.characters.as_deref().map(str::trim) {
            None | Some("") | Some("all") => CharacterSelection::All,
            Some("none") => CharacterSelection::None,
            Some(ids) => CharacterSelection::Specific(parse_ids("characters", ids)?),
        };
        let include_chapters = match self.chapters.as_deref() {
            Some(ids) => Some(parse_ids("chapters", ids)?),
            None => None,
        };

        Ok(ContextParams {
            project_id,
            characters,
            include_foreshadowing: self.include_foreshadowing.unwrap_or(true),
            include_conflicts: self.include_conflicts.unwrap_or(true),
            include_chapters,
        })
    }
}

fn parse_ids(field: &str, raw: &str) -> Result<Vec<i64>, AppError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<i64>()
                .map_err(|_| AppError::Validation(format!("{field}: '{s}' is not a valid id")))
        })
        .collect()
}

/// GET /api/v1/projects/:id/context
///
/// The snapshot a generation for this project would start from. Defaults to
/// every section except the recap.
pub async fn handle_get_context(
    State(state): State<AppState>,
    Path(project_id): Path<i64>,
    Query(query): Query<ContextQuery>,
) -> Result<Json<GenerationContext>, AppError> {
    let params = query.into_params(project_id)?;
    let context = state.generation.context_builder().build(&params).await?;
    Ok(Json(context))
}
