//! Narrative Store: typed read access to persisted narrative state plus the
//! generation history sink.
//!
//! The pipeline only ever sees entities from `crate::models`; row decoding
//! (JSON list columns, status strings) stays inside the implementations.

use async_trait::async_trait;

use crate::errors::AppError;
use crate::models::chapter::Chapter;
use crate::models::character::Character;
use crate::models::conflict::Conflict;
use crate::models::foreshadowing::Foreshadowing;
use crate::models::generation::GenerationRecord;
use crate::models::project::Project;

#[cfg(test)]
pub mod memory;
pub mod postgres;

pub use postgres::PgNarrativeStore;

/// Read-only view of a project's narrative state.
///
/// Ordering is part of the contract because prompts and instruction lists are
/// rendered in the order returned.
#[async_trait]
pub trait NarrativeStore: Send + Sync {
    async fn find_project(&self, project_id: i64) -> Result<Option<Project>, AppError>;

    /// All characters of a project, ordered by (role_type, name, id).
    async fn find_characters_by_project(&self, project_id: i64)
        -> Result<Vec<Character>, AppError>;

    /// Characters of `project_id` matching any of `ids`, by id. Unknown ids and
    /// ids belonging to other projects are skipped.
    async fn find_characters_by_ids(
        &self,
        project_id: i64,
        ids: &[i64],
    ) -> Result<Vec<Character>, AppError>;

    /// Conflicts with status `active`, most intense first, then by id.
    async fn find_active_conflicts(&self, project_id: i64) -> Result<Vec<Conflict>, AppError>;

    /// Foreshadowing with status `buried` or `progressing`, by priority
    /// descending then creation order.
    async fn find_active_foreshadowing(
        &self,
        project_id: i64,
    ) -> Result<Vec<Foreshadowing>, AppError>;

    /// Chapters of `project_id` matching any of `ids`, by chapter number
    /// ascending then id.
    async fn find_chapters_by_ids(
        &self,
        project_id: i64,
        ids: &[i64],
    ) -> Result<Vec<Chapter>, AppError>;

    async fn find_chapter_by_id(&self, chapter_id: i64) -> Result<Option<Chapter>, AppError>;
}

/// Append-only sink for generation records.
#[async_trait]
pub trait GenerationLog: Send + Sync {
    async fn insert(&self, record: &GenerationRecord) -> Result<(), AppError>;

    /// Newest first.
    async fn list_by_project(&self, project_id: i64) -> Result<Vec<GenerationRecord>, AppError>;
}
