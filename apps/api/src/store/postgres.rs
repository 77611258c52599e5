use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use tracing::debug;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::chapter::Chapter;
use crate::models::character::{Character, RoleType, SpeechPattern};
use crate::models::conflict::Conflict;
use crate::models::foreshadowing::Foreshadowing;
use crate::models::generation::GenerationRecord;
use crate::models::project::{CulturalContext, Project};
use crate::store::{GenerationLog, NarrativeStore};

// ────────────────────────────────────────────────────────────────────────────
// Row types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, FromRow)]
struct ProjectRow {
    id: i64,
    name: String,
    description: Option<String>,
    genre: Option<String>,
    world_setting: Option<String>,
    cultural_context: String,
}

impl From<ProjectRow> for Project {
    fn from(row: ProjectRow) -> Self {
        Project {
            id: row.id,
            name: row.name,
            description: row.description,
            genre: row.genre,
            world_setting: row.world_setting,
            cultural_context: CulturalContext::parse(&row.cultural_context),
        }
    }
}

#[derive(Debug, FromRow)]
struct CharacterRow {
    id: i64,
    project_id: i64,
    name: String,
    role_type: String,
    personality_traits: Json<Vec<String>>,
    deep_motivation: String,
    things_never_do: Json<Vec<String>>,
    speech_pattern: Option<Json<SpeechPattern>>,
    language_style: Option<String>,
}

impl From<CharacterRow> for Character {
    fn from(row: CharacterRow) -> Self {
        Character {
            id: row.id,
            project_id: row.project_id,
            name: row.name,
            role_type: RoleType::parse(&row.role_type),
            personality_traits: row.personality_traits.0,
            deep_motivation: row.deep_motivation,
            things_never_do: row.things_never_do.0,
            speech_pattern: row.speech_pattern.map(|p| p.0),
            language_style: row.language_style,
        }
    }
}

#[derive(Debug, FromRow)]
struct ConflictRow {
    id: i64,
    project_id: i64,
    title: String,
    side_a: Option<String>,
    side_b: Option<String>,
    current_intensity: Option<i32>,
    maintenance_mechanism: Option<String>,
    cant_reconcile_reasons: Option<Json<Vec<String>>>,
    status: String,
}

impl TryFrom<ConflictRow> for Conflict {
    type Error = AppError;

    fn try_from(row: ConflictRow) -> Result<Self, Self::Error> {
        Ok(Conflict {
            status: row.status.parse().map_err(|e: String| {
                AppError::Internal(anyhow!("conflict {}: {e}", row.id))
            })?,
            id: row.id,
            project_id: row.project_id,
            title: row.title,
            side_a: row.side_a.unwrap_or_default(),
            side_b: row.side_b.unwrap_or_default(),
            current_intensity: row.current_intensity.unwrap_or(0),
            maintenance_mechanism: row.maintenance_mechanism.unwrap_or_default(),
            cant_reconcile_reasons: row.cant_reconcile_reasons.map(|r| r.0).unwrap_or_default(),
        })
    }
}

#[derive(Debug, FromRow)]
struct ForeshadowingRow {
    id: i64,
    project_id: i64,
    title: String,
    description: Option<String>,
    planned_reveal_chapter: Option<i32>,
    status: String,
    priority: i32,
}

impl TryFrom<ForeshadowingRow> for Foreshadowing {
    type Error = AppError;

    fn try_from(row: ForeshadowingRow) -> Result<Self, Self::Error> {
        Ok(Foreshadowing {
            status: row.status.parse().map_err(|e: String| {
                AppError::Internal(anyhow!("foreshadowing {}: {e}", row.id))
            })?,
            id: row.id,
            project_id: row.project_id,
            title: row.title,
            description: row.description,
            planned_reveal_chapter: row.planned_reveal_chapter,
            priority: row.priority,
        })
    }
}

#[derive(Debug, FromRow)]
struct ChapterRow {
    id: i64,
    project_id: i64,
    chapter_number: i32,
    title: String,
    content: Option<String>,
    outline: Option<String>,
}

impl From<ChapterRow> for Chapter {
    fn from(row: ChapterRow) -> Self {
        Chapter {
            id: row.id,
            project_id: row.project_id,
            chapter_number: row.chapter_number,
            title: row.title,
            content: row.content,
            outline: row.outline,
        }
    }
}

#[derive(Debug, FromRow)]
struct GenerationRow {
    id: Uuid,
    project_id: i64,
    chapter_id: Option<i64>,
    generation_type: String,
    prompt: String,
    context_injected: String,
    anti_bias_instructions: String,
    generated_content: String,
    tokens_used: i64,
    user_rating: Option<i16>,
    accepted: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<GenerationRow> for GenerationRecord {
    type Error = AppError;

    fn try_from(row: GenerationRow) -> Result<Self, Self::Error> {
        Ok(GenerationRecord {
            generation_type: row.generation_type.parse().map_err(|e: String| {
                AppError::Internal(anyhow!("generation {}: {e}", row.id))
            })?,
            id: row.id,
            project_id: row.project_id,
            chapter_id: row.chapter_id,
            prompt: row.prompt,
            context_injected: row.context_injected,
            anti_bias_instructions: row.anti_bias_instructions,
            generated_content: row.generated_content,
            tokens_used: row.tokens_used,
            user_rating: row.user_rating,
            accepted: row.accepted,
            created_at: row.created_at,
        })
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Store
// ────────────────────────────────────────────────────────────────────────────

const CHARACTER_COLUMNS: &str = "id, project_id, name, role_type, personality_traits, \
    deep_motivation, things_never_do, speech_pattern, language_style";

const CONFLICT_COLUMNS: &str = "id, project_id, title, side_a, side_b, current_intensity, \
    maintenance_mechanism, cant_reconcile_reasons, status";

const CHAPTER_COLUMNS: &str = "id, project_id, chapter_number, title, content, outline";

// Every ordering ends on `id` so equal sort keys still come back in a fixed order.
const CHARACTER_ORDER: &str = "ORDER BY role_type, name, id";
const CONFLICT_ORDER: &str = "ORDER BY current_intensity DESC, id";
const CHAPTER_ORDER: &str = "ORDER BY chapter_number, id";

/// Postgres-backed narrative store and generation log.
#[derive(Clone)]
pub struct PgNarrativeStore {
    pool: PgPool,
}

impl PgNarrativeStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NarrativeStore for PgNarrativeStore {
    async fn find_project(&self, project_id: i64) -> Result<Option<Project>, AppError> {
        let row = sqlx::query_as::<_, ProjectRow>(
            r#"
            SELECT id, name, description, genre, world_setting, cultural_context
            FROM projects
            WHERE id = $1
            "#,
        )
        .bind(project_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Project::from))
    }

    async fn find_characters_by_project(
        &self,
        project_id: i64,
    ) -> Result<Vec<Character>, AppError> {
        let rows = sqlx::query_as::<_, CharacterRow>(&format!(
            "SELECT {CHARACTER_COLUMNS} FROM characters WHERE project_id = $1 {CHARACTER_ORDER}"
        ))
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Character::from).collect())
    }

    async fn find_characters_by_ids(
        &self,
        project_id: i64,
        ids: &[i64],
    ) -> Result<Vec<Character>, AppError> {
        let rows = sqlx::query_as::<_, CharacterRow>(&format!(
            "SELECT {CHARACTER_COLUMNS} FROM characters WHERE project_id = $1 AND id = ANY($2) ORDER BY id"
        ))
        .bind(project_id)
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        if rows.len() < ids.len() {
            debug!(
                "{} of {} requested characters not found",
                ids.len() - rows.len(),
                ids.len()
            );
        }

        Ok(rows.into_iter().map(Character::from).collect())
    }

    async fn find_active_conflicts(&self, project_id: i64) -> Result<Vec<Conflict>, AppError> {
        let rows = sqlx::query_as::<_, ConflictRow>(&format!(
            "SELECT {CONFLICT_COLUMNS} FROM conflicts \
             WHERE project_id = $1 AND status = 'active' \
             {CONFLICT_ORDER}"
        ))
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Conflict::try_from).collect()
    }

    async fn find_active_foreshadowing(
        &self,
        project_id: i64,
    ) -> Result<Vec<Foreshadowing>, AppError> {
        let rows = sqlx::query_as::<_, ForeshadowingRow>(
            r#"
            SELECT id, project_id, title, description, planned_reveal_chapter, status, priority
            FROM foreshadowing
            WHERE project_id = $1 AND status IN ('buried', 'progressing')
            ORDER BY priority DESC, created_at, id
            "#,
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Foreshadowing::try_from).collect()
    }

    async fn find_chapters_by_ids(
        &self,
        project_id: i64,
        ids: &[i64],
    ) -> Result<Vec<Chapter>, AppError> {
        let rows = sqlx::query_as::<_, ChapterRow>(&format!(
            "SELECT {CHAPTER_COLUMNS} FROM chapters \
             WHERE project_id = $1 AND id = ANY($2) {CHAPTER_ORDER}"
        ))
        .bind(project_id)
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Chapter::from).collect())
    }

    async fn find_chapter_by_id(&self, chapter_id: i64) -> Result<Option<Chapter>, AppError> {
        let row = sqlx::query_as::<_, ChapterRow>(&format!(
            "SELECT {CHAPTER_COLUMNS} FROM chapters WHERE id = $1"
        ))
        .bind(chapter_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Chapter::from))
    }
}

#[async_trait]
impl GenerationLog for PgNarrativeStore {
    async fn insert(&self, record: &GenerationRecord) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO ai_generations
                (id, project_id, chapter_id, generation_type, prompt, context_injected,
                 anti_bias_instructions, generated_content, tokens_used, user_rating,
                 accepted, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(record.id)
        .bind(record.project_id)
        .bind(record.chapter_id)
        .bind(record.generation_type.as_str())
        .bind(&record.prompt)
        .bind(&record.context_injected)
        .bind(&record.anti_bias_instructions)
        .bind(&record.generated_content)
        .bind(record.tokens_used)
        .bind(record.user_rating)
        .bind(record.accepted)
        .bind(record.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_by_project(&self, project_id: i64) -> Result<Vec<GenerationRecord>, AppError> {
        let rows = sqlx::query_as::<_, GenerationRow>(
            r#"
            SELECT id, project_id, chapter_id, generation_type, prompt, context_injected,
                   anti_bias_instructions, generated_content, tokens_used, user_rating,
                   accepted, created_at
            FROM ai_generations
            WHERE project_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(GenerationRecord::try_from).collect()
    }
}
