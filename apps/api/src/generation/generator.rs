//! Chapter generation: orchestrates the narrative consistency pipeline.
//!
//! Flow: build context → anti-bias instructions → assemble prompt →
//!       text generator → persist generation record → return.
//!
//! Nothing is written unless the provider call succeeds. Provider failures are
//! surfaced as-is; there is no retry at this layer.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use crate::context::{ContextBuilder, ContextParams, GenerationContext};
use crate::errors::AppError;
use crate::generation::anti_bias::{blindspot, AntiBiasEngine, ContextData};
use crate::generation::assembler::{render_chapter_prompt, render_continuation_prompt, ChapterBrief};
use crate::generation::prompts::{CONTINUATION_SYSTEM, NEW_CHAPTER_SYSTEM};
use crate::llm_client::{CompletionRequest, TextGenerator};
use crate::models::generation::{GenerationRecord, GenerationType};
use crate::store::{GenerationLog, NarrativeStore};

/// Used when a new-chapter request names no blindspots.
pub const DEFAULT_BLINDSPOTS: [&str; 3] = [
    blindspot::PERSONALITY_EROSION,
    blindspot::CONFLICT_REDUCTION,
    blindspot::CULTURAL_CONTEXT,
];

/// Continuation always guards against these, in this order.
pub const CONTINUATION_BLINDSPOTS: [&str; 4] = [
    blindspot::PERSONALITY_EROSION,
    blindspot::MICRO_RHYTHM_LOSS,
    blindspot::NEGATIVE_EMOTION_DAMPENING,
    blindspot::CULTURAL_CONTEXT,
];

const NEW_CHAPTER_TEMPERATURE: f32 = 0.7;
const NEW_CHAPTER_MAX_TOKENS: u32 = 8000;
const CONTINUATION_TEMPERATURE: f32 = 0.6;
const CONTINUATION_MAX_TOKENS: u32 = 6000;

// ────────────────────────────────────────────────────────────────────────────
// Data models
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct NewChapterParams {
    pub project_id: i64,
    pub chapter_number: Option<i32>,
    pub title: Option<String>,
    pub outline: String,
    /// Chapter ids for the recap block.
    pub previous_chapters: Option<Vec<i64>>,
    /// `None` means `DEFAULT_BLINDSPOTS`. An empty list means no instructions.
    pub target_blindspots: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default)]
pub struct ContinueParams {
    pub project_id: i64,
    pub chapter_id: i64,
    pub current_content: String,
    pub continuation_hint: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerationResult {
    pub generation_id: Uuid,
    pub content: String,
    pub tokens_used: u32,
    pub anti_bias_instructions: Vec<String>,
}

/// Everything needed to submit one prompt and record it.
struct Submission {
    project_id: i64,
    chapter_id: Option<i64>,
    generation_type: GenerationType,
    request: CompletionRequest,
    context_injected: serde_json::Value,
    instructions: Vec<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Service
// ────────────────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct GenerationService {
    store: Arc<dyn NarrativeStore>,
    history: Arc<dyn GenerationLog>,
    llm: Arc<dyn TextGenerator>,
    context_builder: ContextBuilder,
    anti_bias: AntiBiasEngine,
}

impl GenerationService {
    pub fn new(
        store: Arc<dyn NarrativeStore>,
        history: Arc<dyn GenerationLog>,
        llm: Arc<dyn TextGenerator>,
    ) -> Self {
        Self {
            context_builder: ContextBuilder::new(store.clone()),
            anti_bias: AntiBiasEngine::new(store.clone()),
            store,
            history,
            llm,
        }
    }

    pub fn context_builder(&self) -> &ContextBuilder {
        &self.context_builder
    }

    pub fn anti_bias(&self) -> &AntiBiasEngine {
        &self.anti_bias
    }

    /// Generates a new chapter from an outline.
    pub async fn generate_new_chapter(
        &self,
        params: NewChapterParams,
    ) -> Result<GenerationResult, AppError> {
        info!("Generating new chapter for project {}", params.project_id);

        let context = self
            .context_builder
            .build(
                &ContextParams::full(params.project_id)
                    .with_chapters(params.previous_chapters.clone()),
            )
            .await?;

        let targets: Vec<&str> = match &params.target_blindspots {
            Some(ids) => ids.iter().map(String::as_str).collect(),
            None => DEFAULT_BLINDSPOTS.to_vec(),
        };
        let instructions = self
            .anti_bias
            .generate_instructions(
                params.project_id,
                &targets,
                ContextData::from_context(&context),
            )
            .await?;

        let brief = ChapterBrief {
            chapter_number: params.chapter_number,
            title: params.title.as_deref(),
            outline: &params.outline,
        };
        let prompt = render_chapter_prompt(&context, &brief, &instructions);

        self.submit(Submission {
            project_id: params.project_id,
            chapter_id: None,
            generation_type: GenerationType::NewChapter,
            request: CompletionRequest {
                prompt,
                system: NEW_CHAPTER_SYSTEM.to_string(),
                max_tokens: NEW_CHAPTER_MAX_TOKENS,
                temperature: NEW_CHAPTER_TEMPERATURE,
            },
            context_injected: chapter_context_summary(&context),
            instructions,
        })
        .await
    }

    /// Continues an existing chapter from the author's current text.
    pub async fn continue_writing(
        &self,
        params: ContinueParams,
    ) -> Result<GenerationResult, AppError> {
        // A chapter from another project is reported the same as a missing one.
        let chapter = self
            .store
            .find_chapter_by_id(params.chapter_id)
            .await?
            .filter(|chapter| chapter.project_id == params.project_id)
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "Chapter {} not found in project {}",
                    params.chapter_id, params.project_id
                ))
            })?;

        info!(
            "Continuing chapter {} (#{}) for project {}",
            chapter.id, chapter.chapter_number, params.project_id
        );

        let context = self
            .context_builder
            .build(&ContextParams::full(params.project_id))
            .await?;

        let instructions = self
            .anti_bias
            .generate_instructions(
                params.project_id,
                &CONTINUATION_BLINDSPOTS,
                ContextData::from_context(&context),
            )
            .await?;

        let prompt = render_continuation_prompt(
            &context,
            &chapter,
            &params.current_content,
            params.continuation_hint.as_deref(),
            &instructions,
        );

        self.submit(Submission {
            project_id: params.project_id,
            chapter_id: Some(chapter.id),
            generation_type: GenerationType::ContinueWriting,
            request: CompletionRequest {
                prompt,
                system: CONTINUATION_SYSTEM.to_string(),
                max_tokens: CONTINUATION_MAX_TOKENS,
                temperature: CONTINUATION_TEMPERATURE,
            },
            context_injected: json!({ "characters": character_names(&context) }),
            instructions,
        })
        .await
    }

    /// Sends the prompt and, only on success, appends the generation record.
    async fn submit(&self, submission: Submission) -> Result<GenerationResult, AppError> {
        let instructions_json = serde_json::to_string(&submission.instructions).map_err(|e| {
            AppError::Internal(anyhow::anyhow!("Failed to serialize instructions: {e}"))
        })?;

        let completion = self
            .llm
            .generate(&submission.request)
            .await
            .map_err(|e| {
                warn!(
                    "{} generation failed for project {}: {e}",
                    submission.generation_type, submission.project_id
                );
                AppError::from(e)
            })?;

        if completion.stop_reason.as_deref() == Some("max_tokens") {
            warn!(
                "{} output for project {} hit the token limit and may be truncated",
                submission.generation_type, submission.project_id
            );
        }

        let record = GenerationRecord {
            id: Uuid::new_v4(),
            project_id: submission.project_id,
            chapter_id: submission.chapter_id,
            generation_type: submission.generation_type,
            prompt: submission.request.prompt,
            context_injected: submission.context_injected.to_string(),
            anti_bias_instructions: instructions_json,
            generated_content: completion.content.clone(),
            tokens_used: i64::from(completion.tokens_used),
            user_rating: None,
            accepted: false,
            created_at: Utc::now(),
        };
        self.history.insert(&record).await?;

        info!(
            "Recorded generation {} ({}, {} tokens, {} instructions) for project {}",
            record.id,
            record.generation_type,
            completion.tokens_used,
            submission.instructions.len(),
            record.project_id
        );

        Ok(GenerationResult {
            generation_id: record.id,
            content: completion.content,
            tokens_used: completion.tokens_used,
            anti_bias_instructions: submission.instructions,
        })
    }
}

fn character_names(context: &GenerationContext) -> Vec<&str> {
    context.characters.iter().map(|c| c.name.as_str()).collect()
}

fn chapter_context_summary(context: &GenerationContext) -> serde_json::Value {
    json!({
        "characters": character_names(context),
        "foreshadowing": context
            .active_foreshadowing
            .iter()
            .map(|f| f.title.as_str())
            .collect::<Vec<_>>(),
        "conflicts": context
            .active_conflicts
            .iter()
            .map(|c| c.title.as_str())
            .collect::<Vec<_>>(),
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
