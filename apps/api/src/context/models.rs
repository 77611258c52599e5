use serde::Serialize;

use crate::models::chapter::Chapter;
use crate::models::character::Character;
use crate::models::conflict::Conflict;
use crate::models::foreshadowing::Foreshadowing;
use crate::models::project::Project;

/// Which characters a snapshot should carry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CharacterSelection {
    #[default]
    None,
    /// Every character of the project, ordered by (role_type, name).
    All,
    /// Only these ids. Ids that don't resolve are dropped without error.
    Specific(Vec<i64>),
}

/// Parameters for `ContextBuilder::build`.
#[derive(Debug, Clone, Default)]
pub struct ContextParams {
    pub project_id: i64,
    pub characters: CharacterSelection,
    pub include_foreshadowing: bool,
    pub include_conflicts: bool,
    /// Explicit chapter ids for the recap block. The builder never infers
    /// "last N chapters" on its own.
    pub include_chapters: Option<Vec<i64>>,
}

impl ContextParams {
    /// Everything a generation prompt uses: all characters, active
    /// foreshadowing and active conflicts.
    pub fn full(project_id: i64) -> Self {
        Self {
            project_id,
            characters: CharacterSelection::All,
            include_foreshadowing: true,
            include_conflicts: true,
            include_chapters: None,
        }
    }

    pub fn with_chapters(mut self, chapter_ids: Option<Vec<i64>>) -> Self {
        self.include_chapters = chapter_ids;
        self
    }
}

/// Point-in-time narrative state for one generation request.
/// Built fresh per request and dropped once the prompt is assembled.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationContext {
    pub project: Project,
    /// "中式", "日式", … or the raw stored value when unrecognised.
    pub cultural_context_label: String,
    pub characters: Vec<Character>,
    pub active_foreshadowing: Vec<Foreshadowing>,
    pub active_conflicts: Vec<Conflict>,
    pub recent_chapters: Option<Vec<Chapter>>,
}

impl GenerationContext {
    pub fn world_setting(&self) -> Option<&str> {
        self.project
            .world_setting
            .as_deref()
            .filter(|s| !s.trim().is_empty())
    }
}
