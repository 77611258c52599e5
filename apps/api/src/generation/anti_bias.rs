//! Anti-bias engine: turns a list of drift categories ("blindspots") into
//! ordered natural-language instructions for the generation prompt.
//!
//! Each category id maps to an `InstructionRule` in an `InstructionRegistry`.
//! Adding a category means registering one more rule; nothing else changes.
//!
//! Guarantees:
//! - output order follows input order, each category yields at most one entry
//! - unknown ids are skipped, never an error
//! - identical inputs produce byte-identical output

use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::context::GenerationContext;
use crate::errors::AppError;
use crate::generation::cultural::cultural_instruction;
use crate::generation::prompts::{
    BACKGROUND_CHARACTER_INSTRUCTION, CHARACTER_DRIFT_FALLBACK, CHARACTER_DRIFT_FOOTER,
    CHARACTER_DRIFT_HEADER, CONFLICT_FOOTER, CONFLICT_HEADER, FORESHADOWING_FOOTER,
    FORESHADOWING_HEADER, MICRO_RHYTHM_INSTRUCTION, MOTIVATION_INSTRUCTION,
    NEGATIVE_EMOTION_INSTRUCTION, POWER_INFLATION_INSTRUCTION, TIMELINE_INSTRUCTION,
};
use crate::models::character::Character;
use crate::models::conflict::Conflict;
use crate::models::foreshadowing::Foreshadowing;
use crate::models::project::Project;
use crate::store::NarrativeStore;

/// Category identifiers accepted by the engine.
pub mod blindspot {
    pub const PERSONALITY_EROSION: &str = "personality_erosion";
    pub const FORESHADOWING_FORGOTTEN: &str = "foreshadowing_forgotten";
    pub const CONFLICT_REDUCTION: &str = "conflict_reduction";
    pub const BACKGROUND_CHARACTER_QUANTUM: &str = "background_character_quantum";
    pub const POWER_INFLATION: &str = "power_inflation";
    pub const MICRO_RHYTHM_LOSS: &str = "micro_rhythm_loss";
    pub const NEGATIVE_EMOTION_DAMPENING: &str = "negative_emotion_dampening";
    pub const TIMELINE_DISTORTION: &str = "timeline_distortion";
    pub const MOTIVATION_SUBSTITUTION: &str = "motivation_substitution";
    pub const CULTURAL_CONTEXT: &str = "cultural_context";
}

// ────────────────────────────────────────────────────────────────────────────
// Rule data
// ────────────────────────────────────────────────────────────────────────────

/// Which piece of narrative state a rule reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataNeed {
    Project,
    Characters,
    Conflicts,
    Foreshadowing,
}

/// Pre-fetched state handed to the engine. A `None` field is fetched from the
/// store if a requested rule needs it; `Some(&[])` is taken as authoritative.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContextData<'a> {
    pub project: Option<&'a Project>,
    pub characters: Option<&'a [Character]>,
    pub conflicts: Option<&'a [Conflict]>,
    pub foreshadowing: Option<&'a [Foreshadowing]>,
}

impl<'a> ContextData<'a> {
    pub fn from_context(context: &'a GenerationContext) -> Self {
        Self {
            project: Some(&context.project),
            characters: Some(&context.characters),
            conflicts: Some(&context.active_conflicts),
            foreshadowing: Some(&context.active_foreshadowing),
        }
    }
}

/// State resolved for one `generate_instructions` call.
#[derive(Debug, Default)]
pub struct InstructionData<'a> {
    project: Option<Cow<'a, Project>>,
    characters: Option<Cow<'a, [Character]>>,
    conflicts: Option<Cow<'a, [Conflict]>>,
    foreshadowing: Option<Cow<'a, [Foreshadowing]>>,
}

impl InstructionData<'_> {
    pub fn project(&self) -> Option<&Project> {
        self.project.as_deref()
    }

    pub fn characters(&self) -> &[Character] {
        self.characters.as_deref().unwrap_or(&[])
    }

    pub fn conflicts(&self) -> &[Conflict] {
        self.conflicts.as_deref().unwrap_or(&[])
    }

    pub fn foreshadowing(&self) -> &[Foreshadowing] {
        self.foreshadowing.as_deref().unwrap_or(&[])
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Registry
// ────────────────────────────────────────────────────────────────────────────

pub type RenderFn = fn(&InstructionData<'_>) -> Option<String>;

/// How one category produces its instruction.
#[derive(Clone, Copy)]
pub enum InstructionRule {
    /// Same text every time, no data needed.
    Fixed(&'static str),
    /// Synthesised from narrative state. `None` or an empty string means
    /// "not applicable" and contributes nothing.
    Dynamic { needs: DataNeed, render: RenderFn },
}

impl InstructionRule {
    pub fn needs(&self) -> Option<DataNeed> {
        match self {
            InstructionRule::Fixed(_) => None,
            InstructionRule::Dynamic { needs, .. } => Some(*needs),
        }
    }

    pub fn render(&self, data: &InstructionData<'_>) -> Option<String> {
        match self {
            InstructionRule::Fixed(text) => Some((*text).to_string()),
            InstructionRule::Dynamic { render, .. } => render(data),
        }
    }
}

pub struct InstructionRegistry {
    rules: HashMap<&'static str, InstructionRule>,
}

impl InstructionRegistry {
    pub fn empty() -> Self {
        Self {
            rules: HashMap::new(),
        }
    }

    /// Adds or replaces the rule for `id`.
    pub fn register(mut self, id: &'static str, rule: InstructionRule) -> Self {
        self.rules.insert(id, rule);
        self
    }

    pub fn get(&self, id: &str) -> Option<&InstructionRule> {
        self.rules.get(id)
    }
}

impl Default for InstructionRegistry {
    fn default() -> Self {
        use blindspot::*;

        Self::empty()
            .register(
                PERSONALITY_EROSION,
                InstructionRule::Dynamic {
                    needs: DataNeed::Characters,
                    render: |data| Some(character_drift_instruction(data.characters())),
                },
            )
            .register(
                CONFLICT_REDUCTION,
                InstructionRule::Dynamic {
                    needs: DataNeed::Conflicts,
                    render: |data| conflict_instruction(data.conflicts()),
                },
            )
            .register(
                CULTURAL_CONTEXT,
                InstructionRule::Dynamic {
                    needs: DataNeed::Project,
                    render: |data| data.project().map(|p| cultural_instruction(&p.cultural_context)),
                },
            )
            .register(
                FORESHADOWING_FORGOTTEN,
                InstructionRule::Dynamic {
                    needs: DataNeed::Foreshadowing,
                    render: |data| foreshadowing_instruction(data.foreshadowing()),
                },
            )
            .register(
                NEGATIVE_EMOTION_DAMPENING,
                InstructionRule::Fixed(NEGATIVE_EMOTION_INSTRUCTION),
            )
            .register(
                BACKGROUND_CHARACTER_QUANTUM,
                InstructionRule::Fixed(BACKGROUND_CHARACTER_INSTRUCTION),
            )
            .register(POWER_INFLATION, InstructionRule::Fixed(POWER_INFLATION_INSTRUCTION))
            .register(MICRO_RHYTHM_LOSS, InstructionRule::Fixed(MICRO_RHYTHM_INSTRUCTION))
            .register(TIMELINE_DISTORTION, InstructionRule::Fixed(TIMELINE_INSTRUCTION))
            .register(MOTIVATION_SUBSTITUTION, InstructionRule::Fixed(MOTIVATION_INSTRUCTION))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Dynamic instruction synthesis
// ────────────────────────────────────────────────────────────────────────────

/// Always returns an instruction: with no characters it degrades to a generic
/// directive instead of disappearing.
pub fn character_drift_instruction(characters: &[Character]) -> String {
    if characters.is_empty() {
        return CHARACTER_DRIFT_FALLBACK.to_string();
    }

    let lines = characters
        .iter()
        .map(|c| {
            format!(
                "【{}】核心特质：{}。绝不会：{}。深层动机：{}。",
                c.name,
                c.personality_traits.join("、"),
                c.things_never_do.join("；"),
                c.deep_motivation
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!("{CHARACTER_DRIFT_HEADER}\n{lines}\n{CHARACTER_DRIFT_FOOTER}")
}

/// `None` when there is nothing to protect.
pub fn conflict_instruction(conflicts: &[Conflict]) -> Option<String> {
    if conflicts.is_empty() {
        return None;
    }

    let lines = conflicts
        .iter()
        .map(|c| {
            format!(
                "【{}】强度：{}/10。无法和解：{}。维持机制：{}。",
                c.title,
                c.current_intensity,
                c.cant_reconcile_reasons.join("；"),
                c.maintenance_mechanism
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    Some(format!("{CONFLICT_HEADER}\n{lines}\n{CONFLICT_FOOTER}"))
}

/// `None` when no thread is open.
pub fn foreshadowing_instruction(items: &[Foreshadowing]) -> Option<String> {
    if items.is_empty() {
        return None;
    }

    let lines = items
        .iter()
        .map(|f| {
            let reveal = f
                .planned_reveal_chapter
                .map(|n| n.to_string())
                .unwrap_or_else(|| "未定".to_string());
            format!(
                "- {}（计划第{}章回收）：{}",
                f.title,
                reveal,
                f.description.as_deref().unwrap_or_default()
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    Some(format!("{FORESHADOWING_HEADER}\n{lines}\n{FORESHADOWING_FOOTER}"))
}

// ────────────────────────────────────────────────────────────────────────────
// Engine
// ────────────────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct AntiBiasEngine {
    store: Arc<dyn NarrativeStore>,
    registry: Arc<InstructionRegistry>,
}

impl AntiBiasEngine {
    pub fn new(store: Arc<dyn NarrativeStore>) -> Self {
        Self::with_registry(store, InstructionRegistry::default())
    }

    pub fn with_registry(store: Arc<dyn NarrativeStore>, registry: InstructionRegistry) -> Self {
        Self {
            store,
            registry: Arc::new(registry),
        }
    }

    /// Generates one instruction per applicable category, in input order.
    ///
    /// Fails only when a requested rule needs the project and it does not
    /// resolve, or when the store itself errors.
    pub async fn generate_instructions(
        &self,
        project_id: i64,
        targets: &[&str],
        context: ContextData<'_>,
    ) -> Result<Vec<String>, AppError> {
        let rules: Vec<&InstructionRule> = targets
            .iter()
            .filter_map(|id| {
                let rule = self.registry.get(id);
                if rule.is_none() {
                    debug!("Ignoring unknown blindspot '{id}'");
                }
                rule
            })
            .collect();

        let data = self.resolve(project_id, &rules, context).await?;

        Ok(rules
            .iter()
            .filter_map(|rule| rule.render(&data))
            .filter(|instruction| !instruction.is_empty())
            .collect())
    }

    /// Fills in whatever the requested rules need and the caller didn't supply.
    async fn resolve<'a>(
        &self,
        project_id: i64,
        rules: &[&InstructionRule],
        context: ContextData<'a>,
    ) -> Result<InstructionData<'a>, AppError> {
        let needs = |need: DataNeed| rules.iter().any(|r| r.needs() == Some(need));
        let mut data = InstructionData::default();

        if needs(DataNeed::Project) {
            data.project = Some(match context.project {
                Some(project) => Cow::Borrowed(project),
                None => Cow::Owned(
                    self.store
                        .find_project(project_id)
                        .await?
                        .ok_or_else(|| {
                            AppError::NotFound(format!("Project {project_id} not found"))
                        })?,
                ),
            });
        }

        if needs(DataNeed::Characters) {
            data.characters = Some(match context.characters {
                Some(characters) => Cow::Borrowed(characters),
                None => Cow::Owned(self.store.find_characters_by_project(project_id).await?),
            });
        }

        if needs(DataNeed::Conflicts) {
            data.conflicts = Some(match context.conflicts {
                Some(conflicts) => Cow::Borrowed(conflicts),
                None => Cow::Owned(self.store.find_active_conflicts(project_id).await?),
            });
        }

        if needs(DataNeed::Foreshadowing) {
            data.foreshadowing = Some(match context.foreshadowing {
                Some(items) => Cow::Borrowed(items),
                None => Cow::Owned(self.store.find_active_foreshadowing(project_id).await?),
            });
        }

        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::blindspot::*;
    use super::*;
    use crate::models::conflict::ConflictStatus;
    use crate::models::foreshadowing::ForeshadowingStatus;
    use crate::models::project::CulturalContext;
    use crate::store::memory::InMemoryStore;
    use crate::testing::{self, PROJECT_ID};

    fn engine(store: InMemoryStore) -> (AntiBiasEngine, Arc<InMemoryStore>) {
        let store = Arc::new(store);
        (AntiBiasEngine::new(store.clone()), store)
    }

    fn chinese_store() -> InMemoryStore {
        InMemoryStore::new().with_project(testing::project(CulturalContext::Chinese))
    }

    #[tokio::test]
    async fn test_character_and_cultural_instructions_for_alice() {
        let (engine, _) = engine(chinese_store().with_character(testing::alice()));

        let instructions = engine
            .generate_instructions(
                PROJECT_ID,
                &[PERSONALITY_EROSION, CULTURAL_CONTEXT],
                ContextData::default(),
            )
            .await
            .unwrap();

        assert_eq!(instructions.len(), 2);
        let character = &instructions[0];
        assert!(character.contains("Alice"));
        assert!(character.contains("stubborn、loyal"));
        assert!(character.contains("betray a friend"));
        assert!(character.contains("revenge"));
        assert_eq!(
            instructions[1],
            cultural_instruction(&CulturalContext::Chinese)
        );
    }

    #[tokio::test]
    async fn test_zero_active_conflicts_yields_nothing() {
        let (engine, _) = engine(
            chinese_store().with_conflict(testing::conflict(1, "旧案", 7, ConflictStatus::Resolved)),
        );
        let instructions = engine
            .generate_instructions(PROJECT_ID, &[CONFLICT_REDUCTION], ContextData::default())
            .await
            .unwrap();
        assert!(instructions.is_empty());
    }

    #[tokio::test]
    async fn test_zero_characters_yields_single_fallback() {
        let (engine, _) = engine(chinese_store());
        let instructions = engine
            .generate_instructions(PROJECT_ID, &[PERSONALITY_EROSION], ContextData::default())
            .await
            .unwrap();
        assert_eq!(instructions, vec![CHARACTER_DRIFT_FALLBACK.to_string()]);
    }

    #[tokio::test]
    async fn test_conflict_instruction_lists_intensity_reasons_and_mechanism() {
        let (engine, _) = engine(
            chinese_store()
                .with_conflict(testing::conflict(1, "旧怨", 3, ConflictStatus::Active))
                .with_conflict(testing::conflict(2, "血仇", 9, ConflictStatus::Active)),
        );
        let instructions = engine
            .generate_instructions(PROJECT_ID, &[CONFLICT_REDUCTION], ContextData::default())
            .await
            .unwrap();
        assert_eq!(instructions.len(), 1);
        let text = &instructions[0];
        assert!(text.starts_with(CONFLICT_HEADER));
        assert!(text.ends_with(CONFLICT_FOOTER));
        assert!(text.contains("【血仇】强度：9/10。无法和解：灭门之仇；婚约被毁。维持机制：血仇未报。"));
        assert!(text.find("血仇").unwrap() < text.find("旧怨").unwrap());
    }

    #[tokio::test]
    async fn test_foreshadowing_instruction_with_and_without_reveal_chapter() {
        let mut undated = testing::foreshadowing(2, "密信", 1, ForeshadowingStatus::Buried);
        undated.planned_reveal_chapter = None;
        undated.description = None;
        let (engine, _) = engine(
            chinese_store()
                .with_foreshadowing(testing::foreshadowing(
                    1,
                    "玉佩",
                    3,
                    ForeshadowingStatus::Progressing,
                ))
                .with_foreshadowing(undated),
        );
        let instructions = engine
            .generate_instructions(PROJECT_ID, &[FORESHADOWING_FORGOTTEN], ContextData::default())
            .await
            .unwrap();
        let text = &instructions[0];
        assert!(text.contains("- 玉佩（计划第30章回收）：玉佩的来历"));
        assert!(text.contains("- 密信（计划第未定章回收）："));
        assert!(text.ends_with(FORESHADOWING_FOOTER));
    }

    #[tokio::test]
    async fn test_no_open_threads_yields_nothing() {
        let (engine, _) = engine(chinese_store());
        let instructions = engine
            .generate_instructions(PROJECT_ID, &[FORESHADOWING_FORGOTTEN], ContextData::default())
            .await
            .unwrap();
        assert!(instructions.is_empty());
    }

    #[tokio::test]
    async fn test_output_preserves_input_order_and_skips_unknown() {
        let (engine, _) = engine(chinese_store());
        let targets = [
            TIMELINE_DISTORTION,
            "plot_armor",
            NEGATIVE_EMOTION_DAMPENING,
            CONFLICT_REDUCTION,
            POWER_INFLATION,
        ];
        let instructions = engine
            .generate_instructions(PROJECT_ID, &targets, ContextData::default())
            .await
            .unwrap();
        assert!(instructions.len() <= targets.len());
        assert_eq!(
            instructions,
            vec![
                TIMELINE_INSTRUCTION.to_string(),
                NEGATIVE_EMOTION_INSTRUCTION.to_string(),
                POWER_INFLATION_INSTRUCTION.to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_static_rules_touch_no_storage() {
        let (engine, store) = engine(InMemoryStore::new());
        let instructions = engine
            .generate_instructions(
                404,
                &[
                    BACKGROUND_CHARACTER_QUANTUM,
                    MICRO_RHYTHM_LOSS,
                    MOTIVATION_SUBSTITUTION,
                ],
                ContextData::default(),
            )
            .await
            .unwrap();
        assert_eq!(instructions.len(), 3);
        assert!(store.queries().is_empty());
    }

    #[tokio::test]
    async fn test_identical_inputs_give_identical_output() {
        let (engine, _) = engine(
            chinese_store()
                .with_character(testing::alice())
                .with_conflict(testing::conflict(1, "血仇", 9, ConflictStatus::Active))
                .with_foreshadowing(testing::foreshadowing(
                    1,
                    "玉佩",
                    3,
                    ForeshadowingStatus::Buried,
                )),
        );
        let targets = [
            PERSONALITY_EROSION,
            CONFLICT_REDUCTION,
            FORESHADOWING_FORGOTTEN,
            CULTURAL_CONTEXT,
            MICRO_RHYTHM_LOSS,
        ];
        let first = engine
            .generate_instructions(PROJECT_ID, &targets, ContextData::default())
            .await
            .unwrap();
        let second = engine
            .generate_instructions(PROJECT_ID, &targets, ContextData::default())
            .await
            .unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 5);
    }

    #[tokio::test]
    async fn test_cultural_text_ignores_other_project_fields() {
        let plain = testing::project(CulturalContext::Western);
        let mut decorated = testing::project(CulturalContext::Western);
        decorated.name = "完全不同的书".to_string();
        decorated.genre = Some("科幻".to_string());
        decorated.world_setting = None;

        let (engine, _) = engine(InMemoryStore::new());
        let a = engine
            .generate_instructions(
                PROJECT_ID,
                &[CULTURAL_CONTEXT],
                ContextData {
                    project: Some(&plain),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let b = engine
            .generate_instructions(
                PROJECT_ID,
                &[CULTURAL_CONTEXT],
                ContextData {
                    project: Some(&decorated),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_cultural_rule_fails_when_project_missing() {
        let (engine, _) = engine(InMemoryStore::new());
        let result = engine
            .generate_instructions(7, &[CULTURAL_CONTEXT], ContextData::default())
            .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_supplied_data_skips_fallback_queries() {
        let (engine, store) = engine(chinese_store().with_character(testing::alice()));
        let characters: Vec<Character> = Vec::new();
        let instructions = engine
            .generate_instructions(
                PROJECT_ID,
                &[PERSONALITY_EROSION],
                ContextData {
                    characters: Some(&characters),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        // The explicitly empty snapshot wins over what storage holds.
        assert_eq!(instructions, vec![CHARACTER_DRIFT_FALLBACK.to_string()]);
        assert!(store.queries().is_empty());
    }

    #[tokio::test]
    async fn test_empty_traits_degrade_without_failing() {
        let mut blank = testing::alice();
        blank.personality_traits.clear();
        blank.things_never_do.clear();
        let (engine, _) = engine(chinese_store().with_character(blank));
        let instructions = engine
            .generate_instructions(PROJECT_ID, &[PERSONALITY_EROSION], ContextData::default())
            .await
            .unwrap();
        assert!(instructions[0].contains("【Alice】核心特质：。绝不会：。深层动机：revenge。"));
    }

    #[tokio::test]
    async fn test_registered_rule_is_picked_up() {
        let registry = InstructionRegistry::default()
            .register("dialogue_flattening", InstructionRule::Fixed("对白不要千人一面。"));
        let engine = AntiBiasEngine::with_registry(Arc::new(InMemoryStore::new()), registry);
        let instructions = engine
            .generate_instructions(PROJECT_ID, &["dialogue_flattening"], ContextData::default())
            .await
            .unwrap();
        assert_eq!(instructions, vec!["对白不要千人一面。".to_string()]);
    }
}
