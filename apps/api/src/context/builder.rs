//! Context Builder: reads a project's current narrative state into one
//! immutable `GenerationContext`.
//!
//! Flow: project (required) → characters → active foreshadowing →
//!       active conflicts → recent chapters.
//!
//! Every section is optional except the project itself; a missing project is
//! the only hard failure.

use std::sync::Arc;

use tracing::debug;

use crate::context::models::{CharacterSelection, ContextParams, GenerationContext};
use crate::errors::AppError;
use crate::models::project::Project;
use crate::store::NarrativeStore;

#[derive(Clone)]
pub struct ContextBuilder {
    store: Arc<dyn NarrativeStore>,
}

impl ContextBuilder {
    pub fn new(store: Arc<dyn NarrativeStore>) -> Self {
        Self { store }
    }

    pub async fn build(&self, params: &ContextParams) -> Result<GenerationContext, AppError> {
        let project = self.require_project(params.project_id).await?;

        let characters = match &params.characters {
            CharacterSelection::None => Vec::new(),
            CharacterSelection::All => {
                self.store
                    .find_characters_by_project(params.project_id)
                    .await?
            }
            CharacterSelection::Specific(ids) if ids.is_empty() => Vec::new(),
            CharacterSelection::Specific(ids) => {
                self.store
                    .find_characters_by_ids(params.project_id, ids)
                    .await?
            }
        };

        let active_foreshadowing = if params.include_foreshadowing {
            self.store
                .find_active_foreshadowing(params.project_id)
                .await?
        } else {
            Vec::new()
        };

        let active_conflicts = if params.include_conflicts {
            self.store.find_active_conflicts(params.project_id).await?
        } else {
            Vec::new()
        };

        let recent_chapters = match params.include_chapters.as_deref() {
            Some(ids) if !ids.is_empty() => Some(
                self.store
                    .find_chapters_by_ids(params.project_id, ids)
                    .await?,
            ),
            _ => None,
        };

        debug!(
            "Context for project {}: {} characters, {} foreshadowing, {} conflicts, {} chapters",
            project.id,
            characters.len(),
            active_foreshadowing.len(),
            active_conflicts.len(),
            recent_chapters.as_ref().map_or(0, Vec::len)
        );

        Ok(GenerationContext {
            cultural_context_label: project.cultural_context.label().to_string(),
            project,
            characters,
            active_foreshadowing,
            active_conflicts,
            recent_chapters,
        })
    }

    async fn require_project(&self, project_id: i64) -> Result<Project, AppError> {
        self.store
            .find_project(project_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Project {project_id} not found")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::chapter::Chapter;
    use crate::models::character::{Character, RoleType};
    use crate::models::conflict::ConflictStatus;
    use crate::models::foreshadowing::ForeshadowingStatus;
    use crate::models::project::CulturalContext;
    use crate::store::memory::InMemoryStore;
    use crate::testing::{self, PROJECT_ID};

    fn builder(store: InMemoryStore) -> (ContextBuilder, Arc<InMemoryStore>) {
        let store = Arc::new(store);
        (ContextBuilder::new(store.clone()), store)
    }

    #[tokio::test]
    async fn test_missing_project_is_not_found() {
        let (builder, _) = builder(InMemoryStore::new());
        let result = builder.build(&ContextParams::full(99)).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_label_follows_cultural_context() {
        let (builder, _) = builder(
            InMemoryStore::new().with_project(testing::project(CulturalContext::Japanese)),
        );
        let context = builder.build(&ContextParams::full(PROJECT_ID)).await.unwrap();
        assert_eq!(context.cultural_context_label, "日式");
    }

    #[tokio::test]
    async fn test_all_characters_ordered_by_role_then_name() {
        let (builder, _) = builder(
            InMemoryStore::new()
                .with_project(testing::project(CulturalContext::Chinese))
                .with_character(testing::character(1, "Zed", RoleType::Supporting))
                .with_character(testing::character(2, "Bo", RoleType::Protagonist))
                .with_character(testing::character(3, "Al", RoleType::Supporting))
                .with_character(testing::character(4, "Mo", RoleType::Antagonist)),
        );
        let context = builder.build(&ContextParams::full(PROJECT_ID)).await.unwrap();
        let names: Vec<_> = context.characters.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Mo", "Bo", "Al", "Zed"]);
    }

    #[tokio::test]
    async fn test_specific_characters_skip_unknown_ids() {
        let (builder, _) = builder(
            InMemoryStore::new()
                .with_project(testing::project(CulturalContext::Chinese))
                .with_character(testing::character(1, "沈墨", RoleType::Protagonist))
                .with_character(testing::character(2, "陆离", RoleType::Antagonist)),
        );
        let params = ContextParams {
            project_id: PROJECT_ID,
            characters: CharacterSelection::Specific(vec![2, 404]),
            ..Default::default()
        };
        let context = builder.build(&params).await.unwrap();
        assert_eq!(context.characters.len(), 1);
        assert_eq!(context.characters[0].name, "陆离");
    }

    #[tokio::test]
    async fn test_ids_from_other_projects_are_skipped() {
        let stranger = Character {
            project_id: 2,
            ..testing::character(3, "外人", RoleType::Minor)
        };
        let foreign_chapter = Chapter {
            project_id: 2,
            ..testing::chapter(77, 3, "他乡")
        };
        let (builder, _) = builder(
            InMemoryStore::new()
                .with_project(testing::project(CulturalContext::Chinese))
                .with_character(testing::character(1, "沈墨", RoleType::Protagonist))
                .with_character(stranger)
                .with_chapter(testing::chapter(7, 12, "夜袭"))
                .with_chapter(foreign_chapter),
        );
        let params = ContextParams {
            project_id: PROJECT_ID,
            characters: CharacterSelection::Specific(vec![3, 1]),
            ..Default::default()
        }
        .with_chapters(Some(vec![77, 7]));
        let context = builder.build(&params).await.unwrap();

        let names: Vec<_> = context.characters.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["沈墨"]);
        let chapters: Vec<_> = context
            .recent_chapters
            .unwrap()
            .iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(chapters, vec![7]);
    }

    #[tokio::test]
    async fn test_equal_intensity_conflicts_ordered_by_id() {
        let (builder, _) = builder(
            InMemoryStore::new()
                .with_project(testing::project(CulturalContext::Chinese))
                .with_conflict(testing::conflict(5, "后立", 5, ConflictStatus::Active))
                .with_conflict(testing::conflict(2, "先立", 5, ConflictStatus::Active)),
        );
        let context = builder.build(&ContextParams::full(PROJECT_ID)).await.unwrap();
        let ids: Vec<_> = context.active_conflicts.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![2, 5]);
    }

    #[tokio::test]
    async fn test_only_active_entities_and_their_ordering() {
        let (builder, _) = builder(
            InMemoryStore::new()
                .with_project(testing::project(CulturalContext::Chinese))
                .with_conflict(testing::conflict(1, "旧怨", 4, ConflictStatus::Active))
                .with_conflict(testing::conflict(2, "已了结", 9, ConflictStatus::Resolved))
                .with_conflict(testing::conflict(3, "血仇", 8, ConflictStatus::Active))
                .with_foreshadowing(testing::foreshadowing(
                    1,
                    "玉佩",
                    1,
                    ForeshadowingStatus::Buried,
                ))
                .with_foreshadowing(testing::foreshadowing(
                    2,
                    "预言",
                    5,
                    ForeshadowingStatus::Progressing,
                ))
                .with_foreshadowing(testing::foreshadowing(
                    3,
                    "古剑",
                    5,
                    ForeshadowingStatus::Revealed,
                ))
                .with_foreshadowing(testing::foreshadowing(
                    4,
                    "密信",
                    1,
                    ForeshadowingStatus::Buried,
                )),
        );
        let context = builder.build(&ContextParams::full(PROJECT_ID)).await.unwrap();

        let conflicts: Vec<_> = context.active_conflicts.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(conflicts, vec!["血仇", "旧怨"]);

        let threads: Vec<_> = context
            .active_foreshadowing
            .iter()
            .map(|f| f.title.as_str())
            .collect();
        assert_eq!(threads, vec!["预言", "玉佩", "密信"]);
    }

    #[tokio::test]
    async fn test_excluded_sections_issue_no_queries() {
        let (builder, store) = builder(
            InMemoryStore::new().with_project(testing::project(CulturalContext::Chinese)),
        );
        let params = ContextParams {
            project_id: PROJECT_ID,
            ..Default::default()
        };
        let context = builder.build(&params).await.unwrap();
        assert!(context.characters.is_empty());
        assert!(context.recent_chapters.is_none());
        assert_eq!(store.queries(), vec!["find_project"]);
    }

    #[tokio::test]
    async fn test_recent_chapters_sorted_by_number() {
        let (builder, _) = builder(
            InMemoryStore::new()
                .with_project(testing::project(CulturalContext::Chinese))
                .with_chapter(testing::chapter(31, 12, "夜袭"))
                .with_chapter(testing::chapter(30, 11, "入城"))
                .with_chapter(testing::chapter(29, 10, "出关")),
        );
        let params = ContextParams::full(PROJECT_ID).with_chapters(Some(vec![31, 29]));
        let context = builder.build(&params).await.unwrap();
        let numbers: Vec<_> = context
            .recent_chapters
            .unwrap()
            .iter()
            .map(|c| c.chapter_number)
            .collect();
        assert_eq!(numbers, vec![10, 12]);
    }

    #[tokio::test]
    async fn test_empty_chapter_list_means_no_recap() {
        let (builder, _) = builder(
            InMemoryStore::new().with_project(testing::project(CulturalContext::Chinese)),
        );
        let params = ContextParams::full(PROJECT_ID).with_chapters(Some(Vec::new()));
        let context = builder.build(&params).await.unwrap();
        assert!(context.recent_chapters.is_none());
    }
}
