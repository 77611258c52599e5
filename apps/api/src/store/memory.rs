//! In-memory store used by the pipeline tests. Mirrors the ordering contract of
//! the Postgres queries and records which reads were issued.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::errors::AppError;
use crate::models::chapter::Chapter;
use crate::models::character::Character;
use crate::models::conflict::Conflict;
use crate::models::foreshadowing::Foreshadowing;
use crate::models::generation::GenerationRecord;
use crate::models::project::Project;
use crate::store::{GenerationLog, NarrativeStore};

#[derive(Default)]
pub struct InMemoryStore {
    projects: Vec<Project>,
    characters: Vec<Character>,
    conflicts: Vec<Conflict>,
    foreshadowing: Vec<Foreshadowing>,
    chapters: Vec<Chapter>,
    generations: Mutex<Vec<GenerationRecord>>,
    queries: Mutex<Vec<&'static str>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_project(mut self, project: Project) -> Self {
        self.projects.push(project);
        self
    }

    pub fn with_character(mut self, character: Character) -> Self {
        self.characters.push(character);
        self
    }

    pub fn with_conflict(mut self, conflict: Conflict) -> Self {
        self.conflicts.push(conflict);
        self
    }

    pub fn with_foreshadowing(mut self, item: Foreshadowing) -> Self {
        self.foreshadowing.push(item);
        self
    }

    pub fn with_chapter(mut self, chapter: Chapter) -> Self {
        self.chapters.push(chapter);
        self
    }

    /// Records inserted through `GenerationLog::insert`, oldest first.
    pub fn inserted(&self) -> Vec<GenerationRecord> {
        self.generations.lock().unwrap().clone()
    }

    /// Names of the read methods called so far, in call order.
    pub fn queries(&self) -> Vec<&'static str> {
        self.queries.lock().unwrap().clone()
    }

    fn log_query(&self, name: &'static str) {
        self.queries.lock().unwrap().push(name);
    }
}

#[async_trait]
impl NarrativeStore for InMemoryStore {
    async fn find_project(&self, project_id: i64) -> Result<Option<Project>, AppError> {
        self.log_query("find_project");
        Ok(self.projects.iter().find(|p| p.id == project_id).cloned())
    }

    async fn find_characters_by_project(
        &self,
        project_id: i64,
    ) -> Result<Vec<Character>, AppError> {
        self.log_query("find_characters_by_project");
        let mut characters: Vec<Character> = self
            .characters
            .iter()
            .filter(|c| c.project_id == project_id)
            .cloned()
            .collect();
        characters.sort_by(|a, b| {
            a.role_type
                .as_str()
                .cmp(b.role_type.as_str())
                .then_with(|| a.name.cmp(&b.name))
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(characters)
    }

    async fn find_characters_by_ids(
        &self,
        project_id: i64,
        ids: &[i64],
    ) -> Result<Vec<Character>, AppError> {
        self.log_query("find_characters_by_ids");
        let mut characters: Vec<Character> = self
            .characters
            .iter()
            .filter(|c| c.project_id == project_id && ids.contains(&c.id))
            .cloned()
            .collect();
        characters.sort_by_key(|c| c.id);
        Ok(characters)
    }

    async fn find_active_conflicts(&self, project_id: i64) -> Result<Vec<Conflict>, AppError> {
        self.log_query("find_active_conflicts");
        let mut conflicts: Vec<Conflict> = self
            .conflicts
            .iter()
            .filter(|c| c.project_id == project_id && c.is_active())
            .cloned()
            .collect();
        conflicts.sort_by(|a, b| {
            b.current_intensity
                .cmp(&a.current_intensity)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(conflicts)
    }

    async fn find_active_foreshadowing(
        &self,
        project_id: i64,
    ) -> Result<Vec<Foreshadowing>, AppError> {
        self.log_query("find_active_foreshadowing");
        // Insertion order stands in for created_at; sort_by is stable.
        let mut items: Vec<Foreshadowing> = self
            .foreshadowing
            .iter()
            .filter(|f| f.project_id == project_id && f.is_active())
            .cloned()
            .collect();
        items.sort_by(|a, b| b.priority.cmp(&a.priority));
        Ok(items)
    }

    async fn find_chapters_by_ids(
        &self,
        project_id: i64,
        ids: &[i64],
    ) -> Result<Vec<Chapter>, AppError> {
        self.log_query("find_chapters_by_ids");
        let mut chapters: Vec<Chapter> = self
            .chapters
            .iter()
            .filter(|c| c.project_id == project_id && ids.contains(&c.id))
            .cloned()
            .collect();
        chapters.sort_by_key(|c| (c.chapter_number, c.id));
        Ok(chapters)
    }

    async fn find_chapter_by_id(&self, chapter_id: i64) -> Result<Option<Chapter>, AppError> {
        self.log_query("find_chapter_by_id");
        Ok(self.chapters.iter().find(|c| c.id == chapter_id).cloned())
    }
}

#[async_trait]
impl GenerationLog for InMemoryStore {
    async fn insert(&self, record: &GenerationRecord) -> Result<(), AppError> {
        self.generations.lock().unwrap().push(record.clone());
        Ok(())
    }

    async fn list_by_project(&self, project_id: i64) -> Result<Vec<GenerationRecord>, AppError> {
        let mut records: Vec<GenerationRecord> = self
            .generations
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.project_id == project_id)
            .cloned()
            .collect();
        records.reverse();
        Ok(records)
    }
}
