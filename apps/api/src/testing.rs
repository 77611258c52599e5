//! Shared fixtures for pipeline tests.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::llm_client::{Completion, CompletionRequest, LlmError, TextGenerator};
use crate::models::chapter::Chapter;
use crate::models::character::{Character, RoleType};
use crate::models::conflict::{Conflict, ConflictStatus};
use crate::models::foreshadowing::{Foreshadowing, ForeshadowingStatus};
use crate::models::project::{CulturalContext, Project};

pub const PROJECT_ID: i64 = 1;

pub fn project(cultural_context: CulturalContext) -> Project {
    Project {
        id: PROJECT_ID,
        name: "长夜".to_string(),
        description: None,
        genre: Some("玄幻".to_string()),
        world_setting: Some("灵气复苏后的九州".to_string()),
        cultural_context,
    }
}

pub fn alice() -> Character {
    Character {
        id: 10,
        project_id: PROJECT_ID,
        name: "Alice".to_string(),
        role_type: RoleType::Protagonist,
        personality_traits: vec!["stubborn".to_string(), "loyal".to_string()],
        deep_motivation: "revenge".to_string(),
        things_never_do: vec!["betray a friend".to_string()],
        speech_pattern: None,
        language_style: None,
    }
}

pub fn character(id: i64, name: &str, role_type: RoleType) -> Character {
    Character {
        id,
        project_id: PROJECT_ID,
        name: name.to_string(),
        role_type,
        personality_traits: vec!["冷静".to_string()],
        deep_motivation: "守护家族".to_string(),
        things_never_do: vec!["背叛师门".to_string()],
        speech_pattern: None,
        language_style: None,
    }
}

pub fn conflict(id: i64, title: &str, intensity: i32, status: ConflictStatus) -> Conflict {
    Conflict {
        id,
        project_id: PROJECT_ID,
        title: title.to_string(),
        side_a: "沈家".to_string(),
        side_b: "陆家".to_string(),
        current_intensity: intensity,
        maintenance_mechanism: "血仇未报".to_string(),
        cant_reconcile_reasons: vec!["灭门之仇".to_string(), "婚约被毁".to_string()],
        status,
    }
}

pub fn foreshadowing(
    id: i64,
    title: &str,
    priority: i32,
    status: ForeshadowingStatus,
) -> Foreshadowing {
    Foreshadowing {
        id,
        project_id: PROJECT_ID,
        title: title.to_string(),
        description: Some(format!("{title}的来历")),
        planned_reveal_chapter: Some(30),
        status,
        priority,
    }
}

pub fn chapter(id: i64, chapter_number: i32, title: &str) -> Chapter {
    Chapter {
        id,
        project_id: PROJECT_ID,
        chapter_number,
        title: title.to_string(),
        content: Some("旧文。".to_string()),
        outline: Some(format!("{title}大纲")),
    }
}

pub const FAKE_CONTENT: &str = "夜色沉沉，沈墨握紧了剑。";
pub const FAKE_TOKENS: u32 = 321;

enum Script {
    Reply(Completion),
    Fail(fn() -> LlmError),
}

/// Scripted text generator that records every request it receives.
pub struct FakeGenerator {
    script: Script,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl FakeGenerator {
    pub fn replying() -> Self {
        Self::with_script(Script::Reply(Completion {
            content: FAKE_CONTENT.to_string(),
            tokens_used: FAKE_TOKENS,
            stop_reason: Some("end_turn".to_string()),
        }))
    }

    pub fn failing(error: fn() -> LlmError) -> Self {
        Self::with_script(Script::Fail(error))
    }

    fn with_script(script: Script) -> Self {
        Self {
            script,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for FakeGenerator {
    async fn generate(&self, request: &CompletionRequest) -> Result<Completion, LlmError> {
        self.requests.lock().unwrap().push(request.clone());
        match &self.script {
            Script::Reply(completion) => Ok(completion.clone()),
            Script::Fail(error) => Err(error()),
        }
    }
}
