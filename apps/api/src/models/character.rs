use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RoleType {
    Protagonist,
    Major,
    Supporting,
    Minor,
    Antagonist,
    Other(String),
}

impl RoleType {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "protagonist" => RoleType::Protagonist,
            "major" => RoleType::Major,
            "supporting" => RoleType::Supporting,
            "minor" => RoleType::Minor,
            "antagonist" => RoleType::Antagonist,
            other => RoleType::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            RoleType::Protagonist => "protagonist",
            RoleType::Major => "major",
            RoleType::Supporting => "supporting",
            RoleType::Minor => "minor",
            RoleType::Antagonist => "antagonist",
            RoleType::Other(raw) => raw,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            RoleType::Protagonist => "主角",
            RoleType::Major => "主要角色",
            RoleType::Supporting => "配角",
            RoleType::Minor => "次要角色",
            RoleType::Antagonist => "反派",
            RoleType::Other(raw) => raw,
        }
    }
}

impl From<String> for RoleType {
    fn from(raw: String) -> Self {
        RoleType::parse(&raw)
    }
}

impl From<RoleType> for String {
    fn from(role: RoleType) -> Self {
        role.as_str().to_string()
    }
}

/// How a character talks. Every field is optional; an all-empty pattern
/// describes to nothing and is left out of prompts.
///
/// Stored as camelCase JSON by the authoring app; snake_case keys are accepted
/// too.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeechPattern {
    #[serde(default)]
    pub rhythm: Option<String>,
    #[serde(default, alias = "sentence_structure")]
    pub sentence_structure: Option<String>,
    #[serde(default, alias = "tone_words")]
    pub tone_words: Vec<String>,
}

impl SpeechPattern {
    /// Renders the pattern as `节奏：…；句式：…；语气词：…`, skipping absent parts.
    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        if let Some(rhythm) = self.rhythm.as_deref().filter(|s| !s.is_empty()) {
            parts.push(format!("节奏：{rhythm}"));
        }
        if let Some(structure) = self.sentence_structure.as_deref().filter(|s| !s.is_empty()) {
            parts.push(format!("句式：{structure}"));
        }
        if !self.tone_words.is_empty() {
            parts.push(format!("语气词：{}", self.tone_words.join("、")));
        }
        parts.join("；")
    }
}

/// A character as the pipeline sees it. `personality_traits` and
/// `things_never_do` are expected to be non-empty but are never required to be.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Character {
    pub id: i64,
    pub project_id: i64,
    pub name: String,
    pub role_type: RoleType,
    pub personality_traits: Vec<String>,
    pub deep_motivation: String,
    pub things_never_do: Vec<String>,
    pub speech_pattern: Option<SpeechPattern>,
    pub language_style: Option<String>,
}
