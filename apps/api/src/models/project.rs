use serde::{Deserialize, Serialize};

/// Cultural register a project is written in. Drives the wording of the
/// cultural-context instruction and the style line of every prompt.
///
/// Values outside the four known registers are kept verbatim so a hand-edited
/// row never breaks generation.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CulturalContext {
    #[default]
    Chinese,
    Japanese,
    Western,
    Classical,
    Other(String),
}

impl CulturalContext {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "chinese" => CulturalContext::Chinese,
            "japanese" => CulturalContext::Japanese,
            "western" => CulturalContext::Western,
            "classical" => CulturalContext::Classical,
            other => CulturalContext::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            CulturalContext::Chinese => "chinese",
            CulturalContext::Japanese => "japanese",
            CulturalContext::Western => "western",
            CulturalContext::Classical => "classical",
            CulturalContext::Other(raw) => raw,
        }
    }

    /// Short label injected into prompts ("中式文化语境").
    pub fn label(&self) -> &str {
        match self {
            CulturalContext::Chinese => "中式",
            CulturalContext::Japanese => "日式",
            CulturalContext::Western => "西式",
            CulturalContext::Classical => "古典",
            CulturalContext::Other(raw) => raw,
        }
    }
}

impl From<String> for CulturalContext {
    fn from(raw: String) -> Self {
        CulturalContext::parse(&raw)
    }
}

impl From<CulturalContext> for String {
    fn from(context: CulturalContext) -> Self {
        context.as_str().to_string()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub genre: Option<String>,
    pub world_setting: Option<String>,
    pub cultural_context: CulturalContext,
}
