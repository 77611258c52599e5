use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationType {
    NewChapter,
    ContinueWriting,
}

impl GenerationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            GenerationType::NewChapter => "new_chapter",
            GenerationType::ContinueWriting => "continue_writing",
        }
    }
}

impl fmt::Display for GenerationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GenerationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new_chapter" => Ok(GenerationType::NewChapter),
            "continue_writing" => Ok(GenerationType::ContinueWriting),
            other => Err(format!("unknown generation type '{other}'")),
        }
    }
}

/// Audit trail of one generation call: what was sent, which instructions were
/// injected, and what came back.
///
/// `context_injected` and `anti_bias_instructions` hold serialized JSON exactly
/// as it was produced at generation time. Written once, never updated here;
/// `user_rating` / `accepted` belong to the review flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRecord {
    pub id: Uuid,
    pub project_id: i64,
    pub chapter_id: Option<i64>,
    pub generation_type: GenerationType,
    pub prompt: String,
    pub context_injected: String,
    pub anti_bias_instructions: String,
    pub generated_content: String,
    pub tokens_used: i64,
    pub user_rating: Option<i16>,
    pub accepted: bool,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
impl GenerationRecord {
    /// Decodes the stored instruction list.
    pub fn instructions(&self) -> Result<Vec<String>, serde_json::Error> {
        serde_json::from_str(&self.anti_bias_instructions)
    }
}
