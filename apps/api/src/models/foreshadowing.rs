use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForeshadowingStatus {
    Buried,
    Progressing,
    Revealed,
}

impl FromStr for ForeshadowingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "buried" => Ok(ForeshadowingStatus::Buried),
            "progressing" => Ok(ForeshadowingStatus::Progressing),
            "revealed" => Ok(ForeshadowingStatus::Revealed),
            other => Err(format!("unknown foreshadowing status '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Foreshadowing {
    pub id: i64,
    pub project_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub planned_reveal_chapter: Option<i32>,
    pub status: ForeshadowingStatus,
    /// 1 – 5, higher is more important.
    pub priority: i32,
}

#[cfg(test)]
impl Foreshadowing {
    /// Buried or progressing threads still need tracking; revealed ones don't.
    pub fn is_active(&self) -> bool {
        matches!(
            self.status,
            ForeshadowingStatus::Buried | ForeshadowingStatus::Progressing
        )
    }
}
