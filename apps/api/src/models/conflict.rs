use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictStatus {
    Active,
    Escalated,
    Resolved,
}

impl FromStr for ConflictStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(ConflictStatus::Active),
            "escalated" => Ok(ConflictStatus::Escalated),
            "resolved" => Ok(ConflictStatus::Resolved),
            other => Err(format!("unknown conflict status '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conflict {
    pub id: i64,
    pub project_id: i64,
    pub title: String,
    pub side_a: String,
    pub side_b: String,
    /// 1 – 10
    pub current_intensity: i32,
    pub maintenance_mechanism: String,
    pub cant_reconcile_reasons: Vec<String>,
    pub status: ConflictStatus,
}

#[cfg(test)]
impl Conflict {
    pub fn is_active(&self) -> bool {
        self.status == ConflictStatus::Active
    }
}
