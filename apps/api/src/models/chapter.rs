use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chapter {
    pub id: i64,
    pub project_id: i64,
    pub chapter_number: i32,
    pub title: String,
    pub content: Option<String>,
    pub outline: Option<String>,
}
