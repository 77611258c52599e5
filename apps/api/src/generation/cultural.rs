//! Cultural-context protection: maps a project's cultural register to a fixed
//! paragraph of stylistic and value constraints.
//!
//! The text depends on `CulturalContext` alone. No other project field may
//! influence it.

use crate::models::project::CulturalContext;

const CHINESE: &str = "保持中式文化语境：
- 人物关系：含蓄、注重面子、重视人情世故
- 表达方式：委婉、隐晦，避免美式直白
- 价值观：集体、等级、关系网络
- 禁止出现：契约精神、骑士精神、个人主义、直接对抗权威等西式概念";

const JAPANESE: &str = "保持日式文化语境：
- 上下级关系严格，集体主义
- 表达极度含蓄，注重氛围（空気を読む）
- 避免直接冲突，重视和谐
- 禁止美式直白和西式个人主义";

const CLASSICAL: &str = "保持古典文学语境：
- 语言：文言、半文言，避免现代白话
- 概念：传统伦理、等级制度
- 禁止：现代化概念、西式思维、白话俚语";

const WESTERN: &str = "保持西式文化语境：
- 表达直白、强调个人
- 契约精神、法律意识
- 但避免刻板印象和过度理想化";

/// Returns the full cultural-context instruction, prefixed with the key marker.
pub fn cultural_instruction(context: &CulturalContext) -> String {
    let body = match context {
        CulturalContext::Chinese => CHINESE.to_string(),
        CulturalContext::Japanese => JAPANESE.to_string(),
        CulturalContext::Classical => CLASSICAL.to_string(),
        CulturalContext::Western => WESTERN.to_string(),
        CulturalContext::Other(raw) => format!(
            "保持{raw}文化语境：\n- 人物言行、价值观与表达方式符合该文化\n- 避免不加区分地套用美式直白表达"
        ),
    };
    format!("🔑 {body}")
}
