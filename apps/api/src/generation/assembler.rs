//! Prompt assembly: fills the chapter and continuation templates from a
//! context snapshot and an instruction list.
//!
//! Optional sections (recap, foreshadowing, conflicts, continuation hint) are
//! dropped entirely when they have nothing to show.

use crate::context::GenerationContext;
use crate::generation::prompts::{
    CHAPTER_PROMPT_TEMPLATE, CONTINUATION_PROMPT_TEMPLATE, DEFAULT_CHAPTER_TITLE, DEFAULT_GENRE,
    NO_CHARACTERS, NO_WORLD_SETTING,
};
use crate::models::chapter::Chapter;
use crate::models::character::Character;

/// Characters of chapter text kept when a recap falls back to content.
const RECAP_TAIL_CHARS: usize = 500;
const NO_SUMMARY: &str = "（无摘要）";

/// What the author supplied for a new chapter.
#[derive(Debug, Clone, Copy)]
pub struct ChapterBrief<'a> {
    pub chapter_number: Option<i32>,
    pub title: Option<&'a str>,
    pub outline: &'a str,
}

/// Replaces `{key}` placeholders in one pass.
///
/// Substituted values are never rescanned, so author text that happens to
/// contain `{genre}` or similar is left alone. Unknown keys stay verbatim.
pub fn render_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let Some(end) = after.find('}') else {
            out.push_str(&rest[start..]);
            return out;
        };

        let key = &after[..end];
        match values.iter().find(|(k, _)| *k == key) {
            Some((_, value)) => {
                out.push_str(value);
                rest = &after[end + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}

pub fn render_chapter_prompt(
    context: &GenerationContext,
    brief: &ChapterBrief<'_>,
    instructions: &[String],
) -> String {
    let heading = chapter_heading(brief.chapter_number, brief.title);
    let chapter_ref = match brief.chapter_number {
        Some(n) if n > 0 => format!("第 {n} 章"),
        _ => "本章".to_string(),
    };
    let recap = recap_section(context.recent_chapters.as_deref().unwrap_or_default());
    let characters = character_blocks(&context.characters, chapter_character_block);
    let foreshadowing = foreshadowing_section(context);
    let conflicts = conflict_section(context);
    let instructions = numbered(instructions);
    let genre = context
        .project
        .genre
        .as_deref()
        .filter(|g| !g.trim().is_empty())
        .unwrap_or(DEFAULT_GENRE);

    render_template(
        CHAPTER_PROMPT_TEMPLATE,
        &[
            ("heading", heading.as_str()),
            ("outline", brief.outline),
            ("world_setting", context.world_setting().unwrap_or(NO_WORLD_SETTING)),
            ("recap_section", recap.as_str()),
            ("character_blocks", characters.as_str()),
            ("foreshadowing_section", foreshadowing.as_str()),
            ("conflict_section", conflicts.as_str()),
            ("instructions", instructions.as_str()),
            ("cultural_label", context.cultural_context_label.as_str()),
            ("genre", genre),
            ("chapter_ref", chapter_ref.as_str()),
        ],
    )
}

pub fn render_continuation_prompt(
    context: &GenerationContext,
    chapter: &Chapter,
    current_content: &str,
    hint: Option<&str>,
    instructions: &[String],
) -> String {
    let heading = chapter_heading(Some(chapter.chapter_number), Some(&chapter.title));
    let hint_section = match hint.map(str::trim).filter(|h| !h.is_empty()) {
        Some(hint) => format!("\n## 续写提示\n{hint}\n"),
        None => String::new(),
    };
    let characters = character_blocks(&context.characters, continuation_character_block);
    let instructions = numbered(instructions);

    render_template(
        CONTINUATION_PROMPT_TEMPLATE,
        &[
            ("chapter_heading", heading.as_str()),
            ("current_content", current_content),
            ("hint_section", hint_section.as_str()),
            ("character_blocks", characters.as_str()),
            ("instructions", instructions.as_str()),
        ],
    )
}

fn chapter_heading(number: Option<i32>, title: Option<&str>) -> String {
    let title = title
        .filter(|t| !t.trim().is_empty())
        .unwrap_or(DEFAULT_CHAPTER_TITLE);
    match number {
        Some(n) if n > 0 => format!("第 {n} 章：{title}"),
        _ => title.to_string(),
    }
}

fn numbered(instructions: &[String]) -> String {
    instructions
        .iter()
        .enumerate()
        .map(|(i, text)| format!("{}. {}", i + 1, text))
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn recap_section(chapters: &[Chapter]) -> String {
    if chapters.is_empty() {
        return String::new();
    }

    let entries = chapters
        .iter()
        .map(|c| {
            format!(
                "### 第 {} 章：{}\n{}",
                c.chapter_number,
                c.title,
                chapter_summary(c)
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    format!("\n## 前情回顾\n\n{entries}\n")
}

/// Outline if the chapter has one, else the tail of its text.
fn chapter_summary(chapter: &Chapter) -> String {
    if let Some(outline) = chapter.outline.as_deref().filter(|o| !o.trim().is_empty()) {
        return outline.to_string();
    }
    match chapter.content.as_deref().filter(|c| !c.trim().is_empty()) {
        Some(content) => {
            let total = content.chars().count();
            content
                .chars()
                .skip(total.saturating_sub(RECAP_TAIL_CHARS))
                .collect()
        }
        None => NO_SUMMARY.to_string(),
    }
}

fn character_blocks(characters: &[Character], block: fn(&Character) -> String) -> String {
    if characters.is_empty() {
        return NO_CHARACTERS.to_string();
    }
    characters
        .iter()
        .map(block)
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn chapter_character_block(character: &Character) -> String {
    let mut lines = vec![
        format!("### **{}**（{}）", character.name, character.role_type.label()),
        format!("- 核心特质：{}", character.personality_traits.join("、")),
        format!("- 深层动机：{}", character.deep_motivation),
        format!("- 绝不会做：{}", character.things_never_do.join("；")),
    ];
    lines.extend(voice_lines(character));
    lines.join("\n")
}

fn continuation_character_block(character: &Character) -> String {
    let mut lines = vec![
        format!("### {}", character.name),
        format!("- 性格：{}", character.personality_traits.join("、")),
        format!("- 深层动机：{}", character.deep_motivation),
        format!("- 绝不会做：{}", character.things_never_do.join("；")),
    ];
    lines.extend(voice_lines(character));
    lines.join("\n")
}

fn voice_lines(character: &Character) -> Vec<String> {
    let mut lines = Vec::new();
    if let Some(pattern) = &character.speech_pattern {
        let described = pattern.describe();
        if !described.is_empty() {
            lines.push(format!("- 说话方式：{described}"));
        }
    }
    if let Some(style) = character
        .language_style
        .as_deref()
        .filter(|s| !s.trim().is_empty())
    {
        lines.push(format!("- 语言风格：{style}"));
    }
    lines
}

fn foreshadowing_section(context: &GenerationContext) -> String {
    if context.active_foreshadowing.is_empty() {
        return String::new();
    }
    let lines = context
        .active_foreshadowing
        .iter()
        .map(|f| {
            let reveal = f
                .planned_reveal_chapter
                .map(|n| format!("计划第{n}章回收"))
                .unwrap_or_else(|| "回收章节未定".to_string());
            match f.description.as_deref().filter(|d| !d.is_empty()) {
                Some(description) => format!("- {}（{}）：{}", f.title, reveal, description),
                None => format!("- {}（{}）", f.title, reveal),
            }
        })
        .collect::<Vec<_>>()
        .join("\n");
    format!("\n## 活跃伏笔\n{lines}\n")
}

fn conflict_section(context: &GenerationContext) -> String {
    if context.active_conflicts.is_empty() {
        return String::new();
    }
    let lines = context
        .active_conflicts
        .iter()
        .map(|c| {
            let mut lines = vec![format!(
                "- 【{}】{} vs {}（强度 {}/10）",
                c.title, c.side_a, c.side_b, c.current_intensity
            )];
            if !c.maintenance_mechanism.trim().is_empty() {
                lines.push(format!("  - 维持机制：{}", c.maintenance_mechanism));
            }
            if !c.cant_reconcile_reasons.is_empty() {
                lines.push(format!(
                    "  - 无法和解原因：{}",
                    c.cant_reconcile_reasons.join("；")
                ));
            }
            lines.join("\n")
        })
        .collect::<Vec<_>>()
        .join("\n");
    format!("\n## 核心冲突\n{lines}\n")
}
