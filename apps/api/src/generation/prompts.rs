// All LLM prompt constants for the Generation module.
// Instruction texts are part of the output contract: the exact strings end up
// in generation records, so edits here change history comparisons.

// ────────────────────────────────────────────────────────────────────────────
// System prompts
// ────────────────────────────────────────────────────────────────────────────

/// System prompt for new-chapter generation.
pub const NEW_CHAPTER_SYSTEM: &str =
    "你是一个专业的小说作家。你的任务是根据设定和大纲生成高质量的小说章节内容。";

/// System prompt for continuation.
pub const CONTINUATION_SYSTEM: &str =
    "你是一个专业的小说作家。你的任务是续写小说内容，保持与前文完全一致的风格和角色设定。";

// ────────────────────────────────────────────────────────────────────────────
// Anti-bias instruction fragments
// ────────────────────────────────────────────────────────────────────────────

pub const CHARACTER_DRIFT_HEADER: &str = "🔑 角色一致性要求（严格遵守）：";
pub const CHARACTER_DRIFT_FOOTER: &str =
    "不要让任何角色\"成长\"成通用好人、理性人、成熟人。保持他们的独特性和缺陷。";
/// Used when the project has no characters at all.
pub const CHARACTER_DRIFT_FALLBACK: &str =
    "严格遵守角色设定，不要让角色变得\"更理性\"或\"更成熟\"。";

pub const CONFLICT_HEADER: &str = "🔑 冲突维持要求（严格遵守）：";
pub const CONFLICT_FOOTER: &str = "不要让对立双方\"相互理解\"、\"握手言和\"、\"发现对方也不容易\"。冲突必须维持设定的强度。";

pub const FORESHADOWING_HEADER: &str = "🔑 伏笔追踪（不要遗忘）：";
pub const FORESHADOWING_FOOTER: &str =
    "如果本章涉及这些伏笔，要推进或回收。如果不涉及，至少保持前后一致，不要矛盾。";

pub const NEGATIVE_EMOTION_INSTRUCTION: &str = "🔑 情绪真实性要求：
- 保持负面情绪的原始强度：愤怒、绝望、憎恨、恐惧、崩溃
- 不要自动软化、理性化、成熟化这些情绪
- 角色可以失控、极端、非理性——这是真实的人性
- 避免\"冷静下来思考\"、\"理性分析\"、\"成长后理解\"等模式化处理";

pub const BACKGROUND_CHARACTER_INSTRUCTION: &str =
    "背景角色不是\"量子态存在\"，他们有连续的日常生活。提及时需符合时间线。";

pub const POWER_INFLATION_INSTRUCTION: &str =
    "严格遵守已建立的战力体系。新角色/新招式的威力不能超过当前章节设定的上限。";

pub const MICRO_RHYTHM_INSTRUCTION: &str =
    "保持原作语言风格：句式长短、停顿节奏、口头禅、说话习惯。不要让所有角色都说标准书面语。";

pub const TIMELINE_INSTRUCTION: &str =
    "严格遵守时间线。已发生事件的顺序、间隔、因果关系不可改变。";

pub const MOTIVATION_INSTRUCTION: &str =
    "角色行为必须基于其深层动机，不要用\"理性选择\"替换角色真实的情感驱动。";

// ────────────────────────────────────────────────────────────────────────────
// Prompt templates
// ────────────────────────────────────────────────────────────────────────────

/// New-chapter prompt.
/// Replace: {heading}, {outline}, {world_setting}, {recap_section},
///          {character_blocks}, {foreshadowing_section}, {conflict_section},
///          {instructions}, {cultural_label}, {genre}, {chapter_ref}
pub const CHAPTER_PROMPT_TEMPLATE: &str = r#"# {heading}

## 本章大纲
{outline}

## 世界观设定
{world_setting}
{recap_section}
## 核心角色设定
{character_blocks}
{foreshadowing_section}{conflict_section}
---

## 🔑 对抗偏差指令（务必严格遵守）

{instructions}

---

## 生成要求

1. **字数**：3000-5000 字
2. **风格**：{cultural_label}文化语境，符合项目题材（{genre}）
3. **一致性**：严格遵守角色设定，不要让角色"成长"或"理性化"
4. **冲突**：保持设定的冲突强度，不要软化
5. **伏笔**：如果本章涉及伏笔，要适当推进
6. **情感**：保持真实的情感强度，包括负面情绪

请开始生成{chapter_ref}的正文内容：
"#;

/// Continuation prompt.
/// Replace: {chapter_heading}, {current_content}, {hint_section},
///          {character_blocks}, {instructions}
pub const CONTINUATION_PROMPT_TEMPLATE: &str = r#"# 续写任务

## 所属章节
{chapter_heading}

## 已有内容
{current_content}
{hint_section}
## 核心角色设定
{character_blocks}
---

## 🔑 对抗偏差指令（务必严格遵守）

{instructions}

---

## 续写要求

1. **风格一致**：保持与前文完全一致的叙事风格、语言风格
2. **角色一致**：角色的说话方式、行为逻辑必须与设定完全吻合
3. **情感一致**：保持前文的情绪氛围和强度
4. **自然衔接**：续写部分要与前文自然衔接，不要出现断层
5. **字数**：约 2000-3000 字

请开始续写：
"#;

pub const DEFAULT_CHAPTER_TITLE: &str = "新章节";
pub const NO_WORLD_SETTING: &str = "（无特别设定）";
pub const DEFAULT_GENRE: &str = "通用";
pub const NO_CHARACTERS: &str = "（暂无角色设定）";
