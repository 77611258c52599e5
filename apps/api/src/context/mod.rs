// Context Builder: assembles the narrative snapshot a generation call works from.
// Pure reads through the injected NarrativeStore; nothing here writes.

pub mod builder;
pub mod handlers;
pub mod models;

pub use builder::ContextBuilder;
pub use models::{CharacterSelection, ContextParams, GenerationContext};
