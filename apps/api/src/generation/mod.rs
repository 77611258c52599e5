// Narrative-consistent generation: anti-bias instructions, prompt assembly,
// and the orchestrator that submits prompts and records what was produced.
// All provider calls go through the `TextGenerator` trait.

pub mod anti_bias;
pub mod assembler;
pub mod cultural;
pub mod generator;
pub mod handlers;
pub mod prompts;

pub use generator::GenerationService;
