pub mod chapter;
pub mod character;
pub mod conflict;
pub mod foreshadowing;
pub mod generation;
pub mod project;
