//! Prompt Enhancer module
//! Fills in missing design attributes of interior-design prompts

pub mod prompt_enhancer;
pub mod tables;

pub use prompt_enhancer::{enhance_prompt, PromptEnhancer, PERSPECTIVES, QUALITY_BOOSTERS};
pub use tables::KnowledgeTables;
