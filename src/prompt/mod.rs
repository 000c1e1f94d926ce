//! Prompt module - building task prompts and reading structured replies

pub mod assembler;
pub mod extractor;

pub use assembler::{assemble, response_format, task_prompt, PromptAssembler};
pub use extractor::{extract, Extracted};
