//! Prompt assembly
//!
//! Splices labelled reference blocks (schema text, output contracts) into a
//! task instruction. Each application appends one block after everything
//! assembled so far.

use crate::core::config::ConversationConfig;

/// Append one labelled reference block to a prompt.
///
/// Produces `"{base_prompt} {suffix}\n\n{ref_name}\n\n{ref_content}"`.
/// Callers must keep `ref_name` and any extraction delimiter out of
/// `ref_content`.
pub fn assemble(base_prompt: &str, suffix: &str, ref_name: &str, ref_content: &str) -> String {
    format!("{base_prompt} {suffix}\n\n{ref_name}\n\n{ref_content}")
}

/// Accumulates reference blocks onto a base instruction
#[derive(Debug, Clone)]
pub struct PromptAssembler {
    text: String,
}

impl PromptAssembler {
    pub fn new(base_prompt: impl Into<String>) -> Self {
        Self {
            text: base_prompt.into(),
        }
    }

    /// Append a reference block after the blocks already present
    pub fn reference(mut self, suffix: &str, ref_name: &str, ref_content: &str) -> Self {
        self.text = assemble(&self.text, suffix, ref_name, ref_content);
        self
    }

    pub fn build(self) -> String {
        self.text
    }
}

/// The output contract agents are asked to follow
pub fn response_format(delimiter: &str) -> String {
    format!("<explanation of the sql query>\n{delimiter}\n<sql query exclusively as raw text>")
}

/// Build the seed message for a natural-language request: the request,
/// followed by the schema block and the response format block.
pub fn task_prompt(request: &str, schema_text: &str, conversation: &ConversationConfig) -> String {
    let tables = &conversation.table_definitions_ref;
    let format_ref = &conversation.response_format_ref;

    PromptAssembler::new(request)
        .reference(
            &format!(
                "Use these {tables} to satisfy the {} database query.",
                conversation.database_version
            ),
            tables,
            schema_text,
        )
        .reference(
            &format!(
                "Respond in this format {format_ref}. I need to be able to easily parse the sql query from your response."
            ),
            format_ref,
            &response_format(&conversation.sql_delimiter),
        )
        .build()
}
