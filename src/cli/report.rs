//! Terminal rendering of conversation results

use crate::agent::{DirectAnswer, Transcript};
use crate::tools::query::format_rows;

/// Render a transcript as readable blocks, one per message
pub fn render_transcript(transcript: &Transcript, delimiter: &str) -> String {
    let mut output = String::new();

    for (i, msg) in transcript.messages.iter().enumerate() {
        output.push_str(&format!("\n[{}] {} ({})\n", i, msg.speaker, msg.kind));
        output.push_str(&msg.content);
        output.push_str("\n─────────────────────────────");
    }

    output.push_str(&format!(
        "\n\nConversation ended: {} after {} round(s)\n",
        transcript.reason, transcript.rounds
    ));

    match transcript.final_query(delimiter) {
        Some(query) => {
            output.push_str("\nFinal query:\n");
            output.push_str(&query.payload);
            output.push('\n');
        }
        None => output.push_str("\nNo query in the expected format was produced.\n"),
    }

    output
}

/// Render a direct answer
pub fn render_direct(answer: &DirectAnswer) -> String {
    format!(
        "{}\n\nSQL:\n{}\n\n{}\n",
        answer.explanation,
        answer.sql,
        format_rows(&answer.rows)
    )
}
