//! Router prompt construction.

use crate::domain::few_shot::ScoredExample;
use crate::domain::tools::ToolDefinition;

use super::{render_hints, Hint};

const ROUTER_INSTRUCTIONS: &str = "\
You are a query router for a retrieval system. Decide how to answer the user's query.

Reply with exactly one JSON object and nothing else, in one of these forms:
{\"type\":\"tool_calls\",\"calls\":[{\"tool\":\"<tool name>\",\"parameters\":{...}}]}
{\"type\":\"direct_answer\",\"answer\":\"<answer>\"}
{\"type\":\"clarification\",\"question\":\"<follow-up question>\"}

Rules:
- Use tool_calls when answering needs retrieval. Parameters must follow the tool's JSON Schema exactly; omit optional parameters you cannot infer.
- When the query spans several kinds of content, call every relevant tool rather than guessing one.
- When two tools are alternative ways to find the same information, prefer the more specific one.
- Use direct_answer only for general or definitional questions that need no documents.
- Use clarification when the query is too ambiguous to route.
- Dates use the format YYYY-MM-DD.";

/// System prompt: instructions, tool catalogue and few-shot examples.
pub fn build_system_prompt(tools: &[&ToolDefinition], examples: &[ScoredExample]) -> String {
    let mut out = String::from(ROUTER_INSTRUCTIONS);

    out.push_str("\n\n## Available tools\n");
    if tools.is_empty() {
        out.push_str("No tools are available. Answer directly or ask for clarification.\n");
    }
    for tool in tools {
        out.push('\n');
        out.push_str(&tool.describe_for_prompt());
    }

    if !examples.is_empty() {
        out.push_str("\n## Examples\n");
        for example in examples {
            out.push_str(&format!(
                "\nQuery: {}\nRoute: {}\n",
                example.record.query(),
                example.record.route().to_json_string()
            ));
        }
    }

    out
}

/// User message: the query plus any deterministic hints.
pub fn build_user_prompt(query: &str, hints: &[Hint]) -> String {
    match render_hints(hints) {
        Some(block) => format!("Query: {}\n\n{}", query, block),
        None => format!("Query: {}", query),
    }
}
