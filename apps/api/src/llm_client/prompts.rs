// Shared prompt fragments. Each pipeline keeps its own prompts.rs alongside it;
// this file holds only cross-cutting pieces.

/// Appended to every prompt whose reply must be a single JSON document.
pub const FENCED_JSON_INSTRUCTION: &str = "\
    Include only the JSON object in your response, wrapped in triple backticks. \
    Make sure all brackets and braces are properly closed and balanced. \
    Do NOT include explanations or apologies outside the code block.";

/// Separator the question and classification prompts ask the model to emit.
pub const ITEM_SEPARATOR: &str = "QQQ";
