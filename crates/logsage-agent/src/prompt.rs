//! System prompts and canned prompts for the scenarios.

/// System prompt for the log store agent.
pub fn log_store_system_prompt() -> String {
    "\
You are an intelligent assistant that can analyze logs stored in the log \
database. Use the tools 'get_logs_summary', 'get_logs_by_level' and \
'query_logs' as needed."
        .to_string()
}

/// System prompt for the Kusto agent. Re-fetching is cheap because of the
/// cache, but the model is still told to reuse logs already in the history.
pub fn kusto_system_prompt() -> String {
    "\
You are an intelligent assistant that can analyze Kusto logs. Use the tool \
'get_1000_kusto_logs' as needed. If chat history already contains logs, \
reuse them. If you need to perform any custom actions, work on this JSON."
        .to_string()
}

pub fn translator_system_prompt() -> String {
    "Translate the user's message to Yoda dialect.".to_string()
}

/// Instruction paired with [`JSON_PROMPT`] in the JSON prompt scenario.
pub const JSON_INSTRUCTION: &str = "Respond with JSON.";
pub const JSON_PROMPT: &str = "What is Seattle?";

/// Single prompts for the basic prompt scenario.
pub fn basic_prompts() -> Vec<String> {
    vec![
        "What color is the sky?".to_string(),
        fill_topic("What color is the {topic}?", "sea"),
        fill_topic("Tell me a story about {topic}", "dogs"),
    ]
}

/// A question the model cannot answer without a clock. The tool scenario
/// asks it first without tools and then with them.
pub const DATE_PROMPT: &str = "How many days until Christmas? Explain your thinking.";

/// Substitute `{topic}` in a prompt template.
pub fn fill_topic(template: &str, topic: &str) -> String {
    template.replace("{topic}", topic)
}
