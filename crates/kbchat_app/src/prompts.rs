/// Prepended to the entity list when the lookup produced usable data.
pub(crate) const GROUNDING_REMINDER: &str = "Here are the top DBpedia lookup results. Select the \
     most relevant entity and follow the system prompt: use its dbo:abstract as the main source \
     for your answer and enrich the answer with up to 3 values of its further properties.";

/// Tool result used when the lookup failed or found nothing.
pub(crate) const UNGROUNDED_FALLBACK: &str = "DBpedia lookup returned no relevant results. \
     Please generate an AI-based answer instead and mark it as AI-generated. Follow the system \
     prompt.";

pub(crate) fn grounded_tool_content(payload: &str) -> String {
    format!("{GROUNDING_REMINDER}\n\nResults:\n{payload}")
}
