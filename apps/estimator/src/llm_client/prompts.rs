// Shared prompt fragments.
// Each service that needs LLM calls defines its own prompts.rs alongside it.

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You are a precise, structured assistant. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Appended to every extraction prompt so the model does not echo examples.
pub const NO_INVENTION_INSTRUCTION: &str = "\
    CRITICAL: Only report what the text explicitly states. \
    Do NOT guess, invent values, or copy the examples from these instructions.";
