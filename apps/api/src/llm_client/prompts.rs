// Shared prompt fragments. Each analysis stage that calls the LLM keeps its own
// templates in analysis/prompts.rs and builds on these.

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Builds a system prompt from a role description plus the JSON-only rules.
pub fn json_only_system(role: &str) -> String {
    format!("{role} {JSON_ONLY_SYSTEM}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_only_system_appends_rules() {
        let system = json_only_system("You are an expert technical recruiter.");
        assert!(system.starts_with("You are an expert technical recruiter."));
        assert!(system.ends_with(JSON_ONLY_SYSTEM));
    }
}
