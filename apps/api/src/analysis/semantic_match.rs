//! Semantic match — asks the configured generator to compare the JD and résumé.
//!
//! Each document is cut to `DOCUMENT_CHAR_BUDGET` characters before prompting. The
//! reply goes through JSON recovery, then shape validation: `match_percentage` must be
//! numeric, list fields keep only their string items, sub-scores default to 0.

use serde_json::{Map, Value};
use tracing::debug;

use crate::analysis::hybrid::{clamp_pct, MatchMethod, MatchResult, StrategyError};
use crate::analysis::prompts::{SEMANTIC_MATCH_PROMPT_TEMPLATE, SEMANTIC_MATCH_ROLE};
use crate::llm_client::prompts::json_only_system;
use crate::llm_client::recovery::{coerce_json, truncate_chars};
use crate::llm_client::{CompletionRequest, GenerationParams, TextGenerator};

pub const DOCUMENT_CHAR_BUDGET: usize = 3000;

pub async fn semantic_match(
    generator: &dyn TextGenerator,
    jd: &str,
    resume: &str,
) -> Result<MatchResult, StrategyError> {
    let system = json_only_system(SEMANTIC_MATCH_ROLE);
    let prompt = build_semantic_prompt(jd, resume);

    let raw = generator
        .complete(CompletionRequest {
            system: &system,
            prompt: &prompt,
            params: GenerationParams::SEMANTIC_MATCH,
        })
        .await?;
    debug!("Raw semantic match response: {}...", truncate_chars(&raw, 200));

    let value = coerce_json(&raw)?;
    validate_semantic_response(&value)
}

pub fn build_semantic_prompt(jd: &str, resume: &str) -> String {
    SEMANTIC_MATCH_PROMPT_TEMPLATE
        .replace("{jd_text}", truncate_chars(jd, DOCUMENT_CHAR_BUDGET))
        .replace("{resume_text}", truncate_chars(resume, DOCUMENT_CHAR_BUDGET))
}

pub fn validate_semantic_response(value: &Value) -> Result<MatchResult, StrategyError> {
    let object = value
        .as_object()
        .ok_or_else(|| StrategyError::InvalidShape("expected a JSON object".to_string()))?;

    let match_percentage = object
        .get("match_percentage")
        .and_then(Value::as_f64)
        .ok_or_else(|| {
            StrategyError::InvalidShape("match_percentage is missing or not a number".to_string())
        })?;

    Ok(MatchResult {
        match_pct: clamp_pct(match_percentage),
        matching_skills: string_items(object, "matching_skills"),
        missing_critical: string_items(object, "missing_critical"),
        experience_match: Some(sub_score(object, "experience_match")),
        domain_match: Some(sub_score(object, "domain_match")),
        explanation: object
            .get("explanation")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        ..MatchResult::empty(MatchMethod::SemanticLlm)
    })
}

fn string_items(object: &Map<String, Value>, key: &str) -> Vec<String> {
    object
        .get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn sub_score(object: &Map<String, Value>, key: &str) -> u8 {
    object
        .get(key)
        .and_then(Value::as_f64)
        .map(clamp_pct)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::mock::ScriptedGenerator;
    use serde_json::json;

    #[test]
    fn test_valid_response_is_clamped_and_rounded() {
        let result = validate_semantic_response(&json!({
            "match_percentage": 123.7,
            "matching_skills": ["react", "node.js"],
            "missing_critical": ["kubernetes"],
            "experience_match": 74.6,
            "domain_match": -3,
            "explanation": "Strong frontend overlap"
        }))
        .unwrap();

        assert_eq!(result.match_pct, 100);
        assert_eq!(result.method, MatchMethod::SemanticLlm);
        assert_eq!(result.matching_skills, vec!["react", "node.js"]);
        assert_eq!(result.experience_match, Some(75));
        assert_eq!(result.domain_match, Some(0));
        assert_eq!(result.explanation, "Strong frontend overlap");
    }

    #[test]
    fn test_non_numeric_percentage_is_rejected() {
        let err = validate_semantic_response(&json!({"match_percentage": "85"})).unwrap_err();
        assert!(matches!(err, StrategyError::InvalidShape(_)));
    }

    #[test]
    fn test_non_object_is_rejected() {
        assert!(validate_semantic_response(&json!([1, 2])).is_err());
    }

    #[test]
    fn test_malformed_lists_and_missing_fields_default() {
        let result = validate_semantic_response(&json!({
            "match_percentage": 40,
            "matching_skills": "react",
            "missing_critical": ["docker", 7, null]
        }))
        .unwrap();

        assert!(result.matching_skills.is_empty());
        assert_eq!(result.missing_critical, vec!["docker"]);
        assert_eq!(result.experience_match, Some(0));
        assert_eq!(result.explanation, "");
    }

    #[test]
    fn test_prompt_truncates_each_document() {
        let jd = "j".repeat(DOCUMENT_CHAR_BUDGET + 500);
        let resume = "r".repeat(10);
        let prompt = build_semantic_prompt(&jd, &resume);

        assert!(prompt.contains(&"j".repeat(DOCUMENT_CHAR_BUDGET)));
        assert!(!prompt.contains(&"j".repeat(DOCUMENT_CHAR_BUDGET + 1)));
        assert!(prompt.contains(&resume));
    }

    #[tokio::test]
    async fn test_fenced_reply_is_recovered() {
        let generator = ScriptedGenerator::replying(
            "```json\n{\"match_percentage\": 66, \"matching_skills\": [\"sql\"],}\n```",
        );
        let result = semantic_match(&generator, "jd", "resume").await.unwrap();
        assert_eq!(result.match_pct, 66);
        assert_eq!(result.matching_skills, vec!["sql"]);
    }

    #[tokio::test]
    async fn test_request_uses_semantic_parameters() {
        let generator = ScriptedGenerator::new(|request| {
            assert_eq!(request.params, GenerationParams::SEMANTIC_MATCH);
            assert!(request.system.contains("valid JSON only"));
            assert!(request.prompt.contains("Built REST APIs"));
            Ok(r#"{"match_percentage": 50}"#.to_string())
        });
        semantic_match(&generator, "Need REST", "Built REST APIs")
            .await
            .unwrap();
        assert_eq!(generator.calls(), 1);
    }

    #[tokio::test]
    async fn test_transport_failure_propagates() {
        let generator = ScriptedGenerator::failing(429);
        let err = semantic_match(&generator, "jd", "resume").await.unwrap_err();
        assert!(matches!(err, StrategyError::Llm(_)));
    }
}
