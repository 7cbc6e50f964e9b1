//! Plan enhancer — asks the generator for a JD-tailored plan and résumé bullets.
//!
//! Parts of the reply that fail validation are reported as warnings and the caller
//! keeps the matching fallback part.

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::analysis::gap_scoring::GapResult;
use crate::analysis::plan::{PlanItem, MAX_PLAN_ITEMS, MAX_RESUME_BULLETS};
use crate::analysis::prompts::{PLAN_PROMPT_TEMPLATE, PLAN_ROLE};
use crate::llm_client::prompts::json_only_system;
use crate::llm_client::recovery::{coerce_json, truncate_chars, RecoveryFailure};
use crate::llm_client::{CompletionRequest, GenerationParams, LlmError, TextGenerator};

/// Characters of the JD included in the plan prompt.
pub const JD_CHAR_BUDGET: usize = 4000;

#[derive(Debug, Error)]
pub enum PlanEnhancerError {
    #[error("plan generation call failed: {0}")]
    Llm(#[from] LlmError),

    #[error("plan response was not valid JSON: {failure}")]
    Unparseable {
        failure: RecoveryFailure,
        raw: String,
    },
}

/// What the generator contributed. `None` parts keep their fallback.
#[derive(Debug, Clone, Default)]
pub struct PlanEnhancement {
    pub plan: Option<Vec<PlanItem>>,
    pub resume_bullets: Option<Vec<String>>,
    pub warnings: Vec<String>,
    pub raw: String,
}

pub async fn enhance_plan(
    generator: &dyn TextGenerator,
    gaps: &GapResult,
    jd: &str,
) -> Result<PlanEnhancement, PlanEnhancerError> {
    let system = json_only_system(PLAN_ROLE);
    let prompt = build_plan_prompt(gaps, jd);
    debug!("Sending plan prompt ({} chars)", prompt.len());

    let raw = generator
        .complete(CompletionRequest {
            system: &system,
            prompt: &prompt,
            params: GenerationParams::PLAN,
        })
        .await?;
    debug!("Raw plan response: {}...", truncate_chars(&raw, 200));

    let value = match coerce_json(&raw) {
        Ok(value) => value,
        Err(failure) => return Err(PlanEnhancerError::Unparseable { failure, raw }),
    };

    let mut enhancement = validate_plan_response(&value);
    enhancement.raw = raw;
    Ok(enhancement)
}

pub fn build_plan_prompt(gaps: &GapResult, jd: &str) -> String {
    let missing: Vec<&str> = gaps.missing_skills();

    PLAN_PROMPT_TEMPLATE
        .replace("{present_json}", &to_json_list(gaps.present.as_slice()))
        .replace("{missing_json}", &to_json_list(missing.as_slice()))
        .replace("{weak_json}", &to_json_list(gaps.weak.as_slice()))
        .replace("{jd_text}", truncate_chars(jd, JD_CHAR_BUDGET))
}

fn to_json_list<S: AsRef<str>>(items: &[S]) -> String {
    let items: Vec<&str> = items.iter().map(|s| s.as_ref()).collect();
    serde_json::to_string(&items).unwrap_or_else(|_| "[]".to_string())
}

/// Keeps each part of the reply only if it has the expected shape.
pub fn validate_plan_response(value: &Value) -> PlanEnhancement {
    let mut enhancement = PlanEnhancement::default();

    match value.get("plan") {
        Some(plan) if plan.is_array() => {
            match serde_json::from_value::<Vec<PlanItem>>(plan.clone()) {
                Ok(mut items) => {
                    items.truncate(MAX_PLAN_ITEMS);
                    enhancement.plan = Some(items);
                }
                Err(e) => {
                    warn!("Plan items failed validation: {}", e);
                    enhancement
                        .warnings
                        .push(format!("LLM plan failed validation, fallback plan kept: {e}"));
                }
            }
        }
        _ => enhancement
            .warnings
            .push("LLM response has no plan array, fallback plan kept".to_string()),
    }

    match value.get("resume_bullets") {
        Some(bullets) if bullets.is_array() => match serde_json::from_value::<Vec<String>>(bullets.clone()) {
            Ok(mut bullets) => {
                bullets.truncate(MAX_RESUME_BULLETS);
                enhancement.resume_bullets = Some(bullets);
            }
            Err(e) => enhancement.warnings.push(format!(
                "LLM resume bullets failed validation, fallback bullets kept: {e}"
            )),
        },
        _ => enhancement
            .warnings
            .push("LLM response has no resume_bullets array, fallback bullets kept".to_string()),
    }

    enhancement
}
