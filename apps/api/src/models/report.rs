use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::analysis::gap_scoring::WeightedMissing;
use crate::analysis::hybrid::{MatchMethod, MatchResult};
use crate::analysis::matcher::SkillSpans;
use crate::analysis::plan::PlanItem;

/// Schema tag consumed by the rendering collaborators.
pub const REPORT_VERSION: &str = "enhanced_v3";

/// The merged skill-gap report. Always well-formed, even when every external call failed.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    /// Headline score from the hybrid matcher.
    pub match_pct: u8,
    pub text_match_details: TextMatchDetails,
    /// Frequency-weighted taxonomy coverage from the gap scorer.
    pub gap_match_pct: f64,
    pub present: Vec<String>,
    pub missing: Vec<WeightedMissing>,
    pub weak: Vec<String>,
    pub jd_spans: Vec<SkillSpans>,
    pub resume_spans: Vec<SkillSpans>,
    pub plan: Vec<PlanItem>,
    pub resume_bullets: Vec<String>,
    pub meta: ReportMeta,
}

#[derive(Debug, Clone, Serialize)]
pub struct TextMatchDetails {
    pub method: MatchMethod,
    pub matching_skills: Vec<String>,
    pub missing_critical: Vec<String>,
    pub explanation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experience_match: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain_match: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jd_keywords_found: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resume_keywords_found: Option<usize>,
}

impl From<&MatchResult> for TextMatchDetails {
    fn from(result: &MatchResult) -> Self {
        Self {
            method: result.method,
            matching_skills: result.matching_skills.clone(),
            missing_critical: result.missing_critical.clone(),
            explanation: result.explanation.clone(),
            experience_match: result.experience_match,
            domain_match: result.domain_match,
            jd_keywords_found: result.jd_keywords_found,
            resume_keywords_found: result.resume_keywords_found,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportMeta {
    pub analysis_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub api_status: ApiStatus,
    pub timing_ms: StageTimings,
    pub methods: StageMethods,
    pub warnings: Vec<String>,
    pub errors: Vec<Diagnostic>,
    pub version: &'static str,
    /// Head of the raw plan-generation response; only when debug diagnostics are on.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug_raw: Option<String>,
}

/// Whether the plan-generation call returned a successful response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiStatus {
    Success,
    FallbackUsed,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct StageTimings {
    pub total: u64,
    pub extract: u64,
    pub text_matching: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_call: Option<u64>,
}

/// Which method produced each part of the report.
#[derive(Debug, Clone, Serialize)]
pub struct StageMethods {
    pub text_match: MatchMethod,
    pub plan: ContentSource,
    pub resume_bullets: ContentSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentSource {
    Llm,
    Fallback,
}

/// Non-fatal problem recorded while producing the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
        }
    }

    pub fn with_status(mut self, status: Option<u16>) -> Self {
        self.status = status;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    TextMatchingError,
    ExternalServiceError,
    JsonParseError,
    JsonRecoveryFailed,
    NoValidJson,
    EmptyInput,
}
