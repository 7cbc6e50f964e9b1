//! Hybrid Matcher — ordered, pluggable match strategies with a guaranteed result.
//!
//! The strategy list is built per request:
//! 1. `SemanticStrategy` when enhanced matching is on and a generator is configured
//! 2. `KeywordStrategy` always
//!
//! Strategies run in order; the first success wins. Every failure is recorded as a
//! `Diagnostic`. If the list is exhausted, `error_fallback()` is returned, so callers
//! always get a `MatchResult`.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::analysis::keyword_match::keyword_match;
use crate::analysis::semantic_match::semantic_match;
use crate::llm_client::recovery::{RecoveryErrorKind, RecoveryFailure};
use crate::llm_client::{LlmError, TextGenerator};
use crate::models::report::{Diagnostic, DiagnosticKind};

/// Score reported when no strategy produced a result.
pub const ERROR_FALLBACK_SCORE: u8 = 30;

// ────────────────────────────────────────────────────────────────────────────
// Output data model (shared across all strategies)
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMethod {
    SemanticLlm,
    KeywordFallback,
    ErrorFallback,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchResult {
    pub match_pct: u8, // 0 – 100
    pub matching_skills: Vec<String>,
    pub missing_critical: Vec<String>,
    pub experience_match: Option<u8>, // semantic only
    pub domain_match: Option<u8>,     // semantic only
    pub explanation: String,
    pub method: MatchMethod,
    pub jd_keywords_found: Option<usize>, // keyword only
    pub resume_keywords_found: Option<usize>,
}

impl MatchResult {
    /// A zero-scored result with no evidence, for building on with struct update syntax.
    pub fn empty(method: MatchMethod) -> Self {
        Self {
            match_pct: 0,
            matching_skills: Vec::new(),
            missing_critical: Vec::new(),
            experience_match: None,
            domain_match: None,
            explanation: String::new(),
            method,
            jd_keywords_found: None,
            resume_keywords_found: None,
        }
    }
}

pub fn error_fallback() -> MatchResult {
    MatchResult {
        match_pct: ERROR_FALLBACK_SCORE,
        explanation: "Error occurred during matching analysis".to_string(),
        ..MatchResult::empty(MatchMethod::ErrorFallback)
    }
}

/// Clamps a model-reported percentage to 0–100 and rounds it.
pub fn clamp_pct(value: f64) -> u8 {
    if value.is_nan() {
        return 0;
    }
    value.clamp(0.0, 100.0).round() as u8
}

// ────────────────────────────────────────────────────────────────────────────
// Strategy trait
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum StrategyError {
    #[error("external service call failed: {0}")]
    Llm(#[from] LlmError),

    #[error("could not recover JSON from response: {0}")]
    Recovery(#[from] RecoveryFailure),

    #[error("response failed validation: {0}")]
    InvalidShape(String),
}

impl StrategyError {
    pub fn to_diagnostic(&self, strategy: &str) -> Diagnostic {
        let kind = match self {
            StrategyError::Llm(_) => DiagnosticKind::ExternalServiceError,
            StrategyError::Recovery(failure) => match failure.error {
                RecoveryErrorKind::EmptyInput => DiagnosticKind::EmptyInput,
                RecoveryErrorKind::NoValidJson => DiagnosticKind::NoValidJson,
                RecoveryErrorKind::JsonRecoveryFailed => DiagnosticKind::JsonRecoveryFailed,
            },
            StrategyError::InvalidShape(_) => DiagnosticKind::JsonParseError,
        };
        let status = match self {
            StrategyError::Llm(e) => e.status(),
            _ => None,
        };
        Diagnostic::new(kind, format!("{strategy}: {self}")).with_status(status)
    }
}

/// One way of scoring a JD against a résumé. Implement this to add a tier to the
/// hybrid matcher without touching the pipeline.
#[async_trait]
pub trait MatchStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    async fn attempt(&self, jd: &str, resume: &str) -> Result<MatchResult, StrategyError>;
}

/// LLM-backed semantic comparison.
pub struct SemanticStrategy {
    generator: Arc<dyn TextGenerator>,
}

impl SemanticStrategy {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }
}

#[async_trait]
impl MatchStrategy for SemanticStrategy {
    fn name(&self) -> &'static str {
        "semantic_llm"
    }

    async fn attempt(&self, jd: &str, resume: &str) -> Result<MatchResult, StrategyError> {
        semantic_match(self.generator.as_ref(), jd, resume).await
    }
}

/// Deterministic vocabulary overlap. Never fails.
pub struct KeywordStrategy;

#[async_trait]
impl MatchStrategy for KeywordStrategy {
    fn name(&self) -> &'static str {
        "keyword_fallback"
    }

    async fn attempt(&self, jd: &str, resume: &str) -> Result<MatchResult, StrategyError> {
        Ok(keyword_match(jd, resume))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Orchestrator
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchOptions {
    pub enhanced: bool,
}

#[derive(Debug, Clone)]
pub struct MatchOutcome {
    pub result: MatchResult,
    pub diagnostics: Vec<Diagnostic>,
}

pub struct HybridMatcher {
    strategies: Vec<Box<dyn MatchStrategy>>,
}

impl HybridMatcher {
    pub fn new(strategies: Vec<Box<dyn MatchStrategy>>) -> Self {
        Self { strategies }
    }

    /// Standard strategy order for one request.
    pub fn for_request(generator: Option<Arc<dyn TextGenerator>>, options: MatchOptions) -> Self {
        let mut strategies: Vec<Box<dyn MatchStrategy>> = Vec::new();

        match (options.enhanced, generator) {
            (true, Some(generator)) => strategies.push(Box::new(SemanticStrategy::new(generator))),
            (true, None) => debug!("No API key available for semantic matching"),
            (false, _) => debug!("Enhanced matching disabled, using keyword matching"),
        }
        strategies.push(Box::new(KeywordStrategy));

        Self::new(strategies)
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    pub async fn run(&self, jd: &str, resume: &str) -> MatchOutcome {
        let mut diagnostics = Vec::new();

        for strategy in &self.strategies {
            match strategy.attempt(jd, resume).await {
                Ok(result) => {
                    info!(
                        "Text matching via {}: {}%",
                        strategy.name(),
                        result.match_pct
                    );
                    return MatchOutcome {
                        result,
                        diagnostics,
                    };
                }
                Err(e) => {
                    warn!("{} strategy failed: {}", strategy.name(), e);
                    diagnostics.push(e.to_diagnostic(strategy.name()));
                }
            }
        }

        warn!("All match strategies failed, using error fallback");
        diagnostics.push(Diagnostic::new(
            DiagnosticKind::TextMatchingError,
            "no match strategy produced a result",
        ));
        MatchOutcome {
            result: error_fallback(),
            diagnostics,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::mock::ScriptedGenerator;

    const JD: &str = "Looking for a React and Node.js engineer with REST API experience";
    const RESUME: &str = "Built REST APIs with Node.js";

    fn shared(generator: &Arc<ScriptedGenerator>) -> Option<Arc<dyn TextGenerator>> {
        let generator: Arc<dyn TextGenerator> = generator.clone();
        Some(generator)
    }

    struct Broken;

    #[async_trait]
    impl MatchStrategy for Broken {
        fn name(&self) -> &'static str {
            "broken"
        }

        async fn attempt(&self, _jd: &str, _resume: &str) -> Result<MatchResult, StrategyError> {
            Err(StrategyError::InvalidShape("always broken".to_string()))
        }
    }

    #[tokio::test]
    async fn test_disabled_flag_never_calls_generator() {
        let generator = Arc::new(ScriptedGenerator::replying(r#"{"match_percentage": 90}"#));
        let hybrid = HybridMatcher::for_request(shared(&generator), MatchOptions { enhanced: false });

        let outcome = hybrid.run(JD, RESUME).await;
        assert_eq!(outcome.result.method, MatchMethod::KeywordFallback);
        assert_eq!(generator.calls(), 0);
        assert!(outcome.diagnostics.is_empty());
    }

    #[tokio::test]
    async fn test_no_generator_uses_keyword_fallback() {
        let hybrid = HybridMatcher::for_request(None, MatchOptions { enhanced: true });
        assert_eq!(hybrid.strategy_names(), vec!["keyword_fallback"]);

        let outcome = hybrid.run(JD, RESUME).await;
        assert_eq!(outcome.result.method, MatchMethod::KeywordFallback);
        assert_eq!(outcome.result.match_pct, 75);
    }

    #[tokio::test]
    async fn test_semantic_success_wins() {
        let generator = Arc::new(ScriptedGenerator::replying(
            r#"{"match_percentage": 82.4, "matching_skills": ["node.js"], "explanation": "ok"}"#,
        ));
        let hybrid = HybridMatcher::for_request(shared(&generator), MatchOptions { enhanced: true });

        let outcome = hybrid.run(JD, RESUME).await;
        assert_eq!(outcome.result.method, MatchMethod::SemanticLlm);
        assert_eq!(outcome.result.match_pct, 82);
        assert_eq!(generator.calls(), 1);
    }

    #[tokio::test]
    async fn test_failing_generator_falls_back_with_diagnostic() {
        let generator = Arc::new(ScriptedGenerator::failing(503));
        let hybrid = HybridMatcher::for_request(shared(&generator), MatchOptions { enhanced: true });

        let outcome = hybrid.run(JD, RESUME).await;
        assert_eq!(outcome.result.method, MatchMethod::KeywordFallback);
        assert_eq!(outcome.diagnostics.len(), 1);
        assert_eq!(
            outcome.diagnostics[0].kind,
            DiagnosticKind::ExternalServiceError
        );
        assert_eq!(outcome.diagnostics[0].status, Some(503));
    }

    #[tokio::test]
    async fn test_unrecoverable_response_falls_back() {
        let generator = Arc::new(ScriptedGenerator::replying("I cannot help with that."));
        let hybrid = HybridMatcher::for_request(shared(&generator), MatchOptions { enhanced: true });

        let outcome = hybrid.run(JD, RESUME).await;
        assert_eq!(outcome.result.method, MatchMethod::KeywordFallback);
        assert_eq!(outcome.diagnostics[0].kind, DiagnosticKind::NoValidJson);
    }

    #[tokio::test]
    async fn test_exhausted_strategies_yield_error_fallback() {
        let strategies: Vec<Box<dyn MatchStrategy>> = vec![Box::new(Broken)];
        let hybrid = HybridMatcher::new(strategies);

        let outcome = hybrid.run(JD, RESUME).await;
        assert_eq!(outcome.result, error_fallback());
        assert_eq!(outcome.result.match_pct, ERROR_FALLBACK_SCORE);
        let kinds: Vec<_> = outcome.diagnostics.iter().map(|d| d.kind).collect();
        assert_eq!(
            kinds,
            vec![
                DiagnosticKind::JsonParseError,
                DiagnosticKind::TextMatchingError
            ]
        );
    }

    #[test]
    fn test_clamp_pct() {
        assert_eq!(clamp_pct(-5.0), 0);
        assert_eq!(clamp_pct(150.0), 100);
        assert_eq!(clamp_pct(49.5), 50);
        assert_eq!(clamp_pct(f64::NAN), 0);
    }
}
