//! Analysis pipeline — one request in, one well-formed `Report` out.
//!
//! Order of work:
//! 1. reject blank input
//! 2. extract skills and spans, score gaps (pure, in-process)
//! 3. compute the fallback plan and bullets
//! 4. run the hybrid matcher and the plan enhancer concurrently
//! 5. merge, recording every stage failure as a diagnostic instead of failing

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::analysis::gap_scoring::score_gaps;
use crate::analysis::hybrid::{HybridMatcher, MatchOptions};
use crate::analysis::matcher::SkillMatcher;
use crate::analysis::plan::{fallback_bullets, fallback_plan};
use crate::analysis::plan_enhancer::{enhance_plan, PlanEnhancerError};
use crate::errors::AppError;
use crate::llm_client::recovery::truncate_chars;
use crate::llm_client::TextGenerator;
use crate::models::report::{
    ApiStatus, ContentSource, Diagnostic, DiagnosticKind, Report, ReportMeta, StageMethods,
    StageTimings, TextMatchDetails, REPORT_VERSION,
};

/// Characters of the raw plan response kept in `meta.debug_raw`.
const DEBUG_RAW_CHARS: usize = 500;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub jd: String,
    #[serde(default)]
    pub resume: String,
    /// Overrides the configured enhanced-matching switch for this request.
    #[serde(default)]
    pub enhanced_matching: Option<bool>,
}

#[derive(Debug, Clone, Copy)]
pub struct AnalysisSettings {
    pub enhanced_matching: bool,
    pub debug_diagnostics: bool,
}

pub async fn run_analysis(
    matcher: &SkillMatcher,
    generator: Option<Arc<dyn TextGenerator>>,
    settings: AnalysisSettings,
    request: AnalyzeRequest,
) -> Result<Report, AppError> {
    let started = Instant::now();

    if request.jd.trim().is_empty() || request.resume.trim().is_empty() {
        return Err(AppError::MissingData(
            "Both job description and resume are required".to_string(),
        ));
    }

    let analysis_id = Uuid::new_v4();
    info!(
        "Analysis {analysis_id}: JD {} chars, resume {} chars",
        request.jd.chars().count(),
        request.resume.chars().count()
    );

    // 1) extraction and gap scoring
    let extract_started = Instant::now();
    let jd_doc = matcher.analyze_document(&request.jd);
    let resume_doc = matcher.analyze_document(&request.resume);
    let gaps = score_gaps(&jd_doc.skills, &resume_doc.skills);
    let extract_ms = elapsed_ms(extract_started);
    info!(
        "Skills extracted - present: {}, missing: {}, weak: {}",
        gaps.present.len(),
        gaps.missing.len(),
        gaps.weak.len()
    );

    // 2) fallbacks first, so every later failure has something to fall back to
    let mut plan = fallback_plan(&gaps);
    let mut resume_bullets = fallback_bullets(&gaps);
    let mut plan_source = ContentSource::Fallback;
    let mut bullets_source = ContentSource::Fallback;

    // 3) external stages, concurrently
    let options = MatchOptions {
        enhanced: request.enhanced_matching.unwrap_or(settings.enhanced_matching),
    };
    let hybrid = HybridMatcher::for_request(generator.clone(), options);

    let text_match = async {
        let stage_started = Instant::now();
        let outcome = hybrid.run(&request.jd, &request.resume).await;
        (outcome, elapsed_ms(stage_started))
    };
    let plan_call = async {
        match &generator {
            Some(generator) => {
                let stage_started = Instant::now();
                let result = enhance_plan(generator.as_ref(), &gaps, &request.jd).await;
                Some((result, elapsed_ms(stage_started)))
            }
            None => None,
        }
    };
    let ((match_outcome, text_matching_ms), plan_outcome) = tokio::join!(text_match, plan_call);

    // 4) merge
    let mut warnings = Vec::new();
    let mut errors = match_outcome.diagnostics;
    let mut api_status = ApiStatus::FallbackUsed;
    let mut api_call_ms = None;
    let mut raw_response = None;

    match plan_outcome {
        None => warnings.push("No API key found for enhanced plan generation".to_string()),
        Some((result, ms)) => {
            api_call_ms = Some(ms);
            match result {
                Ok(enhancement) => {
                    api_status = ApiStatus::Success;
                    if let Some(items) = enhancement.plan {
                        plan = items;
                        plan_source = ContentSource::Llm;
                    }
                    if let Some(bullets) = enhancement.resume_bullets {
                        resume_bullets = bullets;
                        bullets_source = ContentSource::Llm;
                    }
                    warnings.extend(enhancement.warnings);
                    raw_response = Some(enhancement.raw);
                }
                Err(PlanEnhancerError::Llm(e)) => {
                    warn!("Plan generation failed: {e}");
                    errors.push(
                        Diagnostic::new(DiagnosticKind::ExternalServiceError, e.to_string())
                            .with_status(e.status()),
                    );
                }
                Err(PlanEnhancerError::Unparseable { failure, raw }) => {
                    warn!("Plan response unparseable: {}", failure.error.as_str());
                    api_status = ApiStatus::Success;
                    errors.push(Diagnostic::new(
                        DiagnosticKind::JsonParseError,
                        failure.to_string(),
                    ));
                    raw_response = Some(raw);
                }
            }
        }
    }

    let debug_raw = raw_response
        .filter(|_| settings.debug_diagnostics)
        .map(|raw| debug_head(&raw));

    let text_match_result = match_outcome.result;
    let total_ms = elapsed_ms(started);
    info!(
        "Analysis {analysis_id} done in {total_ms}ms: {}% via {:?}, plan from {:?}",
        text_match_result.match_pct, text_match_result.method, plan_source
    );

    Ok(Report {
        match_pct: text_match_result.match_pct,
        text_match_details: TextMatchDetails::from(&text_match_result),
        gap_match_pct: gaps.match_pct,
        present: gaps.present,
        missing: gaps.missing,
        weak: gaps.weak,
        jd_spans: jd_doc.spans,
        resume_spans: resume_doc.spans,
        plan,
        resume_bullets,
        meta: ReportMeta {
            analysis_id,
            generated_at: Utc::now(),
            api_status,
            timing_ms: StageTimings {
                total: total_ms,
                extract: extract_ms,
                text_matching: text_matching_ms,
                api_call: api_call_ms,
            },
            methods: StageMethods {
                text_match: text_match_result.method,
                plan: plan_source,
                resume_bullets: bullets_source,
            },
            warnings,
            errors,
            version: REPORT_VERSION,
            debug_raw,
        },
    })
}

fn debug_head(raw: &str) -> String {
    let head = truncate_chars(raw, DEBUG_RAW_CHARS);
    if head.len() < raw.len() {
        format!("{head}...")
    } else {
        head.to_string()
    }
}

fn elapsed_ms(since: Instant) -> u64 {
    u64::try_from(since.elapsed().as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::hybrid::MatchMethod;
    use crate::analysis::taxonomy::SkillTaxonomy;
    use crate::llm_client::mock::ScriptedGenerator;
    use crate::llm_client::{CompletionRequest, GenerationParams};
    use serde_json::json;

    const JD: &str = "Looking for a React and Node.js engineer with REST API experience";
    const RESUME: &str = "Built REST APIs with Node.js";

    const SETTINGS: AnalysisSettings = AnalysisSettings {
        enhanced_matching: true,
        debug_diagnostics: true,
    };

    fn matcher() -> SkillMatcher {
        SkillMatcher::new(&SkillTaxonomy::embedded().unwrap()).unwrap()
    }

    fn request(jd: &str, resume: &str) -> AnalyzeRequest {
        AnalyzeRequest {
            jd: jd.to_string(),
            resume: resume.to_string(),
            enhanced_matching: None,
        }
    }

    fn shared(generator: ScriptedGenerator) -> (Arc<ScriptedGenerator>, Option<Arc<dyn TextGenerator>>) {
        let generator = Arc::new(generator);
        let dynamic: Arc<dyn TextGenerator> = generator.clone();
        (generator, Some(dynamic))
    }

    fn plan_reply() -> String {
        json!({
            "match_pct": 70,
            "plan": [{
                "skill": "react",
                "why": "The role is React-first",
                "projects": [{"title": "Hooks dashboard", "description": "Build it", "estimated_time": "1 week"}],
                "learning": [{"topic": "React hooks", "outline": "useState, useEffect"}],
                "checklist": ["Deploy"]
            }],
            "resume_bullets": ["Built a React dashboard"]
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_offline_end_to_end() {
        let report = run_analysis(&matcher(), None, SETTINGS, request(JD, RESUME))
            .await
            .unwrap();

        assert!(report.present.contains(&"node.js".to_string()));
        assert!(report.present.contains(&"rest api".to_string()));
        let missing: Vec<_> = report.missing.iter().map(|m| m.skill.as_str()).collect();
        assert_eq!(missing, vec!["react"]);
        assert!((report.gap_match_pct - 66.67).abs() < 0.01);

        assert_eq!(report.plan.len(), 1);
        assert_eq!(report.plan[0].skill, "react");
        assert_eq!(report.match_pct, 75);
        assert_eq!(
            report.text_match_details.method,
            MatchMethod::KeywordFallback
        );

        assert_eq!(report.meta.api_status, ApiStatus::FallbackUsed);
        assert_eq!(report.meta.methods.plan, ContentSource::Fallback);
        assert!(report.meta.errors.is_empty());
        assert_eq!(
            report.meta.warnings,
            vec!["No API key found for enhanced plan generation"]
        );
        assert!(report.meta.timing_ms.api_call.is_none());
        assert!(report.meta.debug_raw.is_none());
    }

    #[tokio::test]
    async fn test_spans_point_at_skill_text() {
        let report = run_analysis(&matcher(), None, SETTINGS, request(JD, RESUME))
            .await
            .unwrap();

        let react = report
            .jd_spans
            .iter()
            .find(|s| s.skill == "react")
            .unwrap();
        let span = &react.positions[0];
        assert_eq!((span.start(), span.end()), (14, 19));

        for (spans, text) in [(&report.jd_spans, JD), (&report.resume_spans, RESUME)] {
            let len = text.chars().count();
            assert!(spans
                .iter()
                .flat_map(|s| &s.positions)
                .all(|p| p.end() <= len));
        }
    }

    #[tokio::test]
    async fn test_blank_inputs_are_rejected() {
        for (jd, resume) in [("", RESUME), (JD, "   \n\t"), ("", "")] {
            let err = run_analysis(&matcher(), None, SETTINGS, request(jd, resume))
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::MissingData(_)));
        }
    }

    #[tokio::test]
    async fn test_generator_results_are_merged() {
        let (generator, dynamic) = shared(ScriptedGenerator::new(|req: &CompletionRequest<'_>| {
            if req.params == GenerationParams::PLAN {
                Ok(plan_reply())
            } else {
                Ok(r#"{"match_percentage": 81, "matching_skills": ["node.js"], "explanation": "close"}"#.to_string())
            }
        }));

        let report = run_analysis(&matcher(), dynamic, SETTINGS, request(JD, RESUME))
            .await
            .unwrap();

        assert_eq!(generator.calls(), 2);
        assert_eq!(report.match_pct, 81);
        assert_eq!(report.meta.methods.text_match, MatchMethod::SemanticLlm);
        assert_eq!(report.meta.methods.plan, ContentSource::Llm);
        assert_eq!(report.plan[0].projects[0].title, "Hooks dashboard");
        assert_eq!(report.resume_bullets, vec!["Built a React dashboard"]);
        assert_eq!(report.meta.api_status, ApiStatus::Success);
        assert!(report.meta.timing_ms.api_call.is_some());
        assert!(report.meta.debug_raw.is_some());
        // gap scoring never depends on the generator
        assert!((report.gap_match_pct - 66.67).abs() < 0.01);
    }

    #[tokio::test]
    async fn test_failing_generator_degrades_to_fallbacks() {
        let (_, dynamic) = shared(ScriptedGenerator::failing(503));

        let report = run_analysis(&matcher(), dynamic, SETTINGS, request(JD, RESUME))
            .await
            .unwrap();

        assert_eq!(report.text_match_details.method, MatchMethod::KeywordFallback);
        assert_eq!(report.meta.api_status, ApiStatus::FallbackUsed);
        assert_eq!(report.plan.len(), 1);
        assert_eq!(report.meta.errors.len(), 2);
        assert!(report
            .meta
            .errors
            .iter()
            .all(|e| e.kind == DiagnosticKind::ExternalServiceError && e.status == Some(503)));
    }

    #[tokio::test]
    async fn test_garbage_plan_reply_is_a_parse_error() {
        let (_, dynamic) = shared(ScriptedGenerator::replying("no json here"));
        let settings = AnalysisSettings {
            enhanced_matching: false,
            debug_diagnostics: false,
        };

        let report = run_analysis(&matcher(), dynamic, settings, request(JD, RESUME))
            .await
            .unwrap();

        assert_eq!(report.meta.api_status, ApiStatus::Success);
        assert_eq!(report.meta.methods.plan, ContentSource::Fallback);
        assert_eq!(report.meta.errors.len(), 1);
        assert_eq!(report.meta.errors[0].kind, DiagnosticKind::JsonParseError);
        assert!(report.meta.errors[0].message.contains("no_valid_json"));
        assert!(report.meta.debug_raw.is_none());
    }

    #[tokio::test]
    async fn test_request_flag_overrides_settings() {
        let (generator, dynamic) = shared(ScriptedGenerator::new(|req: &CompletionRequest<'_>| {
            assert_eq!(req.params, GenerationParams::PLAN, "semantic call not expected");
            Ok(plan_reply())
        }));
        let mut req = request(JD, RESUME);
        req.enhanced_matching = Some(false);

        let report = run_analysis(&matcher(), dynamic, SETTINGS, req).await.unwrap();
        assert_eq!(generator.calls(), 1);
        assert_eq!(report.meta.methods.text_match, MatchMethod::KeywordFallback);
    }

    #[test]
    fn test_debug_head_truncates() {
        let raw = "x".repeat(DEBUG_RAW_CHARS + 10);
        let head = debug_head(&raw);
        assert_eq!(head.len(), DEBUG_RAW_CHARS + 3);
        assert!(head.ends_with("..."));
        assert_eq!(debug_head("short"), "short");
    }

    #[test]
    fn test_request_fields_default_to_empty() {
        let req: AnalyzeRequest = serde_json::from_str(r#"{"jd": "x"}"#).unwrap();
        assert_eq!(req.resume, "");
        assert!(req.enhanced_matching.is_none());
    }
}
