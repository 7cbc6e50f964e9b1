//! Keyword fallback — deterministic overlap score against a fixed technical vocabulary.
//!
//! Uses case-insensitive substring containment, not n-gram matching, so it behaves the
//! same whatever the taxonomy contains.

use tracing::debug;

use crate::analysis::hybrid::{MatchMethod, MatchResult};

/// Reference vocabulary of common technical terms.
pub const TECH_KEYWORDS: &[&str] = &[
    // Frontend
    "react", "vue", "angular", "javascript", "typescript", "html", "css", "sass", "tailwind",
    "next.js", "nuxt", "webpack", "vite", "babel", "redux", "mobx",
    // Backend
    "node.js", "express", "fastapi", "django", "flask", "spring", "laravel",
    "python", "java", "go", "rust", "php", "ruby", "c#", ".net",
    // Databases
    "mongodb", "postgresql", "mysql", "redis", "elasticsearch", "cassandra",
    "sql", "nosql", "database", "orm",
    // Cloud & DevOps
    "aws", "azure", "gcp", "docker", "kubernetes", "jenkins", "gitlab", "github actions",
    "terraform", "ansible", "helm", "prometheus", "grafana",
    // Tools & concepts
    "git", "api", "rest", "graphql", "microservices", "testing", "jest", "cypress",
    "agile", "scrum", "ci/cd", "oauth", "jwt", "authentication", "authorization",
];

/// Score used when the JD contains none of the vocabulary.
pub const NO_KEYWORD_BASELINE: u8 = 50;
pub const MIN_KEYWORD_SCORE: f64 = 10.0;
pub const MAX_KEYWORD_SCORE: f64 = 95.0;
const MAX_MISSING_CRITICAL: usize = 10;

pub fn keyword_match(jd: &str, resume: &str) -> MatchResult {
    let jd_lower = jd.to_lowercase();
    let resume_lower = resume.to_lowercase();

    let jd_keywords: Vec<&str> = TECH_KEYWORDS
        .iter()
        .copied()
        .filter(|k| jd_lower.contains(k))
        .collect();
    let resume_keywords: Vec<&str> = TECH_KEYWORDS
        .iter()
        .copied()
        .filter(|k| resume_lower.contains(k))
        .collect();
    let (matching, absent): (Vec<&str>, Vec<&str>) = jd_keywords
        .iter()
        .copied()
        .partition(|k| resume_keywords.contains(k));

    debug!(
        "Keyword analysis - JD: {}, resume: {}, matching: {}",
        jd_keywords.len(),
        resume_keywords.len(),
        matching.len()
    );

    if jd_keywords.is_empty() {
        return MatchResult {
            match_pct: NO_KEYWORD_BASELINE,
            explanation: "No technical keywords found in job description".to_string(),
            ..MatchResult::empty(MatchMethod::KeywordFallback)
        };
    }

    let base_score = matching.len() as f64 / jd_keywords.len() as f64 * 100.0;
    let match_pct = base_score
        .clamp(MIN_KEYWORD_SCORE, MAX_KEYWORD_SCORE)
        .round() as u8;

    MatchResult {
        match_pct,
        explanation: format!(
            "Found {} matching skills out of {} required",
            matching.len(),
            jd_keywords.len()
        ),
        matching_skills: to_owned(&matching),
        missing_critical: to_owned(&absent[..absent.len().min(MAX_MISSING_CRITICAL)]),
        jd_keywords_found: Some(jd_keywords.len()),
        resume_keywords_found: Some(resume_keywords.len()),
        ..MatchResult::empty(MatchMethod::KeywordFallback)
    }
}

fn to_owned(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}
