//! Fallback plan and résumé bullets — deterministic templates driven by the gap result.
//!
//! Always computed first; the plan enhancer may replace either part afterwards.

use serde::{Deserialize, Serialize};

use crate::analysis::gap_scoring::GapResult;

pub const MAX_PLAN_ITEMS: usize = 5;
pub const MAX_RESUME_BULLETS: usize = 8;

const SEARCH_URL: &str = "https://www.google.com/search?q=";

// ────────────────────────────────────────────────────────────────────────────
// Plan data model (shared with the plan enhancer)
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanItem {
    pub skill: String,
    pub why: String,
    pub projects: Vec<Project>,
    pub learning: Vec<LearningTopic>,
    #[serde(default)]
    pub checklist: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub estimated_time: String,
    #[serde(default)]
    pub key_skills: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningTopic {
    pub topic: String,
    #[serde(default)]
    pub outline: String,
    #[serde(default)]
    pub resources: Vec<Resource>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub title: String,
    pub url: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Fallback plan
// ────────────────────────────────────────────────────────────────────────────

/// One plan item per missing skill, heaviest first, at most `MAX_PLAN_ITEMS`.
pub fn fallback_plan(gaps: &GapResult) -> Vec<PlanItem> {
    gaps.missing
        .iter()
        .take(MAX_PLAN_ITEMS)
        .map(|m| plan_item_for(&m.skill))
        .collect()
}

fn plan_item_for(skill: &str) -> PlanItem {
    let cap = capitalize(skill);

    PlanItem {
        skill: skill.to_string(),
        why: format!("The JD expects {skill}, but your resume does not show it."),
        projects: vec![
            Project {
                title: format!("{cap} Starter Project"),
                description: format!(
                    "Build a minimal demo showcasing core {skill} features with basic functionality and clean code structure."
                ),
                estimated_time: "1–2 days".to_string(),
                key_skills: owned(&[skill, "fundamentals", "best practices"]),
            },
            Project {
                title: format!("{cap} + Database Integration"),
                description: format!(
                    "Create a practical application integrating {skill} with database operations, CRUD functionality, and API design."
                ),
                estimated_time: "3–5 days".to_string(),
                key_skills: owned(&[skill, "database", "API design", "testing"]),
            },
            Project {
                title: format!("{cap} Production App"),
                description: format!(
                    "Develop a full-featured application with {skill}, including authentication, deployment, monitoring, and documentation."
                ),
                estimated_time: "1–2 weeks".to_string(),
                key_skills: owned(&[
                    skill,
                    "authentication",
                    "deployment",
                    "monitoring",
                    "documentation",
                ]),
            },
        ],
        learning: vec![
            LearningTopic {
                topic: format!("{cap} Fundamentals"),
                outline: "Core concepts, syntax, installation, and basic examples to get started."
                    .to_string(),
                resources: vec![Resource {
                    title: "Official Documentation".to_string(),
                    url: search_link(&format!("{skill} official documentation tutorial")),
                }],
            },
            LearningTopic {
                topic: format!("{cap} Best Practices & Testing"),
                outline: "Industry standards, code quality, testing strategies, and debugging techniques."
                    .to_string(),
                resources: vec![Resource {
                    title: "Best Practices Guide".to_string(),
                    url: search_link(&format!("{skill} best practices testing guide")),
                }],
            },
            LearningTopic {
                topic: format!("{cap} Production & Deployment"),
                outline: "Performance optimization, security considerations, deployment strategies, and monitoring."
                    .to_string(),
                resources: vec![Resource {
                    title: "Production Deployment Guide".to_string(),
                    url: search_link(&format!("{skill} production deployment guide")),
                }],
            },
        ],
        checklist: vec![
            format!("Set up development environment and create first {skill} application."),
            "Implement core functionality with proper error handling and validation.".to_string(),
            "Add comprehensive README with setup instructions and examples.".to_string(),
            "Write unit tests and integration tests with good coverage.".to_string(),
            "Deploy to cloud platform with live demo link and monitoring.".to_string(),
            "Document architecture decisions and key learnings.".to_string(),
            "Review code for security vulnerabilities and performance optimizations.".to_string(),
        ],
    }
}

fn search_link(query: &str) -> String {
    format!("{SEARCH_URL}{}", urlencoding::encode(query))
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Fallback résumé bullets
// ────────────────────────────────────────────────────────────────────────────

/// Skill category → canned STAR bullet, emitted when any missing skill is in the category.
const BULLET_CATEGORIES: &[(&[&str], &str)] = &[
    (
        &["flask", "fastapi", "django", "python"],
        "Built RESTful APIs using Python frameworks (Flask/FastAPI) with PostgreSQL integration, JWT authentication, and comprehensive test coverage achieving 90%+ reliability.",
    ),
    (
        &["postgres", "postgresql", "mysql", "sql"],
        "Designed and optimized database schemas with proper indexing and foreign key relationships; documented Entity-Relationship Diagrams and implemented complex query optimizations reducing response time by 40%.",
    ),
    (
        &["typescript", "ts"],
        "Migrated JavaScript codebase to TypeScript with strict type checking; implemented Jest test suites covering 95%+ code coverage and reduced runtime errors by 60%.",
    ),
    (
        &["docker", "kubernetes", "k8s"],
        "Containerized applications using Docker and orchestrated deployments with Kubernetes; configured CI/CD pipelines with automated testing, security scanning, and zero-downtime deployments.",
    ),
    (
        &["aws", "azure", "gcp", "cloud"],
        "Deployed scalable applications on cloud platforms (AWS/Azure/GCP) using Infrastructure as Code (Terraform); implemented auto-scaling, load balancing, and comprehensive monitoring solutions.",
    ),
    (
        &["react", "vue", "angular", "frontend"],
        "Developed responsive single-page applications using modern JavaScript frameworks with state management, routing, and performance optimization achieving 95+ Lighthouse scores.",
    ),
    (
        &["node.js", "express", "backend"],
        "Architected scalable Node.js backend services with Express framework, implementing microservices patterns, caching strategies, and API rate limiting for high-traffic applications.",
    ),
];

const GENERIC_BULLETS: &[&str] = &[
    "Enhanced existing projects with comprehensive documentation, automated testing suites, and CI/CD pipeline integration using GitHub Actions with 100% deployment success rate.",
    "Implemented responsive web applications with modern JavaScript frameworks, focusing on accessibility standards (WCAG 2.1 AA) and performance optimization achieving sub-2s load times.",
    "Collaborated on code reviews and maintained version control best practices; contributed to 5+ open-source projects and authored technical documentation viewed by 1000+ developers.",
];

pub fn fallback_bullets(gaps: &GapResult) -> Vec<String> {
    let missing: Vec<String> = gaps.missing.iter().map(|m| m.skill.to_lowercase()).collect();

    let mut bullets: Vec<String> = BULLET_CATEGORIES
        .iter()
        .filter(|(skills, _)| missing.iter().any(|m| skills.contains(&m.as_str())))
        .map(|(_, bullet)| bullet.to_string())
        .collect();

    if bullets.is_empty() {
        bullets = owned(GENERIC_BULLETS);
    }
    bullets.truncate(MAX_RESUME_BULLETS);
    bullets
}
