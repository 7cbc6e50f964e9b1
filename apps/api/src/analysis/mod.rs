// Skill-gap analysis: taxonomy matching, gap scoring, hybrid text matching,
// remediation plans. Text-generation calls go through llm_client only.

pub mod gap_scoring;
pub mod handlers;
pub mod hybrid;
pub mod keyword_match;
pub mod matcher;
pub mod pipeline;
pub mod plan;
pub mod plan_enhancer;
pub mod prompts;
pub mod semantic_match;
pub mod taxonomy;
pub mod tokenizer;
