// LLM prompt constants for the analysis pipeline.
// Reuses the JSON-only rules from llm_client::prompts.

/// Role line for semantic JD/résumé matching.
pub const SEMANTIC_MATCH_ROLE: &str =
    "You are an expert technical recruiter. Analyze job-resume matches accurately.";

/// Semantic match prompt template. Replace `{jd_text}` and `{resume_text}` before sending.
pub const SEMANTIC_MATCH_PROMPT_TEMPLATE: &str = r#"Compare this Job Description and Resume to calculate a match percentage.
Focus on technical skills, experience level, domain knowledge, and requirements overlap.

Return ONLY a JSON object with this exact structure:
{
  "match_percentage": 85,
  "matching_skills": ["react", "nodejs", "typescript", "rest api"],
  "missing_critical": ["kubernetes", "microservices"],
  "experience_match": 75,
  "domain_match": 90,
  "explanation": "Strong frontend skills match, some backend gaps"
}

Job Description:
{jd_text}

Resume:
{resume_text}"#;

/// Role line for gap-closure plan generation.
pub const PLAN_ROLE: &str =
    "You are a career coach who turns skill gaps into practical, schema-exact study plans.";

/// Plan prompt template. Replace `{present_json}`, `{missing_json}`, `{weak_json}`
/// and `{jd_text}` before sending.
pub const PLAN_PROMPT_TEMPLATE: &str = r#"Compare this Job Description (JD) and Resume evidence (present/weak/missing skills)
and produce a practical gap-closure plan for the candidate.

Return ONLY a single JSON object (no markdown, no extra text) that matches:

{
  "match_pct": 0,
  "plan": [
    {
      "skill": "string",
      "why": "1 line, specific to THIS JD",
      "projects": [
        { "title": "string", "description": "1-2 lines tailored to JD domain", "estimated_time": "e.g., '1-2 days'", "key_skills": ["a","b"] },
        { "title": "string", "description": "1-2 lines tailored to JD domain", "estimated_time": "e.g., '3-5 days'", "key_skills": ["c","d"] },
        { "title": "string", "description": "1-2 lines tailored to JD domain", "estimated_time": "e.g., '1 week'", "key_skills": ["e","f"] }
      ],
      "learning": [
        { "topic": "string", "outline": "1 line", "resources": [ { "title": "string", "url": "https://..." } ] },
        { "topic": "string", "outline": "1 line", "resources": [ { "title": "string", "url": "https://..." } ] },
        { "topic": "string", "outline": "1 line", "resources": [ { "title": "string", "url": "https://..." } ] }
      ],
      "checklist": ["5-7 short build/test/docs items"]
    }
  ],
  "resume_bullets": [
    "4-8 concise STAR-style bullets the candidate can add now (truthful, no exaggeration)"
  ]
}

Guidelines:
- Each skill must have EXACTLY 3 projects and EXACTLY 3 learning topics.
- Choose the top 3-5 missing/weak areas from THESE lists (don't invent unrelated skills).
- Tailor projects to the JD domain (analytics/fintech/e-com/ESG/etc.).
- Projects should progress from basic to intermediate to advanced.
- Keep content concise, actionable, and realistic.
- Output VALID JSON only.

present_skills: {present_json}
missing_skills: {missing_json}
weak_skills: {weak_json}

JD:
{jd_text}"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_templates_carry_their_placeholders() {
        assert!(SEMANTIC_MATCH_PROMPT_TEMPLATE.contains("{jd_text}"));
        assert!(SEMANTIC_MATCH_PROMPT_TEMPLATE.contains("{resume_text}"));
        for placeholder in ["{present_json}", "{missing_json}", "{weak_json}", "{jd_text}"] {
            assert!(PLAN_PROMPT_TEMPLATE.contains(placeholder), "{placeholder}");
        }
    }
}
