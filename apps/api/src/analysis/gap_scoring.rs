//! Gap Scoring — present / missing / weak classification of JD skills against a résumé.
//!
//! Algorithm:
//! 1. weight(skill) = min(2.0, JD token frequency)
//! 2. each distinct JD skill is `present` if the résumé has it, else `missing` with its weight
//! 3. a résumé skill the JD mentions at most once is also listed as `weak`
//! 4. match_pct = 100 × Σ weight(present) / Σ weight(all JD skills), 0 for an empty JD
//! 5. `missing` is stably sorted by weight, heaviest first

use serde::{Deserialize, Serialize};

use crate::analysis::matcher::SkillSet;

/// Upper bound on a single skill's weight, however often the JD repeats it.
pub const MAX_SKILL_WEIGHT: f64 = 2.0;

/// A JD skill the résumé does not show.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedMissing {
    pub skill: String,
    pub weight: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GapResult {
    pub match_pct: f64,
    pub present: Vec<String>,
    pub missing: Vec<WeightedMissing>,
    pub weak: Vec<String>,
}

impl GapResult {
    pub fn missing_skills(&self) -> Vec<&str> {
        self.missing.iter().map(|m| m.skill.as_str()).collect()
    }
}

pub fn score_gaps(jd: &SkillSet, resume: &SkillSet) -> GapResult {
    let mut present = Vec::new();
    let mut missing = Vec::new();
    let mut total_weight = 0.0_f64;
    let mut present_weight = 0.0_f64;

    for skill in jd.iter() {
        let weight = skill_weight(jd.frequency(skill));
        total_weight += weight;

        if resume.contains(skill) {
            present_weight += weight;
            present.push(skill.to_string());
        } else {
            missing.push(WeightedMissing {
                skill: skill.to_string(),
                weight,
            });
        }
    }

    // TODO: product review of the weak rule; it currently flags résumé skills the JD barely mentions.
    let weak = resume
        .iter()
        .filter(|skill| jd.contains(skill) && jd.frequency(skill) <= 1)
        .map(str::to_string)
        .collect();

    // sort_by is stable: equal weights keep JD encounter order
    missing.sort_by(|a, b| b.weight.total_cmp(&a.weight));

    let match_pct = if total_weight > 0.0 {
        (present_weight / total_weight) * 100.0
    } else {
        0.0
    };

    GapResult {
        match_pct,
        present,
        missing,
        weak,
    }
}

fn skill_weight(frequency: u32) -> f64 {
    f64::from(frequency.max(1)).min(MAX_SKILL_WEIGHT)
}
