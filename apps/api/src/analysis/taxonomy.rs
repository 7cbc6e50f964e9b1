//! Skill taxonomy — canonical skill name → synonyms.
//!
//! Loaded once at startup (embedded data, or a file named by `SKILL_TAXONOMY_PATH`)
//! and immutable afterwards.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use thiserror::Error;

const EMBEDDED_TAXONOMY: &str = include_str!("../../data/skills.json");

#[derive(Debug, Error)]
pub enum TaxonomyError {
    #[error("failed to read taxonomy file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("taxonomy is not a JSON object of string arrays: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("taxonomy contains no skills")]
    Empty,

    #[error("failed to compile span pattern for skill '{skill}': {source}")]
    Pattern {
        skill: String,
        #[source]
        source: regex::Error,
    },
}

/// One normalized skill concept. `synonyms` always contains `id` itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalSkill {
    pub id: String,
    pub synonyms: BTreeSet<String>,
}

impl CanonicalSkill {
    /// Lower-cases and trims the name and synonyms. Returns `None` for a blank name.
    pub fn new<I, S>(name: &str, synonyms: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let id = name.trim().to_lowercase();
        if id.is_empty() {
            return None;
        }

        let mut set: BTreeSet<String> = synonyms
            .into_iter()
            .map(|s| s.as_ref().trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect();
        set.insert(id.clone());

        Some(Self { id, synonyms: set })
    }

    /// Synonyms ordered longest first, so alternations prefer the widest match.
    pub fn synonyms_longest_first(&self) -> Vec<&str> {
        let mut out: Vec<&str> = self.synonyms.iter().map(String::as_str).collect();
        out.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        out
    }
}

/// The full skill dictionary, ordered by canonical id.
#[derive(Debug, Clone)]
pub struct SkillTaxonomy {
    skills: Vec<CanonicalSkill>,
}

impl SkillTaxonomy {
    /// The taxonomy shipped with the service.
    pub fn embedded() -> Result<Self, TaxonomyError> {
        Self::from_json(EMBEDDED_TAXONOMY)
    }

    pub fn from_path(path: &Path) -> Result<Self, TaxonomyError> {
        let raw = std::fs::read_to_string(path).map_err(|source| TaxonomyError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&raw)
    }

    /// Parses `{"canonical": ["synonym", ...], ...}`.
    pub fn from_json(raw: &str) -> Result<Self, TaxonomyError> {
        let dict: BTreeMap<String, Vec<String>> = serde_json::from_str(raw)?;
        let skills: Vec<CanonicalSkill> = dict
            .iter()
            .filter_map(|(name, synonyms)| CanonicalSkill::new(name, synonyms))
            .collect();

        if skills.is_empty() {
            return Err(TaxonomyError::Empty);
        }
        Ok(Self { skills })
    }

    pub fn skills(&self) -> &[CanonicalSkill] {
        &self.skills
    }

    pub fn len(&self) -> usize {
        self.skills.len()
    }
}
