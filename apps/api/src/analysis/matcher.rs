//! Skill Matcher — resolves tokens to canonical skills and locates evidence spans.
//!
//! Built once from the taxonomy and shared read-only across requests.

use std::collections::HashMap;

use regex::Regex;
use serde::Serialize;

use crate::analysis::taxonomy::{CanonicalSkill, SkillTaxonomy, TaxonomyError};
use crate::analysis::tokenizer::Tokens;

// ────────────────────────────────────────────────────────────────────────────
// Data models
// ────────────────────────────────────────────────────────────────────────────

/// Distinct canonical skills found in one document, with how often each was hit.
///
/// Iteration follows first-encounter order, which the gap scorer uses for tie-breaks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SkillSet {
    order: Vec<String>,
    counts: HashMap<String, u32>,
}

impl SkillSet {
    /// Builds a set from resolved skill ids, counting repeats.
    pub fn from_occurrences<I, S>(occurrences: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::default();
        for id in occurrences {
            let id = id.as_ref();
            match set.counts.get_mut(id) {
                Some(count) => *count += 1,
                None => {
                    set.order.push(id.to_string());
                    set.counts.insert(id.to_string(), 1);
                }
            }
        }
        set
    }

    pub fn contains(&self, id: &str) -> bool {
        self.counts.contains_key(id)
    }

    /// Number of token occurrences that resolved to `id` (0 when absent).
    pub fn frequency(&self, id: &str) -> u32 {
        self.counts.get(id).copied().unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// One occurrence of a skill: `[start, end)` in source-text characters.
/// Serializes as a two-element array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EvidenceSpan(usize, usize);

impl EvidenceSpan {
    /// Returns `None` unless `end > start`.
    pub fn new(start: usize, end: usize) -> Option<Self> {
        (end > start).then_some(Self(start, end))
    }

    pub fn start(&self) -> usize {
        self.0
    }

    pub fn end(&self) -> usize {
        self.1
    }
}

/// All merged evidence spans of one skill in one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkillSpans {
    pub skill: String,
    pub positions: Vec<EvidenceSpan>,
}

/// Everything the matcher knows about one document.
#[derive(Debug, Clone, Default)]
pub struct DocumentSkills {
    pub skills: SkillSet,
    pub spans: Vec<SkillSpans>,
}

// ────────────────────────────────────────────────────────────────────────────
// Matcher
// ────────────────────────────────────────────────────────────────────────────

pub struct SkillMatcher {
    skills: Vec<CanonicalSkill>,
    /// synonym → index into `skills`
    reverse: HashMap<String, usize>,
    /// one alternation per skill, same index as `skills`
    patterns: Vec<Regex>,
}

impl SkillMatcher {
    pub fn new(taxonomy: &SkillTaxonomy) -> Result<Self, TaxonomyError> {
        let skills = taxonomy.skills().to_vec();

        // Later skills win when two declare the same synonym.
        let mut reverse = HashMap::new();
        for (idx, skill) in skills.iter().enumerate() {
            for synonym in &skill.synonyms {
                reverse.insert(synonym.clone(), idx);
            }
        }

        let patterns = skills
            .iter()
            .map(|skill| {
                Regex::new(&span_pattern(skill)).map_err(|source| TaxonomyError::Pattern {
                    skill: skill.id.clone(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            skills,
            reverse,
            patterns,
        })
    }

    pub fn len(&self) -> usize {
        self.skills.len()
    }

    /// Canonical id for an exact (lower-cased) synonym.
    pub fn canonical(&self, synonym: &str) -> Option<&str> {
        self.reverse
            .get(synonym)
            .map(|&idx| self.skills[idx].id.as_str())
    }

    /// Looks up every candidate term; unknown terms are skipped.
    pub fn resolve(&self, tokens: &Tokens) -> SkillSet {
        SkillSet::from_occurrences(tokens.terms().filter_map(|term| self.canonical(&term)))
    }

    /// Every occurrence of every skill's synonyms, as character offsets into `text`.
    /// Skills without matches are omitted; output follows taxonomy order.
    pub fn find_spans(&self, text: &str) -> Vec<SkillSpans> {
        let lowered = LoweredText::new(text);

        self.skills
            .iter()
            .zip(&self.patterns)
            .filter_map(|(skill, pattern)| {
                let spans = pattern
                    .find_iter(&lowered.text)
                    .filter_map(|m| {
                        EvidenceSpan::new(lowered.char_start(m.start()), lowered.char_end(m.end()))
                    })
                    .collect();
                let positions = merge_spans(spans);
                (!positions.is_empty()).then(|| SkillSpans {
                    skill: skill.id.clone(),
                    positions,
                })
            })
            .collect()
    }

    /// Tokenize, resolve and locate spans for one document.
    pub fn analyze_document(&self, text: &str) -> DocumentSkills {
        DocumentSkills {
            skills: self.resolve(&Tokens::new(text)),
            spans: self.find_spans(text),
        }
    }
}

/// `(?:alt1|alt2|…)` where each synonym carries its own boundary anchors.
///
/// An edge that is a word character needs `\b`; a punctuation edge (`c++`, `.net`)
/// needs `\B`, which still refuses a neighbouring word character.
fn span_pattern(skill: &CanonicalSkill) -> String {
    let alternatives: Vec<String> = skill
        .synonyms_longest_first()
        .into_iter()
        .map(|synonym| {
            let lead = if synonym.starts_with(is_word_char) {
                r"\b"
            } else {
                r"\B"
            };
            let trail = if synonym.ends_with(is_word_char) {
                r"\b"
            } else {
                r"\B"
            };
            format!("{lead}{}{trail}", regex::escape(synonym))
        })
        .collect();
    format!("(?:{})", alternatives.join("|"))
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Sorts and merges overlapping or touching spans.
fn merge_spans(mut spans: Vec<EvidenceSpan>) -> Vec<EvidenceSpan> {
    spans.sort_by_key(|s| (s.0, s.1));
    let mut merged: Vec<EvidenceSpan> = Vec::with_capacity(spans.len());
    for span in spans {
        match merged.last_mut() {
            Some(last) if span.0 <= last.1 => last.1 = last.1.max(span.1),
            _ => merged.push(span),
        }
    }
    merged
}

/// Lower-cased copy of a document that remembers where each source character landed,
/// so byte offsets found in the copy map back to source character offsets.
struct LoweredText {
    text: String,
    /// byte offset in `text` where source character `i` begins
    starts: Vec<usize>,
}

impl LoweredText {
    fn new(source: &str) -> Self {
        let mut text = String::with_capacity(source.len());
        let mut starts = Vec::with_capacity(source.len());
        for ch in source.chars() {
            starts.push(text.len());
            text.extend(ch.to_lowercase());
        }
        Self { text, starts }
    }

    /// Index of the source character containing byte `offset`.
    fn char_start(&self, offset: usize) -> usize {
        self.starts.partition_point(|&s| s <= offset).saturating_sub(1)
    }

    /// Exclusive source-character end for a match ending at byte `offset`.
    fn char_end(&self, offset: usize) -> usize {
        self.starts.partition_point(|&s| s < offset)
    }
}
