//! Tokenizer — candidate terms for taxonomy lookup.
//!
//! Words are maximal runs of `[a-z0-9+.#-]` in the lower-cased text, so "node.js",
//! "c++" and "c#" survive intact. Every 2- and 3-word window is also offered as a
//! compound term ("rest api", "ruby on rails").

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

static WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[a-z0-9+.#-]+").unwrap());

/// Tokenized document. `terms()` can be iterated any number of times.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tokens {
    words: Vec<String>,
}

impl Tokens {
    pub fn new(text: &str) -> Self {
        let lower = text.to_lowercase();
        let words = WORD
            .find_iter(&lower)
            .map(|m| m.as_str().to_string())
            .collect();
        Self { words }
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    /// Words, then bigrams, then trigrams. Duplicates are kept.
    pub fn terms(&self) -> impl Iterator<Item = Cow<'_, str>> + '_ {
        let words = self.words.iter().map(|w| Cow::Borrowed(w.as_str()));
        let bigrams = self.words.windows(2).map(|w| Cow::Owned(w.join(" ")));
        let trigrams = self.words.windows(3).map(|w| Cow::Owned(w.join(" ")));
        words.chain(bigrams).chain(trigrams)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn terms(text: &str) -> Vec<String> {
        Tokens::new(text).terms().map(Cow::into_owned).collect()
    }

    #[test]
    fn test_words_keep_skill_punctuation() {
        let tokens = Tokens::new("Node.js, C++ and C# (REST)");
        assert_eq!(tokens.words(), &["node.js", "c++", "and", "c#", "rest"]);
    }

    #[test]
    fn test_bigrams_and_trigrams_follow_words() {
        assert_eq!(
            terms("Ruby on Rails"),
            vec![
                "ruby",
                "on",
                "rails",
                "ruby on",
                "on rails",
                "ruby on rails"
            ]
        );
    }

    #[test]
    fn test_duplicates_are_kept() {
        let all = terms("react react");
        assert_eq!(all, vec!["react", "react", "react react"]);
    }

    #[test]
    fn test_empty_and_symbol_only_text() {
        assert!(terms("").is_empty());
        assert!(terms("!!! ??? ***").is_empty());
    }

    #[test]
    fn test_terms_are_restartable() {
        let tokens = Tokens::new("rest api design");
        assert_eq!(tokens.terms().count(), tokens.terms().count());
        assert_eq!(tokens.terms().count(), 3 + 2 + 1);
    }
}
