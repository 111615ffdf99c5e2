//! Language resources
//!
//! Pure classification functions over tags and word forms. Every rule in
//! the pipeline reaches language knowledge only through these traits so a
//! new language is a new pair of implementations, nothing else.

mod english;
mod penn;

pub use english::English;
pub use penn::PennTreebank;

use crate::{Animacy, CorefError, Gender, Number, Person, Result};

/// Classifier over POS tags, constituent tags and NER labels
pub trait TagSet: Send + Sync {
    // Constituents
    fn is_root(&self, tag: &str) -> bool;
    fn is_clause(&self, tag: &str) -> bool;
    fn is_noun_phrase(&self, tag: &str) -> bool;
    fn is_mention_constituent(&self, tag: &str) -> bool;
    fn is_enumerable(&self, tag: &str) -> bool;
    fn is_interjection_constituent(&self, tag: &str) -> bool;

    // Parts of speech
    fn is_pronoun(&self, pos: &str) -> bool;
    fn is_mention_pronoun(&self, pos: &str) -> bool;
    fn is_relative_pronoun(&self, pos: &str) -> bool;
    fn is_proper_noun(&self, pos: &str) -> bool;
    fn is_noun(&self, pos: &str) -> bool;
    fn is_singular_noun(&self, pos: &str) -> bool;
    fn is_plural_noun(&self, pos: &str) -> bool;
    fn is_interjection(&self, pos: &str) -> bool;
    fn is_conjunction(&self, pos: &str) -> bool;
    fn is_cardinal(&self, pos: &str) -> bool;
    /// Words eligible as heads of a plausible anchor
    fn is_head_candidate(&self, pos: &str) -> bool;
    /// Words that count as modifiers in head matching
    fn is_modifier(&self, pos: &str) -> bool;

    // Named entities
    fn is_mention_ner(&self, ner: &str) -> bool;
    fn is_person_ner(&self, ner: &str) -> bool;
    fn is_organization_ner(&self, ner: &str) -> bool;
    fn is_location_ner(&self, ner: &str) -> bool;
}

/// Lexical category membership for word forms
///
/// Forms are matched case-insensitively.
pub trait Lexicon: Send + Sync {
    fn is_pronoun(&self, form: &str) -> bool;
    fn is_relative(&self, form: &str) -> bool;
    fn is_reflexive(&self, form: &str) -> bool;
    fn is_possessive(&self, form: &str) -> bool;
    fn is_indefinite(&self, form: &str) -> bool;
    fn is_pleonastic(&self, form: &str) -> bool;
    /// Pronouns that cannot refer to an organization
    fn is_no_organization(&self, form: &str) -> bool;
    fn is_stop_word(&self, form: &str) -> bool;
    fn is_indefinite_article(&self, form: &str) -> bool;

    fn gender(&self, form: &str) -> Gender;
    fn number(&self, form: &str) -> Number;
    fn person(&self, form: &str) -> Person;
    fn animacy(&self, form: &str) -> Animacy;
}

/// Language resources shared read-only by every document
pub struct Language {
    pub code: String,
    pub tags: Box<dyn TagSet>,
    pub lexicon: Box<dyn Lexicon>,
}

impl Language {
    /// English with the Penn Treebank tag set
    pub fn english() -> Self {
        Self {
            code: "en".to_string(),
            tags: Box::new(PennTreebank),
            lexicon: Box::new(English),
        }
    }

    /// Resolve a language by code
    pub fn by_code(code: &str) -> Result<Self> {
        match code.to_lowercase().as_str() {
            "en" | "english" => Ok(Self::english()),
            _ => Err(CorefError::UnknownLanguage(code.to_string())),
        }
    }
}

impl std::fmt::Debug for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Language").field("code", &self.code).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_by_code() {
        assert_eq!(Language::by_code("EN").unwrap().code, "en");
        assert!(matches!(
            Language::by_code("xx"),
            Err(CorefError::UnknownLanguage(_))
        ));
    }

    #[test]
    fn test_language_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Language>();
    }
}
