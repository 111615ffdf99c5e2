//! Penn Treebank tag set

use once_cell::sync::Lazy;
use regex::Regex;

use super::TagSet;

static CLAUSE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^S").expect("valid regex"));
static MENTION_CONSTITUENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^NP").expect("valid regex"));
static ENUMERABLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(NP|NML)").expect("valid regex"));
static MENTION_PRONOUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^PRP").expect("valid regex"));
static SINGULAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"^NNP?$").expect("valid regex"));
static PLURAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^NNP?S$").expect("valid regex"));

const ROOTS: &[&str] = &["root", "top", "ROOT", "TOP"];
const PRONOUNS: &[&str] = &["PRP", "PRP$", "WP", "WP$"];
const RELATIVES: &[&str] = &["WP", "WP$"];
const PROPER_NOUNS: &[&str] = &["NNP", "NNPS"];
const NOUNS: &[&str] = &["NN", "NNS", "NNP", "NNPS"];

const PERSON_NER: &[&str] = &["PERSON", "PER"];
const ORGANIZATION_NER: &[&str] = &["ORGANIZATION", "ORG", "NORP"];
const LOCATION_NER: &[&str] = &["LOCATION", "LOC", "GPE", "FAC"];

/// Penn Treebank constituent and POS tags with CoNLL/OntoNotes NER labels
#[derive(Debug, Clone, Copy, Default)]
pub struct PennTreebank;

impl TagSet for PennTreebank {
    fn is_root(&self, tag: &str) -> bool {
        ROOTS.contains(&tag)
    }

    fn is_clause(&self, tag: &str) -> bool {
        CLAUSE.is_match(tag)
    }

    fn is_noun_phrase(&self, tag: &str) -> bool {
        tag == "NP"
    }

    fn is_mention_constituent(&self, tag: &str) -> bool {
        MENTION_CONSTITUENT.is_match(tag)
    }

    fn is_enumerable(&self, tag: &str) -> bool {
        ENUMERABLE.is_match(tag)
    }

    fn is_interjection_constituent(&self, tag: &str) -> bool {
        tag == "INTJ"
    }

    fn is_pronoun(&self, pos: &str) -> bool {
        PRONOUNS.contains(&pos)
    }

    fn is_mention_pronoun(&self, pos: &str) -> bool {
        MENTION_PRONOUN.is_match(pos)
    }

    fn is_relative_pronoun(&self, pos: &str) -> bool {
        RELATIVES.contains(&pos)
    }

    fn is_proper_noun(&self, pos: &str) -> bool {
        PROPER_NOUNS.contains(&pos)
    }

    fn is_noun(&self, pos: &str) -> bool {
        NOUNS.contains(&pos)
    }

    fn is_singular_noun(&self, pos: &str) -> bool {
        SINGULAR.is_match(pos)
    }

    fn is_plural_noun(&self, pos: &str) -> bool {
        PLURAL.is_match(pos)
    }

    fn is_interjection(&self, pos: &str) -> bool {
        pos == "UH"
    }

    fn is_conjunction(&self, pos: &str) -> bool {
        pos == "CC"
    }

    fn is_cardinal(&self, pos: &str) -> bool {
        pos.starts_with("CD")
    }

    fn is_head_candidate(&self, pos: &str) -> bool {
        pos.starts_with('N')
    }

    fn is_modifier(&self, pos: &str) -> bool {
        pos.starts_with('N') || pos.starts_with("JJ") || pos.starts_with('V') || pos == "CD"
    }

    fn is_mention_ner(&self, ner: &str) -> bool {
        !ner.is_empty() && ner != "O"
    }

    fn is_person_ner(&self, ner: &str) -> bool {
        PERSON_NER.contains(&ner)
    }

    fn is_organization_ner(&self, ner: &str) -> bool {
        ORGANIZATION_NER.contains(&ner)
    }

    fn is_location_ner(&self, ner: &str) -> bool {
        LOCATION_NER.contains(&ner)
    }
}
