//! English lexicon

use super::Lexicon;
use crate::{Animacy, Gender, Number, Person};

const FIRST_SINGULAR: &[&str] = &["i", "me", "my", "mine", "myself"];
const FIRST_PLURAL: &[&str] = &["we", "us", "our", "ours", "ourselves"];
const SECOND: &[&str] = &["you", "your", "yours", "yourself", "yourselves", "ya", "thee", "thou"];
const THIRD_MALE: &[&str] = &["he", "him", "his", "himself"];
const THIRD_FEMALE: &[&str] = &["she", "her", "hers", "herself"];
const THIRD_NEUTRAL: &[&str] = &["it", "its", "itself"];
const THIRD_PLURAL: &[&str] = &["they", "them", "their", "theirs", "themselves"];

const RELATIVE: &[&str] = &["that", "who", "which", "whom", "where", "whose"];
const REFLEXIVE: &[&str] = &[
    "myself", "yourself", "yourselves", "himself", "herself", "itself", "ourselves",
    "themselves", "oneself",
];
const POSSESSIVE: &[&str] = &[
    "my", "mine", "your", "yours", "his", "her", "hers", "its", "our", "ours", "their",
    "theirs", "whose",
];
const INDEFINITE: &[&str] = &[
    "another", "anybody", "anyone", "anything", "each", "either", "enough", "everybody",
    "everyone", "everything", "less", "little", "much", "neither", "no one", "nobody",
    "nothing", "one", "other", "plenty", "somebody", "someone", "something", "both", "few",
    "fewer", "many", "others", "several", "all", "any", "more", "most", "none", "some",
    "such",
];
const PLEONASTIC: &[&str] = &["it"];
const NO_ORGANIZATION: &[&str] = &[
    "i", "me", "mine", "you", "your", "yours", "he", "him", "his", "she", "her", "hers", "we",
    "us", "our", "ours", "myself", "yourself", "himself", "herself", "ourselves",
    "yourselves",
];
const INDEFINITE_ARTICLES: &[&str] = &["a", "an"];
const STOP_WORDS: &[&str] = &[
    "a", "an", "the", "of", "at", "on", "upon", "in", "to", "from", "out", "as", "so", "such",
    "or", "and", "those", "this", "these", "that", "for", ",", "is", "was", "am", "are", "'s",
    "been", "were",
];

/// English word lists
#[derive(Debug, Clone, Copy, Default)]
pub struct English;

fn contains(list: &[&str], form: &str) -> bool {
    let form = form.to_lowercase();
    list.contains(&form.as_str())
}

impl English {
    fn personal(&self, form: &str) -> bool {
        [
            FIRST_SINGULAR,
            FIRST_PLURAL,
            SECOND,
            THIRD_MALE,
            THIRD_FEMALE,
            THIRD_NEUTRAL,
            THIRD_PLURAL,
        ]
        .iter()
        .any(|list| contains(list, form))
    }
}

impl Lexicon for English {
    fn is_pronoun(&self, form: &str) -> bool {
        self.personal(form) || contains(RELATIVE, form) || contains(INDEFINITE, form)
    }

    fn is_relative(&self, form: &str) -> bool {
        contains(RELATIVE, form)
    }

    fn is_reflexive(&self, form: &str) -> bool {
        contains(REFLEXIVE, form)
    }

    fn is_possessive(&self, form: &str) -> bool {
        contains(POSSESSIVE, form)
    }

    fn is_indefinite(&self, form: &str) -> bool {
        contains(INDEFINITE, form)
    }

    fn is_pleonastic(&self, form: &str) -> bool {
        contains(PLEONASTIC, form)
    }

    fn is_no_organization(&self, form: &str) -> bool {
        contains(NO_ORGANIZATION, form)
    }

    fn is_stop_word(&self, form: &str) -> bool {
        contains(STOP_WORDS, form)
    }

    fn is_indefinite_article(&self, form: &str) -> bool {
        contains(INDEFINITE_ARTICLES, form)
    }

    fn gender(&self, form: &str) -> Gender {
        if contains(THIRD_MALE, form) {
            Gender::Male
        } else if contains(THIRD_FEMALE, form) {
            Gender::Female
        } else if contains(THIRD_NEUTRAL, form) {
            Gender::Neutral
        } else {
            Gender::Unknown
        }
    }

    fn number(&self, form: &str) -> Number {
        if contains(FIRST_SINGULAR, form)
            || contains(THIRD_MALE, form)
            || contains(THIRD_FEMALE, form)
            || contains(THIRD_NEUTRAL, form)
        {
            Number::Singular
        } else if contains(FIRST_PLURAL, form) || contains(THIRD_PLURAL, form) {
            Number::Plural
        } else {
            Number::Unknown
        }
    }

    fn person(&self, form: &str) -> Person {
        if contains(FIRST_SINGULAR, form) || contains(FIRST_PLURAL, form) {
            Person::First
        } else if contains(SECOND, form) {
            Person::Second
        } else if contains(THIRD_MALE, form)
            || contains(THIRD_FEMALE, form)
            || contains(THIRD_NEUTRAL, form)
            || contains(THIRD_PLURAL, form)
        {
            Person::Third
        } else {
            Person::Unknown
        }
    }

    fn animacy(&self, form: &str) -> Animacy {
        if contains(THIRD_NEUTRAL, form) {
            Animacy::Inanimate
        } else if contains(FIRST_SINGULAR, form)
            || contains(FIRST_PLURAL, form)
            || contains(SECOND, form)
            || contains(THIRD_MALE, form)
            || contains(THIRD_FEMALE, form)
        {
            Animacy::Animate
        } else {
            Animacy::Unknown
        }
    }
}
