//! Built-in catchers

use coref_core::{DocumentGraph, Language, NodeId};
use tracing::debug;

use crate::Catcher;

/// Noun phrase constituents outside named entities
#[derive(Debug, Clone, Default)]
pub struct ConstituentCatcher {
    permissive: bool,
}

impl ConstituentCatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Noun phrases even when inside a named entity
    pub fn permissive() -> Self {
        Self { permissive: true }
    }
}

impl Catcher for ConstituentCatcher {
    fn name(&self) -> &str {
        if self.permissive {
            "PermissiveConstituentCatcher"
        } else {
            "ConstituentCatcher"
        }
    }

    fn soft_ne(&self) -> bool {
        self.permissive
    }

    fn catch_mention(&self, graph: &dyn DocumentGraph, language: &Language, candidate: NodeId) -> bool {
        let node = graph.node(candidate);
        match node.tag.as_deref() {
            Some(tag) if language.tags.is_mention_constituent(tag) => {
                debug!(form = %node.form, "Mention is valid constituent");
                true
            }
            _ => false,
        }
    }
}

/// Named entities whose label is a mention label
#[derive(Debug, Clone, Default)]
pub struct NamedEntitiesCatcher;

impl Catcher for NamedEntitiesCatcher {
    fn name(&self) -> &str {
        "NamedEntitiesCatcher"
    }

    fn soft_ne(&self) -> bool {
        true
    }

    fn catch_mention(&self, graph: &dyn DocumentGraph, language: &Language, candidate: NodeId) -> bool {
        graph
            .node(candidate)
            .ner
            .as_deref()
            .is_some_and(|ner| language.tags.is_mention_ner(ner))
    }
}

/// Pronouns by POS tag, or also by lexicon when permissive
#[derive(Debug, Clone, Default)]
pub struct PronounCatcher {
    permissive: bool,
}

impl PronounCatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn permissive() -> Self {
        Self { permissive: true }
    }
}

impl Catcher for PronounCatcher {
    fn name(&self) -> &str {
        if self.permissive {
            "PermissivePronounCatcher"
        } else {
            "PronounCatcher"
        }
    }

    fn soft_ne(&self) -> bool {
        self.permissive
    }

    fn catch_mention(&self, graph: &dyn DocumentGraph, language: &Language, candidate: NodeId) -> bool {
        let node = graph.node(candidate);
        let by_pos = node
            .pos
            .as_deref()
            .is_some_and(|pos| language.tags.is_mention_pronoun(pos));
        let accepted = by_pos
            || (self.permissive && node.is_word() && language.lexicon.is_pronoun(&node.form));
        if accepted {
            debug!(form = %node.form, pos = node.pos_str(), "Mention is pronoun");
        }
        accepted
    }
}

/// Gold mentions, optionally excluding annotated singletons
///
/// The plain variant is the only non-unique built-in catcher: a gold mention
/// is accepted even when another node already claimed its span.
#[derive(Debug, Clone, Default)]
pub struct GoldCatcher {
    skip_singletons: bool,
}

impl GoldCatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn non_singleton() -> Self {
        Self {
            skip_singletons: true,
        }
    }
}

impl Catcher for GoldCatcher {
    fn name(&self) -> &str {
        if self.skip_singletons {
            "GoldNSCatcher"
        } else {
            "GoldCatcher"
        }
    }

    fn soft_ne(&self) -> bool {
        true
    }

    fn unique(&self) -> bool {
        self.skip_singletons
    }

    fn catch_mention(&self, graph: &dyn DocumentGraph, _language: &Language, candidate: NodeId) -> bool {
        let node = graph.node(candidate);
        node.gold_entity.is_some() && !(self.skip_singletons && node.singleton)
    }
}
