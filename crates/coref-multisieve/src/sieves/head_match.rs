//! Strict head match sieve

use std::collections::BTreeSet;

use tracing::debug;

use coref_core::NodeId;

use super::{Sieve, SieveContext, SieveOptions};
use crate::entity::EntityId;

/// Head match with word inclusion and compatible modifiers
///
/// A mention links to a candidate when:
/// - its head word is the head of some member of the candidate entity
/// - every content word of its entity appears in the candidate entity
/// - its modifiers all appear among the candidate's words
#[derive(Debug, Clone)]
pub struct StrictHeadMatch {
    options: SieveOptions,
}

impl StrictHeadMatch {
    pub fn new() -> Self {
        Self {
            options: SieveOptions {
                only_first_mention: true,
                no_pronoun_mention: true,
                incompatible_discourse: true,
                i_within_i: true,
                ..Default::default()
            },
        }
    }
}

impl Default for StrictHeadMatch {
    fn default() -> Self {
        Self::new()
    }
}

fn head_form(ctx: &SieveContext<'_>, mention: NodeId) -> Option<String> {
    ctx.graph
        .head_word(mention)
        .map(|head| ctx.graph.node(head).form.to_lowercase())
}

fn entity_words(ctx: &SieveContext<'_>, entity: EntityId, content_only: bool) -> BTreeSet<String> {
    ctx.entities
        .members(entity)
        .into_iter()
        .flat_map(|m| ctx.graph.words(m))
        .map(|w| ctx.graph.node(w).form.to_lowercase())
        .filter(|form| !content_only || !ctx.language.lexicon.is_stop_word(form))
        .collect()
}

fn modifiers(ctx: &SieveContext<'_>, mention: NodeId) -> BTreeSet<String> {
    let head = ctx.graph.head_word(mention);
    ctx.graph
        .words(mention)
        .into_iter()
        .filter(|w| Some(*w) != head)
        .map(|w| ctx.graph.node(w))
        .filter(|w| ctx.language.tags.is_modifier(w.pos_str()))
        .map(|w| w.form.to_lowercase())
        .collect()
}

impl Sieve for StrictHeadMatch {
    fn name(&self) -> &str {
        "SHM"
    }

    fn options(&self) -> &SieveOptions {
        &self.options
    }

    fn are_coreferent(&self, ctx: &SieveContext<'_>, mention: NodeId, candidate: NodeId) -> bool {
        if ctx.is_pronoun(candidate) {
            return false;
        }
        let (Some(entity), Some(candidate_entity)) = (ctx.entity(mention), ctx.entity(candidate)) else {
            return false;
        };
        let Some(head) = head_form(ctx, mention) else {
            return false;
        };

        let cluster_head_match = ctx
            .entities
            .members(candidate_entity)
            .into_iter()
            .filter(|m| !ctx.is_pronoun(*m))
            .any(|m| head_form(ctx, m).as_deref() == Some(head.as_str()));
        if !cluster_head_match {
            return false;
        }

        let candidate_words = entity_words(ctx, candidate_entity, false);
        if !entity_words(ctx, entity, true).is_subset(&candidate_words) {
            debug!(mention = %ctx.graph.node(mention).form, "LINK FILTERED: word inclusion");
            return false;
        }
        let candidate_mention_words: BTreeSet<String> = ctx
            .graph
            .words(candidate)
            .into_iter()
            .map(|w| ctx.graph.node(w).form.to_lowercase())
            .collect();
        if !modifiers(ctx, mention).is_subset(&candidate_mention_words) {
            debug!(mention = %ctx.graph.node(mention).form, "LINK FILTERED: incompatible modifiers");
            return false;
        }
        debug!(head = %head, "LINK ACCEPTED: strict head match");
        true
    }
}
