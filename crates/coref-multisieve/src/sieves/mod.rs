//! Sieves
//!
//! A sieve is a deterministic merge rule. The generic [`resolve`] pass walks
//! the mentions of a document, asks the sieve for an ordered candidate list
//! and merges each eligible mention with its first compatible candidate.

use serde::{Deserialize, Serialize};
use tracing::debug;

use coref_core::{DocumentGraph, Language, NodeId, Person};

use crate::entity::{EntityArena, EntityId};

pub mod head_match;
pub mod pronoun;
pub mod string_match;

pub use head_match::StrictHeadMatch;
pub use pronoun::{PronounMatch, PronounOrdering};
pub use string_match::{ExactStringMatch, RelaxedStringMatch};

/// Gating options shared by every sieve
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SieveOptions {
    /// Only the first mention of its entity may look for antecedents
    pub only_first_mention: bool,
    /// Pronoun mentions never look for antecedents
    pub no_pronoun_mention: bool,
    /// Stop-word mentions never look for antecedents
    pub no_stop_words: bool,
    /// Reject speaker-incompatible pairs
    pub incompatible_discourse: bool,
    /// Reject nested pairs
    pub i_within_i: bool,
    /// Maximum distance in sentences to an antecedent
    pub sentence_distance_limit: Option<usize>,
}

/// Read-only view shared by the sieve callbacks of one pass
pub struct SieveContext<'a> {
    pub graph: &'a dyn DocumentGraph,
    pub language: &'a Language,
    pub entities: &'a EntityArena,
    pub textual_order: &'a [Vec<NodeId>],
    pub candidate_order: &'a [Vec<NodeId>],
}

impl SieveContext<'_> {
    /// Entity of a mention (mentions are seeded before any pass)
    pub fn entity(&self, mention: NodeId) -> Option<EntityId> {
        self.entities.entity_of(mention)
    }

    pub fn is_pronoun(&self, mention: NodeId) -> bool {
        self.graph.node(mention).is_pronoun_mention()
    }

    /// Lowercased surface form
    pub fn form(&self, mention: NodeId) -> String {
        self.graph.node(mention).form.to_lowercase()
    }

    /// Speakers match, narration counting as one speaker
    pub fn same_speaker(&self, a: NodeId, b: NodeId) -> bool {
        self.graph.node(a).speaker == self.graph.node(b).speaker
    }
}

/// Links made by one sieve pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SieveOutcome {
    pub sieve: String,
    pub links: usize,
}

/// Trait for coreference sieves
pub trait Sieve: Send + Sync {
    /// Registry short name
    fn name(&self) -> &str;

    fn options(&self) -> &SieveOptions;

    /// Whether a mention may look for an antecedent
    fn validate(&self, ctx: &SieveContext<'_>, mention: NodeId) -> bool {
        base_validate(self.options(), ctx, mention)
    }

    /// Ordered antecedent candidates of a mention
    fn candidates(&self, ctx: &SieveContext<'_>, sentence: usize, mention: NodeId) -> Vec<NodeId> {
        default_candidates(ctx, sentence, mention, self.options().sentence_distance_limit)
    }

    /// Sieve-specific pairwise test
    fn are_coreferent(&self, ctx: &SieveContext<'_>, mention: NodeId, candidate: NodeId) -> bool;
}

// ============================================================================
// Shared rules
// ============================================================================

/// Eligibility checks common to every sieve
pub fn base_validate(options: &SieveOptions, ctx: &SieveContext<'_>, mention: NodeId) -> bool {
    let node = ctx.graph.node(mention);
    if node.attrs.invalid {
        return false;
    }
    if options.only_first_mention {
        let first = ctx
            .entity(mention)
            .and_then(|entity| ctx.entities.first_mention(entity));
        if first != Some(mention) {
            return false;
        }
    }
    if options.no_pronoun_mention && node.is_pronoun_mention() {
        return false;
    }
    if options.no_stop_words && ctx.language.lexicon.is_stop_word(&node.form) {
        return false;
    }
    true
}

/// Compatibility checks common to every sieve
pub fn base_compatible(options: &SieveOptions, ctx: &SieveContext<'_>, mention: NodeId, candidate: NodeId) -> bool {
    let node = ctx.graph.node(mention);
    let other = ctx.graph.node(candidate);
    if other.attrs.invalid || ctx.entities.same_entity(mention, candidate) {
        return false;
    }
    if options.i_within_i
        && (node.span.is_inside(&other.span) || other.span.is_inside(&node.span))
    {
        debug!(mention = %node.form, candidate = %other.form, "LINK FILTERED: i within i");
        return false;
    }
    if options.incompatible_discourse && incompatible_discourse(ctx, mention, candidate) {
        debug!(mention = %node.form, candidate = %other.form, "LINK FILTERED: incompatible discourse");
        return false;
    }
    true
}

/// First or second person pronouns voiced by different speakers
fn incompatible_discourse(ctx: &SieveContext<'_>, mention: NodeId, candidate: NodeId) -> bool {
    let a = ctx.graph.node(mention);
    let b = ctx.graph.node(candidate);
    if !(a.is_pronoun_mention() && b.is_pronoun_mention()) || ctx.same_speaker(mention, candidate) {
        return false;
    }
    a.attrs.person == b.attrs.person && matches!(a.attrs.person, Person::First | Person::Second)
}

/// Entity-level attribute agreement
///
/// Each attribute is compared as the set of known values held by any member;
/// two entities disagree when both sets are known and disjoint.
pub fn agree_attributes(ctx: &SieveContext<'_>, a: EntityId, b: EntityId) -> bool {
    fn agree<T: Ord>(x: &std::collections::BTreeSet<T>, y: &std::collections::BTreeSet<T>) -> bool {
        x.is_empty() || y.is_empty() || !x.is_disjoint(y)
    }
    let (graph, entities) = (ctx.graph, ctx.entities);
    agree(&entities.genders(graph, a), &entities.genders(graph, b))
        && agree(&entities.numbers(graph, a), &entities.numbers(graph, b))
        && agree(&entities.animacies(graph, a), &entities.animacies(graph, b))
        && agree(&entities.persons(graph, a), &entities.persons(graph, b))
}

/// Preceding mentions of the sentence, then earlier sentences newest first
///
/// Both parts follow candidate order.
pub fn default_candidates(
    ctx: &SieveContext<'_>,
    sentence: usize,
    mention: NodeId,
    limit: Option<usize>,
) -> Vec<NodeId> {
    let current = ctx
        .candidate_order
        .get(sentence)
        .map(Vec::as_slice)
        .unwrap_or(&[]);
    let mut candidates = match current.iter().position(|m| *m == mention) {
        Some(position) => current[..position].to_vec(),
        None => {
            debug!(sentence, mention = %ctx.graph.node(mention).form, "Mention missing from candidate order");
            Vec::new()
        }
    };
    candidates.extend(earlier_sentences(ctx.candidate_order, sentence, limit));
    candidates
}

/// Mentions of earlier sentences, newest sentence first
pub fn earlier_sentences(order: &[Vec<NodeId>], sentence: usize, limit: Option<usize>) -> Vec<NodeId> {
    order[..sentence.min(order.len())]
        .iter()
        .enumerate()
        .rev()
        .take_while(|(index, _)| limit.map_or(true, |limit| sentence - index <= limit))
        .flat_map(|(_, mentions)| mentions.iter().copied())
        .collect()
}

// ============================================================================
// Resolution pass
// ============================================================================

/// Run one sieve over the document
pub fn resolve(
    sieve: &dyn Sieve,
    graph: &dyn DocumentGraph,
    language: &Language,
    entities: &mut EntityArena,
    textual_order: &[Vec<NodeId>],
    candidate_order: &[Vec<NodeId>],
) -> SieveOutcome {
    let mut links = 0;
    for (sentence, mentions) in textual_order.iter().enumerate() {
        for &mention in mentions {
            let found = {
                let ctx = SieveContext {
                    graph,
                    language,
                    entities: &*entities,
                    textual_order,
                    candidate_order,
                };
                if !sieve.validate(&ctx, mention) {
                    continue;
                }
                sieve
                    .candidates(&ctx, sentence, mention)
                    .into_iter()
                    .find(|&candidate| {
                        base_compatible(sieve.options(), &ctx, mention, candidate)
                            && sieve.are_coreferent(&ctx, mention, candidate)
                    })
            };
            let Some(candidate) = found else {
                continue;
            };
            if let (Some(a), Some(b)) = (entities.entity_of(mention), entities.entity_of(candidate)) {
                entities.merge(a, b);
                links += 1;
                debug!(
                    sieve = sieve.name(),
                    mention = %graph.node(mention).form,
                    candidate = %graph.node(candidate).form,
                    "LINKED"
                );
            }
        }
    }
    SieveOutcome {
        sieve: sieve.name().to_string(),
        links,
    }
}
