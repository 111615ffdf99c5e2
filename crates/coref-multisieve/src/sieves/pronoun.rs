//! Pronoun match sieves
//!
//! One configurable sieve backs the whole family:
//! - `PNM`: attribute agreement and person rules
//! - `RPNM`: plus possessive-vs-possession and adjacency restrictions
//! - `FPNM`: as `RPNM`, possessive anaphors are never resolved
//! - `APNM`: as `RPNM`, same-clause candidates are searched first
//! - `AAPNM`: as `RPNM`, only the sentence prefix is searched in the sentence

use tracing::debug;

use coref_core::{NodeId, Person};

use super::{agree_attributes, default_candidates, earlier_sentences, Sieve, SieveContext, SieveOptions};
use crate::entity::EntityId;

/// Candidate search order for an unresolved pronoun
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PronounOrdering {
    /// Plain candidate order
    Candidate,
    /// Candidates of the nearest enclosing clause first
    Clause,
    /// Sentence candidates starting before the pronoun ends
    SentencePrefix,
}

/// Pronoun resolution sieve
#[derive(Debug, Clone)]
pub struct PronounMatch {
    name: &'static str,
    options: SieveOptions,
    restrict_possessives: bool,
    forbid_possessives: bool,
    restrict_adjacent: bool,
    ordering: PronounOrdering,
}

impl PronounMatch {
    fn base(name: &'static str) -> Self {
        Self {
            name,
            options: SieveOptions {
                no_stop_words: true,
                incompatible_discourse: true,
                i_within_i: true,
                sentence_distance_limit: Some(3),
                ..Default::default()
            },
            restrict_possessives: false,
            forbid_possessives: false,
            restrict_adjacent: false,
            ordering: PronounOrdering::Candidate,
        }
    }

    fn restricted(name: &'static str) -> Self {
        Self {
            restrict_possessives: true,
            restrict_adjacent: true,
            ..Self::base(name)
        }
    }

    pub fn new() -> Self {
        Self::base("PNM")
    }

    pub fn rules() -> Self {
        Self::restricted("RPNM")
    }

    pub fn forbid_possessives() -> Self {
        Self {
            forbid_possessives: true,
            ..Self::restricted("FPNM")
        }
    }

    pub fn clause_first() -> Self {
        Self {
            ordering: PronounOrdering::Clause,
            ..Self::restricted("APNM")
        }
    }

    pub fn sentence_prefix() -> Self {
        Self {
            ordering: PronounOrdering::SentencePrefix,
            ..Self::restricted("AAPNM")
        }
    }

    pub fn ordering(&self) -> PronounOrdering {
        self.ordering
    }

    fn is_possessive(ctx: &SieveContext<'_>, mention: NodeId) -> bool {
        ctx.language.lexicon.is_possessive(&ctx.graph.node(mention).form)
    }

    fn starts_with_possessive(ctx: &SieveContext<'_>, mention: NodeId) -> bool {
        ctx.graph
            .words(mention)
            .first()
            .is_some_and(|w| Self::is_possessive(ctx, *w))
    }

    // ========================================================================
    // Person rules
    // ========================================================================

    fn entity_person_disagree(ctx: &SieveContext<'_>, entity: EntityId, candidate_entity: EntityId) -> bool {
        let mentions = ctx.entities.members(entity);
        ctx.entities.members(candidate_entity).into_iter().any(|candidate| {
            mentions
                .iter()
                .any(|&mention| Self::mention_person_disagree(ctx, mention, candidate, entity, candidate_entity))
        })
    }

    fn mention_person_disagree(
        ctx: &SieveContext<'_>,
        mention: NodeId,
        candidate: NodeId,
        mention_entity: EntityId,
        candidate_entity: EntityId,
    ) -> bool {
        let m = ctx.graph.node(mention);
        let c = ctx.graph.node(candidate);
        let same_speaker = ctx.same_speaker(mention, candidate);
        let (m_person, c_person) = (m.attrs.person, c.attrs.person);

        if same_speaker && (m_person != c_person || m.attrs.number != c.attrs.number) {
            if m_person == Person::Third && c_person == Person::Third {
                return false;
            }
            if m_person != Person::Unknown && c_person != Person::Unknown {
                return true;
            }
        }

        if same_speaker {
            let local = |person: Person| matches!(person, Person::First | Person::Second);
            if !m.is_pronoun_mention() && local(c_person) {
                return true;
            }
            if !c.is_pronoun_mention() && local(m_person) {
                return true;
            }
        }

        if m_person == Person::Second
            && c.span < m.span
            && Self::second_person_unanchored(ctx, mention, candidate_entity, c_person)
        {
            return true;
        }
        if c_person == Person::Second
            && m.span < c.span
            && Self::second_person_unanchored(ctx, candidate, mention_entity, m_person)
        {
            return true;
        }
        false
    }

    /// A "you" is only resolvable inside an utterance with a known previous
    /// speaker, and never towards that speaker unless in first person
    fn second_person_unanchored(
        ctx: &SieveContext<'_>,
        you: NodeId,
        other_entity: EntityId,
        other_person: Person,
    ) -> bool {
        let head = ctx.graph.head_word(you).unwrap_or(you);
        let head = ctx.graph.node(head);
        if head.utterance == 0 {
            return true;
        }
        let Some(prev_speaker) = head.prev_speaker else {
            return true;
        };
        let Some(speaker) = ctx.entities.mention_at(ctx.graph.node(prev_speaker).span) else {
            return true;
        };
        ctx.entities.entity_of(speaker) == Some(other_entity) && other_person != Person::First
    }

    // ========================================================================
    // Candidate ordering
    // ========================================================================

    fn clause_order(ctx: &SieveContext<'_>, prefix: &[NodeId], mention: NodeId) -> Vec<NodeId> {
        let graph = ctx.graph;
        let mention_end = graph.node(mention).span.end;
        let before: Vec<NodeId> = prefix
            .iter()
            .copied()
            .filter(|c| graph.node(*c).span.start < mention_end)
            .collect();

        let target = graph.node(mention).constituent.unwrap_or(mention);
        let root = graph.root_of(target);
        let mut current = graph.parent(target);
        while let Some(node) = current {
            let scope = graph.node(node);
            let is_root = Some(node) == root;
            if is_root || ctx.language.tags.is_clause(scope.tag_str()) {
                let (mut inside, outside): (Vec<NodeId>, Vec<NodeId>) = before
                    .iter()
                    .copied()
                    .partition(|c| graph.node(*c).span.is_inside(&scope.span));
                if !is_root {
                    inside.extend(outside);
                }
                return inside;
            }
            current = graph.parent(node);
        }
        before
    }
}

impl Default for PronounMatch {
    fn default() -> Self {
        Self::new()
    }
}

impl Sieve for PronounMatch {
    fn name(&self) -> &str {
        self.name
    }

    fn options(&self) -> &SieveOptions {
        &self.options
    }

    fn validate(&self, ctx: &SieveContext<'_>, mention: NodeId) -> bool {
        let node = ctx.graph.node(mention);
        super::base_validate(&self.options, ctx, mention)
            && !ctx.language.lexicon.is_relative(&node.form)
            && !node.attrs.pleonastic
    }

    fn candidates(&self, ctx: &SieveContext<'_>, sentence: usize, mention: NodeId) -> Vec<NodeId> {
        let limit = self.options.sentence_distance_limit;
        let singleton = ctx.entity(mention).is_some_and(|e| ctx.entities.size(e) == 1);
        if self.ordering == PronounOrdering::Candidate || !singleton || !ctx.is_pronoun(mention) {
            return default_candidates(ctx, sentence, mention, limit);
        }

        let current = ctx
            .candidate_order
            .get(sentence)
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        let Some(position) = current.iter().position(|m| *m == mention) else {
            debug!(sentence, mention = %ctx.graph.node(mention).form, "Mention missing from candidate order");
            return earlier_sentences(ctx.textual_order, sentence, limit);
        };
        let prefix = &current[..position];
        let mut candidates = match self.ordering {
            PronounOrdering::Clause => Self::clause_order(ctx, prefix, mention),
            _ => {
                let end = ctx.graph.node(mention).span.end;
                prefix
                    .iter()
                    .copied()
                    .filter(|c| ctx.graph.node(*c).span.start < end)
                    .collect()
            }
        };
        if ctx.language.lexicon.is_relative(&ctx.graph.node(mention).form) {
            candidates.reverse();
        }
        candidates.extend(earlier_sentences(ctx.textual_order, sentence, limit));
        candidates
    }

    fn are_coreferent(&self, ctx: &SieveContext<'_>, mention: NodeId, candidate: NodeId) -> bool {
        let lexicon = &ctx.language.lexicon;
        let m = ctx.graph.node(mention);
        let c = ctx.graph.node(candidate);

        if lexicon.is_relative(&c.form) || c.attrs.pleonastic {
            return false;
        }
        if self.forbid_possessives && Self::is_possessive(ctx, mention) {
            return false;
        }
        if self.restrict_possessives
            && m.is_pronoun_mention()
            && Self::is_possessive(ctx, mention)
            && Self::starts_with_possessive(ctx, candidate)
            && !c.is_pronoun_mention()
        {
            return false;
        }
        if self.restrict_adjacent && m.span.start == c.span.end + 1 {
            return false;
        }

        let (Some(entity), Some(candidate_entity)) = (ctx.entity(mention), ctx.entity(candidate)) else {
            return false;
        };
        let representative = ctx.entities.first_mention(entity).unwrap_or(mention);
        let anaphor = if ctx.graph.node(representative).attrs.predicative_nominative
            || m.attrs.predicative_nominative
        {
            representative
        } else {
            mention
        };
        if !ctx.is_pronoun(anaphor) {
            debug!(mention = %m.form, "MENTION FILTERED: Not a pronoun");
            return false;
        }
        if c.attrs.demonym && !lexicon.is_no_organization(&ctx.graph.node(anaphor).form) {
            debug!(candidate = %c.form, "LINK FILTERED: Candidate is location and mention is not organization valid");
            return false;
        }
        if !agree_attributes(ctx, entity, candidate_entity) {
            debug!(mention = %m.form, candidate = %c.form, "LINK FILTERED: Attributes disagree");
            return false;
        }
        if Self::entity_person_disagree(ctx, entity, candidate_entity) {
            debug!(mention = %m.form, candidate = %c.form, "LINK FILTERED: Person disagree");
            return false;
        }
        debug!(mention = %m.form, candidate = %c.form, "LINK ACCEPTED");
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityArena;
    use crate::sieves::resolve;
    use coref_core::{DocumentGraph, Language, MentionType, Number};
    use coref_graph::Document;

    struct Fixture {
        doc: Document,
        john: NodeId,
        you: NodeId,
        his: NodeId,
        mother: NodeId,
    }

    /// (S (NP John) (VP saw (NP you))) (S (NP (NP his) mother) (VP left))
    fn fixture() -> Fixture {
        let mut doc = Document::new("t");
        let root = doc.add_sentence();
        let s = doc.add_constituent(root, "S");
        let john = doc.add_constituent(s, "NP");
        doc.add_word(john, "John", "NNP");
        let vp = doc.add_constituent(s, "VP");
        doc.add_word(vp, "saw", "VBD");
        let you = doc.add_constituent(vp, "NP");
        doc.add_word(you, "you", "PRP");
        doc.finish_sentence(root);

        let root = doc.add_sentence();
        let s = doc.add_constituent(root, "S");
        let mother = doc.add_constituent(s, "NP");
        let his = doc.add_constituent(mother, "NP");
        doc.add_word(his, "his", "PRP$");
        doc.add_word(mother, "mother", "NN");
        let vp = doc.add_constituent(s, "VP");
        doc.add_word(vp, "left", "VBD");
        doc.finish_sentence(root);

        let set = |doc: &mut Document, id: NodeId, kind, person, number| {
            let attrs = &mut doc.node_mut(id).attrs;
            attrs.mention_type = Some(kind);
            attrs.person = person;
            attrs.number = number;
        };
        set(&mut doc, john, MentionType::Proper, Person::Third, Number::Singular);
        set(&mut doc, you, MentionType::Pronoun, Person::Second, Number::Unknown);
        set(&mut doc, his, MentionType::Pronoun, Person::Third, Number::Singular);
        set(&mut doc, mother, MentionType::Nominal, Person::Third, Number::Singular);
        Fixture { doc, john, you, his, mother }
    }

    fn with_ctx<R>(f: &Fixture, run: impl FnOnce(&SieveContext<'_>) -> R) -> R {
        let language = Language::english();
        let mut entities = EntityArena::new();
        for id in [f.john, f.you, f.mother, f.his] {
            entities.seed(id, f.doc.node(id).span);
        }
        let textual = vec![vec![f.john, f.you], vec![f.mother, f.his]];
        let ctx = SieveContext {
            graph: &f.doc,
            language: &language,
            entities: &entities,
            textual_order: &textual,
            candidate_order: &textual,
        };
        run(&ctx)
    }

    #[test]
    fn test_narration_you_never_resolves() {
        let f = fixture();
        with_ctx(&f, |ctx| {
            assert!(!PronounMatch::new().are_coreferent(ctx, f.you, f.john));
        });
    }

    /// Narration "Mary spoke." followed by two utterances of John, each
    /// holding a "you"
    fn dialogue(with_prev_speaker: bool) -> (Document, NodeId, NodeId, NodeId) {
        let mut doc = Document::new("t");
        let sentence = |doc: &mut Document, word: &str, pos: &str| {
            let root = doc.add_sentence();
            let s = doc.add_constituent(root, "S");
            let np = doc.add_constituent(s, "NP");
            doc.add_word(np, word, pos);
            let vp = doc.add_constituent(s, "VP");
            doc.add_word(vp, "spoke", "VBD");
            doc.finish_sentence(root);
            (root, np)
        };
        let (_, mary) = sentence(&mut doc, "Mary", "NNP");
        let (first_root, first) = sentence(&mut doc, "You", "PRP");
        let (second_root, second) = sentence(&mut doc, "you", "PRP");
        for root in [first_root, second_root] {
            doc.set_discourse(root, Some("John".to_string()), 1, false);
            if with_prev_speaker {
                doc.set_prev_speaker(root, mary);
            }
        }

        let attrs = &mut doc.node_mut(mary).attrs;
        attrs.mention_type = Some(MentionType::Proper);
        attrs.person = Person::Third;
        attrs.number = Number::Singular;
        for you in [first, second] {
            let attrs = &mut doc.node_mut(you).attrs;
            attrs.mention_type = Some(MentionType::Pronoun);
            attrs.person = Person::Second;
        }
        (doc, mary, first, second)
    }

    fn resolve_pronouns(doc: &Document, mentions: &[NodeId]) -> Vec<Vec<NodeId>> {
        let language = Language::english();
        let mut entities = EntityArena::new();
        for &m in mentions {
            entities.seed(m, doc.node(m).span);
        }
        let order: Vec<Vec<NodeId>> = mentions.iter().map(|m| vec![*m]).collect();
        resolve(&PronounMatch::new(), doc, &language, &mut entities, &order, &order);
        entities.partition()
    }

    #[test]
    fn test_dialogue_you_resolves_with_previous_speaker() {
        let (doc, mary, first, second) = dialogue(true);
        assert_eq!(
            resolve_pronouns(&doc, &[mary, first, second]),
            vec![vec![mary], vec![first, second]]
        );
    }

    #[test]
    fn test_dialogue_you_needs_previous_speaker() {
        let (doc, mary, first, second) = dialogue(false);
        assert_eq!(
            resolve_pronouns(&doc, &[mary, first, second]),
            vec![vec![mary], vec![first], vec![second]]
        );
    }

    #[test]
    fn test_dialogue_you_never_towards_previous_speaker() {
        let (mut doc, _, first, second) = dialogue(false);
        let roots = doc.sentences();
        // The first "you" now stands for whoever spoke before
        doc.set_prev_speaker(roots[2], first);
        assert_eq!(
            resolve_pronouns(&doc, &[first, second]),
            vec![vec![first], vec![second]]
        );
    }

    #[test]
    fn test_stop_word_mentions_look_for_no_antecedent() {
        let mut doc = Document::new("t");
        let root = doc.add_sentence();
        let s = doc.add_constituent(root, "S");
        let john = doc.add_constituent(s, "NP");
        doc.add_word(john, "John", "NNP");
        let vp = doc.add_constituent(s, "VP");
        doc.add_word(vp, "saw", "VBD");
        let this = doc.add_constituent(vp, "NP");
        doc.add_word(this, "this", "DT");
        doc.finish_sentence(root);
        for id in [john, this] {
            let attrs = &mut doc.node_mut(id).attrs;
            attrs.person = Person::Third;
            attrs.number = Number::Singular;
        }
        doc.node_mut(john).attrs.mention_type = Some(MentionType::Proper);
        doc.node_mut(this).attrs.mention_type = Some(MentionType::Pronoun);

        let sieve = PronounMatch::new();
        assert!(sieve.options().no_stop_words);
        assert_eq!(
            resolve_pronouns(&doc, &[john, this]),
            vec![vec![john], vec![this]]
        );
        // The pair itself would be accepted
        let language = Language::english();
        let mut entities = EntityArena::new();
        entities.seed(john, doc.node(john).span);
        entities.seed(this, doc.node(this).span);
        let order = vec![vec![john, this]];
        let ctx = SieveContext {
            graph: &doc,
            language: &language,
            entities: &entities,
            textual_order: &order,
            candidate_order: &order,
        };
        assert!(!sieve.validate(&ctx, this));
        assert!(sieve.are_coreferent(&ctx, this, john));
    }

    #[test]
    fn test_third_person_links() {
        let f = fixture();
        with_ctx(&f, |ctx| {
            assert!(PronounMatch::new().are_coreferent(ctx, f.his, f.john));
        });
    }

    #[test]
    fn test_possessive_restrictions() {
        let f = fixture();
        with_ctx(&f, |ctx| {
            // "his" cannot refer to the noun phrase it starts
            assert!(!PronounMatch::rules().are_coreferent(ctx, f.his, f.mother));
            assert!(PronounMatch::rules().are_coreferent(ctx, f.his, f.john));
            assert!(!PronounMatch::forbid_possessives().are_coreferent(ctx, f.his, f.john));
        });
    }

    #[test]
    fn test_non_pronoun_not_resolved() {
        let f = fixture();
        with_ctx(&f, |ctx| {
            assert!(!PronounMatch::new().are_coreferent(ctx, f.mother, f.john));
        });
    }

    #[test]
    fn test_sentence_prefix_ordering() {
        let f = fixture();
        with_ctx(&f, |ctx| {
            let sieve = PronounMatch::sentence_prefix();
            assert_eq!(sieve.ordering(), PronounOrdering::SentencePrefix);
            // "his mother" does not start before "his" ends
            let candidates = sieve.candidates(ctx, 1, f.his);
            assert_eq!(candidates, vec![f.john, f.you]);

            let plain = PronounMatch::new().candidates(ctx, 1, f.his);
            assert_eq!(plain, vec![f.mother, f.john, f.you]);
        });
    }

    #[test]
    fn test_clause_ordering() {
        let f = fixture();
        with_ctx(&f, |ctx| {
            let candidates = PronounMatch::clause_first().candidates(ctx, 1, f.his);
            assert_eq!(candidates, vec![f.john, f.you]);
        });
    }

    #[test]
    fn test_distance_limit() {
        let order = vec![vec![NodeId(1)], vec![NodeId(2)], vec![NodeId(3)], vec![NodeId(4)], vec![NodeId(5)]];
        assert_eq!(earlier_sentences(&order, 4, Some(3)), vec![NodeId(4), NodeId(3), NodeId(2)]);
        assert_eq!(earlier_sentences(&order, 4, None).len(), 4);
    }
}
