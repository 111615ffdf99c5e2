//! Candidate extractor
//!
//! Per sentence:
//! 1. Named entities and gold mentions are anchored on tree constituents
//! 2. The mention strategy visits the tree through the catch/filter gate
//! 3. The candidate strategy re-visits the tree keeping accepted mentions
//!
//! No state survives between sentences.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, warn};

use coref_core::{Alignment, DocumentGraph, Language, NodeId, Span, TagSet};

use crate::diagnostics::{Classification, Diagnostics, Stage, NO_RULE};
use crate::{Anchors, Catcher, Filter, TraversalStrategy};

/// Mentions of one sentence in both orders
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SentenceMentions {
    /// Order used by sieves when searching antecedents
    pub candidate_order: Vec<NodeId>,
    /// Order used to seed entities
    pub textual_order: Vec<NodeId>,
}

#[derive(Default)]
struct SentenceState {
    claimed: HashSet<Span>,
    accepted: HashSet<NodeId>,
    named_entity_spans: Vec<Span>,
    named_entities: Vec<NodeId>,
    gold_spans: HashSet<Span>,
    gold_mentions: Vec<(Span, String)>,
    invalid: Vec<NodeId>,
    diagnostics: Option<Diagnostics>,
}

/// Extracts mentions sentence by sentence
pub struct CandidateExtractor {
    language: Arc<Language>,
    catchers: Vec<Box<dyn Catcher>>,
    filters: Vec<Box<dyn Filter>>,
    mention_strategy: Box<dyn TraversalStrategy>,
    candidate_strategy: Box<dyn TraversalStrategy>,
    soft_filters: bool,
    gold_boundaries: bool,
    diagnostics: Option<Diagnostics>,
}

impl CandidateExtractor {
    /// Create a new extractor without catchers or filters
    pub fn new(
        language: Arc<Language>,
        mention_strategy: Box<dyn TraversalStrategy>,
        candidate_strategy: Box<dyn TraversalStrategy>,
    ) -> Self {
        Self {
            language,
            catchers: Vec::new(),
            filters: Vec::new(),
            mention_strategy,
            candidate_strategy,
            soft_filters: false,
            gold_boundaries: false,
            diagnostics: None,
        }
    }

    /// Set catchers, tried in order
    pub fn with_catchers(mut self, catchers: Vec<Box<dyn Catcher>>) -> Self {
        self.catchers = catchers;
        self
    }

    /// Set filters, applied in order
    pub fn with_filters(mut self, filters: Vec<Box<dyn Filter>>) -> Self {
        self.filters = filters;
        self
    }

    /// Mark filtered mentions invalid instead of dropping them
    pub fn with_soft_filters(mut self, soft: bool) -> Self {
        self.soft_filters = soft;
        self
    }

    /// Anchor gold mentions in the tree
    pub fn with_gold_boundaries(mut self, gold_boundaries: bool) -> Self {
        self.gold_boundaries = gold_boundaries;
        self
    }

    /// Enable diagnostics collection
    pub fn with_diagnostics(mut self, diagnostics: Diagnostics) -> Self {
        self.diagnostics = Some(diagnostics);
        self
    }

    /// Collected diagnostics, if enabled
    pub fn diagnostics(&self) -> Option<&Diagnostics> {
        self.diagnostics.as_ref()
    }

    /// Take the collected diagnostics, if enabled
    pub fn take_diagnostics(&mut self) -> Option<Diagnostics> {
        self.diagnostics.take()
    }

    /// Extract the mentions of a sentence
    pub fn process_sentence(&mut self, graph: &mut dyn DocumentGraph, root: NodeId) -> SentenceMentions {
        let mut state = SentenceState {
            diagnostics: self.diagnostics.take(),
            ..Default::default()
        };
        let mut anchors = Anchors::default();

        self.process_named_entities(graph, root, &mut state, &mut anchors);
        self.process_gold_mentions(graph, root, &mut state, &mut anchors);

        let syntax_root = graph.skip_root(root);
        let tags = self.language.tags.as_ref();
        let view: &dyn DocumentGraph = &*graph;

        let textual_order = {
            let mut gate = |node: NodeId, prev: &[NodeId]| self.validate_node(view, node, prev, &mut state);
            self.mention_strategy
                .extract(view, tags, syntax_root, &anchors, &mut gate)
        };
        let candidate_order = {
            let accepted = &state.accepted;
            let mut check = |node: NodeId, _: &[NodeId]| accepted.contains(&node);
            self.candidate_strategy
                .extract(view, tags, syntax_root, &anchors, &mut check)
        };

        for &id in &state.invalid {
            graph.node_mut(id).attrs.invalid = true;
        }

        if let Some(diagnostics) = state.diagnostics.as_mut() {
            for (span, label) in &state.gold_mentions {
                let found = diagnostics.contains(Stage::Catch, Classification::TruePositive, *span)
                    || diagnostics.contains(Stage::Filter, Classification::FalsePositive, *span)
                    || diagnostics.contains(Stage::Catch, Classification::FalseNegative, *span);
                if !found {
                    diagnostics.record(Stage::Catch, NO_RULE, Classification::FalseNegative, *span, label);
                }
            }
        }
        self.diagnostics = state.diagnostics.take();

        debug!(
            sentence = %graph.node(root).label,
            mentions = textual_order.len(),
            candidates = candidate_order.len(),
            "Sentence extracted"
        );
        SentenceMentions {
            candidate_order,
            textual_order,
        }
    }

    // ========================================================================
    // Catch / filter gate
    // ========================================================================

    fn validate_node(
        &self,
        graph: &dyn DocumentGraph,
        id: NodeId,
        prev: &[NodeId],
        state: &mut SentenceState,
    ) -> bool {
        let span = graph.node(id).span;
        let claimed = state.claimed.contains(&span);
        if !self.catch(graph, id, claimed, state) {
            return false;
        }
        if self.filter_candidate(graph, id, prev, state) {
            return false;
        }
        state.claimed.insert(span);
        state.accepted.insert(id);
        true
    }

    fn catch(&self, graph: &dyn DocumentGraph, id: NodeId, claimed: bool, state: &mut SentenceState) -> bool {
        let node = graph.node(id);
        let is_gold = state.gold_spans.contains(&node.span);

        for catcher in &self.catchers {
            if claimed && catcher.unique() {
                continue;
            }
            if catcher.catch(graph, &self.language, id, &state.named_entity_spans) {
                if let Some(diagnostics) = state.diagnostics.as_mut() {
                    diagnostics.retract(Stage::Catch, Classification::FalseNegative, node.span);
                    let class = if is_gold {
                        Classification::TruePositive
                    } else {
                        Classification::FalsePositive
                    };
                    diagnostics.record(Stage::Catch, catcher.name(), class, node.span, &node.label);
                }
                debug!(
                    form = %node.form,
                    id = %node.label,
                    catcher = catcher.name(),
                    "Mention accepted"
                );
                return true;
            }
        }

        if !claimed && is_gold {
            if let Some(diagnostics) = state.diagnostics.as_mut() {
                diagnostics.record(Stage::Catch, NO_RULE, Classification::FalseNegative, node.span, &node.label);
            }
        }
        false
    }

    fn filter_candidate(
        &self,
        graph: &dyn DocumentGraph,
        id: NodeId,
        prev: &[NodeId],
        state: &mut SentenceState,
    ) -> bool {
        let node = graph.node(id);
        let is_gold = state.gold_spans.contains(&node.span);

        for filter in &self.filters {
            if !filter.filter(graph, &self.language, id, prev) {
                continue;
            }
            if let Some(diagnostics) = state.diagnostics.as_mut() {
                let class = if is_gold {
                    Classification::FalsePositive
                } else {
                    Classification::TruePositive
                };
                diagnostics.record(Stage::Filter, filter.name(), class, node.span, &node.label);
            }
            if self.soft_filters {
                debug!(form = %node.form, filter = filter.name(), "Mention marked invalid");
                state.invalid.push(id);
                return false;
            }
            debug!(form = %node.form, filter = filter.name(), "Mention filtered");
            return true;
        }

        if let Some(diagnostics) = state.diagnostics.as_mut() {
            let class = if is_gold {
                Classification::TrueNegative
            } else {
                Classification::FalseNegative
            };
            diagnostics.record(Stage::Filter, NO_RULE, class, node.span, &node.label);
        }
        false
    }

    // ========================================================================
    // External allocation
    // ========================================================================

    fn process_named_entities(
        &self,
        graph: &mut dyn DocumentGraph,
        root: NodeId,
        state: &mut SentenceState,
        anchors: &mut Anchors,
    ) {
        for entity in graph.sentence_named_entities(root) {
            let constituent = match graph.node(entity).constituent {
                Some(constituent) => Some(constituent),
                None => self.allocate(graph, entity, root),
            };
            let ner = graph.node(entity).ner.clone();
            if let Some(head) = graph.head_word(entity) {
                graph.node_mut(head).head_of_ner = ner.clone();
            }
            if !ner.as_deref().is_some_and(|n| self.language.tags.is_mention_ner(n)) {
                continue;
            }
            state.named_entity_spans.push(graph.node(entity).span);
            state.named_entities.push(entity);
            if let Some(constituent) = constituent {
                anchors.named_entities.entry(constituent).or_default().push(entity);
            }
        }
    }

    fn process_gold_mentions(
        &self,
        graph: &mut dyn DocumentGraph,
        root: NodeId,
        state: &mut SentenceState,
        anchors: &mut Anchors,
    ) {
        for gold in graph.sentence_gold_mentions(root) {
            let span = graph.node(gold).span;
            state.gold_spans.insert(span);
            state.gold_mentions.push((span, graph.node(gold).label.clone()));
            if !self.gold_boundaries {
                continue;
            }

            let constituent = if let Some(constituent) = graph.node(gold).constituent {
                Some(constituent)
            } else if state.named_entity_spans.contains(&span) {
                let paired = state.named_entities.iter().copied().find(|ne| {
                    let ne = graph.node(*ne);
                    ne.span == span && ne.constituent.is_some()
                });
                match paired {
                    Some(entity) => Self::inherit_named_entity(graph, gold, entity),
                    None => {
                        let constituent = self.allocate(graph, gold, root);
                        graph.node_mut(gold).alignment = Some(Alignment::NamedEntityFailed);
                        warn!(
                            mention = %graph.node(gold).label,
                            form = %graph.node(gold).form,
                            "Gold mention allocation: named entity pairing failed"
                        );
                        constituent
                    }
                }
            } else {
                self.allocate(graph, gold, root)
            };

            if let Some(constituent) = constituent {
                anchors.gold_mentions.entry(constituent).or_default().push(gold);
            }
        }
    }

    fn inherit_named_entity(graph: &mut dyn DocumentGraph, gold: NodeId, entity: NodeId) -> Option<NodeId> {
        let ne = graph.node(entity).clone();
        let constituent = ne.constituent?;
        if let Some(root) = ne.root {
            graph.link_root(gold, root);
        }
        if let Some(head) = graph.head_word(entity) {
            graph.set_head(gold, head);
        }
        let node = graph.node_mut(gold);
        node.constituent = Some(constituent);
        node.utterance = ne.utterance;
        node.quoted = ne.quoted;
        node.speaker = ne.speaker;
        node.ner = ne.ner;
        node.alignment = Some(Alignment::through_named_entity(ne.alignment));
        debug!(mention = %node.label, "Gold mention allocation: named entity paired");
        Some(constituent)
    }

    /// Anchor an external node on a constituent
    fn allocate(&self, graph: &mut dyn DocumentGraph, external: NodeId, root: NodeId) -> Option<NodeId> {
        let tags = self.language.tags.as_ref();
        let span = graph.node(external).span;

        let (constituent, head, alignment) = match span_constituent(graph, tags, root, span) {
            Some(constituent) => (constituent, graph.head_word(constituent)?, Alignment::Fitted),
            None => {
                let words = graph.words(external);
                let head = plausible_head(graph, tags, &words)?;
                let constituent = plausible_constituent(graph, tags, head, span);
                (constituent, head, Alignment::Plausible)
            }
        };

        let anchor_root = graph.root_of(constituent).unwrap_or(root);
        graph.link_root(external, anchor_root);
        graph.set_head(external, head);

        let anchor = graph.node(constituent);
        let (utterance, quoted, speaker) = (anchor.utterance, anchor.quoted, anchor.speaker.clone());
        let node = graph.node_mut(external);
        node.constituent = Some(constituent);
        node.alignment = Some(alignment);
        node.utterance = utterance;
        node.quoted = quoted;
        node.speaker = speaker;
        debug!(form = %node.form, ?alignment, "Allocated external node");
        Some(constituent)
    }
}

/// Non-root tree node with exactly `span`, searched depth first
fn span_constituent(graph: &dyn DocumentGraph, tags: &dyn TagSet, root: NodeId, span: Span) -> Option<NodeId> {
    let mut stack = graph.children_sorted(root);
    while let Some(id) = stack.pop() {
        let node = graph.node(id);
        if !tags.is_root(node.tag_str()) && node.span == span {
            return Some(id);
        }
        if span.is_inside(&node.span) {
            stack.extend(graph.children_sorted(id));
        }
    }
    None
}

/// Rightmost head-candidate word, or the last word
fn plausible_head(graph: &dyn DocumentGraph, tags: &dyn TagSet, words: &[NodeId]) -> Option<NodeId> {
    words
        .iter()
        .rev()
        .find(|w| tags.is_head_candidate(graph.node(**w).pos_str()))
        .or(words.last())
        .copied()
}

/// Highest noun phrase of the chain headed by `head` that stays inside `span`
fn plausible_constituent(graph: &dyn DocumentGraph, tags: &dyn TagSet, head: NodeId, span: Span) -> NodeId {
    let mut valid = head;
    let mut current = graph.parent(head);
    while let Some(constituent) = current {
        let node = graph.node(constituent);
        if graph.head_word(constituent) != Some(head)
            || !tags.is_noun_phrase(node.tag_str())
            || !node.span.is_inside(&span)
        {
            break;
        }
        valid = constituent;
        current = graph.parent(constituent);
    }
    valid
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catchers::{ConstituentCatcher, GoldCatcher, NamedEntitiesCatcher, PronounCatcher};
    use crate::filters::{InterjectionFilter, PleonasticFilter, SameHeadFilter};
    use crate::Traversal;
    use coref_graph::loader::load_tree;
    use coref_graph::Document;

    fn extractor() -> CandidateExtractor {
        CandidateExtractor::new(
            Arc::new(Language::english()),
            Box::new(Traversal::breadth_first()),
            Box::new(Traversal::breadth_first()),
        )
        .with_catchers(vec![
            Box::new(NamedEntitiesCatcher),
            Box::new(ConstituentCatcher::new()),
            Box::new(PronounCatcher::new()),
        ])
        .with_filters(vec![Box::new(InterjectionFilter), Box::new(SameHeadFilter::new())])
    }

    fn john_smith() -> (Document, NodeId) {
        let mut doc = Document::new("t");
        let root = load_tree(
            &mut doc,
            "(ROOT (S (NP (NNP John) (NNP Smith)) (VP (VBD met) (NP (PRP her)))))",
        )
        .unwrap();
        (doc, root)
    }

    fn forms(doc: &Document, ids: &[NodeId]) -> Vec<String> {
        ids.iter().map(|id| doc.node(*id).form.clone()).collect()
    }

    #[test]
    fn test_named_entity_claims_span() {
        let (mut doc, root) = john_smith();
        let ne = doc.add_named_entity(root, Span::new(0, 1), "PERSON").unwrap();

        let mentions = extractor().process_sentence(&mut doc, root);
        assert_eq!(mentions.textual_order.len(), 2);
        assert_eq!(mentions.textual_order[0], ne);
        assert_eq!(forms(&doc, &mentions.textual_order), vec!["John Smith", "her"]);
        assert_eq!(doc.node(ne).alignment, Some(Alignment::Fitted));

        let head = doc.head_word(ne).unwrap();
        assert_eq!(doc.node(head).form, "Smith");
        assert_eq!(doc.node(head).head_of_ner.as_deref(), Some("PERSON"));
    }

    #[test]
    fn test_span_uniqueness() {
        let (mut doc, root) = john_smith();
        let mentions = extractor().process_sentence(&mut doc, root);
        let mut spans: Vec<Span> = mentions
            .textual_order
            .iter()
            .map(|id| doc.node(*id).span)
            .collect();
        let total = spans.len();
        spans.sort();
        spans.dedup();
        assert_eq!(spans.len(), total);
        assert_eq!(forms(&doc, &mentions.textual_order), vec!["John Smith", "her"]);
    }

    #[test]
    fn test_candidate_order_keeps_accepted_only() {
        let (mut doc, root) = john_smith();
        let mut extractor = CandidateExtractor::new(
            Arc::new(Language::english()),
            Box::new(Traversal::breadth_first()),
            Box::new(Traversal::deep_first()),
        )
        .with_catchers(vec![Box::new(ConstituentCatcher::new()), Box::new(PronounCatcher::new())]);
        let mentions = extractor.process_sentence(&mut doc, root);

        let mut a = mentions.textual_order.clone();
        let mut b = mentions.candidate_order.clone();
        a.sort();
        b.sort();
        assert_eq!(a, b);
    }

    #[test]
    fn test_extraction_is_deterministic() {
        let (mut doc, root) = john_smith();
        let first = extractor().process_sentence(&mut doc, root);
        let second = extractor().process_sentence(&mut doc, root);
        assert_eq!(first, second);
    }

    #[test]
    fn test_interjection_never_extracted() {
        let mut doc = Document::new("t");
        let root = load_tree(&mut doc, "(ROOT (FRAG (NP (UH Um)) (, ,) (NP (NN nobody))))").unwrap();
        let mentions = extractor().process_sentence(&mut doc, root);
        assert_eq!(forms(&doc, &mentions.textual_order), vec!["nobody"]);
    }

    #[test]
    fn test_soft_filter_marks_invalid() {
        let mut doc = Document::new("t");
        let root = load_tree(&mut doc, "(ROOT (FRAG (NP (UH Um)) (, ,) (NP (NN nobody))))").unwrap();
        let mentions = extractor()
            .with_soft_filters(true)
            .process_sentence(&mut doc, root);
        assert_eq!(forms(&doc, &mentions.textual_order), vec!["Um", "nobody"]);
        assert!(doc.node(mentions.textual_order[0]).attrs.invalid);
        assert!(!doc.node(mentions.textual_order[1]).attrs.invalid);
    }

    /// A soft-filtered mention stays visible to later filters of the sentence
    #[test]
    fn test_soft_filtered_mention_visible_to_later_filters() {
        let tree = "(ROOT (S (NP (NP (DT the) (NN president)) (PP (IN of) (NP (NNP France)))) (VP (VBD spoke))))";
        let build = || {
            let mut doc = Document::new("t");
            let root = load_tree(&mut doc, tree).unwrap();
            let outer = doc.nodes_with_span(root, Span::new(0, 3))[0];
            doc.node_mut(outer).attrs.pleonastic = true;
            (doc, root)
        };
        let make = |soft: bool| {
            CandidateExtractor::new(
                Arc::new(Language::english()),
                Box::new(Traversal::breadth_first()),
                Box::new(Traversal::breadth_first()),
            )
            .with_catchers(vec![Box::new(ConstituentCatcher::new())])
            .with_filters(vec![Box::new(PleonasticFilter), Box::new(SameHeadFilter::new())])
            .with_soft_filters(soft)
        };

        let (mut doc, root) = build();
        let hard = make(false).process_sentence(&mut doc, root);
        assert_eq!(forms(&doc, &hard.textual_order), vec!["the president", "France"]);

        let (mut doc, root) = build();
        let soft = make(true).process_sentence(&mut doc, root);
        assert_eq!(
            forms(&doc, &soft.textual_order),
            vec!["the president of France", "the president", "France"]
        );
        let invalid: Vec<bool> = soft
            .textual_order
            .iter()
            .map(|id| doc.node(*id).attrs.invalid)
            .collect();
        assert_eq!(invalid, vec![true, true, false]);
    }

    #[test]
    fn test_plausible_allocation() {
        let (mut doc, root) = john_smith();
        let ne = doc.add_named_entity(root, Span::new(0, 2), "MISC").unwrap();
        extractor().process_sentence(&mut doc, root);

        assert_eq!(doc.node(ne).alignment, Some(Alignment::Plausible));
        let anchor = doc.node(ne).constituent.unwrap();
        assert_eq!(doc.node(anchor).form, "John Smith");
        assert_eq!(doc.node(doc.head_word(ne).unwrap()).form, "Smith");
    }

    #[test]
    fn test_gold_mention_pairs_with_named_entity() {
        let (mut doc, root) = john_smith();
        doc.add_named_entity(root, Span::new(0, 1), "PERSON").unwrap();
        let gold = doc.add_gold_mention(root, Span::new(0, 1), "1", false).unwrap();

        let mut extractor = extractor().with_gold_boundaries(true);
        extractor.process_sentence(&mut doc, root);
        assert_eq!(doc.node(gold).alignment, Some(Alignment::NamedEntityFitted));
        assert_eq!(doc.node(gold).ner.as_deref(), Some("PERSON"));
    }

    #[test]
    fn test_gold_mention_offered_before_anchor() {
        let (mut doc, root) = john_smith();
        let gold = doc.add_gold_mention(root, Span::new(3, 3), "1", false).unwrap();
        let mut extractor = CandidateExtractor::new(
            Arc::new(Language::english()),
            Box::new(Traversal::breadth_first()),
            Box::new(Traversal::breadth_first()),
        )
        .with_catchers(vec![Box::new(ConstituentCatcher::new()), Box::new(GoldCatcher::new())])
        .with_gold_boundaries(true);

        let mentions = extractor.process_sentence(&mut doc, root);
        let her_np = doc.node(gold).constituent.unwrap();
        assert_eq!(doc.node(gold).alignment, Some(Alignment::Fitted));
        assert!(mentions.textual_order.contains(&gold));
        assert!(!mentions.textual_order.contains(&her_np));
    }

    #[test]
    fn test_claimed_span_only_tries_non_unique_catchers() {
        let (mut doc, root) = john_smith();
        let gold = doc.add_gold_mention(root, Span::new(3, 3), "1", false).unwrap();
        let her_np = doc.nodes_with_span(root, Span::new(3, 3))[0];
        let extractor = CandidateExtractor::new(
            Arc::new(Language::english()),
            Box::new(Traversal::breadth_first()),
            Box::new(Traversal::breadth_first()),
        )
        .with_catchers(vec![Box::new(ConstituentCatcher::new()), Box::new(GoldCatcher::new())]);

        let mut state = SentenceState::default();
        state.claimed.insert(Span::new(3, 3));
        assert!(!extractor.validate_node(&doc, her_np, &[], &mut state));
        assert!(extractor.validate_node(&doc, gold, &[], &mut state));
        assert!(state.accepted.contains(&gold));
    }

    #[test]
    fn test_diagnostics_classification() {
        let (mut doc, root) = john_smith();
        doc.add_named_entity(root, Span::new(0, 1), "PERSON").unwrap();
        doc.add_gold_mention(root, Span::new(0, 1), "1", false).unwrap();
        doc.add_gold_mention(root, Span::new(2, 2), "2", false).unwrap();

        let mut extractor = extractor().with_diagnostics(Diagnostics::new());
        extractor.process_sentence(&mut doc, root);
        let diagnostics = extractor.take_diagnostics().unwrap();

        let caught = diagnostics.records(Stage::Catch, "NamedEntitiesCatcher", Classification::TruePositive);
        assert_eq!(caught.len(), 1);
        assert_eq!(caught[0].span, Span::new(0, 1));

        let wrong = diagnostics.records(Stage::Catch, "ConstituentCatcher", Classification::FalsePositive);
        assert_eq!(wrong[0].span, Span::new(3, 3));

        assert!(diagnostics.contains(Stage::Catch, Classification::FalseNegative, Span::new(2, 2)));
        assert!(diagnostics.contains(Stage::Filter, Classification::TrueNegative, Span::new(0, 1)));
    }

    #[test]
    fn test_no_diagnostics_by_default() {
        let (mut doc, root) = john_smith();
        let mut extractor = extractor();
        extractor.process_sentence(&mut doc, root);
        assert!(extractor.diagnostics().is_none());
    }
}
