//! Multi-sieve processor
//!
//! Seeds one entity per mention and lets each sieve, most precise first,
//! merge entities. Merges are never undone.

use std::time::Instant;

use tracing::{debug, info};

use coref_core::{DocumentGraph, Language, NodeId};
use coref_extractor::Diagnostics;

use crate::entity::EntityArena;
use crate::sieves::{resolve, Sieve, SieveOutcome};

/// Ordered list of sieves
pub struct MultiSieveProcessor {
    sieves: Vec<Box<dyn Sieve>>,
}

impl MultiSieveProcessor {
    pub fn new(sieves: Vec<Box<dyn Sieve>>) -> Self {
        Self { sieves }
    }

    /// Sieve names in run order
    pub fn names(&self) -> Vec<String> {
        self.sieves.iter().map(|s| s.name().to_string()).collect()
    }

    /// Resolve a document and return the partition ordered by entity key
    pub fn process(
        &self,
        graph: &dyn DocumentGraph,
        language: &Language,
        textual_order: &[Vec<NodeId>],
        candidate_order: &[Vec<NodeId>],
        diagnostics: Option<&mut Diagnostics>,
    ) -> Vec<Vec<NodeId>> {
        let (entities, outcomes) = self.run(graph, language, textual_order, candidate_order);
        if let Some(diagnostics) = diagnostics {
            for outcome in &outcomes {
                diagnostics.add_sieve_links(&outcome.sieve, outcome.links);
            }
        }
        entities.partition()
    }

    /// Run every sieve and keep the arena and per-sieve outcomes
    pub fn run(
        &self,
        graph: &dyn DocumentGraph,
        language: &Language,
        textual_order: &[Vec<NodeId>],
        candidate_order: &[Vec<NodeId>],
    ) -> (EntityArena, Vec<SieveOutcome>) {
        let start = Instant::now();
        let mut entities = EntityArena::new();
        for &mention in textual_order.iter().flatten() {
            entities.seed(mention, graph.node(mention).span);
        }
        info!(
            mentions = entities.mention_count(),
            sieves = self.sieves.len(),
            "Multi-sieve processing started"
        );

        let mut outcomes = Vec::with_capacity(self.sieves.len());
        for sieve in &self.sieves {
            let outcome = resolve(
                sieve.as_ref(),
                graph,
                language,
                &mut entities,
                textual_order,
                candidate_order,
            );
            debug!(
                sieve = %outcome.sieve,
                links = outcome.links,
                entities = entities.len(),
                "Sieve finished"
            );
            outcomes.push(outcome);
        }

        info!(
            entities = entities.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Multi-sieve processing finished"
        );
        (entities, outcomes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::characterize;
    use crate::sieves::{ExactStringMatch, PronounMatch};
    use coref_core::Span;
    use coref_graph::loader::load_tree;
    use coref_graph::Document;

    fn mention(doc: &Document, root: NodeId, start: usize, end: usize) -> NodeId {
        doc.nodes_with_span(root, Span::new(start, end))[0]
    }

    #[test]
    fn test_sieves_merge_in_order() {
        let mut doc = Document::new("t");
        let en = Language::english();
        let s0 = load_tree(&mut doc, "(ROOT (S (NP (NNP Microsoft)) (VP (VBD grew))))").unwrap();
        let s1 = load_tree(&mut doc, "(ROOT (S (NP (PRP It)) (VP (VBD hired) (NP (NNP Microsoft)))))").unwrap();
        let ms0 = mention(&doc, s0, 0, 0);
        let it = mention(&doc, s1, 2, 2);
        let ms1 = mention(&doc, s1, 4, 4);
        for m in [ms0, it, ms1] {
            characterize(&mut doc, &en, m);
        }
        let order = vec![vec![ms0], vec![it, ms1]];

        let processor = MultiSieveProcessor::new(vec![Box::new(ExactStringMatch::new()), Box::new(PronounMatch::new())]);
        let mut diagnostics = Diagnostics::new();
        let partition = processor.process(&doc, &en, &order, &order, Some(&mut diagnostics));

        assert_eq!(partition, vec![vec![ms0, it, ms1]]);
        assert_eq!(diagnostics.sieve_links.get("ESM"), Some(&1));
        assert_eq!(diagnostics.sieve_links.get("PNM"), Some(&1));
    }

    #[test]
    fn test_no_sieves_keeps_singletons() {
        let mut doc = Document::new("t");
        let root = load_tree(&mut doc, "(ROOT (S (NP (NNP John)) (VP (VBD met) (NP (NNP John)))))").unwrap();
        let a = mention(&doc, root, 0, 0);
        let b = mention(&doc, root, 2, 2);
        let order = vec![vec![a, b]];

        let processor = MultiSieveProcessor::new(Vec::new());
        let partition = processor.process(&doc, &Language::english(), &order, &order, None);
        assert_eq!(partition, vec![vec![a], vec![b]]);
    }

    #[test]
    fn test_partition_only_coarsens() {
        let mut doc = Document::new("t");
        let en = Language::english();
        let root = load_tree(
            &mut doc,
            "(ROOT (S (NP (NNP John)) (VP (VBD met) (NP (NNP John)) (PP (IN near) (NP (PRP him))))))",
        )
        .unwrap();
        let mentions: Vec<NodeId> = [(0, 0), (2, 2), (4, 4)]
            .iter()
            .map(|&(s, e)| mention(&doc, root, s, e))
            .collect();
        for &m in &mentions {
            characterize(&mut doc, &en, m);
        }
        let order = vec![mentions.clone()];

        let before = MultiSieveProcessor::new(vec![Box::new(ExactStringMatch::new())])
            .process(&doc, &en, &order, &order, None);
        let after = MultiSieveProcessor::new(vec![Box::new(ExactStringMatch::new()), Box::new(PronounMatch::new())])
            .process(&doc, &en, &order, &order, None);

        for cluster in &before {
            assert!(after.iter().any(|c| cluster.iter().all(|m| c.contains(m))));
        }
        assert!(after.len() <= before.len());
    }
}
