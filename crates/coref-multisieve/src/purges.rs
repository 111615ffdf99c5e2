//! Purges and the purge stage
//!
//! Purges run after resolution. A purged mention is dropped, or in soft mode
//! re-emitted as its own singleton entity after the regular entities.

use std::collections::HashSet;

use tracing::{debug, info};

use coref_core::{CorefEntity, DocumentGraph, Language, NodeId, Span};
use coref_extractor::diagnostics::{Classification, Diagnostics, Stage, NO_RULE};

/// Trait for purge rules
pub trait Purge: Send + Sync {
    /// Registry short name
    fn name(&self) -> &str;

    /// Return true if the mention must leave its entity
    fn purge_mention(&self, _graph: &dyn DocumentGraph, _language: &Language, _mention: NodeId) -> bool {
        false
    }

    /// Return true if the whole entity must be discarded
    fn purge_entity(&self, _graph: &dyn DocumentGraph, _language: &Language, _mentions: &[NodeId]) -> bool {
        false
    }
}

// ============================================================================
// Built-in purges
// ============================================================================

/// Entities smaller than a minimum size
#[derive(Debug, Clone)]
pub struct SingletonPurge {
    min_size: usize,
}

impl SingletonPurge {
    pub fn new(min_size: usize) -> Self {
        Self { min_size }
    }
}

impl Default for SingletonPurge {
    fn default() -> Self {
        Self::new(2)
    }
}

impl Purge for SingletonPurge {
    fn name(&self) -> &str {
        "SingletonPurge"
    }

    fn purge_entity(&self, _graph: &dyn DocumentGraph, _language: &Language, mentions: &[NodeId]) -> bool {
        mentions.len() < self.min_size
    }
}

/// Mentions marked invalid by soft filters
#[derive(Debug, Clone, Default)]
pub struct InvalidPurge;

impl Purge for InvalidPurge {
    fn name(&self) -> &str {
        "InvalidPurge"
    }

    fn purge_mention(&self, graph: &dyn DocumentGraph, _language: &Language, mention: NodeId) -> bool {
        graph.node(mention).attrs.invalid
    }
}

/// Pleonastic mentions
#[derive(Debug, Clone, Default)]
pub struct PleonasticPurge;

impl Purge for PleonasticPurge {
    fn name(&self) -> &str {
        "PleonasticPurge"
    }

    fn purge_mention(&self, graph: &dyn DocumentGraph, _language: &Language, mention: NodeId) -> bool {
        graph.node(mention).attrs.pleonastic
    }
}

/// Mentions headed by a cardinal number
#[derive(Debug, Clone, Default)]
pub struct NumericPurge;

impl Purge for NumericPurge {
    fn name(&self) -> &str {
        "NumericPurge"
    }

    fn purge_mention(&self, graph: &dyn DocumentGraph, language: &Language, mention: NodeId) -> bool {
        graph
            .head_word(mention)
            .is_some_and(|head| language.tags.is_cardinal(graph.node(head).pos_str()))
    }
}

// ============================================================================
// Purge Stage
// ============================================================================

/// Applies purges to the sieve output and emits the final entities
pub struct PurgeStage {
    purges: Vec<Box<dyn Purge>>,
    soft: bool,
}

impl PurgeStage {
    pub fn new(purges: Vec<Box<dyn Purge>>, soft: bool) -> Self {
        if soft {
            info!("Purges in soft mode");
        }
        Self { purges, soft }
    }

    pub fn names(&self) -> Vec<String> {
        self.purges.iter().map(|p| p.name().to_string()).collect()
    }

    /// Purge the proposal and hand the surviving entities to the graph
    pub fn post_process(
        &self,
        graph: &mut dyn DocumentGraph,
        language: &Language,
        proposal: Vec<Vec<NodeId>>,
        mut diagnostics: Option<&mut Diagnostics>,
    ) -> Vec<CorefEntity> {
        info!(clusters = proposal.len(), "Post-processing coreference");
        let gold: HashSet<Span> = graph
            .all_gold_mentions()
            .into_iter()
            .map(|m| graph.node(m).span)
            .collect();

        let view: &dyn DocumentGraph = &*graph;
        let mut accepted: Vec<Vec<NodeId>> = Vec::new();
        let mut demoted: Vec<NodeId> = Vec::new();

        for entity in proposal {
            let mut mentions = Vec::new();
            for mention in entity {
                let node = view.node(mention);
                let is_gold = gold.contains(&node.span);
                match self.purges.iter().find(|p| p.purge_mention(view, language, mention)) {
                    Some(purge) => {
                        debug!(purge = purge.name(), form = %node.form, "Purged mention");
                        if self.soft {
                            demoted.push(mention);
                        }
                        if let Some(d) = diagnostics.as_deref_mut() {
                            let class = if is_gold {
                                Classification::FalsePositive
                            } else {
                                Classification::TruePositive
                            };
                            d.record(Stage::Purge, purge.name(), class, node.span, &node.label);
                        }
                    }
                    None => {
                        if let Some(d) = diagnostics.as_deref_mut() {
                            let class = if is_gold {
                                Classification::TrueNegative
                            } else {
                                Classification::FalseNegative
                            };
                            d.record(Stage::Purge, NO_RULE, class, node.span, &node.label);
                        }
                        mentions.push(mention);
                    }
                }
            }
            if mentions.is_empty() {
                continue;
            }

            match self.purges.iter().find(|p| p.purge_entity(view, language, &mentions)) {
                Some(purge) => {
                    debug!(purge = purge.name(), size = mentions.len(), "Purged entity");
                    for &mention in &mentions {
                        let node = view.node(mention);
                        if let Some(d) = diagnostics.as_deref_mut() {
                            d.retract(Stage::Purge, Classification::FalseNegative, node.span);
                            d.retract(Stage::Purge, Classification::TrueNegative, node.span);
                            let class = if gold.contains(&node.span) {
                                Classification::FalsePositive
                            } else {
                                Classification::TruePositive
                            };
                            d.record(Stage::Purge, purge.name(), class, node.span, &node.label);
                        }
                    }
                    if self.soft {
                        demoted.extend(mentions);
                    }
                }
                None => accepted.push(mentions),
            }
        }

        accepted.extend(demoted.into_iter().map(|mention| vec![mention]));
        let entities: Vec<CorefEntity> = accepted
            .into_iter()
            .enumerate()
            .map(|(index, mentions)| CorefEntity {
                id: format!("EN{index}"),
                mentions,
            })
            .collect();

        for entity in &entities {
            graph.add_coref_entity(entity.id.clone(), entity.mentions.clone());
        }
        info!(entities = entities.len(), "Indexed clusters");
        entities
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coref_graph::Document;

    fn document() -> (Document, Vec<NodeId>) {
        let mut doc = Document::new("t");
        let root = doc.add_sentence();
        let mut words = Vec::new();
        for (form, pos) in [("John", "NNP"), ("he", "PRP"), ("two", "CD"), ("it", "PRP")] {
            let np = doc.add_constituent(root, "NP");
            doc.add_word(np, form, pos);
            words.push(np);
        }
        doc.finish_sentence(root);
        (doc, words)
    }

    #[test]
    fn test_hard_purge() {
        let (mut doc, m) = document();
        let stage = PurgeStage::new(vec![Box::new(NumericPurge), Box::new(SingletonPurge::default())], false);
        let proposal = vec![vec![m[0], m[1], m[2]], vec![m[3]]];
        let entities = stage.post_process(&mut doc, &Language::english(), proposal, None);

        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].id, "EN0");
        assert_eq!(entities[0].mentions, vec![m[0], m[1]]);
        assert_eq!(doc.coref_entities().len(), 1);
    }

    #[test]
    fn test_soft_purge_conserves_mentions() {
        let (mut doc, m) = document();
        let stage = PurgeStage::new(vec![Box::new(NumericPurge), Box::new(SingletonPurge::default())], true);
        let proposal = vec![vec![m[0], m[1], m[2]], vec![m[3]]];
        let entities = stage.post_process(&mut doc, &Language::english(), proposal, None);

        let ids: Vec<&str> = entities.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["EN0", "EN1", "EN2"]);
        assert_eq!(entities[0].mentions, vec![m[0], m[1]]);
        assert_eq!(entities[1].mentions, vec![m[2]]);
        assert_eq!(entities[2].mentions, vec![m[3]]);
        let total: usize = entities.iter().map(|e| e.mentions.len()).sum();
        assert_eq!(total, 4);
    }

    #[test]
    fn test_purge_diagnostics() {
        let (mut doc, m) = document();
        let root = doc.sentences()[0];
        doc.add_gold_mention(root, Span::new(3, 3), "1", true).unwrap();
        let stage = PurgeStage::new(vec![Box::new(SingletonPurge::default())], false);
        let mut diagnostics = Diagnostics::new();
        stage.post_process(
            &mut doc,
            &Language::english(),
            vec![vec![m[0], m[1]], vec![m[3]]],
            Some(&mut diagnostics),
        );

        let wrong = diagnostics.records(Stage::Purge, "SingletonPurge", Classification::FalsePositive);
        assert_eq!(wrong.len(), 1);
        assert_eq!(wrong[0].span, Span::new(3, 3));
        assert!(diagnostics.contains(Stage::Purge, Classification::FalseNegative, Span::new(0, 0)));
        assert!(!diagnostics.contains(Stage::Purge, Classification::TrueNegative, Span::new(3, 3)));
    }

    #[test]
    fn test_invalid_and_pleonastic() {
        let (mut doc, m) = document();
        let en = Language::english();
        doc.node_mut(m[1]).attrs.invalid = true;
        doc.node_mut(m[3]).attrs.pleonastic = true;
        assert!(InvalidPurge.purge_mention(&doc, &en, m[1]));
        assert!(!InvalidPurge.purge_mention(&doc, &en, m[0]));
        assert!(PleonasticPurge.purge_mention(&doc, &en, m[3]));
    }
}
