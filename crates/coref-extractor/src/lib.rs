//! Coref Extractor - Mention extraction pipeline
//!
//! Turns the syntactic trees of a document into ordered mention lists:
//! - Catchers decide whether a node is a mention candidate
//! - Filters reject caught candidates given the sentence context
//! - Traversal strategies decide the visiting order
//! - The candidate extractor drives them sentence by sentence
//! - Diagnostics classify every decision against gold annotations

use std::collections::HashMap;

use coref_core::{DocumentGraph, Language, NodeId, Span, TagSet};

/// Trait for mention catchers
pub trait Catcher: Send + Sync {
    /// Registry short name
    fn name(&self) -> &str;

    /// Ignore the "inside a named entity" exclusion
    fn soft_ne(&self) -> bool {
        false
    }

    /// Refuse spans already claimed in the sentence
    fn unique(&self) -> bool {
        true
    }

    /// Type-specific acceptance test
    fn catch_mention(&self, graph: &dyn DocumentGraph, language: &Language, candidate: NodeId) -> bool;

    /// Full acceptance test, including the named entity exclusion
    fn catch(
        &self,
        graph: &dyn DocumentGraph,
        language: &Language,
        candidate: NodeId,
        named_entity_spans: &[Span],
    ) -> bool {
        if !self.soft_ne() {
            let span = graph.node(candidate).span;
            if named_entity_spans.iter().any(|ne| span.is_inside(ne)) {
                return false;
            }
        }
        self.catch_mention(graph, language, candidate)
    }
}

/// Trait for mention filters
pub trait Filter: Send + Sync {
    /// Registry short name
    fn name(&self) -> &str;

    /// Return true if the mention must be rejected
    fn filter(
        &self,
        graph: &dyn DocumentGraph,
        language: &Language,
        mention: NodeId,
        prev_mentions: &[NodeId],
    ) -> bool;
}

/// External nodes (named entities, gold mentions) anchored per constituent
#[derive(Debug, Clone, Default)]
pub struct Anchors {
    pub gold_mentions: HashMap<NodeId, Vec<NodeId>>,
    pub named_entities: HashMap<NodeId, Vec<NodeId>>,
}

impl Anchors {
    /// Gold mentions anchored at a node
    pub fn gold_at(&self, node: NodeId) -> &[NodeId] {
        self.gold_mentions.get(&node).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Named entities anchored at a node
    pub fn named_entities_at(&self, node: NodeId) -> &[NodeId] {
        self.named_entities.get(&node).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Node validation callback: `(node, order so far) -> accepted`
pub type Validator<'a> = dyn FnMut(NodeId, &[NodeId]) -> bool + 'a;

/// Trait for traversal strategies
pub trait TraversalStrategy: Send + Sync {
    /// Registry short name
    fn name(&self) -> &str;

    /// Visit the tree under `root` and return accepted nodes in visiting order
    fn extract(
        &self,
        graph: &dyn DocumentGraph,
        tags: &dyn TagSet,
        root: NodeId,
        anchors: &Anchors,
        validate: &mut Validator<'_>,
    ) -> Vec<NodeId>;
}

pub mod catchers;
pub mod diagnostics;
pub mod extractor;
pub mod filters;
pub mod traversal;

pub use diagnostics::{Classification, DiagnosticRecord, Diagnostics, DiagnosticsSummary, Stage, StageMetrics};
pub use extractor::{CandidateExtractor, SentenceMentions};
pub use traversal::{Order, Roots, Traversal};
