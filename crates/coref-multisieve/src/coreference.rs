//! Per-document coreference pipeline
//!
//! Extraction sentence by sentence, then characterization, multi-sieve
//! resolution and purging over the whole text.

use std::sync::Arc;

use tracing::info;

use coref_core::{CorefEntity, DocumentGraph, Language, NodeId};
use coref_extractor::{CandidateExtractor, Diagnostics};

use crate::features::characterize;
use crate::processor::MultiSieveProcessor;
use crate::purges::PurgeStage;

/// Coreference processor for a single document
///
/// Built fresh for every document by the registry; nothing is shared with
/// other documents except the language resources.
pub struct CoreferenceProcessor {
    language: Arc<Language>,
    extractor: CandidateExtractor,
    sieves: MultiSieveProcessor,
    purges: PurgeStage,
    textual_order: Vec<Vec<NodeId>>,
    candidate_order: Vec<Vec<NodeId>>,
    diagnostics: Option<Diagnostics>,
}

impl CoreferenceProcessor {
    pub fn new(
        language: Arc<Language>,
        extractor: CandidateExtractor,
        sieves: MultiSieveProcessor,
        purges: PurgeStage,
    ) -> Self {
        Self {
            language,
            extractor,
            sieves,
            purges,
            textual_order: Vec::new(),
            candidate_order: Vec::new(),
            diagnostics: None,
        }
    }

    /// Extract the mentions of the next sentence
    pub fn process_sentence(&mut self, graph: &mut dyn DocumentGraph, root: NodeId) {
        let mentions = self.extractor.process_sentence(graph, root);
        self.textual_order.push(mentions.textual_order);
        self.candidate_order.push(mentions.candidate_order);
    }

    /// Resolve the sentences processed so far
    pub fn resolve_text(&mut self, graph: &mut dyn DocumentGraph) -> Vec<CorefEntity> {
        for &mention in self.textual_order.iter().flatten() {
            characterize(graph, &self.language, mention);
        }

        let mut diagnostics = self.extractor.take_diagnostics();
        let proposal = self.sieves.process(
            &*graph,
            &self.language,
            &self.textual_order,
            &self.candidate_order,
            diagnostics.as_mut(),
        );
        let entities = self
            .purges
            .post_process(graph, &self.language, proposal, diagnostics.as_mut());
        self.diagnostics = diagnostics;
        entities
    }

    /// Extract every sentence of the document and resolve it
    pub fn resolve_document(&mut self, graph: &mut dyn DocumentGraph) -> Vec<CorefEntity> {
        let sentences = graph.sentences();
        for &root in &sentences {
            self.process_sentence(graph, root);
        }
        let entities = self.resolve_text(graph);
        info!(
            sentences = sentences.len(),
            mentions = self.mention_count(),
            entities = entities.len(),
            "Document resolved"
        );
        entities
    }

    /// Number of extracted mentions
    pub fn mention_count(&self) -> usize {
        self.textual_order.iter().map(Vec::len).sum()
    }

    /// Mentions per sentence, in textual order
    pub fn textual_order(&self) -> &[Vec<NodeId>] {
        &self.textual_order
    }

    /// Mentions per sentence, in candidate order
    pub fn candidate_order(&self) -> &[Vec<NodeId>] {
        &self.candidate_order
    }

    /// Diagnostics of the last resolution, if collected
    pub fn diagnostics(&self) -> Option<&Diagnostics> {
        self.diagnostics.as_ref()
    }

    pub fn take_diagnostics(&mut self) -> Option<Diagnostics> {
        self.diagnostics.take()
    }
}
