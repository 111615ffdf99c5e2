//! Document arena
//!
//! Nodes are stored in a single vector and addressed by `NodeId`. Words get
//! document-global positions in insertion order, so spans of every node are
//! global too.

use std::collections::HashMap;

use coref_core::{CorefEntity, DocumentGraph, Node, NodeId, NodeKind, Span};

use crate::heads;
use crate::{GraphError, Result};

const ROOT_TAGS: &[&str] = &["ROOT", "TOP", "root", "top"];

// ============================================================================
// Document
// ============================================================================

/// In-memory document graph
#[derive(Debug, Clone, Default)]
pub struct Document {
    /// Document identifier
    pub id: String,

    nodes: Vec<Node>,
    sentences: Vec<NodeId>,
    sentence_words: HashMap<NodeId, Vec<NodeId>>,
    named_entities: HashMap<NodeId, Vec<NodeId>>,
    gold_mentions: HashMap<NodeId, Vec<NodeId>>,
    coref_entities: Vec<CorefEntity>,
    next_word: usize,
    constituent_count: usize,
}

impl Document {
    /// Create a new empty document
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    fn push(&mut self, node: Node) -> NodeId {
        let id = node.id;
        self.nodes.push(node);
        id
    }

    fn next_id(&self) -> NodeId {
        NodeId(self.nodes.len())
    }

    /// Open a new sentence and return its root
    pub fn add_sentence(&mut self) -> NodeId {
        let id = self.next_id();
        let label = format!("s{}", self.sentences.len());
        let mut node = Node::new(id, NodeKind::Root, label, Span::word(self.next_word))
            .with_tag("ROOT");
        node.root = Some(id);
        self.push(node);
        self.sentences.push(id);
        self.sentence_words.insert(id, Vec::new());
        id
    }

    /// Add a constituent under `parent`
    pub fn add_constituent(&mut self, parent: NodeId, tag: impl Into<String>) -> NodeId {
        let id = self.next_id();
        let label = format!("c{}", self.constituent_count);
        self.constituent_count += 1;
        let mut node = Node::new(id, NodeKind::Constituent, label, Span::word(self.next_word))
            .with_tag(tag);
        node.parent = Some(parent);
        node.root = self.nodes[parent.0].root;
        self.push(node);
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Add a word under `parent`, at the next document position
    pub fn add_word(
        &mut self,
        parent: NodeId,
        form: impl Into<String>,
        pos: impl Into<String>,
    ) -> NodeId {
        let id = self.next_id();
        let position = self.next_word;
        self.next_word += 1;

        let mut node = Node::new(id, NodeKind::Word, format!("w{position}"), Span::word(position))
            .with_form(form)
            .with_pos(pos);
        node.parent = Some(parent);
        node.root = self.nodes[parent.0].root;
        node.head = Some(id);
        let root = node.root;
        self.push(node);
        self.nodes[parent.0].children.push(id);
        if let Some(root) = root {
            self.sentence_words.entry(root).or_default().push(id);
        }
        id
    }

    /// Close a sentence: compute spans, forms and heads bottom-up
    pub fn finish_sentence(&mut self, root: NodeId) {
        let mut post_order = Vec::new();
        let mut stack = vec![(root, false)];
        while let Some((id, expanded)) = stack.pop() {
            if expanded {
                post_order.push(id);
                continue;
            }
            stack.push((id, true));
            for &child in self.nodes[id.0].children.iter().rev() {
                stack.push((child, false));
            }
        }

        for id in post_order {
            if self.nodes[id.0].is_word() {
                continue;
            }
            let children = self.nodes[id.0].children.clone();
            if children.is_empty() {
                continue;
            }
            let start = children.iter().map(|c| self.nodes[c.0].span.start).min();
            let end = children.iter().map(|c| self.nodes[c.0].span.end).max();
            if let (Some(start), Some(end)) = (start, end) {
                self.nodes[id.0].span = Span::new(start, end);
            }
            let form = children
                .iter()
                .map(|c| self.nodes[c.0].form.as_str())
                .filter(|f| !f.is_empty())
                .collect::<Vec<_>>()
                .join(" ");
            self.nodes[id.0].form = form;

            let head = heads::head_child(self, id).and_then(|child| self.nodes[child.0].head);
            self.nodes[id.0].head = head;
        }
    }

    /// Sentence-local span to document span
    fn global_span(&self, root: NodeId, local: Span) -> Result<Span> {
        let words = self.sentence_words.get(&root).map(Vec::len).unwrap_or(0);
        if local.start > local.end || local.end >= words {
            return Err(GraphError::SpanOutOfBounds {
                start: local.start,
                end: local.end,
                len: words,
            });
        }
        let offset = self.nodes[root.0].span.start;
        Ok(Span::new(offset + local.start, offset + local.end))
    }

    fn external(&mut self, root: NodeId, kind: NodeKind, label: String, local: Span) -> Result<NodeId> {
        let span = self.global_span(root, local)?;
        let id = self.next_id();
        let form = self.span_form(root, span);
        let sentence = &self.nodes[root.0];
        let mut node = Node::new(id, kind, label, span).with_form(form);
        node.root = Some(root);
        node.utterance = sentence.utterance;
        node.quoted = sentence.quoted;
        node.speaker = sentence.speaker.clone();
        Ok(self.push(node))
    }

    /// Add a named entity over a sentence-local span
    pub fn add_named_entity(&mut self, root: NodeId, local: Span, ner: &str) -> Result<NodeId> {
        let label = format!("ne{}", self.named_entities.values().map(Vec::len).sum::<usize>());
        let id = self.external(root, NodeKind::NamedEntity, label, local)?;
        self.nodes[id.0].ner = Some(ner.to_string());
        self.named_entities.entry(root).or_default().push(id);
        Ok(id)
    }

    /// Add a gold mention of `entity` over a sentence-local span
    pub fn add_gold_mention(
        &mut self,
        root: NodeId,
        local: Span,
        entity: &str,
        singleton: bool,
    ) -> Result<NodeId> {
        let index = self
            .gold_mentions
            .values()
            .flatten()
            .filter(|m| self.nodes[m.0].gold_entity.as_deref() == Some(entity))
            .count();
        let label = format!("{entity}#{index}");
        let id = self.external(root, NodeKind::GoldMention, label, local)?;
        self.nodes[id.0].gold_entity = Some(entity.to_string());
        self.nodes[id.0].singleton = singleton;
        self.gold_mentions.entry(root).or_default().push(id);
        Ok(id)
    }

    /// Set discourse context shared by every node of a sentence
    pub fn set_discourse(&mut self, root: NodeId, speaker: Option<String>, utterance: u32, quoted: bool) {
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let node = &mut self.nodes[id.0];
            node.speaker = speaker.clone();
            node.utterance = utterance;
            node.quoted = quoted;
            stack.extend(node.children.iter().copied());
        }
        for id in self.externals(root) {
            let node = &mut self.nodes[id.0];
            node.speaker = speaker.clone();
            node.utterance = utterance;
            node.quoted = quoted;
        }
    }

    /// Record the node standing for the previous speaker on every node of a sentence
    pub fn set_prev_speaker(&mut self, root: NodeId, speaker: NodeId) {
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let node = &mut self.nodes[id.0];
            node.prev_speaker = Some(speaker);
            stack.extend(node.children.iter().copied());
        }
        for id in self.externals(root) {
            self.nodes[id.0].prev_speaker = Some(speaker);
        }
    }

    /// Every node of a sentence (tree and externals) whose span equals `span`
    pub fn nodes_with_span(&self, root: NodeId, span: Span) -> Vec<NodeId> {
        let mut found = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let node = &self.nodes[id.0];
            if node.span == span && node.kind != NodeKind::Root {
                found.push(id);
            }
            stack.extend(node.children.iter().copied());
        }
        found.extend(
            self.externals(root)
                .into_iter()
                .filter(|id| self.nodes[id.0].span == span),
        );
        found.sort();
        found
    }

    /// Resolve a sentence-local span
    pub fn sentence_span(&self, root: NodeId, local: Span) -> Result<Span> {
        self.global_span(root, local)
    }

    fn externals(&self, root: NodeId) -> Vec<NodeId> {
        let mut ids = self.named_entities.get(&root).cloned().unwrap_or_default();
        ids.extend(self.gold_mentions.get(&root).cloned().unwrap_or_default());
        ids
    }

    fn span_form(&self, root: NodeId, span: Span) -> String {
        self.sentence_words
            .get(&root)
            .map(|words| {
                words
                    .iter()
                    .map(|w| &self.nodes[w.0])
                    .filter(|w| w.span.is_inside(&span))
                    .map(|w| w.form.as_str())
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .unwrap_or_default()
    }

    /// All nodes in the arena
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Number of words in the document
    pub fn word_count(&self) -> usize {
        self.next_word
    }

    /// Clusters received through the output sink
    pub fn coref_entities(&self) -> &[CorefEntity] {
        &self.coref_entities
    }
}

// ============================================================================
// DocumentGraph Implementation
// ============================================================================

impl DocumentGraph for Document {
    fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    fn sentences(&self) -> Vec<NodeId> {
        self.sentences.clone()
    }

    fn children_sorted(&self, id: NodeId) -> Vec<NodeId> {
        let mut children = self.nodes[id.0].children.clone();
        children.sort_by_key(|c| (self.nodes[c.0].span, c.0));
        children
    }

    fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    fn head_word(&self, id: NodeId) -> Option<NodeId> {
        let node = &self.nodes[id.0];
        if node.is_word() {
            Some(id)
        } else {
            node.head
        }
    }

    fn words(&self, id: NodeId) -> Vec<NodeId> {
        let node = &self.nodes[id.0];
        if node.is_word() {
            return vec![id];
        }
        node.root
            .and_then(|root| self.sentence_words.get(&root))
            .map(|words| {
                words
                    .iter()
                    .copied()
                    .filter(|w| self.nodes[w.0].span.is_inside(&node.span))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn root_of(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].root
    }

    fn skip_root(&self, root: NodeId) -> NodeId {
        let mut current = root;
        loop {
            let node = &self.nodes[current.0];
            let wrapper = node.kind == NodeKind::Root || ROOT_TAGS.contains(&node.tag_str());
            match node.children.as_slice() {
                [only] if wrapper && !self.nodes[only.0].is_word() => current = *only,
                _ => return current,
            }
        }
    }

    fn sentence_words(&self, root: NodeId) -> Vec<NodeId> {
        self.sentence_words.get(&root).cloned().unwrap_or_default()
    }

    fn sentence_named_entities(&self, root: NodeId) -> Vec<NodeId> {
        self.named_entities.get(&root).cloned().unwrap_or_default()
    }

    fn sentence_gold_mentions(&self, root: NodeId) -> Vec<NodeId> {
        self.gold_mentions.get(&root).cloned().unwrap_or_default()
    }

    fn all_gold_mentions(&self) -> Vec<NodeId> {
        self.sentences
            .iter()
            .flat_map(|root| self.sentence_gold_mentions(*root))
            .collect()
    }

    fn set_head(&mut self, node: NodeId, head: NodeId) {
        self.nodes[node.0].head = Some(head);
    }

    fn link_root(&mut self, node: NodeId, root: NodeId) {
        self.nodes[node.0].root = Some(root);
    }

    fn add_coref_entity(&mut self, entity_id: String, mentions: Vec<NodeId>) {
        self.coref_entities.push(CorefEntity {
            id: entity_id,
            mentions,
        });
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    /// (ROOT (S (NP (DT The) (NN dog)) (VP (VBD barked))))
    fn sample() -> (Document, NodeId) {
        let mut doc = Document::new("test");
        let root = doc.add_sentence();
        let s = doc.add_constituent(root, "S");
        let np = doc.add_constituent(s, "NP");
        doc.add_word(np, "The", "DT");
        doc.add_word(np, "dog", "NN");
        let vp = doc.add_constituent(s, "VP");
        doc.add_word(vp, "barked", "VBD");
        doc.finish_sentence(root);
        (doc, root)
    }

    #[test]
    fn test_spans_and_forms() {
        let (doc, root) = sample();
        assert_eq!(doc.node(root).span, Span::new(0, 2));
        assert_eq!(doc.node(root).form, "The dog barked");
        assert_eq!(doc.sentence_words(root).len(), 3);
    }

    #[test]
    fn test_heads() {
        let (doc, root) = sample();
        let s = doc.skip_root(root);
        assert_eq!(doc.node(s).tag_str(), "S");
        let np = doc.children_sorted(s)[0];
        let head = doc.head_word(np).unwrap();
        assert_eq!(doc.node(head).form, "dog");
        let s_head = doc.head_word(s).unwrap();
        assert_eq!(doc.node(s_head).form, "barked");
    }

    #[test]
    fn test_second_sentence_offsets() {
        let (mut doc, _) = sample();
        let root = doc.add_sentence();
        let np = doc.add_constituent(root, "NP");
        doc.add_word(np, "It", "PRP");
        doc.finish_sentence(root);
        assert_eq!(doc.node(root).span, Span::new(3, 3));

        let ne = doc.add_named_entity(root, Span::new(0, 0), "O").unwrap();
        assert_eq!(doc.node(ne).span, Span::new(3, 3));
        assert_eq!(doc.node(ne).form, "It");
        assert!(doc.add_named_entity(root, Span::new(0, 1), "O").is_err());
    }

    #[test]
    fn test_gold_labels_and_words() {
        let (mut doc, root) = sample();
        let first = doc.add_gold_mention(root, Span::new(0, 1), "7", false).unwrap();
        let second = doc.add_gold_mention(root, Span::new(1, 1), "7", false).unwrap();
        assert_eq!(doc.node(first).label, "7#0");
        assert_eq!(doc.node(second).label, "7#1");
        assert_eq!(doc.words(first).len(), 2);
        assert_eq!(doc.all_gold_mentions(), vec![first, second]);
    }

    #[test]
    fn test_output_sink() {
        let (mut doc, _) = sample();
        doc.add_coref_entity("EN0".to_string(), vec![NodeId(2)]);
        assert_eq!(doc.coref_entities().len(), 1);
        assert_eq!(doc.coref_entities()[0].id, "EN0");
    }
}
