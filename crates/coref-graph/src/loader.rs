//! Document loader
//!
//! Builds a `Document` from bracketed constituency trees (Penn style) and a
//! small JSON envelope carrying discourse data, named entities, gold
//! mentions and optional attribute annotations. External spans in the JSON
//! are sentence-local word offsets.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use coref_core::{Attributes, DocumentGraph, NodeId, Span};

use crate::{Document, GraphError, Result};

const TRACE_TAG: &str = "-NONE-";
const ROOT_LABELS: &[&str] = &["", "ROOT", "TOP", "root", "top"];

// ============================================================================
// JSON Input
// ============================================================================

/// A parsed document ready to be resolved
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentInput {
    pub id: String,
    pub sentences: Vec<SentenceInput>,
}

/// One sentence with its tree and externals
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentenceInput {
    /// Bracketed constituency tree
    pub tree: String,

    #[serde(default)]
    pub speaker: Option<String>,

    #[serde(default)]
    pub utterance: u32,

    #[serde(default)]
    pub quoted: bool,

    /// Mention of whoever spoke before this utterance
    #[serde(default)]
    pub previous_speaker: Option<SpeakerMention>,

    #[serde(default)]
    pub named_entities: Vec<ExternalSpan>,

    #[serde(default)]
    pub gold_mentions: Vec<ExternalSpan>,

    #[serde(default)]
    pub annotations: Vec<SpanAnnotation>,
}

/// Named entity or gold mention over sentence-local offsets
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalSpan {
    pub start: usize,
    pub end: usize,

    /// NER label (named entities)
    #[serde(default)]
    pub ner: Option<String>,

    /// Gold entity identifier (gold mentions)
    #[serde(default)]
    pub entity: Option<String>,

    #[serde(default)]
    pub singleton: bool,
}

/// Sentence-local span of a mention in this or an earlier sentence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeakerMention {
    /// Index of the sentence holding the mention
    pub sentence: usize,
    pub start: usize,
    pub end: usize,
}

/// Attribute values for every node covering a sentence-local span
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpanAnnotation {
    pub start: usize,
    pub end: usize,

    #[serde(flatten)]
    pub attrs: Attributes,
}

impl DocumentInput {
    /// Parse a JSON document
    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Read a JSON document from disk
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Build the document graph
    pub fn into_document(self) -> Result<Document> {
        let mut doc = Document::new(&self.id);
        let mut roots = Vec::with_capacity(self.sentences.len());
        for (index, sentence) in self.sentences.iter().enumerate() {
            let root = load_tree(&mut doc, &sentence.tree)?;
            roots.push(root);
            doc.set_discourse(root, sentence.speaker.clone(), sentence.utterance, sentence.quoted);

            for ne in &sentence.named_entities {
                let ner = ne.ner.as_deref().unwrap_or("O");
                doc.add_named_entity(root, Span::new(ne.start, ne.end), ner)?;
            }
            for (index, gold) in sentence.gold_mentions.iter().enumerate() {
                let entity = gold
                    .entity
                    .clone()
                    .unwrap_or_else(|| format!("{}_{index}", doc.sentences().len()));
                doc.add_gold_mention(root, Span::new(gold.start, gold.end), &entity, gold.singleton)?;
            }
            for annotation in &sentence.annotations {
                let span = doc.sentence_span(root, Span::new(annotation.start, annotation.end))?;
                for id in doc.nodes_with_span(root, span) {
                    doc.node_mut(id).attrs = annotation.attrs.clone();
                }
            }
            if let Some(speaker) = &sentence.previous_speaker {
                let speaker = resolve_speaker(&doc, &roots, index, speaker)?;
                doc.set_prev_speaker(root, speaker);
            }
        }
        debug!(
            document = %doc.id,
            sentences = self.sentences.len(),
            words = doc.word_count(),
            "Document loaded"
        );
        Ok(doc)
    }
}

/// Outermost node covering the speaker span
fn resolve_speaker(doc: &Document, roots: &[NodeId], sentence: usize, speaker: &SpeakerMention) -> Result<NodeId> {
    let Some(&root) = roots.get(speaker.sentence) else {
        return Err(GraphError::SpeakerAfterSentence {
            sentence,
            target: speaker.sentence,
        });
    };
    let span = doc.sentence_span(root, Span::new(speaker.start, speaker.end))?;
    doc.nodes_with_span(root, span)
        .first()
        .copied()
        .ok_or(GraphError::SpeakerNotFound {
            sentence: speaker.sentence,
            start: speaker.start,
            end: speaker.end,
        })
}

// ============================================================================
// Bracketed Trees
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
struct Tree {
    label: String,
    word: Option<String>,
    children: Vec<Tree>,
}

fn tokenize(input: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    for c in input.chars() {
        match c {
            '(' | ')' => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
                tokens.push(c.to_string());
            }
            c if c.is_whitespace() => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

struct Parser {
    tokens: Vec<String>,
    position: usize,
}

impl Parser {
    fn error(&self, message: impl Into<String>) -> GraphError {
        GraphError::MalformedTree {
            position: self.position,
            message: message.into(),
        }
    }

    fn peek(&self) -> Option<&str> {
        self.tokens.get(self.position).map(String::as_str)
    }

    fn expect(&mut self, token: &str) -> Result<()> {
        match self.peek() {
            Some(t) if t == token => {
                self.position += 1;
                Ok(())
            }
            Some(t) => Err(self.error(format!("expected '{token}', found '{t}'"))),
            None => Err(self.error(format!("expected '{token}', found end of input"))),
        }
    }

    fn parse(&mut self) -> Result<Tree> {
        self.expect("(")?;
        let label = match self.peek() {
            Some("(") | Some(")") | None => String::new(),
            Some(label) => {
                let label = label.to_string();
                self.position += 1;
                label
            }
        };

        let mut tree = Tree {
            label,
            word: None,
            children: Vec::new(),
        };
        loop {
            match self.peek() {
                Some("(") => tree.children.push(self.parse()?),
                Some(")") => {
                    self.position += 1;
                    break;
                }
                Some(word) => {
                    if tree.word.is_some() || !tree.children.is_empty() {
                        return Err(self.error(format!("unexpected word '{word}'")));
                    }
                    tree.word = Some(word.to_string());
                    self.position += 1;
                }
                None => return Err(self.error("unbalanced parentheses")),
            }
        }
        if tree.word.is_none() && tree.children.is_empty() {
            return Err(self.error(format!("empty constituent '{}'", tree.label)));
        }
        Ok(tree)
    }
}

fn parse_tree(input: &str) -> Result<Tree> {
    let mut parser = Parser {
        tokens: tokenize(input),
        position: 0,
    };
    let tree = parser.parse()?;
    if parser.position != parser.tokens.len() {
        return Err(parser.error("trailing tokens after tree"));
    }
    Ok(tree)
}

fn is_trace(tree: &Tree) -> bool {
    tree.label == TRACE_TAG || (tree.word.is_none() && tree.children.iter().all(is_trace))
}

fn attach(doc: &mut Document, parent: NodeId, tree: &Tree) {
    if is_trace(tree) {
        return;
    }
    match &tree.word {
        Some(word) => {
            doc.add_word(parent, word.as_str(), tree.label.as_str());
        }
        None => {
            let id = doc.add_constituent(parent, tree.label.as_str());
            for child in &tree.children {
                attach(doc, id, child);
            }
        }
    }
}

/// Parse a bracketed tree and append it as a new sentence
pub fn load_tree(doc: &mut Document, input: &str) -> Result<NodeId> {
    let tree = parse_tree(input)?;
    let root = doc.add_sentence();
    if ROOT_LABELS.contains(&tree.label.as_str()) && tree.word.is_none() {
        for child in &tree.children {
            attach(doc, root, child);
        }
    } else {
        attach(doc, root, &tree);
    }
    if doc.sentence_words(root).is_empty() {
        return Err(GraphError::MalformedTree {
            position: 0,
            message: "sentence without words".to_string(),
        });
    }
    doc.finish_sentence(root);
    Ok(root)
}
