//! Coref Core - Document model, collaborator traits, and shared types
//!
//! This crate defines the abstractions used throughout the coreference
//! pipeline:
//! - Spans, node identifiers and the fixed node annotation model
//! - The `DocumentGraph` collaborator trait (tree navigation and output sink)
//! - Language resources (tag sets and lexicons)
//! - Common error types
//! - Configuration management

pub mod config;
pub mod lang;

pub use config::{ConfigError, CorefConfig, LoggingConfig, PipelineConfig};
pub use lang::{English, Language, Lexicon, PennTreebank, TagSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Core error types for coreference operations
#[derive(Error, Debug)]
pub enum CorefError {
    #[error("Unknown {kind} in configuration: {name}")]
    UnknownRule { kind: RuleKind, name: String },

    #[error("Unknown language: {0}")]
    UnknownLanguage(String),

    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, CorefError>;

/// The rule families that can be named in a pipeline configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    Catcher,
    Filter,
    Sieve,
    Purge,
    Strategy,
}

impl std::fmt::Display for RuleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Catcher => write!(f, "catcher"),
            Self::Filter => write!(f, "filter"),
            Self::Sieve => write!(f, "sieve"),
            Self::Purge => write!(f, "purge"),
            Self::Strategy => write!(f, "extraction strategy"),
        }
    }
}

// ============================================================================
// Spans and Identifiers
// ============================================================================

/// Inclusive word-offset range of a node
///
/// Spans order lexicographically by `(start, end)`, which is the document
/// order used everywhere in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    /// Create a new span
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Span of a single word
    pub fn word(position: usize) -> Self {
        Self::new(position, position)
    }

    /// Check if this span lies inside `container` (bounds inclusive)
    pub fn is_inside(&self, container: &Span) -> bool {
        container.start <= self.start && self.end <= container.end
    }

    /// Check if the spans share at least one word
    pub fn overlaps(&self, other: &Span) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    /// Number of words covered
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start) + 1
    }

    /// Always false
    ///
    /// Both bounds are inclusive, so even `Span::new(n, n)` covers one word.
    /// Loaders reject `start > end` before a span is built.
    pub fn is_empty(&self) -> bool {
        false
    }
}

impl std::fmt::Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.start, self.end)
    }
}

/// Index of a node inside a document graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub usize);

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "n{}", self.0)
    }
}

// ============================================================================
// Node Annotations
// ============================================================================

/// What a node stands for in the document graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// Sentence root
    Root,
    /// Syntactic constituent
    Constituent,
    /// Terminal word
    Word,
    /// Named entity produced by an external tagger
    NamedEntity,
    /// Gold-standard mention from an annotated corpus
    GoldMention,
}

/// Grammatical gender
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    #[default]
    Unknown,
    Male,
    Female,
    Neutral,
}

/// Grammatical number
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Number {
    #[default]
    Unknown,
    Singular,
    Plural,
}

/// Grammatical person
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Person {
    #[default]
    Unknown,
    First,
    Second,
    Third,
}

/// Animacy of the referent
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Animacy {
    #[default]
    Unknown,
    Animate,
    Inanimate,
}

/// Surface class of a mention
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MentionType {
    Pronoun,
    Proper,
    Nominal,
    Enumeration,
}

/// How an external node (named entity or gold mention) was anchored in the tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Alignment {
    /// A constituent with exactly the same span exists
    Fitted,
    /// Anchored on the highest NP sharing a plausible head word
    Plausible,
    /// Gold mention paired with a fitted named entity
    NamedEntityFitted,
    /// Gold mention paired with a plausibly anchored named entity
    NamedEntityPlausible,
    /// Gold mention expected a named entity but pairing failed
    NamedEntityFailed,
}

impl Alignment {
    /// Alignment inherited by a gold mention paired with a named entity
    pub fn through_named_entity(named_entity: Option<Alignment>) -> Self {
        match named_entity {
            Some(Self::Fitted) => Self::NamedEntityFitted,
            Some(Self::Plausible) => Self::NamedEntityPlausible,
            _ => Self::NamedEntityFailed,
        }
    }
}

/// Annotation slots filled by later pipeline stages
///
/// Every slot has a sentinel (`Unknown`, `None`, `false`) so missing
/// annotations never fail a rule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Attributes {
    pub mention_type: Option<MentionType>,
    pub gender: Gender,
    pub number: Number,
    pub person: Person,
    pub animacy: Animacy,
    pub pleonastic: bool,
    pub demonym: bool,
    pub predicative_nominative: bool,
    /// Set by soft filters instead of discarding the mention
    pub invalid: bool,
}

/// A node of the document graph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,

    /// External identifier (e.g. `w12`, `c4`, `ne1`, `3#0`)
    pub label: String,

    pub kind: NodeKind,

    pub span: Span,

    /// Surface form (words joined by spaces)
    pub form: String,

    /// Part-of-speech tag (words)
    pub pos: Option<String>,

    /// Constituent tag (constituents and roots)
    pub tag: Option<String>,

    /// Named entity label
    pub ner: Option<String>,

    /// Terminal head word
    pub head: Option<NodeId>,

    pub parent: Option<NodeId>,

    pub children: Vec<NodeId>,

    /// Sentence root this node belongs to
    pub root: Option<NodeId>,

    /// Tree anchor chosen for an external node
    pub constituent: Option<NodeId>,

    pub alignment: Option<Alignment>,

    /// Utterance index inside the document (0 is narration)
    pub utterance: u32,

    pub quoted: bool,

    pub speaker: Option<String>,

    /// Mention node of the previous speaker, when known
    pub prev_speaker: Option<NodeId>,

    /// Gold entity identifier (gold mentions only)
    pub gold_entity: Option<String>,

    /// Gold mention annotated as a singleton
    pub singleton: bool,

    /// NER label of the named entity this word heads
    pub head_of_ner: Option<String>,

    pub attrs: Attributes,
}

impl Node {
    /// Create a new node with empty annotations
    pub fn new(id: NodeId, kind: NodeKind, label: impl Into<String>, span: Span) -> Self {
        Self {
            id,
            label: label.into(),
            kind,
            span,
            form: String::new(),
            pos: None,
            tag: None,
            ner: None,
            head: None,
            parent: None,
            children: Vec::new(),
            root: None,
            constituent: None,
            alignment: None,
            utterance: 0,
            quoted: false,
            speaker: None,
            prev_speaker: None,
            gold_entity: None,
            singleton: false,
            head_of_ner: None,
            attrs: Attributes::default(),
        }
    }

    /// Set surface form
    pub fn with_form(mut self, form: impl Into<String>) -> Self {
        self.form = form.into();
        self
    }

    /// Set part-of-speech tag
    pub fn with_pos(mut self, pos: impl Into<String>) -> Self {
        self.pos = Some(pos.into());
        self
    }

    /// Set constituent tag
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Set named entity label
    pub fn with_ner(mut self, ner: impl Into<String>) -> Self {
        self.ner = Some(ner.into());
        self
    }

    /// POS tag or the empty string
    pub fn pos_str(&self) -> &str {
        self.pos.as_deref().unwrap_or("")
    }

    /// Constituent tag or the empty string
    pub fn tag_str(&self) -> &str {
        self.tag.as_deref().unwrap_or("")
    }

    /// NER label or the empty string
    pub fn ner_str(&self) -> &str {
        self.ner.as_deref().unwrap_or("")
    }

    pub fn is_word(&self) -> bool {
        self.kind == NodeKind::Word
    }

    /// Whether the characterizer classified this node as a pronoun mention
    pub fn is_pronoun_mention(&self) -> bool {
        self.attrs.mention_type == Some(MentionType::Pronoun)
    }
}

/// A resolved coreference cluster as handed to the output sink
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorefEntity {
    /// Sequential identifier (`EN0`, `EN1`, ...)
    pub id: String,

    /// Member mentions in document order
    pub mentions: Vec<NodeId>,
}

// ============================================================================
// Traits
// ============================================================================

/// Document graph collaborator consumed by the pipeline
///
/// The pipeline reads the syntactic trees, anchors external nodes with the
/// two mutators and reports resolved clusters through
/// [`DocumentGraph::add_coref_entity`]. Implementations guarantee that every
/// `NodeId` they hand out is valid.
pub trait DocumentGraph {
    /// Get a node
    fn node(&self, id: NodeId) -> &Node;

    /// Get a node for annotation
    fn node_mut(&mut self, id: NodeId) -> &mut Node;

    /// Sentence roots in document order
    fn sentences(&self) -> Vec<NodeId>;

    /// Syntactic children sorted by span
    fn children_sorted(&self, id: NodeId) -> Vec<NodeId>;

    /// Syntactic parent
    fn parent(&self, id: NodeId) -> Option<NodeId>;

    /// Terminal head word (a word is its own head)
    fn head_word(&self, id: NodeId) -> Option<NodeId>;

    /// Words covered by the node, in order
    fn words(&self, id: NodeId) -> Vec<NodeId>;

    /// Sentence root of a node
    fn root_of(&self, id: NodeId) -> Option<NodeId>;

    /// Descend through artificial root wrappers to the real syntax root
    fn skip_root(&self, root: NodeId) -> NodeId;

    /// All words of a sentence, in order
    fn sentence_words(&self, root: NodeId) -> Vec<NodeId>;

    /// Named entities of a sentence
    fn sentence_named_entities(&self, root: NodeId) -> Vec<NodeId>;

    /// Gold mentions of a sentence
    fn sentence_gold_mentions(&self, root: NodeId) -> Vec<NodeId>;

    /// Gold mentions of the whole document
    fn all_gold_mentions(&self) -> Vec<NodeId>;

    /// Attach a terminal head to a node
    fn set_head(&mut self, node: NodeId, head: NodeId);

    /// Attach a node to a sentence root
    fn link_root(&mut self, node: NodeId, root: NodeId);

    /// Output sink for a resolved cluster
    fn add_coref_entity(&mut self, entity_id: String, mentions: Vec<NodeId>);
}

// ============================================================================
// Tests
// ============================================================================
