//! Coref Graph - In-memory document graph
//!
//! Provides the `DocumentGraph` implementation used by the CLI and tests:
//! - `Document`: arena of sentence trees, named entities and gold mentions
//! - Head finding for constituents
//! - Loading from bracketed trees and JSON documents

pub mod document;
pub mod heads;
pub mod loader;

pub use document::Document;
pub use loader::{DocumentInput, ExternalSpan, SentenceInput, SpanAnnotation, SpeakerMention};

use coref_core::CorefError;
use thiserror::Error;

/// Errors raised while building a document graph
#[derive(Error, Debug)]
pub enum GraphError {
    #[error("Malformed tree at token {position}: {message}")]
    MalformedTree { position: usize, message: String },

    #[error("Span ({start}, {end}) out of sentence bounds (0..{len})")]
    SpanOutOfBounds { start: usize, end: usize, len: usize },

    #[error("Previous speaker of sentence {sentence} points at later sentence {target}")]
    SpeakerAfterSentence { sentence: usize, target: usize },

    #[error("No node covers the previous speaker span ({start}, {end}) of sentence {sentence}")]
    SpeakerNotFound { sentence: usize, start: usize, end: usize },

    #[error("Failed to parse document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to read document: {0}")]
    Io(#[from] std::io::Error),
}

impl From<GraphError> for CorefError {
    fn from(err: GraphError) -> Self {
        CorefError::InvalidDocument(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, GraphError>;
