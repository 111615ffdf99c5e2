//! Coref Multi-Sieve - Deterministic coreference resolution
//!
//! Resolves the mentions extracted from a document into entities:
//! - Mentions are characterized (type, gender, number, person, animacy)
//! - Sieves merge entities, most precise first, never splitting them
//! - Purges drop or demote mentions and entities from the result
//! - The registry builds the whole pipeline from configured rule names
//!
//! ```ignore
//! let registry = Registry::with_defaults();
//! registry.validate(&config.pipeline)?;
//! let mut processor = registry.processor(&config.pipeline, language)?;
//! let entities = processor.resolve_document(&mut document);
//! ```

pub mod coreference;
pub mod entity;
pub mod features;
pub mod processor;
pub mod purges;
pub mod registry;
pub mod sieves;

pub use coreference::CoreferenceProcessor;
pub use entity::{EntityArena, EntityId};
pub use features::{characterize, is_enumeration};
pub use processor::MultiSieveProcessor;
pub use purges::{InvalidPurge, NumericPurge, PleonasticPurge, Purge, PurgeStage, SingletonPurge};
pub use registry::{Factory, Registry};
pub use sieves::{
    ExactStringMatch, PronounMatch, PronounOrdering, RelaxedStringMatch, Sieve, SieveContext, SieveOptions,
    SieveOutcome, StrictHeadMatch,
};
