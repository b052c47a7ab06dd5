//! # Axon Lexicon
//!
//! The typed term hierarchy underneath the Axon knowledge store.
//!
//! Every name the engine manipulates — a type, an entity, a verb, or a rule
//! variable — is interned here exactly once and addressed by a [`TermId`]
//! handle. The lexicon answers the hierarchy questions the matching engine
//! asks while routing facts:
//!
//! - which types is this term an instance of (`type_ancestors`)?
//! - which entities does this entity specialize (`instance_ancestors`)?
//! - does this name denote a rule variable, and over what range?
//!
//! The hierarchy is rooted: every type descends from `thing` and every verb
//! descends from `exists`.

pub mod error;
pub mod lexicon;
pub mod term;

pub use error::LexiconError;
pub use lexicon::Lexicon;
pub use term::{ArgSlot, TermEntry, TermId, TermKind};
