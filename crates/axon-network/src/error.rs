//! Error types for network operations.

use axon_facts::JsonlError;
use axon_lexicon::LexiconError;

/// Errors surfaced by [`crate::Network::add_fact`] and
/// [`crate::Network::add_rule`].
///
/// Deliberately absent: a failing condition predicate. That aborts only the
/// one activation being fired (it is logged, not raised), so a misbehaving
/// condition can never take down the surrounding dispatch pass.
#[derive(Debug, thiserror::Error)]
pub enum NetworkError {
    #[error(transparent)]
    Lexicon(#[from] LexiconError),

    #[error(transparent)]
    Storage(#[from] JsonlError),

    #[error("unknown verb in predicate: {0}")]
    UnknownVerb(String),

    #[error("fact is not ground: {0}")]
    NonGroundFact(String),

    #[error("verb `{verb}` does not declare argument label `{label}`")]
    UnknownLabel { verb: String, label: String },

    #[error("argument `{label}` of `{verb}` expects an instance of `{expected}`, got `{actual}`")]
    ArgTypeMismatch {
        verb: String,
        label: String,
        expected: String,
        actual: String,
    },

    #[error("variable `{0}` is not bound by any premise")]
    UnboundVariable(String),

    #[error("rule `{0}` has no premises")]
    EmptyRule(String),

    #[error("duplicate rule: {0}")]
    DuplicateRule(String),

    #[error("derivation budget of {limit} exceeded; rule set may not converge")]
    DerivationBudgetExceeded { limit: usize },
}
