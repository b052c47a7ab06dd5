//! Error types for lexicon operations.

/// Errors raised while building or querying the term hierarchy.
#[derive(Debug, thiserror::Error)]
pub enum LexiconError {
    /// A term id or name that is not interned.
    #[error("unknown term: {0}")]
    UnknownTerm(String),

    /// The name is already taken by another term.
    #[error("duplicate term: {0}")]
    DuplicateTerm(String),

    /// An operation was given a term of the wrong kind, e.g. an entity
    /// offered as the base of a type.
    #[error("kind mismatch: {0}")]
    KindMismatch(String),

    /// A name that does not follow the variable naming convention was
    /// interned as a variable.
    #[error("invalid variable name: {0}")]
    InvalidVariable(String),

    /// A variable name whose alphabetic head does not name a known term.
    #[error("variable `{name}` has unknown range `{range}`")]
    UnknownRange { name: String, range: String },
}
