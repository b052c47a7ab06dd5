//! Predicate values and content-addressed fact identity.

use axon_lexicon::{Lexicon, TermId, TermKind};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// One argument of a predicate: a term, or a nested predicate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Arg {
    Term(TermId),
    Pred(Predicate),
}

/// A predicate instance: a verb with labeled arguments, possibly negated.
///
/// Arguments are kept label-sorted (`BTreeMap`), which is what makes
/// decomposition deterministic per predicate shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Predicate {
    pub negated: bool,
    pub verb: TermId,
    pub args: BTreeMap<String, Arg>,
}

impl Predicate {
    pub fn new(verb: TermId) -> Self {
        Self {
            negated: false,
            verb,
            args: BTreeMap::new(),
        }
    }

    /// Add a term argument under a label (builder style).
    pub fn arg(mut self, label: impl Into<String>, term: TermId) -> Self {
        self.args.insert(label.into(), Arg::Term(term));
        self
    }

    /// Add a nested predicate argument under a label (builder style).
    pub fn nested(mut self, label: impl Into<String>, pred: Predicate) -> Self {
        self.args.insert(label.into(), Arg::Pred(pred));
        self
    }

    /// Mark the predicate as negated (builder style).
    pub fn negate(mut self) -> Self {
        self.negated = true;
        self
    }

    /// Whether the predicate contains no variable terms anywhere.
    pub fn is_ground(&self, lexicon: &Lexicon) -> bool {
        if lexicon.kind(self.verb) == Some(TermKind::Variable) {
            return false;
        }
        self.args.values().all(|arg| match arg {
            Arg::Term(t) => lexicon.kind(*t) != Some(TermKind::Variable),
            Arg::Pred(p) => p.is_ground(lexicon),
        })
    }

    /// Human-readable rendering, for diagnostics and error messages.
    pub fn render(&self, lexicon: &Lexicon) -> String {
        let name = |t: TermId| lexicon.name(t).unwrap_or("?").to_string();
        let mut parts = Vec::new();
        for (label, arg) in &self.args {
            let value = match arg {
                Arg::Term(t) => name(*t),
                Arg::Pred(p) => p.render(lexicon),
            };
            parts.push(format!("{label}: {value}"));
        }
        let neg = if self.negated { "!" } else { "" };
        format!("{neg}({} {})", name(self.verb), parts.join(", "))
    }

    fn hash_into(&self, hasher: &mut Sha256) {
        hasher.update([u8::from(self.negated)]);
        hasher.update(self.verb.0.to_le_bytes());
        for (label, arg) in &self.args {
            hasher.update(label.as_bytes());
            hasher.update([0u8]);
            match arg {
                Arg::Term(t) => {
                    hasher.update([1u8]);
                    hasher.update(t.0.to_le_bytes());
                }
                Arg::Pred(p) => {
                    hasher.update([2u8]);
                    p.hash_into(hasher);
                }
            }
        }
        hasher.update([3u8]);
    }
}

/// Content-addressed identity of an asserted fact: lowercase-hex SHA-256 of
/// the predicate's canonical form. Same predicate, same id.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct FactId(pub String);

impl FactId {
    pub fn of(pred: &Predicate) -> Self {
        let mut hasher = Sha256::new();
        pred.hash_into(&mut hasher);
        let hash = hasher.finalize();
        Self(format!("{hash:x}"))
    }
}

impl std::fmt::Display for FactId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An asserted predicate plus its durable identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fact {
    pub id: FactId,
    pub pred: Predicate,
}

impl Fact {
    pub fn new(pred: Predicate) -> Self {
        Self {
            id: FactId::of(&pred),
            pred,
        }
    }
}
