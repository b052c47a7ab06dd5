//! Decomposition of a predicate into feature paths, and path resolution.
//!
//! A [`Path`] names one scalar feature of a predicate: its negation flag,
//! its verb, one argument label, or one term argument — possibly inside a
//! nested predicate. The trailing [`PathKind`] tag tells the network which
//! node kind interprets the feature.
//!
//! [`decompose`] is deterministic per predicate shape: two predicates with
//! the same verb arity and labels produce the same path list in the same
//! order. The discrimination tree's prefix sharing depends on exactly this.

use crate::predicate::{Arg, Predicate};
use axon_lexicon::TermId;
use serde::{Deserialize, Serialize};

/// Which node kind interprets the feature a path points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathKind {
    /// The (sub)predicate's negation flag.
    Negation,
    /// The (sub)predicate's verb term.
    Verb,
    /// An argument role name; purely structural.
    Label,
    /// A term argument.
    Entity,
}

/// An ordered walk from a predicate to one scalar feature.
///
/// `steps` are argument labels navigating into nested predicates; `kind`
/// is the tag identifying the feature read at the end of the walk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Path {
    pub steps: Vec<String>,
    pub kind: PathKind,
}

impl Path {
    pub fn new(steps: Vec<String>, kind: PathKind) -> Self {
        Self { steps, kind }
    }
}

/// A resolved feature value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
    Flag(bool),
    Term(TermId),
    Label(String),
}

/// The ordered feature paths of a predicate.
///
/// Per (sub)predicate: the negation path, the verb path, then for each
/// argument label in sorted order a label path followed by either a term
/// path or the recursive decomposition of the nested predicate.
pub fn decompose(pred: &Predicate) -> Vec<Path> {
    let mut out = Vec::new();
    let mut prefix = Vec::new();
    walk(pred, &mut prefix, &mut out);
    out
}

fn walk(pred: &Predicate, prefix: &mut Vec<String>, out: &mut Vec<Path>) {
    out.push(Path::new(prefix.clone(), PathKind::Negation));
    out.push(Path::new(prefix.clone(), PathKind::Verb));
    for (label, arg) in &pred.args {
        prefix.push(label.clone());
        out.push(Path::new(prefix.clone(), PathKind::Label));
        match arg {
            Arg::Term(_) => out.push(Path::new(prefix.clone(), PathKind::Entity)),
            Arg::Pred(inner) => walk(inner, prefix, out),
        }
        prefix.pop();
    }
}

/// Read the feature a path points at, if the predicate's shape reaches it.
///
/// `None` means "no value": the fact is shallower than the path expects.
/// Label paths resolve structurally (from the path itself) and never
/// consult the predicate's content.
pub fn resolve(pred: &Predicate, path: &Path) -> Option<Resolved> {
    match path.kind {
        PathKind::Label => path.steps.last().cloned().map(Resolved::Label),
        PathKind::Negation => navigate(pred, &path.steps).map(|p| Resolved::Flag(p.negated)),
        PathKind::Verb => navigate(pred, &path.steps).map(|p| Resolved::Term(p.verb)),
        PathKind::Entity => {
            let (last, init) = path.steps.split_last()?;
            let sub = navigate(pred, init)?;
            match sub.args.get(last)? {
                Arg::Term(t) => Some(Resolved::Term(*t)),
                Arg::Pred(_) => None,
            }
        }
    }
}

fn navigate<'a>(pred: &'a Predicate, steps: &[String]) -> Option<&'a Predicate> {
    let mut current = pred;
    for step in steps {
        match current.args.get(step)? {
            Arg::Pred(inner) => current = inner,
            Arg::Term(_) => return None,
        }
    }
    Some(current)
}
