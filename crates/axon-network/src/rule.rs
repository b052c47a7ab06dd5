//! Rules: premises, rule-scoped varnames, conditions, and consequence
//! templates.

use crate::binding::{Activation, Binding, VarId};
use crate::error::NetworkError;
use crate::premise::PremId;
use axon_facts::{Arg, Predicate};
use axon_lexicon::{Lexicon, TermId, TermKind};
use std::collections::BTreeMap;

/// Handle into the network's rule table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RuleId(pub u32);

/// A rule-scoped variable: its source name and the interned variable term
/// (whose range is the variable's declared type).
#[derive(Debug, Clone)]
pub struct Varname {
    pub name: String,
    pub term: TermId,
}

/// One condition argument, resolved at evaluation time.
#[derive(Debug, Clone)]
pub(crate) enum CondArg {
    Var(VarId),
    Term(TermId),
}

/// A compiled condition: an external predicate plus its arguments.
#[derive(Debug, Clone)]
pub(crate) struct Condition {
    pub predicate: String,
    pub args: Vec<CondArg>,
}

/// Caller-facing condition description handed to
/// [`crate::Network::add_rule`]. Variable terms among the arguments are
/// resolved against the rule's varnames at compile time.
#[derive(Debug, Clone)]
pub struct ConditionSpec {
    pub predicate: String,
    pub args: Vec<TermId>,
}

impl ConditionSpec {
    pub fn new(predicate: impl Into<String>, args: Vec<TermId>) -> Self {
        Self {
            predicate: predicate.into(),
            args,
        }
    }
}

/// A compiled rule.
///
/// `pvars` is the premise-variable table: it maps a premise position and
/// premise-local slot number to the rule-global varname. Two rules can
/// share one premise chain (and terminal) while naming its variables
/// differently; this table is where the difference lives.
#[derive(Debug, Clone)]
pub struct Rule {
    pub(crate) name: String,
    pub(crate) premises: Vec<PremId>,
    pub(crate) varnames: Vec<Varname>,
    pub(crate) var_index: BTreeMap<TermId, VarId>,
    pub(crate) pvars: BTreeMap<(usize, u16), VarId>,
    pub(crate) conditions: Vec<Condition>,
    pub(crate) consequences: Vec<Predicate>,
}

impl Rule {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            premises: Vec::new(),
            varnames: Vec::new(),
            var_index: BTreeMap::new(),
            pvars: BTreeMap::new(),
            conditions: Vec::new(),
            consequences: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn premises(&self) -> &[PremId] {
        &self.premises
    }

    pub fn varnames(&self) -> &[Varname] {
        &self.varnames
    }

    /// Intern a varname at its first occurrence across the rule.
    pub(crate) fn ensure_varname(&mut self, name: &str, term: TermId) -> VarId {
        if let Some(var) = self.var_index.get(&term) {
            return *var;
        }
        let var = VarId(self.varnames.len() as u16);
        self.varnames.push(Varname {
            name: name.to_string(),
            term,
        });
        self.var_index.insert(term, var);
        var
    }

    pub(crate) fn var_of_term(&self, term: TermId) -> Option<VarId> {
        self.var_index.get(&term).copied()
    }

    /// Translate a premise-local binding into the rule's global namespace.
    ///
    /// Every slot of a binding stored at premise `premise_index`'s terminal
    /// has a pvar entry by construction; slots without one belong to a
    /// different owner of the shared terminal and are skipped.
    pub(crate) fn translate(&self, premise_index: usize, binding: &Binding) -> Activation {
        let mut activation = Activation::new();
        for (slot, value) in binding.slots() {
            if let Some(var) = self.pvars.get(&(premise_index, slot)) {
                activation.bind(*var, value);
            }
        }
        activation
    }

    /// Instantiate a consequence template under an activation: every
    /// variable term is replaced by its bound value.
    pub(crate) fn substitute(
        &self,
        template: &Predicate,
        activation: &Activation,
        lexicon: &Lexicon,
    ) -> Result<Predicate, NetworkError> {
        let mut out = Predicate::new(self.substitute_term(template.verb, activation, lexicon)?);
        out.negated = template.negated;
        for (label, arg) in &template.args {
            let substituted = match arg {
                Arg::Term(t) => Arg::Term(self.substitute_term(*t, activation, lexicon)?),
                Arg::Pred(p) => Arg::Pred(self.substitute(p, activation, lexicon)?),
            };
            out.args.insert(label.clone(), substituted);
        }
        Ok(out)
    }

    fn substitute_term(
        &self,
        term: TermId,
        activation: &Activation,
        lexicon: &Lexicon,
    ) -> Result<TermId, NetworkError> {
        if lexicon.kind(term) != Some(TermKind::Variable) {
            return Ok(term);
        }
        let unbound = || {
            NetworkError::UnboundVariable(lexicon.name(term).unwrap_or("?").to_string())
        };
        let var = self.var_of_term(term).ok_or_else(unbound)?;
        activation.get(var).ok_or_else(unbound)
    }
}
