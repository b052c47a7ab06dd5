//! The network itself: rule compilation into the discrimination tree,
//! fact dispatch, the incremental join, and the forward-chaining loop.

use crate::binding::{Activation, Binding};
use crate::error::NetworkError;
use crate::node::{candidate_children, Node, NodeId, NodeTest};
use crate::premise::{PremId, PremNode};
use crate::rule::{CondArg, Condition, ConditionSpec, Rule, RuleId};
use axon_facts::{decompose, resolve, Arg, FactId, FactSet, Path, Predicate, Resolved};
use axon_lexicon::{Lexicon, TermId, TermKind};
use serde::Serialize;
use std::collections::{BTreeMap, VecDeque};
use tracing::{debug, info, warn};

/// An externally supplied condition predicate. Receives the lexicon and
/// the fully instantiated arguments; an `Err` counts as "did not hold"
/// for the one activation under evaluation.
pub type ConditionFn = Box<dyn Fn(&Lexicon, &[TermId]) -> Result<bool, String>>;

/// Tuning knobs for a [`Network`].
#[derive(Debug, Clone, Default)]
pub struct NetworkConfig {
    /// Upper bound on facts derived per [`Network::add_fact`] call. `None`
    /// trusts the rule set to converge on its own.
    pub max_derivations: Option<usize>,
}

/// Structural counters, mainly for tests and diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkStats {
    pub nodes: usize,
    pub premises: usize,
    pub rules: usize,
    pub facts: usize,
    pub stored_matches: usize,
}

/// A forward-chaining rule network over a typed fact store.
///
/// Rules compile into chains of feature-test nodes sharing common
/// prefixes; asserting a fact walks the tree once, records a binding at
/// every premise terminal the fact satisfies, joins each new binding with
/// the other premises' stored matches, and enqueues the consequences of
/// every complete activation. [`Network::add_fact`] drains that queue to
/// fixpoint before returning.
pub struct Network {
    lexicon: Lexicon,
    facts: FactSet,
    nodes: Vec<Node>,
    prems: Vec<PremNode>,
    rules: Vec<Rule>,
    conditions: BTreeMap<String, ConditionFn>,
    config: NetworkConfig,
    queue: VecDeque<Predicate>,
}

impl Default for Network {
    fn default() -> Self {
        Self::new()
    }
}

impl Network {
    pub fn new() -> Self {
        Self::with_config(NetworkConfig::default())
    }

    pub fn with_config(config: NetworkConfig) -> Self {
        let mut network = Self {
            lexicon: Lexicon::new(),
            facts: FactSet::new(),
            nodes: vec![Node::root()],
            prems: Vec::new(),
            rules: Vec::new(),
            conditions: BTreeMap::new(),
            config,
            queue: VecDeque::new(),
        };
        network.register_condition("isa", builtin_isa());
        network
    }

    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    pub fn lexicon_mut(&mut self) -> &mut Lexicon {
        &mut self.lexicon
    }

    pub fn facts(&self) -> &FactSet {
        &self.facts
    }

    /// Register (or replace) a condition predicate under a name rules can
    /// reference.
    pub fn register_condition(&mut self, name: impl Into<String>, f: ConditionFn) {
        self.conditions.insert(name.into(), f);
    }

    pub fn stats(&self) -> NetworkStats {
        NetworkStats {
            nodes: self.nodes.len(),
            premises: self.prems.len(),
            rules: self.rules.len(),
            facts: self.facts.len(),
            stored_matches: self.prems.iter().map(|p| p.matches().len()).sum(),
        }
    }

    /// Assert a ground fact and run derivation to fixpoint.
    ///
    /// Returns the id of the asserted fact. Re-asserting a known fact is a
    /// no-op. Every fact the rules derive along the way is validated and
    /// stored exactly as if asserted, in FIFO order.
    pub fn add_fact(&mut self, pred: Predicate) -> Result<FactId, NetworkError> {
        self.check_assertable(&pred)?;
        let id = FactId::of(&pred);
        if self.facts.contains(&id) {
            return Ok(id);
        }
        self.queue.push_back(pred);
        let mut derived = 0usize;
        let mut seeded = false;
        while let Some(next) = self.queue.pop_front() {
            if self.facts.contains_pred(&next) {
                continue;
            }
            if seeded {
                derived += 1;
                if let Some(limit) = self.config.max_derivations {
                    if derived > limit {
                        self.queue.clear();
                        return Err(NetworkError::DerivationBudgetExceeded { limit });
                    }
                }
            }
            seeded = true;
            let binding = Binding::new(FactId::of(&next));
            self.dispatch(NodeId(0), binding, &next);
            self.facts.insert(next);
        }
        Ok(id)
    }

    /// Compile a rule into the tree.
    ///
    /// `premises` are open predicates (variables allowed anywhere a term
    /// goes), `conditions` reference registered condition predicates, and
    /// `consequences` are templates instantiated on every firing. Facts
    /// already in the store do not retroactively match the new rule.
    pub fn add_rule(
        &mut self,
        name: &str,
        premises: Vec<Predicate>,
        conditions: Vec<ConditionSpec>,
        consequences: Vec<Predicate>,
    ) -> Result<RuleId, NetworkError> {
        if premises.is_empty() {
            return Err(NetworkError::EmptyRule(name.to_string()));
        }
        if self.rules.iter().any(|r| r.name() == name) {
            return Err(NetworkError::DuplicateRule(name.to_string()));
        }

        // Compile premises into per-path tests first, without touching the
        // tree, so validation failures below leave the network unchanged.
        let mut rule = Rule::new(name);
        let mut compiled: Vec<Vec<(u16, NodeTest, Path)>> = Vec::new();
        for (pos, premise) in premises.iter().enumerate() {
            compiled.push(self.compile_premise(&mut rule, pos, premise));
        }
        for spec in conditions {
            let condition = self.compile_condition(&rule, spec)?;
            rule.conditions.push(condition);
        }
        for template in &consequences {
            self.check_template(&rule, template)?;
        }
        rule.consequences = consequences;

        let rule_id = RuleId(self.rules.len() as u32);
        for tests in compiled {
            let mut node_id = NodeId(0);
            for (var, test, path) in tests {
                node_id = self.get_or_create_child(node_id, var, test, path);
            }
            let prem_id = self.terminal_at(node_id);
            self.prems[prem_id.0 as usize].add_rule(rule_id);
            rule.premises.push(prem_id);
        }
        info!(rule = name, premises = rule.premises().len(), "rule compiled");
        self.rules.push(rule);
        Ok(rule_id)
    }

    /// Persist the fact store as JSONL.
    pub fn save_facts(&self, path: impl AsRef<std::path::Path>) -> Result<(), NetworkError> {
        self.facts.save_jsonl(path)?;
        Ok(())
    }

    /// Replace the fact store from a JSONL file.
    ///
    /// Loaded facts are storage only: they are not re-dispatched against
    /// the current rules.
    pub fn load_facts(&mut self, path: impl AsRef<std::path::Path>) -> Result<(), NetworkError> {
        self.facts = FactSet::load_jsonl(path)?;
        Ok(())
    }

    fn term_name(&self, id: TermId) -> String {
        self.lexicon.name(id).unwrap_or("?").to_string()
    }

    /// A fact must use a known verb, be ground, use only labels its verb
    /// declares, and fill every term argument with an instance of the
    /// slot's type. Nested predicate arguments are checked recursively.
    fn check_assertable(&self, pred: &Predicate) -> Result<(), NetworkError> {
        if self.lexicon.kind(pred.verb) != Some(TermKind::Verb) {
            return Err(NetworkError::UnknownVerb(self.term_name(pred.verb)));
        }
        if !pred.is_ground(&self.lexicon) {
            return Err(NetworkError::NonGroundFact(pred.render(&self.lexicon)));
        }
        let slots = self.lexicon.verb_args(pred.verb)?;
        for (label, arg) in &pred.args {
            let Some(slot) = slots.iter().find(|s| s.label == *label) else {
                return Err(NetworkError::UnknownLabel {
                    verb: self.term_name(pred.verb),
                    label: label.clone(),
                });
            };
            match arg {
                Arg::Term(term) => {
                    if !self.lexicon.isa(*term, slot.ty) {
                        return Err(NetworkError::ArgTypeMismatch {
                            verb: self.term_name(pred.verb),
                            label: label.clone(),
                            expected: self.term_name(slot.ty),
                            actual: self.term_name(*term),
                        });
                    }
                }
                Arg::Pred(inner) => self.check_assertable(inner)?,
            }
        }
        Ok(())
    }

    /// Walk one fact down the tree from `node_id`, extending the binding
    /// at variable nodes and delivering it to every terminal reached.
    fn dispatch(&mut self, node_id: NodeId, binding: Binding, pred: &Predicate) {
        let (child_path, terminal) = {
            let node = &self.nodes[node_id.0 as usize];
            (node.child_path.clone(), node.terminal)
        };
        if let Some(path) = child_path {
            let value = resolve(pred, &path);
            let candidates = candidate_children(
                &self.nodes,
                &self.nodes[node_id.0 as usize],
                path.kind,
                value.as_ref(),
                &binding,
                &self.lexicon,
            );
            for child_id in candidates {
                let var = self.nodes[child_id.0 as usize].var;
                let next = match (&value, var) {
                    (Some(Resolved::Term(term)), v) if v > 0 && binding.get(v).is_none() => {
                        binding.extended(v, *term)
                    }
                    _ => binding.clone(),
                };
                self.dispatch(child_id, next, pred);
            }
        }
        if let Some(prem_id) = terminal {
            self.deliver(prem_id, binding);
        }
    }

    /// Record a binding at a terminal and join it against the other
    /// premises of every rule using this terminal. Seeding the join from
    /// the new binding alone is what makes each firing happen exactly
    /// once.
    fn deliver(&mut self, prem_id: PremId, binding: Binding) {
        if !self.prems[prem_id.0 as usize].record(binding.clone()) {
            return;
        }
        debug!(premise = prem_id.0, fact = %binding.fact(), "premise matched");
        let mut derived = Vec::new();
        for rule_id in self.prems[prem_id.0 as usize].rules() {
            let rule = &self.rules[rule_id.0 as usize];
            for (pos, pid) in rule.premises().iter().enumerate() {
                if *pid != prem_id {
                    continue;
                }
                let seed = rule.translate(pos, &binding);
                for activation in self.complete_activations(rule, pos, seed) {
                    derived.extend(self.fire(rule, &activation));
                }
            }
        }
        self.queue.extend(derived);
    }

    /// Extend a seed activation with the stored matches of every other
    /// premise, in declared order, keeping only consistent merges. An
    /// empty intermediate set short-circuits the join.
    fn complete_activations(
        &self,
        rule: &Rule,
        seed_pos: usize,
        seed: Activation,
    ) -> Vec<Activation> {
        let mut candidates = vec![seed];
        for (pos, pid) in rule.premises().iter().enumerate() {
            if pos == seed_pos {
                continue;
            }
            let mut next = Vec::new();
            for candidate in &candidates {
                for stored in self.prems[pid.0 as usize].matches() {
                    let translated = rule.translate(pos, stored);
                    if let Some(merged) = candidate.merge(&translated) {
                        if !next.contains(&merged) {
                            next.push(merged);
                        }
                    }
                }
            }
            if next.is_empty() {
                return Vec::new();
            }
            candidates = next;
        }
        candidates.retain(|a| a.covers(rule.varnames().len()));
        candidates
    }

    /// Evaluate a rule's conditions under one activation and, if they all
    /// hold, return its instantiated consequences for the caller to
    /// enqueue.
    fn fire(&self, rule: &Rule, activation: &Activation) -> Vec<Predicate> {
        if !self.conditions_pass(rule, activation) {
            return Vec::new();
        }
        info!(rule = rule.name(), "rule fired");
        let mut derived = Vec::new();
        for template in &rule.consequences {
            let instantiated = match rule.substitute(template, activation, &self.lexicon) {
                Ok(instantiated) => instantiated,
                Err(err) => {
                    warn!(rule = rule.name(), error = %err, "consequence skipped");
                    continue;
                }
            };
            match self.check_assertable(&instantiated) {
                Ok(()) => derived.push(instantiated),
                Err(err) => {
                    warn!(rule = rule.name(), error = %err, "derived fact rejected");
                }
            }
        }
        derived
    }

    /// Conditions short-circuit on the first failure. Evaluation errors
    /// and unknown predicates veto only the one activation and are logged,
    /// never raised.
    fn conditions_pass(&self, rule: &Rule, activation: &Activation) -> bool {
        for condition in &rule.conditions {
            let Some(eval) = self.conditions.get(&condition.predicate) else {
                warn!(
                    rule = rule.name(),
                    predicate = %condition.predicate,
                    "unknown condition predicate"
                );
                return false;
            };
            let mut args = Vec::with_capacity(condition.args.len());
            for arg in &condition.args {
                match arg {
                    CondArg::Term(term) => args.push(*term),
                    CondArg::Var(var) => match activation.get(*var) {
                        Some(term) => args.push(term),
                        None => {
                            warn!(
                                rule = rule.name(),
                                predicate = %condition.predicate,
                                "condition argument unbound"
                            );
                            return false;
                        }
                    },
                }
            }
            match eval(&self.lexicon, &args) {
                Ok(true) => {}
                Ok(false) => return false,
                Err(err) => {
                    warn!(
                        rule = rule.name(),
                        predicate = %condition.predicate,
                        error = %err,
                        "condition evaluation failed"
                    );
                    return false;
                }
            }
        }
        true
    }

    /// Turn one premise into its ordered per-path node tests, numbering
    /// the premise's variables from 1 in first-occurrence order and
    /// recording the slot-to-varname correspondence on the rule.
    fn compile_premise(
        &self,
        rule: &mut Rule,
        pos: usize,
        premise: &Predicate,
    ) -> Vec<(u16, NodeTest, Path)> {
        let mut slots: BTreeMap<TermId, u16> = BTreeMap::new();
        let mut tests = Vec::new();
        for path in decompose(premise) {
            // A premise always resolves its own decomposition.
            let Some(value) = resolve(premise, &path) else {
                continue;
            };
            let (var, test) = match value {
                Resolved::Flag(flag) => (0, NodeTest::Flag(flag)),
                Resolved::Label(label) => (0, NodeTest::Label(label)),
                Resolved::Term(term) => {
                    if self.lexicon.kind(term) == Some(TermKind::Variable) {
                        let slot = match slots.get(&term) {
                            Some(slot) => *slot,
                            None => {
                                let slot = slots.len() as u16 + 1;
                                slots.insert(term, slot);
                                slot
                            }
                        };
                        let name = self.lexicon.name(term).unwrap_or("?").to_string();
                        let gvar = rule.ensure_varname(&name, term);
                        rule.pvars.insert((pos, slot), gvar);
                        let constraint =
                            self.lexicon.range(term).unwrap_or(self.lexicon.thing());
                        (slot, NodeTest::Term(constraint))
                    } else {
                        (0, NodeTest::Term(term))
                    }
                }
            };
            tests.push((var, test, path));
        }
        tests
    }

    fn compile_condition(
        &self,
        rule: &Rule,
        spec: ConditionSpec,
    ) -> Result<Condition, NetworkError> {
        let mut args = Vec::with_capacity(spec.args.len());
        for term in spec.args {
            if self.lexicon.kind(term) == Some(TermKind::Variable) {
                let var = rule
                    .var_of_term(term)
                    .ok_or_else(|| NetworkError::UnboundVariable(self.term_name(term)))?;
                args.push(CondArg::Var(var));
            } else {
                args.push(CondArg::Term(term));
            }
        }
        Ok(Condition {
            predicate: spec.predicate,
            args,
        })
    }

    /// Every variable in a consequence template must be bound by some
    /// premise, recursively through nested predicates.
    fn check_template(&self, rule: &Rule, template: &Predicate) -> Result<(), NetworkError> {
        let check_term = |term: TermId| {
            if self.lexicon.kind(term) == Some(TermKind::Variable)
                && rule.var_of_term(term).is_none()
            {
                return Err(NetworkError::UnboundVariable(self.term_name(term)));
            }
            Ok(())
        };
        check_term(template.verb)?;
        for arg in template.args.values() {
            match arg {
                Arg::Term(term) => check_term(*term)?,
                Arg::Pred(inner) => self.check_template(rule, inner)?,
            }
        }
        Ok(())
    }

    /// Find or create the child of `parent` carrying `(var, test)`. The
    /// parent learns its child path from its first child.
    fn get_or_create_child(
        &mut self,
        parent: NodeId,
        var: u16,
        test: NodeTest,
        path: Path,
    ) -> NodeId {
        if self.nodes[parent.0 as usize].child_path.is_none() {
            self.nodes[parent.0 as usize].child_path = Some(path);
        }
        let existing = self.nodes[parent.0 as usize]
            .children
            .iter()
            .copied()
            .find(|id| {
                let child = &self.nodes[id.0 as usize];
                child.var == var && child.test == test
            });
        if let Some(id) = existing {
            return id;
        }
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node::new(var, test));
        self.nodes[parent.0 as usize].children.push(id);
        id
    }

    /// The premise terminal at a node, created on first use. Sharing the
    /// terminal is what lets several rules reuse one premise chain.
    fn terminal_at(&mut self, node_id: NodeId) -> PremId {
        if let Some(prem_id) = self.nodes[node_id.0 as usize].terminal {
            return prem_id;
        }
        let prem_id = PremId(self.prems.len() as u32);
        self.prems.push(PremNode::new(node_id));
        self.nodes[node_id.0 as usize].terminal = Some(prem_id);
        prem_id
    }
}

fn builtin_isa() -> ConditionFn {
    Box::new(|lexicon, args| {
        let &[term, ty] = args else {
            return Err(format!("isa expects 2 arguments, got {}", args.len()));
        };
        Ok(lexicon.isa(term, ty))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn network_with_people() -> (Network, TermId, TermId, TermId) {
        let mut network = Network::new();
        let person = network
            .lexicon_mut()
            .add_type("person", &[])
            .expect("person should intern");
        let loves = network
            .lexicon_mut()
            .add_verb("loves", &[], vec![("who", person), ("whom", person)])
            .expect("loves should intern");
        let john = network
            .lexicon_mut()
            .add_entity("john", person)
            .expect("john should intern");
        (network, person, loves, john)
    }

    #[test]
    fn empty_rules_are_rejected() {
        let (mut network, _, loves, john) = network_with_people();
        let err = network
            .add_rule("r", vec![], vec![], vec![Predicate::new(loves).arg("who", john)])
            .expect_err("no premises must error");
        assert!(matches!(err, NetworkError::EmptyRule(name) if name == "r"));
    }

    #[test]
    fn duplicate_rule_names_are_rejected() {
        let (mut network, _, loves, john) = network_with_people();
        let premise = Predicate::new(loves).arg("who", john);
        network
            .add_rule("r", vec![premise.clone()], vec![], vec![])
            .expect("first rule should compile");
        let err = network
            .add_rule("r", vec![premise], vec![], vec![])
            .expect_err("same name must error");
        assert!(matches!(err, NetworkError::DuplicateRule(name) if name == "r"));
    }

    #[test]
    fn facts_must_use_a_known_verb() {
        let (mut network, person, _, john) = network_with_people();
        let err = network
            .add_fact(Predicate::new(person).arg("who", john))
            .expect_err("a type in verb position must error");
        assert!(matches!(err, NetworkError::UnknownVerb(name) if name == "person"));
    }

    #[test]
    fn facts_must_be_ground() {
        let (mut network, _, loves, _) = network_with_people();
        let var = network
            .lexicon_mut()
            .variable("Person1")
            .expect("variable should intern");
        let err = network
            .add_fact(Predicate::new(loves).arg("who", var))
            .expect_err("open fact must error");
        assert!(matches!(err, NetworkError::NonGroundFact(_)));
    }

    #[test]
    fn facts_must_use_declared_labels() {
        let (mut network, _, loves, john) = network_with_people();
        let err = network
            .add_fact(Predicate::new(loves).arg("victim", john))
            .expect_err("unknown label must error");
        assert!(
            matches!(err, NetworkError::UnknownLabel { verb, label }
                if verb == "loves" && label == "victim")
        );
    }

    #[test]
    fn argument_types_are_enforced() {
        let (mut network, _, loves, _) = network_with_people();
        let furniture = network
            .lexicon_mut()
            .add_type("furniture", &[])
            .expect("furniture should intern");
        let table = network
            .lexicon_mut()
            .add_entity("table", furniture)
            .expect("table should intern");
        let err = network
            .add_fact(Predicate::new(loves).arg("who", table))
            .expect_err("type mismatch must error");
        assert!(
            matches!(err, NetworkError::ArgTypeMismatch { label, expected, actual, .. }
                if label == "who" && expected == "person" && actual == "table")
        );
    }

    #[test]
    fn consequence_variables_must_be_bound_by_premises() {
        let (mut network, _, loves, _) = network_with_people();
        let x = network
            .lexicon_mut()
            .variable("Person1")
            .expect("x should intern");
        let stray = network
            .lexicon_mut()
            .variable("Person2")
            .expect("stray should intern");
        let before = network.stats();
        let err = network
            .add_rule(
                "r",
                vec![Predicate::new(loves).arg("who", x).arg("whom", x)],
                vec![],
                vec![Predicate::new(loves).arg("who", stray).arg("whom", x)],
            )
            .expect_err("unbound consequence variable must error");
        assert!(matches!(err, NetworkError::UnboundVariable(name) if name == "Person2"));
        // The failed compilation left the tree untouched.
        assert_eq!(network.stats(), before);
    }

    #[test]
    fn condition_variables_must_be_bound_by_premises() {
        let (mut network, _, loves, _) = network_with_people();
        let x = network
            .lexicon_mut()
            .variable("Person1")
            .expect("x should intern");
        let stray = network
            .lexicon_mut()
            .variable("Person2")
            .expect("stray should intern");
        let err = network
            .add_rule(
                "r",
                vec![Predicate::new(loves).arg("who", x).arg("whom", x)],
                vec![ConditionSpec::new("isa", vec![stray, x])],
                vec![],
            )
            .expect_err("unbound condition variable must error");
        assert!(matches!(err, NetworkError::UnboundVariable(name) if name == "Person2"));
    }

    #[test]
    fn reasserting_a_fact_is_idempotent() {
        let (mut network, _, loves, john) = network_with_people();
        let pred = Predicate::new(loves).arg("who", john).arg("whom", john);
        let first = network.add_fact(pred.clone()).expect("assert should succeed");
        let again = network.add_fact(pred).expect("re-assert should succeed");
        assert_eq!(first, again);
        assert_eq!(network.facts().len(), 1);
    }
}
