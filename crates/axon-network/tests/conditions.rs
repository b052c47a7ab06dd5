//! Condition predicate behavior: evaluation order, the `isa` builtin, and
//! failure isolation.

use axon_facts::Predicate;
use axon_lexicon::TermId;
use axon_network::{ConditionSpec, Network};
use std::cell::Cell;
use std::rc::Rc;

fn people_network() -> Network {
    let mut network = Network::new();
    let lex = network.lexicon_mut();
    let thing = lex.thing();
    let person = lex.add_type("person", &[]).expect("person should intern");
    let furniture = lex.add_type("furniture", &[]).expect("furniture should intern");
    lex.add_verb("loves", &[], vec![("who", person), ("whom", person)])
        .expect("loves should intern");
    lex.add_verb("admires", &[], vec![("who", person), ("whom", person)])
        .expect("admires should intern");
    lex.add_verb("dislikes", &[], vec![("who", person), ("whom", person)])
        .expect("dislikes should intern");
    lex.add_verb("touches", &[], vec![("who", thing), ("what", thing)])
        .expect("touches should intern");
    lex.add_entity("john", person).expect("john should intern");
    lex.add_entity("mary", person).expect("mary should intern");
    lex.add_entity("table", furniture).expect("table should intern");
    network
}

fn term(network: &Network, name: &str) -> TermId {
    network
        .lexicon()
        .get(name)
        .unwrap_or_else(|| panic!("unknown term `{name}`"))
}

fn var(network: &mut Network, name: &str) -> TermId {
    network
        .lexicon_mut()
        .variable(name)
        .expect("variable should intern")
}

fn pred(network: &Network, verb: &str, args: &[(&str, &str)]) -> Predicate {
    let mut p = Predicate::new(term(network, verb));
    for (label, value) in args {
        p = p.arg(*label, term(network, value));
    }
    p
}

fn counting(counter: &Rc<Cell<usize>>, result: bool) -> axon_network::ConditionFn {
    let counter = Rc::clone(counter);
    Box::new(move |_, _| {
        counter.set(counter.get() + 1);
        Ok(result)
    })
}

#[test]
fn conditions_short_circuit_on_first_failure() {
    let mut network = people_network();
    let first = Rc::new(Cell::new(0));
    let second = Rc::new(Cell::new(0));
    let third = Rc::new(Cell::new(0));
    network.register_condition("first", counting(&first, true));
    network.register_condition("second", counting(&second, false));
    network.register_condition("third", counting(&third, true));

    var(&mut network, "Person1");
    var(&mut network, "Person2");
    network
        .add_rule(
            "guarded",
            vec![pred(&network, "loves", &[("who", "Person1"), ("whom", "Person2")])],
            vec![
                ConditionSpec::new("first", vec![]),
                ConditionSpec::new("second", vec![]),
                ConditionSpec::new("third", vec![]),
            ],
            vec![pred(&network, "admires", &[("who", "Person1"), ("whom", "Person2")])],
        )
        .expect("rule should compile");

    network
        .add_fact(pred(&network, "loves", &[("who", "john"), ("whom", "mary")]))
        .expect("assert should succeed");

    assert_eq!(first.get(), 1);
    assert_eq!(second.get(), 1);
    assert_eq!(third.get(), 0, "later conditions are never evaluated");
    assert_eq!(network.facts().len(), 1, "the rule must not fire");
}

#[test]
fn the_isa_builtin_narrows_untyped_premises() {
    let mut network = people_network();
    var(&mut network, "Thing1");
    var(&mut network, "Thing2");
    let thing1 = term(&network, "Thing1");
    let thing2 = term(&network, "Thing2");
    let person = term(&network, "person");
    network
        .add_rule(
            "touching-people-admire",
            vec![pred(&network, "touches", &[("who", "Thing1"), ("what", "Thing2")])],
            vec![
                ConditionSpec::new("isa", vec![thing1, person]),
                ConditionSpec::new("isa", vec![thing2, person]),
            ],
            vec![pred(&network, "admires", &[("who", "Thing1"), ("whom", "Thing2")])],
        )
        .expect("rule should compile");

    network
        .add_fact(pred(&network, "touches", &[("who", "john"), ("what", "mary")]))
        .expect("assert should succeed");
    network
        .add_fact(pred(&network, "touches", &[("who", "table"), ("what", "john")]))
        .expect("assert should succeed");

    assert_eq!(network.facts().len(), 3);
    assert!(network.facts().contains_pred(&pred(
        &network,
        "admires",
        &[("who", "john"), ("whom", "mary")]
    )));
}

#[test]
fn condition_failures_are_isolated_per_rule() {
    let mut network = people_network();
    network.register_condition("boom", Box::new(|_, _| Err("deliberate failure".to_string())));

    var(&mut network, "Person1");
    var(&mut network, "Person2");
    let premise = pred(&network, "loves", &[("who", "Person1"), ("whom", "Person2")]);
    network
        .add_rule(
            "broken",
            vec![premise.clone()],
            vec![ConditionSpec::new("boom", vec![])],
            vec![pred(&network, "admires", &[("who", "Person1"), ("whom", "Person2")])],
        )
        .expect("broken rule should still compile");
    network
        .add_rule(
            "sound",
            vec![premise],
            vec![],
            vec![pred(&network, "dislikes", &[("who", "Person1"), ("whom", "Person2")])],
        )
        .expect("sound rule should compile");

    // The failing condition vetoes its own rule's activation and nothing else.
    network
        .add_fact(pred(&network, "loves", &[("who", "john"), ("whom", "mary")]))
        .expect("assertion must survive the condition failure");
    assert!(network.facts().contains_pred(&pred(
        &network,
        "dislikes",
        &[("who", "john"), ("whom", "mary")]
    )));
    assert!(!network.facts().contains_pred(&pred(
        &network,
        "admires",
        &[("who", "john"), ("whom", "mary")]
    )));
}

#[test]
fn unknown_condition_predicates_veto_the_activation() {
    let mut network = people_network();
    var(&mut network, "Person1");
    var(&mut network, "Person2");
    network
        .add_rule(
            "dangling",
            vec![pred(&network, "loves", &[("who", "Person1"), ("whom", "Person2")])],
            vec![ConditionSpec::new("no-such-predicate", vec![])],
            vec![pred(&network, "admires", &[("who", "Person1"), ("whom", "Person2")])],
        )
        .expect("rule should compile");

    network
        .add_fact(pred(&network, "loves", &[("who", "john"), ("whom", "mary")]))
        .expect("assert should succeed");
    assert_eq!(network.facts().len(), 1);
}
