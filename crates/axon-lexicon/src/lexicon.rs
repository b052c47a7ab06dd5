//! The term arena and hierarchy queries.

use crate::error::LexiconError;
use crate::term::{ArgSlot, TermEntry, TermId, TermKind};
use regex::Regex;
use std::collections::{BTreeMap, VecDeque};
use std::sync::LazyLock;

/// A rule variable is a capitalized head optionally followed by digits:
/// `Person1`, `Loves2`, `Thing`. The head, lowercased, names the range term.
static VAR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Z][a-z_]*)([0-9]*)$").unwrap_or_else(|e| panic!("variable pattern: {e}"))
});

/// Interning arena for all terms, plus the hierarchy queries the matching
/// engine needs.
///
/// A fresh lexicon carries the two primitive words: the root type `thing`
/// and the root verb `exists`. Everything else is added by the caller.
#[derive(Debug, Clone)]
pub struct Lexicon {
    terms: Vec<TermEntry>,
    by_name: BTreeMap<String, TermId>,
    thing: TermId,
    exists: TermId,
}

impl Default for Lexicon {
    fn default() -> Self {
        Self::new()
    }
}

impl Lexicon {
    pub fn new() -> Self {
        let mut lexicon = Self {
            terms: Vec::new(),
            by_name: BTreeMap::new(),
            thing: TermId(0),
            exists: TermId(0),
        };
        lexicon.thing = lexicon.intern(TermEntry {
            name: "thing".to_string(),
            kind: TermKind::Type,
            ty: None,
            bases: Vec::new(),
            args: Vec::new(),
        });
        lexicon.exists = lexicon.intern(TermEntry {
            name: "exists".to_string(),
            kind: TermKind::Verb,
            ty: None,
            bases: Vec::new(),
            args: Vec::new(),
        });
        lexicon
    }

    /// The root type.
    pub fn thing(&self) -> TermId {
        self.thing
    }

    /// The root verb.
    pub fn exists(&self) -> TermId {
        self.exists
    }

    fn intern(&mut self, entry: TermEntry) -> TermId {
        let id = TermId(self.terms.len() as u32);
        self.by_name.insert(entry.name.clone(), id);
        self.terms.push(entry);
        id
    }

    fn check_free(&self, name: &str) -> Result<(), LexiconError> {
        if self.by_name.contains_key(name) {
            return Err(LexiconError::DuplicateTerm(name.to_string()));
        }
        Ok(())
    }

    fn check_kind(&self, id: TermId, want: TermKind, role: &str) -> Result<(), LexiconError> {
        let entry = self.entry(id)?;
        if entry.kind != want {
            return Err(LexiconError::KindMismatch(format!(
                "{role} `{}` is {:?}, expected {want:?}",
                entry.name, entry.kind
            )));
        }
        Ok(())
    }

    /// Intern a new type. Empty `bases` defaults to `thing`.
    pub fn add_type(&mut self, name: &str, bases: &[TermId]) -> Result<TermId, LexiconError> {
        self.check_free(name)?;
        for base in bases {
            self.check_kind(*base, TermKind::Type, "type base")?;
        }
        let bases = if bases.is_empty() {
            vec![self.thing]
        } else {
            bases.to_vec()
        };
        Ok(self.intern(TermEntry {
            name: name.to_string(),
            kind: TermKind::Type,
            ty: None,
            bases,
            args: Vec::new(),
        }))
    }

    /// Intern a new verb with labeled argument slots. Empty `bases` defaults
    /// to `exists`. Slots of base verbs are inherited (see [`Self::verb_args`]).
    pub fn add_verb(
        &mut self,
        name: &str,
        bases: &[TermId],
        args: Vec<(&str, TermId)>,
    ) -> Result<TermId, LexiconError> {
        self.check_free(name)?;
        for base in bases {
            self.check_kind(*base, TermKind::Verb, "verb base")?;
        }
        let mut slots = Vec::new();
        for (label, ty) in args {
            self.check_kind(ty, TermKind::Type, "argument type")?;
            slots.push(ArgSlot {
                label: label.to_string(),
                ty,
            });
        }
        let bases = if bases.is_empty() {
            vec![self.exists]
        } else {
            bases.to_vec()
        };
        Ok(self.intern(TermEntry {
            name: name.to_string(),
            kind: TermKind::Verb,
            ty: None,
            bases,
            args: slots,
        }))
    }

    /// Intern a new entity of a declared type.
    pub fn add_entity(&mut self, name: &str, ty: TermId) -> Result<TermId, LexiconError> {
        self.add_entity_with_bases(name, ty, &[])
    }

    /// Intern a new entity that additionally specializes other entities.
    ///
    /// Instance bases let a premise variable constrained to `europe` match a
    /// fact about `spain` when `spain` lists `europe` among its bases.
    pub fn add_entity_with_bases(
        &mut self,
        name: &str,
        ty: TermId,
        bases: &[TermId],
    ) -> Result<TermId, LexiconError> {
        self.check_free(name)?;
        self.check_kind(ty, TermKind::Type, "entity type")?;
        for base in bases {
            self.check_kind(*base, TermKind::Entity, "instance base")?;
        }
        Ok(self.intern(TermEntry {
            name: name.to_string(),
            kind: TermKind::Entity,
            ty: Some(ty),
            bases: bases.to_vec(),
            args: Vec::new(),
        }))
    }

    /// Whether a name denotes a rule variable rather than a literal.
    pub fn is_variable_name(name: &str) -> bool {
        VAR_RE.is_match(name)
    }

    /// Intern (or look up) a rule variable.
    ///
    /// The alphabetic head of the name, lowercased, must name an existing
    /// type, verb, or entity: that term is the variable's range.
    pub fn variable(&mut self, name: &str) -> Result<TermId, LexiconError> {
        if let Some(id) = self.by_name.get(name) {
            self.check_kind(*id, TermKind::Variable, "variable")?;
            return Ok(*id);
        }
        let captures = VAR_RE
            .captures(name)
            .ok_or_else(|| LexiconError::InvalidVariable(name.to_string()))?;
        let head = captures
            .get(1)
            .map(|m| m.as_str().to_lowercase())
            .unwrap_or_default();
        let range = *self
            .by_name
            .get(&head)
            .ok_or_else(|| LexiconError::UnknownRange {
                name: name.to_string(),
                range: head.clone(),
            })?;
        if self.kind(range) == Some(TermKind::Variable) {
            return Err(LexiconError::KindMismatch(format!(
                "variable `{name}` cannot range over another variable"
            )));
        }
        Ok(self.intern(TermEntry {
            name: name.to_string(),
            kind: TermKind::Variable,
            ty: Some(range),
            bases: Vec::new(),
            args: Vec::new(),
        }))
    }

    /// Lookup a term by name.
    pub fn get(&self, name: &str) -> Option<TermId> {
        self.by_name.get(name).copied()
    }

    /// Lookup a term by name, erroring when absent.
    pub fn resolve(&self, name: &str) -> Result<TermId, LexiconError> {
        self.get(name)
            .ok_or_else(|| LexiconError::UnknownTerm(name.to_string()))
    }

    fn entry(&self, id: TermId) -> Result<&TermEntry, LexiconError> {
        self.terms
            .get(id.0 as usize)
            .ok_or_else(|| LexiconError::UnknownTerm(id.to_string()))
    }

    /// The printable name of a term.
    pub fn name(&self, id: TermId) -> Option<&str> {
        self.terms.get(id.0 as usize).map(|e| e.name.as_str())
    }

    /// The kind of a term.
    pub fn kind(&self, id: TermId) -> Option<TermKind> {
        self.terms.get(id.0 as usize).map(|e| e.kind)
    }

    /// The range of a variable (or the declared type of an entity).
    pub fn range(&self, id: TermId) -> Option<TermId> {
        self.terms.get(id.0 as usize).and_then(|e| e.ty)
    }

    /// Reflexive transitive closure over `bases`, in first-occurrence
    /// breadth-first order. Deterministic for a given lexicon.
    pub fn ancestors(&self, id: TermId) -> Vec<TermId> {
        let mut seen = vec![id];
        let mut queue = VecDeque::from([id]);
        while let Some(current) = queue.pop_front() {
            let Some(entry) = self.terms.get(current.0 as usize) else {
                continue;
            };
            for base in &entry.bases {
                if !seen.contains(base) {
                    seen.push(*base);
                    queue.push_back(*base);
                }
            }
        }
        seen
    }

    /// Ordered type ancestry of a term.
    ///
    /// For an entity this walks its declared type and that type's bases;
    /// for a type or verb it is the term's own ancestor chain; for a
    /// variable, the ancestry of its range.
    pub fn type_ancestors(&self, id: TermId) -> Vec<TermId> {
        match self.kind(id) {
            Some(TermKind::Type) | Some(TermKind::Verb) => self.ancestors(id),
            Some(TermKind::Entity) | Some(TermKind::Variable) => self
                .range(id)
                .map(|ty| self.ancestors(ty))
                .unwrap_or_default(),
            None => Vec::new(),
        }
    }

    /// Ordered instance ancestry of an entity: itself plus the closure of
    /// its instance bases. Empty for non-entities.
    pub fn instance_ancestors(&self, id: TermId) -> Vec<TermId> {
        match self.kind(id) {
            Some(TermKind::Entity) => self.ancestors(id),
            _ => Vec::new(),
        }
    }

    /// Whether `term` is an instance (or subtype) of `ty`.
    pub fn isa(&self, term: TermId, ty: TermId) -> bool {
        self.type_ancestors(term).contains(&ty)
    }

    /// All argument slots a verb accepts, inherited slots first.
    ///
    /// A slot re-declared by a more specific verb overrides the inherited
    /// one (covariant narrowing).
    pub fn verb_args(&self, verb: TermId) -> Result<Vec<ArgSlot>, LexiconError> {
        self.check_kind(verb, TermKind::Verb, "verb")?;
        let mut merged: Vec<ArgSlot> = Vec::new();
        // ancestors() is most-specific-first; walk it in reverse so
        // overrides land on top of inherited slots.
        for ancestor in self.ancestors(verb).iter().rev() {
            for slot in &self.entry(*ancestor)?.args {
                if let Some(existing) = merged.iter_mut().find(|s| s.label == slot.label) {
                    existing.ty = slot.ty;
                } else {
                    merged.push(slot.clone());
                }
            }
        }
        Ok(merged)
    }

    /// Number of interned terms.
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_lexicon() -> (Lexicon, TermId, TermId) {
        let mut lexicon = Lexicon::new();
        let person = lexicon.add_type("person", &[]).expect("person should intern");
        let thing = lexicon.thing();
        (lexicon, person, thing)
    }

    #[test]
    fn roots_are_seeded() {
        let lexicon = Lexicon::new();
        assert_eq!(lexicon.get("thing"), Some(lexicon.thing()));
        assert_eq!(lexicon.get("exists"), Some(lexicon.exists()));
        assert_eq!(lexicon.kind(lexicon.thing()), Some(TermKind::Type));
        assert_eq!(lexicon.kind(lexicon.exists()), Some(TermKind::Verb));
    }

    #[test]
    fn type_ancestry_reaches_thing() {
        let (mut lexicon, person, thing) = base_lexicon();
        let man = lexicon.add_type("man", &[person]).expect("man should intern");
        assert_eq!(lexicon.ancestors(man), vec![man, person, thing]);
    }

    #[test]
    fn entity_isa_walks_the_type_chain() {
        let (mut lexicon, person, thing) = base_lexicon();
        let john = lexicon.add_entity("john", person).expect("john should intern");
        assert!(lexicon.isa(john, person));
        assert!(lexicon.isa(john, thing));
        assert_eq!(lexicon.instance_ancestors(john), vec![john]);
    }

    #[test]
    fn instance_bases_extend_instance_ancestry() {
        let mut lexicon = Lexicon::new();
        let place = lexicon.add_type("place", &[]).expect("place should intern");
        let europe = lexicon.add_entity("europe", place).expect("europe should intern");
        let spain = lexicon
            .add_entity_with_bases("spain", place, &[europe])
            .expect("spain should intern");
        assert_eq!(lexicon.instance_ancestors(spain), vec![spain, europe]);
        assert_eq!(lexicon.instance_ancestors(europe), vec![europe]);
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let (mut lexicon, _, _) = base_lexicon();
        let err = lexicon.add_type("person", &[]).expect_err("duplicate must error");
        assert!(matches!(err, LexiconError::DuplicateTerm(name) if name == "person"));
    }

    #[test]
    fn entity_base_must_be_a_type() {
        let (mut lexicon, person, _) = base_lexicon();
        let john = lexicon.add_entity("john", person).expect("john should intern");
        let err = lexicon
            .add_entity("mary", john)
            .expect_err("entity as type must error");
        assert!(matches!(err, LexiconError::KindMismatch(_)));
    }

    #[test]
    fn variable_names_are_recognized() {
        assert!(Lexicon::is_variable_name("Person1"));
        assert!(Lexicon::is_variable_name("Thing"));
        assert!(Lexicon::is_variable_name("Verb_word2"));
        assert!(!Lexicon::is_variable_name("person"));
        assert!(!Lexicon::is_variable_name("john1x"));
        assert!(!Lexicon::is_variable_name(""));
    }

    #[test]
    fn variable_range_derives_from_the_name() {
        let (mut lexicon, person, _) = base_lexicon();
        let var = lexicon.variable("Person1").expect("variable should intern");
        assert_eq!(lexicon.kind(var), Some(TermKind::Variable));
        assert_eq!(lexicon.range(var), Some(person));
        // Same name, same handle.
        let again = lexicon.variable("Person1").expect("variable should re-resolve");
        assert_eq!(var, again);
    }

    #[test]
    fn variable_with_unknown_range_errors() {
        let mut lexicon = Lexicon::new();
        let err = lexicon
            .variable("Unicorn1")
            .expect_err("unknown range must error");
        assert!(matches!(err, LexiconError::UnknownRange { range, .. } if range == "unicorn"));
    }

    #[test]
    fn verb_args_inherit_and_override() {
        let mut lexicon = Lexicon::new();
        let person = lexicon.add_type("person", &[]).expect("person should intern");
        let animate = lexicon
            .add_verb("acts", &[], vec![("who", lexicon.thing())])
            .expect("acts should intern");
        let loves = lexicon
            .add_verb("loves", &[animate], vec![("who", person), ("whom", person)])
            .expect("loves should intern");

        let slots = lexicon.verb_args(loves).expect("slots should merge");
        assert_eq!(slots.len(), 2);
        let who = slots.iter().find(|s| s.label == "who").expect("who slot");
        assert_eq!(who.ty, person, "override narrows the inherited slot");
    }

    #[test]
    fn verb_ancestry_reaches_exists() {
        let mut lexicon = Lexicon::new();
        let loves = lexicon.add_verb("loves", &[], vec![]).expect("loves should intern");
        let adores = lexicon
            .add_verb("adores", &[loves], vec![])
            .expect("adores should intern");
        assert_eq!(
            lexicon.type_ancestors(adores),
            vec![adores, loves, lexicon.exists()]
        );
    }
}
