//! Hierarchy walker: equivalence sets, ancestors, descendants, subclasses.
//!
//! Ancestors come from the in-memory bases, descendants from the store's
//! transitive `rdfs:subClassOf` closure plus loaded children. Both merge
//! equivalence-class members and skip internal identifiers.

use hashbrown::HashSet;
use tracing::warn;

use crate::model::{ClassId, Concept, StoreId, Value};
use crate::storage::TripleStore;
use crate::world::{dedup, World};
use crate::{Error, Result};

impl<S: TripleStore> World<S> {
    // ========================================================================
    // Equivalence
    // ========================================================================

    /// Classes and constructs equivalent to `c`, through the store's
    /// symmetric closure of `owl:equivalentClass`. Cached.
    pub fn equivalent_to(&self, c: ClassId) -> Result<Vec<Concept>> {
        let cached = self.cache.lock().equivalents(c);
        if let Some(eqs) = cached {
            return Ok(eqs);
        }

        let sid = self.store_id(c);
        let mut eqs = Vec::new();
        for member in self.store.get_transitive_sym(&sid, &self.vocab.equivalent_class)? {
            if member == sid {
                continue;
            }
            match self.load_concept(&member)? {
                Some(concept) => eqs.push(concept),
                None => {
                    let err = Error::DanglingEquivalence(member);
                    warn!(class = %sid, error = %err, "skipping equivalence target");
                }
            }
        }
        let eqs = dedup(eqs);
        self.cache.lock().store_equivalents(c, eqs.clone());
        Ok(eqs)
    }

    /// Class members of the equivalence set. With `only_loaded`, reads the
    /// store closure and keeps registered classes only.
    fn equivalent_classes(&self, c: ClassId, only_loaded: bool) -> Result<Vec<ClassId>> {
        if !only_loaded {
            return Ok(self.equivalent_to(c)?.into_iter().filter_map(Concept::as_class).collect());
        }
        let sid = self.store_id(c);
        Ok(self.store.get_transitive_sym(&sid, &self.vocab.equivalent_class)?
            .iter()
            .filter(|m| **m != sid)
            .filter_map(|m| self.class_by_store_id(m))
            .collect())
    }

    // ========================================================================
    // Ancestors
    // ========================================================================

    /// Every class above `c`: bases, transitively, merged with each visited
    /// class's equivalents.
    pub fn ancestors(&self, c: ClassId, include_self: bool) -> Result<HashSet<ClassId>> {
        let cached = self.cache.lock().ancestors(c, include_self);
        if let Some(set) = cached {
            return Ok(set);
        }

        let mut out: HashSet<ClassId> = HashSet::new();
        let mut stack = vec![c];
        while let Some(x) = stack.pop() {
            if !out.insert(x) {
                continue;
            }
            stack.extend(self.equivalent_classes(x, false)?);
            stack.extend(self.bases(x));
        }
        if !include_self {
            out.remove(&c);
        }

        self.cache.lock().store_ancestors(c, include_self, out.clone());
        Ok(out)
    }

    // ========================================================================
    // Descendants
    // ========================================================================

    /// Every class below `c`. With `only_loaded`, classes not yet
    /// materialized are skipped rather than loaded.
    pub fn descendants(&self, c: ClassId, include_self: bool, only_loaded: bool) -> Result<HashSet<ClassId>> {
        let cached = self.cache.lock().descendants(c, include_self, only_loaded);
        if let Some(set) = cached {
            return Ok(set);
        }

        let mut out = if c == ClassId::THING {
            self.all_classes(only_loaded)?
        } else {
            self.walk_down(c, only_loaded)?
        };
        out.insert(c);
        if !include_self {
            out.remove(&c);
        }

        self.cache.lock().store_descendants(c, include_self, only_loaded, out.clone());
        Ok(out)
    }

    fn walk_down(&self, c: ClassId, only_loaded: bool) -> Result<HashSet<ClassId>> {
        let mut out: HashSet<ClassId> = HashSet::new();
        let mut stack = vec![c];
        while let Some(x) = stack.pop() {
            if !out.insert(x) {
                continue;
            }
            let sid = self.store_id(x);
            for member in self.store.get_transitive_po(&self.vocab.subclass_of, &sid)? {
                if member.is_internal() || member == sid {
                    continue;
                }
                if let Some(d) = self.resolve_class(&member, only_loaded)? {
                    stack.push(d);
                }
            }
            stack.extend(self.classes.read().children(x));
            stack.extend(self.equivalent_classes(x, only_loaded)?);
        }
        Ok(out)
    }

    /// Everything typed `owl:Class` in the store, plus registered classes.
    fn all_classes(&self, only_loaded: bool) -> Result<HashSet<ClassId>> {
        let mut out: HashSet<ClassId> = self.classes.read().ids().collect();
        let owl_class = Value::Resource(self.vocab.owl_class.clone());
        for sid in self.store.get_triples_po(&self.vocab.rdf_type, &owl_class)? {
            if sid.is_internal() {
                continue;
            }
            if let Some(c) = self.resolve_class(&sid, only_loaded)? {
                out.insert(c);
            }
        }
        Ok(out)
    }

    fn resolve_class(&self, sid: &StoreId, only_loaded: bool) -> Result<Option<ClassId>> {
        if only_loaded {
            return Ok(self.class_by_store_id(sid));
        }
        Ok(self.load_concept(sid)?.and_then(Concept::as_class))
    }

    /// Direct subclasses, one store query deep, plus loaded classes whose
    /// bases name `c`.
    pub fn subclasses(&self, c: ClassId, only_loaded: bool) -> Result<Vec<ClassId>> {
        let mut out = Vec::new();
        if c == ClassId::THING {
            // Top-level classes: typed owl:Class with no named parent.
            let owl_class = Value::Resource(self.vocab.owl_class.clone());
            for sid in self.store.get_triples_po(&self.vocab.rdf_type, &owl_class)? {
                if sid.is_internal() || sid == self.vocab.owl_thing {
                    continue;
                }
                let parents = self.store.get_triples_sp(&sid, &self.vocab.subclass_of)?;
                let top = parents.iter()
                    .filter_map(Value::as_resource)
                    .all(|p| p.is_internal() || *p == self.vocab.owl_thing);
                if top && let Some(d) = self.resolve_class(&sid, only_loaded)? {
                    out.push(d);
                }
            }
        } else {
            let target = Value::Resource(self.store_id(c));
            for sid in self.store.get_triples_po(&self.vocab.subclass_of, &target)? {
                if sid.is_internal() {
                    continue;
                }
                if let Some(d) = self.resolve_class(&sid, only_loaded)? {
                    out.push(d);
                }
            }
        }
        out.extend(self.classes.read().children(c));
        Ok(dedup(out))
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Subsumption test: linearization first, then the merged ancestor set.
    pub fn is_subclass_of(&self, c: ClassId, parent: ClassId) -> Result<bool> {
        if c == parent || parent == ClassId::THING || self.classes.read().get(c).inherits_from(parent) {
            return Ok(true);
        }
        let sid = self.store_id(c);
        let psid = self.store_id(parent);
        if self.store.get_transitive_sp(&sid, &self.vocab.subclass_of)?.contains(&psid) {
            return Ok(true);
        }
        Ok(self.ancestors(c, true)?.contains(&parent))
    }

    /// Named individuals typed directly by `c`.
    pub fn instances(&self, c: ClassId) -> Result<Vec<StoreId>> {
        let target = Value::Resource(self.store_id(c));
        Ok(self.store.get_triples_po(&self.vocab.rdf_type, &target)?
            .into_iter()
            .filter(|s| !s.is_internal())
            .collect())
    }
}
