//! Per-world cache table.
//!
//! Nothing here is persisted. Every entry is derived from the registry and
//! the store, and the change propagator drops entries synchronously.

use hashbrown::{HashMap, HashSet};

use crate::model::{ClassId, Concept, PropertyId};

#[derive(Debug, Default)]
pub(crate) struct CacheTable {
    equivalents: HashMap<ClassId, Vec<Concept>>,
    functional: HashMap<ClassId, HashMap<PropertyId, bool>>,
    /// keyed by (class, include_self)
    ancestors: HashMap<(ClassId, bool), HashSet<ClassId>>,
    /// keyed by (class, include_self, only_loaded)
    descendants: HashMap<(ClassId, bool, bool), HashSet<ClassId>>,
}

impl CacheTable {
    // ========================================================================
    // Equivalence sets
    // ========================================================================

    pub fn equivalents(&self, c: ClassId) -> Option<Vec<Concept>> {
        self.equivalents.get(&c).cloned()
    }

    pub fn store_equivalents(&mut self, c: ClassId, eqs: Vec<Concept>) {
        self.equivalents.insert(c, eqs);
    }

    pub fn invalidate_equivalents(&mut self, c: ClassId) {
        self.equivalents.remove(&c);
    }

    // ========================================================================
    // Functional-for
    // ========================================================================

    pub fn functional(&self, c: ClassId, p: PropertyId) -> Option<bool> {
        self.functional.get(&c).and_then(|m| m.get(&p).copied())
    }

    pub fn store_functional(&mut self, c: ClassId, p: PropertyId, functional: bool) {
        self.functional.entry(c).or_default().insert(p, functional);
    }

    /// Restrictions are inherited through conjunction members as well as
    /// bases, so a hierarchy edit can change the answer for classes that are
    /// not descendants of the edited one.
    pub fn clear_functional(&mut self) {
        self.functional.clear();
    }

    pub fn has_functional(&self, c: ClassId) -> bool {
        self.functional.contains_key(&c)
    }

    // ========================================================================
    // Hierarchy
    // ========================================================================

    pub fn ancestors(&self, c: ClassId, include_self: bool) -> Option<HashSet<ClassId>> {
        self.ancestors.get(&(c, include_self)).cloned()
    }

    pub fn store_ancestors(&mut self, c: ClassId, include_self: bool, set: HashSet<ClassId>) {
        self.ancestors.insert((c, include_self), set);
    }

    pub fn invalidate_ancestors(&mut self, c: ClassId) {
        self.ancestors.remove(&(c, true));
        self.ancestors.remove(&(c, false));
    }

    pub fn descendants(&self, c: ClassId, include_self: bool, only_loaded: bool) -> Option<HashSet<ClassId>> {
        self.descendants.get(&(c, include_self, only_loaded)).cloned()
    }

    pub fn store_descendants(&mut self, c: ClassId, include_self: bool, only_loaded: bool, set: HashSet<ClassId>) {
        self.descendants.insert((c, include_self, only_loaded), set);
    }

    /// Descendant sets depend on the store and on which entities are
    /// materialized, so any structural change drops all of them.
    pub fn clear_descendants(&mut self) {
        self.descendants.clear();
    }

    pub fn clear_hierarchy(&mut self) {
        self.ancestors.clear();
        self.descendants.clear();
    }
}
