//! Change propagation for `is_a` and equivalence edits.
//!
//! Every edit follows the same shape:
//!
//! ```text
//! snapshot affected classes (store reads only, may fail → nothing written)
//!   → record the new list in memory
//!   → delete triples for removed members, release their constructs
//!   → re-derive bases (is_a only)
//!   → attach added constructs, write triples for added members
//!   → invalidate caches (always, even if a write failed)
//! ```
//!
//! Deletions always precede insertions within one edit.

use hashbrown::HashSet;
use tracing::{debug, trace, warn};

use crate::model::{CallbackList, ClassId, Concept, StoreId, Value};
use crate::storage::TripleStore;
use crate::world::{dedup, World};
use crate::Result;

/// `(removed, added)` by identity, each in list order.
fn diff(old: &[Concept], new: &[Concept]) -> (Vec<Concept>, Vec<Concept>) {
    let old_set: HashSet<Concept> = old.iter().copied().collect();
    let new_set: HashSet<Concept> = new.iter().copied().collect();
    let removed = dedup(old.iter().copied().filter(|c| !new_set.contains(c)));
    let added = dedup(new.iter().copied().filter(|c| !old_set.contains(c)));
    (removed, added)
}

impl<S: TripleStore> World<S> {
    // ========================================================================
    // Public edit API: is_a
    // ========================================================================

    /// Replace the super-relations of `c`.
    pub fn set_is_a(&mut self, c: ClassId, is_a: Vec<Concept>) -> Result<()> {
        let loading = self.config.bulk_load;
        self.set_is_a_inner(c, is_a, loading)
    }

    /// Append a super-relation. Returns false if it was already present.
    pub fn add_is_a(&mut self, c: ClassId, parent: impl Into<Concept>) -> Result<bool> {
        let parent = parent.into();
        let mut is_a = self.is_a(c);
        if is_a.contains(&parent) {
            return Ok(false);
        }
        is_a.push(parent);
        self.set_is_a(c, is_a)?;
        Ok(true)
    }

    /// Remove a super-relation. Returns false (and touches nothing) if it
    /// was not present.
    pub fn remove_is_a(&mut self, c: ClassId, parent: impl Into<Concept>) -> Result<bool> {
        let parent = parent.into();
        let mut is_a = self.is_a(c);
        let before = is_a.len();
        is_a.retain(|x| *x != parent);
        if is_a.len() == before {
            return Ok(false);
        }
        self.set_is_a(c, is_a)?;
        Ok(true)
    }

    /// Live view over `is_a`: every edit runs the propagation path.
    pub fn is_a_mut(&mut self, c: ClassId) -> CallbackList<'_, Concept> {
        let items = self.is_a(c);
        let world: &Self = self;
        CallbackList::new(items, move |_old: &[Concept], new: &[Concept]| {
            world.set_is_a_inner(c, new.to_vec(), world.config.bulk_load)
        })
    }

    // ========================================================================
    // Public edit API: equivalence
    // ========================================================================

    /// Replace the equivalence set of `c`.
    pub fn set_equivalent_to(&mut self, c: ClassId, eqs: Vec<Concept>) -> Result<()> {
        let loading = self.config.bulk_load;
        self.set_equivalents_inner(c, eqs, loading)
    }

    pub fn add_equivalent(&mut self, c: ClassId, other: impl Into<Concept>) -> Result<bool> {
        let other = other.into();
        let mut eqs = self.equivalent_to(c)?;
        if other == Concept::Class(c) || eqs.contains(&other) {
            return Ok(false);
        }
        eqs.push(other);
        self.set_equivalent_to(c, eqs)?;
        Ok(true)
    }

    /// Remove the stored equivalence between `c` and `other`. Returns false
    /// (and touches nothing) when no triple links the two directly, even if
    /// they are equivalent through a third class.
    pub fn remove_equivalent(&mut self, c: ClassId, other: impl Into<Concept>) -> Result<bool> {
        let other = other.into();
        if !self.linked_equivalent(c, other)? {
            return Ok(false);
        }
        let mut eqs = self.equivalent_to(c)?;
        eqs.retain(|x| *x != other);
        self.set_equivalent_to(c, eqs)?;
        Ok(true)
    }

    /// Live view over the equivalence set.
    pub fn equivalent_to_mut(&mut self, c: ClassId) -> Result<CallbackList<'_, Concept>> {
        let items = self.equivalent_to(c)?;
        let world: &Self = self;
        Ok(CallbackList::new(items, move |_old: &[Concept], new: &[Concept]| {
            world.set_equivalents_inner(c, new.to_vec(), world.config.bulk_load)
        }))
    }

    // ========================================================================
    // Propagation: is_a
    // ========================================================================

    pub(crate) fn set_is_a_inner(&self, c: ClassId, new: Vec<Concept>, loading: bool) -> Result<()> {
        let new = dedup(new);
        let old = self.is_a(c);
        let (removed, added) = diff(&old, &new);

        // Everything below `c` may see a different ancestor set now.
        let affected = self.affected_by(c)?;

        self.classes.write().get_mut(c).is_a = new;
        debug!(class = %self.store_id(c), removed = removed.len(), added = added.len(), loading, "is_a changed");

        let deleted = self.retract_is_a(c, &removed, loading);
        self.refresh_bases(c);
        let result = deleted.and_then(|_| self.assert_is_a(c, &added, loading));

        let mut cache = self.cache.lock();
        for d in &affected {
            cache.invalidate_ancestors(*d);
        }
        cache.clear_descendants();
        cache.clear_functional();
        drop(cache);
        trace!(class = %self.store_id(c), invalidated = affected.len(), "hierarchy caches dropped");

        if let Err(e) = &result {
            warn!(class = %self.store_id(c), error = %e, "is_a propagation failed; store may be out of sync");
        }
        result
    }

    fn retract_is_a(&self, c: ClassId, removed: &[Concept], loading: bool) -> Result<()> {
        let sid = self.store_id(c);
        let ctx = self.ontology_of(c);
        for &parent in removed {
            if !loading {
                let o = Value::Resource(self.concept_store_id(parent));
                self.store.del_triple(ctx, &sid, &self.vocab.subclass_of, &o)?;
            }
            if let Concept::Construct(k) = parent {
                self.set_construct_ontology(k, None, loading)?;
            }
        }
        Ok(())
    }

    fn assert_is_a(&self, c: ClassId, added: &[Concept], loading: bool) -> Result<()> {
        let sid = self.store_id(c);
        let ctx = self.ontology_of(c);
        for &parent in added {
            if let Concept::Construct(k) = parent {
                self.set_construct_ontology(k, Some(ctx), loading)?;
            }
            if !loading {
                let o = Value::Resource(self.concept_store_id(parent));
                self.store.add_triple(ctx, &sid, &self.vocab.subclass_of, &o)?;
            }
        }
        Ok(())
    }

    /// `c` plus everything below it, by the store and by loaded bases.
    fn affected_by(&self, c: ClassId) -> Result<HashSet<ClassId>> {
        let mut affected = self.descendants(c, true, true)?;
        let mut stack = vec![c];
        while let Some(x) = stack.pop() {
            let children = self.classes.read().children(x);
            for child in children {
                if affected.insert(child) {
                    stack.push(child);
                }
            }
        }
        Ok(affected)
    }

    // ========================================================================
    // Propagation: equivalence
    // ========================================================================

    pub(crate) fn set_equivalents_inner(&self, c: ClassId, new: Vec<Concept>, loading: bool) -> Result<()> {
        let new = dedup(new.into_iter().filter(|x| *x != Concept::Class(c)));
        let old = self.equivalent_to(c)?;
        let (removed, added) = diff(&old, &new);

        // Equivalence is symmetric and transitive: every class sharing a
        // component with `c` or with an added member may see a new set.
        let mut component: HashSet<ClassId> = HashSet::new();
        self.collect_component(&self.store_id(c), &mut component)?;
        for &x in &added {
            if let Concept::Class(x) = x {
                self.collect_component(&self.store_id(x), &mut component)?;
            }
        }

        debug!(class = %self.store_id(c), removed = removed.len(), added = added.len(), loading, "equivalent_to changed");
        let result = self.retract_equivalents(c, &removed, loading)
            .and_then(|_| self.assert_equivalents(c, &added, loading));

        let mut cache = self.cache.lock();
        for member in &component {
            cache.invalidate_equivalents(*member);
        }
        for x in removed.iter().chain(&added).filter_map(|x| x.as_class()) {
            cache.invalidate_equivalents(x);
        }
        // The edit itself may have introduced new transitive equivalents.
        cache.invalidate_equivalents(c);
        cache.clear_functional();
        cache.clear_hierarchy();
        drop(cache);

        if let Err(e) = &result {
            warn!(class = %self.store_id(c), error = %e, "equivalence propagation failed; store may be out of sync");
        }
        result
    }

    fn retract_equivalents(&self, c: ClassId, removed: &[Concept], loading: bool) -> Result<()> {
        let sid = self.store_id(c);
        let ctx = self.ontology_of(c);
        let p = &self.vocab.equivalent_class;
        for &x in removed {
            let xid = self.concept_store_id(x);
            if !loading {
                self.store.del_triple(ctx, &sid, p, &Value::Resource(xid.clone()))?;
                self.store.del_triple(ctx, &xid, p, &Value::Resource(sid.clone()))?;
            }
            if let Concept::Construct(k) = x {
                self.set_construct_ontology(k, None, loading)?;
            }
        }
        Ok(())
    }

    fn assert_equivalents(&self, c: ClassId, added: &[Concept], loading: bool) -> Result<()> {
        let sid = self.store_id(c);
        let ctx = self.ontology_of(c);
        for &x in added {
            if let Concept::Construct(k) = x {
                self.set_construct_ontology(k, Some(ctx), loading)?;
            }
            if !loading {
                let o = Value::Resource(self.concept_store_id(x));
                self.store.add_triple(ctx, &sid, &self.vocab.equivalent_class, &o)?;
            }
        }
        Ok(())
    }

    /// An `equivalentClass` triple between `c` and `other`, either direction.
    fn linked_equivalent(&self, c: ClassId, other: Concept) -> Result<bool> {
        let sid = self.store_id(c);
        let oid = self.concept_store_id(other);
        let p = &self.vocab.equivalent_class;
        Ok(self.store.get_triples_sp(&sid, p)?.contains(&Value::Resource(oid.clone()))
            || self.store.get_triples_sp(&oid, p)?.contains(&Value::Resource(sid)))
    }

    /// Loaded classes in the store's equivalence component of `sid`.
    fn collect_component(&self, sid: &StoreId, out: &mut HashSet<ClassId>) -> Result<()> {
        for member in self.store.get_transitive_sym(sid, &self.vocab.equivalent_class)? {
            if let Some(c) = self.class_by_store_id(&member) {
                out.insert(c);
            }
        }
        Ok(())
    }
}
