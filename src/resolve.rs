//! Property resolution through inherited restrictions.
//!
//! Reading property `P` on class `C`:
//!
//! ```text
//! annotation?  → values attached directly to C, no inheritance
//! otherwise    → VALUE restrictions on P reachable from C's is_a and
//!                equivalents (direct ones first, then parents, depth-first)
//!                → one value if P is functional for C, all of them otherwise
//! ```

use hashbrown::HashSet;
use tracing::debug;

use crate::model::{CallbackList, ClassId, Concept, Construct, ConstructId, PropertyId, Restriction, Value};
use crate::storage::TripleStore;
use crate::world::{dedup, World};
use crate::Result;

/// Result of reading a property on a class.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValues {
    /// Functional property: at most one value.
    Single(Option<Value>),
    /// Non-functional property: every value, in resolution order.
    Many(Vec<Value>),
}

impl PropertyValues {
    pub fn first(&self) -> Option<&Value> {
        match self {
            PropertyValues::Single(v) => v.as_ref(),
            PropertyValues::Many(vs) => vs.first(),
        }
    }

    pub fn into_vec(self) -> Vec<Value> {
        match self {
            PropertyValues::Single(v) => v.into_iter().collect(),
            PropertyValues::Many(vs) => vs,
        }
    }
}

impl<S: TripleStore> World<S> {
    // ========================================================================
    // Reads
    // ========================================================================

    /// Read property `name` on class `c`.
    pub fn get_property(&self, c: ClassId, name: &str) -> Result<PropertyValues> {
        let p = self.property_by_name(name)?;
        let prop = self.property(p);
        if prop.is_annotation() {
            let values = self.store.get_triples_sp(&self.store_id(c), &prop.store_id)?;
            return Ok(PropertyValues::Many(values));
        }

        let values = self.inherited_values(c, p)?;
        if self.is_functional_for(c, p)? {
            Ok(PropertyValues::Single(values.into_iter().next()))
        } else {
            Ok(PropertyValues::Many(values))
        }
    }

    /// Values of every VALUE restriction on `p` that `c` inherits, first
    /// occurrence kept.
    pub fn inherited_values(&self, c: ClassId, p: PropertyId) -> Result<Vec<Value>> {
        let mut out: Vec<Value> = Vec::new();
        for r in self.inherited_restrictions(c, p)? {
            if let Some(v) = r.value()
                && !out.contains(v)
            {
                out.push(v.clone());
            }
        }
        Ok(out)
    }

    /// Restrictions on `p` governing `c`: its own first, then those of each
    /// parent and equivalent class, depth-first.
    pub fn inherited_restrictions(&self, c: ClassId, p: PropertyId) -> Result<Vec<Restriction>> {
        let mut out = Vec::new();
        let mut visited: HashSet<ClassId> = HashSet::new();
        self.collect_restrictions(c, p, &mut visited, &mut out)?;
        Ok(out)
    }

    fn collect_restrictions(
        &self,
        c: ClassId,
        p: PropertyId,
        visited: &mut HashSet<ClassId>,
        out: &mut Vec<Restriction>,
    ) -> Result<()> {
        if !visited.insert(c) {
            return Ok(());
        }
        let mut direct = self.is_a(c);
        direct.extend(self.equivalent_to(c)?);

        let mut parents: Vec<ClassId> = Vec::new();
        for concept in direct {
            match concept {
                Concept::Class(parent) => parents.push(parent),
                Concept::Construct(k) => self.restrictions_in(k, p, &mut parents, out),
            }
        }
        for parent in dedup(parents) {
            self.collect_restrictions(parent, p, visited, out)?;
        }
        Ok(())
    }

    /// Restrictions on `p` at `k` or inside its conjunctions. Classes met
    /// inside conjunctions are queued as parents.
    fn restrictions_in(&self, k: ConstructId, p: PropertyId, parents: &mut Vec<ClassId>, out: &mut Vec<Restriction>) {
        let mut seen: HashSet<ConstructId> = HashSet::new();
        let mut stack = vec![k];
        while let Some(k) = stack.pop() {
            if !seen.insert(k) {
                continue;
            }
            match self.construct(k) {
                Construct::Restriction(r) if r.property == p => out.push(r),
                Construct::And(items) => {
                    // reversed so members are visited in list order
                    for item in items.into_iter().rev() {
                        match item {
                            Concept::Construct(inner) => stack.push(inner),
                            Concept::Class(class) => parents.push(class),
                        }
                    }
                }
                _ => {}
            }
        }
    }

    /// `p` is functional for `c` when declared functional, or when an
    /// inherited restriction caps it at one value. Cached per class.
    pub fn is_functional_for(&self, c: ClassId, p: PropertyId) -> Result<bool> {
        let cached = self.cache.lock().functional(c, p);
        if let Some(functional) = cached {
            return Ok(functional);
        }
        let functional = self.property(p).functional
            || self.inherited_restrictions(c, p)?.iter().any(Restriction::caps_at_one);
        self.cache.lock().store_functional(c, p, functional);
        Ok(functional)
    }

    // ========================================================================
    // Writes
    // ========================================================================

    /// Set the single value of a property on `c`; `None` clears it.
    pub fn set_value(&mut self, c: ClassId, name: &str, value: Option<Value>) -> Result<()> {
        self.values_mut(c, name)?.reinit(value)
    }

    /// Replace all values of a property on `c`.
    pub fn set_values(&mut self, c: ClassId, name: &str, values: Vec<Value>) -> Result<()> {
        self.values_mut(c, name)?.reinit(values)
    }

    /// Live view over the values of property `name` on `c`.
    ///
    /// Removing a value drops the matching VALUE restriction from `c`'s own
    /// `is_a`; inherited values are not affected. Adding a value appends a
    /// new VALUE restriction. Annotation views edit the annotation triples.
    pub fn values_mut(&mut self, c: ClassId, name: &str) -> Result<CallbackList<'_, Value>> {
        let p = self.property_by_name(name)?;
        let items = self.get_property(c, name)?.into_vec();
        let annotation = self.property(p).is_annotation();
        let world: &Self = self;
        Ok(CallbackList::new(items, move |old: &[Value], new: &[Value]| {
            if annotation {
                world.on_annotation_changed(c, p, old, new)
            } else {
                world.on_class_prop_changed(c, p, old, new)
            }
        }))
    }

    fn on_class_prop_changed(&self, c: ClassId, p: PropertyId, old: &[Value], new: &[Value]) -> Result<()> {
        let removed: Vec<&Value> = old.iter().filter(|v| !new.contains(v)).collect();
        let added: Vec<&Value> = new.iter().filter(|v| !old.contains(v)).collect();

        let mut is_a = self.is_a(c);
        is_a.retain(|concept| {
            let Concept::Construct(k) = concept else { return true };
            let construct = self.construct(*k);
            !construct.as_restriction()
                .is_some_and(|r| r.property == p && r.value().is_some_and(|v| removed.contains(&v)))
        });
        for value in added {
            is_a.push(self.has_value(p, value.clone())?);
        }
        debug!(class = %self.store_id(c), property = %self.property(p).name, "class property changed");
        self.set_is_a_inner(c, is_a, self.config.bulk_load)
    }

    fn on_annotation_changed(&self, c: ClassId, p: PropertyId, old: &[Value], new: &[Value]) -> Result<()> {
        if self.config.bulk_load {
            return Ok(());
        }
        let sid = self.store_id(c);
        let prop = self.property(p).store_id;
        let ctx = self.ontology_of(c);
        for v in old.iter().filter(|v| !new.contains(v)) {
            self.store.del_triple(ctx, &sid, &prop, v)?;
        }
        for v in new.iter().filter(|v| !old.contains(v)) {
            self.store.add_triple(ctx, &sid, &prop, v)?;
        }
        Ok(())
    }
}
