//! Logical constructs: creation, ownership and their blank-node triples.
//!
//! A construct is created detached. Referencing it from a class's `is_a`
//! or equivalence set attaches it to that class's ontology, which writes
//! its triples; dropping the reference releases it, which deletes them.

use hashbrown::HashSet;
use tracing::trace;

use crate::model::{
    ClassId, Concept, Construct, ConstructId, ConstructNode, ContextId, Filler, PropertyId,
    Restriction, RestrictionKind, StoreId, Value,
};
use crate::storage::TripleStore;
use crate::world::World;
use crate::Result;

type Triple = (StoreId, StoreId, Value);

impl<S: TripleStore> World<S> {
    // ========================================================================
    // Creation
    // ========================================================================

    /// Allocate a detached construct on a fresh blank node.
    pub fn new_construct(&self, construct: Construct) -> Result<ConstructId> {
        let store_id = self.store.new_blank_node()?;
        let cells = match &construct {
            Construct::And(items) | Construct::Or(items) => items.len(),
            Construct::OneOf(values) => values.len(),
            _ => 0,
        };
        let list_nodes = (0..cells)
            .map(|_| self.store.new_blank_node())
            .collect::<Result<Vec<_>>>()?;

        let k = self.constructs.write().insert_with(store_id.clone(), |k| ConstructNode {
            id: k,
            store_id,
            construct,
            ontology: None,
            list_nodes,
        });
        Ok(k)
    }

    pub fn has_value(&self, p: PropertyId, value: impl Into<Value>) -> Result<Concept> {
        self.restriction(Restriction::has_value(p, value))
    }

    pub fn some(&self, p: PropertyId, class: impl Into<Concept>) -> Result<Concept> {
        self.restriction(Restriction::some(p, class))
    }

    pub fn only(&self, p: PropertyId, class: impl Into<Concept>) -> Result<Concept> {
        self.restriction(Restriction::only(p, class))
    }

    pub fn exactly(&self, p: PropertyId, n: u32, class: Option<Concept>) -> Result<Concept> {
        self.restriction(Restriction::cardinality(p, RestrictionKind::Exactly, n, class))
    }

    pub fn min(&self, p: PropertyId, n: u32, class: Option<Concept>) -> Result<Concept> {
        self.restriction(Restriction::cardinality(p, RestrictionKind::Min, n, class))
    }

    pub fn max(&self, p: PropertyId, n: u32, class: Option<Concept>) -> Result<Concept> {
        self.restriction(Restriction::cardinality(p, RestrictionKind::Max, n, class))
    }

    pub fn and(&self, items: Vec<Concept>) -> Result<Concept> {
        Ok(Concept::Construct(self.new_construct(Construct::And(items))?))
    }

    pub fn or(&self, items: Vec<Concept>) -> Result<Concept> {
        Ok(Concept::Construct(self.new_construct(Construct::Or(items))?))
    }

    pub fn not(&self, item: impl Into<Concept>) -> Result<Concept> {
        Ok(Concept::Construct(self.new_construct(Construct::Not(item.into()))?))
    }

    pub fn one_of(&self, values: Vec<Value>) -> Result<Concept> {
        Ok(Concept::Construct(self.new_construct(Construct::OneOf(values))?))
    }

    fn restriction(&self, r: Restriction) -> Result<Concept> {
        Ok(Concept::Construct(self.new_construct(Construct::Restriction(r))?))
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn construct(&self, k: ConstructId) -> Construct {
        self.constructs.read().get(k).construct.clone()
    }

    pub fn construct_store_id(&self, k: ConstructId) -> StoreId {
        self.constructs.read().get(k).store_id.clone()
    }

    /// Owning ontology, `None` while detached.
    pub fn construct_ontology(&self, k: ConstructId) -> Option<ContextId> {
        self.constructs.read().get(k).ontology
    }

    /// True if the construct tree under `k` restricts `p`.
    pub fn mentions_property(&self, k: ConstructId, p: PropertyId) -> bool {
        let mut seen: HashSet<ConstructId> = HashSet::new();
        let mut stack = vec![k];
        while let Some(k) = stack.pop() {
            if !seen.insert(k) {
                continue;
            }
            let construct = self.construct(k);
            if construct.as_restriction().is_some_and(|r| r.property == p) {
                return true;
            }
            stack.extend(construct.operands().into_iter().filter_map(Concept::as_construct));
        }
        false
    }

    // ========================================================================
    // Ownership
    // ========================================================================

    /// Move `k` (and the constructs nested in it) to `ontology`.
    ///
    /// Releasing deletes the construct's triples from its old context,
    /// attaching writes them into the new one. While loading, only the
    /// in-memory owner changes.
    pub(crate) fn set_construct_ontology(
        &self,
        k: ConstructId,
        ontology: Option<ContextId>,
        loading: bool,
    ) -> Result<()> {
        let (old, nested) = {
            let arena = self.constructs.read();
            let node = arena.get(k);
            let nested: Vec<ConstructId> = node.construct.operands().into_iter()
                .filter_map(Concept::as_construct)
                .collect();
            (node.ontology, nested)
        };
        if old == ontology {
            return Ok(());
        }

        if let (Some(ctx), false) = (old, loading) {
            self.delete_construct_triples(k, ctx)?;
        }
        self.constructs.write().get_mut(k).ontology = ontology;
        for child in nested {
            self.set_construct_ontology(child, ontology, loading)?;
        }
        if let (Some(ctx), false) = (ontology, loading) {
            for (s, p, o) in self.construct_triples(k)? {
                self.store.add_triple(ctx, &s, &p, &o)?;
            }
        }
        trace!(construct = %self.construct_store_id(k), ?old, new = ?ontology, "construct ownership moved");
        Ok(())
    }

    /// Everything stored under the construct's own blank node and its list
    /// cells in `ctx`, including triples this model did not write.
    fn delete_construct_triples(&self, k: ConstructId, ctx: ContextId) -> Result<()> {
        let (store_id, cells) = {
            let arena = self.constructs.read();
            let node = arena.get(k);
            (node.store_id.clone(), node.list_nodes.clone())
        };
        for subject in std::iter::once(&store_id).chain(&cells) {
            for q in self.store.get_quads(Some(subject), None, None, Some(ctx))? {
                self.store.del_triple(ctx, &q.s, &q.p, &q.o)?;
            }
        }
        Ok(())
    }

    // ========================================================================
    // Triple layout
    // ========================================================================

    fn construct_triples(&self, k: ConstructId) -> Result<Vec<Triple>> {
        let node = self.constructs.read().get(k).clone();
        let v = &self.vocab;
        let b = node.store_id.clone();
        let res = |id: &StoreId| Value::Resource(id.clone());
        let mut out: Vec<Triple> = Vec::new();

        match &node.construct {
            Construct::Restriction(r) => {
                let prop = self.properties.read().get(r.property).store_id.clone();
                out.push((b.clone(), v.rdf_type.clone(), res(&v.restriction)));
                out.push((b.clone(), v.on_property.clone(), res(&prop)));
                let class = match &r.filler {
                    Filler::Concept(c) => Some(Value::Resource(self.concept_store_id(*c))),
                    _ => None,
                };
                let n = r.cardinality.map(|n| Value::Int(i64::from(n)));
                match (r.kind, &r.filler, class, n) {
                    (RestrictionKind::Value, Filler::Value(value), _, _) => {
                        out.push((b.clone(), v.has_value.clone(), value.clone()));
                    }
                    (RestrictionKind::Some, _, Some(class), _) => {
                        out.push((b.clone(), v.some_values_from.clone(), class));
                    }
                    (RestrictionKind::Only, _, Some(class), _) => {
                        out.push((b.clone(), v.all_values_from.clone(), class));
                    }
                    (kind, _, class, Some(n)) => {
                        let (plain, qualified) = match kind {
                            RestrictionKind::Min => (&v.min_cardinality, &v.min_qualified_cardinality),
                            RestrictionKind::Max => (&v.max_cardinality, &v.max_qualified_cardinality),
                            _ => (&v.cardinality, &v.qualified_cardinality),
                        };
                        match class {
                            Some(class) => {
                                out.push((b.clone(), qualified.clone(), n));
                                out.push((b.clone(), v.on_class.clone(), class));
                            }
                            None => out.push((b.clone(), plain.clone(), n)),
                        }
                    }
                    _ => {}
                }
            }
            Construct::And(items) | Construct::Or(items) => {
                let p = if matches!(node.construct, Construct::And(_)) { &v.intersection_of } else { &v.union_of };
                let values: Vec<Value> = items.iter()
                    .map(|c| Value::Resource(self.concept_store_id(*c)))
                    .collect();
                out.push((b.clone(), v.rdf_type.clone(), res(&v.owl_class)));
                let head = self.list_triples(&node.list_nodes, &values, &mut out);
                out.push((b.clone(), p.clone(), head));
            }
            Construct::Not(c) => {
                out.push((b.clone(), v.rdf_type.clone(), res(&v.owl_class)));
                out.push((b.clone(), v.complement_of.clone(), Value::Resource(self.concept_store_id(*c))));
            }
            Construct::OneOf(values) => {
                out.push((b.clone(), v.rdf_type.clone(), res(&v.owl_class)));
                let head = self.list_triples(&node.list_nodes, values, &mut out);
                out.push((b.clone(), v.one_of.clone(), head));
            }
        }
        Ok(out)
    }

    /// RDF list over `cells`; returns the head (`rdf:nil` when empty).
    /// Items past the allocated cells are dropped.
    pub(crate) fn list_triples(&self, cells: &[StoreId], items: &[Value], out: &mut Vec<Triple>) -> Value {
        let v = &self.vocab;
        let n = cells.len().min(items.len());
        for i in 0..n {
            out.push((cells[i].clone(), v.rdf_first.clone(), items[i].clone()));
            let rest = match cells.get(i + 1).filter(|_| i + 1 < n) {
                Some(next) => Value::Resource(next.clone()),
                None => Value::Resource(v.rdf_nil.clone()),
            };
            out.push((cells[i].clone(), v.rdf_rest.clone(), rest));
        }
        match cells.first().filter(|_| n > 0) {
            Some(head) => Value::Resource(head.clone()),
            None => Value::Resource(v.rdf_nil.clone()),
        }
    }

    // ========================================================================
    // Reverse lookup
    // ========================================================================

    /// Top-level constructs whose blank-node structure mentions `c`,
    /// optionally only those restricting `property`.
    pub fn constructs_referencing(&self, c: ClassId, property: Option<PropertyId>) -> Result<Vec<ConstructId>> {
        let target = Value::Resource(self.store_id(c));
        let mut seen: HashSet<StoreId> = HashSet::new();
        let mut roots: Vec<StoreId> = Vec::new();
        let mut stack: Vec<StoreId> = self.store.get_quads(None, None, Some(&target), None)?
            .into_iter()
            .map(|q| q.s)
            .filter(StoreId::is_internal)
            .collect();

        // Climb from the referencing blank node to the outermost one.
        while let Some(node) = stack.pop() {
            if !seen.insert(node.clone()) {
                continue;
            }
            let parents: Vec<StoreId> = self.store
                .get_quads(None, None, Some(&Value::Resource(node.clone())), None)?
                .into_iter()
                .map(|q| q.s)
                .filter(StoreId::is_internal)
                .collect();
            if parents.is_empty() {
                roots.push(node);
            } else {
                stack.extend(parents);
            }
        }

        let mut out = Vec::new();
        for root in roots {
            let Some(Concept::Construct(k)) = self.load(&root)? else { continue };
            if property.is_none_or(|p| self.mentions_property(k, p)) && !out.contains(&k) {
                out.push(k);
            }
        }
        Ok(out)
    }
}
