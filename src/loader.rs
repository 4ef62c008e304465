//! Materialization of entities from the store.
//!
//! Classes are registered in loading mode: their parents are read from
//! the store and set through the propagator without writing anything
//! back. Blank-node constructs are parsed and interned by identifier.

use hashbrown::HashSet;
use tracing::debug;

use crate::model::{
    split_iri, ClassEntity, Concept, Construct, ConstructId, ConstructNode, ContextId, Filler,
    NamespaceId, Property, PropertyId, PropertyKind, Restriction, RestrictionKind, StoreId, Value,
};
use crate::storage::TripleStore;
use crate::world::World;
use crate::Result;

impl<S: TripleStore> World<S> {
    /// Resolve a store identifier to a class or construct, materializing
    /// it on first sight. `None` when the identifier names neither.
    pub fn load(&self, id: &StoreId) -> Result<Option<Concept>> {
        if let Some(c) = self.classes.read().lookup(id) {
            return Ok(Some(Concept::Class(c)));
        }
        if let Some(k) = self.constructs.read().lookup(id) {
            return Ok(Some(Concept::Construct(k)));
        }
        if id.is_internal() {
            return Ok(self.parse_construct(id)?.map(Concept::Construct));
        }
        if self.is_stored_class(id)? {
            return Ok(Some(self.load_class(id)?));
        }
        Ok(None)
    }

    /// Like [`load`](Self::load), but an untyped named resource found in
    /// class position is taken to be a class.
    pub(crate) fn load_concept(&self, id: &StoreId) -> Result<Option<Concept>> {
        match self.load(id)? {
            Some(concept) => Ok(Some(concept)),
            None if id.is_internal() => Ok(None),
            None if self.properties.read().lookup(id).is_some() => Ok(None),
            None => self.load_class(id).map(Some),
        }
    }

    fn is_stored_class(&self, id: &StoreId) -> Result<bool> {
        let v = &self.vocab;
        let types = self.store.get_triples_sp(id, &v.rdf_type)?;
        if types.iter().any(|t| t.as_resource() == Some(&v.owl_class)) {
            return Ok(true);
        }
        Ok(self.store.get_triple_sp(id, &v.subclass_of)?.is_some())
    }

    /// First context holding a triple about `id`.
    fn context_of(&self, id: &StoreId) -> Result<ContextId> {
        let ctx = self.store.get_quads(Some(id), None, None, None)?
            .first()
            .map_or(ContextId(0), |q| q.c);
        self.ensure_ontology(ctx);
        Ok(ctx)
    }

    /// `(namespace, name)` for a named resource.
    fn naming_of(&self, id: &StoreId, ctx: ContextId) -> Result<(NamespaceId, String)> {
        let iri = self.store.unabbreviate(id)?;
        let (base, name) = match iri.as_deref().and_then(split_iri) {
            Some((base, name)) => (base.to_string(), name.to_string()),
            None => (String::new(), iri.unwrap_or_else(|| id.to_string())),
        };
        Ok((self.get_namespace(ctx, &base), name))
    }

    // ========================================================================
    // Classes
    // ========================================================================

    fn load_class(&self, id: &StoreId) -> Result<Concept> {
        let ctx = self.context_of(id)?;
        let (ns, name) = self.naming_of(id, ctx)?;

        let (c, created) = self.classes.write().get_or_insert_with(id.clone(), |c| {
            ClassEntity::new(c, id.clone(), name.as_str(), ns)
        });
        if !created {
            return Ok(Concept::Class(c));
        }
        debug!(class = %id, name, "class materialized from store");

        // Registered before its parents so cycles resolve to this slot.
        let mut parents = Vec::new();
        for o in self.store.get_triples_sp(id, &self.vocab.subclass_of)? {
            let Some(o) = o.as_resource() else { continue };
            if let Some(parent) = self.load_concept(o)? {
                parents.push(parent);
            }
        }
        self.set_is_a_inner(c, parents, true)?;
        Ok(Concept::Class(c))
    }

    // ========================================================================
    // Properties
    // ========================================================================

    /// Property registered under `id`, read from its `rdf:type` triples
    /// if needed. Untyped properties are taken as object properties.
    pub(crate) fn load_property(&self, id: &StoreId) -> Result<PropertyId> {
        if let Some(p) = self.properties.read().lookup(id) {
            return Ok(p);
        }
        let v = &self.vocab;
        let types: Vec<StoreId> = self.store.get_triples_sp(id, &v.rdf_type)?
            .into_iter()
            .filter_map(|t| t.as_resource().cloned())
            .collect();
        let kind = if types.contains(&v.datatype_property) {
            PropertyKind::Data
        } else if types.contains(&v.annotation_property) {
            PropertyKind::Annotation
        } else {
            PropertyKind::Object
        };
        let functional = types.contains(&v.functional_property);

        let ctx = self.context_of(id)?;
        let (ns, name) = self.naming_of(id, ctx)?;
        let (p, _) = self.properties.write().get_or_insert_with(id.clone(), |p| Property {
            id: p,
            store_id: id.clone(),
            name,
            namespace: ns,
            kind,
            functional,
        });
        Ok(p)
    }

    // ========================================================================
    // Constructs
    // ========================================================================

    fn parse_construct(&self, id: &StoreId) -> Result<Option<ConstructId>> {
        let v = &self.vocab;
        let resource = |p: &StoreId| -> Result<Option<StoreId>> {
            Ok(self.store.get_triple_sp(id, p)?.and_then(|o| o.as_resource().cloned()))
        };

        let mut list_nodes = Vec::new();
        let construct = if let Some(prop) = resource(&v.on_property)? {
            // owl:inverseOf expressions are not modeled
            if prop.is_internal() {
                return Ok(None);
            }
            let property = self.load_property(&prop)?;
            match self.parse_restriction(id, property)? {
                Some(r) => Construct::Restriction(r),
                None => return Ok(None),
            }
        } else if let Some(head) = resource(&v.intersection_of)? {
            let (items, cells) = self.read_list(&head)?;
            list_nodes = cells;
            Construct::And(self.load_all(&items)?)
        } else if let Some(head) = resource(&v.union_of)? {
            let (items, cells) = self.read_list(&head)?;
            list_nodes = cells;
            Construct::Or(self.load_all(&items)?)
        } else if let Some(target) = resource(&v.complement_of)? {
            match self.load_concept(&target)? {
                Some(c) => Construct::Not(c),
                None => return Ok(None),
            }
        } else if let Some(head) = resource(&v.one_of)? {
            let (items, cells) = self.read_list(&head)?;
            list_nodes = cells;
            Construct::OneOf(items)
        } else {
            return Ok(None);
        };

        let ontology = self.store.get_quads(Some(id), None, None, None)?.first().map(|q| q.c);
        let k = self.constructs.write().insert_with(id.clone(), |k| ConstructNode {
            id: k,
            store_id: id.clone(),
            construct,
            ontology,
            list_nodes,
        });
        Ok(Some(k))
    }

    fn parse_restriction(&self, id: &StoreId, property: PropertyId) -> Result<Option<Restriction>> {
        let v = &self.vocab;
        let get = |p: &StoreId| self.store.get_triple_sp(id, p);

        if let Some(value) = get(&v.has_value)? {
            return Ok(Some(Restriction::has_value(property, value)));
        }
        for (p, kind) in [(&v.some_values_from, RestrictionKind::Some), (&v.all_values_from, RestrictionKind::Only)] {
            let Some(Value::Resource(target)) = get(p)? else { continue };
            let Some(filler) = self.load_concept(&target)? else { return Ok(None) };
            return Ok(Some(Restriction { property, kind, filler: Filler::Concept(filler), cardinality: None }));
        }

        let on_class = match get(&v.on_class)? {
            Some(Value::Resource(target)) => self.load_concept(&target)?,
            _ => None,
        };
        let cardinalities = [
            (&v.cardinality, RestrictionKind::Exactly),
            (&v.qualified_cardinality, RestrictionKind::Exactly),
            (&v.min_cardinality, RestrictionKind::Min),
            (&v.min_qualified_cardinality, RestrictionKind::Min),
            (&v.max_cardinality, RestrictionKind::Max),
            (&v.max_qualified_cardinality, RestrictionKind::Max),
        ];
        for (p, kind) in cardinalities {
            let Some(n) = get(p)?.and_then(|n| n.as_int()) else { continue };
            let n = u32::try_from(n).unwrap_or(0);
            return Ok(Some(Restriction::cardinality(property, kind, n, on_class)));
        }
        Ok(None)
    }

    fn load_all(&self, items: &[Value]) -> Result<Vec<Concept>> {
        let mut out = Vec::with_capacity(items.len());
        for item in items {
            let Some(id) = item.as_resource() else { continue };
            if let Some(concept) = self.load_concept(id)? {
                out.push(concept);
            }
        }
        Ok(out)
    }

    /// Items and cells of the RDF list starting at `head`.
    pub(crate) fn read_list(&self, head: &StoreId) -> Result<(Vec<Value>, Vec<StoreId>)> {
        let v = &self.vocab;
        let mut items = Vec::new();
        let mut cells = Vec::new();
        let mut seen: HashSet<StoreId> = HashSet::new();
        let mut cell = head.clone();

        while cell != v.rdf_nil && seen.insert(cell.clone()) {
            if let Some(item) = self.store.get_triple_sp(&cell, &v.rdf_first)? {
                items.push(item);
            }
            let next = self.store.get_triple_sp(&cell, &v.rdf_rest)?;
            cells.push(cell);
            match next {
                Some(Value::Resource(next)) => cell = next,
                _ => break,
            }
        }
        Ok((items, cells))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WorldConfig;
    use crate::model::ClassId;
    use crate::storage::MemoryStore;
    use pretty_assertions::assert_eq;

    const ZOO: &str = "http://example.org/zoo#";

    /// Store holding `Dog ⊑ Animal`, `Dog ⊑ (hasLegs VALUE 4)`.
    fn populated() -> MemoryStore {
        let store = MemoryStore::new();
        let ctx = ContextId(1);
        let id = |local: &str| store.abbreviate(&format!("{ZOO}{local}")).unwrap();
        let owl = |local: &str| store.abbreviate(&format!("{}{local}", crate::vocab::OWL_NS)).unwrap();
        let rdf_type = store.abbreviate(&format!("{}type", crate::vocab::RDF_NS)).unwrap();
        let sub = store.abbreviate(&format!("{}subClassOf", crate::vocab::RDFS_NS)).unwrap();
        let r = |x: StoreId| Value::Resource(x);

        let (dog, animal, legs) = (id("Dog"), id("Animal"), id("hasLegs"));
        store.add_triple(ctx, &animal, &rdf_type, &r(owl("Class"))).unwrap();
        store.add_triple(ctx, &dog, &rdf_type, &r(owl("Class"))).unwrap();
        store.add_triple(ctx, &legs, &rdf_type, &r(owl("DatatypeProperty"))).unwrap();
        store.add_triple(ctx, &legs, &rdf_type, &r(owl("FunctionalProperty"))).unwrap();
        store.add_triple(ctx, &dog, &sub, &r(animal)).unwrap();

        let b = store.new_blank_node().unwrap();
        store.add_triple(ctx, &b, &rdf_type, &r(owl("Restriction"))).unwrap();
        store.add_triple(ctx, &b, &owl("onProperty"), &r(legs)).unwrap();
        store.add_triple(ctx, &b, &owl("hasValue"), &Value::Int(4)).unwrap();
        store.add_triple(ctx, &dog, &sub, &r(b)).unwrap();
        store
    }

    #[test]
    fn test_load_materializes_parents_without_writes() {
        let store = populated();
        let before = store.triple_count().unwrap();
        let world = World::with_store(store, WorldConfig::default()).unwrap();

        let dog = world.class_by_iri(&format!("{ZOO}Dog")).unwrap().unwrap();
        let animal = world.class_by_iri(&format!("{ZOO}Animal")).unwrap().unwrap();

        assert_eq!(world.name(dog), "Dog");
        assert_eq!(world.namespace(world.namespace_of(dog)).base_iri, ZOO);
        assert_eq!(world.bases(dog).to_vec(), vec![animal]);
        assert_eq!(world.bases(animal).to_vec(), vec![ClassId::THING]);
        assert_eq!(world.mro(dog), vec![dog, animal, ClassId::THING]);
        assert_eq!(world.store().triple_count().unwrap(), before);
    }

    #[test]
    fn test_load_parses_restriction_and_property() {
        let world = World::with_store(populated(), WorldConfig::default()).unwrap();
        let dog = world.class_by_iri(&format!("{ZOO}Dog")).unwrap().unwrap();

        let k = world.is_a(dog).into_iter().find_map(Concept::as_construct).unwrap();
        let Construct::Restriction(r) = world.construct(k) else { panic!("expected restriction") };
        assert_eq!(r.value(), Some(&Value::Int(4)));
        let prop = world.property(r.property);
        assert_eq!(prop.name, "hasLegs");
        assert_eq!(prop.kind, PropertyKind::Data);
        assert!(prop.functional);
        assert_eq!(world.construct_ontology(k), Some(world.ontology_of(dog)));
    }

    #[test]
    fn test_load_is_identity_preserving() {
        let world = World::with_store(populated(), WorldConfig::default()).unwrap();
        let dog = world.class_by_iri(&format!("{ZOO}Dog")).unwrap().unwrap();
        let again = world.class_by_iri(&format!("{ZOO}Dog")).unwrap().unwrap();
        assert_eq!(dog, again);

        let k = world.is_a(dog).into_iter().find_map(Concept::as_construct).unwrap();
        let b = world.construct_store_id(k);
        assert_eq!(world.load(&b).unwrap(), Some(Concept::Construct(k)));
    }

    #[test]
    fn test_unknown_iri_is_none() {
        let world = World::with_store(populated(), WorldConfig::default()).unwrap();
        assert_eq!(world.class_by_iri(&format!("{ZOO}Unicorn")).unwrap(), None);
    }

    #[test]
    fn test_read_list_stops_on_cycle() {
        let world = World::open_memory().unwrap();
        let v = world.vocab().clone();
        let (a, b) = (world.store().new_blank_node().unwrap(), world.store().new_blank_node().unwrap());
        let ctx = ContextId(0);
        world.store().add_triple(ctx, &a, &v.rdf_first, &Value::Int(1)).unwrap();
        world.store().add_triple(ctx, &a, &v.rdf_rest, &Value::Resource(b.clone())).unwrap();
        world.store().add_triple(ctx, &b, &v.rdf_first, &Value::Int(2)).unwrap();
        world.store().add_triple(ctx, &b, &v.rdf_rest, &Value::Resource(a.clone())).unwrap();

        let (items, cells) = world.read_list(&a).unwrap();
        assert_eq!(items, vec![Value::Int(1), Value::Int(2)]);
        assert_eq!(cells, vec![a, b]);
    }
}
