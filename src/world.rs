//! The world: one registry, one store, one cache table.

use parking_lot::{Mutex, RwLock};
use tracing::debug;

use crate::cache::CacheTable;
use crate::config::WorldConfig;
use crate::model::*;
use crate::registry::{ConstructArena, EntityRegistry, PropertyRegistry};
use crate::storage::{MemoryStore, TripleStore};
use crate::vocab::{Vocab, OWL_NS};
use crate::{Error, Result};

// ============================================================================
// World
// ============================================================================

/// Owner of the in-memory entity graph for one loaded store.
///
/// Mutating methods take `&mut self`, so at most one mutation is in flight.
/// Read methods take `&self`; the ones that materialize entities from the
/// store do so through short interior locks.
pub struct World<S: TripleStore> {
    pub(crate) store: S,
    pub(crate) vocab: Vocab,
    pub(crate) config: WorldConfig,
    pub(crate) ontologies: RwLock<Vec<Ontology>>,
    pub(crate) namespaces: RwLock<Vec<Namespace>>,
    pub(crate) classes: RwLock<EntityRegistry>,
    pub(crate) constructs: RwLock<ConstructArena>,
    pub(crate) properties: RwLock<PropertyRegistry>,
    pub(crate) cache: Mutex<CacheTable>,
}

/// Declaration handed to [`World::declare_class`].
#[derive(Debug, Clone)]
pub struct ClassDecl {
    pub namespace: NamespaceId,
    pub name: String,
    /// Explicit identifier; derived from namespace + name when absent.
    pub store_id: Option<StoreId>,
    pub is_a: Vec<Concept>,
    pub equivalent_to: Vec<Concept>,
}

impl ClassDecl {
    pub fn new(namespace: NamespaceId, name: impl Into<String>) -> Self {
        Self {
            namespace,
            name: name.into(),
            store_id: None,
            is_a: Vec::new(),
            equivalent_to: Vec::new(),
        }
    }

    pub fn is_a(mut self, parent: impl Into<Concept>) -> Self {
        self.is_a.push(parent.into());
        self
    }

    pub fn equivalent_to(mut self, other: impl Into<Concept>) -> Self {
        self.equivalent_to.push(other.into());
        self
    }

    pub fn with_store_id(mut self, id: StoreId) -> Self {
        self.store_id = Some(id);
        self
    }
}

pub(crate) fn kind_label(kind: PropertyKind) -> &'static str {
    match kind {
        PropertyKind::Object => "object property",
        PropertyKind::Data => "data property",
        PropertyKind::Annotation => "annotation property",
    }
}

/// Order-preserving dedup.
pub(crate) fn dedup<T: PartialEq + Copy>(items: impl IntoIterator<Item = T>) -> Vec<T> {
    let mut out: Vec<T> = Vec::new();
    for item in items {
        if !out.contains(&item) {
            out.push(item);
        }
    }
    out
}

/// In-memory world for testing and embedding.
impl World<MemoryStore> {
    pub fn open_memory() -> Result<Self> {
        Self::with_store(MemoryStore::new(), WorldConfig::default())
    }
}

impl<S: TripleStore> World<S> {
    /// Open a world over `store`. The OWL ontology (context 0) and its
    /// root class `owl:Thing` always exist.
    pub fn with_store(store: S, config: WorldConfig) -> Result<Self> {
        let vocab = Vocab::resolve(&store)?;
        let thing = vocab.owl_thing.clone();

        let mut classes = EntityRegistry::default();
        classes.get_or_insert_with(thing.clone(), |c| {
            ClassEntity::new(c, thing.clone(), "Thing", NamespaceId(0))
        });

        Ok(Self {
            store,
            vocab,
            config,
            ontologies: RwLock::new(vec![Ontology { context: ContextId(0), base_iri: OWL_NS.to_string() }]),
            namespaces: RwLock::new(vec![Namespace { base_iri: OWL_NS.to_string(), ontology: ContextId(0) }]),
            classes: RwLock::new(classes),
            constructs: RwLock::new(ConstructArena::default()),
            properties: RwLock::new(PropertyRegistry::default()),
            cache: Mutex::new(CacheTable::default()),
        })
    }

    /// Access the underlying store (for advanced use).
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn vocab(&self) -> &Vocab {
        &self.vocab
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    pub fn is_bulk_loading(&self) -> bool {
        self.config.bulk_load
    }

    pub fn set_bulk_load(&mut self, on: bool) {
        self.config.bulk_load = on;
    }

    /// Run `f` in bulk-load mode, restoring the previous mode afterwards.
    pub fn bulk_load<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        let previous = self.config.bulk_load;
        self.config.bulk_load = true;
        let out = f(self);
        self.config.bulk_load = previous;
        out
    }

    // ========================================================================
    // Ontologies & namespaces
    // ========================================================================

    /// Create (or find) the ontology with this base IRI.
    pub fn create_ontology(&mut self, base_iri: &str) -> Result<ContextId> {
        if !(base_iri.ends_with('#') || base_iri.ends_with('/')) {
            return Err(Error::InvalidIri(format!("{base_iri} (base IRI must end with '#' or '/')")));
        }
        let existing = self.ontologies.read().iter()
            .find(|o| o.base_iri == base_iri)
            .map(|o| o.context);
        if let Some(ctx) = existing {
            return Ok(ctx);
        }
        let ctx = {
            let mut ontologies = self.ontologies.write();
            let ctx = ContextId(ontologies.len() as u32);
            ontologies.push(Ontology { context: ctx, base_iri: base_iri.to_string() });
            ctx
        };
        self.get_namespace(ctx, base_iri);
        debug!(%ctx, base_iri, "ontology created");
        Ok(ctx)
    }

    pub fn ontology(&self, ctx: ContextId) -> Option<Ontology> {
        self.ontologies.read().get(ctx.0 as usize).cloned()
    }

    /// Make sure contexts found in the store have an ontology slot.
    pub(crate) fn ensure_ontology(&self, ctx: ContextId) {
        let mut ontologies = self.ontologies.write();
        while ontologies.len() <= ctx.0 as usize {
            let context = ContextId(ontologies.len() as u32);
            ontologies.push(Ontology { context, base_iri: String::new() });
        }
    }

    /// Namespace for the ontology's own base IRI.
    pub fn default_namespace(&self, ontology: ContextId) -> NamespaceId {
        let base = self.ontology(ontology).map(|o| o.base_iri).unwrap_or_default();
        self.get_namespace(ontology, &base)
    }

    /// Find or create the namespace `(ontology, base_iri)`.
    pub fn get_namespace(&self, ontology: ContextId, base_iri: &str) -> NamespaceId {
        let mut namespaces = self.namespaces.write();
        if let Some(pos) = namespaces.iter().position(|n| n.ontology == ontology && n.base_iri == base_iri) {
            return NamespaceId(pos as u32);
        }
        namespaces.push(Namespace { base_iri: base_iri.to_string(), ontology });
        NamespaceId(namespaces.len() as u32 - 1)
    }

    pub fn namespace(&self, ns: NamespaceId) -> Namespace {
        self.namespaces.read()[ns.index()].clone()
    }

    // ========================================================================
    // Entity registry: get-or-create
    // ========================================================================

    /// Declare a class, or extend the existing class with the same identifier.
    ///
    /// A known identifier gets the declared super-relations merged into its
    /// `is_a` (order kept, no duplicates) instead of a second entity.
    pub fn declare_class(&mut self, decl: ClassDecl) -> Result<ClassId> {
        let loading = self.config.bulk_load;
        self.get_or_create_class(decl, loading)
    }

    pub(crate) fn get_or_create_class(&self, decl: ClassDecl, loading: bool) -> Result<ClassId> {
        let ns = self.namespace(decl.namespace);
        let store_id = match decl.store_id {
            Some(id) => id,
            None => self.store.abbreviate(&ns.iri_for(&decl.name))?,
        };
        self.check_identifier(&store_id, "class")?;

        let existing = self.classes.read().lookup(&store_id);
        let class = match existing {
            Some(c) => {
                let current = self.is_a(c);
                let missing = dedup(decl.is_a.iter().copied().filter(|x| !current.contains(x)));
                if !missing.is_empty() {
                    let mut merged = current;
                    merged.extend(missing);
                    self.set_is_a_inner(c, merged, loading)?;
                }
                c
            }
            None => self.create_class(store_id, &decl.name, decl.namespace, dedup(decl.is_a), loading)?,
        };

        if !decl.equivalent_to.is_empty() {
            let mut eqs = self.equivalent_to(class)?;
            let before = eqs.len();
            for e in decl.equivalent_to {
                if e != Concept::Class(class) && !eqs.contains(&e) {
                    eqs.push(e);
                }
            }
            if eqs.len() != before {
                self.set_equivalents_inner(class, eqs, loading)?;
            }
        }
        Ok(class)
    }

    fn create_class(
        &self,
        store_id: StoreId,
        name: &str,
        namespace: NamespaceId,
        is_a: Vec<Concept>,
        loading: bool,
    ) -> Result<ClassId> {
        let ctx = self.namespace(namespace).ontology;
        for k in is_a.iter().filter_map(|c| c.as_construct()) {
            self.set_construct_ontology(k, Some(ctx), loading)?;
        }

        let (c, _) = self.classes.write().get_or_insert_with(store_id.clone(), |c| {
            ClassEntity::new(c, store_id.clone(), name, namespace).with_is_a(is_a.iter().copied())
        });
        self.refresh_bases(c);
        self.cache.lock().clear_descendants();
        debug!(class = %store_id, name, loading, "class registered");

        if !loading {
            let owl_class = Value::Resource(self.vocab.owl_class.clone());
            self.store.add_triple(ctx, &store_id, &self.vocab.rdf_type, &owl_class)?;
            for parent in &is_a {
                let o = Value::Resource(self.concept_store_id(*parent));
                self.store.add_triple(ctx, &store_id, &self.vocab.subclass_of, &o)?;
            }
        }
        Ok(c)
    }

    /// Fails with `IdentifierCollision` when `id` already names an entity
    /// of another kind, in memory or in the store.
    pub(crate) fn check_identifier(&self, id: &StoreId, requested: &'static str) -> Result<()> {
        match self.kind_of(id)? {
            Some(existing) if existing != requested => Err(Error::IdentifierCollision {
                id: id.clone(),
                existing,
                requested,
            }),
            _ => Ok(()),
        }
    }

    fn kind_of(&self, id: &StoreId) -> Result<Option<&'static str>> {
        if self.classes.read().lookup(id).is_some() {
            return Ok(Some("class"));
        }
        {
            let props = self.properties.read();
            if let Some(p) = props.lookup(id) {
                return Ok(Some(kind_label(props.get(p).kind)));
            }
        }
        let v = &self.vocab;
        for t in self.store.get_triples_sp(id, &v.rdf_type)? {
            let Some(t) = t.as_resource() else { continue };
            if *t == v.owl_class {
                return Ok(Some("class"));
            } else if *t == v.object_property {
                return Ok(Some(kind_label(PropertyKind::Object)));
            } else if *t == v.datatype_property {
                return Ok(Some(kind_label(PropertyKind::Data)));
            } else if *t == v.annotation_property {
                return Ok(Some(kind_label(PropertyKind::Annotation)));
            }
        }
        Ok(None)
    }

    // ========================================================================
    // Property registry
    // ========================================================================

    /// Declare a property in namespace `ns`.
    pub fn declare_property(
        &mut self,
        ns: NamespaceId,
        name: &str,
        kind: PropertyKind,
        functional: bool,
    ) -> Result<PropertyId> {
        let namespace = self.namespace(ns);
        let store_id = self.store.abbreviate(&namespace.iri_for(name))?;
        self.check_identifier(&store_id, kind_label(kind))?;

        let (p, created) = self.properties.write().get_or_insert_with(store_id.clone(), |p| Property {
            id: p,
            store_id: store_id.clone(),
            name: name.to_string(),
            namespace: ns,
            kind,
            functional,
        });

        if created && !self.config.bulk_load {
            let v = &self.vocab;
            let type_iri = match kind {
                PropertyKind::Object => &v.object_property,
                PropertyKind::Data => &v.datatype_property,
                PropertyKind::Annotation => &v.annotation_property,
            };
            let ctx = namespace.ontology;
            self.store.add_triple(ctx, &store_id, &v.rdf_type, &Value::Resource(type_iri.clone()))?;
            if functional {
                self.store.add_triple(ctx, &store_id, &v.rdf_type, &Value::Resource(v.functional_property.clone()))?;
            }
        }
        Ok(p)
    }

    /// Look a property up by its local name.
    pub fn property_by_name(&self, name: &str) -> Result<PropertyId> {
        self.properties.read().by_name(name)
            .ok_or_else(|| Error::UnknownProperty(name.to_string()))
    }

    pub fn property(&self, p: PropertyId) -> Property {
        self.properties.read().get(p).clone()
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Snapshot of a class record. Panics if `c` is not from this world.
    pub fn class(&self, c: ClassId) -> ClassEntity {
        self.classes.read().get(c).clone()
    }

    pub fn store_id(&self, c: ClassId) -> StoreId {
        self.classes.read().get(c).store_id.clone()
    }

    pub fn name(&self, c: ClassId) -> String {
        self.classes.read().get(c).name.clone()
    }

    pub fn iri(&self, c: ClassId) -> String {
        let (ns, name) = {
            let reg = self.classes.read();
            let e = reg.get(c);
            (e.namespace, e.name.clone())
        };
        self.namespace(ns).iri_for(&name)
    }

    pub fn is_a(&self, c: ClassId) -> Vec<Concept> {
        self.classes.read().get(c).is_a.clone()
    }

    pub fn bases(&self, c: ClassId) -> Bases {
        self.classes.read().get(c).bases.clone()
    }

    pub fn mro(&self, c: ClassId) -> Vec<ClassId> {
        self.classes.read().get(c).mro.clone()
    }

    pub fn namespace_of(&self, c: ClassId) -> NamespaceId {
        self.classes.read().get(c).namespace
    }

    /// Context of the ontology owning `c`.
    pub fn ontology_of(&self, c: ClassId) -> ContextId {
        self.namespace(self.namespace_of(c)).ontology
    }

    /// Registered class for a store id, without touching the store.
    pub fn class_by_store_id(&self, id: &StoreId) -> Option<ClassId> {
        self.classes.read().lookup(id)
    }

    /// Class for a full IRI, materialized from the store if needed.
    pub fn class_by_iri(&self, iri: &str) -> Result<Option<ClassId>> {
        let id = self.store.abbreviate(iri)?;
        Ok(self.load(&id)?.and_then(Concept::as_class))
    }

    pub fn loaded_classes(&self) -> Vec<ClassId> {
        self.classes.read().ids().collect()
    }

    pub fn class_count(&self) -> usize {
        self.classes.read().len()
    }

    pub(crate) fn concept_store_id(&self, concept: Concept) -> StoreId {
        match concept {
            Concept::Class(c) => self.store_id(c),
            Concept::Construct(k) => self.constructs.read().get(k).store_id.clone(),
        }
    }

    /// Currently cached equivalence set, if materialized.
    pub fn cached_equivalents(&self, c: ClassId) -> Option<Vec<Concept>> {
        self.cache.lock().equivalents(c)
    }

    /// Whether functional-for answers are cached for `c`.
    pub fn is_functional_cached(&self, c: ClassId) -> bool {
        self.cache.lock().has_functional(c)
    }

    // ========================================================================
    // Naming
    // ========================================================================

    /// Rename; the store identifier is kept and re-pointed at the new IRI.
    pub fn set_name(&mut self, c: ClassId, name: &str) -> Result<()> {
        let ns = self.namespace(self.namespace_of(c));
        self.store.refactor(&self.store_id(c), &ns.iri_for(name))?;
        self.classes.write().get_mut(c).name = name.to_string();
        Ok(())
    }

    /// Move the class to another IRI, switching namespace when the base
    /// differs. The store identifier is kept.
    pub fn set_iri(&mut self, c: ClassId, iri: &str) -> Result<()> {
        let (base, name) = crate::model::split_iri(iri)
            .ok_or_else(|| Error::InvalidIri(iri.to_string()))?;
        let ns = self.get_namespace(self.ontology_of(c), base);
        self.store.refactor(&self.store_id(c), iri)?;
        let mut reg = self.classes.write();
        let entity = reg.get_mut(c);
        entity.name = name.to_string();
        entity.namespace = ns;
        Ok(())
    }
}
