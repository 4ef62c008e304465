//! Shared fixtures for the end-to-end tests.
//!
//! `JournalStore` wraps `MemoryStore` and records every write in order, so
//! tests can assert exactly which triples the propagator added or deleted.
//! Writes can be switched to fail to exercise error paths.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use owlgraph::{
    ContextId, Error, MemoryStore, NamespaceId, Quad, Result, StoreId, TripleStore, Value, World,
    WorldConfig,
};
use parking_lot::Mutex;

pub const ZOO: &str = "http://example.org/zoo#";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    Add(StoreId, StoreId, Value),
    Del(StoreId, StoreId, Value),
}

#[derive(Clone, Default)]
pub struct JournalStore {
    inner: MemoryStore,
    journal: Arc<Mutex<Vec<Op>>>,
    failing: Arc<AtomicBool>,
}

impl JournalStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ops(&self) -> Vec<Op> {
        self.journal.lock().clone()
    }

    pub fn clear(&self) {
        self.journal.lock().clear();
    }

    /// Deletes recorded for predicate `p`.
    pub fn deletes_of(&self, p: &StoreId) -> Vec<Op> {
        self.ops().into_iter().filter(|op| matches!(op, Op::Del(_, ep, _) if ep == p)).collect()
    }

    pub fn adds_of(&self, p: &StoreId) -> Vec<Op> {
        self.ops().into_iter().filter(|op| matches!(op, Op::Add(_, ep, _) if ep == p)).collect()
    }

    /// Write straight into the backing store, bypassing the journal.
    pub fn add_triple_raw(&self, ctx: ContextId, s: &StoreId, p: &StoreId, o: &Value) {
        self.inner.add_triple(ctx, s, p, o).unwrap();
    }

    /// Make every subsequent write fail until switched off.
    pub fn set_failing(&self, on: bool) {
        self.failing.store(on, Ordering::SeqCst);
    }

    fn check(&self) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::StorageError("injected write failure".into()));
        }
        Ok(())
    }
}

impl TripleStore for JournalStore {
    fn add_triple(&self, ctx: ContextId, s: &StoreId, p: &StoreId, o: &Value) -> Result<()> {
        self.check()?;
        self.journal.lock().push(Op::Add(s.clone(), p.clone(), o.clone()));
        self.inner.add_triple(ctx, s, p, o)
    }

    fn del_triple(&self, ctx: ContextId, s: &StoreId, p: &StoreId, o: &Value) -> Result<()> {
        self.check()?;
        self.journal.lock().push(Op::Del(s.clone(), p.clone(), o.clone()));
        self.inner.del_triple(ctx, s, p, o)
    }

    fn get_triples_sp(&self, s: &StoreId, p: &StoreId) -> Result<Vec<Value>> {
        self.inner.get_triples_sp(s, p)
    }

    fn get_triples_po(&self, p: &StoreId, o: &Value) -> Result<Vec<StoreId>> {
        self.inner.get_triples_po(p, o)
    }

    fn get_transitive_sp(&self, s: &StoreId, p: &StoreId) -> Result<Vec<StoreId>> {
        self.inner.get_transitive_sp(s, p)
    }

    fn get_transitive_po(&self, p: &StoreId, o: &StoreId) -> Result<Vec<StoreId>> {
        self.inner.get_transitive_po(p, o)
    }

    fn get_transitive_sym(&self, s: &StoreId, p: &StoreId) -> Result<Vec<StoreId>> {
        self.inner.get_transitive_sym(s, p)
    }

    fn get_quads(
        &self,
        s: Option<&StoreId>,
        p: Option<&StoreId>,
        o: Option<&Value>,
        c: Option<ContextId>,
    ) -> Result<Vec<Quad>> {
        self.inner.get_quads(s, p, o, c)
    }

    fn abbreviate(&self, iri: &str) -> Result<StoreId> {
        self.inner.abbreviate(iri)
    }

    fn unabbreviate(&self, id: &StoreId) -> Result<Option<String>> {
        self.inner.unabbreviate(id)
    }

    fn refactor(&self, id: &StoreId, new_iri: &str) -> Result<()> {
        self.inner.refactor(id, new_iri)
    }

    fn new_blank_node(&self) -> Result<StoreId> {
        self.inner.new_blank_node()
    }

    fn triple_count(&self) -> Result<u64> {
        self.inner.triple_count()
    }
}

// ============================================================================
// Setup helpers
// ============================================================================

/// World over a journaling store, with the zoo ontology created and the
/// journal cleared.
pub fn zoo() -> (World<JournalStore>, JournalStore, NamespaceId, ContextId) {
    let store = JournalStore::new();
    let mut world = World::with_store(store.clone(), WorldConfig::default()).unwrap();
    let onto = world.create_ontology(ZOO).unwrap();
    let ns = world.default_namespace(onto);
    store.clear();
    (world, store, ns, onto)
}

/// In-memory world with the zoo ontology.
pub fn memory_zoo() -> (World<MemoryStore>, NamespaceId, ContextId) {
    let mut world = World::open_memory().unwrap();
    let onto = world.create_ontology(ZOO).unwrap();
    let ns = world.default_namespace(onto);
    (world, ns, onto)
}

pub fn res(id: &StoreId) -> Value {
    Value::Resource(id.clone())
}
