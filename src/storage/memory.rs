//! In-memory triple store.
//!
//! This is the reference implementation of `TripleStore`.
//! It uses subject and object indexes protected by RwLock.
//!
//! ## Limitations
//!
//! - **No persistence**: everything is lost on drop.
//! - **Single-writer only**: per-index locks mean a write touching both
//!   indexes is not atomic against a concurrent reader. The world only
//!   writes under exclusive access, which is what makes this safe.
//! - **No predicate index**: pattern scans without subject or object
//!   walk the whole subject index.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use hashbrown::{HashMap, HashSet};
use parking_lot::RwLock;

use crate::model::{ContextId, StoreId, Value};
use crate::{Error, Result};
use super::{Quad, TripleStore};

// ============================================================================
// MemoryStore
// ============================================================================

/// In-memory quad storage.
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<MemoryInner>,
}

struct MemoryInner {
    /// subject → (predicate, object, context), insertion ordered
    by_subject: RwLock<HashMap<StoreId, Vec<(StoreId, Value, ContextId)>>>,
    /// object → (subject, predicate, context), insertion ordered
    by_object: RwLock<HashMap<Value, Vec<(StoreId, StoreId, ContextId)>>>,
    iri_to_id: RwLock<HashMap<String, StoreId>>,
    id_to_iri: RwLock<HashMap<StoreId, String>>,
    next_id: AtomicU64,
    next_blank: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MemoryInner {
                by_subject: RwLock::new(HashMap::new()),
                by_object: RwLock::new(HashMap::new()),
                iri_to_id: RwLock::new(HashMap::new()),
                id_to_iri: RwLock::new(HashMap::new()),
                next_id: AtomicU64::new(1),
                next_blank: AtomicU64::new(1),
            }),
        }
    }

    fn objects(&self, s: &StoreId, p: &StoreId) -> Vec<StoreId> {
        let idx = self.inner.by_subject.read();
        idx.get(s)
            .map(|entries| {
                entries.iter()
                    .filter(|(ep, _, _)| ep == p)
                    .filter_map(|(_, o, _)| o.as_resource().cloned())
                    .collect()
            })
            .unwrap_or_default()
    }

    fn subjects(&self, p: &StoreId, o: &StoreId) -> Vec<StoreId> {
        let idx = self.inner.by_object.read();
        idx.get(&Value::Resource(o.clone()))
            .map(|entries| {
                entries.iter()
                    .filter(|(_, ep, _)| ep == p)
                    .map(|(s, _, _)| s.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Breadth-first closure from `start`, start included.
    fn closure<F>(&self, start: &StoreId, mut step: F) -> Vec<StoreId>
    where
        F: FnMut(&StoreId) -> Vec<StoreId>,
    {
        let mut seen: HashSet<StoreId> = HashSet::new();
        let mut order = Vec::new();
        let mut queue = VecDeque::new();
        seen.insert(start.clone());
        queue.push_back(start.clone());

        while let Some(current) = queue.pop_front() {
            for next in step(&current) {
                if seen.insert(next.clone()) {
                    queue.push_back(next);
                }
            }
            order.push(current);
        }
        order
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TripleStore impl
// ============================================================================

impl TripleStore for MemoryStore {
    fn add_triple(&self, ctx: ContextId, s: &StoreId, p: &StoreId, o: &Value) -> Result<()> {
        let mut subjects = self.inner.by_subject.write();
        let entries = subjects.entry(s.clone()).or_default();
        if entries.iter().any(|(ep, eo, ec)| ep == p && eo == o && *ec == ctx) {
            return Ok(());
        }
        entries.push((p.clone(), o.clone(), ctx));
        drop(subjects);

        self.inner.by_object.write()
            .entry(o.clone())
            .or_default()
            .push((s.clone(), p.clone(), ctx));
        Ok(())
    }

    fn del_triple(&self, ctx: ContextId, s: &StoreId, p: &StoreId, o: &Value) -> Result<()> {
        {
            let mut subjects = self.inner.by_subject.write();
            if let Some(entries) = subjects.get_mut(s) {
                entries.retain(|(ep, eo, ec)| !(ep == p && eo == o && *ec == ctx));
                if entries.is_empty() {
                    subjects.remove(s);
                }
            }
        }
        let mut objects = self.inner.by_object.write();
        if let Some(entries) = objects.get_mut(o) {
            entries.retain(|(es, ep, ec)| !(es == s && ep == p && *ec == ctx));
            if entries.is_empty() {
                objects.remove(o);
            }
        }
        Ok(())
    }

    fn get_triples_sp(&self, s: &StoreId, p: &StoreId) -> Result<Vec<Value>> {
        let idx = self.inner.by_subject.read();
        let mut out: Vec<Value> = Vec::new();
        for (ep, eo, _) in idx.get(s).into_iter().flatten() {
            // Same triple may sit in several contexts; report it once.
            if ep == p && !out.contains(eo) {
                out.push(eo.clone());
            }
        }
        Ok(out)
    }

    fn get_triples_po(&self, p: &StoreId, o: &Value) -> Result<Vec<StoreId>> {
        let idx = self.inner.by_object.read();
        let mut out: Vec<StoreId> = Vec::new();
        for (es, ep, _) in idx.get(o).into_iter().flatten() {
            if ep == p && !out.contains(es) {
                out.push(es.clone());
            }
        }
        Ok(out)
    }

    fn get_transitive_sp(&self, s: &StoreId, p: &StoreId) -> Result<Vec<StoreId>> {
        Ok(self.closure(s, |x| self.objects(x, p)))
    }

    fn get_transitive_po(&self, p: &StoreId, o: &StoreId) -> Result<Vec<StoreId>> {
        Ok(self.closure(o, |x| self.subjects(p, x)))
    }

    fn get_transitive_sym(&self, s: &StoreId, p: &StoreId) -> Result<Vec<StoreId>> {
        Ok(self.closure(s, |x| {
            let mut next = self.objects(x, p);
            next.extend(self.subjects(p, x));
            next
        }))
    }

    fn get_quads(
        &self,
        s: Option<&StoreId>,
        p: Option<&StoreId>,
        o: Option<&Value>,
        c: Option<ContextId>,
    ) -> Result<Vec<Quad>> {
        let matches = |ep: &StoreId, ec: ContextId| {
            p.is_none_or(|p| p == ep) && c.is_none_or(|c| c == ec)
        };

        // Pick the narrowest index available.
        if let (None, Some(o)) = (s, o) {
            let idx = self.inner.by_object.read();
            return Ok(idx.get(o).into_iter().flatten()
                .filter(|(_, ep, ec)| matches(ep, *ec))
                .map(|(es, ep, ec)| Quad { s: es.clone(), p: ep.clone(), o: o.clone(), c: *ec })
                .collect());
        }

        let idx = self.inner.by_subject.read();
        let mut out = Vec::new();
        let mut push = |es: &StoreId, entries: &Vec<(StoreId, Value, ContextId)>| {
            for (ep, eo, ec) in entries {
                if matches(ep, *ec) && o.is_none_or(|o| o == eo) {
                    out.push(Quad { s: es.clone(), p: ep.clone(), o: eo.clone(), c: *ec });
                }
            }
        };
        match s {
            Some(s) => {
                if let Some(entries) = idx.get(s) {
                    push(s, entries);
                }
            }
            None => {
                for (es, entries) in idx.iter() {
                    push(es, entries);
                }
            }
        }
        Ok(out)
    }

    fn abbreviate(&self, iri: &str) -> Result<StoreId> {
        if let Some(id) = self.inner.iri_to_id.read().get(iri) {
            return Ok(id.clone());
        }
        let mut iris = self.inner.iri_to_id.write();
        // Another writer may have won the race between the two locks.
        if let Some(id) = iris.get(iri) {
            return Ok(id.clone());
        }
        let id = StoreId(self.inner.next_id.fetch_add(1, Ordering::Relaxed).to_string());
        iris.insert(iri.to_string(), id.clone());
        self.inner.id_to_iri.write().insert(id.clone(), iri.to_string());
        Ok(id)
    }

    fn unabbreviate(&self, id: &StoreId) -> Result<Option<String>> {
        Ok(self.inner.id_to_iri.read().get(id).cloned())
    }

    fn refactor(&self, id: &StoreId, new_iri: &str) -> Result<()> {
        let mut iris = self.inner.iri_to_id.write();
        if let Some(other) = iris.get(new_iri) {
            if other != id {
                return Err(Error::StorageError(format!(
                    "IRI {new_iri} already names {other}"
                )));
            }
            return Ok(());
        }
        let mut ids = self.inner.id_to_iri.write();
        if let Some(old) = ids.insert(id.clone(), new_iri.to_string()) {
            iris.remove(&old);
        }
        iris.insert(new_iri.to_string(), id.clone());
        Ok(())
    }

    fn new_blank_node(&self) -> Result<StoreId> {
        let n = self.inner.next_blank.fetch_add(1, Ordering::Relaxed);
        Ok(StoreId(format!("_{n}")))
    }

    fn triple_count(&self) -> Result<u64> {
        Ok(self.inner.by_subject.read().values().map(|v| v.len() as u64).sum())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const C: ContextId = ContextId(1);

    fn ids(store: &MemoryStore, iris: &[&str]) -> Vec<StoreId> {
        iris.iter().map(|i| store.abbreviate(i).unwrap()).collect()
    }

    #[test]
    fn test_add_is_idempotent() {
        let db = MemoryStore::new();
        let v = ids(&db, &["a", "p", "b"]);
        let o = Value::Resource(v[2].clone());

        db.add_triple(C, &v[0], &v[1], &o).unwrap();
        db.add_triple(C, &v[0], &v[1], &o).unwrap();

        assert_eq!(db.triple_count().unwrap(), 1);
        assert_eq!(db.get_triples_sp(&v[0], &v[1]).unwrap(), vec![o.clone()]);
        assert_eq!(db.get_triples_po(&v[1], &o).unwrap(), vec![v[0].clone()]);
    }

    #[test]
    fn test_del_missing_triple_is_noop() {
        let db = MemoryStore::new();
        let v = ids(&db, &["a", "p"]);
        db.del_triple(C, &v[0], &v[1], &Value::Int(1)).unwrap();
        assert_eq!(db.triple_count().unwrap(), 0);
    }

    #[test]
    fn test_del_is_context_scoped() {
        let db = MemoryStore::new();
        let v = ids(&db, &["a", "p"]);
        let o = Value::from("x");
        db.add_triple(C, &v[0], &v[1], &o).unwrap();
        db.add_triple(ContextId(2), &v[0], &v[1], &o).unwrap();

        db.del_triple(C, &v[0], &v[1], &o).unwrap();
        assert_eq!(db.triple_count().unwrap(), 1);
        assert_eq!(db.get_triple_sp(&v[0], &v[1]).unwrap(), Some(o));
    }

    #[test]
    fn test_transitive_includes_start() {
        let db = MemoryStore::new();
        let v = ids(&db, &["a", "b", "c", "sub"]);
        let sub = &v[3];
        db.add_triple(C, &v[0], sub, &Value::Resource(v[1].clone())).unwrap();
        db.add_triple(C, &v[1], sub, &Value::Resource(v[2].clone())).unwrap();

        assert_eq!(db.get_transitive_sp(&v[0], sub).unwrap(), vec![v[0].clone(), v[1].clone(), v[2].clone()]);
        assert_eq!(db.get_transitive_po(sub, &v[2]).unwrap(), vec![v[2].clone(), v[1].clone(), v[0].clone()]);
    }

    #[test]
    fn test_transitive_terminates_on_cycle() {
        let db = MemoryStore::new();
        let v = ids(&db, &["a", "b", "sub"]);
        db.add_triple(C, &v[0], &v[2], &Value::Resource(v[1].clone())).unwrap();
        db.add_triple(C, &v[1], &v[2], &Value::Resource(v[0].clone())).unwrap();

        assert_eq!(db.get_transitive_sp(&v[0], &v[2]).unwrap().len(), 2);
    }

    #[test]
    fn test_symmetric_closure() {
        let db = MemoryStore::new();
        let v = ids(&db, &["a", "b", "c", "eq"]);
        db.add_triple(C, &v[0], &v[3], &Value::Resource(v[1].clone())).unwrap();
        db.add_triple(C, &v[2], &v[3], &Value::Resource(v[1].clone())).unwrap();

        let mut from_c = db.get_transitive_sym(&v[2], &v[3]).unwrap();
        from_c.sort();
        let mut expected = vec![v[0].clone(), v[1].clone(), v[2].clone()];
        expected.sort();
        assert_eq!(from_c, expected);
    }

    #[test]
    fn test_quads_wildcards() {
        let db = MemoryStore::new();
        let v = ids(&db, &["a", "b", "p", "q"]);
        db.add_triple(C, &v[0], &v[2], &Value::Resource(v[1].clone())).unwrap();
        db.add_triple(C, &v[0], &v[3], &Value::Int(3)).unwrap();
        db.add_triple(ContextId(9), &v[1], &v[2], &Value::Resource(v[0].clone())).unwrap();

        assert_eq!(db.get_quads(None, None, None, None).unwrap().len(), 3);
        assert_eq!(db.get_quads(Some(&v[0]), None, None, None).unwrap().len(), 2);
        assert_eq!(db.get_quads(None, Some(&v[2]), None, None).unwrap().len(), 2);
        assert_eq!(db.get_quads(None, None, Some(&Value::Int(3)), None).unwrap().len(), 1);
        assert_eq!(db.get_quads(None, None, None, Some(ContextId(9))).unwrap().len(), 1);
    }

    #[test]
    fn test_refactor_keeps_identifier() {
        let db = MemoryStore::new();
        let id = db.abbreviate("http://ex.org#Dog").unwrap();
        db.refactor(&id, "http://ex.org#Hound").unwrap();

        assert_eq!(db.unabbreviate(&id).unwrap().as_deref(), Some("http://ex.org#Hound"));
        assert_eq!(db.abbreviate("http://ex.org#Hound").unwrap(), id);
        assert_ne!(db.abbreviate("http://ex.org#Dog").unwrap(), id);
    }

    #[test]
    fn test_refactor_onto_taken_iri_fails() {
        let db = MemoryStore::new();
        let a = db.abbreviate("http://ex.org#A").unwrap();
        db.abbreviate("http://ex.org#B").unwrap();
        assert!(db.refactor(&a, "http://ex.org#B").is_err());
    }

    #[test]
    fn test_blank_nodes_are_internal() {
        let db = MemoryStore::new();
        let b1 = db.new_blank_node().unwrap();
        let b2 = db.new_blank_node().unwrap();
        assert!(b1.is_internal());
        assert_ne!(b1, b2);
        assert_eq!(db.unabbreviate(&b1).unwrap(), None);
    }
}
