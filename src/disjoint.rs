//! Disjointness: enumeration (read-only) and declaration.

use tracing::debug;

use crate::model::{AllDisjoint, ClassId, Concept, ContextId, DisjointForm, StoreId, Value};
use crate::storage::TripleStore;
use crate::world::World;
use crate::{Error, Result};

impl<S: TripleStore> World<S> {
    /// Every disjointness declaration involving `c`: n-ary
    /// `owl:AllDisjointClasses` sets first, then pairwise
    /// `owl:disjointWith` triples with `c` on either side.
    pub fn disjoints(&self, c: ClassId) -> Result<Vec<AllDisjoint>> {
        let v = &self.vocab;
        let sid = self.store_id(c);
        let mut out: Vec<AllDisjoint> = Vec::new();

        let all_disjoint = Value::Resource(v.all_disjoint_classes.clone());
        for q in self.store.get_quads(None, Some(&v.rdf_type), Some(&all_disjoint), None)? {
            let Some(Value::Resource(head)) = self.store.get_triple_sp(&q.s, &v.members)? else { continue };
            let (items, _) = self.read_list(&head)?;
            let members: Vec<StoreId> = items.iter().filter_map(|m| m.as_resource().cloned()).collect();
            if members.contains(&sid) {
                out.push(AllDisjoint { form: DisjointForm::Nary(q.s), ontology: q.c, members });
            }
        }

        let target = Value::Resource(sid.clone());
        for q in self.store.get_quads(Some(&sid), Some(&v.disjoint_with), None, None)? {
            let Some(other) = q.o.as_resource() else { continue };
            out.push(AllDisjoint { form: DisjointForm::Pairwise, ontology: q.c, members: vec![sid.clone(), other.clone()] });
        }
        for q in self.store.get_quads(None, Some(&v.disjoint_with), Some(&target), None)? {
            let pair = AllDisjoint { form: DisjointForm::Pairwise, ontology: q.c, members: vec![q.s, sid.clone()] };
            if !out.contains(&pair) {
                out.push(pair);
            }
        }
        Ok(out)
    }

    /// Classes declared disjoint with `c`, materialized.
    pub fn disjoint_classes(&self, c: ClassId) -> Result<Vec<ClassId>> {
        let sid = self.store_id(c);
        let mut out = Vec::new();
        for d in self.disjoints(c)? {
            for other in d.siblings_of(&sid) {
                if let Some(Concept::Class(x)) = self.load_concept(other)?
                    && !out.contains(&x)
                {
                    out.push(x);
                }
            }
        }
        Ok(out)
    }

    /// Declare `members` mutually disjoint in `ontology`: one
    /// `owl:disjointWith` triple for two classes, an
    /// `owl:AllDisjointClasses` node otherwise.
    pub fn declare_disjoint(&mut self, ontology: ContextId, members: &[ClassId]) -> Result<AllDisjoint> {
        let ids: Vec<StoreId> = crate::world::dedup(members.iter().copied())
            .into_iter()
            .map(|c| self.store_id(c))
            .collect();
        if ids.len() < 2 {
            return Err(Error::InvalidDeclaration(format!(
                "disjointness needs at least two distinct classes, got {}",
                ids.len()
            )));
        }
        self.ensure_ontology(ontology);
        let loading = self.config.bulk_load;
        let v = &self.vocab;

        if let [a, b] = ids.as_slice() {
            if !loading {
                self.store.add_triple(ontology, a, &v.disjoint_with, &Value::Resource(b.clone()))?;
            }
            debug!(%ontology, a = %a, b = %b, "pairwise disjointness declared");
            return Ok(AllDisjoint { form: DisjointForm::Pairwise, ontology, members: ids });
        }

        let node = self.store.new_blank_node()?;
        if !loading {
            let cells = ids.iter()
                .map(|_| self.store.new_blank_node())
                .collect::<Result<Vec<_>>>()?;
            let items: Vec<Value> = ids.iter().cloned().map(Value::Resource).collect();
            let mut triples = Vec::new();
            let head = self.list_triples(&cells, &items, &mut triples);
            triples.push((node.clone(), v.rdf_type.clone(), Value::Resource(v.all_disjoint_classes.clone())));
            triples.push((node.clone(), v.members.clone(), head));
            for (s, p, o) in &triples {
                self.store.add_triple(ontology, s, p, o)?;
            }
        }
        debug!(%ontology, members = ids.len(), "n-ary disjointness declared");
        Ok(AllDisjoint { form: DisjointForm::Nary(node), ontology, members: ids })
    }
}
