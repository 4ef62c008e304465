//! Entity registry: identity-preserving arenas keyed by store id.
//!
//! Exactly one slot exists per store identifier. Slots are never removed
//! here; unloading belongs to whoever owns the world.

use hashbrown::HashMap;

use crate::model::{
    ClassEntity, ClassId, ConstructId, ConstructNode, Property, PropertyId, StoreId,
};

// ============================================================================
// Classes
// ============================================================================

#[derive(Debug, Default)]
pub(crate) struct EntityRegistry {
    classes: Vec<ClassEntity>,
    by_store_id: HashMap<StoreId, ClassId>,
}

impl EntityRegistry {
    pub fn lookup(&self, id: &StoreId) -> Option<ClassId> {
        self.by_store_id.get(id).copied()
    }

    /// Panics if `c` was not minted by this registry.
    pub fn get(&self, c: ClassId) -> &ClassEntity {
        &self.classes[c.index()]
    }

    pub fn get_mut(&mut self, c: ClassId) -> &mut ClassEntity {
        &mut self.classes[c.index()]
    }

    /// Existing slot for `id`, or a new one built by `build`.
    /// The flag tells whether the slot was created.
    pub fn get_or_insert_with<F>(&mut self, id: StoreId, build: F) -> (ClassId, bool)
    where
        F: FnOnce(ClassId) -> ClassEntity,
    {
        if let Some(existing) = self.lookup(&id) {
            return (existing, false);
        }
        let c = ClassId(self.classes.len() as u32);
        self.classes.push(build(c));
        self.by_store_id.insert(id, c);
        (c, true)
    }

    pub fn ids(&self) -> impl Iterator<Item = ClassId> + '_ {
        self.classes.iter().map(|c| c.id)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Loaded classes listing `c` among their bases.
    pub fn children(&self, c: ClassId) -> Vec<ClassId> {
        self.classes.iter()
            .filter(|e| e.id != c && e.bases.contains(&c))
            .map(|e| e.id)
            .collect()
    }
}

// ============================================================================
// Constructs
// ============================================================================

/// Constructs are interned by blank node so reading the same store
/// structure twice yields the same `ConstructId`.
#[derive(Debug, Default)]
pub(crate) struct ConstructArena {
    nodes: Vec<ConstructNode>,
    by_store_id: HashMap<StoreId, ConstructId>,
}

impl ConstructArena {
    pub fn lookup(&self, id: &StoreId) -> Option<ConstructId> {
        self.by_store_id.get(id).copied()
    }

    pub fn get(&self, k: ConstructId) -> &ConstructNode {
        &self.nodes[k.index()]
    }

    pub fn get_mut(&mut self, k: ConstructId) -> &mut ConstructNode {
        &mut self.nodes[k.index()]
    }

    pub fn insert_with<F>(&mut self, id: StoreId, build: F) -> ConstructId
    where
        F: FnOnce(ConstructId) -> ConstructNode,
    {
        if let Some(existing) = self.lookup(&id) {
            return existing;
        }
        let k = ConstructId(self.nodes.len() as u32);
        self.nodes.push(build(k));
        self.by_store_id.insert(id, k);
        k
    }
}

// ============================================================================
// Properties
// ============================================================================

#[derive(Debug, Default)]
pub(crate) struct PropertyRegistry {
    props: Vec<Property>,
    by_store_id: HashMap<StoreId, PropertyId>,
    by_name: HashMap<String, PropertyId>,
}

impl PropertyRegistry {
    pub fn lookup(&self, id: &StoreId) -> Option<PropertyId> {
        self.by_store_id.get(id).copied()
    }

    pub fn by_name(&self, name: &str) -> Option<PropertyId> {
        self.by_name.get(name).copied()
    }

    pub fn get(&self, p: PropertyId) -> &Property {
        &self.props[p.index()]
    }

    pub fn get_or_insert_with<F>(&mut self, id: StoreId, build: F) -> (PropertyId, bool)
    where
        F: FnOnce(PropertyId) -> Property,
    {
        if let Some(existing) = self.lookup(&id) {
            return (existing, false);
        }
        let p = PropertyId(self.props.len() as u32);
        let prop = build(p);
        self.by_name.insert(prop.name.clone(), p);
        self.props.push(prop);
        self.by_store_id.insert(id, p);
        (p, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NamespaceId;

    #[test]
    fn test_one_slot_per_store_id() {
        let mut reg = EntityRegistry::default();
        let sid = StoreId::new("5");
        let (a, created_a) = reg.get_or_insert_with(sid.clone(), |c| ClassEntity::new(c, sid.clone(), "A", NamespaceId(0)));
        let (b, created_b) = reg.get_or_insert_with(sid.clone(), |_| unreachable!());

        assert_eq!(a, b);
        assert!(created_a);
        assert!(!created_b);
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.lookup(&sid), Some(a));
    }

    #[test]
    fn test_children_follow_bases() {
        let mut reg = EntityRegistry::default();
        let (root, _) = reg.get_or_insert_with(StoreId::new("1"), |c| ClassEntity::new(c, StoreId::new("1"), "Root", NamespaceId(0)));
        let (kid, _) = reg.get_or_insert_with(StoreId::new("2"), |c| ClassEntity::new(c, StoreId::new("2"), "Kid", NamespaceId(0)));
        reg.get_mut(kid).bases.push(root);

        assert_eq!(reg.children(root), vec![kid]);
        assert!(reg.children(kid).is_empty());
    }
}
