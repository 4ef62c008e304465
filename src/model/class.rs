//! Class entity: the plain data record behind one OWL class.

use smallvec::SmallVec;

use super::{ClassId, ConstructId, NamespaceId, StoreId};

/// Anything usable where a class is expected in a super-relation or
/// equivalence declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Concept {
    Class(ClassId),
    Construct(ConstructId),
}

impl Concept {
    pub fn as_class(self) -> Option<ClassId> {
        match self {
            Concept::Class(c) => Some(c),
            Concept::Construct(_) => None,
        }
    }

    pub fn as_construct(self) -> Option<ConstructId> {
        match self {
            Concept::Construct(c) => Some(c),
            Concept::Class(_) => None,
        }
    }

    pub fn is_construct(self) -> bool {
        matches!(self, Concept::Construct(_))
    }
}

impl From<ClassId> for Concept {
    fn from(c: ClassId) -> Self { Concept::Class(c) }
}

impl From<ConstructId> for Concept {
    fn from(c: ConstructId) -> Self { Concept::Construct(c) }
}

/// Base tuple. Almost every class has one or two bases.
pub type Bases = SmallVec<[ClassId; 2]>;

/// One OWL class, as held by the registry.
///
/// The equivalence set and the ancestor/descendant sets are not stored
/// here; they live in the world's cache table.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassEntity {
    pub id: ClassId,
    /// Identifier shared with the triple store. Never changes.
    pub store_id: StoreId,
    pub name: String,
    pub namespace: NamespaceId,
    /// Declared super-relations, in declaration order.
    pub is_a: Vec<Concept>,
    /// Pure-class subset of `is_a`, sorted for linearization.
    pub bases: Bases,
    /// Linearized ancestor order, starting with the class itself.
    pub mro: Vec<ClassId>,
}

impl ClassEntity {
    pub fn new(id: ClassId, store_id: StoreId, name: impl Into<String>, namespace: NamespaceId) -> Self {
        Self {
            id,
            store_id,
            name: name.into(),
            namespace,
            is_a: Vec::new(),
            bases: Bases::new(),
            mro: vec![id],
        }
    }

    pub fn with_is_a(mut self, is_a: impl IntoIterator<Item = Concept>) -> Self {
        self.is_a = is_a.into_iter().collect();
        self
    }

    /// In-memory subtype check against the stored linearization.
    pub fn inherits_from(&self, other: ClassId) -> bool {
        self.mro.contains(&other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_entity_linearizes_to_itself() {
        let c = ClassEntity::new(ClassId(3), StoreId::new("7"), "Dog", NamespaceId(0));
        assert_eq!(c.mro, vec![ClassId(3)]);
        assert!(c.inherits_from(ClassId(3)));
        assert!(c.bases.is_empty());
    }

    #[test]
    fn test_concept_projection() {
        let a = Concept::from(ClassId(1));
        let b = Concept::from(ConstructId(1));
        assert_eq!(a.as_class(), Some(ClassId(1)));
        assert_eq!(b.as_class(), None);
        assert!(b.is_construct());
    }
}
