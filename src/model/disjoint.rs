//! Disjointness declarations as read back from the store.

use super::{ContextId, StoreId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisjointForm {
    /// `owl:AllDisjointClasses` node with an `owl:members` list.
    Nary(StoreId),
    /// Single `owl:disjointWith` triple.
    Pairwise,
}

/// A set of mutually disjoint classes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllDisjoint {
    pub form: DisjointForm,
    pub ontology: ContextId,
    pub members: Vec<StoreId>,
}

impl AllDisjoint {
    pub fn contains(&self, id: &StoreId) -> bool {
        self.members.contains(id)
    }

    /// Members other than `id`.
    pub fn siblings_of<'a>(&'a self, id: &'a StoreId) -> impl Iterator<Item = &'a StoreId> + 'a {
        self.members.iter().filter(move |m| *m != id)
    }
}
