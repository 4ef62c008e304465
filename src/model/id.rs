//! Identifiers: store-level ids shared with the triple store, and
//! arena indexes for the in-memory entity graph.

use serde::{Deserialize, Serialize};

/// Stable identifier shared with the triple store.
///
/// Named resources get identifiers allocated by [`abbreviate`], blank
/// nodes get store-private identifiers starting with `_`.
///
/// [`abbreviate`]: crate::storage::TripleStore::abbreviate
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StoreId(pub String);

impl StoreId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Store-private identifier (blank node, list cell, ...).
    pub fn is_internal(&self) -> bool {
        self.0.starts_with('_')
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for StoreId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Store context, one per ontology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContextId(pub u32);

impl std::fmt::Display for ContextId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "c{}", self.0)
    }
}

/// Index of a class entity in the registry arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClassId(pub u32);

impl ClassId {
    /// The universal root class (`owl:Thing`) always sits at slot 0.
    pub const THING: ClassId = ClassId(0);

    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for ClassId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Index of a logical construct in the construct arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConstructId(pub u32);

impl ConstructId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// Index of a property in the property registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PropertyId(pub u32);

impl PropertyId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// Index of a namespace (base IRI + owning ontology).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NamespaceId(pub u32);

impl NamespaceId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_internal_prefix() {
        assert!(StoreId::new("_12").is_internal());
        assert!(!StoreId::new("12").is_internal());
    }
}
