//! # Triple Store Trait
//!
//! This is THE contract between the class model and any triple store.
//! The class model never touches persistence directly; every read and
//! write goes through these primitives.
//!
//! ## Implementations
//!
//! | Store | Module | Description |
//! |-------|--------|-------------|
//! | `MemoryStore` | `memory` | In-process store for testing/embedding |
//!
//! All calls are synchronous and local. Transitive queries are bounded by
//! the size of the loaded graph.

pub mod memory;

use serde::{Deserialize, Serialize};

use crate::model::{ContextId, StoreId, Value};
use crate::Result;

pub use memory::MemoryStore;

// ============================================================================
// Store Configuration
// ============================================================================

/// Which store a world is opened on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoreConfig {
    /// In-memory (no persistence)
    #[default]
    Memory,
}

// ============================================================================
// Quad
// ============================================================================

/// A triple tagged with the context (ontology) it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Quad {
    pub s: StoreId,
    pub p: StoreId,
    pub o: Value,
    pub c: ContextId,
}

// ============================================================================
// TripleStore Trait
// ============================================================================

/// The universal store contract.
///
/// Writes are idempotent: adding an existing triple or deleting a missing
/// one succeeds without effect. The three transitive queries include the
/// start identifier in their result.
pub trait TripleStore: Send + Sync + 'static {
    // ========================================================================
    // Writes
    // ========================================================================

    /// Add `(s, p, o)` to context `ctx`.
    fn add_triple(&self, ctx: ContextId, s: &StoreId, p: &StoreId, o: &Value) -> Result<()>;

    /// Remove `(s, p, o)` from context `ctx`.
    fn del_triple(&self, ctx: ContextId, s: &StoreId, p: &StoreId, o: &Value) -> Result<()>;

    // ========================================================================
    // Exact-match lookups
    // ========================================================================

    /// All objects of `(s, p, ?)`, in insertion order.
    fn get_triples_sp(&self, s: &StoreId, p: &StoreId) -> Result<Vec<Value>>;

    /// First object of `(s, p, ?)`.
    fn get_triple_sp(&self, s: &StoreId, p: &StoreId) -> Result<Option<Value>> {
        Ok(self.get_triples_sp(s, p)?.into_iter().next())
    }

    /// All subjects of `(?, p, o)`, in insertion order.
    fn get_triples_po(&self, p: &StoreId, o: &Value) -> Result<Vec<StoreId>>;

    /// First subject of `(?, p, o)`.
    fn get_triple_po(&self, p: &StoreId, o: &Value) -> Result<Option<StoreId>> {
        Ok(self.get_triples_po(p, o)?.into_iter().next())
    }

    // ========================================================================
    // Transitive lookups
    // ========================================================================

    /// `s` plus every resource reachable from `s` by following `p` forward.
    fn get_transitive_sp(&self, s: &StoreId, p: &StoreId) -> Result<Vec<StoreId>>;

    /// `o` plus every resource reaching `o` by following `p`.
    fn get_transitive_po(&self, p: &StoreId, o: &StoreId) -> Result<Vec<StoreId>>;

    /// `s` plus the symmetric transitive closure of `p` around it.
    fn get_transitive_sym(&self, s: &StoreId, p: &StoreId) -> Result<Vec<StoreId>>;

    // ========================================================================
    // Wildcard scan
    // ========================================================================

    /// Every quad matching the given pattern; `None` is a wildcard.
    fn get_quads(
        &self,
        s: Option<&StoreId>,
        p: Option<&StoreId>,
        o: Option<&Value>,
        c: Option<ContextId>,
    ) -> Result<Vec<Quad>>;

    // ========================================================================
    // Identifiers
    // ========================================================================

    /// Identifier for a full IRI, allocated on first sight.
    fn abbreviate(&self, iri: &str) -> Result<StoreId>;

    /// Full IRI for an identifier. `None` for blank nodes and unknown ids.
    fn unabbreviate(&self, id: &StoreId) -> Result<Option<String>>;

    /// Point an existing identifier at a new IRI. Triples are untouched.
    fn refactor(&self, id: &StoreId, new_iri: &str) -> Result<()>;

    /// Allocate a fresh store-private identifier.
    fn new_blank_node(&self) -> Result<StoreId>;

    // ========================================================================
    // Introspection
    // ========================================================================

    fn triple_count(&self) -> Result<u64>;
}
