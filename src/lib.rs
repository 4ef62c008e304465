//! # owlgraph - OWL Class Model over a Triple Store
//!
//! An in-memory graph of ontology classes kept consistent with the
//! triple store that persists them.
//!
//! ## Design Principles
//!
//! 1. **Trait-first**: `TripleStore` is the contract between the class model and persistence
//! 2. **Arena, not inheritance**: classes are plain records indexed by `ClassId`; hierarchy is explicit
//! 3. **One write path**: every `is_a` / equivalence edit goes through the change propagator
//! 4. **Caches are owned**: the world's cache table is invalidated synchronously on every edit
//!
//! ## Quick Start
//!
//! ```rust
//! use owlgraph::{ClassDecl, PropertyKind, PropertyValues, Value, World};
//!
//! # fn example() -> owlgraph::Result<()> {
//! let mut world = World::open_memory()?;
//! let onto = world.create_ontology("http://example.org/zoo#")?;
//! let ns = world.default_namespace(onto);
//!
//! let legs = world.declare_property(ns, "hasLegs", PropertyKind::Data, true)?;
//! let four = world.has_value(legs, 4)?;
//! let dog = world.declare_class(ClassDecl::new(ns, "Dog").is_a(four))?;
//! let puppy = world.declare_class(ClassDecl::new(ns, "Puppy").is_a(dog))?;
//!
//! assert_eq!(world.get_property(puppy, "hasLegs")?, PropertyValues::Single(Some(Value::Int(4))));
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```
//!
//! ## Concurrency
//!
//! Mutations take `&mut World`, reads take `&World`. Share a world across
//! threads as [`SharedWorld`]: writers take the write lock, readers the
//! read lock.

// ============================================================================
// Modules
// ============================================================================

pub mod model;
pub mod storage;
pub mod vocab;
pub mod config;
pub mod export;

mod cache;
mod registry;
mod world;
mod bases;
mod propagate;
mod constructs;
mod loader;
mod hierarchy;
mod resolve;
mod disjoint;

// ============================================================================
// Re-exports: Model
// ============================================================================

pub use model::{
    StoreId, ContextId, ClassId, ConstructId, PropertyId, NamespaceId,
    Value, ClassEntity, Concept, Bases,
    Construct, Filler, Restriction, RestrictionKind,
    Property, PropertyKind, Namespace, Ontology,
    AllDisjoint, DisjointForm, CallbackList,
};

// ============================================================================
// Re-exports: Storage
// ============================================================================

pub use storage::{TripleStore, MemoryStore, StoreConfig, Quad};

// ============================================================================
// Re-exports: World
// ============================================================================

pub use config::WorldConfig;
pub use world::{World, ClassDecl};
pub use bases::{c3_linearize, best_effort_linearize, linearize};
pub use resolve::PropertyValues;

/// A world shared across threads: one writer or many readers.
pub type SharedWorld<S> = std::sync::Arc<parking_lot::RwLock<World<S>>>;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("'{0}' property is not defined")]
    UnknownProperty(String),

    #[error("No consistent base order: {0}")]
    AmbiguousBase(String),

    #[error("Equivalence target {0} no longer resolves")]
    DanglingEquivalence(StoreId),

    #[error("Identifier {id} is already a {existing}, cannot declare it as a {requested}")]
    IdentifierCollision {
        id: StoreId,
        existing: &'static str,
        requested: &'static str,
    },

    #[error("Invalid IRI: {0}")]
    InvalidIri(String),

    #[error("Invalid declaration: {0}")]
    InvalidDeclaration(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
