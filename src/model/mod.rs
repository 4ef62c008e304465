//! # Ontology Class Model
//!
//! Plain data records for the in-memory entity graph: identifiers,
//! class entities, logical constructs, properties and namespaces.
//!
//! Design rule: no store handles and no locks here. Everything in this
//! module is pure data; the world owns the arenas and does the I/O.

pub mod id;
pub mod value;
pub mod class;
pub mod construct;
pub mod property;
pub mod namespace;
pub mod disjoint;
pub mod callback;

pub use id::{StoreId, ContextId, ClassId, ConstructId, PropertyId, NamespaceId};
pub use value::Value;
pub use class::{ClassEntity, Concept, Bases};
pub use construct::{Construct, ConstructNode, Filler, Restriction, RestrictionKind};
pub use property::{Property, PropertyKind};
pub use namespace::{Namespace, Ontology, split_iri};
pub use disjoint::{AllDisjoint, DisjointForm};
pub use callback::CallbackList;
