//! Logical constructs: anonymous class expressions.
//!
//! Constructs are never registered by identifier. They are owned by the
//! class (or equivalence edge) that references them, and their triples
//! exist in the store only while an ontology owns them.

use serde::{Deserialize, Serialize};

use super::{Concept, ConstructId, ContextId, PropertyId, StoreId, Value};

/// Restriction kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RestrictionKind {
    /// `owl:hasValue`
    Value,
    /// `owl:someValuesFrom`
    Some,
    /// `owl:allValuesFrom`
    Only,
    Exactly,
    Min,
    Max,
}

impl RestrictionKind {
    pub fn is_cardinality(self) -> bool {
        matches!(self, RestrictionKind::Exactly | RestrictionKind::Min | RestrictionKind::Max)
    }
}

/// What a restriction constrains the property to.
#[derive(Debug, Clone, PartialEq)]
pub enum Filler {
    /// A concrete value (VALUE restrictions).
    Value(Value),
    /// A class expression (SOME, ONLY, qualified cardinalities).
    Concept(Concept),
    /// Unqualified cardinality.
    Nothing,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Restriction {
    pub property: PropertyId,
    pub kind: RestrictionKind,
    pub filler: Filler,
    pub cardinality: Option<u32>,
}

impl Restriction {
    pub fn has_value(property: PropertyId, value: impl Into<Value>) -> Self {
        Self { property, kind: RestrictionKind::Value, filler: Filler::Value(value.into()), cardinality: None }
    }

    pub fn some(property: PropertyId, class: impl Into<Concept>) -> Self {
        Self { property, kind: RestrictionKind::Some, filler: Filler::Concept(class.into()), cardinality: None }
    }

    pub fn only(property: PropertyId, class: impl Into<Concept>) -> Self {
        Self { property, kind: RestrictionKind::Only, filler: Filler::Concept(class.into()), cardinality: None }
    }

    /// Cardinality restriction, qualified when `class` is given.
    pub fn cardinality(property: PropertyId, kind: RestrictionKind, n: u32, class: Option<Concept>) -> Self {
        let filler = class.map_or(Filler::Nothing, Filler::Concept);
        Self { property, kind, filler, cardinality: Some(n) }
    }

    /// The asserted value of a VALUE restriction.
    pub fn value(&self) -> Option<&Value> {
        match (&self.kind, &self.filler) {
            (RestrictionKind::Value, Filler::Value(v)) => Some(v),
            _ => None,
        }
    }

    /// True for `max 0`, `max 1` and `exactly 1`.
    pub fn caps_at_one(&self) -> bool {
        match (self.kind, self.cardinality) {
            (RestrictionKind::Max, Some(n)) => n <= 1,
            (RestrictionKind::Exactly, Some(n)) => n == 1,
            _ => false,
        }
    }
}

/// Polymorphic class expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Construct {
    And(Vec<Concept>),
    Or(Vec<Concept>),
    Not(Concept),
    Restriction(Restriction),
    OneOf(Vec<Value>),
}

impl Construct {
    pub fn as_restriction(&self) -> Option<&Restriction> {
        match self {
            Construct::Restriction(r) => Some(r),
            _ => None,
        }
    }

    /// Concepts nested directly inside this construct.
    pub fn operands(&self) -> Vec<Concept> {
        match self {
            Construct::And(items) | Construct::Or(items) => items.clone(),
            Construct::Not(c) => vec![*c],
            Construct::Restriction(r) => match r.filler {
                Filler::Concept(c) => vec![c],
                _ => Vec::new(),
            },
            Construct::OneOf(_) => Vec::new(),
        }
    }
}

/// Arena slot for a construct.
#[derive(Debug, Clone)]
pub struct ConstructNode {
    pub id: ConstructId,
    /// Blank node carrying the construct's triples.
    pub store_id: StoreId,
    pub construct: Construct,
    /// Owning ontology; `None` while detached.
    pub ontology: Option<ContextId>,
    /// RDF list cells written for And/Or/OneOf.
    pub list_nodes: Vec<StoreId>,
}
