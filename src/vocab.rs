//! RDF / RDFS / OWL vocabulary used by the class model.

use crate::model::StoreId;
use crate::storage::TripleStore;
use crate::Result;

pub const RDF_NS: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
pub const RDFS_NS: &str = "http://www.w3.org/2000/01/rdf-schema#";
pub const OWL_NS: &str = "http://www.w3.org/2002/07/owl#";

macro_rules! vocab {
    ($( $field:ident => $ns:ident, $local:literal; )*) => {
        /// Store identifiers of the vocabulary terms, resolved once per world.
        #[derive(Debug, Clone)]
        pub struct Vocab {
            $( pub $field: StoreId, )*
        }

        impl Vocab {
            pub fn resolve<S: TripleStore + ?Sized>(store: &S) -> Result<Self> {
                Ok(Self {
                    $( $field: store.abbreviate(&format!("{}{}", $ns, $local))?, )*
                })
            }
        }
    };
}

vocab! {
    rdf_type => RDF_NS, "type";
    rdf_first => RDF_NS, "first";
    rdf_rest => RDF_NS, "rest";
    rdf_nil => RDF_NS, "nil";
    subclass_of => RDFS_NS, "subClassOf";
    owl_class => OWL_NS, "Class";
    owl_thing => OWL_NS, "Thing";
    equivalent_class => OWL_NS, "equivalentClass";
    disjoint_with => OWL_NS, "disjointWith";
    all_disjoint_classes => OWL_NS, "AllDisjointClasses";
    members => OWL_NS, "members";
    restriction => OWL_NS, "Restriction";
    on_property => OWL_NS, "onProperty";
    on_class => OWL_NS, "onClass";
    has_value => OWL_NS, "hasValue";
    some_values_from => OWL_NS, "someValuesFrom";
    all_values_from => OWL_NS, "allValuesFrom";
    cardinality => OWL_NS, "cardinality";
    qualified_cardinality => OWL_NS, "qualifiedCardinality";
    min_cardinality => OWL_NS, "minCardinality";
    min_qualified_cardinality => OWL_NS, "minQualifiedCardinality";
    max_cardinality => OWL_NS, "maxCardinality";
    max_qualified_cardinality => OWL_NS, "maxQualifiedCardinality";
    intersection_of => OWL_NS, "intersectionOf";
    union_of => OWL_NS, "unionOf";
    complement_of => OWL_NS, "complementOf";
    one_of => OWL_NS, "oneOf";
    object_property => OWL_NS, "ObjectProperty";
    datatype_property => OWL_NS, "DatatypeProperty";
    annotation_property => OWL_NS, "AnnotationProperty";
    functional_property => OWL_NS, "FunctionalProperty";
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    #[test]
    fn test_resolve_is_stable() {
        let store = MemoryStore::new();
        let a = Vocab::resolve(&store).unwrap();
        let b = Vocab::resolve(&store).unwrap();
        assert_eq!(a.subclass_of, b.subclass_of);
        assert_ne!(a.subclass_of, a.equivalent_class);
        assert_eq!(
            store.unabbreviate(&a.owl_thing).unwrap().as_deref(),
            Some("http://www.w3.org/2002/07/owl#Thing")
        );
    }
}
