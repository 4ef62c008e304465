//! End-to-end tests for opening a world over an already-populated store:
//! materialization, loaded restrictions, and export.

mod common;

use common::{res, JournalStore, ZOO};
use owlgraph::export::{export_hierarchy_json, export_ntriples, hierarchy_snapshot};
use owlgraph::vocab::{OWL_NS, RDFS_NS, RDF_NS};
use owlgraph::{
    ClassId, Concept, Construct, ContextId, PropertyValues, StoreId, TripleStore, Value, World,
    WorldConfig,
};
use pretty_assertions::assert_eq;

/// Zoo ontology written directly into the store:
///
/// ```text
/// Animal
/// Mammal ⊑ Animal
/// Dog    ⊑ Mammal, (hasLegs VALUE 4)
/// Pet    ≡ Animal ⊓ (tame VALUE true)
/// ```
fn populated() -> JournalStore {
    let store = JournalStore::new();
    let ctx = ContextId(1);
    let id = |iri: String| store.abbreviate(&iri).unwrap();
    let zoo = |local: &str| id(format!("{ZOO}{local}"));
    let owl = |local: &str| id(format!("{OWL_NS}{local}"));
    let rdf = |local: &str| id(format!("{RDF_NS}{local}"));
    let sub = id(format!("{RDFS_NS}subClassOf"));
    let ty = rdf("type");
    let add = |s: &StoreId, p: &StoreId, o: Value| store.add_triple_raw(ctx, s, p, &o);

    for name in ["Animal", "Mammal", "Dog", "Pet"] {
        add(&zoo(name), &ty, res(&owl("Class")));
    }
    add(&zoo("hasLegs"), &ty, res(&owl("DatatypeProperty")));
    add(&zoo("hasLegs"), &ty, res(&owl("FunctionalProperty")));
    add(&zoo("tame"), &ty, res(&owl("DatatypeProperty")));
    add(&zoo("Mammal"), &sub, res(&zoo("Animal")));
    add(&zoo("Dog"), &sub, res(&zoo("Mammal")));

    let legs = store.new_blank_node().unwrap();
    add(&legs, &ty, res(&owl("Restriction")));
    add(&legs, &owl("onProperty"), res(&zoo("hasLegs")));
    add(&legs, &owl("hasValue"), Value::Int(4));
    add(&zoo("Dog"), &sub, res(&legs));

    let tame = store.new_blank_node().unwrap();
    add(&tame, &ty, res(&owl("Restriction")));
    add(&tame, &owl("onProperty"), res(&zoo("tame")));
    add(&tame, &owl("hasValue"), Value::Bool(true));

    let (cell1, cell2) = (store.new_blank_node().unwrap(), store.new_blank_node().unwrap());
    add(&cell1, &rdf("first"), res(&zoo("Animal")));
    add(&cell1, &rdf("rest"), res(&cell2));
    add(&cell2, &rdf("first"), res(&tame));
    add(&cell2, &rdf("rest"), res(&rdf("nil")));
    let and = store.new_blank_node().unwrap();
    add(&and, &ty, res(&owl("Class")));
    add(&and, &owl("intersectionOf"), res(&cell1));
    add(&zoo("Pet"), &owl("equivalentClass"), res(&and));
    store
}

fn open(store: &JournalStore) -> World<JournalStore> {
    World::with_store(store.clone(), WorldConfig::default()).unwrap()
}

fn class(world: &World<JournalStore>, local: &str) -> ClassId {
    world.class_by_iri(&format!("{ZOO}{local}")).unwrap().unwrap()
}

#[test]
fn test_hierarchy_materialized() {
    let store = populated();
    let world = open(&store);
    let dog = class(&world, "Dog");
    let mammal = class(&world, "Mammal");
    let animal = class(&world, "Animal");

    assert_eq!(world.mro(dog), vec![dog, mammal, animal, ClassId::THING]);
    assert!(world.descendants(animal, false, false).unwrap().contains(&dog));
    assert!(store.ops().is_empty());
}

#[test]
fn test_descendants_load_on_demand() {
    let store = populated();
    let world = open(&store);
    let animal = class(&world, "Animal");

    assert!(world.descendants(animal, false, true).unwrap().is_empty());
    let all = world.descendants(animal, false, false).unwrap();
    assert_eq!(all.len(), 2);
    assert!(world.class_by_store_id(&store.abbreviate(&format!("{ZOO}Dog")).unwrap()).is_some());
}

#[test]
fn test_loaded_restriction_resolves() {
    let store = populated();
    let world = open(&store);
    let dog = class(&world, "Dog");

    assert_eq!(world.get_property(dog, "hasLegs").unwrap(), PropertyValues::Single(Some(Value::Int(4))));
    assert!(store.ops().is_empty());
}

#[test]
fn test_equivalent_conjunction_parsed() {
    let store = populated();
    let world = open(&store);
    let pet = class(&world, "Pet");
    let animal = class(&world, "Animal");

    let eqs = world.equivalent_to(pet).unwrap();
    assert_eq!(eqs.len(), 1);
    let Concept::Construct(k) = eqs[0] else { panic!("expected a construct") };
    let Construct::And(items) = world.construct(k) else { panic!("expected a conjunction") };
    assert_eq!(items[0], Concept::Class(animal));
    assert_eq!(world.get_property(pet, "tame").unwrap(), PropertyValues::Many(vec![Value::Bool(true)]));
}

#[test]
fn test_edit_loaded_class_writes_once() {
    let store = populated();
    let mut world = open(&store);
    let dog = class(&world, "Dog");
    let mammal = class(&world, "Mammal");

    assert!(world.remove_is_a(dog, mammal).unwrap());
    let sub = world.vocab().subclass_of.clone();
    assert_eq!(store.deletes_of(&sub).len(), 1);
    assert_eq!(world.bases(dog).to_vec(), vec![ClassId::THING]);
    // No other path leads to Mammal.
    assert!(!world.is_subclass_of(dog, mammal).unwrap());
}

#[test]
fn test_export_ntriples_covers_store() {
    let store = populated();
    let world = open(&store);

    let mut out = Vec::new();
    let n = export_ntriples(&world, &mut out).unwrap();
    let text = String::from_utf8(out).unwrap();

    assert_eq!(n as u64, store.triple_count().unwrap());
    assert!(text.contains(&format!("<{ZOO}Mammal> <{RDFS_NS}subClassOf> <{ZOO}Animal> .")));
    assert!(text.contains("\"4\"^^<http://www.w3.org/2001/XMLSchema#integer>"));
    let mut sorted: Vec<&str> = text.lines().collect();
    sorted.sort();
    assert_eq!(sorted, text.lines().collect::<Vec<_>>());
}

#[test]
fn test_hierarchy_snapshot_after_load() {
    let store = populated();
    let world = open(&store);
    let dog = class(&world, "Dog");

    let snapshot = hierarchy_snapshot(&world);
    let entry = snapshot.iter().find(|s| s.name == "Dog").unwrap();
    assert_eq!(entry.iri, world.iri(dog));
    assert_eq!(entry.bases, vec![format!("{ZOO}Mammal")]);
    assert_eq!(entry.mro.last().map(String::as_str), Some("http://www.w3.org/2002/07/owl#Thing"));

    let mut json = Vec::new();
    export_hierarchy_json(&world, &mut json).unwrap();
    let parsed: serde_json::Value = serde_json::from_slice(&json).unwrap();
    assert_eq!(parsed.as_array().unwrap().len(), snapshot.len());
}
