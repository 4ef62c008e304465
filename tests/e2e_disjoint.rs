//! End-to-end tests for disjointness enumeration and declaration.

mod common;

use common::{res, zoo};
use owlgraph::{ClassDecl, DisjointForm, TripleStore};
use pretty_assertions::assert_eq;

#[test]
fn test_cat_dog_disjoint() {
    let (mut world, _, ns, onto) = zoo();
    let cat = world.declare_class(ClassDecl::new(ns, "Cat")).unwrap();
    let dog = world.declare_class(ClassDecl::new(ns, "Dog")).unwrap();
    world.declare_disjoint(onto, &[cat, dog]).unwrap();

    let found = world.disjoints(cat).unwrap();
    assert_eq!(found.len(), 1);
    assert!(found[0].contains(&world.store_id(dog)));
    assert_eq!(found[0].form, DisjointForm::Pairwise);
    assert_eq!(world.disjoint_classes(cat).unwrap(), vec![dog]);
}

#[test]
fn test_enumeration_never_writes() {
    let (mut world, store, ns, onto) = zoo();
    let cat = world.declare_class(ClassDecl::new(ns, "Cat")).unwrap();
    let dog = world.declare_class(ClassDecl::new(ns, "Dog")).unwrap();
    let cow = world.declare_class(ClassDecl::new(ns, "Cow")).unwrap();
    world.declare_disjoint(onto, &[cat, dog]).unwrap();
    world.declare_disjoint(onto, &[cat, dog, cow]).unwrap();
    store.clear();

    for c in [cat, dog, cow] {
        world.disjoints(c).unwrap();
        world.disjoint_classes(c).unwrap();
    }
    assert!(store.ops().is_empty());
}

#[test]
fn test_nary_and_pairwise_together() {
    let (mut world, _, ns, onto) = zoo();
    let cat = world.declare_class(ClassDecl::new(ns, "Cat")).unwrap();
    let dog = world.declare_class(ClassDecl::new(ns, "Dog")).unwrap();
    let cow = world.declare_class(ClassDecl::new(ns, "Cow")).unwrap();
    let nary = world.declare_disjoint(onto, &[cat, dog, cow]).unwrap();
    world.declare_disjoint(onto, &[cow, cat]).unwrap();

    let found = world.disjoints(cat).unwrap();
    assert_eq!(found.len(), 2);
    assert_eq!(found[0], nary);
    assert!(matches!(found[0].form, DisjointForm::Nary(_)));
    assert_eq!(found[1].members, vec![world.store_id(cow), world.store_id(cat)]);
    assert_eq!(world.disjoint_classes(cat).unwrap(), vec![dog, cow]);
}

#[test]
fn test_stored_disjoint_with_unloaded_member() {
    let (mut world, store, ns, onto) = zoo();
    let cat = world.declare_class(ClassDecl::new(ns, "Cat")).unwrap();
    let v = world.vocab().clone();
    let bird = world.store().abbreviate(&format!("{}Bird", common::ZOO)).unwrap();
    store.add_triple_raw(onto, &bird, &v.rdf_type, &res(&v.owl_class));
    store.add_triple_raw(onto, &bird, &v.disjoint_with, &res(&world.store_id(cat)));

    let others = world.disjoint_classes(cat).unwrap();
    assert_eq!(others.len(), 1);
    assert_eq!(world.store_id(others[0]), bird);
    assert_eq!(world.name(others[0]), "Bird");
}
