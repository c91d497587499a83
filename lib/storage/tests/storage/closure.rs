use crate::{create_store, example_iri};
use quadlite_model::vocab::rdfs;
use quadlite_storage::Direction;

#[test]
fn subclass_chain() {
    let store = create_store();
    let transaction = store.transaction().unwrap();
    let context = store.context(&example_iri("ctx")).unwrap();
    let a = store.intern(&example_iri("A")).unwrap();
    let b = store.intern(&example_iri("B")).unwrap();
    let root = store.intern(&example_iri("RootClass")).unwrap();
    store
        .insert_reference(context, a, rdfs::SUB_CLASS_OF, b)
        .unwrap();
    store
        .insert_reference(context, b, rdfs::SUB_CLASS_OF, root)
        .unwrap();
    transaction.commit().unwrap();

    let ancestors = store
        .closure(a, rdfs::SUB_CLASS_OF, Direction::Forward, None)
        .unwrap();
    assert_eq!(ancestors, vec![b, root]);

    let descendants = store
        .closure(root, rdfs::SUB_CLASS_OF, Direction::Backward, Some(context))
        .unwrap();
    assert_eq!(descendants, vec![a, b]);

    assert!(store.is_reachable(a, rdfs::SUB_CLASS_OF, root).unwrap());
    assert!(store.is_reachable(a, rdfs::SUB_CLASS_OF, a).unwrap());
    assert!(!store.is_reachable(root, rdfs::SUB_CLASS_OF, a).unwrap());
}

#[test]
fn closure_is_scoped_to_context() {
    let store = create_store();
    let transaction = store.transaction().unwrap();
    let first = store.context(&example_iri("first")).unwrap();
    let second = store.context(&example_iri("second")).unwrap();
    let a = store.intern(&example_iri("A")).unwrap();
    let b = store.intern(&example_iri("B")).unwrap();
    let c = store.intern(&example_iri("C")).unwrap();
    store.insert_reference(first, a, rdfs::SUB_CLASS_OF, b).unwrap();
    store.insert_reference(second, b, rdfs::SUB_CLASS_OF, c).unwrap();
    transaction.commit().unwrap();

    assert_eq!(
        store
            .closure(a, rdfs::SUB_CLASS_OF, Direction::Forward, Some(first))
            .unwrap(),
        vec![b]
    );
    assert_eq!(
        store
            .closure(a, rdfs::SUB_CLASS_OF, Direction::Forward, None)
            .unwrap(),
        vec![b, c]
    );
}

#[test]
fn cyclic_hierarchy_terminates() {
    let store = create_store();
    let transaction = store.transaction().unwrap();
    let context = store.context(&example_iri("ctx")).unwrap();
    let a = store.intern(&example_iri("A")).unwrap();
    let b = store.intern(&example_iri("B")).unwrap();
    let c = store.intern(&example_iri("C")).unwrap();
    for (from, to) in [(a, b), (b, c), (c, a)] {
        store
            .insert_reference(context, from, rdfs::SUB_CLASS_OF, to)
            .unwrap();
    }
    transaction.commit().unwrap();

    let ancestors = store
        .closure(b, rdfs::SUB_CLASS_OF, Direction::Forward, None)
        .unwrap();
    assert_eq!(ancestors, vec![a, c]);
}

#[test]
fn reachability_spans_every_context() {
    let store = create_store();
    let transaction = store.transaction().unwrap();
    let first = store.context(&example_iri("first")).unwrap();
    let second = store.context(&example_iri("second")).unwrap();
    let a = store.intern(&example_iri("A")).unwrap();
    let b = store.intern(&example_iri("B")).unwrap();
    let c = store.intern(&example_iri("C")).unwrap();
    store.insert_reference(first, a, rdfs::SUB_CLASS_OF, b).unwrap();
    store.insert_reference(second, b, rdfs::SUB_CLASS_OF, c).unwrap();
    transaction.commit().unwrap();

    assert!(store.is_reachable(a, rdfs::SUB_CLASS_OF, c).unwrap());
    assert!(!store.is_reachable(c, rdfs::SUB_CLASS_OF, a).unwrap());

    let transaction = store.transaction().unwrap();
    store.destroy_context(second).unwrap();
    transaction.commit().unwrap();
    assert!(store.is_reachable(a, rdfs::SUB_CLASS_OF, b).unwrap());
    assert!(!store.is_reachable(a, rdfs::SUB_CLASS_OF, c).unwrap());
}
