use crate::{create_store, example_iri};
use quadlite_model::vocab::rdf;
use quadlite_storage::StorageError;

#[test]
fn mutation_requires_write_lock() {
    let store = create_store();
    let result = store.new_blank_node();
    assert!(matches!(result, Err(StorageError::WriteLockRequired)));
    assert!(StorageError::WriteLockRequired
        .to_string()
        .contains("Open a transaction"));
}

#[test]
fn nested_transactions_share_the_lock() {
    let store = create_store();
    let outer = store.transaction().unwrap();
    let context = store.context(&example_iri("ctx")).unwrap();
    {
        let inner = store.transaction().unwrap();
        assert_eq!(inner.depth(), 2);
        let s = store.intern(&example_iri("s")).unwrap();
        store.insert_reference(context, s, rdf::TYPE, s).unwrap();
        inner.commit().unwrap();
    }
    assert!(store.is_locked());
    outer.commit().unwrap();

    assert!(!store.is_locked());
    assert_eq!(store.len().unwrap(), 1);
    assert!(store.last_update(context).unwrap().is_some());
}

#[test]
fn dropped_transaction_rolls_back() {
    let store = create_store();
    {
        let _transaction = store.transaction().unwrap();
        store.intern(&example_iri("s")).unwrap();
    }
    assert!(!store.is_locked());
    assert_eq!(store.lookup(&example_iri("s")).unwrap(), None);
}

#[test]
fn dropped_nested_transaction_aborts_outer() {
    let store = create_store();
    let outer = store.transaction().unwrap();
    store.intern(&example_iri("s")).unwrap();
    let inner = store.transaction().unwrap();
    inner.rollback().unwrap();

    assert!(matches!(
        outer.commit(),
        Err(StorageError::TransactionAborted)
    ));
    assert_eq!(store.lookup(&example_iri("s")).unwrap(), None);
}

#[test]
fn generation_changes_on_every_transaction() {
    let store = create_store();
    let before = store.generation();
    store.transaction().unwrap().commit().unwrap();
    assert_eq!(store.generation(), before + 1);
}
