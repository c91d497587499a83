use crate::{create_store, example_iri};
use quadlite_model::vocab::rdfs;
use quadlite_model::Literal;
use quadlite_storage::{full_text_table, LiteralPattern, StorageError};

#[test]
fn index_follows_literal_changes() {
    let store = create_store();
    let transaction = store.transaction().unwrap();
    let context = store.context(&example_iri("ctx")).unwrap();
    let paris = store.intern(&example_iri("Paris")).unwrap();
    let rome = store.intern(&example_iri("Rome")).unwrap();
    store
        .insert_literal(context, paris, rdfs::COMMENT, &Literal::simple("capital of France"))
        .unwrap();
    store.enable_full_text(rdfs::COMMENT).unwrap();
    store
        .insert_literal(context, rome, rdfs::COMMENT, &Literal::simple("capital of Italy"))
        .unwrap();
    transaction.commit().unwrap();

    assert_eq!(store.full_text_predicates().unwrap(), vec![rdfs::COMMENT]);
    assert_eq!(
        store.search_full_text(rdfs::COMMENT, "capital").unwrap(),
        vec![paris, rome]
    );
    assert_eq!(
        store.search_full_text(rdfs::COMMENT, "italy").unwrap(),
        vec![rome]
    );

    let transaction = store.transaction().unwrap();
    store
        .delete_literals(&LiteralPattern::new().with_subject(rome))
        .unwrap();
    transaction.commit().unwrap();
    assert_eq!(
        store.search_full_text(rdfs::COMMENT, "capital").unwrap(),
        vec![paris]
    );
}

#[test]
fn disabled_index_cannot_be_searched() {
    let store = create_store();
    let transaction = store.transaction().unwrap();
    store.enable_full_text(rdfs::LABEL).unwrap();
    store.disable_full_text(rdfs::LABEL).unwrap();
    transaction.commit().unwrap();

    assert!(!store.is_full_text_enabled(rdfs::LABEL).unwrap());
    assert!(matches!(
        store.search_full_text(rdfs::LABEL, "x"),
        Err(StorageError::FullTextNotEnabled(_))
    ));
    assert_eq!(full_text_table(rdfs::LABEL), "fts_14");
}
