use crate::{example_iri, TestStore};
use quadlite_execution::{Executor, QueryError, QueryResults};
use quadlite_model::{Literal, Parameter, Term};
use quadlite_storage::{LiteralPattern, ReferencePattern};

#[test]
fn insert_data_counts_one_row() {
    let store = TestStore::new();
    let result = store.run("INSERT DATA { ex:a ex:knows ex:b . ex:a ex:name \"A\" }");
    assert_eq!(result, QueryResults::Modified(1));
    assert_eq!(store.store.len().unwrap(), 2);
    assert_eq!(store.store.len_in(store.context).unwrap(), 2);
}

#[test]
fn inserting_twice_keeps_set_semantics() {
    let store = TestStore::new();
    store.run("INSERT DATA { ex:a ex:knows ex:b }");
    store.run("INSERT DATA { ex:a ex:knows ex:b }");
    assert_eq!(store.store.len().unwrap(), 1);
}

#[test]
fn delete_data() {
    let store = TestStore::with_data("ex:a ex:knows ex:b . ex:a ex:name \"A\" .");
    store.run("DELETE DATA { ex:a ex:name \"A\" }");
    assert_eq!(store.store.len().unwrap(), 1);

    store.run("DELETE DATA { ex:a ex:knows ex:b }");
    assert!(store.store.is_empty().unwrap());
}

#[test]
fn deleting_unknown_resources_is_a_no_op() {
    let store = TestStore::with_data("ex:a ex:knows ex:b .");
    store.run("DELETE DATA { ex:a ex:knows ex:nobody }");
    assert_eq!(store.store.len().unwrap(), 1);
}

#[test]
fn replace_old_tags_with_new_ones() {
    let store = TestStore::with_data(
        "ex:a ex:hasTag \"old\" . ex:b ex:hasTag \"old\" . ex:c ex:hasTag \"other\" .",
    );
    let result = store.run(
        "DELETE { ?s ex:hasTag \"old\" } INSERT { ?s ex:hasTag \"new\" } WHERE { ?s ex:hasTag \"old\" }",
    );
    assert_eq!(result, QueryResults::Modified(2));

    let has_tag = store.store.lookup(&example_iri("hasTag")).unwrap().unwrap();
    let tagged = |value: &str| {
        store
            .store
            .find_literals(
                &LiteralPattern::new()
                    .with_predicate(has_tag)
                    .with_literal(&Literal::simple(value)),
            )
            .unwrap()
            .len()
    };
    assert_eq!(tagged("old"), 0);
    assert_eq!(tagged("new"), 2);
    assert_eq!(tagged("other"), 1);
}

#[test]
fn deletes_without_a_context_apply_to_every_context() {
    let store = TestStore::with_data("ex:a ex:knows ex:b . GRAPH ex:other { ex:a ex:knows ex:b }");
    assert_eq!(store.store.len().unwrap(), 2);

    store.run("DELETE WHERE { ex:a ex:knows ?y }");
    assert!(store.store.is_empty().unwrap());
}

#[test]
fn deletes_with_a_context_only_apply_to_that_context() {
    let store = TestStore::with_data("ex:a ex:knows ex:b . GRAPH ex:other { ex:a ex:knows ex:b }");
    store.run("DELETE DATA { GRAPH ex:other { ex:a ex:knows ex:b } }");
    assert_eq!(store.store.len_in(store.context).unwrap(), 1);
    assert_eq!(store.store.len().unwrap(), 1);
}

#[test]
fn blank_nodes_are_fresh_per_row() {
    let store = TestStore::with_data("ex:a a ex:Person . ex:b a ex:Person .");
    store.run(
        "INSERT { ?p ex:address _:address . _:address ex:city \"Vienna\" } WHERE { ?p a ex:Person }",
    );

    let solutions = store.select(
        "SELECT ?p ?address WHERE { ?p ex:address ?address . ?address ex:city \"Vienna\" }",
    );
    assert_eq!(solutions.len(), 2);
    let addresses = solutions
        .rows()
        .iter()
        .map(|row| row[1].as_ref().and_then(Term::resource_id).unwrap())
        .collect::<Vec<_>>();
    assert!(addresses.iter().all(|id| id.is_blank_node()));
    assert_ne!(addresses[0], addresses[1]);
}

#[test]
fn parameters_in_templates() {
    let store = TestStore::new();
    store
        .try_run_with(
            "INSERT { ex:a ex:name ??1 . ex:a ex:age ??2 } WHERE {}",
            &[Parameter::from("Alice"), Parameter::from(31_i64)],
        )
        .unwrap();
    let mut values = store.column("SELECT ?v WHERE { ex:a ?p ?v }");
    values.sort();
    assert_eq!(values, vec!["31".to_owned(), "Alice".to_owned()]);
}

#[test]
fn inserts_need_a_default_context() {
    let store = TestStore::new();
    let executor = Executor::new(&store.store);
    let prepared = executor
        .prepare("INSERT DATA { ex:a ex:knows ex:b }", &crate::options())
        .unwrap();
    let result = executor.execute(&prepared, &[]);
    assert!(matches!(result, Err(QueryError::NoDefaultContext)));
    assert!(!store.store.is_locked());
    assert!(store.store.lookup(&example_iri("a")).unwrap().is_none());
}

#[test]
fn graph_templates_create_their_context() {
    let store = TestStore::new();
    store.run("INSERT DATA { GRAPH ex:fresh { ex:a ex:knows ex:b } }");
    let context = store.store.lookup_context(&example_iri("fresh")).unwrap().unwrap();
    assert_eq!(store.store.len_in(context).unwrap(), 1);
}

#[test]
fn operations_of_a_request_are_applied_in_order() {
    let store = TestStore::with_data("ex:a ex:knows ex:b .");
    let result = store.run(
        "INSERT DATA { ex:c ex:knows ex:b } ;
         DELETE { ?x ex:knows ex:b } WHERE { ?x ex:knows ex:b }",
    );
    assert_eq!(result, QueryResults::Modified(3));

    let b = store.store.lookup(&example_iri("b")).unwrap().unwrap();
    assert!(!store
        .store
        .contains_reference(&ReferencePattern::new().with_object(b))
        .unwrap());
}
