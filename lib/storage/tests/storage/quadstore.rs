use crate::{create_store, example_iri};
use insta::assert_debug_snapshot;
use quadlite_model::vocab::{rdf, rdfs};
use quadlite_model::{ContextId, Literal, LiteralTag, ResourceId};
use quadlite_storage::{LiteralPattern, ReferencePattern, StorageError, StoredTriple};

#[test]
fn insert_then_delete_by_subject_wildcard() {
    let store = create_store();
    let transaction = store.transaction().unwrap();
    let context = store.context(&example_iri("ctx")).unwrap();
    assert_eq!(context, ContextId::new(1));

    let (s, p, o) = (ResourceId::new(10), ResourceId::new(20), ResourceId::new(30));
    assert!(store.insert_reference(context, s, p, o).unwrap());
    assert_eq!(store.len().unwrap(), 1);

    let deleted = store
        .delete_references(&ReferencePattern::new().with_subject(s))
        .unwrap();
    assert_eq!(deleted, 1);
    assert_eq!(store.len().unwrap(), 0);
    transaction.commit().unwrap();
}

#[test]
fn pattern_lookup_returns_distinct_subjects() {
    let store = create_store();
    let transaction = store.transaction().unwrap();
    let context = store.context(&example_iri("ctx")).unwrap();
    let class = store.intern(&example_iri("ClassA")).unwrap();
    for i in 1..=3 {
        let subject = store.intern(&example_iri(&format!("x{i}"))).unwrap();
        store
            .insert_reference(context, subject, rdf::TYPE, class)
            .unwrap();
    }
    transaction.commit().unwrap();

    let pattern = ReferencePattern::new()
        .with_predicate(rdf::TYPE)
        .with_object(class);
    let mut subjects = store
        .find_references(&pattern)
        .unwrap()
        .into_iter()
        .map(|triple| store.resolve(triple.subject).unwrap())
        .collect::<Vec<_>>();
    subjects.sort();
    assert_eq!(
        subjects,
        vec![example_iri("x1"), example_iri("x2"), example_iri("x3")]
    );
}

#[test]
fn set_semantics() {
    let store = create_store();
    let transaction = store.transaction().unwrap();
    let context = store.context(&example_iri("ctx")).unwrap();
    let subject = store.intern(&example_iri("s")).unwrap();
    let object = store.intern(&example_iri("o")).unwrap();

    assert!(store
        .insert_reference(context, subject, rdf::TYPE, object)
        .unwrap());
    assert!(!store
        .insert_reference(context, subject, rdf::TYPE, object)
        .unwrap());
    assert_eq!(store.len().unwrap(), 1);

    let missing = ReferencePattern::new()
        .with_subject(object)
        .with_predicate(rdf::TYPE);
    assert_eq!(store.delete_references(&missing).unwrap(), 0);
    assert_eq!(store.len().unwrap(), 1);

    let label = Literal::simple("label");
    store
        .insert_literal(context, subject, rdfs::LABEL, &label)
        .unwrap();
    store
        .delete_literals(&LiteralPattern::new().with_literal(&label))
        .unwrap();
    assert_eq!(store.len().unwrap(), 1);
    transaction.commit().unwrap();
}

#[test]
fn set_literal_replaces_all_values() {
    let store = create_store();
    let transaction = store.transaction().unwrap();
    let context = store.context(&example_iri("ctx")).unwrap();
    let subject = store.intern(&example_iri("s")).unwrap();
    store
        .insert_literal(context, subject, rdfs::LABEL, &Literal::simple("a"))
        .unwrap();
    store
        .insert_literal(context, subject, rdfs::LABEL, &Literal::language_tagged("b", "en"))
        .unwrap();
    store
        .set_literal(context, subject, rdfs::LABEL, &Literal::from(42))
        .unwrap();
    transaction.commit().unwrap();

    let literals = store
        .find_literals(&LiteralPattern::new().with_subject(subject))
        .unwrap();
    assert_eq!(literals.len(), 1);
    assert_eq!(literals[0].literal, Literal::from(42));
}

#[test]
fn literal_lookup_by_tag() {
    let store = create_store();
    let transaction = store.transaction().unwrap();
    let context = store.context(&example_iri("ctx")).unwrap();
    let subject = store.intern(&example_iri("s")).unwrap();
    store
        .insert_literal(context, subject, rdfs::LABEL, &Literal::language_tagged("Paris", "FR"))
        .unwrap();
    store
        .insert_literal(context, subject, rdfs::LABEL, &Literal::simple("Paris"))
        .unwrap();
    transaction.commit().unwrap();

    let french = LiteralPattern::new()
        .with_value("Paris")
        .with_tag(LiteralTag::language("fr"));
    assert!(store.contains_literal(&french).unwrap());
    assert_eq!(store.find_literals(&french).unwrap().len(), 1);
    assert_eq!(
        store
            .find_literals(&LiteralPattern::new().with_value("Paris"))
            .unwrap()
            .len(),
        2
    );
}

#[test]
fn interning_is_idempotent() {
    let store = create_store();
    let transaction = store.transaction().unwrap();
    let first = store.intern(&example_iri("a")).unwrap();
    let second = store.intern(&example_iri("a")).unwrap();
    transaction.commit().unwrap();

    assert_eq!(first, second);
    assert_eq!(store.resolve(first).unwrap(), example_iri("a"));
    assert!(matches!(store.intern(""), Err(StorageError::EmptyIri)));
}

#[test]
fn deleted_resource_cannot_be_resolved() {
    let store = create_store();
    let transaction = store.transaction().unwrap();
    let context = store.context(&example_iri("ctx")).unwrap();
    let a = store.intern(&example_iri("a")).unwrap();
    let b = store.intern(&example_iri("b")).unwrap();
    store.insert_reference(context, a, rdf::TYPE, b).unwrap();
    store.delete_resource(b).unwrap();
    transaction.commit().unwrap();

    assert!(matches!(
        store.resolve(b),
        Err(StorageError::ResourceNotFound(id)) if id == b
    ));
    assert!(store.is_empty().unwrap());
}

#[test]
fn rename_keeps_the_id() {
    let store = create_store();
    let transaction = store.transaction().unwrap();
    let a = store.intern(&example_iri("a")).unwrap();
    store.rename(a, &example_iri("renamed")).unwrap();
    transaction.commit().unwrap();

    assert_eq!(store.resolve(a).unwrap(), example_iri("renamed"));
    assert_eq!(store.lookup(&example_iri("renamed")).unwrap(), Some(a));
    assert_eq!(store.lookup(&example_iri("a")).unwrap(), None);
}

#[test]
fn builtin_resources_cannot_be_renamed_or_deleted() {
    let store = create_store();
    let transaction = store.transaction().unwrap();
    assert!(matches!(
        store.rename(rdf::TYPE, &example_iri("renamed")),
        Err(StorageError::BuiltinResource(id)) if id == rdf::TYPE
    ));
    assert!(matches!(
        store.delete_resource(rdfs::LABEL),
        Err(StorageError::BuiltinResource(id)) if id == rdfs::LABEL
    ));
    transaction.commit().unwrap();

    let rdf_type = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
    assert_eq!(store.resolve(rdf::TYPE).unwrap(), rdf_type);
    assert_eq!(store.lookup(&example_iri("renamed")).unwrap(), None);
    assert_eq!(store.lookup(rdf_type).unwrap(), Some(rdf::TYPE));
}

#[test]
fn rename_prefix_keeps_ids() {
    let store = create_store();
    let transaction = store.transaction().unwrap();
    let a = store.intern("http://old.org/a").unwrap();
    let renamed = store
        .rename_prefix("http://old.org/", "http://new.org/")
        .unwrap();
    transaction.commit().unwrap();

    assert_eq!(renamed, 1);
    assert_eq!(store.resolve(a).unwrap(), "http://new.org/a");
}

#[test]
fn fresh_identifiers_and_blank_nodes() {
    let store = create_store();
    let transaction = store.transaction().unwrap();
    store.intern(&example_iri("item7")).unwrap();
    let first = store.fresh_identifier(&example_iri("item")).unwrap();
    let second = store.fresh_identifier(&example_iri("item")).unwrap();
    let blank1 = store.new_blank_node().unwrap();
    let blank2 = store.new_blank_node().unwrap();
    transaction.commit().unwrap();

    assert_eq!(first, example_iri("item8"));
    assert_eq!(second, example_iri("item9"));
    assert_eq!(blank1, ResourceId::new(-1));
    assert_eq!(blank2, ResourceId::new(-2));
    assert_eq!(blank2.to_string(), "_:b2");
}

#[test]
fn destroy_context_keeps_other_contexts() {
    let store = create_store();
    let transaction = store.transaction().unwrap();
    let first = store.context(&example_iri("first")).unwrap();
    let second = store.context(&example_iri("second")).unwrap();
    let s = store.intern(&example_iri("s")).unwrap();
    store.insert_reference(first, s, rdf::TYPE, s).unwrap();
    store.insert_reference(second, s, rdf::TYPE, s).unwrap();
    store.destroy_context(first).unwrap();
    transaction.commit().unwrap();

    assert_eq!(store.len().unwrap(), 1);
    assert_eq!(store.len_in(second).unwrap(), 1);
    assert_eq!(store.lookup_context(&example_iri("first")).unwrap(), None);
    assert_eq!(store.contexts().unwrap(), vec![(second, example_iri("second"))]);
}

#[test]
fn enumerate_context_sorted_by_subject() {
    let store = create_store();
    let transaction = store.transaction().unwrap();
    let context = store.context(&example_iri("ctx")).unwrap();
    let b = store.intern(&example_iri("b")).unwrap();
    let a = store.intern(&example_iri("a")).unwrap();
    store
        .insert_literal(context, a, rdfs::LABEL, &Literal::simple("A"))
        .unwrap();
    store.insert_reference(context, b, rdf::TYPE, a).unwrap();
    transaction.commit().unwrap();

    let triples = store.triples_in_context(Some(context), true).unwrap();
    assert_eq!(
        triples.iter().map(StoredTriple::subject).collect::<Vec<_>>(),
        vec![b, a]
    );
    assert_debug_snapshot!(triples, @r#"
    [
        Reference(
            ReferenceTriple {
                context: ContextId(
                    1,
                ),
                subject: ResourceId(
                    300,
                ),
                predicate: ResourceId(
                    1,
                ),
                object: ResourceId(
                    301,
                ),
            },
        ),
        Literal(
            LiteralTriple {
                context: ContextId(
                    1,
                ),
                subject: ResourceId(
                    301,
                ),
                predicate: ResourceId(
                    14,
                ),
                literal: Literal {
                    value: Text(
                        "A",
                    ),
                    tag: Plain,
                },
            },
        ),
    ]
    "#);
}
