use crate::{display, example_iri, TestStore};
use quadlite_execution::{QueryError, QueryResultsFormat};

fn write(store: &TestStore, query: &str, format: QueryResultsFormat) -> String {
    let bytes = store.run(query).write(Vec::new(), format).unwrap();
    String::from_utf8(bytes).unwrap()
}

#[test]
fn rows_of_typed_values() {
    let store = TestStore::with_data("ex:a ex:name \"A\" ; ex:age 1 .");
    let rows = store
        .select("SELECT ?n ?age WHERE { ?x ex:name ?n ; ex:age ?age }")
        .into_rows();
    let rendered = rows
        .iter()
        .map(|row| row.iter().flatten().map(display).collect::<Vec<_>>())
        .collect::<Vec<_>>();
    assert_eq!(rendered, vec![vec!["A".to_owned(), "1".to_owned()]]);
}

#[test]
fn flattened_scalars() {
    let store = TestStore::with_data("ex:a ex:knows ex:b . ex:c ex:knows ex:d .");
    let scalars = store
        .select("SELECT ?x ?y WHERE { ?x ex:knows ?y } ORDER BY ?x")
        .into_scalars()
        .map(|term| display(&term.unwrap()))
        .collect::<Vec<_>>();
    assert_eq!(
        scalars,
        vec![
            example_iri("a"),
            example_iri("b"),
            example_iri("c"),
            example_iri("d")
        ]
    );
}

#[test]
fn tsv() {
    let store = TestStore::with_data("ex:a ex:name \"Alice\"@en ; ex:knows _:friend .");
    let output = write(
        &store,
        "SELECT ?name ?friend WHERE { ?x ex:name ?name ; ex:knows ?friend }",
        QueryResultsFormat::Tsv,
    );
    insta::assert_snapshot!(output, @r#"
    ?name	?friend
    "Alice"@en	_:b1
    "#);
}

#[test]
fn json() {
    let store = TestStore::with_data("ex:a ex:knows ex:b .");
    let output = write(
        &store,
        "SELECT ?y WHERE { ex:a ex:knows ?y }",
        QueryResultsFormat::Json,
    );
    assert!(output.contains(r#""vars":["y"]"#), "{output}");
    assert!(
        output.contains(r#"{"y":{"type":"uri","value":"http://example.com/b"}}"#),
        "{output}"
    );
}

#[test]
fn xml_boolean() {
    let store = TestStore::with_data("ex:a ex:knows ex:b .");
    let output = write(&store, "ASK { ex:a ex:knows ex:b }", QueryResultsFormat::Xml);
    assert!(output.contains("<boolean>true</boolean>"), "{output}");
}

#[test]
fn updates_are_not_serializable() {
    let store = TestStore::new();
    let result = store
        .run("INSERT DATA { ex:a ex:knows ex:b }")
        .write(Vec::new(), QueryResultsFormat::Csv);
    assert!(matches!(result, Err(QueryError::NotSerializable)));
}
