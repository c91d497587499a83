use crate::{example_iri, TestStore};
use quadlite_execution::{QueryError, QueryResults};
use quadlite_logical::PatternError;
use quadlite_model::vocab::xsd;
use quadlite_model::{Literal, LiteralTag, Parameter, Term};

#[test]
fn select_decodes_resources_and_literals() {
    let store = TestStore::with_data(
        "ex:alice ex:knows ex:bob ; ex:name \"Alice\"@en ; ex:age 42 .",
    );
    let solutions = store.select("SELECT ?p ?o WHERE { ex:alice ?p ?o } ORDER BY ?p");
    assert_eq!(solutions.len(), 3);

    let knows = solutions
        .rows()
        .iter()
        .find(|row| matches!(&row[0], Some(term) if term.iri() == Some(example_iri("knows").as_str())))
        .unwrap();
    assert!(matches!(&knows[1], Some(Term::Resource(bob)) if bob.iri() == example_iri("bob")));

    let literals = solutions
        .rows()
        .iter()
        .filter_map(|row| row[1].as_ref()?.as_literal().cloned())
        .collect::<Vec<_>>();
    assert!(literals.contains(&Literal::language_tagged("Alice", "en")));
    assert!(literals.contains(&Literal::new(42_i64, LiteralTag::Datatype(xsd::INTEGER))));
}

#[test]
fn ask() {
    let store = TestStore::with_data("ex:alice ex:knows ex:bob .");
    assert_eq!(
        store.run("ASK { ex:alice ex:knows ex:bob }"),
        QueryResults::Boolean(true)
    );
    assert_eq!(
        store.run("ASK { ex:bob ex:knows ex:alice }"),
        QueryResults::Boolean(false)
    );
}

#[test]
fn subjects_of_a_class_are_distinct() {
    let store = TestStore::with_data(
        "ex:x1 a ex:ClassA . ex:x2 a ex:ClassA . ex:x3 a ex:ClassA . ex:y a ex:ClassB .",
    );
    let mut subjects = store.column("SELECT ?x WHERE { ?x a ex:ClassA }");
    subjects.sort();
    assert_eq!(
        subjects,
        vec![example_iri("x1"), example_iri("x2"), example_iri("x3")]
    );
}

#[test]
fn zero_or_more_includes_the_origin() {
    let store = TestStore::with_data(
        "ex:A rdfs:subClassOf ex:B . ex:B rdfs:subClassOf ex:RootClass .",
    );
    let mut classes = store.column("SELECT ?x WHERE { ?x rdfs:subClassOf* ex:RootClass }");
    classes.sort();
    assert_eq!(
        classes,
        vec![example_iri("A"), example_iri("B"), example_iri("RootClass")]
    );
}

#[test]
fn one_or_more_excludes_the_origin() {
    let store = TestStore::with_data("ex:A ex:next ex:B . ex:B ex:next ex:C .");
    let mut star = store.column("SELECT ?x WHERE { ex:A ex:next* ?x }");
    star.sort();
    assert_eq!(star, vec![example_iri("A"), example_iri("B"), example_iri("C")]);

    let mut plus = store.column("SELECT ?x WHERE { ex:A ex:next+ ?x }");
    plus.sort();
    assert_eq!(plus, vec![example_iri("B"), example_iri("C")]);
}

#[test]
fn unmatched_optional_leaves_the_variable_unbound() {
    let store = TestStore::with_data(
        "ex:a a ex:Item ; ex:note \"first\" . ex:b a ex:Item .",
    );
    let solutions = store.select(
        "SELECT ?x ?note WHERE { ?x a ex:Item OPTIONAL { ?x ex:note ?note } } ORDER BY ?x",
    );
    assert_eq!(solutions.len(), 2);
    let rows = solutions.into_rows();
    assert_eq!(rows[0][1], Some(Term::Literal(Literal::simple("first"))));
    assert!(rows[1][0].is_some());
    assert_eq!(rows[1][1], None);
}

#[test]
fn group_starting_with_an_optional() {
    let store = TestStore::with_data("ex:a a ex:Item ; ex:note \"first\" . ex:b a ex:Item .");
    assert_eq!(
        store.column("SELECT ?n WHERE { OPTIONAL { ex:a ex:note ?n } }"),
        vec!["first".to_owned()]
    );

    let unmatched = store.select("SELECT ?n WHERE { OPTIONAL { ex:b ex:note ?n } }");
    assert_eq!(unmatched.into_rows(), vec![vec![None]]);

    let group = store.select("SELECT ?n WHERE { OPTIONAL { ex:a ex:note ?n ; a ex:Item } }");
    assert_eq!(
        group.into_rows(),
        vec![vec![Some(Term::Literal(Literal::simple("first")))]]
    );
}

#[test]
fn optional_after_a_bind() {
    let store = TestStore::with_data("ex:a ex:note \"first\" . ex:b a ex:Item .");
    let rows = store
        .select("SELECT ?x ?n WHERE { BIND(ex:b AS ?x) OPTIONAL { ?x ex:note ?n } }")
        .into_rows();
    assert_eq!(rows.len(), 1);
    assert_eq!(
        rows[0][0].as_ref().and_then(Term::iri),
        Some(example_iri("b").as_str())
    );
    assert_eq!(rows[0][1], None);

    let rows = store
        .select("SELECT ?x ?n WHERE { BIND(ex:a AS ?x) OPTIONAL { ?x ex:note ?n } }")
        .into_rows();
    assert_eq!(rows[0][1], Some(Term::Literal(Literal::simple("first"))));
}

#[test]
fn simple_union_equals_the_union_of_its_alternatives() {
    let store = TestStore::with_data(
        "ex:a a ex:Cat . ex:b a ex:Dog . ex:c a ex:Bird . ex:d a ex:Cat .",
    );
    let mut union =
        store.column("SELECT ?x WHERE { { ?x a ex:Cat } UNION { ?x a ex:Dog } } ORDER BY ?x");
    union.sort();

    let mut separate = store.column("SELECT ?x WHERE { ?x a ex:Cat }");
    separate.extend(store.column("SELECT ?x WHERE { ?x a ex:Dog }"));
    separate.sort();
    separate.dedup();
    assert_eq!(union, separate);
}

#[test]
fn filters_on_numbers() {
    let store = TestStore::with_data("ex:a ex:age 20 . ex:b ex:age 40 . ex:c ex:age 60 .");
    let adults = store.column("SELECT ?x WHERE { ?x ex:age ?age FILTER(?age > 30) } ORDER BY ?age");
    assert_eq!(adults, vec![example_iri("b"), example_iri("c")]);
}

#[test]
fn aggregates() {
    let store = TestStore::with_data("ex:a ex:age 20 . ex:b ex:age 40 .");
    let solutions = store.select("SELECT (COUNT(?x) AS ?count) (SUM(?age) AS ?sum) WHERE { ?x ex:age ?age }");
    let rows = solutions.into_rows();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0][0], Some(Term::Literal(Literal::from(2_i64))));
    assert_eq!(
        rows[0][1].as_ref().and_then(Term::as_literal).map(Literal::lexical_form),
        Some("60".into())
    );
}

#[test]
fn literal_parameters() {
    let store = TestStore::with_data("ex:a ex:name \"Alice\" . ex:b ex:name \"Bob\" .");
    let solutions = store
        .try_run_with(
            "SELECT ?x WHERE { ?x ex:name ?? }",
            &[Parameter::from("Bob")],
        )
        .unwrap()
        .into_solutions()
        .unwrap();
    assert_eq!(solutions.len(), 1);
    assert_eq!(
        solutions.rows()[0][0].as_ref().and_then(Term::iri),
        Some(example_iri("b").as_str())
    );
}

#[test]
fn resource_parameters() {
    let store = TestStore::with_data("ex:a ex:knows ex:b . ex:c ex:knows ex:d .");
    let c = store.store.lookup(&example_iri("c")).unwrap().unwrap();
    let solutions = store
        .try_run_with("SELECT ?y WHERE { ??1 ex:knows ?y }", &[Parameter::from(c)])
        .unwrap()
        .into_solutions()
        .unwrap();
    assert_eq!(
        solutions.rows()[0][0].as_ref().and_then(Term::iri),
        Some(example_iri("d").as_str())
    );
}

#[test]
fn parameter_count_is_checked() {
    let store = TestStore::with_data("ex:a ex:name \"Alice\" .");
    let result = store.try_run_with("SELECT ?x WHERE { ?x ex:name ?? }", &[]);
    assert!(matches!(
        result,
        Err(QueryError::ParameterCount {
            expected: 1,
            found: 0
        })
    ));
}

#[test]
fn unknown_identifiers_fail_in_strict_mode() {
    let store = TestStore::new();
    let result = store.try_run_with("SELECT ?x WHERE { ?x ex:unknown ?y }", &[]);
    assert!(matches!(
        result,
        Err(QueryError::Pattern(PatternError::UnknownIdentifier(iri))) if iri == example_iri("unknown")
    ));
}

#[test]
fn declared_properties_select_the_relation() {
    let store = TestStore::with_data(
        "ex:knows a owl:ObjectProperty . ex:label a owl:DatatypeProperty .",
    );
    let executor = store.executor();
    let options = crate::options();

    let prepared = executor
        .prepare("SELECT ?x WHERE { ?x ex:knows ?y }", &options)
        .unwrap();
    assert!(prepared.operations()[0].sql.contains("FROM refs AS t0"));

    let prepared = executor
        .prepare("SELECT ?x WHERE { ?x ex:label ?y }", &options)
        .unwrap();
    assert!(prepared.operations()[0].sql.contains("FROM literals AS t0"));
}

#[test]
fn graph_restricts_the_context() {
    let store = TestStore::with_data(
        "ex:a ex:knows ex:b . GRAPH ex:other { ex:a ex:knows ex:c }",
    );
    assert_eq!(
        store.column("SELECT ?y WHERE { GRAPH ex:other { ex:a ex:knows ?y } }"),
        vec![example_iri("c")]
    );
    let mut all = store.column("SELECT ?y WHERE { ex:a ex:knows ?y }");
    all.sort();
    assert_eq!(all, vec![example_iri("b"), example_iri("c")]);
}
