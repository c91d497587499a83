use crate::{parse_and_infer, render};
use quadlite_logical::{PatternError, Role, VariableKind};
use quadlite_model::Variable;

fn variable(name: &str) -> Variable {
    Variable::new_unchecked(name)
}

#[test]
fn tables_follow_predicates_and_constants() {
    let (query, types) = parse_and_infer(
        "SELECT * WHERE { ?x a ex:Person ; ex:name ?n ; ex:knows ?y ; ex:related \"r\" }",
    )
    .unwrap();
    insta::assert_snapshot!(render(&query.pattern), @r#"
    ?x <1> <302> [References]
    ?x <300> ?n [Literals]
    ?x <301> ?y [References]
    ?x <305> "r" [Literals]
    "#);
    assert_eq!(types.get(&variable("x")), VariableKind::Reference);
    assert_eq!(types.get(&variable("n")), VariableKind::Literal);
    assert_eq!(types.get(&variable("y")), VariableKind::Reference);
}

#[test]
fn object_kind_propagates_until_fixed_point() {
    let (query, types) =
        parse_and_infer("SELECT * WHERE { ?a ex:related ?b . ?b ex:related ?c . ?c ex:knows ?d }")
            .unwrap();
    insta::assert_snapshot!(render(&query.pattern), @r"
    ?a <305> ?b [References]
    ?b <305> ?c [References]
    ?c <301> ?d [References]
    ");
    assert_eq!(types.get(&variable("b")), VariableKind::Reference);
}

#[test]
fn unknown_objects_read_both_relations() {
    let (query, types) = parse_and_infer("SELECT * WHERE { ?x ex:related ?v }").unwrap();
    insta::assert_snapshot!(render(&query.pattern), @"?x <305> ?v [Quads]");
    assert_eq!(types.get(&variable("v")), VariableKind::Any);
}

#[test]
fn literal_used_as_subject_is_a_conflict() {
    let result = parse_and_infer("SELECT * WHERE { ?x ex:name ?n . ?n ex:knows ?y }");
    let Err(PatternError::TypeConflict {
        variable,
        first,
        second,
    }) = result
    else {
        panic!("expected a type conflict")
    };
    assert_eq!(variable, "n");
    assert_eq!((first, second), (Role::Subject, Role::LiteralObject));
}

#[test]
fn binding_conflicts_with_subject() {
    let result =
        parse_and_infer("SELECT * WHERE { ?x ex:knows ?y BIND(STR(?y) AS ?z) ?z ex:knows ?w }");
    assert!(matches!(
        result,
        Err(PatternError::TypeConflict {
            second: Role::LiteralBinding,
            ..
        })
    ));
}

#[test]
fn union_alternatives_are_scoped() {
    let (query, _) = parse_and_infer(
        "SELECT * WHERE { { ?x ex:name ?v . ?x a ex:Person } UNION { ?v ex:knows ?x } }",
    )
    .unwrap();
    insta::assert_snapshot!(render(&query.pattern), @r"
    UNION
      ?x <300> ?v [Literals]
      ?x <1> <302> [References]
      ?v <301> ?x [References]
    ");
}

#[test]
fn simple_union_with_mixed_predicates() {
    let (query, _) =
        parse_and_infer("SELECT * WHERE { { ?x ex:name ?v } UNION { ?x ex:knows ?v } }").unwrap();
    insta::assert_snapshot!(render(&query.pattern), @r"
    SIMPLE UNION Predicate of triple 0 over [<300>, <301>]
      ?x <300> ?v [Quads]
    ");
}

#[test]
fn optional_blocks_are_advisory() {
    let (query, types) = parse_and_infer(
        "SELECT * WHERE { ?x ex:name ?n OPTIONAL { ?n ex:knows ?y } OPTIONAL { ?x ex:related ?z . ?z a ex:Person } }",
    )
    .unwrap();
    insta::assert_snapshot!(render(&query.pattern), @r"
    ?x <300> ?n [Literals]
    OPTIONAL
      ?n <301> ?y [References]
    OPTIONAL
      ?x <305> ?z [References]
      ?z <1> <302> [References]
    ");
    assert_eq!(types.get(&variable("z")), VariableKind::Any);
}

#[test]
fn sub_property_declares_predicate_kind() {
    let (query, _) = parse_and_infer(
        "SELECT * WHERE { ?p rdfs:subPropertyOf ex:name . ?x ?p ?v . ?q rdfs:subPropertyOf* ex:knows . ?y ?q ?w }",
    )
    .unwrap();
    insta::assert_snapshot!(render(&query.pattern), @r"
    ?p <11> <300> [References]
    ?x ?p ?v [Literals]
    ?y ?q ?w [References]
    ?q (<11>)ZeroOrMore <301>
    ");
}

#[test]
fn exists_is_a_child_scope() {
    let (query, types) = parse_and_infer(
        "SELECT * WHERE { ?x ex:related ?v FILTER EXISTS { ?v ex:knows ?y } }",
    )
    .unwrap();
    insta::assert_snapshot!(render(&query.pattern), @r"
    ?x <305> ?v [Quads]
    FILTERS 1
    ");
    assert_eq!(types.get(&variable("v")), VariableKind::Any);
}

#[test]
fn values_fix_kinds() {
    let (query, types) = parse_and_infer(
        "SELECT * WHERE { VALUES ?v { \"a\" \"b\" } ?x ex:related ?v }",
    )
    .unwrap();
    insta::assert_snapshot!(render(&query.pattern), @"?x <305> ?v [Literals]");
    assert_eq!(types.get(&variable("v")), VariableKind::Literal);
}

#[test]
fn inference_is_deterministic() {
    let text = "SELECT * WHERE { ?a ex:related ?b . ?b ex:knows ?c . ?c ex:name ?d }";
    let (first_query, first_types) = parse_and_infer(text).unwrap();
    let (second_query, second_types) = parse_and_infer(text).unwrap();
    assert_eq!(first_query, second_query);
    assert_eq!(first_types, second_types);
}
