use crate::{compile_with, options, sql, text, try_compile_with};
use quadlite_physical::{CompileError, ParamSlot};
use rusqlite::types::Value;

#[test]
fn numbers_compare_by_value() {
    let compiled = compile_with(
        "SELECT ?x WHERE { ?x ex:age ?a FILTER(?a > 30 && ?a = 40) }",
        &options(),
    );
    assert!(
        compiled.sql.ends_with("AND t0.value > ? AND t0.value = ?"),
        "{}",
        compiled.sql
    );
    assert_eq!(
        compiled.slots,
        vec![
            ParamSlot::Value(Value::Integer(30)),
            ParamSlot::Value(Value::Integer(40))
        ]
    );
}

#[test]
fn strings_compare_as_terms() {
    let sql = sql("SELECT ?x WHERE { ?x ex:name ?n FILTER(?n = \"bob\") }");
    assert!(sql.ends_with("AND t0.value = ? AND t0.tag IS 0"), "{sql}");
}

#[test]
fn division_is_never_integer_division() {
    let sql = sql("SELECT ?d WHERE { ?x ex:age ?a BIND(?a / 2 AS ?d) }");
    assert!(sql.starts_with("SELECT (t0.value * 1.0) / ?, CASE typeof("), "{sql}");
}

#[test]
fn regex_flags_are_inlined() {
    let compiled = compile_with(
        "SELECT ?x WHERE { ?x ex:name ?n FILTER(REGEX(?n, \"^a\", \"i\")) }",
        &options(),
    );
    assert!(
        compiled.sql.ends_with("AND regexp(? || ?, t0.value)"),
        "{}",
        compiled.sql
    );
    assert_eq!(compiled.slots, vec![text("(?i)"), text("^a")]);
}

#[test]
fn unsupported_regex_flags() {
    let result = try_compile_with(
        "SELECT ?x WHERE { ?x ex:name ?n FILTER(REGEX(?n, \"^a\", \"q\")) }",
        &options(),
    );
    assert!(matches!(result, Err(CompileError::NotImplemented(_))));
}

#[test]
fn bound_checks_the_optional_column() {
    let sql = sql(
        "SELECT ?x WHERE { ?x ex:knows ex:alice OPTIONAL { ?x ex:name ?n } FILTER(!BOUND(?n)) }",
    );
    assert!(sql.ends_with("AND NOT t1.value IS NOT NULL"), "{sql}");
}

#[test]
fn term_type_tests() {
    let sql = sql("SELECT ?x WHERE { ?x ex:knows ?y FILTER(isBlank(?y)) }");
    assert!(sql.ends_with("AND t0.object < 0"), "{sql}");

    let sql = crate::sql("SELECT ?x WHERE { ?x ex:name ?n FILTER(isLiteral(?n)) }");
    assert!(sql.ends_with("AND t0.tag IS NOT NULL"), "{sql}");
}

#[test]
fn str_of_a_resource_reads_the_dictionary() {
    let sql = sql("SELECT ?s WHERE { ?x ex:knows ?y BIND(STR(?y) AS ?s) }");
    assert!(
        sql.starts_with(
            "SELECT (SELECT resources.iri FROM resources WHERE resources.id = t0.object), 0"
        ),
        "{sql}"
    );
}

#[test]
fn string_functions_keep_the_language_tag() {
    let sql = sql("SELECT ?u WHERE { ?x ex:name ?n BIND(UCASE(?n) AS ?u) }");
    assert!(sql.starts_with("SELECT upper(t0.value), t0.tag"), "{sql}");
}

#[test]
fn count_distinct_star_is_not_supported() {
    let result = try_compile_with(
        "SELECT (COUNT(DISTINCT *) AS ?c) WHERE { ?x ex:name ?n }",
        &options(),
    );
    assert!(matches!(result, Err(CompileError::NotImplemented(_))));
}

#[test]
fn min_of_references_keeps_them_references() {
    let sql = sql("SELECT (MIN(?y) AS ?m) WHERE { ?x ex:knows ?y }");
    assert!(sql.starts_with("SELECT min(t0.object), NULL"), "{sql}");
}

#[test]
fn group_concat_uses_the_separator() {
    let compiled = compile_with(
        "SELECT (GROUP_CONCAT(?n; SEPARATOR=\"|\") AS ?all) WHERE { ?x ex:name ?n }",
        &options(),
    );
    assert!(
        compiled.sql.starts_with("SELECT group_concat(t0.value, ?), 0"),
        "{}",
        compiled.sql
    );
    assert_eq!(compiled.slots, vec![text("|")]);
}
