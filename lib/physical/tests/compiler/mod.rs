use quadlite_logical::{
    infer, parse_query, PatternError, PredicateKind, QueryOptions, TermResolver,
};
use quadlite_model::vocab;
use quadlite_model::{ContextId, ResourceId, Variable};
use quadlite_physical::{compile, CompileError, CompiledForm, CompiledQuery, ParamSlot};
use rusqlite::types::Value;

mod closures;
mod expressions;

const NAME: ResourceId = ResourceId::new(300);
const KNOWS: ResourceId = ResourceId::new(301);
const PERSON: ResourceId = ResourceId::new(302);
const ALICE: ResourceId = ResourceId::new(303);
const AGE: ResourceId = ResourceId::new(304);

struct ExampleResolver;

impl TermResolver for ExampleResolver {
    fn resolve_iri(&self, iri: &str) -> Result<Option<ResourceId>, PatternError> {
        let id = match iri.strip_prefix("http://example.com/") {
            Some("name") => NAME,
            Some("knows") => KNOWS,
            Some("Person") => PERSON,
            Some("alice") => ALICE,
            Some("age") => AGE,
            _ => return Ok(vocab::builtin_id(iri)),
        };
        Ok(Some(id))
    }

    fn resolve_context(&self, iri: &str) -> Result<Option<ContextId>, PatternError> {
        Ok((iri == "http://example.com/graph").then(|| ContextId::new(1)))
    }

    fn predicate_kind(&self, predicate: ResourceId) -> Result<PredicateKind, PatternError> {
        Ok(match predicate {
            NAME | AGE => PredicateKind::Literal,
            KNOWS => PredicateKind::Reference,
            _ => quadlite_logical::builtin_predicate_kind(predicate),
        })
    }
}

fn options() -> QueryOptions {
    QueryOptions::default().with_prefix("ex", "http://example.com/")
}

fn try_compile_with(text: &str, options: &QueryOptions) -> Result<CompiledQuery, CompileError> {
    let mut queries = parse_query(text, options, &ExampleResolver).unwrap();
    assert_eq!(queries.len(), 1, "expected a single query");
    let mut query = queries.remove(0);
    let types = infer(&mut query, &ExampleResolver).unwrap();
    compile(&query, &types, options)
}

fn compile_with(text: &str, options: &QueryOptions) -> CompiledQuery {
    try_compile_with(text, options).unwrap()
}

fn sql(text: &str) -> String {
    compile_with(text, &options()).sql
}

fn text(value: &str) -> ParamSlot {
    ParamSlot::Value(Value::Text(value.to_owned()))
}

#[test]
fn literal_object() {
    let compiled = compile_with("SELECT ?n WHERE { ex:alice ex:name ?n }", &options());
    insta::assert_snapshot!(compiled.sql, @r"
    SELECT t0.value, t0.tag
    FROM literals AS t0
    WHERE t0.subject = 303 AND t0.predicate = 300
    ");
    assert!(compiled.slots.is_empty());
    assert_eq!(compiled.columns, vec![Variable::new_unchecked("n")]);
    assert_eq!(compiled.form, CompiledForm::Select);
}

#[test]
fn shared_variables_are_joined() {
    insta::assert_snapshot!(sql("SELECT ?x ?n WHERE { ?x ex:knows ex:alice . ?x ex:name ?n }"), @r"
    SELECT t0.subject, NULL, t1.value, t1.tag
    FROM refs AS t0, literals AS t1
    WHERE t0.predicate = 301 AND t0.object = 303 AND t1.predicate = 300 AND t0.subject = t1.subject
    ");
}

#[test]
fn literal_constants_are_parameters() {
    let compiled = compile_with("SELECT ?x WHERE { ?x ex:name \"Alice\" }", &options());
    insta::assert_snapshot!(compiled.sql, @r"
    SELECT t0.subject, NULL
    FROM literals AS t0
    WHERE t0.predicate = 300 AND t0.value = ? AND t0.tag IS 0
    ");
    assert_eq!(compiled.slots, vec![text("Alice")]);
}

#[test]
fn runtime_parameters_keep_their_index() {
    let compiled = compile_with("SELECT ?x WHERE { ?x ex:name ??1 }", &options());
    assert_eq!(
        compiled.slots,
        vec![ParamSlot::Argument(0), ParamSlot::ArgumentTag(0)]
    );
    assert_eq!(compiled.parameter_count, 1);
}

#[test]
fn simple_union_becomes_an_in_list() {
    let sql = sql("SELECT ?x WHERE { { ?x a ex:Person } UNION { ?x a ex:alice } }");
    assert!(sql.contains("t0.object IN (302, 303)"), "{sql}");
    assert!(!sql.contains("UNION"), "{sql}");
}

#[test]
fn general_union_is_a_table_expression() {
    let sql = sql(
        "SELECT ?x ?v WHERE { { ?x ex:name ?v } UNION { ?x ex:knows ?y . ?y ex:name ?v } }",
    );
    assert!(sql.starts_with("WITH union0(value0, value1, tag1, value2) AS ("), "{sql}");
    assert!(sql.contains(" UNION ALL "), "{sql}");
    assert!(sql.contains("SELECT union0.value0, NULL, union0.value1, union0.tag1"), "{sql}");
}

#[test]
fn single_triple_optional_is_left_joined() {
    insta::assert_snapshot!(sql("SELECT ?x ?n WHERE { ?x ex:knows ex:alice OPTIONAL { ?x ex:name ?n } }"), @r"
    SELECT t0.subject, NULL, t1.value, t1.tag
    FROM refs AS t0 LEFT JOIN literals AS t1 ON t1.predicate = 300 AND t0.subject = t1.subject
    WHERE t0.predicate = 301 AND t0.object = 303
    ");
}

#[test]
fn complex_optional_is_a_table_expression() {
    let sql = sql(
        "SELECT ?x ?n WHERE { ?x ex:knows ex:alice OPTIONAL { ?x ex:knows ?y . ?y ex:name ?n } }",
    );
    assert!(sql.starts_with("WITH optional0("), "{sql}");
    assert!(sql.contains("LEFT JOIN optional0 ON t0.subject = optional0.value0"), "{sql}");
}

#[test]
fn optional_filters_are_join_conditions() {
    let sql = sql(
        "SELECT ?x ?n WHERE { ?x ex:knows ex:alice OPTIONAL { ?x ex:name ?n FILTER(?n != \"b\") } }",
    );
    assert!(sql.contains("LEFT JOIN literals AS t1 ON "), "{sql}");
    assert!(!sql.contains("WHERE t0.predicate = 301 AND t0.object = 303 AND"), "{sql}");
}

#[test]
fn values_of_a_bound_variable_are_a_filter() {
    insta::assert_snapshot!(sql("SELECT ?x ?n WHERE { VALUES ?x { ex:alice } ?x ex:name ?n }"), @r"
    SELECT t0.subject, NULL, t0.value, t0.tag
    FROM literals AS t0
    WHERE t0.predicate = 300 AND t0.subject = 303
    ");
}

#[test]
fn values_table_with_undef() {
    let compiled = compile_with(
        "SELECT ?x ?n WHERE { VALUES (?x ?n) { (ex:alice \"a\") (UNDEF \"b\") } }",
        &options(),
    );
    insta::assert_snapshot!(compiled.sql, @r"
    WITH values0(value0, tag0, value1, tag1) AS (VALUES (303, NULL, ?, 0), (NULL, NULL, ?, 0))
    SELECT values0.value0, NULL, values0.value1, values0.tag1
    FROM values0
    ");
    assert_eq!(compiled.slots, vec![text("a"), text("b")]);
}

#[test]
fn exists_filters_are_deferred() {
    insta::assert_snapshot!(sql("SELECT ?x WHERE { ?x ex:name ?n FILTER NOT EXISTS { ?x ex:knows ex:alice } }"), @r"
    WITH one(i) AS (SELECT 1)
    SELECT t0.subject, NULL
    FROM literals AS t0 CROSS JOIN one
    WHERE t0.predicate = 300 AND one.i = (NOT EXISTS (SELECT 1 FROM refs AS t1 WHERE t1.predicate = 301 AND t1.object = 303 AND t0.subject = t1.subject))
    ");
}

#[test]
fn exists_filters_without_deferral() {
    let options = options().with_deprioritize_exists(false);
    let sql = compile_with(
        "SELECT ?x WHERE { ?x ex:name ?n FILTER EXISTS { ?x ex:knows ex:alice } }",
        &options,
    )
    .sql;
    assert!(!sql.contains("one"), "{sql}");
    assert!(sql.contains("AND EXISTS (SELECT 1 FROM refs AS t1"), "{sql}");
}

#[test]
fn grouping_and_aggregates() {
    insta::assert_snapshot!(sql("SELECT ?x (COUNT(?n) AS ?c) WHERE { ?x ex:name ?n } GROUP BY ?x"), @r"
    SELECT t0.subject, NULL, count(t0.value), 73
    FROM literals AS t0
    WHERE t0.predicate = 300
    GROUP BY t0.subject
    ");
}

#[test]
fn solution_modifiers() {
    let sql = sql("SELECT DISTINCT ?n WHERE { ?x ex:name ?n } ORDER BY DESC(?n) LIMIT 5 OFFSET 2");
    assert!(sql.starts_with("SELECT DISTINCT t0.value, t0.tag"), "{sql}");
    assert!(sql.ends_with("ORDER BY t0.value DESC\nLIMIT 5 OFFSET 2"), "{sql}");
}

#[test]
fn ask_is_an_exists_query() {
    let compiled = compile_with("ASK { ex:alice ex:knows ?x }", &options());
    insta::assert_snapshot!(compiled.sql, @"SELECT EXISTS (SELECT 1 FROM refs AS t0 WHERE t0.subject = 303 AND t0.predicate = 301)");
    assert_eq!(compiled.form, CompiledForm::Ask);
    assert!(compiled.columns.is_empty());
}

#[test]
fn modifications_select_distinct_template_variables() {
    let compiled = compile_with(
        "DELETE { ?x ex:name ?n } WHERE { ?x ex:knows ex:alice ; ex:name ?n }",
        &options(),
    );
    assert!(compiled.sql.starts_with("SELECT DISTINCT t0.subject, NULL, t1.value, t1.tag"));
    assert_eq!(
        compiled.columns,
        vec![Variable::new_unchecked("x"), Variable::new_unchecked("n")]
    );
    assert!(matches!(compiled.form, CompiledForm::Modify(_)));
}

#[test]
fn projected_variables_must_be_bound() {
    let result = try_compile_with("SELECT ?z WHERE { ?x ex:name ?n }", &options());
    assert!(matches!(result, Err(CompileError::UnboundVariable(variable)) if variable == "?z"));
}

#[test]
fn full_text_matches_the_literal_row() {
    let compiled = compile_with(
        "SELECT ?x WHERE { ?x ex:name ?n FILTER(<urn:quadlite:fn#fts>(?n, \"alic*\")) }",
        &options(),
    );
    insta::assert_snapshot!(compiled.sql, @r"
    SELECT t0.subject, NULL
    FROM literals AS t0
    WHERE t0.predicate = 300 AND t0.rowid IN (SELECT fts_300.rowid FROM fts_300 WHERE fts_300.value MATCH ?)
    ");
    assert_eq!(compiled.slots, vec![text("alic*")]);
}

#[test]
fn full_text_needs_a_literal_triple() {
    let result = try_compile_with(
        "SELECT ?x WHERE { ?x ex:knows ?y FILTER(<urn:quadlite:fn#fts>(?y, \"a\")) }",
        &options(),
    );
    assert!(matches!(result, Err(CompileError::InvalidFullText(_))));
}

#[test]
fn compilation_is_deterministic() {
    let text = "SELECT * WHERE {
        ?x ex:knows* ?y .
        ?y ex:name ?n
        OPTIONAL { ?y ex:age ?a }
        FILTER NOT EXISTS { ?x ex:knows ex:alice }
    }";
    assert_eq!(compile_with(text, &options()), compile_with(text, &options()));
}
