use crate::{compile_with, options, sql};

#[test]
fn zero_or_more_from_a_fixed_subject() {
    insta::assert_snapshot!(sql("SELECT ?y WHERE { ex:alice ex:knows* ?y }"), @r"
    WITH RECURSIVE closure0(node) AS (SELECT 303 UNION SELECT refs.object FROM refs, closure0 WHERE refs.predicate = 301 AND refs.subject = closure0.node)
    SELECT closure0.node, NULL
    FROM closure0
    ");
}

#[test]
fn one_or_more_towards_a_fixed_object() {
    insta::assert_snapshot!(sql("SELECT ?x WHERE { ?x ex:knows+ ex:alice }"), @r"
    WITH RECURSIVE closure0(node) AS (SELECT refs.subject FROM refs WHERE refs.predicate = 301 AND refs.object = 303 UNION SELECT refs.subject FROM refs, closure0 WHERE refs.predicate = 301 AND refs.object = closure0.node)
    SELECT closure0.node, NULL
    FROM closure0
    ");
}

#[test]
fn zero_or_one_is_not_recursive() {
    insta::assert_snapshot!(sql("SELECT ?y WHERE { ex:alice ex:knows? ?y }"), @r"
    WITH closure0(node) AS (SELECT 303 UNION SELECT refs.object FROM refs WHERE refs.predicate = 301 AND refs.subject = 303)
    SELECT closure0.node, NULL
    FROM closure0
    ");
}

#[test]
fn depth_cap_walks_with_a_counter() {
    let options = options().with_max_path_depth(Some(3));
    let compiled = compile_with("SELECT ?y WHERE { ex:alice ex:knows+ ?y }", &options);
    insta::assert_snapshot!(compiled.sql, @r"
    WITH RECURSIVE walk1(node, depth) AS (SELECT refs.object, 1 FROM refs WHERE refs.predicate = 301 AND refs.subject = 303 UNION SELECT refs.object, walk1.depth + 1 FROM refs, walk1 WHERE refs.predicate = 301 AND refs.subject = walk1.node AND walk1.depth < 3),
    closure0(node) AS (SELECT DISTINCT walk1.node FROM walk1)
    SELECT closure0.node, NULL
    FROM closure0
    ");
}

#[test]
fn open_closure_starts_at_pinned_subjects() {
    let sql = sql("SELECT ?x ?y WHERE { ?x a ex:Person . ?x ex:knows* ?y }");
    assert!(
        sql.starts_with(
            "WITH RECURSIVE closure0(origin, node) AS (SELECT refs.subject, refs.subject FROM refs WHERE refs.predicate = 1 AND refs.object = 302 UNION "
        ),
        "{sql}"
    );
    assert!(sql.contains("t0.subject = closure0.origin"), "{sql}");
}

#[test]
fn open_closure_without_pinned_subjects() {
    let sql = sql("SELECT ?x ?y WHERE { ?x ex:knows* ?y }");
    assert!(
        sql.contains("SELECT refs.subject, refs.subject FROM refs WHERE refs.predicate = 301 UNION SELECT refs.object, refs.object FROM refs WHERE refs.predicate = 301"),
        "{sql}"
    );
}

#[test]
fn alternative_predicates_are_an_in_list() {
    let sql = sql("SELECT ?y WHERE { ex:alice (ex:knows|rdfs:seeAlso)+ ?y }");
    assert!(
        sql.contains("refs.predicate IN (301, 16)") || sql.contains("refs.predicate IN (16, 301)"),
        "{sql}"
    );
}
