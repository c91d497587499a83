use quadlite_logical::algebra::{
    ClosurePattern, GroupPattern, PredicatePattern, Query, TriplePattern, UnionPattern,
};
use quadlite_logical::{
    infer, parse_query, PatternError, PredicateKind, QueryOptions, TermResolver, VariableTypes,
};
use quadlite_model::vocab::{self, xsd};
use quadlite_model::{ContextId, ResourceId};
use std::fmt::Write;

mod inference;

const NAME: ResourceId = ResourceId::new(300);
const KNOWS: ResourceId = ResourceId::new(301);
const PERSON: ResourceId = ResourceId::new(302);
const ALICE: ResourceId = ResourceId::new(303);
const AGE: ResourceId = ResourceId::new(304);
const RELATED: ResourceId = ResourceId::new(305);

/// Resolves a fixed set of example resources.
struct ExampleResolver;

impl TermResolver for ExampleResolver {
    fn resolve_iri(&self, iri: &str) -> Result<Option<ResourceId>, PatternError> {
        let id = match iri.strip_prefix("http://example.com/") {
            Some("name") => NAME,
            Some("knows") => KNOWS,
            Some("Person") => PERSON,
            Some("alice") => ALICE,
            Some("age") => AGE,
            Some("related") => RELATED,
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

fn parse(text: &str) -> Result<Vec<Query>, PatternError> {
    parse_query(text, &options(), &ExampleResolver)
}

fn parse_one(text: &str) -> Query {
    let mut queries = parse(text).unwrap();
    assert_eq!(queries.len(), 1, "expected a single query");
    queries.remove(0)
}

fn parse_and_infer(text: &str) -> Result<(Query, VariableTypes), PatternError> {
    let mut query = parse_one(text);
    let types = infer(&mut query, &ExampleResolver)?;
    Ok((query, types))
}

/// Renders the triples, closures, and unions of a group, one per line.
fn render(group: &GroupPattern) -> String {
    let mut output = String::new();
    render_into(group, 0, &mut output);
    output
}

fn render_into(group: &GroupPattern, depth: usize, output: &mut String) {
    let indent = "  ".repeat(depth);
    for triple in &group.triples {
        writeln!(output, "{indent}{}", render_triple(triple)).unwrap();
    }
    for closure in &group.closures {
        writeln!(output, "{indent}{}", render_closure(closure)).unwrap();
    }
    for union in &group.unions {
        match union {
            UnionPattern::Simple(union) => {
                let alternatives = union
                    .alternatives
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ");
                writeln!(
                    output,
                    "{indent}SIMPLE UNION {:?} of triple {} over [{alternatives}]",
                    union.position, union.triple
                )
                .unwrap();
                for triple in &union.triples {
                    writeln!(output, "{indent}  {}", render_triple(triple)).unwrap();
                }
            }
            UnionPattern::General(alternatives) => {
                writeln!(output, "{indent}UNION").unwrap();
                for alternative in alternatives {
                    render_into(alternative, depth + 1, output);
                }
            }
        }
    }
    for optional in &group.optionals {
        writeln!(output, "{indent}OPTIONAL").unwrap();
        render_into(&optional.pattern, depth + 1, output);
    }
    if !group.filters.is_empty() {
        writeln!(output, "{indent}FILTERS {}", group.filters.len()).unwrap();
    }
}

fn render_triple(triple: &TriplePattern) -> String {
    let predicate = match &triple.predicate {
        PredicatePattern::Term(term) => term.to_string(),
        PredicatePattern::OneOf(predicates) => format!("({})", join_ids(predicates, "|")),
        PredicatePattern::NoneOf(predicates) => format!("!({})", join_ids(predicates, "|")),
    };
    let context = triple
        .context
        .map(|context| format!(" @{context}"))
        .unwrap_or_default();
    format!(
        "{} {predicate} {} [{:?}]{context}",
        triple.subject, triple.object, triple.table
    )
}

fn render_closure(closure: &ClosurePattern) -> String {
    format!(
        "{} ({}){:?} {}",
        closure.subject,
        join_ids(&closure.predicates, "|"),
        closure.repetition,
        closure.object
    )
}

fn join_ids(ids: &[ResourceId], separator: &str) -> String {
    ids.iter()
        .map(|id| format!("<{id}>"))
        .collect::<Vec<_>>()
        .join(separator)
}

#[test]
fn xsd_string_literals_are_plain() {
    let query = parse_one("SELECT * WHERE { ?x ex:name \"a\"^^xsd:string }");
    assert_eq!(
        render(&query.pattern),
        "?x <300> \"a\" [Quads]\n",
        "xsd:string ({}) should not be kept as a datatype",
        xsd::STRING
    );
}
