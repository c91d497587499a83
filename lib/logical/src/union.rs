use crate::algebra::{
    GroupPattern, PatternTerm, PredicatePattern, SimpleUnion, TriplePattern, TriplePosition,
    UnionPattern,
};
use quadlite_model::vocab::{rdf, rdfs};

/// Classifies the alternatives of a union.
///
/// A union is simple if every alternative consists of the same triples except for exactly one
/// position that holds a different constant in each alternative. Only single triples and the
/// `?s rdf:type ?c . ?c rdfs:subClassOf X` shape qualify.
pub fn classify_union(alternatives: Vec<GroupPattern>) -> UnionPattern {
    match simple_union(&alternatives) {
        Some(union) => UnionPattern::Simple(union),
        None => UnionPattern::General(alternatives),
    }
}

fn simple_union(alternatives: &[GroupPattern]) -> Option<SimpleUnion> {
    let first = alternatives.first()?;
    if alternatives.len() < 2 || !alternatives.iter().all(is_plain_triples) {
        return None;
    }
    let triple_count = first.triples.len();
    if alternatives
        .iter()
        .any(|alternative| alternative.triples.len() != triple_count)
    {
        return None;
    }
    let shape_is_supported = match triple_count {
        1 => true,
        2 => alternatives.iter().all(is_type_and_subclass),
        _ => false,
    };
    if !shape_is_supported {
        return None;
    }

    let mut varying = None;
    for alternative in &alternatives[1..] {
        for (index, (lhs, rhs)) in first.triples.iter().zip(&alternative.triples).enumerate() {
            if lhs.context != rhs.context {
                return None;
            }
            for position in [
                TriplePosition::Subject,
                TriplePosition::Predicate,
                TriplePosition::Object,
            ] {
                if same_position(lhs, rhs, position) {
                    continue;
                }
                match varying {
                    None => varying = Some((index, position)),
                    Some(current) if current == (index, position) => {}
                    Some(_) => return None,
                }
            }
        }
    }

    let (triple, position) = varying?;
    let terms = alternatives
        .iter()
        .map(|alternative| constant_at(&alternative.triples[triple], position))
        .collect::<Option<Vec<_>>>()?;
    let all_resources = terms
        .iter()
        .all(|term| matches!(term, PatternTerm::Resource(_)));
    let all_literals = position == TriplePosition::Object
        && terms
            .iter()
            .all(|term| matches!(term, PatternTerm::Literal(_)));
    if !all_resources && !all_literals {
        return None;
    }

    Some(SimpleUnion {
        triples: first.triples.clone(),
        triple,
        position,
        alternatives: terms,
    })
}

fn is_plain_triples(pattern: &GroupPattern) -> bool {
    !pattern.triples.is_empty()
        && pattern.closures.is_empty()
        && pattern.unions.is_empty()
        && pattern.optionals.is_empty()
        && pattern.binds.is_empty()
        && pattern.values.is_empty()
        && pattern.filters.is_empty()
}

fn is_type_and_subclass(pattern: &GroupPattern) -> bool {
    let has_predicate = |triple: &TriplePattern, predicate| {
        triple.predicate == PredicatePattern::Term(PatternTerm::Resource(predicate))
    };
    has_predicate(&pattern.triples[0], rdf::TYPE)
        && has_predicate(&pattern.triples[1], rdfs::SUB_CLASS_OF)
}

fn same_position(lhs: &TriplePattern, rhs: &TriplePattern, position: TriplePosition) -> bool {
    match position {
        TriplePosition::Subject => lhs.subject == rhs.subject,
        TriplePosition::Predicate => lhs.predicate == rhs.predicate,
        TriplePosition::Object => lhs.object == rhs.object,
    }
}

fn constant_at(triple: &TriplePattern, position: TriplePosition) -> Option<PatternTerm> {
    let term = match position {
        TriplePosition::Subject => &triple.subject,
        TriplePosition::Predicate => match &triple.predicate {
            PredicatePattern::Term(term) => term,
            PredicatePattern::OneOf(_) | PredicatePattern::NoneOf(_) => return None,
        },
        TriplePosition::Object => &triple.object,
    };
    term.is_constant().then(|| term.clone())
}
