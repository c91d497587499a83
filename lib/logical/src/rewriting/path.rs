//! Normalization of property paths into triples and closures.

use super::PatternRewriter;
use crate::algebra::{
    ClosurePattern, GroupPattern, PatternTerm, PredicatePattern, Repetition,
};
use crate::union::classify_union;
use crate::PatternError;
use quadlite_model::ResourceId;
use spargebra::algebra::PropertyPathExpression;
use spargebra::term::{NamedNode, TermPattern};

impl PatternRewriter<'_> {
    pub(super) fn rewrite_path(
        &self,
        subject: &TermPattern,
        path: &PropertyPathExpression,
        object: &TermPattern,
    ) -> Result<GroupPattern, PatternError> {
        self.path_group(self.term(subject)?, path, self.term(object)?)
    }

    fn path_group(
        &self,
        subject: PatternTerm,
        path: &PropertyPathExpression,
        object: PatternTerm,
    ) -> Result<GroupPattern, PatternError> {
        match path {
            PropertyPathExpression::NamedNode(node) => {
                let predicate = PatternTerm::Resource(self.resource(node.as_str())?);
                Ok(self.single_triple(subject, PredicatePattern::Term(predicate), object))
            }
            PropertyPathExpression::Reverse(inner) => self.path_group(object, inner, subject),
            PropertyPathExpression::Sequence(first, second) => {
                let middle = PatternTerm::Variable(self.hidden_variable("path"));
                let mut group = self.path_group(subject, first, middle.clone())?;
                group.merge(self.path_group(middle, second, object)?);
                Ok(group)
            }
            PropertyPathExpression::Alternative(..) => {
                if let Some((predicates, reversed)) = self.step_predicates(path)? {
                    let (subject, object) = orient(subject, object, reversed);
                    return Ok(self.single_triple(
                        subject,
                        PredicatePattern::OneOf(predicates),
                        object,
                    ));
                }
                let mut alternatives = Vec::new();
                collect_alternatives(path, &mut alternatives);
                let alternatives = alternatives
                    .into_iter()
                    .map(|alternative| {
                        self.path_group(subject.clone(), alternative, object.clone())
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(GroupPattern {
                    unions: vec![classify_union(alternatives)],
                    ..GroupPattern::default()
                })
            }
            PropertyPathExpression::ZeroOrOne(inner) => {
                self.closure(subject, inner, object, Repetition::ZeroOrOne)
            }
            PropertyPathExpression::ZeroOrMore(inner) => {
                self.closure(subject, inner, object, Repetition::ZeroOrMore)
            }
            PropertyPathExpression::OneOrMore(inner) => {
                self.closure(subject, inner, object, Repetition::OneOrMore)
            }
            PropertyPathExpression::NegatedPropertySet(nodes) => {
                // Predicates that are not in the dictionary cannot be matched anyway.
                let mut excluded = Vec::new();
                for node in nodes {
                    if let Some(id) = self.resolver.resolve_iri(node.as_str())? {
                        excluded.push(id);
                    }
                }
                Ok(self.single_triple(subject, PredicatePattern::NoneOf(excluded), object))
            }
        }
    }

    fn closure(
        &self,
        subject: PatternTerm,
        step: &PropertyPathExpression,
        object: PatternTerm,
        repetition: Repetition,
    ) -> Result<GroupPattern, PatternError> {
        let Some((predicates, reversed)) = self.step_predicates(step)? else {
            return Err(PatternError::NotImplemented(
                "repetition of paths other than predicates and their alternatives".to_owned(),
            ));
        };
        let (subject, object) = orient(subject, object, reversed);
        Ok(GroupPattern {
            closures: vec![ClosurePattern {
                subject,
                predicates,
                object,
                repetition,
                context: self.active_context(),
            }],
            ..GroupPattern::default()
        })
    }

    fn single_triple(
        &self,
        subject: PatternTerm,
        predicate: PredicatePattern,
        object: PatternTerm,
    ) -> GroupPattern {
        GroupPattern {
            triples: vec![self.triple(subject, predicate, object)],
            ..GroupPattern::default()
        }
    }

    /// Returns the predicates of a path that is a predicate or an alternative of predicates that
    /// are all followed in the same direction. The flag is set if they are followed in reverse.
    fn step_predicates(
        &self,
        path: &PropertyPathExpression,
    ) -> Result<Option<(Vec<ResourceId>, bool)>, PatternError> {
        let mut steps = Vec::new();
        if !collect_steps(path, false, &mut steps) {
            return Ok(None);
        }
        let Some((_, reversed)) = steps.first().copied() else {
            return Ok(None);
        };
        if steps.iter().any(|(_, step_reversed)| *step_reversed != reversed) {
            return Ok(None);
        }

        let mut predicates = Vec::new();
        for (node, _) in steps {
            let id = self.resource(node.as_str())?;
            if !predicates.contains(&id) {
                predicates.push(id);
            }
        }
        Ok(Some((predicates, reversed)))
    }
}

fn orient(subject: PatternTerm, object: PatternTerm, reversed: bool) -> (PatternTerm, PatternTerm) {
    if reversed {
        (object, subject)
    } else {
        (subject, object)
    }
}

fn collect_steps<'p>(
    path: &'p PropertyPathExpression,
    reversed: bool,
    steps: &mut Vec<(&'p NamedNode, bool)>,
) -> bool {
    match path {
        PropertyPathExpression::NamedNode(node) => {
            steps.push((node, reversed));
            true
        }
        PropertyPathExpression::Reverse(inner) => collect_steps(inner, !reversed, steps),
        PropertyPathExpression::Alternative(lhs, rhs) => {
            collect_steps(lhs, reversed, steps) && collect_steps(rhs, reversed, steps)
        }
        _ => false,
    }
}

fn collect_alternatives<'p>(
    path: &'p PropertyPathExpression,
    alternatives: &mut Vec<&'p PropertyPathExpression>,
) {
    if let PropertyPathExpression::Alternative(lhs, rhs) = path {
        collect_alternatives(lhs, alternatives);
        collect_alternatives(rhs, alternatives);
    } else {
        alternatives.push(path);
    }
}
