//! Type inference for pattern variables.
//!
//! Every triple is evaluated against one of the relations of the store. The reference relation
//! holds triples with resource objects and the literal relation those with literal objects. The
//! inference decides which relation a triple reads from its constants, the kinds of the
//! predicates, and the kinds of the variables. The kind of a variable is fixed by the first
//! piece of evidence in a required scope and every contradicting piece of evidence is an error.
//!
//! Union alternatives and `EXISTS` blocks are child scopes. They see the kinds fixed by their
//! parent but their own evidence stays local. Optional blocks are advisory: conflicts within them
//! are ignored because an optional block that cannot match is not an error.

use crate::algebra::{
    Expression, Function, GroupPattern, PatternTerm, PredicatePattern, Query, SimpleUnion,
    TableKind, TriplePattern, TriplePosition, UnionPattern,
};
use crate::resolver::{PredicateKind, TermResolver};
use crate::PatternError;
use quadlite_model::vocab::rdfs;
use quadlite_model::Variable;
use rustc_hash::FxHashMap;
use std::fmt::{Display, Formatter};
use tracing::trace;

/// The role in which a variable is used. Reported by type conflicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Subject,
    Predicate,
    ReferenceObject,
    LiteralObject,
    ReferenceBinding,
    LiteralBinding,
    Values,
    ClosureEndpoint,
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Role::Subject => "subject",
            Role::Predicate => "predicate",
            Role::ReferenceObject => "resource object",
            Role::LiteralObject => "literal object",
            Role::ReferenceBinding => "resource binding",
            Role::LiteralBinding => "literal binding",
            Role::Values => "VALUES entry",
            Role::ClosureEndpoint => "path endpoint",
        })
    }
}

/// The kind of values a variable can be bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VariableKind {
    /// Resources and blank nodes.
    Reference,
    Literal,
    #[default]
    Any,
}

/// The kinds of the variables of a query, in the order in which they were fixed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VariableTypes {
    entries: Vec<(Variable, VariableKind)>,
}

impl VariableTypes {
    /// Returns the kind of `variable`. Variables without evidence are [VariableKind::Any].
    pub fn get(&self, variable: &Variable) -> VariableKind {
        self.entries
            .iter()
            .find(|(candidate, _)| candidate == variable)
            .map_or(VariableKind::Any, |(_, kind)| *kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Variable, VariableKind)> {
        self.entries.iter().map(|(variable, kind)| (variable, *kind))
    }
}

/// Decides the relation of every triple of `query` and returns the kinds of the variables of
/// its top-level group.
pub fn infer(
    query: &mut Query,
    resolver: &dyn TermResolver,
) -> Result<VariableTypes, PatternError> {
    let inference = TypeInference { resolver };
    let mut scope = Scope::root();
    inference.infer_group(&mut query.pattern, &mut scope)?;
    Ok(VariableTypes {
        entries: scope
            .entries
            .into_iter()
            .map(|(variable, kind, _)| (variable, kind))
            .collect(),
    })
}

struct Scope<'p> {
    parent: Option<&'p Scope<'p>>,
    advisory: bool,
    index: FxHashMap<Variable, usize>,
    entries: Vec<(Variable, VariableKind, Role)>,
    /// Predicate kinds derived from `?p rdfs:subPropertyOf <q>`.
    predicate_kinds: FxHashMap<Variable, PredicateKind>,
}

impl Scope<'_> {
    fn root() -> Self {
        Self {
            parent: None,
            advisory: false,
            index: FxHashMap::default(),
            entries: Vec::new(),
            predicate_kinds: FxHashMap::default(),
        }
    }

    fn child<'c>(&'c self, advisory: bool) -> Scope<'c> {
        Scope {
            parent: Some(self),
            advisory: advisory || self.advisory,
            ..Scope::root()
        }
    }

    fn lookup(&self, variable: &Variable) -> Option<(VariableKind, Role)> {
        match self.index.get(variable) {
            Some(position) => {
                let (_, kind, role) = &self.entries[*position];
                Some((*kind, *role))
            }
            None => self.parent?.lookup(variable),
        }
    }

    fn kind(&self, variable: &Variable) -> VariableKind {
        self.lookup(variable)
            .map_or(VariableKind::Any, |(kind, _)| kind)
    }

    fn predicate_kind(&self, variable: &Variable) -> PredicateKind {
        match self.predicate_kinds.get(variable) {
            Some(kind) => *kind,
            None => self
                .parent
                .map_or(PredicateKind::Unknown, |parent| parent.predicate_kind(variable)),
        }
    }

    /// Records that `variable` has `kind`. Returns true if this is new evidence.
    fn fix(
        &mut self,
        variable: &Variable,
        kind: VariableKind,
        role: Role,
    ) -> Result<bool, PatternError> {
        if kind == VariableKind::Any {
            return Ok(false);
        }
        match self.lookup(variable) {
            Some((existing, _)) if existing == kind => Ok(false),
            Some(_) if self.advisory => Ok(false),
            Some((_, first)) => Err(PatternError::TypeConflict {
                variable: variable.as_str().to_owned(),
                first,
                second: role,
            }),
            None => {
                trace!(variable = variable.as_str(), ?kind, %role, "Fixed variable kind");
                self.index.insert(variable.clone(), self.entries.len());
                self.entries.push((variable.clone(), kind, role));
                Ok(true)
            }
        }
    }

    fn fix_term(
        &mut self,
        term: &PatternTerm,
        kind: VariableKind,
        role: Role,
    ) -> Result<bool, PatternError> {
        match term.as_variable() {
            Some(variable) => self.fix(variable, kind, role),
            None => Ok(false),
        }
    }
}

struct TypeInference<'r> {
    resolver: &'r dyn TermResolver,
}

impl TypeInference<'_> {
    fn infer_group(&self, group: &mut GroupPattern, scope: &mut Scope<'_>) -> Result<(), PatternError> {
        self.fix_positions(group, scope)?;

        // Table decisions can fix object variables, which in turn decide other triples.
        loop {
            let mut changed = false;
            for triple in &mut group.triples {
                changed |= self.decide_triple(triple, None, scope)?;
            }
            for union in &mut group.unions {
                if let UnionPattern::Simple(union) = union {
                    changed |= self.decide_simple_union(union, scope)?;
                }
            }
            for bind in &group.binds {
                let (kind, role) = match expression_kind(&bind.expression, &*scope) {
                    VariableKind::Reference => (VariableKind::Reference, Role::ReferenceBinding),
                    VariableKind::Literal => (VariableKind::Literal, Role::LiteralBinding),
                    VariableKind::Any => continue,
                };
                changed |= scope.fix(&bind.variable, kind, role)?;
            }
            if !changed {
                break;
            }
        }

        for union in &mut group.unions {
            if let UnionPattern::General(alternatives) = union {
                for alternative in alternatives {
                    let mut child = scope.child(false);
                    self.infer_group(alternative, &mut child)?;
                }
            }
        }
        for optional in &mut group.optionals {
            let mut child = scope.child(true);
            self.infer_group(&mut optional.pattern, &mut child)?;
            if let Some(condition) = &mut optional.condition {
                self.infer_expression(condition, &child)?;
            }
        }
        for bind in &mut group.binds {
            self.infer_expression(&mut bind.expression, scope)?;
        }
        for filter in &mut group.filters {
            self.infer_expression(filter, scope)?;
        }
        Ok(())
    }

    /// Fixes the variables whose kind follows from their position alone.
    fn fix_positions(&self, group: &GroupPattern, scope: &mut Scope<'_>) -> Result<(), PatternError> {
        let simple_union_triples = group.unions.iter().filter_map(|union| match union {
            UnionPattern::Simple(union) => Some(&union.triples),
            UnionPattern::General(_) => None,
        });
        for triple in group.triples.iter().chain(simple_union_triples.flatten()) {
            scope.fix_term(&triple.subject, VariableKind::Reference, Role::Subject)?;
            if let Some(variable) = triple.predicate.as_variable() {
                scope.fix(variable, VariableKind::Reference, Role::Predicate)?;
            }
            self.record_sub_property(triple, scope)?;
        }

        for closure in &group.closures {
            for endpoint in [&closure.subject, &closure.object] {
                scope.fix_term(endpoint, VariableKind::Reference, Role::ClosureEndpoint)?;
            }
            if closure.predicates == [rdfs::SUB_PROPERTY_OF] {
                if let (Some(variable), PatternTerm::Resource(parent)) =
                    (closure.subject.as_variable(), &closure.object)
                {
                    let kind = self.resolver.predicate_kind(*parent)?;
                    scope.predicate_kinds.insert(variable.clone(), kind);
                }
            }
        }

        for values in &group.values {
            for (column, variable) in values.variables.iter().enumerate() {
                let mut kinds = values
                    .rows
                    .iter()
                    .filter_map(|row| row.get(column).and_then(Option::as_ref))
                    .map(constant_kind);
                let Some(first) = kinds.next() else {
                    continue;
                };
                if kinds.all(|kind| kind == first) {
                    scope.fix(variable, first, Role::Values)?;
                }
            }
        }
        Ok(())
    }

    /// `?p rdfs:subPropertyOf <q>` gives `?p` the predicate kind of `<q>`.
    fn record_sub_property(
        &self,
        triple: &TriplePattern,
        scope: &mut Scope<'_>,
    ) -> Result<(), PatternError> {
        let is_sub_property = triple.predicate
            == PredicatePattern::Term(PatternTerm::Resource(rdfs::SUB_PROPERTY_OF));
        if let (true, Some(variable), PatternTerm::Resource(parent)) =
            (is_sub_property, triple.subject.as_variable(), &triple.object)
        {
            let kind = self.resolver.predicate_kind(*parent)?;
            scope.predicate_kinds.insert(variable.clone(), kind);
        }
        Ok(())
    }

    /// Decides the relation of `triple`. `predicate_kind` overrides the kind derived from the
    /// predicate. Returns true if the decision fixed a new variable kind.
    fn decide_triple(
        &self,
        triple: &mut TriplePattern,
        predicate_kind: Option<PredicateKind>,
        scope: &mut Scope<'_>,
    ) -> Result<bool, PatternError> {
        let predicate_kind = match predicate_kind {
            Some(kind) => kind,
            None => self.predicate_kind(&triple.predicate, scope)?,
        };
        let table = match (&triple.object, predicate_kind) {
            (PatternTerm::Literal(_), _) => TableKind::Literals,
            (PatternTerm::Resource(_), _) => TableKind::References,
            (_, PredicateKind::Reference) => TableKind::References,
            (_, PredicateKind::Literal) => TableKind::Literals,
            (PatternTerm::Variable(variable), PredicateKind::Unknown) => {
                match scope.kind(variable) {
                    VariableKind::Reference => TableKind::References,
                    VariableKind::Literal => TableKind::Literals,
                    VariableKind::Any => TableKind::Quads,
                }
            }
            (PatternTerm::Parameter(_), PredicateKind::Unknown) => TableKind::Quads,
        };
        triple.table = table;

        match table {
            TableKind::References => {
                scope.fix_term(&triple.object, VariableKind::Reference, Role::ReferenceObject)
            }
            TableKind::Literals => {
                scope.fix_term(&triple.object, VariableKind::Literal, Role::LiteralObject)
            }
            TableKind::Quads => Ok(false),
        }
    }

    fn decide_simple_union(
        &self,
        union: &mut SimpleUnion,
        scope: &mut Scope<'_>,
    ) -> Result<bool, PatternError> {
        let mut changed = false;
        for index in 0..union.triples.len() {
            let predicate_kind = if index == union.triple {
                match union.position {
                    TriplePosition::Object => Some(uniform_kind(
                        union.alternatives.iter().map(|term| match constant_kind(term) {
                            VariableKind::Reference => PredicateKind::Reference,
                            VariableKind::Literal => PredicateKind::Literal,
                            VariableKind::Any => PredicateKind::Unknown,
                        }),
                    )),
                    TriplePosition::Predicate => {
                        let mut kinds = Vec::with_capacity(union.alternatives.len());
                        for alternative in &union.alternatives {
                            kinds.push(match alternative {
                                PatternTerm::Resource(id) => self.resolver.predicate_kind(*id)?,
                                _ => PredicateKind::Unknown,
                            });
                        }
                        Some(uniform_kind(kinds.into_iter()))
                    }
                    TriplePosition::Subject => None,
                }
            } else {
                None
            };
            changed |= self.decide_triple(&mut union.triples[index], predicate_kind, scope)?;
        }
        Ok(changed)
    }

    fn predicate_kind(
        &self,
        predicate: &PredicatePattern,
        scope: &Scope<'_>,
    ) -> Result<PredicateKind, PatternError> {
        match predicate {
            PredicatePattern::Term(PatternTerm::Resource(id)) => self.resolver.predicate_kind(*id),
            PredicatePattern::Term(PatternTerm::Variable(variable)) => {
                Ok(scope.predicate_kind(variable))
            }
            PredicatePattern::Term(PatternTerm::Literal(_) | PatternTerm::Parameter(_))
            | PredicatePattern::NoneOf(_) => Ok(PredicateKind::Unknown),
            PredicatePattern::OneOf(predicates) => {
                let mut kinds = Vec::with_capacity(predicates.len());
                for predicate in predicates {
                    kinds.push(self.resolver.predicate_kind(*predicate)?);
                }
                Ok(uniform_kind(kinds.into_iter()))
            }
        }
    }

    fn infer_expression(
        &self,
        expression: &mut Expression,
        scope: &Scope<'_>,
    ) -> Result<(), PatternError> {
        match expression {
            Expression::Exists(pattern) => {
                let mut child = scope.child(false);
                self.infer_group(pattern, &mut child)
            }
            Expression::Or(lhs, rhs)
            | Expression::And(lhs, rhs)
            | Expression::Compare(_, lhs, rhs)
            | Expression::SameTerm(lhs, rhs)
            | Expression::Arithmetic(_, lhs, rhs) => {
                self.infer_expression(lhs, scope)?;
                self.infer_expression(rhs, scope)
            }
            Expression::Not(inner) | Expression::UnaryMinus(inner) => {
                self.infer_expression(inner, scope)
            }
            Expression::If(condition, then, otherwise) => {
                self.infer_expression(condition, scope)?;
                self.infer_expression(then, scope)?;
                self.infer_expression(otherwise, scope)
            }
            Expression::In(needle, haystack) => {
                self.infer_expression(needle, scope)?;
                for expression in haystack {
                    self.infer_expression(expression, scope)?;
                }
                Ok(())
            }
            Expression::Coalesce(arguments) | Expression::Function(_, arguments) => {
                for argument in arguments {
                    self.infer_expression(argument, scope)?;
                }
                Ok(())
            }
            Expression::Term(_) | Expression::Bound(_) => Ok(()),
        }
    }
}

fn constant_kind(term: &PatternTerm) -> VariableKind {
    match term {
        PatternTerm::Resource(_) => VariableKind::Reference,
        PatternTerm::Literal(_) => VariableKind::Literal,
        PatternTerm::Variable(_) | PatternTerm::Parameter(_) => VariableKind::Any,
    }
}

/// Returns the common kind or [PredicateKind::Unknown] if the kinds disagree.
fn uniform_kind(mut kinds: impl Iterator<Item = PredicateKind>) -> PredicateKind {
    let Some(first) = kinds.next() else {
        return PredicateKind::Unknown;
    };
    if kinds.all(|kind| kind == first) {
        first
    } else {
        PredicateKind::Unknown
    }
}

/// The kind of the values an expression evaluates to.
pub fn expression_kind(expression: &Expression, types: &impl KindLookup) -> VariableKind {
    match expression {
        Expression::Term(PatternTerm::Variable(variable)) => types.kind_of(variable),
        Expression::Term(term) => constant_kind(term),
        Expression::Function(Function::Iri | Function::Datatype, _) => VariableKind::Reference,
        Expression::If(_, then, otherwise) => {
            let kind = expression_kind(then, types);
            if kind == expression_kind(otherwise, types) {
                kind
            } else {
                VariableKind::Any
            }
        }
        Expression::Coalesce(arguments) => {
            let mut kinds = arguments
                .iter()
                .map(|argument| expression_kind(argument, types));
            match kinds.next() {
                Some(first) if kinds.all(|kind| kind == first) => first,
                _ => VariableKind::Any,
            }
        }
        _ => VariableKind::Literal,
    }
}

/// Provides the kinds of variables to [expression_kind].
pub trait KindLookup {
    fn kind_of(&self, variable: &Variable) -> VariableKind;
}

impl KindLookup for VariableTypes {
    fn kind_of(&self, variable: &Variable) -> VariableKind {
        self.get(variable)
    }
}

impl KindLookup for Scope<'_> {
    fn kind_of(&self, variable: &Variable) -> VariableKind {
        self.kind(variable)
    }
}
