//! The pattern algebra.
//!
//! A parsed query is a tree of [GroupPattern]s. Identifiers are already resolved against the
//! resource dictionary, property paths are normalized into plain triples and [ClosurePattern]s,
//! and unions are classified into [SimpleUnion]s and general unions.

use quadlite_model::{ContextId, Literal, ResourceId, Variable};
use std::fmt::{Display, Formatter};

/// A position of a triple pattern.
#[derive(Debug, Clone, PartialEq)]
pub enum PatternTerm {
    Variable(Variable),
    Resource(ResourceId),
    Literal(Literal),
    /// The runtime parameter with the given zero-based index.
    Parameter(usize),
}

impl PatternTerm {
    pub fn as_variable(&self) -> Option<&Variable> {
        match self {
            PatternTerm::Variable(variable) => Some(variable),
            _ => None,
        }
    }

    /// Returns true if the term is known before the query runs.
    pub fn is_constant(&self) -> bool {
        matches!(self, PatternTerm::Resource(_) | PatternTerm::Literal(_))
    }
}

impl Display for PatternTerm {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            PatternTerm::Variable(variable) => write!(f, "{variable}"),
            PatternTerm::Resource(id) => write!(f, "<{id}>"),
            PatternTerm::Literal(literal) => write!(f, "{literal}"),
            PatternTerm::Parameter(index) => write!(f, "??{}", index + 1),
        }
    }
}

/// The predicate position of a triple pattern.
#[derive(Debug, Clone, PartialEq)]
pub enum PredicatePattern {
    Term(PatternTerm),
    /// Any of the given predicates. Produced by path alternations and simple unions.
    OneOf(Vec<ResourceId>),
    /// Any predicate except the given ones. Produced by negated property sets.
    NoneOf(Vec<ResourceId>),
}

impl PredicatePattern {
    pub fn as_variable(&self) -> Option<&Variable> {
        match self {
            PredicatePattern::Term(term) => term.as_variable(),
            _ => None,
        }
    }
}

/// The relation a triple pattern is evaluated against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TableKind {
    /// Triples whose object is a resource.
    References,
    /// Triples whose object is a literal.
    Literals,
    /// The union of both relations. Used while the kind of the object is unknown.
    #[default]
    Quads,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TriplePattern {
    pub subject: PatternTerm,
    pub predicate: PredicatePattern,
    pub object: PatternTerm,
    /// Restricts the triple to a context (`GRAPH <iri> { ... }`).
    pub context: Option<ContextId>,
    /// Decided by type inference.
    pub table: TableKind,
}

impl TriplePattern {
    pub fn new(subject: PatternTerm, predicate: PredicatePattern, object: PatternTerm) -> Self {
        Self {
            subject,
            predicate,
            object,
            context: None,
            table: TableKind::default(),
        }
    }

    /// Iterates over the variables of the triple in subject, predicate, object order.
    pub fn variables(&self) -> impl Iterator<Item = &Variable> {
        [
            self.subject.as_variable(),
            self.predicate.as_variable(),
            self.object.as_variable(),
        ]
        .into_iter()
        .flatten()
    }
}

/// The repetition modifier of a property path step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Repetition {
    /// `?`
    ZeroOrOne,
    /// `*`
    ZeroOrMore,
    /// `+`
    OneOrMore,
}

impl Repetition {
    /// Returns true if the start node itself is part of the result.
    pub fn includes_start(self) -> bool {
        matches!(self, Repetition::ZeroOrOne | Repetition::ZeroOrMore)
    }

    pub fn is_recursive(self) -> bool {
        matches!(self, Repetition::ZeroOrMore | Repetition::OneOrMore)
    }
}

/// A repeated property path step between two endpoints.
///
/// Inverse steps are normalized by swapping the endpoints, so the closure always follows the
/// predicates from `subject` to `object`.
#[derive(Debug, Clone, PartialEq)]
pub struct ClosurePattern {
    pub subject: PatternTerm,
    pub predicates: Vec<ResourceId>,
    pub object: PatternTerm,
    pub repetition: Repetition,
    pub context: Option<ContextId>,
}

/// Identifies a position within the triples of a [SimpleUnion].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TriplePosition {
    Subject,
    Predicate,
    Object,
}

/// A union whose alternatives only differ in one fixed position.
///
/// The alternatives are either single triples or the two-triple shape
/// `?s rdf:type ?c . ?c rdfs:subClassOf X`. The union is evaluated as one join whose varying
/// position matches any of the `alternatives`.
#[derive(Debug, Clone, PartialEq)]
pub struct SimpleUnion {
    /// The triples of the first alternative.
    pub triples: Vec<TriplePattern>,
    /// The triple that contains the varying position.
    pub triple: usize,
    pub position: TriplePosition,
    /// Resources, or literals if the varying position is the object.
    pub alternatives: Vec<PatternTerm>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum UnionPattern {
    Simple(SimpleUnion),
    General(Vec<GroupPattern>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct OptionalPattern {
    pub pattern: GroupPattern,
    /// The condition of `OPTIONAL { ... FILTER(...) }` that may refer to outer variables.
    pub condition: Option<Expression>,
}

/// A static table of allowed variable tuples. [None] stands for `UNDEF`.
#[derive(Debug, Clone, PartialEq)]
pub struct ValuesTable {
    pub variables: Vec<Variable>,
    pub rows: Vec<Vec<Option<PatternTerm>>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bind {
    pub variable: Variable,
    pub expression: Expression,
}

/// A conjunction of triples together with the blocks that refine it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GroupPattern {
    pub triples: Vec<TriplePattern>,
    pub closures: Vec<ClosurePattern>,
    pub unions: Vec<UnionPattern>,
    pub optionals: Vec<OptionalPattern>,
    pub binds: Vec<Bind>,
    pub values: Vec<ValuesTable>,
    pub filters: Vec<Expression>,
}

impl GroupPattern {
    pub fn is_empty(&self) -> bool {
        self.triples.is_empty()
            && self.closures.is_empty()
            && self.unions.is_empty()
            && self.optionals.is_empty()
            && self.binds.is_empty()
            && self.values.is_empty()
            && self.filters.is_empty()
    }

    /// Appends all blocks of `other` to this group.
    pub fn merge(&mut self, other: GroupPattern) {
        self.triples.extend(other.triples);
        self.closures.extend(other.closures);
        self.unions.extend(other.unions);
        self.optionals.extend(other.optionals);
        self.binds.extend(other.binds);
        self.values.extend(other.values);
        self.filters.extend(other.filters);
    }

    /// Returns the variables that the group may bind, in order of their first appearance.
    ///
    /// Variables that only appear in filters are not bound by the group.
    pub fn bound_variables(&self) -> Vec<Variable> {
        let mut variables = Vec::new();
        self.collect_bound_variables(&mut variables);
        variables
    }

    fn collect_bound_variables(&self, variables: &mut Vec<Variable>) {
        let mut add = |variable: &Variable| {
            if !variables.contains(variable) {
                variables.push(variable.clone());
            }
        };
        for triple in &self.triples {
            triple.variables().for_each(&mut add);
        }
        for closure in &self.closures {
            [&closure.subject, &closure.object]
                .into_iter()
                .filter_map(PatternTerm::as_variable)
                .for_each(&mut add);
        }
        for values in &self.values {
            values.variables.iter().for_each(&mut add);
        }
        for bind in &self.binds {
            add(&bind.variable);
        }
        for union in &self.unions {
            match union {
                UnionPattern::Simple(union) => {
                    for triple in &union.triples {
                        triple.variables().for_each(&mut add);
                    }
                }
                UnionPattern::General(alternatives) => {
                    for alternative in alternatives {
                        alternative.bound_variables().iter().for_each(&mut add);
                    }
                }
            }
        }
        for optional in &self.optionals {
            optional.pattern.bound_variables().iter().for_each(&mut add);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Comparison {
    Equal,
    Less,
    LessOrEqual,
    Greater,
    GreaterOrEqual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArithmeticOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
}

/// The built-in functions of the pattern language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Function {
    Str,
    Lang,
    LangMatches,
    Datatype,
    Iri,
    StrLen,
    UCase,
    LCase,
    Contains,
    StrStarts,
    StrEnds,
    StrBefore,
    StrAfter,
    SubStr,
    Concat,
    Regex,
    Replace,
    Abs,
    Round,
    Ceil,
    Floor,
    IsIri,
    IsBlank,
    IsLiteral,
    IsNumeric,
    /// Full-text match of a literal value against an FTS5 expression.
    FullText,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Term(PatternTerm),
    Or(Box<Expression>, Box<Expression>),
    And(Box<Expression>, Box<Expression>),
    Not(Box<Expression>),
    Compare(Comparison, Box<Expression>, Box<Expression>),
    SameTerm(Box<Expression>, Box<Expression>),
    In(Box<Expression>, Vec<Expression>),
    Arithmetic(ArithmeticOperator, Box<Expression>, Box<Expression>),
    UnaryMinus(Box<Expression>),
    Bound(Variable),
    If(Box<Expression>, Box<Expression>, Box<Expression>),
    Coalesce(Vec<Expression>),
    Function(Function, Vec<Expression>),
    Exists(Box<GroupPattern>),
}

impl Expression {
    pub fn variable(variable: Variable) -> Self {
        Expression::Term(PatternTerm::Variable(variable))
    }

    /// Returns true for `EXISTS { ... }` and `NOT EXISTS { ... }`.
    pub fn is_exists(&self) -> bool {
        match self {
            Expression::Exists(_) => true,
            Expression::Not(inner) => matches!(inner.as_ref(), Expression::Exists(_)),
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AggregateFunction {
    Count,
    Sum,
    Avg,
    Min,
    Max,
    GroupConcat { separator: Option<String> },
    Sample,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Aggregate {
    pub function: AggregateFunction,
    pub distinct: bool,
    /// [None] for `COUNT(*)`.
    pub argument: Option<Expression>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderKey {
    pub expression: Expression,
    pub descending: bool,
}

/// The solution modifiers of a `SELECT` query.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Selection {
    pub projection: Vec<Variable>,
    pub distinct: bool,
    /// [Some] if the query groups its solutions. An empty list groups all solutions into one.
    pub group_by: Option<Vec<Variable>>,
    pub aggregates: Vec<(Variable, Aggregate)>,
    /// Expressions evaluated over the groups, e.g. `(COUNT(?x) + 1 AS ?n)`.
    pub group_binds: Vec<Bind>,
    pub having: Vec<Expression>,
    pub order_by: Vec<OrderKey>,
    pub offset: usize,
    pub limit: Option<usize>,
}

/// A position of a mutation template.
#[derive(Debug, Clone, PartialEq)]
pub enum TemplateTerm {
    Variable(Variable),
    /// Named nodes keep their iri, so that inserting them can intern new resources.
    Iri(String),
    /// A blank node label. Every matched row receives a fresh blank node per label.
    BlankNode(String),
    Literal(oxrdf::Literal),
    Parameter(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TemplateTriple {
    pub subject: TemplateTerm,
    pub predicate: TemplateTerm,
    pub object: TemplateTerm,
    /// The iri of the target context. [None] targets the default context of the update.
    pub context: Option<String>,
}

/// The templates of a `DELETE { } INSERT { } WHERE { }` operation.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Modification {
    pub delete: Vec<TemplateTriple>,
    pub insert: Vec<TemplateTriple>,
}

impl Modification {
    /// The variables the templates refer to.
    pub fn variables(&self) -> Vec<Variable> {
        let mut variables = Vec::new();
        for triple in self.delete.iter().chain(&self.insert) {
            for term in [&triple.subject, &triple.predicate, &triple.object] {
                if let TemplateTerm::Variable(variable) = term {
                    if !variables.contains(variable) {
                        variables.push(variable.clone());
                    }
                }
            }
        }
        variables
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum QueryForm {
    Select(Selection),
    Ask,
    Modify(Modification),
}

/// A single query or update operation.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub form: QueryForm,
    pub pattern: GroupPattern,
    /// The number of runtime parameters the query refers to.
    pub parameter_count: usize,
}
