//! The SQL expressions that represent the variables of a block.
//!
//! Every table that mentions a variable registers a [Candidate] for it. Candidates are ordered
//! by their [Rank] first and by registration order second. The first candidate represents the
//! variable in the output and every other required candidate is joined against it. The order is
//! total, so compiling the same pattern twice yields the same statement.

use crate::sql::SqlExpr;
use quadlite_model::vocab::xsd;
use quadlite_model::Variable;

/// An SQL value together with the expression that yields its tag.
///
/// The tag is `NULL` for resources and blank nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct TypedExpr {
    pub value: SqlExpr,
    pub tag: SqlExpr,
    /// Numbers compare by value, regardless of their datatype.
    pub numeric: bool,
}

impl TypedExpr {
    pub fn new(value: SqlExpr, tag: SqlExpr) -> Self {
        Self {
            value,
            tag,
            numeric: false,
        }
    }

    pub fn resource(value: SqlExpr) -> Self {
        Self::new(value, SqlExpr::Null)
    }

    pub fn boolean(value: SqlExpr) -> Self {
        Self::new(value, SqlExpr::Integer(xsd::BOOLEAN.as_i64()))
    }

    pub fn plain(value: SqlExpr) -> Self {
        Self::new(value, SqlExpr::Integer(0))
    }

    pub fn integer(value: SqlExpr) -> Self {
        Self {
            value,
            tag: SqlExpr::Integer(xsd::INTEGER.as_i64()),
            numeric: true,
        }
    }

    /// A number whose datatype is derived from the SQLite storage class of `value`.
    pub fn number(value: SqlExpr) -> Self {
        Self {
            tag: numeric_tag(value.clone()),
            value,
            numeric: true,
        }
    }

    /// Returns true if the expression always yields resources.
    pub fn is_resource(&self) -> bool {
        self.tag == SqlExpr::Null
    }
}

/// `integer` values are `xsd:integer`, `real` values are `xsd:double`, and text is plain.
pub fn numeric_tag(value: SqlExpr) -> SqlExpr {
    SqlExpr::Case {
        operand: Some(Box::new(SqlExpr::function("typeof", vec![value]))),
        branches: vec![
            (
                SqlExpr::Text("integer"),
                SqlExpr::Integer(xsd::INTEGER.as_i64()),
            ),
            (SqlExpr::Text("real"), SqlExpr::Integer(xsd::DOUBLE.as_i64())),
            (SqlExpr::Text("null"), SqlExpr::Null),
        ],
        otherwise: Some(Box::new(SqlExpr::Integer(0))),
    }
}

/// The condition that two terms are identical.
pub fn same_term(lhs: &TypedExpr, rhs: &TypedExpr) -> SqlExpr {
    let tags = match (&lhs.tag, &rhs.tag) {
        (SqlExpr::Null, SqlExpr::Null) => SqlExpr::Integer(1),
        (SqlExpr::Null, tag) | (tag, SqlExpr::Null) if tag.is_non_null_constant() => {
            return SqlExpr::Integer(0)
        }
        (lhs, rhs) => SqlExpr::is(lhs.clone(), rhs.clone()),
    };
    SqlExpr::all([SqlExpr::eq(lhs.value.clone(), rhs.value.clone()), tags])
}

/// How strongly a candidate represents its variable. Lower ranks are preferred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Rank {
    /// Produced by a `BIND` or by a `VALUES` column without `UNDEF`.
    Fixed,
    /// A column of a required triple or of a union that binds the variable in every alternative.
    Join,
    /// An endpoint of a recursive property path.
    Closure,
    /// A column that may be `NULL`.
    Nullable,
    /// A column of a left-joined optional block. Only constrained in the `ON` clause.
    Optional,
}

impl Rank {
    pub fn is_nullable(self) -> bool {
        self >= Rank::Nullable
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub rank: Rank,
    pub expression: TypedExpr,
    sequence: usize,
}

/// The expression that stands for a variable.
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub expression: TypedExpr,
    /// The expression may be `NULL`, in which case the variable is unbound.
    pub nullable: bool,
}

impl Binding {
    pub fn new(expression: TypedExpr, nullable: bool) -> Self {
        Self {
            expression,
            nullable,
        }
    }
}

/// Returns the condition under which two bindings of the same variable are compatible.
///
/// A binding that is `NULL` is compatible with everything.
pub fn compatible(lhs: &Binding, rhs: &Binding) -> SqlExpr {
    let mut alternatives = Vec::new();
    if lhs.nullable {
        alternatives.push(SqlExpr::is_null(lhs.expression.value.clone()));
    }
    if rhs.nullable {
        alternatives.push(SqlExpr::is_null(rhs.expression.value.clone()));
    }
    alternatives.push(same_term(&lhs.expression, &rhs.expression));
    SqlExpr::any(alternatives)
}

#[derive(Debug, Clone, Default)]
pub struct Bindings {
    variables: Vec<(Variable, Vec<Candidate>)>,
    next_sequence: usize,
}

impl Bindings {
    pub fn add(&mut self, variable: &Variable, rank: Rank, expression: TypedExpr) {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        let candidate = Candidate {
            rank,
            expression,
            sequence,
        };
        match self
            .variables
            .iter_mut()
            .find(|(candidate, _)| candidate == variable)
        {
            Some((_, candidates)) => {
                let position = candidates
                    .partition_point(|other| (other.rank, other.sequence) <= (rank, sequence));
                candidates.insert(position, candidate);
            }
            None => self.variables.push((variable.clone(), vec![candidate])),
        }
    }

    pub fn contains(&self, variable: &Variable) -> bool {
        self.variables.iter().any(|(other, _)| other == variable)
    }

    pub fn candidates(&self, variable: &Variable) -> &[Candidate] {
        self.variables
            .iter()
            .find(|(other, _)| other == variable)
            .map_or(&[], |(_, candidates)| candidates.as_slice())
    }

    pub fn variables(&self) -> impl Iterator<Item = &Variable> {
        self.variables.iter().map(|(variable, _)| variable)
    }

    /// Returns the expression that represents `variable` or [None] if nothing binds it.
    pub fn get(&self, variable: &Variable) -> Option<Binding> {
        effective(self.candidates(variable))
    }

    /// The conditions that join the required candidates of every variable.
    pub fn join_conditions(&self) -> Vec<SqlExpr> {
        let mut conditions = Vec::new();
        for (_, candidates) in &self.variables {
            let required = candidates.partition_point(|candidate| candidate.rank < Rank::Optional);
            for index in 1..required {
                let Some(previous) = effective(&candidates[..index]) else {
                    continue;
                };
                let candidate = &candidates[index];
                let current = Binding::new(
                    candidate.expression.clone(),
                    candidate.rank.is_nullable(),
                );
                conditions.push(compatible(&previous, &current));
            }
        }
        conditions
    }

    /// Returns bindings in which every variable of `self` is a constant of a correlated
    /// subquery.
    pub fn correlated(&self) -> Bindings {
        let mut bindings = Bindings::default();
        for variable in self.variables() {
            if let Some(binding) = self.get(variable) {
                let rank = if binding.nullable {
                    Rank::Nullable
                } else {
                    Rank::Fixed
                };
                bindings.add(variable, rank, binding.expression);
            }
        }
        bindings
    }
}

/// The first candidate, or the first non-`NULL` one if the preferred candidate is nullable.
fn effective(candidates: &[Candidate]) -> Option<Binding> {
    let first = candidates.first()?;
    if !first.rank.is_nullable() || candidates.len() == 1 {
        return Some(Binding::new(
            first.expression.clone(),
            first.rank.is_nullable(),
        ));
    }

    let value = SqlExpr::function(
        "coalesce",
        candidates
            .iter()
            .map(|candidate| candidate.expression.value.clone())
            .collect(),
    );
    let tag = if candidates
        .iter()
        .all(|candidate| candidate.expression.is_resource())
    {
        SqlExpr::Null
    } else {
        SqlExpr::Case {
            operand: None,
            branches: candidates
                .iter()
                .map(|candidate| {
                    (
                        SqlExpr::is_not_null(candidate.expression.value.clone()),
                        candidate.expression.tag.clone(),
                    )
                })
                .collect(),
            otherwise: None,
        }
    };
    Some(Binding::new(TypedExpr::new(value, tag), true))
}
