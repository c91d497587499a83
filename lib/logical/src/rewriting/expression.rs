use super::{variable_term, PatternRewriter};
use crate::algebra::{ArithmeticOperator, Comparison, Expression, Function, PatternTerm};
use crate::PatternError;
use quadlite_model::vocab::FULL_TEXT_FUNCTION;
use spargebra::algebra::{Expression as SparqlExpression, Function as SparqlFunction};

impl PatternRewriter<'_> {
    pub(super) fn rewrite_expression(
        &self,
        expression: &SparqlExpression,
    ) -> Result<Expression, PatternError> {
        Ok(match expression {
            SparqlExpression::NamedNode(node) => {
                Expression::Term(PatternTerm::Resource(self.resource(node.as_str())?))
            }
            SparqlExpression::Literal(literal) => {
                Expression::Term(PatternTerm::Literal(self.literal(literal)?))
            }
            SparqlExpression::Variable(variable) => Expression::Term(variable_term(variable)),
            SparqlExpression::Or(lhs, rhs) => Expression::Or(self.boxed(lhs)?, self.boxed(rhs)?),
            SparqlExpression::And(lhs, rhs) => {
                Expression::And(self.boxed(lhs)?, self.boxed(rhs)?)
            }
            SparqlExpression::Not(inner) => Expression::Not(self.boxed(inner)?),
            SparqlExpression::Equal(lhs, rhs) => self.comparison(Comparison::Equal, lhs, rhs)?,
            SparqlExpression::Greater(lhs, rhs) => {
                self.comparison(Comparison::Greater, lhs, rhs)?
            }
            SparqlExpression::GreaterOrEqual(lhs, rhs) => {
                self.comparison(Comparison::GreaterOrEqual, lhs, rhs)?
            }
            SparqlExpression::Less(lhs, rhs) => self.comparison(Comparison::Less, lhs, rhs)?,
            SparqlExpression::LessOrEqual(lhs, rhs) => {
                self.comparison(Comparison::LessOrEqual, lhs, rhs)?
            }
            SparqlExpression::SameTerm(lhs, rhs) => {
                Expression::SameTerm(self.boxed(lhs)?, self.boxed(rhs)?)
            }
            SparqlExpression::In(needle, haystack) => {
                Expression::In(self.boxed(needle)?, self.rewrite_expressions(haystack)?)
            }
            SparqlExpression::Add(lhs, rhs) => self.arithmetic(ArithmeticOperator::Add, lhs, rhs)?,
            SparqlExpression::Subtract(lhs, rhs) => {
                self.arithmetic(ArithmeticOperator::Subtract, lhs, rhs)?
            }
            SparqlExpression::Multiply(lhs, rhs) => {
                self.arithmetic(ArithmeticOperator::Multiply, lhs, rhs)?
            }
            SparqlExpression::Divide(lhs, rhs) => {
                self.arithmetic(ArithmeticOperator::Divide, lhs, rhs)?
            }
            SparqlExpression::UnaryPlus(inner) => self.rewrite_expression(inner)?,
            SparqlExpression::UnaryMinus(inner) => Expression::UnaryMinus(self.boxed(inner)?),
            SparqlExpression::Exists(pattern) => {
                Expression::Exists(Box::new(self.rewrite_group(pattern)?))
            }
            SparqlExpression::Bound(variable) => Expression::Bound(variable.clone()),
            SparqlExpression::If(condition, then, otherwise) => Expression::If(
                self.boxed(condition)?,
                self.boxed(then)?,
                self.boxed(otherwise)?,
            ),
            SparqlExpression::Coalesce(arguments) => {
                Expression::Coalesce(self.rewrite_expressions(arguments)?)
            }
            SparqlExpression::FunctionCall(function, arguments) => {
                Expression::Function(map_function(function)?, self.rewrite_expressions(arguments)?)
            }
        })
    }

    fn rewrite_expressions(
        &self,
        expressions: &[SparqlExpression],
    ) -> Result<Vec<Expression>, PatternError> {
        expressions
            .iter()
            .map(|expression| self.rewrite_expression(expression))
            .collect()
    }

    fn boxed(&self, expression: &SparqlExpression) -> Result<Box<Expression>, PatternError> {
        Ok(Box::new(self.rewrite_expression(expression)?))
    }

    fn comparison(
        &self,
        comparison: Comparison,
        lhs: &SparqlExpression,
        rhs: &SparqlExpression,
    ) -> Result<Expression, PatternError> {
        Ok(Expression::Compare(comparison, self.boxed(lhs)?, self.boxed(rhs)?))
    }

    fn arithmetic(
        &self,
        operator: ArithmeticOperator,
        lhs: &SparqlExpression,
        rhs: &SparqlExpression,
    ) -> Result<Expression, PatternError> {
        Ok(Expression::Arithmetic(operator, self.boxed(lhs)?, self.boxed(rhs)?))
    }
}

fn map_function(function: &SparqlFunction) -> Result<Function, PatternError> {
    Ok(match function {
        SparqlFunction::Str => Function::Str,
        SparqlFunction::Lang => Function::Lang,
        SparqlFunction::LangMatches => Function::LangMatches,
        SparqlFunction::Datatype => Function::Datatype,
        SparqlFunction::Iri => Function::Iri,
        SparqlFunction::StrLen => Function::StrLen,
        SparqlFunction::UCase => Function::UCase,
        SparqlFunction::LCase => Function::LCase,
        SparqlFunction::Contains => Function::Contains,
        SparqlFunction::StrStarts => Function::StrStarts,
        SparqlFunction::StrEnds => Function::StrEnds,
        SparqlFunction::StrBefore => Function::StrBefore,
        SparqlFunction::StrAfter => Function::StrAfter,
        SparqlFunction::SubStr => Function::SubStr,
        SparqlFunction::Concat => Function::Concat,
        SparqlFunction::Regex => Function::Regex,
        SparqlFunction::Replace => Function::Replace,
        SparqlFunction::Abs => Function::Abs,
        SparqlFunction::Round => Function::Round,
        SparqlFunction::Ceil => Function::Ceil,
        SparqlFunction::Floor => Function::Floor,
        SparqlFunction::IsIri => Function::IsIri,
        SparqlFunction::IsBlank => Function::IsBlank,
        SparqlFunction::IsLiteral => Function::IsLiteral,
        SparqlFunction::IsNumeric => Function::IsNumeric,
        SparqlFunction::Custom(name) if name.as_str() == FULL_TEXT_FUNCTION => Function::FullText,
        SparqlFunction::Custom(name) => {
            return Err(PatternError::NotImplemented(format!("function {name}")))
        }
        _ => {
            return Err(PatternError::NotImplemented(format!(
                "function {function}"
            )))
        }
    })
}
