use super::bindings::{numeric_tag, same_term, TypedExpr};
use super::block::{constant, Block};
use super::Compiler;
use crate::sql::{BinaryOperator, Select, SqlExpr};
use crate::CompileError;
use quadlite_logical::algebra::{
    Aggregate, AggregateFunction, ArithmeticOperator, Comparison, Expression, Function,
    PatternTerm,
};
use quadlite_logical::{expression_kind, VariableKind};
use quadlite_model::vocab::{self, rdf, xsd, BUILTIN_RESOURCES};
use quadlite_model::LiteralValue;
use quadlite_storage::full_text_table;

impl Compiler<'_> {
    /// Compiles `expression` over the bindings of `block`.
    pub(super) fn expression(
        &mut self,
        expression: &Expression,
        block: &Block,
    ) -> Result<TypedExpr, CompileError> {
        Ok(match expression {
            Expression::Term(PatternTerm::Variable(variable)) => block.variable(variable)?,
            Expression::Term(term) => constant(term)?,
            Expression::Or(lhs, rhs) => TypedExpr::boolean(SqlExpr::any([
                self.expression(lhs, block)?.value,
                self.expression(rhs, block)?.value,
            ])),
            Expression::And(lhs, rhs) => TypedExpr::boolean(SqlExpr::all([
                self.expression(lhs, block)?.value,
                self.expression(rhs, block)?.value,
            ])),
            Expression::Not(inner) => {
                TypedExpr::boolean(SqlExpr::not(self.expression(inner, block)?.value))
            }
            Expression::Compare(comparison, lhs, rhs) => {
                let lhs = self.expression(lhs, block)?;
                let rhs = self.expression(rhs, block)?;
                let operator = match comparison {
                    Comparison::Equal => return Ok(TypedExpr::boolean(equal(&lhs, &rhs))),
                    Comparison::Less => BinaryOperator::Less,
                    Comparison::LessOrEqual => BinaryOperator::LessOrEqual,
                    Comparison::Greater => BinaryOperator::Greater,
                    Comparison::GreaterOrEqual => BinaryOperator::GreaterOrEqual,
                };
                TypedExpr::boolean(SqlExpr::binary(operator, lhs.value, rhs.value))
            }
            Expression::SameTerm(lhs, rhs) => {
                let lhs = self.expression(lhs, block)?;
                let rhs = self.expression(rhs, block)?;
                TypedExpr::boolean(same_term(&lhs, &rhs))
            }
            Expression::In(needle, list) => {
                let needle = self.expression(needle, block)?;
                let mut alternatives = Vec::with_capacity(list.len());
                for candidate in list {
                    let candidate = self.expression(candidate, block)?;
                    alternatives.push(equal(&needle, &candidate));
                }
                TypedExpr::boolean(SqlExpr::any(alternatives))
            }
            Expression::Arithmetic(operator, lhs, rhs) => {
                let lhs = self.expression(lhs, block)?.value;
                let rhs = self.expression(rhs, block)?.value;
                let value = match operator {
                    ArithmeticOperator::Add => SqlExpr::binary(BinaryOperator::Add, lhs, rhs),
                    ArithmeticOperator::Subtract => {
                        SqlExpr::binary(BinaryOperator::Subtract, lhs, rhs)
                    }
                    ArithmeticOperator::Multiply => {
                        SqlExpr::binary(BinaryOperator::Multiply, lhs, rhs)
                    }
                    // Integer division truncates in SQLite.
                    ArithmeticOperator::Divide => SqlExpr::binary(
                        BinaryOperator::Divide,
                        SqlExpr::binary(BinaryOperator::Multiply, lhs, SqlExpr::Real(1.0)),
                        rhs,
                    ),
                };
                TypedExpr::number(value)
            }
            Expression::UnaryMinus(inner) => TypedExpr::number(SqlExpr::Negate(Box::new(
                self.expression(inner, block)?.value,
            ))),
            Expression::Bound(variable) => TypedExpr::boolean(
                block
                    .bindings
                    .get(variable)
                    .map_or(SqlExpr::Integer(0), |binding| {
                        SqlExpr::is_not_null(binding.expression.value)
                    }),
            ),
            Expression::If(condition, then, otherwise) => {
                let condition = self.expression(condition, block)?.value;
                let then = self.expression(then, block)?;
                let otherwise = self.expression(otherwise, block)?;
                TypedExpr {
                    value: SqlExpr::when(condition.clone(), then.value, otherwise.value),
                    tag: SqlExpr::when(condition, then.tag, otherwise.tag),
                    numeric: then.numeric && otherwise.numeric,
                }
            }
            Expression::Coalesce(arguments) => {
                let arguments = self.expressions(arguments, block)?;
                let tag = SqlExpr::Case {
                    operand: None,
                    branches: arguments
                        .iter()
                        .map(|argument| {
                            (
                                SqlExpr::is_not_null(argument.value.clone()),
                                argument.tag.clone(),
                            )
                        })
                        .collect(),
                    otherwise: None,
                };
                let numeric = arguments.iter().all(|argument| argument.numeric);
                let value = SqlExpr::function(
                    "coalesce",
                    arguments.into_iter().map(|argument| argument.value).collect(),
                );
                TypedExpr {
                    value,
                    tag,
                    numeric,
                }
            }
            Expression::Function(function, arguments) => {
                self.function(*function, arguments, block)?
            }
            Expression::Exists(group) => TypedExpr::boolean(self.exists(group, block)?),
        })
    }

    fn expressions(
        &mut self,
        expressions: &[Expression],
        block: &Block,
    ) -> Result<Vec<TypedExpr>, CompileError> {
        expressions
            .iter()
            .map(|expression| self.expression(expression, block))
            .collect()
    }

    fn function(
        &mut self,
        function: Function,
        arguments: &[Expression],
        block: &Block,
    ) -> Result<TypedExpr, CompileError> {
        if function == Function::FullText {
            return self.full_text(arguments, block);
        }

        let compiled = self.expressions(arguments, block)?;
        let argument = |index: usize| {
            compiled.get(index).cloned().ok_or_else(|| {
                CompileError::InternalError(format!(
                    "{function:?} expects at least {} arguments",
                    index + 1
                ))
            })
        };
        let text = |index: usize| argument(index).map(|argument| argument.value);

        Ok(match function {
            Function::Str => TypedExpr::plain(lexical_form(&argument(0)?)),
            Function::Lang => {
                let tag = argument(0)?.tag;
                TypedExpr::plain(SqlExpr::when(
                    is_language_tag(tag.clone()),
                    SqlExpr::function("substr", vec![tag, SqlExpr::Integer(2)]),
                    SqlExpr::Text(""),
                ))
            }
            Function::LangMatches => {
                let language = SqlExpr::function("lower", vec![text(0)?]);
                let range = SqlExpr::function("lower", vec![text(1)?]);
                let matches = SqlExpr::any([
                    SqlExpr::eq(language.clone(), range.clone()),
                    SqlExpr::binary(
                        BinaryOperator::Like,
                        language.clone(),
                        SqlExpr::binary(BinaryOperator::Concat, range.clone(), SqlExpr::Text("-%")),
                    ),
                ]);
                TypedExpr::boolean(SqlExpr::when(
                    SqlExpr::eq(range, SqlExpr::Text("*")),
                    SqlExpr::binary(BinaryOperator::NotEqual, language, SqlExpr::Text("")),
                    matches,
                ))
            }
            Function::Datatype => {
                let tag = argument(0)?.tag;
                TypedExpr::resource(SqlExpr::Case {
                    operand: None,
                    branches: vec![
                        (SqlExpr::is_null(tag.clone()), SqlExpr::Null),
                        (is_language_tag(tag.clone()), SqlExpr::Integer(rdf::LANG_STRING.as_i64())),
                        (
                            SqlExpr::eq(tag.clone(), SqlExpr::Integer(0)),
                            SqlExpr::Integer(xsd::STRING.as_i64()),
                        ),
                    ],
                    otherwise: Some(Box::new(tag)),
                })
            }
            Function::Iri => {
                let argument = argument(0)?;
                let lookup = SqlExpr::Subquery(Box::new(
                    Select::new(vec![SqlExpr::column("resources", "id")])
                        .from("resources")
                        .filter(SqlExpr::eq(
                            SqlExpr::column("resources", "iri"),
                            argument.value.clone(),
                        )),
                ));
                if argument.is_resource() {
                    argument
                } else {
                    TypedExpr::resource(SqlExpr::when(
                        SqlExpr::is_null(argument.tag),
                        argument.value,
                        lookup,
                    ))
                }
            }
            Function::StrLen => TypedExpr::integer(SqlExpr::function("length", vec![text(0)?])),
            Function::UCase => keep_tag(&argument(0)?, "upper", Vec::new()),
            Function::LCase => keep_tag(&argument(0)?, "lower", Vec::new()),
            Function::Contains => TypedExpr::boolean(SqlExpr::binary(
                BinaryOperator::Greater,
                SqlExpr::function("instr", vec![text(0)?, text(1)?]),
                SqlExpr::Integer(0),
            )),
            Function::StrStarts => {
                let prefix = text(1)?;
                TypedExpr::boolean(SqlExpr::eq(
                    SqlExpr::function(
                        "substr",
                        vec![
                            text(0)?,
                            SqlExpr::Integer(1),
                            SqlExpr::function("length", vec![prefix.clone()]),
                        ],
                    ),
                    prefix,
                ))
            }
            Function::StrEnds => {
                let suffix = text(1)?;
                let length = SqlExpr::function("length", vec![suffix.clone()]);
                TypedExpr::boolean(SqlExpr::any([
                    SqlExpr::eq(length.clone(), SqlExpr::Integer(0)),
                    SqlExpr::eq(
                        SqlExpr::function(
                            "substr",
                            vec![text(0)?, SqlExpr::Negate(Box::new(length))],
                        ),
                        suffix,
                    ),
                ]))
            }
            Function::StrBefore | Function::StrAfter => {
                let haystack = argument(0)?;
                let needle = text(1)?;
                let position = SqlExpr::function("instr", vec![haystack.value.clone(), needle.clone()]);
                let part = if function == Function::StrBefore {
                    vec![
                        haystack.value.clone(),
                        SqlExpr::Integer(1),
                        SqlExpr::binary(
                            BinaryOperator::Subtract,
                            position.clone(),
                            SqlExpr::Integer(1),
                        ),
                    ]
                } else {
                    vec![
                        haystack.value.clone(),
                        SqlExpr::binary(
                            BinaryOperator::Add,
                            position.clone(),
                            SqlExpr::function("length", vec![needle]),
                        ),
                    ]
                };
                TypedExpr::new(
                    SqlExpr::when(
                        SqlExpr::binary(BinaryOperator::Greater, position, SqlExpr::Integer(0)),
                        SqlExpr::function("substr", part),
                        SqlExpr::Text(""),
                    ),
                    haystack.tag,
                )
            }
            Function::SubStr => {
                let rest = compiled
                    .iter()
                    .skip(1)
                    .map(|argument| argument.value.clone())
                    .collect();
                keep_tag(&argument(0)?, "substr", rest)
            }
            Function::Concat => {
                let value = compiled
                    .iter()
                    .map(|argument| argument.value.clone())
                    .reduce(|lhs, rhs| SqlExpr::binary(BinaryOperator::Concat, lhs, rhs))
                    .unwrap_or(SqlExpr::Text(""));
                TypedExpr::plain(value)
            }
            Function::Regex => {
                let pattern = with_flags(text(1)?, arguments.get(2))?;
                TypedExpr::boolean(SqlExpr::function("regexp", vec![pattern, text(0)?]))
            }
            Function::Replace => {
                let pattern = with_flags(text(1)?, arguments.get(3))?;
                keep_tag(&argument(0)?, "regexp_replace", vec![pattern, text(2)?])
            }
            Function::Abs => TypedExpr::number(SqlExpr::function("abs", vec![text(0)?])),
            Function::Round => TypedExpr::number(SqlExpr::function("round", vec![text(0)?])),
            Function::Ceil | Function::Floor => {
                let value = text(0)?;
                let truncated = SqlExpr::cast(value.clone(), "INTEGER");
                let is_integral = SqlExpr::eq(value.clone(), truncated.clone());
                let (outside, step) = if function == Function::Ceil {
                    (
                        SqlExpr::binary(BinaryOperator::Greater, value.clone(), SqlExpr::Integer(0)),
                        BinaryOperator::Add,
                    )
                } else {
                    (
                        SqlExpr::binary(BinaryOperator::Less, value.clone(), SqlExpr::Integer(0)),
                        BinaryOperator::Subtract,
                    )
                };
                TypedExpr::integer(SqlExpr::Case {
                    operand: None,
                    branches: vec![
                        (SqlExpr::is_null(value), SqlExpr::Null),
                        (is_integral, truncated.clone()),
                        (
                            outside,
                            SqlExpr::binary(step, truncated.clone(), SqlExpr::Integer(1)),
                        ),
                    ],
                    otherwise: Some(Box::new(truncated)),
                })
            }
            Function::IsIri | Function::IsBlank => {
                let argument = argument(0)?;
                let operator = if function == Function::IsIri {
                    BinaryOperator::Greater
                } else {
                    BinaryOperator::Less
                };
                TypedExpr::boolean(SqlExpr::all([
                    SqlExpr::is_null(argument.tag),
                    SqlExpr::binary(operator, argument.value, SqlExpr::Integer(0)),
                ]))
            }
            Function::IsLiteral => TypedExpr::boolean(SqlExpr::is_not_null(argument(0)?.tag)),
            Function::IsNumeric => {
                let tag = argument(0)?.tag;
                let numeric_datatypes = BUILTIN_RESOURCES
                    .iter()
                    .map(|(id, _)| *id)
                    .filter(|id| vocab::is_integer_datatype(*id) || vocab::is_float_datatype(*id))
                    .map(|id| SqlExpr::Integer(id.as_i64()))
                    .collect();
                TypedExpr::boolean(match tag {
                    SqlExpr::Null => SqlExpr::Integer(0),
                    tag => SqlExpr::all([
                        SqlExpr::eq(
                            SqlExpr::function("typeof", vec![tag.clone()]),
                            SqlExpr::Text("integer"),
                        ),
                        SqlExpr::in_list(tag, numeric_datatypes),
                    ]),
                })
            }
            Function::FullText => {
                return Err(CompileError::InternalError(
                    "full-text matches are compiled separately".to_owned(),
                ))
            }
        })
    }

    /// `rowid IN (SELECT rowid FROM fts_p WHERE fts_p.value MATCH query)` over the literal
    /// relation that binds the first argument.
    fn full_text(
        &mut self,
        arguments: &[Expression],
        block: &Block,
    ) -> Result<TypedExpr, CompileError> {
        let [Expression::Term(PatternTerm::Variable(variable)), query] = arguments else {
            return Err(CompileError::InvalidFullText(
                "expected a variable and a query".to_owned(),
            ));
        };
        let source = block.full_text_source(variable).cloned().ok_or_else(|| {
            CompileError::InvalidFullText(format!(
                "{variable} is not the object of a literal triple with a fixed predicate"
            ))
        })?;
        let query = self.expression(query, block)?.value;

        let table = full_text_table(source.predicate);
        let matches = Select::new(vec![SqlExpr::column(&table, "rowid")])
            .from(&table)
            .filter(SqlExpr::binary(
                BinaryOperator::Match,
                SqlExpr::column(&table, "value"),
                query,
            ));
        Ok(TypedExpr::boolean(SqlExpr::InSubquery {
            expression: Box::new(SqlExpr::column(&source.alias, "rowid")),
            subquery: Box::new(matches),
        }))
    }

    /// Compiles an aggregate over the solutions of `block`.
    pub(super) fn aggregate(
        &mut self,
        aggregate: &Aggregate,
        block: &Block,
    ) -> Result<TypedExpr, CompileError> {
        let argument = aggregate
            .argument
            .as_ref()
            .map(|argument| self.expression(argument, block))
            .transpose()?;
        let call = |name: &'static str, arguments: Vec<SqlExpr>| SqlExpr::Function {
            name,
            distinct: aggregate.distinct,
            arguments,
        };

        let Some(argument) = argument else {
            return match aggregate.function {
                AggregateFunction::Count if aggregate.distinct => Err(
                    CompileError::NotImplemented("COUNT(DISTINCT *)".to_owned()),
                ),
                AggregateFunction::Count => Ok(TypedExpr::integer(SqlExpr::function(
                    "count",
                    vec![SqlExpr::Wildcard],
                ))),
                _ => Err(CompileError::InternalError(
                    "only COUNT may omit its argument".to_owned(),
                )),
            };
        };

        Ok(match &aggregate.function {
            AggregateFunction::Count => TypedExpr::integer(call("count", vec![argument.value])),
            AggregateFunction::Sum => TypedExpr::number(call("sum", vec![argument.value])),
            AggregateFunction::Avg => TypedExpr::number(call("avg", vec![argument.value])),
            AggregateFunction::Min | AggregateFunction::Max | AggregateFunction::Sample => {
                let name = if aggregate.function == AggregateFunction::Max {
                    "max"
                } else {
                    "min"
                };
                let value = call(name, vec![argument.value]);
                let is_reference = aggregate.argument.as_ref().is_some_and(|argument| {
                    expression_kind(argument, self.types) == VariableKind::Reference
                });
                // The tag of the selected row is not available, so literals are typed by their
                // storage class.
                let tag = if is_reference || argument.tag.is_non_null_constant() {
                    argument.tag
                } else {
                    numeric_tag(value.clone())
                };
                TypedExpr::new(value, tag)
            }
            AggregateFunction::GroupConcat { separator } => {
                let separator = separator.as_deref().unwrap_or(" ");
                if aggregate.distinct && separator != "," {
                    return Err(CompileError::NotImplemented(
                        "GROUP_CONCAT(DISTINCT ...) with a separator".to_owned(),
                    ));
                }
                let mut arguments = vec![argument.value];
                if !aggregate.distinct {
                    arguments.push(SqlExpr::value(rusqlite::types::Value::Text(
                        separator.to_owned(),
                    )));
                }
                TypedExpr::plain(call("group_concat", arguments))
            }
        })
    }
}

/// Value equality. Numbers compare by value, everything else must be the same term.
fn equal(lhs: &TypedExpr, rhs: &TypedExpr) -> SqlExpr {
    if lhs.numeric || rhs.numeric {
        SqlExpr::eq(lhs.value.clone(), rhs.value.clone())
    } else {
        same_term(lhs, rhs)
    }
}

fn is_language_tag(tag: SqlExpr) -> SqlExpr {
    SqlExpr::eq(SqlExpr::function("typeof", vec![tag]), SqlExpr::Text("text"))
}

/// The lexical form of a term. Resources are looked up in the dictionary.
fn lexical_form(argument: &TypedExpr) -> SqlExpr {
    let iri = SqlExpr::Subquery(Box::new(
        Select::new(vec![SqlExpr::column("resources", "iri")])
            .from("resources")
            .filter(SqlExpr::eq(
                SqlExpr::column("resources", "id"),
                argument.value.clone(),
            )),
    ));
    match &argument.tag {
        SqlExpr::Null => iri,
        tag => SqlExpr::when(SqlExpr::is_null(tag.clone()), iri, argument.value.clone()),
    }
}

/// Applies a string function that keeps the tag of its first argument.
fn keep_tag(argument: &TypedExpr, name: &'static str, rest: Vec<SqlExpr>) -> TypedExpr {
    let mut arguments = vec![argument.value.clone()];
    arguments.extend(rest);
    TypedExpr::new(SqlExpr::function(name, arguments), argument.tag.clone())
}

/// Prefixes `pattern` with the inline flags of a regular expression.
fn with_flags(pattern: SqlExpr, flags: Option<&Expression>) -> Result<SqlExpr, CompileError> {
    let Some(flags) = flags else {
        return Ok(pattern);
    };
    let flags = match flags {
        Expression::Term(PatternTerm::Literal(literal)) => match literal.value() {
            LiteralValue::Text(flags) => flags.clone(),
            _ => return Err(CompileError::NotImplemented("non-string regex flags".to_owned())),
        },
        _ => {
            return Err(CompileError::NotImplemented(
                "regex flags that are not constant".to_owned(),
            ))
        }
    };
    if flags.is_empty() {
        return Ok(pattern);
    }
    if !flags.chars().all(|flag| matches!(flag, 'i' | 'm' | 's' | 'x')) {
        return Err(CompileError::NotImplemented(format!("regex flags \"{flags}\"")));
    }
    Ok(SqlExpr::binary(
        BinaryOperator::Concat,
        SqlExpr::value(rusqlite::types::Value::Text(format!("(?{flags})"))),
        pattern,
    ))
}
