use super::{blank_node_variable, is_hidden_variable, variable_term, PatternRewriter};
use crate::algebra::{
    Aggregate, AggregateFunction, Bind, Expression, GroupPattern, OptionalPattern, OrderKey,
    PatternTerm, PredicatePattern, Query, QueryForm, Selection, TriplePattern, ValuesTable,
};
use crate::union::classify_union;
use crate::PatternError;
use spargebra::algebra::{
    AggregateExpression, AggregateFunction as SparqlAggregateFunction, GraphPattern,
    OrderExpression, QueryDataset,
};
use spargebra::term::{
    GroundTerm, NamedNodePattern, TermPattern, TriplePattern as SparqlTriplePattern,
};
use spargebra::Query as SparqlQuery;

impl PatternRewriter<'_> {
    pub(super) fn rewrite_query(&self, query: &SparqlQuery) -> Result<Query, PatternError> {
        match query {
            SparqlQuery::Select {
                dataset, pattern, ..
            } => {
                let (pattern, selection) =
                    self.with_dataset(dataset.as_ref(), || self.rewrite_select(pattern))?;
                Ok(self.query(QueryForm::Select(selection), pattern))
            }
            SparqlQuery::Ask {
                dataset, pattern, ..
            } => {
                let pattern =
                    self.with_dataset(dataset.as_ref(), || self.rewrite_group(pattern))?;
                Ok(self.query(QueryForm::Ask, pattern))
            }
            SparqlQuery::Construct { .. } => Err(PatternError::NotImplemented(
                "CONSTRUCT queries".to_owned(),
            )),
            SparqlQuery::Describe { .. } => Err(PatternError::NotImplemented(
                "DESCRIBE queries".to_owned(),
            )),
        }
    }

    pub(super) fn query(&self, form: QueryForm, pattern: GroupPattern) -> Query {
        Query {
            form,
            pattern,
            parameter_count: self.parameter_count,
        }
    }

    /// Evaluates `f` against the default graph of `dataset`.
    ///
    /// Only datasets that consist of a single default graph (`FROM <iri>`, `USING <iri>` or
    /// `WITH <iri>`) are supported.
    pub(super) fn with_dataset<T>(
        &self,
        dataset: Option<&QueryDataset>,
        f: impl FnOnce() -> Result<T, PatternError>,
    ) -> Result<T, PatternError> {
        let Some(dataset) = dataset else {
            return f();
        };
        match (dataset.default.as_slice(), &dataset.named) {
            ([graph], None) => {
                let context = self.context(graph.as_str())?;
                self.with_context(context, f)
            }
            _ => Err(PatternError::NotImplemented(
                "datasets other than a single default graph".to_owned(),
            )),
        }
    }

    /// Peels the solution modifiers off the pattern of a `SELECT` query.
    fn rewrite_select(
        &self,
        pattern: &GraphPattern,
    ) -> Result<(GroupPattern, Selection), PatternError> {
        let mut selection = Selection::default();
        let mut current = pattern;

        if let GraphPattern::Slice {
            inner,
            start,
            length,
        } = current
        {
            selection.offset = *start;
            selection.limit = *length;
            current = inner;
        }
        match current {
            GraphPattern::Distinct { inner } => {
                selection.distinct = true;
                current = inner;
            }
            GraphPattern::Reduced { inner } => current = inner,
            _ => {}
        }
        let mut projection = None;
        if let GraphPattern::Project { inner, variables } = current {
            projection = Some(variables.clone());
            current = inner;
        }
        if let GraphPattern::OrderBy { inner, expression } = current {
            selection.order_by = expression
                .iter()
                .map(|key| self.rewrite_order_key(key))
                .collect::<Result<_, _>>()?;
            current = inner;
        }

        let mut binds = Vec::new();
        let mut filters = Vec::new();
        loop {
            match current {
                GraphPattern::Extend {
                    inner,
                    variable,
                    expression,
                } => {
                    binds.push(Bind {
                        variable: variable.clone(),
                        expression: self.rewrite_expression(expression)?,
                    });
                    current = inner;
                }
                GraphPattern::Filter { expr, inner } => {
                    let mut conjuncts = Vec::new();
                    split_conjunction(self.rewrite_expression(expr)?, &mut conjuncts);
                    filters.extend(conjuncts.into_iter().rev());
                    current = inner;
                }
                _ => break,
            }
        }
        binds.reverse();
        filters.reverse();

        let pattern = if let GraphPattern::Group {
            inner,
            variables,
            aggregates,
        } = current
        {
            selection.group_by = Some(variables.clone());
            selection.aggregates = aggregates
                .iter()
                .map(|(variable, aggregate)| {
                    Ok((variable.clone(), self.rewrite_aggregate(aggregate)?))
                })
                .collect::<Result<_, PatternError>>()?;
            selection.group_binds = binds;
            selection.having = filters;
            self.rewrite_group(inner)?
        } else {
            let mut pattern = self.rewrite_group(current)?;
            pattern.binds.extend(binds);
            pattern.filters.extend(filters);
            pattern
        };

        let mut projection = match projection {
            Some(projection) => projection,
            None => pattern.bound_variables(),
        };
        projection.retain(|variable| !is_hidden_variable(variable));
        selection.projection = projection;
        Ok((pattern, selection))
    }

    fn rewrite_order_key(&self, key: &OrderExpression) -> Result<OrderKey, PatternError> {
        Ok(match key {
            OrderExpression::Asc(expression) => OrderKey {
                expression: self.rewrite_expression(expression)?,
                descending: false,
            },
            OrderExpression::Desc(expression) => OrderKey {
                expression: self.rewrite_expression(expression)?,
                descending: true,
            },
        })
    }

    fn rewrite_aggregate(&self, aggregate: &AggregateExpression) -> Result<Aggregate, PatternError> {
        match aggregate {
            AggregateExpression::CountSolutions { distinct } => Ok(Aggregate {
                function: AggregateFunction::Count,
                distinct: *distinct,
                argument: None,
            }),
            AggregateExpression::FunctionCall {
                name,
                expr,
                distinct,
            } => {
                let function = match name {
                    SparqlAggregateFunction::Count => AggregateFunction::Count,
                    SparqlAggregateFunction::Sum => AggregateFunction::Sum,
                    SparqlAggregateFunction::Avg => AggregateFunction::Avg,
                    SparqlAggregateFunction::Min => AggregateFunction::Min,
                    SparqlAggregateFunction::Max => AggregateFunction::Max,
                    SparqlAggregateFunction::GroupConcat { separator } => {
                        AggregateFunction::GroupConcat {
                            separator: separator.clone(),
                        }
                    }
                    SparqlAggregateFunction::Sample => AggregateFunction::Sample,
                    SparqlAggregateFunction::Custom(name) => {
                        return Err(PatternError::NotImplemented(format!(
                            "custom aggregate {name}"
                        )))
                    }
                };
                Ok(Aggregate {
                    function,
                    distinct: *distinct,
                    argument: Some(self.rewrite_expression(expr)?),
                })
            }
        }
    }

    /// Rewrites a graph pattern into a group. Solution modifiers are only supported at the top
    /// level of a query.
    pub(super) fn rewrite_group(&self, pattern: &GraphPattern) -> Result<GroupPattern, PatternError> {
        match pattern {
            GraphPattern::Bgp { patterns } => Ok(GroupPattern {
                triples: patterns
                    .iter()
                    .map(|triple| self.rewrite_triple(triple))
                    .collect::<Result<_, _>>()?,
                ..GroupPattern::default()
            }),
            GraphPattern::Path {
                subject,
                path,
                object,
            } => self.rewrite_path(subject, path, object),
            GraphPattern::Join { left, right } => {
                let mut group = self.rewrite_group(left)?;
                group.merge(self.rewrite_group(right)?);
                Ok(group)
            }
            GraphPattern::LeftJoin {
                left,
                right,
                expression,
            } => {
                let mut group = self.rewrite_group(left)?;
                let pattern = self.rewrite_group(right)?;
                let condition = expression
                    .as_ref()
                    .map(|expression| self.rewrite_expression(expression))
                    .transpose()?;
                group.optionals.push(OptionalPattern { pattern, condition });
                Ok(group)
            }
            GraphPattern::Filter { expr, inner } => {
                let mut group = self.rewrite_group(inner)?;
                split_conjunction(self.rewrite_expression(expr)?, &mut group.filters);
                Ok(group)
            }
            GraphPattern::Union { .. } => {
                let mut alternatives = Vec::new();
                self.collect_alternatives(pattern, &mut alternatives)?;
                Ok(GroupPattern {
                    unions: vec![classify_union(alternatives)],
                    ..GroupPattern::default()
                })
            }
            GraphPattern::Graph { name, inner } => match name {
                NamedNodePattern::NamedNode(node) => {
                    let context = self.context(node.as_str())?;
                    self.with_context(context, || self.rewrite_group(inner))
                }
                NamedNodePattern::Variable(_) => Err(PatternError::NotImplemented(
                    "GRAPH blocks with a variable".to_owned(),
                )),
            },
            GraphPattern::Extend {
                inner,
                variable,
                expression,
            } => {
                let mut group = self.rewrite_group(inner)?;
                group.binds.push(Bind {
                    variable: variable.clone(),
                    expression: self.rewrite_expression(expression)?,
                });
                Ok(group)
            }
            GraphPattern::Values {
                variables,
                bindings,
            } => Ok(GroupPattern {
                values: vec![self.rewrite_values(variables, bindings)?],
                ..GroupPattern::default()
            }),
            GraphPattern::Minus { .. } => Err(PatternError::NotImplemented("MINUS".to_owned())),
            GraphPattern::Service { .. } => {
                Err(PatternError::NotImplemented("SERVICE".to_owned()))
            }
            GraphPattern::OrderBy { .. }
            | GraphPattern::Project { .. }
            | GraphPattern::Distinct { .. }
            | GraphPattern::Reduced { .. }
            | GraphPattern::Slice { .. }
            | GraphPattern::Group { .. } => {
                Err(PatternError::NotImplemented("sub-selects".to_owned()))
            }
        }
    }

    /// Flattens nested unions into their alternatives.
    fn collect_alternatives(
        &self,
        pattern: &GraphPattern,
        alternatives: &mut Vec<GroupPattern>,
    ) -> Result<(), PatternError> {
        if let GraphPattern::Union { left, right } = pattern {
            self.collect_alternatives(left, alternatives)?;
            self.collect_alternatives(right, alternatives)
        } else {
            alternatives.push(self.rewrite_group(pattern)?);
            Ok(())
        }
    }

    fn rewrite_values(
        &self,
        variables: &[spargebra::term::Variable],
        bindings: &[Vec<Option<GroundTerm>>],
    ) -> Result<ValuesTable, PatternError> {
        if bindings.is_empty() {
            return Err(PatternError::EmptyValues);
        }
        let rows = bindings
            .iter()
            .map(|row| {
                row.iter()
                    .map(|value| value.as_ref().map(|term| self.ground_term(term)).transpose())
                    .collect::<Result<Vec<_>, _>>()
            })
            .collect::<Result<_, _>>()?;
        Ok(ValuesTable {
            variables: variables.to_vec(),
            rows,
        })
    }

    fn rewrite_triple(&self, triple: &SparqlTriplePattern) -> Result<TriplePattern, PatternError> {
        let predicate = match &triple.predicate {
            NamedNodePattern::NamedNode(node) => PatternTerm::Resource(self.resource(node.as_str())?),
            NamedNodePattern::Variable(variable) => variable_term(variable),
        };
        Ok(self.triple(
            self.term(&triple.subject)?,
            PredicatePattern::Term(predicate),
            self.term(&triple.object)?,
        ))
    }

    /// Creates a triple in the active context.
    pub(super) fn triple(
        &self,
        subject: PatternTerm,
        predicate: PredicatePattern,
        object: PatternTerm,
    ) -> TriplePattern {
        TriplePattern {
            context: self.active_context(),
            ..TriplePattern::new(subject, predicate, object)
        }
    }

    pub(super) fn term(&self, term: &TermPattern) -> Result<PatternTerm, PatternError> {
        Ok(match term {
            TermPattern::NamedNode(node) => PatternTerm::Resource(self.resource(node.as_str())?),
            TermPattern::BlankNode(node) => PatternTerm::Variable(blank_node_variable(node)),
            TermPattern::Literal(literal) => PatternTerm::Literal(self.literal(literal)?),
            TermPattern::Variable(variable) => variable_term(variable),
        })
    }

    fn ground_term(&self, term: &GroundTerm) -> Result<PatternTerm, PatternError> {
        Ok(match term {
            GroundTerm::NamedNode(node) => PatternTerm::Resource(self.resource(node.as_str())?),
            GroundTerm::Literal(literal) => PatternTerm::Literal(self.literal(literal)?),
        })
    }
}

/// Splits `a && b` into separate filters.
fn split_conjunction(expression: Expression, filters: &mut Vec<Expression>) {
    if let Expression::And(lhs, rhs) = expression {
        split_conjunction(*lhs, filters);
        split_conjunction(*rhs, filters);
    } else {
        filters.push(expression);
    }
}
