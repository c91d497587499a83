//! Lowers a typed [Query] to a single SQL statement.
//!
//! Every group pattern becomes one `SELECT` over the relations of the store. Recursive property
//! paths, general unions, complex optional blocks, and `VALUES` tables become common table
//! expressions that are hoisted to the top of the statement and joined like any other table.
//! Each output variable is returned as two columns: its value and its tag.

mod bindings;
mod block;
mod closure;
mod expression;

use crate::sql::{
    Cte, CteBody, OrderItem, ParamSlot, Select, SelectColumn, SqlExpr, SqlWriter, Statement,
};
use crate::CompileError;
use bindings::Rank;
use block::Block;
use quadlite_logical::algebra::{GroupPattern, Modification, Query, QueryForm, Selection};
use quadlite_logical::{QueryOptions, VariableTypes};
use quadlite_model::Variable;
use tracing::debug;

pub use bindings::TypedExpr;

/// The shape of the rows of a [CompiledQuery].
#[derive(Debug, Clone, PartialEq)]
pub enum CompiledForm {
    /// One value and one tag column per variable of [CompiledQuery::columns].
    Select,
    /// A single row with a single boolean column.
    Ask,
    /// The distinct solutions of the pattern over the variables of the templates. The
    /// templates are applied to each row by the executor.
    Modify(Modification),
}

/// A query that was lowered to SQL. Compiled queries do not depend on a connection and can be
/// cached.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledQuery {
    pub sql: String,
    /// What to bind to the `?` placeholders of [CompiledQuery::sql], in order.
    pub slots: Vec<ParamSlot>,
    pub columns: Vec<Variable>,
    pub form: CompiledForm,
    pub parameter_count: usize,
}

/// Compiles `query`. The triples of the query must have been assigned a relation by type
/// inference and `types` must be the result of that inference.
pub fn compile(
    query: &Query,
    types: &VariableTypes,
    options: &QueryOptions,
) -> Result<CompiledQuery, CompileError> {
    let mut compiler = Compiler::new(options, types);
    let (select, columns, form) = match &query.form {
        QueryForm::Select(selection) => {
            let (select, columns) = compiler.select(&query.pattern, selection)?;
            (select, columns, CompiledForm::Select)
        }
        QueryForm::Ask => (compiler.ask(&query.pattern)?, Vec::new(), CompiledForm::Ask),
        QueryForm::Modify(modification) => {
            let columns = modification.variables();
            let select = compiler.modify(&query.pattern, &columns)?;
            (select, columns, CompiledForm::Modify(modification.clone()))
        }
    };

    let statement = compiler.finish(select);
    let (sql, slots) = SqlWriter::write(&statement);
    debug!(slots = slots.len(), "Compiled query:\n{sql}");
    Ok(CompiledQuery {
        sql,
        slots,
        columns,
        form,
        parameter_count: query.parameter_count,
    })
}

/// The name of a table with a single row. It defers `EXISTS` filters and anchors groups that
/// start with an optional block.
const SINGLE_ROW_TABLE: &str = "one";

struct Compiler<'a> {
    options: &'a QueryOptions,
    types: &'a VariableTypes,
    ctes: Vec<Cte>,
    next_alias: usize,
    next_table: usize,
    depth: usize,
    uses_single_row: bool,
}

impl<'a> Compiler<'a> {
    fn new(options: &'a QueryOptions, types: &'a VariableTypes) -> Self {
        Self {
            options,
            types,
            ctes: Vec::new(),
            next_alias: 0,
            next_table: 0,
            depth: 0,
            uses_single_row: false,
        }
    }

    fn alias(&mut self) -> String {
        let alias = format!("t{}", self.next_alias);
        self.next_alias += 1;
        alias
    }

    fn table_name(&mut self, prefix: &str) -> String {
        let name = format!("{prefix}{}", self.next_table);
        self.next_table += 1;
        name
    }

    fn select(
        &mut self,
        pattern: &GroupPattern,
        selection: &Selection,
    ) -> Result<(Select, Vec<Variable>), CompileError> {
        let block = self.compile_group(pattern, None)?;

        let grouped = selection.group_by.is_some() || !selection.aggregates.is_empty();
        let mut group_by = Vec::new();
        let mut having = Vec::new();
        let groups = if grouped {
            let mut groups = Block::default();
            for variable in selection.group_by.iter().flatten() {
                let binding = block.variable(variable)?;
                group_by.push(binding.value.clone());
                if !binding.is_resource() {
                    group_by.push(binding.tag.clone());
                }
                groups.bindings.add(variable, Rank::Fixed, binding);
            }
            for (variable, aggregate) in &selection.aggregates {
                let expression = self.aggregate(aggregate, &block)?;
                groups.bindings.add(variable, Rank::Fixed, expression);
            }
            for bind in &selection.group_binds {
                let expression = self.expression(&bind.expression, &groups)?;
                groups.bindings.add(&bind.variable, Rank::Fixed, expression);
            }
            for condition in &selection.having {
                having.push(self.expression(condition, &groups)?.value);
            }
            Some(groups)
        } else {
            None
        };

        let output = groups.as_ref().unwrap_or(&block);
        let columns = output_columns(output, &selection.projection)?;
        let order_by = selection
            .order_by
            .iter()
            .map(|key| {
                Ok(OrderItem {
                    expression: self.expression(&key.expression, output)?.value,
                    descending: key.descending,
                })
            })
            .collect::<Result<Vec<_>, CompileError>>()?;

        let mut select = block.into_select(columns);
        select.distinct = selection.distinct;
        select.group_by = group_by;
        select.having = having;
        select.order_by = order_by;
        select.limit = selection.limit;
        select.offset = selection.offset;
        Ok((select, selection.projection.clone()))
    }

    fn ask(&mut self, pattern: &GroupPattern) -> Result<Select, CompileError> {
        let block = self.compile_group(pattern, None)?;
        let exists = block.into_select(Vec::new());
        Ok(Select::new(vec![SqlExpr::Exists(Box::new(exists))]))
    }

    fn modify(
        &mut self,
        pattern: &GroupPattern,
        variables: &[Variable],
    ) -> Result<Select, CompileError> {
        let block = self.compile_group(pattern, None)?;
        let columns = output_columns(&block, variables)?;
        let mut select = block.into_select(columns);
        select.distinct = true;
        Ok(select)
    }

    fn finish(mut self, select: Select) -> Statement {
        if self.uses_single_row {
            self.ctes.insert(
                0,
                Cte {
                    name: SINGLE_ROW_TABLE.to_owned(),
                    columns: vec!["i".to_owned()],
                    body: CteBody::Select(Select::new(vec![SqlExpr::Integer(1)])),
                    recursive: false,
                },
            );
        }
        Statement {
            ctes: self.ctes,
            select,
        }
    }
}

fn output_columns(
    block: &Block,
    variables: &[Variable],
) -> Result<Vec<SelectColumn>, CompileError> {
    let mut columns = Vec::with_capacity(variables.len() * 2);
    for variable in variables {
        let binding = block.variable(variable)?;
        columns.push(SelectColumn::new(binding.value));
        columns.push(SelectColumn::new(binding.tag));
    }
    Ok(columns)
}
