use super::bindings::{compatible, same_term, Binding, Bindings, Rank, TypedExpr};
use super::{Compiler, SINGLE_ROW_TABLE};
use crate::sql::{Cte, CteBody, FromItem, ParamSlot, Select, SelectColumn, SqlExpr};
use crate::CompileError;
use quadlite_logical::algebra::{
    Bind, Expression, GroupPattern, OptionalPattern, PatternTerm, PredicatePattern, SimpleUnion,
    TableKind, TriplePattern, TriplePosition, UnionPattern, ValuesTable,
};
use quadlite_model::{Literal, ResourceId, Variable};
use itertools::Itertools;
use quadlite_storage::encoding::{literal_value_to_sql, tag_to_sql};
use rustc_hash::FxHashSet;
use rusqlite::types::Value;

/// A literal relation whose value column can be matched by a full-text index.
#[derive(Debug, Clone, PartialEq)]
pub(super) struct FullTextSource {
    pub alias: String,
    pub predicate: ResourceId,
}

/// The tables, conditions, and bindings of one `SELECT`.
#[derive(Debug, Clone, Default)]
pub(super) struct Block {
    pub from: Vec<FromItem>,
    /// Conditions on constants of the triples.
    pub conditions: Vec<SqlExpr>,
    pub filters: Vec<SqlExpr>,
    pub bindings: Bindings,
    pub full_text: Vec<(Variable, FullTextSource)>,
    defers_exists: bool,
}

impl Block {
    /// A block of a correlated subquery that sees the bindings of `outer`.
    fn correlated(outer: &Block) -> Self {
        Self {
            bindings: outer.bindings.correlated(),
            full_text: outer.full_text.clone(),
            ..Self::default()
        }
    }

    /// Returns the expression of `variable`.
    pub fn variable(&self, variable: &Variable) -> Result<TypedExpr, CompileError> {
        self.bindings
            .get(variable)
            .map(|binding| binding.expression)
            .ok_or_else(|| CompileError::UnboundVariable(variable.to_string()))
    }

    pub fn full_text_source(&self, variable: &Variable) -> Option<&FullTextSource> {
        self.full_text
            .iter()
            .find(|(candidate, _)| candidate == variable)
            .map(|(_, source)| source)
    }

    pub fn into_select(self, columns: Vec<SelectColumn>) -> Select {
        let join_conditions = self.bindings.join_conditions();
        let mut filters = Vec::new();
        for condition in self
            .conditions
            .into_iter()
            .chain(join_conditions)
            .chain(self.filters)
        {
            match condition {
                SqlExpr::Integer(1) => {}
                condition => filters.push(condition),
            }
        }
        Select {
            columns,
            from: self.from,
            filters,
            ..Select::default()
        }
    }
}

/// The table reference, conditions, and variable columns of a triple.
struct LoweredTriple {
    table: &'static str,
    alias: String,
    conditions: Vec<SqlExpr>,
    variables: Vec<(Variable, TypedExpr)>,
    full_text: Option<(Variable, FullTextSource)>,
}

impl LoweredTriple {
    fn position(&mut self, column: TypedExpr, term: &PatternTerm) -> Result<(), CompileError> {
        match term {
            PatternTerm::Variable(variable) => self.variables.push((variable.clone(), column)),
            term => self.conditions.push(same_term(&column, &constant(term)?)),
        }
        Ok(())
    }
}

/// The expression of a term that is not a variable.
pub(super) fn constant(term: &PatternTerm) -> Result<TypedExpr, CompileError> {
    Ok(match term {
        PatternTerm::Resource(id) => TypedExpr::resource(SqlExpr::Integer(id.as_i64())),
        PatternTerm::Literal(literal) => literal_expression(literal),
        PatternTerm::Parameter(index) => TypedExpr::new(
            SqlExpr::Param(ParamSlot::Argument(*index)),
            SqlExpr::Param(ParamSlot::ArgumentTag(*index)),
        ),
        PatternTerm::Variable(variable) => {
            return Err(CompileError::InternalError(format!(
                "{variable} is not a constant"
            )))
        }
    })
}

fn literal_expression(literal: &Literal) -> TypedExpr {
    let value = literal_value_to_sql(literal.value());
    let numeric = matches!(value, Value::Integer(_) | Value::Real(_));
    let tag = match tag_to_sql(literal.tag()) {
        Value::Integer(tag) => SqlExpr::Integer(tag),
        tag => SqlExpr::value(tag),
    };
    TypedExpr {
        value: SqlExpr::value(value),
        tag,
        numeric,
    }
}

/// The condition that `column` equals one of `terms`.
pub(super) fn one_of<'t>(
    column: &TypedExpr,
    terms: impl IntoIterator<Item = &'t PatternTerm>,
) -> Result<SqlExpr, CompileError> {
    let terms = terms.into_iter().collect::<Vec<_>>();
    let resources = terms
        .iter()
        .map(|term| match term {
            PatternTerm::Resource(id) => Some(SqlExpr::Integer(id.as_i64())),
            _ => None,
        })
        .collect::<Option<Vec<_>>>();
    if let Some(resources) = resources {
        return Ok(SqlExpr::all([
            SqlExpr::in_list(column.value.clone(), resources),
            SqlExpr::is_null(column.tag.clone()),
        ]));
    }

    let alternatives = terms
        .into_iter()
        .map(|term| Ok(same_term(column, &constant(term)?)))
        .collect::<Result<Vec<_>, CompileError>>()?;
    Ok(SqlExpr::any(alternatives))
}

/// The names of the value and tag columns of the `index`-th variable of a table expression.
fn value_column(index: usize) -> String {
    format!("value{index}")
}

fn tag_column(index: usize) -> String {
    format!("tag{index}")
}

impl Compiler<'_> {
    /// Compiles `group` into a block. A block with an `outer` block is a correlated subquery.
    pub(super) fn compile_group(
        &mut self,
        group: &GroupPattern,
        outer: Option<&Block>,
    ) -> Result<Block, CompileError> {
        self.depth += 1;
        let result = self.compile_group_blocks(group, outer);
        self.depth -= 1;
        result
    }

    fn compile_group_blocks(
        &mut self,
        group: &GroupPattern,
        outer: Option<&Block>,
    ) -> Result<Block, CompileError> {
        let mut block = outer.map(Block::correlated).unwrap_or_default();
        block.defers_exists = self.depth == 1 && self.options.deprioritize_exists;

        for triple in &group.triples {
            self.add_triple(&mut block, triple)?;
        }
        for closure in &group.closures {
            self.add_closure(&mut block, closure, group)?;
        }
        for values in &group.values {
            self.add_values(&mut block, values)?;
        }
        for union in &group.unions {
            if let UnionPattern::Simple(union) = union {
                self.add_simple_union(&mut block, union)?;
            }
        }
        for union in &group.unions {
            if let UnionPattern::General(alternatives) = union {
                self.add_general_union(&mut block, alternatives)?;
            }
        }
        for optional in &group.optionals {
            self.add_optional(&mut block, optional)?;
        }
        for bind in &group.binds {
            self.add_bind(&mut block, bind)?;
        }
        for filter in &group.filters {
            self.add_filter(&mut block, filter)?;
        }
        Ok(block)
    }

    fn lower_triple(
        &mut self,
        triple: &TriplePattern,
        varying: Option<(TriplePosition, &[PatternTerm])>,
    ) -> Result<LoweredTriple, CompileError> {
        let alias = self.alias();
        let (table, object) = match triple.table {
            TableKind::References => (
                "refs",
                TypedExpr::resource(SqlExpr::column(&alias, "object")),
            ),
            TableKind::Literals => (
                "literals",
                TypedExpr::new(
                    SqlExpr::column(&alias, "value"),
                    SqlExpr::column(&alias, "tag"),
                ),
            ),
            TableKind::Quads => (
                "quads",
                TypedExpr::new(
                    SqlExpr::column(&alias, "object"),
                    SqlExpr::column(&alias, "tag"),
                ),
            ),
        };
        let subject = TypedExpr::resource(SqlExpr::column(&alias, "subject"));
        let predicate = TypedExpr::resource(SqlExpr::column(&alias, "predicate"));

        let mut lowered = LoweredTriple {
            table,
            alias,
            conditions: Vec::new(),
            variables: Vec::new(),
            full_text: None,
        };
        if let Some(context) = triple.context {
            lowered.conditions.push(SqlExpr::eq(
                SqlExpr::column(&lowered.alias, "context"),
                SqlExpr::Integer(context.as_i64()),
            ));
        }

        let varying_at = |position: TriplePosition| {
            varying
                .filter(|(varying, _)| *varying == position)
                .map(|(_, terms)| terms)
        };

        match varying_at(TriplePosition::Subject) {
            Some(terms) => lowered.conditions.push(one_of(&subject, terms)?),
            None => lowered.position(subject, &triple.subject)?,
        }

        match (&triple.predicate, varying_at(TriplePosition::Predicate)) {
            (_, Some(terms)) => lowered.conditions.push(one_of(&predicate, terms)?),
            (PredicatePattern::Term(term), None) => lowered.position(predicate, term)?,
            (PredicatePattern::OneOf(predicates), None) => {
                lowered.conditions.push(SqlExpr::in_list(
                    predicate.value,
                    predicates.iter().map(|id| SqlExpr::Integer(id.as_i64())).collect(),
                ));
            }
            (PredicatePattern::NoneOf(predicates), None) => {
                lowered.conditions.push(SqlExpr::not_in_list(
                    predicate.value,
                    predicates.iter().map(|id| SqlExpr::Integer(id.as_i64())).collect(),
                ));
            }
        }

        match varying_at(TriplePosition::Object) {
            Some(terms) => lowered.conditions.push(one_of(&object, terms)?),
            None if triple.table == TableKind::Literals
                && matches!(triple.object, PatternTerm::Resource(_)) =>
            {
                lowered.conditions.push(SqlExpr::Integer(0));
            }
            None => lowered.position(object, &triple.object)?,
        }

        if let (
            TableKind::Literals,
            PredicatePattern::Term(PatternTerm::Resource(predicate)),
            PatternTerm::Variable(variable),
        ) = (&triple.table, &triple.predicate, &triple.object)
        {
            lowered.full_text = Some((
                variable.clone(),
                FullTextSource {
                    alias: lowered.alias.clone(),
                    predicate: *predicate,
                },
            ));
        }
        Ok(lowered)
    }

    fn add_lowered_triple(&mut self, block: &mut Block, lowered: LoweredTriple) {
        block
            .from
            .push(FromItem::inner(lowered.table, &lowered.alias));
        block.conditions.extend(lowered.conditions);
        for (variable, expression) in lowered.variables {
            block.bindings.add(&variable, Rank::Join, expression);
        }
        block.full_text.extend(lowered.full_text);
    }

    fn add_triple(&mut self, block: &mut Block, triple: &TriplePattern) -> Result<(), CompileError> {
        let lowered = self.lower_triple(triple, None)?;
        self.add_lowered_triple(block, lowered);
        Ok(())
    }

    /// Evaluates a simple union as one join whose varying position matches any alternative.
    fn add_simple_union(
        &mut self,
        block: &mut Block,
        union: &SimpleUnion,
    ) -> Result<(), CompileError> {
        for (index, triple) in union.triples.iter().enumerate() {
            let varying = (index == union.triple)
                .then_some((union.position, union.alternatives.as_slice()));
            let lowered = self.lower_triple(triple, varying)?;
            self.add_lowered_triple(block, lowered);
        }
        Ok(())
    }

    /// Evaluates every alternative on its own and combines the rows with `UNION ALL`.
    fn add_general_union(
        &mut self,
        block: &mut Block,
        alternatives: &[GroupPattern],
    ) -> Result<(), CompileError> {
        let variables = alternatives
            .iter()
            .flat_map(GroupPattern::bound_variables)
            .unique()
            .collect::<Vec<_>>();

        let compiled = alternatives
            .iter()
            .map(|alternative| self.compile_group(alternative, None))
            .collect::<Result<Vec<_>, _>>()?;
        let bindings = compiled
            .iter()
            .map(|alternative| {
                variables
                    .iter()
                    .map(|variable| alternative.bindings.get(variable))
                    .collect::<Vec<_>>()
            })
            .collect::<Vec<_>>();

        let name = self.table_name("union");
        let mut columns = Vec::new();
        let mut exposed = Vec::new();
        let mut with_tag = Vec::new();
        for (index, variable) in variables.iter().enumerate() {
            let in_alternatives = bindings.iter().map(|row| row[index].as_ref());
            let has_tag = in_alternatives
                .clone()
                .flatten()
                .any(|binding| !binding.expression.is_resource());
            let nullable = in_alternatives
                .clone()
                .any(|binding| binding.map_or(true, |binding| binding.nullable));
            if in_alternatives.flatten().next().is_none() {
                with_tag.push(false);
                continue;
            }

            columns.push(value_column(index));
            let tag = if has_tag {
                columns.push(tag_column(index));
                SqlExpr::column(&name, &tag_column(index))
            } else {
                SqlExpr::Null
            };
            with_tag.push(has_tag);
            let rank = if nullable { Rank::Nullable } else { Rank::Join };
            let value = SqlExpr::column(&name, &value_column(index));
            exposed.push((variable.clone(), rank, TypedExpr::new(value, tag)));
        }

        let exposed_variables = exposed
            .iter()
            .map(|(variable, _, _)| variable)
            .collect::<FxHashSet<_>>();
        let selects = compiled
            .into_iter()
            .zip(bindings)
            .map(|(alternative, bindings)| {
                let mut select_columns = Vec::new();
                for (index, binding) in bindings.into_iter().enumerate() {
                    if !exposed_variables.contains(&variables[index]) {
                        continue;
                    }
                    let (value, tag) = binding.map_or((SqlExpr::Null, SqlExpr::Null), |binding| {
                        (binding.expression.value, binding.expression.tag)
                    });
                    select_columns.push(SelectColumn::new(value));
                    if with_tag[index] {
                        select_columns.push(SelectColumn::new(tag));
                    }
                }
                alternative.into_select(select_columns)
            })
            .collect();

        self.ctes.push(Cte {
            name: name.clone(),
            columns,
            body: CteBody::Union { all: true, selects },
            recursive: false,
        });
        block.from.push(FromItem::inner(&name, &name));
        for (variable, rank, expression) in exposed {
            block.bindings.add(&variable, rank, expression);
        }
        Ok(())
    }

    /// Left-joins an optional block. A single triple is joined directly, anything else is
    /// compiled into a table expression first.
    fn add_optional(
        &mut self,
        block: &mut Block,
        optional: &OptionalPattern,
    ) -> Result<(), CompileError> {
        let pattern = &optional.pattern;
        let is_single_triple = pattern.triples.len() == 1
            && pattern.closures.is_empty()
            && pattern.unions.is_empty()
            && pattern.optionals.is_empty()
            && pattern.binds.is_empty()
            && pattern.values.is_empty()
            && pattern.filters.is_empty();

        let (table, alias, mut on, inner) = if is_single_triple {
            let lowered = self.lower_triple(&pattern.triples[0], None)?;
            block.full_text.extend(lowered.full_text);
            let inner = lowered
                .variables
                .into_iter()
                .map(|(variable, expression)| (variable, Binding::new(expression, false)))
                .collect::<Vec<_>>();
            (lowered.table.to_owned(), lowered.alias, lowered.conditions, inner)
        } else {
            let compiled = self.compile_group(pattern, None)?;
            let name = self.table_name("optional");
            let mut columns = Vec::new();
            let mut select_columns = Vec::new();
            let mut inner = Vec::new();
            for (index, variable) in pattern.bound_variables().into_iter().enumerate() {
                let Some(binding) = compiled.bindings.get(&variable) else {
                    continue;
                };
                let is_resource = binding.expression.is_resource();
                columns.push(value_column(index));
                select_columns.push(SelectColumn::new(binding.expression.value));
                let tag = if is_resource {
                    SqlExpr::Null
                } else {
                    columns.push(tag_column(index));
                    select_columns.push(SelectColumn::new(binding.expression.tag));
                    SqlExpr::column(&name, &tag_column(index))
                };
                let value = SqlExpr::column(&name, &value_column(index));
                inner.push((
                    variable,
                    Binding::new(TypedExpr::new(value, tag), binding.nullable),
                ));
            }
            self.ctes.push(Cte {
                name: name.clone(),
                columns,
                body: CteBody::Select(compiled.into_select(select_columns)),
                recursive: false,
            });
            (name.clone(), name, Vec::new(), inner)
        };

        let mut introduced: Vec<(Variable, TypedExpr)> = Vec::new();
        for (variable, binding) in inner {
            if let Some(outer) = block.bindings.get(&variable) {
                on.push(compatible(&outer, &binding));
                if outer.nullable {
                    block
                        .bindings
                        .add(&variable, Rank::Optional, binding.expression);
                }
            } else if let Some((_, previous)) =
                introduced.iter().find(|(other, _)| *other == variable)
            {
                on.push(same_term(previous, &binding.expression));
            } else {
                introduced.push((variable, binding.expression));
            }
        }
        for (variable, expression) in introduced {
            block.bindings.add(&variable, Rank::Optional, expression);
        }
        if let Some(condition) = &optional.condition {
            on.push(self.expression(condition, block)?.value);
        }

        on.retain(|condition| *condition != SqlExpr::Integer(1));
        if block.from.is_empty() {
            block.from.push(FromItem::cross(SINGLE_ROW_TABLE));
            self.uses_single_row = true;
        }
        block.from.push(FromItem::left(&table, &alias, on));
        Ok(())
    }

    fn add_values(&mut self, block: &mut Block, values: &ValuesTable) -> Result<(), CompileError> {
        if let [variable] = values.variables.as_slice() {
            let cells = values
                .rows
                .iter()
                .map(|row| row.first().and_then(Option::as_ref))
                .collect::<Option<Vec<_>>>();
            if let (Some(binding), Some(cells)) = (block.bindings.get(variable), cells) {
                let condition = one_of(&binding.expression, cells)?;
                block.filters.push(condition);
                return Ok(());
            }
        }

        let name = self.table_name("values");
        let mut rows = Vec::with_capacity(values.rows.len());
        for row in &values.rows {
            let mut sql_row = Vec::with_capacity(row.len() * 2);
            for cell in row {
                match cell {
                    Some(term) => {
                        let expression = constant(term)?;
                        sql_row.push(expression.value);
                        sql_row.push(expression.tag);
                    }
                    None => {
                        sql_row.push(SqlExpr::Null);
                        sql_row.push(SqlExpr::Null);
                    }
                }
            }
            rows.push(sql_row);
        }

        let mut columns = Vec::new();
        for (index, variable) in values.variables.iter().enumerate() {
            columns.push(value_column(index));
            columns.push(tag_column(index));
            let cells = values.rows.iter().map(|row| row.get(index).cloned().flatten());
            let has_undef = cells.clone().any(|cell| cell.is_none());
            let only_resources = cells
                .flatten()
                .all(|term| matches!(term, PatternTerm::Resource(_)));
            let tag = if only_resources {
                SqlExpr::Null
            } else {
                SqlExpr::column(&name, &tag_column(index))
            };
            let rank = if has_undef { Rank::Nullable } else { Rank::Fixed };
            let value = SqlExpr::column(&name, &value_column(index));
            block
                .bindings
                .add(variable, rank, TypedExpr::new(value, tag));
        }

        self.ctes.push(Cte {
            name: name.clone(),
            columns,
            body: CteBody::Values(rows),
            recursive: false,
        });
        block.from.push(FromItem::inner(&name, &name));
        Ok(())
    }

    fn add_bind(&mut self, block: &mut Block, bind: &Bind) -> Result<(), CompileError> {
        let expression = self.expression(&bind.expression, block)?;
        block.bindings.add(&bind.variable, Rank::Fixed, expression);
        Ok(())
    }

    fn add_filter(&mut self, block: &mut Block, filter: &Expression) -> Result<(), CompileError> {
        let condition = self.expression(filter, block)?.value;
        if block.defers_exists && filter.is_exists() {
            if !block
                .from
                .iter()
                .any(|item| item.alias == SINGLE_ROW_TABLE)
            {
                block.from.push(FromItem::cross(SINGLE_ROW_TABLE));
            }
            self.uses_single_row = true;
            block.filters.push(SqlExpr::eq(
                SqlExpr::column(SINGLE_ROW_TABLE, "i"),
                condition,
            ));
        } else {
            block.filters.push(condition);
        }
        Ok(())
    }

    /// Compiles an `EXISTS` block as a correlated subquery of `outer`.
    pub(super) fn exists(
        &mut self,
        group: &GroupPattern,
        outer: &Block,
    ) -> Result<SqlExpr, CompileError> {
        let block = self.compile_group(group, Some(outer))?;
        Ok(SqlExpr::Exists(Box::new(block.into_select(Vec::new()))))
    }
}
