//! A typed SQL syntax tree and the code generator that turns it into SQLite statements.
//!
//! Values that stem from the query text or from runtime parameters never appear in the
//! statement text. They are written as `?` and recorded as [ParamSlot]s in the order in which
//! they appear, so a statement can be prepared once and bound many times. Resource ids and
//! integer tags are part of the dictionary and are written inline.

use rusqlite::types::Value;
use std::fmt::Write;

/// What is bound to a `?` of a compiled statement.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamSlot {
    /// A value that is known at compile time.
    Value(Value),
    /// The value of the runtime parameter with the given index.
    Argument(usize),
    /// The tag of the runtime parameter with the given index. `NULL` for resources.
    ArgumentTag(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    Or,
    And,
    Equal,
    NotEqual,
    Is,
    Like,
    Match,
    Less,
    LessOrEqual,
    Greater,
    GreaterOrEqual,
    Add,
    Subtract,
    Multiply,
    Divide,
    Concat,
}

impl BinaryOperator {
    fn symbol(self) -> &'static str {
        match self {
            BinaryOperator::Or => "OR",
            BinaryOperator::And => "AND",
            BinaryOperator::Equal => "=",
            BinaryOperator::NotEqual => "<>",
            BinaryOperator::Is => "IS",
            BinaryOperator::Like => "LIKE",
            BinaryOperator::Match => "MATCH",
            BinaryOperator::Less => "<",
            BinaryOperator::LessOrEqual => "<=",
            BinaryOperator::Greater => ">",
            BinaryOperator::GreaterOrEqual => ">=",
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Concat => "||",
        }
    }

    /// SQLite's operator precedence, doubled to leave room for `NOT`.
    fn precedence(self) -> u8 {
        match self {
            BinaryOperator::Or => 2,
            BinaryOperator::And => 4,
            BinaryOperator::Equal
            | BinaryOperator::NotEqual
            | BinaryOperator::Is
            | BinaryOperator::Like
            | BinaryOperator::Match => 6,
            BinaryOperator::Less
            | BinaryOperator::LessOrEqual
            | BinaryOperator::Greater
            | BinaryOperator::GreaterOrEqual => 8,
            BinaryOperator::Add | BinaryOperator::Subtract => 10,
            BinaryOperator::Multiply | BinaryOperator::Divide => 12,
            BinaryOperator::Concat => 14,
        }
    }

    fn is_associative(self) -> bool {
        matches!(
            self,
            BinaryOperator::Or
                | BinaryOperator::And
                | BinaryOperator::Add
                | BinaryOperator::Multiply
                | BinaryOperator::Concat
        )
    }
}

const NOT_PRECEDENCE: u8 = 5;
const POSTFIX_PRECEDENCE: u8 = 6;
const ATOM_PRECEDENCE: u8 = 100;

#[derive(Debug, Clone, PartialEq)]
pub enum SqlExpr {
    Column {
        table: String,
        column: String,
    },
    Param(ParamSlot),
    Null,
    Integer(i64),
    Real(f64),
    /// A string constant of the compiler itself. Values from queries are always parameters.
    Text(&'static str),
    /// The `*` of `count(*)`.
    Wildcard,
    Binary(BinaryOperator, Box<SqlExpr>, Box<SqlExpr>),
    Not(Box<SqlExpr>),
    Negate(Box<SqlExpr>),
    IsNull(Box<SqlExpr>),
    IsNotNull(Box<SqlExpr>),
    In {
        expression: Box<SqlExpr>,
        list: Vec<SqlExpr>,
        negated: bool,
    },
    InSubquery {
        expression: Box<SqlExpr>,
        subquery: Box<Select>,
    },
    Exists(Box<Select>),
    Function {
        name: &'static str,
        distinct: bool,
        arguments: Vec<SqlExpr>,
    },
    Case {
        operand: Option<Box<SqlExpr>>,
        branches: Vec<(SqlExpr, SqlExpr)>,
        otherwise: Option<Box<SqlExpr>>,
    },
    Cast(Box<SqlExpr>, &'static str),
    Subquery(Box<Select>),
}

impl SqlExpr {
    pub fn column(table: &str, column: &str) -> Self {
        SqlExpr::Column {
            table: table.to_owned(),
            column: column.to_owned(),
        }
    }

    pub fn value(value: Value) -> Self {
        SqlExpr::Param(ParamSlot::Value(value))
    }

    pub fn binary(operator: BinaryOperator, lhs: SqlExpr, rhs: SqlExpr) -> Self {
        SqlExpr::Binary(operator, Box::new(lhs), Box::new(rhs))
    }

    pub fn eq(lhs: SqlExpr, rhs: SqlExpr) -> Self {
        Self::binary(BinaryOperator::Equal, lhs, rhs)
    }

    /// `lhs IS rhs`. Comparisons with `NULL` are written as `IS NULL`.
    pub fn is(lhs: SqlExpr, rhs: SqlExpr) -> Self {
        match (lhs, rhs) {
            (SqlExpr::Null, other) | (other, SqlExpr::Null) => Self::is_null(other),
            (lhs, rhs) => Self::binary(BinaryOperator::Is, lhs, rhs),
        }
    }

    pub fn is_null(expression: SqlExpr) -> Self {
        match expression {
            SqlExpr::Null => SqlExpr::Integer(1),
            expression => SqlExpr::IsNull(Box::new(expression)),
        }
    }

    pub fn is_not_null(expression: SqlExpr) -> Self {
        match expression {
            SqlExpr::Null => SqlExpr::Integer(0),
            expression => SqlExpr::IsNotNull(Box::new(expression)),
        }
    }

    pub fn not(expression: SqlExpr) -> Self {
        SqlExpr::Not(Box::new(expression))
    }

    /// The conjunction of `conditions`. Constant true conditions are dropped and a constant
    /// false condition makes the whole conjunction false.
    pub fn all(conditions: impl IntoIterator<Item = SqlExpr>) -> Self {
        let mut result: Option<SqlExpr> = None;
        for condition in conditions {
            match condition {
                SqlExpr::Integer(1) => {}
                SqlExpr::Integer(0) => return SqlExpr::Integer(0),
                condition => {
                    result = Some(match result {
                        None => condition,
                        Some(lhs) => Self::binary(BinaryOperator::And, lhs, condition),
                    });
                }
            }
        }
        result.unwrap_or(SqlExpr::Integer(1))
    }

    /// The disjunction of `conditions`, the dual of [SqlExpr::all].
    pub fn any(conditions: impl IntoIterator<Item = SqlExpr>) -> Self {
        let mut result: Option<SqlExpr> = None;
        for condition in conditions {
            match condition {
                SqlExpr::Integer(0) => {}
                SqlExpr::Integer(1) => return SqlExpr::Integer(1),
                condition => {
                    result = Some(match result {
                        None => condition,
                        Some(lhs) => Self::binary(BinaryOperator::Or, lhs, condition),
                    });
                }
            }
        }
        result.unwrap_or(SqlExpr::Integer(0))
    }

    pub fn in_list(expression: SqlExpr, list: Vec<SqlExpr>) -> Self {
        match <[SqlExpr; 1]>::try_from(list) {
            Ok([single]) => Self::eq(expression, single),
            Err(list) => SqlExpr::In {
                expression: Box::new(expression),
                list,
                negated: false,
            },
        }
    }

    pub fn not_in_list(expression: SqlExpr, list: Vec<SqlExpr>) -> Self {
        if list.is_empty() {
            return SqlExpr::Integer(1);
        }
        SqlExpr::In {
            expression: Box::new(expression),
            list,
            negated: true,
        }
    }

    pub fn function(name: &'static str, arguments: Vec<SqlExpr>) -> Self {
        SqlExpr::Function {
            name,
            distinct: false,
            arguments,
        }
    }

    /// `CASE WHEN condition THEN then ELSE otherwise END`.
    pub fn when(condition: SqlExpr, then: SqlExpr, otherwise: SqlExpr) -> Self {
        SqlExpr::Case {
            operand: None,
            branches: vec![(condition, then)],
            otherwise: Some(Box::new(otherwise)),
        }
    }

    pub fn cast(expression: SqlExpr, target: &'static str) -> Self {
        SqlExpr::Cast(Box::new(expression), target)
    }

    /// Returns true if the expression is a constant that is not `NULL`.
    pub fn is_non_null_constant(&self) -> bool {
        match self {
            SqlExpr::Integer(_) | SqlExpr::Real(_) | SqlExpr::Text(_) => true,
            SqlExpr::Param(ParamSlot::Value(value)) => *value != Value::Null,
            _ => false,
        }
    }

    fn precedence(&self) -> u8 {
        match self {
            SqlExpr::Binary(operator, _, _) => operator.precedence(),
            SqlExpr::Not(_) => NOT_PRECEDENCE,
            SqlExpr::IsNull(_)
            | SqlExpr::IsNotNull(_)
            | SqlExpr::In { .. }
            | SqlExpr::InSubquery { .. } => POSTFIX_PRECEDENCE,
            SqlExpr::Integer(value) if *value < 0 => POSTFIX_PRECEDENCE,
            SqlExpr::Negate(_) => ATOM_PRECEDENCE - 1,
            _ => ATOM_PRECEDENCE,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectColumn {
    pub expression: SqlExpr,
    pub alias: Option<String>,
}

impl SelectColumn {
    pub fn new(expression: SqlExpr) -> Self {
        Self {
            expression,
            alias: None,
        }
    }

    pub fn aliased(expression: SqlExpr, alias: impl Into<String>) -> Self {
        Self {
            expression,
            alias: Some(alias.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum JoinKind {
    Inner,
    /// A `CROSS JOIN`, which SQLite never reorders.
    Cross,
    Left(Vec<SqlExpr>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FromItem {
    pub table: String,
    pub alias: String,
    pub join: JoinKind,
}

impl FromItem {
    pub fn inner(table: &str, alias: &str) -> Self {
        Self {
            table: table.to_owned(),
            alias: alias.to_owned(),
            join: JoinKind::Inner,
        }
    }

    pub fn cross(table: &str) -> Self {
        Self {
            table: table.to_owned(),
            alias: table.to_owned(),
            join: JoinKind::Cross,
        }
    }

    pub fn left(table: &str, alias: &str, on: Vec<SqlExpr>) -> Self {
        Self {
            table: table.to_owned(),
            alias: alias.to_owned(),
            join: JoinKind::Left(on),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderItem {
    pub expression: SqlExpr,
    pub descending: bool,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Select {
    pub distinct: bool,
    pub columns: Vec<SelectColumn>,
    pub from: Vec<FromItem>,
    pub filters: Vec<SqlExpr>,
    pub group_by: Vec<SqlExpr>,
    pub having: Vec<SqlExpr>,
    pub order_by: Vec<OrderItem>,
    pub limit: Option<usize>,
    pub offset: usize,
}

impl Select {
    pub fn new(columns: Vec<SqlExpr>) -> Self {
        Self {
            columns: columns.into_iter().map(SelectColumn::new).collect(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn from(mut self, table: &str) -> Self {
        self.from.push(FromItem::inner(table, table));
        self
    }

    #[must_use]
    pub fn filter(mut self, condition: SqlExpr) -> Self {
        self.filters.push(condition);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CteBody {
    Select(Select),
    /// `UNION` or, if `all` is set, `UNION ALL` of the selects. Recursive tables list their
    /// recursive selects last.
    Union { all: bool, selects: Vec<Select> },
    Values(Vec<Vec<SqlExpr>>),
}

/// A common table expression. All tables of a statement are hoisted to its top level.
#[derive(Debug, Clone, PartialEq)]
pub struct Cte {
    pub name: String,
    pub columns: Vec<String>,
    pub body: CteBody,
    pub recursive: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub ctes: Vec<Cte>,
    pub select: Select,
}

/// Writes a [Statement] and collects its parameter slots.
#[derive(Debug, Default)]
pub struct SqlWriter {
    sql: String,
    slots: Vec<ParamSlot>,
}

impl SqlWriter {
    pub fn write(statement: &Statement) -> (String, Vec<ParamSlot>) {
        let mut writer = SqlWriter::default();
        writer.statement(statement);
        (writer.sql, writer.slots)
    }

    fn statement(&mut self, statement: &Statement) {
        if !statement.ctes.is_empty() {
            let recursive = statement.ctes.iter().any(|cte| cte.recursive);
            self.sql
                .push_str(if recursive { "WITH RECURSIVE " } else { "WITH " });
            for (index, cte) in statement.ctes.iter().enumerate() {
                if index > 0 {
                    self.sql.push_str(",\n");
                }
                self.cte(cte);
            }
            self.sql.push('\n');
        }
        self.select(&statement.select, "\n");
    }

    fn cte(&mut self, cte: &Cte) {
        let _ = write!(self.sql, "{}({}) AS (", cte.name, cte.columns.join(", "));
        match &cte.body {
            CteBody::Select(select) => self.select(select, " "),
            CteBody::Union { all, selects } => {
                let separator = if *all { " UNION ALL " } else { " UNION " };
                for (index, select) in selects.iter().enumerate() {
                    if index > 0 {
                        self.sql.push_str(separator);
                    }
                    self.select(select, " ");
                }
            }
            CteBody::Values(rows) => {
                self.sql.push_str("VALUES ");
                for (index, row) in rows.iter().enumerate() {
                    if index > 0 {
                        self.sql.push_str(", ");
                    }
                    self.sql.push('(');
                    self.list(row);
                    self.sql.push(')');
                }
            }
        }
        self.sql.push(')');
    }

    fn select(&mut self, select: &Select, separator: &str) {
        self.sql.push_str("SELECT ");
        if select.distinct {
            self.sql.push_str("DISTINCT ");
        }
        if select.columns.is_empty() {
            self.sql.push('1');
        }
        for (index, column) in select.columns.iter().enumerate() {
            if index > 0 {
                self.sql.push_str(", ");
            }
            self.expression(&column.expression);
            if let Some(alias) = &column.alias {
                let _ = write!(self.sql, " AS {alias}");
            }
        }

        if !select.from.is_empty() {
            self.sql.push_str(separator);
            self.sql.push_str("FROM ");
            for (index, item) in select.from.iter().enumerate() {
                if index > 0 {
                    match &item.join {
                        JoinKind::Inner => self.sql.push_str(", "),
                        JoinKind::Cross => self.sql.push_str(" CROSS JOIN "),
                        JoinKind::Left(_) => self.sql.push_str(" LEFT JOIN "),
                    }
                }
                self.sql.push_str(&item.table);
                if item.alias != item.table {
                    let _ = write!(self.sql, " AS {}", item.alias);
                }
                if let JoinKind::Left(on) = &item.join {
                    self.sql.push_str(" ON ");
                    self.conjunction(on);
                }
            }
        }

        if !select.filters.is_empty() {
            self.sql.push_str(separator);
            self.sql.push_str("WHERE ");
            self.conjunction(&select.filters);
        }
        if !select.group_by.is_empty() {
            self.sql.push_str(separator);
            self.sql.push_str("GROUP BY ");
            self.list(&select.group_by);
        }
        if !select.having.is_empty() {
            self.sql.push_str(separator);
            self.sql.push_str("HAVING ");
            self.conjunction(&select.having);
        }
        if !select.order_by.is_empty() {
            self.sql.push_str(separator);
            self.sql.push_str("ORDER BY ");
            for (index, item) in select.order_by.iter().enumerate() {
                if index > 0 {
                    self.sql.push_str(", ");
                }
                self.expression(&item.expression);
                if item.descending {
                    self.sql.push_str(" DESC");
                }
            }
        }
        match (select.limit, select.offset) {
            (None, 0) => {}
            (limit, offset) => {
                self.sql.push_str(separator);
                match limit {
                    Some(limit) => {
                        let _ = write!(self.sql, "LIMIT {limit}");
                    }
                    None => self.sql.push_str("LIMIT -1"),
                }
                if offset > 0 {
                    let _ = write!(self.sql, " OFFSET {offset}");
                }
            }
        }
    }

    fn conjunction(&mut self, conditions: &[SqlExpr]) {
        if conditions.is_empty() {
            self.sql.push('1');
        }
        for (index, condition) in conditions.iter().enumerate() {
            if index > 0 {
                self.sql.push_str(" AND ");
            }
            self.operand(condition, BinaryOperator::And, index > 0);
        }
    }

    fn list(&mut self, expressions: &[SqlExpr]) {
        for (index, expression) in expressions.iter().enumerate() {
            if index > 0 {
                self.sql.push_str(", ");
            }
            self.expression(expression);
        }
    }

    fn expression(&mut self, expression: &SqlExpr) {
        match expression {
            SqlExpr::Column { table, column } => {
                let _ = write!(self.sql, "{table}.{column}");
            }
            SqlExpr::Param(slot) => {
                self.sql.push('?');
                self.slots.push(slot.clone());
            }
            SqlExpr::Null => self.sql.push_str("NULL"),
            SqlExpr::Integer(value) => {
                let _ = write!(self.sql, "{value}");
            }
            SqlExpr::Real(value) => {
                let _ = write!(self.sql, "{value:?}");
            }
            SqlExpr::Text(value) => {
                let _ = write!(self.sql, "'{}'", value.replace('\'', "''"));
            }
            SqlExpr::Wildcard => self.sql.push('*'),
            SqlExpr::Binary(operator, lhs, rhs) => {
                self.operand(lhs, *operator, false);
                let _ = write!(self.sql, " {} ", operator.symbol());
                self.operand(rhs, *operator, true);
            }
            SqlExpr::Not(inner) => {
                self.sql.push_str("NOT ");
                self.unary_operand(inner, NOT_PRECEDENCE);
            }
            SqlExpr::Negate(inner) => {
                self.sql.push('-');
                self.unary_operand(inner, ATOM_PRECEDENCE);
            }
            SqlExpr::IsNull(inner) => {
                self.unary_operand(inner, POSTFIX_PRECEDENCE + 1);
                self.sql.push_str(" IS NULL");
            }
            SqlExpr::IsNotNull(inner) => {
                self.unary_operand(inner, POSTFIX_PRECEDENCE + 1);
                self.sql.push_str(" IS NOT NULL");
            }
            SqlExpr::In {
                expression,
                list,
                negated,
            } => {
                self.unary_operand(expression, POSTFIX_PRECEDENCE + 1);
                self.sql
                    .push_str(if *negated { " NOT IN (" } else { " IN (" });
                self.list(list);
                self.sql.push(')');
            }
            SqlExpr::InSubquery {
                expression,
                subquery,
            } => {
                self.unary_operand(expression, POSTFIX_PRECEDENCE + 1);
                self.sql.push_str(" IN (");
                self.select(subquery, " ");
                self.sql.push(')');
            }
            SqlExpr::Exists(subquery) => {
                self.sql.push_str("EXISTS (");
                self.select(subquery, " ");
                self.sql.push(')');
            }
            SqlExpr::Function {
                name,
                distinct,
                arguments,
            } => {
                let _ = write!(self.sql, "{name}(");
                if *distinct {
                    self.sql.push_str("DISTINCT ");
                }
                self.list(arguments);
                self.sql.push(')');
            }
            SqlExpr::Case {
                operand,
                branches,
                otherwise,
            } => {
                self.sql.push_str("CASE");
                if let Some(operand) = operand {
                    self.sql.push(' ');
                    self.expression(operand);
                }
                for (condition, result) in branches {
                    self.sql.push_str(" WHEN ");
                    self.expression(condition);
                    self.sql.push_str(" THEN ");
                    self.expression(result);
                }
                if let Some(otherwise) = otherwise {
                    self.sql.push_str(" ELSE ");
                    self.expression(otherwise);
                }
                self.sql.push_str(" END");
            }
            SqlExpr::Cast(inner, target) => {
                self.sql.push_str("CAST(");
                self.expression(inner);
                let _ = write!(self.sql, " AS {target})");
            }
            SqlExpr::Subquery(subquery) => {
                self.sql.push('(');
                self.select(subquery, " ");
                self.sql.push(')');
            }
        }
    }

    fn operand(&mut self, operand: &SqlExpr, parent: BinaryOperator, right: bool) {
        let parenthesize = match operand.precedence().cmp(&parent.precedence()) {
            std::cmp::Ordering::Less => true,
            std::cmp::Ordering::Greater => false,
            std::cmp::Ordering::Equal => match operand {
                SqlExpr::Binary(operator, _, _)
                    if *operator == parent && parent.is_associative() =>
                {
                    false
                }
                _ => right || parent.precedence() >= POSTFIX_PRECEDENCE,
            },
        };
        self.parenthesized(operand, parenthesize);
    }

    fn unary_operand(&mut self, operand: &SqlExpr, minimum_precedence: u8) {
        self.parenthesized(operand, operand.precedence() < minimum_precedence);
    }

    fn parenthesized(&mut self, expression: &SqlExpr, parenthesize: bool) {
        if parenthesize {
            self.sql.push('(');
            self.expression(expression);
            self.sql.push(')');
        } else {
            self.expression(expression);
        }
    }
}
