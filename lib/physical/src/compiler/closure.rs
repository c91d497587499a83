//! Lowering of repeated property path steps.
//!
//! A closure becomes a recursive table expression over the reference relation. If one endpoint
//! is fixed, the table holds the nodes reachable from it. Otherwise it holds `(origin, node)`
//! pairs. `UNION` deduplicates the rows of each step, so cycles terminate.

use super::bindings::{same_term, Rank, TypedExpr};
use super::block::{constant, Block};
use super::Compiler;
use crate::sql::{BinaryOperator, Cte, CteBody, FromItem, Select, SelectColumn, SqlExpr};
use crate::CompileError;
use quadlite_logical::algebra::{
    ClosurePattern, GroupPattern, PatternTerm, PredicatePattern, Repetition, TableKind,
};
use quadlite_model::{ContextId, ResourceId};

const REFS: &str = "refs";

/// The columns a closure walks from and to.
#[derive(Debug, Clone, Copy)]
enum Direction {
    Forward,
    Backward,
}

impl Direction {
    fn columns(self) -> (&'static str, &'static str) {
        match self {
            Direction::Forward => ("subject", "object"),
            Direction::Backward => ("object", "subject"),
        }
    }
}

/// The conditions every followed edge satisfies.
struct Edges<'a> {
    predicates: &'a [ResourceId],
    context: Option<ContextId>,
}

impl Edges<'_> {
    fn conditions(&self) -> Vec<SqlExpr> {
        let mut conditions = vec![SqlExpr::in_list(
            SqlExpr::column(REFS, "predicate"),
            self.predicates
                .iter()
                .map(|predicate| SqlExpr::Integer(predicate.as_i64()))
                .collect(),
        )];
        if let Some(context) = self.context {
            conditions.push(SqlExpr::eq(
                SqlExpr::column(REFS, "context"),
                SqlExpr::Integer(context.as_i64()),
            ));
        }
        conditions
    }

    fn select(&self, columns: Vec<SqlExpr>) -> Select {
        let mut select = Select::new(columns).from(REFS);
        select.filters = self.conditions();
        select
    }
}

impl Compiler<'_> {
    pub(super) fn add_closure(
        &mut self,
        block: &mut Block,
        closure: &ClosurePattern,
        group: &GroupPattern,
    ) -> Result<(), CompileError> {
        if [&closure.subject, &closure.object]
            .iter()
            .any(|endpoint| matches!(endpoint, PatternTerm::Literal(_)))
        {
            return Err(CompileError::NotImplemented(
                "property paths with literal endpoints".to_owned(),
            ));
        }

        let edges = Edges {
            predicates: &closure.predicates,
            context: closure.context,
        };
        let is_fixed = |term: &PatternTerm| {
            matches!(term, PatternTerm::Resource(_) | PatternTerm::Parameter(_))
        };
        if is_fixed(&closure.subject) {
            self.anchored_closure(
                block,
                &edges,
                closure.repetition,
                (&closure.subject, &closure.object),
                Direction::Forward,
            )
        } else if is_fixed(&closure.object) {
            self.anchored_closure(
                block,
                &edges,
                closure.repetition,
                (&closure.object, &closure.subject),
                Direction::Backward,
            )
        } else {
            self.open_closure(block, &edges, closure, group)
        }
    }

    /// A closure with a fixed start node. The table holds every node reachable from the start.
    fn anchored_closure(
        &mut self,
        block: &mut Block,
        edges: &Edges<'_>,
        repetition: Repetition,
        (start, end): (&PatternTerm, &PatternTerm),
        direction: Direction,
    ) -> Result<(), CompileError> {
        let (from, to) = direction.columns();
        let start = constant(start)?;
        // A parameter that is a literal never starts a path.
        let start_condition = (!start.is_resource()).then(|| SqlExpr::is_null(start.tag.clone()));
        let name = self.table_name("closure");
        let walk = self.walk_name(repetition);
        let source = walk.as_deref().unwrap_or(&name).to_owned();

        let mut zero_hops = Select::new(vec![start.value.clone()]);
        zero_hops.filters.extend(start_condition.clone());
        let mut first_hop = edges
            .select(vec![SqlExpr::column(REFS, to)])
            .filter(SqlExpr::eq(SqlExpr::column(REFS, from), start.value.clone()));
        first_hop.filters.extend(start_condition);
        let step = edges
            .select(vec![SqlExpr::column(REFS, to)])
            .from(&source)
            .filter(SqlExpr::eq(
                SqlExpr::column(REFS, from),
                SqlExpr::column(&source, "node"),
            ));

        let (seeds, step) = match repetition {
            Repetition::ZeroOrOne => (vec![(zero_hops, 0), (first_hop, 1)], None),
            Repetition::ZeroOrMore => (vec![(zero_hops, 0)], Some(step)),
            Repetition::OneOrMore => (vec![(first_hop, 1)], Some(step)),
        };
        self.push_closure(&name, walk, vec!["node"], seeds, step);

        block.from.push(FromItem::inner(&name, &name));
        let node = TypedExpr::resource(SqlExpr::column(&name, "node"));
        match end {
            PatternTerm::Variable(variable) => block.bindings.add(variable, Rank::Closure, node),
            end => block.conditions.push(same_term(&node, &constant(end)?)),
        }
        Ok(())
    }

    /// A closure between two variables. The table holds `(origin, node)` pairs.
    ///
    /// The origins of a zero-length path are the nodes that the path's predicates mention, or
    /// the subjects of a triple of the group that pins the start variable to a class or value.
    fn open_closure(
        &mut self,
        block: &mut Block,
        edges: &Edges<'_>,
        closure: &ClosurePattern,
        group: &GroupPattern,
    ) -> Result<(), CompileError> {
        let name = self.table_name("closure");
        let walk = self.walk_name(closure.repetition);
        let source = walk.as_deref().unwrap_or(&name).to_owned();
        let origins = pinned_origins(closure, group);

        let zero_hops = match &origins {
            Some(origins) => {
                let subject = SqlExpr::column(REFS, "subject");
                let mut select = Select::new(vec![subject.clone(), subject]).from(REFS);
                select.filters = origins.clone();
                vec![(select, 0)]
            }
            None => ["subject", "object"]
                .into_iter()
                .map(|column| {
                    let column = SqlExpr::column(REFS, column);
                    (edges.select(vec![column.clone(), column]), 0)
                })
                .collect(),
        };
        let mut first_hop = edges.select(vec![
            SqlExpr::column(REFS, "subject"),
            SqlExpr::column(REFS, "object"),
        ]);
        if let Some(origins) = origins {
            let mut pinned = Select::new(vec![SqlExpr::column(REFS, "subject")]).from(REFS);
            pinned.filters = origins;
            first_hop.filters.push(SqlExpr::InSubquery {
                expression: Box::new(SqlExpr::column(REFS, "subject")),
                subquery: Box::new(pinned),
            });
        }
        let step = edges
            .select(vec![
                SqlExpr::column(&source, "origin"),
                SqlExpr::column(REFS, "object"),
            ])
            .from(&source)
            .filter(SqlExpr::eq(
                SqlExpr::column(REFS, "subject"),
                SqlExpr::column(&source, "node"),
            ));

        let (seeds, step) = match closure.repetition {
            Repetition::ZeroOrOne => {
                let mut seeds = zero_hops;
                seeds.push((first_hop, 1));
                (seeds, None)
            }
            Repetition::ZeroOrMore => (zero_hops, Some(step)),
            Repetition::OneOrMore => (vec![(first_hop, 1)], Some(step)),
        };
        self.push_closure(&name, walk, vec!["origin", "node"], seeds, step);

        block.from.push(FromItem::inner(&name, &name));
        for (endpoint, column) in [(&closure.subject, "origin"), (&closure.object, "node")] {
            let expression = TypedExpr::resource(SqlExpr::column(&name, column));
            match endpoint {
                PatternTerm::Variable(variable) => {
                    block.bindings.add(variable, Rank::Closure, expression);
                }
                endpoint => block.conditions.push(same_term(&expression, &constant(endpoint)?)),
            }
        }
        Ok(())
    }

    /// The name of the depth-tracking table of a recursive closure, if the depth is capped.
    fn walk_name(&mut self, repetition: Repetition) -> Option<String> {
        if repetition.is_recursive() && self.options.max_path_depth.is_some() {
            Some(self.table_name("walk"))
        } else {
            None
        }
    }

    /// Registers the table expression of a closure.
    ///
    /// With a `walk` table, the recursion runs over `walk` with an extra depth column and the
    /// closure table holds its distinct nodes. Seeds are paired with the number of edges they
    /// follow.
    fn push_closure(
        &mut self,
        name: &str,
        walk: Option<String>,
        columns: Vec<&str>,
        seeds: Vec<(Select, i64)>,
        step: Option<Select>,
    ) {
        let columns = columns.into_iter().map(str::to_owned).collect::<Vec<_>>();
        let (Some(walk), Some(max_depth)) = (walk, self.options.max_path_depth) else {
            let recursive = step.is_some();
            self.ctes.push(Cte {
                name: name.to_owned(),
                columns,
                body: CteBody::Union {
                    all: false,
                    selects: seeds.into_iter().map(|(seed, _)| seed).chain(step).collect(),
                },
                recursive,
            });
            return;
        };

        let mut selects = Vec::new();
        for (mut seed, hops) in seeds {
            seed.columns.push(SelectColumn::new(SqlExpr::Integer(hops)));
            selects.push(seed);
        }
        if let Some(mut step) = step {
            let depth = SqlExpr::column(&walk, "depth");
            step.columns.push(SelectColumn::new(SqlExpr::binary(
                BinaryOperator::Add,
                depth.clone(),
                SqlExpr::Integer(1),
            )));
            step.filters.push(SqlExpr::binary(
                BinaryOperator::Less,
                depth,
                SqlExpr::Integer(i64::from(max_depth)),
            ));
            selects.push(step);
        }

        let mut walk_columns = columns.clone();
        walk_columns.push("depth".to_owned());
        self.ctes.push(Cte {
            name: walk.clone(),
            columns: walk_columns,
            body: CteBody::Union {
                all: false,
                selects,
            },
            recursive: true,
        });

        let mut distinct = Select::new(
            columns
                .iter()
                .map(|column| SqlExpr::column(&walk, column))
                .collect(),
        )
        .from(&walk);
        distinct.distinct = true;
        self.ctes.push(Cte {
            name: name.to_owned(),
            columns,
            body: CteBody::Select(distinct),
            recursive: false,
        });
    }
}

/// Returns the conditions of a triple of `group` that restrict the start variable of `closure`
/// to the subjects of a fixed predicate and object.
fn pinned_origins(closure: &ClosurePattern, group: &GroupPattern) -> Option<Vec<SqlExpr>> {
    let start = closure.subject.as_variable()?;
    group.triples.iter().find_map(|triple| {
        let (
            TableKind::References,
            Some(subject),
            PredicatePattern::Term(PatternTerm::Resource(predicate)),
            PatternTerm::Resource(object),
        ) = (
            triple.table,
            triple.subject.as_variable(),
            &triple.predicate,
            &triple.object,
        )
        else {
            return None;
        };
        if subject != start {
            return None;
        }
        let mut conditions = vec![
            SqlExpr::eq(
                SqlExpr::column(REFS, "predicate"),
                SqlExpr::Integer(predicate.as_i64()),
            ),
            SqlExpr::eq(
                SqlExpr::column(REFS, "object"),
                SqlExpr::Integer(object.as_i64()),
            ),
        ];
        if let Some(context) = triple.context {
            conditions.push(SqlExpr::eq(
                SqlExpr::column(REFS, "context"),
                SqlExpr::Integer(context.as_i64()),
            ));
        }
        Some(conditions)
    })
}
