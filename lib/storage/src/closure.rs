use crate::{QuadStore, StorageError};
use quadlite_model::{ContextId, ResourceId};
use rusqlite::params;
use tracing::warn;

/// The direction in which a closure follows its predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// From subject to object, e.g., from a class to its super classes.
    Forward,
    /// From object to subject, e.g., from a class to its sub classes.
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

impl QuadStore {
    /// Returns every resource that is reachable from `seed` by following `predicate` one or more
    /// times, ordered by id.
    ///
    /// If `context` is given, only the triples of that context are followed. If the seed reaches
    /// itself, the hierarchy contains a cycle. The cycle is reported as a warning and the seed is
    /// not part of the result.
    pub fn closure(
        &self,
        seed: ResourceId,
        predicate: ResourceId,
        direction: Direction,
        context: Option<ContextId>,
    ) -> Result<Vec<ResourceId>, StorageError> {
        let (from, to) = direction.columns();
        let sql = format!(
            "WITH RECURSIVE reachable(node) AS (
                 SELECT {to} FROM refs WHERE {from} = ?1 AND predicate = ?2 AND (?3 IS NULL OR context = ?3)
                 UNION
                 SELECT refs.{to} FROM refs JOIN reachable ON refs.{from} = reachable.node
                 WHERE refs.predicate = ?2 AND (?3 IS NULL OR refs.context = ?3)
             )
             SELECT node FROM reachable ORDER BY node"
        );

        let mut statement = self.connection.prepare_cached(&sql)?;
        let mut nodes = statement
            .query_map(
                params![
                    seed.as_i64(),
                    predicate.as_i64(),
                    context.map(ContextId::as_i64)
                ],
                |row| Ok(ResourceId::new(row.get(0)?)),
            )?
            .collect::<Result<Vec<_>, _>>()?;

        if let Some(position) = nodes.iter().position(|node| *node == seed) {
            warn!(
                seed = %seed,
                predicate = %predicate,
                "Cycle detected while computing closure, ignoring the closing edge"
            );
            nodes.remove(position);
        }
        Ok(nodes)
    }

    /// Returns true if `to` can be reached from `from` by following `predicate` zero or more
    /// times in any context.
    ///
    /// For example, `is_reachable(a, rdfs::SUB_CLASS_OF, b)` decides whether `a` is a subclass
    /// of `b`.
    pub fn is_reachable(
        &self,
        from: ResourceId,
        predicate: ResourceId,
        to: ResourceId,
    ) -> Result<bool, StorageError> {
        if from == to {
            return Ok(true);
        }
        let found: bool = self.connection.prepare_cached(
            "WITH RECURSIVE reachable(node) AS (
                 SELECT ?1
                 UNION
                 SELECT refs.object FROM refs JOIN reachable ON refs.subject = reachable.node
                 WHERE refs.predicate = ?2
             )
             SELECT EXISTS(SELECT 1 FROM reachable WHERE node = ?3)",
        )?
        .query_row(
            params![from.as_i64(), predicate.as_i64(), to.as_i64()],
            |row| row.get(0),
        )?;
        Ok(found)
    }
}
