use crate::encoding::{literal_from_sql, literal_value_to_sql, tag_to_sql};
use crate::{QuadStore, StorageError};
use quadlite_model::{ContextId, Literal, LiteralTag, LiteralValue, ResourceId};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Row};

/// A triple whose object is a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReferenceTriple {
    pub context: ContextId,
    pub subject: ResourceId,
    pub predicate: ResourceId,
    pub object: ResourceId,
}

/// A triple whose object is a literal.
#[derive(Debug, Clone, PartialEq)]
pub struct LiteralTriple {
    pub context: ContextId,
    pub subject: ResourceId,
    pub predicate: ResourceId,
    pub literal: Literal,
}

/// A triple of either relation.
#[derive(Debug, Clone, PartialEq)]
pub enum StoredTriple {
    Reference(ReferenceTriple),
    Literal(LiteralTriple),
}

impl StoredTriple {
    pub fn subject(&self) -> ResourceId {
        match self {
            StoredTriple::Reference(triple) => triple.subject,
            StoredTriple::Literal(triple) => triple.subject,
        }
    }
}

/// Selects reference triples. Positions that are [None] match anything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReferencePattern {
    pub context: Option<ContextId>,
    pub subject: Option<ResourceId>,
    pub predicate: Option<ResourceId>,
    pub object: Option<ResourceId>,
}

impl ReferencePattern {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_context(mut self, context: ContextId) -> Self {
        self.context = Some(context);
        self
    }

    #[must_use]
    pub fn with_subject(mut self, subject: ResourceId) -> Self {
        self.subject = Some(subject);
        self
    }

    #[must_use]
    pub fn with_predicate(mut self, predicate: ResourceId) -> Self {
        self.predicate = Some(predicate);
        self
    }

    #[must_use]
    pub fn with_object(mut self, object: ResourceId) -> Self {
        self.object = Some(object);
        self
    }

    fn conditions(&self) -> Conditions {
        let mut conditions = Conditions::default();
        conditions.push_id("context", self.context.map(ContextId::as_i64));
        conditions.push_id("subject", self.subject.map(ResourceId::as_i64));
        conditions.push_id("predicate", self.predicate.map(ResourceId::as_i64));
        conditions.push_id("object", self.object.map(ResourceId::as_i64));
        conditions
    }
}

/// Selects literal triples. Positions that are [None] match anything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LiteralPattern {
    pub context: Option<ContextId>,
    pub subject: Option<ResourceId>,
    pub predicate: Option<ResourceId>,
    pub value: Option<LiteralValue>,
    pub tag: Option<LiteralTag>,
}

impl LiteralPattern {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_context(mut self, context: ContextId) -> Self {
        self.context = Some(context);
        self
    }

    #[must_use]
    pub fn with_subject(mut self, subject: ResourceId) -> Self {
        self.subject = Some(subject);
        self
    }

    #[must_use]
    pub fn with_predicate(mut self, predicate: ResourceId) -> Self {
        self.predicate = Some(predicate);
        self
    }

    #[must_use]
    pub fn with_value(mut self, value: impl Into<LiteralValue>) -> Self {
        self.value = Some(value.into());
        self
    }

    #[must_use]
    pub fn with_tag(mut self, tag: LiteralTag) -> Self {
        self.tag = Some(tag);
        self
    }

    /// Matches exactly `literal`.
    #[must_use]
    pub fn with_literal(self, literal: &Literal) -> Self {
        self.with_value(literal.value().clone())
            .with_tag(literal.tag().clone())
    }

    fn conditions(&self) -> Conditions {
        let mut conditions = Conditions::default();
        conditions.push_id("context", self.context.map(ContextId::as_i64));
        conditions.push_id("subject", self.subject.map(ResourceId::as_i64));
        conditions.push_id("predicate", self.predicate.map(ResourceId::as_i64));
        if let Some(value) = &self.value {
            conditions.push("value", literal_value_to_sql(value));
        }
        if let Some(tag) = &self.tag {
            conditions.push("tag", tag_to_sql(tag));
        }
        conditions
    }
}

/// The `WHERE` clause of a wildcard lookup.
#[derive(Default)]
struct Conditions {
    columns: Vec<&'static str>,
    values: Vec<Value>,
}

impl Conditions {
    fn push(&mut self, column: &'static str, value: Value) {
        self.columns.push(column);
        self.values.push(value);
    }

    fn push_id(&mut self, column: &'static str, value: Option<i64>) {
        if let Some(value) = value {
            self.push(column, Value::Integer(value));
        }
    }

    fn where_clause(&self) -> String {
        if self.columns.is_empty() {
            return String::new();
        }
        let conditions = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, column)| format!("{column} = ?{}", i + 1))
            .collect::<Vec<_>>();
        format!(" WHERE {}", conditions.join(" AND "))
    }
}

impl QuadStore {
    /// Inserts a reference triple. Returns false if the triple already existed.
    pub fn insert_reference(
        &self,
        context: ContextId,
        subject: ResourceId,
        predicate: ResourceId,
        object: ResourceId,
    ) -> Result<bool, StorageError> {
        self.require_write_lock()?;
        let inserted = self
            .connection
            .prepare_cached(
                "INSERT OR IGNORE INTO refs (context, subject, predicate, object) VALUES (?1, ?2, ?3, ?4)",
            )?
            .execute(params![
                context.as_i64(),
                subject.as_i64(),
                predicate.as_i64(),
                object.as_i64()
            ])?;
        self.record_insertion(context, inserted);
        Ok(inserted > 0)
    }

    /// Inserts a literal triple. Returns false if the triple already existed.
    pub fn insert_literal(
        &self,
        context: ContextId,
        subject: ResourceId,
        predicate: ResourceId,
        literal: &Literal,
    ) -> Result<bool, StorageError> {
        self.require_write_lock()?;
        let inserted = self
            .connection
            .prepare_cached(
                "INSERT OR IGNORE INTO literals (context, subject, predicate, value, tag) VALUES (?1, ?2, ?3, ?4, ?5)",
            )?
            .execute(params![
                context.as_i64(),
                subject.as_i64(),
                predicate.as_i64(),
                literal_value_to_sql(literal.value()),
                tag_to_sql(literal.tag())
            ])?;
        self.record_insertion(context, inserted);
        Ok(inserted > 0)
    }

    /// Makes `object` the only value of `predicate` for `subject` within `context`.
    pub fn set_reference(
        &self,
        context: ContextId,
        subject: ResourceId,
        predicate: ResourceId,
        object: ResourceId,
    ) -> Result<(), StorageError> {
        self.delete_triples(Some(context), Some(subject), Some(predicate))?;
        self.insert_reference(context, subject, predicate, object)?;
        Ok(())
    }

    /// Makes `literal` the only value of `predicate` for `subject` within `context`.
    pub fn set_literal(
        &self,
        context: ContextId,
        subject: ResourceId,
        predicate: ResourceId,
        literal: &Literal,
    ) -> Result<(), StorageError> {
        self.delete_triples(Some(context), Some(subject), Some(predicate))?;
        self.insert_literal(context, subject, predicate, literal)?;
        Ok(())
    }

    /// Deletes all reference triples matching `pattern`. Returns the number of deleted triples.
    ///
    /// Deleting a triple that does not exist is not an error.
    pub fn delete_references(&self, pattern: &ReferencePattern) -> Result<usize, StorageError> {
        self.require_write_lock()?;
        self.delete_matching("refs", &pattern.conditions())
    }

    /// Deletes all literal triples matching `pattern`. Returns the number of deleted triples.
    pub fn delete_literals(&self, pattern: &LiteralPattern) -> Result<usize, StorageError> {
        self.require_write_lock()?;
        self.delete_matching("literals", &pattern.conditions())
    }

    /// Deletes the triples of both relations that match the given positions.
    pub fn delete_triples(
        &self,
        context: Option<ContextId>,
        subject: Option<ResourceId>,
        predicate: Option<ResourceId>,
    ) -> Result<usize, StorageError> {
        let references = self.delete_references(&ReferencePattern {
            context,
            subject,
            predicate,
            object: None,
        })?;
        let literals = self.delete_literals(&LiteralPattern {
            context,
            subject,
            predicate,
            ..LiteralPattern::default()
        })?;
        Ok(references + literals)
    }

    fn delete_matching(
        &self,
        table: &'static str,
        conditions: &Conditions,
    ) -> Result<usize, StorageError> {
        for context in self.matching_contexts(table, conditions)? {
            self.touch(context);
        }
        let sql = format!("DELETE FROM {table}{}", conditions.where_clause());
        Ok(self
            .connection
            .prepare_cached(&sql)?
            .execute(params_from_iter(conditions.values.iter()))?)
    }

    fn matching_contexts(
        &self,
        table: &'static str,
        conditions: &Conditions,
    ) -> Result<Vec<ContextId>, StorageError> {
        let sql = format!(
            "SELECT DISTINCT context FROM {table}{}",
            conditions.where_clause()
        );
        let mut statement = self.connection.prepare_cached(&sql)?;
        let contexts = statement
            .query_map(params_from_iter(conditions.values.iter()), |row| {
                Ok(ContextId::new(row.get(0)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(contexts)
    }

    /// Returns all reference triples matching `pattern`.
    pub fn find_references(
        &self,
        pattern: &ReferencePattern,
    ) -> Result<Vec<ReferenceTriple>, StorageError> {
        let conditions = pattern.conditions();
        let sql = format!(
            "SELECT context, subject, predicate, object FROM refs{}",
            conditions.where_clause()
        );
        let mut statement = self.connection.prepare_cached(&sql)?;
        let triples = statement
            .query_map(params_from_iter(conditions.values.iter()), read_reference)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(triples)
    }

    /// Returns all literal triples matching `pattern`.
    pub fn find_literals(&self, pattern: &LiteralPattern) -> Result<Vec<LiteralTriple>, StorageError> {
        let conditions = pattern.conditions();
        let sql = format!(
            "SELECT context, subject, predicate, value, tag FROM literals{}",
            conditions.where_clause()
        );
        let mut statement = self.connection.prepare_cached(&sql)?;
        let mut rows = statement.query(params_from_iter(conditions.values.iter()))?;
        let mut triples = Vec::new();
        while let Some(row) = rows.next()? {
            triples.push(read_literal(row)?);
        }
        Ok(triples)
    }

    pub fn contains_reference(&self, pattern: &ReferencePattern) -> Result<bool, StorageError> {
        self.exists("refs", &pattern.conditions())
    }

    pub fn contains_literal(&self, pattern: &LiteralPattern) -> Result<bool, StorageError> {
        self.exists("literals", &pattern.conditions())
    }

    fn exists(&self, table: &'static str, conditions: &Conditions) -> Result<bool, StorageError> {
        let sql = format!(
            "SELECT EXISTS(SELECT 1 FROM {table}{})",
            conditions.where_clause()
        );
        Ok(self.connection.prepare_cached(&sql)?.query_row(
            params_from_iter(conditions.values.iter()),
            |row| row.get(0),
        )?)
    }

    /// Returns the number of triples in all contexts.
    pub fn len(&self) -> Result<u64, StorageError> {
        self.count(None)
    }

    /// Returns the number of triples in `context`.
    pub fn len_in(&self, context: ContextId) -> Result<u64, StorageError> {
        self.count(Some(context))
    }

    pub fn is_empty(&self) -> Result<bool, StorageError> {
        Ok(self.len()? == 0)
    }

    fn count(&self, context: Option<ContextId>) -> Result<u64, StorageError> {
        let mut conditions = Conditions::default();
        conditions.push_id("context", context.map(ContextId::as_i64));
        let where_clause = conditions.where_clause();
        let sql = format!(
            "SELECT (SELECT COUNT(*) FROM refs{where_clause}) + (SELECT COUNT(*) FROM literals{where_clause})"
        );
        let count: i64 = self.connection.prepare_cached(&sql)?.query_row(
            params_from_iter(conditions.values.iter()),
            |row| row.get(0),
        )?;
        u64::try_from(count).map_err(|_| StorageError::InternalError("Negative count.".to_owned()))
    }

    /// Enumerates the triples of `context` (or of all contexts), for bulk export.
    ///
    /// If `sorted_by_subject` is set, the triples of a subject are adjacent and subjects appear in
    /// ascending id order.
    pub fn triples_in_context(
        &self,
        context: Option<ContextId>,
        sorted_by_subject: bool,
    ) -> Result<Vec<StoredTriple>, StorageError> {
        let mut conditions = Conditions::default();
        conditions.push_id("context", context.map(ContextId::as_i64));
        let order = if sorted_by_subject {
            " ORDER BY subject"
        } else {
            ""
        };
        let sql = format!(
            "SELECT context, subject, predicate, object, tag FROM quads{}{order}",
            conditions.where_clause()
        );

        let mut statement = self.connection.prepare_cached(&sql)?;
        let mut rows = statement.query(params_from_iter(conditions.values.iter()))?;
        let mut triples = Vec::new();
        while let Some(row) = rows.next()? {
            let triple = if row.get_ref(4)?.data_type() == rusqlite::types::Type::Null {
                StoredTriple::Reference(read_reference(row)?)
            } else {
                StoredTriple::Literal(read_literal(row)?)
            };
            triples.push(triple);
        }
        Ok(triples)
    }

    fn record_insertion(&self, context: ContextId, inserted: usize) {
        if inserted == 0 {
            return;
        }
        self.touch(context);
        self.inserted_since_analyze
            .set(self.inserted_since_analyze.get() + inserted as u64);
    }
}

fn read_reference(row: &Row<'_>) -> rusqlite::Result<ReferenceTriple> {
    Ok(ReferenceTriple {
        context: ContextId::new(row.get(0)?),
        subject: ResourceId::new(row.get(1)?),
        predicate: ResourceId::new(row.get(2)?),
        object: ResourceId::new(row.get(3)?),
    })
}

fn read_literal(row: &Row<'_>) -> Result<LiteralTriple, StorageError> {
    let literal = literal_from_sql(row.get_ref(3)?, row.get_ref(4)?)?.ok_or_else(|| {
        StorageError::InternalError("Stored literal without value.".to_owned())
    })?;
    Ok(LiteralTriple {
        context: ContextId::new(row.get(0)?),
        subject: ResourceId::new(row.get(1)?),
        predicate: ResourceId::new(row.get(2)?),
        literal,
    })
}
