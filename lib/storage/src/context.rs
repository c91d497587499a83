use crate::{QuadStore, StorageError};
use quadlite_model::ContextId;
use rusqlite::{params, OptionalExtension};
use tracing::info;

impl QuadStore {
    /// Returns the context named `iri`, creating it if necessary.
    ///
    /// Creating a context requires the write lock.
    pub fn context(&self, iri: &str) -> Result<ContextId, StorageError> {
        if iri.is_empty() {
            return Err(StorageError::EmptyIri);
        }
        if let Some(context) = self.lookup_context(iri)? {
            return Ok(context);
        }

        self.require_write_lock()?;
        self.connection
            .prepare_cached("INSERT INTO contexts (iri, last_update) VALUES (?1, NULL)")?
            .execute([iri])?;
        let context = ContextId::new(self.connection.last_insert_rowid());
        self.touch(context);
        Ok(context)
    }

    /// Returns the context named `iri` without creating it.
    pub fn lookup_context(&self, iri: &str) -> Result<Option<ContextId>, StorageError> {
        Ok(self
            .connection
            .prepare_cached("SELECT id FROM contexts WHERE iri = ?1")?
            .query_row([iri], |row| row.get::<_, i64>(0))
            .optional()?
            .map(ContextId::new))
    }

    pub fn context_iri(&self, context: ContextId) -> Result<String, StorageError> {
        self.connection
            .prepare_cached("SELECT iri FROM contexts WHERE id = ?1")?
            .query_row([context.as_i64()], |row| row.get(0))
            .optional()?
            .ok_or(StorageError::ContextNotFound(context))
    }

    /// Returns all contexts ordered by id.
    pub fn contexts(&self) -> Result<Vec<(ContextId, String)>, StorageError> {
        let mut statement = self
            .connection
            .prepare_cached("SELECT id, iri FROM contexts ORDER BY id")?;
        let contexts = statement
            .query_map([], |row| Ok((ContextId::new(row.get(0)?), row.get(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(contexts)
    }

    /// Deletes a context and all of its triples.
    ///
    /// Triples of other contexts are not affected.
    pub fn destroy_context(&self, context: ContextId) -> Result<(), StorageError> {
        self.require_write_lock()?;
        let iri = self.context_iri(context)?;

        let references = self
            .connection
            .execute("DELETE FROM refs WHERE context = ?1", [context.as_i64()])?;
        let literals = self
            .connection
            .execute("DELETE FROM literals WHERE context = ?1", [context.as_i64()])?;
        self.connection
            .execute("DELETE FROM contexts WHERE id = ?1", [context.as_i64()])?;
        self.touched_contexts.borrow_mut().remove(&context);

        info!(
            context = %iri,
            references, literals, "Destroyed context"
        );
        Ok(())
    }

    /// Returns the time of the last committed change of the context in seconds since the Unix
    /// epoch, or [None] if the context was never changed.
    pub fn last_update(&self, context: ContextId) -> Result<Option<f64>, StorageError> {
        self.connection
            .prepare_cached("SELECT last_update FROM contexts WHERE id = ?1")?
            .query_row([context.as_i64()], |row| row.get(0))
            .optional()?
            .ok_or(StorageError::ContextNotFound(context))
    }

    /// Overrides the time of the last change of the context.
    pub fn set_last_update(&self, context: ContextId, timestamp: f64) -> Result<(), StorageError> {
        self.require_write_lock()?;
        self.touched_contexts.borrow_mut().remove(&context);
        let changed = self
            .connection
            .prepare_cached("UPDATE contexts SET last_update = ?1 WHERE id = ?2")?
            .execute(params![timestamp, context.as_i64()])?;
        if changed == 0 {
            return Err(StorageError::ContextNotFound(context));
        }
        Ok(())
    }

    /// Records that `context` changed in the current transaction.
    pub(crate) fn touch(&self, context: ContextId) {
        self.touched_contexts.borrow_mut().insert(context);
    }
}
