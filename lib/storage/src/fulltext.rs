use crate::{QuadStore, StorageError};
use quadlite_model::ResourceId;
use rusqlite::OptionalExtension;

/// Returns the name of the FTS5 table that indexes the literal values of `predicate`.
pub fn full_text_table(predicate: ResourceId) -> String {
    format!("fts_{}", predicate.as_i64())
}

impl QuadStore {
    /// Creates a full-text index over the literal values of `predicate`.
    ///
    /// The index is an external-content FTS5 table over the literal relation. Triggers keep it
    /// current. Enabling an already enabled predicate does nothing.
    pub fn enable_full_text(&self, predicate: ResourceId) -> Result<(), StorageError> {
        self.require_write_lock()?;
        if self.is_full_text_enabled(predicate)? {
            return Ok(());
        }

        let table = full_text_table(predicate);
        let id = predicate.as_i64();
        self.connection.execute_batch(&format!(
            "CREATE VIRTUAL TABLE {table} USING fts5(value, content='literals', content_rowid='rowid');
             INSERT INTO {table}(rowid, value) SELECT rowid, value FROM literals WHERE predicate = {id};
             CREATE TRIGGER {table}_insert AFTER INSERT ON literals WHEN new.predicate = {id} BEGIN
                 INSERT INTO {table}(rowid, value) VALUES (new.rowid, new.value);
             END;
             CREATE TRIGGER {table}_delete AFTER DELETE ON literals WHEN old.predicate = {id} BEGIN
                 INSERT INTO {table}({table}, rowid, value) VALUES ('delete', old.rowid, old.value);
             END;
             CREATE TRIGGER {table}_update_old AFTER UPDATE ON literals WHEN old.predicate = {id} BEGIN
                 INSERT INTO {table}({table}, rowid, value) VALUES ('delete', old.rowid, old.value);
             END;
             CREATE TRIGGER {table}_update_new AFTER UPDATE ON literals WHEN new.predicate = {id} BEGIN
                 INSERT INTO {table}(rowid, value) VALUES (new.rowid, new.value);
             END;
             INSERT INTO fulltext_predicates (predicate) VALUES ({id});"
        ))?;
        Ok(())
    }

    /// Drops the full-text index of `predicate`, if there is one.
    pub fn disable_full_text(&self, predicate: ResourceId) -> Result<(), StorageError> {
        self.require_write_lock()?;
        if !self.is_full_text_enabled(predicate)? {
            return Ok(());
        }

        let table = full_text_table(predicate);
        self.connection.execute_batch(&format!(
            "DROP TRIGGER {table}_insert;
             DROP TRIGGER {table}_delete;
             DROP TRIGGER {table}_update_old;
             DROP TRIGGER {table}_update_new;
             DROP TABLE {table};
             DELETE FROM fulltext_predicates WHERE predicate = {};",
            predicate.as_i64()
        ))?;
        Ok(())
    }

    pub fn is_full_text_enabled(&self, predicate: ResourceId) -> Result<bool, StorageError> {
        Ok(self
            .connection
            .prepare_cached("SELECT 1 FROM fulltext_predicates WHERE predicate = ?1")?
            .query_row([predicate.as_i64()], |_| Ok(()))
            .optional()?
            .is_some())
    }

    /// Returns all predicates with a full-text index.
    pub fn full_text_predicates(&self) -> Result<Vec<ResourceId>, StorageError> {
        let mut statement = self
            .connection
            .prepare_cached("SELECT predicate FROM fulltext_predicates ORDER BY predicate")?;
        let predicates = statement
            .query_map([], |row| Ok(ResourceId::new(row.get(0)?)))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(predicates)
    }

    /// Returns the subjects whose value of `predicate` matches the FTS5 expression `query`.
    pub fn search_full_text(
        &self,
        predicate: ResourceId,
        query: &str,
    ) -> Result<Vec<ResourceId>, StorageError> {
        if !self.is_full_text_enabled(predicate)? {
            return Err(StorageError::FullTextNotEnabled(predicate));
        }

        let table = full_text_table(predicate);
        let mut statement = self.connection.prepare_cached(&format!(
            "SELECT DISTINCT subject FROM literals
             WHERE predicate = ?1 AND rowid IN (SELECT rowid FROM {table} WHERE {table} MATCH ?2)
             ORDER BY subject"
        ))?;
        let subjects = statement
            .query_map(rusqlite::params![predicate.as_i64(), query], |row| {
                Ok(ResourceId::new(row.get(0)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(subjects)
    }
}
