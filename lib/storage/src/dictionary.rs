use crate::{QuadStore, StorageError};
use quadlite_model::{vocab, ContextId, ResourceId, RESERVED_RESOURCE_LIMIT};
use rusqlite::{params, OptionalExtension};

impl QuadStore {
    /// Returns the id of `iri`, allocating a new one if the iri has never been seen.
    ///
    /// Interning is idempotent. Allocating a new id requires the write lock.
    pub fn intern(&self, iri: &str) -> Result<ResourceId, StorageError> {
        if iri.is_empty() {
            return Err(StorageError::EmptyIri);
        }
        if let Some(id) = self.lookup(iri)? {
            return Ok(id);
        }

        self.require_write_lock()?;
        let id: i64 = self.connection.query_row(
            "UPDATE store SET current_resource = current_resource + 1 RETURNING current_resource",
            [],
            |row| row.get(0),
        )?;
        self.connection
            .prepare_cached("INSERT INTO resources (id, iri) VALUES (?1, ?2)")?
            .execute(params![id, iri])?;
        Ok(ResourceId::new(id))
    }

    /// Returns the id of `iri` without allocating one.
    pub fn lookup(&self, iri: &str) -> Result<Option<ResourceId>, StorageError> {
        if let Some(id) = vocab::builtin_id(iri) {
            return Ok(Some(id));
        }
        Ok(self
            .connection
            .prepare_cached("SELECT id FROM resources WHERE iri = ?1")?
            .query_row([iri], |row| row.get::<_, i64>(0))
            .optional()?
            .map(ResourceId::new))
    }

    /// Returns the iri of `id`.
    ///
    /// # Errors
    ///
    /// Returns [StorageError::ResourceNotFound] if the id was never allocated, was deleted, or
    /// denotes a blank node.
    pub fn resolve(&self, id: ResourceId) -> Result<String, StorageError> {
        self.try_resolve(id)?
            .ok_or(StorageError::ResourceNotFound(id))
    }

    /// Returns the iri of `id` or [None] if there is no such resource.
    pub fn try_resolve(&self, id: ResourceId) -> Result<Option<String>, StorageError> {
        if let Some(iri) = vocab::builtin_iri(id) {
            return Ok(Some(iri.to_owned()));
        }
        if id.is_blank_node() {
            return Ok(None);
        }
        Ok(self
            .connection
            .prepare_cached("SELECT iri FROM resources WHERE id = ?1")?
            .query_row([id.as_i64()], |row| row.get(0))
            .optional()?)
    }

    /// Changes the iri of an existing resource. The id stays the same.
    ///
    /// Built-in resources keep their iri.
    pub fn rename(&self, id: ResourceId, new_iri: &str) -> Result<(), StorageError> {
        self.require_write_lock()?;
        if id.is_builtin() {
            return Err(StorageError::BuiltinResource(id));
        }
        if new_iri.is_empty() {
            return Err(StorageError::EmptyIri);
        }
        let changed = self
            .connection
            .prepare_cached("UPDATE resources SET iri = ?1 WHERE id = ?2")?
            .execute(params![new_iri, id.as_i64()])?;
        if changed == 0 {
            return Err(StorageError::ResourceNotFound(id));
        }
        Ok(())
    }

    /// Replaces `old_prefix` with `new_prefix` in every iri that starts with it.
    ///
    /// Context iris are renamed as well. Built-in resources are never renamed. Returns the number
    /// of renamed resources.
    pub fn rename_prefix(&self, old_prefix: &str, new_prefix: &str) -> Result<usize, StorageError> {
        self.require_write_lock()?;
        let renamed = self.connection.execute(
            "UPDATE resources SET iri = ?2 || SUBSTR(iri, LENGTH(?1) + 1)
             WHERE SUBSTR(iri, 1, LENGTH(?1)) = ?1 AND id >= ?3",
            params![old_prefix, new_prefix, RESERVED_RESOURCE_LIMIT],
        )?;
        self.connection.execute(
            "UPDATE contexts SET iri = ?2 || SUBSTR(iri, LENGTH(?1) + 1)
             WHERE SUBSTR(iri, 1, LENGTH(?1)) = ?1",
            params![old_prefix, new_prefix],
        )?;
        Ok(renamed)
    }

    /// Mints an iri of the form `{prefix}{n}` that is not yet used by any resource.
    ///
    /// A counter per prefix remembers the last number. The iri is not interned.
    pub fn fresh_identifier(&self, prefix: &str) -> Result<String, StorageError> {
        self.require_write_lock()?;

        let last: Option<i64> = self
            .connection
            .prepare_cached("SELECT last FROM numbered_iris WHERE prefix = ?1")?
            .query_row([prefix], |row| row.get(0))
            .optional()?;
        let mut number = match last {
            Some(last) => last + 1,
            None => self.largest_numbered_suffix(prefix)? + 1,
        };

        let mut iri = format!("{prefix}{number}");
        while self.lookup(&iri)?.is_some() {
            number += 1;
            iri = format!("{prefix}{number}");
        }

        self.connection
            .prepare_cached(
                "INSERT INTO numbered_iris (prefix, last) VALUES (?1, ?2)
                 ON CONFLICT(prefix) DO UPDATE SET last = excluded.last",
            )?
            .execute(params![prefix, number])?;
        Ok(iri)
    }

    /// Finds the largest `n` such that `{prefix}{n}` is a known iri.
    fn largest_numbered_suffix(&self, prefix: &str) -> Result<i64, StorageError> {
        let mut statement = self.connection.prepare_cached(
            "SELECT SUBSTR(iri, LENGTH(?1) + 1) FROM resources WHERE SUBSTR(iri, 1, LENGTH(?1)) = ?1",
        )?;
        let suffixes = statement.query_map([prefix], |row| row.get::<_, String>(0))?;

        let mut largest = 0;
        for suffix in suffixes {
            if let Ok(number) = suffix?.parse::<i64>() {
                largest = largest.max(number);
            }
        }
        Ok(largest)
    }

    /// Allocates a new blank node.
    pub fn new_blank_node(&self) -> Result<ResourceId, StorageError> {
        self.require_write_lock()?;
        let number: i64 = self.connection.query_row(
            "UPDATE store SET current_blank = current_blank + 1 RETURNING current_blank",
            [],
            |row| row.get(0),
        )?;
        Ok(ResourceId::new(-number))
    }

    /// Removes a resource from the dictionary together with every triple that mentions it.
    pub fn delete_resource(&self, id: ResourceId) -> Result<(), StorageError> {
        self.require_write_lock()?;
        if id.is_builtin() {
            return Err(StorageError::BuiltinResource(id));
        }

        let raw_id = id.as_i64();
        for context in self.contexts_mentioning(id)? {
            self.touch(context);
        }
        self.connection.execute(
            "DELETE FROM refs WHERE subject = ?1 OR predicate = ?1 OR object = ?1",
            [raw_id],
        )?;
        self.connection.execute(
            "DELETE FROM literals WHERE subject = ?1 OR predicate = ?1",
            [raw_id],
        )?;
        self.connection
            .execute("DELETE FROM resources WHERE id = ?1", [raw_id])?;
        Ok(())
    }

    fn contexts_mentioning(&self, id: ResourceId) -> Result<Vec<ContextId>, StorageError> {
        let mut statement = self.connection.prepare_cached(
            "SELECT context FROM refs WHERE subject = ?1 OR predicate = ?1 OR object = ?1
             UNION SELECT context FROM literals WHERE subject = ?1 OR predicate = ?1",
        )?;
        let contexts = statement
            .query_map([id.as_i64()], |row| Ok(ContextId::new(row.get(0)?)))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(contexts)
    }
}
