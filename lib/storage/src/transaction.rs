use crate::{QuadStore, StorageError};
use time::OffsetDateTime;
use tracing::{trace, warn};

/// A scoped acquisition of the write lock of a [QuadStore].
///
/// The outermost transaction starts an immediate SQLite transaction, which excludes all other
/// writers. Nested transactions only count the depth. Dropping a transaction without calling
/// [Transaction::commit] rolls it back; for a nested transaction, the enclosing transaction can
/// then no longer commit.
#[must_use = "dropping a transaction rolls it back"]
pub struct Transaction<'store> {
    store: &'store QuadStore,
    finished: bool,
}

impl Transaction<'_> {
    /// The nesting depth of this transaction, starting at one for the outermost transaction.
    pub fn depth(&self) -> u32 {
        self.store.lock_depth.get()
    }

    /// Commits the transaction.
    ///
    /// Committing a nested transaction only releases its level of the lock.
    pub fn commit(mut self) -> Result<(), StorageError> {
        self.finished = true;
        self.store.release_write_lock(true)
    }

    /// Rolls back the transaction.
    pub fn rollback(mut self) -> Result<(), StorageError> {
        self.finished = true;
        self.store.release_write_lock(false)
    }
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        warn!("Transaction dropped without commit, rolling back.");
        if let Err(error) = self.store.release_write_lock(false) {
            warn!("Could not roll back transaction: {error}");
        }
    }
}

impl QuadStore {
    /// Acquires the write lock.
    pub fn transaction(&self) -> Result<Transaction<'_>, StorageError> {
        let depth = self.lock_depth.get();
        if depth == 0 {
            self.connection.execute_batch("BEGIN IMMEDIATE")?;
            self.rollback_only.set(false);
            trace!("Acquired write lock");
        }
        self.lock_depth.set(depth + 1);
        Ok(Transaction {
            store: self,
            finished: false,
        })
    }

    /// Returns true if the current connection holds the write lock.
    pub fn is_locked(&self) -> bool {
        self.lock_depth.get() > 0
    }

    pub(crate) fn require_write_lock(&self) -> Result<(), StorageError> {
        if self.is_locked() {
            Ok(())
        } else {
            Err(StorageError::WriteLockRequired)
        }
    }

    fn release_write_lock(&self, commit: bool) -> Result<(), StorageError> {
        let depth = self.lock_depth.get();
        if depth == 0 {
            return Err(StorageError::InternalError(
                "Released a write lock that was not held.".to_owned(),
            ));
        }
        self.lock_depth.set(depth - 1);

        if depth > 1 {
            if !commit {
                self.rollback_only.set(true);
            }
            return Ok(());
        }

        self.generation.set(self.generation.get() + 1);
        if commit && !self.rollback_only.get() {
            if let Err(error) = self.write_timestamps() {
                self.connection.execute_batch("ROLLBACK")?;
                return Err(error);
            }
            if let Err(error) = self.connection.execute_batch("COMMIT") {
                self.connection.execute_batch("ROLLBACK")?;
                return Err(error.into());
            }
            trace!("Committed transaction");
            self.analyze_if_needed()
        } else {
            self.touched_contexts.borrow_mut().clear();
            self.connection.execute_batch("ROLLBACK")?;
            trace!("Rolled back transaction");
            if commit {
                Err(StorageError::TransactionAborted)
            } else {
                Ok(())
            }
        }
    }

    /// Stores the time of the commit as the last update of every context changed in the
    /// transaction.
    fn write_timestamps(&self) -> Result<(), StorageError> {
        let contexts: Vec<_> = self.touched_contexts.borrow_mut().drain().collect();
        if contexts.is_empty() {
            return Ok(());
        }

        let now = unix_timestamp();
        let mut statement = self
            .connection
            .prepare_cached("UPDATE contexts SET last_update = ?1 WHERE id = ?2")?;
        for context in contexts {
            statement.execute(rusqlite::params![now, context.as_i64()])?;
        }
        Ok(())
    }
}

#[allow(clippy::cast_precision_loss)]
fn unix_timestamp() -> f64 {
    let now = OffsetDateTime::now_utc();
    now.unix_timestamp() as f64 + f64::from(now.nanosecond()) / 1e9
}
