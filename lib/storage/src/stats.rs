use crate::{QuadStore, StorageError};
use tracing::debug;

impl QuadStore {
    /// Refreshes the statistics the SQLite planner uses to choose indexes.
    pub fn analyze(&self) -> Result<(), StorageError> {
        self.connection.execute_batch("ANALYZE")?;
        self.inserted_since_analyze.set(0);
        Ok(())
    }

    /// Returns the number of triples inserted since the statistics were last refreshed.
    pub fn inserted_since_analyze(&self) -> u64 {
        self.inserted_since_analyze.get()
    }

    /// Refreshes the statistics once more than `analyze_threshold` triples were inserted.
    ///
    /// Called after the outermost transaction committed.
    pub(crate) fn analyze_if_needed(&self) -> Result<(), StorageError> {
        let inserted = self.inserted_since_analyze.get();
        if inserted < self.options.analyze_threshold {
            return Ok(());
        }
        debug!(inserted, "Refreshing planner statistics");
        self.analyze()
    }
}
