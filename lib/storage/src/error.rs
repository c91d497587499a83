use quadlite_model::{ContextId, ResourceId};
use std::convert::Infallible;

/// An error raised by the quadstore.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
    #[error("Resource {0} does not exist.")]
    ResourceNotFound(ResourceId),
    #[error("Context {0} does not exist.")]
    ContextNotFound(ContextId),
    #[error("Built-in resource {0} cannot be renamed or deleted.")]
    BuiltinResource(ResourceId),
    #[error("Resource identifiers must not be empty.")]
    EmptyIri,
    #[error(
        "The store is not locked for writing. Open a transaction with QuadStore::transaction() before mutating it."
    )]
    WriteLockRequired,
    #[error("Unsupported storage format version {found}. Supported versions are 1 to {supported}.")]
    UnsupportedVersion { found: i64, supported: i64 },
    #[error("The transaction was rolled back because a nested transaction was not committed.")]
    TransactionAborted,
    #[error("Full-text search is not enabled for predicate {0}.")]
    FullTextNotEnabled(ResourceId),
    #[error("An internal error occurred: {0}")]
    InternalError(String),
}

impl From<Infallible> for StorageError {
    fn from(value: Infallible) -> Self {
        match value {}
    }
}
