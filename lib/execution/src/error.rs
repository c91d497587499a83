use quadlite_logical::PatternError;
use quadlite_physical::CompileError;
use quadlite_storage::StorageError;
use std::io;

/// An error raised while preparing or executing a query.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    /// The query text could not be translated into the pattern algebra.
    #[error(transparent)]
    Pattern(#[from] PatternError),
    /// The pattern could not be lowered to SQL.
    #[error(transparent)]
    Compile(#[from] CompileError),
    /// An error from the quadstore.
    #[error(transparent)]
    Storage(#[from] StorageError),
    /// An error returned during results serialization.
    #[error(transparent)]
    ResultsSerialization(io::Error),
    #[error("The query expects {expected} parameters but {found} were given.")]
    ParameterCount { expected: usize, found: usize },
    #[error("The update inserts into the default context but no default context was given.")]
    NoDefaultContext,
    #[error("An update request may only contain update operations.")]
    MixedRequest,
    #[error("Only solutions and booleans can be serialized.")]
    NotSerializable,
    #[error("An internal error occurred: {0}")]
    InternalError(String),
}

impl From<rusqlite::Error> for QueryError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Storage(StorageError::Sqlite(value))
    }
}
