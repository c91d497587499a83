/// An error raised while lowering the pattern algebra to SQL.
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    #[error("Variable {0} is not bound by the pattern.")]
    UnboundVariable(String),
    #[error("Invalid full-text match: {0}")]
    InvalidFullText(String),
    #[error("Not implemented: {0}")]
    NotImplemented(String),
    #[error("An internal error occurred: {0}")]
    InternalError(String),
}
