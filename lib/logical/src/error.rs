use crate::inference::Role;
use spargebra::SparqlSyntaxError;

/// An error raised while turning query text into the pattern algebra.
#[derive(Debug, thiserror::Error)]
pub enum PatternError {
    #[error(transparent)]
    Syntax(#[from] SparqlSyntaxError),
    #[error("Unknown identifier <{0}>.")]
    UnknownIdentifier(String),
    #[error("Unknown context <{0}>.")]
    UnknownContext(String),
    #[error("Invalid prefix {prefix}: {message}")]
    InvalidPrefix { prefix: String, message: String },
    #[error("Variable ?{variable} is used as {first} and as {second}.")]
    TypeConflict {
        variable: String,
        first: Role,
        second: Role,
    },
    #[error("A VALUES block must contain at least one row.")]
    EmptyValues,
    #[error("Invalid parameter reference ??{0}. Parameters are numbered from 1.")]
    InvalidParameter(String),
    #[error("Could not resolve identifiers: {0}")]
    Resolver(Box<dyn std::error::Error + Send + Sync>),
    #[error("Not implemented: {0}")]
    NotImplemented(String),
}
