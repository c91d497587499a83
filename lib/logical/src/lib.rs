//! Parsing, normalization, and type inference of quadlite patterns.
//!
//! [parse_query] turns SPARQL text into one [Query] per query or update operation. Identifiers
//! are resolved through a [TermResolver] while the query is rewritten, so the resulting algebra
//! only refers to dictionary ids. [infer] then decides which relation each triple reads.

pub mod algebra;
mod error;
mod inference;
mod options;
mod parameters;
mod resolver;
mod rewriting;
mod union;

pub use error::PatternError;
pub use inference::{expression_kind, infer, KindLookup, Role, VariableKind, VariableTypes};
pub use options::QueryOptions;
pub use parameters::{parameter_index, parameter_variable, rewrite_parameters, ParameterizedText};
pub use resolver::{builtin_predicate_kind, BuiltinResolver, PredicateKind, TermResolver};
pub use rewriting::{is_hidden_variable, parse_query, PatternRewriter, HIDDEN_VARIABLE_PREFIX};
pub use union::classify_union;
