#![doc(test(attr(deny(warnings))))]

//! This crate defines the executor of quadlite.
//!
//! # Executing Queries
//!
//! A query passes through the following pipeline:
//!
//! ```text
//! Query String -> Pattern Algebra -> Typed Pattern Algebra -> SQL Statement -> Rows
//! ```
//!
//! The query string is parsed by spargebra and rewritten into the pattern algebra of
//! [quadlite_logical], with its identifiers resolved against the dictionary of the store by a
//! [StoreResolver]. Type inference then decides which relation holds each triple, and
//! [quadlite_physical] lowers the result into a single statement. [Executor::prepare] runs these
//! steps once. [Executor::execute] binds the runtime parameters to the statement and decodes the
//! rows it returns.
//!
//! Updates compile to a statement that selects the rows the templates are applied to.

mod error;
mod executor;
mod resolver;
pub mod results;
mod update;

pub use error::QueryError;
pub use executor::{Executor, PreparedQuery};
pub use resolver::StoreResolver;
pub use results::{QueryResults, QueryResultsFormat, QuerySolution, QuerySolutions};
