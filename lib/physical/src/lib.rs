//! Compilation of quadlite patterns to SQL.
//!
//! [compile] lowers a [Query](quadlite_logical::algebra::Query) whose triples were assigned a
//! relation by type inference into a single SQLite statement. The statement does not embed
//! user-provided values. These are collected as [ParamSlot]s and bound by the executor.

mod compiler;
mod error;
pub mod sql;

pub use compiler::{compile, CompiledForm, CompiledQuery, TypedExpr};
pub use error::CompileError;
pub use sql::ParamSlot;
