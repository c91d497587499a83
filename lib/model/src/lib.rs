//! The data model shared by all quadlite crates.
//!
//! Resources and contexts are identified by dense integer ids, literals are stored as an opaque
//! scalar plus a [LiteralTag]. The [vocab] module contains the built-in vocabulary that occupies
//! the reserved id range of every store.

mod id;
mod literal;
mod term;
pub mod vocab;

pub use id::*;
pub use literal::*;
pub use term::*;

// Re-export some oxrdf types.
pub use oxrdf::{Variable, VariableRef};
