#![doc(test(attr(deny(warnings))))]

//! The dictionary-encoded quadstore of quadlite.
//!
//! Triples are split into two relations by the kind of their object: `refs` holds triples whose
//! object is another resource and `literals` holds triples whose object is a literal value. Every
//! triple belongs to exactly one context. Resources are interned into dense integer ids by the
//! resource dictionary, see [QuadStore::intern].

mod closure;
mod context;
mod dictionary;
pub mod encoding;
mod error;
mod fulltext;
mod options;
mod schema;
mod stats;
mod store;
mod transaction;
mod triples;

pub use closure::Direction;
pub use error::StorageError;
pub use fulltext::full_text_table;
pub use options::{JournalMode, StoreOptions};
pub use schema::CURRENT_VERSION;
pub use store::QuadStore;
pub use transaction::Transaction;
pub use triples::{LiteralPattern, LiteralTriple, ReferencePattern, ReferenceTriple, StoredTriple};
