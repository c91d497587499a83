#![doc(test(attr(deny(warnings))))]

//! quadlite is a dictionary-encoded quadstore on top of SQLite that is queried with graph
//! patterns.
//!
//! Every query is compiled into a single SQL statement. The entry point is the
//! [`Store`](store::Store), which opens a quadstore and caches the compiled queries.
//! The crates the store is built from are re-exported as modules.

pub mod store;

pub mod model {
    pub use quadlite_model::*;
}

pub mod storage {
    pub use quadlite_storage::*;
}

pub mod logical {
    pub use quadlite_logical::*;
}

pub mod physical {
    pub use quadlite_physical::*;
}

pub mod execution {
    pub use quadlite_execution::*;
}
