use quadlite_storage::{QuadStore, StoreOptions};

mod closure;
mod fulltext;
mod quadstore;
mod transaction;
mod upgrade;

fn create_store() -> QuadStore {
    QuadStore::open_in_memory(StoreOptions::default()).unwrap()
}

fn example_iri(name: &str) -> String {
    format!("http://example.com/{name}")
}
