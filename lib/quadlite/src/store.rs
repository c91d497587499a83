//! API to access a quadstore with graph pattern queries.
//!
//! The entry point of the module is the [`Store`] struct.
//!
//! Usage example:
//! ```
//! use quadlite::execution::QueryResults;
//! use quadlite::model::Parameter;
//! use quadlite::storage::StoreOptions;
//! use quadlite::store::Store;
//!
//! let mut store = Store::open_in_memory(StoreOptions::default())?;
//! store.use_context("http://example.com/graph")?;
//!
//! // update
//! store.update(
//!     "PREFIX ex: <http://example.com/>
//!      INSERT DATA { ex:paris a ex:City ; ex:name \"Paris\" }",
//!     &[],
//! )?;
//!
//! // query with a runtime parameter
//! let results = store.query(
//!     "PREFIX ex: <http://example.com/> SELECT ?city WHERE { ?city ex:name ?? }",
//!     &[Parameter::from("Paris")],
//! )?;
//! if let QueryResults::Solutions(solutions) = results {
//!     assert_eq!(solutions.len(), 1);
//! }
//! # Result::<_, Box<dyn std::error::Error>>::Ok(())
//! ```

use dashmap::DashMap;
use quadlite_execution::{Executor, PreparedQuery, QueryError, QueryResults};
use quadlite_logical::QueryOptions;
use quadlite_model::{ContextId, Parameter};
use quadlite_storage::{QuadStore, StorageError, StoreOptions, Transaction};
use rustc_hash::FxHasher;
use std::hash::BuildHasherDefault;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

type CacheKey = (String, QueryOptions);

/// A prepared query and the store generation it was prepared at.
struct CachedQuery {
    generation: u64,
    prepared: Arc<PreparedQuery>,
}

/// A quadstore that can be queried and updated with graph patterns.
///
/// Prepared queries are cached by their text and [QueryOptions]. A cached query is discarded as
/// soon as a transaction of the store commits, because it depends on the dictionary and on the
/// predicate declarations of the store.
///
/// Updates insert triples without an explicit `GRAPH` into the default context, see
/// [Store::use_context].
pub struct Store {
    quads: QuadStore,
    options: QueryOptions,
    default_context: Option<ContextId>,
    cache: DashMap<CacheKey, CachedQuery, BuildHasherDefault<FxHasher>>,
}

impl Store {
    /// Opens or creates the store in the database file at `path`.
    pub fn open(path: impl AsRef<Path>, options: StoreOptions) -> Result<Self, StorageError> {
        Ok(Self::new(QuadStore::open(path, options)?))
    }

    /// Creates a store that lives in memory.
    pub fn open_in_memory(options: StoreOptions) -> Result<Self, StorageError> {
        Ok(Self::new(QuadStore::open_in_memory(options)?))
    }

    /// Wraps an opened [QuadStore].
    pub fn new(quads: QuadStore) -> Self {
        Self {
            quads,
            options: QueryOptions::default(),
            default_context: None,
            cache: DashMap::with_hasher(BuildHasherDefault::default()),
        }
    }

    /// Sets the options used by [Store::query] and [Store::update].
    #[must_use]
    pub fn with_query_options(mut self, options: QueryOptions) -> Self {
        self.options = options;
        self
    }

    pub fn query_options(&self) -> &QueryOptions {
        &self.options
    }

    /// Returns the underlying quadstore.
    pub fn quads(&self) -> &QuadStore {
        &self.quads
    }

    /// Opens a transaction on the underlying quadstore. See [QuadStore::transaction].
    pub fn transaction(&self) -> Result<Transaction<'_>, StorageError> {
        self.quads.transaction()
    }

    pub fn default_context(&self) -> Option<ContextId> {
        self.default_context
    }

    pub fn set_default_context(&mut self, context: Option<ContextId>) {
        self.default_context = context;
    }

    /// Makes the context named `iri` the default context of updates, creating it if necessary.
    pub fn use_context(&mut self, iri: &str) -> Result<ContextId, StorageError> {
        let transaction = self.quads.transaction()?;
        let context = self.quads.context(iri)?;
        transaction.commit()?;
        self.default_context = Some(context);
        Ok(context)
    }

    /// Returns the prepared form of `text`, compiling it unless a current version is cached.
    pub fn prepare(
        &self,
        text: &str,
        options: &QueryOptions,
    ) -> Result<Arc<PreparedQuery>, QueryError> {
        let generation = self.quads.generation();
        let key = (text.to_owned(), options.clone());
        if let Some(cached) = self.cache.get(&key) {
            if cached.generation == generation {
                return Ok(Arc::clone(&cached.prepared));
            }
        }

        let prepared = Arc::new(self.executor().prepare(text, options)?);
        // Ids interned by an open transaction may still be rolled back.
        if self.quads.is_locked() {
            self.cache.remove(&key);
        } else {
            debug!(generation, "Caching prepared query");
            self.cache.insert(
                key,
                CachedQuery {
                    generation,
                    prepared: Arc::clone(&prepared),
                },
            );
        }
        Ok(prepared)
    }

    /// Executes the query or update `text` with the given runtime parameters.
    pub fn query(&self, text: &str, parameters: &[Parameter]) -> Result<QueryResults, QueryError> {
        self.query_with_options(text, parameters, &self.options)
    }

    pub fn query_with_options(
        &self,
        text: &str,
        parameters: &[Parameter],
        options: &QueryOptions,
    ) -> Result<QueryResults, QueryError> {
        let prepared = self.prepare(text, options)?;
        self.executor().execute(&prepared, parameters)
    }

    /// Executes the update `text` and returns the number of matched rows.
    pub fn update(&self, text: &str, parameters: &[Parameter]) -> Result<usize, QueryError> {
        let prepared = self.prepare(text, &self.options)?;
        if !prepared.is_update() {
            return Err(QueryError::MixedRequest);
        }
        self.executor()
            .execute(&prepared, parameters)?
            .modified()
            .ok_or_else(|| QueryError::InternalError("An update returned solutions.".to_owned()))
    }

    /// The number of cached prepared queries, including outdated ones.
    pub fn cached_queries(&self) -> usize {
        self.cache.len()
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    fn executor(&self) -> Executor<'_> {
        let executor = Executor::new(&self.quads);
        match self.default_context {
            Some(context) => executor.with_default_context(context),
            None => executor,
        }
    }
}
