use crate::options::JournalMode;
use crate::schema::{initialize, read_version};
use crate::{StorageError, StoreOptions};
use quadlite_model::ContextId;
use regex::Regex;
use rusqlite::functions::FunctionFlags;
use rusqlite::types::ValueRef;
use rusqlite::{Connection, OptionalExtension};
use rustc_hash::FxHashSet;
use std::cell::{Cell, RefCell};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A dictionary-encoded quadstore backed by an embedded SQLite database.
///
/// The store owns a single connection. Statements are executed synchronously, one at a time.
/// Several stores may open the same database file; in [JournalMode::Wal] their readers proceed
/// concurrently while at most one of them holds the write lock.
///
/// # Write Lock
///
/// Every mutation must happen inside a [Transaction](crate::Transaction). Transactions are
/// re-entrant: nested calls of [QuadStore::transaction] only increase a depth counter and the
/// outermost transaction decides whether the changes are committed.
///
/// Usage example:
/// ```
/// use quadlite_model::vocab::rdf;
/// use quadlite_storage::{QuadStore, ReferencePattern, StoreOptions};
///
/// let store = QuadStore::open_in_memory(StoreOptions::default())?;
///
/// let transaction = store.transaction()?;
/// let context = store.context("http://example.com/ontology")?;
/// let paris = store.intern("http://example.com/Paris")?;
/// let city = store.intern("http://example.com/City")?;
/// store.insert_reference(context, paris, rdf::TYPE, city)?;
/// transaction.commit()?;
///
/// let pattern = ReferencePattern::new().with_subject(paris);
/// assert_eq!(store.find_references(&pattern)?.len(), 1);
/// # Result::<_, Box<dyn std::error::Error>>::Ok(())
/// ```
pub struct QuadStore {
    pub(crate) connection: Connection,
    pub(crate) options: StoreOptions,
    pub(crate) lock_depth: Cell<u32>,
    pub(crate) rollback_only: Cell<bool>,
    pub(crate) touched_contexts: RefCell<FxHashSet<ContextId>>,
    pub(crate) inserted_since_analyze: Cell<u64>,
    pub(crate) generation: Cell<u64>,
}

impl QuadStore {
    /// Opens or creates the store in the database file at `path`.
    ///
    /// Stores written by an older version of quadlite are upgraded in place. Stores written by
    /// an unknown version are rejected with [StorageError::UnsupportedVersion].
    pub fn open(path: impl AsRef<Path>, options: StoreOptions) -> Result<Self, StorageError> {
        let connection = Connection::open(path)?;
        let journal_mode = options.journal_mode.unwrap_or(JournalMode::Wal);
        Self::from_connection(connection, options, journal_mode)
    }

    /// Creates a new store that lives in memory.
    pub fn open_in_memory(options: StoreOptions) -> Result<Self, StorageError> {
        let connection = Connection::open_in_memory()?;
        let journal_mode = options.journal_mode.unwrap_or(JournalMode::Memory);
        Self::from_connection(connection, options, journal_mode)
    }

    fn from_connection(
        connection: Connection,
        options: StoreOptions,
        journal_mode: JournalMode,
    ) -> Result<Self, StorageError> {
        configure_connection(&connection, &options, journal_mode)?;
        register_functions(&connection)?;
        initialize(&connection)?;

        Ok(Self {
            connection,
            options,
            lock_depth: Cell::new(0),
            rollback_only: Cell::new(false),
            touched_contexts: RefCell::new(FxHashSet::default()),
            inserted_since_analyze: Cell::new(0),
            generation: Cell::new(0),
        })
    }

    /// Returns the underlying connection for executing compiled queries.
    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    pub fn options(&self) -> &StoreOptions {
        &self.options
    }

    /// The storage format version of the opened database.
    pub fn format_version(&self) -> Result<i64, StorageError> {
        read_version(&self.connection)
    }

    /// A counter that changes whenever a transaction ends.
    ///
    /// Anything derived from the dictionary (e.g., compiled queries) is only valid for the
    /// generation it was created in.
    pub fn generation(&self) -> u64 {
        self.generation.get()
    }
}

fn configure_connection(
    connection: &Connection,
    options: &StoreOptions,
    journal_mode: JournalMode,
) -> Result<(), StorageError> {
    set_pragma(
        connection,
        "cache_size",
        &format!("-{}", options.cache_size_kib),
    )?;
    set_pragma(connection, "mmap_size", &options.mmap_size.to_string())?;
    set_pragma(connection, "temp_store", "MEMORY")?;
    set_pragma(connection, "journal_mode", journal_mode.as_sql())?;
    if options.exclusive {
        set_pragma(connection, "locking_mode", "EXCLUSIVE")?;
    }
    debug!(
        cache_size_kib = options.cache_size_kib,
        mmap_size = options.mmap_size,
        exclusive = options.exclusive,
        journal_mode = journal_mode.as_sql(),
        "Configured quadstore connection"
    );
    Ok(())
}

/// Some pragmas report their new value as a row, others return nothing.
fn set_pragma(connection: &Connection, name: &str, value: &str) -> Result<(), StorageError> {
    connection
        .query_row(&format!("PRAGMA {name} = {value}"), [], |_| Ok(()))
        .optional()?;
    Ok(())
}

/// Registers `regexp(pattern, text)` and `regexp_replace(text, pattern, replacement)`, which back
/// the `REGEX` and `REPLACE` functions of the query language.
fn register_functions(connection: &Connection) -> Result<(), StorageError> {
    connection.create_scalar_function(
        "regexp",
        2,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let regex: Arc<Regex> = ctx.get_or_create_aux(0, |pattern| -> Result<_, BoxError> {
                Ok(Regex::new(pattern.as_str()?)?)
            })?;
            let is_match = match ctx.get_raw(1) {
                ValueRef::Null => return Ok(None),
                ValueRef::Text(text) => regex.is_match(&String::from_utf8_lossy(text)),
                ValueRef::Integer(value) => regex.is_match(&value.to_string()),
                ValueRef::Real(value) => regex.is_match(&value.to_string()),
                ValueRef::Blob(value) => regex.is_match(&String::from_utf8_lossy(value)),
            };
            Ok(Some(is_match))
        },
    )?;
    connection.create_scalar_function(
        "regexp_replace",
        3,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let regex: Arc<Regex> = ctx.get_or_create_aux(1, |pattern| -> Result<_, BoxError> {
                Ok(Regex::new(pattern.as_str()?)?)
            })?;
            let Some(text) = ctx.get::<Option<String>>(0)? else {
                return Ok(None);
            };
            let replacement = ctx.get::<String>(2)?;
            Ok(Some(regex.replace_all(&text, replacement.as_str()).into_owned()))
        },
    )?;
    Ok(())
}
