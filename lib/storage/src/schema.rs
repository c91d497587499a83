use crate::StorageError;
use quadlite_model::vocab::BUILTIN_RESOURCES;
use quadlite_model::RESERVED_RESOURCE_LIMIT;
use rusqlite::{params, Connection};
use tracing::info;

/// The storage format version written by this version of quadlite.
pub const CURRENT_VERSION: i64 = 3;

const CREATE_SCHEMA: &str = "
CREATE TABLE store (version INTEGER NOT NULL, current_blank INTEGER NOT NULL, current_resource INTEGER NOT NULL);
CREATE TABLE resources (id INTEGER PRIMARY KEY, iri TEXT NOT NULL) WITHOUT ROWID;
CREATE UNIQUE INDEX index_resources_iri ON resources(iri);
CREATE TABLE contexts (id INTEGER PRIMARY KEY, iri TEXT NOT NULL UNIQUE, last_update DOUBLE);

CREATE TABLE refs (context INTEGER NOT NULL, subject INTEGER NOT NULL, predicate INTEGER NOT NULL, object INTEGER NOT NULL);
CREATE INDEX index_refs_sp ON refs(subject, predicate);
CREATE UNIQUE INDEX index_refs_op ON refs(object, predicate, context, subject);
CREATE INDEX index_refs_context ON refs(context);

CREATE TABLE literals (context INTEGER NOT NULL, subject INTEGER NOT NULL, predicate INTEGER NOT NULL, value BLOB, tag INTEGER NOT NULL);
CREATE INDEX index_literals_sp ON literals(subject, predicate);
CREATE UNIQUE INDEX index_literals_op ON literals(value, predicate, context, tag, subject);
CREATE INDEX index_literals_context ON literals(context);

CREATE VIEW quads AS
    SELECT context, subject, predicate, object, NULL AS tag FROM refs
    UNION ALL
    SELECT context, subject, predicate, value, tag FROM literals;

CREATE TABLE numbered_iris (prefix TEXT PRIMARY KEY, last INTEGER NOT NULL);
CREATE TABLE fulltext_predicates (predicate INTEGER PRIMARY KEY);
";

/// Steps that upgrade a store from the version in the first position to the next one.
const UPGRADES: &[(i64, &str)] = &[
    (
        1,
        "CREATE TABLE numbered_iris (prefix TEXT PRIMARY KEY, last INTEGER NOT NULL);",
    ),
    (
        2,
        "ALTER TABLE contexts ADD COLUMN last_update DOUBLE;
         CREATE INDEX index_refs_context ON refs(context);
         CREATE INDEX index_literals_context ON literals(context);
         CREATE TABLE fulltext_predicates (predicate INTEGER PRIMARY KEY);",
    ),
];

/// Creates the schema of an empty database or upgrades an existing one.
pub(crate) fn initialize(connection: &Connection) -> Result<(), StorageError> {
    let exists: bool = connection.query_row(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'store')",
        [],
        |row| row.get(0),
    )?;

    if exists {
        upgrade(connection)
    } else {
        create(connection)
    }
}

fn create(connection: &Connection) -> Result<(), StorageError> {
    connection.execute_batch("BEGIN IMMEDIATE")?;
    let result = create_in_transaction(connection);
    finish_transaction(connection, result)
}

fn create_in_transaction(connection: &Connection) -> Result<(), StorageError> {
    connection.execute_batch(CREATE_SCHEMA)?;
    connection.execute(
        "INSERT INTO store (version, current_blank, current_resource) VALUES (?1, 0, ?2)",
        params![CURRENT_VERSION, RESERVED_RESOURCE_LIMIT - 1],
    )?;

    let mut statement = connection.prepare("INSERT INTO resources (id, iri) VALUES (?1, ?2)")?;
    for (id, iri) in BUILTIN_RESOURCES {
        statement.execute(params![id.as_i64(), iri])?;
    }
    Ok(())
}

fn upgrade(connection: &Connection) -> Result<(), StorageError> {
    let version = read_version(connection)?;
    if version == CURRENT_VERSION {
        return Ok(());
    }
    if !(1..CURRENT_VERSION).contains(&version) {
        return Err(StorageError::UnsupportedVersion {
            found: version,
            supported: CURRENT_VERSION,
        });
    }

    connection.execute_batch("BEGIN IMMEDIATE")?;
    let result = apply_upgrades(connection, version);
    finish_transaction(connection, result)
}

fn apply_upgrades(connection: &Connection, mut version: i64) -> Result<(), StorageError> {
    for (from, statements) in UPGRADES {
        if *from != version {
            continue;
        }
        info!("Upgrading quadstore format from version {from} to {}.", from + 1);
        connection.execute_batch(statements)?;
        version = from + 1;
        connection.execute("UPDATE store SET version = ?1", [version])?;
    }

    if version == CURRENT_VERSION {
        Ok(())
    } else {
        Err(StorageError::InternalError(format!(
            "No upgrade path from storage format version {version}."
        )))
    }
}

fn finish_transaction(
    connection: &Connection,
    result: Result<(), StorageError>,
) -> Result<(), StorageError> {
    match result {
        Ok(()) => {
            connection.execute_batch("COMMIT")?;
            Ok(())
        }
        Err(error) => {
            connection.execute_batch("ROLLBACK")?;
            Err(error)
        }
    }
}

pub(crate) fn read_version(connection: &Connection) -> Result<i64, StorageError> {
    Ok(connection.query_row("SELECT version FROM store", [], |row| row.get(0))?)
}
