use quadlite_storage::{QuadStore, StorageError, StoreOptions, CURRENT_VERSION};
use rusqlite::Connection;
use std::path::Path;

const VERSION_1_SCHEMA: &str = "
CREATE TABLE store (version INTEGER NOT NULL, current_blank INTEGER NOT NULL, current_resource INTEGER NOT NULL);
CREATE TABLE resources (id INTEGER PRIMARY KEY, iri TEXT NOT NULL) WITHOUT ROWID;
CREATE UNIQUE INDEX index_resources_iri ON resources(iri);
CREATE TABLE contexts (id INTEGER PRIMARY KEY, iri TEXT NOT NULL UNIQUE);
CREATE TABLE refs (context INTEGER NOT NULL, subject INTEGER NOT NULL, predicate INTEGER NOT NULL, object INTEGER NOT NULL);
CREATE INDEX index_refs_sp ON refs(subject, predicate);
CREATE UNIQUE INDEX index_refs_op ON refs(object, predicate, context, subject);
CREATE TABLE literals (context INTEGER NOT NULL, subject INTEGER NOT NULL, predicate INTEGER NOT NULL, value BLOB, tag INTEGER NOT NULL);
CREATE INDEX index_literals_sp ON literals(subject, predicate);
CREATE UNIQUE INDEX index_literals_op ON literals(value, predicate, context, tag, subject);
CREATE VIEW quads AS
    SELECT context, subject, predicate, object, NULL AS tag FROM refs
    UNION ALL
    SELECT context, subject, predicate, value, tag FROM literals;
INSERT INTO store VALUES (1, 0, 299);
INSERT INTO resources VALUES (300, 'http://example.com/a');
INSERT INTO contexts VALUES (1, 'http://example.com/ctx');
INSERT INTO refs VALUES (1, 300, 1, 300);
";

fn write_database(path: &Path, sql: &str) {
    let connection = Connection::open(path).unwrap();
    connection.execute_batch(sql).unwrap();
}

#[test]
fn version_1_is_upgraded_on_open() {
    let directory = tempfile::tempdir().unwrap();
    let path = directory.path().join("store.db");
    write_database(&path, VERSION_1_SCHEMA);

    let store = QuadStore::open(&path, StoreOptions::default()).unwrap();
    assert_eq!(store.format_version().unwrap(), CURRENT_VERSION);
    assert_eq!(store.len().unwrap(), 1);

    let transaction = store.transaction().unwrap();
    assert_eq!(
        store.fresh_identifier("http://example.com/n").unwrap(),
        "http://example.com/n1"
    );
    let context = store.context("http://example.com/ctx").unwrap();
    transaction.commit().unwrap();
    assert_eq!(store.last_update(context).unwrap(), None);
}

#[test]
fn store_is_reopened_without_upgrade() {
    let directory = tempfile::tempdir().unwrap();
    let path = directory.path().join("store.db");
    {
        let store = QuadStore::open(&path, StoreOptions::default()).unwrap();
        let transaction = store.transaction().unwrap();
        store.intern("http://example.com/a").unwrap();
        transaction.commit().unwrap();
    }

    let store = QuadStore::open(&path, StoreOptions::default()).unwrap();
    assert!(store.lookup("http://example.com/a").unwrap().is_some());
}

#[test]
fn unknown_version_is_rejected() {
    let directory = tempfile::tempdir().unwrap();
    let path = directory.path().join("store.db");
    write_database(
        &path,
        "CREATE TABLE store (version INTEGER NOT NULL, current_blank INTEGER NOT NULL, current_resource INTEGER NOT NULL);
         INSERT INTO store VALUES (42, 0, 299);",
    );

    let result = QuadStore::open(&path, StoreOptions::default());
    assert!(matches!(
        result,
        Err(StorageError::UnsupportedVersion { found: 42, .. })
    ));
}
