use recallnote_core::db::migrations::{current_version, latest_version};
use recallnote_core::db::{open_db, open_db_in_memory, DbError};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(current_version(&conn).unwrap(), latest_version());
    for table in ["notes", "note_highlights", "cards"] {
        assert_table_exists(&conn, table);
    }
}

#[test]
fn reopening_a_store_file_keeps_schema_and_data() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("recallnote.sqlite3");

    let conn = open_db(&path).unwrap();
    conn.execute(
        "INSERT INTO notes (uuid, owner_id, subject) VALUES ('n-1', 'user-1', 'SP1');",
        [],
    )
    .unwrap();
    drop(conn);

    let conn = open_db(&path).unwrap();
    assert_eq!(current_version(&conn).unwrap(), latest_version());
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM notes;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 1);
}

#[test]
fn newer_schema_version_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.sqlite3");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    match open_db(&path).unwrap_err() {
        DbError::UnsupportedSchemaVersion { found, supported } => {
            assert_eq!(found, 999);
            assert_eq!(supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn unopenable_path_reports_the_target() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing").join("store.sqlite3");

    match open_db(&path).unwrap_err() {
        DbError::Open { target, .. } => assert!(target.ends_with("store.sqlite3")),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn deleting_a_note_cascades_to_highlights_but_not_cards() {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch(
        "INSERT INTO notes (uuid, owner_id, subject) VALUES ('n-1', 'user-1', 'SP1');
         INSERT INTO note_highlights (note_uuid, position, anchor_text, question)
             VALUES ('n-1', 0, 'text', 'q');
         INSERT INTO cards (uuid, owner_id, note_uuid, question)
             VALUES ('c-1', 'user-1', 'n-1', 'q');
         DELETE FROM notes WHERE uuid = 'n-1';",
    )
    .unwrap();

    assert_eq!(count_rows(&conn, "note_highlights"), 0);
    assert_eq!(count_rows(&conn, "cards"), 1);
}

#[test]
fn empty_anchor_text_is_rejected_by_schema() {
    let conn = open_db_in_memory().unwrap();
    conn.execute(
        "INSERT INTO notes (uuid, owner_id, subject) VALUES ('n-1', 'user-1', 'SP1');",
        [],
    )
    .unwrap();
    let result = conn.execute(
        "INSERT INTO note_highlights (note_uuid, position, anchor_text, question)
         VALUES ('n-1', 0, '', 'q');",
        [],
    );
    assert!(result.is_err());
}

fn count_rows(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| row.get(0))
        .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}
