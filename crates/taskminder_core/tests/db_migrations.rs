use rusqlite::Connection;
use taskminder_core::db::migrations::latest_version;
use taskminder_core::db::{open_db, open_db_in_memory, DbError};

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    for table in ["categories", "priorities", "tasks", "reminders"] {
        assert_table_exists(&conn, table);
    }
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("taskminder.db");

    let conn_first = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_first), latest_version());
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    assert_table_exists(&conn_second, "tasks");
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    match err {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn schema_rejects_unknown_status_and_reminder_type() {
    let conn = open_db_in_memory().unwrap();

    let bad_status = conn.execute(
        "INSERT INTO tasks (task_id, position, title, description, category_name, priority_name, deadline, status)
         VALUES ('t1', 0, 'a', 'b', 'c', 'Default', '2026-01-01', 'DONE');",
        [],
    );
    assert!(bad_status.is_err());

    conn.execute(
        "INSERT INTO tasks (task_id, position, title, description, category_name, priority_name, deadline, status)
         VALUES ('t1', 0, 'a', 'b', 'c', 'Default', '2026-01-01', 'OPEN');",
        [],
    )
    .unwrap();
    let bad_type = conn.execute(
        "INSERT INTO reminders (task_id, position, reminder_type, reminder_date)
         VALUES ('t1', 0, 'TWO_DAYS_BEFORE', '2025-12-30');",
        [],
    );
    assert!(bad_type.is_err());
}

#[test]
fn deleting_task_row_cascades_to_reminders() {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch(
        "INSERT INTO tasks (task_id, position, title, description, category_name, priority_name, deadline, status)
         VALUES ('t1', 0, 'a', 'b', 'c', 'Default', '2026-01-01', 'OPEN');
         INSERT INTO reminders (task_id, position, reminder_type, reminder_date)
         VALUES ('t1', 0, 'ONE_DAY_BEFORE', '2025-12-31');
         DELETE FROM tasks WHERE task_id = 't1';",
    )
    .unwrap();

    let remaining: i64 = conn
        .query_row("SELECT COUNT(*) FROM reminders;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(remaining, 0);
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
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
