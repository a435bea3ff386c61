//! Snapshot records, gateway contract and SQLite implementation.
//!
//! # Responsibility
//! - Describe the persisted form of categories, priorities and tasks.
//! - Load and replace those collections in SQLite.
//!
//! # Invariants
//! - Rows are read back in the order they were written (`position`).
//! - Each save runs in one immediate transaction; a failed save leaves the
//!   previous snapshot intact. `save_snapshot` covers all four tables with
//!   a single transaction.
//! - Read paths reject malformed rows instead of masking them.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::reminder::ReminderType;
use crate::model::task::TaskStatus;
use chrono::NaiveDate;
use rusqlite::{params, Connection, Transaction, TransactionBehavior};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use thiserror::Error;

const DATE_FORMAT: &str = "%Y-%m-%d";

pub type RepoResult<T> = Result<T, RepoError>;

/// Persisted category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRecord {
    pub name: String,
}

/// Persisted priority. The Default priority is saved like any other.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityRecord {
    pub name: String,
}

/// Persisted reminder, nested under its task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderRecord {
    #[serde(rename = "type")]
    pub kind: ReminderType,
    pub date: NaiveDate,
}

/// Persisted task with its reminders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRecord {
    /// Task id text; restore replaces values that are not UUIDs.
    pub id: String,
    pub title: String,
    pub description: String,
    /// Category name.
    pub category: String,
    /// Priority name.
    pub priority: String,
    pub deadline: NaiveDate,
    pub status: TaskStatus,
    #[serde(default)]
    pub reminders: Vec<ReminderRecord>,
}

/// Persistence gateway error.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error(transparent)]
    Db(#[from] DbError),
    #[error("failed to access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed snapshot file {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid persisted snapshot data: {0}")]
    InvalidData(String),
    #[error(
        "connection is not migrated to the expected schema (expected {expected_version}, found {actual_version})"
    )]
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl RepoError {
    /// Stable code for log lines.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Db(_) => "db_error",
            Self::Io { .. } => "io_error",
            Self::Json { .. } => "json_error",
            Self::InvalidData(_) => "invalid_data",
            Self::UninitializedConnection { .. } => "uninitialized_connection",
        }
    }
}

/// Storage contract for planner snapshots.
///
/// Each `save_*` replaces the whole stored collection.
pub trait SnapshotRepository {
    fn load_categories(&self) -> RepoResult<Vec<CategoryRecord>>;
    fn load_priorities(&self) -> RepoResult<Vec<PriorityRecord>>;
    fn load_tasks(&self) -> RepoResult<Vec<TaskRecord>>;
    fn save_categories(&self, categories: &[CategoryRecord]) -> RepoResult<()>;
    fn save_priorities(&self, priorities: &[PriorityRecord]) -> RepoResult<()>;
    fn save_tasks(&self, tasks: &[TaskRecord]) -> RepoResult<()>;

    /// Replaces all three collections together.
    ///
    /// Task records name their category and priority, so the collections
    /// are only consistent as a set: on error none of them is replaced.
    fn save_snapshot(
        &self,
        categories: &[CategoryRecord],
        priorities: &[PriorityRecord],
        tasks: &[TaskRecord],
    ) -> RepoResult<()>;
}

/// SQLite-backed snapshot gateway.
pub struct SqliteSnapshotRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteSnapshotRepository<'conn> {
    /// Constructs a repository from a fully migrated connection.
    ///
    /// # Errors
    /// - `UninitializedConnection` when `PRAGMA user_version` does not match
    ///   the latest known migration.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_snapshot_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl SnapshotRepository for SqliteSnapshotRepository<'_> {
    fn load_categories(&self) -> RepoResult<Vec<CategoryRecord>> {
        load_names(self.conn, "SELECT name FROM categories ORDER BY position ASC;")
            .map(|names| names.into_iter().map(|name| CategoryRecord { name }).collect())
    }

    fn load_priorities(&self) -> RepoResult<Vec<PriorityRecord>> {
        load_names(self.conn, "SELECT name FROM priorities ORDER BY position ASC;")
            .map(|names| names.into_iter().map(|name| PriorityRecord { name }).collect())
    }

    fn load_tasks(&self) -> RepoResult<Vec<TaskRecord>> {
        let mut reminders = load_reminders(self.conn)?;

        let mut stmt = self.conn.prepare(
            "SELECT
                task_id,
                title,
                description,
                category_name,
                priority_name,
                deadline,
                status
             FROM tasks
             ORDER BY position ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut tasks = Vec::new();
        while let Some(row) = rows.next()? {
            let id: String = row.get("task_id")?;
            let deadline: String = row.get("deadline")?;
            let status: String = row.get("status")?;
            tasks.push(TaskRecord {
                reminders: reminders.remove(&id).unwrap_or_default(),
                id,
                title: row.get("title")?,
                description: row.get("description")?,
                category: row.get("category_name")?,
                priority: row.get("priority_name")?,
                deadline: parse_date(&deadline)?,
                status: TaskStatus::parse(&status).ok_or_else(|| {
                    RepoError::InvalidData(format!("unknown task status `{status}`"))
                })?,
            });
        }

        Ok(tasks)
    }

    fn save_categories(&self, categories: &[CategoryRecord]) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        write_categories(&tx, categories)?;
        tx.commit()?;
        Ok(())
    }

    fn save_priorities(&self, priorities: &[PriorityRecord]) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        write_priorities(&tx, priorities)?;
        tx.commit()?;
        Ok(())
    }

    fn save_tasks(&self, tasks: &[TaskRecord]) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        write_tasks(&tx, tasks)?;
        tx.commit()?;
        Ok(())
    }

    fn save_snapshot(
        &self,
        categories: &[CategoryRecord],
        priorities: &[PriorityRecord],
        tasks: &[TaskRecord],
    ) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        write_categories(&tx, categories)?;
        write_priorities(&tx, priorities)?;
        write_tasks(&tx, tasks)?;
        tx.commit()?;
        Ok(())
    }
}

fn write_categories(conn: &Connection, categories: &[CategoryRecord]) -> RepoResult<()> {
    replace_names(
        conn,
        "categories",
        categories.iter().map(|record| record.name.as_str()),
    )
}

fn write_priorities(conn: &Connection, priorities: &[PriorityRecord]) -> RepoResult<()> {
    replace_names(
        conn,
        "priorities",
        priorities.iter().map(|record| record.name.as_str()),
    )
}

/// Replaces every task and reminder row; the caller owns the transaction.
fn write_tasks(conn: &Connection, tasks: &[TaskRecord]) -> RepoResult<()> {
    conn.execute("DELETE FROM reminders;", [])?;
    conn.execute("DELETE FROM tasks;", [])?;

    for (position, task) in tasks.iter().enumerate() {
        conn.execute(
            "INSERT INTO tasks (
                task_id,
                position,
                title,
                description,
                category_name,
                priority_name,
                deadline,
                status
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                task.id,
                position as i64,
                task.title,
                task.description,
                task.category,
                task.priority,
                format_date(task.deadline),
                task.status.as_str(),
            ],
        )?;

        for (reminder_position, reminder) in task.reminders.iter().enumerate() {
            conn.execute(
                "INSERT INTO reminders (
                    task_id,
                    position,
                    reminder_type,
                    reminder_date
                ) VALUES (?1, ?2, ?3, ?4);",
                params![
                    task.id,
                    reminder_position as i64,
                    reminder.kind.as_str(),
                    format_date(reminder.date),
                ],
            )?;
        }
    }
    Ok(())
}

fn load_names(conn: &Connection, sql: &str) -> RepoResult<Vec<String>> {
    let mut stmt = conn.prepare(sql)?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(names)
}

fn replace_names<'a>(
    conn: &Connection,
    table: &'static str,
    names: impl Iterator<Item = &'a str>,
) -> RepoResult<()> {
    conn.execute(&format!("DELETE FROM {table};"), [])?;
    let mut insert =
        conn.prepare(&format!("INSERT INTO {table} (position, name) VALUES (?1, ?2);"))?;
    for (position, name) in names.enumerate() {
        insert.execute(params![position as i64, name])?;
    }
    Ok(())
}

fn load_reminders(conn: &Connection) -> RepoResult<HashMap<String, Vec<ReminderRecord>>> {
    let mut stmt = conn.prepare(
        "SELECT task_id, reminder_type, reminder_date
         FROM reminders
         ORDER BY task_id ASC, position ASC;",
    )?;
    let mut rows = stmt.query([])?;
    let mut by_task: HashMap<String, Vec<ReminderRecord>> = HashMap::new();
    while let Some(row) = rows.next()? {
        let task_id: String = row.get("task_id")?;
        let kind: String = row.get("reminder_type")?;
        let date: String = row.get("reminder_date")?;
        let record = ReminderRecord {
            kind: ReminderType::parse(&kind).ok_or_else(|| {
                RepoError::InvalidData(format!("unknown reminder type `{kind}`"))
            })?,
            date: parse_date(&date)?,
        };
        by_task.entry(task_id).or_default().push(record);
    }
    Ok(by_task)
}

fn parse_date(value: &str) -> RepoResult<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map_err(|err| RepoError::InvalidData(format!("invalid date `{value}`: {err}")))
}

fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn ensure_snapshot_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }
    Ok(())
}
