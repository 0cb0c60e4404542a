//! Activity repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD and tree-walk primitives over `activities` storage.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - Listings are deterministic: `id ASC` everywhere.
//! - `list_children_of` answers exactly one tree level per call; level
//!   bookkeeping belongs to the service layer.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::activity::{Activity, ActivityId};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

const ACTIVITY_SELECT_SQL: &str = "SELECT
    id,
    name,
    parent_id
FROM activities";

/// Result type used by activity repository operations.
pub type ActivityRepoResult<T> = Result<T, ActivityRepoError>;

/// Errors from activity repository operations.
#[derive(Debug)]
pub enum ActivityRepoError {
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Target activity does not exist.
    ActivityNotFound(ActivityId),
    /// Store-level uniqueness or reference constraint rejected the write.
    ConstraintViolation(String),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
    /// Required column is missing from expected table.
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for ActivityRepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::ActivityNotFound(id) => write!(f, "activity not found: {id}"),
            Self::ConstraintViolation(message) => {
                write!(f, "activity constraint violation: {message}")
            }
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "activity repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "activity repository requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "activity repository requires column `{column}` in table `{table}`"
            ),
        }
    }
}

impl Error for ActivityRepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::ActivityNotFound(_) => None,
            Self::ConstraintViolation(_) => None,
            Self::UninitializedConnection { .. } => None,
            Self::MissingRequiredTable(_) => None,
            Self::MissingRequiredColumn { .. } => None,
        }
    }
}

impl From<DbError> for ActivityRepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for ActivityRepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Repository interface for activity tree persistence.
pub trait ActivityRepository {
    /// Inserts one node and returns it with its store-assigned id.
    fn create_activity(
        &self,
        name: &str,
        parent_id: Option<ActivityId>,
    ) -> ActivityRepoResult<Activity>;
    /// Applies the provided fields to one node. `None` leaves a field as is.
    fn update_activity(
        &self,
        id: ActivityId,
        name: Option<&str>,
        parent_id: Option<ActivityId>,
    ) -> ActivityRepoResult<Activity>;
    /// Loads one node by id.
    fn get_activity(&self, id: ActivityId) -> ActivityRepoResult<Option<Activity>>;
    /// Loads one node by its exact name. Names are unique in the store.
    fn get_activity_by_name(&self, name: &str) -> ActivityRepoResult<Option<Activity>>;
    /// Lists every node.
    fn list_activities(&self) -> ActivityRepoResult<Vec<Activity>>;
    /// Loads the nodes whose ids appear in `ids`; unknown ids are skipped.
    fn list_by_ids(&self, ids: &[ActivityId]) -> ActivityRepoResult<Vec<Activity>>;
    /// Lists the immediate children of any node in `parent_ids`.
    fn list_children_of(&self, parent_ids: &[ActivityId]) -> ActivityRepoResult<Vec<Activity>>;
    /// Deletes one node.
    fn delete_activity(&self, id: ActivityId) -> ActivityRepoResult<()>;
}

/// SQLite-backed activity repository.
pub struct SqliteActivityRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteActivityRepository<'conn> {
    /// Creates a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> ActivityRepoResult<Self> {
        ensure_activity_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl ActivityRepository for SqliteActivityRepository<'_> {
    fn create_activity(
        &self,
        name: &str,
        parent_id: Option<ActivityId>,
    ) -> ActivityRepoResult<Activity> {
        self.conn
            .execute(
                "INSERT INTO activities (name, parent_id) VALUES (?1, ?2);",
                params![name, parent_id],
            )
            .map_err(map_activity_write_error)?;
        load_required_activity(self.conn, self.conn.last_insert_rowid())
    }

    fn update_activity(
        &self,
        id: ActivityId,
        name: Option<&str>,
        parent_id: Option<ActivityId>,
    ) -> ActivityRepoResult<Activity> {
        let mut assignments: Vec<&str> = Vec::new();
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(name) = name {
            assignments.push("name = ?");
            bind_values.push(Value::Text(name.to_string()));
        }
        if let Some(parent_id) = parent_id {
            assignments.push("parent_id = ?");
            bind_values.push(Value::Integer(parent_id));
        }

        if assignments.is_empty() {
            return load_required_activity(self.conn, id);
        }

        let sql = format!(
            "UPDATE activities SET {} WHERE id = ?;",
            assignments.join(", ")
        );
        bind_values.push(Value::Integer(id));

        let changed = self
            .conn
            .execute(&sql, params_from_iter(bind_values))
            .map_err(map_activity_write_error)?;
        if changed == 0 {
            return Err(ActivityRepoError::ActivityNotFound(id));
        }

        load_required_activity(self.conn, id)
    }

    fn get_activity(&self, id: ActivityId) -> ActivityRepoResult<Option<Activity>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{ACTIVITY_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_activity_row(row)?));
        }
        Ok(None)
    }

    fn get_activity_by_name(&self, name: &str) -> ActivityRepoResult<Option<Activity>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{ACTIVITY_SELECT_SQL} WHERE name = ?1;"))?;
        let mut rows = stmt.query([name])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_activity_row(row)?));
        }
        Ok(None)
    }

    fn list_activities(&self) -> ActivityRepoResult<Vec<Activity>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{ACTIVITY_SELECT_SQL} ORDER BY id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(parse_activity_row(row)?);
        }
        Ok(items)
    }

    fn list_by_ids(&self, ids: &[ActivityId]) -> ActivityRepoResult<Vec<Activity>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let sql = format!(
            "{ACTIVITY_SELECT_SQL} WHERE id IN ({}) ORDER BY id ASC;",
            id_placeholders(ids.len())
        );
        let bind_values: Vec<Value> = ids.iter().map(|id| Value::Integer(*id)).collect();

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(parse_activity_row(row)?);
        }
        Ok(items)
    }

    fn list_children_of(&self, parent_ids: &[ActivityId]) -> ActivityRepoResult<Vec<Activity>> {
        if parent_ids.is_empty() {
            return Ok(Vec::new());
        }

        let sql = format!(
            "{ACTIVITY_SELECT_SQL} WHERE parent_id IN ({}) ORDER BY id ASC;",
            id_placeholders(parent_ids.len())
        );
        let bind_values: Vec<Value> = parent_ids.iter().map(|id| Value::Integer(*id)).collect();

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(parse_activity_row(row)?);
        }
        Ok(items)
    }

    fn delete_activity(&self, id: ActivityId) -> ActivityRepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM activities WHERE id = ?1;", [id])
            .map_err(map_activity_write_error)?;
        if changed == 0 {
            return Err(ActivityRepoError::ActivityNotFound(id));
        }
        Ok(())
    }
}

fn load_required_activity(conn: &Connection, id: ActivityId) -> ActivityRepoResult<Activity> {
    let mut stmt = conn.prepare(&format!("{ACTIVITY_SELECT_SQL} WHERE id = ?1;"))?;
    let mut rows = stmt.query([id])?;
    if let Some(row) = rows.next()? {
        return parse_activity_row(row);
    }
    Err(ActivityRepoError::ActivityNotFound(id))
}

fn parse_activity_row(row: &Row<'_>) -> ActivityRepoResult<Activity> {
    Ok(Activity {
        id: row.get("id")?,
        name: row.get("name")?,
        parent_id: row.get("parent_id")?,
    })
}

fn id_placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

fn map_activity_write_error(err: rusqlite::Error) -> ActivityRepoError {
    if is_constraint_violation(&err) {
        return ActivityRepoError::ConstraintViolation(err.to_string());
    }
    ActivityRepoError::Db(DbError::Sqlite(err))
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    err.sqlite_error_code() == Some(rusqlite::ErrorCode::ConstraintViolation)
}

fn ensure_activity_connection_ready(conn: &Connection) -> ActivityRepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(ActivityRepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    if !table_exists(conn, "activities")? {
        return Err(ActivityRepoError::MissingRequiredTable("activities"));
    }

    for column in ["id", "name", "parent_id"] {
        if !table_has_column(conn, "activities", column)? {
            return Err(ActivityRepoError::MissingRequiredColumn {
                table: "activities",
                column,
            });
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> ActivityRepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> ActivityRepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
