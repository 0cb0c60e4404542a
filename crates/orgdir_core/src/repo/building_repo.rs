//! Building repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD APIs over `buildings` storage.
//! - Reject corrupt persisted coordinates instead of masking them.
//!
//! # Invariants
//! - Listings are deterministic: `id ASC`.
//! - Addresses are unique; the UNIQUE index surfaces as `ConstraintViolation`.

use crate::db::DbError;
use crate::model::building::{validate_coordinates, Building, BuildingId};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

const BUILDING_SELECT_SQL: &str = "SELECT
    id,
    address,
    latitude,
    longitude
FROM buildings";

/// Result type used by building repository operations.
pub type BuildingRepoResult<T> = Result<T, BuildingRepoError>;

/// Errors from building repository operations.
#[derive(Debug)]
pub enum BuildingRepoError {
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Target building does not exist.
    BuildingNotFound(BuildingId),
    /// Store-level uniqueness or reference constraint rejected the write.
    ConstraintViolation(String),
    /// Persisted data cannot be converted to a valid read model.
    InvalidData(String),
}

impl Display for BuildingRepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::BuildingNotFound(id) => write!(f, "building not found: {id}"),
            Self::ConstraintViolation(message) => {
                write!(f, "building constraint violation: {message}")
            }
            Self::InvalidData(message) => write!(f, "invalid building data: {message}"),
        }
    }
}

impl Error for BuildingRepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::BuildingNotFound(_) => None,
            Self::ConstraintViolation(_) => None,
            Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for BuildingRepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for BuildingRepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Repository interface for building persistence.
pub trait BuildingRepository {
    /// Inserts one building and returns it with its store-assigned id.
    fn create_building(
        &self,
        address: &str,
        latitude: f64,
        longitude: f64,
    ) -> BuildingRepoResult<Building>;
    /// Applies the provided fields to one building. `None` leaves a field as is.
    fn update_building(
        &self,
        id: BuildingId,
        address: Option<&str>,
        latitude: Option<f64>,
        longitude: Option<f64>,
    ) -> BuildingRepoResult<Building>;
    /// Loads one building by id.
    fn get_building(&self, id: BuildingId) -> BuildingRepoResult<Option<Building>>;
    /// Lists every building.
    fn list_buildings(&self) -> BuildingRepoResult<Vec<Building>>;
    /// Deletes one building.
    fn delete_building(&self, id: BuildingId) -> BuildingRepoResult<()>;
}

/// SQLite-backed building repository.
pub struct SqliteBuildingRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteBuildingRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl BuildingRepository for SqliteBuildingRepository<'_> {
    fn create_building(
        &self,
        address: &str,
        latitude: f64,
        longitude: f64,
    ) -> BuildingRepoResult<Building> {
        self.conn
            .execute(
                "INSERT INTO buildings (address, latitude, longitude) VALUES (?1, ?2, ?3);",
                params![address, latitude, longitude],
            )
            .map_err(map_building_write_error)?;
        load_required_building(self.conn, self.conn.last_insert_rowid())
    }

    fn update_building(
        &self,
        id: BuildingId,
        address: Option<&str>,
        latitude: Option<f64>,
        longitude: Option<f64>,
    ) -> BuildingRepoResult<Building> {
        let mut assignments: Vec<&str> = Vec::new();
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(address) = address {
            assignments.push("address = ?");
            bind_values.push(Value::Text(address.to_string()));
        }
        if let Some(latitude) = latitude {
            assignments.push("latitude = ?");
            bind_values.push(Value::Real(latitude));
        }
        if let Some(longitude) = longitude {
            assignments.push("longitude = ?");
            bind_values.push(Value::Real(longitude));
        }

        if assignments.is_empty() {
            return load_required_building(self.conn, id);
        }

        let sql = format!(
            "UPDATE buildings SET {} WHERE id = ?;",
            assignments.join(", ")
        );
        bind_values.push(Value::Integer(id));

        let changed = self
            .conn
            .execute(&sql, params_from_iter(bind_values))
            .map_err(map_building_write_error)?;
        if changed == 0 {
            return Err(BuildingRepoError::BuildingNotFound(id));
        }

        load_required_building(self.conn, id)
    }

    fn get_building(&self, id: BuildingId) -> BuildingRepoResult<Option<Building>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{BUILDING_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_building_row(row)?));
        }
        Ok(None)
    }

    fn list_buildings(&self) -> BuildingRepoResult<Vec<Building>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{BUILDING_SELECT_SQL} ORDER BY id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(parse_building_row(row)?);
        }
        Ok(items)
    }

    fn delete_building(&self, id: BuildingId) -> BuildingRepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM buildings WHERE id = ?1;", [id])
            .map_err(map_building_write_error)?;
        if changed == 0 {
            return Err(BuildingRepoError::BuildingNotFound(id));
        }
        Ok(())
    }
}

fn load_required_building(conn: &Connection, id: BuildingId) -> BuildingRepoResult<Building> {
    let mut stmt = conn.prepare(&format!("{BUILDING_SELECT_SQL} WHERE id = ?1;"))?;
    let mut rows = stmt.query([id])?;
    if let Some(row) = rows.next()? {
        return parse_building_row(row);
    }
    Err(BuildingRepoError::BuildingNotFound(id))
}

fn parse_building_row(row: &Row<'_>) -> BuildingRepoResult<Building> {
    let building = Building {
        id: row.get("id")?,
        address: row.get("address")?,
        latitude: row.get("latitude")?,
        longitude: row.get("longitude")?,
    };
    if let Err(err) = validate_coordinates(building.latitude, building.longitude) {
        return Err(BuildingRepoError::InvalidData(format!(
            "building {} carries bad coordinates: {err}",
            building.id
        )));
    }
    Ok(building)
}

fn map_building_write_error(err: rusqlite::Error) -> BuildingRepoError {
    if err.sqlite_error_code() == Some(rusqlite::ErrorCode::ConstraintViolation) {
        return BuildingRepoError::ConstraintViolation(err.to_string());
    }
    BuildingRepoError::Db(DbError::Sqlite(err))
}
