//! Organization repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD and lookup APIs over `organizations` and its relations.
//! - Assemble the read model (organization + building + activities) so
//!   callers never issue follow-up queries.
//!
//! # Invariants
//! - Phones keep caller order via the `position` column.
//! - Attached activities are sorted by id; listings are sorted by
//!   organization id.
//! - Phone and activity-link replacement happens inside one immediate
//!   transaction together with the column update.

use crate::db::DbError;
use crate::geo::BoundingBox;
use crate::model::activity::{Activity, ActivityId};
use crate::model::building::{Building, BuildingId};
use crate::model::organization::{Organization, OrganizationId};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row, Transaction, TransactionBehavior};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

const ORGANIZATION_SELECT_SQL: &str = "SELECT
    id,
    name,
    building_id
FROM organizations";

/// Result type used by organization repository operations.
pub type OrganizationRepoResult<T> = Result<T, OrganizationRepoError>;

/// Errors from organization repository operations.
#[derive(Debug)]
pub enum OrganizationRepoError {
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Target organization does not exist.
    OrganizationNotFound(OrganizationId),
    /// Store-level uniqueness or reference constraint rejected the write.
    ConstraintViolation(String),
    /// Persisted data cannot be converted to a valid read model.
    InvalidData(String),
}

impl Display for OrganizationRepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::OrganizationNotFound(id) => write!(f, "organization not found: {id}"),
            Self::ConstraintViolation(message) => {
                write!(f, "organization constraint violation: {message}")
            }
            Self::InvalidData(message) => write!(f, "invalid organization data: {message}"),
        }
    }
}

impl Error for OrganizationRepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::OrganizationNotFound(_) => None,
            Self::ConstraintViolation(_) => None,
            Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for OrganizationRepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for OrganizationRepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Read model for organization detail/list use-cases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrganizationRecord {
    /// The organization itself, phones attached in stored order.
    pub organization: Organization,
    /// Housing building, present when `building_id` is set.
    pub building: Option<Building>,
    /// Tagged activities, sorted by id.
    pub activities: Vec<Activity>,
}

/// Repository interface for organization persistence and lookups.
pub trait OrganizationRepository {
    /// Inserts one organization with phones and activity links atomically.
    fn create_organization(
        &self,
        name: &str,
        phones: &[String],
        building_id: Option<BuildingId>,
        activity_ids: &[ActivityId],
    ) -> OrganizationRepoResult<OrganizationRecord>;
    /// Applies the provided fields to one organization.
    ///
    /// `None` leaves a field as is. `activity_ids` given as an empty slice
    /// clears all links, which is distinct from `None`.
    fn update_organization(
        &self,
        id: OrganizationId,
        name: Option<&str>,
        phones: Option<&[String]>,
        building_id: Option<BuildingId>,
        activity_ids: Option<&[ActivityId]>,
    ) -> OrganizationRepoResult<OrganizationRecord>;
    /// Loads one organization with its relations.
    fn get_organization(
        &self,
        id: OrganizationId,
    ) -> OrganizationRepoResult<Option<OrganizationRecord>>;
    /// Lists every organization with relations attached.
    fn list_organizations(&self) -> OrganizationRepoResult<Vec<OrganizationRecord>>;
    /// Deletes one organization; phones and links go with it.
    fn delete_organization(&self, id: OrganizationId) -> OrganizationRepoResult<()>;
    /// Lists organizations housed in one building.
    fn find_by_building(
        &self,
        building_id: BuildingId,
    ) -> OrganizationRepoResult<Vec<OrganizationRecord>>;
    /// Lists organizations tagged with any of the given activities, each
    /// organization at most once.
    fn find_by_activities(
        &self,
        activity_ids: &[ActivityId],
    ) -> OrganizationRepoResult<Vec<OrganizationRecord>>;
    /// Lists organizations whose building lies inside the box, bounds
    /// inclusive. Organizations without a building never match.
    fn find_in_bounds(&self, bounds: &BoundingBox)
        -> OrganizationRepoResult<Vec<OrganizationRecord>>;
}

/// SQLite-backed organization repository.
pub struct SqliteOrganizationRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteOrganizationRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl OrganizationRepository for SqliteOrganizationRepository<'_> {
    fn create_organization(
        &self,
        name: &str,
        phones: &[String],
        building_id: Option<BuildingId>,
        activity_ids: &[ActivityId],
    ) -> OrganizationRepoResult<OrganizationRecord> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        tx.execute(
            "INSERT INTO organizations (name, building_id) VALUES (?1, ?2);",
            params![name, building_id],
        )
        .map_err(map_organization_write_error)?;
        let organization_id = tx.last_insert_rowid();

        replace_phones_in_tx(&tx, organization_id, phones)?;
        replace_activity_links_in_tx(&tx, organization_id, activity_ids)?;

        tx.commit()?;
        load_required_record(self.conn, organization_id)
    }

    fn update_organization(
        &self,
        id: OrganizationId,
        name: Option<&str>,
        phones: Option<&[String]>,
        building_id: Option<BuildingId>,
        activity_ids: Option<&[ActivityId]>,
    ) -> OrganizationRepoResult<OrganizationRecord> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        if !organization_exists_in_tx(&tx, id)? {
            return Err(OrganizationRepoError::OrganizationNotFound(id));
        }

        let mut assignments: Vec<&str> = Vec::new();
        let mut bind_values: Vec<Value> = Vec::new();
        if let Some(name) = name {
            assignments.push("name = ?");
            bind_values.push(Value::Text(name.to_string()));
        }
        if let Some(building_id) = building_id {
            assignments.push("building_id = ?");
            bind_values.push(Value::Integer(building_id));
        }
        if !assignments.is_empty() {
            let sql = format!(
                "UPDATE organizations SET {} WHERE id = ?;",
                assignments.join(", ")
            );
            bind_values.push(Value::Integer(id));
            tx.execute(&sql, params_from_iter(bind_values))
                .map_err(map_organization_write_error)?;
        }

        if let Some(phones) = phones {
            replace_phones_in_tx(&tx, id, phones)?;
        }
        if let Some(activity_ids) = activity_ids {
            replace_activity_links_in_tx(&tx, id, activity_ids)?;
        }

        tx.commit()?;
        load_required_record(self.conn, id)
    }

    fn get_organization(
        &self,
        id: OrganizationId,
    ) -> OrganizationRepoResult<Option<OrganizationRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{ORGANIZATION_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        let organization = match rows.next()? {
            Some(row) => parse_organization_row(row)?,
            None => return Ok(None),
        };
        Ok(Some(load_record(self.conn, organization)?))
    }

    fn list_organizations(&self) -> OrganizationRepoResult<Vec<OrganizationRecord>> {
        let sql = format!("{ORGANIZATION_SELECT_SQL} ORDER BY id ASC;");
        self.collect_records(&sql, Vec::new())
    }

    fn delete_organization(&self, id: OrganizationId) -> OrganizationRepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM organizations WHERE id = ?1;", [id])
            .map_err(map_organization_write_error)?;
        if changed == 0 {
            return Err(OrganizationRepoError::OrganizationNotFound(id));
        }
        Ok(())
    }

    fn find_by_building(
        &self,
        building_id: BuildingId,
    ) -> OrganizationRepoResult<Vec<OrganizationRecord>> {
        let sql = format!("{ORGANIZATION_SELECT_SQL} WHERE building_id = ? ORDER BY id ASC;");
        self.collect_records(&sql, vec![Value::Integer(building_id)])
    }

    fn find_by_activities(
        &self,
        activity_ids: &[ActivityId],
    ) -> OrganizationRepoResult<Vec<OrganizationRecord>> {
        if activity_ids.is_empty() {
            return Ok(Vec::new());
        }

        let sql = format!(
            "SELECT DISTINCT
                o.id AS id,
                o.name AS name,
                o.building_id AS building_id
             FROM organizations o
             INNER JOIN organization_activities oa ON oa.organization_id = o.id
             WHERE oa.activity_id IN ({})
             ORDER BY o.id ASC;",
            id_placeholders(activity_ids.len())
        );
        let bind_values: Vec<Value> = activity_ids.iter().map(|id| Value::Integer(*id)).collect();
        self.collect_records(&sql, bind_values)
    }

    fn find_in_bounds(
        &self,
        bounds: &BoundingBox,
    ) -> OrganizationRepoResult<Vec<OrganizationRecord>> {
        let sql = "SELECT
                o.id AS id,
                o.name AS name,
                o.building_id AS building_id
             FROM organizations o
             INNER JOIN buildings b ON b.id = o.building_id
             WHERE b.latitude BETWEEN ? AND ?
               AND b.longitude BETWEEN ? AND ?
             ORDER BY o.id ASC;";
        let bind_values = vec![
            Value::Real(bounds.min_lat),
            Value::Real(bounds.max_lat),
            Value::Real(bounds.min_lon),
            Value::Real(bounds.max_lon),
        ];
        self.collect_records(sql, bind_values)
    }
}

impl SqliteOrganizationRepository<'_> {
    fn collect_records(
        &self,
        sql: &str,
        bind_values: Vec<Value>,
    ) -> OrganizationRepoResult<Vec<OrganizationRecord>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut organizations = Vec::new();
        while let Some(row) = rows.next()? {
            organizations.push(parse_organization_row(row)?);
        }

        let mut records = Vec::with_capacity(organizations.len());
        for organization in organizations {
            records.push(load_record(self.conn, organization)?);
        }
        Ok(records)
    }
}

fn replace_phones_in_tx(
    tx: &Transaction<'_>,
    organization_id: OrganizationId,
    phones: &[String],
) -> OrganizationRepoResult<()> {
    tx.execute(
        "DELETE FROM organization_phones WHERE organization_id = ?1;",
        [organization_id],
    )?;
    for (position, number) in phones.iter().enumerate() {
        tx.execute(
            "INSERT INTO organization_phones (organization_id, position, number)
             VALUES (?1, ?2, ?3);",
            params![organization_id, position as i64, number.as_str()],
        )
        .map_err(map_organization_write_error)?;
    }
    Ok(())
}

fn replace_activity_links_in_tx(
    tx: &Transaction<'_>,
    organization_id: OrganizationId,
    activity_ids: &[ActivityId],
) -> OrganizationRepoResult<()> {
    tx.execute(
        "DELETE FROM organization_activities WHERE organization_id = ?1;",
        [organization_id],
    )?;
    for activity_id in activity_ids {
        tx.execute(
            "INSERT INTO organization_activities (organization_id, activity_id)
             VALUES (?1, ?2);",
            params![organization_id, activity_id],
        )
        .map_err(map_organization_write_error)?;
    }
    Ok(())
}

fn organization_exists_in_tx(
    tx: &Transaction<'_>,
    id: OrganizationId,
) -> OrganizationRepoResult<bool> {
    let exists: i64 = tx.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM organizations
            WHERE id = ?1
        );",
        [id],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn load_required_record(
    conn: &Connection,
    id: OrganizationId,
) -> OrganizationRepoResult<OrganizationRecord> {
    let mut stmt = conn.prepare(&format!("{ORGANIZATION_SELECT_SQL} WHERE id = ?1;"))?;
    let mut rows = stmt.query([id])?;
    let organization = match rows.next()? {
        Some(row) => parse_organization_row(row)?,
        None => return Err(OrganizationRepoError::OrganizationNotFound(id)),
    };
    load_record(conn, organization)
}

fn load_record(
    conn: &Connection,
    mut organization: Organization,
) -> OrganizationRepoResult<OrganizationRecord> {
    organization.phones = load_phones_for_organization(conn, organization.id)?;
    let building = match organization.building_id {
        Some(building_id) => Some(load_building_for_record(conn, building_id)?),
        None => None,
    };
    let activities = load_activities_for_organization(conn, organization.id)?;
    Ok(OrganizationRecord {
        organization,
        building,
        activities,
    })
}

fn load_phones_for_organization(
    conn: &Connection,
    organization_id: OrganizationId,
) -> OrganizationRepoResult<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT number
         FROM organization_phones
         WHERE organization_id = ?1
         ORDER BY position ASC;",
    )?;
    let mut rows = stmt.query([organization_id])?;
    let mut phones = Vec::new();
    while let Some(row) = rows.next()? {
        let value: String = row.get(0)?;
        phones.push(value);
    }
    Ok(phones)
}

fn load_activities_for_organization(
    conn: &Connection,
    organization_id: OrganizationId,
) -> OrganizationRepoResult<Vec<Activity>> {
    let mut stmt = conn.prepare(
        "SELECT
            a.id AS id,
            a.name AS name,
            a.parent_id AS parent_id
         FROM organization_activities oa
         INNER JOIN activities a ON a.id = oa.activity_id
         WHERE oa.organization_id = ?1
         ORDER BY a.id ASC;",
    )?;
    let mut rows = stmt.query([organization_id])?;
    let mut activities = Vec::new();
    while let Some(row) = rows.next()? {
        activities.push(Activity {
            id: row.get("id")?,
            name: row.get("name")?,
            parent_id: row.get("parent_id")?,
        });
    }
    Ok(activities)
}

fn load_building_for_record(
    conn: &Connection,
    building_id: BuildingId,
) -> OrganizationRepoResult<Building> {
    let mut stmt = conn.prepare(
        "SELECT
            id,
            address,
            latitude,
            longitude
         FROM buildings
         WHERE id = ?1;",
    )?;
    let mut rows = stmt.query([building_id])?;
    if let Some(row) = rows.next()? {
        return Ok(Building {
            id: row.get("id")?,
            address: row.get("address")?,
            latitude: row.get("latitude")?,
            longitude: row.get("longitude")?,
        });
    }
    Err(OrganizationRepoError::InvalidData(format!(
        "organization references missing building {building_id}"
    )))
}

fn parse_organization_row(row: &Row<'_>) -> OrganizationRepoResult<Organization> {
    Ok(Organization {
        id: row.get("id")?,
        name: row.get("name")?,
        phones: Vec::new(),
        building_id: row.get("building_id")?,
    })
}

fn id_placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

fn map_organization_write_error(err: rusqlite::Error) -> OrganizationRepoError {
    if err.sqlite_error_code() == Some(rusqlite::ErrorCode::ConstraintViolation) {
        return OrganizationRepoError::ConstraintViolation(err.to_string());
    }
    OrganizationRepoError::Db(DbError::Sqlite(err))
}
