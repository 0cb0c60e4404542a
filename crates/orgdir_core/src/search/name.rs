//! Substring search over organization names.
//!
//! # Responsibility
//! - Provide name lookup without loading the full organization read model.
//! - Return typed hits with stable ids.
//!
//! # Invariants
//! - Matching folds case for ASCII only; SQLite `LIKE` compares non-ASCII
//!   text case-sensitively without ICU.
//! - Result ordering is deterministic: name (NOCASE), then id.

use crate::db::DbError;
use crate::model::building::BuildingId;
use crate::model::organization::OrganizationId;
use rusqlite::{params, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Result type for search APIs.
pub type SearchResult<T> = Result<T, SearchError>;

/// Search-layer error for DB interaction.
#[derive(Debug)]
pub enum SearchError {
    Db(DbError),
}

impl Display for SearchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SearchError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
        }
    }
}

impl From<DbError> for SearchError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for SearchError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Options for a name substring search.
#[derive(Debug, Clone)]
pub struct NameQuery {
    /// Substring to look for anywhere in the organization name.
    pub fragment: String,
    /// Maximum number of hits to return.
    pub limit: u32,
}

impl NameQuery {
    /// Creates a query with the default limit.
    pub fn new(fragment: impl Into<String>) -> Self {
        Self {
            fragment: fragment.into(),
            limit: 20,
        }
    }
}

/// Single hit returned by [`search_organizations`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrganizationHit {
    pub organization_id: OrganizationId,
    pub name: String,
    pub building_id: Option<BuildingId>,
}

/// Searches organizations by name fragment.
///
/// Returns an empty list for blank fragments and for `limit == 0`. `%`, `_`
/// and `\` in the fragment are treated literally, not as wildcards.
pub fn search_organizations(
    conn: &Connection,
    query: &NameQuery,
) -> SearchResult<Vec<OrganizationHit>> {
    let fragment = query.fragment.trim();
    if fragment.is_empty() || query.limit == 0 {
        return Ok(Vec::new());
    }

    let pattern = format!("%{}%", escape_like_fragment(fragment));
    let mut stmt = conn.prepare(
        "SELECT
            id,
            name,
            building_id
         FROM organizations
         WHERE name LIKE ?1 ESCAPE '\\'
         ORDER BY name COLLATE NOCASE ASC, id ASC
         LIMIT ?2;",
    )?;
    let mut rows = stmt.query(params![pattern, i64::from(query.limit)])?;
    let mut hits = Vec::new();
    while let Some(row) = rows.next()? {
        hits.push(parse_organization_hit(row)?);
    }
    Ok(hits)
}

fn parse_organization_hit(row: &Row<'_>) -> SearchResult<OrganizationHit> {
    Ok(OrganizationHit {
        organization_id: row.get("id")?,
        name: row.get("name")?,
        building_id: row.get("building_id")?,
    })
}

fn escape_like_fragment(raw: &str) -> String {
    raw.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}
