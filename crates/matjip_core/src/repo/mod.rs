//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts per aggregate.
//! - Isolate SQLite query details from service orchestration.
//! - Translate SQLite constraint failures into semantic errors.
//!
//! # Invariants
//! - Every write path calls the entity's `validate()` before SQL mutations.
//! - Read paths reject invalid persisted state instead of masking it.
//! - Repositories are only constructed over migrated connections.

use crate::db::migrations::{current_user_version, latest_version};
use crate::db::DbError;
use crate::model::restaurant::RestaurantId;
use crate::model::validation::ValidationError;
use rusqlite::types::Value;
use rusqlite::{ffi, Connection, Row};
use rust_decimal::Decimal;
use std::str::FromStr;
use thiserror::Error;

pub mod article_repo;
pub mod catalog_repo;
pub mod image_repo;
pub mod menu_repo;
pub mod region_repo;
pub mod restaurant_repo;
pub mod review_repo;

/// SQL expression for the current time in epoch milliseconds.
pub(crate) const NOW_MS_SQL: &str = "(strftime('%s', 'now') * 1000)";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error shared by every aggregate.
#[derive(Debug, Error)]
pub enum RepoError {
    /// One or more fields violate their column declaration.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// A unique constraint rejected the write.
    #[error("{entity} with the same {fields} already exists")]
    Unique {
        entity: &'static str,
        fields: &'static str,
    },
    /// The restaurant already holds a representative image.
    #[error("restaurant {restaurant_id} already has a representative image")]
    RepresentativeImageConflict { restaurant_id: RestaurantId },
    /// A foreign key points at a row that does not exist.
    #[error("{entity} references a row that does not exist")]
    MissingReference { entity: &'static str },
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: i64 },
    /// Update/delete was called with a record that was never persisted.
    #[error("{entity} has not been saved yet")]
    Unsaved { entity: &'static str },
    #[error("repository requires schema version {expected_version}, got {actual_version}")]
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    #[error("repository requires table `{0}`")]
    MissingRequiredTable(&'static str),
    #[error("invalid persisted data: {0}")]
    InvalidData(String),
    #[error(transparent)]
    Db(#[from] DbError),
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl RepoError {
    /// Classifies a failed write. Unique and foreign-key failures become
    /// semantic errors, everything else stays a database error.
    pub(crate) fn from_write(
        err: rusqlite::Error,
        entity: &'static str,
        unique_fields: &'static str,
    ) -> Self {
        if let rusqlite::Error::SqliteFailure(failure, _) = &err {
            match failure.extended_code {
                ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                    return Self::Unique {
                        entity,
                        fields: unique_fields,
                    };
                }
                ffi::SQLITE_CONSTRAINT_FOREIGNKEY => return Self::MissingReference { entity },
                _ => {}
            }
        }
        err.into()
    }
}

/// Pagination options shared by list queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Page {
    pub limit: Option<u32>,
    pub offset: u32,
}

impl Page {
    pub fn new(limit: u32, offset: u32) -> Self {
        Self {
            limit: Some(limit),
            offset,
        }
    }

    pub(crate) fn push_sql(&self, sql: &mut String, bind_values: &mut Vec<Value>) {
        if let Some(limit) = self.limit {
            sql.push_str(" LIMIT ?");
            bind_values.push(Value::Integer(i64::from(limit)));
            if self.offset > 0 {
                sql.push_str(" OFFSET ?");
                bind_values.push(Value::Integer(i64::from(self.offset)));
            }
        } else if self.offset > 0 {
            sql.push_str(" LIMIT -1 OFFSET ?");
            bind_values.push(Value::Integer(i64::from(self.offset)));
        }
    }
}

/// Verifies the connection is migrated and exposes `tables`.
pub(crate) fn ensure_connection_ready(
    conn: &Connection,
    tables: &[&'static str],
) -> RepoResult<()> {
    let actual_version = current_user_version(conn)?;
    let expected_version = latest_version();
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for table in tables {
        if !table_exists(conn, table)? {
            return Err(RepoError::MissingRequiredTable(table));
        }
    }
    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
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

pub(crate) fn require_id(id: Option<i64>, entity: &'static str) -> RepoResult<i64> {
    id.ok_or(RepoError::Unsaved { entity })
}

pub(crate) fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

pub(crate) fn parse_bool(row: &Row<'_>, column: &str) -> RepoResult<bool> {
    match row.get::<_, i64>(column)? {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid boolean `{other}` in column {column}"
        ))),
    }
}

pub(crate) fn parse_decimal(row: &Row<'_>, column: &str) -> RepoResult<Decimal> {
    let text: String = row.get(column)?;
    Decimal::from_str(&text).map_err(|_| {
        RepoError::InvalidData(format!("invalid decimal `{text}` in column {column}"))
    })
}

pub(crate) fn parse_u32(row: &Row<'_>, column: &str) -> RepoResult<u32> {
    let value: i64 = row.get(column)?;
    u32::try_from(value).map_err(|_| {
        RepoError::InvalidData(format!("value `{value}` out of range in column {column}"))
    })
}

pub(crate) fn parse_optional_u32(row: &Row<'_>, column: &str) -> RepoResult<Option<u32>> {
    match row.get::<_, Option<i64>>(column)? {
        Some(value) => u32::try_from(value).map(Some).map_err(|_| {
            RepoError::InvalidData(format!("value `{value}` out of range in column {column}"))
        }),
        None => Ok(None),
    }
}

/// Runs `delete_sql` with one id parameter and maps zero changes to `NotFound`.
pub(crate) fn delete_by_id(
    conn: &Connection,
    delete_sql: &str,
    entity: &'static str,
    id: i64,
) -> RepoResult<()> {
    let changed = conn.execute(delete_sql, [id])?;
    if changed == 0 {
        return Err(RepoError::NotFound { entity, id });
    }
    Ok(())
}
