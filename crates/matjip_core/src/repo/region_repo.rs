//! Region repository contracts and SQLite implementation.
//!
//! # Invariants
//! - `(sido, sigungu, eupmyeondong)` is unique; duplicates surface as
//!   `RepoError::Unique`.
//! - Deleting a region keeps its restaurants and clears their `region_id`.

use crate::model::region::{Region, RegionId};
use crate::model::restaurant::Restaurant;
use crate::repo::restaurant_repo::{load_tag_ids, restaurant_from_row, RESTAURANT_SELECT_SQL};
use crate::repo::{delete_by_id, ensure_connection_ready, require_id, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row};

const REGION_UNIQUE_FIELDS: &str = "sido, sigungu and eupmyeondong";
const REQUIRED_TABLES: &[&str] = &["regions", "restaurants"];

/// Repository interface for administrative regions.
pub trait RegionRepository {
    fn create_region(&self, region: &Region) -> RepoResult<RegionId>;
    fn update_region(&self, region: &Region) -> RepoResult<()>;
    fn get_region(&self, id: RegionId) -> RepoResult<Option<Region>>;
    /// Looks up the region matching all three levels exactly.
    fn find_region(
        &self,
        sido: &str,
        sigungu: &str,
        eupmyeondong: &str,
    ) -> RepoResult<Option<Region>>;
    /// Lists regions, optionally within one province, sorted by the three
    /// levels.
    fn list_regions(&self, sido: Option<&str>) -> RepoResult<Vec<Region>>;
    fn delete_region(&self, id: RegionId) -> RepoResult<()>;
    /// Reverse lookup: every restaurant that references the region.
    fn restaurants_in_region(&self, id: RegionId) -> RepoResult<Vec<Restaurant>>;
}

/// SQLite-backed region repository.
pub struct SqliteRegionRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteRegionRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, REQUIRED_TABLES)?;
        Ok(Self { conn })
    }
}

impl RegionRepository for SqliteRegionRepository<'_> {
    fn create_region(&self, region: &Region) -> RepoResult<RegionId> {
        region.validate()?;
        self.conn
            .execute(
                "INSERT INTO regions (sido, sigungu, eupmyeondong) VALUES (?1, ?2, ?3);",
                params![
                    region.sido.as_str(),
                    region.sigungu.as_str(),
                    region.eupmyeondong.as_str()
                ],
            )
            .map_err(|err| RepoError::from_write(err, "region", REGION_UNIQUE_FIELDS))?;
        Ok(self.conn.last_insert_rowid())
    }

    fn update_region(&self, region: &Region) -> RepoResult<()> {
        region.validate()?;
        let id = require_id(region.id, "region")?;
        let changed = self
            .conn
            .execute(
                "UPDATE regions
                 SET sido = ?2, sigungu = ?3, eupmyeondong = ?4
                 WHERE id = ?1;",
                params![
                    id,
                    region.sido.as_str(),
                    region.sigungu.as_str(),
                    region.eupmyeondong.as_str()
                ],
            )
            .map_err(|err| RepoError::from_write(err, "region", REGION_UNIQUE_FIELDS))?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "region",
                id,
            });
        }
        Ok(())
    }

    fn get_region(&self, id: RegionId) -> RepoResult<Option<Region>> {
        let found = self
            .conn
            .query_row(
                "SELECT id, sido, sigungu, eupmyeondong FROM regions WHERE id = ?1;",
                [id],
                region_from_row,
            )
            .optional()?;
        Ok(found)
    }

    fn find_region(
        &self,
        sido: &str,
        sigungu: &str,
        eupmyeondong: &str,
    ) -> RepoResult<Option<Region>> {
        let found = self
            .conn
            .query_row(
                "SELECT id, sido, sigungu, eupmyeondong
                 FROM regions
                 WHERE sido = ?1 AND sigungu = ?2 AND eupmyeondong = ?3;",
                params![sido, sigungu, eupmyeondong],
                region_from_row,
            )
            .optional()?;
        Ok(found)
    }

    fn list_regions(&self, sido: Option<&str>) -> RepoResult<Vec<Region>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, sido, sigungu, eupmyeondong
             FROM regions
             WHERE (?1 IS NULL OR sido = ?1)
             ORDER BY sido ASC, sigungu ASC, eupmyeondong ASC;",
        )?;
        let mut rows = stmt.query([sido])?;
        let mut regions = Vec::new();
        while let Some(row) = rows.next()? {
            regions.push(region_from_row(row)?);
        }
        Ok(regions)
    }

    fn delete_region(&self, id: RegionId) -> RepoResult<()> {
        delete_by_id(
            self.conn,
            "DELETE FROM regions WHERE id = ?1;",
            "region",
            id,
        )
    }

    fn restaurants_in_region(&self, id: RegionId) -> RepoResult<Vec<Restaurant>> {
        let mut stmt = self.conn.prepare(&format!(
            "{RESTAURANT_SELECT_SQL}
             WHERE region_id = ?1
             ORDER BY name ASC, id ASC;"
        ))?;
        let mut rows = stmt.query([id])?;
        let mut restaurants = Vec::new();
        while let Some(row) = rows.next()? {
            let mut restaurant = restaurant_from_row(row)?;
            if let Some(restaurant_id) = restaurant.id {
                restaurant.tag_ids = load_tag_ids(self.conn, restaurant_id)?;
            }
            restaurants.push(restaurant);
        }
        Ok(restaurants)
    }
}

fn region_from_row(row: &Row<'_>) -> rusqlite::Result<Region> {
    Ok(Region {
        id: Some(row.get("id")?),
        sido: row.get("sido")?,
        sigungu: row.get("sigungu")?,
        eupmyeondong: row.get("eupmyeondong")?,
    })
}
