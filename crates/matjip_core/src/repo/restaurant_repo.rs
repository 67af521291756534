//! Restaurant repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD and filtered listing over the `restaurants` aggregate root.
//! - Own restaurant ↔ tag link replacement with atomic semantics.
//!
//! # Invariants
//! - Write paths call `Restaurant::validate()` before SQL mutations.
//! - Decimal columns are stored as fixed-scale text (`37.500000000000`).
//! - `set_restaurant_tags` replaces the whole tag set in one transaction;
//!   `create_restaurant` and `update_restaurant` write the row and its tag set
//!   together.
//! - Deleting a restaurant cascades to images, menus, reviews, review images
//!   and tag links through foreign keys.

use crate::model::catalog::{CategoryId, Tag, TagId};
use crate::model::region::RegionId;
use crate::model::restaurant::{Restaurant, RestaurantId, COORDINATE, RATING};
use crate::repo::catalog_repo::tag_from_row;
use crate::repo::{
    bool_to_int, ensure_connection_ready, parse_bool, parse_decimal, parse_u32, require_id, Page,
    RepoError, RepoResult,
};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row, Transaction, TransactionBehavior};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::collections::BTreeSet;

pub(crate) const RESTAURANT_SELECT_SQL: &str = "SELECT
    id,
    name,
    branch_name,
    description,
    address,
    feature,
    is_closed,
    latitude,
    longitude,
    phone,
    rating,
    rating_count,
    start_time,
    end_time,
    last_order_time,
    category_id,
    region_id
FROM restaurants";

const REQUIRED_TABLES: &[&str] = &["restaurants", "restaurant_tags", "tags"];

/// Inclusive latitude/longitude box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeoBounds {
    pub min_latitude: Decimal,
    pub max_latitude: Decimal,
    pub min_longitude: Decimal,
    pub max_longitude: Decimal,
}

/// Filter options for restaurant listing. Empty filters match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestaurantListQuery {
    /// Substring of `name` or `branch_name`.
    pub name: Option<String>,
    /// Substring of `address`.
    pub address: Option<String>,
    pub region_id: Option<RegionId>,
    pub category_id: Option<CategoryId>,
    pub tag_id: Option<TagId>,
    pub bounds: Option<GeoBounds>,
    /// Closed restaurants are hidden unless set.
    pub include_closed: bool,
    pub page: Page,
}

/// Repository interface for restaurants and their tag links.
pub trait RestaurantRepository {
    /// Inserts the restaurant and links `tag_ids`; returns the new id.
    fn create_restaurant(&self, restaurant: &Restaurant) -> RepoResult<RestaurantId>;
    /// Replaces all columns and the tag set with `restaurant.tag_ids`.
    fn update_restaurant(&self, restaurant: &Restaurant) -> RepoResult<()>;
    fn get_restaurant(&self, id: RestaurantId) -> RepoResult<Option<Restaurant>>;
    /// Lists restaurants ordered by `name ASC, id ASC`.
    fn list_restaurants(&self, query: &RestaurantListQuery) -> RepoResult<Vec<Restaurant>>;
    /// Deletes the restaurant and everything it owns.
    fn delete_restaurant(&self, id: RestaurantId) -> RepoResult<()>;
    /// Replaces all tag links of one restaurant in a single transaction.
    fn set_restaurant_tags(&self, id: RestaurantId, tag_ids: &[TagId]) -> RepoResult<()>;
    /// Tags linked to one restaurant, sorted by name.
    fn list_restaurant_tags(&self, id: RestaurantId) -> RepoResult<Vec<Tag>>;
}

/// SQLite-backed restaurant repository.
pub struct SqliteRestaurantRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteRestaurantRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, REQUIRED_TABLES)?;
        Ok(Self { conn })
    }
}

impl RestaurantRepository for SqliteRestaurantRepository<'_> {
    fn create_restaurant(&self, restaurant: &Restaurant) -> RepoResult<RestaurantId> {
        restaurant.validate()?;

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        tx.execute(
            "INSERT INTO restaurants (
                name,
                branch_name,
                description,
                address,
                feature,
                is_closed,
                latitude,
                longitude,
                phone,
                rating,
                rating_count,
                start_time,
                end_time,
                last_order_time,
                category_id,
                region_id
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16);",
            params![
                restaurant.name.as_str(),
                restaurant.branch_name.as_deref(),
                restaurant.description.as_deref(),
                restaurant.address.as_str(),
                restaurant.feature.as_deref(),
                bool_to_int(restaurant.is_closed),
                COORDINATE.format(restaurant.latitude),
                COORDINATE.format(restaurant.longitude),
                restaurant.phone.as_str(),
                RATING.format(restaurant.rating),
                restaurant.rating_count,
                restaurant.start_time,
                restaurant.end_time,
                restaurant.last_order_time,
                restaurant.category_id,
                restaurant.region_id,
            ],
        )
        .map_err(|err| RepoError::from_write(err, "restaurant", "id"))?;
        let id = tx.last_insert_rowid();

        replace_tags_in_tx(&tx, id, &restaurant.tag_ids)?;
        tx.commit()?;
        Ok(id)
    }

    fn update_restaurant(&self, restaurant: &Restaurant) -> RepoResult<()> {
        restaurant.validate()?;
        let id = require_id(restaurant.id, "restaurant")?;

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let changed = tx
            .execute(
                "UPDATE restaurants
                 SET
                    name = ?2,
                    branch_name = ?3,
                    description = ?4,
                    address = ?5,
                    feature = ?6,
                    is_closed = ?7,
                    latitude = ?8,
                    longitude = ?9,
                    phone = ?10,
                    rating = ?11,
                    rating_count = ?12,
                    start_time = ?13,
                    end_time = ?14,
                    last_order_time = ?15,
                    category_id = ?16,
                    region_id = ?17
                 WHERE id = ?1;",
                params![
                    id,
                    restaurant.name.as_str(),
                    restaurant.branch_name.as_deref(),
                    restaurant.description.as_deref(),
                    restaurant.address.as_str(),
                    restaurant.feature.as_deref(),
                    bool_to_int(restaurant.is_closed),
                    COORDINATE.format(restaurant.latitude),
                    COORDINATE.format(restaurant.longitude),
                    restaurant.phone.as_str(),
                    RATING.format(restaurant.rating),
                    restaurant.rating_count,
                    restaurant.start_time,
                    restaurant.end_time,
                    restaurant.last_order_time,
                    restaurant.category_id,
                    restaurant.region_id,
                ],
            )
            .map_err(|err| RepoError::from_write(err, "restaurant", "id"))?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "restaurant",
                id,
            });
        }

        replace_tags_in_tx(&tx, id, &restaurant.tag_ids)?;
        tx.commit()?;
        Ok(())
    }

    fn get_restaurant(&self, id: RestaurantId) -> RepoResult<Option<Restaurant>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{RESTAURANT_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            let mut restaurant = restaurant_from_row(row)?;
            restaurant.tag_ids = load_tag_ids(self.conn, id)?;
            return Ok(Some(restaurant));
        }
        Ok(None)
    }

    fn list_restaurants(&self, query: &RestaurantListQuery) -> RepoResult<Vec<Restaurant>> {
        let mut sql = format!("{RESTAURANT_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if !query.include_closed {
            sql.push_str(" AND is_closed = 0");
        }
        if let Some(name) = query.name.as_ref() {
            sql.push_str(" AND (instr(name, ?) > 0 OR instr(COALESCE(branch_name, ''), ?) > 0)");
            bind_values.push(Value::Text(name.clone()));
            bind_values.push(Value::Text(name.clone()));
        }
        if let Some(address) = query.address.as_ref() {
            sql.push_str(" AND instr(address, ?) > 0");
            bind_values.push(Value::Text(address.clone()));
        }
        if let Some(region_id) = query.region_id {
            sql.push_str(" AND region_id = ?");
            bind_values.push(Value::Integer(region_id));
        }
        if let Some(category_id) = query.category_id {
            sql.push_str(" AND category_id = ?");
            bind_values.push(Value::Integer(category_id));
        }
        if let Some(tag_id) = query.tag_id {
            sql.push_str(
                " AND EXISTS (
                    SELECT 1
                    FROM restaurant_tags rt
                    WHERE rt.restaurant_id = restaurants.id
                      AND rt.tag_id = ?
                )",
            );
            bind_values.push(Value::Integer(tag_id));
        }
        if let Some(bounds) = query.bounds {
            sql.push_str(
                " AND CAST(latitude AS REAL) BETWEEN ? AND ?
                  AND CAST(longitude AS REAL) BETWEEN ? AND ?",
            );
            for value in [
                bounds.min_latitude,
                bounds.max_latitude,
                bounds.min_longitude,
                bounds.max_longitude,
            ] {
                bind_values.push(Value::Real(decimal_to_f64(value)?));
            }
        }

        sql.push_str(" ORDER BY name ASC, id ASC");
        query.page.push_sql(&mut sql, &mut bind_values);

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut restaurants = Vec::new();
        while let Some(row) = rows.next()? {
            let mut restaurant = restaurant_from_row(row)?;
            if let Some(id) = restaurant.id {
                restaurant.tag_ids = load_tag_ids(self.conn, id)?;
            }
            restaurants.push(restaurant);
        }
        Ok(restaurants)
    }

    fn delete_restaurant(&self, id: RestaurantId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM restaurants WHERE id = ?1;", [id])?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "restaurant",
                id,
            });
        }
        Ok(())
    }

    fn set_restaurant_tags(&self, id: RestaurantId, tag_ids: &[TagId]) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let exists: i64 = tx.query_row(
            "SELECT EXISTS(SELECT 1 FROM restaurants WHERE id = ?1);",
            [id],
            |row| row.get(0),
        )?;
        if exists == 0 {
            return Err(RepoError::NotFound {
                entity: "restaurant",
                id,
            });
        }

        replace_tags_in_tx(&tx, id, tag_ids)?;
        tx.commit()?;
        Ok(())
    }

    fn list_restaurant_tags(&self, id: RestaurantId) -> RepoResult<Vec<Tag>> {
        let mut stmt = self.conn.prepare(
            "SELECT t.id, t.name
             FROM restaurant_tags rt
             INNER JOIN tags t ON t.id = rt.tag_id
             WHERE rt.restaurant_id = ?1
             ORDER BY t.name ASC;",
        )?;
        let mut rows = stmt.query([id])?;
        let mut tags = Vec::new();
        while let Some(row) = rows.next()? {
            tags.push(tag_from_row(row)?);
        }
        Ok(tags)
    }
}

fn replace_tags_in_tx(
    tx: &Transaction<'_>,
    restaurant_id: RestaurantId,
    tag_ids: &[TagId],
) -> RepoResult<()> {
    tx.execute(
        "DELETE FROM restaurant_tags WHERE restaurant_id = ?1;",
        [restaurant_id],
    )?;

    let unique: BTreeSet<TagId> = tag_ids.iter().copied().collect();
    for tag_id in unique {
        tx.execute(
            "INSERT INTO restaurant_tags (restaurant_id, tag_id) VALUES (?1, ?2);",
            params![restaurant_id, tag_id],
        )
        .map_err(|err| RepoError::from_write(err, "restaurant tag", "restaurant and tag"))?;
    }
    Ok(())
}

pub(crate) fn load_tag_ids(conn: &Connection, restaurant_id: RestaurantId) -> RepoResult<Vec<TagId>> {
    let mut stmt = conn.prepare(
        "SELECT tag_id
         FROM restaurant_tags
         WHERE restaurant_id = ?1
         ORDER BY tag_id ASC;",
    )?;
    let mut rows = stmt.query([restaurant_id])?;
    let mut tag_ids = Vec::new();
    while let Some(row) = rows.next()? {
        tag_ids.push(row.get(0)?);
    }
    Ok(tag_ids)
}

/// Parses one row selected with `RESTAURANT_SELECT_SQL`. Tag ids are left
/// empty; callers load them separately.
pub(crate) fn restaurant_from_row(row: &Row<'_>) -> RepoResult<Restaurant> {
    let restaurant = Restaurant {
        id: Some(row.get("id")?),
        name: row.get("name")?,
        branch_name: row.get("branch_name")?,
        description: row.get("description")?,
        address: row.get("address")?,
        feature: row.get("feature")?,
        is_closed: parse_bool(row, "is_closed")?,
        latitude: parse_decimal(row, "latitude")?,
        longitude: parse_decimal(row, "longitude")?,
        phone: row.get("phone")?,
        rating: parse_decimal(row, "rating")?,
        rating_count: parse_u32(row, "rating_count")?,
        start_time: row.get("start_time")?,
        end_time: row.get("end_time")?,
        last_order_time: row.get("last_order_time")?,
        category_id: row.get("category_id")?,
        region_id: row.get("region_id")?,
        tag_ids: Vec::new(),
    };
    Ok(restaurant)
}

fn decimal_to_f64(value: Decimal) -> RepoResult<f64> {
    value
        .to_f64()
        .ok_or_else(|| RepoError::InvalidData(format!("coordinate `{value}` is not representable")))
}
