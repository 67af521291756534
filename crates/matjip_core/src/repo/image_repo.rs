//! Restaurant image repository and the representative-image rule.
//!
//! # Responsibility
//! - Persist restaurant gallery images.
//! - Enforce "at most one representative image per restaurant" on the
//!   checked write path.
//!
//! # Invariants
//! - `create_image` / `update_image` run single-row validation only. They are
//!   the low-level path and can leave a restaurant with several
//!   representative images.
//! - `save_image_checked` runs validation, the representative check and the
//!   write inside one `BEGIN IMMEDIATE` transaction, so concurrent checked
//!   writers cannot both pass the check.
//! - The check excludes the candidate itself by id, so re-saving the current
//!   representative image succeeds.

use crate::model::media::{RestaurantImage, RestaurantImageId};
use crate::model::restaurant::RestaurantId;
use crate::repo::{
    bool_to_int, delete_by_id, ensure_connection_ready, parse_bool, parse_optional_u32,
    require_id, RepoError, RepoResult, NOW_MS_SQL,
};
use log::warn;
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};

const IMAGE_SELECT_SQL: &str = "SELECT
    id,
    restaurant_id,
    is_representative,
    display_order,
    name,
    image,
    created_at,
    updated_at
FROM restaurant_images";

const REQUIRED_TABLES: &[&str] = &["restaurant_images", "restaurants"];

/// Repository interface for restaurant gallery images.
pub trait RestaurantImageRepository {
    /// Inserts without the representative check.
    fn create_image(&self, image: &RestaurantImage) -> RepoResult<RestaurantImageId>;
    /// Updates without the representative check.
    fn update_image(&self, image: &RestaurantImage) -> RepoResult<()>;
    /// Rejects `image` when it is representative and another image of the
    /// same restaurant already is.
    fn clean_image(&self, image: &RestaurantImage) -> RepoResult<()>;
    /// Validated write: inserts when `image.id` is `None`, updates otherwise.
    fn save_image_checked(&self, image: &RestaurantImage) -> RepoResult<RestaurantImageId>;
    fn get_image(&self, id: RestaurantImageId) -> RepoResult<Option<RestaurantImage>>;
    /// Gallery order: `display_order ASC` (unordered last), then id.
    fn list_images(&self, restaurant_id: RestaurantId) -> RepoResult<Vec<RestaurantImage>>;
    /// The representative image, or the oldest one if unchecked writes left
    /// several.
    fn representative_image(
        &self,
        restaurant_id: RestaurantId,
    ) -> RepoResult<Option<RestaurantImage>>;
    fn delete_image(&self, id: RestaurantImageId) -> RepoResult<()>;
}

/// SQLite-backed restaurant image repository.
pub struct SqliteRestaurantImageRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteRestaurantImageRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, REQUIRED_TABLES)?;
        Ok(Self { conn })
    }
}

impl RestaurantImageRepository for SqliteRestaurantImageRepository<'_> {
    fn create_image(&self, image: &RestaurantImage) -> RepoResult<RestaurantImageId> {
        image.validate()?;
        insert_image(self.conn, image)
    }

    fn update_image(&self, image: &RestaurantImage) -> RepoResult<()> {
        image.validate()?;
        update_image_row(self.conn, image)
    }

    fn clean_image(&self, image: &RestaurantImage) -> RepoResult<()> {
        check_representative(self.conn, image)
    }

    fn save_image_checked(&self, image: &RestaurantImage) -> RepoResult<RestaurantImageId> {
        image.validate()?;

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        check_representative(&tx, image)?;
        let id = match image.id {
            Some(id) => {
                update_image_row(&tx, image)?;
                id
            }
            None => insert_image(&tx, image)?,
        };
        tx.commit()?;
        Ok(id)
    }

    fn get_image(&self, id: RestaurantImageId) -> RepoResult<Option<RestaurantImage>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{IMAGE_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(image_from_row(row)?));
        }
        Ok(None)
    }

    fn list_images(&self, restaurant_id: RestaurantId) -> RepoResult<Vec<RestaurantImage>> {
        let mut stmt = self.conn.prepare(&format!(
            "{IMAGE_SELECT_SQL}
             WHERE restaurant_id = ?1
             ORDER BY display_order IS NULL, display_order ASC, id ASC;"
        ))?;
        let mut rows = stmt.query([restaurant_id])?;
        let mut images = Vec::new();
        while let Some(row) = rows.next()? {
            images.push(image_from_row(row)?);
        }
        Ok(images)
    }

    fn representative_image(
        &self,
        restaurant_id: RestaurantId,
    ) -> RepoResult<Option<RestaurantImage>> {
        let mut stmt = self.conn.prepare(&format!(
            "{IMAGE_SELECT_SQL}
             WHERE restaurant_id = ?1 AND is_representative = 1
             ORDER BY id ASC
             LIMIT 1;"
        ))?;
        let mut rows = stmt.query([restaurant_id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(image_from_row(row)?));
        }
        Ok(None)
    }

    fn delete_image(&self, id: RestaurantImageId) -> RepoResult<()> {
        delete_by_id(
            self.conn,
            "DELETE FROM restaurant_images WHERE id = ?1;",
            "restaurant image",
            id,
        )
    }
}

fn check_representative(conn: &Connection, image: &RestaurantImage) -> RepoResult<()> {
    if !image.is_representative {
        return Ok(());
    }

    let others: i64 = conn.query_row(
        "SELECT COUNT(*)
         FROM restaurant_images
         WHERE restaurant_id = ?1
           AND is_representative = 1
           AND (?2 IS NULL OR id <> ?2);",
        params![image.restaurant_id, image.id],
        |row| row.get(0),
    )?;

    if others > 0 {
        warn!(
            "event=representative_image_rejected module=repo status=error restaurant_id={} image_id={:?}",
            image.restaurant_id, image.id
        );
        return Err(RepoError::RepresentativeImageConflict {
            restaurant_id: image.restaurant_id,
        });
    }
    Ok(())
}

fn insert_image(conn: &Connection, image: &RestaurantImage) -> RepoResult<RestaurantImageId> {
    conn.execute(
        "INSERT INTO restaurant_images (
            restaurant_id,
            is_representative,
            display_order,
            name,
            image
        ) VALUES (?1, ?2, ?3, ?4, ?5);",
        params![
            image.restaurant_id,
            bool_to_int(image.is_representative),
            image.display_order,
            image.name.as_deref(),
            &image.image,
        ],
    )
    .map_err(|err| RepoError::from_write(err, "restaurant image", "id"))?;
    Ok(conn.last_insert_rowid())
}

fn update_image_row(conn: &Connection, image: &RestaurantImage) -> RepoResult<()> {
    let id = require_id(image.id, "restaurant image")?;
    let changed = conn
        .execute(
            &format!(
                "UPDATE restaurant_images
                 SET
                    restaurant_id = ?2,
                    is_representative = ?3,
                    display_order = ?4,
                    name = ?5,
                    image = ?6,
                    updated_at = {NOW_MS_SQL}
                 WHERE id = ?1;"
            ),
            params![
                id,
                image.restaurant_id,
                bool_to_int(image.is_representative),
                image.display_order,
                image.name.as_deref(),
                &image.image,
            ],
        )
        .map_err(|err| RepoError::from_write(err, "restaurant image", "id"))?;
    if changed == 0 {
        return Err(RepoError::NotFound {
            entity: "restaurant image",
            id,
        });
    }
    Ok(())
}

fn image_from_row(row: &Row<'_>) -> RepoResult<RestaurantImage> {
    Ok(RestaurantImage {
        id: Some(row.get("id")?),
        restaurant_id: row.get("restaurant_id")?,
        is_representative: parse_bool(row, "is_representative")?,
        display_order: parse_optional_u32(row, "display_order")?,
        name: row.get("name")?,
        image: row.get("image")?,
        created_at: Some(row.get("created_at")?),
        updated_at: Some(row.get("updated_at")?),
    })
}
