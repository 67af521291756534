//! Review repository contracts and SQLite implementation.
//!
//! # Invariants
//! - Write paths call `Review::validate()`, so persisted ratings are `1..=5`.
//! - Review images die with their review; reviews die with their restaurant.
//! - Deleting a social channel clears `social_channel_id` on its reviews.

use crate::model::restaurant::RestaurantId;
use crate::model::review::{Review, ReviewId, ReviewImage, ReviewImageId};
use crate::repo::{
    delete_by_id, ensure_connection_ready, require_id, Page, RepoError, RepoResult, NOW_MS_SQL,
};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

const REVIEW_SELECT_SQL: &str = "SELECT
    id,
    restaurant_id,
    social_channel_id,
    title,
    author,
    profile_image,
    content,
    rating,
    created_at,
    updated_at
FROM reviews";

const REVIEW_IMAGE_SELECT_SQL: &str = "SELECT
    id,
    review_id,
    name,
    image,
    created_at,
    updated_at
FROM review_images";

const REQUIRED_TABLES: &[&str] = &["reviews", "review_images", "restaurants"];

/// Repository interface for reviews and review photos.
pub trait ReviewRepository {
    fn create_review(&self, review: &Review) -> RepoResult<ReviewId>;
    fn update_review(&self, review: &Review) -> RepoResult<()>;
    fn get_review(&self, id: ReviewId) -> RepoResult<Option<Review>>;
    /// Reviews of one restaurant, newest first.
    fn list_reviews(&self, restaurant_id: RestaurantId, page: Page) -> RepoResult<Vec<Review>>;
    fn delete_review(&self, id: ReviewId) -> RepoResult<()>;

    fn create_review_image(&self, image: &ReviewImage) -> RepoResult<ReviewImageId>;
    fn update_review_image(&self, image: &ReviewImage) -> RepoResult<()>;
    fn get_review_image(&self, id: ReviewImageId) -> RepoResult<Option<ReviewImage>>;
    fn list_review_images(&self, review_id: ReviewId) -> RepoResult<Vec<ReviewImage>>;
    fn delete_review_image(&self, id: ReviewImageId) -> RepoResult<()>;
}

/// SQLite-backed review repository.
pub struct SqliteReviewRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteReviewRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, REQUIRED_TABLES)?;
        Ok(Self { conn })
    }
}

impl ReviewRepository for SqliteReviewRepository<'_> {
    fn create_review(&self, review: &Review) -> RepoResult<ReviewId> {
        review.validate()?;
        self.conn
            .execute(
                "INSERT INTO reviews (
                    restaurant_id,
                    social_channel_id,
                    title,
                    author,
                    profile_image,
                    content,
                    rating
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
                params![
                    review.restaurant_id,
                    review.social_channel_id,
                    review.title.as_str(),
                    review.author.as_str(),
                    review.profile_image.as_ref(),
                    review.content.as_str(),
                    review.rating,
                ],
            )
            .map_err(|err| RepoError::from_write(err, "review", "id"))?;
        Ok(self.conn.last_insert_rowid())
    }

    fn update_review(&self, review: &Review) -> RepoResult<()> {
        review.validate()?;
        let id = require_id(review.id, "review")?;
        let changed = self
            .conn
            .execute(
                &format!(
                    "UPDATE reviews
                     SET
                        restaurant_id = ?2,
                        social_channel_id = ?3,
                        title = ?4,
                        author = ?5,
                        profile_image = ?6,
                        content = ?7,
                        rating = ?8,
                        updated_at = {NOW_MS_SQL}
                     WHERE id = ?1;"
                ),
                params![
                    id,
                    review.restaurant_id,
                    review.social_channel_id,
                    review.title.as_str(),
                    review.author.as_str(),
                    review.profile_image.as_ref(),
                    review.content.as_str(),
                    review.rating,
                ],
            )
            .map_err(|err| RepoError::from_write(err, "review", "id"))?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "review",
                id,
            });
        }
        Ok(())
    }

    fn get_review(&self, id: ReviewId) -> RepoResult<Option<Review>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{REVIEW_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(review_from_row(row)?));
        }
        Ok(None)
    }

    fn list_reviews(&self, restaurant_id: RestaurantId, page: Page) -> RepoResult<Vec<Review>> {
        let mut sql = format!(
            "{REVIEW_SELECT_SQL} WHERE restaurant_id = ? ORDER BY created_at DESC, id DESC"
        );
        let mut bind_values = vec![Value::Integer(restaurant_id)];
        page.push_sql(&mut sql, &mut bind_values);

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut reviews = Vec::new();
        while let Some(row) = rows.next()? {
            reviews.push(review_from_row(row)?);
        }
        Ok(reviews)
    }

    fn delete_review(&self, id: ReviewId) -> RepoResult<()> {
        delete_by_id(self.conn, "DELETE FROM reviews WHERE id = ?1;", "review", id)
    }

    fn create_review_image(&self, image: &ReviewImage) -> RepoResult<ReviewImageId> {
        image.validate()?;
        self.conn
            .execute(
                "INSERT INTO review_images (review_id, name, image) VALUES (?1, ?2, ?3);",
                params![image.review_id, image.name.as_str(), &image.image],
            )
            .map_err(|err| RepoError::from_write(err, "review image", "id"))?;
        Ok(self.conn.last_insert_rowid())
    }

    fn update_review_image(&self, image: &ReviewImage) -> RepoResult<()> {
        image.validate()?;
        let id = require_id(image.id, "review image")?;
        let changed = self
            .conn
            .execute(
                &format!(
                    "UPDATE review_images
                     SET
                        review_id = ?2,
                        name = ?3,
                        image = ?4,
                        updated_at = {NOW_MS_SQL}
                     WHERE id = ?1;"
                ),
                params![id, image.review_id, image.name.as_str(), &image.image],
            )
            .map_err(|err| RepoError::from_write(err, "review image", "id"))?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "review image",
                id,
            });
        }
        Ok(())
    }

    fn get_review_image(&self, id: ReviewImageId) -> RepoResult<Option<ReviewImage>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{REVIEW_IMAGE_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(review_image_from_row(row)?));
        }
        Ok(None)
    }

    fn list_review_images(&self, review_id: ReviewId) -> RepoResult<Vec<ReviewImage>> {
        let mut stmt = self.conn.prepare(&format!(
            "{REVIEW_IMAGE_SELECT_SQL} WHERE review_id = ?1 ORDER BY id ASC;"
        ))?;
        let mut rows = stmt.query([review_id])?;
        let mut images = Vec::new();
        while let Some(row) = rows.next()? {
            images.push(review_image_from_row(row)?);
        }
        Ok(images)
    }

    fn delete_review_image(&self, id: ReviewImageId) -> RepoResult<()> {
        delete_by_id(
            self.conn,
            "DELETE FROM review_images WHERE id = ?1;",
            "review image",
            id,
        )
    }
}

fn review_from_row(row: &Row<'_>) -> RepoResult<Review> {
    let rating: i64 = row.get("rating")?;
    let rating = u16::try_from(rating).map_err(|_| {
        RepoError::InvalidData(format!("invalid rating `{rating}` in reviews.rating"))
    })?;

    Ok(Review {
        id: Some(row.get("id")?),
        restaurant_id: row.get("restaurant_id")?,
        social_channel_id: row.get("social_channel_id")?,
        title: row.get("title")?,
        author: row.get("author")?,
        profile_image: row.get("profile_image")?,
        content: row.get("content")?,
        rating,
        created_at: Some(row.get("created_at")?),
        updated_at: Some(row.get("updated_at")?),
    })
}

fn review_image_from_row(row: &Row<'_>) -> RepoResult<ReviewImage> {
    Ok(ReviewImage {
        id: Some(row.get("id")?),
        review_id: row.get("review_id")?,
        name: row.get("name")?,
        image: row.get("image")?,
        created_at: Some(row.get("created_at")?),
        updated_at: Some(row.get("updated_at")?),
    })
}
