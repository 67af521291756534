//! Restaurant use-case service.
//!
//! # Responsibility
//! - Provide the admin-style write path: store uploads, then persist through
//!   the checked repository calls.
//! - Assemble the restaurant detail read model.
//! - Remove stored files of rows that a restaurant delete cascades away.
//!
//! # Invariants
//! - Image writes from this service always run the representative check.
//! - A stored upload whose row fails to persist is deleted again.
//! - Storage failures surface as validation errors on the image field.
//! - A restaurant delete lists owned files and removes the rows inside one
//!   immediate transaction; files are removed only after it commits.

use crate::model::catalog::Tag;
use crate::model::media::{
    RestaurantImage, RestaurantMenu, MENU_IMAGE_UPLOAD_TO, RESTAURANT_IMAGE_UPLOAD_TO,
};
use crate::model::restaurant::{Restaurant, RestaurantId};
use crate::model::review::{Review, ReviewId, ReviewImage, REVIEW_IMAGE_UPLOAD_TO};
use crate::model::validation::{FieldErrorKind, ValidationError};
use crate::repo::image_repo::{RestaurantImageRepository, SqliteRestaurantImageRepository};
use crate::repo::menu_repo::{RestaurantMenuRepository, SqliteRestaurantMenuRepository};
use crate::repo::restaurant_repo::{RestaurantRepository, SqliteRestaurantRepository};
use crate::repo::review_repo::{ReviewRepository, SqliteReviewRepository};
use crate::repo::{Page, RepoError, RepoResult};
use crate::storage::{ImageRef, ImageStore};
use log::{info, warn};
use rusqlite::{Connection, Transaction, TransactionBehavior};

/// Upload metadata for a restaurant gallery image.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageUpload {
    pub name: Option<String>,
    pub display_order: Option<u32>,
    pub is_representative: bool,
}

/// Everything a restaurant page shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestaurantDetail {
    pub restaurant: Restaurant,
    pub label: String,
    pub tags: Vec<Tag>,
    pub representative_image: Option<RestaurantImage>,
    pub images: Vec<RestaurantImage>,
    pub menus: Vec<RestaurantMenu>,
    pub reviews: Vec<Review>,
}

/// Restaurant service facade over the SQLite repositories and an image store.
pub struct RestaurantService<'conn, S: ImageStore> {
    conn: &'conn Connection,
    restaurants: SqliteRestaurantRepository<'conn>,
    images: SqliteRestaurantImageRepository<'conn>,
    menus: SqliteRestaurantMenuRepository<'conn>,
    reviews: SqliteReviewRepository<'conn>,
    store: S,
}

impl<'conn, S: ImageStore> RestaurantService<'conn, S> {
    /// Creates a service over a migrated connection.
    pub fn try_new(conn: &'conn Connection, store: S) -> RepoResult<Self> {
        Ok(Self {
            conn,
            restaurants: SqliteRestaurantRepository::try_new(conn)?,
            images: SqliteRestaurantImageRepository::try_new(conn)?,
            menus: SqliteRestaurantMenuRepository::try_new(conn)?,
            reviews: SqliteReviewRepository::try_new(conn)?,
            store,
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Creates a restaurant and returns the persisted row.
    pub fn create_restaurant(&self, restaurant: &Restaurant) -> RepoResult<Restaurant> {
        let id = self.restaurants.create_restaurant(restaurant)?;
        self.read_back_restaurant(id)
    }

    /// Stores `bytes` and adds it to the restaurant gallery.
    ///
    /// # Errors
    /// - `Validation` on the `image` field when the payload is rejected.
    /// - `RepresentativeImageConflict` when `upload.is_representative` is set
    ///   and the restaurant already has a representative image.
    pub fn upload_restaurant_image(
        &self,
        restaurant_id: RestaurantId,
        bytes: &[u8],
        upload: &ImageUpload,
    ) -> RepoResult<RestaurantImage> {
        let image_ref = self.store_upload("image", RESTAURANT_IMAGE_UPLOAD_TO, bytes)?;

        let mut image = RestaurantImage::new(restaurant_id, image_ref.clone());
        image.name = upload.name.clone();
        image.display_order = upload.display_order;
        image.is_representative = upload.is_representative;

        let saved = self
            .images
            .save_image_checked(&image)
            .and_then(|id| self.read_back_image(id));
        if saved.is_err() {
            self.discard_upload(&image_ref);
        }
        saved
    }

    /// Validated save of an existing or new image without a new upload.
    pub fn save_restaurant_image(&self, image: &RestaurantImage) -> RepoResult<RestaurantImage> {
        let id = self.images.save_image_checked(image)?;
        self.read_back_image(id)
    }

    /// Adds a menu item, storing its photo first when one is given.
    pub fn add_menu(
        &self,
        menu: &RestaurantMenu,
        image_bytes: Option<&[u8]>,
    ) -> RepoResult<RestaurantMenu> {
        let mut menu = menu.clone();
        if let Some(bytes) = image_bytes {
            menu.image = Some(self.store_upload("image", MENU_IMAGE_UPLOAD_TO, bytes)?);
        }

        let saved = self.menus.create_menu(&menu).and_then(|id| {
            self.menus.get_menu(id)?.ok_or(RepoError::NotFound {
                entity: "restaurant menu",
                id,
            })
        });
        if saved.is_err() {
            if let Some(image_ref) = menu.image.as_ref() {
                self.discard_upload(image_ref);
            }
        }
        saved
    }

    /// Stores `bytes` and attaches it to a review.
    pub fn upload_review_image(
        &self,
        review_id: ReviewId,
        name: &str,
        bytes: &[u8],
    ) -> RepoResult<ReviewImage> {
        let image_ref = self.store_upload("image", REVIEW_IMAGE_UPLOAD_TO, bytes)?;
        let image = ReviewImage::new(review_id, name, image_ref.clone());

        let saved = self.reviews.create_review_image(&image).and_then(|id| {
            self.reviews.get_review_image(id)?.ok_or(RepoError::NotFound {
                entity: "review image",
                id,
            })
        });
        if saved.is_err() {
            self.discard_upload(&image_ref);
        }
        saved
    }

    /// Loads the restaurant page read model.
    pub fn restaurant_detail(
        &self,
        id: RestaurantId,
        review_page: Page,
    ) -> RepoResult<Option<RestaurantDetail>> {
        let Some(restaurant) = self.restaurants.get_restaurant(id)? else {
            return Ok(None);
        };

        Ok(Some(RestaurantDetail {
            label: restaurant.label(),
            tags: self.restaurants.list_restaurant_tags(id)?,
            representative_image: self.images.representative_image(id)?,
            images: self.images.list_images(id)?,
            menus: self.menus.list_menus(id)?,
            reviews: self.reviews.list_reviews(id, review_page)?,
            restaurant,
        }))
    }

    /// Deletes the restaurant and everything it owns, then removes the files
    /// those rows referenced.
    ///
    /// File removal is best effort; failures are logged, not returned.
    pub fn delete_restaurant(&self, id: RestaurantId) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let files = self.collect_owned_files(id)?;
        self.restaurants.delete_restaurant(id)?;
        tx.commit()?;

        for image_ref in &files {
            self.discard_upload(image_ref);
        }
        info!(
            "event=restaurant_deleted module=service status=ok restaurant_id={id} files={}",
            files.len()
        );
        Ok(())
    }

    fn collect_owned_files(&self, id: RestaurantId) -> RepoResult<Vec<ImageRef>> {
        let mut files: Vec<ImageRef> = self
            .images
            .list_images(id)?
            .into_iter()
            .map(|image| image.image)
            .collect();
        files.extend(
            self.menus
                .list_menus(id)?
                .into_iter()
                .filter_map(|menu| menu.image),
        );
        for review in self.reviews.list_reviews(id, Page::default())? {
            files.extend(review.profile_image.clone());
            if let Some(review_id) = review.id {
                files.extend(
                    self.reviews
                        .list_review_images(review_id)?
                        .into_iter()
                        .map(|image| image.image),
                );
            }
        }
        Ok(files)
    }

    fn store_upload(
        &self,
        field: &'static str,
        upload_to: &str,
        bytes: &[u8],
    ) -> RepoResult<ImageRef> {
        self.store.save(upload_to, bytes).map_err(|err| {
            RepoError::Validation(ValidationError::single(
                field,
                FieldErrorKind::InvalidImage(err.to_string()),
            ))
        })
    }

    fn discard_upload(&self, image_ref: &ImageRef) {
        if let Err(err) = self.store.delete(image_ref) {
            warn!(
                "event=image_store_delete module=service status=error image={image_ref} error={err}"
            );
        }
    }

    fn read_back_restaurant(&self, id: RestaurantId) -> RepoResult<Restaurant> {
        self.restaurants
            .get_restaurant(id)?
            .ok_or(RepoError::NotFound {
                entity: "restaurant",
                id,
            })
    }

    fn read_back_image(&self, id: i64) -> RepoResult<RestaurantImage> {
        self.images.get_image(id)?.ok_or(RepoError::NotFound {
            entity: "restaurant image",
            id,
        })
    }
}
