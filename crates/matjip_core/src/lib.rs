//! Core domain logic for the matjip restaurant directory.
//! This crate is the single source of truth for business invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod storage;

pub use config::{ConfigError, MatjipConfig};
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::article::Article;
pub use model::catalog::{CuisineType, RestaurantCategory, SocialChannel, Tag};
pub use model::media::{RestaurantImage, RestaurantMenu};
pub use model::region::Region;
pub use model::restaurant::{restaurant_label, Restaurant};
pub use model::review::{Review, ReviewImage};
pub use model::validation::{FieldError, FieldErrorKind, ValidationError, POSITIVE_INT_MAX};
pub use repo::{Page, RepoError, RepoResult};
pub use service::restaurant_service::{ImageUpload, RestaurantDetail, RestaurantService};
pub use storage::{FileSystemImageStore, ImageRef, ImageStore, StorageError, StorageResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
