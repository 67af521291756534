//! User reviews and their photos.
//!
//! # Invariants
//! - `rating` is within `1..=5` after validation. Storage only guarantees the
//!   small-integer range, so unvalidated rows may hold other values.
//! - A review dies with its restaurant; its channel reference is cleared when
//!   the channel is deleted.

use crate::model::catalog::SocialChannelId;
use crate::model::display_id;
use crate::model::restaurant::RestaurantId;
use crate::model::validation::{FieldChecks, ValidationError};
use crate::storage::ImageRef;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

pub type ReviewId = i64;
pub type ReviewImageId = i64;

pub const REVIEW_TITLE_MAX: usize = 100;
pub const REVIEW_AUTHOR_MAX: usize = 100;
pub const REVIEW_IMAGE_NAME_MAX: usize = 100;
pub const RATING_MIN: u16 = 1;
pub const RATING_MAX: u16 = 5;

pub const PROFILE_IMAGE_UPLOAD_TO: &str = "review-profile";
pub const REVIEW_IMAGE_UPLOAD_TO: &str = "review";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub id: Option<ReviewId>,
    pub restaurant_id: RestaurantId,
    pub social_channel_id: Option<SocialChannelId>,
    pub title: String,
    pub author: String,
    pub profile_image: Option<ImageRef>,
    pub content: String,
    pub rating: u16,
    pub created_at: Option<i64>,
    pub updated_at: Option<i64>,
}

impl Review {
    pub fn new(
        restaurant_id: RestaurantId,
        title: impl Into<String>,
        author: impl Into<String>,
        content: impl Into<String>,
        rating: u16,
    ) -> Self {
        Self {
            id: None,
            restaurant_id,
            social_channel_id: None,
            title: title.into(),
            author: author.into(),
            profile_image: None,
            content: content.into(),
            rating,
            created_at: None,
            updated_at: None,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        FieldChecks::new()
            .text("title", &self.title, REVIEW_TITLE_MAX)
            .text("author", &self.author, REVIEW_AUTHOR_MAX)
            .optional_text(
                "profile_image",
                self.profile_image.as_ref().map(ImageRef::as_str),
                ImageRef::MAX_LEN,
            )
            .long_text("content", &self.content)
            .range(
                "rating",
                i64::from(self.rating),
                i64::from(RATING_MIN),
                i64::from(RATING_MAX),
            )
            .finish()
    }
}

impl Display for Review {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.author, self.title)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewImage {
    pub id: Option<ReviewImageId>,
    pub review_id: ReviewId,
    pub name: String,
    pub image: ImageRef,
    pub created_at: Option<i64>,
    pub updated_at: Option<i64>,
}

impl ReviewImage {
    pub fn new(review_id: ReviewId, name: impl Into<String>, image: ImageRef) -> Self {
        Self {
            id: None,
            review_id,
            name: name.into(),
            image,
            created_at: None,
            updated_at: None,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        FieldChecks::new()
            .text("name", &self.name, REVIEW_IMAGE_NAME_MAX)
            .text("image", self.image.as_str(), ImageRef::MAX_LEN)
            .finish()
    }
}

impl Display for ReviewImage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", display_id(self.id), self.image)
    }
}
