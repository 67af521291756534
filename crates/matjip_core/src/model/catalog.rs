//! Lookup entities used to classify restaurants and reviews.
//!
//! # Invariants
//! - `Tag.name` is unique at the storage layer (exact, case-sensitive match).
//! - Deleting a `CuisineType` deletes its categories; deleting a category or a
//!   social channel only clears references to it.

use crate::model::validation::{FieldChecks, ValidationError};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

pub type CuisineTypeId = i64;
pub type CategoryId = i64;
pub type SocialChannelId = i64;
pub type TagId = i64;

pub const CUISINE_TYPE_NAME_MAX: usize = 20;
pub const CATEGORY_NAME_MAX: usize = 20;
pub const SOCIAL_CHANNEL_NAME_MAX: usize = 100;
pub const TAG_NAME_MAX: usize = 100;

/// Broad kind of food, e.g. 한식 or 양식.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CuisineType {
    pub id: Option<CuisineTypeId>,
    pub name: String,
}

impl CuisineType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        FieldChecks::new()
            .text("name", &self.name, CUISINE_TYPE_NAME_MAX)
            .finish()
    }
}

impl Display for CuisineType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

/// Restaurant category, optionally grouped under a cuisine type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestaurantCategory {
    pub id: Option<CategoryId>,
    pub name: String,
    pub cuisine_type_id: Option<CuisineTypeId>,
}

impl RestaurantCategory {
    pub fn new(name: impl Into<String>, cuisine_type_id: Option<CuisineTypeId>) -> Self {
        Self {
            id: None,
            name: name.into(),
            cuisine_type_id,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        FieldChecks::new()
            .text("name", &self.name, CATEGORY_NAME_MAX)
            .finish()
    }
}

impl Display for RestaurantCategory {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

/// Where a review was sourced from (blog, Instagram, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialChannel {
    pub id: Option<SocialChannelId>,
    pub name: String,
}

impl SocialChannel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        FieldChecks::new()
            .text("name", &self.name, SOCIAL_CHANNEL_NAME_MAX)
            .finish()
    }
}

impl Display for SocialChannel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

/// Free-form label attached to restaurants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: Option<TagId>,
    pub name: String,
}

impl Tag {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        FieldChecks::new()
            .text("name", &self.name, TAG_NAME_MAX)
            .finish()
    }
}

impl Display for Tag {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}
