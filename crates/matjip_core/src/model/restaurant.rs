//! Restaurant aggregate root.
//!
//! # Responsibility
//! - Define the restaurant record and its column constraints.
//! - Provide the display label used by listings and admin screens.
//!
//! # Invariants
//! - Latitude/longitude fit `DECIMAL(16, 12)`; rating fits `DECIMAL(3, 2)`.
//! - Rating bounds are only those of storage precision (max 9.99).
//! - Deleting a restaurant deletes its images, menus, reviews and tag links.

use crate::model::catalog::{CategoryId, TagId};
use crate::model::region::RegionId;
use crate::model::validation::{DecimalSpec, FieldChecks, ValidationError, POSITIVE_INT_MAX};
use chrono::NaiveTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

pub type RestaurantId = i64;

pub const RESTAURANT_NAME_MAX: usize = 100;
pub const BRANCH_NAME_MAX: usize = 100;
pub const ADDRESS_MAX: usize = 255;
pub const FEATURE_MAX: usize = 255;
pub const PHONE_MAX: usize = 16;

pub const COORDINATE: DecimalSpec = DecimalSpec::new(16, 12);
pub const RATING: DecimalSpec = DecimalSpec::new(3, 2);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Restaurant {
    pub id: Option<RestaurantId>,
    pub name: String,
    pub branch_name: Option<String>,
    pub description: Option<String>,
    pub address: String,
    pub feature: Option<String>,
    pub is_closed: bool,
    pub latitude: Decimal,
    pub longitude: Decimal,
    /// E.164, e.g. `+821012345678`.
    pub phone: String,
    pub rating: Decimal,
    pub rating_count: u32,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub last_order_time: Option<NaiveTime>,
    pub category_id: Option<CategoryId>,
    pub region_id: Option<RegionId>,
    /// Many-to-many tag links. Persisted through `set_restaurant_tags`.
    #[serde(default)]
    pub tag_ids: Vec<TagId>,
}

impl Restaurant {
    /// Creates an open restaurant at (0, 0) with no rating yet.
    pub fn new(
        name: impl Into<String>,
        address: impl Into<String>,
        phone: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            name: name.into(),
            branch_name: None,
            description: None,
            address: address.into(),
            feature: None,
            is_closed: false,
            latitude: Decimal::ZERO,
            longitude: Decimal::ZERO,
            phone: phone.into(),
            rating: Decimal::ZERO,
            rating_count: 0,
            start_time: None,
            end_time: None,
            last_order_time: None,
            category_id: None,
            region_id: None,
            tag_ids: Vec::new(),
        }
    }

    pub fn with_branch(mut self, branch_name: impl Into<String>) -> Self {
        self.branch_name = Some(branch_name.into());
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        FieldChecks::new()
            .text("name", &self.name, RESTAURANT_NAME_MAX)
            .optional_text("branch_name", self.branch_name.as_deref(), BRANCH_NAME_MAX)
            .text("address", &self.address, ADDRESS_MAX)
            .optional_text("feature", self.feature.as_deref(), FEATURE_MAX)
            .decimal("latitude", self.latitude, COORDINATE)
            .decimal("longitude", self.longitude, COORDINATE)
            .phone("phone", &self.phone)
            .decimal("rating", self.rating, RATING)
            .range("rating_count", i64::from(self.rating_count), 0, POSITIVE_INT_MAX)
            .finish()
    }

    /// Display label, see [`restaurant_label`].
    pub fn label(&self) -> String {
        restaurant_label(&self.name, self.branch_name.as_deref())
    }
}

impl Display for Restaurant {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.label())
    }
}

/// `"{name} {branch_name}"` when a non-empty branch is given, else `name`.
///
/// e.g. `본스테이크 강남점`, `본스테이크`.
pub fn restaurant_label(name: &str, branch_name: Option<&str>) -> String {
    match branch_name {
        Some(branch) if !branch.is_empty() => format!("{name} {branch}"),
        _ => name.to_string(),
    }
}
