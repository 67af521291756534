//! Korean administrative region (시도 / 시군구 / 읍면동).
//!
//! # Invariants
//! - `(sido, sigungu, eupmyeondong)` is unique across all rows.
//! - Deleting a region clears `region_id` on its restaurants.

use crate::model::validation::{FieldChecks, ValidationError};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

pub type RegionId = i64;

pub const REGION_PART_MAX: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub id: Option<RegionId>,
    /// Province-level name (광역시도).
    pub sido: String,
    /// City/district-level name (시군구).
    pub sigungu: String,
    /// Neighborhood-level name (읍면동).
    pub eupmyeondong: String,
}

impl Region {
    pub fn new(
        sido: impl Into<String>,
        sigungu: impl Into<String>,
        eupmyeondong: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            sido: sido.into(),
            sigungu: sigungu.into(),
            eupmyeondong: eupmyeondong.into(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        FieldChecks::new()
            .text("sido", &self.sido, REGION_PART_MAX)
            .text("sigungu", &self.sigungu, REGION_PART_MAX)
            .text("eupmyeondong", &self.eupmyeondong, REGION_PART_MAX)
            .finish()
    }
}

impl Display for Region {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {}", self.sido, self.sigungu, self.eupmyeondong)
    }
}
