//! Restaurant-owned media: photos and menu items.
//!
//! # Invariants
//! - Both records belong to exactly one restaurant and die with it.
//! - At most one image per restaurant is representative, but only on write
//!   paths that run the repository's representative check. `validate()` here
//!   covers single-row constraints only.

use crate::model::display_id;
use crate::model::restaurant::RestaurantId;
use crate::model::validation::{FieldChecks, ValidationError, POSITIVE_INT_MAX};
use crate::storage::ImageRef;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

pub type RestaurantImageId = i64;
pub type RestaurantMenuId = i64;

pub const IMAGE_NAME_MAX: usize = 100;
pub const MENU_NAME_MAX: usize = 100;

/// Upload directory for restaurant photos.
pub const RESTAURANT_IMAGE_UPLOAD_TO: &str = "restaurant";
/// Upload directory for menu photos.
pub const MENU_IMAGE_UPLOAD_TO: &str = "restaurant-menu";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestaurantImage {
    pub id: Option<RestaurantImageId>,
    pub restaurant_id: RestaurantId,
    pub is_representative: bool,
    /// Display order within the restaurant gallery. Unordered images go last.
    pub display_order: Option<u32>,
    pub name: Option<String>,
    pub image: ImageRef,
    pub created_at: Option<i64>,
    pub updated_at: Option<i64>,
}

impl RestaurantImage {
    pub fn new(restaurant_id: RestaurantId, image: ImageRef) -> Self {
        Self {
            id: None,
            restaurant_id,
            is_representative: false,
            display_order: None,
            name: None,
            image,
            created_at: None,
            updated_at: None,
        }
    }

    pub fn representative(mut self) -> Self {
        self.is_representative = true;
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        FieldChecks::new()
            .optional_text("name", self.name.as_deref(), IMAGE_NAME_MAX)
            .text("image", self.image.as_str(), ImageRef::MAX_LEN)
            .optional_range(
                "display_order",
                self.display_order.map(i64::from),
                0,
                POSITIVE_INT_MAX,
            )
            .finish()
    }
}

impl Display for RestaurantImage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", display_id(self.id), self.image)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestaurantMenu {
    pub id: Option<RestaurantMenuId>,
    pub restaurant_id: RestaurantId,
    pub name: String,
    /// Price in won.
    pub price: u32,
    pub image: Option<ImageRef>,
    pub created_at: Option<i64>,
    pub updated_at: Option<i64>,
}

impl RestaurantMenu {
    pub fn new(restaurant_id: RestaurantId, name: impl Into<String>, price: u32) -> Self {
        Self {
            id: None,
            restaurant_id,
            name: name.into(),
            price,
            image: None,
            created_at: None,
            updated_at: None,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        FieldChecks::new()
            .text("name", &self.name, MENU_NAME_MAX)
            .range("price", i64::from(self.price), 0, POSITIVE_INT_MAX)
            .optional_text(
                "image",
                self.image.as_ref().map(ImageRef::as_str),
                ImageRef::MAX_LEN,
            )
            .finish()
    }
}

impl Display for RestaurantMenu {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::{RestaurantImage, RestaurantMenu};
    use crate::model::validation::{FieldErrorKind, POSITIVE_INT_MAX};
    use crate::storage::ImageRef;

    #[test]
    fn image_label_uses_id_and_reference() {
        let mut image = RestaurantImage::new(1, ImageRef::new("restaurant/a.jpg"));
        assert_eq!(image.to_string(), "None:restaurant/a.jpg");
        image.id = Some(3);
        assert_eq!(image.to_string(), "3:restaurant/a.jpg");
    }

    #[test]
    fn image_reference_is_required() {
        let image = RestaurantImage::new(1, ImageRef::new(""));
        assert!(image.validate().unwrap_err().has_field("image"));
    }

    #[test]
    fn menu_defaults_and_label() {
        let menu = RestaurantMenu::new(1, "평양냉면", 15000);
        assert_eq!(menu.to_string(), "평양냉면");
        assert!(menu.image.is_none());
        assert!(menu.validate().is_ok());
    }

    #[test]
    fn price_and_display_order_stay_within_positive_int() {
        let too_large = Some(&FieldErrorKind::MaxValue {
            max: POSITIVE_INT_MAX,
        });

        let mut menu = RestaurantMenu::new(1, "한우 코스", 2_147_483_647);
        assert!(menu.validate().is_ok());
        menu.price = 2_147_483_648;
        assert_eq!(menu.validate().unwrap_err().field("price"), too_large);

        let mut image = RestaurantImage::new(1, ImageRef::new("restaurant/a.jpg"));
        image.display_order = Some(u32::MAX);
        assert_eq!(image.validate().unwrap_err().field("display_order"), too_large);
        image.display_order = None;
        assert!(image.validate().is_ok());
    }
}
