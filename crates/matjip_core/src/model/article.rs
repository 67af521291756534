//! Editorial article ("column") model.

use crate::model::display_id;
use crate::model::validation::{FieldChecks, ValidationError};
use crate::storage::ImageRef;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

pub type ArticleId = i64;

pub const ARTICLE_TITLE_MAX: usize = 100;

/// Editorial post, unrelated to restaurants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub id: Option<ArticleId>,
    pub title: String,
    pub preview_image: Option<ImageRef>,
    pub content: String,
    /// Featured on the landing page. Only effective together with
    /// `is_published`.
    pub show_at_index: bool,
    pub is_published: bool,
    pub created_at: Option<i64>,
    /// Refreshed on every update.
    pub modified_at: Option<i64>,
}

impl Article {
    /// Creates an unpublished draft.
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: None,
            title: title.into(),
            preview_image: None,
            content: content.into(),
            show_at_index: false,
            is_published: false,
            created_at: None,
            modified_at: None,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        FieldChecks::new()
            .text("title", &self.title, ARTICLE_TITLE_MAX)
            .optional_text(
                "preview_image",
                self.preview_image.as_ref().map(ImageRef::as_str),
                ImageRef::MAX_LEN,
            )
            .long_text("content", &self.content)
            .finish()
    }
}

impl Display for Article {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} - {}", display_id(self.id), self.title)
    }
}

#[cfg(test)]
mod tests {
    use super::Article;

    #[test]
    fn new_article_is_an_unpublished_draft() {
        let article = Article::new("을지로 노포 탐방", "본문");
        assert!(!article.is_published);
        assert!(!article.show_at_index);
        assert!(article.validate().is_ok());
    }

    #[test]
    fn label_uses_id_and_title() {
        let mut article = Article::new("겨울 국밥", "본문");
        assert_eq!(article.to_string(), "None - 겨울 국밥");
        article.id = Some(7);
        assert_eq!(article.to_string(), "7 - 겨울 국밥");
    }

    #[test]
    fn blank_content_is_rejected() {
        let err = Article::new("title", "  ").validate().unwrap_err();
        assert!(err.has_field("content"));
    }
}
