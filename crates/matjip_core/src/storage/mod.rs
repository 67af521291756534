//! Image storage boundary.
//!
//! # Responsibility
//! - Define the stable reference persisted in image columns (`ImageRef`).
//! - Define the backend contract used by write paths to store uploads.
//!
//! # Invariants
//! - An `ImageRef` is a relative, `/`-separated path under the media root.
//! - Backends reject payloads that do not decode as a supported image.

use rusqlite::types::{FromSql, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use thiserror::Error;

mod fs;

pub use fs::FileSystemImageStore;

pub type StorageResult<T> = Result<T, StorageError>;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("file is empty")]
    Empty,
    #[error("file is not a supported image (png, jpeg, gif, webp)")]
    InvalidFormat,
    #[error("invalid storage path `{0}`")]
    InvalidPath(String),
    #[error("storage io failure at `{}`: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Relative reference to a stored image, e.g. `restaurant/3f2a...c1.jpg`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageRef(String);

impl ImageRef {
    /// Column width of every image field.
    pub const MAX_LEN: usize = 100;

    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ImageRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl ToSql for ImageRef {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        self.0.to_sql()
    }
}

impl FromSql for ImageRef {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        String::column_result(value).map(ImageRef)
    }
}

/// Image formats accepted for upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
    Gif,
    Webp,
}

impl ImageFormat {
    /// Guesses the format from magic bytes only.
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        match image::guess_format(bytes).ok()? {
            image::ImageFormat::Png => Some(Self::Png),
            image::ImageFormat::Jpeg => Some(Self::Jpeg),
            image::ImageFormat::Gif => Some(Self::Gif),
            image::ImageFormat::WebP => Some(Self::Webp),
            _ => None,
        }
    }

    /// Detects the format and decodes the whole payload, so a valid header
    /// followed by a broken body is rejected.
    pub fn verify(bytes: &[u8]) -> StorageResult<Self> {
        if bytes.is_empty() {
            return Err(StorageError::Empty);
        }
        let format = Self::sniff(bytes).ok_or(StorageError::InvalidFormat)?;
        image::load_from_memory_with_format(bytes, format.as_image_format())
            .map_err(|_| StorageError::InvalidFormat)?;
        Ok(format)
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::Gif => "gif",
            Self::Webp => "webp",
        }
    }

    fn as_image_format(self) -> image::ImageFormat {
        match self {
            Self::Png => image::ImageFormat::Png,
            Self::Jpeg => image::ImageFormat::Jpeg,
            Self::Gif => image::ImageFormat::Gif,
            Self::Webp => image::ImageFormat::WebP,
        }
    }
}

/// Backend that persists uploaded image payloads.
pub trait ImageStore {
    /// Stores `bytes` under the `upload_to` directory and returns its reference.
    fn save(&self, upload_to: &str, bytes: &[u8]) -> StorageResult<ImageRef>;
    /// Removes a stored image. Missing files are not an error.
    fn delete(&self, image: &ImageRef) -> StorageResult<()>;
    /// Public URL for a stored image.
    fn url(&self, image: &ImageRef) -> String;
}
