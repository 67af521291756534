//! Local filesystem image store.
//!
//! Files land in `<media_root>/<upload_to>/<uuid>.<ext>`; the returned
//! reference is the path relative to `media_root`.

use super::{ImageFormat, ImageRef, ImageStore, StorageError, StorageResult};
use log::{info, warn};
use std::path::{Component, Path, PathBuf};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct FileSystemImageStore {
    root: PathBuf,
    base_url: String,
}

impl FileSystemImageStore {
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            base_url: base_url.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute path of a stored reference.
    pub fn path_of(&self, image: &ImageRef) -> StorageResult<PathBuf> {
        let relative = Path::new(image.as_str());
        let is_plain = relative
            .components()
            .all(|component| matches!(component, Component::Normal(_)));
        if image.as_str().is_empty() || !is_plain {
            return Err(StorageError::InvalidPath(image.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

impl ImageStore for FileSystemImageStore {
    fn save(&self, upload_to: &str, bytes: &[u8]) -> StorageResult<ImageRef> {
        let format = ImageFormat::verify(bytes)?;

        let file_name = format!("{}.{}", Uuid::new_v4().simple(), format.extension());
        let image = if upload_to.is_empty() {
            ImageRef::new(file_name)
        } else {
            ImageRef::new(format!("{}/{file_name}", upload_to.trim_matches('/')))
        };
        let path = self.path_of(&image)?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| StorageError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        std::fs::write(&path, bytes).map_err(|source| {
            warn!(
                "event=image_store_save module=storage status=error upload_to={upload_to} error={source}"
            );
            StorageError::Io {
                path: path.clone(),
                source,
            }
        })?;

        info!(
            "event=image_store_save module=storage status=ok upload_to={upload_to} bytes={}",
            bytes.len()
        );
        Ok(image)
    }

    fn delete(&self, image: &ImageRef) -> StorageResult<()> {
        let path = self.path_of(image)?;
        match std::fs::remove_file(&path) {
            Ok(()) => {
                info!("event=image_store_delete module=storage status=ok image={image}");
                Ok(())
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StorageError::Io { path, source }),
        }
    }

    fn url(&self, image: &ImageRef) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), image)
    }
}

#[cfg(test)]
mod tests {
    use super::FileSystemImageStore;
    use crate::storage::tests::encoded;
    use crate::storage::{ImageRef, ImageStore, StorageError};

    #[test]
    fn save_writes_under_upload_dir() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSystemImageStore::new(dir.path(), "/media/");
        let png = encoded(image::ImageFormat::Png);

        let image = store.save("restaurant", &png).unwrap();
        assert!(image.as_str().starts_with("restaurant/"));
        assert!(image.as_str().ends_with(".png"));
        assert!(image.as_str().len() <= ImageRef::MAX_LEN);
        assert_eq!(std::fs::read(dir.path().join(image.as_str())).unwrap(), png);
        assert_eq!(store.url(&image), format!("/media/{image}"));
    }

    #[test]
    fn save_rejects_non_images() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSystemImageStore::new(dir.path(), "/media");

        assert!(matches!(
            store.save("restaurant", b"not an image"),
            Err(StorageError::InvalidFormat)
        ));
        assert!(matches!(store.save("restaurant", b""), Err(StorageError::Empty)));

        let png = encoded(image::ImageFormat::Png);
        assert!(matches!(
            store.save("restaurant", &png[..png.len() / 2]),
            Err(StorageError::InvalidFormat)
        ));
        assert!(!dir.path().join("restaurant").exists());
    }

    #[test]
    fn delete_is_idempotent_and_rejects_escaping_paths() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSystemImageStore::new(dir.path(), "/media");
        let image = store
            .save("review", &encoded(image::ImageFormat::Jpeg))
            .unwrap();
        assert!(image.as_str().ends_with(".jpg"));

        store.delete(&image).unwrap();
        store.delete(&image).unwrap();
        assert!(!dir.path().join(image.as_str()).exists());

        let escaping = ImageRef::new("../etc/passwd");
        assert!(matches!(
            store.delete(&escaping),
            Err(StorageError::InvalidPath(_))
        ));
    }
}
