//! Image upload and attach-at-path.
//!
//! Binary assets live outside the configuration document; what the document
//! stores is the public URL. [`attach_image`] composes the pipeline the CMS
//! uses: upload the bytes, write the returned URL into the document at a
//! caller-specified nested path, and commit only the affected top-level key.

use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;
use url::Url;
use uuid::Uuid;

use crate::BoxFuture;
use crate::paths::{InvalidPathError, set_at_path};
use crate::remote::JsonObject;
use crate::store::{Commit, ConfigStore, UpdateError};

/// Upload pipeline errors.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("storage error: {0}")]
    Storage(String),

    #[error("invalid file name {0:?}")]
    InvalidFileName(String),

    #[error(transparent)]
    Path(#[from] InvalidPathError),

    #[error(transparent)]
    Update(#[from] UpdateError),
}

/// Contract with the binary asset store.
pub trait ImageStorage: Send + Sync {
    /// Persist the bytes and return the public URL.
    fn upload_image(&self, file_name: &str, bytes: Vec<u8>)
    -> BoxFuture<'_, Result<Url, UploadError>>;
}

/// Filesystem-backed asset store, served by the web tier under a public
/// base URL (which must end with a slash).
pub struct FsImageStorage {
    root: PathBuf,
    public_base: Url,
}

impl FsImageStorage {
    #[must_use]
    pub const fn new(root: PathBuf, public_base: Url) -> Self {
        Self { root, public_base }
    }
}

impl ImageStorage for FsImageStorage {
    fn upload_image(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> BoxFuture<'_, Result<Url, UploadError>> {
        let name = match stored_name(file_name) {
            Ok(name) => name,
            Err(e) => return Box::pin(async move { Err(e) }),
        };

        Box::pin(async move {
            tokio::fs::create_dir_all(&self.root)
                .await
                .map_err(|e| UploadError::Storage(e.to_string()))?;
            tokio::fs::write(self.root.join(&name), bytes)
                .await
                .map_err(|e| UploadError::Storage(e.to_string()))?;

            let url = self
                .public_base
                .join(&name)
                .map_err(|e| UploadError::Storage(e.to_string()))?;
            tracing::info!(%url, "stored uploaded image");
            Ok(url)
        })
    }
}

/// Upload an image and write its URL into the document at `path`.
///
/// The commit sends only the top-level key the path lands in, so concurrent
/// edits to unrelated keys are never clobbered. The returned [`Commit`] is
/// the remote persistence handle; the local document already carries the
/// URL when this returns.
///
/// # Errors
///
/// Any stage can fail: storage, an unresolvable path, or a partial that no
/// longer fits the schema. The document is untouched unless all stages up
/// to the local commit succeed.
pub async fn attach_image(
    store: &ConfigStore,
    storage: &dyn ImageStorage,
    path: &str,
    file_name: &str,
    bytes: Vec<u8>,
) -> Result<(Url, Commit), UploadError> {
    let url = storage.upload_image(file_name, bytes).await?;

    let current = Value::Object(store.current_object());
    let next = set_at_path(&current, path, Value::String(url.to_string()))?;

    let top_key = path.split('.').next().unwrap_or(path);
    let mut partial = JsonObject::new();
    if let Some(value) = next.get(top_key) {
        partial.insert(top_key.to_string(), value.clone());
    }
    let commit = store.update(partial)?;

    Ok((url, commit))
}

/// Unique stored name: UUID prefix plus the sanitized original name.
fn stored_name(file_name: &str) -> Result<String, UploadError> {
    let base = Path::new(file_name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("");
    let sanitized: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '-'
            }
        })
        .collect();

    if sanitized.trim_matches(['-', '.']).is_empty() {
        return Err(UploadError::InvalidFileName(file_name.to_string()));
    }
    Ok(format!("{}-{sanitized}", Uuid::new_v4()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use crate::remote::InMemoryRemote;

    use super::*;

    /// Records uploads without touching a filesystem.
    struct StubStorage;

    impl ImageStorage for StubStorage {
        fn upload_image(
            &self,
            file_name: &str,
            _bytes: Vec<u8>,
        ) -> BoxFuture<'_, Result<Url, UploadError>> {
            let url = Url::parse(&format!("https://cdn.vellutomotors.com/{file_name}"));
            Box::pin(async move { url.map_err(|e| UploadError::Storage(e.to_string())) })
        }
    }

    #[tokio::test]
    async fn test_attach_image_writes_url_at_path() {
        let remote = Arc::new(InMemoryRemote::new());
        let store = ConfigStore::new(remote);

        let (url, commit) = attach_image(
            &store,
            &StubStorage,
            "customSections.heritage.imageUrl",
            "workshop.jpg",
            vec![0xFF, 0xD8],
        )
        .await
        .unwrap();
        commit.confirmed().await.unwrap();

        let section = &store.current().custom_sections["heritage"];
        assert_eq!(section.image_url, url.to_string());
    }

    #[tokio::test]
    async fn test_attach_image_sends_only_affected_top_level_key() {
        let remote = Arc::new(InMemoryRemote::new());
        let store = ConfigStore::new(Arc::clone(&remote) as Arc<dyn crate::remote::RemoteStore>);

        let (_url, commit) = attach_image(
            &store,
            &StubStorage,
            "home.heroImage",
            "hero.jpg",
            vec![1, 2, 3],
        )
        .await
        .unwrap();
        commit.confirmed().await.unwrap();

        let doc = remote.document().unwrap();
        assert!(doc.contains_key("home"));
        // Unrelated keys were not part of the upsert.
        assert!(!doc.contains_key("testimonials"));
    }

    #[tokio::test]
    async fn test_attach_image_invalid_path_leaves_document_untouched() {
        let store = ConfigStore::new(Arc::new(InMemoryRemote::new()));
        let before = store.current();

        let result = attach_image(
            &store,
            &StubStorage,
            "gallery.0.imageUrl",
            "car.jpg",
            vec![1],
        )
        .await;

        assert!(matches!(result, Err(UploadError::Path(_))));
        assert_eq!(*store.current(), *before);
    }

    #[test]
    fn test_stored_name_sanitizes() {
        let name = stored_name("../../etc passwd.png").unwrap();
        assert!(!name.contains('/'));
        assert!(!name.contains(' '));
        assert!(name.ends_with("etc-passwd.png"));
    }

    #[test]
    fn test_stored_name_rejects_empty() {
        assert!(matches!(
            stored_name("///"),
            Err(UploadError::InvalidFileName(_))
        ));
    }
}
