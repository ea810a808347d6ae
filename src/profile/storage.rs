//! On-disk image storage.

use std::io;
use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::debug;

use crate::auth::validation::is_username_char;
use crate::{LifError, Result};

/// Kind of profile image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    /// Profile picture.
    Avatar,
    /// Profile banner.
    Banner,
}

impl ImageKind {
    /// Directory the kind is stored in.
    pub fn dir_name(&self) -> &'static str {
        match self {
            ImageKind::Avatar => "pfp",
            ImageKind::Banner => "banner",
        }
    }
}

/// Strip every character that may not appear in a username.
///
/// Leading dots are removed as well, so the result never names a parent
/// or hidden path.
pub fn sanitize_username(username: &str) -> String {
    let cleaned: String = username.chars().filter(|c| is_username_char(*c)).collect();
    cleaned.trim_start_matches('.').to_string()
}

/// Avatar and banner storage rooted at one directory.
#[derive(Debug, Clone)]
pub struct ImageStore {
    base_path: PathBuf,
}

impl ImageStore {
    /// Create a store. Directories are created on first write.
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    /// Get the base path of this store.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Path of an account's image, or `None` if the username sanitizes to
    /// nothing.
    pub fn image_path(&self, kind: ImageKind, username: &str) -> Option<PathBuf> {
        let name = sanitize_username(username);
        if name.is_empty() {
            return None;
        }
        Some(
            self.base_path
                .join(kind.dir_name())
                .join(format!("{name}.png")),
        )
    }

    /// Store an image, replacing any previous one.
    pub async fn save(&self, kind: ImageKind, username: &str, content: &[u8]) -> Result<()> {
        let Some(path) = self.image_path(kind, username) else {
            return Err(LifError::Validation("invalid username".to_string()));
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&path, content).await?;

        debug!(path = %path.display(), bytes = content.len(), "image stored");
        Ok(())
    }

    /// Load an image. Returns `None` when the account has none.
    pub async fn load(&self, kind: ImageKind, username: &str) -> Result<Option<Vec<u8>>> {
        let Some(path) = self.image_path(kind, username) else {
            return Ok(None);
        };

        match fs::read(&path).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Delete an image. Returns whether one existed.
    pub async fn delete(&self, kind: ImageKind, username: &str) -> Result<bool> {
        let Some(path) = self.image_path(kind, username) else {
            return Ok(false);
        };

        match fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
