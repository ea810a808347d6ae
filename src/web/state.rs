//! Shared application state.

use std::sync::Arc;

use sqlx::SqlitePool;

use crate::access_control::AccessControl;
use crate::auth::PasswordScheme;
use crate::config::Config;
use crate::mail::Mailer;
use crate::profile::ImageStore;
use crate::Database;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database pool.
    pub db: Database,
    /// Loaded configuration.
    pub config: Arc<Config>,
    /// Service capability map.
    pub access_control: Arc<AccessControl>,
    /// Outgoing mail.
    pub mailer: Arc<dyn Mailer>,
    /// Avatar and banner storage.
    pub images: ImageStore,
}

impl AppState {
    /// Create a new application state.
    pub fn new(
        db: Database,
        config: Config,
        access_control: AccessControl,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        let images = ImageStore::new(&config.storage.images_path);
        Self {
            db,
            config: Arc::new(config),
            access_control: Arc::new(access_control),
            mailer,
            images,
        }
    }

    /// Database pool.
    pub fn pool(&self) -> &SqlitePool {
        self.db.pool()
    }

    /// Password scheme of this deployment.
    pub fn scheme(&self) -> PasswordScheme {
        self.config.security.password_scheme
    }
}
