//! Web server for the Lif Auth Server.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;

use crate::config::Config;
use crate::db::RecoveryCodeRepository;
use crate::{Database, LifError, Result};

use super::middleware::LoginRateLimiter;
use super::router::create_router;
use super::state::AppState;

/// Interval between sweeps of expired recovery codes.
const CLEANUP_INTERVAL_SECS: u64 = 3600;

/// Web server for the API.
pub struct WebServer {
    /// Server address.
    addr: SocketAddr,
    /// Application state.
    app_state: Arc<AppState>,
    /// Login rate limiter.
    login_limiter: Arc<LoginRateLimiter>,
}

impl WebServer {
    /// Create a new web server.
    pub fn new(config: &Config, app_state: AppState) -> Result<Self> {
        let addr = format!("{}:{}", config.server.host, config.server.port)
            .parse()
            .map_err(|e| LifError::Config(format!("invalid server address: {e}")))?;

        Ok(Self {
            addr,
            app_state: Arc::new(app_state),
            login_limiter: Arc::new(LoginRateLimiter::new(config.web.login_rate_limit)),
        })
    }

    /// Get the server address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Start the recovery code cleanup background task.
    ///
    /// Runs every hour and removes expired and used codes.
    fn start_cleanup_task(db: Database) {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(CLEANUP_INTERVAL_SECS));

            // Skip the first immediate tick
            interval.tick().await;

            loop {
                interval.tick().await;

                match RecoveryCodeRepository::new(db.pool()).cleanup().await {
                    Ok(0) => tracing::debug!("No expired recovery codes to clean up"),
                    Ok(count) => {
                        tracing::info!(deleted_count = count, "Cleaned up expired recovery codes")
                    }
                    Err(e) => tracing::warn!(error = %e, "Failed to cleanup recovery codes"),
                }
            }
        });
    }

    async fn bind(self) -> Result<(TcpListener, axum::Router)> {
        let db = self.app_state.db.clone();
        self.login_limiter.clone().start_cleanup_task();

        let router = create_router(self.app_state, self.login_limiter);

        let listener = TcpListener::bind(self.addr).await?;
        let local_addr = listener.local_addr()?;

        // Start background work only after a successful bind
        Self::start_cleanup_task(db);
        tracing::info!("Web server listening on http://{}", local_addr);

        Ok((listener, router))
    }

    /// Run the web server.
    pub async fn run(self) -> Result<()> {
        let (listener, router) = self.bind().await?;
        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await?;
        Ok(())
    }

    /// Run the server in the background and return the actual bound address.
    ///
    /// This is useful for testing when binding to port 0.
    pub async fn run_with_addr(self) -> Result<SocketAddr> {
        let (listener, router) = self.bind().await?;
        let local_addr = listener.local_addr()?;

        tokio::spawn(async move {
            if let Err(e) = axum::serve(
                listener,
                router.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await
            {
                tracing::error!("Web server error: {}", e);
            }
        });

        Ok(local_addr)
    }
}
