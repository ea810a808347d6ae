use std::path::PathBuf;

use tracing::{error, info};

use lif_auth::web::{AppState, WebServer};
use lif_auth::{mail, AccessControl, Config, Database};

fn config_path() -> PathBuf {
    std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.toml"))
}

#[tokio::main]
async fn main() {
    let path = config_path();
    let config = match Config::load_with_env(&path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load {}: {e}", path.display());
            eprintln!("Using default configuration.");
            let mut config = Config::default();
            config.apply_env_overrides();
            config
        }
    };

    if let Err(e) = lif_auth::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        lif_auth::logging::init_console_only(&config.logging.level);
    }

    if let Err(e) = run(config).await {
        error!("Server stopped: {}", e);
        std::process::exit(1);
    }
}

async fn run(config: Config) -> lif_auth::Result<()> {
    config.validate()?;

    info!("Lif Auth Server");
    info!(
        "Server configured on {}:{}",
        config.server.host, config.server.port
    );

    let db = Database::open(&config.database.path, config.database.max_connections).await?;
    let access_control = AccessControl::load(&config.access_control.path)?;
    info!(services = access_control.len(), "Access control loaded");

    let mailer = mail::from_config(&config.mail)?;
    if !mailer.is_enabled() {
        info!("Outgoing mail is disabled");
    }

    let state = AppState::new(db, config.clone(), access_control, mailer);
    WebServer::new(&config, state)?.run().await
}
