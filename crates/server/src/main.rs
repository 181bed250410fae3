use std::path::PathBuf;
use std::sync::Arc;

use modelsnip_engine::ModelSession;

mod config;
mod routes;

use config::ServerConfig;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "modelsnip_server=info,modelsnip_engine=info".into()),
        )
        .init();

    let config = match parse_config_arg() {
        Some(path) => match ServerConfig::load(&path) {
            Ok(config) => {
                tracing::info!("Loaded config from {}", path.display());
                config
            }
            Err(e) => {
                tracing::error!("{e}");
                return;
            }
        },
        None => ServerConfig::default(),
    }
    .with_env();

    let state = routes::AppState {
        session: Arc::new(ModelSession::new(config.engine.clone())),
    };
    let app = routes::router(state);

    let listener = match tokio::net::TcpListener::bind(&config.bind).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind {}: {e}", config.bind);
            return;
        }
    };
    tracing::info!("Server running on http://{}", config.bind);
    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("Server error: {e}");
    }
}

/// Parse `--config <path>`
fn parse_config_arg() -> Option<PathBuf> {
    let args: Vec<String> = std::env::args().collect();
    let mut i = 1;
    while i < args.len() {
        if args[i] == "--config" && i + 1 < args.len() {
            return Some(PathBuf::from(&args[i + 1]));
        }
        i += 1;
    }
    None
}
