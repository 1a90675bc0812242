use anyhow::{Context, Result};
use axum::Router;
use chapter_api::{
    auth::JwtIdentity,
    config::{AppConfig, Mode},
    db, routes,
    services::{chapter_service::ChapterService, mux_client::MuxClient},
    state::AppState,
};
use std::{fs, io::ErrorKind, path::Path, sync::Arc};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // --- Logging setup ---
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // --- Parse config + run mode ---
    let (cfg, mode) = AppConfig::from_env_and_args()?;

    tracing::info!("Starting chapter-api with config: {:?}", cfg);

    // --- Initialize SQLite connection ---
    ensure_database_dir(&cfg.database_url)?;
    let pool = Arc::new(
        db::connect(&cfg.database_url)
            .await
            .with_context(|| format!("connecting to {}", cfg.database_url))?,
    );

    // --- Handle migration mode ---
    if mode == Mode::Migrate {
        db::migrate(&pool).await?;
        tracing::info!("Database migration complete.");
        return Ok(()); // exit after migration
    }

    // --- Initialize core service ---
    let mux = MuxClient::new(&cfg.mux()?);
    let chapters = ChapterService::new(pool.clone(), Arc::new(mux));

    if mode == Mode::Reconcile {
        let resolved = chapters.reconcile_video_states().await?;
        tracing::info!("Reconciled {} chapter video states.", resolved.len());
        return Ok(());
    }

    let state = AppState {
        chapters,
        identity: Arc::new(JwtIdentity::new(&cfg.auth()?)),
    };

    // --- Build router ---
    let app: Router = routes::routes::routes().with_state(state);

    // --- Start server ---
    let addr = cfg.addr();
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(err)
            if err.kind() == ErrorKind::PermissionDenied
                && matches!(cfg.host.as_str(), "0.0.0.0" | "::") =>
        {
            let fallback_addr = format!("127.0.0.1:{}", cfg.port);
            tracing::warn!(
                "Permission denied binding to {} ({}). Falling back to {}",
                addr,
                err,
                fallback_addr
            );
            TcpListener::bind(&fallback_addr).await?
        }
        Err(err) => return Err(err.into()),
    };

    tracing::info!("Server listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the parent directory of a file-backed SQLite URL.
fn ensure_database_dir(database_url: &str) -> Result<()> {
    if database_url.contains(":memory:") {
        return Ok(());
    }

    let db_path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .trim_start_matches("file:");
    let db_path = db_path.split('?').next().unwrap_or(db_path);
    tracing::debug!("Interpreted SQLite path => {}", db_path);

    if let Some(parent) = Path::new(db_path).parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
            tracing::info!("Created missing directory {:?}", parent);
        }
    }

    Ok(())
}
