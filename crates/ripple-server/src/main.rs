use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::http::{HeaderValue, Method, header};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use ripple_api::{AppState, AppStateInner, router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ripple=debug,tower_http=debug".into()),
        )
        .init();

    // Config. Secrets are read once here and handed into the state; the
    // two tokens must not be verifiable against each other's key.
    let access_secret = std::env::var("RIPPLE_ACCESS_SECRET")
        .unwrap_or_else(|_| "dev-access-secret-change-me".into());
    let refresh_secret = std::env::var("RIPPLE_REFRESH_SECRET")
        .unwrap_or_else(|_| "dev-refresh-secret-change-me".into());
    anyhow::ensure!(
        access_secret != refresh_secret,
        "RIPPLE_ACCESS_SECRET and RIPPLE_REFRESH_SECRET must differ"
    );

    let db_path = std::env::var("RIPPLE_DB_PATH").unwrap_or_else(|_| "ripple.db".into());
    let host = std::env::var("RIPPLE_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("RIPPLE_PORT")
        .unwrap_or_else(|_| "3001".into())
        .parse()?;
    let origin = std::env::var("RIPPLE_ALLOWED_ORIGIN")
        .unwrap_or_else(|_| "https://localhost:3000".into());

    // Init database
    let db = ripple_db::Database::open(&PathBuf::from(&db_path))?;

    let state: AppState = Arc::new(AppStateInner {
        db,
        access_secret,
        refresh_secret,
    });

    // Cookies are credentials, so CORS pins a single origin rather than
    // reflecting any.
    let cors = CorsLayer::new()
        .allow_origin(origin.parse::<HeaderValue>()?)
        .allow_methods([Method::GET, Method::POST, Method::PATCH])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true);

    let app = router(state).layer(cors).layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("ripple server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
