use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{get, post, put},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use wave_api::auth::{self, AppState, AppStateInner};
use wave_api::middleware::{jwt_secret, require_auth};
use wave_api::sms::SmsClient;
use wave_api::{assist, profile};
use wave_assist::AssistClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wave=debug,tower_http=debug".into()),
        )
        .init();

    // Config
    let jwt_secret = jwt_secret();
    let db_path = std::env::var("WAVE_DB_PATH").unwrap_or_else(|_| "wave.db".into());
    let host = std::env::var("WAVE_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("WAVE_PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()?;
    let dev_mode = std::env::var("WAVE_ENV").map(|e| e != "production").unwrap_or(true);

    // Init database
    let db = wave_db::Database::open(&PathBuf::from(&db_path))?;

    // Shared state
    let state: AppState = Arc::new(AppStateInner {
        db,
        jwt_secret,
        sms: SmsClient::from_env(),
        assist: AssistClient::from_env(),
        dev_mode,
    });

    // Routes
    let public_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/verify", post(auth::verify))
        .with_state(state.clone());

    let protected_routes = Router::new()
        .route("/user/profile", get(profile::get_profile))
        .route("/user/profile", put(profile::update_profile))
        .route("/assist/emojis", post(assist::suggest_emojis))
        .route("/assist/replies", post(assist::smart_replies))
        .route("/assist/summary", post(assist::summarize))
        .layer(middleware::from_fn(require_auth))
        .with_state(state);

    let app = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Wave server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
