mod config;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

use roost_api::contact::{self, ContactRelay};
use roost_api::geocode::NominatimGeocoder;
use roost_api::mailer::{self, MailTransport, SmtpMailer};
use roost_api::probe::HttpProbe;
use roost_api::uploads::ImageStore;
use roost_api::{AppState, AppStateInner};

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "roost=debug,roost_api=debug,roost_db=info,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env()?;

    // Init database and image storage
    let db = roost_db::Database::open(&config.db_path)?;
    let images = ImageStore::new(config.upload_dir.clone()).await?;

    // External collaborators
    let transport: Arc<dyn MailTransport> = Arc::new(SmtpMailer::new(&config.smtp)?);
    let relay = Arc::new(ContactRelay::new(transport.clone(), config.contact_recipient.clone()));

    let state: AppState = Arc::new(AppStateInner {
        db,
        jwt_secret: config.jwt_secret.clone(),
        images,
        geocoder: Arc::new(NominatimGeocoder::new(config.geocoder_url.clone())?),
        probe: Arc::new(HttpProbe::new(Duration::from_secs(5))?),
        contact: relay.clone(),
    });

    // SMTP check is informational; the relay still tries later on failure
    tokio::spawn(mailer::verify_on_startup(transport));

    // Background rate-limit sweep (runs every hour)
    tokio::spawn(contact::run_sweep_loop(relay, Duration::from_secs(3600)));

    let app = roost_api::routes::router(state)
        .nest_service("/uploads", ServeDir::new(&config.upload_dir))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Roost server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        let mut sigterm =
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(s) => s,
                Err(e) => {
                    tracing::warn!("failed to install SIGTERM handler: {}", e);
                    ctrl_c.await.ok();
                    return;
                }
            };
        tokio::select! {
            _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
            _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
