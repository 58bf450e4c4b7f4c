use std::net::SocketAddr;
use std::sync::Arc;

use aide::openapi::OpenApi;
use axum::{Extension, Router};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::routes;
use crate::{
    photos::PhotoService,
    types::{AccessSettings, Config, Environment, SiteDirs},
};

/// Builds the application router with all layers and shared state
///
/// Requests that match no route are served from the public directory.
/// Pages live in a separate directory so no path spelling can reach them
/// through the fallback.
pub fn app(
    environment: Environment,
    access: &AccessSettings,
    site: &SiteDirs,
    photo_service: Arc<PhotoService>,
) -> Router {
    let mut openapi = OpenApi::default();

    let mut router = routes::handler(access.policy, &site.pages)
        .finish_api(&mut openapi)
        .fallback_service(ServeDir::new(&site.public))
        .layer(Extension(Arc::new(openapi)))
        .layer(Extension(environment))
        .layer(Extension(access.policy))
        .layer(Extension(photo_service));

    if let Some(gate) = &access.gate {
        router = router.layer(Extension(Arc::new(gate.clone())));
    }

    router
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Starts the server with the given configuration and dependencies
///
/// # Errors
///
/// Returns an error if the server fails to start or bind to the port
pub async fn start(config: Config, photo_service: Arc<PhotoService>) -> anyhow::Result<()> {
    for dir in [&config.site.pages, &config.site.public] {
        if !dir.is_dir() {
            tracing::warn!(dir = %dir.display(), "Directory does not exist, its files will return 404");
        }
    }

    let router = app(config.environment, &config.access, &config.site, photo_service);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(
        access_gate = %config.access.policy,
        "🔄 Photo Gateway started on http://{addr}"
    );

    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(anyhow::Error::from)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("Received Ctrl+C, shutting down"),
        () = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
}
