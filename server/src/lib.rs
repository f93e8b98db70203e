use std::any::Any;
use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Context;
use axum::{extract::DefaultBodyLimit, response::Response, routing::get, Router};
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::{catch_panic::CatchPanicLayer, classify::ServerErrorsFailureClass, trace::TraceLayer};
use tracing::Span;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod artifacts;
pub mod codec;
pub mod config;
pub mod domain;
pub mod error;
pub mod file_reply;
mod handlers;
pub mod pipeline;
pub mod sqlite;
pub mod state;

#[cfg(test)] // <-- not needed in integration tests
extern crate rstest;

use crate::artifacts::ArtifactStore;
use crate::config::Config;
use crate::domain::Storage;
use crate::sqlite::{Mode, Sqlite};
use crate::state::AppState;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Hard cap on a request body. Uploads above the 5 MiB image limit but below
/// this cap get a 400 from validation, larger bodies a JSON 413.
const MAX_REQUEST_BYTES: usize = 64 * 1024 * 1024;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::upload_image,
        handlers::get_images,
        handlers::download_image,
        handlers::get_analytics,
    ),
    components(schemas(
        kernel::ImageRecord,
        kernel::UploadSummary,
        kernel::UploadReply,
        kernel::MessageReply,
        kernel::Analytics,
        handlers::UploadForm,
    )),
    tags(
        (name = "images", description = "Image compression and retrieval API")
    )
)]
struct ApiDoc;

pub async fn run() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "imgpress=debug,server=debug,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    let state = bootstrap(&config)?;

    let socket = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(socket)
        .await
        .with_context(|| format!("cannot listen on {socket}"))?;
    tracing::info!("Server running on port {}", config.port);

    axum::serve(listener, create_routes(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

/// Prepares the uploads directory and database schema. Idempotent, runs once
/// before any request is accepted.
pub fn bootstrap(config: &Config) -> anyhow::Result<AppState> {
    let artifacts = ArtifactStore::new(&config.uploads);
    artifacts
        .init()
        .with_context(|| format!("uploads directory {} cannot be created", config.uploads.display()))?;

    Sqlite::open(&config.database, Mode::ReadWrite)
        .and_then(|s| s.new_database())
        .with_context(|| format!("database {} cannot be created", config.database.display()))?;

    Ok(AppState::new(config.database.clone(), artifacts))
}

pub fn create_routes(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/images",
            get(handlers::get_images).post(handlers::upload_image),
        )
        .route("/api/images/analytics", get(handlers::get_analytics))
        .route("/api/analytics", get(handlers::get_analytics))
        .route("/api/images/:id/download", get(handlers::download_image))
        .fallback(handlers::not_found)
        .with_state(state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http().on_failure(
                    |error: ServerErrorsFailureClass, _latency: Duration, _span: &Span| {
                        tracing::error!("Server error: {error}");
                    },
                ))
                .layer(CatchPanicLayer::custom(handle_panic))
                .layer(DefaultBodyLimit::max(MAX_REQUEST_BYTES))
                .into_inner(),
        )
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let details = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        (*s).to_owned()
    } else {
        String::from("unknown panic")
    };
    tracing::error!("handler panicked: {details}");
    error::generic_failure()
}

/// Resolves on Ctrl+C, or on SIGTERM where available.
pub async fn shutdown_signal() {
    let interrupted = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Ctrl+C cannot be watched: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminated = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("SIGTERM cannot be watched: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminated = std::future::pending::<()>();

    let reason = tokio::select! {
        () = interrupted => "interrupt",
        () = terminated => "terminate",
    };
    tracing::info!("{reason} received, draining connections before exit");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_lists_all_endpoints() {
        // Act
        let doc = ApiDoc::openapi();

        // Assert
        let paths: Vec<&String> = doc.paths.paths.keys().collect();
        assert!(paths.contains(&&"/api/images".to_owned()));
        assert!(paths.contains(&&"/api/images/{id}/download".to_owned()));
        assert!(paths.contains(&&"/api/images/analytics".to_owned()));
    }

    #[test]
    fn bootstrap_twice_is_fine() {
        // Arrange
        let root = std::env::temp_dir().join(format!("imgpress_boot_{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&root).unwrap();
        let config = Config {
            port: 0,
            database: root.join("boot.db"),
            uploads: root.join("uploads"),
        };

        // Act
        let first = bootstrap(&config);
        let second = bootstrap(&config);

        // Assert
        assert!(first.is_ok());
        assert!(second.is_ok());
        assert!(root.join("uploads").join("compressed").is_dir());
        std::fs::remove_dir_all(root).unwrap_or_default();
    }
}
