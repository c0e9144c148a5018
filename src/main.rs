use agora::{
    config::{
        database::{self, DatabaseConfig},
        session::SessionConfig,
    },
    create_app,
    migration::Migrator,
    services::{email::EmailService, upload::UploadConfig},
    AppContext,
};
use sea_orm_migration::MigratorTrait;
use std::env;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let registry = tracing_subscriber::registry().with(
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "agora=debug,tower_http=debug,axum=debug".into()),
    );
    if env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json")) {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    // Validate configuration before doing anything else
    let db_config = DatabaseConfig::from_env()?;
    let session_config = SessionConfig::from_env()?;
    let upload_config = UploadConfig::from_env();
    std::fs::create_dir_all(&upload_config.upload_dir).map_err(|e| {
        anyhow::anyhow!(
            "Failed to create upload directory '{}': {}",
            upload_config.upload_dir.display(),
            e
        )
    })?;

    tracing::info!("Starting agora v{}...", env!("CARGO_PKG_VERSION"));

    let db = database::connect(&db_config).await?;
    tracing::info!("Database connected successfully");

    Migrator::up(&db, None).await?;
    tracing::info!("Database migrations applied successfully");

    let email_service = EmailService::from_env();

    let app = create_app(AppContext {
        db,
        email_service,
        session_config,
        upload_config,
    });

    let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port = env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("{}:{}", host, port);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui/", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shut down gracefully");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, gracefully shutting down...");
}
