pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod migration;
pub mod models;
pub mod openapi;
pub mod response;
pub mod routes;
pub mod services;
pub mod utils;

pub use error::{AppError, AppResult};
pub use middleware::auth::AuthUser;
pub use response::ApiResponse;

use axum::{extract::Extension, middleware as axum_middleware, routing::get, Json, Router};
use config::session::SessionConfig;
use sea_orm::DatabaseConnection;
use serde_json::json;
use services::{email::EmailService, upload::UploadConfig};
use std::env;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Everything a request handler may pull out of the request extensions.
#[derive(Clone)]
pub struct AppContext {
    pub db: DatabaseConnection,
    pub email_service: EmailService,
    pub session_config: SessionConfig,
    pub upload_config: UploadConfig,
}

/// Assemble the full HTTP application.
pub fn create_app(ctx: AppContext) -> Router {
    let uploads = ServeDir::new(&ctx.upload_config.upload_dir);

    Router::new()
        .route("/", get(health_check))
        .merge(routes::create_routes())
        .merge(
            SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi::ApiDoc::openapi()),
        )
        .nest_service("/uploads", uploads)
        .layer(axum_middleware::from_fn(
            middleware::security::security_headers_middleware,
        ))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors_layer())
                .layer(Extension(ctx.db))
                .layer(Extension(ctx.email_service))
                .layer(Extension(ctx.session_config))
                .layer(Extension(ctx.upload_config)),
        )
}

fn build_cors_layer() -> CorsLayer {
    use axum::http::{header, HeaderValue, Method};

    let origins_str = env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string());

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    if origins_str == "*" {
        cors.allow_origin(tower_http::cors::Any)
    } else {
        let origins: Vec<HeaderValue> = origins_str
            .split(',')
            .filter_map(|s| s.trim().parse().ok())
            .collect();
        cors.allow_origin(origins)
    }
}

#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Health check successful", body = serde_json::Value)
    )
)]
pub(crate) async fn health_check(
    Extension(db): Extension<DatabaseConnection>,
) -> Json<serde_json::Value> {
    let db_ok = db.ping().await.is_ok();
    let status = if db_ok { "ok" } else { "degraded" };

    Json(json!({
        "status": status,
        "service": "agora",
        "version": env!("CARGO_PKG_VERSION"),
        "database": db_ok,
    }))
}
