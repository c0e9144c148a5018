use crate::handlers;
use crate::middleware::auth::auth_middleware;
use crate::services::upload::MAX_AVATAR_SIZE;
use axum::{extract::DefaultBodyLimit, middleware, routing, Router};

/// Absolute locations used as redirect targets.
pub mod paths {
    pub const LOGIN: &str = "/api/v1/auth/login";
    pub const RESET_DONE: &str = "/api/v1/auth/reset-password/done";
    pub const RESET_COMPLETE: &str = "/api/v1/auth/reset-password/complete";
    pub const TOPICS: &str = "/api/v1/topics";

    pub fn topic(id: i32) -> String {
        format!("{TOPICS}/{id}")
    }
}

pub fn create_routes() -> Router {
    Router::new().nest("/api/v1", api_routes())
}

fn api_routes() -> Router {
    let protected = protected_routes().layer(middleware::from_fn(auth_middleware));
    auth_routes().merge(protected)
}

/// Account routes reachable without a session.
fn auth_routes() -> Router {
    Router::new()
        .route(
            "/auth/login",
            routing::get(handlers::auth::login_page).post(handlers::auth::login),
        )
        .route("/auth/register", routing::post(handlers::auth::register))
        .route(
            "/auth/reset-password",
            routing::post(handlers::auth::request_reset),
        )
        .route(
            "/auth/reset-password/done",
            routing::get(handlers::auth::reset_done),
        )
        .route(
            "/auth/reset-password/confirm/{token}",
            routing::get(handlers::auth::reset_confirm_page).post(handlers::auth::redeem_reset),
        )
        .route(
            "/auth/reset-password/complete",
            routing::get(handlers::auth::reset_complete),
        )
}

fn protected_routes() -> Router {
    Router::new()
        .route("/auth/logout", routing::post(handlers::auth::logout))
        // Profile
        .route(
            "/profile",
            routing::get(handlers::user::get_profile).post(handlers::user::update_profile),
        )
        .route(
            "/profile/avatar",
            routing::post(handlers::user::upload_avatar)
                .layer(DefaultBodyLimit::max(MAX_AVATAR_SIZE + 64 * 1024)),
        )
        .route(
            "/profile/delete",
            routing::post(handlers::user::delete_account),
        )
        // Topics
        .route(
            "/topics",
            routing::get(handlers::topic::list_topics).post(handlers::topic::create_topic),
        )
        .route(
            "/topics/{id}",
            routing::get(handlers::topic::get_topic).post(handlers::topic::add_comment),
        )
        .route(
            "/topics/{id}/solved",
            routing::post(handlers::topic::toggle_solved),
        )
        .route(
            "/topics/{id}/delete",
            routing::post(handlers::topic::delete_topic),
        )
}
