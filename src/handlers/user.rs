use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;
use crate::response::{page, redirect_with_flash, ApiResponse};
use crate::routes::paths;
use crate::services::upload::{UploadConfig, UploadService};
use crate::services::user::{ProfileView, UserService};
use crate::utils::cookie::{append_set_cookie, build_clear_cookie, SESSION_COOKIE};
use crate::utils::flash::Flash;
use axum::{
    extract::Multipart,
    response::{IntoResponse, Response},
    Extension, Form,
};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const MSG_PROFILE_UPDATED: &str = "Profile successfully updated.";
pub const MSG_ACCOUNT_DELETED: &str = "Your account has been deleted.";

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateProfileForm {
    /// New email address
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UploadResponse {
    pub url: String,
}

#[utoipa::path(
    get,
    path = "/api/v1/profile",
    security(("session" = [])),
    responses(
        (status = 200, description = "Current account", body = ProfileView),
        (status = 401, description = "Unauthorized", body = AppError),
    ),
    tag = "profile"
)]
pub async fn get_profile(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    flash: Flash,
) -> AppResult<Response> {
    let user = UserService::new(db).get_by_id(auth_user.user_id).await?;
    page(ProfileView::from(user), flash)
}

#[utoipa::path(
    post,
    path = "/api/v1/profile",
    security(("session" = [])),
    request_body(content = UpdateProfileForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Profile updated, redirect to the topic list"),
        (status = 400, description = "Missing fields or invalid email", body = AppError),
        (status = 409, description = "Email used by another account", body = AppError),
    ),
    tag = "profile"
)]
pub async fn update_profile(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Form(form): Form<UpdateProfileForm>,
) -> AppResult<Response> {
    UserService::new(db)
        .update_profile(
            auth_user.user_id,
            form.username.as_deref(),
            form.first_name.as_deref(),
            form.last_name.as_deref(),
        )
        .await?;

    redirect_with_flash(paths::TOPICS, MSG_PROFILE_UPDATED)
}

/// Upload and set the user's avatar (multipart form, field `file`).
#[utoipa::path(
    post,
    path = "/api/v1/profile/avatar",
    security(("session" = [])),
    request_body(content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Avatar stored", body = UploadResponse),
        (status = 400, description = "Missing or unsupported file", body = AppError),
        (status = 413, description = "File too large", body = AppError),
    ),
    tag = "profile"
)]
pub async fn upload_avatar(
    Extension(db): Extension<DatabaseConnection>,
    Extension(config): Extension<UploadConfig>,
    auth_user: AuthUser,
    mut multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let (content_type, data) = loop {
        let field = multipart
            .next_field()
            .await
            .map_err(|e| AppError::Validation(format!("Failed to read upload: {e}")))?
            .ok_or_else(|| AppError::validation("No file provided"))?;
        if field.name() != Some("file") {
            continue;
        }

        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Failed to read file data: {e}")))?;
        break (content_type, data);
    };

    let url = UploadService::save_avatar(&config, &data, &content_type).await?;
    UserService::new(db)
        .update_avatar_url(auth_user.user_id, &url)
        .await?;

    Ok(ApiResponse::ok(UploadResponse { url }))
}

#[utoipa::path(
    post,
    path = "/api/v1/profile/delete",
    security(("session" = [])),
    responses(
        (status = 303, description = "Account and its content deleted, redirect to login"),
        (status = 401, description = "Unauthorized", body = AppError),
    ),
    tag = "profile"
)]
pub async fn delete_account(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
) -> AppResult<Response> {
    UserService::new(db)
        .delete_account(auth_user.user_id)
        .await?;

    let mut response = redirect_with_flash(paths::LOGIN, MSG_ACCOUNT_DELETED)?;
    append_set_cookie(&mut response, &build_clear_cookie(SESSION_COOKIE))?;
    Ok(response)
}
