use crate::config::session::SessionConfig;
use crate::error::{AppError, AppResult};
use crate::middleware::SessionToken;
use crate::response::{page, redirect, redirect_with_flash};
use crate::routes::paths;
use crate::services::auth::AuthService;
use crate::services::email::EmailService;
use crate::services::session::SessionService;
use crate::utils::cookie::{append_set_cookie, build_clear_cookie, build_cookie, SESSION_COOKIE};
use crate::utils::flash::Flash;
use axum::{extract::Path, response::Response, Extension, Form};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const MSG_LOGGED_IN: &str = "Successfully logged in.";
pub const MSG_LOGGED_OUT: &str = "Successfully logged out.";
pub const MSG_REGISTERED: &str = "Account successfully created, please log in.";

#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterForm {
    /// Email address
    pub username: Option<String>,
    pub password: Option<String>,
    pub confirm_password: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginForm {
    /// Email address
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ResetRequestForm {
    /// Email address of the account
    pub username: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct NewPasswordForm {
    pub password: Option<String>,
    pub confirm_password: Option<String>,
}

/// Body of the static account pages.
#[derive(Debug, Serialize, ToSchema)]
pub struct PageInfo {
    pub page: String,
}

impl PageInfo {
    fn named(page: &str) -> Self {
        Self {
            page: page.to_string(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ResetConfirmPage {
    /// Whether the link can still be used to choose a new password
    pub validlink: bool,
}

#[utoipa::path(
    get,
    path = "/api/v1/auth/login",
    responses(
        (status = 200, description = "Login page, with any pending flash message", body = PageInfo),
    ),
    tag = "auth"
)]
pub async fn login_page(flash: Flash) -> AppResult<Response> {
    page(PageInfo::named("login"), flash)
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    request_body(content = LoginForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Logged in, redirect to the topic list"),
        (status = 400, description = "Missing fields", body = AppError),
        (status = 401, description = "Incorrect credentials", body = AppError),
    ),
    tag = "auth"
)]
pub async fn login(
    Extension(db): Extension<DatabaseConnection>,
    Extension(session_config): Extension<SessionConfig>,
    Form(form): Form<LoginForm>,
) -> AppResult<Response> {
    let user = AuthService::new(db.clone())
        .login(form.username.as_deref(), form.password.as_deref())
        .await?;

    let token = SessionService::new(db, session_config)
        .create(user.id)
        .await?;

    let mut response = redirect_with_flash(paths::TOPICS, MSG_LOGGED_IN)?;
    append_set_cookie(
        &mut response,
        &build_cookie(SESSION_COOKIE, &token, session_config.cookie_max_age()),
    )?;
    Ok(response)
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    request_body(content = RegisterForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Account created, redirect to login"),
        (status = 400, description = "Missing fields, invalid email or password mismatch", body = AppError),
        (status = 409, description = "Email already registered", body = AppError),
    ),
    tag = "auth"
)]
pub async fn register(
    Extension(db): Extension<DatabaseConnection>,
    Form(form): Form<RegisterForm>,
) -> AppResult<Response> {
    AuthService::new(db)
        .register(
            form.username.as_deref(),
            form.password.as_deref(),
            form.confirm_password.as_deref(),
        )
        .await?;

    redirect_with_flash(paths::LOGIN, MSG_REGISTERED)
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/logout",
    security(("session" = [])),
    responses(
        (status = 303, description = "Session ended, redirect to login"),
        (status = 401, description = "Unauthorized", body = AppError),
    ),
    tag = "auth"
)]
pub async fn logout(
    Extension(db): Extension<DatabaseConnection>,
    Extension(session_config): Extension<SessionConfig>,
    SessionToken(token): SessionToken,
) -> AppResult<Response> {
    SessionService::new(db, session_config)
        .revoke(&token)
        .await?;

    let mut response = redirect_with_flash(paths::LOGIN, MSG_LOGGED_OUT)?;
    append_set_cookie(&mut response, &build_clear_cookie(SESSION_COOKIE))?;
    Ok(response)
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/reset-password",
    request_body(content = ResetRequestForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Redirect to the done page, whether or not the account exists"),
        (status = 400, description = "Invalid email", body = AppError),
    ),
    tag = "auth"
)]
pub async fn request_reset(
    Extension(db): Extension<DatabaseConnection>,
    Extension(email_service): Extension<EmailService>,
    Form(form): Form<ResetRequestForm>,
) -> AppResult<Response> {
    AuthService::new(db)
        .request_reset(form.username.as_deref().unwrap_or_default(), &email_service)
        .await?;

    Ok(redirect(paths::RESET_DONE))
}

#[utoipa::path(
    get,
    path = "/api/v1/auth/reset-password/done",
    responses((status = 200, description = "Reset email sent page", body = PageInfo)),
    tag = "auth"
)]
pub async fn reset_done(flash: Flash) -> AppResult<Response> {
    page(PageInfo::named("reset_done"), flash)
}

#[utoipa::path(
    get,
    path = "/api/v1/auth/reset-password/confirm/{token}",
    params(("token" = String, Path, description = "Token from the reset email")),
    responses((status = 200, description = "Whether the link is usable", body = ResetConfirmPage)),
    tag = "auth"
)]
pub async fn reset_confirm_page(
    Extension(db): Extension<DatabaseConnection>,
    Path(token): Path<String>,
    flash: Flash,
) -> AppResult<Response> {
    let validlink = AuthService::new(db).check_reset_token(&token).await?;
    page(ResetConfirmPage { validlink }, flash)
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/reset-password/confirm/{token}",
    params(("token" = String, Path, description = "Token from the reset email")),
    request_body(content = NewPasswordForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Password changed, redirect to the complete page"),
        (status = 400, description = "Missing fields, mismatch, or invalid/expired link", body = AppError),
    ),
    tag = "auth"
)]
pub async fn redeem_reset(
    Extension(db): Extension<DatabaseConnection>,
    Path(token): Path<String>,
    Form(form): Form<NewPasswordForm>,
) -> AppResult<Response> {
    AuthService::new(db)
        .redeem_reset(
            &token,
            form.password.as_deref(),
            form.confirm_password.as_deref(),
        )
        .await?;

    Ok(redirect(paths::RESET_COMPLETE))
}

#[utoipa::path(
    get,
    path = "/api/v1/auth/reset-password/complete",
    responses((status = 200, description = "Password changed page", body = PageInfo)),
    tag = "auth"
)]
pub async fn reset_complete(flash: Flash) -> AppResult<Response> {
    page(PageInfo::named("reset_complete"), flash)
}
