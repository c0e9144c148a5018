use crate::{
    error::AppResult,
    utils::{
        cookie::{append_set_cookie, build_clear_cookie, build_cookie, FLASH_COOKIE},
        flash::{encode_flash, Flash, FLASH_MAX_AGE},
    },
};
use axum::{
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> axum::response::Response {
        Json(self).into_response()
    }
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn with_message(data: T, message: Option<String>) -> Self {
        Self {
            success: true,
            data: Some(data),
            message,
        }
    }
}

/// Render a page body, showing the pending flash message once and clearing
/// its cookie.
pub fn page<T: Serialize>(data: T, flash: Flash) -> AppResult<Response> {
    let consumed = flash.0.is_some();
    let mut response = ApiResponse::with_message(data, flash.0).into_response();
    if consumed {
        append_set_cookie(&mut response, &build_clear_cookie(FLASH_COOKIE))?;
    }
    Ok(response)
}

/// `303 See Other` to `location`.
pub fn redirect(location: &str) -> Response {
    Redirect::to(location).into_response()
}

/// `303 See Other` to `location`, leaving `message` for the next page.
pub fn redirect_with_flash(location: &str, message: &str) -> AppResult<Response> {
    let mut response = redirect(location);
    append_set_cookie(
        &mut response,
        &build_cookie(FLASH_COOKIE, &encode_flash(message), FLASH_MAX_AGE),
    )?;
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header, StatusCode};

    #[test]
    fn redirect_is_see_other() {
        let resp = redirect("/api/v1/topics");
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(resp.headers()[header::LOCATION], "/api/v1/topics");
    }

    #[test]
    fn flash_redirect_sets_cookie() {
        let resp = redirect_with_flash("/api/v1/auth/login", "Successfully logged out.").unwrap();
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        let cookie = resp.headers()[header::SET_COOKIE].to_str().unwrap();
        assert!(cookie.starts_with(&format!(
            "flash={}",
            encode_flash("Successfully logged out.")
        )));
    }

    #[test]
    fn page_clears_consumed_flash() {
        let resp = page("body", Flash(Some("hello".to_string()))).unwrap();
        let cookie = resp.headers()[header::SET_COOKIE].to_str().unwrap();
        assert!(cookie.starts_with("flash=;"));
    }

    #[test]
    fn page_without_flash_sets_no_cookie() {
        let resp = page("body", Flash(None)).unwrap();
        assert!(resp.headers().get(header::SET_COOKIE).is_none());
    }
}
