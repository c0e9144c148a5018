//! One-shot success messages carried across a redirect in a cookie.

use crate::error::AppError;
use crate::utils::cookie::{extract_cookie, FLASH_COOKIE};
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};

/// Seconds a flash survives if the redirect target is never fetched.
pub const FLASH_MAX_AGE: u64 = 60;

pub fn encode_flash(message: &str) -> String {
    URL_SAFE_NO_PAD.encode(message.as_bytes())
}

pub fn decode_flash(raw: &str) -> Option<String> {
    let bytes = URL_SAFE_NO_PAD.decode(raw).ok()?;
    String::from_utf8(bytes).ok()
}

/// Pending flash message of the current request, if any.
#[derive(Debug, Clone, Default)]
pub struct Flash(pub Option<String>);

impl<S> FromRequestParts<S> for Flash
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Flash(
            extract_cookie(&parts.headers, FLASH_COOKIE).and_then(|raw| decode_flash(&raw)),
        ))
    }
}
