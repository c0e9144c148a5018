use crate::{
    config::session::SessionConfig,
    error::AppError,
    services::session::SessionService,
    utils::cookie::{extract_cookie, SESSION_COOKIE},
};
use axum::{
    extract::{FromRequestParts, Request},
    http::{request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
    Extension,
};
use sea_orm::DatabaseConnection;

/// The signed-in account of the current request.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: i32,
}

/// Raw session token the request authenticated with; logout revokes it.
#[derive(Debug, Clone)]
pub struct SessionToken(pub String);

/// Session authentication middleware
///
/// Resolves the session token from `Authorization: Bearer` or the
/// `session_id` cookie and adds the user to the request extensions.
pub async fn auth_middleware(
    Extension(db): Extension<DatabaseConnection>,
    Extension(session_config): Extension<SessionConfig>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_bearer_token(&headers)
        .or_else(|| extract_cookie(&headers, SESSION_COOKIE))
        .ok_or(AppError::Unauthorized)?;

    let user = SessionService::new(db, session_config)
        .authenticate(&token)
        .await?;

    request
        .extensions_mut()
        .insert(AuthUser { user_id: user.id });
    request.extensions_mut().insert(SessionToken(token));

    Ok(next.run(request).await)
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let auth_header = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())?;

    let token = auth_header.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or(AppError::Unauthorized)
    }
}

impl<S> FromRequestParts<S> for SessionToken
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<SessionToken>()
            .cloned()
            .ok_or(AppError::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header, HeaderValue};

    #[test]
    fn bearer_token_is_extracted() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer abc.def"),
        );
        assert_eq!(extract_bearer_token(&headers), Some("abc.def".to_string()));
    }

    #[test]
    fn other_schemes_are_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic xyz"));
        assert_eq!(extract_bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(extract_bearer_token(&headers), None);
    }
}
