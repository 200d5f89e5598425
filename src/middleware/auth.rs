use crate::{
    error::{AppError, AppResult},
    models,
    models::User,
    store::{SharedStore, StoreResultExt},
    utils::jwt::{decode_jwt, is_access_token},
};
use axum::{
    extract::{FromRequestParts, Request},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
    Extension,
};

/// Authenticated caller, inserted into request extensions by [`auth_middleware`].
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
}

/// Verifies the bearer token and makes sure the user document exists and is
/// not banned.
pub async fn auth_middleware(
    Extension(store): Extension<SharedStore>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_bearer_token(&headers).ok_or(AppError::Unauthorized)?;
    let claims = decode_jwt(&token).map_err(|_| AppError::Unauthorized)?;
    if !is_access_token(&claims) {
        return Err(AppError::Unauthorized);
    }

    let user = load_user(&store, &claims.sub)
        .await?
        .ok_or(AppError::Unauthorized)?;
    if user.is_banned() {
        return Err(AppError::Forbidden);
    }

    request.extensions_mut().insert(AuthUser { user_id: user.id });
    Ok(next.run(request).await)
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())?
        .strip_prefix("Bearer ")?
        .trim();
    (!token.is_empty()).then(|| token.to_string())
}

async fn load_user(store: &SharedStore, user_id: &str) -> AppResult<Option<User>> {
    match store.get_by_id(models::USERS, user_id).await.or_empty()? {
        Some(doc) => Ok(Some(doc.decode()?)),
        None => Ok(None),
    }
}

/// Verify the current user has admin role; returns the admin's id.
pub async fn require_admin(store: &SharedStore, auth_user: &AuthUser) -> AppResult<String> {
    let user = load_user(store, &auth_user.user_id)
        .await?
        .ok_or(AppError::Unauthorized)?;
    if !user.is_admin() {
        return Err(AppError::Forbidden);
    }
    Ok(user.id)
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

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn bearer_token_is_extracted() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(extract_bearer_token(&headers).as_deref(), Some("abc.def"));
    }

    #[test]
    fn missing_or_empty_bearer_is_rejected() {
        let mut headers = HeaderMap::new();
        assert!(extract_bearer_token(&headers).is_none());
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert!(extract_bearer_token(&headers).is_none());
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic dXNlcg=="));
        assert!(extract_bearer_token(&headers).is_none());
    }
}
