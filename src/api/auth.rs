//! Caller identity
//!
//! Authentication happens upstream; the gateway forwards the verified user id
//! in the `X-User-Id` header. Handlers take [`AuthUser`] as an extractor so a
//! missing id is rejected before any work is done.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use crate::api::error::ApiError;

pub const USER_ID_HEADER: &str = "x-user-id";

/// Authenticated user id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser(pub String);

impl AuthUser {
    pub fn id(&self) -> &str {
        &self.0
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or(ApiError::Unauthorized)?;

        Ok(AuthUser(user_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(req: Request<()>) -> Result<AuthUser, ApiError> {
        let (mut parts, _) = req.into_parts();
        AuthUser::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn test_header_present() {
        let req = Request::builder()
            .header(USER_ID_HEADER, " user-42 ")
            .body(())
            .unwrap();
        assert_eq!(extract(req).await.unwrap().id(), "user-42");
    }

    #[tokio::test]
    async fn test_missing_or_blank_header() {
        let req = Request::builder().body(()).unwrap();
        assert!(matches!(extract(req).await, Err(ApiError::Unauthorized)));

        let req = Request::builder().header(USER_ID_HEADER, "  ").body(()).unwrap();
        assert!(matches!(extract(req).await, Err(ApiError::Unauthorized)));
    }
}
