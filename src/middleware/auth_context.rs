use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::TypedHeader;
use headers::{Authorization, authorization::Bearer};

use crate::auth::Session;
use crate::error::ApiError;
use crate::models::AppState;

#[derive(Debug, Clone)]
pub struct AuthContext {
    pub session: Session,
    pub access_token: String,
}

impl AuthContext {
    pub fn ensure_master(&self) -> Result<(), ApiError> {
        if self.session.is_master() {
            Ok(())
        } else {
            Err(ApiError::Forbidden(
                "FORBIDDEN",
                "Only the salon owner can view analytics".into(),
            ))
        }
    }
}

impl FromRequestParts<AppState> for AuthContext {
    type Rejection = ApiError;

    fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        async move {
            // Extract Authorization: Bearer <token>
            let TypedHeader(authz): TypedHeader<Authorization<Bearer>> =
                TypedHeader::from_request_parts(parts, state)
                    .await
                    .map_err(|_| ApiError::session_expired())?;

            let access_token = authz.token().to_string();
            let session = state
                .auth
                .current_session(&access_token)
                .await?
                .ok_or_else(ApiError::session_expired)?;

            Ok(AuthContext {
                session,
                access_token,
            })
        }
    }
}
