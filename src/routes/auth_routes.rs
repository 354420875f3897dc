use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use axum_extra::extract::WithRejection;

use crate::{
    auth::Credentials,
    error::ApiError,
    middleware::auth_context::AuthContext,
    models::*,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/me", get(me))
        .route("/logout", post(logout))
}

pub async fn login(
    State(state): State<AppState>,
    WithRejection(Json(req), _): WithRejection<Json<LoginRequest>, ApiError>,
) -> Result<Json<LoginResponse>, ApiError> {
    if req.username.trim().is_empty() || req.password.is_empty() {
        return Err(ApiError::validation("username and password are required"));
    }

    let signed_in = state
        .auth
        .authenticate(&Credentials {
            username: req.username,
            password: req.password,
        })
        .await?;

    Ok(Json(LoginResponse {
        data: LoginResponseData {
            access_token: signed_in.access_token,
            expires_at: signed_in.session.expires_at,
            user: signed_in.session.user,
        },
    }))
}

pub async fn me(auth: AuthContext) -> Result<Json<MeResponse>, ApiError> {
    Ok(Json(MeResponse {
        data: MeResponseData {
            user: auth.session.user,
            session_id: auth.session.session_id,
            expires_at: auth.session.expires_at,
        },
    }))
}

pub async fn logout(
    State(state): State<AppState>,
    auth: AuthContext,
) -> Result<Json<OkResponse>, ApiError> {
    state.auth.revoke(&auth.access_token).await?;
    tracing::info!(session_id = %auth.session.session_id, "admin signed out");
    Ok(Json(OkResponse {
        data: OkData { ok: true },
    }))
}
