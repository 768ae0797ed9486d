//! 登录 / 登出

use axum::{Json, extract::State, http::StatusCode};
use grc_auth_core::LandingTarget;
use grc_common::UserId;
use grc_errors::AppError;
use serde::{Deserialize, Serialize};

use crate::api::http::AppState;
use crate::api::http::error::{ApiError, ApiResult};
use crate::api::http::middleware::Ctx;
use crate::application::auth::LoginRequest;
use crate::domain::user::UserProfile;

#[derive(Debug, Default, Deserialize)]
pub struct LoginBody {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user_id: UserId,
    pub username: String,
    pub roles: Vec<String>,
    pub primary_role: Option<String>,
    pub landing: LandingTarget,
    pub redirect_to: &'static str,
    pub resumed: bool,
}

pub async fn login(
    State(state): State<AppState>,
    Ctx(ctx): Ctx,
    Json(body): Json<LoginBody>,
) -> ApiResult<Json<LoginResponse>> {
    let outcome = state
        .platform
        .login(
            &ctx,
            LoginRequest {
                username: body.username,
                password: body.password,
            },
        )
        .await?;

    Ok(Json(LoginResponse {
        token: outcome.token,
        user_id: outcome.claims.user_id(),
        username: outcome.claims.username.clone(),
        roles: outcome.claims.role_names(),
        primary_role: outcome.primary_role.map(String::from),
        landing: outcome.landing,
        redirect_to: outcome.landing.path(),
        resumed: outcome.resumed,
    }))
}

pub async fn logout(State(state): State<AppState>, Ctx(ctx): Ctx) -> ApiResult<StatusCode> {
    state.platform.logout(&ctx).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn me(State(state): State<AppState>, Ctx(ctx): Ctx) -> ApiResult<Json<UserProfile>> {
    state
        .platform
        .current_user(&ctx)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError(AppError::unauthenticated("Please log in to access this page.")))
}
