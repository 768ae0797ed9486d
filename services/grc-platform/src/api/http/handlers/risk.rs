//! 风险登记、热力图与生命周期操作

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use grc_common::RiskId;
use serde::Deserialize;

use crate::api::http::AppState;
use crate::api::http::error::ApiResult;
use crate::api::http::middleware::Ctx;
use crate::application::risk::{CreatedRisk, DeletedRisk, HeatMap, RiskRegister, RiskSummary, StatusChange};
use crate::domain::risk::RiskDraft;

#[derive(Debug, Deserialize)]
pub struct StatusBody {
    #[serde(default)]
    pub status: String,
}

pub async fn register(State(state): State<AppState>, Ctx(ctx): Ctx) -> ApiResult<Json<RiskRegister>> {
    Ok(Json(state.platform.risk_register(&ctx).await?))
}

pub async fn heat_map(State(state): State<AppState>, Ctx(ctx): Ctx) -> ApiResult<Json<HeatMap>> {
    Ok(Json(state.platform.heat_map(&ctx).await?))
}

pub async fn dashboard(State(state): State<AppState>, Ctx(ctx): Ctx) -> ApiResult<Json<RiskSummary>> {
    Ok(Json(state.platform.dashboard(&ctx).await?))
}

pub async fn create(
    State(state): State<AppState>,
    Ctx(ctx): Ctx,
    Json(draft): Json<RiskDraft>,
) -> ApiResult<(StatusCode, Json<CreatedRisk>)> {
    let created = state.platform.create_risk(&ctx, draft).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update_status(
    State(state): State<AppState>,
    Ctx(ctx): Ctx,
    Path(id): Path<i64>,
    Json(body): Json<StatusBody>,
) -> ApiResult<Json<StatusChange>> {
    Ok(Json(
        state
            .platform
            .update_risk_status(&ctx, RiskId(id), &body.status)
            .await?,
    ))
}

pub async fn delete(
    State(state): State<AppState>,
    Ctx(ctx): Ctx,
    Path(id): Path<i64>,
) -> ApiResult<Json<DeletedRisk>> {
    Ok(Json(state.platform.delete_risk(&ctx, RiskId(id)).await?))
}
