//! 合规控制项与风险映射

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use grc_common::{ControlId, MappingId, RiskId};
use serde::{Deserialize, Serialize};

use crate::api::http::AppState;
use crate::api::http::error::ApiResult;
use crate::api::http::middleware::Ctx;
use crate::application::compliance::{ControlsOverview, RiskMappings};

#[derive(Debug, Deserialize)]
pub struct AddMappingBody {
    pub control_id: ControlId,
    pub mapping_type: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MappingCreated {
    pub mapping_id: MappingId,
}

pub async fn controls(State(state): State<AppState>, Ctx(ctx): Ctx) -> ApiResult<Json<ControlsOverview>> {
    Ok(Json(state.platform.compliance_controls(&ctx).await?))
}

pub async fn list_mappings(
    State(state): State<AppState>,
    Ctx(ctx): Ctx,
    Path(risk_id): Path<i64>,
) -> ApiResult<Json<RiskMappings>> {
    Ok(Json(state.platform.risk_mappings(&ctx, RiskId(risk_id)).await?))
}

pub async fn add_mapping(
    State(state): State<AppState>,
    Ctx(ctx): Ctx,
    Path(risk_id): Path<i64>,
    Json(body): Json<AddMappingBody>,
) -> ApiResult<(StatusCode, Json<MappingCreated>)> {
    let mapping_id = state
        .platform
        .add_mapping(&ctx, RiskId(risk_id), body.control_id, body.mapping_type.as_deref())
        .await?;
    Ok((StatusCode::CREATED, Json(MappingCreated { mapping_id })))
}

pub async fn remove_mapping(
    State(state): State<AppState>,
    Ctx(ctx): Ctx,
    Path((risk_id, mapping_id)): Path<(i64, i64)>,
) -> ApiResult<StatusCode> {
    state
        .platform
        .remove_mapping(&ctx, MappingId(mapping_id), RiskId(risk_id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
