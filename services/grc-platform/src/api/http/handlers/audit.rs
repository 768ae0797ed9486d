//! 审计轨迹查看与导出

use axum::{
    Json,
    extract::{Query, State},
    http::header,
    response::IntoResponse,
};
use serde::Deserialize;

use crate::api::http::AppState;
use crate::api::http::error::ApiResult;
use crate::api::http::middleware::Ctx;
use crate::application::audit::AuditTrail;
use crate::domain::audit::TrailParams;

#[derive(Debug, Default, Deserialize)]
pub struct ExportParams {
    pub days: Option<String>,
}

pub async fn trail(
    State(state): State<AppState>,
    Ctx(ctx): Ctx,
    Query(params): Query<TrailParams>,
) -> ApiResult<Json<AuditTrail>> {
    Ok(Json(state.platform.audit_trail(&ctx, &params).await?))
}

pub async fn export(
    State(state): State<AppState>,
    Ctx(ctx): Ctx,
    Query(params): Query<ExportParams>,
) -> ApiResult<impl IntoResponse> {
    let export = state
        .platform
        .export_audit_log(&ctx, params.days.as_deref())
        .await?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", export.filename),
            ),
        ],
        export.content,
    ))
}
