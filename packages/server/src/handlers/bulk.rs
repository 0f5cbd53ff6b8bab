use axum::Json;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use sea_orm::{TransactionSession, TransactionTrait};
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::{ASSET_WRITE, AuthUser};
use crate::extractors::bulk::BulkPayload;
use crate::extractors::context::RequestContext;
use crate::models::bulk::BulkUploadResponse;
use crate::service::{IngestError, ingest};
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/assets/bulk/",
    tag = "Assets",
    operation_id = "bulkUploadAssets",
    summary = "Create many assets at once",
    description = "Accepts `application/json` (`{\"assets\": [...]}` or a bare array) or `multipart/form-data` with a `file` field holding CSV with a header row. Parents are referenced by `parent` name and must be created earlier in the same batch; organizations are always created first. Processing stops at the first failing row, which is reported by 1-based position. Requires `asset:write` permission.",
    request_body(
        content(
            (Vec<hierarchy_common::record::AssetRecord> = "application/json"),
            (String = "multipart/form-data"),
        ),
        description = "Asset rows as JSON, or a CSV file upload",
    ),
    responses(
        (status = 201, description = "All rows created", body = BulkUploadResponse),
        (status = 400, description = "A row failed (VALIDATION_ERROR, UNRESOLVED_PARENT, AMBIGUOUS_PARENT)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 413, description = "Upload exceeds the size limit (PAYLOAD_TOO_LARGE)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, ctx, payload))]
pub async fn bulk_upload(
    auth_user: AuthUser,
    ctx: RequestContext,
    State(state): State<AppState>,
    payload: BulkPayload,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_permission(ASSET_WRITE)?;

    let drafts = payload.into_drafts().map_err(IngestError::Invalid)?;
    if drafts.is_empty() {
        return Err(AppError::Validation("No assets provided".into()));
    }
    let max_rows = state.config.ingest.max_rows;
    if drafts.len() > max_rows {
        return Err(AppError::Validation(format!(
            "Too many assets: max {max_rows} per request"
        )));
    }

    let created = if state.config.ingest.atomic {
        let txn = state.db.begin().await?;
        let created = ingest(&txn, &ctx, drafts).await?;
        txn.commit().await?;
        created
    } else {
        ingest(&state.db, &ctx, drafts).await?
    };

    Ok((
        StatusCode::CREATED,
        Json(BulkUploadResponse {
            message: "Bulk upload successful".into(),
            count: created.len(),
        }),
    ))
}

pub fn bulk_body_limit(max_bytes: usize) -> DefaultBodyLimit {
    DefaultBodyLimit::max(max_bytes)
}
