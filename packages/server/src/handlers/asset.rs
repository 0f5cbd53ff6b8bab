use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use hierarchy_common::AssetType;
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::{ASSET_DELETE, ASSET_READ, ASSET_WRITE, AuthUser};
use crate::extractors::context::RequestContext;
use crate::extractors::json::{AppJson, AppQuery};
use crate::models::asset::*;
use crate::service::AssetService;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/assets/",
    tag = "Assets",
    operation_id = "listAssets",
    summary = "List assets of one type",
    description = "Returns a paginated list of assets scoped by `asset_type` (default `organization`), ordered by name. Optional filters: `is_active`, `parent`, and a case-insensitive `search` on the name. Requires `asset:read` permission.",
    params(AssetListQuery),
    responses(
        (status = 200, description = "List of assets", body = AssetListResponse),
        (status = 400, description = "Invalid query (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, ctx, query))]
pub async fn list_assets(
    auth_user: AuthUser,
    ctx: RequestContext,
    State(state): State<AppState>,
    AppQuery(query): AppQuery<AssetListQuery>,
) -> Result<Json<AssetListResponse>, AppError> {
    auth_user.require_permission(ASSET_READ)?;

    let (assets, pagination) = AssetService::new(&state.db, &ctx).list(&query).await?;
    Ok(Json(AssetListResponse {
        data: assets.into_iter().map(AssetResponse::from).collect(),
        pagination,
    }))
}

#[utoipa::path(
    post,
    path = "/assets/",
    tag = "Assets",
    operation_id = "createAsset",
    summary = "Create an asset",
    description = "Creates one asset. `parent` is the id of an existing asset; organizations must not have one, every other type must, and machines cannot be parents. Requires `asset:write` permission.",
    request_body = CreateAssetRequest,
    responses(
        (status = 201, description = "Asset created", body = AssetResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, ctx, payload), fields(asset_name = %payload.asset_name))]
pub async fn create_asset(
    auth_user: AuthUser,
    ctx: RequestContext,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateAssetRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_permission(ASSET_WRITE)?;

    let stored = AssetService::new(&state.db, &ctx)
        .create(payload.into_draft())
        .await?;
    Ok((StatusCode::CREATED, Json(AssetResponse::from(stored))))
}

#[utoipa::path(
    get,
    path = "/assets/{id}/",
    tag = "Assets",
    operation_id = "getAsset",
    summary = "Get an asset by ID",
    description = "Returns the asset only if its type matches `asset_type` (default `organization`). Requires `asset:read` permission.",
    params(("id" = i32, Path, description = "Asset ID"), ScopeQuery),
    responses(
        (status = 200, description = "Asset details", body = AssetResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "No asset of that type with this id (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, ctx, scope), fields(id))]
pub async fn get_asset(
    auth_user: AuthUser,
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppQuery(scope): AppQuery<ScopeQuery>,
) -> Result<Json<AssetResponse>, AppError> {
    auth_user.require_permission(ASSET_READ)?;

    let scope = scope.asset_type.unwrap_or(AssetType::Organization);
    let stored = AssetService::new(&state.db, &ctx)
        .retrieve_scoped(id, scope)
        .await?;
    Ok(Json(stored.into()))
}

#[utoipa::path(
    put,
    path = "/assets/{id}/",
    tag = "Assets",
    operation_id = "replaceAsset",
    summary = "Replace an asset",
    description = "Overwrites every writable field. Omitted optional fields are cleared, except `details`, which are kept when omitted. The new state is validated as a whole, and moving an asset below one of its own descendants is rejected. Requires `asset:write` permission.",
    params(("id" = i32, Path, description = "Asset ID")),
    request_body = CreateAssetRequest,
    responses(
        (status = 200, description = "Asset replaced", body = AssetResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Asset not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, ctx, payload), fields(id))]
pub async fn replace_asset(
    auth_user: AuthUser,
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<CreateAssetRequest>,
) -> Result<Json<AssetResponse>, AppError> {
    auth_user.require_permission(ASSET_WRITE)?;

    let stored = AssetService::new(&state.db, &ctx)
        .replace(id, payload.into_draft())
        .await?;
    Ok(Json(stored.into()))
}

#[utoipa::path(
    patch,
    path = "/assets/{id}/",
    tag = "Assets",
    operation_id = "updateAsset",
    summary = "Partially update an asset",
    description = "Only provided fields are modified; `null` clears `parent`, `description`, `end_date` or `details`. The merged state is validated as a whole. Requires `asset:write` permission.",
    params(("id" = i32, Path, description = "Asset ID")),
    request_body = UpdateAssetRequest,
    responses(
        (status = 200, description = "Asset updated", body = AssetResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Asset not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, ctx, payload), fields(id))]
pub async fn update_asset(
    auth_user: AuthUser,
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateAssetRequest>,
) -> Result<Json<AssetResponse>, AppError> {
    auth_user.require_permission(ASSET_WRITE)?;

    let stored = AssetService::new(&state.db, &ctx)
        .update(id, payload)
        .await?;
    Ok(Json(stored.into()))
}

#[utoipa::path(
    delete,
    path = "/assets/{id}/",
    tag = "Assets",
    operation_id = "deleteAsset",
    summary = "Delete an asset and its subtree",
    description = "Deletes the asset together with every descendant and all attached details. Requires `asset:delete` permission.",
    params(("id" = i32, Path, description = "Asset ID")),
    responses(
        (status = 204, description = "Asset deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Asset not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, ctx), fields(id))]
pub async fn delete_asset(
    auth_user: AuthUser,
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    auth_user.require_permission(ASSET_DELETE)?;

    AssetService::new(&state.db, &ctx).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/assets/{id}/children/",
    tag = "Assets",
    operation_id = "listAssetChildren",
    summary = "List assets below an asset",
    description = "Returns every descendant of the asset (`recursive=true`, the default) or only its direct children (`recursive=false`). `asset_type` narrows the result without pruning the walk. Requires `asset:read` permission.",
    params(("id" = i32, Path, description = "Asset ID"), ChildrenQuery),
    responses(
        (status = 200, description = "Assets below the given asset", body = Vec<AssetResponse>),
        (status = 400, description = "Invalid query (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Asset not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, ctx, query), fields(id))]
pub async fn list_children(
    auth_user: AuthUser,
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppQuery(query): AppQuery<ChildrenQuery>,
) -> Result<Json<Vec<AssetResponse>>, AppError> {
    auth_user.require_permission(ASSET_READ)?;

    let service = AssetService::new(&state.db, &ctx);
    let assets = if query.recursive.unwrap_or(true) {
        service.descendants(id, query.asset_type).await?
    } else {
        service.children_of(id, query.asset_type).await?
    };
    Ok(Json(assets.into_iter().map(AssetResponse::from).collect()))
}
