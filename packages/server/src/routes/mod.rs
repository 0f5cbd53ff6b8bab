use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::config::AppConfig;
use crate::handlers;
use crate::state::AppState;

/// Routes mounted under `/api`.
pub fn api_routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .merge(asset_routes())
        .merge(bulk_routes(config.ingest.max_upload_bytes))
}

fn asset_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::asset::list_assets,
            handlers::asset::create_asset
        ))
        .routes(routes!(
            handlers::asset::get_asset,
            handlers::asset::replace_asset,
            handlers::asset::update_asset,
            handlers::asset::delete_asset
        ))
        .routes(routes!(handlers::asset::list_children))
}

fn bulk_routes(max_upload_bytes: usize) -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::bulk::bulk_upload))
        .layer(handlers::bulk::bulk_body_limit(max_upload_bytes))
}

/// Unauthenticated probes mounted at the root.
pub fn health_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::health::liveness))
        .routes(routes!(handlers::health::readiness))
}
