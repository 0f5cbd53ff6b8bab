use std::time::Duration;

use sea_orm::sea_query::Index;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, Schema};
use tracing::{info, warn};

use crate::config::DatabaseConfig;
use crate::entity::{asset, asset_detail};

pub async fn init_db(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let mut opt = ConnectOptions::new(config.url.to_owned());

    // Set connection pool options
    opt.max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
        .sqlx_logging(false);

    let db = Database::connect(opt).await?;
    ensure_schema(&db).await?;
    ensure_indexes(&db).await?;

    Ok(db)
}

/// Create the `asset` and `asset_detail` tables if they do not exist.
///
/// Both foreign keys are `ON DELETE CASCADE`: removing an asset removes its
/// whole subtree and every attached detail row.
pub async fn ensure_schema<C: ConnectionTrait>(db: &C) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);

    let asset_table = schema
        .create_table_from_entity(asset::Entity)
        .if_not_exists()
        .to_owned();
    db.execute_raw(backend.build(&asset_table)).await?;

    let detail_table = schema
        .create_table_from_entity(asset_detail::Entity)
        .if_not_exists()
        .to_owned();
    db.execute_raw(backend.build(&detail_table)).await?;

    Ok(())
}

/// Ensure lookup indexes used by child and type queries exist.
pub async fn ensure_indexes<C: ConnectionTrait>(db: &C) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    let indexes = [
        (
            "idx_asset_parent_id",
            Index::create()
                .if_not_exists()
                .name("idx_asset_parent_id")
                .table(asset::Entity)
                .col(asset::Column::ParentId)
                .to_owned(),
        ),
        (
            "idx_asset_type",
            Index::create()
                .if_not_exists()
                .name("idx_asset_type")
                .table(asset::Entity)
                .col(asset::Column::AssetType)
                .to_owned(),
        ),
    ];

    for (name, stmt) in indexes {
        match db.execute_raw(backend.build(&stmt)).await {
            Ok(_) => info!("Ensured index {name} exists"),
            Err(e) => warn!("Failed to create index {name}: {e}"),
        }
    }

    Ok(())
}
