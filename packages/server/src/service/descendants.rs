use std::collections::HashSet;

use hierarchy_common::AssetType;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder};
use tracing::warn;

use crate::entity::asset;
use crate::error::AppError;

use super::ID_CHUNK;

/// Collect every asset strictly below `root_id`.
///
/// Walks the tree breadth-first, one `parent_id IN (..)` query per level.
/// Nodes come back level by level, ordered by name within a level. The type
/// filter is applied after the walk, so children of filtered-out nodes are
/// still reached. A node reached twice is skipped.
pub async fn descendants<C: ConnectionTrait>(
    conn: &C,
    root_id: i32,
    type_filter: Option<AssetType>,
) -> Result<Vec<asset::Model>, AppError> {
    asset::Entity::find_by_id(root_id)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Asset {root_id} not found")))?;

    let mut visited = HashSet::from([root_id]);
    let mut frontier = vec![root_id];
    let mut found = Vec::new();

    while !frontier.is_empty() {
        let mut level = Vec::new();
        for chunk in frontier.chunks(ID_CHUNK) {
            level.extend(
                asset::Entity::find()
                    .filter(asset::Column::ParentId.is_in(chunk.iter().copied()))
                    .order_by_asc(asset::Column::AssetName)
                    .order_by_asc(asset::Column::Id)
                    .all(conn)
                    .await?,
            );
        }
        if frontier.len() > ID_CHUNK {
            level.sort_by(|a: &asset::Model, b| {
                a.asset_name.cmp(&b.asset_name).then(a.id.cmp(&b.id))
            });
        }

        let mut next = Vec::with_capacity(level.len());
        for node in level {
            if !visited.insert(node.id) {
                warn!(id = node.id, root_id, "Asset reached twice while collecting descendants");
                continue;
            }
            next.push(node.id);
            found.push(node);
        }
        frontier = next;
    }

    if let Some(asset_type) = type_filter {
        found.retain(|node| node.asset_type == asset_type);
    }
    Ok(found)
}
