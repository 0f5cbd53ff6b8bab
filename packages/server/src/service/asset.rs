use std::collections::{HashMap, HashSet};

use chrono::Utc;
use hierarchy_common::{
    AssetDraft, AssetType, ParentRef, ValidationError, validate, validate_fields,
};
use sea_orm::prelude::Expr;
use sea_orm::sea_query::{ExprTrait, Func, LikeExpr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, ModelTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionSession,
    TransactionTrait,
};
use tracing::info;
use uuid::Uuid;

use crate::entity::{asset, asset_detail};
use crate::error::AppError;
use crate::extractors::context::RequestContext;
use crate::models::asset::{AssetListQuery, UpdateAssetRequest};
use crate::models::shared::{Pagination, escape_like};

use super::descendants::descendants;

/// An asset together with its optional detail row.
pub type StoredAsset = (asset::Model, Option<asset_detail::Model>);

const DEFAULT_PER_PAGE: u64 = 20;
const MAX_PER_PAGE: u64 = 100;

/// CRUD and traversal over the asset store.
///
/// Generic over the connection so the same operations run on the pool or
/// inside a caller-owned transaction.
pub struct AssetService<'a, C: ConnectionTrait + TransactionTrait> {
    conn: &'a C,
    ctx: &'a RequestContext,
}

impl<'a, C: ConnectionTrait + TransactionTrait> AssetService<'a, C> {
    pub fn new(conn: &'a C, ctx: &'a RequestContext) -> Self {
        Self { conn, ctx }
    }

    /// Validate and persist a single asset. The parent is addressed by id.
    pub async fn create(&self, draft: AssetDraft) -> Result<StoredAsset, AppError> {
        validate_fields(&draft)?;
        let parent = self.resolve_parent(draft.parent.as_ref()).await?;
        validate(&draft, parent.as_ref())?;

        let stored = insert_asset(self.conn, &draft, parent.map(|p| p.id)).await?;
        info!(
            trace_id = %self.ctx.trace_id,
            actor = self.ctx.actor(),
            id = stored.0.id,
            asset_type = %stored.0.asset_type,
            "Created asset"
        );
        Ok(stored)
    }

    pub async fn retrieve(&self, id: i32) -> Result<StoredAsset, AppError> {
        let model = self.find(id).await?;
        let details = model.find_related(asset_detail::Entity).one(self.conn).await?;
        Ok((model, details))
    }

    /// Fetch `id` only if it has type `scope`.
    pub async fn retrieve_scoped(&self, id: i32, scope: AssetType) -> Result<StoredAsset, AppError> {
        let model = asset::Entity::find_by_id(id)
            .filter(asset::Column::AssetType.eq(scope))
            .one(self.conn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("No {scope} is assigned to this id")))?;
        let details = model.find_related(asset_detail::Entity).one(self.conn).await?;
        Ok((model, details))
    }

    /// Overwrite every writable field of `id` with `draft`. Stored details
    /// are kept when `draft` carries none.
    pub async fn replace(&self, id: i32, draft: AssetDraft) -> Result<StoredAsset, AppError> {
        let current = self.retrieve(id).await?;
        self.apply(current, draft, DetailsOnMissing::Keep).await
    }

    /// Merge `patch` into the stored asset and validate the result as a whole.
    pub async fn update(&self, id: i32, patch: UpdateAssetRequest) -> Result<StoredAsset, AppError> {
        let current = self.retrieve(id).await?;
        let on_missing = if patch.clears_details() {
            DetailsOnMissing::Clear
        } else {
            DetailsOnMissing::Keep
        };
        let mut draft = draft_from_stored(&current);
        patch.apply_to(&mut draft);
        self.apply(current, draft, on_missing).await
    }

    /// Delete `id`; storage removes its subtree and detail rows.
    pub async fn delete(&self, id: i32) -> Result<(), AppError> {
        let result = asset::Entity::delete_by_id(id).exec(self.conn).await?;
        if result.rows_affected == 0 {
            return Err(not_found(id));
        }
        info!(
            trace_id = %self.ctx.trace_id,
            actor = self.ctx.actor(),
            id,
            "Deleted asset with its subtree"
        );
        Ok(())
    }

    pub async fn list(
        &self,
        query: &AssetListQuery,
    ) -> Result<(Vec<StoredAsset>, Pagination), AppError> {
        let page = Ord::max(query.page.unwrap_or(1), 1);
        let per_page = query
            .per_page
            .unwrap_or(DEFAULT_PER_PAGE)
            .clamp(1, MAX_PER_PAGE);
        let scope = query.asset_type.unwrap_or(AssetType::Organization);

        let mut select = asset::Entity::find().filter(asset::Column::AssetType.eq(scope));
        if let Some(is_active) = query.is_active {
            select = select.filter(asset::Column::IsActive.eq(is_active));
        }
        if let Some(parent) = query.parent {
            select = select.filter(asset::Column::ParentId.eq(parent));
        }
        if let Some(ref search) = query.search {
            let term = escape_like(search.trim());
            if !term.is_empty() {
                select = select.filter(
                    Expr::expr(Func::lower(Expr::col(asset::Column::AssetName)))
                        .like(LikeExpr::new(format!("%{}%", term.to_lowercase())).escape('\\')),
                );
            }
        }

        let total = select
            .clone()
            .paginate(self.conn, per_page)
            .num_items()
            .await?;
        let total_pages = total.div_ceil(per_page);

        // Pages past the end are empty, including offsets that overflow.
        let models = match (page - 1).checked_mul(per_page) {
            Some(offset) if offset < total => {
                select
                    .order_by_asc(asset::Column::AssetName)
                    .order_by_asc(asset::Column::Id)
                    .offset(Some(offset))
                    .limit(Some(per_page))
                    .all(self.conn)
                    .await?
            }
            _ => Vec::new(),
        };

        Ok((
            self.with_details(models).await?,
            Pagination {
                page,
                per_page,
                total,
                total_pages,
            },
        ))
    }

    /// Direct children of `id`, ordered by name.
    pub async fn children_of(
        &self,
        id: i32,
        type_filter: Option<AssetType>,
    ) -> Result<Vec<StoredAsset>, AppError> {
        self.find(id).await?;
        let mut select = asset::Entity::find().filter(asset::Column::ParentId.eq(id));
        if let Some(asset_type) = type_filter {
            select = select.filter(asset::Column::AssetType.eq(asset_type));
        }
        let models = select
            .order_by_asc(asset::Column::AssetName)
            .order_by_asc(asset::Column::Id)
            .all(self.conn)
            .await?;
        self.with_details(models).await
    }

    /// Every asset strictly below `id`, optionally narrowed to one type.
    pub async fn descendants(
        &self,
        id: i32,
        type_filter: Option<AssetType>,
    ) -> Result<Vec<StoredAsset>, AppError> {
        let models = descendants(self.conn, id, type_filter).await?;
        self.with_details(models).await
    }

    async fn find(&self, id: i32) -> Result<asset::Model, AppError> {
        asset::Entity::find_by_id(id)
            .one(self.conn)
            .await?
            .ok_or_else(|| not_found(id))
    }

    async fn resolve_parent(
        &self,
        parent: Option<&ParentRef>,
    ) -> Result<Option<asset::Model>, AppError> {
        let id = match parent {
            None => return Ok(None),
            Some(ParentRef::Id(id)) => *id,
            Some(ParentRef::Name(_)) => {
                return Err(ValidationError::InvalidField {
                    field: "parent",
                    reason: "must be the id of an existing asset".into(),
                }
                .into());
            }
        };
        let parent = asset::Entity::find_by_id(id).one(self.conn).await?.ok_or_else(|| {
            ValidationError::InvalidField {
                field: "parent",
                reason: format!("asset {id} does not exist"),
            }
        })?;
        Ok(Some(parent))
    }

    /// Validate `draft` as the new state of `current` and write it.
    async fn apply(
        &self,
        current: StoredAsset,
        draft: AssetDraft,
        on_missing: DetailsOnMissing,
    ) -> Result<StoredAsset, AppError> {
        let (model, details) = current;
        validate_fields(&draft)?;
        let parent = self.resolve_parent(draft.parent.as_ref()).await?;
        validate(&draft, parent.as_ref())?;
        if let Some(ref parent) = parent {
            self.ensure_not_below(model.id, parent).await?;
        }
        if draft.asset_type.is_leaf() && draft.asset_type != model.asset_type {
            let has_children = asset::Entity::find()
                .filter(asset::Column::ParentId.eq(model.id))
                .count(self.conn)
                .await?
                > 0;
            if has_children {
                return Err(ValidationError::InvalidField {
                    field: "asset_type",
                    reason: format!("a {} cannot have child assets", draft.asset_type),
                }
                .into());
            }
        }

        let id = model.id;
        let txn = self.conn.begin().await?;

        let mut active: asset::ActiveModel = model.into();
        active.asset_name = Set(draft.asset_name);
        active.asset_type = Set(draft.asset_type);
        active.hierarchy_level = Set(draft.hierarchy_level);
        active.parent_id = Set(parent.map(|p| p.id));
        active.description = Set(draft.description);
        active.is_active = Set(draft.is_active);
        active.start_date = Set(draft.start_date);
        active.end_date = Set(draft.end_date);
        active.updated_at = Set(Utc::now());
        let updated = active.update(&txn).await?;

        let details = match (details, draft.details) {
            (Some(existing), Some(new)) => {
                let mut active: asset_detail::ActiveModel = existing.into();
                active.location = Set(new.location);
                active.building = Set(new.building);
                active.floor = Set(new.floor);
                active.room = Set(new.room);
                active.line = Set(new.line);
                Some(active.update(&txn).await?)
            }
            (None, Some(new)) => Some(insert_details(&txn, id, &new).await?),
            (Some(existing), None) => match on_missing {
                DetailsOnMissing::Keep => Some(existing),
                DetailsOnMissing::Clear => {
                    existing.delete(&txn).await?;
                    None
                }
            },
            (None, None) => None,
        };

        txn.commit().await?;
        info!(
            trace_id = %self.ctx.trace_id,
            actor = self.ctx.actor(),
            id,
            "Updated asset"
        );
        Ok((updated, details))
    }

    /// Reject a move of `id` under itself or any of its descendants.
    async fn ensure_not_below(&self, id: i32, parent: &asset::Model) -> Result<(), AppError> {
        let mut seen = HashSet::new();
        let mut cursor = Some(parent.clone());
        while let Some(node) = cursor {
            if node.id == id {
                return Err(ValidationError::CyclicParent.into());
            }
            if !seen.insert(node.id) {
                break;
            }
            cursor = match node.parent_id {
                Some(pid) => asset::Entity::find_by_id(pid).one(self.conn).await?,
                None => None,
            };
        }
        Ok(())
    }

    async fn with_details(&self, models: Vec<asset::Model>) -> Result<Vec<StoredAsset>, AppError> {
        if models.is_empty() {
            return Ok(Vec::new());
        }
        let mut details: HashMap<i32, asset_detail::Model> = HashMap::new();
        let ids: Vec<i32> = models.iter().map(|m| m.id).collect();
        for chunk in ids.chunks(super::ID_CHUNK) {
            for d in asset_detail::Entity::find()
                .filter(asset_detail::Column::AssetId.is_in(chunk.iter().copied()))
                .all(self.conn)
                .await?
            {
                details.insert(d.asset_id, d);
            }
        }
        Ok(models
            .into_iter()
            .map(|m| {
                let d = details.remove(&m.id);
                (m, d)
            })
            .collect())
    }
}

/// What a write does with stored details when the new state has none.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum DetailsOnMissing {
    Keep,
    Clear,
}

fn not_found(id: i32) -> AppError {
    AppError::NotFound(format!("Asset {id} not found"))
}

fn draft_from_stored((model, details): &StoredAsset) -> AssetDraft {
    AssetDraft {
        asset_name: model.asset_name.clone(),
        asset_type: model.asset_type,
        hierarchy_level: model.hierarchy_level,
        parent: model.parent_id.map(ParentRef::Id),
        description: model.description.clone(),
        is_active: model.is_active,
        start_date: model.start_date,
        end_date: model.end_date,
        details: details.as_ref().map(|d| hierarchy_common::AssetDetailDraft {
            location: d.location.clone(),
            building: d.building.clone(),
            floor: d.floor.clone(),
            room: d.room.clone(),
            line: d.line.clone(),
        }),
    }
}

/// Insert an already validated draft and its details in one transaction.
pub(crate) async fn insert_asset<C>(
    conn: &C,
    draft: &AssetDraft,
    parent_id: Option<i32>,
) -> Result<StoredAsset, DbErr>
where
    C: ConnectionTrait + TransactionTrait,
{
    let txn = conn.begin().await?;
    let now = Utc::now();
    let model = asset::ActiveModel {
        uuid: Set(Uuid::new_v4()),
        asset_name: Set(draft.asset_name.clone()),
        asset_type: Set(draft.asset_type),
        hierarchy_level: Set(draft.hierarchy_level),
        parent_id: Set(parent_id),
        description: Set(draft.description.clone()),
        is_active: Set(draft.is_active),
        start_date: Set(draft.start_date),
        end_date: Set(draft.end_date),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let details = match draft.details {
        Some(ref d) => Some(insert_details(&txn, model.id, d).await?),
        None => None,
    };

    txn.commit().await?;
    Ok((model, details))
}

async fn insert_details<C: ConnectionTrait>(
    conn: &C,
    asset_id: i32,
    d: &hierarchy_common::AssetDetailDraft,
) -> Result<asset_detail::Model, DbErr> {
    asset_detail::ActiveModel {
        asset_id: Set(asset_id),
        location: Set(d.location.clone()),
        building: Set(d.building.clone()),
        floor: Set(d.floor.clone()),
        room: Set(d.room.clone()),
        line: Set(d.line.clone()),
        ..Default::default()
    }
    .insert(conn)
    .await
}
