use std::collections::HashMap;

use hierarchy_common::{AssetDraft, AssetType, RowError, validate};
use sea_orm::{ConnectionTrait, DbErr, TransactionTrait};
use thiserror::Error;
use tracing::{debug, info};

use crate::extractors::context::RequestContext;

use super::asset::{StoredAsset, insert_asset};

/// Why a bulk batch stopped. Rows are 1-based batch positions.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    Invalid(#[from] RowError),

    #[error("Row {row}: parent '{parent_name}' does not match any asset created earlier in this batch.")]
    UnresolvedParent { row: usize, parent_name: String },

    #[error("Parent name '{name}' is used by more than one row ({rows:?}) and cannot be resolved.")]
    AmbiguousParent { name: String, rows: Vec<usize> },

    #[error("database error: {0}")]
    Database(#[from] DbErr),
}

/// Persist a batch of drafts whose parents are referenced by name.
///
/// Organizations are created first, in input order. Every other row is then
/// processed in input order and may only name a parent created before it,
/// either an organization from the first pass or an earlier row of the second.
/// The first failing row aborts the rest; rows already written stay written
/// unless `conn` is a transaction the caller rolls back.
pub async fn ingest<C>(
    conn: &C,
    ctx: &RequestContext,
    drafts: Vec<AssetDraft>,
) -> Result<Vec<StoredAsset>, IngestError>
where
    C: ConnectionTrait + TransactionTrait,
{
    check_ambiguous_parents(&drafts)?;

    let (roots, others): (Vec<_>, Vec<_>) = drafts
        .into_iter()
        .enumerate()
        .map(|(i, draft)| (i + 1, draft))
        .partition(|(_, draft)| draft.asset_type.is_root());

    let mut resolved: HashMap<String, (i32, AssetType)> = HashMap::new();
    let mut created = Vec::with_capacity(roots.len() + others.len());

    for (row, mut draft) in roots {
        draft.parent = None;
        validate::<AssetType>(&draft, None).map_err(|e| RowError::new(row, e))?;
        let stored = insert_asset(conn, &draft, None).await?;
        debug!(row, id = stored.0.id, "Created root asset");
        resolved.insert(draft.asset_name, (stored.0.id, stored.0.asset_type));
        created.push(stored);
    }

    for (row, draft) in others {
        let parent = match draft.parent_name() {
            Some(name) => Some(*resolved.get(name).ok_or_else(|| {
                IngestError::UnresolvedParent {
                    row,
                    parent_name: name.to_string(),
                }
            })?),
            None => None,
        };
        let parent_type = parent.map(|(_, t)| t);
        validate(&draft, parent_type.as_ref()).map_err(|e| RowError::new(row, e))?;

        let stored = insert_asset(conn, &draft, parent.map(|(id, _)| id)).await?;
        debug!(row, id = stored.0.id, "Created asset");
        resolved.insert(draft.asset_name, (stored.0.id, stored.0.asset_type));
        created.push(stored);
    }

    info!(
        trace_id = %ctx.trace_id,
        actor = ctx.actor(),
        count = created.len(),
        "Bulk ingest finished"
    );
    Ok(created)
}

/// Reject names that occur on several rows while another row uses them as a parent.
fn check_ambiguous_parents(drafts: &[AssetDraft]) -> Result<(), IngestError> {
    let mut rows_by_name: HashMap<&str, Vec<usize>> = HashMap::new();
    for (i, draft) in drafts.iter().enumerate() {
        rows_by_name
            .entry(draft.asset_name.as_str())
            .or_default()
            .push(i + 1);
    }

    for draft in drafts {
        if let Some(name) = draft.parent_name()
            && let Some(rows) = rows_by_name.get(name)
            && rows.len() > 1
        {
            return Err(IngestError::AmbiguousParent {
                name: name.to_string(),
                rows: rows.clone(),
            });
        }
    }
    Ok(())
}
